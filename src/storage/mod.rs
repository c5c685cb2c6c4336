//! Storage for configuration.

pub mod config;
pub mod paths;

pub use config::{
    AwsConfig, Config, ConfigSource, ConfigSources, ENV_BILLING_REGION, ENV_CONFIG, ENV_FORMAT,
    ENV_NO_COLOR, ENV_NO_COLOR_STD, ENV_PRETTY, ENV_TIMEOUT, ENV_VERBOSE, GeneralConfig,
    OutputConfig, ResolvedConfig, ValidationConfig,
};
pub use paths::AppPaths;
