//! Core verification components and data models.

pub mod access;
pub mod arn;
pub mod broker;
pub mod diagnostics;
pub mod exports;
pub mod files;
pub mod logging;
pub mod models;
pub mod report;
pub mod storage;
pub mod validator;
pub mod verifier;

pub use access::AccessFailure;
pub use arn::{ArnParseError, RoleArn};
pub use broker::{AssumeRoleRequest, CredentialBroker, DEFAULT_SESSION_NAME, TokenExchange};
pub use diagnostics::{
    DiagnosticEvent, DiagnosticObserver, RecordingObserver, Severity, SharedObserver,
    TracingObserver,
};
pub use exports::{ExportCatalog, ReportConfigResolver};
pub use files::FileReachabilityChecker;
pub use models::{
    BillingSource, DataSourceDescriptor, DelegatedCredential, ExportApi, ExportDefinition,
    ResolvedCredential, ResolvedExports, VerificationOutcome,
};
pub use report::{CheckStatus, FileCheckReport, StageCheck, VerificationReport, VerificationStage};
pub use storage::{DEFAULT_STORAGE_REGION, ObjectStore, StorageAccessChecker};
pub use validator::ReportConfigValidator;
pub use verifier::ReachabilityVerifier;
