//! AWS ARN parsing for cross-account role references.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static ARN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^arn:(?P<partition>aws[a-z-]*):(?P<service>[A-Za-z0-9-]+):(?P<region>[a-z0-9-]*):(?P<account>\d{12})?:(?P<resource>.+)$",
    )
    .expect("ARN pattern is a valid regex")
});

/// Why a string is not a usable ARN.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArnParseError {
    #[error("ARN is empty")]
    Empty,
    #[error("'{0}' is not a valid ARN")]
    Malformed(String),
}

/// A parsed role ARN, e.g. `arn:aws:iam::123456789012:role/CostManagement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleArn {
    raw: String,
    partition: String,
    service: String,
    region: Option<String>,
    account_id: Option<String>,
    resource: String,
}

impl RoleArn {
    /// Parse an ARN string. Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ArnParseError`] when the input is blank or does not follow
    /// `arn:<partition>:<service>:<region>:<account>:<resource>`.
    pub fn parse(input: &str) -> Result<Self, ArnParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ArnParseError::Empty);
        }

        let caps = ARN_REGEX
            .captures(trimmed)
            .ok_or_else(|| ArnParseError::Malformed(trimmed.to_string()))?;

        let non_empty = |name: &str| {
            caps.name(name)
                .map(|m| m.as_str())
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
        };

        Ok(Self {
            raw: trimmed.to_string(),
            partition: caps["partition"].to_string(),
            service: caps["service"].to_string(),
            region: non_empty("region"),
            account_id: non_empty("account"),
            resource: caps["resource"].to_string(),
        })
    }

    /// The full ARN string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn partition(&self) -> &str {
        &self.partition
    }

    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    #[must_use]
    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    /// Resource part, e.g. `role/CostManagement`.
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }
}

impl fmt::Display for RoleArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_role_arn() {
        let arn = RoleArn::parse("arn:aws:iam::123456789012:role/CostManagement").unwrap();
        assert_eq!(arn.partition(), "aws");
        assert_eq!(arn.service(), "iam");
        assert_eq!(arn.region(), None);
        assert_eq!(arn.account_id(), Some("123456789012"));
        assert_eq!(arn.resource(), "role/CostManagement");
        assert_eq!(arn.to_string(), "arn:aws:iam::123456789012:role/CostManagement");
    }

    #[test]
    fn parses_gov_cloud_partition_and_trims() {
        let arn = RoleArn::parse("  arn:aws-us-gov:iam::123456789012:role/path/Cost \n").unwrap();
        assert_eq!(arn.partition(), "aws-us-gov");
        assert_eq!(arn.resource(), "role/path/Cost");
        assert_eq!(arn.as_str(), "arn:aws-us-gov:iam::123456789012:role/path/Cost");
    }

    #[test]
    fn rejects_blank() {
        assert_eq!(RoleArn::parse("   "), Err(ArnParseError::Empty));
    }

    #[test]
    fn rejects_malformed() {
        for bad in [
            "not-an-arn",
            "arn:aws:iam::12345:role/short-account",
            "arn:gcp:iam::123456789012:role/x",
            "arn:aws:iam::123456789012:",
        ] {
            assert!(
                matches!(RoleArn::parse(bad), Err(ArnParseError::Malformed(_))),
                "{bad} should be rejected"
            );
        }
    }
}
