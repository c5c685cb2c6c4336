//! E2E tests for the curcheck binary.
//!
//! Covers:
//! - Help/version output
//! - Missing input rejected before any network access
//! - Storage-only verification (no AWS calls)
//! - Configuration errors from files and environment
//! - JSON error envelopes

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

mod common;

use common::logger::TestLogger;

const ROLE_ARN: &str = "arn:aws:iam::123456789012:role/CostManagement";

/// The binary with a hermetic environment: no user config, no inherited
/// billing source variables.
#[allow(deprecated)]
fn curcheck() -> Command {
    let mut cmd = Command::cargo_bin("curcheck").unwrap();
    cmd.env("CURCHECK_CONFIG", "/nonexistent/curcheck/config.toml")
        .env("NO_COLOR", "1")
        .env_remove("CURCHECK_ROLE_ARN")
        .env_remove("CURCHECK_BUCKET")
        .env_remove("CURCHECK_FORMAT")
        .env_remove("CURCHECK_TIMEOUT")
        .env_remove("CURCHECK_BILLING_REGION")
        .env_remove("CURCHECK_PRETTY")
        .env_remove("CURCHECK_VERBOSE")
        .env_remove("CURCHECK_LOG")
        .env_remove("CURCHECK_LOG_FORMAT")
        .env_remove("CURCHECK_LOG_FILE")
        .env_remove("RUST_LOG");
    cmd
}

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn help_lists_commands() {
    curcheck()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("verify").and(predicate::str::contains("check-files")));
}

#[test]
fn version_flag_prints_version() {
    curcheck()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn invalid_command_is_rejected() {
    curcheck()
        .arg("notacommand")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized").or(predicate::str::contains("error")));
}

#[test]
fn check_files_without_keys_is_usage_error() {
    curcheck()
        .args(["check-files", "--bucket", "cost-reports"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("KEY"));
}

#[test]
fn blank_role_arn_exits_with_verification_failure() {
    let log = TestLogger::new("blank_role_arn_exits_with_verification_failure");
    log.phase("execute");

    curcheck()
        .args(["verify", "--role-arn", "", "--bucket", "cost-reports"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Billing source NOT verified"))
        .stderr(predicate::str::contains("CURCHECK-V001"));

    log.finish_ok();
}

#[test]
fn missing_bucket_json_error_envelope() {
    let output = curcheck()
        .args(["verify", "--role-arn", ROLE_ARN, "--json"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let report: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(report["schemaVersion"], "curcheck.v1");
    assert_eq!(report["command"], "verify");
    assert_eq!(report["data"]["verified"], false);
    assert_eq!(report["data"]["errorKind"], "MissingBucket");

    let stderr = String::from_utf8_lossy(&output.stderr);
    let line = stderr
        .lines()
        .find(|l| l.starts_with('{'))
        .expect("JSON error line on stderr");
    let error: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(error["error"]["kind"], "MissingBucket");
    assert_eq!(error["error"]["code"], "CURCHECK-V002");
    assert_eq!(error["error"]["retryable"], false);
}

#[test]
fn storage_only_verifies_without_aws() {
    curcheck()
        .args([
            "verify",
            "--role-arn",
            ROLE_ARN,
            "--bucket",
            "cost-reports",
            "--storage-only",
        ])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Billing source verified")
                .and(predicate::str::contains("[--]")),
        );
}

#[test]
fn source_file_feeds_the_verifier() {
    let source = config_file(&format!(
        r#"{{"credentials": {{"role_arn": "{ROLE_ARN}"}},
            "data_source": {{"bucket": "from-file", "storage_only": true}}}}"#
    ));

    curcheck()
        .args(["verify", "--format", "md", "--source-file"])
        .arg(source.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("- bucket: `from-file`"));
}

#[test]
fn missing_source_file_is_config_error() {
    curcheck()
        .args(["verify", "--source-file", "/nonexistent/source.json"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("CURCHECK-C002"));
}

#[test]
fn corrupted_config_exits_with_config_error() {
    let config = config_file("[general\ntimeout_seconds = ");

    curcheck()
        .env("CURCHECK_CONFIG", config.path())
        .args(["verify", "--bucket", "b"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("configuration error"));
}

#[test]
fn out_of_range_timeout_in_config_is_rejected() {
    let config = config_file("[general]\ntimeout_seconds = 0\n");

    curcheck()
        .env("CURCHECK_CONFIG", config.path())
        .args(["verify", "--bucket", "b", "--json"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("\"code\":\"CURCHECK-C001\""));
}

#[test]
fn unparsable_timeout_env_is_rejected() {
    curcheck()
        .env("CURCHECK_TIMEOUT", "abc")
        .args(["verify", "--bucket", "b"])
        .assert()
        .code(3)
        .stderr(
            predicate::str::contains("CURCHECK_TIMEOUT")
                .and(predicate::str::contains("CURCHECK-C001")),
        );
}

#[test]
fn role_arn_from_environment() {
    curcheck()
        .env("CURCHECK_ROLE_ARN", ROLE_ARN)
        .env("CURCHECK_BUCKET", "env-bucket")
        .args(["verify", "--storage-only", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"bucket\":\"env-bucket\""));
}
