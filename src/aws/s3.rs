//! S3 object storage.

use std::sync::Arc;

use aws_config::retry::RetryConfig;
use aws_sdk_s3::config::{BehaviorVersion, Region};
use futures::future::BoxFuture;

use super::{AwsSettings, classify_sdk_error, static_credentials};
use crate::core::access::AccessFailure;
use crate::core::models::ResolvedCredential;
use crate::core::storage::ObjectStore;

/// S3 client factory using brokered credentials.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    settings: Arc<AwsSettings>,
}

impl S3ObjectStore {
    #[must_use]
    pub const fn new(settings: Arc<AwsSettings>) -> Self {
        Self { settings }
    }

    fn client(
        &self,
        cred: &ResolvedCredential,
        region: &str,
    ) -> Result<aws_sdk_s3::Client, AccessFailure> {
        let mut builder = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(static_credentials(cred)?)
            .timeout_config(self.settings.timeout_config())
            .retry_config(RetryConfig::disabled());
        if let Some(endpoint) = &self.settings.s3_endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Ok(aws_sdk_s3::Client::from_conf(builder.build()))
    }

    async fn head(
        &self,
        cred: &ResolvedCredential,
        region: &str,
        bucket: &str,
    ) -> Result<(), AccessFailure> {
        let client = self.client(cred, region)?;
        match client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(()),
            Err(err) => {
                if err.as_service_error().is_some_and(|e| e.is_not_found()) {
                    Err(AccessFailure::NotFound(format!("bucket {bucket} does not exist")))
                } else {
                    Err(classify_sdk_error(&err))
                }
            }
        }
    }

    async fn get(
        &self,
        cred: &ResolvedCredential,
        region: &str,
        bucket: &str,
        key: &str,
    ) -> Result<(), AccessFailure> {
        let client = self.client(cred, region)?;
        match client.get_object().bucket(bucket).key(key).send().await {
            Ok(_) => Ok(()),
            Err(err) => {
                if err.as_service_error().is_some_and(|e| e.is_no_such_key()) {
                    Err(AccessFailure::NotFound(format!("NoSuchKey: {key}")))
                } else {
                    Err(classify_sdk_error(&err))
                }
            }
        }
    }
}

impl ObjectStore for S3ObjectStore {
    fn head_bucket<'a>(
        &'a self,
        cred: &'a ResolvedCredential,
        region: &'a str,
        bucket: &'a str,
    ) -> BoxFuture<'a, Result<(), AccessFailure>> {
        Box::pin(self.head(cred, region, bucket))
    }

    fn get_object<'a>(
        &'a self,
        cred: &'a ResolvedCredential,
        region: &'a str,
        bucket: &'a str,
        key: &'a str,
    ) -> BoxFuture<'a, Result<(), AccessFailure>> {
        Box::pin(self.get(cred, region, bucket, key))
    }
}
