//! STS token exchange.

use std::sync::Arc;

use futures::future::BoxFuture;

use super::{AwsSettings, classify_sdk_error};
use crate::core::access::AccessFailure;
use crate::core::broker::{AssumeRoleRequest, TokenExchange};
use crate::core::models::ResolvedCredential;

/// Assumes roles with the ambient AWS credentials of this process.
#[derive(Debug, Clone)]
pub struct StsTokenExchange {
    settings: Arc<AwsSettings>,
}

impl StsTokenExchange {
    #[must_use]
    pub const fn new(settings: Arc<AwsSettings>) -> Self {
        Self { settings }
    }

    async fn assume(
        &self,
        request: &AssumeRoleRequest,
        region: Option<&str>,
    ) -> Result<ResolvedCredential, AccessFailure> {
        let region = region.unwrap_or(&self.settings.default_region);
        let sdk_config = self
            .settings
            .sdk_config(region, self.settings.sts_endpoint.as_deref())
            .await;
        let client = aws_sdk_sts::Client::new(&sdk_config);

        let output = client
            .assume_role()
            .role_arn(request.role_arn.as_str())
            .role_session_name(&request.session_name)
            .set_external_id(request.external_id.clone())
            .send()
            .await
            .map_err(|err| classify_sdk_error(&err))?;

        Ok(output.credentials().map_or_else(ResolvedCredential::empty, |creds| {
            ResolvedCredential {
                access_key_id: non_empty(creds.access_key_id()),
                secret_access_key: non_empty(creds.secret_access_key()),
                session_token: non_empty(creds.session_token()),
            }
        }))
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

impl TokenExchange for StsTokenExchange {
    fn assume_role<'a>(
        &'a self,
        request: &'a AssumeRoleRequest,
        region: Option<&'a str>,
    ) -> BoxFuture<'a, Result<ResolvedCredential, AccessFailure>> {
        Box::pin(self.assume(request, region))
    }
}
