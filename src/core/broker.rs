//! Credential broker: exchanges a cross-account role for short-lived credentials.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::core::access::AccessFailure;
use crate::core::arn::RoleArn;
use crate::core::diagnostics::{DiagnosticEvent, SharedObserver, default_observer};
use crate::core::models::{DelegatedCredential, ResolvedCredential};

/// Session label used when assuming a role.
pub const DEFAULT_SESSION_NAME: &str = "AccountCreationSession";

const COMPONENT: &str = "broker";

/// A single token exchange request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssumeRoleRequest {
    pub role_arn: RoleArn,
    pub external_id: Option<String>,
    pub session_name: String,
}

/// Outbound token exchange (STS `AssumeRole`).
pub trait TokenExchange: Send + Sync {
    /// Exchange the role for credentials, optionally scoped to `region`.
    fn assume_role<'a>(
        &'a self,
        request: &'a AssumeRoleRequest,
        region: Option<&'a str>,
    ) -> BoxFuture<'a, Result<ResolvedCredential, AccessFailure>>;
}

/// Turns a [`DelegatedCredential`] into a [`ResolvedCredential`].
#[derive(Clone)]
pub struct CredentialBroker {
    exchange: Arc<dyn TokenExchange>,
    session_name: String,
    observer: SharedObserver,
}

impl CredentialBroker {
    #[must_use]
    pub fn new(exchange: Arc<dyn TokenExchange>) -> Self {
        Self {
            exchange,
            session_name: DEFAULT_SESSION_NAME.to_string(),
            observer: default_observer(),
        }
    }

    #[must_use]
    pub fn with_session_name(mut self, session_name: impl Into<String>) -> Self {
        self.session_name = session_name.into();
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Obtain credentials, collapsing every failure to an empty credential.
    ///
    /// Never fails; the cause is reported to the observer.
    pub async fn assume(
        &self,
        cred: &DelegatedCredential,
        region: Option<&str>,
    ) -> ResolvedCredential {
        self.try_assume(cred, region)
            .await
            .unwrap_or_else(|_| ResolvedCredential::empty())
    }

    /// Obtain credentials, exposing the classified failure.
    ///
    /// # Errors
    ///
    /// Returns [`AccessFailure::InvalidRequest`] for a malformed role ARN or a
    /// rejected request, and whatever the token exchange reports otherwise.
    pub async fn try_assume(
        &self,
        cred: &DelegatedCredential,
        region: Option<&str>,
    ) -> Result<ResolvedCredential, AccessFailure> {
        let role_arn = match RoleArn::parse(&cred.role_arn) {
            Ok(arn) => arn,
            Err(err) => {
                self.observer.record(DiagnosticEvent::warn(
                    COMPONENT,
                    format!("role ARN {} could not be parsed: {err}", cred.role_arn),
                ));
                return Err(AccessFailure::InvalidRequest(err.to_string()));
            }
        };

        let request = AssumeRoleRequest {
            role_arn,
            external_id: cred
                .external_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(ToString::to_string),
            session_name: self.session_name.clone(),
        };

        tracing::debug!(
            role_arn = %request.role_arn,
            region = region.unwrap_or("<default>"),
            external_id = request.external_id.is_some(),
            "Assuming role"
        );

        match self.exchange.assume_role(&request, region).await {
            Ok(resolved) => Ok(resolved),
            Err(failure) => {
                let message = format!(
                    "unable to assume role {}: {failure}",
                    request.role_arn
                );
                let event = match failure {
                    AccessFailure::InvalidRequest(_) => DiagnosticEvent::info(COMPONENT, message),
                    _ => DiagnosticEvent::warn(COMPONENT, message),
                };
                self.observer.record(event);
                Err(failure)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::diagnostics::{RecordingObserver, Severity};
    use std::sync::Mutex;

    const ROLE: &str = "arn:aws:iam::123456789012:role/CostManagement";

    struct StubExchange {
        result: Result<ResolvedCredential, AccessFailure>,
        seen: Mutex<Vec<(AssumeRoleRequest, Option<String>)>>,
    }

    impl StubExchange {
        fn new(result: Result<ResolvedCredential, AccessFailure>) -> Arc<Self> {
            Arc::new(Self {
                result,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl TokenExchange for StubExchange {
        fn assume_role<'a>(
            &'a self,
            request: &'a AssumeRoleRequest,
            region: Option<&'a str>,
        ) -> BoxFuture<'a, Result<ResolvedCredential, AccessFailure>> {
            self.seen
                .lock()
                .unwrap()
                .push((request.clone(), region.map(ToString::to_string)));
            let result = self.result.clone();
            Box::pin(async move { result })
        }
    }

    fn broker(exchange: Arc<StubExchange>, observer: Arc<RecordingObserver>) -> CredentialBroker {
        CredentialBroker::new(exchange).with_observer(observer)
    }

    #[tokio::test]
    async fn passes_role_external_id_and_region() {
        let exchange = StubExchange::new(Ok(ResolvedCredential::new("AKIA", "s", "t")));
        let observer = Arc::new(RecordingObserver::new());
        let broker = broker(exchange.clone(), observer);

        let cred = DelegatedCredential::new(ROLE).with_external_id("ext-123");
        let resolved = broker.assume(&cred, Some("eu-west-1")).await;
        assert!(resolved.is_usable());

        let seen = exchange.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0.role_arn.as_str(), ROLE);
        assert_eq!(seen[0].0.external_id.as_deref(), Some("ext-123"));
        assert_eq!(seen[0].0.session_name, DEFAULT_SESSION_NAME);
        assert_eq!(seen[0].1.as_deref(), Some("eu-west-1"));
    }

    #[tokio::test]
    async fn blank_external_id_is_omitted() {
        let exchange = StubExchange::new(Ok(ResolvedCredential::new("AKIA", "s", "t")));
        let broker = broker(exchange.clone(), Arc::new(RecordingObserver::new()));

        let cred = DelegatedCredential::new(ROLE).with_external_id("  ");
        broker.assume(&cred, None).await;
        assert_eq!(exchange.seen.lock().unwrap()[0].0.external_id, None);
    }

    #[tokio::test]
    async fn malformed_arn_yields_empty_credential_without_exchange() {
        let exchange = StubExchange::new(Ok(ResolvedCredential::new("AKIA", "s", "t")));
        let observer = Arc::new(RecordingObserver::new());
        let broker = broker(exchange.clone(), observer.clone());

        let resolved = broker.assume(&DelegatedCredential::new("not-an-arn"), None).await;
        assert_eq!(resolved, ResolvedCredential::empty());
        assert!(exchange.seen.lock().unwrap().is_empty());

        let events = observer.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, Severity::Warn);
    }

    #[tokio::test]
    async fn rejected_request_is_recorded_at_info() {
        let exchange = StubExchange::new(Err(AccessFailure::InvalidRequest(
            "ValidationError".to_string(),
        )));
        let observer = Arc::new(RecordingObserver::new());
        let broker = broker(exchange, observer.clone());

        let err = broker
            .try_assume(&DelegatedCredential::new(ROLE), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AccessFailure::InvalidRequest(_)));
        assert_eq!(observer.events()[0].severity, Severity::Info);
    }

    #[tokio::test]
    async fn denied_and_transient_are_recorded_at_warn() {
        for failure in [
            AccessFailure::NotConfigured("AccessDenied".to_string()),
            AccessFailure::Transient("timeout".to_string()),
        ] {
            let exchange = StubExchange::new(Err(failure.clone()));
            let observer = Arc::new(RecordingObserver::new());
            let broker = broker(exchange, observer.clone());

            let resolved = broker.assume(&DelegatedCredential::new(ROLE), None).await;
            assert!(!resolved.is_usable());
            assert_eq!(observer.events()[0].severity, Severity::Warn);
            assert!(observer.contains(failure.detail()));
        }
    }

    #[tokio::test]
    async fn custom_session_name_is_used() {
        let exchange = StubExchange::new(Ok(ResolvedCredential::new("AKIA", "s", "t")));
        let broker = broker(exchange.clone(), Arc::new(RecordingObserver::new()))
            .with_session_name("curcheck-test");
        broker.assume(&DelegatedCredential::new(ROLE), None).await;
        assert_eq!(exchange.seen.lock().unwrap()[0].0.session_name, "curcheck-test");
    }
}
