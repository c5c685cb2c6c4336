//! Report configuration resolution across export API generations.
//!
//! The current export API is tried first; any failure falls back to the
//! legacy report definitions API. Both sides normalize into
//! [`ExportDefinition`] before anything else sees them.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::core::access::AccessFailure;
use crate::core::diagnostics::{DiagnosticEvent, SharedObserver, default_observer};
use crate::core::models::{ExportApi, ExportDefinition, ResolvedCredential, ResolvedExports};
use crate::error::{CurcheckError, Result};

const COMPONENT: &str = "exports";

/// One generation of the report configuration API.
pub trait ExportCatalog: Send + Sync {
    /// Which generation this catalog speaks.
    fn api(&self) -> ExportApi;

    /// Every configured export visible with `cred`.
    fn list_exports<'a>(
        &'a self,
        cred: &'a ResolvedCredential,
    ) -> BoxFuture<'a, std::result::Result<Vec<ExportDefinition>, AccessFailure>>;
}

/// Resolves configured exports, current API first.
#[derive(Clone)]
pub struct ReportConfigResolver {
    current: Arc<dyn ExportCatalog>,
    legacy: Arc<dyn ExportCatalog>,
    observer: SharedObserver,
}

impl ReportConfigResolver {
    #[must_use]
    pub fn new(current: Arc<dyn ExportCatalog>, legacy: Arc<dyn ExportCatalog>) -> Self {
        Self {
            current,
            legacy,
            observer: default_observer(),
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    /// List exports with `cred`, falling back to the legacy API on any error.
    ///
    /// `credential` names the delegated credential in the failure message.
    ///
    /// # Errors
    ///
    /// Returns [`CurcheckError::ReportAccessDenied`] when neither API answers.
    pub async fn resolve(
        &self,
        cred: &ResolvedCredential,
        credential: &str,
    ) -> Result<ResolvedExports> {
        let current_failure = match self.current.list_exports(cred).await {
            Ok(definitions) => {
                tracing::debug!(
                    api = %self.current.api(),
                    count = definitions.len(),
                    "Resolved export definitions"
                );
                return Ok(ResolvedExports {
                    definitions,
                    api: self.current.api(),
                });
            }
            Err(failure) => failure,
        };

        self.observer.record(DiagnosticEvent::info(
            COMPONENT,
            format!(
                "{} API unavailable ({current_failure}), falling back to {}",
                self.current.api(),
                self.legacy.api()
            ),
        ));

        match self.legacy.list_exports(cred).await {
            Ok(definitions) => {
                tracing::debug!(
                    api = %self.legacy.api(),
                    count = definitions.len(),
                    "Resolved export definitions"
                );
                Ok(ResolvedExports {
                    definitions,
                    api: self.legacy.api(),
                })
            }
            Err(legacy_failure) => {
                self.observer.record(DiagnosticEvent::warn(
                    COMPONENT,
                    format!(
                        "unable to list exports with {credential}: {} failed ({current_failure}); {} failed ({legacy_failure})",
                        self.current.api(),
                        self.legacy.api()
                    ),
                ));
                Err(CurcheckError::ReportAccessDenied {
                    credential: credential.to_string(),
                    transient: current_failure.is_transient() || legacy_failure.is_transient(),
                })
            }
        }
    }
}
