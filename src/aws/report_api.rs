//! Report configuration catalogs.
//!
//! [`DataExportsCatalog`] lists BCM Data Exports (`ListExports` followed by
//! `GetExport` per export). [`CostAndUsageReportCatalog`] lists legacy CUR
//! report definitions. Both normalize into [`ExportDefinition`].

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_bcmdataexports::types::Export;
use aws_sdk_costandusagereportservice::types::ReportDefinition;
use futures::future::BoxFuture;

use super::{AwsSettings, classify_sdk_error, static_credentials};
use crate::core::access::AccessFailure;
use crate::core::exports::ExportCatalog;
use crate::core::models::{ExportApi, ExportDefinition, ResolvedCredential};

/// Table holding the CUR-compatible columns of a data export.
pub const COST_AND_USAGE_TABLE: &str = "COST_AND_USAGE_REPORT";
/// Table property toggling resource IDs.
pub const INCLUDE_RESOURCES_PROPERTY: &str = "INCLUDE_RESOURCES";

const CUR_PAGE_SIZE: i32 = 5;

/// `INCLUDE_RESOURCES` of the cost and usage table, if the export sets it.
fn include_resources(
    tables: Option<&HashMap<String, HashMap<String, String>>>,
) -> Option<bool> {
    tables?
        .get(COST_AND_USAGE_TABLE)?
        .get(INCLUDE_RESOURCES_PROPERTY)
        .map(|value| value.trim().eq_ignore_ascii_case("TRUE"))
}

// =============================================================================
// BCM Data Exports
// =============================================================================

impl From<&Export> for ExportDefinition {
    fn from(export: &Export) -> Self {
        let destination = export
            .destination_configurations()
            .and_then(|d| d.s3_destination());

        Self {
            name: export.name().to_string(),
            destination_bucket: destination
                .map(|d| d.s3_bucket().to_string())
                .unwrap_or_default(),
            compression: destination
                .and_then(|d| d.s3_output_configurations())
                .map(|o| o.compression().as_str().to_string())
                .unwrap_or_default(),
            additional_schema_elements: BTreeSet::new(),
            include_resources: include_resources(
                export.data_query().and_then(|q| q.table_configurations()),
            ),
        }
    }
}

/// BCM Data Exports catalog.
#[derive(Debug, Clone)]
pub struct DataExportsCatalog {
    settings: Arc<AwsSettings>,
}

impl DataExportsCatalog {
    #[must_use]
    pub const fn new(settings: Arc<AwsSettings>) -> Self {
        Self { settings }
    }

    fn client(
        &self,
        cred: &ResolvedCredential,
    ) -> Result<aws_sdk_bcmdataexports::Client, AccessFailure> {
        let mut builder = aws_sdk_bcmdataexports::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(self.settings.billing_region.clone()))
            .credentials_provider(static_credentials(cred)?)
            .timeout_config(self.settings.timeout_config())
            .retry_config(RetryConfig::disabled());
        if let Some(endpoint) = &self.settings.data_exports_endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        Ok(aws_sdk_bcmdataexports::Client::from_conf(builder.build()))
    }

    async fn fetch(
        &self,
        cred: &ResolvedCredential,
    ) -> Result<Vec<ExportDefinition>, AccessFailure> {
        let client = self.client(cred)?;

        let mut arns = Vec::new();
        let mut pages = client.list_exports().into_paginator().send();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| classify_sdk_error(&e))?;
            arns.extend(page.exports().iter().map(|r| r.export_arn().to_string()));
        }

        let mut definitions = Vec::with_capacity(arns.len());
        for arn in arns {
            let response = client
                .get_export()
                .export_arn(&arn)
                .send()
                .await
                .map_err(|e| classify_sdk_error(&e))?;
            if let Some(export) = response.export() {
                definitions.push(ExportDefinition::from(export));
            }
        }
        tracing::trace!(count = definitions.len(), "Listed data exports");
        Ok(definitions)
    }
}

impl ExportCatalog for DataExportsCatalog {
    fn api(&self) -> ExportApi {
        ExportApi::DataExports
    }

    fn list_exports<'a>(
        &'a self,
        cred: &'a ResolvedCredential,
    ) -> BoxFuture<'a, Result<Vec<ExportDefinition>, AccessFailure>> {
        Box::pin(self.fetch(cred))
    }
}

// =============================================================================
// Legacy Cost and Usage Reports
// =============================================================================

impl From<&ReportDefinition> for ExportDefinition {
    fn from(report: &ReportDefinition) -> Self {
        Self {
            name: report.report_name().to_string(),
            destination_bucket: report.s3_bucket().to_string(),
            compression: report.compression().as_str().to_string(),
            additional_schema_elements: report
                .additional_schema_elements()
                .iter()
                .map(|e| e.as_str().to_string())
                .collect(),
            include_resources: None,
        }
    }
}

/// Legacy CUR report definitions catalog.
#[derive(Debug, Clone)]
pub struct CostAndUsageReportCatalog {
    settings: Arc<AwsSettings>,
}

impl CostAndUsageReportCatalog {
    #[must_use]
    pub const fn new(settings: Arc<AwsSettings>) -> Self {
        Self { settings }
    }

    fn client(
        &self,
        cred: &ResolvedCredential,
    ) -> Result<aws_sdk_costandusagereportservice::Client, AccessFailure> {
        let mut builder = aws_sdk_costandusagereportservice::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(self.settings.billing_region.clone()))
            .credentials_provider(static_credentials(cred)?)
            .timeout_config(self.settings.timeout_config())
            .retry_config(RetryConfig::disabled());
        if let Some(endpoint) = &self.settings.cur_endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        Ok(aws_sdk_costandusagereportservice::Client::from_conf(
            builder.build(),
        ))
    }

    async fn fetch(
        &self,
        cred: &ResolvedCredential,
    ) -> Result<Vec<ExportDefinition>, AccessFailure> {
        let client = self.client(cred)?;

        let mut definitions = Vec::new();
        let mut pages = client
            .describe_report_definitions()
            .max_results(CUR_PAGE_SIZE)
            .into_paginator()
            .send();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| classify_sdk_error(&e))?;
            definitions.extend(page.report_definitions().iter().map(ExportDefinition::from));
        }
        Ok(definitions)
    }
}

impl ExportCatalog for CostAndUsageReportCatalog {
    fn api(&self) -> ExportApi {
        ExportApi::CostAndUsageReport
    }

    fn list_exports<'a>(
        &'a self,
        cred: &'a ResolvedCredential,
    ) -> BoxFuture<'a, Result<Vec<ExportDefinition>, AccessFailure>> {
        Box::pin(self.fetch(cred))
    }
}
