//! Helpers for exercising a provider without a gRPC server.
//!
//! ```ignore
//! use hemmer_provider_nodeping::testing::ProviderTester;
//! use serde_json::json;
//!
//! let tester = ProviderTester::nodeping(&mock_server.uri()).await?;
//! let state = tester
//!     .lifecycle_create("nodeping_check", json!({"type": "PING", "target": "example.com"}))
//!     .await?;
//! assert!(state["id"].is_string());
//! ```

use serde_json::{json, Value};
use thiserror::Error;

use crate::error::ProviderError;
use crate::provider::NodePingProvider;
use crate::schema::{Diagnostic, ProviderSchema};
use crate::server::ProviderService;
use crate::types::{ImportedResource, PlanResult};

/// Drives a [`ProviderService`] the way the host would.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl ProviderTester<NodePingProvider> {
    /// A NodePing provider configured against `api_url` with a fixed token
    /// and a generous rate limit.
    pub async fn nodeping(api_url: &str) -> Result<Self, TestError> {
        Self::nodeping_with(json!({"api_url": api_url})).await
    }

    /// A NodePing provider configured with `config`. `api_token` and
    /// `rate_limit` are filled in when absent.
    pub async fn nodeping_with(mut config: Value) -> Result<Self, TestError> {
        if let Some(obj) = config.as_object_mut() {
            obj.entry("api_token").or_insert_with(|| json!("test-token"));
            obj.entry("rate_limit").or_insert_with(|| json!(1000.0));
        }
        let tester = Self::new(NodePingProvider::new("0.0.0-test"));
        tester.configure(config).await?;
        Ok(tester)
    }
}

impl<P: ProviderService> ProviderTester<P> {
    /// Wrap `provider`.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The provider schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Resource type names, sorted.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    /// Data source type names, sorted.
    pub fn data_source_types(&self) -> Vec<String> {
        self.provider.metadata().data_sources
    }

    /// Validate the provider block. Error diagnostics become `Err`.
    pub async fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.validate_provider_config(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Configure the provider. Error diagnostics become `Err`.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Stop the provider.
    pub async fn stop(&self) -> Result<(), ProviderError> {
        self.provider.stop().await
    }

    /// Validate a resource configuration. Error diagnostics become `Err`.
    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_resource_config(resource_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Plan a create from `config`.
    pub async fn plan_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, None, config.clone(), config)
            .await
    }

    /// Plan moving `prior_state` to `config`.
    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), config.clone(), config)
            .await
    }

    /// Plan destroying `prior_state`.
    pub async fn plan_delete(
        &self,
        resource_type: &str,
        prior_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), Value::Null, Value::Null)
            .await
    }

    /// Create from a planned state.
    pub async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        self.provider.create(resource_type, planned_state).await
    }

    /// Refresh a state; `null` means gone.
    pub async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        self.provider.read(resource_type, current_state).await
    }

    /// Update in place.
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .update(resource_type, prior_state, planned_state)
            .await
    }

    /// Delete.
    pub async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        self.provider.delete(resource_type, current_state).await
    }

    /// Import by id.
    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    /// Validate a data source configuration. Error diagnostics become `Err`.
    pub async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_data_source_config(data_source_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Read a data source.
    pub async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.read_data_source(data_source_type, config).await
    }

    /// Validate, plan, create, then read back.
    pub async fn lifecycle_create(&self, resource_type: &str, config: Value) -> Result<Value, TestError> {
        self.validate_resource_config(resource_type, config.clone())
            .await?;
        let plan = self.plan_create(resource_type, config).await?;
        let created = self.create(resource_type, plan.planned_state).await?;
        Ok(self.read(resource_type, created).await?)
    }

    /// Validate, plan, update, then read back.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<Value, TestError> {
        self.validate_resource_config(resource_type, config.clone())
            .await?;
        let plan = self
            .plan_update(resource_type, prior_state.clone(), config)
            .await?;
        let updated = self
            .update(resource_type, prior_state, plan.planned_state)
            .await?;
        Ok(self.read(resource_type, updated).await?)
    }

    /// Plan the destroy, delete, then confirm the read comes back `null`.
    pub async fn lifecycle_delete(&self, resource_type: &str, current_state: Value) -> Result<(), TestError> {
        let plan = self
            .plan_delete(resource_type, current_state.clone())
            .await?;
        if !plan.planned_state.is_null() {
            return Err(TestError::Unexpected(
                "destroy plan did not produce a null planned state".to_string(),
            ));
        }
        self.delete(resource_type, current_state.clone()).await?;

        let after = self.read(resource_type, current_state).await?;
        if !after.is_null() {
            return Err(TestError::Unexpected(format!(
                "{} still readable after delete",
                resource_type
            )));
        }
        Ok(())
    }

    /// Create, update, then delete. Returns the state after the update.
    pub async fn lifecycle_crud(
        &self,
        resource_type: &str,
        initial_config: Value,
        updated_config: Value,
    ) -> Result<Value, TestError> {
        let created = self.lifecycle_create(resource_type, initial_config).await?;
        let updated = self
            .lifecycle_update(resource_type, created, updated_config)
            .await?;
        self.lifecycle_delete(resource_type, updated.clone()).await?;
        Ok(updated)
    }
}

/// Failure of a [`ProviderTester`] operation.
#[derive(Debug, Error)]
pub enum TestError {
    /// The call returned error diagnostics.
    #[error("operation failed with diagnostics: {}", format_diagnostics(.0))]
    Diagnostics(Vec<Diagnostic>),

    /// The call returned an error.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// A lifecycle step produced an unexpected result.
    #[error("unexpected result: {0}")]
    Unexpected(String),
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| {
            let mut line = d.summary.clone();
            if let Some(detail) = &d.detail {
                line.push_str(": ");
                line.push_str(detail);
            }
            if let Some(attribute) = &d.attribute {
                line.push_str(&format!(" (at {})", attribute));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics.into_iter().filter(Diagnostic::is_error).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

/// Panics unless the plan has changes and no replacement.
pub fn assert_plan_creates(plan: &PlanResult) {
    assert!(
        !plan.changes.is_empty(),
        "Expected plan to have changes for create, but got no changes"
    );
    assert!(!plan.requires_replace, "Expected plan to create, not replace");
}

/// Panics if the plan has any changes.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        plan.changes.is_empty(),
        "Expected no changes, but got {} change(s): {:?}",
        plan.changes.len(),
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Panics unless the plan changes `path`.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    assert!(
        plan.changes.iter().any(|c| c.path == path),
        "Expected plan to change attribute '{}'. Changed attributes: {:?}",
        path,
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Panics if the plan changes `path`.
pub fn assert_plan_does_not_change_attribute(plan: &PlanResult, path: &str) {
    assert!(
        !plan.changes.iter().any(|c| c.path == path),
        "Expected plan to not change attribute '{}', but it was changed",
        path
    );
}

/// Panics unless an error diagnostic mentions `substring` in its summary
/// or detail.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    let matches = diagnostics.iter().filter(|d| d.is_error()).any(|d| {
        d.summary.contains(substring)
            || d.detail.as_deref().is_some_and(|detail| detail.contains(substring))
    });
    assert!(
        matches,
        "Expected an error containing '{}'. Errors: {:?}",
        substring,
        diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| &d.summary)
            .collect::<Vec<_>>()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tester() -> ProviderTester<NodePingProvider> {
        ProviderTester::new(NodePingProvider::new("0.0.0-test"))
    }

    #[test]
    fn test_types() {
        let tester = tester();
        assert_eq!(tester.resource_types(), vec!["nodeping_check", "nodeping_contact"]);
        assert_eq!(tester.data_source_types().len(), 4);
        assert!(tester.schema().resources.contains_key("nodeping_check"));
    }

    #[tokio::test]
    async fn test_plan_helpers() {
        let tester = tester();
        let config = json!({"type": "HTTP", "target": "https://example.com"});

        let plan = tester.plan_create("nodeping_check", config.clone()).await.unwrap();
        assert_plan_creates(&plan);
        assert_plan_changes_attribute(&plan, "target");

        let mut prior = plan.planned_state;
        prior["id"] = json!("C1");
        let plan = tester.plan_update("nodeping_check", prior.clone(), config).await.unwrap();
        assert_plan_no_changes(&plan);
        assert_eq!(plan.planned_state["id"], "C1");

        let plan = tester.plan_delete("nodeping_check", prior).await.unwrap();
        assert!(plan.planned_state.is_null());
    }

    #[tokio::test]
    async fn test_validate_resource_config_errors() {
        let err = tester()
            .validate_resource_config("nodeping_check", json!({"type": "NOPE"}))
            .await
            .unwrap_err();
        match err {
            TestError::Diagnostics(diags) => assert_error_contains(&diags, "NOPE"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_configure_without_token_fails() {
        if std::env::var_os("NODEPING_API_TOKEN").is_some()
            || std::env::var_os("NODEPING_API_KEY").is_some()
        {
            return;
        }
        let err = tester().configure(json!({})).await.unwrap_err();
        assert!(err.to_string().contains("Missing NodePing API Token"));
    }

    #[test]
    fn test_error_display() {
        let err = TestError::Diagnostics(vec![
            Diagnostic::error("First error").with_attribute("label"),
            Diagnostic::error("Second error").with_detail("More info"),
        ]);
        let display = err.to_string();
        assert!(display.contains("First error (at label)"));
        assert!(display.contains("Second error: More info"));
    }

    #[test]
    #[should_panic(expected = "Expected no changes")]
    fn test_assert_plan_no_changes_fails() {
        let plan = PlanResult::with_changes(
            json!({}),
            vec![crate::types::AttributeChange::added("label", json!("x"))],
            false,
        );
        assert_plan_no_changes(&plan);
    }
}
