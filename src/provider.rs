//! The NodePing provider: dispatches protocol calls to the resources and
//! data sources and owns the configured API client.

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::client::Client;
use crate::config::{self, ProviderConfig};
use crate::data_sources::{self, DataSource};
use crate::error::ProviderError;
use crate::resources::{self, Resource};
use crate::schema::{Diagnostic, ProviderSchema};
use crate::server::ProviderService;
use crate::types::{ImportedResource, PlanResult, ProviderMetadata, ServerCapabilities};
use crate::validation;

/// Hemmer provider for NodePing checks and contacts.
pub struct NodePingProvider {
    version: String,
    client: RwLock<Option<Client>>,
    resources: Vec<Box<dyn Resource>>,
    data_sources: Vec<Box<dyn DataSource>>,
}

impl NodePingProvider {
    /// An unconfigured provider reporting `version` in its user agent.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            client: RwLock::new(None),
            resources: resources::all(),
            data_sources: data_sources::all(),
        }
    }

    /// A provider that already holds `client`, skipping `configure`.
    pub fn with_client(version: impl Into<String>, client: Client) -> Self {
        let provider = Self::new(version);
        Self {
            client: RwLock::new(Some(client)),
            ..provider
        }
    }

    /// Version string passed at construction.
    pub fn version(&self) -> &str {
        &self.version
    }

    fn resource(&self, type_name: &str) -> Result<&dyn Resource, ProviderError> {
        self.resources
            .iter()
            .find(|r| r.type_name() == type_name)
            .map(|r| r.as_ref())
            .ok_or_else(|| {
                ProviderError::UnknownResource(format!("Unknown resource type: {}", type_name))
            })
    }

    fn data_source(&self, type_name: &str) -> Result<&dyn DataSource, ProviderError> {
        self.data_sources
            .iter()
            .find(|d| d.type_name() == type_name)
            .map(|d| d.as_ref())
            .ok_or_else(|| {
                ProviderError::UnknownResource(format!("Unknown data source type: {}", type_name))
            })
    }

    async fn client(&self) -> Result<Client, ProviderError> {
        self.client.read().await.clone().ok_or_else(|| {
            ProviderError::FailedPrecondition(
                "provider not configured: call Configure before managing NodePing objects"
                    .to_string(),
            )
        })
    }

    async fn default_tags(&self) -> Vec<String> {
        self.client
            .read()
            .await
            .as_ref()
            .map(|c| c.default_tags().to_vec())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl ProviderService for NodePingProvider {
    fn schema(&self) -> ProviderSchema {
        let mut schema = ProviderSchema::new().with_provider_config(config::schema());
        for resource in &self.resources {
            schema = schema.with_resource(resource.type_name(), resource.schema());
        }
        for data_source in &self.data_sources {
            schema = schema.with_data_source(data_source.type_name(), data_source.schema());
        }
        schema
    }

    fn metadata(&self) -> ProviderMetadata {
        let mut resources: Vec<String> =
            self.resources.iter().map(|r| r.type_name().to_string()).collect();
        let mut data_sources: Vec<String> = self
            .data_sources
            .iter()
            .map(|d| d.type_name().to_string())
            .collect();
        resources.sort();
        data_sources.sort();

        ProviderMetadata {
            resources,
            data_sources,
            capabilities: ServerCapabilities { plan_destroy: true },
        }
    }

    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let mut diagnostics = validation::validate(&config::schema(), &config);
        if diagnostics.iter().any(Diagnostic::is_error) {
            return Ok(diagnostics);
        }
        diagnostics.extend(ProviderConfig::from_value(&config)?.validate());
        Ok(diagnostics)
    }

    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        info!("Configuring NodePing provider");

        let config = ProviderConfig::from_value(&config)?.with_env(|k| std::env::var(k).ok());
        let diagnostics = config.validate();
        if diagnostics.iter().any(Diagnostic::is_error) {
            return Ok(diagnostics);
        }

        let client_config = match config.client_config(&self.version) {
            Ok(client_config) => client_config,
            Err(diagnostic) => return Ok(vec![diagnostic]),
        };
        debug!(config = %config::redacted(&client_config), "Creating NodePing client");

        let client = match Client::new(client_config) {
            Ok(client) => client,
            Err(e) => {
                return Ok(vec![Diagnostic::error("Unable to Create NodePing API Client")
                    .with_detail(format!(
                        "An unexpected error occurred when creating the NodePing API client: {}",
                        e
                    ))]);
            },
        };

        *self.client.write().await = Some(client);
        info!("Configured NodePing provider");
        Ok(diagnostics)
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        self.client.write().await.take();
        debug!("Released NodePing client");
        Ok(())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let resource = self.resource(resource_type)?;
        Ok(validation::validate(&resource.schema(), &config))
    }

    async fn upgrade_resource_state(
        &self,
        resource_type: &str,
        version: i64,
        state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let current = resource.schema().version as i64;
        if version > current {
            return Err(ProviderError::Validation(format!(
                "state for {} has schema version {}, newer than supported version {}",
                resource_type, version, current
            )));
        }
        Ok(state)
    }

    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let resource = self.resource(resource_type)?;
        let default_tags = self.default_tags().await;
        resource.plan(&default_tags, prior_state.as_ref(), proposed_state)
    }

    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        resource.create(&client, planned_state).await
    }

    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        if current_state.is_null() {
            return Ok(Value::Null);
        }
        let client = self.client().await?;
        resource.read(&client, current_state).await
    }

    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        resource.update(&client, prior_state, planned_state).await
    }

    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        let resource = self.resource(resource_type)?;
        if current_state.is_null() {
            return Ok(());
        }
        let client = self.client().await?;
        resource.delete(&client, current_state).await
    }

    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        let state = resource.import(&client, id).await?;
        Ok(vec![ImportedResource::new(resource_type, state)])
    }

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let data_source = self.data_source(data_source_type)?;
        Ok(validation::validate(&data_source.schema(), &config))
    }

    async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let data_source = self.data_source(data_source_type)?;
        let client = self.client().await?;
        data_source.read(&client, config).await
    }
}
