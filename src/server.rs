//! gRPC server for the Hemmer provider protocol.
//!
//! [`ProviderService`] is the JSON-level interface the provider implements;
//! [`serve`] wraps it in the generated gRPC service, prints the handshake
//! line and serves until SIGTERM or SIGINT.
//!
//! # Shutdown
//!
//! On a signal the server stops accepting connections and gives in-flight
//! requests [`ServeOptions::shutdown_timeout`] to finish. Whatever happens,
//! [`ProviderService::stop`] is called before returning.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tonic::transport::Server;
use tracing::{debug, error, info, instrument, warn};

use crate::error::ProviderError;
use crate::generated;
use crate::schema::{Block, BlockNestingMode, Diagnostic, DiagnosticSeverity, ProviderSchema, Schema};
use crate::types::{
    ImportedResource, PlanResult, ProviderMetadata, HANDSHAKE_PREFIX, PROTOCOL_VERSION,
};

/// The provider surface, with state and configuration as JSON.
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    /// Provider, resource and data source schemas.
    fn schema(&self) -> ProviderSchema;

    /// Type names and capabilities. Derived from [`schema`](Self::schema) by
    /// default, names sorted.
    fn metadata(&self) -> ProviderMetadata {
        let schema = self.schema();
        let mut resources: Vec<String> = schema.resources.keys().cloned().collect();
        let mut data_sources: Vec<String> = schema.data_sources.keys().cloned().collect();
        resources.sort();
        data_sources.sort();
        ProviderMetadata {
            resources,
            data_sources,
            capabilities: Default::default(),
        }
    }

    /// Check the provider block before [`configure`](Self::configure).
    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Ok(vec![])
    }

    /// Apply the provider block.
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Release resources before exit.
    async fn stop(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Check a resource configuration.
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (resource_type, config);
        Ok(vec![])
    }

    /// Migrate state written by an older schema version. Identity by default.
    async fn upgrade_resource_state(
        &self,
        resource_type: &str,
        version: i64,
        state: Value,
    ) -> Result<Value, ProviderError> {
        let _ = (resource_type, version);
        Ok(state)
    }

    /// Plan a change. `prior_state` is `None` on create; a `null`
    /// `proposed_state` plans a destroy.
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError>;

    /// Create a resource from its planned state.
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError>;

    /// Refresh a resource. `null` means it no longer exists.
    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError>;

    /// Update a resource in place.
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete a resource.
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError>;

    /// Import an existing object by id.
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let _ = id;
        Err(ProviderError::Unimplemented(format!(
            "Import not supported for resource type: {}",
            resource_type
        )))
    }

    /// Check a data source configuration.
    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (data_source_type, config);
        Ok(vec![])
    }

    /// Read a data source.
    async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let _ = config;
        Err(ProviderError::UnknownResource(format!(
            "Unknown data source type: {}",
            data_source_type
        )))
    }
}

/// Adapts a [`ProviderService`] to the generated gRPC trait.
struct ProviderGrpcService<P: ProviderService> {
    provider: Arc<P>,
}

/// Empty payloads decode to `null`.
fn decode(bytes: &[u8]) -> Result<Value, ProviderError> {
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(bytes)?)
}

fn encode(value: &Value) -> Vec<u8> {
    serde_json::to_vec(value).unwrap_or_default()
}

fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

fn diagnostics_to_proto(diagnostics: Vec<Diagnostic>) -> Vec<generated::Diagnostic> {
    diagnostics
        .into_iter()
        .map(|d| generated::Diagnostic {
            severity: match d.severity {
                DiagnosticSeverity::Error => generated::diagnostic::Severity::Error as i32,
                DiagnosticSeverity::Warning => generated::diagnostic::Severity::Warning as i32,
            },
            summary: d.summary,
            detail: d.detail.unwrap_or_default(),
            attribute: d.attribute.unwrap_or_default(),
        })
        .collect()
}

fn error_to_diagnostics(err: ProviderError) -> Vec<generated::Diagnostic> {
    let detail = match &err {
        ProviderError::Serialization(e) => e.to_string(),
        ProviderError::Transport(e) => e.to_string(),
        other => other.message().to_string(),
    };
    vec![generated::Diagnostic {
        severity: generated::diagnostic::Severity::Error as i32,
        summary: err.summary().to_string(),
        detail,
        attribute: String::new(),
    }]
}

fn schema_to_proto(schema: &Schema) -> generated::Schema {
    generated::Schema {
        version: schema.version as i64,
        block: Some(block_to_proto(&schema.block)),
    }
}

fn block_to_proto(block: &Block) -> generated::Block {
    let mut attributes: Vec<generated::Attribute> = block
        .attributes
        .iter()
        .map(|(name, attr)| generated::Attribute {
            name: name.clone(),
            r#type: serde_json::to_vec(&attr.attr_type).unwrap_or_default(),
            required: attr.flags.required,
            optional: attr.flags.optional,
            computed: attr.flags.computed,
            sensitive: attr.flags.sensitive,
            description: attr.description.clone().unwrap_or_default(),
            force_new: attr.force_new,
            default_value: attr.default.as_ref().map(encode).unwrap_or_default(),
        })
        .collect();
    attributes.sort_by(|a, b| a.name.cmp(&b.name));

    let mut block_types: Vec<generated::NestedBlock> = block
        .blocks
        .iter()
        .map(|(name, nested)| generated::NestedBlock {
            type_name: name.clone(),
            block: Some(block_to_proto(&nested.block)),
            nesting_mode: match nested.nesting_mode {
                BlockNestingMode::Single => generated::nested_block::NestingMode::Single as i32,
                BlockNestingMode::List => generated::nested_block::NestingMode::List as i32,
                BlockNestingMode::Set => generated::nested_block::NestingMode::Set as i32,
                BlockNestingMode::Map => generated::nested_block::NestingMode::Map as i32,
            },
            min_items: nested.min_items as i32,
            max_items: nested.max_items as i32,
        })
        .collect();
    block_types.sort_by(|a, b| a.type_name.cmp(&b.type_name));

    generated::Block {
        attributes,
        block_types,
        description: block.description.clone().unwrap_or_default(),
    }
}

/// Log the outcome of a validation call.
fn log_validation(kind: &str, type_name: &str, diagnostics: &[Diagnostic]) {
    if has_errors(diagnostics) {
        warn!(
            type_name,
            diagnostics = diagnostics.len(),
            "{} completed with errors",
            kind
        );
    } else {
        debug!(type_name, "{} completed", kind);
    }
}

#[tonic::async_trait]
impl<P: ProviderService> generated::provider_server::Provider for ProviderGrpcService<P> {
    #[instrument(skip(self, _request), name = "grpc.get_metadata")]
    async fn get_metadata(
        &self,
        _request: tonic::Request<generated::GetMetadataRequest>,
    ) -> Result<tonic::Response<generated::GetMetadataResponse>, tonic::Status> {
        let metadata = self.provider.metadata();
        debug!(
            resources = metadata.resources.len(),
            data_sources = metadata.data_sources.len(),
            "GetMetadata completed"
        );
        Ok(tonic::Response::new(generated::GetMetadataResponse {
            server_capabilities: Some(generated::ServerCapabilities {
                plan_destroy: metadata.capabilities.plan_destroy,
            }),
            resources: metadata.resources,
            data_sources: metadata.data_sources,
            diagnostics: vec![],
        }))
    }

    #[instrument(skip(self, _request), name = "grpc.get_schema")]
    async fn get_schema(
        &self,
        _request: tonic::Request<generated::GetSchemaRequest>,
    ) -> Result<tonic::Response<generated::GetSchemaResponse>, tonic::Status> {
        let schema = self.provider.schema();
        debug!(
            resources = schema.resources.len(),
            data_sources = schema.data_sources.len(),
            "GetSchema completed"
        );
        Ok(tonic::Response::new(generated::GetSchemaResponse {
            provider: Some(schema_to_proto(&schema.provider)),
            resources: schema
                .resources
                .iter()
                .map(|(k, v)| (k.clone(), schema_to_proto(v)))
                .collect(),
            data_sources: schema
                .data_sources
                .iter()
                .map(|(k, v)| (k.clone(), schema_to_proto(v)))
                .collect(),
            diagnostics: vec![],
        }))
    }

    #[instrument(skip(self, request), name = "grpc.validate_provider_config")]
    async fn validate_provider_config(
        &self,
        request: tonic::Request<generated::ValidateProviderConfigRequest>,
    ) -> Result<tonic::Response<generated::ValidateProviderConfigResponse>, tonic::Status> {
        let req = request.into_inner();
        let result = match decode(&req.config) {
            Ok(config) => self.provider.validate_provider_config(config).await,
            Err(e) => Err(e),
        };

        let diagnostics = match result {
            Ok(diagnostics) => {
                log_validation("ValidateProviderConfig", "provider", &diagnostics);
                diagnostics_to_proto(diagnostics)
            },
            Err(e) => {
                error!(error = %e, "ValidateProviderConfig failed");
                error_to_diagnostics(e)
            },
        };
        Ok(tonic::Response::new(generated::ValidateProviderConfigResponse { diagnostics }))
    }

    #[instrument(skip(self, request), name = "grpc.configure")]
    async fn configure(
        &self,
        request: tonic::Request<generated::ConfigureRequest>,
    ) -> Result<tonic::Response<generated::ConfigureResponse>, tonic::Status> {
        let req = request.into_inner();
        let result = match decode(&req.config) {
            Ok(config) => self.provider.configure(config).await,
            Err(e) => Err(e),
        };

        let diagnostics = match result {
            Ok(diagnostics) => {
                if has_errors(&diagnostics) {
                    warn!(diagnostics = diagnostics.len(), "Configure completed with errors");
                } else {
                    info!("Configure completed");
                }
                diagnostics_to_proto(diagnostics)
            },
            Err(e) => {
                error!(error = %e, "Configure failed");
                error_to_diagnostics(e)
            },
        };
        Ok(tonic::Response::new(generated::ConfigureResponse { diagnostics }))
    }

    #[instrument(skip(self, _request), name = "grpc.stop")]
    async fn stop(
        &self,
        _request: tonic::Request<generated::StopRequest>,
    ) -> Result<tonic::Response<generated::StopResponse>, tonic::Status> {
        info!("Stop called");
        let error = match self.provider.stop().await {
            Ok(()) => String::new(),
            Err(e) => {
                error!(error = %e, "Stop failed");
                e.to_string()
            },
        };
        Ok(tonic::Response::new(generated::StopResponse { error }))
    }

    #[instrument(skip(self, request), name = "grpc.validate_resource_config", fields(resource_type))]
    async fn validate_resource_config(
        &self,
        request: tonic::Request<generated::ValidateResourceConfigRequest>,
    ) -> Result<tonic::Response<generated::ValidateResourceConfigResponse>, tonic::Status> {
        let req = request.into_inner();
        tracing::Span::current().record("resource_type", req.resource_type.as_str());

        let result = match decode(&req.config) {
            Ok(config) => {
                self.provider
                    .validate_resource_config(&req.resource_type, config)
                    .await
            },
            Err(e) => Err(e),
        };

        let diagnostics = match result {
            Ok(diagnostics) => {
                log_validation("ValidateResourceConfig", &req.resource_type, &diagnostics);
                diagnostics_to_proto(diagnostics)
            },
            Err(e) => {
                error!(error = %e, "ValidateResourceConfig failed");
                error_to_diagnostics(e)
            },
        };
        Ok(tonic::Response::new(generated::ValidateResourceConfigResponse { diagnostics }))
    }

    #[instrument(skip(self, request), name = "grpc.upgrade_resource_state", fields(resource_type))]
    async fn upgrade_resource_state(
        &self,
        request: tonic::Request<generated::UpgradeResourceStateRequest>,
    ) -> Result<tonic::Response<generated::UpgradeResourceStateResponse>, tonic::Status> {
        let req = request.into_inner();
        tracing::Span::current().record("resource_type", req.resource_type.as_str());

        let result = match decode(&req.raw_state) {
            Ok(state) => {
                self.provider
                    .upgrade_resource_state(&req.resource_type, req.version, state)
                    .await
            },
            Err(e) => Err(e),
        };

        let response = match result {
            Ok(upgraded) => {
                debug!(from_version = req.version, "UpgradeResourceState completed");
                generated::UpgradeResourceStateResponse {
                    upgraded_state: encode(&upgraded),
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(version = req.version, error = %e, "UpgradeResourceState failed");
                generated::UpgradeResourceStateResponse {
                    upgraded_state: vec![],
                    diagnostics: error_to_diagnostics(e),
                }
            },
        };
        Ok(tonic::Response::new(response))
    }

    #[instrument(skip(self, request), name = "grpc.plan", fields(resource_type))]
    async fn plan(
        &self,
        request: tonic::Request<generated::PlanRequest>,
    ) -> Result<tonic::Response<generated::PlanResponse>, tonic::Status> {
        let req = request.into_inner();
        tracing::Span::current().record("resource_type", req.resource_type.as_str());

        let decoded = decode(&req.prior_state).and_then(|prior| {
            let prior = Some(prior).filter(|p| !p.is_null());
            Ok((prior, decode(&req.proposed_state)?, decode(&req.config)?))
        });
        let result = match decoded {
            Ok((prior, proposed, config)) => {
                debug!(
                    is_create = prior.is_none(),
                    is_destroy = proposed.is_null(),
                    "Plan called"
                );
                self.provider
                    .plan(&req.resource_type, prior, proposed, config)
                    .await
            },
            Err(e) => Err(e),
        };

        let response = match result {
            Ok(result) => {
                info!(
                    changes = result.changes.len(),
                    requires_replace = result.requires_replace,
                    "Plan completed"
                );
                generated::PlanResponse {
                    planned_state: encode(&result.planned_state),
                    changes: result.changes.into_iter().map(Into::into).collect(),
                    requires_replace: result.requires_replace,
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(error = %e, "Plan failed");
                generated::PlanResponse {
                    planned_state: vec![],
                    changes: vec![],
                    requires_replace: false,
                    diagnostics: error_to_diagnostics(e),
                }
            },
        };
        Ok(tonic::Response::new(response))
    }

    #[instrument(skip(self, request), name = "grpc.create", fields(resource_type))]
    async fn create(
        &self,
        request: tonic::Request<generated::CreateRequest>,
    ) -> Result<tonic::Response<generated::CreateResponse>, tonic::Status> {
        let req = request.into_inner();
        tracing::Span::current().record("resource_type", req.resource_type.as_str());

        let result = match decode(&req.planned_state) {
            Ok(planned) => self.provider.create(&req.resource_type, planned).await,
            Err(e) => Err(e),
        };

        let response = match result {
            Ok(state) => {
                info!("Create completed");
                generated::CreateResponse {
                    state: encode(&state),
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(error = %e, "Create failed");
                generated::CreateResponse {
                    state: vec![],
                    diagnostics: error_to_diagnostics(e),
                }
            },
        };
        Ok(tonic::Response::new(response))
    }

    #[instrument(skip(self, request), name = "grpc.read", fields(resource_type))]
    async fn read(
        &self,
        request: tonic::Request<generated::ReadRequest>,
    ) -> Result<tonic::Response<generated::ReadResponse>, tonic::Status> {
        let req = request.into_inner();
        tracing::Span::current().record("resource_type", req.resource_type.as_str());

        let result = match decode(&req.current_state) {
            Ok(current) => self.provider.read(&req.resource_type, current).await,
            Err(e) => Err(e),
        };

        let response = match result {
            Ok(state) => {
                if state.is_null() {
                    info!("Read found the resource gone");
                } else {
                    debug!("Read completed");
                }
                generated::ReadResponse {
                    state: encode(&state),
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(error = %e, "Read failed");
                generated::ReadResponse {
                    state: vec![],
                    diagnostics: error_to_diagnostics(e),
                }
            },
        };
        Ok(tonic::Response::new(response))
    }

    #[instrument(skip(self, request), name = "grpc.update", fields(resource_type))]
    async fn update(
        &self,
        request: tonic::Request<generated::UpdateRequest>,
    ) -> Result<tonic::Response<generated::UpdateResponse>, tonic::Status> {
        let req = request.into_inner();
        tracing::Span::current().record("resource_type", req.resource_type.as_str());

        let decoded = decode(&req.prior_state)
            .and_then(|prior| Ok((prior, decode(&req.planned_state)?)));
        let result = match decoded {
            Ok((prior, planned)) => {
                self.provider
                    .update(&req.resource_type, prior, planned)
                    .await
            },
            Err(e) => Err(e),
        };

        let response = match result {
            Ok(state) => {
                info!("Update completed");
                generated::UpdateResponse {
                    state: encode(&state),
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(error = %e, "Update failed");
                generated::UpdateResponse {
                    state: vec![],
                    diagnostics: error_to_diagnostics(e),
                }
            },
        };
        Ok(tonic::Response::new(response))
    }

    #[instrument(skip(self, request), name = "grpc.delete", fields(resource_type))]
    async fn delete(
        &self,
        request: tonic::Request<generated::DeleteRequest>,
    ) -> Result<tonic::Response<generated::DeleteResponse>, tonic::Status> {
        let req = request.into_inner();
        tracing::Span::current().record("resource_type", req.resource_type.as_str());

        let result = match decode(&req.current_state) {
            Ok(current) => self.provider.delete(&req.resource_type, current).await,
            Err(e) => Err(e),
        };

        let diagnostics = match result {
            Ok(()) => {
                info!("Delete completed");
                vec![]
            },
            Err(e) => {
                error!(error = %e, "Delete failed");
                error_to_diagnostics(e)
            },
        };
        Ok(tonic::Response::new(generated::DeleteResponse { diagnostics }))
    }

    #[instrument(skip(self, request), name = "grpc.import_resource_state", fields(resource_type))]
    async fn import_resource_state(
        &self,
        request: tonic::Request<generated::ImportResourceStateRequest>,
    ) -> Result<tonic::Response<generated::ImportResourceStateResponse>, tonic::Status> {
        let req = request.into_inner();
        tracing::Span::current().record("resource_type", req.resource_type.as_str());
        info!(id = %req.id, "ImportResourceState called");

        let response = match self.provider.import_resource(&req.resource_type, &req.id).await {
            Ok(imported) => {
                info!(imported = imported.len(), "ImportResourceState completed");
                generated::ImportResourceStateResponse {
                    imported: imported
                        .into_iter()
                        .map(|r| generated::ImportedResource {
                            resource_type: r.resource_type,
                            state: encode(&r.state),
                        })
                        .collect(),
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(id = %req.id, error = %e, "ImportResourceState failed");
                generated::ImportResourceStateResponse {
                    imported: vec![],
                    diagnostics: error_to_diagnostics(e),
                }
            },
        };
        Ok(tonic::Response::new(response))
    }

    #[instrument(skip(self, request), name = "grpc.validate_data_source_config", fields(data_source_type))]
    async fn validate_data_source_config(
        &self,
        request: tonic::Request<generated::ValidateDataSourceConfigRequest>,
    ) -> Result<tonic::Response<generated::ValidateDataSourceConfigResponse>, tonic::Status> {
        let req = request.into_inner();
        tracing::Span::current().record("data_source_type", req.data_source_type.as_str());

        let result = match decode(&req.config) {
            Ok(config) => {
                self.provider
                    .validate_data_source_config(&req.data_source_type, config)
                    .await
            },
            Err(e) => Err(e),
        };

        let diagnostics = match result {
            Ok(diagnostics) => {
                log_validation("ValidateDataSourceConfig", &req.data_source_type, &diagnostics);
                diagnostics_to_proto(diagnostics)
            },
            Err(e) => {
                error!(error = %e, "ValidateDataSourceConfig failed");
                error_to_diagnostics(e)
            },
        };
        Ok(tonic::Response::new(generated::ValidateDataSourceConfigResponse { diagnostics }))
    }

    #[instrument(skip(self, request), name = "grpc.read_data_source", fields(data_source_type))]
    async fn read_data_source(
        &self,
        request: tonic::Request<generated::ReadDataSourceRequest>,
    ) -> Result<tonic::Response<generated::ReadDataSourceResponse>, tonic::Status> {
        let req = request.into_inner();
        tracing::Span::current().record("data_source_type", req.data_source_type.as_str());

        let result = match decode(&req.config) {
            Ok(config) => {
                self.provider
                    .read_data_source(&req.data_source_type, config)
                    .await
            },
            Err(e) => Err(e),
        };

        let response = match result {
            Ok(state) => {
                debug!("ReadDataSource completed");
                generated::ReadDataSourceResponse {
                    state: encode(&state),
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(error = %e, "ReadDataSource failed");
                generated::ReadDataSourceResponse {
                    state: vec![],
                    diagnostics: error_to_diagnostics(e),
                }
            },
        };
        Ok(tonic::Response::new(response))
    }
}

/// Options for [`serve_with_options`].
#[derive(Debug, Clone)]
pub struct ServeOptions {
    /// How long in-flight requests may run after a shutdown signal.
    /// Default: 30 seconds.
    pub shutdown_timeout: Duration,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl ServeOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shutdown timeout.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

/// Resolves on SIGTERM or SIGINT (CTRL+C on Windows). Never resolves if the
/// handlers cannot be installed.
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                    _ = sigint.recv() => info!("Received SIGINT, shutting down"),
                }
            },
            (Err(e), _) | (_, Err(e)) => {
                error!(error = %e, "Failed to install signal handlers");
                std::future::pending::<()>().await;
            },
        }
    }

    #[cfg(windows)]
    {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received CTRL+C, shutting down"),
            Err(e) => {
                error!(error = %e, "Failed to install CTRL+C handler");
                std::future::pending::<()>().await;
            },
        }
    }

    #[cfg(not(any(unix, windows)))]
    std::future::pending::<()>().await;
}

/// Serve on a free loopback port, print the handshake
/// `HEMMER_PROVIDER|1|<addr>` to stdout and run until a shutdown signal.
pub async fn serve<P: ProviderService>(provider: P) -> Result<(), Box<dyn std::error::Error>> {
    serve_with_options(provider, ServeOptions::default()).await
}

/// [`serve`] with custom options.
pub async fn serve_with_options<P: ProviderService>(
    provider: P,
    options: ServeOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    serve_on_listener(provider, listener, options, wait_for_shutdown_signal()).await
}

/// Serve on a bound listener until `shutdown` resolves.
///
/// The timeout in `options` only starts once `shutdown` has resolved.
pub async fn serve_on_listener<P, F>(
    provider: P,
    listener: TcpListener,
    options: ServeOptions,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    P: ProviderService,
    F: Future<Output = ()>,
{
    let addr = listener.local_addr()?;
    println!("{}|{}|{}", HANDSHAKE_PREFIX, PROTOCOL_VERSION, addr);
    info!(address = %addr, "Provider server starting");

    let provider = Arc::new(provider);
    let service = generated::provider_server::ProviderServer::new(ProviderGrpcService {
        provider: Arc::clone(&provider),
    });

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(
        Server::builder()
            .add_service(service)
            .serve_with_incoming_shutdown(
                tokio_stream::wrappers::TcpListenerStream::new(listener),
                async {
                    let _ = stop_rx.await;
                },
            ),
    );

    let finished = tokio::select! {
        result = &mut server => Some(result),
        _ = shutdown => None,
    };

    let outcome = match finished {
        Some(result) => result,
        None => {
            let _ = stop_tx.send(());
            match tokio::time::timeout(options.shutdown_timeout, &mut server).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        timeout = ?options.shutdown_timeout,
                        "Shutdown timeout exceeded, aborting in-flight requests"
                    );
                    server.abort();
                    Ok(Ok(()))
                },
            }
        },
    };

    debug!("Calling provider stop()");
    if let Err(e) = provider.stop().await {
        warn!(error = %e, "Provider stop() returned error");
    }

    match outcome {
        Ok(Ok(())) => {
            info!("Provider shutdown complete");
            Ok(())
        },
        Ok(Err(e)) => {
            error!(error = %e, "Server error");
            Err(e.into())
        },
        Err(e) => {
            error!(error = %e, "Server task failed");
            Err(e.into())
        },
    }
}
