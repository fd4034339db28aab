use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::DataSource;
use crate::client::Client;
use crate::error::ProviderError;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Schema};

/// `nodeping_checks`: every check, optionally filtered by type.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChecksDataSource;

fn check_summary_type() -> AttributeType {
    AttributeType::object([
        ("id", AttributeType::String),
        ("customer_id", AttributeType::String),
        ("type", AttributeType::String),
        ("target", AttributeType::String),
        ("label", AttributeType::String),
        ("enabled", AttributeType::Bool),
        ("interval", AttributeType::Float64),
        ("state", AttributeType::Int64),
        ("tags", AttributeType::list(AttributeType::String)),
    ])
}

#[async_trait]
impl DataSource for ChecksDataSource {
    fn type_name(&self) -> &'static str {
        "nodeping_checks"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("Fetches all NodePing checks with optional filtering.")
            .with_attribute(
                "type",
                Attribute::optional_string()
                    .with_description("Only return checks of this type (e.g. HTTP, PING)."),
            )
            .with_attribute(
                "checks",
                Attribute::new(
                    AttributeType::list(check_summary_type()),
                    AttributeFlags::computed(),
                )
                .with_description("List of checks, ordered by id."),
            )
    }

    async fn read(&self, client: &Client, config: Value) -> Result<Value, ProviderError> {
        let type_filter = config
            .get("type")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        debug!(type_filter = type_filter.as_deref().unwrap_or(""), "Reading checks data source");

        let checks = client
            .list_checks()
            .await
            .map_err(|e| ProviderError::from(e).with_context("Could not list checks"))?;

        // BTreeMap iteration keeps the output sorted by id.
        let summaries: Vec<Value> = checks
            .iter()
            .filter(|(_, check)| {
                type_filter
                    .as_deref()
                    .map_or(true, |t| check.check_type == t)
            })
            .map(|(id, check)| {
                json!({
                    "id": id,
                    "customer_id": check.customer_id,
                    "type": check.check_type,
                    "target": check.parameters.target,
                    "label": check.label,
                    "enabled": check.is_enabled(),
                    "interval": check.interval(),
                    "state": check.state,
                    "tags": check.tags,
                })
            })
            .collect();

        debug!(count = summaries.len(), "Listed checks");
        Ok(json!({
            "type": type_filter,
            "checks": summaries,
        }))
    }
}
