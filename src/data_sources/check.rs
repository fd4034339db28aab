use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::{config_id, DataSource};
use crate::client::models::{parse_i64, Check};
use crate::client::Client;
use crate::error::ProviderError;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Schema};

/// `nodeping_check`: one check by id.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckDataSource;

fn tags(check: &Check) -> Value {
    check.tags.as_ref().map_or(Value::Null, |tags| json!(tags))
}

fn check_state(id: &str, check: &Check) -> Value {
    let params = &check.parameters;
    json!({
        "id": id,
        "customer_id": check.customer_id,
        "type": check.check_type,
        "target": params.target,
        "label": check.label,
        "enabled": check.is_enabled(),
        "public": check.public,
        "interval": check.interval(),
        "threshold": params.threshold.as_ref().and_then(parse_i64),
        "sens": params.sens.as_ref().and_then(parse_i64),
        "state": check.state,
        "created": check.created,
        "modified": check.modified,
        "description": crate::resources::non_empty(&check.description),
        "tags": tags(check),
    })
}

#[async_trait]
impl DataSource for CheckDataSource {
    fn type_name(&self) -> &'static str {
        "nodeping_check"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("Fetches a NodePing check by ID.")
            .with_attribute(
                "id",
                Attribute::required_string().with_description("The unique identifier of the check."),
            )
            .with_attribute("customer_id", Attribute::computed_string())
            .with_attribute("type", Attribute::computed_string())
            .with_attribute(
                "target",
                Attribute::computed_string()
                    .with_description("The target URL, hostname, or IP address."),
            )
            .with_attribute("label", Attribute::computed_string())
            .with_attribute("enabled", Attribute::computed_bool())
            .with_attribute("public", Attribute::computed_bool())
            .with_attribute(
                "interval",
                Attribute::computed_float64().with_description("Check interval in minutes."),
            )
            .with_attribute(
                "threshold",
                Attribute::computed_int64().with_description("Timeout in seconds."),
            )
            .with_attribute(
                "sens",
                Attribute::computed_int64()
                    .with_description("Sensitivity (rechecks before status change)."),
            )
            .with_attribute(
                "state",
                Attribute::computed_int64().with_description("Current state (0 = failing, 1 = passing)."),
            )
            .with_attribute("created", Attribute::computed_int64())
            .with_attribute("modified", Attribute::computed_int64())
            .with_attribute("description", Attribute::computed_string())
            .with_attribute(
                "tags",
                Attribute::new(
                    AttributeType::list(AttributeType::String),
                    AttributeFlags::computed(),
                ),
            )
    }

    async fn read(&self, client: &Client, config: Value) -> Result<Value, ProviderError> {
        let id = config_id(&config)?;
        debug!(id = %id, "Reading check data source");

        let check = client.get_check(&id).await.map_err(|e| {
            ProviderError::from(e).with_context(format!("Could not read check ID {}", id))
        })?;
        Ok(check_state(&id, &check))
    }
}
