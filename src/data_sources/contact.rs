use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::{config_id, DataSource};
use crate::client::Client;
use crate::error::ProviderError;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Schema};

/// `nodeping_contact`: one contact by id.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactDataSource;

#[async_trait]
impl DataSource for ContactDataSource {
    fn type_name(&self) -> &'static str {
        "nodeping_contact"
    }

    fn schema(&self) -> Schema {
        let address = AttributeType::object([
            ("id", AttributeType::String),
            ("type", AttributeType::String),
            ("address", AttributeType::String),
            ("suppress_up", AttributeType::Bool),
            ("suppress_down", AttributeType::Bool),
            ("suppress_first", AttributeType::Bool),
            ("suppress_diag", AttributeType::Bool),
            ("suppress_all", AttributeType::Bool),
        ]);

        Schema::v0()
            .with_description("Fetches a NodePing contact by ID.")
            .with_attribute(
                "id",
                Attribute::required_string()
                    .with_description("The unique identifier of the contact."),
            )
            .with_attribute("customer_id", Attribute::computed_string())
            .with_attribute("name", Attribute::computed_string())
            .with_attribute(
                "custrole",
                Attribute::computed_string().with_description("The permission role for this contact."),
            )
            .with_attribute(
                "addresses",
                Attribute::new(
                    AttributeType::list(address),
                    AttributeFlags::computed().sensitive(),
                )
                .with_description("Contact addresses for receiving notifications."),
            )
    }

    async fn read(&self, client: &Client, config: Value) -> Result<Value, ProviderError> {
        let id = config_id(&config)?;
        debug!(id = %id, "Reading contact data source");

        let contact = client.get_contact(&id).await.map_err(|e| {
            ProviderError::from(e).with_context(format!("Could not read contact ID {}", id))
        })?;

        let addresses: Vec<Value> = contact
            .addresses
            .iter()
            .map(|(address_id, address)| {
                json!({
                    "id": address_id,
                    "type": address.address_type,
                    "address": address.address,
                    "suppress_up": address.suppressup,
                    "suppress_down": address.suppressdown,
                    "suppress_first": address.suppressfirst,
                    "suppress_diag": address.suppressdiag,
                    "suppress_all": address.suppressall,
                })
            })
            .collect();

        Ok(json!({
            "id": id,
            "customer_id": contact.customer_id,
            "name": contact.name,
            "custrole": contact.custrole,
            "addresses": addresses,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_read_contact() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contacts/C1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_id": "C1",
                "customer_id": "CUST",
                "name": "Ops",
                "custrole": "view",
                "addresses": {
                    "Z9": {"address": "+15555550100", "type": "sms"},
                    "A1": {"address": "ops@example.com", "type": "email", "suppressall": true}
                }
            })))
            .mount(&server)
            .await;

        let client = Client::new(ClientConfig {
            api_token: "token".to_string(),
            base_url: Some(server.uri()),
            ..Default::default()
        })
        .unwrap();
        let state = ContactDataSource
            .read(&client, json!({"id": "C1"}))
            .await
            .unwrap();

        assert_eq!(state["custrole"], "view");
        assert_eq!(state["addresses"][0]["id"], "A1");
        assert_eq!(state["addresses"][0]["suppress_all"], true);
        assert_eq!(state["addresses"][1]["type"], "sms");
    }
}
