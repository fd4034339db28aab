use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::DataSource;
use crate::client::Client;
use crate::error::ProviderError;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Schema};

/// `nodeping_contacts`: every contact of the account.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactsDataSource;

#[async_trait]
impl DataSource for ContactsDataSource {
    fn type_name(&self) -> &'static str {
        "nodeping_contacts"
    }

    fn schema(&self) -> Schema {
        let address = AttributeType::object([
            ("id", AttributeType::String),
            ("type", AttributeType::String),
            ("address", AttributeType::String),
        ]);
        let contact = AttributeType::object([
            ("id", AttributeType::String),
            ("customer_id", AttributeType::String),
            ("name", AttributeType::String),
            ("custrole", AttributeType::String),
            ("addresses", AttributeType::list(address)),
        ]);

        Schema::v0()
            .with_description("Fetches all NodePing contacts.")
            .with_attribute(
                "contacts",
                Attribute::new(
                    AttributeType::list(contact),
                    AttributeFlags::computed().sensitive(),
                )
                .with_description("List of contacts, ordered by id."),
            )
    }

    async fn read(&self, client: &Client, _config: Value) -> Result<Value, ProviderError> {
        debug!("Reading contacts data source");

        let contacts = client
            .list_contacts()
            .await
            .map_err(|e| ProviderError::from(e).with_context("Could not list contacts"))?;

        let contacts: Vec<Value> = contacts
            .iter()
            .map(|(id, contact)| {
                let addresses: Vec<Value> = contact
                    .addresses
                    .iter()
                    .map(|(address_id, address)| {
                        json!({
                            "id": address_id,
                            "type": address.address_type,
                            "address": address.address,
                        })
                    })
                    .collect();
                json!({
                    "id": id,
                    "customer_id": contact.customer_id,
                    "name": contact.name,
                    "custrole": contact.custrole,
                    "addresses": addresses,
                })
            })
            .collect();

        Ok(json!({ "contacts": contacts }))
    }
}
