use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use super::{
    as_object, get_bool, get_i64, get_str, get_string, get_string_map, non_empty, non_empty_map,
    parse_import_id, scoped_client, state_id, Resource,
};
use crate::client::models::{
    Contact, ContactAddress, ContactCreateRequest, ContactUpdateRequest, NewAddress,
};
use crate::client::Client;
use crate::error::ProviderError;
use crate::plan;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Block, NestedBlock, Schema, Validator};

/// Address types accepted by NodePing.
pub const ADDRESS_TYPES: [&str; 8] = [
    "email", "sms", "webhook", "slack", "hipchat", "pushover", "pagerduty", "voice",
];

/// `nodeping_contact`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactResource;

fn string_map() -> Attribute {
    Attribute::new(
        AttributeType::map(AttributeType::String),
        AttributeFlags::optional(),
    )
}

fn flag(description: &str) -> Attribute {
    Attribute::with_default_value(AttributeType::Bool, json!(false)).with_description(description)
}

fn address_block() -> Block {
    Block::new()
        .with_description("Notification addresses for this contact.")
        .with_attribute(
            "id",
            Attribute::computed_string().with_description("The address ID assigned by NodePing."),
        )
        .with_attribute(
            "type",
            Attribute::required_string()
                .with_validator(Validator::one_of(&ADDRESS_TYPES))
                .with_description("The address type."),
        )
        .with_attribute(
            "address",
            Attribute::required_string()
                .sensitive()
                .with_description("Email, phone number, or URL depending on type."),
        )
        .with_attribute("suppress_up", flag("Don't send 'up' notifications."))
        .with_attribute("suppress_down", flag("Don't send 'down' notifications."))
        .with_attribute("suppress_first", flag("Don't send 'first result' notifications."))
        .with_attribute("suppress_diag", flag("Don't send diagnostic notifications."))
        .with_attribute("suppress_all", flag("Suppress all notifications."))
        .with_attribute("mute", flag("Mute this address."))
        .with_attribute(
            "action",
            Attribute::optional_string()
                .with_validator(Validator::one_of(&["get", "put", "post", "head", "delete"]))
                .with_description("HTTP method for webhooks."),
        )
        .with_attribute(
            "headers",
            string_map().with_description("HTTP headers for webhooks."),
        )
        .with_attribute(
            "querystrings",
            string_map().with_description("Query string parameters for webhooks."),
        )
        .with_attribute(
            "data",
            Attribute::optional_string().with_description("JSON body for webhooks."),
        )
        .with_attribute(
            "priority",
            Attribute::optional_int64().with_description("Pushover priority (-2 to 2)."),
        )
}

fn contact_schema() -> Schema {
    Schema::v0()
        .with_description("Manages a NodePing contact.")
        .with_attribute(
            "id",
            Attribute::computed_string().with_description("The unique identifier of the contact."),
        )
        .with_attribute("customer_id", Attribute::computed_string())
        .with_attribute(
            "name",
            Attribute::optional_string().with_description("Name of the contact."),
        )
        .with_attribute(
            "custrole",
            Attribute::with_default_value(AttributeType::String, json!("notify"))
                .with_validator(Validator::one_of(&["edit", "view", "notify"]))
                .with_description("Contact role: edit, view, or notify."),
        )
        .with_block("addresses", NestedBlock::list(address_block()))
}

fn planned_addresses(planned: &Value) -> &[Value] {
    planned
        .get("addresses")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn new_address(address: &Value) -> NewAddress {
    NewAddress {
        address: get_string(address, "address").unwrap_or_default(),
        address_type: get_string(address, "type").unwrap_or_default(),
        suppressup: get_bool(address, "suppress_up").unwrap_or(false),
        suppressdown: get_bool(address, "suppress_down").unwrap_or(false),
        suppressfirst: get_bool(address, "suppress_first").unwrap_or(false),
        suppressdiag: get_bool(address, "suppress_diag").unwrap_or(false),
        suppressall: get_bool(address, "suppress_all").unwrap_or(false),
        mute: get_bool(address, "mute").unwrap_or(false),
        action: get_string(address, "action"),
        headers: get_string_map(address, "headers"),
        querystrings: get_string_map(address, "querystrings"),
        data: get_string(address, "data"),
        priority: get_i64(address, "priority"),
    }
}

fn existing_address(address: &Value) -> ContactAddress {
    let new = new_address(address);
    ContactAddress {
        address: new.address,
        address_type: new.address_type,
        status: None,
        suppressup: new.suppressup,
        suppressdown: new.suppressdown,
        suppressfirst: new.suppressfirst,
        suppressdiag: new.suppressdiag,
        suppressall: new.suppressall,
        // Only an explicit mute is sent; leaving it out unmutes.
        mute: new.mute.then_some(Value::Bool(true)),
        action: new.action,
        headers: new.headers,
        querystrings: new.querystrings,
        data: new.data.map(Value::String),
        priority: new.priority,
    }
}

fn create_request(planned: &Value) -> ContactCreateRequest {
    ContactCreateRequest {
        name: get_string(planned, "name"),
        custrole: get_string(planned, "custrole"),
        newaddresses: planned_addresses(planned).iter().map(new_address).collect(),
    }
}

/// Addresses whose id is already known to NodePing are sent as updates;
/// the rest are added. Addresses left out are removed by the API.
fn update_request(prior: &Value, planned: &Value) -> ContactUpdateRequest {
    let known: HashSet<&str> = planned_addresses(prior)
        .iter()
        .filter_map(|a| get_str(a, "id"))
        .collect();

    let mut addresses = BTreeMap::new();
    let mut newaddresses = Vec::new();
    for address in planned_addresses(planned) {
        match get_str(address, "id").filter(|id| known.contains(id)) {
            Some(id) => {
                addresses.insert(id.to_string(), existing_address(address));
            },
            None => newaddresses.push(new_address(address)),
        }
    }

    ContactUpdateRequest {
        name: get_string(planned, "name"),
        custrole: get_string(planned, "custrole"),
        addresses,
        newaddresses,
    }
}

/// Addresses in the order of `base`, or `null` when there are none.
///
/// A base entry claims the API address with the same id, or failing that
/// the first unclaimed one with the same type and address. API addresses
/// no base entry claims follow in id order.
fn map_addresses(contact: &Contact, base: &[Value]) -> Value {
    if contact.addresses.is_empty() {
        return Value::Null;
    }

    let mut remaining: Vec<(&String, &ContactAddress)> = contact.addresses.iter().collect();
    let mut ordered = Vec::with_capacity(remaining.len());
    for entry in base {
        let by_id = get_str(entry, "id")
            .and_then(|id| remaining.iter().position(|(api_id, _)| api_id.as_str() == id));
        let matched = by_id.or_else(|| {
            remaining.iter().position(|(_, address)| {
                get_str(entry, "type") == Some(address.address_type.as_str())
                    && get_str(entry, "address") == Some(address.address.as_str())
            })
        });
        if let Some(index) = matched {
            let (id, address) = remaining.remove(index);
            ordered.push(map_address(id, address, Some(entry)));
        }
    }
    ordered.extend(
        remaining
            .into_iter()
            .map(|(id, address)| map_address(id, address, None)),
    );

    Value::Array(ordered)
}

/// `data` keeps the base string when NodePing returned the same JSON
/// document in another layout.
fn map_address(id: &str, address: &ContactAddress, base: Option<&Value>) -> Value {
    let mut data = address.data_string().map_or(Value::Null, Value::String);
    plan::keep_equivalent_json(base.and_then(|b| b.get("data")), &mut data);

    json!({
        "id": id,
        "type": address.address_type,
        "address": address.address,
        "suppress_up": address.suppressup,
        "suppress_down": address.suppressdown,
        "suppress_first": address.suppressfirst,
        "suppress_diag": address.suppressdiag,
        "suppress_all": address.suppressall,
        "mute": address.is_muted(),
        "action": address.action.as_deref().map_or(Value::Null, non_empty),
        "data": data,
        "priority": address.priority,
        "headers": non_empty_map(address.headers.as_ref()),
        "querystrings": non_empty_map(address.querystrings.as_ref()),
    })
}

/// Overlay the API's view of `contact` on `base`.
fn apply_contact(contact: &Contact, base: Value) -> Value {
    let addresses = map_addresses(contact, planned_addresses(&base));
    let mut state = as_object(base);

    if !contact.id.is_empty() {
        state.insert("id".to_string(), json!(contact.id));
    }
    if !contact.customer_id.is_empty() {
        state.insert("customer_id".to_string(), json!(contact.customer_id));
    }
    state.insert("name".to_string(), non_empty(&contact.name));
    if !contact.custrole.is_empty() {
        state.insert("custrole".to_string(), json!(contact.custrole));
    }
    state.insert("addresses".to_string(), addresses);

    Value::Object(state)
}

#[async_trait]
impl Resource for ContactResource {
    fn type_name(&self) -> &'static str {
        "nodeping_contact"
    }

    fn schema(&self) -> Schema {
        contact_schema()
    }

    fn adjust_plan(&self, _default_tags: &[String], prior: Option<&Value>, planned: &mut Value) {
        let Some(prior) = prior else {
            return;
        };
        let prior_addresses = planned_addresses(prior);
        let Some(addresses) = planned
            .get_mut("addresses")
            .and_then(Value::as_array_mut)
        else {
            return;
        };

        for address in addresses.iter_mut() {
            let Some(id) = get_string(address, "id") else {
                continue;
            };
            let prior_data = prior_addresses
                .iter()
                .find(|a| get_str(a, "id") == Some(id.as_str()))
                .and_then(|a| a.get("data"));
            if let Some(data) = address.get_mut("data") {
                plan::keep_equivalent_json(prior_data, data);
            }
        }
    }

    async fn create(&self, client: &Client, planned: Value) -> Result<Value, ProviderError> {
        let request = create_request(&planned);
        debug!(addresses = request.newaddresses.len(), "Creating contact");

        let contact = client
            .create_contact(&request)
            .await
            .map_err(|e| ProviderError::from(e).with_context("Could not create contact"))?;

        info!(id = %contact.id, "Created contact");
        Ok(apply_contact(&contact, planned))
    }

    async fn read(&self, client: &Client, state: Value) -> Result<Value, ProviderError> {
        let id = state_id(&state)?;
        debug!(id = %id, "Reading contact");

        match client.get_contact(&id).await {
            Ok(contact) => Ok(apply_contact(&contact, state)),
            Err(e) if e.is_not_found() => {
                debug!(id = %id, "Contact not found, removing from state");
                Ok(Value::Null)
            },
            Err(e) => Err(ProviderError::from(e)
                .with_context(format!("Could not read contact ID {}", id))),
        }
    }

    async fn update(
        &self,
        client: &Client,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let id = state_id(&prior)?;
        let request = update_request(&prior, &planned);
        debug!(
            id = %id,
            updated = request.addresses.len(),
            added = request.newaddresses.len(),
            "Updating contact"
        );

        let contact = client.update_contact(&id, &request).await.map_err(|e| {
            ProviderError::from(e).with_context(format!("Could not update contact ID {}", id))
        })?;

        info!(id = %id, "Updated contact");
        Ok(apply_contact(&contact, planned))
    }

    async fn delete(&self, client: &Client, state: Value) -> Result<(), ProviderError> {
        let id = state_id(&state)?;
        debug!(id = %id, "Deleting contact");

        match client.delete_contact(&id).await {
            Ok(()) => {
                info!(id = %id, "Deleted contact");
                Ok(())
            },
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(ProviderError::from(e)
                .with_context(format!("Could not delete contact ID {}", id))),
        }
    }

    async fn import(&self, client: &Client, id: &str) -> Result<Value, ProviderError> {
        let (customer_id, contact_id) = parse_import_id("contact", id)?;
        debug!(contact_id, "Importing contact");

        let contact = scoped_client(client, customer_id)
            .get_contact(contact_id)
            .await
            .map_err(|e| ProviderError::from(e).with_context("Could not import contact"))?;

        Ok(apply_contact(&contact, Value::Object(Map::new())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfig;
    use crate::validation;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> Client {
        Client::new(ClientConfig {
            api_token: "token".to_string(),
            base_url: Some(server.uri()),
            rate_limit: 1000.0,
            ..Default::default()
        })
        .unwrap()
    }

    fn api_contact() -> Value {
        json!({
            "_id": "201205050153W2Q4C-BKPGH",
            "type": "contact",
            "customer_id": "201205050153W2Q4C",
            "name": "Ops",
            "custrole": "notify",
            "addresses": {
                "S4BLAFKZ": {
                    "address": "https://hooks.example.com/nodeping",
                    "type": "webhook",
                    "action": "post",
                    "data": {"text": "down"},
                    "headers": {},
                    "mute": 1700000000
                },
                "K5SP9CQP": {"address": "ops@example.com", "type": "email", "suppressup": true}
            }
        })
    }

    #[test]
    fn test_schema_validation() {
        let schema = contact_schema();
        assert!(validation::is_valid(
            &schema,
            &json!({"name": "Ops", "addresses": [{"type": "email", "address": "a@b.c"}]})
        ));
        assert!(!validation::is_valid(&schema, &json!({"custrole": "owner"})));
        assert!(!validation::is_valid(
            &schema,
            &json!({"addresses": [{"type": "fax", "address": "1"}]})
        ));
        assert!(!validation::is_valid(
            &schema,
            &json!({"addresses": [{"type": "email"}]})
        ));
    }

    #[test]
    fn test_map_addresses_follows_base_and_keeps_data_layout() {
        let contact: Contact = serde_json::from_value(api_contact()).unwrap();
        let base = vec![json!({
            "type": "webhook",
            "address": "https://hooks.example.com/nodeping",
            "data": "{ \"text\": \"down\" }"
        })];

        let addresses = map_addresses(&contact, &base);
        assert_eq!(addresses[0]["id"], "S4BLAFKZ");
        assert_eq!(addresses[0]["mute"], true);
        assert_eq!(addresses[0]["action"], "post");
        assert!(addresses[0]["headers"].is_null());
        assert_eq!(addresses[0]["data"], "{ \"text\": \"down\" }");

        assert_eq!(addresses[1]["id"], "K5SP9CQP");
        assert_eq!(addresses[1]["suppress_up"], true);
        assert!(addresses[1]["data"].is_null());
        assert!(addresses[1]["priority"].is_null());

        let unclaimed = map_addresses(&contact, &[]);
        assert_eq!(unclaimed[0]["id"], "K5SP9CQP");
        assert_eq!(unclaimed[1]["id"], "S4BLAFKZ");

        let empty = Contact::default();
        assert!(map_addresses(&empty, &[]).is_null());
    }

    #[test]
    fn test_unchanged_config_plans_clean_when_ids_sort_differently() {
        let config = json!({
            "name": "Ops",
            "addresses": [
                {"type": "email", "address": "ops@example.com"},
                {"type": "sms", "address": "+15555550100"}
            ]
        });
        let contact: Contact = serde_json::from_value(json!({
            "_id": "C1",
            "customer_id": "CUST",
            "name": "Ops",
            "custrole": "notify",
            "addresses": {
                "ZK5SP9CQ": {"type": "email", "address": "ops@example.com"},
                "AB4LAFKZ": {"type": "sms", "address": "+15555550100"}
            }
        }))
        .unwrap();

        let planned = ContactResource.plan(&[], None, config.clone()).unwrap().planned_state;
        let state = apply_contact(&contact, planned);
        assert_eq!(state["addresses"][0]["id"], "ZK5SP9CQ");
        assert_eq!(state["addresses"][1]["id"], "AB4LAFKZ");

        let reread = apply_contact(&contact, state.clone());
        assert_eq!(reread, state);

        let plan = ContactResource.plan(&[], Some(&state), config).unwrap();
        assert!(plan.is_empty(), "unexpected changes: {:?}", plan.changes);
    }

    #[test]
    fn test_update_request_splits_addresses() {
        let prior = json!({
            "id": "C1",
            "addresses": [{"id": "A1", "type": "email", "address": "ops@example.com"}]
        });
        let planned = json!({
            "id": "C1",
            "name": "Ops",
            "addresses": [
                {"id": "A1", "type": "email", "address": "ops@example.com", "mute": true},
                {"id": null, "type": "sms", "address": "+15555550100"}
            ]
        });

        let request = update_request(&prior, &planned);
        assert_eq!(request.addresses["A1"].mute, Some(Value::Bool(true)));
        assert_eq!(request.newaddresses.len(), 1);
        assert_eq!(request.newaddresses[0].address_type, "sms");
    }

    #[test]
    fn test_plan_keeps_address_ids_and_equivalent_data() {
        let prior = json!({
            "id": "C1",
            "customer_id": "CUST",
            "name": "Ops",
            "custrole": "notify",
            "addresses": [{
                "id": "A1", "type": "webhook", "address": "https://hooks.example.com",
                "suppress_up": false, "suppress_down": false, "suppress_first": false,
                "suppress_diag": false, "suppress_all": false, "mute": false,
                "data": "{\"a\":1}"
            }]
        });
        let proposed = json!({
            "name": "Ops",
            "addresses": [{
                "type": "webhook", "address": "https://hooks.example.com",
                "data": "{ \"a\": 1 }"
            }]
        });

        let plan = ContactResource.plan(&[], Some(&prior), proposed).unwrap();
        assert_eq!(plan.planned_state["addresses"][0]["id"], "A1");
        assert_eq!(plan.planned_state["addresses"][0]["data"], "{\"a\":1}");
        assert!(plan.is_empty());
    }

    #[tokio::test]
    async fn test_create_sends_new_addresses() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/contacts"))
            .and(body_partial_json(json!({
                "name": "Ops",
                "custrole": "notify",
                "newaddresses": [{"type": "email", "address": "ops@example.com", "suppressup": true}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(api_contact()))
            .expect(1)
            .mount(&server)
            .await;

        let state = ContactResource
            .create(
                &client(&server),
                json!({
                    "name": "Ops",
                    "custrole": "notify",
                    "addresses": [{"type": "email", "address": "ops@example.com", "suppress_up": true}]
                }),
            )
            .await
            .unwrap();
        assert_eq!(state["id"], "201205050153W2Q4C-BKPGH");
        assert_eq!(state["addresses"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_read_gone() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"error": "contact not found"})),
            )
            .mount(&server)
            .await;

        let state = ContactResource
            .read(&client(&server), json!({"id": "C1"}))
            .await
            .unwrap();
        assert!(state.is_null());
    }

    #[tokio::test]
    async fn test_import_rejects_bad_id() {
        let server = MockServer::start().await;
        let err = ContactResource
            .import(&client(&server), "a:b:c")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
    }
}
