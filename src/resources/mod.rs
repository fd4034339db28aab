//! Managed resources: `nodeping_check` and `nodeping_contact`.
//!
//! Each resource maps between the JSON state the host stores and the
//! NodePing wire models. Mapping always starts from a base object (the plan
//! on create and update, the prior state on read, `{}` on import): fields
//! the API reports are overwritten, everything else is carried over.

mod check;
mod contact;

pub use check::{CheckResource, CHECK_TYPES};
pub use contact::{ContactResource, ADDRESS_TYPES};

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::client::Client;
use crate::error::ProviderError;
use crate::plan;
use crate::schema::Schema;
use crate::types::PlanResult;

/// One resource type served by the provider.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Type name used in configuration, e.g. `nodeping_check`.
    fn type_name(&self) -> &'static str;

    /// Resource schema.
    fn schema(&self) -> Schema;

    /// Resource-specific plan adjustments applied after defaults and
    /// state-for-unknown. `prior` is `None` on create.
    fn adjust_plan(&self, default_tags: &[String], prior: Option<&Value>, planned: &mut Value) {
        let _ = (default_tags, prior, planned);
    }

    /// Plan a create, update, or (with a `null` proposal) destroy.
    fn plan(
        &self,
        default_tags: &[String],
        prior: Option<&Value>,
        proposed: Value,
    ) -> Result<PlanResult, ProviderError> {
        let prior = prior.filter(|p| !p.is_null());
        if proposed.is_null() {
            return Ok(plan::plan_destroy(prior));
        }
        if !proposed.is_object() {
            return Err(ProviderError::Validation(format!(
                "proposed state for {} must be an object",
                self.type_name()
            )));
        }

        let schema = self.schema();
        let mut planned = plan::planned_state(&schema, prior, proposed);
        self.adjust_plan(default_tags, prior, &mut planned);
        Ok(plan::plan_result(&schema, prior, planned))
    }

    /// Create the remote object and return the new state.
    async fn create(&self, client: &Client, planned: Value) -> Result<Value, ProviderError>;

    /// Refresh `state`. Returns `Value::Null` when the object no longer exists.
    async fn read(&self, client: &Client, state: Value) -> Result<Value, ProviderError>;

    /// Apply `planned` to the object recorded in `prior`.
    async fn update(
        &self,
        client: &Client,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete the object. An object that is already gone is not an error.
    async fn delete(&self, client: &Client, state: Value) -> Result<(), ProviderError>;

    /// Import by `id` or `customer_id:id`.
    async fn import(&self, client: &Client, id: &str) -> Result<Value, ProviderError>;
}

/// Every resource the provider serves.
pub fn all() -> Vec<Box<dyn Resource>> {
    vec![Box::new(CheckResource), Box::new(ContactResource)]
}

/// Split an import id into `(customer_id, object_id)`.
pub(crate) fn parse_import_id<'a>(
    kind: &str,
    id: &'a str,
) -> Result<(Option<&'a str>, &'a str), ProviderError> {
    let parts: Vec<&str> = id.split(':').collect();
    match parts.as_slice() {
        [object_id] if !object_id.is_empty() => Ok((None, *object_id)),
        [customer_id, object_id] if !object_id.is_empty() => {
            Ok((Some(*customer_id).filter(|c| !c.is_empty()), *object_id))
        },
        _ => Err(ProviderError::Validation(format!(
            "Invalid Import ID: expected import ID in format '{kind}_id' or 'customer_id:{kind}_id', got: {id}"
        ))),
    }
}

/// `client`, re-scoped when the import id named a customer.
pub(crate) fn scoped_client(client: &Client, customer_id: Option<&str>) -> Client {
    match customer_id {
        Some(customer_id) => client.with_customer_id(customer_id),
        None => client.clone(),
    }
}

/// The `id` recorded in a state object.
pub(crate) fn state_id(state: &Value) -> Result<String, ProviderError> {
    get_str(state, "id")
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ProviderError::Validation("state has no id".to_string()))
}

pub(crate) fn get_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

pub(crate) fn get_string(value: &Value, key: &str) -> Option<String> {
    get_str(value, key).map(str::to_string)
}

pub(crate) fn get_bool(value: &Value, key: &str) -> Option<bool> {
    value.get(key).and_then(Value::as_bool)
}

pub(crate) fn get_i64(value: &Value, key: &str) -> Option<i64> {
    value
        .get(key)
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
}

pub(crate) fn get_f64(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(Value::as_f64)
}

pub(crate) fn get_string_list(value: &Value, key: &str) -> Option<Vec<String>> {
    value.get(key).and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    })
}

pub(crate) fn get_string_map(value: &Value, key: &str) -> Option<BTreeMap<String, String>> {
    value.get(key).and_then(Value::as_object).map(|entries| {
        entries
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
            .collect()
    })
}

/// `Value::Null` for an empty string.
pub(crate) fn non_empty(s: &str) -> Value {
    if s.is_empty() {
        Value::Null
    } else {
        Value::String(s.to_string())
    }
}

/// `Value::Null` for a missing or empty map.
pub(crate) fn non_empty_map(map: Option<&BTreeMap<String, String>>) -> Value {
    match map {
        Some(map) if !map.is_empty() => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        ),
        _ => Value::Null,
    }
}

/// The object behind `value`, replacing anything else with `{}`.
pub(crate) fn as_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
