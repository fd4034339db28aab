//! Wire models for the NodePing REST API.
//!
//! NodePing is loose about types: numbers arrive as strings, booleans as
//! `"1"` or `0`, and run locations as `false` when unset. Fields with a
//! stable type are typed here; the rest are carried as [`Value`] and read
//! through the accessor helpers at the bottom of this module.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Treats an explicit JSON `null` like a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A check as returned by `GET /checks/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Check {
    #[serde(rename = "_id", deserialize_with = "nullable")]
    pub id: String,
    #[serde(rename = "_rev", deserialize_with = "nullable")]
    pub rev: String,
    #[serde(deserialize_with = "nullable")]
    pub customer_id: String,
    #[serde(deserialize_with = "nullable")]
    pub label: String,
    #[serde(rename = "type", deserialize_with = "nullable")]
    pub check_type: String,
    pub interval: Option<Value>,
    /// `"active"` when the check runs.
    #[serde(deserialize_with = "nullable")]
    pub enable: String,
    #[serde(deserialize_with = "nullable")]
    pub public: bool,
    #[serde(deserialize_with = "nullable")]
    pub status: String,
    #[serde(deserialize_with = "nullable")]
    pub modified: i64,
    #[serde(deserialize_with = "nullable")]
    pub created: i64,
    #[serde(deserialize_with = "nullable")]
    pub state: i64,
    pub firstdown: Option<Value>,
    /// One single-entry map per notification: `{contact_id: {delay, schedule}}`.
    #[serde(deserialize_with = "nullable")]
    pub notifications: Vec<BTreeMap<String, Value>>,
    #[serde(deserialize_with = "nullable")]
    pub parameters: CheckParameters,
    pub dep: Option<Value>,
    pub mute: Option<Value>,
    #[serde(deserialize_with = "nullable")]
    pub description: String,
    #[serde(deserialize_with = "nullable")]
    pub queue: String,
    #[serde(deserialize_with = "nullable")]
    pub uuid: String,
    /// `false` or a list of region names.
    pub runlocations: Option<Value>,
    pub homeloc: Option<Value>,
    #[serde(deserialize_with = "nullable")]
    pub autodiag: bool,
    pub tags: Option<Vec<String>>,
}

/// Type-specific check parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckParameters {
    #[serde(deserialize_with = "nullable")]
    pub target: String,
    pub threshold: Option<Value>,
    pub sens: Option<Value>,
    #[serde(deserialize_with = "nullable")]
    pub contentstring: String,
    pub regex: Option<Value>,
    pub invert: Option<Value>,
    pub follow: Option<Value>,
    #[serde(deserialize_with = "nullable")]
    pub method: String,
    pub statuscode: Option<Value>,
    pub sendheaders: Option<BTreeMap<String, String>>,
    pub receiveheaders: Option<BTreeMap<String, String>>,
    pub data: Option<Value>,
    #[serde(deserialize_with = "nullable")]
    pub postdata: String,
    pub port: Option<Value>,
    #[serde(deserialize_with = "nullable")]
    pub username: String,
    #[serde(deserialize_with = "nullable")]
    pub password: String,
    pub secure: Option<Value>,
    pub verify: Option<Value>,
    pub ipv6: Option<Value>,
    #[serde(deserialize_with = "nullable")]
    pub dnstype: String,
    #[serde(deserialize_with = "nullable")]
    pub dnstoresolve: String,
    #[serde(deserialize_with = "nullable")]
    pub dnssection: String,
    pub dnsrd: Option<Value>,
    #[serde(deserialize_with = "nullable")]
    pub transport: String,
    pub warningdays: Option<Value>,
    #[serde(deserialize_with = "nullable")]
    pub servername: String,
    #[serde(deserialize_with = "nullable")]
    pub email: String,
    #[serde(deserialize_with = "nullable")]
    pub database: String,
    #[serde(deserialize_with = "nullable")]
    pub query: String,
    #[serde(deserialize_with = "nullable")]
    pub namespace: String,
    pub fields: Option<Value>,
    pub hosts: Option<Value>,
    #[serde(deserialize_with = "nullable")]
    pub redistype: String,
    #[serde(deserialize_with = "nullable")]
    pub sentinelname: String,
    /// A key id string, or `false` when unset.
    pub sshkey: Option<Value>,
    /// A certificate id string, or `false` when unset.
    pub clientcert: Option<Value>,
    #[serde(deserialize_with = "nullable")]
    pub checktoken: String,
    pub oldresultfail: Option<Value>,
    #[serde(deserialize_with = "nullable")]
    pub ignore: String,
    #[serde(deserialize_with = "nullable")]
    pub dohdot: String,
    pub edns: Option<BTreeMap<String, String>>,
    #[serde(deserialize_with = "nullable")]
    pub whoisserver: String,
    #[serde(deserialize_with = "nullable")]
    pub rdapurl: String,
    #[serde(deserialize_with = "nullable")]
    pub snmpv: String,
    #[serde(deserialize_with = "nullable")]
    pub snmpcom: String,
    pub verifyvolume: Option<Value>,
    pub volumemin: Option<Value>,
}

impl Check {
    /// `enable == "active"`.
    pub fn is_enabled(&self) -> bool {
        self.enable == "active"
    }

    /// Interval in minutes; NodePing sends a number or a numeric string.
    pub fn interval(&self) -> Option<f64> {
        self.interval.as_ref().and_then(parse_f64)
    }

    /// Run locations, or `None` when the API reports `false` or an empty list.
    pub fn run_locations(&self) -> Option<Vec<String>> {
        let locations: Vec<String> = self
            .runlocations
            .as_ref()?
            .as_array()?
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();
        if locations.is_empty() {
            None
        } else {
            Some(locations)
        }
    }

    /// Notifications flattened to `(contact, delay, schedule)` and
    /// deduplicated, keeping the first occurrence. Schedule defaults to `All`.
    pub fn flat_notifications(&self) -> Vec<FlatNotification> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for entry in &self.notifications {
            for (contact_id, settings) in entry {
                let Some(settings) = settings.as_object() else {
                    continue;
                };
                let delay = settings.get("delay").and_then(parse_i64).unwrap_or(0);
                let schedule = settings
                    .get("schedule")
                    .and_then(Value::as_str)
                    .unwrap_or("All")
                    .to_string();
                let notification = FlatNotification {
                    contact_id: contact_id.clone(),
                    delay,
                    schedule,
                };
                if seen.insert(notification.clone()) {
                    out.push(notification);
                }
            }
        }
        out
    }
}

/// One notification entry of a check.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlatNotification {
    pub contact_id: String,
    pub delay: i64,
    pub schedule: String,
}

/// Per-contact notification settings in a check request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub delay: i64,
    pub schedule: String,
}

/// Body for `POST /checks` and `PUT /checks/{id}`.
///
/// Parameters are flattened next to the top-level fields; unset values are
/// omitted so an update leaves them untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CheckRequest {
    #[serde(rename = "type")]
    pub check_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<f64>,
    /// `"active"` or `"false"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autodiag: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runlocations: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homeloc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sens: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notifications: Vec<BTreeMap<String, NotificationSettings>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dep: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mute: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contentstring: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invert: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statuscode: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sendheaders: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiveheaders: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postdata: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verify: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dnstype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dnstoresolve: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dnssection: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dnsrd: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warningdays: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servername: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sshkey: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clientcert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snmpv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snmpcom: Option<String>,
}

/// A contact as returned by `GET /contacts/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    #[serde(rename = "_id", deserialize_with = "nullable")]
    pub id: String,
    #[serde(rename = "type", deserialize_with = "nullable")]
    pub contact_type: String,
    #[serde(deserialize_with = "nullable")]
    pub customer_id: String,
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub custrole: String,
    /// Addresses keyed by address id.
    #[serde(deserialize_with = "nullable")]
    pub addresses: BTreeMap<String, ContactAddress>,
}

/// An existing contact address. Also sent back, keyed by id, to update it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactAddress {
    #[serde(deserialize_with = "nullable")]
    pub address: String,
    #[serde(rename = "type", deserialize_with = "nullable")]
    pub address_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub suppressup: bool,
    #[serde(deserialize_with = "nullable")]
    pub suppressdown: bool,
    #[serde(deserialize_with = "nullable")]
    pub suppressfirst: bool,
    #[serde(deserialize_with = "nullable")]
    pub suppressdiag: bool,
    #[serde(deserialize_with = "nullable")]
    pub suppressall: bool,
    /// `true`/`false` or a mute-until timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mute: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub querystrings: Option<BTreeMap<String, String>>,
    /// A string or an arbitrary JSON document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

impl ContactAddress {
    /// Mute is a bool, or a positive timestamp while muted.
    pub fn is_muted(&self) -> bool {
        match &self.mute {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f > 0.0),
            _ => false,
        }
    }

    /// Webhook payload rendered as a string; documents are re-serialised.
    pub fn data_string(&self) -> Option<String> {
        match self.data.as_ref()? {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => serde_json::to_string(other).ok(),
        }
    }
}

/// An address to add to a contact.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewAddress {
    pub address: String,
    #[serde(rename = "type")]
    pub address_type: String,
    pub suppressup: bool,
    pub suppressdown: bool,
    pub suppressfirst: bool,
    pub suppressdiag: bool,
    pub suppressall: bool,
    pub mute: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub querystrings: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

/// Body for `POST /contacts`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContactCreateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custrole: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub newaddresses: Vec<NewAddress>,
}

/// Body for `PUT /contacts/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContactUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custrole: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub addresses: BTreeMap<String, ContactAddress>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub newaddresses: Vec<NewAddress>,
}

/// Answer to a delete call.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DeleteResponse {
    pub ok: bool,
    pub id: String,
}

/// Error body: `{"error": "..."}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ErrorResponse {
    pub error: String,
}

/// Booleans arrive as `true`, `"true"`, `"1"` or a non-zero number.
pub fn parse_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s == "true" || s == "1",
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    }
}

/// An integer from a number or a numeric string. Fractions are truncated.
pub fn parse_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// A float from a number or a numeric string.
pub fn parse_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
