//! In-memory NodePing API served by wiremock.
//!
//! Checks and contacts live in a shared map so that a create followed by a
//! read, update or delete behaves like the real service.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde_json::{json, Map, Value};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const CUSTOMER_ID: &str = "MOCK-CUSTOMER";
const TIMESTAMP: i64 = 1_700_000_000_000;

/// Check fields NodePing keeps at the top level; everything else in a
/// request body lands in `parameters`.
const TOP_LEVEL: [&str; 13] = [
    "type",
    "label",
    "interval",
    "enabled",
    "public",
    "autodiag",
    "runlocations",
    "homeloc",
    "notifications",
    "dep",
    "mute",
    "description",
    "tags",
];

#[derive(Default)]
struct State {
    checks: BTreeMap<String, Value>,
    contacts: BTreeMap<String, Value>,
    next_id: u64,
    requests: Vec<(String, String, Value)>,
}

impl State {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{:04}", prefix, self.next_id)
    }

    /// Address ids count down, so id order is the reverse of the order
    /// addresses were sent in.
    fn address_id(&mut self) -> String {
        self.next_id += 1;
        format!("MOCK-ADDR-{:04}", 9999 - self.next_id)
    }
}

#[derive(Clone, Copy)]
enum Op {
    ListChecks,
    CreateCheck,
    GetCheck,
    UpdateCheck,
    DeleteCheck,
    ListContacts,
    CreateContact,
    GetContact,
    UpdateContact,
    DeleteContact,
}

struct Handler {
    state: Arc<Mutex<State>>,
    op: Op,
}

fn not_found(kind: &str) -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({"error": format!("{} not found", kind)}))
}

fn last_segment(request: &Request) -> String {
    request
        .url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default()
        .to_string()
}

fn body(request: &Request) -> Value {
    serde_json::from_slice(&request.body).unwrap_or(Value::Null)
}

fn check_from_request(id: &str, body: &Value, created: i64) -> Value {
    let mut parameters = Map::new();
    let mut check = Map::new();
    if let Some(fields) = body.as_object() {
        for (key, value) in fields {
            if TOP_LEVEL.contains(&key.as_str()) {
                continue;
            }
            parameters.insert(key.clone(), value.clone());
        }
        for key in TOP_LEVEL {
            if let Some(value) = fields.get(key) {
                check.insert(key.to_string(), value.clone());
            }
        }
    }

    let label = body
        .get("label")
        .or_else(|| body.get("target"))
        .cloned()
        .unwrap_or(json!(""));
    let enable = body.get("enabled").cloned().unwrap_or(json!("false"));
    check.remove("enabled");

    check.insert("_id".to_string(), json!(id));
    check.insert("customer_id".to_string(), json!(CUSTOMER_ID));
    check.insert("label".to_string(), label);
    check.insert("enable".to_string(), enable);
    check.insert("state".to_string(), json!(1));
    check.insert("created".to_string(), json!(created));
    check.insert("modified".to_string(), json!(TIMESTAMP + 1));
    check.entry("runlocations").or_insert(json!(false));
    check.insert("parameters".to_string(), Value::Object(parameters));
    Value::Object(check)
}

fn address_from_request(address: &Value) -> Value {
    let mut stored = address.as_object().cloned().unwrap_or_default();
    if !stored.get("mute").and_then(Value::as_bool).unwrap_or(false) {
        stored.remove("mute");
    }
    stored.insert("status".to_string(), json!("active"));
    Value::Object(stored)
}

impl Respond for Handler {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let Ok(mut state) = self.state.lock() else {
            return ResponseTemplate::new(500);
        };
        state.requests.push((
            request.method.as_str().to_string(),
            request.url.path().to_string(),
            body(request),
        ));

        match self.op {
            Op::ListChecks => {
                ResponseTemplate::new(200).set_body_json(json!(state.checks))
            },
            Op::CreateCheck => {
                let id = state.id("MOCK-CHECK");
                let check = check_from_request(&id, &body(request), TIMESTAMP);
                state.checks.insert(id, check.clone());
                ResponseTemplate::new(200).set_body_json(check)
            },
            Op::GetCheck => match state.checks.get(&last_segment(request)) {
                Some(check) => ResponseTemplate::new(200).set_body_json(check),
                None => not_found("check"),
            },
            Op::UpdateCheck => {
                let id = last_segment(request);
                let Some(created) = state.checks.get(&id).map(|c| c["created"].clone()) else {
                    return not_found("check");
                };
                let mut check = check_from_request(&id, &body(request), TIMESTAMP);
                check["created"] = created;
                check["modified"] = json!(TIMESTAMP + 2);
                state.checks.insert(id, check.clone());
                ResponseTemplate::new(200).set_body_json(check)
            },
            Op::DeleteCheck => {
                let id = last_segment(request);
                match state.checks.remove(&id) {
                    Some(_) => ResponseTemplate::new(200).set_body_json(json!({"ok": true, "id": id})),
                    None => not_found("check"),
                }
            },
            Op::ListContacts => {
                ResponseTemplate::new(200).set_body_json(json!(state.contacts))
            },
            Op::CreateContact => {
                let request = body(request);
                let id = state.id("MOCK-CONTACT");
                let mut addresses = Map::new();
                for address in request["newaddresses"].as_array().cloned().unwrap_or_default() {
                    let address_id = state.address_id();
                    addresses.insert(address_id, address_from_request(&address));
                }
                let contact = json!({
                    "_id": id,
                    "type": "contact",
                    "customer_id": CUSTOMER_ID,
                    "name": request.get("name").cloned().unwrap_or(json!("")),
                    "custrole": request.get("custrole").cloned().unwrap_or(json!("notify")),
                    "addresses": addresses,
                });
                state.contacts.insert(id, contact.clone());
                ResponseTemplate::new(200).set_body_json(contact)
            },
            Op::GetContact => match state.contacts.get(&last_segment(request)) {
                Some(contact) => ResponseTemplate::new(200).set_body_json(contact),
                None => not_found("contact"),
            },
            Op::UpdateContact => {
                let id = last_segment(request);
                let request = body(request);
                let Some(mut contact) = state.contacts.get(&id).cloned() else {
                    return not_found("contact");
                };

                let mut addresses = Map::new();
                if let Some(existing) = request["addresses"].as_object() {
                    for (address_id, address) in existing {
                        addresses.insert(address_id.clone(), address_from_request(address));
                    }
                }
                for address in request["newaddresses"].as_array().cloned().unwrap_or_default() {
                    let address_id = state.address_id();
                    addresses.insert(address_id, address_from_request(&address));
                }

                if let Some(name) = request.get("name") {
                    contact["name"] = name.clone();
                }
                if let Some(custrole) = request.get("custrole") {
                    contact["custrole"] = custrole.clone();
                }
                contact["addresses"] = Value::Object(addresses);
                state.contacts.insert(id, contact.clone());
                ResponseTemplate::new(200).set_body_json(contact)
            },
            Op::DeleteContact => {
                let id = last_segment(request);
                match state.contacts.remove(&id) {
                    Some(_) => ResponseTemplate::new(200).set_body_json(json!({"ok": true, "id": id})),
                    None => not_found("contact"),
                }
            },
        }
    }
}

/// A running fake NodePing API.
pub struct NodePingMock {
    pub server: MockServer,
    state: Arc<Mutex<State>>,
}

impl NodePingMock {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let state = Arc::new(Mutex::new(State::default()));

        let routes: [(&str, &str, bool, Op); 10] = [
            ("GET", "/checks", false, Op::ListChecks),
            ("POST", "/checks", false, Op::CreateCheck),
            ("GET", r"^/checks/[^/]+$", true, Op::GetCheck),
            ("PUT", r"^/checks/[^/]+$", true, Op::UpdateCheck),
            ("DELETE", r"^/checks/[^/]+$", true, Op::DeleteCheck),
            ("GET", "/contacts", false, Op::ListContacts),
            ("POST", "/contacts", false, Op::CreateContact),
            ("GET", r"^/contacts/[^/]+$", true, Op::GetContact),
            ("PUT", r"^/contacts/[^/]+$", true, Op::UpdateContact),
            ("DELETE", r"^/contacts/[^/]+$", true, Op::DeleteContact),
        ];

        for (verb, route, is_regex, op) in routes {
            let handler = Handler {
                state: Arc::clone(&state),
                op,
            };
            let mock = if is_regex {
                Mock::given(method(verb)).and(path_regex(route))
            } else {
                Mock::given(method(verb)).and(path(route))
            };
            mock.respond_with(handler).mount(&server).await;
        }

        Self { server, state }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Store a check as NodePing would return it, bypassing the API.
    pub fn insert_check(&self, check: Value) {
        let id = check["_id"].as_str().unwrap_or_default().to_string();
        self.state.lock().unwrap().checks.insert(id, check);
    }

    /// Store a contact as NodePing would return it, bypassing the API.
    pub fn insert_contact(&self, contact: Value) {
        let id = contact["_id"].as_str().unwrap_or_default().to_string();
        self.state.lock().unwrap().contacts.insert(id, contact);
    }

    /// Drop a check behind the provider's back.
    pub fn remove_check(&self, id: &str) {
        self.state.lock().unwrap().checks.remove(id);
    }

    pub fn check(&self, id: &str) -> Option<Value> {
        self.state.lock().unwrap().checks.get(id).cloned()
    }

    pub fn contact(&self, id: &str) -> Option<Value> {
        self.state.lock().unwrap().contacts.get(id).cloned()
    }

    /// Bodies of every request sent with `verb` to `path`, in order.
    pub fn bodies(&self, verb: &str, path: &str) -> Vec<Value> {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|(m, p, _)| m == verb && p == path)
            .map(|(_, _, body)| body.clone())
            .collect()
    }
}
