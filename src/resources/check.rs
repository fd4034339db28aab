use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use super::{
    as_object, get_bool, get_f64, get_i64, get_str, get_string, get_string_list, get_string_map,
    non_empty, non_empty_map, parse_import_id, scoped_client, state_id, Resource,
};
use crate::client::models::{parse_bool, parse_i64, Check, CheckRequest, NotificationSettings};
use crate::client::Client;
use crate::error::ProviderError;
use crate::plan;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Block, NestedBlock, Schema, Validator};

/// Check types accepted by NodePing.
pub const CHECK_TYPES: [&str; 33] = [
    "AGENT", "AUDIO", "CLUSTER", "DOHDOT", "DNS", "FTP", "HTTP", "HTTPCONTENT", "HTTPPARSE",
    "HTTPADV", "IMAP4", "MONGODB", "MTR", "MYSQL", "NTP", "PGSQL", "PING", "POP3", "PORT",
    "PUSH", "RBL", "RDAP", "RDP", "REDIS", "SIP", "SMTP", "SNMP", "SPEC10DNS", "SPEC10RDDS",
    "SSH", "SSL", "WEBSOCKET", "WHOIS",
];

/// `nodeping_check`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckResource;

fn string_list() -> Attribute {
    Attribute::new(
        AttributeType::list(AttributeType::String),
        AttributeFlags::optional(),
    )
}

fn string_map() -> Attribute {
    Attribute::new(
        AttributeType::map(AttributeType::String),
        AttributeFlags::optional(),
    )
}

fn check_schema() -> Schema {
    Schema::v0()
        .with_description("Manages a NodePing check.")
        .with_attribute(
            "id",
            Attribute::computed_string().with_description("The unique identifier of the check."),
        )
        .with_attribute(
            "customer_id",
            Attribute::computed_string()
                .with_description("The customer ID (account ID) that owns this check."),
        )
        .with_attribute(
            "type",
            Attribute::required_string()
                .with_validator(Validator::one_of(&CHECK_TYPES))
                .with_description("The type of check."),
        )
        .with_attribute(
            "target",
            Attribute::optional_string()
                .with_description("The target URL, hostname, or IP address to check."),
        )
        .with_attribute(
            "label",
            Attribute::optional_string()
                .computed()
                .with_description("A label for the check. Defaults to the target."),
        )
        .with_attribute(
            "enabled",
            Attribute::with_default_value(AttributeType::Bool, json!(false))
                .with_description("Whether the check is enabled."),
        )
        .with_attribute(
            "public",
            Attribute::with_default_value(AttributeType::Bool, json!(false))
                .with_description("Whether public reports are enabled for this check."),
        )
        .with_attribute(
            "interval",
            Attribute::with_default_value(AttributeType::Float64, json!(15.0))
                .with_description("How often the check runs in minutes: 0.25, 0.5, or any integer >= 1."),
        )
        .with_attribute(
            "threshold",
            Attribute::with_default_value(AttributeType::Int64, json!(5))
                .with_description("Timeout in seconds for the check."),
        )
        .with_attribute(
            "sens",
            Attribute::with_default_value(AttributeType::Int64, json!(2))
                .with_description("Number of rechecks before status change."),
        )
        .with_attribute(
            "mute",
            Attribute::with_default_value(AttributeType::Bool, json!(false))
                .with_description("Mute all notifications for this check."),
        )
        .with_attribute(
            "dep",
            Attribute::optional_string().with_description("Check ID for notification dependency."),
        )
        .with_attribute(
            "description",
            Attribute::optional_string().with_description("Notes for the check (max 1000 characters)."),
        )
        .with_attribute(
            "runlocations",
            string_list().with_description("Probe locations to run the check from."),
        )
        .with_attribute(
            "homeloc",
            Attribute::optional_string().with_description("Preferred probe location."),
        )
        .with_attribute(
            "autodiag",
            Attribute::with_default_value(AttributeType::Bool, json!(false))
                .with_description("Enable automated diagnostics."),
        )
        .with_attribute("tags", string_list().with_description("Tags for grouping checks."))
        .with_attribute(
            "state",
            Attribute::computed_int64().with_description("Current state: 0 failing, 1 passing."),
        )
        .with_attribute("created", Attribute::computed_int64())
        .with_attribute("modified", Attribute::computed_int64())
        .with_attribute(
            "contentstring",
            Attribute::optional_string().with_description("String to match in the response."),
        )
        .with_attribute("regex", Attribute::optional_bool())
        .with_attribute("invert", Attribute::optional_bool())
        .with_attribute("follow", Attribute::optional_bool())
        .with_attribute(
            "method",
            Attribute::optional_string()
                .with_validator(Validator::one_of(&["GET", "POST", "PUT", "HEAD", "TRACE", "CONNECT"])),
        )
        .with_attribute("statuscode", Attribute::optional_int64())
        .with_attribute("sendheaders", string_map())
        .with_attribute("receiveheaders", string_map())
        .with_attribute("postdata", Attribute::optional_string())
        .with_attribute("port", Attribute::optional_int64())
        .with_attribute("username", Attribute::optional_string())
        .with_attribute("password", Attribute::optional_string().sensitive())
        .with_attribute(
            "secure",
            Attribute::optional_string().with_validator(Validator::one_of(&["false", "ssl", "starttls"])),
        )
        .with_attribute("verify", Attribute::optional_bool())
        .with_attribute("ipv6", Attribute::optional_bool())
        .with_attribute(
            "dnstype",
            Attribute::optional_string().with_validator(Validator::one_of(&[
                "ANY", "A", "AAAA", "CNAME", "MX", "NS", "PTR", "SOA", "SRV", "TXT",
            ])),
        )
        .with_attribute("dnstoresolve", Attribute::optional_string())
        .with_attribute(
            "dnssection",
            Attribute::optional_string().with_validator(Validator::one_of(&[
                "answer",
                "authority",
                "additional",
                "edns_options",
            ])),
        )
        .with_attribute("dnsrd", Attribute::optional_bool())
        .with_attribute(
            "transport",
            Attribute::optional_string()
                .with_validator(Validator::one_of(&["udp", "tcp", "tls", "ws", "wss"])),
        )
        .with_attribute(
            "warningdays",
            Attribute::optional_int64()
                .with_validator(Validator::at_least(1))
                .with_description("Days before certificate or domain expiry to fail."),
        )
        .with_attribute("servername", Attribute::optional_string())
        .with_attribute("email", Attribute::optional_string())
        .with_attribute("database", Attribute::optional_string())
        .with_attribute("query", Attribute::optional_string())
        .with_attribute("namespace", Attribute::optional_string())
        .with_attribute("sshkey", Attribute::optional_string())
        .with_attribute("clientcert", Attribute::optional_string())
        .with_attribute(
            "snmpv",
            Attribute::optional_string().with_validator(Validator::one_of(&["1", "2c"])),
        )
        .with_attribute("snmpcom", Attribute::optional_string())
        .with_block(
            "notifications",
            NestedBlock::list(
                Block::new()
                    .with_description("Notification configuration for the check.")
                    .with_attribute(
                        "contact_id",
                        Attribute::required_string()
                            .with_description("Contact or contact group ID to notify."),
                    )
                    .with_attribute(
                        "delay",
                        Attribute::with_default_value(AttributeType::Int64, json!(0))
                            .with_description("Delay in minutes before notifying."),
                    )
                    .with_attribute(
                        "schedule",
                        Attribute::optional_string()
                            .computed()
                            .with_description("Notification schedule name."),
                    ),
            ),
        )
}

/// Build the create/update body from the non-null planned fields.
fn build_request(planned: &Value) -> Result<CheckRequest, ProviderError> {
    let check_type = get_string(planned, "type")
        .ok_or_else(|| ProviderError::Validation("type is required".to_string()))?;

    let notifications = planned
        .get("notifications")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|n| {
                    let contact_id = get_string(n, "contact_id")?;
                    let settings = NotificationSettings {
                        delay: get_i64(n, "delay").unwrap_or(0),
                        schedule: get_string(n, "schedule").unwrap_or_else(|| "All".to_string()),
                    };
                    Some(BTreeMap::from([(contact_id, settings)]))
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(CheckRequest {
        check_type,
        target: get_string(planned, "target"),
        label: get_string(planned, "label"),
        interval: get_f64(planned, "interval"),
        enabled: get_bool(planned, "enabled")
            .map(|on| if on { "active" } else { "false" }.to_string()),
        public: get_bool(planned, "public"),
        autodiag: get_bool(planned, "autodiag"),
        runlocations: get_string_list(planned, "runlocations").filter(|l| !l.is_empty()),
        homeloc: get_string(planned, "homeloc"),
        threshold: get_i64(planned, "threshold"),
        sens: get_i64(planned, "sens"),
        notifications,
        dep: get_string(planned, "dep"),
        mute: get_bool(planned, "mute"),
        description: get_string(planned, "description"),
        tags: get_string_list(planned, "tags"),
        contentstring: get_string(planned, "contentstring"),
        regex: get_bool(planned, "regex"),
        invert: get_bool(planned, "invert"),
        follow: get_bool(planned, "follow"),
        method: get_string(planned, "method"),
        statuscode: get_i64(planned, "statuscode"),
        sendheaders: get_string_map(planned, "sendheaders"),
        receiveheaders: get_string_map(planned, "receiveheaders"),
        postdata: get_string(planned, "postdata"),
        port: get_i64(planned, "port"),
        username: get_string(planned, "username"),
        password: get_string(planned, "password"),
        secure: get_string(planned, "secure"),
        verify: get_bool(planned, "verify"),
        ipv6: get_bool(planned, "ipv6"),
        dnstype: get_string(planned, "dnstype"),
        dnstoresolve: get_string(planned, "dnstoresolve"),
        dnssection: get_string(planned, "dnssection"),
        dnsrd: get_bool(planned, "dnsrd"),
        transport: get_string(planned, "transport"),
        warningdays: get_i64(planned, "warningdays"),
        servername: get_string(planned, "servername"),
        email: get_string(planned, "email"),
        database: get_string(planned, "database"),
        query: get_string(planned, "query"),
        namespace: get_string(planned, "namespace"),
        sshkey: get_string(planned, "sshkey"),
        clientcert: get_string(planned, "clientcert"),
        snmpv: get_string(planned, "snmpv"),
        snmpcom: get_string(planned, "snmpcom"),
    })
}

/// Overlay the API's view of `check` on `base`.
///
/// `password` and the parameters NodePing does not echo reliably (`dep`,
/// `homeloc`, `postdata`, `secure`, `dnssection`, `transport`, `email`,
/// `database`, `query`, `namespace`, `snmpv`, `snmpcom`) keep their base value.
fn apply_check(check: &Check, base: Value) -> Value {
    let mut state = as_object(base);
    let params = &check.parameters;
    let mut set = |key: &str, value: Value| {
        state.insert(key.to_string(), value);
    };

    if !check.id.is_empty() {
        set("id", json!(check.id));
    }
    if !check.customer_id.is_empty() {
        set("customer_id", json!(check.customer_id));
    }
    set("type", json!(check.check_type));
    set("label", json!(check.label));
    set("enabled", json!(check.is_enabled()));
    set("public", json!(check.public));
    set("autodiag", json!(check.autodiag));
    if let Some(interval) = check.interval() {
        set("interval", json!(interval));
    }
    set("state", json!(check.state));
    set("created", json!(check.created));
    set("modified", json!(check.modified));
    set("description", non_empty(&check.description));
    set(
        "tags",
        check.tags.as_ref().map_or(Value::Null, |tags| json!(tags)),
    );
    set(
        "runlocations",
        check.run_locations().map_or(Value::Null, |l| json!(l)),
    );
    set("target", json!(params.target));

    if let Some(threshold) = params.threshold.as_ref().and_then(parse_i64) {
        set("threshold", json!(threshold));
    }
    if let Some(sens) = params.sens.as_ref().and_then(parse_i64) {
        set("sens", json!(sens));
    }

    set("contentstring", non_empty(&params.contentstring));
    for (key, raw) in [
        ("regex", &params.regex),
        ("invert", &params.invert),
        ("follow", &params.follow),
        ("ipv6", &params.ipv6),
        ("verify", &params.verify),
        ("dnsrd", &params.dnsrd),
    ] {
        if let Some(raw) = raw.as_ref().filter(|v| !v.is_null()) {
            set(key, json!(parse_bool(raw)));
        }
    }
    set(
        "mute",
        json!(check.mute.as_ref().is_some_and(parse_bool)),
    );

    match &params.statuscode {
        Some(Value::Number(n)) => set("statuscode", json!(n.as_f64().unwrap_or(0.0) as i64)),
        Some(code @ Value::String(_)) => {
            if let Some(code) = parse_i64(code).filter(|c| *c > 0) {
                set("statuscode", json!(code));
            }
        },
        _ => {},
    }

    set("method", non_empty(&params.method));
    set("dnstype", non_empty(&params.dnstype));
    set("dnstoresolve", non_empty(&params.dnstoresolve));
    set("servername", non_empty(&params.servername));
    set("username", non_empty(&params.username));
    set("warningdays", whole_number(params.warningdays.as_ref()));
    set("port", whole_number(params.port.as_ref()));
    set("sendheaders", non_empty_map(params.sendheaders.as_ref()));
    set("receiveheaders", non_empty_map(params.receiveheaders.as_ref()));
    set("sshkey", id_string(params.sshkey.as_ref()));
    set("clientcert", id_string(params.clientcert.as_ref()));

    let notifications = check.flat_notifications();
    set(
        "notifications",
        if notifications.is_empty() {
            Value::Null
        } else {
            notifications
                .into_iter()
                .map(|n| json!({"contact_id": n.contact_id, "delay": n.delay, "schedule": n.schedule}))
                .collect()
        },
    );

    Value::Object(state)
}

/// A JSON number as an integer; anything else is null.
fn whole_number(value: Option<&Value>) -> Value {
    match value.and_then(Value::as_f64) {
        Some(n) => json!(n as i64),
        None => Value::Null,
    }
}

/// SSH key and client certificate ids are strings, or `false` when unset.
fn id_string(value: Option<&Value>) -> Value {
    match value.and_then(Value::as_str) {
        Some(s) => non_empty(s),
        None => Value::Null,
    }
}

/// Keep the configured target when NodePing only added or removed a
/// trailing slash.
fn keep_target(original: Option<&Value>, state: &mut Value) {
    let Some(Value::String(original)) = original else {
        return;
    };
    let Some(obj) = state.as_object_mut() else {
        return;
    };
    let same = obj
        .get("target")
        .and_then(Value::as_str)
        .is_some_and(|current| trim_slash(current) == trim_slash(original));
    if same {
        obj.insert("target".to_string(), Value::String(original.clone()));
    }
}

fn trim_slash(url: &str) -> &str {
    url.strip_suffix('/').unwrap_or(url)
}

#[async_trait]
impl Resource for CheckResource {
    fn type_name(&self) -> &'static str {
        "nodeping_check"
    }

    fn schema(&self) -> Schema {
        check_schema()
    }

    fn adjust_plan(&self, default_tags: &[String], _prior: Option<&Value>, planned: &mut Value) {
        if default_tags.is_empty() {
            return;
        }
        if let Some(obj) = planned.as_object_mut() {
            let configured = obj.get("tags").cloned().unwrap_or(Value::Null);
            obj.insert("tags".to_string(), plan::merge_tags(default_tags, &configured));
        }
    }

    async fn create(&self, client: &Client, planned: Value) -> Result<Value, ProviderError> {
        let request = build_request(&planned)?;
        debug!(check_type = %request.check_type, "Creating check");

        let check = client
            .create_check(&request)
            .await
            .map_err(|e| ProviderError::from(e).with_context("Could not create check"))?;

        let original_target = planned.get("target").cloned();
        let mut state = apply_check(&check, planned);
        keep_target(original_target.as_ref(), &mut state);

        info!(id = %check.id, "Created check");
        Ok(state)
    }

    async fn read(&self, client: &Client, state: Value) -> Result<Value, ProviderError> {
        let id = state_id(&state)?;
        debug!(id = %id, "Reading check");

        let check = match client.get_check(&id).await {
            Ok(check) => check,
            Err(e) if e.is_not_found() => {
                debug!(id = %id, "Check not found, removing from state");
                return Ok(Value::Null);
            },
            Err(e) => {
                return Err(ProviderError::from(e)
                    .with_context(format!("Could not read check ID {}", id)))
            },
        };

        let original_target = state.get("target").cloned();
        let mut refreshed = apply_check(&check, state);
        keep_target(original_target.as_ref(), &mut refreshed);
        Ok(refreshed)
    }

    async fn update(
        &self,
        client: &Client,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let id = state_id(&prior)?;
        let request = build_request(&planned)?;
        debug!(id = %id, "Updating check");

        let check = client.update_check(&id, &request).await.map_err(|e| {
            ProviderError::from(e).with_context(format!("Could not update check ID {}", id))
        })?;

        let original_target = planned.get("target").cloned();
        let planned_modified = planned.get("modified").filter(|v| !v.is_null()).cloned();
        let planned_content = get_str(&planned, "contentstring")
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let mut state = apply_check(&check, planned);
        keep_target(original_target.as_ref(), &mut state);

        if let Some(obj) = state.as_object_mut() {
            // NodePing bumps `modified` on every write; the plan carried the prior value.
            if let Some(modified) = planned_modified {
                obj.insert("modified".to_string(), modified);
            }
            if let Some(content) = planned_content {
                let echoed_empty = obj
                    .get("contentstring")
                    .and_then(Value::as_str)
                    .map_or(true, str::is_empty);
                if echoed_empty {
                    obj.insert("contentstring".to_string(), Value::String(content));
                }
            }
        }

        info!(id = %id, "Updated check");
        Ok(state)
    }

    async fn delete(&self, client: &Client, state: Value) -> Result<(), ProviderError> {
        let id = state_id(&state)?;
        debug!(id = %id, "Deleting check");

        match client.delete_check(&id).await {
            Ok(()) => {
                info!(id = %id, "Deleted check");
                Ok(())
            },
            Err(e) if e.is_not_found() => {
                debug!(id = %id, "Check already gone");
                Ok(())
            },
            Err(e) => Err(ProviderError::from(e)
                .with_context(format!("Could not delete check ID {}", id))),
        }
    }

    async fn import(&self, client: &Client, id: &str) -> Result<Value, ProviderError> {
        let (customer_id, check_id) = parse_import_id("check", id)?;
        debug!(check_id, customer_id = customer_id.unwrap_or_default(), "Importing check");

        let check = scoped_client(client, customer_id)
            .get_check(check_id)
            .await
            .map_err(|e| ProviderError::from(e).with_context("Could not import check"))?;

        Ok(apply_check(&check, Value::Object(Map::new())))
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

    fn api_check() -> Value {
        json!({
            "_id": "201205050153W2Q4C-0J2HSIRF",
            "customer_id": "201205050153W2Q4C",
            "label": "Homepage",
            "type": "HTTP",
            "interval": "5",
            "enable": "active",
            "public": false,
            "state": 1,
            "created": 1700000000000i64,
            "modified": 1700000001000i64,
            "mute": 0,
            "runlocations": false,
            "parameters": {
                "target": "https://example.com/",
                "threshold": "10",
                "sens": 2,
                "follow": "1",
                "statuscode": "0",
                "sshkey": false,
                "port": 443
            },
            "notifications": [
                {"K5SP9CQP": {"delay": 0, "schedule": "Days"}},
                {"K5SP9CQP": {"delay": 0, "schedule": "Days"}},
                {"S4BLAFKZ": {"delay": "5"}}
            ]
        })
    }

    #[test]
    fn test_schema_validates_check_types() {
        let schema = check_schema();
        assert!(validation::is_valid(&schema, &json!({"type": "HTTP"})));
        assert!(!validation::is_valid(&schema, &json!({"type": "GOPHER"})));
        assert!(!validation::is_valid(&schema, &json!({"type": "SSL", "warningdays": 0})));
        assert!(schema.block.attributes["password"].flags.sensitive);
    }

    #[test]
    fn test_build_request() {
        let request = build_request(&json!({
            "type": "HTTP",
            "target": "https://example.com",
            "enabled": false,
            "interval": 1.0,
            "runlocations": [],
            "label": null,
            "notifications": [{"contact_id": "K5SP9CQP", "delay": 3}]
        }))
        .unwrap();

        assert_eq!(request.enabled.as_deref(), Some("false"));
        assert_eq!(request.interval, Some(1.0));
        assert!(request.runlocations.is_none());
        assert!(request.label.is_none());
        assert_eq!(request.notifications[0]["K5SP9CQP"].delay, 3);
        assert_eq!(request.notifications[0]["K5SP9CQP"].schedule, "All");

        assert!(build_request(&json!({"target": "x"})).is_err());
    }

    #[test]
    fn test_apply_check_mapping() {
        let check: Check = serde_json::from_value(api_check()).unwrap();
        let state = apply_check(
            &check,
            json!({"password": "secret", "postdata": "a=b", "description": "old"}),
        );

        assert_eq!(state["id"], "201205050153W2Q4C-0J2HSIRF");
        assert_eq!(state["enabled"], true);
        assert_eq!(state["interval"], 5.0);
        assert_eq!(state["threshold"], 10);
        assert_eq!(state["follow"], true);
        assert!(state["regex"].is_null());
        assert_eq!(state["mute"], false);
        assert!(state.get("statuscode").is_none());
        assert!(state["sshkey"].is_null());
        assert_eq!(state["port"], 443);
        assert!(state["runlocations"].is_null());
        assert!(state["description"].is_null());
        assert!(state["tags"].is_null());
        assert_eq!(state["password"], "secret");
        assert_eq!(state["postdata"], "a=b");
        assert_eq!(
            state["notifications"],
            json!([
                {"contact_id": "K5SP9CQP", "delay": 0, "schedule": "Days"},
                {"contact_id": "S4BLAFKZ", "delay": 5, "schedule": "All"}
            ])
        );
    }

    #[test]
    fn test_keep_target() {
        let mut state = json!({"target": "https://example.com/"});
        keep_target(Some(&json!("https://example.com")), &mut state);
        assert_eq!(state["target"], "https://example.com");

        let mut state = json!({"target": "https://example.org/"});
        keep_target(Some(&json!("https://example.com")), &mut state);
        assert_eq!(state["target"], "https://example.org/");
    }

    #[test]
    fn test_plan_merges_default_tags() {
        let tags = vec!["managed".to_string()];
        let plan = CheckResource
            .plan(&tags, None, json!({"type": "PING", "target": "example.com", "tags": ["web"]}))
            .unwrap();
        assert_eq!(plan.planned_state["tags"], json!(["managed", "web"]));
        assert_eq!(plan.planned_state["interval"], json!(15.0));
        assert_eq!(plan.planned_state["threshold"], json!(5));

        let plan = CheckResource
            .plan(&[], None, json!({"type": "PING"}))
            .unwrap();
        assert!(plan.planned_state.get("tags").is_none());
    }

    #[test]
    fn test_plan_update_keeps_computed_and_destroy() {
        let prior = json!({
            "id": "C1", "customer_id": "CUST", "type": "PING", "label": "x",
            "enabled": false, "public": false, "interval": 15.0, "threshold": 5,
            "sens": 2, "mute": false, "autodiag": false,
            "state": 1, "created": 1, "modified": 2
        });
        let plan = CheckResource
            .plan(&[], Some(&prior), json!({"type": "PING", "enabled": true}))
            .unwrap();
        assert_eq!(plan.planned_state["id"], "C1");
        assert_eq!(plan.planned_state["modified"], 2);
        assert_eq!(plan.changes.len(), 1);
        assert_eq!(plan.changes[0].path, "enabled");
        assert!(!plan.requires_replace);

        let destroy = CheckResource.plan(&[], Some(&prior), Value::Null).unwrap();
        assert!(destroy.planned_state.is_null());
        assert!(destroy.changes.iter().all(|c| c.after.is_none()));
    }

    #[tokio::test]
    async fn test_create_keeps_planned_target() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/checks"))
            .and(body_partial_json(json!({"type": "HTTP", "target": "https://example.com"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(api_check()))
            .expect(1)
            .mount(&server)
            .await;

        let state = CheckResource
            .create(
                &client(&server),
                json!({"type": "HTTP", "target": "https://example.com", "enabled": true}),
            )
            .await
            .unwrap();
        assert_eq!(state["target"], "https://example.com");
        assert_eq!(state["customer_id"], "201205050153W2Q4C");
    }

    #[tokio::test]
    async fn test_update_restores_modified_and_contentstring() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/checks/201205050153W2Q4C-0J2HSIRF"))
            .respond_with(ResponseTemplate::new(200).set_body_json(api_check()))
            .expect(1)
            .mount(&server)
            .await;

        let prior = json!({"id": "201205050153W2Q4C-0J2HSIRF", "type": "HTTP"});
        let planned = json!({
            "id": "201205050153W2Q4C-0J2HSIRF",
            "type": "HTTP",
            "modified": 42,
            "contentstring": "Welcome"
        });
        let state = CheckResource
            .update(&client(&server), prior, planned)
            .await
            .unwrap();
        assert_eq!(state["modified"], 42);
        assert_eq!(state["contentstring"], "Welcome");
    }

    #[tokio::test]
    async fn test_read_gone_and_delete_gone() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/checks/gone"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "not found"})))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/checks/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client(&server);
        let state = CheckResource
            .read(&client, json!({"id": "gone"}))
            .await
            .unwrap();
        assert!(state.is_null());
        CheckResource
            .delete(&client, json!({"id": "gone"}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_read_error_has_context() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "bad token"})))
            .mount(&server)
            .await;

        let err = CheckResource
            .read(&client(&server), json!({"id": "C1"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::PermissionDenied(_)));
        assert!(err.message().starts_with("Could not read check ID C1"));
    }

    #[tokio::test]
    async fn test_import_with_customer_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/checks/201205050153W2Q4C-0J2HSIRF"))
            .and(wiremock::matchers::query_param("customerid", "SUB"))
            .respond_with(ResponseTemplate::new(200).set_body_json(api_check()))
            .expect(1)
            .mount(&server)
            .await;

        let state = CheckResource
            .import(&client(&server), "SUB:201205050153W2Q4C-0J2HSIRF")
            .await
            .unwrap();
        assert_eq!(state["target"], "https://example.com/");
        assert!(state.get("password").is_none());
    }
}
