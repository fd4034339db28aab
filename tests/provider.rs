//! End-to-end provider behaviour against an in-memory NodePing API.

mod common;

use common::{NodePingMock, CUSTOMER_ID};
use hemmer_provider_nodeping::testing::{
    assert_plan_changes_attribute, assert_plan_creates, assert_plan_does_not_change_attribute,
    assert_plan_no_changes, ProviderTester,
};
use hemmer_provider_nodeping::{NodePingProvider, ProviderError, ProviderService};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn tester(mock: &NodePingMock) -> ProviderTester<NodePingProvider> {
    ProviderTester::nodeping(&mock.uri()).await.unwrap()
}

fn ping_check() -> Value {
    json!({"type": "PING", "target": "example.com"})
}

fn ops_contact() -> Value {
    json!({
        "name": "Ops",
        "addresses": [
            {"type": "email", "address": "ops@example.com", "suppress_up": true},
            {
                "type": "webhook",
                "address": "https://hooks.example.com/nodeping",
                "action": "post",
                "data": "{\"event\": \"down\"}"
            }
        ]
    })
}

#[tokio::test]
async fn test_check_lifecycle() {
    let mock = NodePingMock::start().await;
    let tester = tester(&mock).await;

    let state = tester
        .lifecycle_create("nodeping_check", ping_check())
        .await
        .unwrap();
    let id = state["id"].as_str().unwrap().to_string();
    assert!(id.starts_with("MOCK-CHECK"));
    assert_eq!(state["customer_id"], CUSTOMER_ID);
    assert_eq!(state["label"], "example.com");
    assert_eq!(state["threshold"], 5);
    assert_eq!(state["interval"], 15.0);
    assert_eq!(state["enabled"], false);
    assert_eq!(state["state"], 1);

    let sent = &mock.bodies("POST", "/checks")[0];
    assert_eq!(sent["type"], "PING");
    assert_eq!(sent["enabled"], "false");
    assert_eq!(sent["sens"], 2);

    let plan = tester
        .plan_update("nodeping_check", state.clone(), ping_check())
        .await
        .unwrap();
    assert_plan_no_changes(&plan);

    let updated = tester
        .lifecycle_update(
            "nodeping_check",
            state,
            json!({"type": "PING", "target": "example.com", "label": "Edge", "enabled": true}),
        )
        .await
        .unwrap();
    assert_eq!(updated["id"], id.as_str());
    assert_eq!(updated["label"], "Edge");
    assert_eq!(updated["enabled"], true);
    assert_eq!(mock.bodies("PUT", &format!("/checks/{}", id))[0]["enabled"], "active");

    tester
        .lifecycle_delete("nodeping_check", updated)
        .await
        .unwrap();
    assert!(mock.check(&id).is_none());
}

#[tokio::test]
async fn test_check_plan_merges_default_tags() {
    let mock = NodePingMock::start().await;
    let tester = ProviderTester::nodeping_with(json!({
        "api_url": mock.uri(),
        "default_tags": ["hemmer", "web"],
    }))
    .await
    .unwrap();

    let config = json!({"type": "HTTP", "target": "https://example.com", "tags": ["web", "prod"]});
    let plan = tester.plan_create("nodeping_check", config).await.unwrap();
    assert_plan_creates(&plan);
    assert_eq!(plan.planned_state["tags"], json!(["hemmer", "web", "prod"]));

    let state = tester
        .create("nodeping_check", plan.planned_state)
        .await
        .unwrap();
    assert_eq!(state["tags"], json!(["hemmer", "web", "prod"]));
    assert_eq!(
        mock.bodies("POST", "/checks")[0]["tags"],
        json!(["hemmer", "web", "prod"])
    );
}

#[tokio::test]
async fn test_check_removed_outside_hemmer() {
    let mock = NodePingMock::start().await;
    let tester = tester(&mock).await;

    let state = tester
        .lifecycle_create("nodeping_check", ping_check())
        .await
        .unwrap();
    mock.remove_check(state["id"].as_str().unwrap());

    assert_eq!(tester.read("nodeping_check", state.clone()).await.unwrap(), Value::Null);
    tester.delete("nodeping_check", state).await.unwrap();
}

#[tokio::test]
async fn test_check_import() {
    let mock = NodePingMock::start().await;
    mock.insert_check(json!({
        "_id": "201205050153W2Q4C-0J2HSIRF",
        "customer_id": "201205050153W2Q4C",
        "label": "Homepage",
        "type": "HTTP",
        "interval": "5",
        "enable": "active",
        "runlocations": ["nam"],
        "parameters": {"target": "https://example.com/", "threshold": "10", "sens": 2},
        "notifications": [{"K5SP9CQP": {"delay": 0, "schedule": "Days"}}]
    }));
    let tester = tester(&mock).await;

    let imported = tester
        .import_resource("nodeping_check", "201205050153W2Q4C:201205050153W2Q4C-0J2HSIRF")
        .await
        .unwrap();
    assert_eq!(imported.len(), 1);
    assert_eq!(imported[0].resource_type, "nodeping_check");

    let state = &imported[0].state;
    assert_eq!(state["id"], "201205050153W2Q4C-0J2HSIRF");
    assert_eq!(state["interval"], 5.0);
    assert_eq!(state["threshold"], 10);
    assert_eq!(state["enabled"], true);
    assert_eq!(state["runlocations"], json!(["nam"]));
    assert_eq!(
        state["notifications"],
        json!([{"contact_id": "K5SP9CQP", "delay": 0, "schedule": "Days"}])
    );

    let err = tester
        .import_resource("nodeping_check", "missing")
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::NotFound(_)));
    assert!(err.message().starts_with("Could not import check"));

    let err = tester
        .import_resource("nodeping_check", "a:b:c")
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Validation(_)));
}

#[tokio::test]
async fn test_contact_lifecycle() {
    let mock = NodePingMock::start().await;
    let tester = tester(&mock).await;

    let state = tester
        .lifecycle_create("nodeping_contact", ops_contact())
        .await
        .unwrap();
    let id = state["id"].as_str().unwrap().to_string();
    assert!(id.starts_with("MOCK-CONTACT"));
    assert_eq!(state["custrole"], "notify");

    let addresses = state["addresses"].as_array().unwrap();
    assert_eq!(addresses.len(), 2);
    assert_eq!(addresses[0]["type"], "email");
    assert_eq!(addresses[0]["suppress_up"], true);
    assert_eq!(addresses[1]["action"], "post");
    assert_eq!(addresses[1]["data"], "{\"event\": \"down\"}");
    let webhook_id = addresses[1]["id"].as_str().unwrap().to_string();

    let plan = tester
        .plan_update("nodeping_contact", state.clone(), ops_contact())
        .await
        .unwrap();
    assert_plan_no_changes(&plan);

    let replaced = json!({
        "name": "Ops",
        "addresses": [
            {
                "type": "webhook",
                "address": "https://hooks.example.com/nodeping",
                "action": "post",
                "data": "{\"event\":\"down\"}"
            },
            {"type": "sms", "address": "+15555550100"}
        ]
    });
    let plan = tester
        .plan_update("nodeping_contact", state.clone(), replaced.clone())
        .await
        .unwrap();
    assert_plan_changes_attribute(&plan, "addresses");
    assert_plan_does_not_change_attribute(&plan, "name");
    assert_eq!(
        plan.planned_state["addresses"][0]["data"],
        "{\"event\": \"down\"}"
    );

    let updated = tester
        .lifecycle_update("nodeping_contact", state, replaced)
        .await
        .unwrap();
    let sent = &mock.bodies("PUT", &format!("/contacts/{}", id))[0];
    assert!(sent["addresses"].get(&webhook_id).is_some());
    assert_eq!(sent["newaddresses"][0]["type"], "sms");

    let addresses = updated["addresses"].as_array().unwrap();
    assert_eq!(addresses.len(), 2);
    assert_eq!(addresses[0]["id"], webhook_id.as_str());
    assert_eq!(addresses[1]["type"], "sms");

    tester
        .lifecycle_delete("nodeping_contact", updated)
        .await
        .unwrap();
    assert!(mock.contact(&id).is_none());
}

#[tokio::test]
async fn test_contact_crud_keeps_configured_address_order() {
    let mock = NodePingMock::start().await;
    let tester = tester(&mock).await;

    let reordered = json!({
        "name": "Ops Team",
        "addresses": [
            {
                "type": "webhook",
                "address": "https://hooks.example.com/nodeping",
                "action": "post",
                "data": "{\"event\": \"down\"}"
            },
            {"type": "email", "address": "ops@example.com", "suppress_up": true}
        ]
    });
    let updated = tester
        .lifecycle_crud("nodeping_contact", ops_contact(), reordered)
        .await
        .unwrap();

    assert_eq!(updated["name"], "Ops Team");
    assert_eq!(updated["addresses"][0]["type"], "webhook");
    assert_eq!(updated["addresses"][1]["type"], "email");

    let id = updated["id"].as_str().unwrap();
    let sent = &mock.bodies("PUT", &format!("/contacts/{}", id))[0];
    assert_eq!(sent["addresses"].as_object().unwrap().len(), 2);
    assert!(sent["newaddresses"].as_array().map_or(true, |a| a.is_empty()));
    assert!(mock.contact(id).is_none());
}

#[tokio::test]
async fn test_contact_import() {
    let mock = NodePingMock::start().await;
    mock.insert_contact(json!({
        "_id": "201205050153W2Q4C-BKPGH",
        "type": "contact",
        "customer_id": "201205050153W2Q4C",
        "name": "Ops",
        "custrole": "edit",
        "addresses": {
            "K5SP9CQP": {"address": "ops@example.com", "type": "email", "mute": 1}
        }
    }));
    let tester = tester(&mock).await;

    let imported = tester
        .import_resource("nodeping_contact", "201205050153W2Q4C-BKPGH")
        .await
        .unwrap();
    let state = &imported[0].state;
    assert_eq!(state["custrole"], "edit");
    assert_eq!(state["addresses"][0]["id"], "K5SP9CQP");
    assert_eq!(state["addresses"][0]["mute"], true);
}

#[tokio::test]
async fn test_data_sources() {
    let mock = NodePingMock::start().await;
    let tester = tester(&mock).await;

    let ping = tester
        .lifecycle_create("nodeping_check", ping_check())
        .await
        .unwrap();
    tester
        .lifecycle_create(
            "nodeping_check",
            json!({"type": "HTTP", "target": "https://example.com", "tags": ["web"]}),
        )
        .await
        .unwrap();
    let contact = tester
        .lifecycle_create("nodeping_contact", ops_contact())
        .await
        .unwrap();

    let all = tester
        .read_data_source("nodeping_checks", json!({}))
        .await
        .unwrap();
    assert_eq!(all["checks"].as_array().unwrap().len(), 2);
    assert!(all["type"].is_null());

    let pings = tester
        .read_data_source("nodeping_checks", json!({"type": "PING"}))
        .await
        .unwrap();
    assert_eq!(pings["type"], "PING");
    assert_eq!(pings["checks"].as_array().unwrap().len(), 1);
    assert_eq!(pings["checks"][0]["id"], ping["id"]);

    let check = tester
        .read_data_source("nodeping_check", json!({"id": ping["id"]}))
        .await
        .unwrap();
    assert_eq!(check["target"], "example.com");
    assert_eq!(check["threshold"], 5);

    let single = tester
        .read_data_source("nodeping_contact", json!({"id": contact["id"]}))
        .await
        .unwrap();
    assert_eq!(single["name"], "Ops");
    assert_eq!(single["addresses"].as_array().unwrap().len(), 2);

    let contacts = tester
        .read_data_source("nodeping_contacts", json!({}))
        .await
        .unwrap();
    assert_eq!(contacts["contacts"].as_array().unwrap().len(), 1);

    let err = tester
        .read_data_source("nodeping_check", json!({"id": "missing"}))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::NotFound(_)));
    assert!(err.message().starts_with("Could not read check ID missing"));
}

#[tokio::test]
async fn test_api_errors_carry_context() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/checks/C1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "bad token"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/contacts"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "invalid address"})),
        )
        .mount(&server)
        .await;

    let tester = ProviderTester::nodeping(&server.uri()).await.unwrap();

    let err = tester
        .read("nodeping_check", json!({"id": "C1"}))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::PermissionDenied(_)));
    assert_eq!(
        err.message(),
        "Could not read check ID C1: NodePing API error (status 401): bad token"
    );

    let plan = tester
        .plan_create("nodeping_contact", ops_contact())
        .await
        .unwrap();
    let err = tester
        .create("nodeping_contact", plan.planned_state)
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::InvalidRequest(_)));
    assert!(err.message().contains("invalid address"));
}

#[tokio::test]
async fn test_operations_require_configure() {
    let provider = NodePingProvider::new("0.0.0-test");
    let err = provider
        .read("nodeping_contact", json!({"id": "C1"}))
        .await
        .unwrap_err();
    assert_eq!(err.summary(), "Provider not ready");

    let err = provider
        .import_resource("nodeping_check", "C1")
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::FailedPrecondition(_)));
}
