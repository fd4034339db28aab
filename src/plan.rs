//! Plan computation shared by the resources.
//!
//! A plan starts from the proposed state the host sends (configuration with
//! computed attributes left `null`) and fills it in:
//!
//! 1. schema defaults for unset optional attributes ([`apply_defaults`]),
//! 2. computed values carried over from the prior state
//!    ([`use_state_for_unknown`]),
//! 3. resource-specific adjustments such as [`merge_tags`],
//!
//! and is then diffed against the prior state ([`plan_result`]).

use serde_json::{Map, Value};

use crate::schema::{Block, BlockNestingMode, Schema};
use crate::types::{AttributeChange, PlanResult};

/// Top-level attribute changes between `prior` and `planned`.
///
/// `null` and missing are the same thing, also inside nested objects. A
/// `null` side (create or destroy) reports every non-null attribute of the
/// other side. Changes come out sorted by attribute name.
pub fn diff_states(prior: &Value, planned: &Value) -> Vec<AttributeChange> {
    let empty = Map::new();
    let before = prior.as_object().unwrap_or(&empty);
    let after = planned.as_object().unwrap_or(&empty);

    let mut keys: Vec<&String> = before.keys().chain(after.keys()).collect();
    keys.sort();
    keys.dedup();

    keys.into_iter()
        .filter_map(|key| {
            let old = before.get(key).filter(|v| !v.is_null());
            let new = after.get(key).filter(|v| !v.is_null());
            let unchanged = match (old, new) {
                (Some(a), Some(b)) => equivalent(a, b),
                (a, b) => a == b,
            };
            if unchanged {
                None
            } else {
                Some(AttributeChange::new(key.clone(), old.cloned(), new.cloned()))
            }
        })
        .collect()
}

/// Deep equality where an object key holding `null` equals an absent key
/// and `15` equals `15.0`.
fn equivalent(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Object(x), Value::Object(y)) => x
            .keys()
            .chain(y.keys())
            .all(|key| match (x.get(key), y.get(key)) {
                (Some(l), Some(r)) => equivalent(l, r),
                (Some(v), None) | (None, Some(v)) => v.is_null(),
                (None, None) => true,
            }),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| equivalent(l, r))
        },
        _ => a == b,
    }
}

/// Fill unset attributes that have a schema default, recursing into nested
/// blocks.
pub fn apply_defaults(block: &Block, value: &mut Value) {
    let Some(obj) = value.as_object_mut() else {
        return;
    };

    for (name, attr) in &block.attributes {
        if let Some(default) = &attr.default {
            let slot = obj.entry(name.clone()).or_insert(Value::Null);
            if slot.is_null() {
                *slot = default.clone();
            }
        }
    }

    for (name, nested) in &block.blocks {
        match obj.get_mut(name) {
            Some(Value::Array(items)) => {
                for item in items {
                    apply_defaults(&nested.block, item);
                }
            },
            Some(Value::Object(entries)) if nested.nesting_mode == BlockNestingMode::Map => {
                for item in entries.values_mut() {
                    apply_defaults(&nested.block, item);
                }
            },
            Some(item @ Value::Object(_)) => apply_defaults(&nested.block, item),
            _ => {},
        }
    }
}

/// Copy computed attributes that are `null` in `proposed` from `prior`.
///
/// List blocks are matched element by element: first on equal values of the
/// block's required attributes, then on position.
pub fn use_state_for_unknown(block: &Block, prior: &Value, proposed: &mut Value) {
    let (Some(prior_obj), Some(obj)) = (prior.as_object(), proposed.as_object_mut()) else {
        return;
    };

    for (name, attr) in &block.attributes {
        if !attr.flags.computed {
            continue;
        }
        let Some(old) = prior_obj.get(name).filter(|v| !v.is_null()) else {
            continue;
        };
        let slot = obj.entry(name.clone()).or_insert(Value::Null);
        if slot.is_null() {
            *slot = old.clone();
        }
    }

    for (name, nested) in &block.blocks {
        let Some(old) = prior_obj.get(name) else {
            continue;
        };
        match (nested.nesting_mode, obj.get_mut(name)) {
            (BlockNestingMode::List | BlockNestingMode::Set, Some(Value::Array(items))) => {
                let old_items = old.as_array().map(Vec::as_slice).unwrap_or_default();
                let mut taken = vec![false; old_items.len()];
                let positions: Vec<Option<usize>> = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| match_element(&nested.block, old_items, &mut taken, item, i))
                    .collect();
                for (item, position) in items.iter_mut().zip(positions) {
                    if let Some(j) = position {
                        use_state_for_unknown(&nested.block, &old_items[j], item);
                    }
                }
            },
            (BlockNestingMode::Map, Some(Value::Object(entries))) => {
                for (key, item) in entries.iter_mut() {
                    if let Some(old_item) = old.get(key) {
                        use_state_for_unknown(&nested.block, old_item, item);
                    }
                }
            },
            (BlockNestingMode::Single, Some(item)) => use_state_for_unknown(&nested.block, old, item),
            _ => {},
        }
    }
}

fn match_element(
    block: &Block,
    candidates: &[Value],
    taken: &mut [bool],
    item: &Value,
    index: usize,
) -> Option<usize> {
    let identity: Vec<&String> = block
        .attributes
        .iter()
        .filter(|(_, attr)| attr.flags.required)
        .map(|(name, _)| name)
        .collect();

    let by_identity = if identity.is_empty() {
        None
    } else {
        candidates.iter().enumerate().position(|(j, candidate)| {
            !taken[j] && identity.iter().all(|name| candidate.get(*name) == item.get(*name))
        })
    };

    let found = by_identity.or_else(|| (index < candidates.len() && !taken[index]).then_some(index));
    if let Some(j) = found {
        taken[j] = true;
    }
    found
}

/// Default tags first, then configured tags, without duplicates.
///
/// Returns `configured` untouched when there are no default tags, so an
/// unset `tags` stays `null`.
pub fn merge_tags(default_tags: &[String], configured: &Value) -> Value {
    if default_tags.is_empty() {
        return configured.clone();
    }

    let mut merged: Vec<Value> = Vec::new();
    let configured_tags = configured.as_array().map(Vec::as_slice).unwrap_or_default();
    let all = default_tags
        .iter()
        .map(|t| Value::String(t.clone()))
        .chain(configured_tags.iter().cloned());
    for tag in all {
        if !merged.contains(&tag) {
            merged.push(tag);
        }
    }
    Value::Array(merged)
}

/// Whether two strings hold the same JSON document.
///
/// Falls back to plain string equality when either side is not valid JSON.
pub fn json_semantic_equal(a: &str, b: &str) -> bool {
    match (
        serde_json::from_str::<Value>(a),
        serde_json::from_str::<Value>(b),
    ) {
        (Ok(x), Ok(y)) => x == y,
        _ => a == b,
    }
}

/// Keep `prior` in `planned` when both are JSON-equivalent strings.
pub fn keep_equivalent_json(prior: Option<&Value>, planned: &mut Value) {
    let Some(Value::String(old)) = prior else {
        return;
    };
    let equivalent = match planned {
        Value::String(new) => old != new && json_semantic_equal(old, new),
        _ => false,
    };
    if equivalent {
        *planned = Value::String(old.clone());
    }
}

/// Fill `proposed` with defaults and prior computed values.
pub fn planned_state(schema: &Schema, prior: Option<&Value>, mut proposed: Value) -> Value {
    apply_defaults(&schema.block, &mut proposed);
    if let Some(prior) = prior {
        use_state_for_unknown(&schema.block, prior, &mut proposed);
    }
    proposed
}

/// Diff `planned` against `prior`. Replacement is required when a changed
/// attribute is force-new and the resource already exists.
pub fn plan_result(schema: &Schema, prior: Option<&Value>, planned: Value) -> PlanResult {
    let changes = diff_states(prior.unwrap_or(&Value::Null), &planned);
    let requires_replace = prior.is_some_and(|p| !p.is_null())
        && changes.iter().any(|change| {
            schema
                .block
                .attributes
                .get(&change.path)
                .is_some_and(|attr| attr.force_new)
        });
    PlanResult::with_changes(planned, changes, requires_replace)
}

/// A destroy plan: `null` planned state, every prior attribute removed.
pub fn plan_destroy(prior: Option<&Value>) -> PlanResult {
    let changes = diff_states(prior.unwrap_or(&Value::Null), &Value::Null);
    PlanResult::with_changes(Value::Null, changes, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, AttributeType, NestedBlock};
    use serde_json::json;

    fn schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("label", Attribute::optional_string().computed())
            .with_attribute(
                "interval",
                Attribute::with_default_value(AttributeType::Float64, json!(15)),
            )
            .with_attribute("target", Attribute::optional_string())
            .with_block(
                "addresses",
                NestedBlock::list(
                    Block::new()
                        .with_attribute("id", Attribute::computed_string())
                        .with_attribute("type", Attribute::required_string())
                        .with_attribute("address", Attribute::required_string())
                        .with_attribute(
                            "mute",
                            Attribute::with_default_value(AttributeType::Bool, json!(false)),
                        ),
                ),
            )
    }

    #[test]
    fn test_diff_states() {
        let prior = json!({"id": "1", "label": "a", "tags": null, "gone": 1});
        let planned = json!({"id": "1", "label": "b", "tags": ["x"]});
        let changes = diff_states(&prior, &planned);

        let paths: Vec<_> = changes.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["gone", "label", "tags"]);
        assert_eq!(changes[0], AttributeChange::removed("gone", json!(1)));
        assert_eq!(changes[2], AttributeChange::added("tags", json!(["x"])));
    }

    #[test]
    fn test_diff_ignores_nested_nulls_and_number_layout() {
        let prior = json!({"interval": 15.0, "addresses": [{"id": "A", "data": null}]});
        let planned = json!({"interval": 15, "addresses": [{"id": "A"}]});
        assert!(diff_states(&prior, &planned).is_empty());

        let planned = json!({"interval": 15, "addresses": [{"id": "A", "data": "{}"}]});
        assert_eq!(diff_states(&prior, &planned).len(), 1);
    }

    #[test]
    fn test_diff_null_sides() {
        let state = json!({"id": "1", "label": "a", "target": null});
        assert_eq!(diff_states(&Value::Null, &state).len(), 2);
        assert!(diff_states(&state, &Value::Null)
            .iter()
            .all(|c| c.after.is_none()));
    }

    #[test]
    fn test_apply_defaults_recurses_into_blocks() {
        let mut value = json!({
            "interval": null,
            "addresses": [{"type": "email", "address": "a@example.com"}]
        });
        apply_defaults(&schema().block, &mut value);
        assert_eq!(value["interval"], json!(15));
        assert_eq!(value["addresses"][0]["mute"], json!(false));

        let mut configured = json!({"interval": 1});
        apply_defaults(&schema().block, &mut configured);
        assert_eq!(configured["interval"], json!(1));
    }

    #[test]
    fn test_use_state_for_unknown() {
        let prior = json!({
            "id": "C1",
            "label": "Ops",
            "target": "https://example.com",
            "addresses": [
                {"id": "A1", "type": "email", "address": "a@example.com"},
                {"id": "A2", "type": "sms", "address": "+1555"}
            ]
        });
        let mut proposed = json!({
            "id": null,
            "label": null,
            "target": null,
            "addresses": [
                {"id": null, "type": "email", "address": "new@example.com"},
                {"id": null, "type": "sms", "address": "+1555"},
                {"id": null, "type": "webhook", "address": "https://hook"}
            ]
        });
        use_state_for_unknown(&schema().block, &prior, &mut proposed);

        assert_eq!(proposed["id"], "C1");
        assert_eq!(proposed["label"], "Ops");
        // Not computed: a removed target stays removed.
        assert!(proposed["target"].is_null());
        // No identity match, so position 0 is used.
        assert_eq!(proposed["addresses"][0]["id"], "A1");
        assert_eq!(proposed["addresses"][1]["id"], "A2");
        assert!(proposed["addresses"][2]["id"].is_null());
    }

    #[test]
    fn test_merge_tags() {
        let defaults = vec!["managed".to_string(), "prod".to_string()];
        assert_eq!(
            merge_tags(&defaults, &json!(["prod", "web", "web"])),
            json!(["managed", "prod", "web"])
        );
        assert_eq!(merge_tags(&defaults, &Value::Null), json!(["managed", "prod"]));
        assert_eq!(merge_tags(&[], &Value::Null), Value::Null);
        assert_eq!(merge_tags(&[], &json!(["b", "a"])), json!(["b", "a"]));
    }

    #[test]
    fn test_json_semantic_equal() {
        assert!(json_semantic_equal(r#"{"a":1,"b":[1,2]}"#, r#"{ "b": [1, 2], "a": 1 }"#));
        assert!(!json_semantic_equal(r#"{"a":1}"#, r#"{"a":2}"#));
        assert!(json_semantic_equal("not json", "not json"));
        assert!(!json_semantic_equal("not json", r#"{"a":1}"#));

        let mut planned = json!(r#"{ "a": 1 }"#);
        keep_equivalent_json(Some(&json!(r#"{"a":1}"#)), &mut planned);
        assert_eq!(planned, json!(r#"{"a":1}"#));
    }

    #[test]
    fn test_plan_result_and_destroy() {
        let schema = schema().with_attribute("type", Attribute::required_string().with_force_new());
        let prior = json!({"id": "1", "type": "HTTP", "interval": 15});

        let planned = planned_state(&schema, Some(&prior), json!({"type": "HTTP", "interval": null}));
        let plan = plan_result(&schema, Some(&prior), planned);
        assert!(plan.is_empty());

        let plan = plan_result(&schema, Some(&prior), json!({"id": "1", "type": "PING", "interval": 15}));
        assert!(plan.requires_replace);

        let create = plan_result(&schema, None, json!({"type": "PING"}));
        assert!(!create.requires_replace);

        let destroy = plan_destroy(Some(&prior));
        assert!(destroy.planned_state.is_null());
        assert_eq!(destroy.changes.len(), 3);
        assert!(!destroy.requires_replace);
    }
}
