//! Configuration validation against a [`Schema`].
//!
//! ```
//! use hemmer_provider_nodeping::schema::{Attribute, Schema, Validator};
//! use hemmer_provider_nodeping::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("name", Attribute::optional_string())
//!     .with_attribute(
//!         "custrole",
//!         Attribute::optional_string().with_validator(Validator::one_of(&["edit", "view", "notify"])),
//!     );
//!
//! assert!(validate(&schema, &json!({"name": "Ops", "custrole": "view"})).is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"custrole": "owner"}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute.as_deref(), Some("custrole"));
//! ```

use crate::schema::{
    Attribute, AttributeType, Block, BlockNestingMode, Diagnostic, NestedBlock, Schema,
};
use serde_json::Value;

/// Validate `value` against `schema`. An empty result means valid.
///
/// Required attributes must be present and non-null, present values must
/// match their type and validators, and nested blocks must respect their
/// cardinality. Computed-only attributes are skipped.
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    validate_block(&schema.block, value, "", &mut diagnostics);
    diagnostics
}

/// True when [`validate`] reports nothing.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

fn validate_block(block: &Block, value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let obj = match value {
        Value::Object(map) => map,
        Value::Null => return,
        other => {
            let mut diag =
                Diagnostic::error("Expected object").with_detail(format!("Got {}", type_name(other)));
            if !path.is_empty() {
                diag = diag.with_attribute(path);
            }
            diagnostics.push(diag);
            return;
        },
    };

    for (name, attr) in &block.attributes {
        validate_attribute(attr, obj.get(name), &join_path(path, name), diagnostics);
    }

    for (name, nested) in &block.blocks {
        validate_nested_block(nested, obj.get(name), &join_path(path, name), diagnostics);
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if attr.is_computed_only() {
        return;
    }

    let value = match value {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", path))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(path),
                );
            }
            return;
        },
        Some(v) => v,
    };

    let before = diagnostics.len();
    validate_type(&attr.attr_type, value, path, diagnostics);
    if diagnostics.len() > before {
        return;
    }

    for validator in &attr.validators {
        if let Err(reason) = validator.check(value) {
            diagnostics.push(
                Diagnostic::error("Invalid Attribute Value")
                    .with_detail(format!("Attribute {} {}", path, reason))
                    .with_attribute(path),
            );
        }
    }
}

fn validate_type(ty: &AttributeType, value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let matches = match ty {
        AttributeType::String => value.is_string(),
        AttributeType::Int64 => is_int64(value),
        AttributeType::Float64 => value.is_number(),
        AttributeType::Bool => value.is_boolean(),
        AttributeType::Dynamic => true,
        AttributeType::List(element) | AttributeType::Set(element) => match value.as_array() {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    validate_type(element, item, &index_path(path, i), diagnostics);
                }
                true
            },
            None => false,
        },
        AttributeType::Map(element) => match value.as_object() {
            Some(entries) => {
                for (key, item) in entries {
                    validate_type(element, item, &join_path(path, key), diagnostics);
                }
                true
            },
            None => false,
        },
        AttributeType::Object(attrs) => match value.as_object() {
            Some(obj) => {
                for (name, attr_type) in attrs {
                    if let Some(item) = obj.get(name).filter(|v| !v.is_null()) {
                        validate_type(attr_type, item, &join_path(path, name), diagnostics);
                    }
                }
                true
            },
            None => false,
        },
    };

    if !matches {
        diagnostics.push(
            Diagnostic::error(format!("Invalid type for '{}'", path))
                .with_detail(format!("Expected {}, got {}", expected_name(ty), type_name(value)))
                .with_attribute(path),
        );
    }
}

fn validate_nested_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let value = value.filter(|v| !v.is_null());

    let count = match (nested.nesting_mode, value) {
        (_, None) => 0,
        (BlockNestingMode::Single, Some(v)) => {
            validate_block(&nested.block, v, path, diagnostics);
            1
        },
        (BlockNestingMode::List | BlockNestingMode::Set, Some(Value::Array(items))) => {
            for (i, item) in items.iter().enumerate() {
                validate_block(&nested.block, item, &index_path(path, i), diagnostics);
            }
            items.len() as u32
        },
        (BlockNestingMode::Map, Some(Value::Object(entries))) => {
            for (key, item) in entries {
                validate_block(&nested.block, item, &join_path(path, key), diagnostics);
            }
            entries.len() as u32
        },
        (mode, Some(other)) => {
            let expected = if mode == BlockNestingMode::Map { "map" } else { "list" };
            diagnostics.push(
                Diagnostic::error(format!("Expected {} for block '{}'", expected, path))
                    .with_detail(format!("Got {}", type_name(other)))
                    .with_attribute(path),
            );
            0
        },
    };

    if count < nested.min_items {
        diagnostics.push(
            Diagnostic::error(format!(
                "Block '{}' requires at least {} item(s), got {}",
                path, nested.min_items, count
            ))
            .with_attribute(path),
        );
    }
    if nested.max_items > 0 && count > nested.max_items {
        diagnostics.push(
            Diagnostic::error(format!(
                "Block '{}' allows at most {} item(s), got {}",
                path, nested.max_items, count
            ))
            .with_attribute(path),
        );
    }
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

fn index_path(base: &str, index: usize) -> String {
    format!("{}[{}]", base, index)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expected_name(ty: &AttributeType) -> &'static str {
    match ty {
        AttributeType::String => "string",
        AttributeType::Int64 => "int64",
        AttributeType::Float64 => "float64",
        AttributeType::Bool => "bool",
        AttributeType::List(_) => "list",
        AttributeType::Set(_) => "set",
        AttributeType::Map(_) => "map",
        AttributeType::Object(_) => "object",
        AttributeType::Dynamic => "any",
    }
}

/// Integers, and floats without a fractional part (JSON has one number type).
fn is_int64(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.is_i64()
                || n.as_f64()
                    .is_some_and(|f| f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64)
        },
        _ => false,
    }
}
