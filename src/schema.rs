//! Schema model for the provider, its resources and its data sources.
//!
//! Schemas are sent to the host through `GetSchema` and drive local
//! validation ([`crate::validation`]) and planning ([`crate::plan`]).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// The type of an attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    /// A string value.
    String,
    /// A 64-bit integer.
    Int64,
    /// A 64-bit floating point number.
    Float64,
    /// A boolean value.
    Bool,
    /// An ordered list of values of one type.
    List(Box<AttributeType>),
    /// A set of unique values of one type.
    Set(Box<AttributeType>),
    /// String keys to values of one type.
    Map(Box<AttributeType>),
    /// An object with a fixed set of attributes.
    Object(HashMap<String, AttributeType>),
    /// Any JSON value.
    Dynamic,
}

impl AttributeType {
    /// A list of `element_type`.
    pub fn list(element_type: AttributeType) -> Self {
        Self::List(Box::new(element_type))
    }

    /// A map of `element_type`.
    pub fn map(element_type: AttributeType) -> Self {
        Self::Map(Box::new(element_type))
    }

    /// An object built from `(name, type)` pairs.
    pub fn object<'a>(attributes: impl IntoIterator<Item = (&'a str, AttributeType)>) -> Self {
        Self::Object(
            attributes
                .into_iter()
                .map(|(name, ty)| (name.to_string(), ty))
                .collect(),
        )
    }
}

/// How an attribute may be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AttributeFlags {
    /// Must be present in configuration.
    pub required: bool,
    /// May be present in configuration.
    pub optional: bool,
    /// Filled in by the provider.
    pub computed: bool,
    /// Hidden in plan output and never logged.
    pub sensitive: bool,
}

impl AttributeFlags {
    /// Flags for a required attribute.
    pub fn required() -> Self {
        Self {
            required: true,
            ..Default::default()
        }
    }

    /// Flags for an optional attribute.
    pub fn optional() -> Self {
        Self {
            optional: true,
            ..Default::default()
        }
    }

    /// Flags for a read-only attribute.
    pub fn computed() -> Self {
        Self {
            computed: true,
            ..Default::default()
        }
    }

    /// Flags for an attribute the user may set and the provider may fill in.
    pub fn optional_computed() -> Self {
        Self {
            optional: true,
            computed: true,
            ..Default::default()
        }
    }

    /// Mark the attribute as sensitive.
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }
}

/// A constraint on an attribute's configured value.
///
/// Null values always pass; presence is checked through
/// [`AttributeFlags::required`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Validator {
    /// A string equal to one of `values`.
    OneOf {
        /// Accepted values.
        values: Vec<String>,
    },
    /// A number no smaller than `min`.
    AtLeast {
        /// Inclusive lower bound.
        min: i64,
    },
}

impl Validator {
    /// Accept only the listed strings.
    pub fn one_of(values: &[&str]) -> Self {
        Self::OneOf {
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    /// Accept numbers `>= min`.
    pub fn at_least(min: i64) -> Self {
        Self::AtLeast { min }
    }

    /// Check `value`, returning a human-readable reason on failure.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        match (self, value) {
            (_, Value::Null) => Ok(()),
            (Self::OneOf { values }, Value::String(s)) => {
                if values.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(format!(
                        "value must be one of: {}, got: \"{}\"",
                        values
                            .iter()
                            .map(|v| format!("\"{v}\""))
                            .collect::<Vec<_>>()
                            .join(", "),
                        s
                    ))
                }
            },
            (Self::AtLeast { min }, Value::Number(n)) => match n.as_f64() {
                Some(f) if f >= *min as f64 => Ok(()),
                _ => Err(format!("value must be at least {min}, got: {n}")),
            },
            // Type mismatches are reported by the type check.
            _ => Ok(()),
        }
    }
}

/// One attribute of a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Value type.
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
    /// Usage flags.
    #[serde(flatten)]
    pub flags: AttributeFlags,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Changing the value replaces the remote object.
    #[serde(default)]
    pub force_new: bool,
    /// Value planned when the configuration leaves the attribute unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Constraints checked during validation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<Validator>,
}

impl Attribute {
    /// An attribute with the given type and flags.
    pub fn new(attr_type: AttributeType, flags: AttributeFlags) -> Self {
        Self {
            attr_type,
            flags,
            description: None,
            force_new: false,
            default: None,
            validators: Vec::new(),
        }
    }

    /// Required string.
    pub fn required_string() -> Self {
        Self::new(AttributeType::String, AttributeFlags::required())
    }

    /// Optional string.
    pub fn optional_string() -> Self {
        Self::new(AttributeType::String, AttributeFlags::optional())
    }

    /// Read-only string.
    pub fn computed_string() -> Self {
        Self::new(AttributeType::String, AttributeFlags::computed())
    }

    /// Optional int64.
    pub fn optional_int64() -> Self {
        Self::new(AttributeType::Int64, AttributeFlags::optional())
    }

    /// Read-only int64.
    pub fn computed_int64() -> Self {
        Self::new(AttributeType::Int64, AttributeFlags::computed())
    }

    /// Optional float64.
    pub fn optional_float64() -> Self {
        Self::new(AttributeType::Float64, AttributeFlags::optional())
    }

    /// Read-only float64.
    pub fn computed_float64() -> Self {
        Self::new(AttributeType::Float64, AttributeFlags::computed())
    }

    /// Optional bool.
    pub fn optional_bool() -> Self {
        Self::new(AttributeType::Bool, AttributeFlags::optional())
    }

    /// Read-only bool.
    pub fn computed_bool() -> Self {
        Self::new(AttributeType::Bool, AttributeFlags::computed())
    }

    /// Optional and computed, falling back to `default` when unset.
    pub fn with_default_value(attr_type: AttributeType, default: Value) -> Self {
        Self::new(attr_type, AttributeFlags::optional_computed()).with_default(default)
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the attribute as replacing the object when changed.
    pub fn with_force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Add a value constraint.
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Also let the provider fill the value in.
    pub fn computed(mut self) -> Self {
        self.flags.computed = true;
        self
    }

    /// Mark the attribute as sensitive.
    pub fn sensitive(mut self) -> Self {
        self.flags.sensitive = true;
        self
    }

    /// Computed and not settable by the user.
    pub fn is_computed_only(&self) -> bool {
        self.flags.computed && !self.flags.required && !self.flags.optional
    }
}

/// How a nested block repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BlockNestingMode {
    /// At most one block.
    #[default]
    Single,
    /// Ordered blocks.
    List,
    /// Unordered unique blocks.
    Set,
    /// Blocks keyed by string.
    Map,
}

/// A group of attributes and nested blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Block {
    /// Attributes by name.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, Attribute>,
    /// Nested blocks by name.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub blocks: HashMap<String, NestedBlock>,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Block {
    /// An empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, attr: Attribute) -> Self {
        self.attributes.insert(name.into(), attr);
        self
    }

    /// Add a nested block.
    pub fn with_block(mut self, name: impl Into<String>, block: NestedBlock) -> Self {
        self.blocks.insert(name.into(), block);
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A nested block with its nesting mode and cardinality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedBlock {
    /// The block definition.
    #[serde(flatten)]
    pub block: Block,
    /// How the block repeats.
    #[serde(default)]
    pub nesting_mode: BlockNestingMode,
    /// Minimum number of blocks.
    #[serde(default)]
    pub min_items: u32,
    /// Maximum number of blocks, 0 for unlimited.
    #[serde(default)]
    pub max_items: u32,
}

impl NestedBlock {
    fn with_mode(block: Block, nesting_mode: BlockNestingMode, max_items: u32) -> Self {
        Self {
            block,
            nesting_mode,
            min_items: 0,
            max_items,
        }
    }

    /// Zero or one block.
    pub fn single(block: Block) -> Self {
        Self::with_mode(block, BlockNestingMode::Single, 1)
    }

    /// Any number of ordered blocks.
    pub fn list(block: Block) -> Self {
        Self::with_mode(block, BlockNestingMode::List, 0)
    }

    /// Set the minimum number of blocks.
    pub fn with_min_items(mut self, min: u32) -> Self {
        self.min_items = min;
        self
    }

    /// Set the maximum number of blocks.
    pub fn with_max_items(mut self, max: u32) -> Self {
        self.max_items = max;
        self
    }
}

/// Schema of a resource, data source, or the provider block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// State format version.
    #[serde(default)]
    pub version: u64,
    /// Root block.
    #[serde(flatten)]
    pub block: Block,
}

impl Schema {
    /// An empty schema at `version`.
    pub fn new(version: u64) -> Self {
        Self {
            version,
            block: Block::new(),
        }
    }

    /// An empty schema at version 0.
    pub fn v0() -> Self {
        Self::new(0)
    }

    /// Add an attribute to the root block.
    pub fn with_attribute(mut self, name: impl Into<String>, attr: Attribute) -> Self {
        self.block.attributes.insert(name.into(), attr);
        self
    }

    /// Add a nested block to the root block.
    pub fn with_block(mut self, name: impl Into<String>, block: NestedBlock) -> Self {
        self.block.blocks.insert(name.into(), block);
        self
    }

    /// Describe the root block.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.block.description = Some(description.into());
        self
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::v0()
    }
}

/// Every schema the provider serves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProviderSchema {
    /// Provider configuration block.
    #[serde(default)]
    pub provider: Schema,
    /// Resource schemas by type name.
    #[serde(default)]
    pub resources: HashMap<String, Schema>,
    /// Data source schemas by type name.
    #[serde(default)]
    pub data_sources: HashMap<String, Schema>,
}

impl ProviderSchema {
    /// An empty provider schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the provider configuration schema.
    pub fn with_provider_config(mut self, schema: Schema) -> Self {
        self.provider = schema;
        self
    }

    /// Add a resource schema.
    pub fn with_resource(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.resources.insert(name.into(), schema);
        self
    }

    /// Add a data source schema.
    pub fn with_data_source(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.data_sources.insert(name.into(), schema);
        self
    }
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    /// The operation failed.
    Error,
    /// The operation succeeded with a caveat.
    Warning,
}

/// A message reported to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity.
    pub severity: DiagnosticSeverity,
    /// Short title.
    pub summary: String,
    /// Longer explanation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Dotted attribute path, e.g. `notifications[0].contact_id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    /// An error diagnostic.
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    /// Attach a detail message.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Attach the attribute path.
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// True for error severity.
    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_flags() {
        let computed = AttributeFlags::computed();
        assert!(computed.computed);
        assert!(!computed.optional);

        let optional_computed = AttributeFlags::optional_computed();
        assert!(optional_computed.optional);
        assert!(optional_computed.computed);

        assert!(AttributeFlags::required().sensitive().sensitive);
    }

    #[test]
    fn test_attribute_with_default_is_optional_computed() {
        let attr = Attribute::with_default_value(AttributeType::Int64, json!(5))
            .with_description("Timeout in seconds");
        assert!(attr.flags.optional);
        assert!(attr.flags.computed);
        assert!(!attr.is_computed_only());
        assert_eq!(attr.default, Some(json!(5)));
    }

    #[test]
    fn test_one_of_validator() {
        let v = Validator::one_of(&["edit", "view", "notify"]);
        assert!(v.check(&json!("view")).is_ok());
        assert!(v.check(&Value::Null).is_ok());
        let err = v.check(&json!("admin")).unwrap_err();
        assert!(err.contains("\"edit\", \"view\", \"notify\""));
        assert!(err.contains("\"admin\""));
    }

    #[test]
    fn test_at_least_validator() {
        let v = Validator::at_least(1);
        assert!(v.check(&json!(30)).is_ok());
        assert!(v.check(&json!(1)).is_ok());
        assert!(v.check(&json!(0)).is_err());
    }

    #[test]
    fn test_schema_builder() {
        let schema = Schema::v0()
            .with_description("Manages a NodePing check.")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("type", Attribute::required_string())
            .with_block(
                "notifications",
                NestedBlock::list(
                    Block::new().with_attribute("contact_id", Attribute::required_string()),
                ),
            );

        assert_eq!(schema.version, 0);
        assert!(schema.block.attributes["id"].is_computed_only());
        assert_eq!(
            schema.block.blocks["notifications"].nesting_mode,
            BlockNestingMode::List
        );
        assert_eq!(
            schema.block.description.as_deref(),
            Some("Manages a NodePing check.")
        );
    }

    #[test]
    fn test_object_type() {
        let ty = AttributeType::object([("id", AttributeType::String), ("enabled", AttributeType::Bool)]);
        match ty {
            AttributeType::Object(attrs) => {
                assert_eq!(attrs.len(), 2);
                assert_eq!(attrs["enabled"], AttributeType::Bool);
            },
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_diagnostic() {
        let diag = Diagnostic::error("Missing NodePing API Token")
            .with_detail("Set api_token or NODEPING_API_TOKEN")
            .with_attribute("api_token");

        assert!(diag.is_error());
        assert_eq!(diag.attribute.as_deref(), Some("api_token"));
        let warning = Diagnostic {
            severity: DiagnosticSeverity::Warning,
            ..diag
        };
        assert!(!warning.is_error());
    }

    #[test]
    fn test_nested_block_modes() {
        let single = NestedBlock::single(Block::new());
        assert_eq!(single.max_items, 1);

        let list = NestedBlock::list(Block::new()).with_min_items(1).with_max_items(5);
        assert_eq!(list.nesting_mode, BlockNestingMode::List);
        assert_eq!((list.min_items, list.max_items), (1, 5));
    }
}
