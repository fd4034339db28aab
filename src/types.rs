//! Plain Rust types exchanged between the gRPC layer and the provider.
//!
//! State and attribute values travel as JSON-encoded bytes on the wire; these
//! types hold them as [`serde_json::Value`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A change to one top-level attribute during a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// Attribute name.
    pub path: String,
    /// Value before the change, `None` when the attribute is being added.
    pub before: Option<Value>,
    /// Value after the change, `None` when the attribute is being removed.
    pub after: Option<Value>,
}

impl AttributeChange {
    /// A change from `before` to `after`.
    pub fn new(path: impl Into<String>, before: Option<Value>, after: Option<Value>) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }

    /// The attribute appears.
    pub fn added(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, None, Some(value))
    }

    /// The attribute disappears.
    pub fn removed(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, Some(value), None)
    }

    /// The attribute changes value.
    pub fn modified(path: impl Into<String>, before: Value, after: Value) -> Self {
        Self::new(path, Some(before), Some(after))
    }
}

fn encode_optional(value: Option<&Value>) -> Vec<u8> {
    value
        .and_then(|v| serde_json::to_vec(v).ok())
        .unwrap_or_default()
}

impl From<AttributeChange> for crate::generated::AttributeChange {
    fn from(change: AttributeChange) -> Self {
        Self {
            before: encode_optional(change.before.as_ref()),
            after: encode_optional(change.after.as_ref()),
            path: change.path,
        }
    }
}

/// Outcome of planning a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// State the resource will have after apply; `null` for a destroy.
    pub planned_state: Value,
    /// Attribute-level changes against the prior state.
    pub changes: Vec<AttributeChange>,
    /// Whether applying needs delete-then-create.
    pub requires_replace: bool,
}

impl PlanResult {
    /// A plan with explicit changes.
    pub fn with_changes(
        planned_state: Value,
        changes: Vec<AttributeChange>,
        requires_replace: bool,
    ) -> Self {
        Self {
            planned_state,
            changes,
            requires_replace,
        }
    }

    /// True when the plan has no attribute changes.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// A resource produced by `ImportResourceState`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// Resource type name, e.g. `nodeping_check`.
    pub resource_type: String,
    /// Full state read from the API.
    pub state: Value,
}

impl ImportedResource {
    /// An imported resource of `resource_type`.
    pub fn new(resource_type: impl Into<String>, state: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

/// Answer to `GetMetadata`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// Resource type names.
    pub resources: Vec<String>,
    /// Data source type names.
    pub data_sources: Vec<String>,
    /// Capability flags.
    pub capabilities: ServerCapabilities,
}

/// Capability flags advertised to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ServerCapabilities {
    /// The host should call `Plan` for destroys too.
    pub plan_destroy: bool,
}

/// Protocol version printed in the handshake.
pub const PROTOCOL_VERSION: u32 = 1;

/// First field of the handshake line.
pub const HANDSHAKE_PREFIX: &str = "HEMMER_PROVIDER";
