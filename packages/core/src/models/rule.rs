//! Rule record shapes.
//!
//! Two structs represent the same entity at different points of the
//! schema's history. `LegacyRule` is the shape written before packs
//! existed; `Rule` adds the `pack` field and the derived `ref` string.
//! All trigger-matching data (criteria, action, enabled flag, tags) is
//! identical between the two and is copied verbatim by the migration.
//!
//! # Examples
//!
//! ```rust
//! use rulespace_core::models::{ActionSpec, LegacyRule, Rule};
//!
//! let legacy = LegacyRule::new(
//!     "my_rule".to_string(),
//!     "core.st2.sensor.x".to_string(),
//!     ActionSpec::new("core.local".to_string()),
//! );
//!
//! let namespaced = Rule::from_legacy(&legacy).unwrap();
//! assert_eq!(namespaced.r#ref, "default.my_rule");
//! ```

use crate::constants::DEFAULT_PACK_NAME;
use crate::models::reference::ResourceReference;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

/// Default enabled value for serde deserialization (enabled)
fn default_enabled() -> bool {
    true
}

/// Default criteria value for serde deserialization (empty object)
fn default_criteria() -> Value {
    json!({})
}

/// Validation errors for rule records and reference strings
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid resource reference: {0}")]
    InvalidReference(String),
}

/// Arbitrary name/value label attached to a rule.
///
/// Carried over from the legacy schema's tagging support and copied
/// verbatim by the migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

/// Embedded action sub-record: which action to run when the rule fires,
/// and with which parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSpec {
    /// Reference of the action to execute (e.g., "core.local")
    pub r#ref: String,

    /// Parameters passed to the action (JSON object)
    #[serde(default = "ActionSpec::default_parameters")]
    pub parameters: Value,
}

impl ActionSpec {
    /// Create an action spec with empty parameters
    pub fn new(action_ref: String) -> Self {
        Self {
            r#ref: action_ref,
            parameters: Self::default_parameters(),
        }
    }

    fn default_parameters() -> Value {
        json!({})
    }
}

/// Rule as stored in the legacy collection, before pack namespacing.
///
/// # Fields
///
/// - `id`: Unique identifier, preserved by the migration
/// - `name`: Rule name. Required by the schema, but legacy data predates
///   enforcement, so reads surface it as `Option` and the migration
///   rejects records where it is absent
/// - `description`: Optional free-form description
/// - `trigger`: Trigger reference this rule watches for
/// - `criteria`: JSON object of conditions on the trigger payload
/// - `action`: Action to execute when the rule fires
/// - `enabled`: Whether trigger occurrences execute the action
/// - `tags`: Arbitrary labels, copied verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyRule {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub trigger: String,
    #[serde(default = "default_criteria")]
    pub criteria: Value,
    pub action: ActionSpec,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl LegacyRule {
    /// Create a legacy rule with an auto-generated UUID, empty criteria,
    /// and the enabled flag set (the schema default).
    pub fn new(name: String, trigger: String, action: ActionSpec) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: Some(name),
            description: None,
            trigger,
            criteria: json!({}),
            action,
            enabled: true,
            tags: Vec::new(),
        }
    }
}

/// Pack-namespaced rule.
///
/// Identical to [`LegacyRule`] except for two additional fields:
///
/// - `pack`: Name of the content pack the rule belongs to. The migration
///   always assigns [`DEFAULT_PACK_NAME`]
/// - `ref`: Deterministic `"<pack>.<name>"` reference string, used for
///   lookup across namespaced collections
///
/// `(pack, name)` is unique within the namespaced collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub r#ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub pack: String,
    pub trigger: String,
    #[serde(default = "default_criteria")]
    pub criteria: Value,
    pub action: ActionSpec,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl Rule {
    /// Build the namespaced counterpart of a legacy rule.
    ///
    /// Copies every shared field verbatim, assigns the default pack, and
    /// derives `ref` from the default pack and the rule name. The
    /// identifier is preserved so the upsert is keyed by the same
    /// identity across reruns.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] if the legacy record has
    /// no name (or an empty one), since both `name` and the derived `ref`
    /// are required in the namespaced shape.
    pub fn from_legacy(legacy: &LegacyRule) -> Result<Self, ValidationError> {
        let name = legacy
            .name
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ValidationError::MissingField("name".to_string()))?;

        let ref_ = ResourceReference::to_string_reference(DEFAULT_PACK_NAME, name)?;

        Ok(Self {
            id: legacy.id.clone(),
            name: name.to_string(),
            r#ref: ref_,
            description: legacy.description.clone(),
            pack: DEFAULT_PACK_NAME.to_string(),
            trigger: legacy.trigger.clone(),
            criteria: legacy.criteria.clone(),
            action: legacy.action.clone(),
            enabled: legacy.enabled,
            tags: legacy.tags.clone(),
        })
    }
}
