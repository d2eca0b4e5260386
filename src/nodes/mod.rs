//! Node type registry.
//!
//! Every node type resolves to a display icon/label pair, a default
//! [`NodeConfig`], a handle layout and the config fields a run needs.
//! Config is a tagged union: its variant always matches the node type and
//! is created through [`NodeConfig::from_value`], never by inspecting JSON
//! shapes at runtime.

mod code;
mod condition;
mod delay;
mod email;
mod http_request;
mod sticky_note;
mod task;
mod trigger;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use strum::IntoEnumIterator;

use crate::{EditorError, Result};

pub use code::CodeConfig;
pub use condition::{CONDITION_FALSE_HANDLE, CONDITION_TRUE_HANDLE, ConditionConfig};
pub use delay::{DelayConfig, DelayUnit};
pub use email::EmailConfig;
pub use http_request::{HttpHeader, HttpRequestConfig, HttpRequestMethod};
pub use sticky_note::StickyNoteConfig;
pub use task::{CreateTaskConfig, TaskPriority, UpdateTaskConfig};
pub use trigger::{TriggerConfig, TriggerKind};

#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, strum::AsRefStr, strum::EnumString, strum::EnumIter, strum::Display,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum NodeType {
    Trigger,
    CreateTask,
    UpdateTask,
    Condition,
    Delay,
    HttpRequest,
    Code,
    Email,
    StickyNote,
}

/// Palette section a node type is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr)]
pub enum NodeGroup {
    Triggers,
    Actions,
    Logic,
    Utilities,
    Annotations,
}

/// Outgoing connection points of a node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceHandles {
    /// no outgoing edges
    None,
    /// one unnamed output
    Single,
    /// one named output per branch
    Branches(&'static [&'static str]),
}

/// What a node type can be connected to and whether it has a config editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub source: SourceHandles,
    pub accepts_target: bool,
    pub has_config: bool,
}

impl Capabilities {
    /// Whether an edge may leave through `handle`.
    pub fn allows_source(
        &self,
        handle: Option<&str>,
    ) -> bool {
        match self.source {
            SourceHandles::None => false,
            SourceHandles::Single => true,
            SourceHandles::Branches(names) => handle.is_some_and(|h| names.contains(&h)),
        }
    }
}

/// Everything the surface needs to render and create a node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeTypeDescriptor {
    pub node_type: NodeType,
    pub icon: &'static str,
    pub label: &'static str,
    pub group: NodeGroup,
    pub capabilities: Capabilities,
}

impl NodeType {
    /// Label given to freshly created nodes.
    pub fn default_label(self) -> &'static str {
        match self {
            NodeType::Trigger => "Manual Trigger",
            NodeType::CreateTask => "Create Task",
            NodeType::UpdateTask => "Update Task",
            NodeType::Condition => "Condition",
            NodeType::Delay => "Delay",
            NodeType::HttpRequest => "HTTP Request",
            NodeType::Code => "Code",
            NodeType::Email => "Send Email",
            NodeType::StickyNote => "Note",
        }
    }

    pub fn descriptor(self) -> NodeTypeDescriptor {
        let (icon, label, group) = match self {
            NodeType::Trigger => ("⚡", "Manual Trigger", NodeGroup::Triggers),
            NodeType::CreateTask => ("📝", "Create Task", NodeGroup::Actions),
            NodeType::UpdateTask => ("✏️", "Update Task", NodeGroup::Actions),
            NodeType::Condition => ("🔀", "Condition", NodeGroup::Logic),
            NodeType::Delay => ("⏱️", "Delay", NodeGroup::Utilities),
            NodeType::HttpRequest => ("🌐", "HTTP Request", NodeGroup::Actions),
            NodeType::Code => ("💻", "Code", NodeGroup::Actions),
            NodeType::Email => ("📧", "Email", NodeGroup::Actions),
            NodeType::StickyNote => ("🗒️", "Sticky Note", NodeGroup::Annotations),
        };

        let capabilities = match self {
            NodeType::Trigger => Capabilities {
                source: SourceHandles::Single,
                accepts_target: false,
                has_config: true,
            },
            NodeType::Condition => Capabilities {
                source: SourceHandles::Branches(&[CONDITION_TRUE_HANDLE, CONDITION_FALSE_HANDLE]),
                accepts_target: true,
                has_config: true,
            },
            NodeType::StickyNote => Capabilities {
                source: SourceHandles::None,
                accepts_target: false,
                has_config: false,
            },
            _ => Capabilities {
                source: SourceHandles::Single,
                accepts_target: true,
                has_config: true,
            },
        };

        NodeTypeDescriptor {
            node_type: self,
            icon,
            label,
            group,
            capabilities,
        }
    }

    pub fn capabilities(self) -> Capabilities {
        self.descriptor().capabilities
    }
}

/// Lookup over every known node type, in palette order.
pub struct NodeTypeRegistry;

impl NodeTypeRegistry {
    pub fn descriptors() -> Vec<NodeTypeDescriptor> {
        NodeType::iter().map(NodeType::descriptor).collect()
    }

    pub fn default_config(node_type: NodeType) -> NodeConfig {
        NodeConfig::default_for(node_type)
    }

    /// Resolves a type tag such as `"createTask"`.
    pub fn resolve(tag: &str) -> Result<NodeType> {
        tag.parse().map_err(|_| EditorError::Validation(format!("unknown node type {:?}", tag)))
    }
}

/// Type-specific node configuration.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum NodeConfig {
    Trigger(TriggerConfig),
    CreateTask(CreateTaskConfig),
    UpdateTask(UpdateTaskConfig),
    Condition(ConditionConfig),
    Delay(DelayConfig),
    HttpRequest(HttpRequestConfig),
    Code(CodeConfig),
    Email(EmailConfig),
    StickyNote(StickyNoteConfig),
}

impl NodeConfig {
    pub fn default_for(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Trigger => NodeConfig::Trigger(TriggerConfig::default()),
            NodeType::CreateTask => NodeConfig::CreateTask(CreateTaskConfig::default()),
            NodeType::UpdateTask => NodeConfig::UpdateTask(UpdateTaskConfig::default()),
            NodeType::Condition => NodeConfig::Condition(ConditionConfig::default()),
            NodeType::Delay => NodeConfig::Delay(DelayConfig::default()),
            NodeType::HttpRequest => NodeConfig::HttpRequest(HttpRequestConfig::default()),
            NodeType::Code => NodeConfig::Code(CodeConfig::default()),
            NodeType::Email => NodeConfig::Email(EmailConfig::default()),
            NodeType::StickyNote => NodeConfig::StickyNote(StickyNoteConfig::default()),
        }
    }

    /// Decodes the config of a `node_type` node. `null` yields the defaults;
    /// absent fields fall back to their defaults.
    pub fn from_value(
        node_type: NodeType,
        value: JsonValue,
    ) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default_for(node_type));
        }

        let config = match node_type {
            NodeType::Trigger => NodeConfig::Trigger(serde_json::from_value(value)?),
            NodeType::CreateTask => NodeConfig::CreateTask(serde_json::from_value(value)?),
            NodeType::UpdateTask => NodeConfig::UpdateTask(serde_json::from_value(value)?),
            NodeType::Condition => NodeConfig::Condition(serde_json::from_value(value)?),
            NodeType::Delay => NodeConfig::Delay(serde_json::from_value(value)?),
            NodeType::HttpRequest => NodeConfig::HttpRequest(serde_json::from_value(value)?),
            NodeType::Code => NodeConfig::Code(serde_json::from_value(value)?),
            NodeType::Email => NodeConfig::Email(serde_json::from_value(value)?),
            NodeType::StickyNote => NodeConfig::StickyNote(serde_json::from_value(value)?),
        };
        Ok(config)
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            NodeConfig::Trigger(_) => NodeType::Trigger,
            NodeConfig::CreateTask(_) => NodeType::CreateTask,
            NodeConfig::UpdateTask(_) => NodeType::UpdateTask,
            NodeConfig::Condition(_) => NodeType::Condition,
            NodeConfig::Delay(_) => NodeType::Delay,
            NodeConfig::HttpRequest(_) => NodeType::HttpRequest,
            NodeConfig::Code(_) => NodeType::Code,
            NodeConfig::Email(_) => NodeType::Email,
            NodeConfig::StickyNote(_) => NodeType::StickyNote,
        }
    }

    /// Names of the fields a run cannot do without that are still empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        match self {
            NodeConfig::Trigger(c) => c.missing_fields(),
            NodeConfig::CreateTask(c) => c.missing_fields(),
            NodeConfig::UpdateTask(c) => c.missing_fields(),
            NodeConfig::Condition(c) => c.missing_fields(),
            NodeConfig::Delay(c) => c.missing_fields(),
            NodeConfig::HttpRequest(c) => c.missing_fields(),
            NodeConfig::Code(c) => c.missing_fields(),
            NodeConfig::Email(c) => c.missing_fields(),
            NodeConfig::StickyNote(_) => Vec::new(),
        }
    }

    /// Checks that the variant belongs to `node_type`.
    pub fn ensure_type(
        &self,
        node_type: NodeType,
    ) -> Result<()> {
        if self.node_type() == node_type {
            Ok(())
        } else {
            Err(EditorError::Validation(format!("{} config cannot be applied to a {} node", self.node_type(), node_type)))
        }
    }
}

/// Empty strings count as missing.
fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn every_type_has_a_matching_default_config() {
        for node_type in NodeType::iter() {
            assert_eq!(NodeTypeRegistry::default_config(node_type).node_type(), node_type);
            assert!(!node_type.default_label().is_empty());
        }
        assert_eq!(NodeTypeRegistry::descriptors().len(), 9);
    }

    #[test]
    fn type_tags_are_camel_case() {
        assert_eq!(NodeType::CreateTask.as_ref(), "createTask");
        assert_eq!(NodeTypeRegistry::resolve("stickyNote"), Ok(NodeType::StickyNote));
        assert_eq!(NodeTypeRegistry::resolve("httpRequest"), Ok(NodeType::HttpRequest));
        assert_eq!(NodeTypeRegistry::resolve("nope"), Err(EditorError::Validation("unknown node type \"nope\"".to_string())));
        assert_eq!(serde_json::to_value(NodeType::UpdateTask).unwrap(), json!("updateTask"));
    }

    #[test]
    fn condition_exposes_true_and_false_handles() {
        let caps = NodeType::Condition.capabilities();
        assert!(caps.allows_source(Some("true")));
        assert!(caps.allows_source(Some("false")));
        assert!(!caps.allows_source(None));
        assert!(!caps.allows_source(Some("maybe")));
    }

    #[test]
    fn single_handle_types_ignore_handle_names() {
        let caps = NodeType::CreateTask.capabilities();
        assert!(caps.allows_source(None));
        assert!(caps.accepts_target);
        assert!(!NodeType::Trigger.capabilities().accepts_target);
        assert!(!NodeType::StickyNote.capabilities().allows_source(None));
        assert!(!NodeType::StickyNote.capabilities().has_config);
    }

    #[test]
    fn null_config_means_defaults() {
        let config = NodeConfig::from_value(NodeType::Email, JsonValue::Null).unwrap();
        assert_eq!(config, NodeConfig::default_for(NodeType::Email));
    }

    #[test]
    fn config_serializes_without_a_tag() {
        let config = NodeConfig::default_for(NodeType::Condition);
        assert_eq!(serde_json::to_value(&config).unwrap(), json!({ "expression": "" }));
    }

    #[test]
    fn ensure_type_rejects_foreign_variant() {
        let config = NodeConfig::default_for(NodeType::Delay);
        assert!(config.ensure_type(NodeType::Delay).is_ok());
        assert!(matches!(config.ensure_type(NodeType::Code), Err(EditorError::Validation(_))));
    }

    #[test]
    fn missing_fields_reports_required_blanks() {
        assert_eq!(NodeConfig::default_for(NodeType::HttpRequest).missing_fields(), vec!["url"]);
        assert_eq!(NodeConfig::default_for(NodeType::Email).missing_fields(), vec!["to", "subject"]);
        assert!(NodeConfig::default_for(NodeType::Trigger).missing_fields().is_empty());
        assert!(NodeConfig::default_for(NodeType::Delay).missing_fields().is_empty());
    }
}
