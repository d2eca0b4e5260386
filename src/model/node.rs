use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::{
    EditorError, Result,
    nodes::{NodeConfig, NodeType, NodeTypeRegistry},
};

/// node id
pub type NodeId = String;

/// Canvas coordinates of a node's top-left corner.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(
        x: f64,
        y: f64,
    ) -> Self {
        Self {
            x,
            y,
        }
    }

    /// Returns this position moved by `(dx, dy)`.
    pub fn offset(
        &self,
        dx: f64,
        dy: f64,
    ) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Persisted node state. Holds no behaviour: deleting, disabling and
/// selecting go through the session by node id.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub label: String,
    pub disabled: bool,
    pub config: NodeConfig,
    /// free text of annotation nodes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// fields written by other tools, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// A typed unit of work or annotation placed on the canvas.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", try_from = "NodeRecord")]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub position: Position,
    pub data: NodeData,
}

impl Node {
    /// Creates a node with the registry defaults of its type.
    pub fn new(
        id: NodeId,
        node_type: NodeType,
        position: Position,
    ) -> Self {
        Self {
            id,
            node_type,
            position,
            data: NodeData {
                label: node_type.default_label().to_string(),
                disabled: false,
                config: NodeTypeRegistry::default_config(node_type),
                content: None,
                extra: Map::new(),
            },
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.data.disabled
    }
}

/// Wire shape of a node as read from files and the backend. Positions and
/// configs may be absent; they are completed from the node type defaults.
#[derive(Deserialize)]
struct NodeRecord {
    id: NodeId,
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default)]
    position: Option<Position>,
    #[serde(default)]
    data: NodeDataRecord,
}

#[derive(Deserialize, Default)]
struct NodeDataRecord {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    disabled: Option<bool>,
    #[serde(default)]
    config: JsonValue,
    #[serde(default)]
    content: Option<String>,
    #[serde(flatten)]
    extra: Map<String, JsonValue>,
}

impl TryFrom<NodeRecord> for Node {
    type Error = EditorError;

    fn try_from(record: NodeRecord) -> Result<Self> {
        let node_type = NodeTypeRegistry::resolve(&record.node_type)?;
        let config = NodeConfig::from_value(node_type, record.data.config)
            .map_err(|e| EditorError::Convert(format!("invalid config of node {}: {}", record.id, e)))?;

        Ok(Self {
            id: record.id,
            node_type,
            position: record.position.unwrap_or_default(),
            data: NodeData {
                label: record.data.label.unwrap_or_else(|| node_type.default_label().to_string()),
                disabled: record.data.disabled.unwrap_or(false),
                config,
                content: record.data.content,
                extra: record.data.extra,
            },
        })
    }
}

/// Shallow patch over [`NodeData`]: only the fields that are set change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeDataPatch {
    pub label: Option<String>,
    pub disabled: Option<bool>,
    pub config: Option<NodeConfig>,
    pub content: Option<String>,
    pub extra: Map<String, JsonValue>,
}

impl NodeDataPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(
        mut self,
        label: impl Into<String>,
    ) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn disabled(
        mut self,
        disabled: bool,
    ) -> Self {
        self.disabled = Some(disabled);
        self
    }

    pub fn config(
        mut self,
        config: NodeConfig,
    ) -> Self {
        self.config = Some(config);
        self
    }

    pub fn content(
        mut self,
        content: impl Into<String>,
    ) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn extra(
        mut self,
        key: impl Into<String>,
        value: JsonValue,
    ) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Builds a patch from the JSON object a config editor produces for a
    /// node of type `node_type`.
    pub fn from_json(
        node_type: NodeType,
        value: JsonValue,
    ) -> Result<Self> {
        let JsonValue::Object(mut map) = value else {
            return Err(EditorError::Validation("node patch must be an object".to_string()));
        };

        let mut patch = Self::new();
        if let Some(label) = map.remove("label") {
            patch.label = Some(serde_json::from_value(label)?);
        }
        if let Some(disabled) = map.remove("disabled") {
            patch.disabled = Some(serde_json::from_value(disabled)?);
        }
        if let Some(config) = map.remove("config") {
            patch.config = Some(NodeConfig::from_value(node_type, config)?);
        }
        if let Some(content) = map.remove("content") {
            patch.content = Some(serde_json::from_value(content)?);
        }
        patch.extra = map;
        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.disabled.is_none() && self.config.is_none() && self.content.is_none() && self.extra.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::nodes::{DelayConfig, DelayUnit};

    #[test]
    fn node_without_position_or_config_gets_defaults() {
        let node: Node = serde_json::from_value(json!({
            "id": "delay-1",
            "type": "delay",
            "data": { "label": "Wait" }
        }))
        .unwrap();

        assert_eq!(node.position, Position::default());
        assert_eq!(node.data.label, "Wait");
        assert!(!node.data.disabled);
        assert_eq!(node.data.config, NodeConfig::default_for(NodeType::Delay));
    }

    #[test]
    fn node_keeps_unknown_data_fields() {
        let value = json!({
            "id": "httpRequest-1",
            "type": "httpRequest",
            "position": { "x": 10.0, "y": 20.0 },
            "data": {
                "label": "Fetch",
                "disabled": true,
                "config": { "method": "POST", "url": "https://example.com" },
                "url": "https://example.com"
            }
        });
        let node: Node = serde_json::from_value(value).unwrap();
        assert!(node.is_disabled());
        assert_eq!(node.data.extra.get("url"), Some(&json!("https://example.com")));

        let encoded = serde_json::to_value(&node).unwrap();
        assert_eq!(encoded["data"]["url"], json!("https://example.com"));
        assert_eq!(encoded["data"]["config"]["method"], json!("POST"));
        assert_eq!(encoded["type"], json!("httpRequest"));
    }

    #[test]
    fn node_with_unknown_type_is_rejected() {
        let err = serde_json::from_value::<Node>(json!({ "id": "x", "type": "teleport" })).unwrap_err();
        assert!(err.to_string().contains("unknown node type \"teleport\""), "{}", err);
    }

    #[test]
    fn patch_from_json_splits_known_fields() {
        let patch = NodeDataPatch::from_json(
            NodeType::Delay,
            json!({ "label": "Pause", "config": { "duration": "10", "unit": "minutes" }, "note": 1 }),
        )
        .unwrap();

        assert_eq!(patch.label.as_deref(), Some("Pause"));
        assert_eq!(
            patch.config,
            Some(NodeConfig::Delay(DelayConfig {
                duration: 10,
                unit: DelayUnit::Minutes,
            }))
        );
        assert_eq!(patch.extra.get("note"), Some(&json!(1)));
        assert!(NodeDataPatch::from_json(NodeType::Delay, json!([1])).is_err());
    }
}
