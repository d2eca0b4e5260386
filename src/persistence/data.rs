//! Wire records exchanged with the workflow backend.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    model::{DocumentId, Edge, Node, WorkflowDocument},
};

/// A stored workflow. Nodes and edges travel as JSON-encoded strings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub nodes_json: Option<String>,
    #[serde(default)]
    pub edges_json: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

impl WorkflowRecord {
    /// Decodes the embedded node and edge arrays. Absent or blank strings
    /// decode as empty.
    pub fn into_document(self) -> Result<WorkflowDocument> {
        let nodes: Vec<Node> = decode_list(self.nodes_json.as_deref())?;
        let edges: Vec<Edge> = decode_list(self.edges_json.as_deref())?;

        Ok(WorkflowDocument {
            id: DocumentId::from(self.id.as_str()),
            name: self.name,
            description: self.description.unwrap_or_default(),
            nodes,
            edges,
            created_at: self.created_at.map(|t| t.and_utc()),
            updated_at: self.updated_at.map(|t| t.and_utc()),
        })
    }
}

fn decode_list<T: serde::de::DeserializeOwned>(text: Option<&str>) -> Result<Vec<T>> {
    match text.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(text) => Ok(serde_json::from_str(text)?),
    }
}

/// Body of create and update requests.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPayload {
    pub name: String,
    pub description: String,
    pub nodes_json: String,
    pub edges_json: String,
}

impl WorkflowPayload {
    pub fn encode(
        name: &str,
        description: &str,
        nodes: &[Node],
        edges: &[Edge],
    ) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            description: description.to_string(),
            nodes_json: serde_json::to_string(nodes)?,
            edges_json: serde_json::to_string(edges)?,
        })
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    #[default]
    Running,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

/// One run of a workflow as reported by the backend.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub id: String,
    pub workflow_id: String,
    #[serde(default)]
    pub workflow_name: Option<String>,
    #[serde(default)]
    pub status: ExecutionStatus,
    #[serde(default)]
    pub execution_log: Option<String>,
    #[serde(default)]
    pub error_details: Option<String>,
    #[serde(default)]
    pub executed_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub completed_at: Option<NaiveDateTime>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{model::Position, nodes::NodeType};

    #[test]
    fn record_decodes_embedded_json() {
        let record: WorkflowRecord = serde_json::from_value(json!({
            "id": "8a3e",
            "name": "Onboarding",
            "description": null,
            "status": "DRAFT",
            "nodesJson": r#"[{"id":"trigger-1","type":"trigger","position":{"x":250,"y":50},"data":{"label":"Manual Trigger"}}]"#,
            "edgesJson": "",
            "createdAt": "2024-05-01T10:00:00.123456"
        }))
        .unwrap();

        let document = record.into_document().unwrap();
        assert_eq!(document.id, DocumentId::Saved("8a3e".to_string()));
        assert_eq!(document.description, "");
        assert_eq!(document.nodes[0].position, Position::new(250.0, 50.0));
        assert!(document.edges.is_empty());
        assert!(document.created_at.is_some());
    }

    #[test]
    fn broken_embedded_json_is_a_convert_error() {
        let record = WorkflowRecord {
            id: "1".into(),
            name: "x".into(),
            description: None,
            nodes_json: Some("[{".into()),
            edges_json: None,
            created_at: None,
            updated_at: None,
        };
        assert!(matches!(record.into_document(), Err(crate::EditorError::Convert(_))));
    }

    #[test]
    fn payload_encodes_as_strings() {
        let nodes = vec![Node::new("code-1".into(), NodeType::Code, Position::default())];
        let payload = WorkflowPayload::encode("Flow", "", &nodes, &[]).unwrap();
        let value = serde_json::to_value(&payload).unwrap();
        assert!(value["nodesJson"].as_str().unwrap().starts_with("[{\"id\":\"code-1\""));
        assert_eq!(value["edgesJson"], json!("[]"));
    }

    #[test]
    fn unknown_execution_status_is_tolerated() {
        let record: ExecutionRecord = serde_json::from_value(json!({
            "id": "r1",
            "workflowId": "w1",
            "status": "PAUSED"
        }))
        .unwrap();
        assert_eq!(record.status, ExecutionStatus::Unknown);
    }
}
