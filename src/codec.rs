//! Portable JSON file format for workflows.
//!
//! ```json
//! { "version": "1.0", "name": "...", "nodes": [...], "edges": [...], "createdAt": "2024-05-01T10:00:00.000Z" }
//! ```

use std::collections::HashSet;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::{
    EditorError, Result,
    model::{Edge, Node},
};

pub const EXPORT_VERSION: &str = "1.0";

/// Suffix appended to the name of an imported document.
pub const IMPORTED_SUFFIX: &str = " (Imported)";

const WHITESPACE_PATTERN: &str = r"\s+";

/// A file ready to be offered for download.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub contents: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportDocument<'a> {
    version: &'a str,
    name: &'a str,
    nodes: &'a [Node],
    edges: &'a [Edge],
    created_at: String,
}

/// Decoded content of an import file.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedWorkflow {
    pub name: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl ImportedWorkflow {
    /// Name the document is loaded under.
    pub fn document_name(&self) -> String {
        format!("{}{}", self.name, IMPORTED_SUFFIX)
    }
}

fn schema() -> JsonValue {
    serde_json::json!({
        "type": "object",
        "required": ["version", "name", "nodes", "edges"],
        "properties": {
            "version": { "type": "string", "minLength": 1 },
            "name": { "type": "string", "minLength": 1 },
            "nodes": { "type": "array", "items": { "type": "object" } },
            "edges": { "type": "array", "items": { "type": "object" } },
            "createdAt": { "type": "string" }
        }
    })
}

/// `My Flow` becomes `My_Flow_workflow.json`.
pub fn export_filename(name: &str) -> Result<String> {
    let re = Regex::new(WHITESPACE_PATTERN).map_err(|e| EditorError::Convert(e.to_string()))?;
    Ok(format!("{}_workflow.json", re.replace_all(name, "_")))
}

pub fn export(
    name: &str,
    nodes: &[Node],
    edges: &[Edge],
    created_at: DateTime<Utc>,
) -> Result<ExportFile> {
    let document = ExportDocument {
        version: EXPORT_VERSION,
        name,
        nodes,
        edges,
        created_at: created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    };
    let contents = serde_json::to_string_pretty(&document)?;
    let filename = export_filename(name)?;
    debug!("codec::export: {} ({} bytes)", filename, contents.len());

    Ok(ExportFile {
        filename,
        contents,
    })
}

/// Parses and validates an import file. Any failure is a validation error.
pub fn import(text: &str) -> Result<ImportedWorkflow> {
    let value: JsonValue =
        serde_json::from_str(text).map_err(|e| EditorError::Validation(format!("failed to parse workflow file: {}", e)))?;

    jsonschema::validate(&schema(), &value)?;

    let name = value["name"].as_str().unwrap_or_default().to_string();
    let nodes: Vec<Node> = serde_json::from_value(value["nodes"].clone())
        .map_err(|e| EditorError::Validation(format!("invalid workflow file format: {}", e)))?;
    let edges: Vec<Edge> = serde_json::from_value(value["edges"].clone())
        .map_err(|e| EditorError::Validation(format!("invalid workflow file format: {}", e)))?;

    let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let before = edges.len();
    let edges: Vec<Edge> = edges
        .into_iter()
        .filter(|e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str()))
        .collect();
    if edges.len() != before {
        warn!("codec::import: dropped {} edges with missing endpoints", before - edges.len());
    }

    debug!("codec::import: {} with {} nodes, {} edges", name, nodes.len(), edges.len());
    Ok(ImportedWorkflow {
        name,
        nodes,
        edges,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::{
        graph::GraphModel,
        model::{Connection, NodeDataPatch, Position},
        nodes::NodeType,
    };

    fn sample() -> GraphModel {
        let mut graph = GraphModel::new();
        graph.insert_node(Node::new("trigger-1".into(), NodeType::Trigger, Position::new(250.0, 50.0)));
        graph.insert_node(Node::new("if-1".into(), NodeType::Condition, Position::new(500.0, 50.0)));
        graph.insert_node(Node::new("delay-1".into(), NodeType::Delay, Position::new(750.0, 0.0)));
        graph.insert_node(Node::new("note-1".into(), NodeType::StickyNote, Position::new(0.0, 300.0)));
        graph.update_node_data("note-1", NodeDataPatch::new().content("remember the timeout"));
        graph.update_node_data("delay-1", NodeDataPatch::new().disabled(true).extra("color", json!("#fff")));
        graph.add_edge(Connection::new("trigger-1", "if-1")).unwrap();
        graph.add_edge(Connection::new("if-1", "delay-1").with_source_handle("true")).unwrap();
        graph
    }

    #[test]
    fn filename_replaces_whitespace_runs() {
        assert_eq!(export_filename("My  Daily\tFlow").unwrap(), "My_Daily_Flow_workflow.json");
        assert_eq!(export_filename("single").unwrap(), "single_workflow.json");
    }

    #[test]
    fn export_writes_versioned_pretty_json() {
        let graph = sample();
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let file = export("Daily Flow", graph.nodes(), graph.edges(), at).unwrap();

        assert!(file.contents.contains("\n  \"version\": \"1.0\""));
        let value: JsonValue = serde_json::from_str(&file.contents).unwrap();
        assert_eq!(value["createdAt"], json!("2024-05-01T10:00:00.000Z"));
        assert_eq!(value["nodes"].as_array().unwrap().len(), 4);
        assert_eq!(value["edges"][1]["sourceHandle"], json!("true"));
    }

    #[test]
    fn export_then_import_reproduces_the_graph() {
        let graph = sample();
        let file = export("Daily Flow", graph.nodes(), graph.edges(), Utc::now()).unwrap();
        let imported = import(&file.contents).unwrap();

        assert_eq!(imported.name, "Daily Flow");
        assert_eq!(imported.document_name(), "Daily Flow (Imported)");
        assert_eq!(imported.nodes, graph.nodes());
        assert_eq!(imported.edges, graph.edges());
    }

    #[test]
    fn import_rejects_bad_shapes() {
        for text in [
            "not json",
            r#"{"name": "x", "nodes": [], "edges": []}"#,
            r#"{"version": "1.0", "name": "", "nodes": [], "edges": []}"#,
            r#"{"version": "1.0", "name": "x", "nodes": {}, "edges": []}"#,
            r#"{"version": "1.0", "name": "x", "nodes": [], "edges": "none"}"#,
            r#"{"version": "1.0", "name": "x", "nodes": [{"id": "a", "type": "warp"}], "edges": []}"#,
        ] {
            assert!(matches!(import(text), Err(EditorError::Validation(_))), "accepted {}", text);
        }
    }

    #[test]
    fn import_fills_positions_and_drops_dangling_edges() {
        let text = json!({
            "version": "1.0",
            "name": "Loose",
            "nodes": [
                { "id": "a", "type": "code", "data": { "label": "A" } },
                { "id": "b", "type": "email", "position": { "x": 5, "y": 6 }, "data": { "label": "B" } }
            ],
            "edges": [
                { "id": "e-a-b", "source": "a", "target": "b" },
                { "id": "e-a-z", "source": "a", "target": "z" }
            ]
        })
        .to_string();

        let imported = import(&text).unwrap();
        assert_eq!(imported.nodes[0].position, Position::default());
        assert_eq!(imported.nodes[1].position, Position::new(5.0, 6.0));
        assert_eq!(imported.edges.len(), 1);
    }
}
