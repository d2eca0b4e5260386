//! Live node/edge collections and their mutation primitives.
//!
//! Every mutation keeps the graph consistent: edges only ever reference
//! present nodes and removing a node removes its incident edges. Malformed
//! requests (unknown ids, rejected connections) are silently ignored.

use std::collections::HashSet;

use tracing::{trace, warn};

use crate::{
    history::HistorySnapshot,
    model::{Connection, Edge, EdgeId, Node, NodeDataPatch, NodeId, Position},
    nodes::NodeType,
    utils::id,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphModel {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from decoded collections, dropping edges whose
    /// endpoints are absent.
    pub fn from_parts(
        nodes: Vec<Node>,
        edges: Vec<Edge>,
    ) -> Self {
        let mut graph = Self::new();
        graph.replace(nodes, edges);
        graph
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(
        &self,
        nid: &str,
    ) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == nid)
    }

    pub fn edge(
        &self,
        eid: &str,
    ) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == eid)
    }

    pub fn contains_node(
        &self,
        nid: &str,
    ) -> bool {
        self.node(nid).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Deep copy of the current state.
    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot::new(self.nodes.clone(), self.edges.clone())
    }

    /// Adds a node of `node_type` with the registry defaults.
    pub fn add_node(
        &mut self,
        node_type: NodeType,
        position: Position,
    ) -> Node {
        let base = id::node_id(node_type);
        let mut nid = base.clone();
        let mut bump = 1;
        while self.contains_node(&nid) {
            nid = format!("{}-{}", base, bump);
            bump += 1;
        }

        let node = Node::new(nid, node_type, position);
        trace!("GraphModel::add_node: {} at ({}, {})", node.id, position.x, position.y);
        self.nodes.push(node.clone());
        node
    }

    /// Appends a prebuilt node. Returns false when the id is taken.
    pub fn insert_node(
        &mut self,
        node: Node,
    ) -> bool {
        if self.contains_node(&node.id) {
            warn!("GraphModel::insert_node: id {} already present", node.id);
            return false;
        }
        trace!("GraphModel::insert_node: {}", node.id);
        self.nodes.push(node);
        true
    }

    /// Removes the node and every edge touching it.
    pub fn remove_node(
        &mut self,
        nid: &str,
    ) -> Option<Node> {
        let idx = self.nodes.iter().position(|n| n.id == nid)?;
        let node = self.nodes.remove(idx);
        let dropped = self.remove_edges_touching(nid);
        trace!("GraphModel::remove_node: {} ({} edges dropped)", nid, dropped.len());
        Some(node)
    }

    /// Returns the new disabled state.
    pub fn toggle_disabled(
        &mut self,
        nid: &str,
    ) -> Option<bool> {
        let node = self.node_mut(nid)?;
        node.data.disabled = !node.data.disabled;
        trace!("GraphModel::toggle_disabled: {} -> {}", nid, node.data.disabled);
        Some(node.data.disabled)
    }

    /// Shallow-merges `patch` into the node's data. Returns whether the node
    /// exists.
    pub fn update_node_data(
        &mut self,
        nid: &str,
        patch: NodeDataPatch,
    ) -> bool {
        let Some(node) = self.node_mut(nid) else {
            warn!("GraphModel::update_node_data: no node {}", nid);
            return false;
        };

        let NodeDataPatch {
            label,
            disabled,
            config,
            content,
            extra,
        } = patch;

        if let Some(label) = label {
            node.data.label = label;
        }
        if let Some(disabled) = disabled {
            node.data.disabled = disabled;
        }
        if let Some(config) = config {
            match config.ensure_type(node.node_type) {
                Ok(()) => node.data.config = config,
                Err(e) => warn!("GraphModel::update_node_data: {}: {}", nid, e),
            }
        }
        if let Some(content) = content {
            node.data.content = Some(content);
        }
        node.data.extra.extend(extra);
        trace!("GraphModel::update_node_data: {}", nid);
        true
    }

    pub fn set_position(
        &mut self,
        nid: &str,
        position: Position,
    ) -> bool {
        match self.node_mut(nid) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    /// Connects two handles. Rejected (returns `None`) when either endpoint
    /// is absent, on a self-loop, when the same route already exists, or when
    /// the node types have no such handles.
    pub fn add_edge(
        &mut self,
        connection: Connection,
    ) -> Option<Edge> {
        let (Some(source), Some(target)) = (self.node(&connection.source), self.node(&connection.target)) else {
            trace!("GraphModel::add_edge: missing endpoint {} -> {}", connection.source, connection.target);
            return None;
        };
        if source.id == target.id {
            trace!("GraphModel::add_edge: self loop on {}", source.id);
            return None;
        }
        if !source.node_type.capabilities().allows_source(connection.source_handle.as_deref()) {
            trace!("GraphModel::add_edge: {} has no source handle {:?}", source.id, connection.source_handle);
            return None;
        }
        if !target.node_type.capabilities().accepts_target {
            trace!("GraphModel::add_edge: {} accepts no incoming edge", target.id);
            return None;
        }
        if self.edges.iter().any(|e| e.same_route(&connection)) {
            trace!("GraphModel::add_edge: duplicate {} -> {}", connection.source, connection.target);
            return None;
        }

        let edge = Edge {
            id: self.edge_id(&connection),
            source: connection.source,
            target: connection.target,
            source_handle: connection.source_handle,
            target_handle: connection.target_handle,
        };
        trace!("GraphModel::add_edge: {}", edge.id);
        self.edges.push(edge.clone());
        Some(edge)
    }

    pub fn remove_edge(
        &mut self,
        eid: &str,
    ) -> Option<Edge> {
        let idx = self.edges.iter().position(|e| e.id == eid)?;
        trace!("GraphModel::remove_edge: {}", eid);
        Some(self.edges.remove(idx))
    }

    /// Removes every edge with `nid` as an endpoint and returns them.
    pub fn remove_edges_touching(
        &mut self,
        nid: &str,
    ) -> Vec<Edge> {
        let (dropped, kept): (Vec<Edge>, Vec<Edge>) = std::mem::take(&mut self.edges).into_iter().partition(|e| e.touches(nid));
        self.edges = kept;
        dropped
    }

    /// Replaces everything. Edges with a dangling endpoint and nodes with a
    /// duplicated id are dropped.
    pub fn replace(
        &mut self,
        nodes: Vec<Node>,
        edges: Vec<Edge>,
    ) {
        let mut ids = HashSet::new();
        self.nodes = nodes.into_iter().filter(|n| ids.insert(n.id.clone())).collect();

        let before = edges.len();
        self.edges = edges.into_iter().filter(|e| ids.contains(&e.source) && ids.contains(&e.target)).collect();
        if self.edges.len() != before {
            warn!("GraphModel::replace: dropped {} dangling edges", before - self.edges.len());
        }
    }

    /// Restores a snapshot wholesale.
    pub fn restore(
        &mut self,
        snapshot: HistorySnapshot,
    ) {
        let (nodes, edges) = snapshot.into_parts();
        self.replace(nodes, edges);
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    fn node_mut(
        &mut self,
        nid: &str,
    ) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == nid)
    }

    fn edge_id(
        &self,
        connection: &Connection,
    ) -> EdgeId {
        let mut base = format!("e-{}-{}", connection.source, connection.target);
        if let Some(handle) = &connection.source_handle {
            base = format!("{}-{}", base, handle);
        }
        if let Some(handle) = &connection.target_handle {
            base = format!("{}-{}", base, handle);
        }

        let mut eid = base.clone();
        let mut bump = 1;
        while self.edge(&eid).is_some() {
            eid = format!("{}-{}", base, bump);
            bump += 1;
        }
        eid
    }

    /// Ids of every node reachable by one edge from `nid`.
    pub fn successors(
        &self,
        nid: &str,
    ) -> Vec<NodeId> {
        self.edges.iter().filter(|e| e.source == nid).map(|e| e.target.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::nodes::{ConditionConfig, NodeConfig};

    fn node(
        nid: &str,
        node_type: NodeType,
    ) -> Node {
        Node::new(nid.to_string(), node_type, Position::default())
    }

    fn chain() -> GraphModel {
        let mut graph = GraphModel::new();
        graph.insert_node(node("t", NodeType::Trigger));
        graph.insert_node(node("a", NodeType::CreateTask));
        graph.insert_node(node("b", NodeType::Email));
        graph.insert_node(node("c", NodeType::Delay));
        graph.add_edge(Connection::new("t", "a")).unwrap();
        graph.add_edge(Connection::new("a", "b")).unwrap();
        graph.add_edge(Connection::new("b", "c")).unwrap();
        graph
    }

    #[test]
    fn add_node_applies_registry_defaults() {
        let mut graph = GraphModel::new();
        let n = graph.add_node(NodeType::HttpRequest, Position::new(10.0, 20.0));
        assert!(n.id.starts_with("httpRequest-"));
        assert_eq!(n.data.label, "HTTP Request");
        assert!(!n.data.disabled);
        assert_eq!(n.data.config, NodeConfig::default_for(NodeType::HttpRequest));
        assert_eq!(graph.nodes().len(), 1);
    }

    #[test]
    fn add_node_never_reuses_an_id() {
        let mut graph = GraphModel::new();
        let ids: HashSet<_> = (0..20).map(|_| graph.add_node(NodeType::Code, Position::default()).id).collect();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn insert_node_rejects_taken_id() {
        let mut graph = GraphModel::new();
        assert!(graph.insert_node(node("x", NodeType::Code)));
        assert!(!graph.insert_node(node("x", NodeType::Delay)));
        assert_eq!(graph.node("x").unwrap().node_type, NodeType::Code);
    }

    #[test]
    fn remove_node_cascades_only_incident_edges() {
        let mut graph = chain();
        graph.remove_node("a").unwrap();

        let remaining: Vec<_> = graph.edges().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(remaining, vec!["e-b-c"]);
        assert!(graph.edges().iter().all(|e| graph.contains_node(&e.source) && graph.contains_node(&e.target)));
        assert!(graph.remove_node("a").is_none());
    }

    #[test]
    fn add_edge_rejects_malformed_connections() {
        let mut graph = chain();
        let before = graph.edges().len();

        assert!(graph.add_edge(Connection::new("t", "ghost")).is_none());
        assert!(graph.add_edge(Connection::new("a", "a")).is_none());
        assert!(graph.add_edge(Connection::new("t", "a")).is_none());
        assert!(graph.add_edge(Connection::new("a", "t")).is_none());
        assert_eq!(graph.edges().len(), before);
    }

    #[test]
    fn condition_edges_need_a_branch_handle() {
        let mut graph = GraphModel::new();
        graph.insert_node(node("if", NodeType::Condition));
        graph.insert_node(node("yes", NodeType::Code));
        graph.insert_node(node("no", NodeType::Code));

        assert!(graph.add_edge(Connection::new("if", "yes")).is_none());
        let yes = graph.add_edge(Connection::new("if", "yes").with_source_handle("true")).unwrap();
        let no = graph.add_edge(Connection::new("if", "no").with_source_handle("false")).unwrap();
        assert_eq!(yes.id, "e-if-yes-true");
        assert_eq!(no.source_handle.as_deref(), Some("false"));
        assert_eq!(graph.successors("if"), vec!["yes".to_string(), "no".to_string()]);
    }

    #[test]
    fn update_node_data_merges_shallowly() {
        let mut graph = chain();
        let patch = NodeDataPatch::new().label("Open ticket").extra("color", json!("red"));
        assert!(graph.update_node_data("a", patch));

        let a = graph.node("a").unwrap();
        assert_eq!(a.data.label, "Open ticket");
        assert_eq!(a.data.config, NodeConfig::default_for(NodeType::CreateTask));
        assert_eq!(a.data.extra.get("color"), Some(&json!("red")));
        assert!(!graph.update_node_data("ghost", NodeDataPatch::new().label("x")));
    }

    #[test]
    fn update_node_data_ignores_foreign_config() {
        let mut graph = chain();
        let patch = NodeDataPatch::new().config(NodeConfig::Condition(ConditionConfig {
            expression: "x > 1".to_string(),
        }));
        graph.update_node_data("a", patch);
        assert_eq!(graph.node("a").unwrap().data.config, NodeConfig::default_for(NodeType::CreateTask));
    }

    #[test]
    fn toggle_disabled_flips() {
        let mut graph = chain();
        assert_eq!(graph.toggle_disabled("b"), Some(true));
        assert_eq!(graph.toggle_disabled("b"), Some(false));
        assert_eq!(graph.toggle_disabled("ghost"), None);
    }

    #[test]
    fn replace_drops_dangling_edges() {
        let graph = chain();
        let mut nodes = graph.nodes().to_vec();
        nodes.retain(|n| n.id != "c");
        let rebuilt = GraphModel::from_parts(nodes, graph.edges().to_vec());
        assert_eq!(rebuilt.edges().len(), 2);
        assert!(rebuilt.edge("e-b-c").is_none());
    }

    #[test]
    fn snapshot_restore_is_exact() {
        let mut graph = chain();
        let snapshot = graph.snapshot();
        graph.remove_node("t");
        graph.add_node(NodeType::Delay, Position::new(1.0, 1.0));
        graph.restore(snapshot.clone());
        assert_eq!(graph.snapshot(), snapshot);
    }
}
