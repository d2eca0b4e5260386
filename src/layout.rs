//! Rank-based left-to-right arrangement.
//!
//! Nodes are ranked by longest path from the sources, each rank becomes a
//! column and nodes inside a column keep their document order. Cycles are
//! broken with a greedy feedback arc set before ranking.

use std::collections::{HashMap, HashSet};

use petgraph::{
    Direction,
    algo::{greedy_feedback_arc_set, toposort},
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
};
use tracing::{debug, warn};

use crate::{
    config::LayoutConfig,
    model::{Edge, Node, Position},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    pub node_width: f64,
    pub node_height: f64,
    pub node_sep: f64,
    pub rank_sep: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self::from(&LayoutConfig::default())
    }
}

impl From<&LayoutConfig> for LayoutOptions {
    fn from(config: &LayoutConfig) -> Self {
        Self {
            node_width: config.node_width,
            node_height: config.node_height,
            node_sep: config.node_sep,
            rank_sep: config.rank_sep,
        }
    }
}

/// Returns `nodes` with recomputed positions. Ids, types and data are
/// untouched and the output order matches the input order.
pub fn arrange(
    nodes: &[Node],
    edges: &[Edge],
    options: &LayoutOptions,
) -> Vec<Node> {
    let ranks = rank(nodes, edges);

    let mut columns: Vec<Vec<usize>> = Vec::new();
    for (i, r) in ranks.iter().enumerate() {
        if columns.len() <= *r {
            columns.resize_with(*r + 1, Vec::new);
        }
        columns[*r].push(i);
    }

    let row_step = options.node_height + options.node_sep;
    let col_step = options.node_width + options.rank_sep;
    let tallest = columns.iter().map(Vec::len).max().unwrap_or(0);

    let mut arranged = nodes.to_vec();
    for (r, column) in columns.iter().enumerate() {
        let offset = (tallest - column.len()) as f64 * row_step / 2.0;
        for (row, i) in column.iter().enumerate() {
            arranged[*i].position = Position::new(r as f64 * col_step, offset + row as f64 * row_step);
        }
    }

    debug!("layout::arrange: {} nodes in {} ranks", arranged.len(), columns.len());
    arranged
}

/// Longest-path rank of every node, indexed like `nodes`.
fn rank(
    nodes: &[Node],
    edges: &[Edge],
) -> Vec<usize> {
    let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(nodes.len(), edges.len());
    let mut index: HashMap<&str, NodeIndex> = HashMap::new();
    for (i, node) in nodes.iter().enumerate() {
        index.insert(node.id.as_str(), graph.add_node(i));
    }
    for edge in edges {
        if let (Some(s), Some(t)) = (index.get(edge.source.as_str()), index.get(edge.target.as_str())) {
            if s != t {
                graph.add_edge(*s, *t, ());
            }
        }
    }

    let back_edges: HashSet<_> = greedy_feedback_arc_set(&graph).map(|e| e.id()).collect();
    let acyclic = graph.filter_map(|_, n| Some(*n), |e, _| (!back_edges.contains(&e)).then_some(()));

    let order = match toposort(&acyclic, None) {
        Ok(order) => order,
        Err(cycle) => {
            warn!("layout::rank: cycle left at {:?}, ranking flat", cycle.node_id());
            return vec![0; nodes.len()];
        }
    };

    let mut ranks = vec![0usize; nodes.len()];
    for n in order {
        let from = ranks[acyclic[n]];
        for succ in acyclic.neighbors_directed(n, Direction::Outgoing) {
            let slot = &mut ranks[acyclic[succ]];
            *slot = (*slot).max(from + 1);
        }
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{graph::GraphModel, model::Connection, nodes::NodeType};

    fn node(nid: &str) -> Node {
        Node::new(nid.to_string(), NodeType::Code, Position::new(-999.0, 999.0))
    }

    fn diamond() -> GraphModel {
        let mut graph = GraphModel::new();
        for nid in ["a", "b", "c", "d"] {
            graph.insert_node(node(nid));
        }
        graph.add_edge(Connection::new("a", "b")).unwrap();
        graph.add_edge(Connection::new("a", "c")).unwrap();
        graph.add_edge(Connection::new("b", "d")).unwrap();
        graph.add_edge(Connection::new("c", "d")).unwrap();
        graph
    }

    #[test]
    fn ranks_flow_left_to_right() {
        let graph = diamond();
        let arranged = arrange(graph.nodes(), graph.edges(), &LayoutOptions::default());
        let pos = |nid: &str| arranged.iter().find(|n| n.id == nid).unwrap().position;

        assert_eq!(pos("a").x, 0.0);
        assert_eq!(pos("b").x, 350.0);
        assert_eq!(pos("c").x, 350.0);
        assert_eq!(pos("d").x, 700.0);
        assert_eq!(pos("c").y - pos("b").y, 180.0);
        // single-node ranks are centred on the tallest column
        assert_eq!(pos("a").y, 90.0);
    }

    #[test]
    fn only_positions_change() {
        let graph = diamond();
        let arranged = arrange(graph.nodes(), graph.edges(), &LayoutOptions::default());
        for (before, after) in graph.nodes().iter().zip(&arranged) {
            assert_eq!(before.id, after.id);
            assert_eq!(before.node_type, after.node_type);
            assert_eq!(before.data, after.data);
        }
    }

    #[test]
    fn arrange_is_idempotent() {
        let graph = diamond();
        let options = LayoutOptions::default();
        let once = arrange(graph.nodes(), graph.edges(), &options);
        let twice = arrange(&once, graph.edges(), &options);
        assert_eq!(once, twice);
    }

    #[test]
    fn cycles_do_not_hang() {
        let nodes = vec![node("a"), node("b"), node("c")];
        let edges = vec![
            Edge {
                id: "1".into(),
                source: "a".into(),
                target: "b".into(),
                source_handle: None,
                target_handle: None,
            },
            Edge {
                id: "2".into(),
                source: "b".into(),
                target: "c".into(),
                source_handle: None,
                target_handle: None,
            },
            Edge {
                id: "3".into(),
                source: "c".into(),
                target: "a".into(),
                source_handle: None,
                target_handle: None,
            },
        ];
        let arranged = arrange(&nodes, &edges, &LayoutOptions::default());
        let mut xs: Vec<f64> = arranged.iter().map(|n| n.position.x).collect();
        xs.sort_by(f64::total_cmp);
        xs.dedup();
        assert_eq!(xs.len(), 3);
    }

    #[test]
    fn spacing_is_configurable() {
        let graph = diamond();
        let options = LayoutOptions {
            node_width: 100.0,
            node_height: 50.0,
            node_sep: 10.0,
            rank_sep: 20.0,
        };
        let arranged = arrange(graph.nodes(), graph.edges(), &options);
        assert_eq!(arranged[3].position.x, 240.0);
    }
}
