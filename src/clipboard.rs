//! Node copy/paste/duplicate.
//!
//! Only nodes are ever copied; edges of the originals are never reproduced.

use tracing::trace;

use crate::{graph::GraphModel, model::Node, utils::id};

/// Offset applied to every pasted or duplicated node.
pub const PASTE_OFFSET: f64 = 50.0;

#[derive(Debug, Default)]
pub struct ClipboardController {
    stored: Vec<Node>,
}

impl ClipboardController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the clipboard with deep copies of `nodes`.
    pub fn copy<'a>(
        &mut self,
        nodes: impl IntoIterator<Item = &'a Node>,
    ) -> usize {
        self.stored = nodes.into_iter().cloned().collect();
        trace!("ClipboardController::copy: {} nodes", self.stored.len());
        self.stored.len()
    }

    /// Appends a fresh clone of every stored node to `graph` and returns
    /// the clones. The clipboard is kept, so pasting twice yields two sets.
    pub fn paste(
        &self,
        graph: &mut GraphModel,
    ) -> Vec<Node> {
        clone_into(graph, &self.stored)
    }

    /// Copy and paste in one step, leaving the stored clipboard untouched.
    pub fn duplicate<'a>(
        &self,
        graph: &mut GraphModel,
        nodes: impl IntoIterator<Item = &'a Node>,
    ) -> Vec<Node> {
        let originals: Vec<Node> = nodes.into_iter().cloned().collect();
        clone_into(graph, &originals)
    }

    pub fn is_empty(&self) -> bool {
        self.stored.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stored.len()
    }

    pub fn clear(&mut self) {
        self.stored.clear();
    }
}

fn clone_into(
    graph: &mut GraphModel,
    originals: &[Node],
) -> Vec<Node> {
    let mut pasted = Vec::with_capacity(originals.len());
    for original in originals {
        let mut node = original.clone();
        node.position = original.position.offset(PASTE_OFFSET, PASTE_OFFSET);

        // a collision needs the same millisecond and the same random suffix
        loop {
            node.id = id::paste_id(node.node_type);
            if !graph.contains_node(&node.id) {
                break;
            }
        }

        if graph.insert_node(node.clone()) {
            pasted.push(node);
        }
    }
    trace!("clipboard: pasted {} nodes", pasted.len());
    pasted
}
