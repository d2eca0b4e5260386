//! Bounded linear undo/redo over graph snapshots.
//!
//! The manager only stores and walks snapshots; deciding *when* to record
//! (the quiescence debounce) is the session's job.

use std::collections::VecDeque;

use serde::Serialize;
use tracing::debug;

use crate::model::{Edge, Node};

/// Immutable deep copy of the node and edge sets.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct HistorySnapshot {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl HistorySnapshot {
    pub fn new(
        nodes: Vec<Node>,
        edges: Vec<Edge>,
    ) -> Self {
        Self {
            nodes,
            edges,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Node>, Vec<Edge>) {
        (self.nodes, self.edges)
    }
}

pub struct HistoryManager {
    history: VecDeque<HistorySnapshot>,
    /// `None` while nothing has been recorded.
    index: Option<usize>,
    limit: usize,
}

impl HistoryManager {
    pub fn new(limit: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(limit),
            index: None,
            limit: limit.max(1),
        }
    }

    /// Appends `snapshot` after the current entry, discarding any redo
    /// future. Empty graphs and repeats of the current entry are skipped.
    /// Returns whether an entry was added.
    pub fn record(
        &mut self,
        snapshot: HistorySnapshot,
    ) -> bool {
        if snapshot.is_empty() {
            debug!("HistoryManager::record: skip empty graph");
            return false;
        }
        if self.current() == Some(&snapshot) {
            debug!("HistoryManager::record: skip unchanged graph");
            return false;
        }

        if let Some(idx) = self.index {
            self.history.truncate(idx + 1);
        }
        self.history.push_back(snapshot);
        while self.history.len() > self.limit {
            self.history.pop_front();
        }
        self.index = Some(self.history.len() - 1);

        debug!("HistoryManager::record: {} entries, index {}", self.history.len(), self.history.len() - 1);
        true
    }

    /// Steps back and returns the snapshot to apply.
    pub fn undo(&mut self) -> Option<HistorySnapshot> {
        let idx = self.index.filter(|i| *i > 0)? - 1;
        self.index = Some(idx);
        debug!("HistoryManager::undo: index {}", idx);
        self.history.get(idx).cloned()
    }

    /// Steps forward and returns the snapshot to apply.
    pub fn redo(&mut self) -> Option<HistorySnapshot> {
        let idx = self.index.filter(|i| i + 1 < self.history.len())? + 1;
        self.index = Some(idx);
        debug!("HistoryManager::redo: index {}", idx);
        self.history.get(idx).cloned()
    }

    pub fn can_undo(&self) -> bool {
        self.index.is_some_and(|i| i > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.index.is_some_and(|i| i + 1 < self.history.len())
    }

    pub fn current(&self) -> Option<&HistorySnapshot> {
        self.index.and_then(|i| self.history.get(i))
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.index = None;
    }
}
