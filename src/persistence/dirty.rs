use tracing::trace;

use crate::model::{Edge, Node};

/// Immediate change detector over `(nodes, edges, name)`.
///
/// Independent from history sampling: every observed difference marks the
/// document dirty, whether or not it ever becomes an undo step.
#[derive(Debug, Default)]
pub struct DirtyTracker {
    baseline: Option<(Vec<Node>, Vec<Edge>, String)>,
    dirty: bool,
    /// bumped on every detected change
    revision: u64,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compares with the previous observation and advances the baseline.
    /// Returns whether a change was detected.
    pub fn observe(
        &mut self,
        nodes: &[Node],
        edges: &[Edge],
        name: &str,
    ) -> bool {
        let changed = match &self.baseline {
            Some((n, e, nm)) => n.as_slice() != nodes || e.as_slice() != edges || nm != name,
            None => true,
        };
        if changed {
            self.baseline = Some((nodes.to_vec(), edges.to_vec(), name.to_string()));
            self.dirty = true;
            self.revision += 1;
            trace!("DirtyTracker::observe: revision {}", self.revision);
        }
        changed
    }

    /// Adopts the current state as clean, e.g. right after a load.
    pub fn reset(
        &mut self,
        nodes: &[Node],
        edges: &[Edge],
        name: &str,
    ) {
        self.baseline = Some((nodes.to_vec(), edges.to_vec(), name.to_string()));
        self.dirty = false;
        self.revision += 1;
    }

    /// Marks dirty without a graph change, e.g. for content that exists
    /// only locally.
    pub fn touch(&mut self) {
        self.dirty = true;
        self.revision += 1;
    }

    /// Clears the flag unless something changed after `revision` was read.
    pub fn mark_saved(
        &mut self,
        revision: u64,
    ) -> bool {
        if self.revision == revision {
            self.dirty = false;
        }
        !self.dirty
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model::Position, nodes::NodeType};

    fn nodes() -> Vec<Node> {
        vec![Node::new("trigger-1".into(), NodeType::Trigger, Position::new(250.0, 50.0))]
    }

    #[test]
    fn any_difference_marks_dirty() {
        let mut tracker = DirtyTracker::new();
        tracker.reset(&nodes(), &[], "Flow");
        assert!(!tracker.observe(&nodes(), &[], "Flow"));
        assert!(!tracker.is_dirty());

        assert!(tracker.observe(&nodes(), &[], "Renamed"));
        assert!(tracker.is_dirty());
        // the baseline advanced, so the same state is not a new change
        assert!(!tracker.observe(&nodes(), &[], "Renamed"));
    }

    #[test]
    fn save_keeps_dirty_when_changed_meanwhile() {
        let mut tracker = DirtyTracker::new();
        tracker.reset(&[], &[], "Flow");
        tracker.observe(&nodes(), &[], "Flow");

        let at_save = tracker.revision();
        tracker.observe(&[], &[], "Flow");
        assert!(!tracker.mark_saved(at_save));
        assert!(tracker.is_dirty());

        assert!(tracker.mark_saved(tracker.revision()));
        assert!(!tracker.is_dirty());
    }
}
