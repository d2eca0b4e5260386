mod edge;
mod node;
mod workflow;

pub use edge::{Connection, Edge, EdgeId};
pub use node::{Node, NodeData, NodeDataPatch, NodeId, Position};
pub use workflow::{DocumentId, WorkflowDocument};
