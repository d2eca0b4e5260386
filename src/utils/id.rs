//! Node id generation.

use crate::nodes::NodeType;

use super::time::time_millis;

const SUFFIX_ALPHABET: [char; 36] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r',
    's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// `${type}-${millis}` for nodes created from the palette or the canvas.
pub fn node_id(node_type: NodeType) -> String {
    format!("{}-{}", node_type.as_ref(), time_millis())
}

/// `${type}-${millis}-${random}` for pasted and duplicated nodes, which are
/// created in bursts within the same millisecond.
pub fn paste_id(node_type: NodeType) -> String {
    format!("{}-{}-{}", node_type.as_ref(), time_millis(), nanoid::nanoid!(9, &SUFFIX_ALPHABET))
}
