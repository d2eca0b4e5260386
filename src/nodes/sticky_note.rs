use serde::{Deserialize, Serialize};

/// Annotations carry their text in the node data, not in the config.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct StickyNoteConfig {}
