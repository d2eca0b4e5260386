use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Edge, Node};

/// Sentinel some routes use for a document that was never saved.
const NEW_DOCUMENT_SENTINEL: &str = "new";

/// Identity of the edited document. `Unsaved` until the backend assigns an id
/// on first save.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum DocumentId {
    #[default]
    Unsaved,
    Saved(String),
}

impl DocumentId {
    pub fn is_saved(&self) -> bool {
        matches!(self, DocumentId::Saved(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DocumentId::Unsaved => None,
            DocumentId::Saved(id) => Some(id),
        }
    }
}

impl From<Option<String>> for DocumentId {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(id) if !id.is_empty() && id != NEW_DOCUMENT_SENTINEL => DocumentId::Saved(id),
            _ => DocumentId::Unsaved,
        }
    }
}

impl From<DocumentId> for Option<String> {
    fn from(value: DocumentId) -> Self {
        match value {
            DocumentId::Unsaved => None,
            DocumentId::Saved(id) => Some(id),
        }
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        DocumentId::from(Some(value.to_string()))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            DocumentId::Unsaved => write!(f, "{}", NEW_DOCUMENT_SENTINEL),
            DocumentId::Saved(id) => write!(f, "{}", id),
        }
    }
}

/// The whole edited document.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDocument {
    pub id: DocumentId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_id_sentinels_mean_unsaved() {
        assert_eq!(DocumentId::from("new"), DocumentId::Unsaved);
        assert_eq!(DocumentId::from(""), DocumentId::Unsaved);
        assert_eq!(DocumentId::from(None), DocumentId::Unsaved);
        assert_eq!(DocumentId::from("wf-1"), DocumentId::Saved("wf-1".to_string()));
        assert!(!DocumentId::Unsaved.is_saved());
        assert_eq!(DocumentId::Saved("wf-1".into()).as_str(), Some("wf-1"));
    }

    #[test]
    fn document_id_serializes_as_nullable_string() {
        assert_eq!(serde_json::to_string(&DocumentId::Unsaved).unwrap(), "null");
        assert_eq!(serde_json::to_string(&DocumentId::Saved("a".into())).unwrap(), "\"a\"");
        let id: DocumentId = serde_json::from_str("\"new\"").unwrap();
        assert_eq!(id, DocumentId::Unsaved);
    }
}
