use serde::{Deserialize, Serialize};

/// Source handle taken when the expression holds.
pub const CONDITION_TRUE_HANDLE: &str = "true";
/// Source handle taken otherwise.
pub const CONDITION_FALSE_HANDLE: &str = "false";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ConditionConfig {
    pub expression: String,
}

impl ConditionConfig {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        if super::blank(&self.expression) { vec!["expression"] } else { Vec::new() }
    }
}
