use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailConfig {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body: String,
}

impl EmailConfig {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if super::blank(&self.to) {
            missing.push("to");
        }
        if super::blank(&self.subject) {
            missing.push("subject");
        }
        missing
    }
}
