use serde::{Deserialize, Serialize};

const SAMPLE_CODE: &str = "// Available: $trigger, $vars\n// Example:\nreturn {\n  result: \"Hello World\",\n  timestamp: new Date().toISOString()\n};";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CodeConfig {
    pub code: String,
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            code: SAMPLE_CODE.to_string(),
        }
    }
}

impl CodeConfig {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        if super::blank(&self.code) { vec!["code"] } else { Vec::new() }
    }
}
