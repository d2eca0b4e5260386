use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateTaskConfig {
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub assignee_id: String,
}

impl CreateTaskConfig {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        if super::blank(&self.title) { vec!["title"] } else { Vec::new() }
    }
}

/// Each field is only written when its `update_*` switch is on. Priority and
/// status stay free strings since empty means "leave unchanged".
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateTaskConfig {
    pub task_id: String,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub assignee_id: String,
    pub update_title: bool,
    pub update_description: bool,
    pub update_priority: bool,
    pub update_status: bool,
    pub update_assignee: bool,
}

impl UpdateTaskConfig {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        if super::blank(&self.task_id) { vec!["taskId"] } else { Vec::new() }
    }

    /// Whether at least one field is switched on.
    pub fn updates_anything(&self) -> bool {
        self.update_title || self.update_description || self.update_priority || self.update_status || self.update_assignee
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn priority_is_upper_case_on_the_wire() {
        let config = CreateTaskConfig::default();
        assert_eq!(serde_json::to_value(&config).unwrap()["priority"], json!("MEDIUM"));
        let parsed: CreateTaskConfig = serde_json::from_value(json!({ "title": "t", "priority": "CRITICAL" })).unwrap();
        assert_eq!(parsed.priority, TaskPriority::Critical);
        assert_eq!(parsed.assignee_id, "");
    }

    #[test]
    fn update_switches_default_off() {
        let config: UpdateTaskConfig = serde_json::from_value(json!({ "taskId": "42", "updateStatus": true })).unwrap();
        assert!(config.updates_anything());
        assert!(config.missing_fields().is_empty());
        assert!(!UpdateTaskConfig::default().updates_anything());
    }
}
