use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TriggerKind {
    #[default]
    Manual,
    Schedule,
    Webhook,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TriggerConfig {
    pub trigger_type: TriggerKind,
    /// cron expression, only meaningful for scheduled triggers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
}

impl TriggerConfig {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        match (self.trigger_type, self.schedule.as_deref()) {
            (TriggerKind::Schedule, None) => vec!["schedule"],
            (TriggerKind::Schedule, Some(s)) if super::blank(s) => vec!["schedule"],
            _ => Vec::new(),
        }
    }
}
