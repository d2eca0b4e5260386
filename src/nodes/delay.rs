use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DelayUnit {
    #[default]
    Seconds,
    Minutes,
    Hours,
}

impl DelayUnit {
    fn seconds(self) -> u64 {
        match self {
            DelayUnit::Seconds => 1,
            DelayUnit::Minutes => 60,
            DelayUnit::Hours => 3600,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct DelayConfig {
    /// stored as a string by the config editor
    #[serde(serialize_with = "duration_as_string", deserialize_with = "lenient_duration")]
    pub duration: u64,
    pub unit: DelayUnit,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            duration: 5,
            unit: DelayUnit::Seconds,
        }
    }
}

impl DelayConfig {
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.duration.saturating_mul(self.unit.seconds()))
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        Vec::new()
    }
}

fn duration_as_string<S>(
    value: &u64,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

fn lenient_duration<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) if s.trim().is_empty() => Ok(0),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn duration_accepts_strings_and_numbers() {
        let a: DelayConfig = serde_json::from_value(json!({ "duration": "10", "unit": "minutes" })).unwrap();
        let b: DelayConfig = serde_json::from_value(json!({ "duration": 10, "unit": "minutes" })).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_duration(), Duration::from_secs(600));
        assert!(serde_json::from_value::<DelayConfig>(json!({ "duration": "soon" })).is_err());
    }

    #[test]
    fn duration_is_written_back_as_string() {
        let value = serde_json::to_value(DelayConfig::default()).unwrap();
        assert_eq!(value, json!({ "duration": "5", "unit": "seconds" }));
    }
}
