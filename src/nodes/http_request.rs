use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
pub enum HttpRequestMethod {
    #[default]
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct HttpHeader {
    pub key: String,
    pub value: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpRequestConfig {
    pub method: HttpRequestMethod,
    pub url: String,
    pub headers: Vec<HttpHeader>,
    pub body: String,
}

impl HttpRequestConfig {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        if super::blank(&self.url) { vec!["url"] } else { Vec::new() }
    }

    /// Headers with a name; rows left blank in the editor are skipped.
    pub fn effective_headers(&self) -> impl Iterator<Item = &HttpHeader> {
        self.headers.iter().filter(|h| !super::blank(&h.key))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let config: HttpRequestConfig = serde_json::from_value(json!({
            "url": "https://example.com",
            "headers": [{ "key": "Accept", "value": "application/json" }, { "key": "", "value": "" }]
        }))
        .unwrap();

        assert_eq!(config.method, HttpRequestMethod::GET);
        assert_eq!(config.effective_headers().count(), 1);
        assert!(config.missing_fields().is_empty());
    }
}
