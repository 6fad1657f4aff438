use serde::{Deserialize, Serialize};

/// A static catalog entry describing a model a provider can serve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Identifier sent to the backend
    pub id: String,
    /// Human-readable name
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl ModelInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            max_output_tokens: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_max_output_tokens(mut self, n: u32) -> Self {
        self.max_output_tokens = Some(n);
        self
    }
}

/// Per-call overrides. Any field left as `None` falls back to the provider's default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendOptions {
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
}

impl SendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = Some(n);
        self
    }

    #[must_use]
    pub fn temperature(mut self, t: f32) -> Self {
        self.temperature = Some(t);
        self
    }

    #[must_use]
    pub fn top_p(mut self, p: f32) -> Self {
        self.top_p = Some(p);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_options_builder() {
        let opts = SendOptions::new().model("gpt-4o-mini").max_tokens(256).top_p(0.9);
        assert_eq!(opts.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(opts.max_tokens, Some(256));
        assert_eq!(opts.temperature, None);
        assert_eq!(opts.top_p, Some(0.9));
    }

    #[test]
    fn test_model_info_skips_empty_fields() {
        let info = ModelInfo::new("qwen-plus", "Qwen Plus");
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json, serde_json::json!({"id": "qwen-plus", "name": "Qwen Plus"}));
    }
}
