use log::debug;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const API_KEY_VAR: &str = "GROQ_API_KEY";
pub const BASE_URL_VAR: &str = "KPI_LLM_BASE_URL";
pub const MODEL_VAR: &str = "KPI_LLM_MODEL";
pub const TIMEOUT_VAR: &str = "KPI_LLM_TIMEOUT_SECS";

/// Connection settings for the optional LLM insight refinement.
#[derive(Clone, PartialEq)]
pub struct LlmSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl LlmSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// `None` when no API key is set; callers then stay on rule-based insights.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(api_key) = lookup(API_KEY_VAR).filter(|k| !k.trim().is_empty()) else {
            debug!("{} not set, LLM insights disabled", API_KEY_VAR);
            return None;
        };

        let mut settings = Self::new(api_key.trim());
        if let Some(base_url) = lookup(BASE_URL_VAR).filter(|v| !v.trim().is_empty()) {
            settings = settings.with_base_url(base_url.trim());
        }
        if let Some(model) = lookup(MODEL_VAR).filter(|v| !v.trim().is_empty()) {
            settings = settings.with_model(model.trim());
        }
        if let Some(secs) = lookup(TIMEOUT_VAR).and_then(|v| v.trim().parse::<u64>().ok()) {
            settings = settings.with_timeout(Duration::from_secs(secs));
        }
        Some(settings)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_missing_key_disables_llm() {
        assert!(LlmSettings::from_lookup(lookup_from(&[])).is_none());
        assert!(LlmSettings::from_lookup(lookup_from(&[(API_KEY_VAR, "  ")])).is_none());
    }

    #[test]
    fn test_defaults() {
        let settings = LlmSettings::from_lookup(lookup_from(&[(API_KEY_VAR, "gsk_test")])).unwrap();
        assert_eq!(settings.api_key, "gsk_test");
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.temperature, 0.2);
        assert_eq!(settings.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let settings = LlmSettings::from_lookup(lookup_from(&[
            (API_KEY_VAR, "key"),
            (BASE_URL_VAR, "http://localhost:8080/v1/"),
            (MODEL_VAR, "local-model"),
            (TIMEOUT_VAR, "5"),
        ]))
        .unwrap();
        assert_eq!(settings.base_url, "http://localhost:8080/v1");
        assert_eq!(settings.model, "local-model");
        assert_eq!(settings.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", LlmSettings::new("secret-key"));
        assert!(!rendered.contains("secret-key"));
    }
}
