use std::time::Duration;

pub const DEFAULT_LOG_FILTER: &str = "info";
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_NARRATIVE_TIMEOUT_SECS: u64 = 30;

const API_KEY_VARS: [&str; 3] = ["GRADEBOOK_GEMINI_API_KEY", "GEMINI_API_KEY", "API_KEY"];

/// Settings for the external text-generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_NARRATIVE_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub log_filter: String,
    pub narrative: NarrativeConfig,
}

impl Config {
    /// Reads the process environment after loading a `.env` file if present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let log_filter = non_empty("GRADEBOOK_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.into());
        let api_key = API_KEY_VARS.iter().find_map(|k| non_empty(*k));
        let endpoint = non_empty("GRADEBOOK_GEMINI_ENDPOINT")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_GEMINI_ENDPOINT.into());
        let model = non_empty("GRADEBOOK_GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.into());
        let timeout_secs = non_empty("GRADEBOOK_NARRATIVE_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_NARRATIVE_TIMEOUT_SECS)
            .max(1);

        Self {
            log_filter,
            narrative: NarrativeConfig {
                endpoint,
                api_key,
                model,
                timeout: Duration::from_secs(timeout_secs),
            },
        }
    }
}
