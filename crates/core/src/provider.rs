use crate::error::{ReelsightError, Result};

/// Environment variables checked for the Gemini API key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];

pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Endpoints and credentials for the Gemini API.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub api_base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub web_search: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            web_search: true,
        }
    }
}

impl ProviderConfig {
    pub fn name(&self) -> &'static str {
        "Gemini"
    }

    /// Validate that an API key is configured
    pub fn validate_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ReelsightError::MissingApiKey {
                env_var: API_KEY_ENV_VARS[0].to_string(),
            })
    }

    pub fn upload_url(&self) -> String {
        format!("{}/upload/v1beta/files", self.base())
    }

    /// `name` is the full resource name, e.g. `files/abc123`.
    pub fn file_url(&self, name: &str) -> String {
        format!("{}/v1beta/{}", self.base(), name)
    }

    pub fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base(),
            self.model
        )
    }

    fn base(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}

/// First non-empty API key among [`API_KEY_ENV_VARS`].
pub(crate) fn api_key_from(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    API_KEY_ENV_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.trim().is_empty())
}
