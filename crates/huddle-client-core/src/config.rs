pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8065";
pub const ENV_API_BASE_URL: &str = "HUDDLE_API_BASE_URL";
pub const ENV_ACCESS_TOKEN: &str = "HUDDLE_ACCESS_TOKEN";
pub const API_BASE_SOURCE_DEFAULT_LOCAL: &str = "default_local";

/// Group conversations with fewer known participants than this get their member profiles loaded.
pub const MIN_USERS_IN_GM: usize = 3;
/// Page size cap when loading the profiles of a group conversation.
pub const MAX_USERS_IN_GM: u32 = 8;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("base url must not be empty")]
    EmptyBaseUrl,
    #[error("base url must use http:// or https:// and include a host")]
    InvalidBaseUrl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncLimits {
    pub min_users_in_gm: usize,
    pub max_users_in_gm: u32,
}

impl Default for SyncLimits {
    fn default() -> Self {
        Self {
            min_users_in_gm: MIN_USERS_IN_GM,
            max_users_in_gm: MAX_USERS_IN_GM,
        }
    }
}

pub fn resolve_api_base_url() -> Result<(String, &'static str), ConfigError> {
    if let Some(base_url) = env_non_empty(ENV_API_BASE_URL) {
        return normalize_base_url(&base_url).map(|normalized| (normalized, ENV_API_BASE_URL));
    }
    normalize_base_url(DEFAULT_API_BASE_URL)
        .map(|normalized| (normalized, API_BASE_SOURCE_DEFAULT_LOCAL))
}

#[must_use]
pub fn resolve_access_token() -> Option<String> {
    env_non_empty(ENV_ACCESS_TOKEN)
}

pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyBaseUrl);
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidBaseUrl);
    }
    let Some((_, remainder)) = trimmed.split_once("://") else {
        return Err(ConfigError::InvalidBaseUrl);
    };
    if remainder.trim().is_empty() || remainder.starts_with('/') {
        return Err(ConfigError::InvalidBaseUrl);
    }
    Ok(trimmed.to_string())
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
