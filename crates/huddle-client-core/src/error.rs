use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ERROR_ID_REQUEST_FAILED: &str = "api.client.request_failed";
pub const ERROR_ID_DECODE_FAILED: &str = "api.client.decode_failed";
pub const ERROR_ID_HTTP: &str = "api.client.http_error";
pub const ERROR_ID_NOT_SIGNED_IN: &str = "api.client.not_signed_in";
pub const ERROR_ID_NO_CURRENT_TEAM: &str = "api.client.no_current_team";
pub const ERROR_ID_NO_CURRENT_CHANNEL: &str = "api.client.no_current_channel";

/// Returned by the login endpoints when a second factor must be supplied.
pub const MFA_REQUIRED_ERROR_ID: &str = "api.context.mfa_required.app_error";

/// Uniform structured error handed to callers of every action.
///
/// `id` is the stable machine-readable identifier; anything else the server sent
/// beyond the well-known fields is preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{id}: {message}")]
pub struct ServerError {
    pub id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub request_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detailed_error: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServerError {
    #[must_use]
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
            status_code: 0,
            request_id: String::new(),
            detailed_error: String::new(),
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn is_mfa_required(&self) -> bool {
        self.id == MFA_REQUIRED_ERROR_ID
    }

    pub(crate) fn not_signed_in() -> Self {
        Self::new(ERROR_ID_NOT_SIGNED_IN, "no current user in session")
    }

    pub(crate) fn no_current_team() -> Self {
        Self::new(ERROR_ID_NO_CURRENT_TEAM, "no current team in session")
    }

    pub(crate) fn no_current_channel() -> Self {
        Self::new(ERROR_ID_NO_CURRENT_CHANNEL, "no current channel in session")
    }
}
