use std::sync::{PoisonError, RwLock};

use crate::cache::LocalCache;
use crate::error::ServerError;
use crate::ids::{ChannelId, TeamId, UserId};
use crate::models::ClientSettings;
use crate::preferences::PreferenceStore;

pub const SETTING_ENABLE_MFA: &str = "EnableMultifactorAuthentication";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub current_user_id: Option<UserId>,
    pub current_team_id: Option<TeamId>,
    pub current_channel_id: Option<ChannelId>,
    pub locale: Option<String>,
    pub client_config: ClientSettings,
    pub license: ClientSettings,
}

#[derive(Debug, Default)]
pub struct SessionStore {
    inner: RwLock<SessionState>,
}

impl SessionStore {
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update(&self, apply: impl FnOnce(&mut SessionState)) {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        apply(&mut state);
    }

    #[must_use]
    pub fn current_user_id(&self) -> Option<UserId> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .current_user_id
            .clone()
    }

    pub fn require_user_id(&self) -> Result<UserId, ServerError> {
        self.current_user_id().ok_or_else(ServerError::not_signed_in)
    }

    pub fn resolve_team_id(&self, team_id: Option<&TeamId>) -> Result<TeamId, ServerError> {
        if let Some(team_id) = team_id {
            return Ok(team_id.clone());
        }
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .current_team_id
            .clone()
            .ok_or_else(ServerError::no_current_team)
    }

    pub fn resolve_channel_id(
        &self,
        channel_id: Option<&ChannelId>,
    ) -> Result<ChannelId, ServerError> {
        if let Some(channel_id) = channel_id {
            return Ok(channel_id.clone());
        }
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .current_channel_id
            .clone()
            .ok_or_else(ServerError::no_current_channel)
    }

    #[must_use]
    pub fn setting(&self, key: &str) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .client_config
            .get(key)
            .cloned()
    }

    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = SessionState::default();
    }
}

/// Everything the action layer reads and the gateway writes, owned by the caller
/// and shared through an `Arc` instead of living in process-wide statics.
#[derive(Debug, Default)]
pub struct ClientState {
    pub cache: LocalCache,
    pub preferences: PreferenceStore,
    pub session: SessionStore,
}

impl ClientState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every cached entity, preference, and session field.
    pub fn reset(&self) {
        self.cache.clear();
        self.preferences.clear();
        self.session.clear();
    }
}
