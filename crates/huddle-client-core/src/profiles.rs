use std::collections::HashMap;
use std::sync::Arc;

use crate::coordinator::BatchFetchCoordinator;
use crate::error::ServerError;
use crate::gateway::Gateway;
use crate::ids::{ChannelId, TeamId, UserId};
use crate::models::{
    AutocompleteResult, ClientSettings, STATUS_ONLINE, TeamMember, Theme, UserPatch, UserProfile,
    UserSearchOptions, UserStatus,
};
use crate::preferences::{CATEGORY_AUTO_RESET_MANUAL_STATUS, CATEGORY_THEME, PreferenceRecord};
use crate::transport::ChatApiTransport;

/// Profile reads and updates for the signed-in user and the people around them.
pub struct ProfileActions<T> {
    gateway: Arc<Gateway<T>>,
    members: BatchFetchCoordinator<T>,
}

impl<T> Clone for ProfileActions<T> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            members: self.members.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfiguration {
    pub me: UserProfile,
    pub client_config: ClientSettings,
    pub license: ClientSettings,
}

impl<T: ChatApiTransport> ProfileActions<T> {
    #[must_use]
    pub fn new(gateway: Arc<Gateway<T>>) -> Self {
        let members = BatchFetchCoordinator::new(Arc::clone(&gateway));
        Self { gateway, members }
    }

    pub async fn load_me(&self) -> Result<UserProfile, ServerError> {
        let me = self.gateway.get_me().await?;
        tracing::info!(user_id = %me.id, locale = %me.locale, "signed-in user loaded");
        Ok(me)
    }

    /// Me, then client config, then license; each step only after the previous one succeeded.
    pub async fn load_me_and_config(&self) -> Result<ServerConfiguration, ServerError> {
        let me = self.load_me().await?;
        let client_config = self.gateway.get_client_config().await?;
        let license = self.gateway.get_license_config().await?;
        Ok(ServerConfiguration {
            me,
            client_config,
            license,
        })
    }

    pub async fn load_profiles(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<UserProfile>, ServerError> {
        self.gateway.get_profiles(page, per_page).await
    }

    pub async fn load_profiles_without_team(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<HashMap<UserId, UserProfile>, ServerError> {
        let profiles = self.gateway.get_profiles_without_team(page, per_page).await?;
        self.members
            .load_statuses_for_profiles(&ids_of(&profiles))
            .await;
        Ok(profiles
            .into_iter()
            .map(|profile| (profile.id.clone(), profile))
            .collect())
    }

    pub async fn search_users(
        &self,
        term: &str,
        team_id: Option<&TeamId>,
        options: UserSearchOptions,
    ) -> Result<Vec<UserProfile>, ServerError> {
        let team_id = self.gateway.state().session.resolve_team_id(team_id)?;
        let options = UserSearchOptions {
            team_id: Some(team_id),
            ..options
        };
        self.search_with_statuses(term, &options).await
    }

    pub async fn search_users_not_in_team(
        &self,
        term: &str,
        team_id: Option<&TeamId>,
        options: UserSearchOptions,
    ) -> Result<Vec<UserProfile>, ServerError> {
        let team_id = self.gateway.state().session.resolve_team_id(team_id)?;
        let options = UserSearchOptions {
            not_in_team_id: Some(team_id),
            ..options
        };
        self.search_with_statuses(term, &options).await
    }

    async fn search_with_statuses(
        &self,
        term: &str,
        options: &UserSearchOptions,
    ) -> Result<Vec<UserProfile>, ServerError> {
        let profiles = self.gateway.search_profiles(term, options).await?;
        self.members
            .load_statuses_for_profiles(&ids_of(&profiles))
            .await;
        Ok(profiles)
    }

    /// Team comes from the cached channel; without it, the current team.
    pub async fn autocomplete_users_in_channel(
        &self,
        name: &str,
        channel_id: &ChannelId,
    ) -> Result<AutocompleteResult, ServerError> {
        let state = self.gateway.state();
        let team_id = match state
            .cache
            .channel(channel_id)
            .and_then(|channel| channel.team_id)
            .filter(|team_id| !team_id.is_empty())
        {
            Some(team_id) => team_id,
            None => state.session.resolve_team_id(None)?,
        };
        self.gateway
            .autocomplete_users(name, Some(&team_id), Some(channel_id))
            .await
    }

    pub async fn autocomplete_users_in_team(
        &self,
        name: &str,
    ) -> Result<AutocompleteResult, ServerError> {
        let team_id = self.gateway.state().session.resolve_team_id(None)?;
        self.gateway
            .autocomplete_users(name, Some(&team_id), None)
            .await
    }

    pub async fn autocomplete_users(&self, name: &str) -> Result<AutocompleteResult, ServerError> {
        self.gateway.autocomplete_users(name, None, None).await
    }

    pub async fn update_user(&self, patch: &UserPatch) -> Result<UserProfile, ServerError> {
        self.gateway.patch_me(patch).await
    }

    pub async fn update_user_notify_props(
        &self,
        notify_props: HashMap<String, String>,
    ) -> Result<UserProfile, ServerError> {
        let patch = UserPatch {
            notify_props: Some(notify_props),
            ..UserPatch::default()
        };
        self.gateway.patch_me(&patch).await
    }

    /// Replaces the signed-in user's picture with the given image bytes.
    pub async fn upload_profile_image(&self, image: &[u8]) -> Result<(), ServerError> {
        let current_user_id = self.gateway.state().session.require_user_id()?;
        self.gateway
            .upload_profile_image(&current_user_id, image)
            .await
    }

    pub async fn update_user_roles(&self, user_id: &UserId, roles: &str) -> Result<(), ServerError> {
        self.gateway.update_user_roles(user_id, roles).await
    }

    /// Saves a theme for one team, or globally when `team_id` is empty.
    ///
    /// A global theme replaces every team-specific one, so those get deleted
    /// afterwards. Saving a team theme while other themes exist leaves them alone.
    pub async fn save_theme(&self, team_id: &str, theme: &Theme) -> Result<(), ServerError> {
        let current_user_id = self.gateway.state().session.require_user_id()?;
        let record = PreferenceRecord::new(
            current_user_id.clone(),
            CATEGORY_THEME,
            team_id,
            theme.to_string(),
        );
        self.gateway
            .save_preferences(&current_user_id, &[record])
            .await?;

        let themes = self.gateway.state().preferences.category(CATEGORY_THEME);
        if !team_id.is_empty() && themes.len() > 1 {
            return Ok(());
        }

        let stale: Vec<PreferenceRecord> = themes
            .into_iter()
            .filter(|(name, _)| !name.is_empty() && name != team_id)
            .map(|(name, _)| PreferenceRecord::new(current_user_id.clone(), CATEGORY_THEME, name, ""))
            .collect();
        if stale.is_empty() {
            return Ok(());
        }

        // the new theme is already saved; cleanup failures are only logged
        if let Err(error) = self
            .gateway
            .delete_preferences(&current_user_id, &stale)
            .await
        {
            tracing::warn!(error_id = %error.id, count = stale.len(), "stale team themes not deleted");
        }
        Ok(())
    }

    /// Unread counts are best effort: a failure is logged by the gateway and dropped.
    pub async fn load_my_team_members(&self) -> Result<Vec<TeamMember>, ServerError> {
        let members = self.gateway.get_my_team_members().await?;
        let _ = self.gateway.get_my_team_unreads().await;
        Ok(members)
    }

    /// Puts a manually set status back to online when the user asked for that.
    pub async fn auto_reset_status(&self) -> Result<UserStatus, ServerError> {
        let current_user_id = self.gateway.state().session.require_user_id()?;
        let status = self.gateway.get_status(&current_user_id).await?;
        if !status.manual {
            return Ok(status);
        }

        let auto_reset = self.gateway.state().preferences.get_bool(
            CATEGORY_AUTO_RESET_MANUAL_STATUS,
            current_user_id.as_str(),
            false,
        );
        if auto_reset {
            let online = UserStatus {
                user_id: current_user_id,
                status: STATUS_ONLINE.to_string(),
                manual: false,
                last_activity_at: status.last_activity_at,
            };
            if let Err(error) = self.gateway.set_status(&online).await {
                tracing::warn!(error_id = %error.id, "manual status not reset");
            }
        }
        Ok(status)
    }
}

fn ids_of(profiles: &[UserProfile]) -> Vec<UserId> {
    profiles.iter().map(|profile| profile.id.clone()).collect()
}
