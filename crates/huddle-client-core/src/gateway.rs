use std::sync::Arc;

use crate::error::ServerError;
use crate::ids::{ChannelId, TeamId, UserId};
use crate::models::{
    AutocompleteResult, ChannelMember, ChannelWithMember, ClientSettings, LoginRequest,
    MfaSecret, NewUser, OAuthApp, SignupInvite, SwitchAccountRequest, SwitchAccountResponse,
    TeamMember, TeamUnread, UserPatch, UserProfile, UserSearchOptions, UserStatus,
};
use crate::preferences::PreferenceRecord;
use crate::state::ClientState;
use crate::transport::ChatApiTransport;

/// Wraps a transport and applies every successful result to [`ClientState`].
///
/// Failures are logged once here and handed back untouched, so callers above
/// the gateway only decide what to do with them.
pub struct Gateway<T> {
    transport: T,
    state: Arc<ClientState>,
}

fn observe<R>(op: &'static str, result: Result<R, ServerError>) -> Result<R, ServerError> {
    if let Err(error) = &result {
        tracing::warn!(
            op,
            error_id = %error.id,
            status_code = error.status_code,
            "huddle request failed"
        );
    }
    result
}

impl<T: ChatApiTransport> Gateway<T> {
    #[must_use]
    pub fn new(transport: T, state: Arc<ClientState>) -> Self {
        Self { transport, state }
    }

    #[must_use]
    pub fn state(&self) -> &ClientState {
        &self.state
    }

    #[must_use]
    pub fn shared_state(&self) -> Arc<ClientState> {
        Arc::clone(&self.state)
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn get_me(&self) -> Result<UserProfile, ServerError> {
        let me = observe("get_me", self.transport.get_me().await)?;
        self.remember_signed_in(&me);
        Ok(me)
    }

    pub async fn get_client_config(&self) -> Result<ClientSettings, ServerError> {
        let config = observe(
            "get_client_config",
            self.transport.get_client_config().await,
        )?;
        self.state
            .session
            .update(|session| session.client_config = config.clone());
        Ok(config)
    }

    pub async fn get_license_config(&self) -> Result<ClientSettings, ServerError> {
        let license = observe(
            "get_license_config",
            self.transport.get_license_config().await,
        )?;
        self.state
            .session
            .update(|session| session.license = license.clone());
        Ok(license)
    }

    pub async fn get_profiles(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<UserProfile>, ServerError> {
        let profiles = observe(
            "get_profiles",
            self.transport.get_profiles(page, per_page).await,
        )?;
        self.state.cache.insert_profiles(profiles.iter().cloned());
        Ok(profiles)
    }

    pub async fn get_profiles_by_ids(
        &self,
        user_ids: &[UserId],
    ) -> Result<Vec<UserProfile>, ServerError> {
        tracing::debug!(count = user_ids.len(), "fetching profiles by ids");
        let profiles = observe(
            "get_profiles_by_ids",
            self.transport.get_profiles_by_ids(user_ids).await,
        )?;
        self.state.cache.insert_profiles(profiles.iter().cloned());
        Ok(profiles)
    }

    pub async fn get_profiles_in_team(
        &self,
        team_id: &TeamId,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<UserProfile>, ServerError> {
        let profiles = observe(
            "get_profiles_in_team",
            self.transport
                .get_profiles_in_team(team_id, page, per_page)
                .await,
        )?;
        self.state.cache.insert_profiles(profiles.iter().cloned());
        self.state
            .cache
            .add_user_ids_to_team(team_id, profiles.iter().map(|profile| &profile.id));
        Ok(profiles)
    }

    pub async fn get_profiles_in_channel(
        &self,
        channel_id: &ChannelId,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<UserProfile>, ServerError> {
        let profiles = observe(
            "get_profiles_in_channel",
            self.transport
                .get_profiles_in_channel(channel_id, page, per_page)
                .await,
        )?;
        self.state.cache.insert_profiles(profiles.iter().cloned());
        self.state
            .cache
            .add_user_ids_to_channel(channel_id, profiles.iter().map(|profile| &profile.id));
        Ok(profiles)
    }

    pub async fn get_profiles_without_team(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<UserProfile>, ServerError> {
        let profiles = observe(
            "get_profiles_without_team",
            self.transport.get_profiles_without_team(page, per_page).await,
        )?;
        self.state.cache.insert_profiles(profiles.iter().cloned());
        Ok(profiles)
    }

    pub async fn search_profiles(
        &self,
        term: &str,
        options: &UserSearchOptions,
    ) -> Result<Vec<UserProfile>, ServerError> {
        let profiles = observe(
            "search_profiles",
            self.transport.search_profiles(term, options).await,
        )?;
        self.state.cache.insert_profiles(profiles.iter().cloned());
        Ok(profiles)
    }

    pub async fn autocomplete_users(
        &self,
        name: &str,
        team_id: Option<&TeamId>,
        channel_id: Option<&ChannelId>,
    ) -> Result<AutocompleteResult, ServerError> {
        let result = observe(
            "autocomplete_users",
            self.transport
                .autocomplete_users(name, team_id, channel_id)
                .await,
        )?;
        self.state.cache.insert_profiles(
            result
                .users
                .iter()
                .chain(result.out_of_channel.iter())
                .cloned(),
        );
        if let Some(channel_id) = channel_id {
            self.state
                .cache
                .add_user_ids_to_channel(channel_id, result.users.iter().map(|user| &user.id));
        }
        Ok(result)
    }

    pub async fn get_team_members_by_ids(
        &self,
        team_id: &TeamId,
        user_ids: &[UserId],
    ) -> Result<Vec<TeamMember>, ServerError> {
        tracing::debug!(team_id = %team_id, count = user_ids.len(), "fetching team members");
        let members = observe(
            "get_team_members_by_ids",
            self.transport
                .get_team_members_by_ids(team_id, user_ids)
                .await,
        )?;
        self.state.cache.insert_team_members(members.iter().cloned());
        Ok(members)
    }

    pub async fn get_my_team_members(&self) -> Result<Vec<TeamMember>, ServerError> {
        let members = observe(
            "get_my_team_members",
            self.transport.get_my_team_members().await,
        )?;
        self.state.cache.set_my_team_members(members.iter().cloned());
        Ok(members)
    }

    pub async fn get_my_team_unreads(&self) -> Result<Vec<TeamUnread>, ServerError> {
        let unreads = observe(
            "get_my_team_unreads",
            self.transport.get_my_team_unreads().await,
        )?;
        self.state.cache.insert_team_unreads(unreads.iter().cloned());
        Ok(unreads)
    }

    pub async fn get_channel_and_my_member(
        &self,
        channel_id: &ChannelId,
    ) -> Result<ChannelWithMember, ServerError> {
        let channel = observe("get_channel", self.transport.get_channel(channel_id).await)?;
        let member = observe(
            "get_my_channel_member",
            self.transport.get_my_channel_member(channel_id).await,
        )?;
        self.state.cache.insert_channel(channel.clone());
        self.state.cache.set_my_channel_member(member.clone());
        Ok(ChannelWithMember { channel, member })
    }

    pub async fn get_channel_members_by_ids(
        &self,
        channel_id: &ChannelId,
        user_ids: &[UserId],
    ) -> Result<Vec<ChannelMember>, ServerError> {
        tracing::debug!(channel_id = %channel_id, count = user_ids.len(), "fetching channel members");
        let members = observe(
            "get_channel_members_by_ids",
            self.transport
                .get_channel_members_by_ids(channel_id, user_ids)
                .await,
        )?;
        self.state
            .cache
            .insert_channel_members(members.iter().cloned());
        Ok(members)
    }

    pub async fn get_statuses_by_ids(
        &self,
        user_ids: &[UserId],
    ) -> Result<Vec<UserStatus>, ServerError> {
        let statuses = observe(
            "get_statuses_by_ids",
            self.transport.get_statuses_by_ids(user_ids).await,
        )?;
        self.state.cache.insert_statuses(statuses.iter().cloned());
        Ok(statuses)
    }

    pub async fn get_status(&self, user_id: &UserId) -> Result<UserStatus, ServerError> {
        let status = observe("get_status", self.transport.get_status(user_id).await)?;
        self.state.cache.insert_statuses([status.clone()]);
        Ok(status)
    }

    pub async fn set_status(&self, status: &UserStatus) -> Result<UserStatus, ServerError> {
        let status = observe("set_status", self.transport.set_status(status).await)?;
        self.state.cache.insert_statuses([status.clone()]);
        Ok(status)
    }

    pub async fn save_preferences(
        &self,
        user_id: &UserId,
        records: &[PreferenceRecord],
    ) -> Result<(), ServerError> {
        tracing::debug!(user_id = %user_id, count = records.len(), "saving preferences");
        observe(
            "save_preferences",
            self.transport.save_preferences(user_id, records).await,
        )?;
        self.state.preferences.merge(records);
        Ok(())
    }

    pub async fn delete_preferences(
        &self,
        user_id: &UserId,
        records: &[PreferenceRecord],
    ) -> Result<(), ServerError> {
        observe(
            "delete_preferences",
            self.transport.delete_preferences(user_id, records).await,
        )?;
        self.state.preferences.remove(records);
        Ok(())
    }

    pub async fn patch_me(&self, patch: &UserPatch) -> Result<UserProfile, ServerError> {
        let me = observe("patch_me", self.transport.patch_me(patch).await)?;
        self.state.cache.insert_profiles([me.clone()]);
        Ok(me)
    }

    pub async fn update_user_roles(&self, user_id: &UserId, roles: &str) -> Result<(), ServerError> {
        observe(
            "update_user_roles",
            self.transport.update_user_roles(user_id, roles).await,
        )?;
        if let Some(mut profile) = self.state.cache.profile(user_id) {
            profile.roles = roles.to_string();
            self.state.cache.insert_profiles([profile]);
        }
        Ok(())
    }

    pub async fn upload_profile_image(
        &self,
        user_id: &UserId,
        image: &[u8],
    ) -> Result<(), ServerError> {
        tracing::debug!(user_id = %user_id, bytes = image.len(), "uploading profile image");
        observe(
            "upload_profile_image",
            self.transport.upload_profile_image(user_id, image).await,
        )
    }

    pub async fn update_user_active(
        &self,
        user_id: &UserId,
        active: bool,
    ) -> Result<(), ServerError> {
        observe(
            "update_user_active",
            self.transport.update_user_active(user_id, active).await,
        )
    }

    pub async fn update_user_password(
        &self,
        user_id: &UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ServerError> {
        observe(
            "update_user_password",
            self.transport
                .update_user_password(user_id, current_password, new_password)
                .await,
        )
    }

    pub async fn update_user_mfa(
        &self,
        user_id: &UserId,
        activate: bool,
        code: Option<&str>,
    ) -> Result<(), ServerError> {
        observe(
            "update_user_mfa",
            self.transport.update_user_mfa(user_id, activate, code).await,
        )?;
        if let Some(mut profile) = self.state.cache.profile(user_id) {
            profile.mfa_active = activate;
            self.state.cache.insert_profiles([profile]);
        }
        Ok(())
    }

    pub async fn generate_mfa_secret(&self, user_id: &UserId) -> Result<MfaSecret, ServerError> {
        observe(
            "generate_mfa_secret",
            self.transport.generate_mfa_secret(user_id).await,
        )
    }

    pub async fn check_user_mfa(&self, login_id: &str) -> Result<bool, ServerError> {
        observe("check_user_mfa", self.transport.check_user_mfa(login_id).await)
    }

    pub async fn verify_user_email(&self, token: &str) -> Result<(), ServerError> {
        observe(
            "verify_user_email",
            self.transport.verify_user_email(token).await,
        )
    }

    pub async fn send_verification_email(&self, email: &str) -> Result<(), ServerError> {
        observe(
            "send_verification_email",
            self.transport.send_verification_email(email).await,
        )
    }

    pub async fn reset_user_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), ServerError> {
        observe(
            "reset_user_password",
            self.transport.reset_user_password(token, new_password).await,
        )
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<UserProfile, ServerError> {
        let me = self.transport.login(request).await;
        // mfa_required is an expected step of the login flow, not worth a warning
        let me = match me {
            Err(error) if error.is_mfa_required() => return Err(error),
            other => observe("login", other)?,
        };
        self.remember_signed_in(&me);
        Ok(me)
    }

    pub async fn logout(&self) -> Result<(), ServerError> {
        let result = observe("logout", self.transport.logout().await);
        self.state.reset();
        result
    }

    pub async fn create_user(
        &self,
        user: &NewUser,
        invite: &SignupInvite,
    ) -> Result<UserProfile, ServerError> {
        let created = observe(
            "create_user",
            self.transport.create_user(user, invite).await,
        )?;
        self.state.cache.insert_profiles([created.clone()]);
        Ok(created)
    }

    pub async fn switch_account_type(
        &self,
        request: &SwitchAccountRequest,
    ) -> Result<SwitchAccountResponse, ServerError> {
        observe(
            "switch_account_type",
            self.transport.switch_account_type(request).await,
        )
    }

    pub async fn get_authorized_oauth_apps(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<OAuthApp>, ServerError> {
        observe(
            "get_authorized_oauth_apps",
            self.transport.get_authorized_oauth_apps(user_id).await,
        )
    }

    pub async fn deauthorize_oauth_app(&self, app_id: &str) -> Result<(), ServerError> {
        observe(
            "deauthorize_oauth_app",
            self.transport.deauthorize_oauth_app(app_id).await,
        )
    }

    fn remember_signed_in(&self, me: &UserProfile) {
        self.state.cache.insert_profiles([me.clone()]);
        let locale = (!me.locale.is_empty()).then(|| me.locale.clone());
        self.state.session.update(|session| {
            session.current_user_id = Some(me.id.clone());
            if locale.is_some() {
                session.locale = locale;
            }
        });
    }
}
