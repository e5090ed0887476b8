use async_trait::async_trait;

use crate::error::ServerError;
use crate::ids::{ChannelId, TeamId, UserId};
use crate::models::{
    AutocompleteResult, Channel, ChannelMember, ClientSettings, LoginRequest, MfaSecret, NewUser,
    OAuthApp, SignupInvite, SwitchAccountRequest, SwitchAccountResponse, TeamMember, TeamUnread,
    UserPatch, UserProfile, UserSearchOptions, UserStatus,
};
use crate::preferences::PreferenceRecord;

/// Remote calls the action layer depends on. Implementations only talk to the
/// server; applying results to local state is the gateway's job.
#[async_trait]
pub trait ChatApiTransport: Send + Sync {
    async fn get_me(&self) -> Result<UserProfile, ServerError>;
    async fn get_client_config(&self) -> Result<ClientSettings, ServerError>;
    async fn get_license_config(&self) -> Result<ClientSettings, ServerError>;

    async fn get_profiles(&self, page: u32, per_page: u32)
    -> Result<Vec<UserProfile>, ServerError>;
    async fn get_profiles_by_ids(&self, user_ids: &[UserId])
    -> Result<Vec<UserProfile>, ServerError>;
    async fn get_profiles_in_team(
        &self,
        team_id: &TeamId,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<UserProfile>, ServerError>;
    async fn get_profiles_in_channel(
        &self,
        channel_id: &ChannelId,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<UserProfile>, ServerError>;
    async fn get_profiles_without_team(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<UserProfile>, ServerError>;
    async fn search_profiles(
        &self,
        term: &str,
        options: &UserSearchOptions,
    ) -> Result<Vec<UserProfile>, ServerError>;
    async fn autocomplete_users(
        &self,
        name: &str,
        team_id: Option<&TeamId>,
        channel_id: Option<&ChannelId>,
    ) -> Result<AutocompleteResult, ServerError>;

    async fn get_team_members_by_ids(
        &self,
        team_id: &TeamId,
        user_ids: &[UserId],
    ) -> Result<Vec<TeamMember>, ServerError>;
    async fn get_my_team_members(&self) -> Result<Vec<TeamMember>, ServerError>;
    async fn get_my_team_unreads(&self) -> Result<Vec<TeamUnread>, ServerError>;

    async fn get_channel(&self, channel_id: &ChannelId) -> Result<Channel, ServerError>;
    async fn get_my_channel_member(
        &self,
        channel_id: &ChannelId,
    ) -> Result<ChannelMember, ServerError>;
    async fn get_channel_members_by_ids(
        &self,
        channel_id: &ChannelId,
        user_ids: &[UserId],
    ) -> Result<Vec<ChannelMember>, ServerError>;

    async fn get_statuses_by_ids(&self, user_ids: &[UserId])
    -> Result<Vec<UserStatus>, ServerError>;
    async fn get_status(&self, user_id: &UserId) -> Result<UserStatus, ServerError>;
    async fn set_status(&self, status: &UserStatus) -> Result<UserStatus, ServerError>;

    async fn save_preferences(
        &self,
        user_id: &UserId,
        records: &[PreferenceRecord],
    ) -> Result<(), ServerError>;
    async fn delete_preferences(
        &self,
        user_id: &UserId,
        records: &[PreferenceRecord],
    ) -> Result<(), ServerError>;

    async fn patch_me(&self, patch: &UserPatch) -> Result<UserProfile, ServerError>;
    async fn update_user_roles(&self, user_id: &UserId, roles: &str) -> Result<(), ServerError>;
    async fn upload_profile_image(&self, user_id: &UserId, image: &[u8]) -> Result<(), ServerError>;
    async fn update_user_active(&self, user_id: &UserId, active: bool) -> Result<(), ServerError>;
    async fn update_user_password(
        &self,
        user_id: &UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ServerError>;
    async fn update_user_mfa(
        &self,
        user_id: &UserId,
        activate: bool,
        code: Option<&str>,
    ) -> Result<(), ServerError>;
    async fn generate_mfa_secret(&self, user_id: &UserId) -> Result<MfaSecret, ServerError>;
    async fn check_user_mfa(&self, login_id: &str) -> Result<bool, ServerError>;

    async fn verify_user_email(&self, token: &str) -> Result<(), ServerError>;
    async fn send_verification_email(&self, email: &str) -> Result<(), ServerError>;
    async fn reset_user_password(&self, token: &str, new_password: &str)
    -> Result<(), ServerError>;

    async fn login(&self, request: &LoginRequest) -> Result<UserProfile, ServerError>;
    async fn logout(&self) -> Result<(), ServerError>;
    async fn create_user(
        &self,
        user: &NewUser,
        invite: &SignupInvite,
    ) -> Result<UserProfile, ServerError>;
    async fn switch_account_type(
        &self,
        request: &SwitchAccountRequest,
    ) -> Result<SwitchAccountResponse, ServerError>;

    async fn get_authorized_oauth_apps(&self, user_id: &UserId)
    -> Result<Vec<OAuthApp>, ServerError>;
    async fn deauthorize_oauth_app(&self, app_id: &str) -> Result<(), ServerError>;
}
