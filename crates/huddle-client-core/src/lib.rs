pub mod account;
pub mod cache;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod gateway;
pub mod ids;
pub mod models;
pub mod preferences;
pub mod profiles;
pub mod state;
pub mod transport;
pub mod visibility;

#[cfg(test)]
mod test_support;

pub use account::{AccountActions, LoginOutcome};
pub use cache::LocalCache;
pub use client::ChatClient;
pub use config::{
    ConfigError, DEFAULT_API_BASE_URL, ENV_ACCESS_TOKEN, ENV_API_BASE_URL, MAX_USERS_IN_GM,
    MIN_USERS_IN_GM, SyncLimits, normalize_base_url, resolve_access_token, resolve_api_base_url,
};
pub use coordinator::{BatchFetchCoordinator, LoadedMembers, ScopeMember, missing_members};
pub use error::{MFA_REQUIRED_ERROR_ID, ServerError};
pub use gateway::Gateway;
pub use ids::{ChannelId, Scope, TeamId, UserId, direct_channel_name, direct_channel_peer};
pub use models::{
    AutocompleteResult, Channel, ChannelMember, ChannelType, ChannelWithMember, ClientSettings,
    LoginRequest, MfaSecret, NewUser, OAuthApp, SignupInvite, SwitchAccountRequest,
    SwitchAccountResponse, TeamMember, TeamUnread, Theme, UserPatch, UserProfile,
    UserSearchOptions, UserStatus,
};
pub use preferences::{PreferenceRecord, PreferenceStore};
pub use profiles::{ProfileActions, ServerConfiguration};
pub use state::{ClientState, SessionState, SessionStore};
pub use transport::ChatApiTransport;
pub use visibility::{Visibility, VisibilitySync, VisibilitySyncReport};
