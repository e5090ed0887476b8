use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{ChannelId, TeamId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub roles: String,
    #[serde(default)]
    pub locale: String,
    #[serde(default)]
    pub notify_props: HashMap<String, String>,
    #[serde(default)]
    pub mfa_active: bool,
    #[serde(default)]
    pub delete_at: i64,
    #[serde(default)]
    pub update_at: i64,
}

impl UserProfile {
    #[must_use]
    pub fn new(id: impl Into<UserId>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            email: String::new(),
            nickname: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            roles: String::new(),
            locale: String::new(),
            notify_props: HashMap::new(),
            mfa_active: false,
            delete_at: 0,
            update_at: 0,
        }
    }
}

/// Partial update of the signed-in user's profile. Unset fields are left untouched server-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_props: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

/// How a sign-up was invited. `data` and `email_hash` come from an emailed
/// invite link and travel together; `invite_id` is a team's shareable link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupInvite {
    pub token: Option<String>,
    pub data: Option<String>,
    pub email_hash: Option<String>,
    pub invite_id: Option<String>,
}

impl SignupInvite {
    /// Query parameters for the user creation request, empty values left out.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("t", self.token.as_deref()),
            ("d", self.data.as_deref()),
            ("h", self.email_hash.as_deref()),
            ("iid", self.invite_id.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.filter(|value| !value.is_empty()).map(|value| (key, value)))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub team_id: TeamId,
    pub user_id: UserId,
    #[serde(default)]
    pub roles: String,
    #[serde(default)]
    pub delete_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamUnread {
    pub team_id: TeamId,
    #[serde(default)]
    pub msg_count: u64,
    #[serde(default)]
    pub mention_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelType {
    #[serde(rename = "O")]
    Open,
    #[serde(rename = "P")]
    Private,
    #[serde(rename = "D")]
    Direct,
    #[serde(rename = "G")]
    Group,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    #[serde(default)]
    pub team_id: Option<TeamId>,
    #[serde(rename = "type")]
    pub kind: ChannelType,
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub total_msg_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMember {
    pub channel_id: ChannelId,
    pub user_id: UserId,
    #[serde(default)]
    pub roles: String,
    #[serde(default)]
    pub msg_count: u64,
    #[serde(default)]
    pub mention_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelWithMember {
    pub channel: Channel,
    pub member: ChannelMember,
}

pub const STATUS_ONLINE: &str = "online";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStatus {
    pub user_id: UserId,
    pub status: String,
    #[serde(default)]
    pub manual: bool,
    #[serde(default)]
    pub last_activity_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSearchOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_in_team_id: Option<TeamId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_channel_id: Option<ChannelId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_in_channel_id: Option<ChannelId>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub allow_inactive: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub without_team: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutocompleteResult {
    #[serde(default)]
    pub users: Vec<UserProfile>,
    #[serde(default)]
    pub out_of_channel: Vec<UserProfile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MfaSecret {
    pub secret: String,
    #[serde(default)]
    pub qr_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub login_id: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ldap_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchAccountRequest {
    pub current_service: String,
    pub new_service: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mfa_code: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ldap_password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchAccountResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthApp {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub homepage: String,
}

/// Server-provided client settings, string valued as served by `/config/client`.
pub type ClientSettings = HashMap<String, String>;

/// Opaque theme payload stored as JSON in the `theme` preference category.
pub type Theme = Value;
