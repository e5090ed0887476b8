use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ServerError;
use crate::ids::{ChannelId, TeamId, UserId};
use crate::models::{
    AutocompleteResult, Channel, ChannelMember, ChannelType, ClientSettings, LoginRequest,
    MfaSecret, NewUser, OAuthApp, SignupInvite, SwitchAccountRequest, SwitchAccountResponse,
    TeamMember, TeamUnread, UserPatch, UserProfile, UserSearchOptions, UserStatus,
};
use crate::preferences::PreferenceRecord;
use crate::transport::ChatApiTransport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    ProfilesByIds {
        user_ids: Vec<String>,
    },
    ProfilesInTeam {
        team_id: String,
        page: u32,
        per_page: u32,
    },
    ProfilesInChannel {
        channel_id: String,
        page: u32,
        per_page: u32,
    },
    TeamMembersByIds {
        team_id: String,
        user_ids: Vec<String>,
    },
    ChannelMembersByIds {
        channel_id: String,
        user_ids: Vec<String>,
    },
    StatusesByIds {
        user_ids: Vec<String>,
    },
    SavePreferences {
        user_id: String,
        records: Vec<PreferenceRecord>,
    },
    DeletePreferences {
        user_id: String,
        records: Vec<PreferenceRecord>,
    },
    SetStatus {
        status: String,
    },
    Login {
        login_id: String,
        ldap_only: bool,
    },
    CreateUser {
        query: Vec<String>,
    },
    UploadProfileImage {
        user_id: String,
        bytes: usize,
    },
    Op(&'static str),
}

#[derive(Debug, Default)]
struct FakeInner {
    calls: Vec<FakeCall>,
    failures: HashMap<&'static str, String>,
    team_profiles: HashMap<String, Vec<String>>,
    channel_profiles: HashMap<String, Vec<String>>,
    channels: HashMap<String, (Channel, ChannelMember)>,
    status: Option<UserStatus>,
    client_config: ClientSettings,
    switch_follow_link: Option<String>,
    stall_saves: bool,
}

/// In-memory transport recording every call, for exercising the action layer.
#[derive(Debug, Default)]
pub struct FakeTransport {
    inner: Mutex<FakeInner>,
}

pub fn ids(values: &[&str]) -> Vec<UserId> {
    values.iter().map(|value| UserId::from(*value)).collect()
}

fn strings(user_ids: &[UserId]) -> Vec<String> {
    user_ids.iter().map(|id| id.as_str().to_string()).collect()
}

pub fn profile(user_id: &str) -> UserProfile {
    UserProfile::new(user_id, format!("user-{user_id}"))
}

pub fn team_member(team_id: &str, user_id: &str) -> TeamMember {
    TeamMember {
        team_id: TeamId::from(team_id),
        user_id: UserId::from(user_id),
        roles: "team_user".to_string(),
        delete_at: 0,
    }
}

pub fn channel_member(
    channel_id: &str,
    user_id: &str,
    msg_count: u64,
    mention_count: u64,
) -> ChannelMember {
    ChannelMember {
        channel_id: ChannelId::from(channel_id),
        user_id: UserId::from(user_id),
        roles: "channel_user".to_string(),
        msg_count,
        mention_count,
    }
}

pub fn channel(channel_id: &str, kind: ChannelType, name: &str, total_msg_count: u64) -> Channel {
    Channel {
        id: ChannelId::from(channel_id),
        team_id: None,
        kind,
        name: name.to_string(),
        display_name: String::new(),
        total_msg_count,
    }
}

impl FakeTransport {
    pub fn calls(&self) -> Vec<FakeCall> {
        self.lock().calls.clone()
    }

    pub fn fail(&self, op: &'static str, error_id: &str) {
        self.lock().failures.insert(op, error_id.to_string());
    }

    pub fn set_team_profiles(&self, team_id: &str, user_ids: &[&str]) {
        self.lock().team_profiles.insert(
            team_id.to_string(),
            user_ids.iter().map(|id| (*id).to_string()).collect(),
        );
    }

    pub fn set_channel_profiles(&self, channel_id: &str, user_ids: &[&str]) {
        self.lock().channel_profiles.insert(
            channel_id.to_string(),
            user_ids.iter().map(|id| (*id).to_string()).collect(),
        );
    }

    pub fn set_channel(&self, channel: Channel, member: ChannelMember) {
        self.lock()
            .channels
            .insert(channel.id.as_str().to_string(), (channel, member));
    }

    pub fn set_status(&self, status: UserStatus) {
        self.lock().status = Some(status);
    }

    pub fn set_client_config(&self, key: &str, value: &str) {
        self.lock()
            .client_config
            .insert(key.to_string(), value.to_string());
    }

    pub fn set_switch_follow_link(&self, link: &str) {
        self.lock().switch_follow_link = Some(link.to_string());
    }

    /// Preference saves are recorded and then never answer.
    pub fn stall_preference_saves(&self) {
        self.lock().stall_saves = true;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, op: &'static str, call: FakeCall) -> Result<(), ServerError> {
        let mut inner = self.lock();
        inner.calls.push(call);
        match inner.failures.get(op) {
            Some(error_id) => Err(ServerError::new(error_id.clone(), format!("{op} failed"))
                .with_status(500)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ChatApiTransport for FakeTransport {
    async fn get_me(&self) -> Result<UserProfile, ServerError> {
        self.record("get_me", FakeCall::Op("get_me"))?;
        let mut me = profile("me");
        me.locale = "en".to_string();
        Ok(me)
    }

    async fn get_client_config(&self) -> Result<ClientSettings, ServerError> {
        self.record("get_client_config", FakeCall::Op("get_client_config"))?;
        Ok(self.lock().client_config.clone())
    }

    async fn get_license_config(&self) -> Result<ClientSettings, ServerError> {
        self.record("get_license_config", FakeCall::Op("get_license_config"))?;
        Ok(HashMap::from([("IsLicensed".to_string(), "false".to_string())]))
    }

    async fn get_profiles(
        &self,
        _page: u32,
        _per_page: u32,
    ) -> Result<Vec<UserProfile>, ServerError> {
        self.record("get_profiles", FakeCall::Op("get_profiles"))?;
        Ok(vec![profile("u1")])
    }

    async fn get_profiles_by_ids(
        &self,
        user_ids: &[UserId],
    ) -> Result<Vec<UserProfile>, ServerError> {
        self.record(
            "get_profiles_by_ids",
            FakeCall::ProfilesByIds {
                user_ids: strings(user_ids),
            },
        )?;
        Ok(user_ids.iter().map(|id| profile(id.as_str())).collect())
    }

    async fn get_profiles_in_team(
        &self,
        team_id: &TeamId,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<UserProfile>, ServerError> {
        self.record(
            "get_profiles_in_team",
            FakeCall::ProfilesInTeam {
                team_id: team_id.to_string(),
                page,
                per_page,
            },
        )?;
        let ids = self
            .lock()
            .team_profiles
            .get(team_id.as_str())
            .cloned()
            .unwrap_or_default();
        Ok(ids.iter().map(|id| profile(id)).collect())
    }

    async fn get_profiles_in_channel(
        &self,
        channel_id: &ChannelId,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<UserProfile>, ServerError> {
        self.record(
            "get_profiles_in_channel",
            FakeCall::ProfilesInChannel {
                channel_id: channel_id.to_string(),
                page,
                per_page,
            },
        )?;
        let ids = self
            .lock()
            .channel_profiles
            .get(channel_id.as_str())
            .cloned()
            .unwrap_or_default();
        Ok(ids
            .iter()
            .take(per_page as usize)
            .map(|id| profile(id))
            .collect())
    }

    async fn get_profiles_without_team(
        &self,
        _page: u32,
        _per_page: u32,
    ) -> Result<Vec<UserProfile>, ServerError> {
        self.record(
            "get_profiles_without_team",
            FakeCall::Op("get_profiles_without_team"),
        )?;
        Ok(vec![profile("loner")])
    }

    async fn search_profiles(
        &self,
        term: &str,
        _options: &UserSearchOptions,
    ) -> Result<Vec<UserProfile>, ServerError> {
        self.record("search_profiles", FakeCall::Op("search_profiles"))?;
        Ok(vec![profile(term)])
    }

    async fn autocomplete_users(
        &self,
        name: &str,
        _team_id: Option<&TeamId>,
        _channel_id: Option<&ChannelId>,
    ) -> Result<AutocompleteResult, ServerError> {
        self.record("autocomplete_users", FakeCall::Op("autocomplete_users"))?;
        Ok(AutocompleteResult {
            users: vec![profile(name)],
            out_of_channel: Vec::new(),
        })
    }

    async fn get_team_members_by_ids(
        &self,
        team_id: &TeamId,
        user_ids: &[UserId],
    ) -> Result<Vec<TeamMember>, ServerError> {
        self.record(
            "get_team_members_by_ids",
            FakeCall::TeamMembersByIds {
                team_id: team_id.to_string(),
                user_ids: strings(user_ids),
            },
        )?;
        Ok(user_ids
            .iter()
            .map(|id| team_member(team_id.as_str(), id.as_str()))
            .collect())
    }

    async fn get_my_team_members(&self) -> Result<Vec<TeamMember>, ServerError> {
        self.record("get_my_team_members", FakeCall::Op("get_my_team_members"))?;
        Ok(vec![team_member("t1", "me")])
    }

    async fn get_my_team_unreads(&self) -> Result<Vec<TeamUnread>, ServerError> {
        self.record("get_my_team_unreads", FakeCall::Op("get_my_team_unreads"))?;
        Ok(vec![TeamUnread {
            team_id: TeamId::from("t1"),
            msg_count: 4,
            mention_count: 1,
        }])
    }

    async fn get_channel(&self, channel_id: &ChannelId) -> Result<Channel, ServerError> {
        self.record("get_channel", FakeCall::Op("get_channel"))?;
        self.lock()
            .channels
            .get(channel_id.as_str())
            .map(|(channel, _)| channel.clone())
            .ok_or_else(|| {
                ServerError::new("app.channel.get.existing.app_error", "channel not found")
                    .with_status(404)
            })
    }

    async fn get_my_channel_member(
        &self,
        channel_id: &ChannelId,
    ) -> Result<ChannelMember, ServerError> {
        self.record("get_my_channel_member", FakeCall::Op("get_my_channel_member"))?;
        self.lock()
            .channels
            .get(channel_id.as_str())
            .map(|(_, member)| member.clone())
            .ok_or_else(|| {
                ServerError::new("app.channel.get_member.missing.app_error", "member not found")
                    .with_status(404)
            })
    }

    async fn get_channel_members_by_ids(
        &self,
        channel_id: &ChannelId,
        user_ids: &[UserId],
    ) -> Result<Vec<ChannelMember>, ServerError> {
        self.record(
            "get_channel_members_by_ids",
            FakeCall::ChannelMembersByIds {
                channel_id: channel_id.to_string(),
                user_ids: strings(user_ids),
            },
        )?;
        Ok(user_ids
            .iter()
            .map(|id| channel_member(channel_id.as_str(), id.as_str(), 0, 0))
            .collect())
    }

    async fn get_statuses_by_ids(
        &self,
        user_ids: &[UserId],
    ) -> Result<Vec<UserStatus>, ServerError> {
        self.record(
            "get_statuses_by_ids",
            FakeCall::StatusesByIds {
                user_ids: strings(user_ids),
            },
        )?;
        Ok(user_ids
            .iter()
            .map(|id| UserStatus {
                user_id: id.clone(),
                status: "away".to_string(),
                manual: false,
                last_activity_at: 0,
            })
            .collect())
    }

    async fn get_status(&self, user_id: &UserId) -> Result<UserStatus, ServerError> {
        self.record("get_status", FakeCall::Op("get_status"))?;
        Ok(self.lock().status.clone().unwrap_or(UserStatus {
            user_id: user_id.clone(),
            status: "online".to_string(),
            manual: false,
            last_activity_at: 0,
        }))
    }

    async fn set_status(&self, status: &UserStatus) -> Result<UserStatus, ServerError> {
        self.record(
            "set_status",
            FakeCall::SetStatus {
                status: status.status.clone(),
            },
        )?;
        Ok(status.clone())
    }

    async fn save_preferences(
        &self,
        user_id: &UserId,
        records: &[PreferenceRecord],
    ) -> Result<(), ServerError> {
        let stalled = self.lock().stall_saves;
        self.record(
            "save_preferences",
            FakeCall::SavePreferences {
                user_id: user_id.to_string(),
                records: records.to_vec(),
            },
        )?;
        if stalled {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn delete_preferences(
        &self,
        user_id: &UserId,
        records: &[PreferenceRecord],
    ) -> Result<(), ServerError> {
        self.record(
            "delete_preferences",
            FakeCall::DeletePreferences {
                user_id: user_id.to_string(),
                records: records.to_vec(),
            },
        )
    }

    async fn patch_me(&self, patch: &UserPatch) -> Result<UserProfile, ServerError> {
        self.record("patch_me", FakeCall::Op("patch_me"))?;
        let mut me = profile("me");
        if let Some(nickname) = &patch.nickname {
            me.nickname = nickname.clone();
        }
        if let Some(notify_props) = &patch.notify_props {
            me.notify_props = notify_props.clone();
        }
        Ok(me)
    }

    async fn update_user_roles(&self, _user_id: &UserId, _roles: &str) -> Result<(), ServerError> {
        self.record("update_user_roles", FakeCall::Op("update_user_roles"))
    }

    async fn update_user_active(&self, _user_id: &UserId, _active: bool) -> Result<(), ServerError> {
        self.record("update_user_active", FakeCall::Op("update_user_active"))
    }

    async fn update_user_password(
        &self,
        _user_id: &UserId,
        _current_password: &str,
        _new_password: &str,
    ) -> Result<(), ServerError> {
        self.record("update_user_password", FakeCall::Op("update_user_password"))
    }

    async fn update_user_mfa(
        &self,
        _user_id: &UserId,
        _activate: bool,
        _code: Option<&str>,
    ) -> Result<(), ServerError> {
        self.record("update_user_mfa", FakeCall::Op("update_user_mfa"))
    }

    async fn generate_mfa_secret(&self, _user_id: &UserId) -> Result<MfaSecret, ServerError> {
        self.record("generate_mfa_secret", FakeCall::Op("generate_mfa_secret"))?;
        Ok(MfaSecret {
            secret: "JBSWY3DPEHPK3PXP".to_string(),
            qr_code: String::new(),
        })
    }

    async fn check_user_mfa(&self, _login_id: &str) -> Result<bool, ServerError> {
        self.record("check_user_mfa", FakeCall::Op("check_user_mfa"))?;
        Ok(true)
    }

    async fn verify_user_email(&self, _token: &str) -> Result<(), ServerError> {
        self.record("verify_user_email", FakeCall::Op("verify_user_email"))
    }

    async fn send_verification_email(&self, _email: &str) -> Result<(), ServerError> {
        self.record(
            "send_verification_email",
            FakeCall::Op("send_verification_email"),
        )
    }

    async fn reset_user_password(
        &self,
        _token: &str,
        _new_password: &str,
    ) -> Result<(), ServerError> {
        self.record("reset_user_password", FakeCall::Op("reset_user_password"))
    }

    async fn login(&self, request: &LoginRequest) -> Result<UserProfile, ServerError> {
        self.record(
            "login",
            FakeCall::Login {
                login_id: request.login_id.clone(),
                ldap_only: request.ldap_only,
            },
        )?;
        Ok(profile("me"))
    }

    async fn logout(&self) -> Result<(), ServerError> {
        self.record("logout", FakeCall::Op("logout"))
    }

    async fn create_user(
        &self,
        user: &NewUser,
        invite: &SignupInvite,
    ) -> Result<UserProfile, ServerError> {
        self.record(
            "create_user",
            FakeCall::CreateUser {
                query: invite
                    .query_pairs()
                    .into_iter()
                    .map(|(key, value)| format!("{key}={value}"))
                    .collect(),
            },
        )?;
        Ok(UserProfile::new("new-user", user.username.clone()))
    }

    async fn switch_account_type(
        &self,
        _request: &SwitchAccountRequest,
    ) -> Result<SwitchAccountResponse, ServerError> {
        self.record("switch_account_type", FakeCall::Op("switch_account_type"))?;
        Ok(SwitchAccountResponse {
            follow_link: self.lock().switch_follow_link.clone(),
        })
    }

    async fn get_authorized_oauth_apps(
        &self,
        _user_id: &UserId,
    ) -> Result<Vec<OAuthApp>, ServerError> {
        self.record(
            "get_authorized_oauth_apps",
            FakeCall::Op("get_authorized_oauth_apps"),
        )?;
        Ok(vec![OAuthApp {
            id: "app-1".to_string(),
            name: "Standup bot".to_string(),
            description: String::new(),
            homepage: String::new(),
        }])
    }

    async fn upload_profile_image(&self, user_id: &UserId, image: &[u8]) -> Result<(), ServerError> {
        self.record(
            "upload_profile_image",
            FakeCall::UploadProfileImage {
                user_id: user_id.to_string(),
                bytes: image.len(),
            },
        )
    }

    async fn deauthorize_oauth_app(&self, _app_id: &str) -> Result<(), ServerError> {
        self.record("deauthorize_oauth_app", FakeCall::Op("deauthorize_oauth_app"))
    }
}
