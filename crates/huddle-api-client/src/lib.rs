use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use huddle_client_core::config::{ConfigError, normalize_base_url, resolve_access_token};
use huddle_client_core::error::{ERROR_ID_DECODE_FAILED, ERROR_ID_HTTP, ERROR_ID_REQUEST_FAILED};
use huddle_client_core::{
    AutocompleteResult, Channel, ChannelId, ChannelMember, ChatApiTransport, ClientSettings,
    LoginRequest, MfaSecret, NewUser, OAuthApp, PreferenceRecord, ServerError, SignupInvite,
    SwitchAccountRequest, SwitchAccountResponse, TeamId, TeamMember, TeamUnread, UserId,
    UserPatch, UserProfile, UserSearchOptions, UserStatus,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_TIMEOUT_MS: u64 = 1_500;
pub const DEFAULT_REQUEST_ATTEMPTS: usize = 2;
pub const ENV_REQUEST_TIMEOUT_MS: &str = "HUDDLE_REQUEST_TIMEOUT_MS";
pub const ENV_REQUEST_ATTEMPTS: &str = "HUDDLE_REQUEST_ATTEMPTS";

const TOKEN_HEADER: &str = "Token";
const REQUEST_ID_HEADER: &str = "x-request-id";
const PROFILE_IMAGE_FIELD: &str = "image";
const PROFILE_IMAGE_FILE_NAME: &str = "profile.png";

#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub request_attempts: usize,
    pub access_token: Option<String>,
}

impl ApiClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            request_attempts: DEFAULT_REQUEST_ATTEMPTS,
            access_token: None,
        }
    }

    /// Base url, token, timeout and attempts from `HUDDLE_*`; unparsable
    /// numbers fall back to the defaults.
    pub fn from_env() -> Result<Self, ApiClientError> {
        let (base_url, source) = huddle_client_core::resolve_api_base_url()?;
        tracing::debug!(base_url = %base_url, source, "resolved api base url");
        let mut config = Self::new(base_url);
        config.access_token = resolve_access_token();
        if let Some(timeout_ms) = env_parse::<u64>(ENV_REQUEST_TIMEOUT_MS) {
            config.timeout_ms = timeout_ms;
        }
        if let Some(attempts) = env_parse::<usize>(ENV_REQUEST_ATTEMPTS) {
            config.request_attempts = attempts;
        }
        Ok(config)
    }
}

/// REST v4 implementation of [`ChatApiTransport`].
#[derive(Debug)]
pub struct HuddleApiClient {
    base_url: String,
    timeout: Duration,
    request_attempts: usize,
    token: RwLock<Option<String>>,
    http: reqwest::Client,
}

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("api_client_config:{0}")]
    Config(#[from] ConfigError),
    #[error("api_client_invalid_path")]
    InvalidPath,
    #[error("api_request_failed:{message}")]
    Request { message: String },
    #[error("api_read_failed:{message}")]
    Read { message: String },
    #[error("api_http_{status}:{body}")]
    Http { status: StatusCode, body: String },
    #[error("api_json_decode_failed:{message}")]
    Decode { message: String },
}

impl From<ApiClientError> for ServerError {
    fn from(error: ApiClientError) -> Self {
        match error {
            ApiClientError::Http { status, body } => {
                // the server answers with its own error object; keep its id when present
                match serde_json::from_str::<ServerError>(&body) {
                    Ok(server_error) => server_error.with_status(status.as_u16()),
                    Err(_) => ServerError::new(ERROR_ID_HTTP, body).with_status(status.as_u16()),
                }
            }
            ApiClientError::Decode { message } => ServerError::new(ERROR_ID_DECODE_FAILED, message),
            other => ServerError::new(ERROR_ID_REQUEST_FAILED, other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct SearchBody<'a> {
    term: &'a str,
    #[serde(flatten)]
    options: &'a UserSearchOptions,
}

#[derive(Deserialize)]
struct MfaRequiredResponse {
    #[serde(default)]
    mfa_required: bool,
}

impl HuddleApiClient {
    pub fn new(config: ApiClientConfig) -> Result<Self, ApiClientError> {
        let base_url = normalize_base_url(&config.base_url)?;
        Ok(Self {
            base_url,
            timeout: Duration::from_millis(config.timeout_ms.max(250)),
            request_attempts: config.request_attempts.max(1),
            token: RwLock::new(config.access_token),
            http: reqwest::Client::new(),
        })
    }

    pub fn from_env() -> Result<Self, ApiClientError> {
        Self::new(ApiClientConfig::from_env()?)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    #[must_use]
    pub fn endpoint(&self, path: &str) -> Option<String> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.starts_with('/') {
            Some(format!("{}{}", self.base_url, trimmed))
        } else {
            Some(format!("{}/{}", self.base_url, trimmed))
        }
    }

    #[must_use]
    pub fn me_path() -> &'static str {
        "/api/v4/users/me"
    }

    #[must_use]
    pub fn client_config_path() -> &'static str {
        "/api/v4/config/client?format=old"
    }

    #[must_use]
    pub fn license_path() -> &'static str {
        "/api/v4/license/client?format=old"
    }

    #[must_use]
    pub fn users_path(page: u32, per_page: u32) -> String {
        format!("/api/v4/users?page={page}&per_page={per_page}")
    }

    #[must_use]
    pub fn users_in_team_path(team_id: &TeamId, page: u32, per_page: u32) -> String {
        format!("/api/v4/users?in_team={team_id}&page={page}&per_page={per_page}")
    }

    #[must_use]
    pub fn users_in_channel_path(channel_id: &ChannelId, page: u32, per_page: u32) -> String {
        format!("/api/v4/users?in_channel={channel_id}&page={page}&per_page={per_page}")
    }

    #[must_use]
    pub fn users_without_team_path(page: u32, per_page: u32) -> String {
        format!("/api/v4/users?without_team=1&page={page}&per_page={per_page}")
    }

    #[must_use]
    pub fn users_by_ids_path() -> &'static str {
        "/api/v4/users/ids"
    }

    #[must_use]
    pub fn users_search_path() -> &'static str {
        "/api/v4/users/search"
    }

    #[must_use]
    pub fn users_autocomplete_path() -> &'static str {
        "/api/v4/users/autocomplete"
    }

    #[must_use]
    pub fn team_members_by_ids_path(team_id: &TeamId) -> String {
        format!("/api/v4/teams/{team_id}/members/ids")
    }

    #[must_use]
    pub fn my_team_members_path() -> &'static str {
        "/api/v4/users/me/teams/members"
    }

    #[must_use]
    pub fn my_team_unreads_path() -> &'static str {
        "/api/v4/users/me/teams/unread"
    }

    #[must_use]
    pub fn channel_path(channel_id: &ChannelId) -> String {
        format!("/api/v4/channels/{channel_id}")
    }

    #[must_use]
    pub fn my_channel_member_path(channel_id: &ChannelId) -> String {
        format!("/api/v4/channels/{channel_id}/members/me")
    }

    #[must_use]
    pub fn channel_members_by_ids_path(channel_id: &ChannelId) -> String {
        format!("/api/v4/channels/{channel_id}/members/ids")
    }

    #[must_use]
    pub fn statuses_by_ids_path() -> &'static str {
        "/api/v4/users/status/ids"
    }

    #[must_use]
    pub fn user_status_path(user_id: &UserId) -> String {
        format!("/api/v4/users/{user_id}/status")
    }

    #[must_use]
    pub fn preferences_path(user_id: &UserId) -> String {
        format!("/api/v4/users/{user_id}/preferences")
    }

    #[must_use]
    pub fn delete_preferences_path(user_id: &UserId) -> String {
        format!("/api/v4/users/{user_id}/preferences/delete")
    }

    #[must_use]
    pub fn patch_me_path() -> &'static str {
        "/api/v4/users/me/patch"
    }

    #[must_use]
    pub fn user_roles_path(user_id: &UserId) -> String {
        format!("/api/v4/users/{user_id}/roles")
    }

    #[must_use]
    pub fn user_image_path(user_id: &UserId) -> String {
        format!("/api/v4/users/{user_id}/image")
    }

    #[must_use]
    pub fn user_active_path(user_id: &UserId) -> String {
        format!("/api/v4/users/{user_id}/active")
    }

    #[must_use]
    pub fn user_password_path(user_id: &UserId) -> String {
        format!("/api/v4/users/{user_id}/password")
    }

    #[must_use]
    pub fn user_mfa_path(user_id: &UserId) -> String {
        format!("/api/v4/users/{user_id}/mfa")
    }

    #[must_use]
    pub fn user_mfa_generate_path(user_id: &UserId) -> String {
        format!("/api/v4/users/{user_id}/mfa/generate")
    }

    #[must_use]
    pub fn check_mfa_path() -> &'static str {
        "/api/v4/users/mfa"
    }

    #[must_use]
    pub fn verify_email_path() -> &'static str {
        "/api/v4/users/email/verify"
    }

    #[must_use]
    pub fn send_verification_email_path() -> &'static str {
        "/api/v4/users/email/verify/send"
    }

    #[must_use]
    pub fn reset_password_path() -> &'static str {
        "/api/v4/users/password/reset"
    }

    #[must_use]
    pub fn login_path() -> &'static str {
        "/api/v4/users/login"
    }

    #[must_use]
    pub fn logout_path() -> &'static str {
        "/api/v4/users/logout"
    }

    #[must_use]
    pub fn create_user_path() -> &'static str {
        "/api/v4/users"
    }

    #[must_use]
    pub fn switch_account_path() -> &'static str {
        "/api/v4/users/login/switch"
    }

    #[must_use]
    pub fn authorized_apps_path(user_id: &UserId) -> String {
        format!("/api/v4/users/{user_id}/oauth/apps/authorized")
    }

    #[must_use]
    pub fn deauthorize_app_path() -> &'static str {
        "/oauth/deauthorize"
    }

    pub async fn get_json<T>(&self, path: &str) -> Result<T, ApiClientError>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let response = self.send(Method::GET, path, |request| request).await?;
        decode_json_response(response).await
    }

    pub async fn get_json_with_query<T>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiClientError>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let response = self
            .send(Method::GET, path, |request| request.query(query))
            .await?;
        decode_json_response(response).await
    }

    pub async fn post_json<Req, Res>(&self, path: &str, payload: &Req) -> Result<Res, ApiClientError>
    where
        Req: Serialize + ?Sized,
        Res: for<'de> serde::Deserialize<'de>,
    {
        let response = self
            .send(Method::POST, path, |request| request.json(payload))
            .await?;
        decode_json_response(response).await
    }

    pub async fn put_json<Req, Res>(&self, path: &str, payload: &Req) -> Result<Res, ApiClientError>
    where
        Req: Serialize + ?Sized,
        Res: for<'de> serde::Deserialize<'de>,
    {
        let response = self
            .send(Method::PUT, path, |request| request.json(payload))
            .await?;
        decode_json_response(response).await
    }

    /// For endpoints answering with a bare `{"status":"OK"}`.
    pub async fn send_json_no_content<Req>(
        &self,
        method: Method,
        path: &str,
        payload: &Req,
    ) -> Result<(), ApiClientError>
    where
        Req: Serialize + ?Sized,
    {
        let response = self
            .send(method, path, |request| request.json(payload))
            .await?;
        expect_success(response).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        build: impl Fn(RequestBuilder) -> RequestBuilder,
    ) -> Result<reqwest::Response, ApiClientError> {
        let url = self.endpoint(path).ok_or(ApiClientError::InvalidPath)?;
        let token = self.token();
        let mut last_error: Option<String> = None;

        for attempt in 0..self.request_attempts {
            let mut request = self
                .http
                .request(method.clone(), url.as_str())
                .header(REQUEST_ID_HEADER, format!("req_{}", Uuid::new_v4().simple()))
                .timeout(self.timeout);
            if let Some(token) = token.as_deref() {
                request = request.bearer_auth(token);
            }

            match build(request).send().await {
                Ok(response) => return Ok(response),
                Err(error) => {
                    tracing::debug!(method = %method, path, attempt, error = %error, "huddle api send failed");
                    last_error = Some(error.to_string());
                    if attempt + 1 >= self.request_attempts {
                        break;
                    }
                }
            }
        }

        Err(ApiClientError::Request {
            message: last_error.unwrap_or_else(|| "unknown".to_string()),
        })
    }
}

#[async_trait]
impl ChatApiTransport for HuddleApiClient {
    async fn get_me(&self) -> Result<UserProfile, ServerError> {
        Ok(self.get_json(Self::me_path()).await?)
    }

    async fn get_client_config(&self) -> Result<ClientSettings, ServerError> {
        Ok(self.get_json(Self::client_config_path()).await?)
    }

    async fn get_license_config(&self) -> Result<ClientSettings, ServerError> {
        Ok(self.get_json(Self::license_path()).await?)
    }

    async fn get_profiles(&self, page: u32, per_page: u32) -> Result<Vec<UserProfile>, ServerError> {
        Ok(self.get_json(&Self::users_path(page, per_page)).await?)
    }

    async fn get_profiles_by_ids(&self, user_ids: &[UserId]) -> Result<Vec<UserProfile>, ServerError> {
        Ok(self.post_json(Self::users_by_ids_path(), user_ids).await?)
    }

    async fn get_profiles_in_team(
        &self,
        team_id: &TeamId,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<UserProfile>, ServerError> {
        Ok(self
            .get_json(&Self::users_in_team_path(team_id, page, per_page))
            .await?)
    }

    async fn get_profiles_in_channel(
        &self,
        channel_id: &ChannelId,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<UserProfile>, ServerError> {
        Ok(self
            .get_json(&Self::users_in_channel_path(channel_id, page, per_page))
            .await?)
    }

    async fn get_profiles_without_team(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<UserProfile>, ServerError> {
        Ok(self
            .get_json(&Self::users_without_team_path(page, per_page))
            .await?)
    }

    async fn search_profiles(
        &self,
        term: &str,
        options: &UserSearchOptions,
    ) -> Result<Vec<UserProfile>, ServerError> {
        let body = SearchBody { term, options };
        Ok(self.post_json(Self::users_search_path(), &body).await?)
    }

    async fn autocomplete_users(
        &self,
        name: &str,
        team_id: Option<&TeamId>,
        channel_id: Option<&ChannelId>,
    ) -> Result<AutocompleteResult, ServerError> {
        let mut query = vec![("name", name)];
        if let Some(team_id) = team_id {
            query.push(("in_team", team_id.as_str()));
        }
        if let Some(channel_id) = channel_id {
            query.push(("in_channel", channel_id.as_str()));
        }
        Ok(self
            .get_json_with_query(Self::users_autocomplete_path(), &query)
            .await?)
    }

    async fn get_team_members_by_ids(
        &self,
        team_id: &TeamId,
        user_ids: &[UserId],
    ) -> Result<Vec<TeamMember>, ServerError> {
        Ok(self
            .post_json(&Self::team_members_by_ids_path(team_id), user_ids)
            .await?)
    }

    async fn get_my_team_members(&self) -> Result<Vec<TeamMember>, ServerError> {
        Ok(self.get_json(Self::my_team_members_path()).await?)
    }

    async fn get_my_team_unreads(&self) -> Result<Vec<TeamUnread>, ServerError> {
        Ok(self.get_json(Self::my_team_unreads_path()).await?)
    }

    async fn get_channel(&self, channel_id: &ChannelId) -> Result<Channel, ServerError> {
        Ok(self.get_json(&Self::channel_path(channel_id)).await?)
    }

    async fn get_my_channel_member(&self, channel_id: &ChannelId) -> Result<ChannelMember, ServerError> {
        Ok(self
            .get_json(&Self::my_channel_member_path(channel_id))
            .await?)
    }

    async fn get_channel_members_by_ids(
        &self,
        channel_id: &ChannelId,
        user_ids: &[UserId],
    ) -> Result<Vec<ChannelMember>, ServerError> {
        Ok(self
            .post_json(&Self::channel_members_by_ids_path(channel_id), user_ids)
            .await?)
    }

    async fn get_statuses_by_ids(&self, user_ids: &[UserId]) -> Result<Vec<UserStatus>, ServerError> {
        Ok(self.post_json(Self::statuses_by_ids_path(), user_ids).await?)
    }

    async fn get_status(&self, user_id: &UserId) -> Result<UserStatus, ServerError> {
        Ok(self.get_json(&Self::user_status_path(user_id)).await?)
    }

    async fn set_status(&self, status: &UserStatus) -> Result<UserStatus, ServerError> {
        Ok(self
            .put_json(&Self::user_status_path(&status.user_id), status)
            .await?)
    }

    async fn save_preferences(
        &self,
        user_id: &UserId,
        records: &[PreferenceRecord],
    ) -> Result<(), ServerError> {
        Ok(self
            .send_json_no_content(Method::PUT, &Self::preferences_path(user_id), records)
            .await?)
    }

    async fn delete_preferences(
        &self,
        user_id: &UserId,
        records: &[PreferenceRecord],
    ) -> Result<(), ServerError> {
        Ok(self
            .send_json_no_content(Method::POST, &Self::delete_preferences_path(user_id), records)
            .await?)
    }

    async fn patch_me(&self, patch: &UserPatch) -> Result<UserProfile, ServerError> {
        Ok(self.put_json(Self::patch_me_path(), patch).await?)
    }

    async fn update_user_roles(&self, user_id: &UserId, roles: &str) -> Result<(), ServerError> {
        Ok(self
            .send_json_no_content(
                Method::PUT,
                &Self::user_roles_path(user_id),
                &json!({ "roles": roles }),
            )
            .await?)
    }

    /// Multipart upload; the form is rebuilt for every send attempt.
    async fn upload_profile_image(&self, user_id: &UserId, image: &[u8]) -> Result<(), ServerError> {
        let response = self
            .send(Method::POST, &Self::user_image_path(user_id), |builder| {
                let part = Part::bytes(image.to_vec()).file_name(PROFILE_IMAGE_FILE_NAME);
                builder.multipart(Form::new().part(PROFILE_IMAGE_FIELD, part))
            })
            .await?;
        Ok(expect_success(response).await?)
    }

    async fn update_user_active(&self, user_id: &UserId, active: bool) -> Result<(), ServerError> {
        Ok(self
            .send_json_no_content(
                Method::PUT,
                &Self::user_active_path(user_id),
                &json!({ "active": active }),
            )
            .await?)
    }

    async fn update_user_password(
        &self,
        user_id: &UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ServerError> {
        Ok(self
            .send_json_no_content(
                Method::PUT,
                &Self::user_password_path(user_id),
                &json!({ "current_password": current_password, "new_password": new_password }),
            )
            .await?)
    }

    async fn update_user_mfa(
        &self,
        user_id: &UserId,
        activate: bool,
        code: Option<&str>,
    ) -> Result<(), ServerError> {
        let mut body = json!({ "activate": activate });
        if let Some(code) = code {
            body["code"] = json!(code);
        }
        Ok(self
            .send_json_no_content(Method::PUT, &Self::user_mfa_path(user_id), &body)
            .await?)
    }

    async fn generate_mfa_secret(&self, user_id: &UserId) -> Result<MfaSecret, ServerError> {
        Ok(self
            .post_json(&Self::user_mfa_generate_path(user_id), &json!({}))
            .await?)
    }

    async fn check_user_mfa(&self, login_id: &str) -> Result<bool, ServerError> {
        let response: MfaRequiredResponse = self
            .post_json(Self::check_mfa_path(), &json!({ "login_id": login_id }))
            .await?;
        Ok(response.mfa_required)
    }

    async fn verify_user_email(&self, token: &str) -> Result<(), ServerError> {
        Ok(self
            .send_json_no_content(Method::POST, Self::verify_email_path(), &json!({ "token": token }))
            .await?)
    }

    async fn send_verification_email(&self, email: &str) -> Result<(), ServerError> {
        Ok(self
            .send_json_no_content(
                Method::POST,
                Self::send_verification_email_path(),
                &json!({ "email": email }),
            )
            .await?)
    }

    async fn reset_user_password(&self, token: &str, new_password: &str) -> Result<(), ServerError> {
        Ok(self
            .send_json_no_content(
                Method::POST,
                Self::reset_password_path(),
                &json!({ "token": token, "new_password": new_password }),
            )
            .await?)
    }

    /// Keeps the session token the server returns in the `Token` header.
    async fn login(&self, request: &LoginRequest) -> Result<UserProfile, ServerError> {
        let response = self
            .send(Method::POST, Self::login_path(), |builder| builder.json(request))
            .await?;
        let token = response
            .headers()
            .get(TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let me: UserProfile = decode_json_response(response).await?;
        if token.is_some() {
            self.set_token(token);
        }
        Ok(me)
    }

    async fn logout(&self) -> Result<(), ServerError> {
        let result = self
            .send_json_no_content(Method::POST, Self::logout_path(), &json!({}))
            .await;
        self.set_token(None);
        Ok(result?)
    }

    async fn create_user(
        &self,
        user: &NewUser,
        invite: &SignupInvite,
    ) -> Result<UserProfile, ServerError> {
        let query = invite.query_pairs();
        let response = self
            .send(Method::POST, Self::create_user_path(), |builder| {
                builder.query(&query).json(user)
            })
            .await?;
        Ok(decode_json_response(response).await?)
    }

    async fn switch_account_type(
        &self,
        request: &SwitchAccountRequest,
    ) -> Result<SwitchAccountResponse, ServerError> {
        Ok(self.post_json(Self::switch_account_path(), request).await?)
    }

    async fn get_authorized_oauth_apps(&self, user_id: &UserId) -> Result<Vec<OAuthApp>, ServerError> {
        Ok(self.get_json(&Self::authorized_apps_path(user_id)).await?)
    }

    async fn deauthorize_oauth_app(&self, app_id: &str) -> Result<(), ServerError> {
        Ok(self
            .send_json_no_content(
                Method::POST,
                Self::deauthorize_app_path(),
                &json!({ "client_id": app_id }),
            )
            .await?)
    }
}

pub fn format_http_error(status: StatusCode, body: &[u8]) -> ApiClientError {
    let body = non_empty_string(String::from_utf8_lossy(body).to_string())
        .unwrap_or_else(|| "<empty>".to_string());
    ApiClientError::Http { status, body }
}

async fn read_body(response: reqwest::Response) -> Result<(StatusCode, Vec<u8>), ApiClientError> {
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|error| ApiClientError::Read {
            message: error.to_string(),
        })?;
    if !status.is_success() {
        return Err(format_http_error(status, &bytes));
    }
    Ok((status, bytes.to_vec()))
}

async fn decode_json_response<T>(response: reqwest::Response) -> Result<T, ApiClientError>
where
    T: for<'de> serde::Deserialize<'de>,
{
    let (_, bytes) = read_body(response).await?;
    serde_json::from_slice::<T>(&bytes).map_err(|error| ApiClientError::Decode {
        message: error.to_string(),
    })
}

async fn expect_success(response: reqwest::Response) -> Result<(), ApiClientError> {
    read_body(response).await.map(|_| ())
}

fn non_empty_string(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
}
