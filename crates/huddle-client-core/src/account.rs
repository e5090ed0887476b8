use std::sync::Arc;

use crate::error::ServerError;
use crate::gateway::Gateway;
use crate::ids::UserId;
use crate::models::{
    LoginRequest, MfaSecret, NewUser, OAuthApp, SignupInvite, SwitchAccountRequest, UserProfile,
};
use crate::state::SETTING_ENABLE_MFA;
use crate::transport::ChatApiTransport;

pub const SERVICE_EMAIL: &str = "email";
pub const SERVICE_LDAP: &str = "ldap";

/// Result of a password login. A second factor is a normal step, not a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    LoggedIn(UserProfile),
    MfaRequired,
}

impl LoginOutcome {
    #[must_use]
    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            Self::LoggedIn(user) => Some(user),
            Self::MfaRequired => None,
        }
    }
}

/// Sign-in, credentials and authorizations of the signed-in account.
pub struct AccountActions<T> {
    gateway: Arc<Gateway<T>>,
}

impl<T> Clone for AccountActions<T> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
        }
    }
}

impl<T: ChatApiTransport> AccountActions<T> {
    #[must_use]
    pub fn new(gateway: Arc<Gateway<T>>) -> Self {
        Self { gateway }
    }

    /// Moves an LDAP account to email sign-in. Returns the link the user has to
    /// follow to finish; the local session is dropped once the server hands one out.
    pub async fn switch_from_ldap_to_email(
        &self,
        email: &str,
        password: &str,
        mfa_code: &str,
        ldap_password: &str,
    ) -> Result<Option<String>, ServerError> {
        let request = SwitchAccountRequest {
            current_service: SERVICE_LDAP.to_string(),
            new_service: SERVICE_EMAIL.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            mfa_code: mfa_code.to_string(),
            ldap_password: ldap_password.to_string(),
        };
        let response = self.gateway.switch_account_type(&request).await?;
        if response.follow_link.is_some() {
            tracing::info!("account switched to email sign-in");
            self.gateway.state().reset();
        }
        Ok(response.follow_link)
    }

    pub async fn generate_mfa_secret(&self) -> Result<MfaSecret, ServerError> {
        let current_user_id = self.gateway.state().session.require_user_id()?;
        self.gateway.generate_mfa_secret(&current_user_id).await
    }

    pub async fn activate_mfa(&self, code: &str) -> Result<(), ServerError> {
        let current_user_id = self.gateway.state().session.require_user_id()?;
        self.gateway
            .update_user_mfa(&current_user_id, true, Some(code))
            .await
    }

    pub async fn deactivate_mfa(&self) -> Result<(), ServerError> {
        let current_user_id = self.gateway.state().session.require_user_id()?;
        self.gateway
            .update_user_mfa(&current_user_id, false, None)
            .await
    }

    /// Whether `login_id` needs a second factor. Servers without MFA enabled are
    /// never asked.
    pub async fn check_mfa(&self, login_id: &str) -> Result<bool, ServerError> {
        let enabled = self
            .gateway
            .state()
            .session
            .setting(SETTING_ENABLE_MFA)
            .is_some_and(|value| value == "true");
        if !enabled {
            return Ok(false);
        }
        self.gateway.check_user_mfa(login_id).await
    }

    pub async fn update_active(&self, user_id: &UserId, active: bool) -> Result<(), ServerError> {
        self.gateway.update_user_active(user_id, active).await
    }

    pub async fn update_password(
        &self,
        user_id: &UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ServerError> {
        self.gateway
            .update_user_password(user_id, current_password, new_password)
            .await
    }

    pub async fn verify_email(&self, token: &str) -> Result<(), ServerError> {
        self.gateway.verify_user_email(token).await
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), ServerError> {
        self.gateway.reset_user_password(token, new_password).await
    }

    pub async fn resend_verification(&self, email: &str) -> Result<(), ServerError> {
        self.gateway.send_verification_email(email).await
    }

    pub async fn login_by_id(
        &self,
        user_id: &UserId,
        password: &str,
        mfa_token: &str,
    ) -> Result<LoginOutcome, ServerError> {
        self.login(LoginRequest {
            id: Some(user_id.clone()),
            login_id: String::new(),
            password: password.to_string(),
            token: mfa_token.to_string(),
            ldap_only: false,
        })
        .await
    }

    pub async fn web_login(
        &self,
        login_id: &str,
        password: &str,
        mfa_token: &str,
    ) -> Result<LoginOutcome, ServerError> {
        self.login(LoginRequest {
            id: None,
            login_id: login_id.to_string(),
            password: password.to_string(),
            token: mfa_token.to_string(),
            ldap_only: false,
        })
        .await
    }

    pub async fn web_login_by_ldap(
        &self,
        login_id: &str,
        password: &str,
        mfa_token: &str,
    ) -> Result<LoginOutcome, ServerError> {
        self.login(LoginRequest {
            id: None,
            login_id: login_id.to_string(),
            password: password.to_string(),
            token: mfa_token.to_string(),
            ldap_only: true,
        })
        .await
    }

    async fn login(&self, request: LoginRequest) -> Result<LoginOutcome, ServerError> {
        match self.gateway.login(&request).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, ldap_only = request.ldap_only, "signed in");
                Ok(LoginOutcome::LoggedIn(user))
            }
            Err(error) if error.is_mfa_required() => Ok(LoginOutcome::MfaRequired),
            Err(error) => Err(error),
        }
    }

    pub async fn create_user_with_invite(
        &self,
        user: &NewUser,
        invite: &SignupInvite,
    ) -> Result<UserProfile, ServerError> {
        self.gateway.create_user(user, invite).await
    }

    pub async fn get_authorized_apps(&self) -> Result<Vec<OAuthApp>, ServerError> {
        let current_user_id = self.gateway.state().session.require_user_id()?;
        self.gateway.get_authorized_oauth_apps(&current_user_id).await
    }

    pub async fn deauthorize_oauth_app(&self, app_id: &str) -> Result<(), ServerError> {
        self.gateway.deauthorize_oauth_app(app_id).await
    }

    /// Local state is cleared even when the server call fails.
    pub async fn logout(&self) -> Result<(), ServerError> {
        self.gateway.logout().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ERROR_ID_NOT_SIGNED_IN, MFA_REQUIRED_ERROR_ID};
    use crate::state::ClientState;
    use crate::test_support::{FakeCall, FakeTransport};

    fn account(transport: FakeTransport) -> (AccountActions<FakeTransport>, Arc<Gateway<FakeTransport>>) {
        let gateway = Arc::new(Gateway::new(transport, Arc::new(ClientState::new())));
        (AccountActions::new(Arc::clone(&gateway)), gateway)
    }

    fn sign_in(gateway: &Gateway<FakeTransport>) {
        gateway
            .state()
            .session
            .update(|session| session.current_user_id = Some(UserId::from("me")));
    }

    #[tokio::test]
    async fn check_mfa_skips_server_when_disabled() {
        let (account, gateway) = account(FakeTransport::default());

        assert!(!account.check_mfa("alice").await.expect("checked"));
        assert!(gateway.transport().calls().is_empty());
    }

    #[tokio::test]
    async fn check_mfa_asks_server_when_enabled() {
        let (account, gateway) = account(FakeTransport::default());
        gateway.state().session.update(|session| {
            session
                .client_config
                .insert(SETTING_ENABLE_MFA.to_string(), "true".to_string());
        });

        assert!(account.check_mfa("alice").await.expect("checked"));
        assert_eq!(
            gateway.transport().calls(),
            vec![FakeCall::Op("check_user_mfa")]
        );
    }

    #[tokio::test]
    async fn web_login_records_signed_in_user() {
        let (account, gateway) = account(FakeTransport::default());

        let outcome = account
            .web_login("alice@example.com", "secret", "")
            .await
            .expect("logged in");

        assert_eq!(outcome.user().map(|user| user.id.as_str()), Some("me"));
        assert_eq!(
            gateway.state().session.current_user_id(),
            Some(UserId::from("me"))
        );
        assert_eq!(
            gateway.transport().calls(),
            vec![FakeCall::Login {
                login_id: "alice@example.com".to_string(),
                ldap_only: false,
            }]
        );
    }

    #[tokio::test]
    async fn ldap_login_sets_ldap_only() {
        let (account, gateway) = account(FakeTransport::default());

        account
            .web_login_by_ldap("alice", "secret", "")
            .await
            .expect("logged in");

        assert_eq!(
            gateway.transport().calls(),
            vec![FakeCall::Login {
                login_id: "alice".to_string(),
                ldap_only: true,
            }]
        );
    }

    #[tokio::test]
    async fn mfa_required_is_an_outcome() {
        let transport = FakeTransport::default();
        transport.fail("login", MFA_REQUIRED_ERROR_ID);
        let (account, gateway) = account(transport);

        let outcome = account
            .web_login("alice", "secret", "")
            .await
            .expect("mfa outcome");

        assert_eq!(outcome, LoginOutcome::MfaRequired);
        assert_eq!(gateway.state().session.current_user_id(), None);
    }

    #[tokio::test]
    async fn other_login_failures_propagate() {
        let transport = FakeTransport::default();
        transport.fail("login", "api.user.login.invalid_credentials");
        let (account, _gateway) = account(transport);

        let error = account
            .login_by_id(&UserId::from("u1"), "wrong", "")
            .await
            .expect_err("login failed");
        assert_eq!(error.id, "api.user.login.invalid_credentials");
    }

    #[tokio::test]
    async fn mfa_actions_require_sign_in() {
        let (account, gateway) = account(FakeTransport::default());

        let error = account.activate_mfa("123456").await.expect_err("signed out");
        assert_eq!(error.id, ERROR_ID_NOT_SIGNED_IN);
        assert!(gateway.transport().calls().is_empty());
    }

    #[tokio::test]
    async fn activate_mfa_updates_cached_profile() {
        let (account, gateway) = account(FakeTransport::default());
        sign_in(&gateway);
        gateway
            .state()
            .cache
            .insert_profiles([crate::test_support::profile("me")]);

        account.activate_mfa("123456").await.expect("activated");

        assert_eq!(
            gateway
                .state()
                .cache
                .profile(&UserId::from("me"))
                .map(|profile| profile.mfa_active),
            Some(true)
        );
    }

    #[tokio::test]
    async fn switch_with_follow_link_drops_session() {
        let transport = FakeTransport::default();
        transport.set_switch_follow_link("/login?extra=signin_change");
        let (account, gateway) = account(transport);
        sign_in(&gateway);

        let link = account
            .switch_from_ldap_to_email("alice@example.com", "new", "", "old")
            .await
            .expect("switched");

        assert_eq!(link.as_deref(), Some("/login?extra=signin_change"));
        assert_eq!(gateway.state().session.current_user_id(), None);
    }

    #[tokio::test]
    async fn switch_without_follow_link_keeps_session() {
        let (account, gateway) = account(FakeTransport::default());
        sign_in(&gateway);

        let link = account
            .switch_from_ldap_to_email("alice@example.com", "new", "", "old")
            .await
            .expect("switched");

        assert_eq!(link, None);
        assert_eq!(
            gateway.state().session.current_user_id(),
            Some(UserId::from("me"))
        );
    }

    #[tokio::test]
    async fn logout_clears_state_even_on_failure() {
        let transport = FakeTransport::default();
        transport.fail("logout", "api.user.logout.app_error");
        let (account, gateway) = account(transport);
        sign_in(&gateway);

        assert!(account.logout().await.is_err());
        assert_eq!(gateway.state().session.current_user_id(), None);
    }

    #[tokio::test]
    async fn authorized_apps_are_listed_for_current_user() {
        let (account, gateway) = account(FakeTransport::default());
        sign_in(&gateway);

        let apps = account.get_authorized_apps().await.expect("apps");
        assert_eq!(apps.len(), 1);
        account
            .deauthorize_oauth_app(&apps[0].id)
            .await
            .expect("deauthorized");
        assert_eq!(
            gateway.transport().calls(),
            vec![
                FakeCall::Op("get_authorized_oauth_apps"),
                FakeCall::Op("deauthorize_oauth_app"),
            ]
        );
    }

    #[tokio::test]
    async fn credential_flows_reach_their_endpoints() {
        let (account, gateway) = account(FakeTransport::default());
        let user_id = UserId::from("u1");

        account
            .update_password(&user_id, "old", "new")
            .await
            .expect("password");
        account.update_active(&user_id, false).await.expect("active");
        account.verify_email("verify-token").await.expect("verify");
        account
            .resend_verification("alice@example.com")
            .await
            .expect("resend");
        account
            .reset_password("reset-token", "new")
            .await
            .expect("reset");

        assert_eq!(
            gateway.transport().calls(),
            vec![
                FakeCall::Op("update_user_password"),
                FakeCall::Op("update_user_active"),
                FakeCall::Op("verify_user_email"),
                FakeCall::Op("send_verification_email"),
                FakeCall::Op("reset_user_password"),
            ]
        );
    }

    #[tokio::test]
    async fn invited_user_is_cached() {
        let (account, gateway) = account(FakeTransport::default());
        let new_user = NewUser {
            email: "bob@example.com".to_string(),
            username: "bob".to_string(),
            password: "secret".to_string(),
            first_name: None,
            last_name: None,
            locale: None,
        };

        let created = account
            .create_user_with_invite(
                &new_user,
                &SignupInvite {
                    invite_id: Some("invite-1".to_string()),
                    ..SignupInvite::default()
                },
            )
            .await
            .expect("created");

        assert_eq!(created.username, "bob");
        assert!(gateway.state().cache.has_profile(&created.id));
        assert_eq!(
            gateway.transport().calls(),
            vec![FakeCall::CreateUser {
                query: vec!["iid=invite-1".to_string()],
            }]
        );
    }

    #[tokio::test]
    async fn emailed_invite_carries_data_and_hash() {
        let (account, gateway) = account(FakeTransport::default());
        let new_user = NewUser {
            email: "carol@example.com".to_string(),
            username: "carol".to_string(),
            password: "secret".to_string(),
            first_name: None,
            last_name: None,
            locale: None,
        };
        let invite = SignupInvite {
            token: None,
            data: Some("{\"teamId\":\"t1\"}".to_string()),
            email_hash: Some("abc123".to_string()),
            invite_id: Some(String::new()),
        };

        account
            .create_user_with_invite(&new_user, &invite)
            .await
            .expect("created");

        assert_eq!(
            gateway.transport().calls(),
            vec![FakeCall::CreateUser {
                query: vec!["d={\"teamId\":\"t1\"}".to_string(), "h=abc123".to_string()],
            }]
        );
    }
}
