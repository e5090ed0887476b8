#![allow(clippy::print_stdout)]

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use huddle_api_client::{ApiClientConfig, HuddleApiClient};
use huddle_client_core::{
    ChannelId, ChatClient, ClientState, LoginOutcome, Scope, SyncLimits, TeamId, UserId,
    UserSearchOptions, VisibilitySyncReport,
};
use serde_json::{Value, json};

#[derive(Parser, Debug)]
#[command(name = "huddle")]
#[command(about = "Huddle chat client: member caching, sidebar sync, account actions")]
pub struct HuddleCli {
    #[command(flatten)]
    pub connection: ConnectionArgs,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Server base url
    #[arg(long, env = "HUDDLE_API_BASE_URL", global = true)]
    pub base_url: Option<String>,
    /// Session token from a previous `huddle login`
    #[arg(long, env = "HUDDLE_ACCESS_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,
    /// Team used when a command needs one and none is given
    #[arg(long, global = true)]
    pub current_team: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and print the session token
    Login(LoginArgs),
    /// Show the signed-in user and server configuration
    Whoami,
    /// Fetch team or channel members not already known locally
    EnsureMembers(EnsureMembersArgs),
    /// Make direct and group conversations with unread activity visible
    SyncSidebar(SyncSidebarArgs),
    /// Search users, optionally outside a team
    SearchUsers(SearchUsersArgs),
    /// Save a theme for one team or for all of them
    SetTheme(SetThemeArgs),
    /// Sign out and drop the session
    Logout,
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    #[arg(long)]
    pub login_id: String,
    #[arg(long, env = "HUDDLE_PASSWORD", hide_env_values = true)]
    pub password: String,
    #[arg(long, default_value = "")]
    pub mfa_token: String,
    /// Authenticate against LDAP only
    #[arg(long)]
    pub ldap: bool,
}

#[derive(Args, Debug)]
pub struct EnsureMembersArgs {
    #[arg(long, conflicts_with = "channel", required_unless_present = "channel")]
    pub team: Option<String>,
    #[arg(long)]
    pub channel: Option<String>,
    #[arg(required = true)]
    pub user_ids: Vec<String>,
}

#[derive(Args, Debug)]
pub struct SyncSidebarArgs {
    /// Direct or group channels to load before syncing
    #[arg(long = "channel")]
    pub channels: Vec<String>,
}

#[derive(Args, Debug)]
pub struct SearchUsersArgs {
    pub term: String,
    #[arg(long)]
    pub team: Option<String>,
    /// Only users that are not members of the team
    #[arg(long)]
    pub not_in_team: bool,
}

#[derive(Args, Debug)]
pub struct SetThemeArgs {
    /// Empty for the global theme
    #[arg(long, default_value = "")]
    pub team: String,
    /// Theme as a JSON object
    pub theme: String,
}

pub async fn run(cli: HuddleCli) -> Result<()> {
    let client = connect(&cli.connection)?;
    match cli.command {
        Commands::Login(args) => login(&client, args).await,
        Commands::Whoami => whoami(&client).await,
        Commands::EnsureMembers(args) => ensure_members(&client, args).await,
        Commands::SyncSidebar(args) => sync_sidebar(&client, args).await,
        Commands::SearchUsers(args) => search_users(&client, args).await,
        Commands::SetTheme(args) => set_theme(&client, args).await,
        Commands::Logout => {
            client.account().logout().await?;
            println!("signed out");
            Ok(())
        }
    }
}

fn connect(connection: &ConnectionArgs) -> Result<ChatClient<HuddleApiClient>> {
    let mut config = ApiClientConfig::from_env()?;
    if let Some(base_url) = &connection.base_url {
        config.base_url.clone_from(base_url);
    }
    if connection.token.is_some() {
        config.access_token.clone_from(&connection.token);
    }
    let transport = HuddleApiClient::new(config)?;
    let state = Arc::new(ClientState::new());
    if let Some(team_id) = &connection.current_team {
        state
            .session
            .update(|session| session.current_team_id = Some(TeamId::from(team_id.as_str())));
    }
    Ok(ChatClient::new(transport, state, SyncLimits::default()))
}

async fn login(client: &ChatClient<HuddleApiClient>, args: LoginArgs) -> Result<()> {
    let account = client.account();
    let outcome = if args.ldap {
        account
            .web_login_by_ldap(&args.login_id, &args.password, &args.mfa_token)
            .await?
    } else {
        account
            .web_login(&args.login_id, &args.password, &args.mfa_token)
            .await?
    };
    match outcome {
        LoginOutcome::MfaRequired => bail!("multi-factor code required; retry with --mfa-token"),
        LoginOutcome::LoggedIn(user) => {
            let token = client
                .transport()
                .token()
                .context("server did not return a session token")?;
            print_json(&json!({
                "user_id": user.id,
                "username": user.username,
                "token": token,
            }))
        }
    }
}

async fn whoami(client: &ChatClient<HuddleApiClient>) -> Result<()> {
    let loaded = client.profiles().load_me_and_config().await?;
    print_json(&json!({
        "user": loaded.me,
        "site_name": loaded.client_config.get("SiteName"),
        "licensed": loaded.license.get("IsLicensed"),
    }))
}

async fn ensure_members(
    client: &ChatClient<HuddleApiClient>,
    args: EnsureMembersArgs,
) -> Result<()> {
    let scope = match (args.team, args.channel) {
        (Some(team), _) => Scope::Team(TeamId::from(team)),
        (None, Some(channel)) => Scope::Channel(ChannelId::from(channel)),
        (None, None) => bail!("either --team or --channel is required"),
    };
    let candidates: Vec<UserId> = args.user_ids.into_iter().map(UserId::from).collect();
    let loaded = client.members().ensure_loaded(&scope, &candidates).await?;
    print_json(&json!({
        "scope": scope.to_string(),
        "requested": candidates.len(),
        "loaded": loaded.keys().collect::<Vec<_>>(),
    }))
}

async fn sync_sidebar(client: &ChatClient<HuddleApiClient>, args: SyncSidebarArgs) -> Result<()> {
    client.profiles().load_me().await?;
    for channel_id in args.channels {
        let channel_id = ChannelId::from(channel_id);
        if let Err(error) = client.gateway().get_channel_and_my_member(&channel_id).await {
            tracing::warn!(channel_id = %channel_id, error_id = %error.id, "channel skipped");
        }
    }
    let report = client.visibility().load_profiles_for_sidebar().await?;
    print_json(&report_json(&report))
}

async fn search_users(client: &ChatClient<HuddleApiClient>, args: SearchUsersArgs) -> Result<()> {
    let team_id = args.team.map(TeamId::from);
    let profiles = if args.not_in_team {
        client
            .profiles()
            .search_users_not_in_team(&args.term, team_id.as_ref(), UserSearchOptions::default())
            .await?
    } else {
        client
            .profiles()
            .search_users(&args.term, team_id.as_ref(), UserSearchOptions::default())
            .await?
    };
    print_json(&serde_json::to_value(profiles)?)
}

async fn set_theme(client: &ChatClient<HuddleApiClient>, args: SetThemeArgs) -> Result<()> {
    let theme: Value = serde_json::from_str(&args.theme).context("theme must be valid JSON")?;
    client.profiles().load_me().await?;
    client.profiles().save_theme(&args.team, &theme).await?;
    println!("theme saved");
    Ok(())
}

fn report_json(report: &VisibilitySyncReport) -> Value {
    json!({
        "newly_visible": report
            .newly_visible
            .iter()
            .map(|record| format!("{}:{}", record.category, record.name))
            .collect::<Vec<_>>(),
        "profiles_requested": report.profiles_requested,
        "channels_loaded": report.channels_loaded,
        "preference_save_error": report.preference_save_error.as_ref().map(|error| error.id.clone()),
        "profile_load_errors": report
            .profile_load_errors
            .iter()
            .map(|error| error.id.clone())
            .collect::<Vec<_>>(),
    })
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
