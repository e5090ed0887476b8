//! Cache-gated batch fetching of team and channel members.
//!
//! Every entry point computes the ids missing from the [`LocalCache`] for a
//! scope, and only that deduplicated set goes over the wire in one request. An
//! empty missing set succeeds immediately without touching the network.
//! Overlapping concurrent calls are not coalesced; each issues its own request.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::cache::LocalCache;
use crate::error::ServerError;
use crate::gateway::Gateway;
use crate::ids::{ChannelId, Scope, TeamId, UserId};
use crate::models::{ChannelMember, TeamMember, UserProfile};
use crate::transport::ChatApiTransport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeMember {
    Team(TeamMember),
    Channel(ChannelMember),
}

/// Members fetched by one call, keyed by user id. Empty when nothing was missing.
pub type LoadedMembers = BTreeMap<UserId, ScopeMember>;

/// Deduplicated ids not yet known as active members of `scope`.
#[must_use]
pub fn missing_members(cache: &LocalCache, scope: &Scope, candidates: &[UserId]) -> BTreeSet<UserId> {
    candidates
        .iter()
        .filter(|user_id| !cache.has_active_member(scope, user_id))
        .cloned()
        .collect()
}

pub struct BatchFetchCoordinator<T> {
    gateway: Arc<Gateway<T>>,
}

impl<T> Clone for BatchFetchCoordinator<T> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
        }
    }
}

impl<T: ChatApiTransport> BatchFetchCoordinator<T> {
    #[must_use]
    pub fn new(gateway: Arc<Gateway<T>>) -> Self {
        Self { gateway }
    }

    pub async fn ensure_loaded(
        &self,
        scope: &Scope,
        candidates: &[UserId],
    ) -> Result<LoadedMembers, ServerError> {
        let missing = missing_members(&self.gateway.state().cache, scope, candidates);
        if missing.is_empty() {
            tracing::debug!(scope = %scope, candidates = candidates.len(), "all members cached");
            return Ok(LoadedMembers::new());
        }

        let user_ids: Vec<UserId> = missing.into_iter().collect();
        tracing::debug!(scope = %scope, missing = user_ids.len(), "loading missing members");
        match scope {
            Scope::Team(team_id) => {
                let members = self
                    .gateway
                    .get_team_members_by_ids(team_id, &user_ids)
                    .await?;
                Ok(members
                    .into_iter()
                    .map(|member| (member.user_id.clone(), ScopeMember::Team(member)))
                    .collect())
            }
            Scope::Channel(channel_id) => {
                let members = self
                    .gateway
                    .get_channel_members_by_ids(channel_id, &user_ids)
                    .await?;
                Ok(members
                    .into_iter()
                    .map(|member| (member.user_id.clone(), ScopeMember::Channel(member)))
                    .collect())
            }
        }
    }

    /// Team defaults to the session's current team.
    pub async fn load_team_members_for_profiles(
        &self,
        profiles: &[UserProfile],
        team_id: Option<&TeamId>,
    ) -> Result<LoadedMembers, ServerError> {
        let team_id = self.gateway.state().session.resolve_team_id(team_id)?;
        self.ensure_loaded(&Scope::Team(team_id), &profile_ids(profiles))
            .await
    }

    /// Channel defaults to the session's current channel.
    pub async fn load_channel_members_for_profiles(
        &self,
        profiles: &[UserProfile],
        channel_id: Option<&ChannelId>,
    ) -> Result<LoadedMembers, ServerError> {
        let channel_id = self
            .gateway
            .state()
            .session
            .resolve_channel_id(channel_id)?;
        self.ensure_loaded(&Scope::Channel(channel_id), &profile_ids(profiles))
            .await
    }

    pub async fn load_channel_members_for_profile_map(
        &self,
        profiles: &BTreeMap<UserId, UserProfile>,
        channel_id: Option<&ChannelId>,
    ) -> Result<LoadedMembers, ServerError> {
        let channel_id = self
            .gateway
            .state()
            .session
            .resolve_channel_id(channel_id)?;
        let user_ids: Vec<UserId> = profiles.keys().cloned().collect();
        self.ensure_loaded(&Scope::Channel(channel_id), &user_ids)
            .await
    }

    /// Team members first; channel members only once the team step succeeded.
    pub async fn load_team_and_channel_members_for_profiles(
        &self,
        profiles: &[UserProfile],
        team_id: Option<&TeamId>,
        channel_id: Option<&ChannelId>,
    ) -> Result<LoadedMembers, ServerError> {
        self.load_team_members_for_profiles(profiles, team_id)
            .await?;
        self.load_channel_members_for_profiles(profiles, channel_id)
            .await
    }

    pub async fn load_profiles_and_team_members(
        &self,
        page: u32,
        per_page: u32,
        team_id: Option<&TeamId>,
    ) -> Result<LoadedMembers, ServerError> {
        let team_id = self.gateway.state().session.resolve_team_id(team_id)?;
        let profiles = self
            .gateway
            .get_profiles_in_team(&team_id, page, per_page)
            .await?;
        let loaded = self
            .load_team_members_for_profiles(&profiles, Some(&team_id))
            .await;
        self.load_statuses_for_profiles(&profile_ids(&profiles))
            .await;
        loaded
    }

    pub async fn load_profiles_and_team_members_and_channel_members(
        &self,
        page: u32,
        per_page: u32,
        team_id: Option<&TeamId>,
        channel_id: Option<&ChannelId>,
    ) -> Result<LoadedMembers, ServerError> {
        let session = &self.gateway.state().session;
        let team_id = session.resolve_team_id(team_id)?;
        let channel_id = session.resolve_channel_id(channel_id)?;
        let profiles = self
            .gateway
            .get_profiles_in_channel(&channel_id, page, per_page)
            .await?;
        self.load_team_members_for_profiles(&profiles, Some(&team_id))
            .await?;
        let loaded = self
            .load_channel_members_for_profiles(&profiles, Some(&channel_id))
            .await;
        self.load_statuses_for_profiles(&profile_ids(&profiles))
            .await;
        loaded
    }

    /// One page of the profiles in a scope; the gateway records them as members of it.
    pub async fn load_profiles_in_scope(
        &self,
        scope: &Scope,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<UserProfile>, ServerError> {
        match scope {
            Scope::Team(team_id) => {
                self.gateway
                    .get_profiles_in_team(team_id, page, per_page)
                    .await
            }
            Scope::Channel(channel_id) => {
                self.gateway
                    .get_profiles_in_channel(channel_id, page, per_page)
                    .await
            }
        }
    }

    /// Fetches only the profiles not already cached. Returns what was fetched.
    pub async fn get_missing_profiles(
        &self,
        user_ids: &[UserId],
    ) -> Result<Vec<UserProfile>, ServerError> {
        let cache = &self.gateway.state().cache;
        let missing: BTreeSet<UserId> = user_ids
            .iter()
            .filter(|user_id| !cache.has_profile(user_id))
            .cloned()
            .collect();
        if missing.is_empty() {
            return Ok(Vec::new());
        }
        let missing: Vec<UserId> = missing.into_iter().collect();
        self.gateway.get_profiles_by_ids(&missing).await
    }

    /// Presence is best effort: a failure is logged by the gateway and dropped.
    pub async fn load_statuses_for_profiles(&self, user_ids: &[UserId]) {
        if user_ids.is_empty() {
            return;
        }
        let _ = self.gateway.get_statuses_by_ids(user_ids).await;
    }
}

fn profile_ids(profiles: &[UserProfile]) -> Vec<UserId> {
    profiles.iter().map(|profile| profile.id.clone()).collect()
}
