use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::ids::{ChannelId, Scope, TeamId, UserId};
use crate::models::{
    Channel, ChannelMember, ChannelType, TeamMember, TeamUnread, UserProfile, UserStatus,
};

#[derive(Debug, Default)]
struct UserEntries {
    profiles: HashMap<UserId, UserProfile>,
    statuses: HashMap<UserId, UserStatus>,
    in_channel: HashMap<ChannelId, HashSet<UserId>>,
    in_team: HashMap<TeamId, HashSet<UserId>>,
}

#[derive(Debug, Default)]
struct TeamEntries {
    members: HashMap<TeamId, HashMap<UserId, TeamMember>>,
    my_members: HashMap<TeamId, TeamMember>,
    unreads: HashMap<TeamId, TeamUnread>,
}

#[derive(Debug, Default)]
struct ChannelEntries {
    channels: HashMap<ChannelId, Channel>,
    members: HashMap<ChannelId, HashMap<UserId, ChannelMember>>,
    my_members: HashMap<ChannelId, ChannelMember>,
}

/// Read-through cache of entities fetched during this session.
///
/// Only the gateway writes here, and only with data the server returned. All
/// writes are merges, so applying the same fetch result twice is harmless.
#[derive(Debug, Default)]
pub struct LocalCache {
    users: RwLock<UserEntries>,
    teams: RwLock<TeamEntries>,
    channels: RwLock<ChannelEntries>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl LocalCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Membership test used to gate batch fetches.
    #[must_use]
    pub fn has_active_member(&self, scope: &Scope, user_id: &UserId) -> bool {
        match scope {
            Scope::Team(team_id) => self.has_active_member_in_team(team_id, user_id),
            Scope::Channel(channel_id) => self.has_active_member_in_channel(channel_id, user_id),
        }
    }

    #[must_use]
    pub fn has_active_member_in_team(&self, team_id: &TeamId, user_id: &UserId) -> bool {
        read(&self.teams)
            .members
            .get(team_id)
            .and_then(|members| members.get(user_id))
            .is_some_and(|member| member.delete_at == 0)
    }

    #[must_use]
    pub fn has_active_member_in_channel(&self, channel_id: &ChannelId, user_id: &UserId) -> bool {
        read(&self.channels)
            .members
            .get(channel_id)
            .is_some_and(|members| members.contains_key(user_id))
    }

    #[must_use]
    pub fn has_profile(&self, user_id: &UserId) -> bool {
        read(&self.users).profiles.contains_key(user_id)
    }

    #[must_use]
    pub fn profile(&self, user_id: &UserId) -> Option<UserProfile> {
        read(&self.users).profiles.get(user_id).cloned()
    }

    #[must_use]
    pub fn status(&self, user_id: &UserId) -> Option<UserStatus> {
        read(&self.users).statuses.get(user_id).cloned()
    }

    #[must_use]
    pub fn user_ids_in_channel(&self, channel_id: &ChannelId) -> HashSet<UserId> {
        read(&self.users)
            .in_channel
            .get(channel_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Profiles known to be in the channel. Ids without a cached profile are skipped.
    #[must_use]
    pub fn profiles_in_channel(&self, channel_id: &ChannelId) -> Vec<UserProfile> {
        let users = read(&self.users);
        users
            .in_channel
            .get(channel_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| users.profiles.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn user_ids_in_team(&self, team_id: &TeamId) -> HashSet<UserId> {
        read(&self.users)
            .in_team
            .get(team_id)
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn team_member(&self, team_id: &TeamId, user_id: &UserId) -> Option<TeamMember> {
        read(&self.teams)
            .members
            .get(team_id)
            .and_then(|members| members.get(user_id))
            .cloned()
    }

    #[must_use]
    pub fn my_team_members(&self) -> Vec<TeamMember> {
        read(&self.teams).my_members.values().cloned().collect()
    }

    #[must_use]
    pub fn team_unread(&self, team_id: &TeamId) -> Option<TeamUnread> {
        read(&self.teams).unreads.get(team_id).cloned()
    }

    #[must_use]
    pub fn channel(&self, channel_id: &ChannelId) -> Option<Channel> {
        read(&self.channels).channels.get(channel_id).cloned()
    }

    #[must_use]
    pub fn channel_by_name(&self, name: &str) -> Option<Channel> {
        read(&self.channels)
            .channels
            .values()
            .find(|channel| channel.name == name)
            .cloned()
    }

    /// Cached channels of one type, ordered by id so sync passes are deterministic.
    #[must_use]
    pub fn channels_of_type(&self, kind: ChannelType) -> Vec<Channel> {
        let mut channels: Vec<Channel> = read(&self.channels)
            .channels
            .values()
            .filter(|channel| channel.kind == kind)
            .cloned()
            .collect();
        channels.sort_by(|a, b| a.id.cmp(&b.id));
        channels
    }

    #[must_use]
    pub fn my_channel_member(&self, channel_id: &ChannelId) -> Option<ChannelMember> {
        read(&self.channels).my_members.get(channel_id).cloned()
    }

    pub fn insert_profiles(&self, profiles: impl IntoIterator<Item = UserProfile>) {
        let mut users = write(&self.users);
        for profile in profiles {
            users.profiles.insert(profile.id.clone(), profile);
        }
    }

    pub fn insert_statuses(&self, statuses: impl IntoIterator<Item = UserStatus>) {
        let mut users = write(&self.users);
        for status in statuses {
            users.statuses.insert(status.user_id.clone(), status);
        }
    }

    pub fn add_user_ids_to_channel<'a>(
        &self,
        channel_id: &ChannelId,
        user_ids: impl IntoIterator<Item = &'a UserId>,
    ) {
        let mut users = write(&self.users);
        users
            .in_channel
            .entry(channel_id.clone())
            .or_default()
            .extend(user_ids.into_iter().cloned());
    }

    pub fn add_user_ids_to_team<'a>(
        &self,
        team_id: &TeamId,
        user_ids: impl IntoIterator<Item = &'a UserId>,
    ) {
        let mut users = write(&self.users);
        users
            .in_team
            .entry(team_id.clone())
            .or_default()
            .extend(user_ids.into_iter().cloned());
    }

    pub fn insert_team_members(&self, members: impl IntoIterator<Item = TeamMember>) {
        let mut teams = write(&self.teams);
        for member in members {
            teams
                .members
                .entry(member.team_id.clone())
                .or_default()
                .insert(member.user_id.clone(), member);
        }
    }

    pub fn set_my_team_members(&self, members: impl IntoIterator<Item = TeamMember>) {
        let mut teams = write(&self.teams);
        for member in members {
            teams.my_members.insert(member.team_id.clone(), member.clone());
            teams
                .members
                .entry(member.team_id.clone())
                .or_default()
                .insert(member.user_id.clone(), member);
        }
    }

    pub fn insert_team_unreads(&self, unreads: impl IntoIterator<Item = TeamUnread>) {
        let mut teams = write(&self.teams);
        for unread in unreads {
            teams.unreads.insert(unread.team_id.clone(), unread);
        }
    }

    pub fn insert_channel(&self, channel: Channel) {
        write(&self.channels)
            .channels
            .insert(channel.id.clone(), channel);
    }

    pub fn insert_channel_members(&self, members: impl IntoIterator<Item = ChannelMember>) {
        let mut channels = write(&self.channels);
        for member in members {
            channels
                .members
                .entry(member.channel_id.clone())
                .or_default()
                .insert(member.user_id.clone(), member);
        }
    }

    pub fn set_my_channel_member(&self, member: ChannelMember) {
        let mut channels = write(&self.channels);
        channels
            .members
            .entry(member.channel_id.clone())
            .or_default()
            .insert(member.user_id.clone(), member.clone());
        channels.my_members.insert(member.channel_id.clone(), member);
    }

    pub fn clear(&self) {
        *write(&self.users) = UserEntries::default();
        *write(&self.teams) = TeamEntries::default();
        *write(&self.channels) = ChannelEntries::default();
    }
}
