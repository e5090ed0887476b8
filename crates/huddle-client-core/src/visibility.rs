//! Keeps direct and group conversations with unread activity visible in the sidebar.
//!
//! Each pass classifies the cached conversations, flips the visibility preference
//! of the newly eligible ones in a single batched save, and loads the participant
//! profiles the sidebar needs to render them.

use std::sync::Arc;

use futures::future::join_all;

use crate::config::SyncLimits;
use crate::coordinator::BatchFetchCoordinator;
use crate::error::ServerError;
use crate::gateway::Gateway;
use crate::ids::{ChannelId, Scope, UserId, direct_channel_name, direct_channel_peer};
use crate::models::{Channel, ChannelMember, ChannelType};
use crate::preferences::{
    CATEGORY_DIRECT_CHANNEL_SHOW, CATEGORY_GROUP_CHANNEL_SHOW, PreferenceRecord,
};
use crate::transport::ChatApiTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    PendingVisible,
    Visible,
}

/// A direct conversation only surfaces once somebody mentioned the user in it.
#[must_use]
pub fn direct_visibility(already_visible: bool, member: Option<&ChannelMember>) -> Visibility {
    if already_visible {
        return Visibility::Visible;
    }
    match member {
        Some(member) if member.mention_count > 0 => Visibility::PendingVisible,
        _ => Visibility::Hidden,
    }
}

/// A group conversation surfaces on any unread message, mentioned or not.
#[must_use]
pub fn group_visibility(
    already_visible: bool,
    member: Option<&ChannelMember>,
    channel: &Channel,
) -> Visibility {
    if already_visible {
        return Visibility::Visible;
    }
    match member {
        None => Visibility::Hidden,
        Some(member)
            if member.mention_count == 0 && member.msg_count >= channel.total_msg_count =>
        {
            Visibility::Hidden
        }
        Some(_) => Visibility::PendingVisible,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibilitySyncReport {
    /// Preference records saved in this pass, all in one request.
    pub newly_visible: Vec<PreferenceRecord>,
    /// Direct-conversation peers whose profiles had to be fetched.
    pub profiles_requested: Vec<UserId>,
    /// Group conversations whose member profiles were loaded.
    pub channels_loaded: Vec<ChannelId>,
    /// The save is fire-and-forget for the sync itself; its failure is only reported here.
    pub preference_save_error: Option<ServerError>,
    pub profile_load_errors: Vec<ServerError>,
}

impl VisibilitySyncReport {
    fn merge(&mut self, other: Self) {
        self.newly_visible.extend(other.newly_visible);
        self.profiles_requested.extend(other.profiles_requested);
        self.channels_loaded.extend(other.channels_loaded);
        if self.preference_save_error.is_none() {
            self.preference_save_error = other.preference_save_error;
        }
        self.profile_load_errors.extend(other.profile_load_errors);
    }
}

pub struct VisibilitySync<T> {
    gateway: Arc<Gateway<T>>,
    members: BatchFetchCoordinator<T>,
    limits: SyncLimits,
}

impl<T> Clone for VisibilitySync<T> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            members: self.members.clone(),
            limits: self.limits,
        }
    }
}

impl<T: ChatApiTransport> VisibilitySync<T> {
    #[must_use]
    pub fn new(gateway: Arc<Gateway<T>>, limits: SyncLimits) -> Self {
        let members = BatchFetchCoordinator::new(Arc::clone(&gateway));
        Self {
            gateway,
            members,
            limits,
        }
    }

    pub async fn load_profiles_for_sidebar(&self) -> Result<VisibilitySyncReport, ServerError> {
        let (direct, group) =
            futures::join!(self.load_profiles_for_dm(), self.load_profiles_for_gm());
        let mut report = direct?;
        report.merge(group?);
        Ok(report)
    }

    pub async fn load_profiles_for_dm(&self) -> Result<VisibilitySyncReport, ServerError> {
        let state = self.gateway.state();
        let current_user_id = state.session.require_user_id()?;

        let mut new_preferences = Vec::new();
        let mut profiles_to_load = Vec::new();
        let mut peer_ids = Vec::new();

        for channel in state.cache.channels_of_type(ChannelType::Direct) {
            let Some(peer_id) = direct_channel_peer(&channel.name, &current_user_id) else {
                continue;
            };
            let already_visible =
                state
                    .preferences
                    .get_bool(CATEGORY_DIRECT_CHANNEL_SHOW, peer_id.as_str(), false);
            let member = state.cache.my_channel_member(&channel.id);
            match direct_visibility(already_visible, member.as_ref()) {
                Visibility::Hidden => continue,
                Visibility::PendingVisible => new_preferences.push(PreferenceRecord::visible(
                    current_user_id.clone(),
                    CATEGORY_DIRECT_CHANNEL_SHOW,
                    peer_id.as_str(),
                )),
                Visibility::Visible => {}
            }

            if !state.cache.has_profile(&peer_id) && !profiles_to_load.contains(&peer_id) {
                profiles_to_load.push(peer_id.clone());
            }
            peer_ids.push(peer_id);
        }

        let (preference_save_error, profiles) = futures::join!(
            self.persist_visible(&current_user_id, &new_preferences),
            async {
                if profiles_to_load.is_empty() {
                    return Ok(Vec::new());
                }
                self.gateway.get_profiles_by_ids(&profiles_to_load).await
            }
        );

        let mut report = VisibilitySyncReport {
            newly_visible: new_preferences,
            profiles_requested: profiles_to_load,
            preference_save_error,
            ..VisibilitySyncReport::default()
        };
        match profiles {
            Ok(_) => self.populate_direct_channels(&current_user_id, &peer_ids),
            Err(error) => report.profile_load_errors.push(error),
        }
        Ok(report)
    }

    pub async fn load_profiles_for_gm(&self) -> Result<VisibilitySyncReport, ServerError> {
        let state = self.gateway.state();
        let current_user_id = state.session.require_user_id()?;

        let mut new_preferences = Vec::new();
        let mut channels_to_load = Vec::new();

        for channel in state.cache.channels_of_type(ChannelType::Group) {
            if state.cache.profiles_in_channel(&channel.id).len() >= self.limits.min_users_in_gm {
                continue;
            }

            let already_visible = state.preferences.get_bool(
                CATEGORY_GROUP_CHANNEL_SHOW,
                channel.id.as_str(),
                false,
            );
            let member = state.cache.my_channel_member(&channel.id);
            match group_visibility(already_visible, member.as_ref(), &channel) {
                Visibility::Hidden => continue,
                Visibility::PendingVisible => new_preferences.push(PreferenceRecord::visible(
                    current_user_id.clone(),
                    CATEGORY_GROUP_CHANNEL_SHOW,
                    channel.id.as_str(),
                )),
                Visibility::Visible => {}
            }
            channels_to_load.push(channel.id);
        }

        let max_users = self.limits.max_users_in_gm;
        let (preference_save_error, loads) = futures::join!(
            self.persist_visible(&current_user_id, &new_preferences),
            join_all(channels_to_load.iter().map(|channel_id| {
                let scope = Scope::Channel(channel_id.clone());
                async move { self.members.load_profiles_in_scope(&scope, 0, max_users).await }
            }))
        );

        let mut report = VisibilitySyncReport {
            newly_visible: new_preferences,
            preference_save_error,
            ..VisibilitySyncReport::default()
        };
        for (channel_id, loaded) in channels_to_load.into_iter().zip(loads) {
            match loaded {
                Ok(_) => report.channels_loaded.push(channel_id),
                Err(error) => report.profile_load_errors.push(error),
            }
        }
        Ok(report)
    }

    /// Makes a direct conversation visible as soon as it receives activity.
    ///
    /// A channel that is not a direct conversation of the current user is a no-op.
    pub async fn load_new_dm_if_needed(
        &self,
        channel_id: &ChannelId,
    ) -> Result<Option<VisibilitySyncReport>, ServerError> {
        let channel = self.resolve_channel(channel_id).await?;
        let state = self.gateway.state();
        let current_user_id = state.session.require_user_id()?;
        let Some(peer_id) = direct_channel_peer(&channel.name, &current_user_id) else {
            tracing::debug!(channel_id = %channel_id, "not a direct channel, nothing to show");
            return Ok(None);
        };

        if state
            .preferences
            .get_bool(CATEGORY_DIRECT_CHANNEL_SHOW, peer_id.as_str(), false)
        {
            return Ok(None);
        }

        let record = PreferenceRecord::visible(
            current_user_id.clone(),
            CATEGORY_DIRECT_CHANNEL_SHOW,
            peer_id.as_str(),
        );
        let records = [record];
        let (preference_save_error, report) = futures::join!(
            self.persist_visible(&current_user_id, &records),
            self.load_profiles_for_dm()
        );
        let mut report = report?;
        if report.preference_save_error.is_none() {
            report.preference_save_error = preference_save_error;
        }
        Ok(Some(report))
    }

    /// Makes a group conversation visible as soon as it receives activity.
    pub async fn load_new_gm_if_needed(
        &self,
        channel_id: &ChannelId,
    ) -> Result<Option<VisibilitySyncReport>, ServerError> {
        self.resolve_channel(channel_id).await?;
        let state = self.gateway.state();
        let current_user_id = state.session.require_user_id()?;

        if state
            .preferences
            .get_bool(CATEGORY_GROUP_CHANNEL_SHOW, channel_id.as_str(), false)
        {
            return Ok(None);
        }

        let record = PreferenceRecord::visible(
            current_user_id.clone(),
            CATEGORY_GROUP_CHANNEL_SHOW,
            channel_id.as_str(),
        );
        let records = [record];
        let (preference_save_error, report) = futures::join!(
            self.persist_visible(&current_user_id, &records),
            self.load_profiles_for_gm()
        );
        let mut report = report?;
        if report.preference_save_error.is_none() {
            report.preference_save_error = preference_save_error;
        }
        Ok(Some(report))
    }

    async fn resolve_channel(&self, channel_id: &ChannelId) -> Result<Channel, ServerError> {
        if let Some(channel) = self.gateway.state().cache.channel(channel_id) {
            return Ok(channel);
        }
        let fetched = self.gateway.get_channel_and_my_member(channel_id).await?;
        Ok(fetched.channel)
    }

    /// Marks the records visible locally, then saves them in one request.
    ///
    /// The local flip happens before the first await, so a pass joined with this
    /// one already sees the records as visible.
    async fn persist_visible(
        &self,
        current_user_id: &UserId,
        records: &[PreferenceRecord],
    ) -> Option<ServerError> {
        if records.is_empty() {
            return None;
        }
        self.gateway.state().preferences.merge(records);
        match self.gateway.save_preferences(current_user_id, records).await {
            Ok(()) => None,
            Err(error) => {
                tracing::warn!(
                    error_id = %error.id,
                    count = records.len(),
                    "visibility preferences not saved"
                );
                Some(error)
            }
        }
    }

    fn populate_direct_channels(&self, current_user_id: &UserId, peer_ids: &[UserId]) {
        let cache = &self.gateway.state().cache;
        for peer_id in peer_ids {
            let name = direct_channel_name(current_user_id, peer_id);
            let Some(channel) = cache.channel_by_name(&name) else {
                continue;
            };
            if !cache.user_ids_in_channel(&channel.id).contains(peer_id) {
                cache.add_user_ids_to_channel(&channel.id, [peer_id]);
            }
        }
    }
}
