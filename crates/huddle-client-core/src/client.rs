use std::sync::Arc;

use crate::account::AccountActions;
use crate::config::SyncLimits;
use crate::coordinator::BatchFetchCoordinator;
use crate::gateway::Gateway;
use crate::profiles::ProfileActions;
use crate::state::ClientState;
use crate::transport::ChatApiTransport;
use crate::visibility::VisibilitySync;

/// One transport, one state, and every action group wired against them.
pub struct ChatClient<T> {
    gateway: Arc<Gateway<T>>,
    members: BatchFetchCoordinator<T>,
    visibility: VisibilitySync<T>,
    profiles: ProfileActions<T>,
    account: AccountActions<T>,
}

impl<T: ChatApiTransport> ChatClient<T> {
    #[must_use]
    pub fn new(transport: T, state: Arc<ClientState>, limits: SyncLimits) -> Self {
        let gateway = Arc::new(Gateway::new(transport, state));
        Self {
            members: BatchFetchCoordinator::new(Arc::clone(&gateway)),
            visibility: VisibilitySync::new(Arc::clone(&gateway), limits),
            profiles: ProfileActions::new(Arc::clone(&gateway)),
            account: AccountActions::new(Arc::clone(&gateway)),
            gateway,
        }
    }

    #[must_use]
    pub fn with_defaults(transport: T) -> Self {
        Self::new(transport, Arc::new(ClientState::new()), SyncLimits::default())
    }

    #[must_use]
    pub fn members(&self) -> &BatchFetchCoordinator<T> {
        &self.members
    }

    #[must_use]
    pub fn visibility(&self) -> &VisibilitySync<T> {
        &self.visibility
    }

    #[must_use]
    pub fn profiles(&self) -> &ProfileActions<T> {
        &self.profiles
    }

    #[must_use]
    pub fn account(&self) -> &AccountActions<T> {
        &self.account
    }

    #[must_use]
    pub fn gateway(&self) -> &Gateway<T> {
        &self.gateway
    }

    #[must_use]
    pub fn state(&self) -> &ClientState {
        self.gateway.state()
    }

    #[must_use]
    pub fn shared_state(&self) -> Arc<ClientState> {
        self.gateway.shared_state()
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        self.gateway.transport()
    }
}
