use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.0.as_str())
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }
    };
}

string_id!(
    /// Opaque user identifier as issued by the server.
    UserId
);
string_id!(ChannelId);
string_id!(TeamId);

/// Bounds a batch fetch: membership is always tested against one team or one channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Team(TeamId),
    Channel(ChannelId),
}

impl Scope {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Team(_) => "team",
            Self::Channel(_) => "channel",
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Team(team_id) => team_id.as_str(),
            Self::Channel(channel_id) => channel_id.as_str(),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

const DIRECT_CHANNEL_SEPARATOR: &str = "__";

/// Name of the direct channel between two users; the lower id always comes first.
#[must_use]
pub fn direct_channel_name(user_a: &UserId, user_b: &UserId) -> String {
    if user_a > user_b {
        format!("{user_b}{DIRECT_CHANNEL_SEPARATOR}{user_a}")
    } else {
        format!("{user_a}{DIRECT_CHANNEL_SEPARATOR}{user_b}")
    }
}

/// Extracts the other participant of a direct channel from its name.
#[must_use]
pub fn direct_channel_peer(channel_name: &str, current_user_id: &UserId) -> Option<UserId> {
    let (first, second) = channel_name.split_once(DIRECT_CHANNEL_SEPARATOR)?;
    let peer = if first == current_user_id.as_str() {
        second
    } else if second == current_user_id.as_str() {
        first
    } else {
        return None;
    };
    if peer.is_empty() {
        return None;
    }
    Some(UserId::new(peer))
}
