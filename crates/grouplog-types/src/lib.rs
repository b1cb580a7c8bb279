//! Shared types for the grouplog workspace.
//!
//! This crate provides the protocol record model used by every other crate:
//! event kinds for group moderation, ordered tags, the staged
//! [`EventDraft`] → [`Event`] builder, and the [`EditMetadata`] descriptor.
//!
//! No crate in the workspace defines its own record type. The sink, the
//! moderation core, and the HTTP surface all exchange [`Event`] values
//! produced here, which keeps id computation in exactly one place.

mod event;
mod metadata;

pub use event::{Event, EventDraft, Tag};
pub use metadata::EditMetadata;

use serde::{Deserialize, Serialize};

/// Tag key carrying the group identifier on every moderation record.
pub const GROUP_TAG: &str = "h";

/// Valueless tag appended to every record the relay generates on its own.
pub const AUTOGENERATED_TAG: &str = "autogenerated";

/// Event kinds understood by the group moderation log.
///
/// The numeric values follow the NIP-29 moderation range. Any other kind is
/// preserved as [`Kind::Other`] so the sink can store ordinary user content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum Kind {
    /// Adds a user to a group or replaces their roles.
    PutUser,
    /// Removes a user from a group.
    RemoveUser,
    /// Changes group properties (name, about, picture, flags).
    EditMetadata,
    /// Removes a single event from a group.
    DeleteEvent,
    /// Establishes a new group and its owner.
    CreateGroup,
    /// Any kind outside the moderation set.
    Other(u32),
}

impl Kind {
    /// Returns the numeric kind.
    pub fn as_u32(self) -> u32 {
        match self {
            Self::PutUser => 9000,
            Self::RemoveUser => 9001,
            Self::EditMetadata => 9002,
            Self::DeleteEvent => 9005,
            Self::CreateGroup => 9007,
            Self::Other(k) => k,
        }
    }

    /// Returns a short label for logging.
    pub fn label(self) -> &'static str {
        match self {
            Self::PutUser => "put-user",
            Self::RemoveUser => "remove-user",
            Self::EditMetadata => "edit-metadata",
            Self::DeleteEvent => "delete-event",
            Self::CreateGroup => "create-group",
            Self::Other(_) => "other",
        }
    }
}

impl From<u32> for Kind {
    fn from(value: u32) -> Self {
        match value {
            9000 => Self::PutUser,
            9001 => Self::RemoveUser,
            9002 => Self::EditMetadata,
            9005 => Self::DeleteEvent,
            9007 => Self::CreateGroup,
            other => Self::Other(other),
        }
    }
}

impl From<Kind> for u32 {
    fn from(kind: Kind) -> Self {
        kind.as_u32()
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}

/// Seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Current wall-clock time, truncated to whole seconds.
    pub fn now() -> Self {
        Self(u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::ops::Add<u64> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: u64) -> Self::Output {
        Timestamp(self.0.saturating_add(rhs))
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
