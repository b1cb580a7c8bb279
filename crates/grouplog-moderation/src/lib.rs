//! Ordered generation of group moderation records.
//!
//! The relay itself authors the records that create groups, change their
//! metadata, add or remove members, and delete events. Those records are
//! generated in bursts (creating a group emits two at once) and often
//! within the same second, yet consumers rebuild group state by replaying
//! them in `created_at` order. This crate guarantees that order:
//!
//! - [`commands`] turns an intent into unsigned drafts, with no side effects.
//! - [`OrderingSerializer`] stamps each draft with `wall_clock + offset` from
//!   a shared [`LogicalClock`], marks it `autogenerated`, defaults the author
//!   to the relay, computes the id, and submits it to the sink.
//! - [`Moderator`] ties the two together and checks that a group does not
//!   exist before creating it.
//!
//! ```rust,ignore
//! let clock = Arc::new(LogicalClock::default());
//! let serializer = OrderingSerializer::new(store.clone(), clock, relay_pubkey);
//! let moderator = Moderator::new(serializer, store);
//!
//! moderator.create_group("pizza", &creator, &EditMetadata::default()).await?;
//! moderator.put_user("pizza", &member, ["moderator"]).await?;
//! ```

pub mod clock;
pub mod commands;
mod error;
mod moderator;
mod serializer;

pub use clock::{LogicalClock, DEFAULT_RESET_AFTER};
pub use error::ModerationError;
pub use moderator::Moderator;
pub use serializer::OrderingSerializer;
