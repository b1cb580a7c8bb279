//! Administrative entry points for group moderation.

use std::sync::Arc;

use grouplog_store::{GroupLookup, GroupRef};
use grouplog_types::{EditMetadata, Event};

use crate::commands;
use crate::error::ModerationError;
use crate::serializer::OrderingSerializer;

/// Builds moderation records for administrative intents and applies them.
///
/// Each method returns the applied records in submission order.
pub struct Moderator {
    serializer: OrderingSerializer,
    lookup: Arc<dyn GroupLookup>,
}

impl Moderator {
    pub fn new(serializer: OrderingSerializer, lookup: Arc<dyn GroupLookup>) -> Self {
        Self { serializer, lookup }
    }

    pub fn serializer(&self) -> &OrderingSerializer {
        &self.serializer
    }

    /// Creates a group owned by `creator` and sets its initial metadata.
    ///
    /// Fails with [`ModerationError::GroupAlreadyExists`] without submitting
    /// anything if the group already has a creation record. Two concurrent
    /// creates for the same id can both pass this check.
    pub async fn create_group(
        &self,
        group_id: &str,
        creator: &str,
        metadata: &EditMetadata,
    ) -> Result<Vec<Event>, ModerationError> {
        let existing = self.load_group(group_id).await?;
        let drafts = commands::create_group(existing.as_ref(), group_id, creator, metadata)?;

        let applied = self.serializer.apply(drafts).await?;
        tracing::info!(group = group_id, creator, "group created");
        Ok(applied)
    }

    pub async fn edit_metadata(
        &self,
        group_id: &str,
        metadata: &EditMetadata,
    ) -> Result<Vec<Event>, ModerationError> {
        let draft = commands::edit_metadata(group_id, metadata);
        let applied = self.serializer.apply(vec![draft]).await?;
        tracing::info!(group = group_id, "group metadata edited");
        Ok(applied)
    }

    /// Adds `pubkey` to the group, or replaces its roles.
    pub async fn put_user<I, S>(
        &self,
        group_id: &str,
        pubkey: &str,
        roles: I,
    ) -> Result<Vec<Event>, ModerationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let draft = commands::put_user(group_id, pubkey, roles);
        let applied = self.serializer.apply(vec![draft]).await?;
        tracing::info!(group = group_id, user = pubkey, "user put into group");
        Ok(applied)
    }

    pub async fn remove_user(
        &self,
        group_id: &str,
        pubkey: &str,
    ) -> Result<Vec<Event>, ModerationError> {
        let draft = commands::remove_user(group_id, pubkey);
        let applied = self.serializer.apply(vec![draft]).await?;
        tracing::info!(group = group_id, user = pubkey, "user removed from group");
        Ok(applied)
    }

    pub async fn delete_event(
        &self,
        group_id: &str,
        event_id: &str,
    ) -> Result<Vec<Event>, ModerationError> {
        let draft = commands::delete_event(group_id, event_id);
        let applied = self.serializer.apply(vec![draft]).await?;
        tracing::info!(group = group_id, event = event_id, "event deletion recorded");
        Ok(applied)
    }

    async fn load_group(&self, group_id: &str) -> Result<Option<GroupRef>, ModerationError> {
        let lookup = Arc::clone(&self.lookup);
        let id = group_id.to_string();

        tokio::task::spawn_blocking(move || lookup.load_group(&id))
            .await
            .map_err(|e| ModerationError::TaskJoin(e.to_string()))?
            .map_err(|source| ModerationError::Lookup {
                group_id: group_id.to_string(),
                source,
            })
    }
}
