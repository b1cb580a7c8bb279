//! Pure translation of administrative intents into record drafts.
//!
//! Nothing here reads the clock, touches the store, or fills in defaults.
//! Drafts come out without `created_at`, and without `pubkey` unless the
//! record needs a specific author.

use grouplog_store::GroupRef;
use grouplog_types::{EditMetadata, EventDraft, Kind, Tag, GROUP_TAG};

use crate::error::ModerationError;

fn group_tag(group_id: &str) -> Tag {
    Tag::from([GROUP_TAG, group_id])
}

/// Builds the create-group and initial edit-metadata drafts.
///
/// `existing` is the caller's view of the group. If it is `Some`, the group
/// already exists and no drafts are produced.
///
/// The create-group record is authored by `creator` so that the creator
/// becomes the owner. The metadata record is left for the relay identity.
pub fn create_group(
    existing: Option<&GroupRef>,
    group_id: &str,
    creator: &str,
    metadata: &EditMetadata,
) -> Result<Vec<EventDraft>, ModerationError> {
    if existing.is_some() {
        return Err(ModerationError::GroupAlreadyExists(group_id.to_string()));
    }

    let create = EventDraft::new(Kind::CreateGroup, vec![group_tag(group_id)]).with_pubkey(creator);

    Ok(vec![create, edit_metadata(group_id, metadata)])
}

/// Builds an edit-metadata draft.
///
/// Tags start with the group tag followed, in this order and only when set,
/// by `name`, `about`, `picture`, `closed`/`open`, `private`/`public`.
pub fn edit_metadata(group_id: &str, metadata: &EditMetadata) -> EventDraft {
    let mut tags = Vec::with_capacity(6);
    tags.push(group_tag(group_id));

    if let Some(ref name) = metadata.name {
        tags.push(Tag::from(["name", name.as_str()]));
    }
    if let Some(ref about) = metadata.about {
        tags.push(Tag::from(["about", about.as_str()]));
    }
    if let Some(ref picture) = metadata.picture {
        tags.push(Tag::from(["picture", picture.as_str()]));
    }
    if let Some(closed) = metadata.closed {
        tags.push(Tag::from([if closed { "closed" } else { "open" }]));
    }
    if let Some(private) = metadata.private {
        tags.push(Tag::from([if private { "private" } else { "public" }]));
    }

    EventDraft::new(Kind::EditMetadata, tags)
}

/// Builds a put-user draft. Roles are appended to the `p` tag verbatim.
pub fn put_user<I, S>(group_id: &str, pubkey: &str, roles: I) -> EventDraft
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut user = Tag::from(["p", pubkey]);
    user.extend(roles);

    EventDraft::new(Kind::PutUser, vec![group_tag(group_id), user])
}

pub fn remove_user(group_id: &str, pubkey: &str) -> EventDraft {
    EventDraft::new(
        Kind::RemoveUser,
        vec![group_tag(group_id), Tag::from(["p", pubkey])],
    )
}

pub fn delete_event(group_id: &str, event_id: &str) -> EventDraft {
    EventDraft::new(
        Kind::DeleteEvent,
        vec![group_tag(group_id), Tag::from(["e", event_id])],
    )
}
