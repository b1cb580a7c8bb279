//! Protocol record model: tags, drafts, and finalized events.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Kind, Timestamp, AUTOGENERATED_TAG, GROUP_TAG};

/// A single tag: a key followed by zero or more values.
///
/// Tags are kept verbatim and in construction order. Examples used by the
/// moderation log:
///
/// - `["h", group_id]` – the group a record applies to
/// - `["p", pubkey, role...]` – a member, optionally with roles
/// - `["e", event_id]` – an event being deleted
/// - `["autogenerated"]` – marks relay-generated records
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(pub Vec<String>);

impl Tag {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// The first element, if any.
    pub fn key(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// The second element, if any.
    pub fn value(&self) -> Option<&str> {
        self.0.get(1).map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Appends further values to the end of the tag.
    pub fn extend<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.extend(values.into_iter().map(Into::into));
    }
}

impl<const N: usize> From<[&str; N]> for Tag {
    fn from(parts: [&str; N]) -> Self {
        Self::new(parts)
    }
}

/// A record under construction.
///
/// Drafts are freely mutable. Nothing derived from their contents is
/// computed until [`EventDraft::finalize`] consumes them.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub kind: Kind,
    pub tags: Vec<Tag>,
    pub content: String,
    /// Author; the finalizer's default is used when `None`.
    pub pubkey: Option<String>,
    /// Creation time; wall-clock "now" is used when `None`.
    pub created_at: Option<Timestamp>,
}

impl EventDraft {
    pub fn new(kind: Kind, tags: Vec<Tag>) -> Self {
        Self {
            kind,
            tags,
            content: String::new(),
            pubkey: None,
            created_at: None,
        }
    }

    pub fn with_pubkey(mut self, pubkey: impl Into<String>) -> Self {
        self.pubkey = Some(pubkey.into());
        self
    }

    /// Fills remaining defaults and computes the event id.
    ///
    /// The draft is consumed, so the id can never be computed on fields
    /// that are changed afterwards.
    pub fn finalize(self, default_pubkey: &str) -> Event {
        let pubkey = self
            .pubkey
            .unwrap_or_else(|| default_pubkey.to_string());
        let created_at = self.created_at.unwrap_or_else(Timestamp::now);
        let id = compute_id(&pubkey, created_at, self.kind, &self.tags, &self.content);

        Event {
            id,
            pubkey,
            created_at,
            kind: self.kind,
            tags: self.tags,
            content: self.content,
            sig: None,
        }
    }
}

/// A finalized, content-addressed record.
///
/// ```json
/// {
///   "id": "4f2a...",
///   "pubkey": "79be...",
///   "created_at": 1700000003,
///   "kind": 9000,
///   "tags": [["h", "pizza"], ["p", "abc", "admin"], ["autogenerated"]],
///   "content": ""
/// }
/// ```
///
/// Hashed fields are read-only. Records generated by the relay carry no
/// `sig`, and the field is omitted from their JSON form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    id: String,
    pubkey: String,
    created_at: Timestamp,
    kind: Kind,
    tags: Vec<Tag>,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sig: Option<String>,
}

impl Event {
    /// Reassembles an event from stored columns.
    ///
    /// The id is taken as given; call [`Event::has_valid_id`] to check it.
    pub fn from_parts(
        id: String,
        pubkey: String,
        created_at: Timestamp,
        kind: Kind,
        tags: Vec<Tag>,
        content: String,
        sig: Option<String>,
    ) -> Self {
        Self {
            id,
            pubkey,
            created_at,
            kind,
            tags,
            content,
            sig,
        }
    }

    /// Attaches a signature. The signature is not part of the id.
    pub fn with_signature(mut self, sig: impl Into<String>) -> Self {
        self.sig = Some(sig.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pubkey(&self) -> &str {
        &self.pubkey
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn sig(&self) -> Option<&str> {
        self.sig.as_deref()
    }

    /// Raw SHA-256 digest of the canonical serialization.
    pub fn hash(&self) -> [u8; 32] {
        canonical_hash(
            &self.pubkey,
            self.created_at,
            self.kind,
            &self.tags,
            &self.content,
        )
    }

    /// Returns `true` when `id` matches the recomputed hash.
    pub fn has_valid_id(&self) -> bool {
        hex::encode(self.hash()) == self.id
    }

    /// Value of the first `h` tag.
    pub fn group_id(&self) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key() == Some(GROUP_TAG))
            .and_then(Tag::value)
    }

    /// Returns `true` if the record carries the relay's autogenerated marker.
    pub fn is_autogenerated(&self) -> bool {
        self.tags
            .iter()
            .any(|t| t.as_slice() == [AUTOGENERATED_TAG])
    }
}

fn canonical_hash(
    pubkey: &str,
    created_at: Timestamp,
    kind: Kind,
    tags: &[Tag],
    content: &str,
) -> [u8; 32] {
    let canonical = serde_json::json!([0, pubkey, created_at, kind, tags, content]);
    Sha256::digest(canonical.to_string().as_bytes()).into()
}

fn compute_id(
    pubkey: &str,
    created_at: Timestamp,
    kind: Kind,
    tags: &[Tag],
    content: &str,
) -> String {
    hex::encode(canonical_hash(pubkey, created_at, kind, tags, content))
}
