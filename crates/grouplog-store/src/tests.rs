//! Unit tests for the SQLite event sink.

use grouplog_db::{open_database, DbRuntimeSettings, IN_MEMORY};
use grouplog_types::{Event, EventDraft, Kind, Tag, Timestamp};
use secp256k1::{Keypair, Message, Secp256k1};
use tokio::sync::broadcast::error::TryRecvError;

use crate::error::SinkError;
use crate::sink::{CallContext, EventSink, GroupLookup};
use crate::store::{EventFilter, SqliteEventStore};

const RELAY: &str = "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

fn test_store() -> SqliteEventStore {
    let pool =
        open_database(IN_MEMORY, DbRuntimeSettings::default()).expect("should open in-memory db");
    SqliteEventStore::new(pool)
}

/// Builds a relay-style record with the autogenerated marker.
fn internal_event(kind: Kind, group: &str, created_at: u64, extra: Vec<Tag>) -> Event {
    let mut tags = vec![Tag::from(["h", group])];
    tags.extend(extra);
    tags.push(Tag::from(["autogenerated"]));
    let mut draft = EventDraft::new(kind, tags);
    draft.created_at = Some(Timestamp(created_at));
    draft.finalize(RELAY)
}

fn signed_event(content: &str) -> Event {
    let secp = Secp256k1::new();
    let kp = Keypair::from_seckey_slice(&secp, &[1u8; 32]).expect("valid secret key");
    let pubkey = hex::encode(kp.x_only_public_key().0.serialize());

    let mut draft = EventDraft::new(Kind::Other(9), vec![Tag::from(["h", "pizza"])]);
    draft.content = content.to_string();
    draft.created_at = Some(Timestamp(1_700_000_000));
    let event = draft.finalize(&pubkey);

    let sig = secp.sign_schnorr_no_aux_rand(&Message::from_digest(event.hash()), &kp);
    event.with_signature(hex::encode(sig.as_ref()))
}

// ── append ───────────────────────────────────────────────────────────

#[test]
fn internal_unsigned_event_is_appended_and_broadcast() {
    let store = test_store();
    let mut rx = store.subscribe();
    let event = internal_event(Kind::CreateGroup, "pizza", 100, vec![]);

    let appended = store
        .append(&CallContext::internal(), &event)
        .expect("internal append should succeed");
    assert!(appended);

    let stored = store
        .get_event(event.id())
        .expect("query should succeed")
        .expect("event should be stored");
    assert_eq!(stored, event);
    assert!(stored.sig().is_none());

    let notified = rx.try_recv().expect("subscriber should be notified");
    assert_eq!(notified.id(), event.id());
}

#[test]
fn external_unsigned_event_is_rejected() {
    let store = test_store();
    let event = internal_event(Kind::PutUser, "pizza", 100, vec![]);

    let err = store
        .append(&CallContext::external(), &event)
        .expect_err("unsigned external event must be rejected");
    assert!(matches!(err, SinkError::Rejected(_)), "got {err:?}");
    assert!(store.get_event(event.id()).unwrap().is_none());
}

#[test]
fn external_signed_event_is_accepted() {
    let store = test_store();
    let event = signed_event("hello");

    assert!(store
        .append(&CallContext::external(), &event)
        .expect("signed event should be accepted"));
    assert_eq!(store.get_event(event.id()).unwrap(), Some(event));
}

#[test]
fn signature_from_another_event_is_rejected() {
    let store = test_store();
    let other = signed_event("other");
    let forged = signed_event("hello").with_signature(other.sig().unwrap().to_string());

    let err = store
        .append(&CallContext::external(), &forged)
        .expect_err("forged signature must be rejected");
    assert!(matches!(err, SinkError::Rejected(_)));
}

#[test]
fn mismatched_id_is_rejected_even_for_internal_calls() {
    let store = test_store();
    let good = internal_event(Kind::PutUser, "pizza", 100, vec![]);
    let bad = Event::from_parts(
        "ff".repeat(32),
        good.pubkey().to_string(),
        good.created_at(),
        good.kind(),
        good.tags().to_vec(),
        good.content().to_string(),
        None,
    );

    let err = store
        .append(&CallContext::internal(), &bad)
        .expect_err("id mismatch must be rejected");
    assert!(matches!(err, SinkError::Rejected(_)));
}

#[test]
fn duplicate_append_is_ignored_without_notification() {
    let store = test_store();
    let event = internal_event(Kind::RemoveUser, "pizza", 100, vec![]);
    assert!(store.append(&CallContext::internal(), &event).unwrap());

    let mut rx = store.subscribe();
    assert!(!store.append(&CallContext::internal(), &event).unwrap());
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

// ── group lookup ─────────────────────────────────────────────────────

#[test]
fn load_group_reports_creation_record() {
    let store = test_store();
    assert!(store.load_group("pizza").unwrap().is_none());

    let mut draft = EventDraft::new(
        Kind::CreateGroup,
        vec![Tag::from(["h", "pizza"]), Tag::from(["autogenerated"])],
    )
    .with_pubkey("creator");
    draft.created_at = Some(Timestamp(500));
    let create = draft.finalize(RELAY);
    store.append(&CallContext::internal(), &create).unwrap();

    // Other kinds for the same group do not count as creation.
    let edit = internal_event(Kind::EditMetadata, "pasta", 501, vec![]);
    store.append(&CallContext::internal(), &edit).unwrap();

    let group = store
        .load_group("pizza")
        .expect("lookup should succeed")
        .expect("group should exist");
    assert_eq!(group.group_id, "pizza");
    assert_eq!(group.created_by, "creator");
    assert_eq!(group.creation_event_id, create.id());
    assert_eq!(group.created_at, Timestamp(500));
    assert!(store.load_group("pasta").unwrap().is_none());
}

// ── query ────────────────────────────────────────────────────────────

#[test]
fn query_orders_by_created_at_and_filters() {
    let store = test_store();
    let ctx = CallContext::internal();
    let late = internal_event(Kind::PutUser, "pizza", 300, vec![Tag::from(["p", "bob"])]);
    let early = internal_event(Kind::CreateGroup, "pizza", 100, vec![]);
    let middle = internal_event(Kind::EditMetadata, "pizza", 200, vec![]);
    let elsewhere = internal_event(Kind::PutUser, "pasta", 150, vec![]);
    for e in [&late, &early, &middle, &elsewhere] {
        store.append(&ctx, e).unwrap();
    }
    store.append(&CallContext::external(), &signed_event("chat")).unwrap();

    let pizza = store
        .query_events(&EventFilter {
            group_id: Some("pizza".to_string()),
            autogenerated: Some(true),
            ..Default::default()
        })
        .unwrap();
    let ids: Vec<&str> = pizza.iter().map(Event::id).collect();
    assert_eq!(ids, vec![early.id(), middle.id(), late.id()]);

    let put_users = store
        .query_events(&EventFilter {
            kinds: vec![Kind::PutUser],
            since: Some(Timestamp(120)),
            until: Some(Timestamp(250)),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(put_users.len(), 1);
    assert_eq!(put_users[0].id(), elsewhere.id());

    let user_content = store
        .query_events(&EventFilter {
            autogenerated: Some(false),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(user_content.len(), 1);
    assert!(user_content[0].sig().is_some());

    let limited = store
        .query_events(&EventFilter {
            authors: vec![RELAY.to_string()],
            limit: Some(2),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(limited.len(), 2);
}
