//! Stamping and submission of generated records.

use std::sync::Arc;

use grouplog_store::{CallContext, EventSink};
use grouplog_types::{Event, EventDraft, Tag, Timestamp, AUTOGENERATED_TAG};

use crate::clock::LogicalClock;
use crate::error::ModerationError;

/// Turns drafts into final records and submits them to the sink in order.
///
/// For each draft, in this order:
///
/// 1. append the `["autogenerated"]` marker tag
/// 2. set `created_at` to the nominal time plus the next clock offset
/// 3. default the author to the relay identity
/// 4. compute the id
/// 5. submit with an internal call context
///
/// Submission stops at the first failure. Records already submitted stay in
/// the sink. The clock cannot reset while a batch is in flight. The reset is
/// re-armed once the last running batch ends, whether it succeeded, failed
/// or was cancelled.
pub struct OrderingSerializer {
    sink: Arc<dyn EventSink>,
    clock: Arc<LogicalClock>,
    relay_pubkey: String,
    now: fn() -> Timestamp,
}

impl OrderingSerializer {
    pub fn new(
        sink: Arc<dyn EventSink>,
        clock: Arc<LogicalClock>,
        relay_pubkey: impl Into<String>,
    ) -> Self {
        Self {
            sink,
            clock,
            relay_pubkey: relay_pubkey.into(),
            now: Timestamp::now,
        }
    }

    /// Replaces the wall-clock source used for drafts without a nominal time.
    pub fn with_time_source(mut self, now: fn() -> Timestamp) -> Self {
        self.now = now;
        self
    }

    pub fn clock(&self) -> &LogicalClock {
        &self.clock
    }

    /// Stamps and submits `drafts`, returning the records that were applied.
    pub async fn apply(&self, drafts: Vec<EventDraft>) -> Result<Vec<Event>, ModerationError> {
        let _batch = self.clock.begin_batch();
        self.submit_all(drafts).await
    }

    async fn submit_all(&self, drafts: Vec<EventDraft>) -> Result<Vec<Event>, ModerationError> {
        let ctx = CallContext::internal();
        let mut applied = Vec::with_capacity(drafts.len());

        for draft in drafts {
            let event = self.stamp(draft);

            let sink = Arc::clone(&self.sink);
            let submitted = event.clone();
            let outcome = tokio::task::spawn_blocking(move || sink.append(&ctx, &submitted))
                .await
                .map_err(|e| ModerationError::TaskJoin(e.to_string()))?;

            match outcome {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!(id = event.id(), "generated event already stored");
                }
                Err(source) => {
                    tracing::warn!(
                        id = event.id(),
                        kind = event.kind().label(),
                        applied = applied.len(),
                        error = %source,
                        "failed to apply generated event"
                    );
                    return Err(ModerationError::Apply {
                        event_id: event.id().to_string(),
                        source,
                    });
                }
            }

            tracing::debug!(
                id = event.id(),
                kind = event.kind().label(),
                group = event.group_id().unwrap_or_default(),
                created_at = %event.created_at(),
                "generated event applied"
            );
            applied.push(event);
        }

        Ok(applied)
    }

    fn stamp(&self, mut draft: EventDraft) -> Event {
        draft.tags.push(Tag::from([AUTOGENERATED_TAG]));
        let nominal = draft.created_at.unwrap_or_else(self.now);
        draft.created_at = Some(nominal + self.clock.next_offset());
        draft.finalize(&self.relay_pubkey)
    }
}
