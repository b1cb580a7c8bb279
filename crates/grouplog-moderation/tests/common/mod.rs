#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use grouplog_moderation::{LogicalClock, Moderator, OrderingSerializer};
use grouplog_store::{CallContext, EventSink, GroupLookup, GroupRef, SinkError};
use grouplog_types::{Event, Timestamp};

pub const RELAY: &str = "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
pub const BASE_TIME: u64 = 1_700_000_000;

pub fn fixed_now() -> Timestamp {
    Timestamp(BASE_TIME)
}

/// Sink that records every call and can fail on a chosen one.
#[derive(Default)]
pub struct RecordingSink {
    calls: AtomicUsize,
    fail_on_call: Option<usize>,
    slow_group: Option<(String, Duration)>,
    accepted: Mutex<Vec<(CallContext, Event)>>,
}

impl RecordingSink {
    /// Fails the `n`th call (1-based) with a rejection.
    pub fn failing_on(n: usize) -> Self {
        Self {
            fail_on_call: Some(n),
            ..Default::default()
        }
    }

    /// Blocks every append for `group_id` for `delay`, like a busy store.
    pub fn slow_for(group_id: &str, delay: Duration) -> Self {
        Self {
            slow_group: Some((group_id.to_string(), delay)),
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<Event> {
        self.accepted
            .lock()
            .unwrap()
            .iter()
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub fn contexts(&self) -> Vec<CallContext> {
        self.accepted.lock().unwrap().iter().map(|(c, _)| *c).collect()
    }
}

impl EventSink for RecordingSink {
    fn append(&self, ctx: &CallContext, event: &Event) -> Result<bool, SinkError> {
        if let Some((group, delay)) = &self.slow_group {
            if event.group_id() == Some(group.as_str()) {
                std::thread::sleep(*delay);
            }
        }
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_call == Some(call) {
            return Err(SinkError::Rejected("injected failure".to_string()));
        }
        self.accepted.lock().unwrap().push((*ctx, event.clone()));
        Ok(true)
    }
}

/// In-memory group registry.
#[derive(Default)]
pub struct MapLookup {
    groups: Mutex<HashMap<String, GroupRef>>,
    broken: bool,
}

impl MapLookup {
    pub fn with_group(group_id: &str) -> Self {
        let lookup = Self::default();
        lookup.groups.lock().unwrap().insert(
            group_id.to_string(),
            GroupRef {
                group_id: group_id.to_string(),
                created_by: "someone".to_string(),
                creation_event_id: "00".repeat(32),
                created_at: Timestamp(1),
            },
        );
        lookup
    }

    /// A lookup whose backing store is unavailable.
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Default::default()
        }
    }
}

impl GroupLookup for MapLookup {
    fn load_group(&self, group_id: &str) -> Result<Option<GroupRef>, SinkError> {
        if self.broken {
            return Err(SinkError::Rejected("lookup unavailable".to_string()));
        }
        Ok(self.groups.lock().unwrap().get(group_id).cloned())
    }
}

pub fn moderator(sink: Arc<RecordingSink>, lookup: MapLookup) -> Moderator {
    let serializer = OrderingSerializer::new(sink, Arc::new(LogicalClock::default()), RELAY)
        .with_time_source(fixed_now);
    Moderator::new(serializer, Arc::new(lookup))
}
