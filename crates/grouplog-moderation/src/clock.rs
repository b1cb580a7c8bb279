//! Process-wide ordering offset with a debounced reset.
//!
//! Every generated record gets `wall_clock + offset`, where the offset comes
//! from a shared atomic counter. Records generated close together therefore
//! get strictly increasing timestamps even within the same second. Once the
//! relay has been idle for the reset period the counter drops back to zero
//! so timestamps stop drifting ahead of real time.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Idle period after which the offset counter returns to zero.
pub const DEFAULT_RESET_AFTER: Duration = Duration::from_secs(15);

/// Shared ordering offset.
///
/// There should be exactly one per relay identity. Wrap it in an `Arc` and
/// hand clones to every component that generates records.
pub struct LogicalClock {
    serial: Arc<AtomicU64>,
    active: Arc<AtomicUsize>,
    reset: Debouncer,
}

impl LogicalClock {
    pub fn new(reset_after: Duration) -> Self {
        Self {
            serial: Arc::new(AtomicU64::new(0)),
            active: Arc::new(AtomicUsize::new(0)),
            reset: Debouncer::new(reset_after),
        }
    }

    /// Takes the next offset.
    ///
    /// Strictly greater than every offset handed out since the last reset,
    /// and unique across concurrent callers.
    pub fn next_offset(&self) -> u64 {
        self.serial.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The most recently issued offset, or 0 right after a reset.
    pub fn current(&self) -> u64 {
        self.serial.load(Ordering::SeqCst)
    }

    /// Marks a batch as in flight until the returned guard is dropped.
    ///
    /// No reset fires while any batch is in flight. Dropping the last guard
    /// arms the reset, including when the batch future is cancelled.
    pub fn begin_batch(&self) -> BatchGuard<'_> {
        self.active.fetch_add(1, Ordering::SeqCst);
        BatchGuard { clock: self }
    }

    /// Arms (or re-arms) the idle reset.
    ///
    /// When the timer expires the counter is zeroed only if no batch is in
    /// flight and no offset was taken since arming. Otherwise the reset is
    /// skipped and the last batch to finish arms it again.
    pub fn schedule_reset(&self) {
        let armed_at = self.serial.load(Ordering::SeqCst);
        let serial = Arc::clone(&self.serial);
        let active = Arc::clone(&self.active);

        self.reset.call(move || {
            // A batch that starts after this load takes its offsets after
            // the exchange below, or makes the exchange fail.
            let in_flight = active.load(Ordering::SeqCst);
            if in_flight > 0 {
                tracing::debug!(in_flight, "batches in flight, ordering offset reset skipped");
                return;
            }
            match serial.compare_exchange(armed_at, 0, Ordering::SeqCst, Ordering::SeqCst) {
                Ok(_) => tracing::debug!(offset = armed_at, "ordering offset reset"),
                Err(now) => tracing::debug!(
                    armed_at,
                    now,
                    "ordering offset advanced since arming, reset skipped"
                ),
            }
        });
    }

    /// Whether a reset is armed and has not fired yet.
    pub fn reset_pending(&self) -> bool {
        self.reset.is_pending()
    }
}

/// Keeps the ordering offset from resetting while a batch is stamping.
pub struct BatchGuard<'a> {
    clock: &'a LogicalClock,
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        if self.clock.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.clock.schedule_reset();
        }
    }
}

impl Default for LogicalClock {
    fn default() -> Self {
        Self::new(DEFAULT_RESET_AFTER)
    }
}

/// Runs the most recently supplied action once `delay` has passed without
/// another call.
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Schedules `action`, cancelling whatever was scheduled before.
    ///
    /// Outside a Tokio runtime nothing is scheduled and the pending action,
    /// if any, stays armed.
    pub fn call<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no tokio runtime, debounced action not scheduled");
            return;
        };
        let delay = self.delay;
        let mut slot = self.slot();
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        *slot = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            action();
        }));
    }

    pub fn is_pending(&self) -> bool {
        self.slot()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(|poisoned| {
            tracing::error!("debouncer mutex poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(handle) = self.slot().take() {
            handle.abort();
        }
    }
}
