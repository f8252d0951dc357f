//! Debounced persistence gate.
//!
//! # Responsibility
//! - Collapse bursts of save requests into one physical write.
//! - Always write the most recent payload once the caller goes quiet.
//!
//! # Invariants
//! - At most one countdown task is outstanding per slot (per key, or one for
//!   the whole gate in `DebounceScope::Global`).
//! - A superseded countdown never writes: each slot carries a generation and
//!   only the task holding the current generation may fire.
//! - `write` runs outside the slot lock.
//! - Dropping the gate aborts outstanding countdowns; their payloads are lost.

use crate::store::StoreResult;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Slot id used for every key when the gate is global.
const GLOBAL_SLOT: &str = "";

/// How requests with different keys interact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebounceScope {
    /// One independent countdown per key.
    #[default]
    PerKey,
    /// One countdown for the whole gate; the last payload wins whatever its key.
    Global,
}

/// Construction errors for `DebouncedSaver`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebounceError {
    /// The quiet period must be strictly positive.
    ZeroQuietPeriod,
    /// The gate was built outside a tokio runtime.
    NoRuntime,
}

impl Display for DebounceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroQuietPeriod => write!(f, "debounce quiet period must be greater than zero"),
            Self::NoRuntime => write!(f, "debounced saver requires a running tokio runtime"),
        }
    }
}

impl Error for DebounceError {}

/// Physical write callback invoked when a countdown elapses.
pub type WriteFn<V> = dyn Fn(&str, V) -> StoreResult<()> + Send + Sync;

struct PendingSlot<V> {
    key: String,
    value: V,
    generation: u64,
    timer: JoinHandle<()>,
}

struct GateInner<V> {
    write: Box<WriteFn<V>>,
    quiet_period: Duration,
    scope: DebounceScope,
    slots: Mutex<HashMap<String, PendingSlot<V>>>,
    next_generation: AtomicU64,
}

impl<V> GateInner<V> {
    fn lock_slots(&self) -> MutexGuard<'_, HashMap<String, PendingSlot<V>>> {
        // `write` never runs under this lock; a poisoned map is still whole.
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn slot_id<'k>(&self, key: &'k str) -> &'k str {
        match self.scope {
            DebounceScope::PerKey => key,
            DebounceScope::Global => GLOBAL_SLOT,
        }
    }

    fn fire(&self, slot_id: &str, generation: u64) {
        let due = {
            let mut slots = self.lock_slots();
            let current = slots
                .get(slot_id)
                .is_some_and(|slot| slot.generation == generation);
            if current {
                slots.remove(slot_id)
            } else {
                None
            }
        };
        if let Some(slot) = due {
            self.perform_write(slot.key, slot.value, "timer");
        }
    }

    fn perform_write(&self, key: String, value: V, trigger: &'static str) {
        match (self.write)(key.as_str(), value) {
            Ok(()) => debug!(
                "event=debounce_write module=persist status=ok trigger={trigger} key={key}"
            ),
            Err(err) => error!(
                "event=debounce_write module=persist status=error trigger={trigger} key={key} error={err}"
            ),
        }
    }

    fn drain(&self) -> Vec<PendingSlot<V>> {
        let mut slots = self.lock_slots();
        let drained: Vec<_> = slots.drain().map(|(_, slot)| slot).collect();
        for slot in &drained {
            slot.timer.abort();
        }
        drained
    }
}

/// Debounced wrapper around a key-value write.
///
/// Each `request` records `(key, value)` as the pending payload and restarts
/// the countdown. When `quiet_period` elapses without another request for the
/// same slot, `write` is called exactly once with the latest payload.
///
/// A failed `write` is logged as `event=debounce_write status=error` and its
/// payload is dropped. It is neither retried nor reported to the caller.
///
/// The gate is owned by its caller and is not `Clone`: exactly one instance
/// drives a given write target for the lifetime of the app state.
pub struct DebouncedSaver<V> {
    inner: Arc<GateInner<V>>,
    runtime: Handle,
}

impl<V: Send + 'static> DebouncedSaver<V> {
    /// Builds a per-key gate on the current tokio runtime.
    ///
    /// # Errors
    /// - `ZeroQuietPeriod` when `quiet_period` is zero.
    /// - `NoRuntime` when called outside a tokio runtime context.
    pub fn new<F>(write: F, quiet_period: Duration) -> Result<Self, DebounceError>
    where
        F: Fn(&str, V) -> StoreResult<()> + Send + Sync + 'static,
    {
        Self::with_scope(write, quiet_period, DebounceScope::PerKey)
    }

    /// Builds a gate with an explicit key scope.
    pub fn with_scope<F>(
        write: F,
        quiet_period: Duration,
        scope: DebounceScope,
    ) -> Result<Self, DebounceError>
    where
        F: Fn(&str, V) -> StoreResult<()> + Send + Sync + 'static,
    {
        if quiet_period.is_zero() {
            return Err(DebounceError::ZeroQuietPeriod);
        }
        let runtime = Handle::try_current().map_err(|_| DebounceError::NoRuntime)?;

        Ok(Self {
            inner: Arc::new(GateInner {
                write: Box::new(write),
                quiet_period,
                scope,
                slots: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
            }),
            runtime,
        })
    }

    /// Records `value` as the pending payload for `key` and restarts its
    /// countdown. Returns immediately.
    ///
    /// Blank keys are ignored with a warning.
    pub fn request(&self, key: &str, value: V) {
        if key.trim().is_empty() {
            warn!("event=debounce_request module=persist status=rejected reason=blank_key");
            return;
        }

        let inner = &self.inner;
        let slot_id = inner.slot_id(key).to_string();
        // Deadline is fixed here, not at first poll of the task.
        let deadline = Instant::now() + inner.quiet_period;
        let weak: Weak<GateInner<V>> = Arc::downgrade(inner);
        let task_slot_id = slot_id.clone();

        let mut slots = inner.lock_slots();
        let generation = inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let timer = self.runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(inner) = weak.upgrade() {
                inner.fire(&task_slot_id, generation);
            }
        });
        let replaced = slots.insert(
            slot_id,
            PendingSlot {
                key: key.to_string(),
                value,
                generation,
                timer,
            },
        );
        let restarted = match replaced {
            Some(previous) => {
                previous.timer.abort();
                true
            }
            None => false,
        };
        drop(slots);

        debug!(
            "event=debounce_request module=persist status=ok key={key} generation={generation} restarted={restarted}"
        );
    }

    /// Writes every pending payload now and returns the number written.
    pub fn flush(&self) -> usize {
        let drained = self.inner.drain();
        let count = drained.len();
        for slot in drained {
            self.inner.perform_write(slot.key, slot.value, "flush");
        }
        debug!("event=debounce_flush module=persist status=ok written={count}");
        count
    }

    /// Drops every pending payload without writing and returns how many were
    /// discarded.
    pub fn cancel(&self) -> usize {
        let count = self.inner.drain().len();
        debug!("event=debounce_cancel module=persist status=ok discarded={count}");
        count
    }

    /// Returns whether a write is pending for `key`.
    ///
    /// In global scope this reports the single gate-wide slot, but only when
    /// its pending payload was recorded under `key`.
    pub fn is_pending(&self, key: &str) -> bool {
        self.inner
            .lock_slots()
            .get(self.inner.slot_id(key))
            .is_some_and(|slot| slot.key == key)
    }

    /// Number of slots currently waiting for their countdown.
    pub fn pending_count(&self) -> usize {
        self.inner.lock_slots().len()
    }

    pub fn quiet_period(&self) -> Duration {
        self.inner.quiet_period
    }

    pub fn scope(&self) -> DebounceScope {
        self.inner.scope
    }
}

impl<V> Drop for DebouncedSaver<V> {
    fn drop(&mut self) {
        let discarded = self.inner.drain().len();
        if discarded > 0 {
            warn!("event=debounce_drop module=persist status=ok discarded={discarded}");
        }
    }
}
