//! # Pulse Scheduler
//!
//! The async half of the transient-marker engine: applies the marker class
//! synchronously, then clears it after the configured duration via a
//! one-shot tokio timer.
//!
//! Differences from a bare set-then-sleep:
//! - Each pulse returns a [`PulseHandle`] that can cancel the pending
//!   removal deterministically.
//! - Re-entrant pulses on the same element coalesce: the in-flight timer is
//!   restarted, so the marker stays applied continuously until the later
//!   deadline instead of two timers racing.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tally_core::pulse::{ClassSet, MarkerSet, PulseConfig};
use tally_core::Name;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::AbortHandle;

/// Errors from the pulse scheduler.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PulseError {
    /// The element key was never registered; nothing was touched.
    #[error("unknown element: {0}")]
    UnknownElement(Name),
}

/// A pending pulse removal, keyed by generation so a superseded timer can
/// never clear the marker of a newer pulse.
struct Inflight {
    generation: u64,
    abort: AbortHandle,
}

struct PulserInner {
    config: PulseConfig,
    /// Element registry: key -> class set.
    elements: Mutex<BTreeMap<Name, MarkerSet>>,
    /// Pending removals, one per element at most.
    inflight: Mutex<BTreeMap<Name, Inflight>>,
    next_generation: AtomicU64,
}

/// The pulse scheduler. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct Pulser {
    inner: Arc<PulserInner>,
}

impl Pulser {
    /// Create a scheduler with the given configuration.
    #[must_use]
    pub fn new(config: PulseConfig) -> Self {
        Self {
            inner: Arc::new(PulserInner {
                config,
                elements: Mutex::new(BTreeMap::new()),
                inflight: Mutex::new(BTreeMap::new()),
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &PulseConfig {
        &self.inner.config
    }

    /// Register an element key, keeping an existing class set if present.
    pub async fn register(&self, name: &Name) {
        self.inner
            .elements
            .lock()
            .await
            .entry(name.clone())
            .or_default();
    }

    /// Snapshot an element's active classes (empty if unregistered).
    pub async fn classes(&self, name: &Name) -> Vec<String> {
        self.inner
            .elements
            .lock()
            .await
            .get(name)
            .map(MarkerSet::snapshot)
            .unwrap_or_default()
    }

    /// Whether the marker class is currently applied to an element.
    pub async fn is_marked(&self, name: &Name) -> bool {
        self.inner
            .elements
            .lock()
            .await
            .get(name)
            .is_some_and(|set| set.contains(&self.inner.config.class))
    }

    /// Apply the marker to an element and schedule its removal.
    ///
    /// The marker is added before this call returns; the removal fires after
    /// the configured duration. If a removal is already pending for the same
    /// element it is aborted and rescheduled (coalescing).
    pub async fn pulse(&self, name: &Name) -> Result<PulseHandle, PulseError> {
        // Lock order is inflight then elements, matching the clear path, so
        // a timer firing concurrently cannot strip a marker we just added.
        let mut inflight = self.inner.inflight.lock().await;
        {
            let mut elements = self.inner.elements.lock().await;
            let set = elements
                .get_mut(name)
                .ok_or_else(|| PulseError::UnknownElement(name.clone()))?;
            set.add(&self.inner.config.class);
        }

        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);

        if let Some(previous) = inflight.remove(name) {
            previous.abort.abort();
        }

        let task = tokio::spawn(clear_after(
            Arc::clone(&self.inner),
            name.clone(),
            generation,
        ));
        inflight.insert(
            name.clone(),
            Inflight {
                generation,
                abort: task.abort_handle(),
            },
        );

        Ok(PulseHandle {
            pulser: self.clone(),
            name: name.clone(),
            generation,
        })
    }
}

/// Timer body: wait out the duration, then clear the marker if this pulse
/// is still the current one.
async fn clear_after(inner: Arc<PulserInner>, name: Name, generation: u64) {
    tokio::time::sleep(inner.config.duration).await;

    let mut inflight = inner.inflight.lock().await;
    let current = inflight
        .get(&name)
        .is_some_and(|entry| entry.generation == generation);
    if !current {
        return;
    }
    inflight.remove(&name);

    let mut elements = inner.elements.lock().await;
    if let Some(set) = elements.get_mut(&name) {
        // Removal of an absent class is a no-op by set semantics
        set.remove(&inner.config.class);
    }
}

// =============================================================================
// PULSE HANDLE
// =============================================================================

/// Handle to a scheduled pulse removal.
///
/// Dropping the handle leaves the pulse running (fire-and-forget remains the
/// default); [`cancel`](Self::cancel) aborts the timer and clears the marker
/// immediately.
pub struct PulseHandle {
    pulser: Pulser,
    name: Name,
    generation: u64,
}

impl PulseHandle {
    /// The element this pulse targets.
    #[must_use]
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Cancel the pending removal and clear the marker now.
    ///
    /// A no-op if this pulse was already cleared or superseded by a newer
    /// pulse on the same element.
    pub async fn cancel(self) {
        let inner = &self.pulser.inner;

        let mut inflight = inner.inflight.lock().await;
        let current = inflight
            .get(&self.name)
            .is_some_and(|entry| entry.generation == self.generation);
        if !current {
            return;
        }
        if let Some(entry) = inflight.remove(&self.name) {
            entry.abort.abort();
        }

        let mut elements = inner.elements.lock().await;
        if let Some(set) = elements.get_mut(&self.name) {
            set.remove(&inner.config.class);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
