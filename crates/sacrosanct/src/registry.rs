//! Identity-keyed strictness registry
//!
//! Provides [`StrictnessRegistry`], the side table recording whether each
//! guarded target rejects mutations. Entries are keyed by [`ObjectId`] and
//! hold only a weak handle, so registering a target never extends its
//! lifetime. Entries for collected targets read as absent and are swept in
//! bulk once the table grows past a threshold.

use crate::config::DEFAULT_SWEEP_THRESHOLD;
use crate::object::{ObjectId, ObjectRef, WeakObjectRef};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::fmt::{self, Debug, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

static GLOBAL: Lazy<Arc<StrictnessRegistry>> = Lazy::new(|| Arc::new(StrictnessRegistry::new()));

struct Entry {
    strict: bool,
    target: WeakObjectRef,
}

/// Concurrent map from target identity to strictness
///
/// Registration is last-writer-wins: re-registering a target with a new
/// flag changes what every existing view of that target observes.
pub struct StrictnessRegistry {
    entries: DashMap<ObjectId, Entry>,
    sweep_threshold: usize,
    next_sweep: AtomicUsize,
}

impl StrictnessRegistry {
    /// Create empty registry with the default sweep threshold
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_sweep_threshold(DEFAULT_SWEEP_THRESHOLD)
    }

    /// Create empty registry sweeping once `threshold` entries accumulate
    #[must_use]
    pub fn with_sweep_threshold(threshold: usize) -> Self {
        let threshold = threshold.max(1);
        Self {
            entries: DashMap::new(),
            sweep_threshold: threshold,
            next_sweep: AtomicUsize::new(threshold),
        }
    }

    /// Process-wide registry used by [`guard`](crate::guard)
    #[inline]
    #[must_use]
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    /// Record strictness for `target`, replacing any previous flag
    pub fn register(&self, target: &ObjectRef, strict: bool) {
        self.entries.insert(
            target.id(),
            Entry {
                strict,
                target: target.downgrade(),
            },
        );

        if self.entries.len() >= self.next_sweep.load(Ordering::Relaxed) {
            self.purge();
            let live = self.entries.len();
            self.next_sweep
                .store(self.sweep_threshold.max(live * 2), Ordering::Relaxed);
        }
    }

    /// Strictness recorded for a live target
    #[must_use]
    pub fn strictness(&self, id: ObjectId) -> Option<bool> {
        self.entries
            .get(&id)
            .filter(|entry| entry.target.is_alive())
            .map(|entry| entry.strict)
    }

    /// Whether `target` is registered as strict
    #[inline]
    #[must_use]
    pub fn is_strict(&self, target: &ObjectRef) -> bool {
        self.strictness(target.id()).unwrap_or(false)
    }

    /// Remove entries whose target has been collected
    ///
    /// Returns number of entries removed.
    pub fn purge(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.target.is_alive());
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            tracing::debug!("Swept {} collected targets from strictness registry", removed);
        }
        removed
    }

    /// Number of entries, including any not yet swept
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for StrictnessRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for StrictnessRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrictnessRegistry")
            .field("entries", &self.entries.len())
            .field("sweep_threshold", &self.sweep_threshold)
            .finish()
    }
}
