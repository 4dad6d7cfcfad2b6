//! A thread-safe in-memory holder for the currently active toggle set. [`ToggleSnapshot`] is the
//! only state shared between the fetch path (single writer) and evaluation (many readers).
use std::sync::{Arc, RwLock};

use crate::ToggleSet;

/// `ToggleSnapshot` provides a thread-safe (`Sync`) reference to the current [`ToggleSet`].
///
/// The toggle set itself is immutable and can only be replaced completely, so readers always
/// receive a complete set. The lock only guards the pointer: it is held for the duration of an
/// `Arc` clone or swap and never across I/O, so readers never wait on the fetch cycle.
#[derive(Debug, Default)]
pub struct ToggleSnapshot {
    toggles: RwLock<Arc<ToggleSet>>,
}

impl ToggleSnapshot {
    /// Create a snapshot holding an empty toggle set.
    pub fn new() -> Self {
        ToggleSnapshot::default()
    }

    /// Create a snapshot holding `toggles`.
    pub fn with_toggles(toggles: ToggleSet) -> Self {
        ToggleSnapshot {
            toggles: RwLock::new(Arc::new(toggles)),
        }
    }

    /// Get the currently active toggle set.
    ///
    /// The returned set is not affected by subsequent writes, so callers should use the same
    /// snapshot for the whole operation.
    pub fn get(&self) -> Arc<ToggleSet> {
        // Readers and the writer only clone or replace an `Arc` under the lock and cannot panic
        // while holding it. Recover from poisoning anyway: the slot always holds a complete set.
        let toggles = self
            .toggles
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&toggles)
    }

    /// Publish a new toggle set, returning the previous one.
    pub fn set(&self, toggles: Arc<ToggleSet>) -> Arc<ToggleSet> {
        let mut slot = self
            .toggles
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::replace(&mut *slot, toggles)
    }
}
