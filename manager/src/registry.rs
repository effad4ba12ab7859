//! Callback registry - hook point name to priority-ordered callbacks
//!
//! Populated once by [`Manager::collect`](crate::Manager::collect) and
//! treated as a read-only snapshot afterwards. Ordering within a hook
//! point's sequence is a correctness property: hook execution order affects
//! domain configuration outcomes, so entries are kept non-increasing in
//! priority at insertion time regardless of the order probes complete in.

use crate::probe::SidecarHandle;
use koukku_core::HookPoint;
use std::collections::HashMap;

/// One unit of work in the registry: an invocation handle to a sidecar plus
/// the single hook point/priority it was registered for. A sidecar that
/// declares N hook points yields N callbacks sharing the same handle.
#[derive(Debug, Clone)]
pub struct Callback {
    /// Open channel and identity of the sidecar to invoke
    pub handle: SidecarHandle,
    /// The hook point this callback was registered for
    pub hook_point: HookPoint,
}

/// Mapping from hook point name to callbacks sorted by descending priority.
///
/// All mutation happens from the collection loop's orchestrating task;
/// probe tasks hand results back through a join handle and never touch the
/// map, so no synchronization is needed during construction either.
#[derive(Debug, Default)]
pub struct CallbackRegistry {
    callbacks: HashMap<String, Vec<Callback>>,
}

impl CallbackRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a callback at the position preserving descending priority.
    ///
    /// Equal priorities tie-break by discovery order: a later callback with
    /// the same priority lands after the existing ones.
    pub fn insert(&mut self, callback: Callback) {
        let entries = self
            .callbacks
            .entry(callback.hook_point.name.clone())
            .or_default();

        let at = entries
            .iter()
            .position(|existing| existing.hook_point.priority < callback.hook_point.priority)
            .unwrap_or(entries.len());

        entries.insert(at, callback);
    }

    /// Callbacks for a hook point, highest priority first.
    ///
    /// Returns an empty slice, never an error, for hook points no sidecar
    /// registered for.
    pub fn get(&self, hook_point: &str) -> &[Callback] {
        self.callbacks
            .get(hook_point)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Hook point names with at least one registered callback
    pub fn hook_points(&self) -> impl Iterator<Item = &str> {
        self.callbacks.keys().map(String::as_str)
    }

    /// Total number of callbacks across all hook points
    pub fn len(&self) -> usize {
        self.callbacks.values().map(Vec::len).sum()
    }

    /// Whether the registry holds no callbacks at all
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}
