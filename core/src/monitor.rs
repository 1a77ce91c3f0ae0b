//! Directory change-monitoring bookkeeping.
//!
//! The [`WatchRegistry`] is the process-wide record of which
//! (profile, directory) pairs are currently monitored; the [`Monitor`]
//! controller drives starting and stopping watches, including the
//! recursive teardown over descendant directories. The registry is
//! injected state, owned by the controller and handed to it at
//! construction; there is no ambient global to reach for.
//!
//! Multiple change events may start or stop monitors concurrently;
//! registry operations are atomic behind a mutex. A start/stop sequence
//! runs to completion or to its first error, with no cancellation.

use std::collections::HashSet;

use parking_lot::Mutex;
use tracing::debug;

use crate::errors::SyncError;
use crate::syncer::{Profile, Syncer};

/// Callback invoked once per discovered child when monitoring starts,
/// seeding the sync engine's initial comparison pass.
pub type ChangeDispatcher<S> = Box<dyn Fn(&Profile, &S) + Send + Sync>;

/// Concurrent set of (profile id, entity id) pairs under monitoring.
///
/// Value-less: presence means "is being watched". Entries never expire
/// on their own; they are added by [`Monitor::start`] and removed by
/// [`Monitor::stop`] or the recursive teardown.
pub struct WatchRegistry {
    entries: Mutex<HashSet<(String, String)>>,
}

impl WatchRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashSet::new()),
        }
    }

    /// Whether the (profile, entity) pair is currently watched.
    pub fn has(&self, profile_id: &str, entity_id: &str) -> bool {
        self.entries
            .lock()
            .contains(&(profile_id.to_string(), entity_id.to_string()))
    }

    /// Mark the (profile, entity) pair as watched.
    pub fn add(&self, profile_id: &str, entity_id: &str) {
        self.entries
            .lock()
            .insert((profile_id.to_string(), entity_id.to_string()));
    }

    /// Remove the (profile, entity) pair. Removing an absent pair is a
    /// no-op.
    pub fn remove(&self, profile_id: &str, entity_id: &str) {
        self.entries
            .lock()
            .remove(&(profile_id.to_string(), entity_id.to_string()));
    }

    /// Remove the entity's entries for **every** profile. Used when the
    /// entity itself is being deleted.
    pub fn remove_entity(&self, entity_id: &str) {
        self.entries.lock().retain(|(_, id)| id != entity_id);
    }

    /// Number of watched pairs.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for WatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Controller for starting and stopping directory monitoring.
///
/// Owns the [`WatchRegistry`] and the [`ChangeDispatcher`] the consumer
/// injected. Generic over the [`Syncer`] implementation so a local
/// counterpart gets its own monomorphized controller.
pub struct Monitor<S> {
    registry: WatchRegistry,
    dispatcher: ChangeDispatcher<S>,
}

impl<S: Syncer> Monitor<S> {
    /// Create a controller with an empty registry.
    pub fn new(dispatcher: ChangeDispatcher<S>) -> Self {
        Self {
            registry: WatchRegistry::new(),
            dispatcher,
        }
    }

    /// The underlying registry, for membership queries.
    pub fn registry(&self) -> &WatchRegistry {
        &self.registry
    }

    /// Start monitoring `dir` for the profile.
    ///
    /// No-op success when the pair is already watched. Children are
    /// enumerated and dispatched **before** the pair is registered, so an
    /// enumeration failure never leaves a partially initialized watch.
    pub fn start(&self, profile: &Profile, dir: &S) -> Result<(), SyncError> {
        if !dir.is_dir() {
            return Err(SyncError::InvalidOperation(format!(
                "cannot monitor {}: not a directory",
                dir.id()
            )));
        }
        if self.registry.has(&profile.id, dir.id()) {
            return Ok(());
        }

        // Seed the engine's initial comparison pass: one change event per
        // child, order-independent, each child exactly once.
        let children = dir.children()?;
        for child in &children {
            (self.dispatcher)(profile, child);
        }

        self.registry.add(&profile.id, dir.id());
        debug!(profile = %profile.id, dir = %dir.id(), "watching directory");
        Ok(())
    }

    /// Stop monitoring `dir` for the profile, releasing every watched
    /// descendant directory first (depth-first, children before parent).
    ///
    /// Halts at the first error: descendants already processed stay
    /// unregistered, the rest keep their entries.
    pub fn stop(&self, profile: &Profile, dir: &S) -> Result<(), SyncError> {
        if !dir.is_dir() {
            return Err(SyncError::InvalidOperation(format!(
                "cannot stop monitoring {}: not a directory",
                dir.id()
            )));
        }
        if !self.registry.has(&profile.id, dir.id()) {
            return Ok(());
        }
        self.stop_tree(Some(profile), dir)
    }

    /// Tear down watches on `dir` and its descendants for **every**
    /// profile. Used by the delete path: the directory is about to stop
    /// existing for all of them.
    pub fn unwatch_tree(&self, dir: &S) -> Result<(), SyncError> {
        self.stop_tree(None, dir)
    }

    // Recursion depth is bounded by the real remote tree depth, which is
    // shallow relative to stack limits.
    fn stop_tree(&self, profile: Option<&Profile>, dir: &S) -> Result<(), SyncError> {
        let children = dir.children()?;
        for child in children.iter().filter(|c| c.is_dir()) {
            self.stop_tree(profile, child)?;
        }
        match profile {
            Some(profile) => self.registry.remove(&profile.id, dir.id()),
            None => self.registry.remove_entity(dir.id()),
        }
        debug!(dir = %dir.id(), "stopped watching directory");
        Ok(())
    }
}
