//! The syncable-entity capability contract.
//!
//! [`Syncer`] is the uniform surface the sync engine programs against: a
//! remote-backed entity ([`RemoteFile`](crate::remote::RemoteFile)) and any
//! local-filesystem counterpart implement the identical set, so the engine
//! can compare and move data between the two sides without caring which is
//! which. The core defines *what* an entity can do; collaborators (the
//! change dispatcher, the deletion store) are injected by the consumer.
//!
//! All methods are **synchronous** and may block on the remote boundary.
//! Consumers that run on an async runtime wrap calls with their own
//! offloading (e.g. `spawn_blocking`). Generics over this trait
//! monomorphize at compile time, so there is no dynamic dispatch overhead
//! in the sync hot path.

use std::io::Read;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::SyncError;
use crate::monitor::Monitor;

/// One sync relationship: a local root paired with a remote root.
///
/// Consumed, never mutated, by this crate. `id` keys watch-registry
/// entries; the remote-root fields drive path relativization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Stable identifier of this sync relationship.
    pub id: String,
    /// Root directory on the local side.
    pub local_root: String,
    /// Path of the remote root, relative to the server root.
    pub remote_root_path: String,
    /// Fully-qualified identity of the remote root entity.
    pub remote_root_id: String,
}

/// External store that records which entity ids have been deleted.
///
/// The sync engine consults it to distinguish "never existed" from
/// "deleted on this side"; this crate only notifies it before issuing a
/// remote delete.
pub trait DeletionLog: Send + Sync {
    /// Record that the entity with the given id is being deleted.
    fn record(&self, id: &str) -> Result<(), SyncError>;
}

/// Capability set of a syncable entity.
///
/// Reading the entity's content goes through the [`Read`] supertrait: the
/// entity itself is the byte stream, opened with [`open()`](Syncer::open)
/// and released with [`close()`](Syncer::close).
pub trait Syncer: Read + Send {
    /// Globally unique, stable identity of the entity. Resolving the same
    /// path twice yields the same id.
    fn id(&self) -> &str;

    /// Path relative to the profile's remote root.
    ///
    /// Returns the bare path when this entity *is* the profile's remote
    /// root; otherwise the profile's root path is stripped as a prefix.
    fn path(&self, profile: &Profile) -> String;

    /// Whether a live remote object currently backs this entity.
    fn exists(&self) -> bool;

    /// Whether this entity was deleted through [`delete()`](Syncer::delete).
    fn deleted(&self) -> bool;

    /// Whether the entity is a directory. Always `false` when the entity
    /// does not exist.
    fn is_dir(&self) -> bool;

    /// Size in bytes. Zero when the entity does not exist.
    fn size(&self) -> u64;

    /// Last modification time. `None` for directories and for entities
    /// that do not exist.
    fn modified(&self) -> Option<DateTime<Utc>>;

    /// Child entities, in whatever order the backing store returns them.
    /// Empty (not an error) when the entity does not exist.
    fn children(&self) -> Result<Vec<Self>, SyncError>
    where
        Self: Sized;

    /// Open the entity for reading. The returned reader is the entity
    /// itself; callers must [`close()`](Syncer::close) it when done.
    fn open(&mut self) -> Result<&mut dyn Read, SyncError>;

    /// Release the read stream opened via [`open()`](Syncer::open).
    fn close(&mut self) -> Result<(), SyncError>;

    /// Replace the entity's content from `reader`.
    ///
    /// The reader is taken by value and released on every return path.
    fn write<R: Read>(
        &mut self,
        reader: R,
        size: u64,
        mod_time: DateTime<Utc>,
    ) -> Result<(), SyncError>
    where
        Self: Sized;

    /// Delete the entity, recording the deletion and tearing down any
    /// watches on it first. No-op success when the entity does not exist.
    fn delete(
        &mut self,
        monitor: &Monitor<Self>,
        deletions: &dyn DeletionLog,
    ) -> Result<(), SyncError>
    where
        Self: Sized;

    /// Rename the entity out of the way with a timestamp suffix, keeping
    /// its data. Used when a conflicting write would otherwise overwrite.
    fn rename(&mut self) -> Result<(), SyncError>;

    /// Create a directory at this entity's path and return a fresh entity
    /// for it.
    fn create_dir(&self) -> Result<Self, SyncError>
    where
        Self: Sized;

    /// Start monitoring this directory entity for changes.
    fn start_monitor(&self, profile: &Profile, monitor: &Monitor<Self>) -> Result<(), SyncError>
    where
        Self: Sized,
    {
        monitor.start(profile, self)
    }

    /// Stop monitoring this directory entity, recursively releasing every
    /// watched descendant directory first.
    fn stop_monitor(&self, profile: &Profile, monitor: &Monitor<Self>) -> Result<(), SyncError>
    where
        Self: Sized,
    {
        monitor.stop(profile, self)
    }
}
