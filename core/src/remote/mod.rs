//! Remote-side entities and the client boundary they talk through.

pub mod entity;
pub mod utils;

pub use entity::RemoteFile;

use std::io::Read;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::RemoteError;

/// Descriptor of a file or directory as the remote store reports it.
///
/// Produced and refreshed by [`RemoteClient`] implementations; this crate
/// treats it as data. Field names are serialized as camelCase for
/// frontends and state stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteHandle {
    /// Base name component.
    pub name: String,
    /// Path relative to the remote server root.
    pub url: String,
    /// Fully-qualified locator (server root + url). Globally unique.
    pub locator: String,
    /// Size in bytes. Zero for directories.
    pub size: u64,
    pub is_dir: bool,
    /// Last modification time, `None` for directories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
}

/// Transport boundary to the remote store.
///
/// Implementations own the wire protocol, authentication, and any
/// retrying; this crate only calls through. All methods are synchronous
/// and may block. Implementations that need per-stream state (for
/// [`read_stream`](RemoteClient::read_stream) /
/// [`close_stream`](RemoteClient::close_stream)) key it on the handle's
/// `locator`.
pub trait RemoteClient: Send + Sync {
    /// Look up the handle at `path`.
    ///
    /// `Ok(None)` means the path does not currently exist on the remote
    /// store; any other failure is an error.
    fn fetch(&self, path: &str) -> Result<Option<RemoteHandle>, RemoteError>;

    /// Base locator of the remote server root, used to synthesize
    /// identities for paths that do not exist yet.
    fn root_locator(&self) -> String;

    /// List the direct children of a directory handle. No ordering is
    /// guaranteed.
    fn list_children(&self, handle: &RemoteHandle) -> Result<Vec<RemoteHandle>, RemoteError>;

    /// Read up to `buf.len()` bytes of the file's content into `buf`,
    /// returning the number of bytes read (zero at end of stream).
    fn read_stream(&self, handle: &RemoteHandle, buf: &mut [u8]) -> Result<usize, RemoteError>;

    /// Release any stream state held for the handle.
    fn close_stream(&self, handle: &RemoteHandle) -> Result<(), RemoteError>;

    /// Upload `size` bytes from `reader` as a file named `name` inside the
    /// directory described by `dest`, stamping it with `mod_time`.
    /// Returns the handle of the newly created remote object.
    fn upload_from_reader(
        &self,
        name: &str,
        reader: &mut dyn Read,
        size: u64,
        mod_time: DateTime<Utc>,
        dest: &RemoteHandle,
    ) -> Result<RemoteHandle, RemoteError>;

    /// Delete the remote object behind the handle.
    fn delete(&self, handle: &RemoteHandle) -> Result<(), RemoteError>;

    /// Move or rename the remote object to `new_path`. On success the
    /// handle's `url`, `locator` and `name` are refreshed in place.
    fn move_to(&self, handle: &mut RemoteHandle, new_path: &str) -> Result<(), RemoteError>;

    /// Create a directory at `path`.
    fn create_folder(&self, path: &str) -> Result<(), RemoteError>;
}
