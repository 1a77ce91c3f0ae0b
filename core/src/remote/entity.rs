//! The remote syncable entity.
//!
//! A [`RemoteFile`] represents one remote path, which may or may not
//! currently exist on the server. Absence is a first-class state: most
//! sync operations reason about paths before the first upload, so
//! resolving a missing path yields a placeholder entity rather than an
//! error. The backing state is a sum type, making the live/absent
//! distinction exhaustive at compile time.

use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use tracing::warn;

use crate::errors::SyncError;
use crate::monitor::Monitor;
use crate::remote::utils::{base_name, join_locator, parent_dir, split_extension};
use crate::remote::{RemoteClient, RemoteHandle};
use crate::syncer::{DeletionLog, Profile, Syncer};

/// What currently backs the entity on the remote side.
#[derive(Clone)]
enum Backing {
    /// A live remote object; the handle is exclusively owned.
    Live(RemoteHandle),
    /// Nothing exists at the path yet (or anymore).
    Absent,
}

/// A file or directory on the remote server, as seen by the sync engine.
///
/// Holds a shared, non-owning reference to the [`RemoteClient`] used for
/// all operations; the client outlives any individual entity. Cloning an
/// entity clones its handle and shares the client.
#[derive(Clone)]
pub struct RemoteFile {
    client: Arc<dyn RemoteClient>,
    name: String,
    url: String,
    full_url: String,
    backing: Backing,
    deleted: bool,
}

impl RemoteFile {
    /// Resolve `path` against the remote store.
    ///
    /// A path the store reports as not-found yields a placeholder entity
    /// (`exists() == false`) whose identity is synthesized from the
    /// client's root locator. Any other boundary failure propagates
    /// unchanged.
    pub fn resolve(client: Arc<dyn RemoteClient>, path: &str) -> Result<Self, SyncError> {
        if path.is_empty() {
            return Err(SyncError::InvalidArgument(
                "cannot resolve an empty path".to_string(),
            ));
        }
        match client.fetch(path)? {
            Some(handle) => Ok(Self::from_handle(client, handle)),
            None => Ok(Self::placeholder(client, path)),
        }
    }

    fn from_handle(client: Arc<dyn RemoteClient>, handle: RemoteHandle) -> Self {
        Self {
            client,
            name: handle.name.clone(),
            url: handle.url.clone(),
            full_url: handle.locator.clone(),
            backing: Backing::Live(handle),
            deleted: false,
        }
    }

    fn placeholder(client: Arc<dyn RemoteClient>, path: &str) -> Self {
        let full_url = join_locator(&client.root_locator(), path);
        Self {
            client,
            name: base_name(path).to_string(),
            url: path.to_string(),
            full_url,
            backing: Backing::Absent,
            deleted: false,
        }
    }

    /// The client this entity performs its operations through.
    pub fn client(&self) -> &Arc<dyn RemoteClient> {
        &self.client
    }

    /// Base name component of the entity's path.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path relative to the remote server root.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn handle(&self) -> Option<&RemoteHandle> {
        match &self.backing {
            Backing::Live(handle) => Some(handle),
            Backing::Absent => None,
        }
    }
}

impl Syncer for RemoteFile {
    fn id(&self) -> &str {
        &self.full_url
    }

    fn path(&self, profile: &Profile) -> String {
        if self.id() == profile.remote_root_id {
            return self.url.clone();
        }
        match self.url.strip_prefix(profile.remote_root_path.as_str()) {
            Some(stripped) => stripped.to_string(),
            None => {
                warn!(
                    url = %self.url,
                    remote_root = %profile.remote_root_path,
                    "entity url is outside the profile's remote root; returning it unstripped"
                );
                self.url.clone()
            }
        }
    }

    fn exists(&self) -> bool {
        matches!(self.backing, Backing::Live(_))
    }

    fn deleted(&self) -> bool {
        self.deleted
    }

    fn is_dir(&self) -> bool {
        self.handle().map(|h| h.is_dir).unwrap_or(false)
    }

    fn size(&self) -> u64 {
        self.handle().map(|h| h.size).unwrap_or(0)
    }

    fn modified(&self) -> Option<DateTime<Utc>> {
        match self.handle() {
            Some(handle) if !handle.is_dir => handle.modified,
            _ => None,
        }
    }

    fn children(&self) -> Result<Vec<Self>, SyncError> {
        let handle = match &self.backing {
            Backing::Live(handle) => handle,
            Backing::Absent => return Ok(Vec::new()),
        };
        let listed = self.client.list_children(handle)?;
        Ok(listed
            .into_iter()
            .map(|h| Self::from_handle(Arc::clone(&self.client), h))
            .collect())
    }

    fn open(&mut self) -> Result<&mut dyn Read, SyncError> {
        Ok(self)
    }

    fn close(&mut self) -> Result<(), SyncError> {
        match &self.backing {
            Backing::Live(handle) => Ok(self.client.close_stream(handle)?),
            Backing::Absent => Err(SyncError::NotFound(format!(
                "cannot close {}: no remote file backs it",
                self.url
            ))),
        }
    }

    /// Replace the entity's content from `reader`.
    ///
    /// An existing remote object is deleted first, then the new content is
    /// uploaded into the parent directory. These are two separate remote
    /// calls: there is a window in which the object does not exist, and no
    /// rollback is attempted if the upload fails after the delete. The
    /// reader is consumed and dropped on every return path.
    fn write<R: Read>(
        &mut self,
        mut reader: R,
        size: u64,
        mod_time: DateTime<Utc>,
    ) -> Result<(), SyncError> {
        if self.is_dir() {
            return Err(SyncError::InvalidOperation(format!(
                "cannot write directory {} through a byte stream",
                self.url
            )));
        }
        if let Backing::Live(handle) = &self.backing {
            self.client.delete(handle)?;
        }
        let dir_url = parent_dir(&self.url);
        let dest = RemoteHandle {
            name: base_name(dir_url).to_string(),
            url: dir_url.to_string(),
            locator: join_locator(&self.client.root_locator(), dir_url),
            size: 0,
            is_dir: true,
            modified: None,
        };
        let new_handle =
            self.client
                .upload_from_reader(&self.name, &mut reader, size, mod_time, &dest)?;
        self.backing = Backing::Live(new_handle);
        self.deleted = false;
        Ok(())
    }

    fn delete(
        &mut self,
        monitor: &Monitor<Self>,
        deletions: &dyn DeletionLog,
    ) -> Result<(), SyncError> {
        let handle = match &self.backing {
            Backing::Live(handle) => handle.clone(),
            Backing::Absent => return Ok(()),
        };
        deletions.record(self.id())?;
        if handle.is_dir {
            // The directory is going away for every profile watching it.
            monitor.unwatch_tree(self)?;
        }
        self.client.delete(&handle)?;
        self.backing = Backing::Absent;
        self.deleted = true;
        Ok(())
    }

    /// Rename the file out of the way with a second-precision timestamp
    /// inserted before the extension.
    ///
    /// Two renames of the same path within one wall-clock second produce
    /// the same target name; the second move then fails at the boundary.
    fn rename(&mut self) -> Result<(), SyncError> {
        if !self.exists() {
            return Err(SyncError::InvalidState(format!(
                "cannot rename {}: no remote file backs it",
                self.url
            )));
        }
        if self.is_dir() {
            return Err(SyncError::InvalidOperation(format!(
                "cannot rename directory {}",
                self.url
            )));
        }
        let target = {
            let (stem, ext) = split_extension(&self.url);
            let stamp = Local::now().format("%b %e %H:%M:%S");
            format!("{stem}{stamp}{ext}")
        };
        if let Backing::Live(handle) = &mut self.backing {
            self.client.move_to(handle, &target)?;
            self.name = handle.name.clone();
            self.url = handle.url.clone();
            self.full_url = handle.locator.clone();
        }
        Ok(())
    }

    fn create_dir(&self) -> Result<Self, SyncError> {
        self.client.create_folder(&self.url)?;
        Self::resolve(Arc::clone(&self.client), &self.url)
    }
}

impl Read for RemoteFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &self.backing {
            Backing::Live(handle) => self
                .client
                .read_stream(handle, buf)
                .map_err(io::Error::other),
            Backing::Absent => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no remote file backs {}", self.url),
            )),
        }
    }
}

impl fmt::Debug for RemoteFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteFile")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("full_url", &self.full_url)
            .field("exists", &self.exists())
            .field("deleted", &self.deleted)
            .finish()
    }
}

/// Metadata view of the entity, matching the wire shape state stores and
/// frontends consume: `name`, `path`, `fullUrl`, `modified`.
impl Serialize for RemoteFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("RemoteFile", 4)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("path", &self.url)?;
        state.serialize_field("fullUrl", &self.full_url)?;
        state.serialize_field("modified", &self.modified())?;
        state.end()
    }
}
