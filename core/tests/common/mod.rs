//! Shared test utilities for tether core integration tests.
//!
//! Provides an in-memory remote store implementing the `RemoteClient`
//! boundary, plus recording implementations of the injected
//! collaborators (change dispatcher, deletion log).

// Each integration test is compiled as its own crate, so not every test
// file uses every helper from this shared module. Suppress dead_code
// warnings.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use tether_core::errors::{RemoteError, SyncError};
use tether_core::monitor::Monitor;
use tether_core::remote::utils::{base_name, join_locator, parent_dir};
use tether_core::remote::{RemoteClient, RemoteFile, RemoteHandle};
use tether_core::syncer::{DeletionLog, Profile, Syncer};

pub const ROOT: &str = "https://server.example";

#[derive(Clone)]
struct Entry {
    handle: RemoteHandle,
    data: Vec<u8>,
}

/// In-memory remote store with boundary-call counters and fault
/// injection for directory listings.
pub struct InMemoryRemote {
    files: Mutex<HashMap<String, Entry>>,
    cursors: Mutex<HashMap<String, usize>>,
    fail_listing: Mutex<HashSet<String>>,
    pub delete_calls: AtomicUsize,
    pub upload_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
}

impl InMemoryRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            files: Mutex::new(HashMap::new()),
            cursors: Mutex::new(HashMap::new()),
            fail_listing: Mutex::new(HashSet::new()),
            delete_calls: AtomicUsize::new(0),
            upload_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
        })
    }

    fn build_handle(url: &str, size: u64, is_dir: bool, modified: Option<DateTime<Utc>>) -> RemoteHandle {
        RemoteHandle {
            name: base_name(url).to_string(),
            url: url.to_string(),
            locator: join_locator(ROOT, url),
            size,
            is_dir,
            modified,
        }
    }

    pub fn seed_file(&self, url: &str, data: &[u8], modified: DateTime<Utc>) {
        let handle = Self::build_handle(url, data.len() as u64, false, Some(modified));
        self.files.lock().insert(
            url.to_string(),
            Entry {
                handle,
                data: data.to_vec(),
            },
        );
    }

    pub fn seed_dir(&self, url: &str) {
        let handle = Self::build_handle(url, 0, true, None);
        self.files.lock().insert(
            url.to_string(),
            Entry {
                handle,
                data: Vec::new(),
            },
        );
    }

    /// Make every subsequent listing of `url` fail.
    pub fn fail_listing_of(&self, url: &str) {
        self.fail_listing.lock().insert(url.to_string());
    }

    pub fn has_url(&self, url: &str) -> bool {
        self.files.lock().contains_key(url)
    }

    pub fn content_of(&self, url: &str) -> Option<Vec<u8>> {
        self.files.lock().get(url).map(|e| e.data.clone())
    }
}

impl RemoteClient for InMemoryRemote {
    fn fetch(&self, path: &str) -> Result<Option<RemoteHandle>, RemoteError> {
        Ok(self.files.lock().get(path).map(|e| e.handle.clone()))
    }

    fn root_locator(&self) -> String {
        ROOT.to_string()
    }

    fn list_children(&self, handle: &RemoteHandle) -> Result<Vec<RemoteHandle>, RemoteError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing.lock().contains(&handle.url) {
            return Err(RemoteError::OperationFailed(format!(
                "listing {} failed",
                handle.url
            )));
        }
        Ok(self
            .files
            .lock()
            .values()
            .filter(|e| parent_dir(&e.handle.url) == handle.url)
            .map(|e| e.handle.clone())
            .collect())
    }

    fn read_stream(&self, handle: &RemoteHandle, buf: &mut [u8]) -> Result<usize, RemoteError> {
        let files = self.files.lock();
        let entry = files
            .get(&handle.url)
            .ok_or_else(|| RemoteError::NotFound(handle.url.clone()))?;
        let mut cursors = self.cursors.lock();
        let pos = cursors.entry(handle.locator.clone()).or_insert(0);
        let n = buf.len().min(entry.data.len() - *pos);
        buf[..n].copy_from_slice(&entry.data[*pos..*pos + n]);
        *pos += n;
        Ok(n)
    }

    fn close_stream(&self, handle: &RemoteHandle) -> Result<(), RemoteError> {
        self.cursors.lock().remove(&handle.locator);
        Ok(())
    }

    fn upload_from_reader(
        &self,
        name: &str,
        reader: &mut dyn Read,
        _size: u64,
        mod_time: DateTime<Utc>,
        dest: &RemoteHandle,
    ) -> Result<RemoteHandle, RemoteError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        let url = if dest.url == "/" {
            format!("/{name}")
        } else {
            format!("{}/{}", dest.url.trim_end_matches('/'), name)
        };
        let handle = Self::build_handle(&url, data.len() as u64, false, Some(mod_time));
        self.files.lock().insert(
            url,
            Entry {
                handle: handle.clone(),
                data,
            },
        );
        Ok(handle)
    }

    fn delete(&self, handle: &RemoteHandle) -> Result<(), RemoteError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.files.lock().remove(&handle.url);
        Ok(())
    }

    fn move_to(&self, handle: &mut RemoteHandle, new_path: &str) -> Result<(), RemoteError> {
        let mut files = self.files.lock();
        let mut entry = files
            .remove(&handle.url)
            .ok_or_else(|| RemoteError::NotFound(handle.url.clone()))?;
        entry.handle.name = base_name(new_path).to_string();
        entry.handle.url = new_path.to_string();
        entry.handle.locator = join_locator(ROOT, new_path);
        *handle = entry.handle.clone();
        files.insert(new_path.to_string(), entry);
        Ok(())
    }

    fn create_folder(&self, path: &str) -> Result<(), RemoteError> {
        self.seed_dir(path);
        Ok(())
    }
}

/// Change events recorded by the dispatcher, as (profile id, entity id).
pub type Dispatched = Arc<Mutex<Vec<(String, String)>>>;

/// Build a monitor whose dispatcher records every change event.
pub fn recording_monitor() -> (Monitor<RemoteFile>, Dispatched) {
    let dispatched: Dispatched = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&dispatched);
    let monitor = Monitor::new(Box::new(move |profile: &Profile, entity: &RemoteFile| {
        sink.lock()
            .push((profile.id.clone(), entity.id().to_string()));
    }));
    (monitor, dispatched)
}

/// Deletion log that records every id handed to it.
pub struct RecordingDeletions {
    pub ids: Mutex<Vec<String>>,
}

impl RecordingDeletions {
    pub fn new() -> Self {
        Self {
            ids: Mutex::new(Vec::new()),
        }
    }
}

impl DeletionLog for RecordingDeletions {
    fn record(&self, id: &str) -> Result<(), SyncError> {
        self.ids.lock().push(id.to_string());
        Ok(())
    }
}

/// Profile rooted at `/docs` on the in-memory remote.
pub fn docs_profile(id: &str) -> Profile {
    Profile {
        id: id.to_string(),
        local_root: "/home/user/docs".to_string(),
        remote_root_path: "/docs".to_string(),
        remote_root_id: join_locator(ROOT, "/docs"),
    }
}
