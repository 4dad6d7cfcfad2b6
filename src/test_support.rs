//! Test doubles shared by unit tests.
use std::{
    collections::{HashMap, VecDeque},
    io::{self, Read, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{
    api_client::{ApiClient, FetchTogglesResult},
    persistence::FileSystem,
    Result,
};

/// Replays queued responses and records the etags it was called with.
pub struct FakeApiClient {
    responses: Mutex<VecDeque<Result<FetchTogglesResult>>>,
    requested_etags: Mutex<Vec<String>>,
}

impl FakeApiClient {
    pub fn new() -> FakeApiClient {
        FakeApiClient {
            responses: Mutex::new(VecDeque::new()),
            requested_etags: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, response: Result<FetchTogglesResult>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn requested_etags(&self) -> Vec<String> {
        self.requested_etags.lock().unwrap().clone()
    }
}

#[async_trait]
impl ApiClient for FakeApiClient {
    async fn fetch_toggles(
        &self,
        etag: &str,
        _cancel: &CancellationToken,
    ) -> Result<FetchTogglesResult> {
        self.requested_etags.lock().unwrap().push(etag.to_owned());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(FetchTogglesResult::Unchanged))
    }
}

/// Never completes, so only cancellation can end a fetch.
pub struct PendingApiClient;

#[async_trait]
impl ApiClient for PendingApiClient {
    async fn fetch_toggles(
        &self,
        _etag: &str,
        _cancel: &CancellationToken,
    ) -> Result<FetchTogglesResult> {
        std::future::pending().await
    }
}

type Files = Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>;

/// In-memory [`FileSystem`] with switchable write failures.
#[derive(Default)]
pub struct MemoryFileSystem {
    files: Files,
    fail_toggle_writes: bool,
    fail_etag_writes: bool,
}

impl MemoryFileSystem {
    pub fn new() -> MemoryFileSystem {
        MemoryFileSystem::default()
    }

    /// Make `open_create` fail.
    pub fn fail_toggle_writes(mut self) -> MemoryFileSystem {
        self.fail_toggle_writes = true;
        self
    }

    /// Make `write_all_text` fail.
    pub fn fail_etag_writes(mut self) -> MemoryFileSystem {
        self.fail_etag_writes = true;
        self
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path.as_ref()).cloned()
    }
}

fn disk_full() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "no space left on device")
}

struct MemoryWriter {
    files: Files,
    path: PathBuf,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.files
            .lock()
            .unwrap()
            .entry(self.path.clone())
            .or_default()
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl FileSystem for MemoryFileSystem {
    fn open_create(&self, path: &Path) -> io::Result<Box<dyn Write + '_>> {
        if self.fail_toggle_writes {
            return Err(disk_full());
        }
        self.files
            .lock()
            .unwrap()
            .insert(path.to_owned(), Vec::new());
        Ok(Box::new(MemoryWriter {
            files: self.files.clone(),
            path: path.to_owned(),
        }))
    }

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        let contents = self
            .contents(path)
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
        Ok(Box::new(io::Cursor::new(contents)))
    }

    fn write_all_text(&self, path: &Path, text: &str) -> io::Result<()> {
        if self.fail_etag_writes {
            return Err(disk_full());
        }
        self.files
            .lock()
            .unwrap()
            .insert(path.to_owned(), text.as_bytes().to_vec());
        Ok(())
    }

    fn read_all_text(&self, path: &Path) -> io::Result<String> {
        let contents = self
            .contents(path)
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
        String::from_utf8(contents).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }
}
