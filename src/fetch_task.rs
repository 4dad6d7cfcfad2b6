//! Scheduled task that fetches toggles from the remote API and reconciles them into the toggle
//! snapshot and the local backup.
use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{
    api_client::{ApiClient, FetchTogglesResult},
    persistence::{write_toggles, FileSystem, ToggleSerializer},
    scheduler::ScheduledTask,
    Error, Result, ToggleSnapshot,
};

/// Fetches toggles with a conditional request and publishes them when they change.
///
/// The task remembers the etag of the last toggle set it published. A response is only applied
/// when it carries a non-empty etag that differs from the remembered one. Applying a response
/// publishes the new set to the [`ToggleSnapshot`] first and then writes the backup files. Backup
/// writes are best-effort: failures are logged and never undo the in-memory update.
pub struct FetchTogglesTask {
    api_client: Arc<dyn ApiClient>,
    snapshot: Arc<ToggleSnapshot>,
    fs: Arc<dyn FileSystem>,
    serializer: Arc<dyn ToggleSerializer>,
    toggle_file: PathBuf,
    etag_file: PathBuf,
    /// Etag of the last published toggle set. Only touched between awaits, never held across the
    /// network call.
    etag: Mutex<String>,
    interval: Duration,
    execute_during_startup: bool,
}

impl FetchTogglesTask {
    /// Name under which the task is registered with the scheduler.
    pub const NAME: &'static str = "fetch-feature-toggles-task";

    /// Default value for [`FetchTogglesTask::interval`].
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

    pub fn new(
        api_client: Arc<dyn ApiClient>,
        snapshot: Arc<ToggleSnapshot>,
        fs: Arc<dyn FileSystem>,
        serializer: Arc<dyn ToggleSerializer>,
        toggle_file: impl Into<PathBuf>,
        etag_file: impl Into<PathBuf>,
    ) -> FetchTogglesTask {
        FetchTogglesTask {
            api_client,
            snapshot,
            fs,
            serializer,
            toggle_file: toggle_file.into(),
            etag_file: etag_file.into(),
            etag: Mutex::new(String::new()),
            interval: FetchTogglesTask::DEFAULT_INTERVAL,
            execute_during_startup: true,
        }
    }

    /// Seed the remembered etag, usually with the one restored from backup.
    pub fn with_etag(self, etag: impl Into<String>) -> FetchTogglesTask {
        *self.etag.lock().unwrap_or_else(|p| p.into_inner()) = etag.into();
        self
    }

    /// Update fetch interval with `interval`.
    pub fn with_interval(mut self, interval: Duration) -> FetchTogglesTask {
        self.interval = interval;
        self
    }

    /// Whether the scheduler should also run the task right away on start.
    pub fn with_execute_during_startup(mut self, value: bool) -> FetchTogglesTask {
        self.execute_during_startup = value;
        self
    }

    /// Etag of the last published toggle set (empty if none).
    pub fn etag(&self) -> String {
        self.etag.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn toggle_file(&self) -> &Path {
        &self.toggle_file
    }

    pub fn etag_file(&self) -> &Path {
        &self.etag_file
    }

    /// Run one fetch cycle.
    ///
    /// # Errors
    ///
    /// - [`Error::Cancelled`] if `cancel` fires before the remote call completes. No state is
    ///   changed in that case.
    /// - Any error returned by the [`ApiClient`]. No state is changed in that case either.
    ///
    /// Backup write failures are logged and never reported.
    pub async fn execute(&self, cancel: &CancellationToken) -> Result<()> {
        let current_etag = self.etag();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::debug!(target: "toggle", "toggle fetch cancelled");
                return Err(Error::Cancelled);
            }
            result = self.api_client.fetch_toggles(&current_etag, cancel) => result?,
        };

        let (etag, toggles) = match result {
            FetchTogglesResult::Unchanged => return Ok(()),
            FetchTogglesResult::Changed { etag, toggles } => (etag, toggles),
        };

        if etag.is_empty() {
            log::warn!(target: "toggle", "ignoring toggle response without etag");
            return Ok(());
        }

        if etag == current_etag {
            log::debug!(target: "toggle", etag:display = etag; "toggles already up to date");
            return Ok(());
        }

        let toggles = Arc::new(toggles);
        self.snapshot.set(Arc::clone(&toggles));
        log::debug!(target: "toggle", etag:display = etag, toggles = toggles.len(); "published new toggles");

        if let Err(err) = write_toggles(&*self.fs, &*self.serializer, &self.toggle_file, &toggles)
        {
            log::error!(target: "toggle", path:display = self.toggle_file.display(); "failed to write toggle file: {err}");
        }

        *self.etag.lock().unwrap_or_else(|p| p.into_inner()) = etag.clone();

        if let Err(err) = self.fs.write_all_text(&self.etag_file, &etag) {
            log::error!(target: "toggle", path:display = self.etag_file.display(); "failed to write etag file: {err}");
        }

        Ok(())
    }
}

#[async_trait]
impl ScheduledTask for FetchTogglesTask {
    fn name(&self) -> &str {
        FetchTogglesTask::NAME
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn execute_during_startup(&self) -> bool {
        self.execute_during_startup
    }

    async fn execute(&self, cancel: &CancellationToken) -> Result<()> {
        FetchTogglesTask::execute(self, cancel).await
    }
}
