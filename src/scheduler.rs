//! A background scheduler that runs named tasks (e.g., [`FetchTogglesTask`]) on fixed intervals.
//!
//! [`FetchTogglesTask`]: crate::FetchTogglesTask
use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use rand::{thread_rng, Rng};
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// A task that can be driven by the [`Scheduler`].
#[async_trait]
pub trait ScheduledTask: Send + Sync {
    /// Stable task identifier, used in logs.
    fn name(&self) -> &str;

    /// Time to wait between invocations.
    fn interval(&self) -> Duration;

    /// If `true`, the task runs once as soon as the scheduler starts, in addition to the periodic
    /// schedule.
    fn execute_during_startup(&self) -> bool;

    /// Run one invocation.
    ///
    /// The scheduler never runs two invocations of the same task concurrently. Implementations
    /// should return [`Error::Cancelled`] promptly once `cancel` fires.
    async fn execute(&self, cancel: &CancellationToken) -> Result<()>;
}

/// Configuration for [`Scheduler`].
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Maximum random duration subtracted from each task interval. This helps to avoid multiple
    /// client instances synchronizing and producing spiky network load.
    ///
    /// Defaults to [`SchedulerConfig::DEFAULT_JITTER`].
    pub jitter: Duration,
}

impl SchedulerConfig {
    /// Default value for [`SchedulerConfig::jitter`].
    pub const DEFAULT_JITTER: Duration = Duration::from_secs(3);

    /// Create a new `SchedulerConfig` using default configuration.
    pub fn new() -> SchedulerConfig {
        SchedulerConfig::default()
    }

    /// Update interval jitter with `jitter`.
    pub fn with_jitter(mut self, jitter: Duration) -> SchedulerConfig {
        self.jitter = jitter;
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> SchedulerConfig {
        SchedulerConfig {
            jitter: SchedulerConfig::DEFAULT_JITTER,
        }
    }
}

/// A scheduler thread.
///
/// The scheduler owns a background thread with a single-threaded tokio runtime. Each registered
/// task gets its own loop on that runtime, so different tasks run concurrently while invocations
/// of the same task are strictly sequential. A failing or panicking invocation is logged and does
/// not affect other tasks or later invocations.
///
/// Dropping the scheduler stops it without waiting for the thread to exit.
pub struct Scheduler {
    /// `None` only after [`Scheduler::shutdown`] took it.
    join_handle: Option<std::thread::JoinHandle<()>>,

    /// Cancelled to stop the scheduler. Also passed into every task invocation.
    cancel: CancellationToken,
}

impl Scheduler {
    /// Starts the scheduler thread.
    ///
    /// # Errors
    ///
    /// - IO Error if the scheduler thread failed to start.
    pub fn start(tasks: Vec<Arc<dyn ScheduledTask>>) -> std::io::Result<Scheduler> {
        Scheduler::start_with_config(tasks, SchedulerConfig::default())
    }

    /// Starts the scheduler thread with the provided configuration.
    ///
    /// # Errors
    ///
    /// - IO Error if the scheduler thread failed to start.
    pub fn start_with_config(
        tasks: Vec<Arc<dyn ScheduledTask>>,
        config: SchedulerConfig,
    ) -> std::io::Result<Scheduler> {
        let cancel = CancellationToken::new();

        let join_handle = {
            let cancel = cancel.clone();
            std::thread::Builder::new()
                .name("toggle-scheduler".to_owned())
                .spawn(move || {
                    let runtime = match tokio::runtime::Builder::new_current_thread()
                        .enable_all()
                        .build()
                    {
                        Ok(runtime) => runtime,
                        Err(err) => {
                            log::error!(target: "toggle", "failed to start scheduler runtime: {err}");
                            return;
                        }
                    };

                    runtime.block_on(async move {
                        let mut loops = tokio::task::JoinSet::new();
                        for task in tasks {
                            loops.spawn(run_task(task, config.jitter, cancel.clone()));
                        }
                        while loops.join_next().await.is_some() {}
                    });

                    log::debug!(target: "toggle", "scheduler thread stopped");
                })?
        };

        Ok(Scheduler {
            join_handle: Some(join_handle),
            cancel,
        })
    }

    /// Token that is cancelled when the scheduler stops.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop the scheduler. In-flight invocations receive the cancellation signal.
    ///
    /// This function does not wait for the thread to actually stop.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Stop the scheduler and block waiting for its thread to exit.
    ///
    /// If you don't need to wait for the thread to exit, use [`Scheduler::stop`] instead.
    ///
    /// # Errors
    ///
    /// - [`Error::SchedulerThreadPanicked`] if the thread has panicked.
    pub fn shutdown(mut self) -> Result<()> {
        self.stop();

        if let Some(join_handle) = self.join_handle.take() {
            join_handle
                .join()
                .map_err(|_| Error::SchedulerThreadPanicked)?;
        }

        Ok(())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_task(task: Arc<dyn ScheduledTask>, max_jitter: Duration, cancel: CancellationToken) {
    if task.execute_during_startup() {
        run_once(&task, &cancel).await;
    }

    loop {
        let delay = jitter(task.interval(), max_jitter);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::debug!(target: "toggle", task:display = task.name(); "task loop received stop command");
                return;
            }
            _ = tokio::time::sleep(delay) => {}
        }
        run_once(&task, &cancel).await;
    }
}

/// Run a single invocation, isolating its errors and panics.
async fn run_once(task: &Arc<dyn ScheduledTask>, cancel: &CancellationToken) {
    let invocation = {
        let task = Arc::clone(task);
        let cancel = cancel.clone();
        tokio::spawn(async move { task.execute(&cancel).await })
    };

    match invocation.await {
        Ok(Ok(())) => {}
        Ok(Err(Error::Cancelled)) => {
            log::debug!(target: "toggle", task:display = task.name(); "task invocation cancelled");
        }
        Ok(Err(err)) => {
            log::warn!(target: "toggle", task:display = task.name(); "task invocation failed: {err}");
        }
        Err(err) if err.is_panic() => {
            log::error!(target: "toggle", task:display = task.name(); "task invocation panicked");
        }
        Err(_) => {
            // Runtime is shutting down.
        }
    }
}

/// Apply randomized `jitter` to `interval`.
fn jitter(interval: Duration, jitter: Duration) -> Duration {
    Duration::saturating_sub(interval, thread_rng().gen_range(Duration::ZERO..=jitter))
}
