use std::sync::Arc;

use crate::{
    api_client::{ApiClient, HttpApiClient, HttpApiClientConfig},
    persistence::{load_backup, FileSystem, JsonSerializer, StdFileSystem},
    scheduler::{ScheduledTask, Scheduler, SchedulerConfig},
    strategies::StrategyRegistry,
    ClientConfig, Context, Evaluator, FetchTogglesTask, Result, ToggleSnapshot,
};

/// A feature toggle client.
///
/// On creation, the client restores toggles from the local backup, so evaluation works even if the
/// remote API is unreachable. Call [`Client::start_scheduler`] to keep toggles up to date.
///
/// # Examples
/// ```no_run
/// # use toggle_core::{ClientConfig, Context};
/// let client = ClientConfig::new("checkout", "https://toggles.example.com/api")
///     .to_client()
///     .unwrap();
/// let scheduler = client.start_scheduler().unwrap();
///
/// if client.is_enabled("new-checkout", &Context::new().with_user_id("42")) {
///     // ...
/// }
///
/// scheduler.shutdown().unwrap();
/// ```
pub struct Client {
    snapshot: Arc<ToggleSnapshot>,
    evaluator: Evaluator,
    fetch_task: Arc<FetchTogglesTask>,
    scheduler_config: SchedulerConfig,
}

impl Client {
    /// Create a new client fetching toggles over HTTP.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidBaseUrl`](crate::Error::InvalidBaseUrl) if the base URL is invalid.
    /// - [`Error::InvalidHeader`](crate::Error::InvalidHeader) if a header can't be sent.
    pub fn new(config: ClientConfig) -> Result<Client> {
        let api_client = HttpApiClient::new(HttpApiClientConfig {
            base_url: config.base_url.clone(),
            app_name: config.app_name.clone(),
            instance_id: config.instance_id.clone(),
            custom_headers: config.custom_headers.clone(),
        })?;
        Ok(Client::with_api_client(
            config,
            Arc::new(api_client),
            Arc::new(StdFileSystem),
        ))
    }

    /// Create a new client with a custom API client and backup filesystem.
    pub fn with_api_client(
        config: ClientConfig,
        api_client: Arc<dyn ApiClient>,
        fs: Arc<dyn FileSystem>,
    ) -> Client {
        let toggle_file = config.toggle_file_path();
        let etag_file = config.etag_file_path();
        let serializer = Arc::new(JsonSerializer);

        let backup = load_backup(&*fs, &*serializer, &toggle_file, &etag_file);
        let snapshot = Arc::new(ToggleSnapshot::with_toggles(backup.toggles));

        let mut strategies = StrategyRegistry::with_builtin_strategies();
        for strategy in config.strategies {
            let name = strategy.name().to_owned();
            strategies.register(name, strategy);
        }

        let fetch_task = FetchTogglesTask::new(
            api_client,
            snapshot.clone(),
            fs,
            serializer,
            toggle_file,
            etag_file,
        )
        .with_etag(backup.etag)
        .with_interval(config.fetch_interval)
        .with_execute_during_startup(config.fetch_during_startup);

        Client {
            evaluator: Evaluator::new(snapshot.clone(), Arc::new(strategies)),
            snapshot,
            fetch_task: Arc::new(fetch_task),
            scheduler_config: SchedulerConfig::new().with_jitter(config.fetch_jitter),
        }
    }

    /// Returns `true` if the toggle is enabled for `context`. Unknown toggles are disabled.
    pub fn is_enabled(&self, toggle_name: &str, context: &Context) -> bool {
        self.evaluator.is_enabled(toggle_name, context)
    }

    /// Returns `true` if the toggle is enabled for `context`, or `default` if the toggle is
    /// unknown.
    pub fn is_enabled_or(&self, toggle_name: &str, context: &Context, default: bool) -> bool {
        self.evaluator.is_enabled_or(toggle_name, context, default)
    }

    /// Names of currently known toggles.
    pub fn toggle_names(&self) -> Vec<String> {
        self.evaluator.toggle_names()
    }

    /// Start a scheduler thread that periodically fetches toggles.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`](crate::Error::Io) if the scheduler thread failed to start.
    pub fn start_scheduler(&self) -> Result<Scheduler> {
        let tasks: Vec<Arc<dyn ScheduledTask>> = vec![self.fetch_task.clone()];
        Ok(Scheduler::start_with_config(
            tasks,
            self.scheduler_config.clone(),
        )?)
    }

    /// The fetch task, e.g. to trigger a fetch manually.
    pub fn fetch_task(&self) -> &Arc<FetchTogglesTask> {
        &self.fetch_task
    }

    /// The snapshot evaluation reads from.
    pub fn snapshot(&self) -> &Arc<ToggleSnapshot> {
        &self.snapshot
    }
}
