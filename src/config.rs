use std::{path::PathBuf, sync::Arc, time::Duration};

use rand::{thread_rng, Rng};

use crate::{strategies::Strategy, Client, Result};

/// Configuration for [`Client`].
///
/// # Examples
/// ```
/// # use std::time::Duration;
/// # use toggle_core::ClientConfig;
/// let config = ClientConfig::new("checkout", "https://toggles.example.com/api")
///     .custom_header("Authorization", "client-token")
///     .fetch_interval(Duration::from_secs(15))
///     .backup_dir("/var/cache/checkout");
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    pub(crate) app_name: String,
    pub(crate) instance_id: String,
    /// `true` until `instance_id` is set explicitly.
    instance_id_generated: bool,
    pub(crate) base_url: String,
    pub(crate) custom_headers: Vec<(String, String)>,
    pub(crate) fetch_interval: Duration,
    pub(crate) fetch_jitter: Duration,
    pub(crate) fetch_during_startup: bool,
    pub(crate) backup_dir: PathBuf,
    pub(crate) toggle_file: Option<PathBuf>,
    pub(crate) etag_file: Option<PathBuf>,
    pub(crate) strategies: Vec<Arc<dyn Strategy>>,
}

impl ClientConfig {
    /// Default value for [`ClientConfig::fetch_interval`].
    pub const DEFAULT_FETCH_INTERVAL: Duration = Duration::from_secs(30);
    /// Default value for [`ClientConfig::fetch_jitter`].
    pub const DEFAULT_FETCH_JITTER: Duration = Duration::from_secs(3);

    /// Create a default configuration for application `app_name` talking to the API at
    /// `base_url`.
    pub fn new(app_name: impl Into<String>, base_url: impl Into<String>) -> ClientConfig {
        ClientConfig {
            app_name: app_name.into(),
            instance_id: generated_instance_id(),
            instance_id_generated: true,
            base_url: base_url.into(),
            custom_headers: Vec::new(),
            fetch_interval: ClientConfig::DEFAULT_FETCH_INTERVAL,
            fetch_jitter: ClientConfig::DEFAULT_FETCH_JITTER,
            fetch_during_startup: true,
            backup_dir: std::env::temp_dir(),
            toggle_file: None,
            etag_file: None,
            strategies: Vec::new(),
        }
    }

    /// Override the instance id reported to the server. Defaults to a random id, generated anew for
    /// every configuration.
    ///
    /// An explicit instance id also becomes part of the default backup file names.
    pub fn instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = instance_id.into();
        self.instance_id_generated = false;
        self
    }

    /// Override base URL for API calls.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Send an extra header with every API request.
    pub fn custom_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.push((name.into(), value.into()));
        self
    }

    /// Interval between toggle fetches.
    pub fn fetch_interval(mut self, interval: Duration) -> Self {
        self.fetch_interval = interval;
        self
    }

    /// Maximum random duration subtracted from each fetch interval.
    pub fn fetch_jitter(mut self, jitter: Duration) -> Self {
        self.fetch_jitter = jitter;
        self
    }

    /// Whether to fetch as soon as the scheduler starts. Defaults to `true`.
    pub fn fetch_during_startup(mut self, value: bool) -> Self {
        self.fetch_during_startup = value;
        self
    }

    /// Directory holding backup files. Defaults to the system temporary directory.
    pub fn backup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backup_dir = dir.into();
        self
    }

    /// Override the toggle backup file path.
    pub fn toggle_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.toggle_file = Some(path.into());
        self
    }

    /// Override the etag backup file path.
    pub fn etag_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.etag_file = Some(path.into());
        self
    }

    /// Register an additional strategy. Replaces a built-in strategy with the same name.
    pub fn strategy(mut self, strategy: impl Strategy + 'static) -> Self {
        self.strategies.push(Arc::new(strategy));
        self
    }

    /// Path of the toggle backup file.
    pub fn toggle_file_path(&self) -> PathBuf {
        self.toggle_file
            .clone()
            .unwrap_or_else(|| self.backup_dir.join(format!("{}-toggles.json", self.file_prefix())))
    }

    /// Path of the etag backup file.
    pub fn etag_file_path(&self) -> PathBuf {
        self.etag_file
            .clone()
            .unwrap_or_else(|| self.backup_dir.join(format!("{}-toggles.etag", self.file_prefix())))
    }

    /// A generated instance id changes on every start, so it is left out of backup file names.
    fn file_prefix(&self) -> String {
        let prefix = if self.instance_id_generated {
            self.app_name.clone()
        } else {
            format!("{}-{}", self.app_name, self.instance_id)
        };
        prefix
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }

    /// Create a new [`Client`] using the specified configuration.
    ///
    /// # Errors
    ///
    /// See [`Client::new`].
    pub fn to_client(self) -> Result<Client> {
        Client::new(self)
    }
}

/// Random instance id. Deployments that need a stable id should set
/// [`ClientConfig::instance_id`].
fn generated_instance_id() -> String {
    format!("generated-{:016x}", thread_rng().gen::<u64>())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::ClientConfig;

    #[test]
    fn derives_backup_paths_from_app_and_instance() {
        let config = ClientConfig::new("checkout/web", "https://toggles.example.com/api")
            .instance_id("pod 1")
            .backup_dir("/var/cache");

        assert_eq!(
            config.toggle_file_path(),
            PathBuf::from("/var/cache/checkout_web-pod_1-toggles.json")
        );
        assert_eq!(
            config.etag_file_path(),
            PathBuf::from("/var/cache/checkout_web-pod_1-toggles.etag")
        );
    }

    #[test]
    fn generated_instance_id_is_not_part_of_backup_paths() {
        let first = ClientConfig::new("checkout", "https://toggles.example.com/api")
            .backup_dir("/var/cache");
        let second = ClientConfig::new("checkout", "https://toggles.example.com/api")
            .backup_dir("/var/cache");

        assert_eq!(
            first.toggle_file_path(),
            PathBuf::from("/var/cache/checkout-toggles.json")
        );
        assert_eq!(first.toggle_file_path(), second.toggle_file_path());
        assert_eq!(first.etag_file_path(), second.etag_file_path());
    }

    #[test]
    fn explicit_paths_override_backup_dir() {
        let config = ClientConfig::new("checkout", "https://toggles.example.com/api")
            .backup_dir("/var/cache")
            .toggle_file("/data/t.json")
            .etag_file("/data/t.etag");

        assert_eq!(config.toggle_file_path(), PathBuf::from("/data/t.json"));
        assert_eq!(config.etag_file_path(), PathBuf::from("/data/t.etag"));
    }

    #[test]
    fn generates_random_instance_id() {
        let first = ClientConfig::new("checkout", "https://toggles.example.com/api");
        let second = ClientConfig::new("checkout", "https://toggles.example.com/api");

        assert!(first.instance_id.starts_with("generated-"));
        assert_eq!(first.instance_id.len(), "generated-".len() + 16);
        assert_ne!(first.instance_id, second.instance_id);
    }
}
