//! Remote API client that fetches toggle definitions using conditional requests.
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, ETAG, IF_NONE_MATCH},
    StatusCode, Url,
};
use tokio_util::sync::CancellationToken;

use crate::{Error, Result, ToggleSet};

/// Outcome of a conditional fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchTogglesResult {
    /// The server reports that toggles have not changed since the supplied etag.
    Unchanged,
    /// The server returned a toggle set.
    Changed {
        /// Validator identifying `toggles`. May be empty if the server did not send one.
        etag: String,
        toggles: ToggleSet,
    },
}

/// A client that fetches toggles from the remote service.
///
/// Implementations issue a single request per call and do not retry: the next scheduled fetch is
/// the retry.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Fetch toggles, passing `etag` (the last known validator, possibly empty) so that the server
    /// can reply with [`FetchTogglesResult::Unchanged`].
    ///
    /// Should return [`Error::Cancelled`] promptly once `cancel` is triggered.
    async fn fetch_toggles(
        &self,
        etag: &str,
        cancel: &CancellationToken,
    ) -> Result<FetchTogglesResult>;
}

/// Configuration for [`HttpApiClient`].
#[derive(Debug, Clone)]
pub struct HttpApiClientConfig {
    pub base_url: String,
    pub app_name: String,
    pub instance_id: String,
    /// Extra headers sent with every request (e.g., `Authorization`).
    pub custom_headers: Vec<(String, String)>,
}

const FEATURES_ENDPOINT: &str = "client/features";

const APP_NAME_HEADER: &str = "unleash-appname";
const INSTANCE_ID_HEADER: &str = "unleash-instanceid";

/// [`ApiClient`] over HTTP.
pub struct HttpApiClient {
    // Client holds a connection pool internally, so we're reusing the client between requests.
    client: reqwest::Client,
    url: Url,
    headers: HeaderMap,
}

impl HttpApiClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidBaseUrl`] if `base_url` cannot be parsed.
    /// - [`Error::InvalidHeader`] if identification or custom headers are not valid header values.
    pub fn new(config: HttpApiClientConfig) -> Result<HttpApiClient> {
        // Joining replaces the last path segment unless the base ends with a slash.
        let base_url = if config.base_url.ends_with('/') {
            config.base_url
        } else {
            format!("{}/", config.base_url)
        };
        let url = Url::parse(&base_url)
            .and_then(|base| base.join(FEATURES_ENDPOINT))
            .map_err(Error::InvalidBaseUrl)?;

        let mut headers = HeaderMap::new();
        headers.insert(APP_NAME_HEADER, header_value(&config.app_name)?);
        headers.insert(INSTANCE_ID_HEADER, header_value(&config.instance_id)?);
        for (name, value) in &config.custom_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::InvalidHeader(name.clone()))?;
            headers.insert(name, header_value(value)?);
        }

        Ok(HttpApiClient {
            client: reqwest::Client::new(),
            url,
            headers,
        })
    }

    /// URL toggles are fetched from.
    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn send(&self, etag: &str) -> Result<FetchTogglesResult> {
        let mut request = self.client.get(self.url.clone()).headers(self.headers.clone());
        if !etag.is_empty() {
            match HeaderValue::from_str(etag) {
                Ok(value) => request = request.header(IF_NONE_MATCH, value),
                Err(_) => {
                    // A corrupted etag would otherwise fail every fetch. Fetch everything instead.
                    log::warn!(target: "toggle", etag:debug = etag; "etag is not a valid header value, fetching unconditionally");
                }
            }
        }

        log::debug!(target: "toggle", etag:display = etag; "fetching toggles");
        let response = request.send().await?;

        match response.status() {
            StatusCode::NOT_MODIFIED => {
                log::debug!(target: "toggle", "toggles not modified");
                Ok(FetchTogglesResult::Unchanged)
            }
            status if status.is_success() => {
                let new_etag = match response.headers().get(ETAG) {
                    Some(value) => match value.to_str() {
                        Ok(value) => value.to_owned(),
                        Err(_) => {
                            log::warn!(target: "toggle", "etag header is not visible ASCII");
                            String::from_utf8_lossy(value.as_bytes()).into_owned()
                        }
                    },
                    None => String::new(),
                };
                let toggles: ToggleSet = response.json().await?;
                log::debug!(target: "toggle", etag:display = new_etag, toggles = toggles.len(); "successfully fetched toggles");
                Ok(FetchTogglesResult::Changed {
                    etag: new_etag,
                    toggles,
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                log::warn!(target: "toggle", "client is not authorized. Check your API token");
                Err(Error::Unauthorized)
            }
            status => {
                log::warn!(target: "toggle", "received unexpected response while fetching toggles: {status}");
                Err(Error::UnexpectedStatus(status))
            }
        }
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn fetch_toggles(
        &self,
        etag: &str,
        cancel: &CancellationToken,
    ) -> Result<FetchTogglesResult> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            result = self.send(etag) => result,
        }
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| Error::InvalidHeader(value.to_owned()))
}

#[cfg(test)]
mod tests {
    use tokio_util::sync::CancellationToken;

    use super::{ApiClient, HttpApiClient, HttpApiClientConfig};
    use crate::Error;

    fn config(base_url: &str) -> HttpApiClientConfig {
        HttpApiClientConfig {
            base_url: base_url.to_owned(),
            app_name: "checkout".to_owned(),
            instance_id: "checkout-1".to_owned(),
            custom_headers: vec![("Authorization".to_owned(), "secret".to_owned())],
        }
    }

    #[test]
    fn builds_features_url() {
        let client = HttpApiClient::new(config("https://toggles.example.com/api")).unwrap();
        assert_eq!(
            client.url().as_str(),
            "https://toggles.example.com/api/client/features"
        );

        let client = HttpApiClient::new(config("https://toggles.example.com/api/")).unwrap();
        assert_eq!(
            client.url().as_str(),
            "https://toggles.example.com/api/client/features"
        );
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(matches!(
            HttpApiClient::new(config("not a url")),
            Err(Error::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn rejects_invalid_custom_header() {
        let mut config = config("https://toggles.example.com/api");
        config.custom_headers = vec![("bad header".to_owned(), "x".to_owned())];

        assert!(matches!(
            HttpApiClient::new(config),
            Err(Error::InvalidHeader(_))
        ));
    }

    #[tokio::test]
    async fn cancelled_fetch_returns_promptly() {
        // Reserved TEST-NET address: connecting would hang until the transport timeout.
        let client = HttpApiClient::new(config("http://192.0.2.1:81/api")).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = client.fetch_toggles("", &cancel).await;

        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
