//! Blocking JSON client shared by the HTTP providers.
//!
//! The provider traits in `waymark-core` are synchronous so the search worker
//! can stay a plain thread. Each provider owns a [`JsonClient`] that bridges
//! async `reqwest` calls onto that interface by blocking on a Tokio runtime.

use std::{future::Future, time::Duration};

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use url::Url;
use waymark_core::ProviderError;

/// Default user agent for provider requests.
pub const DEFAULT_USER_AGENT: &str = "waymark/0.1";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Error raised while constructing an HTTP provider.
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// The configured base URL does not parse.
    #[error("invalid base URL {url:?}: {source}")]
    BaseUrl {
        /// Offending URL.
        url: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },
}

/// Connection settings for an HTTP provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpProviderConfig {
    /// Service root, for example `"https://photon.komoot.io"`.
    pub base_url: String,
    /// Connect and request timeout.
    pub timeout: Duration,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl HttpProviderConfig {
    /// Configuration for `base_url` with the default timeout and user agent.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// HTTP client, runtime and base URL for one named provider.
pub(crate) struct JsonClient {
    provider: &'static str,
    client: Client,
    base_url: Url,
    timeout: Duration,
    runtime: Runtime,
}

impl std::fmt::Debug for JsonClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonClient")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish_non_exhaustive()
    }
}

impl JsonClient {
    pub(crate) fn new(
        provider: &'static str,
        config: &HttpProviderConfig,
    ) -> Result<Self, ProviderBuildError> {
        let base_url =
            Url::parse(config.base_url.trim_end_matches('/')).map_err(|source| {
                ProviderBuildError::BaseUrl {
                    url: config.base_url.clone(),
                    source,
                }
            })?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ProviderBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ProviderBuildError::Runtime)?;
        Ok(Self {
            provider,
            client,
            base_url,
            timeout: config.timeout,
            runtime,
        })
    }

    pub(crate) const fn provider(&self) -> &'static str {
        self.provider
    }

    /// Absolute URL for `path` below the base URL with `query` pairs appended.
    ///
    /// Any path already present on the base URL is kept as a prefix.
    pub(crate) fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Url {
        let mut url = self.base_url.clone();
        let joined = format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        url.set_path(&joined);
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        url
    }

    /// GET `url` and decode the JSON body.
    pub(crate) fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ProviderError> {
        log::debug!("{} GET {url}", self.provider);
        self.block_on(self.fetch(self.client.get(url)))
    }

    /// POST `form` to `url` as `application/x-www-form-urlencoded` and decode
    /// the JSON body.
    pub(crate) fn post_form_json<T: DeserializeOwned>(
        &self,
        url: Url,
        form: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        log::debug!("{} POST {url}", self.provider);
        self.block_on(self.fetch(self.client.post(url).form(form)))
    }

    /// Drive `future` to completion from synchronous code.
    ///
    /// Inside a multi-threaded runtime the caller's handle is used with
    /// [`tokio::task::block_in_place`]. Outside any runtime the client's own
    /// runtime is used. A `current_thread` runtime cannot be blocked from
    /// within, so such calls fail with [`ProviderError::Transport`].
    fn block_on<T, F>(&self, future: F) -> Result<T, ProviderError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            Ok(_) => {
                log::warn!("{} called from a single-thread runtime", self.provider);
                Err(ProviderError::Transport {
                    provider: self.provider,
                    message: "blocking provider called from a single-thread runtime".to_owned(),
                })
            }
            Err(_) => self.runtime.block_on(future),
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ProviderError> {
        let response = request
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err))?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(
                self.provider,
                status.as_u16(),
                message.trim(),
            ));
        }
        let body = response
            .bytes()
            .await
            .map_err(|err| self.convert_reqwest_error(&err))?;
        serde_json::from_slice(&body).map_err(|err| ProviderError::Parse {
            provider: self.provider,
            message: err.to_string(),
        })
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            return ProviderError::Timeout {
                provider: self.provider,
                timeout_secs: self.timeout.as_secs(),
            };
        }
        if let Some(status) = error.status() {
            return ProviderError::from_status(self.provider, status.as_u16(), error.to_string());
        }
        if error.is_decode() {
            return ProviderError::Parse {
                provider: self.provider,
                message: error.to_string(),
            };
        }
        ProviderError::Transport {
            provider: self.provider,
            message: error.to_string(),
        }
    }
}
