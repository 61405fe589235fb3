//! HTTP client construction shared by every harvester network call.
//!
//! Work resolutions and fetch batches each build their own client from
//! [`HttpSettings`] and drop it when they finish, so no connection pool
//! outlives the unit of work that opened it.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use reqwest::{Client, ClientBuilder, Proxy};
use thiserror::Error;
use tracing::warn;

use crate::user_agent;

/// Default connect timeout for repository and canvas requests.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default whole-request timeout for a single attempt.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised while building an HTTP client.
#[derive(Debug, Error)]
pub enum HttpClientError {
    /// The reqwest builder rejected the configuration.
    #[error("HTTP client construction failed: {source}")]
    Build {
        /// Underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// The platform proxy lookup panicked on both the default and fallback builders.
    #[error("HTTP client construction panicked while initializing networking")]
    Panicked,
}

/// Timeouts and identity applied to every client the harvester builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    /// TCP/TLS connect timeout.
    pub connect_timeout: Duration,
    /// Timeout for one complete request/response exchange.
    pub request_timeout: Duration,
    /// User-Agent header value.
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: user_agent::default_user_agent(),
        }
    }
}

/// Builds a client from the given settings.
///
/// # Errors
///
/// Returns [`HttpClientError`] when the client cannot be constructed.
pub fn build_http_client(settings: &HttpSettings) -> Result<Client, HttpClientError> {
    match try_build(settings, false) {
        Ok(client) => Ok(client),
        Err(BuildFailure::Panic) => {
            // Restricted sandboxes can panic while reading system proxy
            // settings; retry with env proxies only.
            warn!("HTTP client hit system proxy panic; using env-proxy fallback builder");
            match try_build(settings, true) {
                Ok(client) => Ok(client),
                Err(BuildFailure::Panic) => Err(HttpClientError::Panicked),
                Err(BuildFailure::Build(source)) => Err(HttpClientError::Build { source }),
            }
        }
        Err(BuildFailure::Build(source)) => Err(HttpClientError::Build { source }),
    }
}

enum BuildFailure {
    Panic,
    Build(reqwest::Error),
}

fn try_build(settings: &HttpSettings, env_proxy_only: bool) -> Result<Client, BuildFailure> {
    catch_unwind(AssertUnwindSafe(|| {
        let mut builder = base_builder(settings);
        if env_proxy_only {
            builder = apply_env_proxies(builder.no_proxy());
        }
        builder.build().map_err(BuildFailure::Build)
    }))
    .map_err(|_| BuildFailure::Panic)?
}

fn base_builder(settings: &HttpSettings) -> ClientBuilder {
    Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .user_agent(settings.user_agent.clone())
        .gzip(true)
}

fn apply_env_proxies(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = first_env_var(&["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"])
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    if let Some(proxy) = first_env_var(&["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"])
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn first_env_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
