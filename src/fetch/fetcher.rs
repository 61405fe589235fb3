//! Ordered, concurrent batch fetching of canvas descriptors.
//!
//! A batch assigns each URI its input index before anything is dispatched,
//! then drives every fetch concurrently on the calling task. Each finished
//! fetch writes only its own slot, so the returned [`FetchBatch`] is in input
//! order no matter which responses arrive first.
//!
//! Individual failures never fail the batch: a resource that exhausts its
//! attempts, or is still in flight when the batch deadline passes, leaves an
//! absent slot.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use reqwest::Client;
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::FetchError;
use super::retry::{RetryDecision, RetryPolicy, classify_error};
use crate::http_client::{HttpSettings, build_http_client};

/// Default wall-clock budget for one batch.
pub const DEFAULT_TOTAL_TIMEOUT: Duration = Duration::from_secs(60);

/// Batch fetch behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    /// Per-resource retry policy.
    pub retry: RetryPolicy,
    /// Deadline for the whole batch, measured from dispatch.
    pub total_timeout: Duration,
    /// Maximum requests in flight at once; `None` fans out to every URI.
    pub max_in_flight: Option<usize>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            total_timeout: DEFAULT_TOTAL_TIMEOUT,
            max_in_flight: None,
        }
    }
}

/// Counters for one batch.
///
/// `succeeded + failed + abandoned` equals the batch length once the batch
/// has returned.
#[derive(Debug, Default)]
pub struct FetchStats {
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    retried: AtomicUsize,
    abandoned: AtomicUsize,
}

impl FetchStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resources whose payload was retrieved.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.succeeded.load(Ordering::SeqCst)
    }

    /// Resources that ran out of attempts or failed permanently.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Retry attempts made across the batch.
    #[must_use]
    pub fn retried(&self) -> usize {
        self.retried.load(Ordering::SeqCst)
    }

    /// Resources still in flight when the deadline passed.
    #[must_use]
    pub fn abandoned(&self) -> usize {
        self.abandoned.load(Ordering::SeqCst)
    }

    fn increment_succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::SeqCst);
    }

    fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    fn increment_retried(&self) {
        self.retried.fetch_add(1, Ordering::SeqCst);
    }

    fn add_failed(&self, count: usize) {
        self.failed.fetch_add(count, Ordering::SeqCst);
    }

    fn add_abandoned(&self, count: usize) {
        self.abandoned.fetch_add(count, Ordering::SeqCst);
    }
}

/// One slot of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    /// Position of the URI in the input.
    pub index: usize,
    /// Decoded body, or `None` when the resource could not be retrieved.
    pub payload: Option<Value>,
}

impl FetchResult {
    /// Whether the slot holds a payload.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.payload.is_some()
    }
}

/// Outcome of [`ResourceFetcher::fetch_all`].
#[derive(Debug)]
pub struct FetchBatch {
    results: Vec<FetchResult>,
    abandoned: Vec<usize>,
    stats: FetchStats,
}

impl FetchBatch {
    fn from_slots(slots: Vec<Option<Value>>, stats: FetchStats) -> Self {
        let results = slots
            .into_iter()
            .enumerate()
            .map(|(index, payload)| FetchResult { index, payload })
            .collect();
        Self {
            results,
            abandoned: Vec::new(),
            stats,
        }
    }

    fn with_abandoned(mut self, abandoned: Vec<usize>) -> Self {
        self.abandoned = abandoned;
        self
    }

    /// Every slot, in input order; length equals the input length.
    #[must_use]
    pub fn results(&self) -> &[FetchResult] {
        &self.results
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether the batch had no input.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Indices still in flight when the batch deadline passed, ascending.
    #[must_use]
    pub fn abandoned_indices(&self) -> &[usize] {
        &self.abandoned
    }

    /// Number of slots holding a payload.
    #[must_use]
    pub fn present_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_present()).count()
    }

    /// Batch counters.
    #[must_use]
    pub fn stats(&self) -> &FetchStats {
        &self.stats
    }

    /// Present payloads, in input order, with absent slots removed.
    #[must_use]
    pub fn into_payloads(self) -> Vec<Value> {
        self.results.into_iter().filter_map(|r| r.payload).collect()
    }
}

/// Fetches JSON resources concurrently with retry and a batch deadline.
#[derive(Debug, Clone, Default)]
pub struct ResourceFetcher {
    settings: FetchSettings,
    http: HttpSettings,
}

impl ResourceFetcher {
    /// Creates a fetcher. Each batch builds its own client from `http`.
    #[must_use]
    pub fn new(settings: FetchSettings, http: HttpSettings) -> Self {
        Self { settings, http }
    }

    /// Fetches every URI and returns one slot per input, in input order.
    ///
    /// Never fails: exhausted, permanently failed and abandoned resources
    /// leave absent slots and are logged.
    #[instrument(skip(self, uris), fields(count = uris.len()))]
    pub async fn fetch_all(&self, uris: &[String]) -> FetchBatch {
        let stats = FetchStats::new();
        let mut slots: Vec<Option<Value>> = vec![None; uris.len()];
        if uris.is_empty() {
            return FetchBatch::from_slots(slots, stats);
        }

        let client = match build_http_client(&self.http) {
            Ok(client) => client,
            Err(error) => {
                warn!(error = %error, count = uris.len(), "could not build batch client");
                stats.add_failed(uris.len());
                return FetchBatch::from_slots(slots, stats);
            }
        };

        let deadline = Instant::now() + self.settings.total_timeout;
        let limiter = self
            .settings
            .max_in_flight
            .map(|cap| Semaphore::new(cap.clamp(1, Semaphore::MAX_PERMITS)));

        let mut abandoned = Vec::new();
        info!(
            max_attempts = self.settings.retry.max_attempts(),
            total_timeout_ms = self.settings.total_timeout.as_millis(),
            max_in_flight = ?self.settings.max_in_flight,
            "starting batch"
        );

        {
            let client = &client;
            let policy = &self.settings.retry;
            let stats_ref = &stats;
            let limiter = limiter.as_ref();

            let mut pending: FuturesUnordered<_> = uris
                .iter()
                .enumerate()
                .map(|(index, uri)| async move {
                    let _permit = match limiter {
                        Some(semaphore) => semaphore.acquire().await.ok(),
                        None => None,
                    };
                    (index, fetch_with_retry(client, uri, policy, stats_ref).await)
                })
                .collect();

            let mut settled = vec![false; uris.len()];
            loop {
                match tokio::time::timeout_at(deadline, pending.next()).await {
                    Ok(Some((index, Ok(payload)))) => {
                        settled[index] = true;
                        stats.increment_succeeded();
                        slots[index] = Some(payload);
                    }
                    Ok(Some((index, Err((error, attempts))))) => {
                        settled[index] = true;
                        warn!(
                            index,
                            url = %uris[index],
                            attempts,
                            error = %error,
                            "resource unavailable"
                        );
                        stats.increment_failed();
                    }
                    Ok(None) => break,
                    Err(_) => {
                        stats.add_abandoned(pending.len());
                        warn!(
                            abandoned = pending.len(),
                            "batch deadline passed; abandoning in-flight fetches"
                        );
                        for (index, uri) in abandoned_uris(uris, &settled) {
                            warn!(index, url = %uri, "abandoned at batch deadline");
                            abandoned.push(index);
                        }
                        break;
                    }
                }
            }
        }

        info!(
            succeeded = stats.succeeded(),
            failed = stats.failed(),
            retried = stats.retried(),
            abandoned = stats.abandoned(),
            "batch finished"
        );
        FetchBatch::from_slots(slots, stats).with_abandoned(abandoned)
    }

    /// Runs [`Self::fetch_all`] on a spawned task.
    pub fn spawn_all(&self, uris: Vec<String>) -> JoinHandle<FetchBatch> {
        let fetcher = self.clone();
        tokio::spawn(async move { fetcher.fetch_all(&uris).await })
    }
}

/// Inputs whose fetch had not finished when the batch stopped.
fn abandoned_uris<'a>(
    uris: &'a [String],
    settled: &'a [bool],
) -> impl Iterator<Item = (usize, &'a str)> + 'a {
    uris.iter()
        .zip(settled)
        .enumerate()
        .filter(|(_, (_, done))| !**done)
        .map(|(index, (uri, _))| (index, uri.as_str()))
}

/// Fetches one resource, retrying per `policy`.
///
/// Returns the error of the last attempt together with the attempt count.
#[instrument(skip(client, policy, stats), fields(url = %url))]
async fn fetch_with_retry(
    client: &Client,
    url: &str,
    policy: &RetryPolicy,
    stats: &FetchStats,
) -> Result<Value, (FetchError, u32)> {
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        debug!(attempt, "attempting fetch");

        match fetch_once(client, url).await {
            Ok(payload) => return Ok(payload),
            Err(e) => match policy.should_retry(classify_error(&e), attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next_attempt,
                } => {
                    info!(
                        url,
                        attempt = next_attempt,
                        max_attempts = policy.max_attempts(),
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "retrying fetch"
                    );
                    stats.increment_retried();
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(url, %reason, "not retrying fetch");
                    return Err((e, attempt));
                }
            },
        }
    }
}

async fn fetch_once(client: &Client, url: &str) -> Result<Value, FetchError> {
    Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::from_reqwest(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::http_status(url, status.as_u16()));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| FetchError::from_reqwest(url, e))?;

    serde_json::from_slice(&body).map_err(|e| FetchError::decode(url, e.to_string()))
}
