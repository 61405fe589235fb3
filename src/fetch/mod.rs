//! Concurrent retrieval of canvas descriptors.
//!
//! This module contains:
//! - [`ResourceFetcher`] - ordered batch fetching with a deadline
//! - [`RetryPolicy`] - per-resource retry and backoff decisions
//! - [`FetchError`] - failures of single attempts

mod error;
mod fetcher;
mod retry;

pub use error::FetchError;
pub use fetcher::{
    DEFAULT_TOTAL_TIMEOUT, FetchBatch, FetchResult, FetchSettings, FetchStats, ResourceFetcher,
};
pub use retry::{
    Backoff, DEFAULT_BACKOFF, DEFAULT_MAX_ATTEMPTS, FailureType, RetryDecision, RetryPolicy,
    classify_error,
};
