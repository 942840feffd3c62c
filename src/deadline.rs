//! Deadlines for external calls
//!
//! Every call that leaves the process (oracle, retrieval, speech services)
//! goes through [`with_deadline`] so a hung peer becomes a typed error.

use crate::error::AssistantError;
use crate::Result;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

pub async fn with_deadline<T, F>(operation: &'static str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation, seconds = limit.as_secs(), "Deadline exceeded");
            Err(AssistantError::Timeout {
                operation,
                seconds: limit.as_secs(),
            })
        }
    }
}
