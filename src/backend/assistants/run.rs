use crate::backend::BackendError;
use std::future::Future;
use std::time::Duration;
use tracing::info;

pub const COMPLETED_STATUS: &str = "completed";

/// Fixed-interval, fixed-ceiling polling. No backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(4),
            max_attempts: 20,
        }
    }
}

/// Poll `fetch_status` until it reports `completed` or the ceiling is hit.
///
/// Sleeps only between polls; the last attempt is followed directly by the
/// timeout error.
pub async fn poll_until_completed<F, Fut>(
    policy: PollPolicy,
    mut fetch_status: F,
) -> Result<u32, BackendError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String, BackendError>>,
{
    for attempt in 1..=policy.max_attempts {
        let status = fetch_status().await?;
        info!(run_num = attempt, status = %status, "waiting for run");

        if status == COMPLETED_STATUS {
            return Ok(attempt);
        }
        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    Err(BackendError::Timeout {
        attempts: policy.max_attempts,
        interval: policy.interval,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn instant() -> PollPolicy {
        PollPolicy {
            interval: Duration::ZERO,
            max_attempts: 20,
        }
    }

    #[tokio::test]
    async fn completes_after_third_poll() {
        let statuses = ["queued", "in_progress", "completed"];
        let polls = Cell::new(0usize);

        let attempts = poll_until_completed(instant(), || {
            let index = polls.get();
            polls.set(index + 1);
            async move { Ok(statuses[index].to_string()) }
        })
        .await
        .unwrap();

        assert_eq!(attempts, 3);
        assert_eq!(polls.get(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_exactly_twenty_polls() {
        let polls = Cell::new(0u32);

        let err = poll_until_completed(instant(), || {
            polls.set(polls.get() + 1);
            async { Ok("in_progress".to_string()) }
        })
        .await
        .unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(polls.get(), 20);
    }

    #[tokio::test]
    async fn failed_status_keeps_polling_until_ceiling() {
        let polls = Cell::new(0u32);
        let policy = PollPolicy {
            interval: Duration::ZERO,
            max_attempts: 3,
        };

        let err = poll_until_completed(policy, || {
            polls.set(polls.get() + 1);
            async { Ok("failed".to_string()) }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, BackendError::Timeout { attempts: 3, .. }));
        assert_eq!(polls.get(), 3);
    }

    #[tokio::test]
    async fn fetch_error_stops_polling() {
        let polls = Cell::new(0u32);

        let err = poll_until_completed(instant(), || {
            polls.set(polls.get() + 1);
            async {
                Err(BackendError::Status {
                    status: 404,
                    body: "no run".into(),
                })
            }
        })
        .await
        .unwrap_err();

        assert!(!err.is_timeout());
        assert_eq!(polls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_only_between_polls() {
        let policy = PollPolicy {
            interval: Duration::from_secs(4),
            max_attempts: 3,
        };
        let start = tokio::time::Instant::now();

        let _ = poll_until_completed(policy, || async { Ok("queued".to_string()) }).await;

        assert_eq!(start.elapsed(), Duration::from_secs(8));
    }
}
