// Poll a submission until the backend reports a terminal status
use arbiter_common::config::PollPolicy;
use tracing::{debug, warn};

use crate::client::{ExecutionBackend, SubmissionRecord};
use crate::error::{HarnessError, Result};

/// Wait for `token` to leave the queued/processing states.
///
/// Sleeps `policy.interval` between attempts without holding a thread, and
/// gives up with `HarnessError::Timeout` after `policy.max_attempts` fetches.
/// Fetch errors are propagated immediately.
pub async fn await_result<B>(backend: &B, token: &str, policy: &PollPolicy) -> Result<SubmissionRecord>
where
    B: ExecutionBackend + ?Sized,
{
    for attempt in 1..=policy.max_attempts {
        let record = backend.fetch(token).await?;
        if !record.status.is_pending() {
            debug!(
                token = token,
                attempt = attempt,
                status = %record.status.description,
                "Submission finished"
            );
            return Ok(record);
        }
        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    warn!(
        token = token,
        attempts = policy.max_attempts,
        ceiling_ms = policy.ceiling().as_millis() as u64,
        "Submission did not finish before poll ceiling"
    );
    Err(HarnessError::Timeout {
        token: token.to_string(),
        attempts: policy.max_attempts,
    })
}
