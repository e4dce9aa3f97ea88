//! Backend trait.
//!
//! The [`Backend`] trait is the opaque "run and get counts" capability the
//! rest of Obfusq relies on:
//!
//! ```text
//!   capabilities() ──→ validate() ──→ submit() ──→ status() ──→ result()
//!    (sync, &ref)       (async)       (async)      (async)      (async)
//! ```
//!
//! [`Backend::execute`] chains the whole lifecycle and is what callers
//! normally use.
//!
//! | Method | Kind | Required | Returns |
//! |--------|------|----------|---------|
//! | `name()` | sync | yes | `&str` |
//! | `capabilities()` | sync | yes | `&Capabilities` |
//! | `validate()` | async | provided | `HalResult<()>` |
//! | `submit()` | async | yes | `HalResult<JobId>` |
//! | `status()` | async | yes | `HalResult<JobStatus>` |
//! | `result()` | async | yes | `HalResult<ExecutionResult>` |
//! | `wait()` | async | provided | `HalResult<ExecutionResult>` |
//! | `execute()` | async | provided | `HalResult<ExecutionResult>` |

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use obfusq_ir::Circuit;

use crate::capability::Capabilities;
use crate::error::{HalError, HalResult};
use crate::job::{JobId, JobStatus};
use crate::result::ExecutionResult;

/// Polling interval used by [`Backend::wait`].
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Trait for execution backends.
///
/// # Contract
///
/// - `capabilities()` is synchronous and infallible; implementations cache
///   them at construction time.
/// - `validate()` checks shots and register size before submission.
/// - `submit()` returns a `JobId` that `status()` and `result()` accept.
/// - `result()` is only meaningful once `status()` reports `Completed`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// Get the capabilities of this backend.
    fn capabilities(&self) -> &Capabilities;

    /// Validate a program and shot count against backend constraints.
    async fn validate(&self, circuit: &Circuit, shots: u32) -> HalResult<()> {
        self.capabilities().check(circuit, shots)
    }

    /// Submit a program for execution.
    async fn submit(&self, circuit: &Circuit, shots: u32) -> HalResult<JobId>;

    /// Get the status of a job.
    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus>;

    /// Get the result of a completed job.
    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult>;

    /// Wait for a job to reach a terminal state and return its result.
    ///
    /// Polls without bound: a job that never finishes blocks the caller.
    async fn wait(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        loop {
            match self.status(job_id).await? {
                JobStatus::Completed => return self.result(job_id).await,
                JobStatus::Failed(msg) => return Err(HalError::JobFailed(msg)),
                JobStatus::Queued | JobStatus::Running => {
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            }
        }
    }

    /// Validate, submit and wait: run a program and get its counts.
    async fn execute(&self, circuit: &Circuit, shots: u32) -> HalResult<ExecutionResult> {
        self.validate(circuit, shots).await?;
        let job_id = self.submit(circuit, shots).await?;
        debug!(backend = self.name(), job = %job_id, shots, "job submitted");
        self.wait(&job_id).await
    }
}
