use std::panic::{catch_unwind, AssertUnwindSafe};

use tokio::sync::oneshot;

use crate::{CancellationToken, Cancelled, TaskError};

/// Handle to a job running on tokio's blocking pool.
pub struct BlockingTask<T> {
    token: CancellationToken,
    rx: oneshot::Receiver<Result<T, TaskError>>,
}

impl<T> BlockingTask<T> {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Waits for the job, returning early with [`TaskError::Cancelled`] when
    /// the token fires. The job itself keeps running until it next polls the
    /// token.
    pub async fn join(self) -> Result<T, TaskError> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(TaskError::Cancelled),
            result = self.rx => match result {
                Ok(result) => result,
                Err(_) => Err(TaskError::Panicked),
            }
        }
    }
}

/// Runs `job` on tokio's blocking pool.
///
/// `job` receives a clone of `token` and is expected to poll it at its own
/// boundaries. If the token is already cancelled when the pool picks the job
/// up, `job` never runs.
pub fn spawn_blocking<T, F>(token: CancellationToken, job: F) -> BlockingTask<T>
where
    T: Send + 'static,
    F: FnOnce(&CancellationToken) -> Result<T, Cancelled> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let job_token = token.clone();
    tokio::task::spawn_blocking(move || {
        let result = if job_token.is_cancelled() {
            Err(TaskError::Cancelled)
        } else {
            match catch_unwind(AssertUnwindSafe(|| job(&job_token))) {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(Cancelled)) => Err(TaskError::Cancelled),
                Err(_) => {
                    tracing::error!(target = "nova.scheduler", "blocking task panicked");
                    Err(TaskError::Panicked)
                }
            }
        };
        // The receiver may have stopped waiting after cancellation.
        let _ = tx.send(result);
    });
    BlockingTask { token, rx }
}
