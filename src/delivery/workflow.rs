//! Workflow task wrapper
//!
//! There is deliberately no mid-poll cancellation token: every suspension
//! point is a plain timed wait, and the only way to cancel a running
//! workflow is to abort the task it runs on. This wrapper owns that task
//! and turns an external abort into the distinguishable `Interrupted`
//! outcome instead of a silent disappearance.

use crate::error::{Error, Result};
use std::future::Future;
use tokio::task::JoinHandle;

/// A delivery workflow running on its own task.
pub struct WorkflowHandle<T> {
    handle: JoinHandle<Result<T>>,
}

/// Run `workflow` on a dedicated task. Each concurrent delivery gets its
/// own handle; nothing is shared between them.
pub fn spawn_workflow<F, T>(workflow: F) -> WorkflowHandle<T>
where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    WorkflowHandle {
        handle: tokio::spawn(workflow),
    }
}

impl<T> WorkflowHandle<T> {
    /// Cancel the workflow at its next suspension point.
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Wait for the workflow's outcome. An aborted workflow yields
    /// `Error::Interrupted`; a workflow that panicked propagates the panic.
    pub async fn join(self) -> Result<T> {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => Err(Error::Interrupted),
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn completed_workflow_returns_its_value() {
        let handle = spawn_workflow(async { Ok(7u32) });
        assert_eq!(handle.join().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn aborted_workflow_surfaces_interrupted() {
        let handle = spawn_workflow(async {
            std::future::pending::<()>().await;
            Ok(())
        });
        handle.abort();
        assert!(matches!(handle.join().await, Err(Error::Interrupted)));
    }

    #[tokio::test]
    async fn workflow_error_passes_through() {
        let handle = spawn_workflow(async { Err::<(), _>(Error::Interrupted) });
        assert!(matches!(handle.join().await, Err(Error::Interrupted)));
    }
}
