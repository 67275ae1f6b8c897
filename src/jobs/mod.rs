//! Background producers for the reconciler.
//!
//! Each job is spawned once and returns a [`JobHandle`]; dropping the
//! handle (view teardown) or calling `shutdown` cancels the task.

use tokio::task::JoinHandle;

pub mod account_poll;
pub mod notification_poll;

pub struct JobHandle {
    name: &'static str,
    task: Option<JoinHandle<()>>,
}

impl JobHandle {
    pub(crate) fn new(name: &'static str, task: JoinHandle<()>) -> Self {
        Self { name, task: Some(task) }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Cancel the job and wait for it to stop.
    pub async fn shutdown(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
            tracing::debug!(job = self.name, "job stopped");
        }
    }
}

impl Drop for JobHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_drop_cancels_task() {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<()>(1);
        let handle = JobHandle::new(
            "test",
            tokio::spawn(async move {
                let _tx = tx;
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }),
        );
        drop(handle);

        // the task's sender is dropped once the abort lands
        let closed = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await;
        assert_eq!(closed, Ok(None));
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_stop() {
        let handle = JobHandle::new("test", tokio::spawn(std::future::pending::<()>()));
        assert!(!handle.is_finished());
        handle.shutdown().await;
    }
}
