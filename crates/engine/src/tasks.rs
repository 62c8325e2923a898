//! Spawned background work the engine can either await or let run free.
//!
//! Fan-out after a commit runs detached so a slow or dead photo server can
//! never fail the mutation that already committed; tests and callers that
//! need the outcome join instead.

use std::future::Future;

use tokio::task::JoinHandle;

/// A spawned unit of background work.
pub struct Task<T> {
    handle: JoinHandle<T>,
}

/// Spawn `work` onto the runtime.
pub fn spawn<F, T>(work: F) -> Task<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    Task {
        handle: tokio::spawn(work),
    }
}

impl<T> Task<T> {
    /// Wait for the task and return its output.
    ///
    /// A panic inside the task resumes on the joining side.
    pub async fn join(self) -> T {
        match self.handle.await {
            Ok(value) => value,
            Err(e) => match e.try_into_panic() {
                Ok(payload) => std::panic::resume_unwind(payload),
                Err(e) => panic!("joined task was cancelled: {e}"),
            },
        }
    }

    /// Let the task run to completion on its own.
    pub fn detach(self) {
        drop(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn join_returns_the_task_output() {
        let task = spawn(async { 2 + 2 });
        assert_eq!(task.join().await, 4);
    }

    #[tokio::test]
    async fn join_passes_errors_through_as_values() {
        let task = spawn(async { Err::<(), String>("boom".to_string()) });
        assert_eq!(task.join().await, Err("boom".to_string()));
    }

    #[tokio::test]
    #[should_panic(expected = "task panicked")]
    async fn join_resumes_a_panic() {
        let task = spawn(async { panic!("task panicked") });
        task.join().await;
    }

    #[tokio::test]
    async fn detached_task_still_runs() {
        let (send, recv) = tokio::sync::oneshot::channel();
        spawn(async move {
            send.send(42).ok();
        })
        .detach();
        assert_eq!(recv.await, Ok(42));
    }
}
