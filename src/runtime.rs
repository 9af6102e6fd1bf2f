//! Runtime abstraction layer for async operations
//!
//! The sync engine never calls `tokio::spawn` directly; it goes through the
//! [`AsyncSpawner`] installed here so an embedding application can route
//! background work onto its own executor.

use crate::prelude::{Future, Pin};
use std::time::Duration;

/// A trait for spawning async tasks (object-safe version)
pub trait AsyncSpawner: Send + Sync + 'static {
    /// Spawn a future and return a handle to it
    fn spawn_boxed(
        &self,
        future: Pin<Box<dyn Future<Output = ()> + Send + 'static>>,
    ) -> Box<dyn AsyncHandle>;
}

/// Handle to a spawned async task
pub trait AsyncHandle: Send + Sync {
    /// Check if the task is finished
    fn is_finished(&self) -> bool;

    /// Cancel the task. Dropping the handle instead detaches the task.
    fn cancel(&self);
}

/// Convenience function for spawning with type safety
pub fn spawn<F>(future: F) -> Box<dyn AsyncHandle>
where
    F: Future<Output = ()> + Send + 'static,
{
    runtime().spawn_boxed(Box::pin(future))
}

/// Default spawner implementations
pub mod spawners {
    use super::*;

    pub mod tokio_impl {
        use super::*;
        use ::tokio::task::JoinHandle;

        /// Tokio-based async spawner; must be used from inside a tokio runtime.
        pub struct TokioSpawner;

        impl AsyncSpawner for TokioSpawner {
            fn spawn_boxed(
                &self,
                future: Pin<Box<dyn Future<Output = ()> + Send + 'static>>,
            ) -> Box<dyn AsyncHandle> {
                let handle = ::tokio::spawn(future);
                Box::new(TokioHandle(handle))
            }
        }

        struct TokioHandle(JoinHandle<()>);

        impl AsyncHandle for TokioHandle {
            fn is_finished(&self) -> bool {
                self.0.is_finished()
            }

            fn cancel(&self) {
                self.0.abort();
            }
        }
    }
}

/// Async delay on the runtime's clock (honors paused time in tests)
pub async fn async_delay(duration: Duration) {
    ::tokio::time::sleep(duration).await;
}

/// Global runtime instance
static RUNTIME: std::sync::OnceLock<Box<dyn AsyncSpawner>> = std::sync::OnceLock::new();

/// Initialize the runtime with a specific spawner. Only the first call wins.
pub fn init_runtime(spawner: Box<dyn AsyncSpawner>) {
    if RUNTIME.set(spawner).is_err() {
        log::warn!("async runtime already initialized; ignoring replacement spawner");
    }
}

/// Get the global runtime spawner
pub fn runtime() -> &'static dyn AsyncSpawner {
    RUNTIME
        .get_or_init(|| Box::new(spawners::tokio_impl::TokioSpawner))
        .as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[::tokio::test(start_paused = true)]
    async fn test_tokio_spawner() {
        let handle = spawn(async {
            async_delay(Duration::from_millis(10)).await;
        });

        assert!(!handle.is_finished());

        async_delay(Duration::from_millis(20)).await;
        assert!(handle.is_finished());
    }

    #[::tokio::test(start_paused = true)]
    async fn test_cancel_stops_task_before_it_runs() {
        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = ran.clone();

        let handle = spawn(async move {
            async_delay(Duration::from_millis(50)).await;
            ran_clone.store(true, Ordering::SeqCst);
        });
        handle.cancel();

        async_delay(Duration::from_millis(100)).await;
        assert!(!ran.load(Ordering::SeqCst));
    }
}
