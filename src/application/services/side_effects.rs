//! # Side Effects
//!
//! Detached secondary work (balance refresh, notification dispatch).
//!
//! A side effect is spawned and never awaited by the command that caused
//! it. Its failure is logged by the task itself. [`SideEffects::settled`]
//! lets tests and the CLI wait for the outstanding ones before exiting.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::warn;

/// Set of in-flight side-effect tasks.
#[derive(Debug, Clone, Default)]
pub struct SideEffects {
    tasks: Arc<Mutex<JoinSet<()>>>,
}

impl SideEffects {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `effect` without waiting for it.
    pub async fn spawn<F>(&self, effect: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().await;
        // Reap finished tasks so the set does not grow for a long session.
        while tasks.try_join_next().is_some() {}
        tasks.spawn(effect);
    }

    /// Waits for every spawned side effect to finish.
    pub async fn settled(&self) {
        let mut tasks = self.tasks.lock().await;
        while let Some(result) = tasks.join_next().await {
            if let Err(err) = result {
                warn!(error = %err, "side effect task aborted");
            }
        }
    }

    /// Aborts everything still running.
    pub async fn abort_all(&self) {
        self.tasks.lock().await.abort_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn settled_waits_for_all() {
        let effects = SideEffects::new();
        let done = Arc::new(AtomicUsize::new(0));
        for delay in [10, 50, 200] {
            let done = Arc::clone(&done);
            effects
                .spawn(async move {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    done.fetch_add(1, Ordering::SeqCst);
                })
                .await;
        }
        assert_eq!(done.load(Ordering::SeqCst), 0);
        effects.settled().await;
        assert_eq!(done.load(Ordering::SeqCst), 3);
    }
}
