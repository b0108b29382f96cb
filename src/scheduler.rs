use std::future::Future;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// A named job re-run on a fixed period until cancelled
///
/// The first run happens immediately. A job in progress when shutdown is
/// requested is allowed to finish, up to the timeout passed to
/// [`PeriodicTask::shutdown`]; after that the task is aborted.
pub struct PeriodicTask {
    name: String,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Spawn onto the current runtime; `shutdown` is usually a child of an app-wide token
    pub fn spawn<F, Fut>(
        name: impl Into<String>,
        period: Duration,
        shutdown: CancellationToken,
        mut job: F,
    ) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let token = shutdown;
        let loop_token = token.clone();
        let loop_name = name.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = loop_token.cancelled() => {
                        tracing::info!(task = %loop_name, "Periodic task stopping");
                        break;
                    }
                    _ = ticker.tick() => {
                        tracing::debug!(task = %loop_name, "Periodic task tick");
                        job().await;
                    }
                }
            }
        });

        Self {
            name,
            token,
            handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cancel and wait up to `timeout`
    ///
    /// Returns false if the task had to be aborted or had already died from a
    /// panicking job.
    pub async fn shutdown(self, timeout: Duration) -> bool {
        self.token.cancel();

        let mut handle = self.handle;
        match time::timeout(timeout, &mut handle).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::error!(task = %self.name, "Periodic task ended abnormally: {}", e);
                false
            }
            Err(_) => {
                tracing::warn!(
                    task = %self.name,
                    ?timeout,
                    "Periodic task did not stop in time, aborting"
                );
                handle.abort();
                false
            }
        }
    }
}

/// Owns a root token and the tasks spawned under it
pub struct Scheduler {
    token: CancellationToken,
    tasks: Vec<PeriodicTask>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            tasks: Vec::new(),
        }
    }

    pub fn spawn<F, Fut>(&mut self, name: impl Into<String>, period: Duration, job: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let task = PeriodicTask::spawn(name, period, self.token.child_token(), job);
        tracing::info!(task = task.name(), ?period, "Spawned periodic task");
        self.tasks.push(task);
    }

    /// Token cancelled on shutdown, for work that should stop early
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Stop every task, each bounded by `timeout`; returns how many did not stop cleanly
    pub async fn shutdown(self, timeout: Duration) -> usize {
        self.token.cancel();

        let mut pending = JoinSet::new();
        for task in self.tasks {
            pending.spawn(task.shutdown(timeout));
        }

        let mut aborted = 0;
        while let Some(result) = pending.join_next().await {
            if !result.unwrap_or(false) {
                aborted += 1;
            }
        }
        aborted
    }
}
