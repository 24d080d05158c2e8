//! Sequential job queue.
//!
//! A [`Queue`] holds deferred jobs and runs them strictly in insertion order
//! when fired. Each job receives the resolved output of the previous one (the
//! seed for the first); the next job does not start until the previous job's
//! future resolves, and the first error short-circuits the rest.
//!
//! Jobs are kept after firing, so a queue can be fired again. What a second
//! firing does is governed by [`FirePolicy`]:
//!
//! - [`FirePolicy::Replay`] re-runs every job against whatever shared state the
//!   jobs touch *now*. Jobs that mutate shared state are therefore applied
//!   twice.
//! - [`FirePolicy::Once`] fails the second firing with
//!   [`QueueError::AlreadyFired`] without running anything.

use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::rc::Rc;
use thiserror::Error;
use tracing::trace;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("queue has already been fired")]
    AlreadyFired,
}

/// Behavior of [`Queue::fire`] after the first firing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirePolicy {
    #[default]
    Replay,
    Once,
}

type Job<T, E> = Rc<dyn Fn(T) -> LocalBoxFuture<'static, Result<T, E>>>;

/// Ordered list of deferred jobs plus a `fired` flag.
pub struct Queue<T, E> {
    jobs: Vec<Job<T, E>>,
    fired: bool,
    policy: FirePolicy,
}

impl<T: 'static, E: From<QueueError> + 'static> Queue<T, E> {
    pub fn new() -> Self {
        Self::with_policy(FirePolicy::default())
    }

    pub fn with_policy(policy: FirePolicy) -> Self {
        Self {
            jobs: Vec::new(),
            fired: false,
            policy,
        }
    }

    /// Append a job.
    ///
    /// Only callables are accepted; anything else is a type error:
    ///
    /// ```compile_fail
    /// # use rastermill::queue::Queue;
    /// # use rastermill::PipelineError;
    /// let mut queue: Queue<u32, PipelineError> = Queue::new();
    /// queue.push(42);
    /// ```
    pub fn push<F, Fut>(&mut self, job: F)
    where
        F: Fn(T) -> Fut + 'static,
        Fut: Future<Output = Result<T, E>> + 'static,
    {
        self.jobs.push(Rc::new(move |value| job(value).boxed_local()));
    }

    /// Run every job in order, starting from `seed`.
    ///
    /// The returned future is independent of the queue: jobs pushed after this
    /// call are not part of this run.
    pub fn fire(&mut self, seed: T) -> LocalBoxFuture<'static, Result<T, E>> {
        if self.fired && self.policy == FirePolicy::Once {
            return future::ready(Err(QueueError::AlreadyFired.into())).boxed_local();
        }
        self.fired = true;

        let jobs = self.jobs.clone();
        async move {
            let mut value = seed;
            for (index, job) in jobs.iter().enumerate() {
                trace!(index, total = jobs.len(), "running job");
                value = job(value).await?;
            }
            Ok(value)
        }
        .boxed_local()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn is_fired(&self) -> bool {
        self.fired
    }

    pub fn policy(&self) -> FirePolicy {
        self.policy
    }
}

impl<T: 'static, E: From<QueueError> + 'static> Default for Queue<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use futures::executor::block_on;
    use std::cell::{Cell, RefCell};
    use std::time::Duration;

    type TestQueue<T> = Queue<T, PipelineError>;

    #[test]
    fn threads_value_through_jobs_in_order() {
        let mut queue: TestQueue<i32> = Queue::new();
        queue.push(|v| async move { Ok(v + 1) });
        queue.push(|v| async move { Ok(v * 10) });
        queue.push(|v| async move { Ok(v - 3) });

        assert_eq!(block_on(queue.fire(1)).unwrap(), 17);
    }

    #[test]
    fn empty_queue_resolves_to_seed() {
        let mut queue: TestQueue<&str> = Queue::new();
        assert!(queue.is_empty());
        assert_eq!(block_on(queue.fire("seed")).unwrap(), "seed");
    }

    #[tokio::test]
    async fn execution_order_ignores_job_latency() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut queue: TestQueue<()> = Queue::new();
        let n = 5;
        for index in 0..n {
            let log = Rc::clone(&log);
            // Earlier jobs take longer
            let delay = Duration::from_millis(((n - index) * 10) as u64);
            queue.push(move |()| {
                let log = Rc::clone(&log);
                async move {
                    tokio::time::sleep(delay).await;
                    log.borrow_mut().push(index);
                    Ok(())
                }
            });
        }

        queue.fire(()).await.unwrap();
        assert_eq!(*log.borrow(), (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn first_error_short_circuits() {
        let ran_last = Rc::new(Cell::new(false));
        let mut queue: TestQueue<u32> = Queue::new();
        queue.push(|v| async move { Ok(v + 1) });
        queue.push(|_| async move { Err(PipelineError::InvalidInput("boom".into())) });
        let flag = Rc::clone(&ran_last);
        queue.push(move |v| {
            flag.set(true);
            async move { Ok(v) }
        });

        let result = block_on(queue.fire(0));
        assert!(matches!(result, Err(PipelineError::InvalidInput(msg)) if msg == "boom"));
        assert!(!ran_last.get());
    }

    #[test]
    fn push_appends_without_running() {
        let runs = Rc::new(Cell::new(0));
        let mut queue: TestQueue<()> = Queue::new();
        let counter = Rc::clone(&runs);
        queue.push(move |()| {
            counter.set(counter.get() + 1);
            async { Ok(()) }
        });

        assert_eq!(queue.len(), 1);
        assert_eq!(runs.get(), 0);
        assert!(!queue.is_fired());
    }

    #[test]
    fn replay_policy_reruns_every_job() {
        let runs = Rc::new(Cell::new(0));
        let mut queue: TestQueue<()> = Queue::new();
        let counter = Rc::clone(&runs);
        queue.push(move |()| {
            counter.set(counter.get() + 1);
            async { Ok(()) }
        });

        block_on(queue.fire(())).unwrap();
        assert!(queue.is_fired());
        block_on(queue.fire(())).unwrap();
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn replay_compounds_shared_state() {
        let shared = Rc::new(Cell::new(1600));
        let mut queue: TestQueue<()> = Queue::new();
        let state = Rc::clone(&shared);
        queue.push(move |()| {
            state.set(state.get() / 2);
            async { Ok(()) }
        });

        block_on(queue.fire(())).unwrap();
        assert_eq!(shared.get(), 800);
        block_on(queue.fire(())).unwrap();
        assert_eq!(shared.get(), 400);
    }

    #[test]
    fn once_policy_rejects_second_fire() {
        let runs = Rc::new(Cell::new(0));
        let mut queue: TestQueue<()> = Queue::with_policy(FirePolicy::Once);
        let counter = Rc::clone(&runs);
        queue.push(move |()| {
            counter.set(counter.get() + 1);
            async { Ok(()) }
        });

        block_on(queue.fire(())).unwrap();
        let second = block_on(queue.fire(()));
        assert!(matches!(
            second,
            Err(PipelineError::Queue(QueueError::AlreadyFired))
        ));
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn jobs_pushed_after_fire_are_not_in_that_run() {
        let mut queue: TestQueue<u32> = Queue::new();
        queue.push(|v| async move { Ok(v + 1) });
        let run = queue.fire(0);
        queue.push(|v| async move { Ok(v + 100) });

        assert_eq!(block_on(run).unwrap(), 1);
        assert_eq!(block_on(queue.fire(0)).unwrap(), 101);
    }
}
