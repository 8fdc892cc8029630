//! Job queue for engines built on Rust futures.
//!
//! Engines that model script-level asynchrony as futures can keep a [`JobQueue`] and
//! call [`JobQueue::run_until_stalled`] from
//! [`ScriptEngine::run_enqueued_jobs`](crate::runtime::ScriptEngine::run_enqueued_jobs).
//! Jobs then advance exactly once per tick, in the idle phase, and never preempt a
//! handle callback.

use crate::error::ScriptError;

use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;
use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;

pub struct JobQueue {
    pool: LocalPool,
    spawner: LocalSpawner,
    pending: Rc<Cell<usize>>,
}

impl JobQueue {
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();

        Self {
            pool,
            spawner,
            pending: Rc::new(Cell::new(0)),
        }
    }

    /// Enqueues a job. It first runs on the next call to
    /// [`run_until_stalled`](Self::run_until_stalled).
    pub fn spawn<F>(&self, job: F) -> Result<(), ScriptError>
    where
        F: Future<Output = ()> + 'static,
    {
        let pending = self.pending.clone();
        self.spawner.spawn_local(async move {
            job.await;
            pending.set(pending.get() - 1);
        })?;

        self.pending.set(self.pending.get() + 1);
        Ok(())
    }

    /// Handle for enqueueing jobs from inside other jobs.
    pub fn spawner(&self) -> LocalSpawner {
        self.spawner.clone()
    }

    /// Polls every job that can make progress until none can.
    pub fn run_until_stalled(&mut self) {
        self.pool.run_until_stalled();
    }

    /// Jobs spawned through [`spawn`](Self::spawn) that have not finished.
    pub fn pending(&self) -> usize {
        self.pending.get()
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}
