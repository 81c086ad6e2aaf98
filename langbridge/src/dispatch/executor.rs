//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

use crate::dispatch::DispatchError;
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle, ThreadId};
use tokio::sync::mpsc;

#[cfg(feature = "observability")]
use tracing::{debug, error, warn};

/// A unit of work run on the dispatch worker.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

enum Job {
    Run(Task),
    Recycle(Task),
    Shutdown(Task),
}

struct Worker {
    name: String,
    generation: AtomicU64,
    current: Mutex<Option<ThreadId>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    shut_down: AtomicBool,
    #[cfg(test)]
    fail_next_spawn: AtomicBool,
}

impl Worker {
    fn spawn(self: &Arc<Self>, rx: mpsc::UnboundedReceiver<Job>) -> Result<(), DispatchError> {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let name = format!("{}-{}", self.name, generation);
        #[cfg(test)]
        {
            if self.fail_next_spawn.swap(false, Ordering::AcqRel) {
                return Err(DispatchError::SpawnFailed {
                    name,
                    source: std::io::Error::other("spawn refused"),
                });
            }
        }
        let worker = Arc::clone(self);
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || worker.run(rx))
            .map_err(|source| DispatchError::SpawnFailed { name, source })?;
        *self.handle.lock() = Some(handle);
        Ok(())
    }

    fn run(self: Arc<Self>, mut rx: mpsc::UnboundedReceiver<Job>) {
        *self.current.lock() = Some(thread::current().id());

        #[cfg(feature = "observability")]
        debug!(worker = %self.name, generation = self.generation.load(Ordering::Acquire), "Dispatch worker started");

        while let Some(job) = rx.blocking_recv() {
            match job {
                Job::Run(task) => self.execute(task),
                Job::Recycle(teardown) => {
                    self.execute(teardown);
                    if let Err(_err) = self.spawn(rx) {
                        // Nothing will drain the queue again.
                        self.shut_down.store(true, Ordering::Release);
                        #[cfg(feature = "observability")]
                        error!(worker = %self.name, error = %_err, "Failed to spawn successor; queued work is lost");
                    }
                    return;
                }
                Job::Shutdown(teardown) => {
                    self.execute(teardown);
                    break;
                }
            }
        }

        #[cfg(feature = "observability")]
        debug!(worker = %self.name, "Dispatch worker exiting");
    }

    fn execute(&self, task: Task) {
        if let Err(_payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
            #[cfg(feature = "observability")]
            error!(worker = %self.name, panic = panic_message(&*_payload), "Dispatch task panicked");
        }
    }
}

#[cfg_attr(not(feature = "observability"), allow(dead_code))]
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic>")
}

/// A single-worker FIFO task queue on a dedicated OS thread.
///
/// Tasks run one at a time in submission order. A panicking task is logged
/// and the worker moves on to the next one.
///
/// The worker can be replaced with [`recycle`](Self::recycle): the current
/// worker finishes everything queued before the recycle, runs the teardown on
/// itself, starts a successor, and exits. Worker threads are named
/// `"{name}-{generation}"`.
///
/// # Example
///
/// ```rust
/// use langbridge::dispatch::DispatchExecutor;
/// use std::sync::mpsc;
///
/// let executor = DispatchExecutor::new("dispatch").unwrap();
/// let (tx, rx) = mpsc::channel();
///
/// let before = tx.clone();
/// executor.submit(move || before.send(1).unwrap()).unwrap();
/// executor.recycle(|| {}).unwrap();
/// executor.submit(move || tx.send(2).unwrap()).unwrap();
///
/// assert_eq!(rx.recv().unwrap(), 1);
/// assert_eq!(rx.recv().unwrap(), 2);
/// assert!(executor.shutdown(|| {}));
/// assert_eq!(executor.generation(), 2);
/// ```
pub struct DispatchExecutor {
    worker: Arc<Worker>,
    tx: mpsc::UnboundedSender<Job>,
}

impl DispatchExecutor {
    /// Starts an executor whose first worker is named `"{name}-1"`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::SpawnFailed`] if the worker thread cannot be
    /// spawned.
    pub fn new(name: impl Into<String>) -> Result<Self, DispatchError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = Arc::new(Worker {
            name: name.into(),
            generation: AtomicU64::new(0),
            current: Mutex::new(None),
            handle: Mutex::new(None),
            shut_down: AtomicBool::new(false),
            #[cfg(test)]
            fail_next_spawn: AtomicBool::new(false),
        });
        worker.spawn(rx)?;
        Ok(Self {
            worker,
            tx,
        })
    }

    /// Queues `task` behind everything already submitted.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Stopped`] after [`shutdown`](Self::shutdown).
    pub fn submit<F>(&self, task: F) -> Result<(), DispatchError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.enqueue(Job::Run(Box::new(task)))
    }

    /// Replaces the worker once everything queued so far has run.
    ///
    /// `teardown` runs on the outgoing worker after its queue drains. Tasks
    /// submitted after this returns run on the successor. May be called from
    /// the worker itself.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Stopped`] after [`shutdown`](Self::shutdown).
    pub fn recycle<F>(&self, teardown: F) -> Result<(), DispatchError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.enqueue(Job::Recycle(Box::new(teardown)))
    }

    /// Stops accepting work, lets the worker drain its queue and run
    /// `teardown`, then waits for it to exit.
    ///
    /// When called from the worker itself the wait is skipped; the worker
    /// finishes the current task, drains and exits on its own.
    ///
    /// Returns `false` if the executor was already shut down.
    pub fn shutdown<F>(&self, teardown: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        if self.worker.shut_down.swap(true, Ordering::AcqRel) {
            return false;
        }
        if self.tx.send(Job::Shutdown(Box::new(teardown))).is_err() {
            #[cfg(feature = "observability")]
            warn!(worker = %self.worker.name, "Dispatch worker already gone at shutdown");
        }

        // Each generation stores its successor's handle before exiting.
        let current = thread::current().id();
        loop {
            let Some(handle) = self.worker.handle.lock().take() else {
                break;
            };
            if handle.thread().id() == current {
                break;
            }
            if handle.join().is_err() {
                #[cfg(feature = "observability")]
                warn!(worker = %self.worker.name, "Dispatch worker panicked");
            }
        }
        true
    }

    /// Returns `true` when called from the current worker thread.
    #[must_use]
    pub fn is_worker_thread(&self) -> bool {
        *self.worker.current.lock() == Some(thread::current().id())
    }

    /// The generation of the most recently started worker, starting at 1.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.worker.generation.load(Ordering::Acquire)
    }

    /// Base name of the worker threads.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.worker.name
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.worker.shut_down.load(Ordering::Acquire)
    }

    /// Makes the next successor spawn fail.
    #[cfg(test)]
    pub(crate) fn fail_next_spawn(&self) {
        self.worker.fail_next_spawn.store(true, Ordering::Release);
    }

    fn enqueue(&self, job: Job) -> Result<(), DispatchError> {
        if self.is_shut_down() {
            return Err(self.stopped());
        }
        self.tx.send(job).map_err(|_| self.stopped())
    }

    fn stopped(&self) -> DispatchError {
        DispatchError::Stopped {
            name: self.worker.name.clone(),
        }
    }
}

impl fmt::Debug for DispatchExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchExecutor")
            .field("name", &self.worker.name)
            .field("generation", &self.generation())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

impl Drop for DispatchExecutor {
    fn drop(&mut self) {
        self.shutdown(|| {});
    }
}
