//! Fixed-size worker-thread pool for task execution.
//!
//! Submission goes through a bounded queue, so `submit` blocks once the
//! queue fills; that bound, not driver-side bookkeeping, is the hard
//! backpressure limit. Each submitted task hands back a [`TaskHandle`] the
//! driver can poll without blocking and join when draining.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::error::{Result, SoakError};
use crate::stats::TaskMetrics;

type Job = Box<dyn FnOnce() -> Result<TaskMetrics> + Send + 'static>;

struct QueuedTask {
    job: Job,
    done: Arc<AtomicBool>,
    result: SyncSender<Result<TaskMetrics>>,
}

/// Pool of OS threads executing submitted jobs in FIFO order.
pub struct TaskPool {
    sender: Option<SyncSender<QueuedTask>>,
    threads: Vec<thread::JoinHandle<()>>,
}

impl TaskPool {
    /// Spawns `threads` workers sharing one bounded job queue.
    pub fn new(threads: usize) -> Self {
        let threads = threads.max(1);
        let (sender, receiver) = mpsc::sync_channel::<QueuedTask>(threads * 2);
        let receiver = Arc::new(Mutex::new(receiver));
        let threads = (0..threads)
            .map(|_| {
                let receiver = Arc::clone(&receiver);
                thread::spawn(move || Self::worker_loop(&receiver))
            })
            .collect();
        Self {
            sender: Some(sender),
            threads,
        }
    }

    fn worker_loop(receiver: &Arc<Mutex<Receiver<QueuedTask>>>) {
        loop {
            // Hold the queue lock only for the dequeue, never the job.
            let task = receiver.lock().recv();
            let Ok(task) = task else {
                break;
            };
            let outcome = (task.job)();
            // Deposit the result before publishing completion so a handle
            // that observed `is_finished` can join without blocking.
            let _ = task.result.send(outcome);
            task.done.store(true, Ordering::Release);
        }
    }

    /// Submits a job, blocking while the queue is full. Returns a handle for
    /// polling and collection.
    pub fn submit<F>(&self, job: F) -> TaskHandle
    where
        F: FnOnce() -> Result<TaskMetrics> + Send + 'static,
    {
        let (result_tx, result_rx) = mpsc::sync_channel(1);
        let done = Arc::new(AtomicBool::new(false));
        let task = QueuedTask {
            job: Box::new(job),
            done: Arc::clone(&done),
            result: result_tx,
        };
        if let Some(sender) = &self.sender {
            // Send fails only when every worker is gone; the dangling result
            // channel then resolves the handle as a failed task.
            let _ = sender.send(task);
        }
        TaskHandle {
            done,
            result: result_rx,
        }
    }
}

impl Drop for TaskPool {
    fn drop(&mut self) {
        self.sender.take();
        for handle in self.threads.drain(..) {
            let _ = handle.join();
        }
    }
}

/// Handle to one submitted task.
pub struct TaskHandle {
    done: Arc<AtomicBool>,
    result: Receiver<Result<TaskMetrics>>,
}

impl TaskHandle {
    /// True once the task's result is ready; [`TaskHandle::join`] will not
    /// block after this returns true.
    pub fn is_finished(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// Waits for the task and returns its outcome.
    pub fn join(self) -> Result<TaskMetrics> {
        match self.result.recv() {
            Ok(outcome) => outcome,
            Err(_) => Err(SoakError::TaskFailure(
                "worker result channel severed".into(),
            )),
        }
    }
}
