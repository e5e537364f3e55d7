//! The fixed-size worker pool that runs jobs once a connection has moved
//! past `SSH_FXP_INIT`.
//!
//! Before negotiation completes there is no pool at all: `INIT` and the
//! handful of requests immediately behind it run inline on the reader
//! thread (see [`crate::dispatch`]). Once a version is selected, a pool of
//! `size` threads pulls jobs from a shared queue and feeds completed ones
//! back to a single writer, so that responses to independent handles can be
//! produced out of request order while [`crate::gate::Gate`] still
//! enforces in-order delivery for anything sharing a handle.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::job::Job;

/// The per-job work function a host binds into the pool: decode, dispatch
/// to a handler, encode the response, return the completed job.
pub type ProcessFn = dyn Fn(Job) -> Job + Send + Sync;

/// A fixed-size pool of worker threads.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    sender: Option<Sender<Job>>,
}

impl WorkerPool {
    /// Spawns `size` worker threads. Each completed job is sent to
    /// `results`; the caller owns the matching receiver and is responsible
    /// for writing completed jobs back to the client.
    #[must_use]
    pub fn new(size: usize, process: Arc<ProcessFn>, results: Sender<Job>) -> Self {
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));
        let mut handles = Vec::with_capacity(size);
        for _ in 0..size {
            let receiver = Arc::clone(&receiver);
            let process = Arc::clone(&process);
            let results = results.clone();
            handles.push(thread::spawn(move || {
                run_worker(&receiver, process.as_ref(), &results);
            }));
        }
        Self {
            handles,
            sender: Some(sender),
        }
    }

    /// Queues `job` for execution by the next free worker.
    ///
    /// # Errors
    ///
    /// Returns the job back if every worker thread has already exited.
    pub fn submit(&self, job: Job) -> Result<(), Job> {
        self.sender
            .as_ref()
            .expect("sender only cleared by Drop")
            .send(job)
            .map_err(|err| err.0)
    }
}

fn run_worker(receiver: &Arc<Mutex<Receiver<Job>>>, process: &ProcessFn, results: &Sender<Job>) {
    loop {
        let job = {
            let guard = receiver.lock().expect("worker pool receiver poisoned");
            guard.recv()
        };
        match job {
            Ok(job) => {
                let done = process(job);
                if results.send(done).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.sender.take();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn job_with_id(id: u32) -> Job {
        Job::new(crate::packet::SSH_FXP_REMOVE, id, Vec::new())
    }

    #[test]
    fn every_submitted_job_comes_back_exactly_once() {
        let (results_tx, results_rx) = mpsc::channel();
        let pool = WorkerPool::new(4, Arc::new(|job: Job| job), results_tx);

        for id in 0..20 {
            pool.submit(job_with_id(id)).unwrap();
        }

        let mut seen = HashSet::new();
        for _ in 0..20 {
            let job = results_rx.recv().unwrap();
            seen.insert(job.id());
        }
        assert_eq!(seen.len(), 20);
        drop(pool);
    }

    #[test]
    fn dropping_the_pool_joins_every_worker() {
        let (results_tx, _results_rx) = mpsc::channel();
        let pool = WorkerPool::new(2, Arc::new(|job: Job| job), results_tx);
        drop(pool);
    }
}
