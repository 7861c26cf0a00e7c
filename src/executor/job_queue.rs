// JOB_QUEUE policy: single-consumer FIFO queue served by one worker thread

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use crate::executor::{run_catching, ActionExecutor};
use crate::net::Action;

enum Job {
    Run(Action, Arc<AtomicUsize>),
    Terminate,
}

struct Shared {
    queue: Mutex<VecDeque<Job>>,
    notify: Condvar,
}

/// Appends each callback to the tail of a FIFO queue; a single dedicated
/// worker thread drains it in submission order. The in-flight counter
/// tracks pending *and* running jobs, so it's incremented the moment a
/// callback is queued, not when the worker picks it up.
pub struct JobQueueExecutor {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl JobQueueExecutor {
    pub fn new() -> Self {
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            notify: Condvar::new(),
        });
        let worker_shared = shared.clone();
        let handle = thread::spawn(move || Self::worker_loop(&worker_shared));
        Self {
            shared,
            worker: Mutex::new(Some(handle)),
        }
    }

    fn worker_loop(shared: &Shared) {
        loop {
            let job = {
                let mut queue = shared.queue.lock().expect("job queue lock poisoned");
                while queue.is_empty() {
                    queue = shared.notify.wait(queue).expect("job queue lock poisoned");
                }
                queue.pop_front().expect("queue was just shown non-empty")
            };
            match job {
                Job::Run(action, counter) => {
                    run_catching(&action);
                    counter.fetch_sub(1, Ordering::SeqCst);
                }
                Job::Terminate => break,
            }
        }
    }
}

impl Default for JobQueueExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionExecutor for JobQueueExecutor {
    fn execute(&self, action: Action, counter: Arc<AtomicUsize>) {
        counter.fetch_add(1, Ordering::SeqCst);
        let mut queue = self.shared.queue.lock().expect("job queue lock poisoned");
        queue.push_back(Job::Run(action, counter));
        self.shared.notify.notify_one();
    }

    fn shutdown(&self) {
        {
            let mut queue = self.shared.queue.lock().expect("job queue lock poisoned");
            queue.push_back(Job::Terminate);
            self.shared.notify.notify_one();
        }
        if let Some(handle) = self.worker.lock().expect("worker handle lock poisoned").take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    #[test]
    fn preserves_submission_order() {
        let executor = JobQueueExecutor::new();
        let log = Arc::new(StdMutex::new(Vec::new()));
        for i in 1..=12u32 {
            let log = log.clone();
            let counter = Arc::new(AtomicUsize::new(0));
            executor.execute(Arc::new(move || log.lock().unwrap().push(i)), counter);
        }
        executor.shutdown();
        assert_eq!(*log.lock().unwrap(), (1..=12).collect::<Vec<_>>());
    }

    #[test]
    fn counter_covers_pending_and_running() {
        let executor = JobQueueExecutor::new();
        let counter = Arc::new(AtomicUsize::new(0));
        executor.execute(Arc::new(|| thread::sleep(Duration::from_millis(20))), counter.clone());
        executor.execute(Arc::new(|| {}), counter.clone());
        // Immediately after submission both jobs should be accounted for,
        // whether still queued or already running.
        assert!(counter.load(Ordering::SeqCst) >= 1);
        executor.shutdown();
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn drains_pending_jobs_before_terminating() {
        let executor = JobQueueExecutor::new();
        let ran = Arc::new(AtomicUsize::new(0));
        for _ in 0..5 {
            let ran = ran.clone();
            let counter = Arc::new(AtomicUsize::new(0));
            executor.execute(Arc::new(move || { ran.fetch_add(1, Ordering::SeqCst); }), counter);
        }
        executor.shutdown();
        assert_eq!(ran.load(Ordering::SeqCst), 5);
    }
}
