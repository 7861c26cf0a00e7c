// DETACHED policy: one throwaway worker thread per callback

use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use crate::executor::{run_catching, ActionExecutor, InFlightGuard};
use crate::net::Action;

/// Spawns a new worker thread per callback; the callback runs to
/// completion independently of the caller. Makes no ordering guarantee
/// across callbacks -- two calls submitted back-to-back may finish in
/// either order.
///
/// Tracks its own outstanding-thread count separately from the per-place
/// in-flight counters passed into `execute`, so `shutdown` has something to
/// wait on regardless of which place(s) those threads were working for.
pub struct DetachedExecutor {
    outstanding: Arc<(Mutex<usize>, Condvar)>,
}

impl DetachedExecutor {
    pub fn new() -> Self {
        Self {
            outstanding: Arc::new((Mutex::new(0), Condvar::new())),
        }
    }
}

impl Default for DetachedExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionExecutor for DetachedExecutor {
    fn execute(&self, action: Action, counter: Arc<AtomicUsize>) {
        let outstanding = self.outstanding.clone();
        *outstanding.0.lock().expect("outstanding count lock poisoned") += 1;
        thread::spawn(move || {
            let _guard = InFlightGuard::new(counter);
            run_catching(&action);
            let mut count = outstanding.0.lock().expect("outstanding count lock poisoned");
            *count -= 1;
            if *count == 0 {
                outstanding.1.notify_all();
            }
        });
    }

    /// Blocks until every thread spawned by `execute` has returned. No
    /// timeout -- a host callback that never returns hangs `stop` forever,
    /// same as it would under `INLINE`.
    fn shutdown(&self) {
        let count = self.outstanding.0.lock().expect("outstanding count lock poisoned");
        let _unused = self
            .outstanding
            .1
            .wait_while(count, |count| *count > 0)
            .expect("outstanding count lock poisoned");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;
    use std::time::Duration;

    #[test]
    fn detached_runs_off_the_calling_thread_and_tracks_in_flight() {
        let executor = DetachedExecutor::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let caller_thread = thread::current().id();
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = seen.clone();
        executor.execute(
            Arc::new(move || {
                *seen_clone.lock().unwrap() = Some(thread::current().id());
            }),
            counter.clone(),
        );
        for _ in 0..200 {
            if seen.lock().unwrap().is_some() {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert_ne!(seen.lock().unwrap().unwrap(), caller_thread);
        for _ in 0..200 {
            if counter.load(Ordering::SeqCst) == 0 {
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("in-flight counter never settled back to zero");
    }

    #[test]
    fn detached_panic_does_not_poison_the_counter() {
        let executor = DetachedExecutor::new();
        let counter = Arc::new(AtomicUsize::new(0));
        executor.execute(Arc::new(|| panic!("boom")), counter.clone());
        for _ in 0..200 {
            if counter.load(Ordering::SeqCst) == 0 {
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("in-flight counter never settled back to zero after panic");
    }

    #[test]
    fn shutdown_waits_for_every_outstanding_thread() {
        let executor = DetachedExecutor::new();
        let done = Arc::new(AtomicUsize::new(0));
        for _ in 0..5 {
            let done = done.clone();
            let counter = Arc::new(AtomicUsize::new(0));
            executor.execute(
                Arc::new(move || {
                    thread::sleep(Duration::from_millis(20));
                    done.fetch_add(1, Ordering::SeqCst);
                }),
                counter,
            );
        }
        executor.shutdown();
        assert_eq!(done.load(Ordering::SeqCst), 5, "shutdown returned before every thread finished");
    }

    #[test]
    fn shutdown_with_nothing_outstanding_returns_immediately() {
        let executor = DetachedExecutor::new();
        executor.shutdown();
    }
}
