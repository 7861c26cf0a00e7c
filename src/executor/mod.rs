// Four interchangeable policies for running on-enter / on-exit callbacks

//! # Action Executor
//!
//! The engine never calls a host callback directly; it always goes through
//! the selected [`ActionExecutor`]. This is the "capability interface" the
//! spec's design notes call for: one trait, four concrete implementations,
//! picked once per engine instance and treated opaquely from then on.
//!
//! ## Rust Learning Notes
//!
//! ### Why `Arc<AtomicUsize>` and not `&AtomicUsize`
//! [`ActionExecutor::execute`] may hand the callback to a brand new OS
//! thread (`DETACHED`) whose lifetime the caller doesn't control. A bare
//! reference to the place's in-flight counter wouldn't satisfy
//! `thread::spawn`'s `'static` bound; an `Arc` does, at the cost of one
//! refcount bump per submission.

pub mod detached;
pub mod inline;
pub mod job_queue;

pub use detached::DetachedExecutor;
pub use inline::{EventLoopExecutor, InlineExecutor};
pub use job_queue::JobQueueExecutor;

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use crate::net::Action;

/// Which thread model runs on-enter / on-exit callbacks.
///
/// Selected once at engine construction and switchable only while the
/// event loop is not running (`set_actions_thread_option` enforces that).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionsThreadOption {
    /// Run the callback synchronously on the calling thread.
    Inline,
    /// Run the callback on the engine's event-loop thread, inline with
    /// firing. Observably identical to `Inline`; differs only when the
    /// host calls engine methods from a thread other than the loop.
    EventLoop,
    /// Spawn a new worker thread per callback; it runs to completion
    /// independently and is not joined by the caller.
    Detached,
    /// Append the callback to a single-consumer FIFO queue served by one
    /// dedicated worker thread; preserves submission order.
    JobQueue,
}

impl ActionsThreadOption {
    /// Build the concrete executor for this policy.
    pub fn build(self) -> Box<dyn ActionExecutor> {
        match self {
            ActionsThreadOption::Inline => Box::new(InlineExecutor),
            ActionsThreadOption::EventLoop => Box::new(EventLoopExecutor),
            ActionsThreadOption::Detached => Box::new(DetachedExecutor::new()),
            ActionsThreadOption::JobQueue => Box::new(JobQueueExecutor::new()),
        }
    }
}

impl Default for ActionsThreadOption {
    fn default() -> Self {
        ActionsThreadOption::Inline
    }
}

/// A policy for running a host callback. `counter` is incremented before
/// the callback starts and decremented once it finishes, on whichever
/// thread actually runs it -- the sole cross-thread channel by which
/// `requireNoActionsInExecution` observes "callbacks are still running".
pub trait ActionExecutor: Send + Sync {
    fn execute(&self, action: Action, counter: Arc<AtomicUsize>);

    /// Called by the engine on `stop()`. Default implementation does
    /// nothing (`Inline` / `EventLoop` have no background worker to
    /// drain); `Detached` waits for in-flight threads, `JobQueue` drains
    /// its queue and joins its worker.
    fn shutdown(&self) {}
}

/// RAII in-flight tracker: increments `counter` on construction, decrements
/// it on drop -- including while unwinding, so a panicking callback never
/// leaves `requireNoActionsInExecution` permanently blind to completion.
pub(crate) struct InFlightGuard(Arc<AtomicUsize>);

impl InFlightGuard {
    pub(crate) fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
    }
}

/// Run `action`, catching a panic instead of letting it unwind past this
/// point. Used by `DETACHED` and `JOB_QUEUE`, whose callback doesn't run on
/// a thread the caller is waiting on -- a panic there must not kill the
/// worker or leave the net mid-mutation.
pub(crate) fn run_catching(action: &Action) {
    if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| action())).is_err() {
        tracing::warn!("action callback panicked; in-flight counter still decremented");
    }
}
