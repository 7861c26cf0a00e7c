// INLINE and EVENT_LOOP policies: run the callback synchronously

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use crate::executor::{ActionExecutor, InFlightGuard};
use crate::net::Action;

/// Runs the callback synchronously on the calling thread. No suspension,
/// no parallelism: a panic inside the callback propagates to the caller,
/// exactly as a direct function call would.
pub struct InlineExecutor;

impl ActionExecutor for InlineExecutor {
    fn execute(&self, action: Action, counter: Arc<AtomicUsize>) {
        let _guard = InFlightGuard::new(counter);
        action();
    }
}

/// Runs the callback on the engine's event-loop thread, inline with firing.
/// Observably identical to [`InlineExecutor`] -- the distinction only
/// matters when the host drives the engine's public API from a thread
/// other than the loop, since then "the calling thread" and "the event
/// loop thread" are the same physical thread only for `EventLoop`.
pub struct EventLoopExecutor;

impl ActionExecutor for EventLoopExecutor {
    fn execute(&self, action: Action, counter: Arc<AtomicUsize>) {
        let _guard = InFlightGuard::new(counter);
        action();
    }
}
