// A single node in the net: holds a token count and fires callbacks on change

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, RwLock};

use crate::error::{PtnError, PtnResult};
use crate::executor::ActionExecutor;
use crate::net::registry::Named;
use crate::net::Action;

/// Index of a [`Place`] inside its owning [`crate::net::Registry`].
///
/// Transitions refer to places by `PlaceId` rather than by `Rc`/`Weak`
/// pointer: the registry is the sole owner (per the "weak back-references"
/// design note), and an arena index is a simpler, allocation-free stand-in
/// for a weak pointer that still can't outlive its owner's lifetime tricks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaceId(pub(crate) usize);

impl PlaceId {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// Construction bundle for a [`Place`], mirroring the fields the engine's
/// `create_place` call and the import/export contract both need.
#[derive(Clone)]
pub struct PlaceProperties {
    pub name: String,
    pub initial_tokens: u64,
    pub is_input: bool,
    pub on_enter_action_name: String,
    pub on_enter_action: Option<Action>,
    pub on_exit_action_name: String,
    pub on_exit_action: Option<Action>,
}

impl PlaceProperties {
    pub fn new(name: impl Into<String>, initial_tokens: u64, is_input: bool) -> Self {
        Self {
            name: name.into(),
            initial_tokens,
            is_input,
            on_enter_action_name: String::new(),
            on_enter_action: None,
            on_exit_action_name: String::new(),
            on_exit_action: None,
        }
    }
}

struct PlaceState {
    tokens: u64,
}

/// A place in the net: a bucket of unweighted tokens, optionally wired to
/// on-enter / on-exit side-effect callbacks.
///
/// Every mutation goes through `m_state`'s `RwLock`; reads proceed in
/// parallel, writes are exclusive. The on-enter in-flight counter and the
/// "block starting on-enter" latch are separate from that lock so that a
/// long-running callback does not hold up plain token reads.
pub struct Place {
    name: String,
    is_input: bool,
    on_enter_action_name: String,
    on_enter_action: Option<Action>,
    on_exit_action_name: String,
    on_exit_action: Option<Action>,
    state: RwLock<PlaceState>,
    on_enter_in_flight: Arc<AtomicUsize>,
    on_exit_in_flight: Arc<AtomicUsize>,
    block_starting_on_enter: Mutex<bool>,
    block_starting_on_enter_cv: Condvar,
}

impl Place {
    pub fn new(props: PlaceProperties) -> PtnResult<Self> {
        if props.name.is_empty() {
            return Err(PtnError::InvalidName(String::new()));
        }
        if !props.on_enter_action_name.is_empty() && props.on_enter_action.is_none() {
            return Err(PtnError::MissingCallback(props.on_enter_action_name));
        }
        if !props.on_exit_action_name.is_empty() && props.on_exit_action.is_none() {
            return Err(PtnError::MissingCallback(props.on_exit_action_name));
        }
        Ok(Self {
            name: props.name,
            is_input: props.is_input,
            on_enter_action_name: props.on_enter_action_name,
            on_enter_action: props.on_enter_action,
            on_exit_action_name: props.on_exit_action_name,
            on_exit_action: props.on_exit_action,
            state: RwLock::new(PlaceState {
                tokens: props.initial_tokens,
            }),
            on_enter_in_flight: Arc::new(AtomicUsize::new(0)),
            on_exit_in_flight: Arc::new(AtomicUsize::new(0)),
            block_starting_on_enter: Mutex::new(false),
            block_starting_on_enter_cv: Condvar::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_input(&self) -> bool {
        self.is_input
    }

    pub fn on_enter_action_name(&self) -> &str {
        &self.on_enter_action_name
    }

    pub fn on_exit_action_name(&self) -> &str {
        &self.on_exit_action_name
    }

    pub fn get_tokens(&self) -> u64 {
        self.state.read().expect("place lock poisoned").tokens
    }

    pub fn set_tokens(&self, n: u64) {
        self.state.write().expect("place lock poisoned").tokens = n;
    }

    pub fn is_on_enter_in_flight(&self) -> bool {
        self.on_enter_in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn is_on_exit_in_flight(&self) -> bool {
        self.on_exit_in_flight.load(Ordering::SeqCst) > 0
    }

    /// True if any on-enter or on-exit callback of this place is currently
    /// running or queued to run -- what `requireNoActionsInExecution`
    /// checks across every place in the net.
    pub fn is_any_action_in_flight(&self) -> bool {
        self.is_on_enter_in_flight() || self.is_on_exit_in_flight()
    }

    /// Latch that makes `enter` wait before submitting its on-enter callback
    /// until something sets it back to `false`. A host-facing primitive, not
    /// one the engine's own firing pass engages on its own -- toggling it
    /// from the firing thread around a pass it then blocks on would
    /// deadlock, since nothing else would ever clear it. Exposed so a host
    /// that drives its own synchronization (e.g. pausing on-enter delivery
    /// while reconfiguring callbacks from another thread) has a place to
    /// hang it. Implemented with a condition variable rather than the
    /// bounded busy-wait the original engine used, per the accepted design
    /// substitution.
    pub fn block_starting_on_enter(&self, value: bool) {
        *self.block_starting_on_enter.lock().expect("latch poisoned") = value;
        if !value {
            self.block_starting_on_enter_cv.notify_all();
        }
    }

    fn wait_for_unblocked(&self) {
        let guard = self.block_starting_on_enter.lock().expect("latch poisoned");
        let _unused = self
            .block_starting_on_enter_cv
            .wait_while(guard, |blocked| *blocked)
            .expect("latch poisoned");
    }

    /// Add `n` tokens, then -- if this place has an on-enter callback --
    /// submit it to `executor`. Returns an error and leaves the token count
    /// unchanged if `n == 0` or the count would overflow.
    pub fn enter(&self, n: u64, executor: &dyn ActionExecutor) -> PtnResult<()> {
        if n == 0 {
            return Err(PtnError::NullTokens);
        }
        {
            let mut state = self.state.write().expect("place lock poisoned");
            state.tokens = state
                .tokens
                .checked_add(n)
                .ok_or(PtnError::Overflow)?;
        }
        if let Some(action) = &self.on_enter_action {
            self.wait_for_unblocked();
            executor.execute(action.clone(), self.on_enter_in_flight.clone());
        }
        Ok(())
    }

    /// Remove `n` tokens (`n == 0` resets the place to zero), then -- if
    /// this place has an on-exit callback -- submit it to `executor`.
    pub fn exit(&self, n: u64, executor: &dyn ActionExecutor) -> PtnResult<()> {
        {
            let mut state = self.state.write().expect("place lock poisoned");
            if n == 0 {
                state.tokens = 0;
            } else {
                if state.tokens < n {
                    return Err(PtnError::NotEnoughTokens {
                        available: state.tokens,
                        requested: n,
                    });
                }
                state.tokens -= n;
            }
        }
        if let Some(action) = &self.on_exit_action {
            // on-exit actions are not gated by the "block starting" latch:
            // that latch only guards the start of a *new* firing's on-enter
            // work against a *prior* firing's on-enter work still in flight.
            executor.execute(action.clone(), self.on_exit_in_flight.clone());
        }
        Ok(())
    }
}

impl Named for Place {
    fn name(&self) -> &str {
        &self.name
    }
}
