// The engine: public API, registries, and the firing-cycle event loop
//
// This module owns nothing the net data model doesn't already own -- it is
// the thing that drives `net::Transition::fire` against `net::Registry`
// instances on a dedicated thread, and exposes the host-facing API described
// in the import/export contract and the firing cycle.

//! # Engine
//!
//! [`PtnEngine`] is the crate's single public entry point: it owns the place
//! and transition registries, the action/condition name maps, the selected
//! [`ActionExecutor`], and (once [`PtnEngine::execute`] is called) a
//! dedicated event-loop thread running the firing cycle until [`PtnEngine::stop`].
//!
//! ## Rust Learning Notes
//!
//! ### Why `Arc<Inner>` instead of `&self` fields directly
//! [`PtnEngine::execute`] spawns a background thread that needs to keep
//! reading the registries and the executor for as long as the loop runs,
//! independently of how long the `PtnEngine` value the host is holding
//! happens to live on the stack. Splitting the shared state into an `Inner`
//! struct behind an `Arc` lets the spawned thread hold its own clone of that
//! `Arc` -- ordinary reference-counted sharing, no `unsafe`, no lifetime
//! gymnastics.
//!
//! ### One coarse lock vs. many fine ones
//! The original engine this crate's behavior is modeled on takes a single
//! engine-wide write lock for an entire firing pass, including the host
//! callbacks that pass triggers. That doesn't translate safely into Rust's
//! `std::sync::RwLock`: it isn't reentrant, and an `INLINE`/`EVENT_LOOP`
//! callback that calls back into the engine (say, `increment_input_place`)
//! would then deadlock against the very lock its own firing pass is still
//! holding. This engine instead relies on the locks the net data model
//! already has -- each [`crate::net::Registry`] guards its own structure,
//! each [`crate::net::Place`] guards its own token count -- which gives the
//! same per-item consistency without a lock a callback could ever contend
//! with itself over. See `DESIGN.md` for the full writeup.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{PtnError, PtnResult};
use crate::executor::{ActionExecutor, ActionsThreadOption};
use crate::io::{self, ArcDescription, Exporter, Importer, NetDescription, PlaceDescription, TransitionDescription};
use crate::net::place::{Place, PlaceId, PlaceProperties};
use crate::net::registry::{NameMap, Named, Registry};
use crate::net::transition::{Transition, TransitionId, TransitionProperties};
use crate::net::{Action, Arc as NetArc, Condition};

/// Construction options for [`PtnEngine::new`].
#[derive(Clone)]
pub struct EngineConfig {
    pub actions_thread_option: ActionsThreadOption,
    pub event_loop_sleep_duration: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            actions_thread_option: ActionsThreadOption::default(),
            event_loop_sleep_duration: Duration::from_millis(1),
        }
    }
}

struct Inner {
    places: Registry<Place>,
    transitions: Registry<Transition>,
    actions: NameMap<Action>,
    conditions: NameMap<Condition>,
    executor: RwLock<Box<dyn ActionExecutor>>,
    actions_thread_option: Mutex<ActionsThreadOption>,
    sleep_duration: Mutex<Duration>,
    stop_flag: AtomicBool,
    running: AtomicBool,
    new_input: Mutex<bool>,
    input_cv: Condvar,
    log_enabled: AtomicBool,
    log_sink: Mutex<Option<Box<dyn Write + Send>>>,
}

/// The Petri net engine: build a net with `create_place`/`create_transition`,
/// feed it with `increment_input_place`, and drive it with `execute`/`stop`.
pub struct PtnEngine {
    inner: Arc<Inner>,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
}

impl PtnEngine {
    pub fn new(config: EngineConfig) -> Self {
        let inner = Arc::new(Inner {
            places: Registry::new(),
            transitions: Registry::new(),
            actions: NameMap::new(),
            conditions: NameMap::new(),
            executor: RwLock::new(config.actions_thread_option.build()),
            actions_thread_option: Mutex::new(config.actions_thread_option),
            sleep_duration: Mutex::new(config.event_loop_sleep_duration),
            stop_flag: AtomicBool::new(false),
            running: AtomicBool::new(false),
            new_input: Mutex::new(false),
            input_cv: Condvar::new(),
            log_enabled: AtomicBool::new(false),
            log_sink: Mutex::new(None),
        });
        Self {
            inner,
            loop_handle: Mutex::new(None),
        }
    }

    pub fn with_actions_thread_option(option: ActionsThreadOption) -> Self {
        Self::new(EngineConfig {
            actions_thread_option: option,
            ..EngineConfig::default()
        })
    }

    /// Registers a place with an action resolved by name from the action
    /// registry (pass `None` for a place with no callback on that edge).
    pub fn create_place(
        &self,
        name: impl Into<String>,
        initial_tokens: u64,
        is_input: bool,
        on_enter_action_name: Option<&str>,
        on_exit_action_name: Option<&str>,
    ) -> PtnResult<PlaceId> {
        let mut props = PlaceProperties::new(name, initial_tokens, is_input);
        if let Some(name) = on_enter_action_name {
            props.on_enter_action = Some(self.inner.actions.get(name)?);
            props.on_enter_action_name = name.to_string();
        }
        if let Some(name) = on_exit_action_name {
            props.on_exit_action = Some(self.inner.actions.get(name)?);
            props.on_exit_action_name = name.to_string();
        }
        let place = Place::new(props)?;
        let index = self.inner.places.insert(place)?;
        Ok(PlaceId(index))
    }

    /// Registers a place wired directly to host closures, bypassing the
    /// action registry -- the "variant taking direct callbacks".
    pub fn create_place_with_actions(
        &self,
        name: impl Into<String>,
        initial_tokens: u64,
        is_input: bool,
        on_enter_action: Option<Action>,
        on_exit_action: Option<Action>,
    ) -> PtnResult<PlaceId> {
        let mut props = PlaceProperties::new(name, initial_tokens, is_input);
        props.on_enter_action = on_enter_action;
        props.on_exit_action = on_exit_action;
        let place = Place::new(props)?;
        let index = self.inner.places.insert(place)?;
        Ok(PlaceId(index))
    }

    /// Registers a transition. Weight slices may be shorter than their place
    /// slice (missing weights default to 1) or empty entirely.
    #[allow(clippy::too_many_arguments)]
    pub fn create_transition(
        &self,
        name: impl Into<String>,
        activation_places: &[&str],
        activation_weights: &[u64],
        destination_places: &[&str],
        destination_weights: &[u64],
        inhibitor_places: &[&str],
        inhibitor_weights: &[u64],
        bidirectional_places: &[&str],
        bidirectional_weights: &[u64],
        additional_conditions: &[&str],
        require_no_actions_in_execution: bool,
    ) -> PtnResult<TransitionId> {
        let mut props = TransitionProperties::new(name);
        props.activation = zip_weights(activation_places, activation_weights);
        props.destination = zip_weights(destination_places, destination_weights);
        props.inhibitor = zip_weights(inhibitor_places, inhibitor_weights);
        props.bidirectional = zip_weights(bidirectional_places, bidirectional_weights);
        for &condition_name in additional_conditions {
            let predicate = self.inner.conditions.get(condition_name)?;
            props
                .additional_conditions
                .push((condition_name.to_string(), predicate));
        }
        props.require_no_actions_in_execution = require_no_actions_in_execution;
        let transition = Transition::new(props, &self.inner.places)?;
        let index = self.inner.transitions.insert(transition)?;
        Ok(TransitionId(index))
    }

    pub fn register_action(&self, name: impl Into<String>, callback: Action) -> PtnResult<()> {
        let name = name.into();
        self.inner.actions.insert(&name, callback)
    }

    pub fn register_condition(&self, name: impl Into<String>, predicate: Condition) -> PtnResult<()> {
        let name = name.into();
        self.inner.conditions.insert(&name, predicate)
    }

    /// Starts the event loop. A no-op if it's already running.
    pub fn execute(&self) {
        self.start(false, None);
    }

    /// Starts the event loop, printing `"<place>: <tokens>"` lines to stdout
    /// before each firing pass.
    pub fn execute_logged(&self) {
        self.start(true, None);
    }

    /// Starts the event loop, writing the marking lines to `sink` instead of
    /// stdout. `sink` must be `'static` since it's moved onto the loop
    /// thread.
    pub fn execute_logged_to<W: Write + Send + 'static>(&self, sink: W) {
        self.start(true, Some(Box::new(sink)));
    }

    fn start(&self, log: bool, sink: Option<Box<dyn Write + Send>>) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.stop_flag.store(false, Ordering::SeqCst);
        self.inner.log_enabled.store(log, Ordering::SeqCst);
        *self.inner.log_sink.lock().expect("log sink lock poisoned") = sink;
        let inner = self.inner.clone();
        let handle = thread::spawn(move || run_event_loop(&inner));
        *self.loop_handle.lock().expect("loop handle lock poisoned") = Some(handle);
    }

    pub fn is_event_loop_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Signals the loop to exit, joins it, drains the executor, then zeroes
    /// every input place. Idempotent: a second call has nothing left to join
    /// or zero.
    pub fn stop(&self) {
        self.inner.stop_flag.store(true, Ordering::SeqCst);
        {
            let mut new_input = self.inner.new_input.lock().expect("input lock poisoned");
            *new_input = true;
        }
        self.inner.input_cv.notify_all();
        if let Some(handle) = self.loop_handle.lock().expect("loop handle lock poisoned").take() {
            let _ = handle.join();
        }
        for idx in self.inner.places.iter_indices() {
            let place = self.inner.places.get_by_index(idx);
            if place.is_input() {
                place.set_tokens(0);
            }
        }
    }

    pub fn increment_input_place(&self, name: &str) -> PtnResult<()> {
        let place = self.inner.places.get_by_name(name)?;
        if !place.is_input() {
            return Err(PtnError::NotInputPlace(name.to_string()));
        }
        {
            let executor = self.inner.executor.read().expect("executor lock poisoned");
            place.enter(1, executor.as_ref())?;
        }
        {
            let mut new_input = self.inner.new_input.lock().expect("input lock poisoned");
            *new_input = true;
        }
        self.inner.input_cv.notify_all();
        Ok(())
    }

    pub fn number_of_tokens(&self, name: &str) -> PtnResult<u64> {
        Ok(self.inner.places.get_by_name(name)?.get_tokens())
    }

    /// Switches the action executor policy. Silently ignored while the event
    /// loop is running -- callers that need to know should check
    /// `is_event_loop_running` first.
    pub fn set_actions_thread_option(&self, option: ActionsThreadOption) {
        if self.inner.running.load(Ordering::SeqCst) {
            return;
        }
        *self
            .inner
            .actions_thread_option
            .lock()
            .expect("actions thread option lock poisoned") = option;
        *self.inner.executor.write().expect("executor lock poisoned") = option.build();
    }

    pub fn get_actions_thread_option(&self) -> ActionsThreadOption {
        *self
            .inner
            .actions_thread_option
            .lock()
            .expect("actions thread option lock poisoned")
    }

    pub fn set_event_loop_sleep_duration(&self, duration: Duration) {
        *self.inner.sleep_duration.lock().expect("sleep duration lock poisoned") = duration;
    }

    pub fn get_event_loop_sleep_duration(&self) -> Duration {
        *self.inner.sleep_duration.lock().expect("sleep duration lock poisoned")
    }

    /// Serializes the net's current structure (not its marking history) via
    /// `exporter`.
    pub fn export(&self, exporter: &mut dyn Exporter) -> PtnResult<()> {
        exporter.export(&self.describe())
    }

    /// Clears every place and transition, then rebuilds the net from
    /// `importer`'s description. Action and condition names must already be
    /// registered.
    pub fn import(&self, importer: &dyn Importer) -> PtnResult<()> {
        let description = importer.import()?;
        self.rebuild(description)
    }

    fn describe(&self) -> NetDescription {
        let actions_thread_option = io::thread_option_to_string(self.get_actions_thread_option());

        let places = self
            .inner
            .places
            .iter_indices()
            .map(|idx| {
                let place = self.inner.places.get_by_index(idx);
                PlaceDescription {
                    name: place.name().to_string(),
                    tokens: place.get_tokens(),
                    input: place.is_input(),
                    on_enter_action: non_empty(place.on_enter_action_name()),
                    on_exit_action: non_empty(place.on_exit_action_name()),
                }
            })
            .collect();

        let transitions = self
            .inner
            .transitions
            .iter_indices()
            .map(|idx| {
                let transition = self.inner.transitions.get_by_index(idx);
                TransitionDescription {
                    name: transition.name().to_string(),
                    activation_places: describe_arcs(&self.inner.places, transition.activation_arcs()),
                    destination_places: describe_arcs(&self.inner.places, transition.destination_arcs()),
                    inhibitor_places: describe_arcs(&self.inner.places, transition.inhibitor_arcs()),
                    bidirectional_places: describe_arcs(&self.inner.places, transition.bidirectional_arcs()),
                    additional_conditions: transition.condition_names().map(String::from).collect(),
                    require_no_actions_in_execution: transition.requires_no_actions_in_execution(),
                }
            })
            .collect();

        NetDescription {
            actions_thread_option,
            places,
            transitions,
        }
    }

    fn rebuild(&self, net: NetDescription) -> PtnResult<()> {
        self.inner.places.clear();
        self.inner.transitions.clear();

        let thread_option = io::thread_option_from_str(&net.actions_thread_option)?;
        self.set_actions_thread_option(thread_option);

        for place in &net.places {
            self.create_place(
                place.name.clone(),
                place.tokens,
                place.input,
                place.on_enter_action.as_deref(),
                place.on_exit_action.as_deref(),
            )?;
        }

        for transition in &net.transitions {
            let activation_places: Vec<&str> =
                transition.activation_places.iter().map(|a| a.place.as_str()).collect();
            let activation_weights: Vec<u64> =
                transition.activation_places.iter().map(|a| a.weight).collect();
            let destination_places: Vec<&str> =
                transition.destination_places.iter().map(|a| a.place.as_str()).collect();
            let destination_weights: Vec<u64> =
                transition.destination_places.iter().map(|a| a.weight).collect();
            let inhibitor_places: Vec<&str> =
                transition.inhibitor_places.iter().map(|a| a.place.as_str()).collect();
            let inhibitor_weights: Vec<u64> =
                transition.inhibitor_places.iter().map(|a| a.weight).collect();
            let bidirectional_places: Vec<&str> =
                transition.bidirectional_places.iter().map(|a| a.place.as_str()).collect();
            let bidirectional_weights: Vec<u64> =
                transition.bidirectional_places.iter().map(|a| a.weight).collect();
            let conditions: Vec<&str> = transition.additional_conditions.iter().map(String::as_str).collect();

            self.create_transition(
                transition.name.clone(),
                &activation_places,
                &activation_weights,
                &destination_places,
                &destination_weights,
                &inhibitor_places,
                &inhibitor_weights,
                &bidirectional_places,
                &bidirectional_weights,
                &conditions,
                transition.require_no_actions_in_execution,
            )?;
        }

        Ok(())
    }
}

impl Drop for PtnEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn zip_weights(names: &[&str], weights: &[u64]) -> Vec<(String, u64)> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.to_string(), weights.get(i).copied().unwrap_or(1)))
        .collect()
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn describe_arcs(places: &Registry<Place>, arcs: &[NetArc]) -> Vec<ArcDescription> {
    arcs.iter()
        .map(|arc| ArcDescription {
            place: places.get_by_index(arc.place.index()).name().to_string(),
            weight: arc.weight,
        })
        .collect()
}

/// The firing cycle: steps 1-6 of spec §4.6, repeated until `stop_flag` is
/// observed after a wait. Step 7 (zeroing input places) is `PtnEngine::stop`'s
/// job, run after this function's thread has been joined.
fn run_event_loop(inner: &Arc<Inner>) {
    let mut rng = StdRng::from_entropy();
    loop {
        {
            let mut new_input = inner.new_input.lock().expect("input lock poisoned");
            if !*new_input {
                let sleep_duration = *inner.sleep_duration.lock().expect("sleep duration lock poisoned");
                new_input = inner
                    .input_cv
                    .wait_timeout(new_input, sleep_duration)
                    .expect("input lock poisoned")
                    .0;
            }
            if inner.stop_flag.load(Ordering::SeqCst) {
                break;
            }
            *new_input = false;
        }

        log_marking(inner);

        let executor = inner.executor.read().expect("executor lock poisoned");
        let mut enabled: Vec<usize> = inner
            .transitions
            .iter_indices()
            .filter(|&idx| inner.transitions.get_by_index(idx).is_enabled(&inner.places))
            .collect();
        enabled.shuffle(&mut rng);
        tracing::debug!(enabled = enabled.len(), "starting firing pass");
        for idx in enabled {
            let transition = inner.transitions.get_by_index(idx);
            if let Err(err) = transition.fire(&inner.places, executor.as_ref()) {
                tracing::warn!(transition = transition.name(), error = %err, "skipping firing pass for transition");
            }
        }
    }

    inner.executor.read().expect("executor lock poisoned").shutdown();
    inner.running.store(false, Ordering::SeqCst);
}

fn log_marking(inner: &Inner) {
    for idx in inner.places.iter_indices() {
        let place = inner.places.get_by_index(idx);
        tracing::trace!(place = place.name(), tokens = place.get_tokens());
    }
    if !inner.log_enabled.load(Ordering::SeqCst) {
        return;
    }
    let mut sink = inner.log_sink.lock().expect("log sink lock poisoned");
    for idx in inner.places.iter_indices() {
        let place = inner.places.get_by_index(idx);
        let line = format!("{}: {}", place.name(), place.get_tokens());
        match sink.as_mut() {
            Some(writer) => {
                let _ = writeln!(writer, "{line}");
            }
            None => println!("{line}"),
        }
    }
}
