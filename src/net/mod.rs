// Petri net data model: places, arcs, transitions, registries
// These are the generic, host-agnostic building blocks of the engine

//! # Net Data Model
//!
//! This module contains the core data structures that make up a Petri net:
//! [`Place`], [`Arc`], [`Transition`], and the [`Registry`] that owns them.
//!
//! ## Module Organization
//! Each concern gets its own file:
//! - `place`: token-holding nodes with on-enter/on-exit callbacks
//! - `arc`: typed, weighted edges between places and transitions
//! - `transition`: enablement and firing logic
//! - `registry`: the uniform name-indexed container shared by all four
//!   registries (places, transitions, actions, conditions)

pub mod arc;
pub mod place;
pub mod registry;
pub mod transition;

pub use arc::{Arc, ArcKind};
pub use place::{Place, PlaceId, PlaceProperties};
pub use registry::Registry;
pub use transition::{Transition, TransitionId, TransitionProperties};

use std::sync::Arc as StdArc;

/// A host-supplied side-effect callback attached to a place's on-enter or
/// on-exit event. Plain `Fn`, not `Result`-returning: per the error-handling
/// design, a callback that panics is the executor's concern, not the net's.
pub type Action = StdArc<dyn Fn() + Send + Sync>;

/// A host-supplied, side-effect-free boolean predicate attached to a
/// transition as an additional condition. May be evaluated multiple times
/// per firing cycle, so it must be pure.
pub type Condition = StdArc<dyn Fn() -> bool + Send + Sync>;
