// ptn_engine - a general-purpose Petri-net execution engine
// Models discrete-event control flow as a weighted, inhibited Petri net
// with user-supplied side-effect callbacks attached to places.

//! # ptn_engine
//!
//! This crate is the CORE of a general-purpose Petri-net execution engine:
//! the net data model ([`net`]), the four callback-execution policies
//! ([`executor`]), the public engine and its firing cycle ([`engine`]), and
//! the structural import/export contract ([`io`]).
//!
//! Demo applications, a concrete wire codec (XML, TOML, ...), CLI
//! front-ends, and host domain models are deliberately not part of this
//! crate -- thin glue over the contract below, left to whoever embeds it.
//!
//! ## Quick tour
//!
//! ```rust
//! use ptn_engine::{ActionsThreadOption, PtnEngine};
//!
//! let engine = PtnEngine::with_actions_thread_option(ActionsThreadOption::Inline);
//! engine.create_place("In", 0, true, None, None).unwrap();
//! engine.create_place("Out", 0, false, None, None).unwrap();
//! engine
//!     .create_transition("move", &["In"], &[], &["Out"], &[], &[], &[], &[], &[], &[], false)
//!     .unwrap();
//!
//! engine.execute();
//! engine.increment_input_place("In").unwrap();
//! engine.stop();
//! assert_eq!(engine.number_of_tokens("Out").unwrap(), 1);
//! ```
//!
//! ## Rust Learning Notes
//!
//! ### Module System
//! Each top-level concern gets its own directory with a `mod.rs` root:
//! `net/` is the data model, `executor/` the callback policies, `engine/`
//! the public API and event loop, `io/` the import/export contract.
//!
//! ### Re-exports
//! The `pub use` statements below flatten the module hierarchy so callers
//! write `ptn_engine::PtnEngine` instead of `ptn_engine::engine::PtnEngine`.

pub mod engine;
pub mod error;
pub mod executor;
pub mod io;
pub mod net;

pub use engine::{EngineConfig, PtnEngine};
pub use error::{PtnError, PtnResult};
pub use executor::{ActionExecutor, ActionsThreadOption, DetachedExecutor, EventLoopExecutor, InlineExecutor, JobQueueExecutor};
pub use io::{ArcDescription, Exporter, Importer, JsonExporter, JsonImporter, NetDescription, PlaceDescription, TransitionDescription};
pub use net::{Action, Arc, ArcKind, Condition, Place, PlaceId, PlaceProperties, Transition, TransitionId, TransitionProperties};
