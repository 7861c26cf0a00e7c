// Error taxonomy for the Petri net engine
// This defines every way a net-construction or mutation call can fail

//! # Error Types
//!
//! ## Rust Learning Notes:
//!
//! ### The `thiserror` Crate
//! `#[derive(Error)]` implements `std::error::Error` for us and
//! `#[error("...")]` supplies the `Display` message, with `{field}`
//! interpolating struct/tuple fields automatically.
//!
//! ### Propagation Policy
//! Every variant here is returned to the caller unchanged; construction and
//! mutation calls never leave the net partially modified. Errors raised
//! inside a host callback are a different story -- see `executor` module.

use thiserror::Error;

/// Everything that can go wrong while building or driving a [`crate::PtnEngine`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PtnError {
    /// A place, transition, action or condition name does not resolve.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// Attempted to register a place, transition, action or condition whose
    /// name is already taken in its registry.
    #[error("name already registered: {0}")]
    RepeatedName(String),

    /// The same place appears twice in one arc list of a single transition.
    #[error("place {0} appears more than once in the same arc list")]
    RepeatedArcPlace(String),

    /// `increment_input_place` was called on a place that isn't marked input.
    #[error("{0} is not an input place")]
    NotInputPlace(String),

    /// `Place::enter` was called with `n == 0`.
    #[error("enter() called with zero tokens")]
    NullTokens,

    /// `Place::exit` was asked to withdraw more tokens than are present.
    #[error("not enough tokens to remove: have {available}, requested {requested}")]
    NotEnoughTokens { available: u64, requested: u64 },

    /// A place's token count would exceed `u64::MAX`.
    #[error("token count overflow")]
    Overflow,

    /// An action or condition name was given but does not resolve to a
    /// registered callback.
    #[error("no callback registered for: {0}")]
    MissingCallback(String),

    /// A serialized net description was malformed (unknown arc type,
    /// unparseable integer, unrecognized boolean literal, dangling name
    /// reference).
    #[error("malformed net description: {0}")]
    ImportFormat(String),
}

/// Shorthand for `std::result::Result<T, PtnError>`, the way the teacher
/// crate aliases its own error type at the crate root.
pub type PtnResult<T> = std::result::Result<T, PtnError>;
