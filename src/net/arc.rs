// Typed, weighted edges between places and transitions

use crate::net::PlaceId;

/// The four arc flavors a transition can hold. Deliberately a sum type --
/// not a boolean-flag struct -- since each variant has distinct enablement
/// and firing semantics (see [`crate::net::Transition::is_enabled`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArcKind {
    /// Consumes `weight` tokens from the place when the transition fires.
    Activation,
    /// Deposits `weight` tokens into the place when the transition fires.
    Destination,
    /// Requires the place to hold strictly fewer than `weight` tokens for
    /// the transition to be enabled. Does not consume or deposit.
    Inhibitor,
    /// Equivalent to an [`ArcKind::Activation`] + [`ArcKind::Destination`]
    /// pair of equal weight on the same place: net token change is zero,
    /// but availability is still required to fire.
    Bidirectional,
}

/// A single typed, weighted edge from a place to a transition (or vice
/// versa, depending on `kind`).
#[derive(Debug, Clone, Copy)]
pub struct Arc {
    pub place: PlaceId,
    pub weight: u64,
    pub kind: ArcKind,
}

impl Arc {
    pub fn new(place: PlaceId, weight: u64, kind: ArcKind) -> Self {
        Self { place, weight, kind }
    }
}
