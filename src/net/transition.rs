// Evaluates enablement and atomically moves tokens along its arcs

use crate::error::{PtnError, PtnResult};
use crate::executor::ActionExecutor;
use crate::net::arc::{Arc as NetArc, ArcKind};
use crate::net::registry::{Named, Registry};
use crate::net::{Condition, Place, PlaceId};

/// Index of a [`Transition`] inside its owning registry. See [`PlaceId`] for
/// the rationale of using an index rather than a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionId(pub(crate) usize);

/// Construction bundle for a [`Transition`].
pub struct TransitionProperties {
    pub name: String,
    pub activation: Vec<(String, u64)>,
    pub destination: Vec<(String, u64)>,
    pub inhibitor: Vec<(String, u64)>,
    pub bidirectional: Vec<(String, u64)>,
    pub additional_conditions: Vec<(String, Condition)>,
    pub require_no_actions_in_execution: bool,
}

impl TransitionProperties {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            activation: Vec::new(),
            destination: Vec::new(),
            inhibitor: Vec::new(),
            bidirectional: Vec::new(),
            additional_conditions: Vec::new(),
            require_no_actions_in_execution: false,
        }
    }
}

/// A transition: the active component that consumes activation tokens and
/// produces destination tokens when it fires.
///
/// Transitions hold no strong reference to places -- only their
/// [`PlaceId`] -- so the place registry remains the sole owner. Arc lists
/// preserve construction order; that order is the order firing withdraws
/// (activation) and deposits (destination) tokens.
pub struct Transition {
    name: String,
    activation: Vec<NetArc>,
    destination: Vec<NetArc>,
    inhibitor: Vec<NetArc>,
    bidirectional: Vec<NetArc>,
    additional_conditions: Vec<(String, Condition)>,
    require_no_actions_in_execution: bool,
}

impl Transition {
    /// Builds a transition, resolving place names against `places` and
    /// rejecting: an unknown place name, a place repeated within a single
    /// arc list, an empty transition name, or an unknown condition name
    /// (conditions are resolved by the caller and passed in already paired
    /// with their name -- see `PtnEngine::create_transition`).
    pub fn new(props: TransitionProperties, places: &Registry<Place>) -> PtnResult<Self> {
        if props.name.is_empty() {
            return Err(PtnError::InvalidName(String::new()));
        }
        let activation = resolve_arcs(&props.activation, places, ArcKind::Activation)?;
        let destination = resolve_arcs(&props.destination, places, ArcKind::Destination)?;
        let inhibitor = resolve_arcs(&props.inhibitor, places, ArcKind::Inhibitor)?;
        let bidirectional = resolve_arcs(&props.bidirectional, places, ArcKind::Bidirectional)?;
        Ok(Self {
            name: props.name,
            activation,
            destination,
            inhibitor,
            bidirectional,
            additional_conditions: props.additional_conditions,
            require_no_actions_in_execution: props.require_no_actions_in_execution,
        })
    }

    pub fn activation_arcs(&self) -> &[NetArc] {
        &self.activation
    }

    pub fn destination_arcs(&self) -> &[NetArc] {
        &self.destination
    }

    pub fn inhibitor_arcs(&self) -> &[NetArc] {
        &self.inhibitor
    }

    pub fn bidirectional_arcs(&self) -> &[NetArc] {
        &self.bidirectional
    }

    pub fn condition_names(&self) -> impl Iterator<Item = &str> {
        self.additional_conditions
            .iter()
            .map(|(name, _)| name.as_str())
            .filter(|name| !name.is_empty())
    }

    pub fn requires_no_actions_in_execution(&self) -> bool {
        self.require_no_actions_in_execution
    }

    /// Enablement rule (spec.md 4.2): every activation arc has enough
    /// tokens, every inhibitor arc has strictly fewer than its weight,
    /// every additional condition holds, and -- if set -- no place in the
    /// net has a callback in flight.
    pub fn is_enabled(&self, places: &Registry<Place>) -> bool {
        if self.require_no_actions_in_execution && any_action_in_flight(places) {
            return false;
        }
        for arc in &self.activation {
            if places.get_by_index(arc.place.index()).get_tokens() < arc.weight {
                return false;
            }
        }
        for arc in &self.bidirectional {
            if places.get_by_index(arc.place.index()).get_tokens() < arc.weight {
                return false;
            }
        }
        for arc in &self.inhibitor {
            if places.get_by_index(arc.place.index()).get_tokens() >= arc.weight {
                return false;
            }
        }
        self.additional_conditions.iter().all(|(_, cond)| cond())
    }

    /// Re-checks enablement, then -- if still enabled -- fires: withdraws
    /// from every activation place (construction order), then deposits
    /// into every destination place (construction order). Returns whether
    /// it actually fired.
    ///
    /// A place that is both an activation and a destination of the same
    /// transition (a non-bidirectional cycle back onto itself) still sees
    /// an exit then an enter, and therefore still runs both callbacks, even
    /// though the net token count is unchanged -- this is deliberate, see
    /// the open design question in spec.md 9. A `BIDIRECTIONAL` arc gets
    /// the same exit-then-enter treatment, of equal weight on the one arc,
    /// rather than requiring the host to declare the same place twice.
    pub fn fire(&self, places: &Registry<Place>, executor: &dyn ActionExecutor) -> PtnResult<bool> {
        if !self.is_enabled(places) {
            return Ok(false);
        }
        for arc in &self.activation {
            places.get_by_index(arc.place.index()).exit(arc.weight, executor)?;
        }
        for arc in &self.bidirectional {
            let place = places.get_by_index(arc.place.index());
            place.exit(arc.weight, executor)?;
            place.enter(arc.weight, executor)?;
        }
        for arc in &self.destination {
            places.get_by_index(arc.place.index()).enter(arc.weight, executor)?;
        }
        Ok(true)
    }
}

impl Named for Transition {
    fn name(&self) -> &str {
        &self.name
    }
}

fn any_action_in_flight(places: &Registry<Place>) -> bool {
    places
        .iter_indices()
        .any(|i| places.get_by_index(i).is_any_action_in_flight())
}

fn resolve_arcs(
    arcs: &[(String, u64)],
    places: &Registry<Place>,
    kind: ArcKind,
) -> PtnResult<Vec<NetArc>> {
    let mut seen = std::collections::HashSet::new();
    let mut resolved = Vec::with_capacity(arcs.len());
    for (name, weight) in arcs {
        if !seen.insert(name.clone()) {
            return Err(PtnError::RepeatedArcPlace(name.clone()));
        }
        let index = places.index_of(name)?;
        resolved.push(NetArc::new(PlaceId(index), *weight, kind));
    }
    Ok(resolved)
}
