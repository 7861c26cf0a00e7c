// Structural import/export contract: a plain-data description of a net
// that any concrete codec (XML, JSON, ...) can (de)serialize

//! # Import / Export Contract
//!
//! The engine itself never picks a wire format. [`NetDescription`] and its
//! nested structs are the plain, `serde`-derived shape every concrete codec
//! reads and writes; [`Exporter`] and [`Importer`] are the two traits a host
//! implements once per format. This crate ships [`JsonExporter`] /
//! [`JsonImporter`] as a reference codec exercised by its own tests -- the
//! XML codec a host actually wants for a serialized-net file stays external,
//! the same way a concrete HTTP framework stays external to a request-routing
//! trait.

use serde::{Deserialize, Serialize};

use crate::error::{PtnError, PtnResult};
use crate::executor::ActionsThreadOption;

pub mod json;
pub use json::{JsonExporter, JsonImporter};

/// One end of a typed arc in its serialized form: just the place name and
/// weight, since the arc's type is implied by which list of the owning
/// [`TransitionDescription`] it's found in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArcDescription {
    pub place: String,
    pub weight: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceDescription {
    pub name: String,
    pub tokens: u64,
    pub input: bool,
    pub on_enter_action: Option<String>,
    pub on_exit_action: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDescription {
    pub name: String,
    pub activation_places: Vec<ArcDescription>,
    pub destination_places: Vec<ArcDescription>,
    pub inhibitor_places: Vec<ArcDescription>,
    pub bidirectional_places: Vec<ArcDescription>,
    pub additional_conditions: Vec<String>,
    pub require_no_actions_in_execution: bool,
}

/// The full, format-agnostic description of a net's structure: the
/// actions-thread policy plus every place and transition. Deliberately
/// excludes nothing `spec`'s import/export contract names -- a round trip
/// through any codec built on this struct reproduces the same places with
/// the same attributes and the same transitions with the same arcs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetDescription {
    pub actions_thread_option: String,
    pub places: Vec<PlaceDescription>,
    pub transitions: Vec<TransitionDescription>,
}

/// Implemented once per concrete wire format (XML, JSON, ...). Takes a
/// description by reference since the engine builds it fresh from its live
/// registries on every call to `PtnEngine::export`.
pub trait Exporter {
    fn export(&mut self, net: &NetDescription) -> PtnResult<()>;
}

/// Implemented once per concrete wire format. Produces a description the
/// engine rebuilds its net from; action and condition names in it must
/// already be registered on the importing engine.
pub trait Importer {
    fn import(&self) -> PtnResult<NetDescription>;
}

pub(crate) fn thread_option_to_string(option: ActionsThreadOption) -> String {
    match option {
        ActionsThreadOption::Inline => "INLINE",
        ActionsThreadOption::EventLoop => "EVENT_LOOP",
        ActionsThreadOption::Detached => "DETACHED",
        ActionsThreadOption::JobQueue => "JOB_QUEUE",
    }
    .to_string()
}

pub(crate) fn thread_option_from_str(value: &str) -> PtnResult<ActionsThreadOption> {
    match value {
        "INLINE" => Ok(ActionsThreadOption::Inline),
        "EVENT_LOOP" => Ok(ActionsThreadOption::EventLoop),
        "DETACHED" => Ok(ActionsThreadOption::Detached),
        "JOB_QUEUE" => Ok(ActionsThreadOption::JobQueue),
        other => Err(PtnError::ImportFormat(format!(
            "unknown actions thread option: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_option_round_trips_through_its_string_form() {
        for option in [
            ActionsThreadOption::Inline,
            ActionsThreadOption::EventLoop,
            ActionsThreadOption::Detached,
            ActionsThreadOption::JobQueue,
        ] {
            let as_string = thread_option_to_string(option);
            assert_eq!(thread_option_from_str(&as_string).unwrap(), option);
        }
    }

    #[test]
    fn unknown_thread_option_is_an_import_format_error() {
        assert_eq!(
            thread_option_from_str("BOGUS").unwrap_err(),
            PtnError::ImportFormat("unknown actions thread option: BOGUS".into())
        );
    }
}
