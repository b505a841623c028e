use glam::Vec2;
use thiserror::Error;

use crate::person::HealthStatus;
use crate::population::{HealthCounts, Transition};
use crate::types::PersonId;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("cannot apply {transition:?} to counters {counts:?}")]
    CounterUnderflow {
        transition: Transition,
        counts: HealthCounts,
    },

    #[error("counters {counts:?} do not match population (expected {expected:?})")]
    CounterMismatch {
        counts: HealthCounts,
        expected: HealthCounts,
    },

    #[error("person {id} cannot go from {from:?} to {to:?}")]
    IllegalTransition {
        id: PersonId,
        from: HealthStatus,
        to: HealthStatus,
    },

    #[error("malformed person {id}: {reason}")]
    MalformedPerson { id: PersonId, reason: &'static str },

    #[error("no person at index {0}")]
    UnknownPerson(usize),

    #[error("person ids must run 1..={len} in registry order, found {id}")]
    InvalidIds { len: usize, id: PersonId },

    #[error("person {id} at {pos:?} does not fit a {width}x{height} arena")]
    OutOfArena {
        id: PersonId,
        pos: Vec2,
        width: f32,
        height: f32,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
