use glam::Vec2;

use crate::error::{Result, SimError};
use crate::population::Transition;
use crate::types::{PersonId, Tick};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HealthStatus {
    Healthy,
    Sick,
    Healed,
    Dead,
}

impl HealthStatus {
    pub const ALL: [HealthStatus; 4] = [
        HealthStatus::Healthy,
        HealthStatus::Sick,
        HealthStatus::Healed,
        HealthStatus::Dead,
    ];

    /// The counter transition for moving from `self` to `next`, if legal.
    ///
    /// Only `Healthy -> Sick`, `Sick -> Healed` and `Sick -> Dead` exist.
    pub fn transition_to(self, next: HealthStatus) -> Option<Transition> {
        match (self, next) {
            (HealthStatus::Healthy, HealthStatus::Sick) => Some(Transition::ToSick),
            (HealthStatus::Sick, HealthStatus::Healed) => Some(Transition::ToHealed),
            (HealthStatus::Sick, HealthStatus::Dead) => Some(Transition::ToDead),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, HealthStatus::Healed | HealthStatus::Dead)
    }

    /// Display color as `[r, g, b]`, one distinct color per status.
    pub fn color(self) -> [u8; 3] {
        match self {
            HealthStatus::Healthy => [0x64, 0xdd, 0x17],
            HealthStatus::Sick => [0xf4, 0x43, 0x36],
            HealthStatus::Healed => [0x1e, 0x88, 0xe5],
            HealthStatus::Dead => [0x42, 0x42, 0x42],
        }
    }
}

#[derive(Clone, Debug)]
pub struct Person {
    pub id: PersonId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub status: HealthStatus,
    /// Tick at which the person became sick.
    pub contagion_moment: Option<Tick>,
    /// Due tick drawn once per infection when progression caches it.
    pub due_tick: Option<i64>,
    pub movement_locked: bool,
}

impl Person {
    pub fn new(id: PersonId, pos: Vec2, vel: Vec2, radius: f32, quarantined: bool) -> Self {
        Self {
            id,
            pos,
            vel,
            radius,
            status: HealthStatus::Healthy,
            contagion_moment: None,
            due_tick: None,
            movement_locked: quarantined,
        }
    }

    /// Checks the fields every operation relies on.
    pub fn validate(&self) -> Result<()> {
        let malformed = |reason| Err(SimError::MalformedPerson { id: self.id, reason });

        if self.id == 0 {
            return malformed("id must be positive");
        }
        if !(self.radius > 0.0) {
            return malformed("radius must be positive");
        }
        if !self.pos.is_finite() || !self.vel.is_finite() {
            return malformed("position and velocity must be finite");
        }
        if self.status != HealthStatus::Healthy && self.contagion_moment.is_none() {
            return malformed("missing contagion moment");
        }
        if self.status == HealthStatus::Dead && !self.movement_locked {
            return malformed("dead but not movement-locked");
        }
        Ok(())
    }

    pub fn is_sick(&self) -> bool {
        self.status == HealthStatus::Sick
    }
}
