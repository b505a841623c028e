//! Straight-line motion with elastic reflection off the arena walls.

use glam::Vec2;
use rand::Rng;

use crate::error::Result;
use crate::person::Person;

/// The rectangle people move in, spanning `[0, width] x [0, height]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Arena {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whether a circle of `radius` at `pos` lies fully inside the arena.
    pub fn contains(&self, pos: Vec2, radius: f32) -> bool {
        pos.x >= radius
            && pos.x <= self.width - radius
            && pos.y >= radius
            && pos.y <= self.height - radius
    }
}

/// Draws one velocity component in `-max_speed..=max_speed`.
///
/// A zero draw becomes `1` so that nobody is left standing still by chance.
pub fn random_speed(max_speed: i32, rng: &mut impl Rng) -> f32 {
    match rng.random_range(-max_speed..=max_speed) {
        0 => 1.0,
        v => v as f32,
    }
}

/// Reflects one velocity component if the next position crosses a bound.
///
/// The upper bound is checked first; at most one flip happens per call.
fn reflect_axis(pos: f32, vel: f32, radius: f32, extent: f32) -> f32 {
    if pos + vel > extent - radius || pos + vel < radius {
        -vel
    } else {
        vel
    }
}

/// Moves `person` by one tick of its velocity.
///
/// Locked (quarantined or dead) people do not move. For everyone else, each
/// axis is handled independently: if the next position would leave
/// `[radius, extent - radius]`, that axis's velocity is reversed before the
/// position is updated.
///
/// ### Errors
/// Returns [`crate::error::SimError::MalformedPerson`] if the person fails
/// [`Person::validate`].
pub fn advance(person: &mut Person, arena: &Arena) -> Result<()> {
    person.validate()?;
    if person.movement_locked {
        return Ok(());
    }

    person.vel.x = reflect_axis(person.pos.x, person.vel.x, person.radius, arena.width);
    person.vel.y = reflect_axis(person.pos.y, person.vel.y, person.radius, arena.height);
    person.pos += person.vel;
    Ok(())
}

/// Euclidean distance between two people's centers.
pub fn distance(a: &Person, b: &Person) -> f32 {
    a.pos.distance(b.pos)
}
