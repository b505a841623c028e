//! The drawable state the simulation hands to whoever displays it.
//!
//! The core never draws anything itself. Each step it passes one
//! [`Sprite`] per person and one [`DayStats`] to a [`RenderSink`].

use glam::Vec2;

use crate::person::{HealthStatus, Person};
use crate::population::HealthCounts;
use crate::types::{PersonId, Tick};

/// What a renderer needs to draw one person: a filled circle plus a label.
#[derive(Clone, Debug, PartialEq)]
pub struct Sprite {
    pub id: PersonId,
    pub pos: Vec2,
    pub radius: f32,
    pub status: HealthStatus,
    pub color: [u8; 3],
    pub label: String,
}

impl Sprite {
    pub fn of(person: &Person) -> Self {
        Self {
            id: person.id,
            pos: person.pos,
            radius: person.radius,
            status: person.status,
            color: person.status.color(),
            label: person.id.to_string(),
        }
    }

    /// Where the label goes: offset from the center by the radius on both
    /// axes.
    pub fn label_pos(&self) -> Vec2 {
        self.pos + Vec2::splat(self.radius)
    }
}

/// Aggregate numbers shown once per step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DayStats {
    pub day: Tick,
    pub healthy: usize,
    pub sick: usize,
    pub healed: usize,
    pub dead: usize,
}

impl DayStats {
    pub fn new(day: Tick, counts: HealthCounts) -> Self {
        Self {
            day,
            healthy: counts.healthy,
            sick: counts.sick,
            healed: counts.healed,
            dead: counts.dead,
        }
    }
}

pub trait RenderSink {
    /// Called before the first sprite of a frame.
    fn begin_frame(&mut self) {}

    fn draw_person(&mut self, sprite: Sprite);

    /// Called once per frame after every person has been drawn.
    fn update_stats(&mut self, stats: DayStats);
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn draw_person(&mut self, _sprite: Sprite) {}

    fn update_stats(&mut self, _stats: DayStats) {}
}

/// Keeps the most recent frame in memory.
///
/// Useful for renderers that draw outside the simulation step, and for tests.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    pub sprites: Vec<Sprite>,
    pub stats: DayStats,
    pub frames: u64,
}

impl RenderSink for FrameBuffer {
    fn begin_frame(&mut self) {
        self.sprites.clear();
    }

    fn draw_person(&mut self, sprite: Sprite) {
        self.sprites.push(sprite);
    }

    fn update_stats(&mut self, stats: DayStats) {
        self.stats = stats;
        self.frames += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sprite_carries_id_label_and_status_color() {
        let mut p = Person::new(42, Vec2::new(10.0, 20.0), Vec2::ONE, 5.0, false);
        p.status = HealthStatus::Sick;
        p.contagion_moment = Some(3);

        let s = Sprite::of(&p);

        assert_eq!(s.label, "42");
        assert_eq!(s.color, HealthStatus::Sick.color());
        assert_eq!(s.label_pos(), Vec2::new(15.0, 25.0));
    }

    #[test]
    fn frame_buffer_keeps_only_latest_frame() {
        let p = Person::new(1, Vec2::new(10.0, 20.0), Vec2::ONE, 5.0, false);
        let mut fb = FrameBuffer::default();

        for day in 1..=2 {
            fb.begin_frame();
            fb.draw_person(Sprite::of(&p));
            fb.update_stats(DayStats {
                day,
                ..Default::default()
            });
        }

        assert_eq!(fb.sprites.len(), 1);
        assert_eq!(fb.stats.day, 2);
        assert_eq!(fb.frames, 2);
    }
}
