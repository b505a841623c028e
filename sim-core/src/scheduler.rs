//! Frame sources that decide whether the loop gets another step.
//!
//! The simulation never schedules itself. A host (a window's repaint loop,
//! a headless runner, a test) supplies a [`Scheduler`] and
//! [`crate::simulation::Simulation::run`] asks it for a frame before every
//! step.

pub trait Scheduler {
    /// Grants one more frame, or `false` to stop the loop at this step
    /// boundary.
    fn next_frame(&mut self) -> bool;
}

impl<F: FnMut() -> bool> Scheduler for F {
    fn next_frame(&mut self) -> bool {
        self()
    }
}

/// Grants a fixed number of frames.
#[derive(Clone, Copy, Debug)]
pub struct StepLimit {
    remaining: u64,
}

impl StepLimit {
    pub fn new(frames: u64) -> Self {
        Self { remaining: frames }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl Scheduler for StepLimit {
    fn next_frame(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

/// Grants frames forever; the simulation's own stop condition ends the run.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unbounded;

impl Scheduler for Unbounded {
    fn next_frame(&mut self) -> bool {
        true
    }
}
