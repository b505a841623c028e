use crate::error::{Result, SimError};
use crate::types::Tick;

/// Discrete simulation time, counted in ticks and grouped into days.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulationClock {
    tick: Tick,
    ticks_per_day: Tick,
}

impl SimulationClock {
    /// A clock at tick 0 (day 1).
    ///
    /// ### Errors
    /// [`SimError::InvalidConfig`] if `ticks_per_day` is zero.
    pub fn new(ticks_per_day: Tick) -> Result<Self> {
        if ticks_per_day == 0 {
            return Err(SimError::InvalidConfig("ticks_per_day must be positive".into()));
        }
        Ok(Self {
            tick: 0,
            ticks_per_day,
        })
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    /// `floor(tick / ticks_per_day) + 1`.
    pub fn day(&self) -> Tick {
        self.tick / self.ticks_per_day + 1
    }

    /// Moves to the next tick and returns it.
    pub fn advance(&mut self) -> Tick {
        self.tick += 1;
        self.tick
    }

    /// Whether the current tick is the first tick of a new day.
    pub fn is_new_day(&self) -> bool {
        self.tick > 0 && self.tick % self.ticks_per_day == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_is_derived_from_tick() {
        let mut clock = SimulationClock::new(200).unwrap();
        assert_eq!((clock.tick(), clock.day()), (0, 1));

        for _ in 0..199 {
            clock.advance();
        }
        assert_eq!((clock.tick(), clock.day()), (199, 1));
        assert!(!clock.is_new_day());

        assert_eq!(clock.advance(), 200);
        assert_eq!(clock.day(), 2);
        assert!(clock.is_new_day());
    }

    #[test]
    fn zero_ticks_per_day_is_rejected() {
        assert!(matches!(
            SimulationClock::new(0),
            Err(SimError::InvalidConfig(_))
        ));
    }
}
