//! The population registry: every person in the run plus running counters.
//!
//! People are created once, in id order, and never removed. All status
//! changes go through [`Population::infect`] and [`Population::resolve`],
//! which update the person and then apply exactly one [`Transition`] to the
//! [`HealthCounts`].

use glam::Vec2;
use rand::Rng;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Result, SimError};
use crate::motion::random_speed;
use crate::person::{HealthStatus, Person};
use crate::types::{PersonId, Tick};

/// A counter adjustment triggered by one status change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// A healthy person joined the population (seeding only).
    ToHealthy,
    ToSick,
    ToHealed,
    ToDead,
}

/// How a sick person's illness ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Healed,
    Died,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HealthCounts {
    pub healthy: usize,
    pub sick: usize,
    pub healed: usize,
    pub dead: usize,
}

impl HealthCounts {
    pub fn total(&self) -> usize {
        self.healthy + self.sick + self.healed + self.dead
    }

    /// Tallies the statuses of `people` from scratch.
    pub fn tally<'a>(people: impl IntoIterator<Item = &'a Person>) -> Self {
        let mut counts = Self::default();
        for p in people {
            match p.status {
                HealthStatus::Healthy => counts.healthy += 1,
                HealthStatus::Sick => counts.sick += 1,
                HealthStatus::Healed => counts.healed += 1,
                HealthStatus::Dead => counts.dead += 1,
            }
        }
        counts
    }

    /// Applies `transition`, leaving the counters untouched if it would
    /// underflow.
    pub fn apply(&mut self, transition: Transition) -> Result<()> {
        let underflow = || SimError::CounterUnderflow {
            transition,
            counts: *self,
        };

        let next = match transition {
            Transition::ToHealthy => Self {
                healthy: self.healthy + 1,
                ..*self
            },
            Transition::ToSick => Self {
                healthy: self.healthy.checked_sub(1).ok_or_else(underflow)?,
                sick: self.sick + 1,
                ..*self
            },
            Transition::ToHealed => Self {
                sick: self.sick.checked_sub(1).ok_or_else(underflow)?,
                healed: self.healed + 1,
                ..*self
            },
            Transition::ToDead => Self {
                sick: self.sick.checked_sub(1).ok_or_else(underflow)?,
                dead: self.dead + 1,
                ..*self
            },
        };
        *self = next;
        Ok(())
    }
}

#[derive(Debug)]
pub struct Population {
    people: Vec<Person>,
    counts: HealthCounts,
}

impl Population {
    /// Seeds a population as described by `cfg`.
    ///
    /// Each person gets a uniformly random position inside the arena, a
    /// random nonzero velocity, and is quarantined with probability
    /// `quarantined_rate_percent`. The first person is then made patient
    /// zero: sick since tick 1 and free to move.
    pub fn spawn(cfg: &Config, rng: &mut impl Rng) -> Result<Self> {
        cfg.validate()?;

        let mut pop = Self {
            people: Vec::with_capacity(cfg.population_size),
            counts: HealthCounts::default(),
        };

        for i in 0..cfg.population_size {
            let x = rng.random_range(cfg.radius..=cfg.arena_width - cfg.radius);
            let y = rng.random_range(cfg.radius..=cfg.arena_height - cfg.radius);
            let vel = Vec2::new(
                random_speed(cfg.max_speed, rng),
                random_speed(cfg.max_speed, rng),
            );
            let quarantined = rng.random_range(0..=100) <= cfg.quarantined_rate_percent;

            let id = PersonId::try_from(i + 1)
                .map_err(|_| SimError::InvalidConfig("population_size too large".into()))?;
            pop.people
                .push(Person::new(id, Vec2::new(x, y), vel, cfg.radius, quarantined));
            pop.counts.apply(Transition::ToHealthy)?;
        }

        pop.people[0].movement_locked = false;
        pop.infect(0, 1)?;

        info!(
            population = pop.len(),
            quarantined = pop.people.iter().filter(|p| p.movement_locked).count(),
            "population seeded"
        );
        Ok(pop)
    }

    /// Builds a population from existing people, deriving the counters from
    /// their statuses.
    ///
    /// Registry order is id order: `people[i].id` must be `i + 1`, and every
    /// person must pass [`Person::validate`].
    pub fn from_people(people: Vec<Person>) -> Result<Self> {
        let len = people.len();
        for (i, p) in people.iter().enumerate() {
            p.validate()?;
            if p.id as usize != i + 1 {
                return Err(SimError::InvalidIds { len, id: p.id });
            }
        }

        let counts = HealthCounts::tally(&people);
        Ok(Self { people, counts })
    }

    pub fn people(&self) -> &[Person] {
        &self.people
    }

    pub fn get(&self, index: usize) -> Result<&Person> {
        self.people.get(index).ok_or(SimError::UnknownPerson(index))
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Result<&mut Person> {
        self.people
            .get_mut(index)
            .ok_or(SimError::UnknownPerson(index))
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    pub fn counts(&self) -> HealthCounts {
        self.counts
    }

    /// Applies one counter adjustment.
    ///
    /// Callers outside the registry should prefer [`Population::infect`] and
    /// [`Population::resolve`], which keep people and counters in step.
    pub fn record_transition(&mut self, transition: Transition) -> Result<()> {
        self.counts.apply(transition)
    }

    /// Makes the person at `index` sick as of `tick`.
    pub fn infect(&mut self, index: usize, tick: Tick) -> Result<PersonId> {
        let transition = self.change_status(index, HealthStatus::Sick)?;
        let person = self.get_mut(index)?;
        person.contagion_moment = Some(tick);
        person.due_tick = None;
        let id = person.id;
        self.record_transition(transition)?;
        Ok(id)
    }

    /// Ends the illness of the sick person at `index`.
    ///
    /// The dead are locked in place for the rest of the run.
    pub fn resolve(&mut self, index: usize, outcome: Outcome) -> Result<PersonId> {
        let to = match outcome {
            Outcome::Healed => HealthStatus::Healed,
            Outcome::Died => HealthStatus::Dead,
        };
        let transition = self.change_status(index, to)?;
        let person = self.get_mut(index)?;
        if outcome == Outcome::Died {
            person.movement_locked = true;
        }
        let id = person.id;
        self.record_transition(transition)?;
        debug!(person = id, ?outcome, "illness resolved");
        Ok(id)
    }

    /// Sets the status after checking it is a legal forward step.
    ///
    /// The counter check happens first so a rejected transition leaves the
    /// person untouched too.
    fn change_status(&mut self, index: usize, to: HealthStatus) -> Result<Transition> {
        let mut probe = self.counts;
        let person = self.get_mut(index)?;
        let transition = person
            .status
            .transition_to(to)
            .ok_or(SimError::IllegalTransition {
                id: person.id,
                from: person.status,
                to,
            })?;
        probe.apply(transition)?;
        person.status = to;
        Ok(transition)
    }

    /// Verifies that the counters add up and match the people's statuses.
    pub fn check_counts(&self) -> Result<()> {
        let expected = HealthCounts::tally(&self.people);
        if self.counts != expected || self.counts.total() != self.people.len() {
            return Err(SimError::CounterMismatch {
                counts: self.counts,
                expected,
            });
        }
        Ok(())
    }
}
