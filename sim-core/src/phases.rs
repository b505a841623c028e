//! Per-person phases run by the simulation loop.
//!
//! For each person, in registry order, one tick runs:
//! 1. [`contagion_phase`]: a sick person may infect healthy people within
//!    the contagion distance.
//! 2. [`progression_phase`]: a sick person whose due tick has arrived
//!    either heals or dies.
//! 3. [`crate::motion::advance`]: the person moves one step.
//!
//! Both phases only read the status of the people they touch at the moment
//! they touch them, so the outcome of a tick depends on registry order. A
//! person infected by an earlier source in the same tick is no longer
//! healthy when a later source is evaluated.

use rand::Rng;
use tracing::debug;

use crate::{
    config::DueTickMode,
    error::{Result, SimError},
    motion::distance,
    person::HealthStatus,
    population::{Outcome, Population},
    types::{PersonId, Tick},
};

/// Parameters for [`contagion_phase`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContagionParams {
    /// Maximum center-to-center distance at which infection can happen.
    pub distance: f32,
    /// A contact infects when a uniform draw in `0..=100` is at most this.
    pub probability_percent: u32,
}

/// Parameters for [`progression_phase`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressionParams {
    pub mean_duration_ticks: Tick,
    pub duration_variance_ticks: Tick,
    /// A resolving illness is fatal when a uniform draw in `0..=100` is at
    /// most this.
    pub death_probability_percent: u32,
    pub due_tick_mode: DueTickMode,
}

/// Lets the person at `source` try to infect everybody else.
///
/// Nothing happens unless the source is sick. Otherwise, for every other
/// person in registry order that is still healthy:
///
/// 1. Compute the distance with [`distance`].
/// 2. If it is within `params.distance`, draw a uniform integer in
///    `0..=100`.
/// 3. If the draw is at most `params.probability_percent`, the target
///    becomes sick with `contagion_moment = tick` via
///    [`Population::infect`].
///
/// There is no early exit: a single source can infect several people in one
/// call. Beyond `params.distance` no random draw is made at all.
///
/// ### Parameters
/// - `source` - Index of the potential spreader in the population.
/// - `population` - The registry; infected targets and counters are updated.
/// - `tick` - Current tick, recorded as the targets' contagion moment.
/// - `rng` - Random source for the infection draws.
/// - `params` - Contagion distance and probability.
///
/// ### Returns
/// The ids of the people infected by this call, in registry order.
///
/// ### Errors
/// [`SimError::UnknownPerson`] for a bad `source` index, and
/// [`SimError::MalformedPerson`] if the source fails validation.
pub fn contagion_phase(
    source: usize,
    population: &mut Population,
    tick: Tick,
    rng: &mut impl Rng,
    params: &ContagionParams,
) -> Result<Vec<PersonId>> {
    let src = population.get(source)?.clone();
    src.validate()?;

    let mut infected = Vec::new();
    if !src.is_sick() {
        return Ok(infected);
    }

    for target in 0..population.len() {
        if target == source {
            continue;
        }

        let candidate = population.get(target)?;
        if candidate.status != HealthStatus::Healthy {
            continue;
        }

        let d = distance(&src, candidate);
        if d > params.distance {
            continue;
        }

        let target_id = candidate.id;
        debug!(source = src.id, target = target_id, distance = d, "contact");

        if rng.random_range(0..=100) <= params.probability_percent {
            population.infect(target, tick)?;
            debug!(source = src.id, target = target_id, tick, "infected");
            infected.push(target_id);
        } else {
            debug!(source = src.id, target = target_id, "contact did not infect");
        }
    }

    Ok(infected)
}

/// Resolves the illness of the person at `index` once it has run its course.
///
/// Nothing happens unless the person is sick. Otherwise:
///
/// 1. Draw a variation uniformly in
///    `-duration_variance_ticks..=duration_variance_ticks`.
/// 2. The due tick is `contagion_moment + mean_duration_ticks + variation`.
///    With [`DueTickMode::Redraw`] this is drawn again on every call; with
///    [`DueTickMode::CacheAtInfection`] the first draw is stored on the
///    person and reused.
/// 3. If `tick` has reached the due tick, a uniform draw in `0..=100` at
///    most `death_probability_percent` kills the person (who is then locked
///    in place); any other draw heals them.
///
/// ### Returns
/// The outcome if the illness was resolved by this call, `None` otherwise.
///
/// ### Errors
/// [`SimError::UnknownPerson`] for a bad index and
/// [`SimError::MalformedPerson`] if the person fails validation (for
/// example a sick person without a contagion moment).
pub fn progression_phase(
    index: usize,
    population: &mut Population,
    tick: Tick,
    rng: &mut impl Rng,
    params: &ProgressionParams,
) -> Result<Option<Outcome>> {
    let person = population.get_mut(index)?;
    person.validate()?;
    if !person.is_sick() {
        return Ok(None);
    }

    let contagion_moment = person.contagion_moment.ok_or(SimError::MalformedPerson {
        id: person.id,
        reason: "missing contagion moment",
    })?;

    let due_tick = match (params.due_tick_mode, person.due_tick) {
        (DueTickMode::CacheAtInfection, Some(cached)) => cached,
        (mode, _) => {
            let due = draw_due_tick(contagion_moment, params, rng);
            if mode == DueTickMode::CacheAtInfection {
                person.due_tick = Some(due);
            }
            due
        }
    };

    if i64::try_from(tick).unwrap_or(i64::MAX) < due_tick {
        return Ok(None);
    }

    let outcome = if rng.random_range(0..=100) <= params.death_probability_percent {
        Outcome::Died
    } else {
        Outcome::Healed
    };
    population.resolve(index, outcome)?;
    Ok(Some(outcome))
}

/// Durations come from a validated [`crate::config::Config`], so both fit in
/// an `i64`. The sum saturates rather than wrapping on absurdly long runs.
fn draw_due_tick(contagion_moment: Tick, params: &ProgressionParams, rng: &mut impl Rng) -> i64 {
    let spread = i64::try_from(params.duration_variance_ticks).unwrap_or(i64::MAX);
    let mean = i64::try_from(params.mean_duration_ticks).unwrap_or(i64::MAX);
    let moment = i64::try_from(contagion_moment).unwrap_or(i64::MAX);
    let variation = rng.random_range(-spread..=spread);
    moment.saturating_add(mean).saturating_add(variation)
}
