//! The loop controller: owns the state of one run and steps it.

use rand::Rng;
use tracing::{info, trace};

use crate::{
    clock::SimulationClock,
    config::Config,
    error::{Result, SimError},
    motion::{self, Arena},
    phases::{self, ContagionParams, ProgressionParams},
    population::{HealthCounts, Outcome, Population},
    render::{DayStats, RenderSink, Sprite},
    scheduler::Scheduler,
    types::{PersonId, Tick},
};

/// Everything that changes during a run.
#[derive(Debug)]
pub struct SimulationState {
    pub clock: SimulationClock,
    pub population: Population,
}

/// What happened during one [`Simulation::step`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    pub tick: Tick,
    pub day: Tick,
    pub infected: Vec<PersonId>,
    pub healed: Vec<PersonId>,
    pub died: Vec<PersonId>,
    pub counts: HealthCounts,
}

/// Where a [`Simulation::run`] ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub steps: u64,
    pub tick: Tick,
    pub day: Tick,
    pub counts: HealthCounts,
    /// `true` if the run stopped because nobody was sick any more.
    pub burned_out: bool,
}

/// A single run of the epidemic.
///
/// The simulation starts idle. A host calls [`Simulation::start`] and then
/// either drives [`Simulation::step`] itself, checking
/// [`Simulation::should_continue`] before each step, or hands a
/// [`Scheduler`] to [`Simulation::run`].
#[derive(Debug)]
pub struct Simulation<R: Rng> {
    cfg: Config,
    arena: Arena,
    contagion: ContagionParams,
    progression: ProgressionParams,
    state: SimulationState,
    rng: R,
    running: bool,
}

impl<R: Rng> Simulation<R> {
    /// Validates `cfg` and seeds a fresh population.
    pub fn new(cfg: Config, mut rng: R) -> Result<Self> {
        let population = Population::spawn(&cfg, &mut rng)?;
        Self::with_population(cfg, population, rng)
    }

    /// Runs `cfg` over a hand-built population instead of a seeded one.
    ///
    /// `cfg.population_size` is ignored; the run has as many people as
    /// `population`.
    ///
    /// ### Errors
    /// [`SimError::InvalidConfig`] if `cfg` does not validate, and
    /// [`SimError::OutOfArena`] if a person does not fit the configured arena.
    pub fn with_population(cfg: Config, population: Population, rng: R) -> Result<Self> {
        cfg.validate()?;
        let arena = cfg.arena();
        if let Some(p) = population
            .people()
            .iter()
            .find(|p| !arena.contains(p.pos, p.radius))
        {
            return Err(SimError::OutOfArena {
                id: p.id,
                pos: p.pos,
                width: arena.width,
                height: arena.height,
            });
        }

        Ok(Self {
            arena,
            contagion: cfg.contagion_params(),
            progression: cfg.progression_params()?,
            state: SimulationState {
                clock: SimulationClock::new(cfg.ticks_per_day)?,
                population,
            },
            cfg,
            rng,
            running: false,
        })
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn population(&self) -> &Population {
        &self.state.population
    }

    pub fn counts(&self) -> HealthCounts {
        self.state.population.counts()
    }

    pub fn tick(&self) -> Tick {
        self.state.clock.tick()
    }

    pub fn day(&self) -> Tick {
        self.state.clock.day()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The external start signal.
    pub fn start(&mut self) {
        if !self.running {
            info!(
                population = self.state.population.len(),
                tick = self.tick(),
                "simulation started"
            );
        }
        self.running = true;
    }

    /// Stops scheduling further steps. A step in progress is never cut short.
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Whether the loop should schedule another step.
    pub fn should_continue(&self) -> bool {
        self.running && self.counts().sick > 0
    }

    /// Hands the current state to `sink` without advancing time.
    ///
    /// Used for the frame shown before the simulation is started.
    pub fn render_idle(&self, sink: &mut impl RenderSink) {
        sink.begin_frame();
        for person in self.state.population.people() {
            sink.draw_person(Sprite::of(person));
        }
        sink.update_stats(DayStats::new(self.day(), self.counts()));
    }

    /// Advances the simulation by one tick.
    ///
    /// The clock moves first. Then, for each person in registry order:
    /// 1. [`phases::contagion_phase`]
    /// 2. [`phases::progression_phase`]
    /// 3. [`motion::advance`]
    /// 4. the person's [`Sprite`] goes to `sink`.
    ///
    /// Finally `sink` gets the day's [`DayStats`] and the counters are checked
    /// against the population. If nobody is sick afterwards the simulation
    /// stops running.
    ///
    /// ### Errors
    /// Any error from the phases, or a counter mismatch, aborts the step and
    /// is returned as is. These indicate a bug, not a transient condition.
    pub fn step(&mut self, sink: &mut impl RenderSink) -> Result<StepReport> {
        let tick = self.state.clock.advance();
        let day = self.state.clock.day();
        if self.state.clock.is_new_day() {
            let counts = self.counts();
            info!(
                day,
                healthy = counts.healthy,
                sick = counts.sick,
                healed = counts.healed,
                dead = counts.dead,
                "new day"
            );
        }

        let mut report = StepReport {
            tick,
            day,
            ..Default::default()
        };

        sink.begin_frame();
        let population = &mut self.state.population;
        for index in 0..population.len() {
            let infected =
                phases::contagion_phase(index, population, tick, &mut self.rng, &self.contagion)?;
            report.infected.extend(infected);

            let outcome = phases::progression_phase(
                index,
                population,
                tick,
                &mut self.rng,
                &self.progression,
            )?;

            let person = population.get_mut(index)?;
            match outcome {
                Some(Outcome::Healed) => report.healed.push(person.id),
                Some(Outcome::Died) => report.died.push(person.id),
                None => {}
            }

            motion::advance(person, &self.arena)?;
            sink.draw_person(Sprite::of(person));
        }

        report.counts = population.counts();
        sink.update_stats(DayStats::new(day, report.counts));
        population.check_counts()?;

        trace!(
            tick,
            infected = report.infected.len(),
            healed = report.healed.len(),
            died = report.died.len(),
            "step"
        );

        if self.running && report.counts.sick == 0 {
            info!(
                day,
                tick,
                healed = report.counts.healed,
                dead = report.counts.dead,
                "epidemic burned out"
            );
            self.running = false;
        }

        Ok(report)
    }

    /// Steps while the simulation wants to continue and `scheduler` grants
    /// frames.
    ///
    /// Calls [`Simulation::start`] first. Each step completes before the
    /// scheduler is asked for the next frame, so stopping always happens at
    /// a step boundary.
    pub fn run(
        &mut self,
        scheduler: &mut impl Scheduler,
        sink: &mut impl RenderSink,
    ) -> Result<RunSummary> {
        self.start();

        let mut steps = 0;
        while self.should_continue() && scheduler.next_frame() {
            self.step(sink)?;
            steps += 1;
        }

        let counts = self.counts();
        Ok(RunSummary {
            steps,
            tick: self.tick(),
            day: self.day(),
            counts,
            burned_out: counts.sick == 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DueTickMode;
    use crate::person::{HealthStatus, Person};
    use crate::render::{FrameBuffer, NullSink};
    use crate::scheduler::{StepLimit, Unbounded};
    use glam::Vec2;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn small_config() -> Config {
        Config {
            arena_width: 120.0,
            arena_height: 80.0,
            population_size: 40,
            days_to_heal_or_die: 1,
            duration_variance_days: 0,
            ticks_per_day: 20,
            ..Config::default()
        }
    }

    fn sim(cfg: Config, seed: u64) -> Simulation<ChaCha8Rng> {
        Simulation::new(cfg, ChaCha8Rng::seed_from_u64(seed)).unwrap()
    }

    #[test]
    fn new_simulation_is_idle_at_day_one() {
        let s = sim(Config::default(), 0);

        assert!(!s.is_running());
        assert!(!s.should_continue());
        assert_eq!((s.tick(), s.day()), (0, 1));
        assert_eq!(s.counts().sick, 1);
    }

    #[test]
    fn render_idle_draws_without_stepping() {
        let s = sim(Config::default(), 0);
        let mut fb = FrameBuffer::default();

        s.render_idle(&mut fb);

        assert_eq!(fb.sprites.len(), 100);
        assert_eq!(fb.stats.day, 1);
        assert_eq!(fb.stats.sick, 1);
        assert_eq!(s.tick(), 0);
    }

    #[test]
    fn step_advances_clock_and_renders_everyone_in_order() {
        let mut s = sim(Config::default(), 1);
        let mut fb = FrameBuffer::default();

        let report = s.step(&mut fb).unwrap();

        assert_eq!(report.tick, 1);
        assert_eq!(report.day, 1);
        let ids: Vec<_> = fb.sprites.iter().map(|sp| sp.id).collect();
        assert_eq!(ids, (1..=100).collect::<Vec<_>>());
        assert_eq!(fb.stats.healthy + fb.stats.sick, 100);
    }

    #[test]
    fn hand_built_population_needs_a_valid_config() {
        let lone = Person::new(1, Vec2::new(50.0, 50.0), Vec2::ONE, 5.0, false);
        let cfg = Config {
            ticks_per_day: 0,
            death_rate_percent: 150,
            ..Config::default()
        };
        let population = Population::from_people(vec![lone]).unwrap();

        let err = Simulation::with_population(cfg, population, ChaCha8Rng::seed_from_u64(0))
            .unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig(_)));
    }

    #[test]
    fn hand_built_population_must_fit_the_arena() {
        let inside = Person::new(1, Vec2::new(50.0, 50.0), Vec2::ONE, 5.0, false);
        let outside = Person::new(2, Vec2::new(700.0, 50.0), Vec2::ONE, 5.0, false);
        let population = Population::from_people(vec![inside, outside]).unwrap();

        let err = Simulation::with_population(
            Config::default(),
            population,
            ChaCha8Rng::seed_from_u64(0),
        )
        .unwrap_err();
        assert!(matches!(err, SimError::OutOfArena { id: 2, .. }));
    }

    #[test]
    fn close_pair_infects_within_one_step() {
        let mut source = Person::new(1, Vec2::new(20.0, 20.0), Vec2::ZERO, 5.0, true);
        source.status = HealthStatus::Sick;
        source.contagion_moment = Some(0);
        let target = Person::new(2, Vec2::new(23.0, 20.0), Vec2::ZERO, 5.0, true);
        let population = Population::from_people(vec![source, target]).unwrap();
        let cfg = Config {
            contagion_rate_percent: 100,
            ..Config::default()
        };
        let mut s = Simulation::with_population(cfg, population, ChaCha8Rng::seed_from_u64(0)).unwrap();

        let report = s.step(&mut NullSink).unwrap();

        assert_eq!(report.infected, vec![2]);
        assert_eq!(s.population().people()[1].contagion_moment, Some(1));
        assert_eq!(s.counts().sick, 2);
    }

    #[test]
    fn burned_out_simulation_schedules_no_more_steps() {
        let mut lone = Person::new(1, Vec2::new(50.0, 50.0), Vec2::ONE, 5.0, false);
        lone.status = HealthStatus::Sick;
        lone.contagion_moment = Some(0);
        let population = Population::from_people(vec![lone]).unwrap();
        let cfg = Config {
            ticks_per_day: 1,
            days_to_heal_or_die: 3,
            duration_variance_days: 0,
            ..Config::default()
        };
        let mut s = Simulation::with_population(cfg, population, ChaCha8Rng::seed_from_u64(0)).unwrap();

        let mut granted = 0;
        let mut scheduler = || {
            granted += 1;
            true
        };
        let summary = s.run(&mut scheduler, &mut NullSink).unwrap();

        assert!(summary.burned_out);
        assert_eq!(summary.steps, 3);
        assert_eq!(summary.tick, 3);
        assert_eq!(granted, 3);
        assert!(!s.is_running());
        assert!(!s.should_continue());
    }

    #[test]
    fn run_stops_at_step_limit() {
        let mut s = sim(Config::default(), 2);

        let mut limit = StepLimit::new(10);
        let summary = s.run(&mut limit, &mut NullSink).unwrap();

        assert_eq!(summary.steps, 10);
        assert_eq!(summary.tick, 10);
        assert!(!summary.burned_out);
        assert!(s.should_continue());
    }

    #[test]
    fn pause_takes_effect_at_step_boundary() {
        let mut s = sim(Config::default(), 3);
        s.start();
        s.step(&mut NullSink).unwrap();
        s.pause();

        let summary = s.run(&mut StepLimit::new(0), &mut NullSink).unwrap();

        // run() restarts, but the scheduler grants nothing.
        assert_eq!(summary.steps, 0);
        assert_eq!(s.tick(), 1);
    }

    #[test]
    fn full_run_burns_out_with_consistent_counts() {
        let cfg = small_config();
        let mut s = sim(cfg, 4);
        let mut fb = FrameBuffer::default();

        let summary = s.run(&mut Unbounded, &mut fb).unwrap();

        assert!(summary.burned_out);
        assert_eq!(summary.counts.sick, 0);
        assert_eq!(summary.counts.total(), cfg.population_size);
        assert_eq!(fb.frames, summary.steps);
        assert_eq!(fb.stats.day, summary.day);
    }

    #[test]
    fn cached_due_ticks_also_burn_out() {
        let cfg = Config {
            due_tick_mode: DueTickMode::CacheAtInfection,
            duration_variance_days: 1,
            ..small_config()
        };
        let mut s = sim(cfg, 5);

        let summary = s.run(&mut Unbounded, &mut NullSink).unwrap();

        assert!(summary.burned_out);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn every_step_keeps_invariants(seed in any::<u64>(), rate in 0u32..=100) {
            let cfg = Config {
                contagion_distance: 12.0,
                contagion_rate_percent: rate,
                quarantined_rate_percent: 30,
                ..small_config()
            };
            let mut s = sim(cfg, seed);
            s.start();
            let arena = cfg.arena();

            let mut previous: Vec<HealthStatus> =
                s.population().people().iter().map(|p| p.status).collect();
            let mut locked: Vec<Option<Vec2>> = s
                .population()
                .people()
                .iter()
                .map(|p| p.movement_locked.then_some(p.pos))
                .collect();

            for _ in 0..300 {
                if !s.should_continue() {
                    break;
                }
                let report = s.step(&mut NullSink).unwrap();
                prop_assert_eq!(report.counts.total(), cfg.population_size);

                for (i, p) in s.population().people().iter().enumerate() {
                    let before = previous[i];
                    prop_assert!(
                        before == p.status || before.transition_to(p.status).is_some(),
                        "person {} went {:?} -> {:?}", p.id, before, p.status
                    );
                    if let Some(pos) = locked[i] {
                        prop_assert_eq!(pos, p.pos);
                    }
                    if p.movement_locked && locked[i].is_none() {
                        // Newly dead: frozen from here on.
                        locked[i] = Some(p.pos);
                    }
                    if !p.movement_locked {
                        prop_assert!(arena.contains(p.pos, p.radius));
                    }
                    previous[i] = p.status;
                }
            }
        }
    }
}
