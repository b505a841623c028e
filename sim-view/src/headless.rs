//! Runs a simulation without a window, printing the counters once per day.

use std::io::Write;
use std::process::ExitCode;

use epi_core::{
    config::Config,
    render::{DayStats, RenderSink, Sprite},
    scheduler::{Scheduler, StepLimit, Unbounded},
    simulation::{RunSummary, Simulation},
};
use tracing::{error, warn};

/// Aggregate display for a terminal: one line per new day.
#[derive(Debug)]
pub struct DailyReport<W: Write> {
    out: W,
    last_day: Option<u64>,
}

impl<W: Write> DailyReport<W> {
    pub fn new(out: W) -> Self {
        Self { out, last_day: None }
    }
}

impl<W: Write> RenderSink for DailyReport<W> {
    fn draw_person(&mut self, _sprite: Sprite) {}

    fn update_stats(&mut self, stats: DayStats) {
        if self.last_day == Some(stats.day) {
            return;
        }
        self.last_day = Some(stats.day);
        if let Err(err) = writeln!(
            self.out,
            "day {:>4}  healthy {:>5}  sick {:>5}  healed {:>5}  dead {:>5}",
            stats.day, stats.healthy, stats.sick, stats.healed, stats.dead
        ) {
            warn!(%err, "could not write daily report");
        }
    }
}

fn run_with(
    cfg: Config,
    scheduler: &mut impl Scheduler,
    sink: &mut impl RenderSink,
) -> epi_core::error::Result<RunSummary> {
    let mut sim = Simulation::new(cfg, rand::rng())?;
    sim.render_idle(sink);
    sim.run(scheduler, sink)
}

/// Steps until the epidemic burns out or `max_ticks` is reached.
pub fn run(cfg: Config, max_ticks: Option<u64>) -> ExitCode {
    let mut sink = DailyReport::new(std::io::stdout());
    let result = match max_ticks {
        Some(limit) => run_with(cfg, &mut StepLimit::new(limit), &mut sink),
        None => run_with(cfg, &mut Unbounded, &mut sink),
    };

    match result {
        Ok(summary) => {
            let c = summary.counts;
            println!(
                "{} after {} ticks (day {}): healthy {}, healed {}, dead {}, still sick {}",
                if summary.burned_out { "burned out" } else { "stopped" },
                summary.tick,
                summary.day,
                c.healthy,
                c.healed,
                c.dead,
                c.sick
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(%err, "simulation failed");
            ExitCode::FAILURE
        }
    }
}
