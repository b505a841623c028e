//! Interactive epidemic viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns one [`Simulation`] run plus
//! the UI state around it, and implements [`eframe::App`] to draw the arena
//! and drive the simulation loop from egui's repaint cycle.

use eframe::App;
use epi_core::{
    config::{Config, DueTickMode},
    error::SimError,
    person::HealthStatus,
    render::FrameBuffer,
    simulation::Simulation,
};
use glam::Vec2;
use rand::rngs::ThreadRng;
use tracing::{error, info};

/// Main application state for the interactive viewer.
///
/// [`Viewer`] glues together:
/// - The simulation core: a [`Simulation`] and the [`Config`] it was built from.
/// - The last rendered frame, kept in a [`FrameBuffer`] sink.
/// - UI state (population input, pan/zoom, timing).
///
/// The typical per-frame update is:
/// 1. Handle UI interactions (Start, Pause, Step, Reset, config edits).
/// 2. If the simulation wants to continue and enough time has passed, call
///    [`Viewer::step_once`].
/// 3. Paint the people from the frame buffer and the counters in the status bar.
///
/// ### Fields
/// - `sim` - The current run.
/// - `cfg` - Parameters used for the next reset; edits apply on reset/start.
/// - `frame` - Sprites and stats from the last step (or the idle frame).
///
/// - `population_input` - Population size requested for the next start.
/// - `zoom` - Pixels per arena unit.
/// - `pan` - Screen-space offset of the arena origin from the panel corner.
///
/// - `step_interval` - Target time between automatic steps (seconds).
/// - `last_step_time` - Time stamp of the last step (egui time).
/// - `last_error` - The last error reported by the core, shown in the status bar.
pub struct Viewer {
    sim: Simulation<ThreadRng>,
    cfg: Config,
    frame: FrameBuffer,

    population_input: usize,
    zoom: f32,
    pan: egui::Vec2,

    step_interval: f64,
    last_step_time: f64,
    last_error: Option<String>,
}

impl Viewer {
    /// Creates a viewer with a freshly seeded, not yet started run.
    ///
    /// The idle frame is rendered immediately so the population is visible
    /// before Start is pressed.
    ///
    /// ### Errors
    /// Returns [`SimError::InvalidConfig`] if `cfg` does not validate.
    pub fn new(cfg: Config) -> Result<Self, SimError> {
        let sim = Simulation::new(cfg, rand::rng())?;
        let mut frame = FrameBuffer::default();
        sim.render_idle(&mut frame);

        Ok(Self {
            sim,
            cfg,
            frame,
            population_input: cfg.population_size,
            zoom: 1.0,
            pan: egui::vec2(10.0, 10.0),
            step_interval: 0.0,
            last_step_time: 0.0,
            last_error: None,
        })
    }

    /// Replaces the run with a new one using `cfg` and the population input.
    ///
    /// The new run is idle. On an invalid config the old run is kept and the
    /// error is shown instead.
    fn reset(&mut self) {
        let mut cfg = self.cfg;
        cfg.population_size = self.population_input;

        match Simulation::new(cfg, rand::rng()) {
            Ok(sim) => {
                self.sim = sim;
                self.cfg = cfg;
                self.frame = FrameBuffer::default();
                self.sim.render_idle(&mut self.frame);
                self.last_error = None;
            }
            Err(err) => {
                error!(%err, "could not reset simulation");
                self.last_error = Some(err.to_string());
            }
        }
    }

    /// The start control: begins or resumes stepping.
    ///
    /// A run that has burned out, or whose population differs from the
    /// input, is replaced first.
    fn start(&mut self) {
        let burned_out = self.sim.counts().sick == 0;
        if burned_out || self.sim.population().len() != self.population_input {
            self.reset();
        }
        info!(population = self.sim.population().len(), "start requested");
        self.sim.start();
    }

    /// Advances the simulation by a single step, rendering into `frame`.
    ///
    /// A core error stops the run; it is never retried.
    fn step_once(&mut self) {
        if let Err(err) = self.sim.step(&mut self.frame) {
            error!(%err, tick = self.sim.tick(), "simulation step failed");
            self.last_error = Some(err.to_string());
            self.sim.pause();
        }
    }

    /// Converts an arena position to screen-space.
    ///
    /// Arena coordinates grow right and down, like the screen, so this is a
    /// scale by `zoom` followed by an offset of `pan` from the panel corner.
    fn world_to_screen(&self, p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        egui::pos2(
            rect.min.x + self.pan.x + p.x * self.zoom,
            rect.min.y + self.pan.y + p.y * self.zoom,
        )
    }

    /// Inverse of [`Viewer::world_to_screen`].
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        Vec2::new(
            (p.x - rect.min.x - self.pan.x) / self.zoom,
            (p.y - rect.min.y - self.pan.y) / self.zoom,
        )
    }

    /// Zoom that fits the whole arena into `rect`, leaving the pan margin.
    fn fit_zoom(&self, rect: egui::Rect) -> f32 {
        let arena = self.sim.config().arena();
        let w = (rect.width() - 2.0 * self.pan.x) / arena.width;
        let h = (rect.height() - 2.0 * self.pan.y) / arena.height;
        w.min(h).clamp(0.1, 10.0)
    }

    /// Helper to draw a labeled numeric [`egui::DragValue`].
    fn labeled_drag<Num: egui::emath::Numeric>(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut Num,
        range: std::ops::RangeInclusive<Num>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel UI (population input, run controls, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Population:");
                ui.add(
                    egui::DragValue::new(&mut self.population_input)
                        .range(1..=5000)
                        .speed(1.0),
                );

                if self.sim.is_running() {
                    if ui.button("⏸ Pause").clicked() {
                        self.sim.pause();
                    }
                } else if ui.button("▶ Start").clicked() {
                    self.start();
                }

                if ui.button("Step").clicked() {
                    self.step_once();
                }

                if ui.button("Reset").clicked() {
                    self.reset();
                }

                ui.separator();
                ui.add(
                    egui::DragValue::new(&mut self.step_interval)
                        .prefix("dt target = ")
                        .range(0.0..=1.0)
                        .speed(0.01),
                );
                ui.add(egui::Slider::new(&mut self.zoom, 0.1..=10.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar (day and the four counters).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        let stats = self.frame.stats;
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("day {}", stats.day));
                ui.separator();
                for (status, count) in [
                    (HealthStatus::Healthy, stats.healthy),
                    (HealthStatus::Sick, stats.sick),
                    (HealthStatus::Healed, stats.healed),
                    (HealthStatus::Dead, stats.dead),
                ] {
                    let text = format!("{status:?} = {count}").to_lowercase();
                    ui.colored_label(status_color(status.color()), text);
                }

                if let Some(err) = &self.last_error {
                    ui.separator();
                    ui.colored_label(egui::Color32::RED, err.as_str());
                }
            });
        });
    }

    /// Builds the right-hand configuration panel. Edits apply on Reset/Start.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("Config");

                ui.separator();
                ui.label("Arena");
                Self::labeled_drag(ui, "width:", &mut self.cfg.arena_width, 20.0..=4000.0, 1.0);
                Self::labeled_drag(ui, "height:", &mut self.cfg.arena_height, 20.0..=4000.0, 1.0);
                Self::labeled_drag(ui, "radius:", &mut self.cfg.radius, 1.0..=20.0, 0.1);
                Self::labeled_drag(ui, "max_speed:", &mut self.cfg.max_speed, 1..=10, 0.1);

                ui.separator();
                ui.label("Contagion");
                Self::labeled_drag(
                    ui,
                    "distance:",
                    &mut self.cfg.contagion_distance,
                    0.0..=100.0,
                    0.1,
                );
                Self::labeled_drag(ui, "rate %:", &mut self.cfg.contagion_rate_percent, 0..=100, 1.0);
                Self::labeled_drag(
                    ui,
                    "quarantined %:",
                    &mut self.cfg.quarantined_rate_percent,
                    0..=100,
                    1.0,
                );

                ui.separator();
                ui.label("Progression");
                Self::labeled_drag(ui, "ticks/day:", &mut self.cfg.ticks_per_day, 1..=2000, 1.0);
                Self::labeled_drag(
                    ui,
                    "days to heal/die:",
                    &mut self.cfg.days_to_heal_or_die,
                    0..=365,
                    0.1,
                );
                Self::labeled_drag(
                    ui,
                    "variance days:",
                    &mut self.cfg.duration_variance_days,
                    0..=365,
                    0.1,
                );
                Self::labeled_drag(ui, "death %:", &mut self.cfg.death_rate_percent, 0..=100, 1.0);

                let mut cached = self.cfg.due_tick_mode == DueTickMode::CacheAtInfection;
                if ui.checkbox(&mut cached, "cache due tick").changed() {
                    self.cfg.due_tick_mode = if cached {
                        DueTickMode::CacheAtInfection
                    } else {
                        DueTickMode::Redraw
                    };
                }

                ui.separator();
                if ui.button("Reset cfg to default").clicked() {
                    self.cfg = Config::default();
                }
            });
    }

    /// Builds the central panel where the arena and people are drawn.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Pan with drag, double-click to fit.
            if response.dragged() {
                self.pan += response.drag_delta();
            }
            if response.double_clicked() {
                self.pan = egui::vec2(10.0, 10.0);
                self.zoom = self.fit_zoom(rect);
            }

            // The running arena; side-panel edits only apply on reset.
            let extent = self.sim.config().arena();
            let arena = egui::Rect::from_min_max(
                self.world_to_screen(Vec2::ZERO, rect),
                self.world_to_screen(Vec2::new(extent.width, extent.height), rect),
            );
            painter.rect_filled(arena, egui::CornerRadius::ZERO, egui::Color32::from_gray(245));
            painter.rect_stroke(
                arena,
                egui::CornerRadius::ZERO,
                egui::Stroke::new(1.0, egui::Color32::GRAY),
                egui::StrokeKind::Inside,
            );

            let font = egui::FontId::proportional((8.0 * self.zoom).max(6.0));
            for sprite in &self.frame.sprites {
                let p = self.world_to_screen(sprite.pos, rect);
                let r = (sprite.radius * self.zoom).max(1.0);
                painter.circle_filled(p, r, status_color(sprite.color));
                painter.text(
                    self.world_to_screen(sprite.label_pos(), rect),
                    egui::Align2::LEFT_TOP,
                    &sprite.label,
                    font.clone(),
                    egui::Color32::DARK_GRAY,
                );
            }

            // Zoom around the mouse cursor.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer_screen = response.hover_pos().unwrap_or(rect.center());
                let world_before = self.screen_to_world(pointer_screen, rect);

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(0.1, 10.0);

                let screen_after = self.world_to_screen(world_before, rect);
                self.pan += pointer_screen - screen_after;
            }

            // Auto-run: one step per elapsed interval, only while the run
            // wants to continue.
            if self.sim.should_continue() {
                let now = ctx.input(|i| i.time);
                if now - self.last_step_time >= self.step_interval {
                    self.step_once();
                    self.last_step_time = now;
                }
                ctx.request_repaint();
            }
        });
    }
}

fn status_color([r, g, b]: [u8; 3]) -> egui::Color32 {
    egui::Color32::from_rgb(r, g, b)
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}
