//! Interactive painting canvas with ambient wind and growth simulations,
//! built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns both simulations, the stroke
//! being drawn and the camera, and implements [`eframe::App`] to render and
//! control everything through an egui UI.

use eframe::App;
use glam::Vec2;
use rand::Rng;
use tracing::info;
use wisp_core::{
    bezier::{self, Bounds},
    config::{Config, HeadPolicy, SpawnConfig},
    geometry::{self, Side},
    simulation::Simulation,
    spawner::Emitter,
    stepper::StepStats,
    stroke::StrokeSampler,
};

use crate::canvas_config::CanvasConfig;

/// World-space distance between resampled points of a wind stroke.
const WIND_SPACING: f32 = 10.0;
/// World-space distance between resampled points of a growth stroke. A
/// commit seeds as many filaments as the resampled stroke has points, each
/// anchored on a random segment.
const GROWTH_SPACING: f32 = 25.0;
/// Half width of a drawn wisp ribbon, in screen pixels.
const WISP_HALF_WIDTH: f32 = 1.5;

/// What a primary drag on the canvas does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tool {
    Move,
    Wind,
    Growth,
}

/// Main application state for the canvas.
///
/// [`Viewer`] glues together:
/// - Two [`Simulation`]s: decaying wind wisps and spiralling growth.
/// - The active wind [`Emitter`]s and the committed strokes.
/// - Stroke capture through a [`StrokeSampler`].
/// - UI configuration (pan/zoom, tool, timing).
///
/// The typical per-frame update is:
/// 1. Handle UI interactions / input (strokes are committed on drag release).
/// 2. If `running` is `true`, feed the emitters with the frame time and, if
///    enough time has passed, call [`Viewer::step_once`].
/// 3. Render strokes, the pending stroke's curve bounds, and all live paths.
pub struct Viewer {
    wind: Simulation,
    growth: Simulation,
    emitters: Vec<Emitter>,
    strokes: Vec<Vec<Vec2>>,
    sampler: StrokeSampler,
    spawn_cfg: SpawnConfig,
    tool: Tool,

    running: bool,
    zoom: f32,
    pan: egui::Vec2,

    last_stats: [StepStats; 2],

    step_interval: f64,
    last_step_time: f64,
    last_step_dt: f64,
    last_frame_time: f64,
}

impl Viewer {
    /// Creates an empty canvas with the wind tool selected.
    pub fn new(cfg: CanvasConfig) -> Self {
        let mut rng = rand::rng();

        Self {
            wind: Simulation::new(cfg.wind, cfg.spawn, rng.random()),
            growth: Simulation::new(cfg.growth, cfg.spawn, rng.random()),
            emitters: Vec::new(),
            strokes: Vec::new(),
            sampler: StrokeSampler::default(),
            spawn_cfg: cfg.spawn,
            tool: Tool::Wind,
            running: true,
            zoom: 1.0,
            pan: egui::vec2(0.0, 0.0),
            last_stats: [StepStats::default(); 2],
            step_interval: 1.0 / 30.0,
            last_step_time: 0.0,
            last_step_dt: 0.0,
            last_frame_time: 0.0,
        }
    }

    /// Removes every stroke, emitter and live path. Tuning is kept.
    fn clear(&mut self) {
        self.wind.clear();
        self.growth.clear();
        self.emitters.clear();
        self.strokes.clear();
        self.sampler.cancel();
        self.last_stats = [StepStats::default(); 2];
    }

    /// Advances both simulations by one tick.
    fn step_once(&mut self) {
        self.last_stats = [self.wind.step(), self.growth.step()];
    }

    /// Feeds `dt` seconds to every wind emitter and drops finished ones.
    fn advance_emitters(&mut self, dt: f32) -> usize {
        let mut spawned = 0;
        for emitter in &mut self.emitters {
            spawned += self.wind.emit(emitter, dt);
        }
        self.emitters.retain(|e| !e.is_finished());
        spawned
    }

    /// Turns a finished stroke into simulation input for the current tool.
    ///
    /// - Wind: the stroke becomes an [`Emitter`] spawning wisps over time.
    /// - Growth: a batch of filaments, one per resampled stroke point, each on
    ///   a random segment of the stroke, as far as capacity allows.
    ///
    /// Strokes with fewer than two points are ignored.
    fn commit_stroke(&mut self, points: &[Vec2]) {
        let spacing = match self.tool {
            Tool::Wind => WIND_SPACING,
            Tool::Growth => GROWTH_SPACING,
            Tool::Move => return,
        };
        let path = bezier::interpolate(points, spacing);
        if path.len() < 2 {
            return;
        }

        match self.tool {
            Tool::Wind => {
                self.emitters.push(Emitter::new(path.clone(), &self.spawn_cfg));
                info!("wind stroke committed: {} points", path.len());
            }
            Tool::Growth => {
                let spawned = self.growth.spawn_batch(&path, path.len());
                info!(
                    "growth stroke committed: {} of {} filaments spawned",
                    spawned,
                    path.len()
                );
            }
            Tool::Move => {}
        }
        self.strokes.push(path);
    }

    fn set_tool(&mut self, tool: Tool) {
        if self.tool != tool {
            info!("tool switched to {tool:?}");
            self.tool = tool;
            self.sampler.cancel();
        }
    }

    /// Converts a world-space position to screen-space.
    ///
    /// World coordinates are scaled by `zoom`, offset by `pan`, and then
    /// centered inside the given `rect`. The y-axis is flipped so that
    /// positive y goes up in world space.
    fn world_to_screen(&self, p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        egui::pos2(
            center.x + p.x * self.zoom + self.pan.x,
            center.y - p.y * self.zoom + self.pan.y,
        )
    }

    /// Converts a screen-space position back to world-space.
    ///
    /// This is the inverse of [`Viewer::world_to_screen`] (up to floating
    /// point rounding), using the same `zoom`, `pan`, and `rect` center.
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        let center = rect.center();
        let x = (p.x - center.x - self.pan.x) / self.zoom;
        let y = (center.y - p.y + self.pan.y) / self.zoom;
        Vec2::new(x, y)
    }

    /// Helper to draw a labeled `usize` [`egui::DragValue`].
    fn labeled_drag_usize(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut usize,
        range: std::ops::RangeInclusive<usize>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Helper to draw a labeled `f32` [`egui::DragValue`].
    fn labeled_drag_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Editors for one simulation's tuning.
    fn config_editor(ui: &mut egui::Ui, cfg: &mut Config) {
        Self::labeled_drag_usize(ui, "capacity:", &mut cfg.capacity, 1..=65_536, 16.0);
        Self::labeled_drag_usize(ui, "path_len:", &mut cfg.path_len, 2..=32, 1.0);
        Self::labeled_drag_f32(ui, "lifetime:", &mut cfg.lifetime, 1.0..=2000.0, 1.0);
        Self::labeled_drag_f32(ui, "speed:", &mut cfg.speed, 0.1..=100.0, 0.1);
        Self::labeled_drag_f32(ui, "catch_up:", &mut cfg.catch_up, 0.01..=2.0, 0.01);
        Self::labeled_drag_f32(ui, "min_extent:", &mut cfg.min_extent, 0.0..=50.0, 0.1);

        match &mut cfg.head_policy {
            HeadPolicy::Decay { age_divisor } => {
                Self::labeled_drag_f32(ui, "age_divisor:", age_divisor, 1.0..=500.0, 0.5);
            }
            HeadPolicy::Spiral {
                turn_rate,
                turn_jitter,
            } => {
                Self::labeled_drag_f32(ui, "turn_rate:", turn_rate, -0.1..=0.1, 0.001);
                Self::labeled_drag_f32(ui, "turn_jitter:", turn_jitter, 0.0..=0.1, 0.001);
            }
        }
    }

    /// Builds the top panel UI (run controls, stepping, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                }

                ui.add(
                    egui::DragValue::new(&mut self.step_interval)
                        .prefix("dt target = ")
                        .range(0.005..=1.0)
                        .speed(0.005),
                );

                if ui.button("Step").clicked() {
                    let now = ctx.input(|i| i.time);
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = now - self.last_step_time;
                    }
                    self.step_once();
                    self.last_step_time = now;
                }

                if ui.button("Clear").clicked() {
                    self.clear();
                }

                ui.separator();
                ui.add(egui::Slider::new(&mut self.zoom, 0.1..=10.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar (timing, live paths, emitters).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("dt target = {:.3} s", self.step_interval));
                ui.label(format!("dt last = {:.3} s", self.last_step_dt));
                ui.separator();
                ui.label(format!("tick = {}", self.wind.tick()));
                ui.label(format!("emitters = {}", self.emitters.len()));
                ui.label(format!(
                    "growth = {} (-{})",
                    self.growth.live_count(),
                    self.last_stats[1].evicted
                ));
                ui.label(format!(
                    "wind = {} (-{})",
                    self.wind.live_count(),
                    self.last_stats[0].evicted
                ));
            });
        });
    }

    /// Builds the right-hand configuration panel for simulation parameters.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Config");

                let mut wind_cfg = *self.wind.config();
                let mut growth_cfg = *self.growth.config();
                let mut spawn_cfg = self.spawn_cfg;

                ui.separator();
                ui.label("Wind");
                Self::config_editor(ui, &mut wind_cfg);

                ui.separator();
                ui.label("Growth");
                Self::config_editor(ui, &mut growth_cfg);

                ui.separator();
                ui.label("Spawning");
                Self::labeled_drag_f32(ui, "offset:", &mut spawn_cfg.offset, -200.0..=200.0, 0.5);
                Self::labeled_drag_f32(ui, "spacing:", &mut spawn_cfg.spacing, 0.5..=100.0, 0.5);
                Self::labeled_drag_f32(ui, "interval:", &mut spawn_cfg.interval, 0.01..=5.0, 0.01);
                Self::labeled_drag_f32(ui, "duration:", &mut spawn_cfg.duration, 0.0..=60.0, 0.1);

                ui.separator();
                if ui.button("Reset cfg to default").clicked() {
                    let defaults = CanvasConfig::default();
                    wind_cfg = defaults.wind;
                    growth_cfg = defaults.growth;
                    spawn_cfg = defaults.spawn;
                }

                if wind_cfg != *self.wind.config() && wind_cfg.validate().is_ok() {
                    self.wind.set_config(wind_cfg);
                }
                if growth_cfg != *self.growth.config() && growth_cfg.validate().is_ok() {
                    self.growth.set_config(growth_cfg);
                }
                if spawn_cfg != self.spawn_cfg && spawn_cfg.validate().is_ok() {
                    self.spawn_cfg = spawn_cfg;
                    self.wind.set_spawn_config(spawn_cfg);
                    self.growth.set_spawn_config(spawn_cfg);
                }
            });
    }

    /// Builds the small floating toolbar for choosing the tool.
    fn ui_toolbar(&mut self, ctx: &egui::Context) {
        egui::Area::new("toolbar".into())
            .anchor(egui::Align2::LEFT_TOP, egui::vec2(10.0, 100.0))
            .movable(false)
            .show(ctx, |ui| {
                egui::Frame::new()
                    .fill(egui::Color32::from_rgba_unmultiplied(0, 0, 0, 32))
                    .show(ui, |ui| {
                        ui.vertical(|ui| {
                            for (tool, label) in [
                                (Tool::Move, "✋ Move"),
                                (Tool::Wind, "〰 Wind"),
                                (Tool::Growth, "🌱 Growth"),
                            ] {
                                if ui.selectable_label(self.tool == tool, label).clicked() {
                                    self.set_tool(tool);
                                }
                            }
                        });
                    });
            });
    }

    /// Draws the per-curve bounding boxes and the fitted spline of the
    /// stroke being drawn.
    fn ui_pending_stroke(&self, painter: &egui::Painter, rect: egui::Rect) {
        let points = self.sampler.points();
        if points.is_empty() {
            return;
        }

        let spline = bezier::fit(points);
        let box_stroke = egui::Stroke::new(1.0, egui::Color32::from_gray(90));
        for b in spline.bounds(2.0) {
            painter.add(egui::Shape::closed_line(
                self.bounds_outline(b, rect),
                box_stroke,
            ));
        }

        let line: Vec<egui::Pos2> = spline
            .resample(WIND_SPACING)
            .into_iter()
            .map(|p| self.world_to_screen(p, rect))
            .collect();
        painter.add(egui::Shape::line(
            line,
            egui::Stroke::new(2.0, egui::Color32::YELLOW),
        ));

        for &p in points {
            painter.circle_filled(self.world_to_screen(p, rect), 3.0, egui::Color32::YELLOW);
        }
    }

    fn bounds_outline(&self, b: Bounds, rect: egui::Rect) -> Vec<egui::Pos2> {
        [
            b.min,
            Vec2::new(b.max.x, b.min.y),
            b.max,
            Vec2::new(b.min.x, b.max.y),
        ]
        .iter()
        .map(|&p| self.world_to_screen(p, rect))
        .collect()
    }

    /// Builds one mesh holding a ribbon for every live path of `sim`.
    fn paths_mesh(&self, sim: &Simulation, color: egui::Color32, rect: egui::Rect) -> egui::Mesh {
        let template: Vec<(usize, Side)> = geometry::wisp_template(sim.config().path_len);
        let half_width = WISP_HALF_WIDTH / self.zoom;
        let mut mesh = egui::Mesh::default();

        for (_, nodes) in sim.live_slots() {
            for tri in geometry::expand_wisp(nodes, &template, half_width) {
                let base = mesh.vertices.len() as u32;
                for p in tri {
                    mesh.colored_vertex(self.world_to_screen(p, rect), color);
                }
                mesh.add_triangle(base, base + 1, base + 2);
            }
        }
        mesh
    }

    /// Builds the central panel where strokes and paths are drawn and
    /// interacted with.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Pan with the middle button, or the primary button in move mode.
            if response.dragged_by(egui::PointerButton::Middle)
                || (self.tool == Tool::Move && response.dragged_by(egui::PointerButton::Primary))
            {
                self.pan += response.drag_delta();
            }

            // Stroke capture.
            if self.tool != Tool::Move {
                let pointer_world = response
                    .interact_pointer_pos()
                    .map(|p| self.screen_to_world(p, rect));

                if response.drag_started_by(egui::PointerButton::Primary) {
                    self.sampler = StrokeSampler::new(
                        StrokeSampler::MIN_DISTANCE / self.zoom,
                        StrokeSampler::MAX_POINTS,
                    );
                }
                if response.dragged_by(egui::PointerButton::Primary)
                    && let Some(p) = pointer_world
                {
                    self.sampler.push(p);
                }
                if response.drag_stopped_by(egui::PointerButton::Primary) {
                    if let Some(p) = pointer_world {
                        self.sampler.push(p);
                    }
                    let points = self.sampler.finish();
                    self.commit_stroke(&points);
                }
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

            // Committed strokes.
            for stroke in &self.strokes {
                let line: Vec<egui::Pos2> = stroke
                    .iter()
                    .map(|&p| self.world_to_screen(p, rect))
                    .collect();
                painter.add(egui::Shape::line(
                    line,
                    egui::Stroke::new(3.0, egui::Color32::from_gray(70)),
                ));
            }

            // Live paths.
            painter.add(egui::Shape::mesh(self.paths_mesh(
                &self.growth,
                egui::Color32::from_rgb(120, 200, 110),
                rect,
            )));
            painter.add(egui::Shape::mesh(self.paths_mesh(
                &self.wind,
                egui::Color32::from_rgba_unmultiplied(210, 225, 255, 200),
                rect,
            )));

            self.ui_pending_stroke(&painter, rect);

            // Auto-run simulation if requested.
            let now = ctx.input(|i| i.time);
            let frame_dt = now - self.last_frame_time;
            self.last_frame_time = now;

            if self.running {
                self.advance_emitters(frame_dt as f32);

                let elapsed = now - self.last_step_time;
                if elapsed >= self.step_interval {
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = elapsed;
                    }
                    self.step_once();
                    self.last_step_time = now;
                }

                ctx.request_repaint();
            }
        });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    ///
    /// This method:
    /// - Renders the top control bar and status bar.
    /// - Renders the config side panel and toolbar.
    /// - Draws the central canvas and handles interactions.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
        self.ui_toolbar(ctx);
    }
}
