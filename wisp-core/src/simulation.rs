//! Owner of one double-buffered slot simulation.
//!
//! A host drives it once per frame in two serialized phases:
//! 1. spawn: [`Simulation::spawn`], [`Simulation::spawn_batch`] or
//!    [`Simulation::emit`] write new paths into the current buffer;
//! 2. step: [`Simulation::step`] computes the next generation and swaps.
//!
//! Renderers read [`Simulation::current`] or [`Simulation::live_slots`]
//! between frames.

use glam::Vec2;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    config::{Config, SpawnConfig},
    double_buffer::DoubleBuffer,
    slot_buffer::SlotBuffer,
    spawner::{self, Emitter},
    stepper::{self, StepStats},
    types::{Node, SlotId},
};

#[derive(Debug)]
pub struct Simulation {
    buffers: DoubleBuffer,
    cfg: Config,
    spawn_cfg: SpawnConfig,
    rng: StdRng,
    /// Per-slot random draws for the current tick.
    jitter: Vec<f32>,
    tick: u64,
}

impl Simulation {
    /// Creates an empty simulation.
    ///
    /// `cfg` is expected to have passed [`Config::validate`]; `seed` makes
    /// every random decision reproducible.
    pub fn new(cfg: Config, spawn_cfg: SpawnConfig, seed: u64) -> Self {
        Self {
            buffers: DoubleBuffer::new(cfg.capacity, cfg.path_len),
            cfg,
            spawn_cfg,
            rng: StdRng::seed_from_u64(seed),
            jitter: Vec::new(),
            tick: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Replaces the tuning. A different capacity or path length reallocates
    /// (and so empties) both buffers; anything else applies from the next
    /// tick on with live paths kept.
    pub fn set_config(&mut self, cfg: Config) {
        if cfg.capacity != self.cfg.capacity || cfg.path_len != self.cfg.path_len {
            log::debug!(
                "slot layout changed to {} x {}, dropping live paths",
                cfg.capacity,
                cfg.path_len
            );
            self.buffers = DoubleBuffer::new(cfg.capacity, cfg.path_len);
        }
        self.cfg = cfg;
    }

    pub fn spawn_config(&self) -> &SpawnConfig {
        &self.spawn_cfg
    }

    pub fn set_spawn_config(&mut self, spawn_cfg: SpawnConfig) {
        self.spawn_cfg = spawn_cfg;
    }

    /// Number of completed ticks.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// The buffer renderers and spawners see.
    pub fn current(&self) -> &SlotBuffer {
        self.buffers.current()
    }

    pub fn live_slots(&self) -> impl Iterator<Item = (SlotId, &[Node])> + '_ {
        self.current().live_slots()
    }

    pub fn live_count(&self) -> usize {
        self.current().live_count()
    }

    /// Seeds one path on the given side of `source`. See [`spawner::spawn`].
    pub fn spawn(&mut self, source: &[Vec2], above: bool) -> bool {
        spawner::spawn(
            self.buffers.current_mut(),
            source,
            above,
            &mut self.rng,
            &self.spawn_cfg,
        )
    }

    /// Seeds one path on a random side of `source`.
    pub fn spawn_random(&mut self, source: &[Vec2]) -> bool {
        let above = self.rng.random_bool(0.5);
        self.spawn(source, above)
    }

    pub fn spawn_batch(&mut self, source: &[Vec2], count: usize) -> usize {
        spawner::spawn_batch(
            self.buffers.current_mut(),
            source,
            count,
            &mut self.rng,
            &self.spawn_cfg,
        )
    }

    /// Advances `emitter` by `dt` seconds, spawning into this simulation.
    pub fn emit(&mut self, emitter: &mut Emitter, dt: f32) -> usize {
        emitter.update(
            dt,
            self.buffers.current_mut(),
            &mut self.rng,
            &self.spawn_cfg,
        )
    }

    /// Runs one tick over the whole buffer and swaps.
    pub fn step(&mut self) -> StepStats {
        self.jitter.clear();
        if self.cfg.head_policy.uses_jitter() {
            let rng = &mut self.rng;
            self.jitter
                .extend((0..self.cfg.capacity).map(|_| rng.random_range(-1.0..=1.0)));
        }

        let stats = stepper::tick(&mut self.buffers, &self.cfg, &self.jitter);
        self.tick += 1;
        stats
    }

    /// Empties both buffers. The tick counter keeps running.
    pub fn clear(&mut self) {
        self.buffers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wavy_stroke(rng: &mut impl Rng) -> Vec<Vec2> {
        let base = Vec2::new(rng.random_range(200.0..800.0), rng.random_range(200.0..800.0));
        (0..6)
            .map(|i| base + Vec2::new(i as f32 * 40.0, (i as f32).sin() * 30.0))
            .collect()
    }

    fn small(cfg: Config) -> Config {
        Config {
            capacity: 64,
            ..cfg
        }
    }

    fn assert_atomic(buf: &SlotBuffer) {
        for id in 0..buf.capacity() {
            let nodes = buf.nodes(id);
            if buf.is_empty(id) {
                assert!(nodes.iter().all(Node::is_sentinel), "slot {id} half empty");
            } else {
                assert!(!nodes.iter().any(Node::is_sentinel), "slot {id} half live");
            }
        }
    }

    #[test]
    fn slots_stay_atomic_over_many_ticks() {
        for cfg in [Config::wind(), Config::growth()] {
            let mut sim = Simulation::new(small(cfg), SpawnConfig::default(), 42);
            let mut rng = StdRng::seed_from_u64(43);

            for frame in 0..300 {
                if frame % 3 == 0 {
                    let stroke = wavy_stroke(&mut rng);
                    sim.spawn_batch(&stroke, 4);
                }
                sim.step();
                assert_atomic(sim.current());
            }
            assert_eq!(sim.tick(), 300);
        }
    }

    #[test]
    fn same_seed_same_history() {
        let run = || {
            let mut sim = Simulation::new(small(Config::growth()), SpawnConfig::default(), 7);
            let stroke: Vec<Vec2> = (0..5).map(|i| Vec2::new(i as f32 * 30.0, 100.0)).collect();
            for _ in 0..20 {
                sim.spawn_random(&stroke);
                sim.step();
            }
            sim.current().clone()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn wind_paths_expire_after_lifetime() {
        let cfg = small(Config::wind());
        let mut sim = Simulation::new(cfg, SpawnConfig::default(), 1);
        let stroke = [Vec2::new(0.0, 0.0), Vec2::new(300.0, 0.0)];

        assert!(sim.spawn(&stroke, true));
        assert_eq!(sim.live_count(), 1);

        let ticks = cfg.lifetime as usize + 2;
        for _ in 0..ticks {
            sim.step();
        }
        assert_eq!(sim.live_count(), 0);
    }

    #[test]
    fn spawn_then_step_moves_the_head() {
        let mut sim = Simulation::new(small(Config::wind()), SpawnConfig::default(), 1);
        let stroke = [Vec2::new(0.0, 0.0), Vec2::new(300.0, 0.0)];
        assert!(sim.spawn(&stroke, false));

        let before = sim.live_slots().next().unwrap().1[7];
        let stats = sim.step();
        let after = sim.live_slots().next().unwrap().1[7];

        assert_eq!(stats.live, 1);
        assert!((after.pos - before.pos).length() > 0.0);
    }

    #[test]
    fn set_config_reallocates_only_on_layout_change() {
        let mut sim = Simulation::new(small(Config::wind()), SpawnConfig::default(), 1);
        let stroke = [Vec2::new(0.0, 0.0), Vec2::new(300.0, 0.0)];
        sim.spawn(&stroke, true);

        sim.set_config(Config {
            speed: 5.0,
            ..*sim.config()
        });
        assert_eq!(sim.live_count(), 1);

        sim.set_config(Config {
            capacity: 8,
            ..*sim.config()
        });
        assert_eq!(sim.live_count(), 0);
        assert_eq!(sim.current().capacity(), 8);
    }

    #[test]
    fn emit_and_clear() {
        let spawn_cfg = SpawnConfig {
            interval: 0.5,
            duration: 1.0,
            ..SpawnConfig::default()
        };
        let mut sim = Simulation::new(small(Config::wind()), spawn_cfg, 1);
        let mut emitter = Emitter::new(vec![Vec2::ZERO, Vec2::new(100.0, 0.0)], &spawn_cfg);

        assert_eq!(sim.emit(&mut emitter, 1.0), 2);
        assert_eq!(sim.live_count(), 2);

        sim.clear();
        assert_eq!(sim.live_count(), 0);
        sim.step();
        assert_eq!(sim.live_count(), 0);
    }
}
