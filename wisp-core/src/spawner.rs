use glam::Vec2;
use rand::Rng;

use crate::{config::SpawnConfig, slot_buffer::SlotBuffer, types::Node};

/// Builds the nodes of a new path next to `source[idx]`.
///
/// The path starts `cfg.offset` units to the side of the source point
/// (left of the stroke direction when `above` is set, right otherwise) and
/// runs along the local stroke tangent with `cfg.spacing` between nodes.
/// Followers start at age `0`; the head starts with the tangent angle as its
/// heading.
///
/// ### Parameters
/// - `source` - Source stroke points.
/// - `idx` - Index of the anchor point; `source[idx + 1]` gives the tangent.
/// - `above` - Which side of the stroke to place the path on.
/// - `path_len` - Number of nodes to produce.
/// - `cfg` - Offset and spacing.
///
/// ### Returns
/// The nodes, tail first, or `None` if `idx + 1` is out of range or the
/// segment has zero length.
pub fn layout_path(
    source: &[Vec2],
    idx: usize,
    above: bool,
    path_len: usize,
    cfg: &SpawnConfig,
) -> Option<Vec<Node>> {
    let anchor = *source.get(idx)?;
    let tangent = (*source.get(idx + 1)? - anchor).try_normalize()?;
    let side = if above { tangent.perp() } else { -tangent.perp() };
    let origin = anchor + side * cfg.offset;

    let mut nodes: Vec<Node> = (0..path_len)
        .map(|i| Node::new(origin + tangent * (i as f32 * cfg.spacing), 0.0))
        .collect();
    if let Some(head) = nodes.last_mut() {
        head.aux = tangent.y.atan2(tangent.x);
    }
    Some(nodes)
}

/// Seeds one new path from a random segment of `source`.
///
/// Uses the first empty slot of `buffer`. A full buffer or a source that
/// cannot orient a path is not an error: nothing is written and the caller
/// may simply try again on a later frame.
///
/// ### Returns
/// `true` if a path was written.
pub fn spawn(
    buffer: &mut SlotBuffer,
    source: &[Vec2],
    above: bool,
    rng: &mut impl Rng,
    cfg: &SpawnConfig,
) -> bool {
    if buffer.find_first_empty().is_none() {
        log::debug!("spawn skipped: all {} slots live", buffer.capacity());
        return false;
    }
    if source.len() < 2 {
        log::debug!("spawn skipped: source has {} points", source.len());
        return false;
    }

    let idx = rng.random_range(0..source.len() - 1);
    if !spawn_at(buffer, source, idx, above, cfg) {
        log::debug!("spawn skipped: zero-length source segment at {idx}");
        return false;
    }
    true
}

/// Writes the path anchored at `source[idx]` into the first empty slot.
fn spawn_at(
    buffer: &mut SlotBuffer,
    source: &[Vec2],
    idx: usize,
    above: bool,
    cfg: &SpawnConfig,
) -> bool {
    let Some(id) = buffer.find_first_empty() else {
        return false;
    };
    let Some(nodes) = layout_path(source, idx, above, buffer.path_len(), cfg) else {
        return false;
    };
    buffer.write_slot(id, &nodes);
    true
}

/// Spawns up to `count` paths with random sides and random anchors.
///
/// Only segments that can orient a path are drawn from, so repeated points
/// in `source` never cut the batch short. The batch ends early only when
/// `buffer` runs out of empty slots.
///
/// ### Returns
/// The number of paths written.
pub fn spawn_batch(
    buffer: &mut SlotBuffer,
    source: &[Vec2],
    count: usize,
    rng: &mut impl Rng,
    cfg: &SpawnConfig,
) -> usize {
    let anchors: Vec<usize> = source
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| (pair[1] - pair[0]).try_normalize().is_some())
        .map(|(i, _)| i)
        .collect();
    if anchors.is_empty() {
        log::debug!("batch skipped: source has no usable segment");
        return 0;
    }

    let mut spawned = 0;
    while spawned < count && buffer.find_first_empty().is_some() {
        let idx = anchors[rng.random_range(0..anchors.len())];
        let above = rng.random_bool(0.5);
        if spawn_at(buffer, source, idx, above, cfg) {
            spawned += 1;
        }
    }
    spawned
}

/// Spawns paths from one source stroke at a fixed rate for a limited time.
#[derive(Clone, Debug)]
pub struct Emitter {
    source: Vec<Vec2>,
    interval: f32,
    duration: f32,
    elapsed: f32,
    since_spawn: f32,
}

impl Emitter {
    pub fn new(source: Vec<Vec2>, cfg: &SpawnConfig) -> Self {
        Self {
            source,
            interval: cfg.interval,
            duration: cfg.duration,
            elapsed: 0.0,
            since_spawn: 0.0,
        }
    }

    pub fn source(&self) -> &[Vec2] {
        &self.source
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Advances the emitter clock by `dt` seconds and spawns one path for
    /// every full `interval` that elapsed.
    ///
    /// Time past `duration` is ignored. Spawns refused for lack of capacity
    /// are dropped, not queued.
    ///
    /// ### Returns
    /// The number of paths written.
    pub fn update(
        &mut self,
        dt: f32,
        buffer: &mut SlotBuffer,
        rng: &mut impl Rng,
        cfg: &SpawnConfig,
    ) -> usize {
        if self.is_finished() || !(dt > 0.0) || !(self.interval > 0.0) {
            return 0;
        }

        let dt = dt.min(self.duration - self.elapsed);
        self.elapsed += dt;
        self.since_spawn += dt;

        let due = (self.since_spawn / self.interval).floor();
        self.since_spawn = (self.since_spawn - due * self.interval).max(0.0);

        // `as` saturates; capacity bounds the attempts per call.
        let attempts = (due as usize).min(buffer.capacity());
        let mut spawned = 0;
        for _ in 0..attempts {
            if buffer.find_first_empty().is_none() {
                break;
            }
            let above = rng.random_bool(0.5);
            if spawn(buffer, &self.source, above, rng, cfg) {
                spawned += 1;
            }
        }
        spawned
    }
}
