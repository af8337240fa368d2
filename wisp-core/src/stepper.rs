//! One generation of the slot simulation.
//!
//! A tick reads every slot of the current [`SlotBuffer`] and writes the
//! next state of that slot into the other buffer of a [`DoubleBuffer`]:
//! 1. Empty slots stay empty.
//! 2. Followers move toward the node ahead of them by `catch_up` and age by
//!    one tick.
//! 3. The head advances `speed` units along its heading and updates its
//!    turn state through the configured [`HeadPolicy`].
//! 4. A slot dies as a whole when any follower is older than `lifetime`,
//!    when its tail and head are closer than `min_extent`, or when a node
//!    would leave the finite range.
//!
//! Every write depends only on the read buffer, so slots can be processed
//! in any order or in parallel (`parallel` feature) with identical results.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec2;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{
    config::{Config, HeadPolicy},
    double_buffer::DoubleBuffer,
    slot_buffer::SlotBuffer,
    types::Node,
};

/// Slot counts after a tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Slots live in the written buffer.
    pub live: usize,
    /// Slots that were live before the tick and are empty after it.
    pub evicted: usize,
}

/// Turn amount of the spiral policy, `2^x - 2(x - 0.2)^2 - 1`.
///
/// An empirically tuned curve: it stays small while `x` is small and
/// grows once `x` passes roughly `0.5`, which winds paths into spirals.
pub fn spiral_turn(x: f32) -> f32 {
    let d = x - 0.2;
    x.exp2() - 2.0 * d * d - 1.0
}

/// Computes the next state of one live slot.
///
/// ### Parameters
/// - `read` - Current nodes of the slot, tail first, head last.
/// - `out` - Destination for the next nodes, same length as `read`.
/// - `cfg` - Simulation tuning; `lifetime`, `speed`, `catch_up`,
///   `min_extent` and `head_policy` are used.
/// - `jitter` - Random value in `[-1, 1]` for this slot and tick; only the
///   spiral policy reads it.
///
/// ### Returns
/// `true` if the slot survives the tick. On `false` the content of `out` is
/// unspecified and the caller must clear the slot.
pub fn step_slot(read: &[Node], out: &mut [Node], cfg: &Config, jitter: f32) -> bool {
    debug_assert_eq!(read.len(), out.len());
    let Some(head) = read.len().checked_sub(1) else {
        return false;
    };

    // Collapsed onto a point, e.g. at the end of a spiral.
    if read[0].pos.distance(read[head].pos) < cfg.min_extent {
        return false;
    }

    // An aged-out follower takes the whole chain with it.
    if read[..head].iter().any(|n| n.aux > cfg.lifetime) {
        return false;
    }

    for k in 0..head {
        let cur = read[k];
        let ahead = read[k + 1].pos;
        out[k] = Node::new(cur.pos + (ahead - cur.pos) * cfg.catch_up, cur.aux + 1.0);
    }

    let h = read[head];
    let (heading, turn) = match cfg.head_policy {
        HeadPolicy::Decay { age_divisor } => {
            let behind = head.checked_sub(1).map_or(0.0, |i| read[i].aux);
            (h.aux, h.aux - behind / age_divisor)
        }
        HeadPolicy::Spiral {
            turn_rate,
            turn_jitter,
        } => (
            spiral_turn(h.aux) * TAU + FRAC_PI_2,
            h.aux + turn_rate + jitter * turn_jitter,
        ),
    };
    out[head] = Node::new(h.pos + Vec2::from_angle(heading) * cfg.speed, turn);

    out.iter().all(Node::is_finite)
}

/// Writes the next generation of `read` into `write`.
///
/// `write` is fully overwritten: every slot is either a complete live path or
/// all sentinel. `read` is never modified.
///
/// ### Parameters
/// - `read` - Current buffer.
/// - `write` - Next buffer; must be congruent with `read`.
/// - `cfg` - Simulation tuning.
/// - `jitter` - One value per slot for the spiral policy, or empty to use
///   `0.0` everywhere.
///
/// ### Panics
/// Panics if the buffers are not congruent.
pub fn step(read: &SlotBuffer, write: &mut SlotBuffer, cfg: &Config, jitter: &[f32]) -> StepStats {
    assert!(read.is_congruent(write), "double buffers must be congruent");
    let path_len = read.path_len();
    let (nodes, live) = write.parts_mut();

    let update = |(id, (out, flag)): (usize, (&mut [Node], &mut bool))| {
        let alive = !read.is_empty(id)
            && step_slot(
                read.nodes(id),
                out,
                cfg,
                jitter.get(id).copied().unwrap_or(0.0),
            );
        if !alive {
            out.fill(Node::SENTINEL);
        }
        *flag = alive;
    };

    #[cfg(feature = "parallel")]
    nodes
        .par_chunks_mut(path_len)
        .zip(live.par_iter_mut())
        .enumerate()
        .for_each(update);

    #[cfg(not(feature = "parallel"))]
    nodes
        .chunks_mut(path_len)
        .zip(live.iter_mut())
        .enumerate()
        .for_each(update);

    let live = write.live_count();
    let stats = StepStats {
        live,
        evicted: read.live_count().saturating_sub(live),
    };
    log::trace!("tick: {} live, {} evicted", stats.live, stats.evicted);
    stats
}

/// Steps the current buffer of `buffers` into the other one, then swaps.
///
/// The swap happens once, after every slot has been written.
pub fn tick(buffers: &mut DoubleBuffer, cfg: &Config, jitter: &[f32]) -> StepStats {
    let (read, write) = buffers.split();
    let stats = step(read, write, cfg, jitter);
    buffers.swap();
    stats
}
