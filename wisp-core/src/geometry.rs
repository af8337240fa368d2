//! Triangle geometry for drawing a path as a tapered ribbon.
//!
//! The ribbon is described once per path length by a template of
//! `(node index, side)` vertices: a single tail triangle, two triangles per
//! body segment and a single head triangle. [`expand_wisp`] turns the
//! template and a slot's nodes into concrete triangles.

use glam::Vec2;

use crate::types::Node;

/// Where a template vertex sits relative to its node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Top,
    Center,
    Bottom,
}

/// Builds the ribbon template for paths of `path_len` nodes.
///
/// Paths shorter than three nodes have no body and produce an empty
/// template.
pub fn wisp_template(path_len: usize) -> Vec<(usize, Side)> {
    if path_len < 3 {
        return Vec::new();
    }
    let segments = path_len - 3;
    let mut out = Vec::with_capacity(segments * 6 + 6);

    // tail
    out.extend([(0, Side::Center), (1, Side::Top), (1, Side::Bottom)]);

    for i in 1..=segments {
        out.extend([
            (i, Side::Bottom),
            (i, Side::Top),
            (i + 1, Side::Top),
            (i + 1, Side::Top),
            (i + 1, Side::Bottom),
            (i, Side::Bottom),
        ]);
    }

    // head
    out.extend([
        (path_len - 2, Side::Top),
        (path_len - 2, Side::Bottom),
        (path_len - 1, Side::Center),
    ]);
    out
}

/// Expands one slot into ribbon triangles.
///
/// Top and bottom vertices are pushed `half_width` units to either side of
/// their node, along the normal of the averaged incoming and outgoing
/// segment directions. Center vertices stay on the node.
///
/// ### Parameters
/// - `nodes` - Nodes of a live slot.
/// - `template` - Output of [`wisp_template`] for `nodes.len()`.
/// - `half_width` - Distance from the centre line to each edge.
///
/// ### Returns
/// One `[Vec2; 3]` per template triangle. Template entries that point past
/// the end of `nodes` are skipped along with their triangle.
pub fn expand_wisp(nodes: &[Node], template: &[(usize, Side)], half_width: f32) -> Vec<[Vec2; 3]> {
    template
        .chunks_exact(3)
        .filter_map(|tri| {
            Some([
                vertex(nodes, tri[0], half_width)?,
                vertex(nodes, tri[1], half_width)?,
                vertex(nodes, tri[2], half_width)?,
            ])
        })
        .collect()
}

fn vertex(nodes: &[Node], (idx, side): (usize, Side), half_width: f32) -> Option<Vec2> {
    let pos = nodes.get(idx)?.pos;
    if side == Side::Center {
        return Some(pos);
    }

    let prev = nodes[idx.saturating_sub(1)].pos;
    let next = nodes[(idx + 1).min(nodes.len() - 1)].pos;
    let normal = (((pos - prev) + (next - pos)) * 0.5)
        .normalize_or_zero()
        .perp();

    Some(match side {
        Side::Top => pos + normal * half_width,
        _ => pos - normal * half_width,
    })
}
