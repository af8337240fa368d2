use glam::Vec2;

/// A 2-D position. Always a plain value, never shared.
pub type Point = Vec2;

/// Identifier for a slot in a [`crate::slot_buffer::SlotBuffer`].
///
/// This is an index into the buffer's slot range, and is only meaningful
/// within the lifetime of a given buffer (or its congruent twin in a
/// [`crate::double_buffer::DoubleBuffer`]).
pub type SlotId = usize;

/// One point of a path chain.
///
/// `aux` carries the heading/turn state on the head node (the last index
/// of a slot) and an age counter on every follower. The role comes from
/// the node's index inside its slot, never from the node itself.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Node {
    pub pos: Vec2,
    pub aux: f32,
}

impl Node {
    /// Value stored in every node of an empty slot.
    pub const SENTINEL: Node = Node {
        pos: Vec2::ZERO,
        aux: 0.0,
    };

    pub fn new(pos: Vec2, aux: f32) -> Self {
        Self { pos, aux }
    }

    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }

    pub fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.aux.is_finite()
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::SENTINEL
    }
}
