use crate::types::{Node, SlotId};

/// A fixed-capacity array of path slots.
///
/// Every slot owns a contiguous run of `path_len` nodes in one flat,
/// preallocated node array. The last node of a slot is its head, the
/// others are followers.
///
/// Occupancy is tracked by an explicit per-slot flag, so any position
/// (including the origin) is a legal live position. Slots are only ever
/// written whole, through [`SlotBuffer::write_slot`] and
/// [`SlotBuffer::clear_slot`]: a slot is either fully live or fully
/// [`Node::SENTINEL`], never a mix.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotBuffer {
    /// `capacity * path_len` nodes, slot after slot.
    nodes: Vec<Node>,
    /// Occupancy flag for each slot.
    live: Vec<bool>,
    path_len: usize,
}

impl SlotBuffer {
    /// Creates a buffer of `capacity` empty slots.
    ///
    /// ### Parameters
    /// - `capacity` - Number of slots.
    /// - `path_len` - Number of nodes per slot.
    ///
    /// ### Panics
    /// Panics if `path_len` is zero.
    pub fn new(capacity: usize, path_len: usize) -> Self {
        assert!(path_len > 0, "a slot needs at least one node");
        Self {
            nodes: vec![Node::SENTINEL; capacity * path_len],
            live: vec![false; capacity],
            path_len,
        }
    }

    pub fn capacity(&self) -> usize {
        self.live.len()
    }

    pub fn path_len(&self) -> usize {
        self.path_len
    }

    /// Index of the head node inside a slot.
    pub fn head_index(&self) -> usize {
        self.path_len - 1
    }

    /// Returns `true` if `other` has the same capacity and path length.
    pub fn is_congruent(&self, other: &SlotBuffer) -> bool {
        self.capacity() == other.capacity() && self.path_len == other.path_len
    }

    /// Returns `true` if the slot holds no path.
    ///
    /// ### Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    pub fn is_empty(&self, id: SlotId) -> bool {
        !self.live[id]
    }

    /// Returns the first empty slot, scanning from slot `0`.
    ///
    /// Earlier slots always win, which makes allocation order deterministic
    /// when several spawns compete for the remaining capacity.
    ///
    /// ### Returns
    /// The id of the first empty slot, or `None` if the buffer is full.
    pub fn find_first_empty(&self) -> Option<SlotId> {
        self.live.iter().position(|live| !live)
    }

    /// Returns the nodes of a live slot, or `None` if it is empty or `id`
    /// is out of bounds.
    pub fn slot(&self, id: SlotId) -> Option<&[Node]> {
        match self.live.get(id) {
            Some(true) => Some(self.nodes(id)),
            _ => None,
        }
    }

    /// Returns the raw node range of a slot, sentinel nodes included.
    ///
    /// ### Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    pub fn nodes(&self, id: SlotId) -> &[Node] {
        let start = id * self.path_len;
        &self.nodes[start..start + self.path_len]
    }

    /// The whole flat node array.
    pub fn raw_nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Stores a full path in a slot and marks it live.
    ///
    /// ### Parameters
    /// - `id` - Slot to write.
    /// - `nodes` - Exactly `path_len` nodes, tail first, head last.
    ///
    /// ### Panics
    /// Panics if `id` is out of bounds or `nodes.len() != path_len`.
    pub fn write_slot(&mut self, id: SlotId, nodes: &[Node]) {
        assert_eq!(nodes.len(), self.path_len, "slot length mismatch");
        let start = id * self.path_len;
        self.nodes[start..start + self.path_len].copy_from_slice(nodes);
        self.live[id] = true;
    }

    /// Resets every node of a slot to the sentinel and marks it empty.
    ///
    /// ### Panics
    /// Panics if `id` is out of bounds.
    pub fn clear_slot(&mut self, id: SlotId) {
        let start = id * self.path_len;
        self.nodes[start..start + self.path_len].fill(Node::SENTINEL);
        self.live[id] = false;
    }

    /// Empties every slot.
    pub fn clear(&mut self) {
        self.nodes.fill(Node::SENTINEL);
        self.live.fill(false);
    }

    pub fn live_count(&self) -> usize {
        self.live.iter().filter(|live| **live).count()
    }

    /// Iterates over all live slots in slot order.
    pub fn live_slots(&self) -> impl Iterator<Item = (SlotId, &[Node])> + '_ {
        self.nodes
            .chunks_exact(self.path_len)
            .zip(&self.live)
            .enumerate()
            .filter_map(|(id, (nodes, live))| live.then_some((id, nodes)))
    }

    /// Mutable views for a whole-buffer rewrite: the node array and the
    /// occupancy flags.
    pub(crate) fn parts_mut(&mut self) -> (&mut [Node], &mut [bool]) {
        (&mut self.nodes, &mut self.live)
    }
}
