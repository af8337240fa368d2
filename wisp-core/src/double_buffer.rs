use crate::slot_buffer::SlotBuffer;

/// Two congruent [`SlotBuffer`]s with alternating read/write roles.
///
/// The current buffer is the one spawners write into and renderers read
/// from. A tick reads the current buffer and writes the next one through
/// [`DoubleBuffer::split`], then calls [`DoubleBuffer::swap`] exactly once.
#[derive(Clone, Debug)]
pub struct DoubleBuffer {
    buffers: [SlotBuffer; 2],
    read: usize,
}

impl DoubleBuffer {
    pub fn new(capacity: usize, path_len: usize) -> Self {
        Self {
            buffers: [
                SlotBuffer::new(capacity, path_len),
                SlotBuffer::new(capacity, path_len),
            ],
            read: 0,
        }
    }

    pub fn current(&self) -> &SlotBuffer {
        &self.buffers[self.read]
    }

    pub fn current_mut(&mut self) -> &mut SlotBuffer {
        &mut self.buffers[self.read]
    }

    /// Borrows the current buffer for reading and the other one for writing.
    pub fn split(&mut self) -> (&SlotBuffer, &mut SlotBuffer) {
        let [a, b] = &mut self.buffers;
        if self.read == 0 { (&*a, b) } else { (&*b, a) }
    }

    /// Flips the roles: the buffer just written becomes current.
    pub fn swap(&mut self) {
        self.read = 1 - self.read;
    }

    pub fn clear(&mut self) {
        for buf in &mut self.buffers {
            buf.clear();
        }
    }
}
