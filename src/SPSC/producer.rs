use std::io;
use std::time::Duration;

use crate::SPSC::Buffer::RingBuffer;

/// The writing end of a shared memory packet list.
///
/// A producer drives the ring through acquire→commit cycles: `acquire`
/// blocks until a slot is free and hands back the slot memory itself, the
/// caller fills it in place, and `commit` publishes it to the consumer.
/// `send` wraps the cycle for callers that already hold the payload in a
/// buffer. Exactly one producer may drive a list.
pub struct Producer {
    pub(crate) list: RingBuffer,
}

impl Producer {
    pub(crate) fn new(list: RingBuffer) -> Self {
        Self { list }
    }

    /// Acquire the next free slot for in-place writing.
    ///
    /// # Returns
    /// * `Ok(Some(slot))` - the full slot to fill; publish with [`commit`](Self::commit)
    /// * `Ok(None)` - no slot became free within `timeout`
    /// * `Err(io::Error)` - the wait failed for a non-timeout reason
    pub fn acquire(&mut self, timeout: Duration) -> io::Result<Option<&mut [u8]>> {
        self.list.acquire_write(timeout)
    }

    /// Publish the previously acquired slot with `size` valid bytes.
    ///
    /// Sizes above the slot capacity wrap into `0..=slot_size` rather than
    /// failing; see [`RingBuffer::commit_write`] for the clamp contract.
    pub fn commit(&mut self, size: usize) -> io::Result<()> {
        self.list.commit_write(size)
    }

    /// Copy a message into the next free slot and publish it.
    ///
    /// # Arguments
    /// * `message` - The message to send, at most `slot_size` bytes
    /// * `timeout` - Maximum time to wait for a free slot
    ///
    /// # Returns
    /// * `Ok(true)` if the message was sent
    /// * `Ok(false)` if no slot became free within the timeout
    /// * `Err(io::Error)` if the message is too large or the wait failed
    pub fn send<T: AsRef<[u8]>>(&mut self, message: T, timeout: Duration) -> io::Result<bool> {
        let message = message.as_ref();

        // Check message size before acquiring a slot
        if message.len() > self.list.slot_size() as usize {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Message too large ({} > {})",
                    message.len(),
                    self.list.slot_size()
                ),
            ));
        }

        match self.list.acquire_write(timeout)? {
            Some(slot) => {
                slot[..message.len()].copy_from_slice(message);
                self.list.commit_write(message.len())?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Capacity of one slot in bytes.
    pub fn slot_size(&self) -> u32 {
        self.list.slot_size()
    }

    /// Number of slots in the ring.
    pub fn capacity(&self) -> u32 {
        self.list.number_of_slots()
    }

    /// Free-slot permits currently available. Monitoring only.
    pub fn free_slots(&self) -> u32 {
        self.list.free_slots()
    }

    /// Close the list; see [`RingBuffer::close`].
    pub fn close(self) -> io::Result<()> {
        self.list.close()
    }
}
