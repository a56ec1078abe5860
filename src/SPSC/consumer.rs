use std::io;
use std::time::Duration;

use crate::SPSC::Buffer::RingBuffer;

/// The reading end of a shared memory packet list.
///
/// A consumer mirrors the producer's cycle: `acquire` blocks until a packet
/// is available and returns the payload bytes in place, `commit` releases
/// the slot back to the producer. `receive` wraps the cycle and copies the
/// payload out. Exactly one consumer may drive a list.
pub struct Consumer {
    pub(crate) list: RingBuffer,
}

impl Consumer {
    pub(crate) fn new(list: RingBuffer) -> Self {
        Self { list }
    }

    /// Acquire the next packet for in-place reading.
    ///
    /// # Returns
    /// * `Ok(Some(packet))` - the payload bytes exactly as committed;
    ///   release the slot with [`commit`](Self::commit)
    /// * `Ok(None)` - nothing arrived within `timeout`
    /// * `Err(io::Error)` - the wait failed for a non-timeout reason
    pub fn acquire(&mut self, timeout: Duration) -> io::Result<Option<&[u8]>> {
        self.list.acquire_read(timeout)
    }

    /// Release the previously acquired slot back to the producer.
    pub fn commit(&mut self) -> io::Result<()> {
        self.list.commit_read()
    }

    /// Receive a message, copying it out of the ring.
    ///
    /// # Arguments
    /// * `timeout` - Maximum time to wait for a message
    ///
    /// # Returns
    /// * `Ok(Some(data))` if a message was received
    /// * `Ok(None)` if the timeout was reached
    /// * `Err(io::Error)` if the wait failed for a non-timeout reason
    pub fn receive(&mut self, timeout: Duration) -> io::Result<Option<Vec<u8>>> {
        match self.list.acquire_read(timeout)? {
            Some(packet) => {
                let payload = packet.to_vec();
                self.list.commit_read()?;
                Ok(Some(payload))
            }
            None => Ok(None),
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

    /// Packets currently waiting to be read. Monitoring only.
    pub fn available(&self) -> u32 {
        self.list.filled_slots()
    }

    /// Close the list; see [`RingBuffer::close`].
    pub fn close(self) -> io::Result<()> {
        self.list.close()
    }
}
