use std::io;
use std::ptr::NonNull;
use std::slice;
use std::sync::atomic::Ordering::{AcqRel, Acquire, Release};
use std::time::Duration;

use super::layout::{region_size, ControlBlock, RegionLayout, MEM_STRING};
use super::layout::{STATE_BUILDING, STATE_RAW, STATE_READY};
use super::Buffer::{RingBuffer, Role};
use crate::Core::SharedMemory::{allocate_shared_memory, SharedMemoryBackend};
use crate::Core::futex::deadline_after;

impl RingBuffer {
    /// Open a packet ring in the named shared memory region.
    ///
    /// Allocates (or attaches to) the region, computes the layout, and
    /// claims one-time initialization of the semaphores via the sentinel.
    /// A `Source` additionally resets both offsets to zero; a `Sink` leaves
    /// whatever state the producer established.
    ///
    /// # Arguments
    /// * `name` - shared memory name, at most `MEM_STRING` bytes
    /// * `role` - `Source` (writes packets) or `Sink` (reads packets)
    /// * `slot_size` - capacity of one packet slot in bytes, nonzero
    /// * `number_of_slots` - slots in the ring; zero is accepted here and
    ///   rejected at the first commit
    /// * `reserved_address` - reserved for placing the ring at a fixed
    ///   mapping address; currently unused
    ///
    /// Both sides must open with identical `slot_size` and
    /// `number_of_slots`, otherwise their layout formulas disagree.
    pub fn open(
        name: &str,
        role: Role,
        slot_size: u32,
        number_of_slots: u32,
        _reserved_address: Option<NonNull<u8>>,
    ) -> io::Result<RingBuffer> {
        if name.len() > MEM_STRING {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "shared memory name is too long ({} bytes, maximum {})",
                    name.len(),
                    MEM_STRING
                ),
            ));
        }

        if slot_size == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "slot size must be nonzero",
            ));
        }

        let shm = allocate_shared_memory(name, region_size(slot_size, number_of_slots))?;
        let list = unsafe { Self::attach(shm, name, role, slot_size, number_of_slots) }?;
        tracing::debug!(
            name,
            role = ?list.role,
            slot_size,
            number_of_slots,
            "opened shared memory list"
        );
        Ok(list)
    }

    /// Build a descriptor over an already-mapped region.
    ///
    /// `open` calls this after allocating; tests back it with plain heap
    /// memory instead.
    ///
    /// # Safety
    /// The backend's region must either be zero-filled (never initialized)
    /// or have been previously initialized by this library with the same
    /// geometry. At most one producer and one consumer may attach.
    pub unsafe fn attach(
        shm: Box<dyn SharedMemoryBackend>,
        name: &str,
        role: Role,
        slot_size: u32,
        number_of_slots: u32,
    ) -> io::Result<RingBuffer> {
        if slot_size == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "slot size must be nonzero",
            ));
        }
        let total = u64::from(slot_size) * u64::from(number_of_slots);
        if total > u64::from(u32::MAX) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("ring data region too large ({} bytes)", total),
            ));
        }
        let needed = region_size(slot_size, number_of_slots);
        if shm.size() < needed {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Shared memory size too small: expected at least {} bytes, got {}",
                    needed,
                    shm.size()
                ),
            ));
        }

        let layout = RegionLayout::compute(shm.as_ptr(), number_of_slots);
        let control = &*layout.control;

        // Claim one-time initialization. Whoever wins the swap from RAW
        // constructs the semaphores; everyone else either reuses the live
        // state or briefly spins while the winner publishes it.
        loop {
            match control
                .init_state
                .compare_exchange(STATE_RAW, STATE_BUILDING, AcqRel, Acquire)
            {
                Ok(_) => {
                    control.space_sem.init(number_of_slots);
                    control.fill_sem.init(0);
                    control.init_state.store(STATE_READY, Release);
                    tracing::debug!(name, "initialized ring semaphores");
                    break;
                }
                Err(STATE_READY) => break,
                Err(STATE_BUILDING) => std::hint::spin_loop(),
                Err(other) => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("unrecognized initialization state 0x{:X}", other),
                    ));
                }
            }
        }

        // Only the producer resets the positions. A source started later or
        // restarted resets the sink's read position as well; reopening is a
        // both-sides operation by contract.
        if role == Role::Source {
            control.write_offset.store(0, Release);
            control.read_offset.store(0, Release);
        }

        Ok(RingBuffer {
            control: layout.control,
            sizes: layout.sizes,
            data: layout.data,
            shm,
            name: name.to_owned(),
            role,
            slot_size,
            number_of_slots,
            total_size: total as u32,
        })
    }

    #[inline]
    fn control(&self) -> &ControlBlock {
        // Safety: `control` points into the mapping owned by `shm`, which
        // lives as long as `self`.
        unsafe { &*self.control }
    }

    /// The sole wraparound rule: offsets advance one slot at a time and wrap
    /// at the end of the data region.
    #[inline]
    fn advance(&self, offset: u32) -> u32 {
        (offset + self.slot_size) % self.total_size
    }

    /// Slot index for an offset, used to address the payload-size array.
    #[inline]
    fn slot_index(&self, offset: u32) -> usize {
        (offset / self.slot_size % self.number_of_slots) as usize
    }

    /// Acquire the next free slot for writing.
    ///
    /// Blocks on the space semaphore until a slot is free or the deadline
    /// (computed once at entry, wall clock) passes. Interruptions are
    /// retried against the same deadline.
    ///
    /// # Returns
    /// * `Ok(Some(slot))` - the full `slot_size`-byte slot to fill; publish
    ///   it with [`commit_write`](Self::commit_write)
    /// * `Ok(None)` - no slot became free within the deadline; not an error
    /// * `Err(e)` - the wait failed for a non-timeout reason
    ///
    /// A zero timeout degenerates to a poll and is prone to spurious
    /// timeouts under load; prefer a real deadline.
    pub fn acquire_write(&mut self, timeout: Duration) -> io::Result<Option<&mut [u8]>> {
        let deadline = deadline_after(timeout)?;
        match self.control().space_sem.wait_until(Some(&deadline)) {
            Ok(true) => {}
            Ok(false) => {
                tracing::trace!(name = %self.name, "acquire_write timed out");
                return Ok(None);
            }
            Err(err) => {
                tracing::warn!(name = %self.name, error = %err, "space semaphore wait failed");
                return Err(err);
            }
        }

        let offset = self.control().write_offset.load(Acquire) as usize;
        // Safety: offset is a multiple of slot_size below total_size, so the
        // slot lies inside the mapped data region.
        let slot =
            unsafe { slice::from_raw_parts_mut(self.data.add(offset), self.slot_size as usize) };
        Ok(Some(slot))
    }

    /// Publish the previously acquired write slot.
    ///
    /// Records the payload size, advances the write offset, and posts the
    /// fill semaphore. `size` is recorded as `size % (slot_size + 1)`: the
    /// stored value always lands in `0..=slot_size`, but an oversized
    /// request wraps instead of failing. The clamp is lossy and intentional;
    /// callers that want rejection use [`Producer::send`], which checks the
    /// length up front.
    ///
    /// Calling this without a prior successful `acquire_write` publishes a
    /// slot with undefined contents; the protocol does not track pairing.
    ///
    /// [`Producer::send`]: crate::SPSC::Producer::send
    pub fn commit_write(&mut self, size: usize) -> io::Result<()> {
        if self.number_of_slots == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "ring has no slots",
            ));
        }

        let control = self.control();
        let offset = control.write_offset.load(Acquire);
        let index = self.slot_index(offset);
        let recorded = (size % (self.slot_size as usize + 1)) as u32;
        // Safety: index < number_of_slots; the size array is that long.
        // Ordered before the consumer's read by the fill_sem post below.
        unsafe { self.sizes.add(index).write(recorded) };

        control.write_offset.store(self.advance(offset), Release);
        control.fill_sem.post();
        tracing::trace!(
            name = %self.name,
            index,
            size = recorded,
            offset = control.write_offset.load(Acquire),
            "committed write"
        );
        Ok(())
    }

    /// Acquire the next filled slot for reading.
    ///
    /// Blocks on the fill semaphore with the same deadline and interruption
    /// semantics as [`acquire_write`](Self::acquire_write). On success the
    /// returned slice is exactly the payload the producer committed.
    ///
    /// # Returns
    /// * `Ok(Some(packet))` - the payload bytes; release the slot with
    ///   [`commit_read`](Self::commit_read)
    /// * `Ok(None)` - nothing arrived within the deadline; not an error
    /// * `Err(e)` - the wait failed for a non-timeout reason
    pub fn acquire_read(&mut self, timeout: Duration) -> io::Result<Option<&[u8]>> {
        let deadline = deadline_after(timeout)?;
        match self.control().fill_sem.wait_until(Some(&deadline)) {
            Ok(true) => {}
            Ok(false) => {
                tracing::trace!(name = %self.name, "acquire_read timed out");
                return Ok(None);
            }
            Err(err) => {
                tracing::warn!(name = %self.name, error = %err, "fill semaphore wait failed");
                return Err(err);
            }
        }

        let offset = self.control().read_offset.load(Acquire) as usize;
        let index = self.slot_index(offset as u32);
        // Safety: producer-written before the fill_sem post that let us in.
        let stored = unsafe { self.sizes.add(index).read() };
        let len = stored as usize % (self.slot_size as usize + 1);
        // Safety: len <= slot_size, so the slice stays inside the slot.
        let packet = unsafe { slice::from_raw_parts(self.data.add(offset), len) };
        Ok(Some(packet))
    }

    /// Release the previously acquired read slot.
    ///
    /// Advances the read offset and posts the space semaphore.
    /// Non-blocking; fails only on a ring with no slots.
    pub fn commit_read(&mut self) -> io::Result<()> {
        if self.number_of_slots == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "ring has no slots",
            ));
        }

        let control = self.control();
        let offset = control.read_offset.load(Acquire);
        control.read_offset.store(self.advance(offset), Release);
        control.space_sem.post();
        tracing::trace!(
            name = %self.name,
            offset = control.read_offset.load(Acquire),
            "committed read"
        );
        Ok(())
    }

    /// Close the descriptor.
    ///
    /// If this process still sees the semaphores constructed, tears them
    /// down and returns the sentinel to raw, then removes the backing name;
    /// the mapping itself is released when the descriptor drops. Unlink
    /// failures are reported but do not stop the remaining cleanup. Both
    /// attached processes must eventually close; one-sided close followed by
    /// one-sided reuse is unsupported.
    pub fn close(self) -> io::Result<()> {
        let control = self.control();
        if control.init_state.swap(STATE_RAW, AcqRel) != STATE_RAW {
            control.space_sem.init(0);
            control.fill_sem.init(0);
            tracing::debug!(name = %self.name, "tore down ring semaphores");
        }

        let result = self.shm.unlink();
        if let Err(ref err) = result {
            tracing::warn!(name = %self.name, error = %err, "failed to unlink shared memory");
        } else {
            tracing::debug!(name = %self.name, "closed shared memory list");
        }
        result
    }

    /// Side of the ring this descriptor drives.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Name of the backing shared memory object.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Capacity of one slot in bytes.
    pub fn slot_size(&self) -> u32 {
        self.slot_size
    }

    /// Number of slots in the ring.
    pub fn number_of_slots(&self) -> u32 {
        self.number_of_slots
    }

    /// Current write offset. Monitoring only.
    pub fn write_offset(&self) -> u32 {
        self.control().write_offset.load(Acquire)
    }

    /// Current read offset. Monitoring only.
    pub fn read_offset(&self) -> u32 {
        self.control().read_offset.load(Acquire)
    }

    /// Free-slot permits currently available. Monitoring only.
    pub fn free_slots(&self) -> u32 {
        self.control().space_sem.value()
    }

    /// Filled-slot permits currently available. Monitoring only.
    pub fn filled_slots(&self) -> u32 {
        self.control().fill_sem.value()
    }
}
