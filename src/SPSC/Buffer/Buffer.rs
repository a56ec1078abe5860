// Per-process descriptor over the shared packet ring

use super::layout::ControlBlock;
use crate::Core::SharedMemory::SharedMemoryBackend;

/// Which side of the ring this descriptor drives.
///
/// The role decides one thing at open time: a `Source` resets both offsets
/// to zero, a `Sink` never touches them. Re-opening as `Source` while a
/// `Sink` is attached therefore resets the sink's view as well; when a ring
/// must be reopened, both sides reopen together. One-sided reopen is
/// unsupported and not detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Producer: writes packets, owns `write_offset` and the size fields.
    Source,
    /// Consumer: reads packets, owns `read_offset`.
    Sink,
}

/// A single-producer/single-consumer packet ring over one shared memory
/// region.
///
/// This struct is NOT stored in shared memory. It is a per-process
/// descriptor holding pointers into the mapped region; each attaching
/// process builds its own from the same `(slot_size, number_of_slots)`
/// geometry.
///
/// ### Protocol:
/// Both sides drive the ring through acquire→commit cycles. `acquire_write`
/// / `acquire_read` block (with a wall-clock deadline) on the counting
/// semaphores in the control block and hand back a pointer straight into the
/// shared slot, so the caller reads or writes the packet in place with no
/// intermediate copy. The matching commit publishes the slot and advances
/// the offset. The protocol does not track pairing: committing without a
/// prior successful acquire publishes undefined slot contents.
///
/// Exactly one producer and one consumer may drive a ring. Nothing
/// identifies attachments, so a second producer would race offset advances
/// non-deterministically.
pub struct RingBuffer {
    /// Owns the mapping; dropped last, after the pointers below die with it.
    pub(crate) shm: Box<dyn SharedMemoryBackend>,

    /// Name of the backing shared memory object.
    pub(crate) name: String,

    /// Side of the ring this process drives.
    pub(crate) role: Role,

    /// Control block at the base of the region.
    pub(crate) control: *mut ControlBlock,

    /// Per-slot payload-size fields, `number_of_slots` of them.
    pub(crate) sizes: *mut u32,

    /// Start of the packed data slots.
    pub(crate) data: *mut u8,

    /// Capacity of one slot in bytes.
    pub(crate) slot_size: u32,

    /// Number of slots in the ring.
    pub(crate) number_of_slots: u32,

    /// `slot_size * number_of_slots`; offsets wrap at this bound.
    pub(crate) total_size: u32,
}

unsafe impl Send for RingBuffer {}
unsafe impl Sync for RingBuffer {}
