use crossbeam_utils::CachePadded;
use std::mem::size_of;
use std::sync::atomic::AtomicU32;

use crate::Core::sem::Semaphore;

/// Maximum length in bytes of a shared memory list name.
pub const MEM_STRING: usize = 256;

/// Initialization sentinel values for `ControlBlock::init_state`.
///
/// A freshly created region is zero-filled, so `STATE_RAW` is what the first
/// opener observes. The process that wins the claim moves the sentinel to
/// `STATE_BUILDING` while it constructs the semaphores, then publishes
/// `STATE_READY`. Anything else means the region holds unrelated data.
pub const STATE_RAW: u32 = 0x0000;
pub const STATE_BUILDING: u32 = 0xFEED;
pub const STATE_READY: u32 = 0xCAFE;

/// The control block at the head of every shared memory list region.
///
/// This struct lives in shared memory and is mapped by producer and consumer
/// alike; `#[repr(C)]` pins the field order every attaching process relies
/// on: the two counting semaphores, then the two offsets, then the
/// initialization sentinel.
///
/// ### Concurrency design:
/// - `space_sem` starts at the slot count; the producer consumes one permit
///   per acquired write slot, the consumer's commit-read returns one.
/// - `fill_sem` starts at zero; the producer's commit-write posts one permit
///   per published packet, the consumer consumes one per acquired read.
/// - `write_offset` is written only by the producer, `read_offset` only by
///   the consumer. The offsets are cache-padded so the two writers never
///   share a line.
/// - `init_state` is claimed with a compare-and-set, so two processes
///   attaching to a cold region cannot both construct the semaphores.
#[repr(C, align(128))]
pub struct ControlBlock {
    /// Free-slot permits. The producer waits on this before writing.
    pub space_sem: Semaphore,

    /// Filled-slot permits. The consumer waits on this before reading.
    pub fill_sem: Semaphore,

    /// Byte offset of the next slot to write, a multiple of the slot size.
    /// Producer-owned after initialization.
    pub write_offset: CachePadded<AtomicU32>,

    /// Byte offset of the next slot to read, a multiple of the slot size.
    /// Consumer-owned after initialization.
    pub read_offset: CachePadded<AtomicU32>,

    /// Initialization sentinel; see the STATE_* constants.
    pub init_state: AtomicU32,
}

/// Pointers into one mapped region, derived purely from the base address and
/// the ring geometry.
///
/// Every process attaching to a region runs the same formula over the same
/// `(slot_size, number_of_slots)` pair, so agreement is structural; nothing
/// is negotiated at runtime.
pub struct RegionLayout {
    /// The control block at the base of the region.
    pub control: *mut ControlBlock,
    /// Array of `number_of_slots` per-slot payload-size fields.
    pub sizes: *mut u32,
    /// Start of the packed data slots.
    pub data: *mut u8,
}

/// Total region size for a ring of `number_of_slots` slots of `slot_size`
/// bytes: control block, payload-size array, then the data slots.
pub const fn region_size(slot_size: u32, number_of_slots: u32) -> usize {
    size_of::<ControlBlock>()
        + number_of_slots as usize * size_of::<u32>()
        + slot_size as usize * number_of_slots as usize
}

impl RegionLayout {
    /// Compute the layout pointers for a mapped region.
    ///
    /// # Safety
    /// `base` must point to at least `region_size(slot_size,
    /// number_of_slots)` bytes of mapped memory, aligned for `ControlBlock`
    /// (any mmap'd page qualifies).
    pub unsafe fn compute(base: *mut u8, number_of_slots: u32) -> Self {
        let control = base as *mut ControlBlock;
        let sizes = base.add(size_of::<ControlBlock>()) as *mut u32;
        let data = base.add(size_of::<ControlBlock>() + number_of_slots as usize * size_of::<u32>());
        Self {
            control,
            sizes,
            data,
        }
    }
}
