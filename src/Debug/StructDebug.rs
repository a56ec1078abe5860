use std::fmt;

use crate::SPSC::Buffer::RingBuffer;
use crate::SPSC::{Consumer, Producer};

/// Debug function for RingBuffer
///
/// Shows the role, geometry, and region pointers without dereferencing
/// shared memory.
pub fn debug_ring_buffer(list: &RingBuffer, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RingBuffer")
        .field("name", &list.name)
        .field("role", &list.role)
        .field("slot_size", &list.slot_size)
        .field("number_of_slots", &list.number_of_slots)
        .field("control", &format_args!("{:p}", list.control))
        .field("data", &format_args!("{:p}", list.data))
        .finish_non_exhaustive()
}

/// Debug function for Producer
pub fn debug_producer(producer: &Producer, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Producer")
        .field("list", &producer.list)
        .finish()
}

/// Debug function for Consumer
pub fn debug_consumer(consumer: &Consumer, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Consumer")
        .field("list", &consumer.list)
        .finish()
}

// Debug proxy implementations that call the standalone debug functions
impl fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_ring_buffer(self, f)
    }
}

impl fmt::Debug for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_producer(self, f)
    }
}

impl fmt::Debug for Consumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_consumer(self, f)
    }
}
