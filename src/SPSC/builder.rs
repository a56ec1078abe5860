use super::{Consumer, Producer};
use crate::SPSC::Buffer::{RingBuffer, Role};

/// Builder for the two ends of a shared memory packet list.
///
/// Producer and consumer must be built with the same name, slot size, and
/// slot count; the layout formulas on both sides only line up when the
/// geometry matches.
pub struct ListBuilder {
    name: String,
    slot_size: u32,
    number_of_slots: u32,
}

impl Default for ListBuilder {
    fn default() -> Self {
        Self {
            name: "shmem_list".to_string(),
            slot_size: 1024,
            number_of_slots: 2,
        }
    }
}

impl ListBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_slot_size(mut self, slot_size: u32) -> Self {
        self.slot_size = slot_size;
        self
    }

    pub fn with_slot_count(mut self, number_of_slots: u32) -> Self {
        self.number_of_slots = number_of_slots;
        self
    }

    /// Open the list as the producing side. Resets both ring offsets.
    pub fn build_producer(self) -> std::io::Result<Producer> {
        let list = RingBuffer::open(
            &self.name,
            Role::Source,
            self.slot_size,
            self.number_of_slots,
            None,
        )?;
        Ok(Producer::new(list))
    }

    /// Open the list as the consuming side. Leaves the ring state untouched.
    pub fn build_consumer(self) -> std::io::Result<Consumer> {
        let list = RingBuffer::open(
            &self.name,
            Role::Sink,
            self.slot_size,
            self.number_of_slots,
            None,
        )?;
        Ok(Consumer::new(list))
    }
}
