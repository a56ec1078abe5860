mod builder;
mod consumer;
mod producer;

pub use builder::ListBuilder;
pub use consumer::Consumer;
pub use producer::Producer;

pub mod Buffer {
    pub mod Buffer;
    pub mod Buffer_impl;
    pub mod layout;
    pub use Buffer::{RingBuffer, Role}; // re-export for stable path
}
