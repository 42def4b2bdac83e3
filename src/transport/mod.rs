//! Channel boundary and in-process transport implementations.

pub mod channel;
pub mod mem;

pub use channel::Channel;
