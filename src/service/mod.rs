//! Connection-level service layer tying the core and protocol together.

pub mod connection;

pub use connection::{Connection, ConnectionEvents};
