//! # Core Wire Components
//!
//! Low-level chunk framing and envelope encoding.
//!
//! This module provides the foundation of the protocol: fragmentation and
//! reassembly over an MTU-bounded channel, and the dual-format envelope
//! codec that carries messages in the clear or sealed.
//!
//! ## Wire Format
//! ```text
//! [data chunk ≤ MTU] ... [data chunk ≤ MTU] ["EOM"]
//! ```
//! where the reassembled payload is either a JSON plain envelope or a
//! bincode sealed envelope.

pub mod chunk;
pub mod envelope;
