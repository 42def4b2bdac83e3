//! # Mailbox Protocol
//!
//! Secure pairing and messaging core for two devices connected over a
//! notification/write characteristic that only carries small, MTU-bounded
//! payloads.
//!
//! ## Features
//! - **Chunk transport**: fragmentation and reassembly of arbitrarily large
//!   logical messages with an end-of-message sentinel and cooperative flow
//!   control
//! - **Envelope codec**: dual-format encoding (self-describing JSON or
//!   sealed bincode) with format inference on decode; decode failures become
//!   wire-level error messages, never faults
//! - **Sealed boxes**: asymmetric authenticated encryption between the two
//!   peers (X25519 + XSalsa20-Poly1305, nonce-prefixed)
//! - **Session handshake**: identity registration, public-key exchange and
//!   per-connection authentication state
//! - **Command routing**: lock/unlock commands mapped to status replies
//!
//! ## Architecture
//! ```text
//! application
//!      │  Message
//! ┌────▼─────────┐   envelope codec (plain JSON / sealed bincode)
//! │  Connection  │   handshake + command router
//! └────▼─────────┘   chunk transport (≤ MTU chunks + "EOM")
//!      │  writes / notifications
//!   Channel (platform characteristic)
//! ```
//!
//! The platform layer owns discovery, connection establishment and the
//! characteristic itself; it feeds [`service::Connection`] through three
//! callbacks (`on_channel_ready`, `on_ready_to_send`, `on_data_received`)
//! and receives decoded traffic through [`service::ConnectionEvents`].

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod service;
pub mod store;
pub mod transport;
pub mod utils;

pub use crate::config::ProtocolConfig;
pub use crate::core::chunk::EOM;
pub use crate::core::envelope::WireMode;
pub use crate::error::{ProtocolError, Result};
pub use crate::protocol::handshake::SessionState;
pub use crate::protocol::message::{Command, ErrorKind, LockState, Message};
pub use crate::service::{Connection, ConnectionEvents};
pub use crate::store::{KeyStore, MemoryKeyStore};
pub use crate::utils::crypto::KeyPair;
