//! # Error Types
//!
//! Comprehensive error handling for the mailbox protocol.
//!
//! This module defines all error variants that can occur during protocol
//! operations, from envelope parsing failures to transport-level conditions.
//!
//! ## Error Categories
//! - **Codec Errors**: bytes that match neither envelope format, sealed
//!   envelopes that fail authentication, encode attempts without keys
//! - **Transport Errors**: a send already in progress, a channel that has
//!   gone away, a reassembled message that exceeds the configured limit
//! - **Configuration Errors**: invalid TOML or out-of-range settings
//!
//! Decode-time failures are deliberately *not* propagated as `Err` to the
//! protocol layer: the envelope codec converts them into the wire-level
//! `Message::Error` variant so a malformed or undecryptable payload never
//! stalls the connection. The variants here are what the two decode stages
//! and the local call sites report.

use thiserror::Error;

/// Primary error type for all protocol operations.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Bytes parse as neither the primary nor the secondary envelope format.
    #[error("decode error: bytes match neither envelope format")]
    DecodeError,

    /// A sealed envelope failed to open: wrong or missing keys, or the
    /// ciphertext was tampered with.
    #[error("cannot decrypt sealed envelope")]
    CantDecrypt,

    /// A sealed encode was attempted without both required keys.
    #[error("seal error: {0}")]
    SealError(String),

    /// A public key had the wrong length for the sealed-box primitive.
    #[error("invalid public key length: {0} bytes")]
    InvalidPublicKey(usize),

    /// A send was attempted while another send is in progress on the
    /// same connection.
    #[error("send already in progress")]
    Busy,

    /// The channel is no longer usable.
    #[error("channel disconnected")]
    Disconnected,

    /// A reassembled inbound message exceeded the configured maximum size.
    #[error("inbound message too large: {0} bytes")]
    OversizedMessage(usize),

    /// Serialization of an outbound envelope failed.
    #[error("serialize error: {0}")]
    SerializeError(String),

    /// Configuration file or value problem.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
