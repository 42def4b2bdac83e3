//! Boundary traits for the platform channel underneath the protocol.
//!
//! The protocol core never touches the radio. The surrounding platform layer
//! owns discovery, connection and the characteristic itself, and exposes it
//! here as a write surface with flow control. Inbound traffic arrives through
//! the connection's callback methods, mirroring how the characteristic
//! notifies.

use crate::error::Result;

/// A connected notification/write characteristic.
///
/// `write` submits one unit (a data chunk or the end-of-message sentinel).
/// `Ok(true)` means the channel accepted the write; `Ok(false)` is a
/// flow-control refusal: the caller must hold position and retry the same
/// unit after the channel signals readiness again. `Err(Disconnected)` means
/// the channel is gone for good.
pub trait Channel {
    /// Submit one write. Never splits or merges units.
    ///
    /// # Errors
    /// Returns `ProtocolError::Disconnected` if the channel is unusable.
    fn write(&mut self, chunk: &[u8]) -> Result<bool>;

    /// Negotiated maximum bytes per write, fixed for the life of the
    /// connection.
    fn max_payload_size(&self) -> usize;
}
