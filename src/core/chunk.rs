//! # Chunk Transport
//!
//! Moves an opaque byte buffer across a channel that only accepts writes up
//! to a negotiated maximum size, preserving order and signaling completion.
//!
//! ## Wire Format
//! ```text
//! [data chunk ≤ MTU] ... [data chunk ≤ MTU] [EOM]
//! ```
//! A logical message is zero or more data chunks followed by exactly one
//! 3-byte end-of-message sentinel. The sentinel is recognized by exact byte
//! equality: a data chunk whose payload happens to equal `EOM` is
//! indistinguishable from the end marker. The framing has no escape
//! sequence; callers live with that constraint.
//!
//! ## Flow Control
//! Sending is cooperative: each refused write suspends progress exactly where
//! it stopped, and the next readiness signal resumes the same chunk. The
//! cursor only ever advances on an accepted write, so nothing is skipped or
//! duplicated across suspensions.

use crate::error::{ProtocolError, Result};
use crate::transport::channel::Channel;
use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

/// Fixed end-of-message sentinel (ASCII "EOM").
pub const EOM: [u8; 3] = *b"EOM";

/// Outbound half: fragments one buffer at a time across the channel.
#[derive(Debug, Default)]
pub struct ChunkSender {
    outbound: Bytes,
    cursor: usize,
    sending: bool,
    sending_eom: bool,
}

impl ChunkSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a logical message (or its sentinel) is still in flight.
    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// Stage a buffer for transmission.
    ///
    /// # Errors
    /// Returns `ProtocolError::Busy` if a send is already in progress;
    /// exactly one logical message may be in flight per direction.
    pub fn begin_send(&mut self, buffer: Bytes) -> Result<()> {
        if self.sending {
            return Err(ProtocolError::Busy);
        }
        debug!(len = buffer.len(), "staging outbound message");
        self.outbound = buffer;
        self.cursor = 0;
        self.sending = true;
        self.sending_eom = false;
        Ok(())
    }

    /// Push as much of the staged buffer as the channel will take.
    ///
    /// Called when the channel signals it can accept another write, and once
    /// immediately after `begin_send` for the first write. Returns with work
    /// remaining if the channel refuses a write; the next call resumes from
    /// the same position.
    ///
    /// # Errors
    /// Returns `ProtocolError::Disconnected` if the channel fails outright.
    pub fn on_ready_to_send(&mut self, channel: &mut dyn Channel) -> Result<()> {
        while self.sending {
            if self.sending_eom {
                if !channel.write(&EOM)? {
                    return Ok(());
                }
                trace!("sent EOM");
                self.reset();
                return Ok(());
            }

            if self.cursor >= self.outbound.len() {
                self.sending_eom = true;
                continue;
            }

            let mtu = channel.max_payload_size().max(1);
            let remaining = self.outbound.len() - self.cursor;
            let take = remaining.min(mtu);
            let chunk = &self.outbound[self.cursor..self.cursor + take];

            if !channel.write(chunk)? {
                // Refused: hold position, wait for the next readiness signal.
                return Ok(());
            }
            trace!(sent = take, cursor = self.cursor + take, "sent chunk");
            self.cursor += take;
        }
        Ok(())
    }

    /// Discard any in-flight send. Used on disconnect and write failure.
    pub fn reset(&mut self) {
        self.outbound = Bytes::new();
        self.cursor = 0;
        self.sending = false;
        self.sending_eom = false;
    }
}

/// Inbound half: accumulates chunks until the sentinel arrives.
#[derive(Debug)]
pub struct Reassembler {
    buffer: BytesMut,
    max_message_size: usize,
}

impl Reassembler {
    /// `max_message_size` bounds the reassembly buffer so a peer cannot
    /// stream data chunks forever without ever sending the sentinel.
    pub fn new(max_message_size: usize) -> Self {
        Self {
            buffer: BytesMut::new(),
            max_message_size,
        }
    }

    /// Feed one inbound chunk. Returns the completed buffer when the chunk
    /// is the sentinel; the internal buffer is cleared in the same step.
    ///
    /// # Errors
    /// Returns `ProtocolError::OversizedMessage` and discards the partial
    /// buffer if the accumulated size would exceed the limit.
    pub fn receive(&mut self, chunk: &[u8]) -> Result<Option<Bytes>> {
        if chunk == EOM {
            let complete = self.buffer.split().freeze();
            debug!(len = complete.len(), "inbound message complete");
            return Ok(Some(complete));
        }

        if self.buffer.len() + chunk.len() > self.max_message_size {
            let total = self.buffer.len() + chunk.len();
            self.clear();
            return Err(ProtocolError::OversizedMessage(total));
        }

        self.buffer.extend_from_slice(chunk);
        Ok(None)
    }

    /// Drop any partially reassembled message.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    #[cfg(test)]
    fn pending(&self) -> usize {
        self.buffer.len()
    }
}
