//! In-process channel pair with real backpressure.
//!
//! Two [`MemoryChannel`] halves connected by bounded queues. A full queue
//! refuses the write, exactly like a radio that is out of transmit credits,
//! so the chunk transport's suspend/resume path is exercised for real.
//! Used by the integration tests and any host that wants to run two peers
//! in one process.

use crate::error::{ProtocolError, Result};
use crate::transport::channel::Channel;
use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};

/// One write-side half of an in-process link.
pub struct MemoryChannel {
    tx: Sender<Vec<u8>>,
    mtu: usize,
}

impl Channel for MemoryChannel {
    fn write(&mut self, chunk: &[u8]) -> Result<bool> {
        match self.tx.try_send(chunk.to_vec()) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(_)) => Ok(false),
            Err(TrySendError::Closed(_)) => Err(ProtocolError::Disconnected),
        }
    }

    fn max_payload_size(&self) -> usize {
        self.mtu
    }
}

/// Build a connected pair of channels.
///
/// Each direction buffers at most `capacity` writes before refusing; the
/// receivers deliver chunks in order. Dropping a receiver disconnects the
/// peer's write half.
pub fn pair(
    mtu: usize,
    capacity: usize,
) -> ((MemoryChannel, Receiver<Vec<u8>>), (MemoryChannel, Receiver<Vec<u8>>)) {
    let (a_tx, b_rx) = mpsc::channel(capacity);
    let (b_tx, a_rx) = mpsc::channel(capacity);
    (
        (MemoryChannel { tx: a_tx, mtu }, a_rx),
        (MemoryChannel { tx: b_tx, mtu }, b_rx),
    )
}
