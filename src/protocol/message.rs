//! Logical message model shared by both peers.
//!
//! Every unit that travels between the phone and the mailbox is one of the
//! `Message` variants below, wrapped in an [`Envelope`](crate::core::envelope)
//! before it hits the chunk transport. The discriminant travels explicitly in
//! both wire formats (serde's externally-tagged representation), so an
//! unrecognized shape is a decode error rather than a fault.

use serde::{Deserialize, Serialize};

/// Lock actuator commands a phone can issue once authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Lock,
    Unlock,
}

/// Reported state of the mailbox latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockState {
    Locking,
    Locked,
    Unlocking,
    Unlocked,
    Error,
}

/// Wire-level error reports. These travel as ordinary messages so a decode
/// or decryption failure on one side is visible to the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Payload matched neither envelope format.
    DecodeError,
    /// Well-formed message with no applicable handler.
    UnknownCommand,
    /// Sealed envelope could not be opened.
    CantDecrypt,
}

/// The closed set of logical messages.
///
/// `public_key` fields carry raw 32-byte sealed-box public keys; they are kept
/// as plain byte vectors at this layer so the message model stays independent
/// of the crypto primitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// Key-exchange opener: "here is my public key, remember me as user_id".
    SendPublicKey { public_key: Vec<u8>, user_id: String },
    /// Identity claim from a previously registered phone.
    PhoneId { id: String },
    /// Responder's verdict on a `PhoneId` claim.
    ConnectionStatus { ok: bool },
    /// Lock actuator command.
    Command { op: Command },
    /// Lock actuator status report.
    LockStatus { state: LockState },
    /// Wire-level error report.
    Error { kind: ErrorKind },
}

impl Message {
    /// Short variant name used in tracing spans and status reports.
    pub fn opcode(&self) -> &'static str {
        match self {
            Message::SendPublicKey { .. } => "SEND_PUBLIC_KEY",
            Message::PhoneId { .. } => "PHONE_ID",
            Message::ConnectionStatus { .. } => "CONNECTION_STATUS",
            Message::Command { .. } => "COMMAND",
            Message::LockStatus { .. } => "LOCK_STATUS",
            Message::Error { .. } => "ERROR",
        }
    }
}
