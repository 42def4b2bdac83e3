//! # Envelope Codec
//!
//! Converts between a [`Message`] and the bytes that travel over the chunk
//! transport, in either unencrypted or sealed form.
//!
//! ## Wire Formats
//! - **Plain**: the envelope is serialized with the primary, self-describing
//!   format (JSON). Used during key exchange, when no peer key exists yet.
//! - **Sealed**: the message alone is serialized with the secondary format
//!   (bincode), sealed with the sealed-box primitive, and the resulting
//!   `{mode, ciphertext}` envelope is itself bincode-encoded.
//!
//! ## Format Detection
//! The mode is chosen by the caller at encode time and *inferred* at decode
//! time: first a primary-format parse, then a secondary-format parse. The two
//! stages are exposed separately ([`try_plain`], [`try_sealed`]) so failure
//! causes stay distinguishable; [`decode`] folds every failure into a wire
//! `Message::Error`, preserving protocol liveness: a garbled payload must
//! never kill the connection.

use crate::error::{ProtocolError, Result};
use crate::protocol::message::{ErrorKind, Message};
use crate::utils::crypto;
use crypto_box::{PublicKey, SecretKey};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Encryption mode of an envelope, chosen by the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireMode {
    /// No encryption. Only acceptable before key exchange completes.
    Plain,
    /// Sealed-box authenticated encryption.
    Sealed,
}

/// What actually travels over the chunk transport.
#[derive(Debug, Serialize, Deserialize)]
enum Envelope {
    Plain { body: Message },
    Sealed { ciphertext: Vec<u8> },
}

/// Encode a message for transmission.
///
/// # Errors
/// - `ProtocolError::SealError` if `mode` is `Sealed` and either key is absent
/// - `ProtocolError::SerializeError` if serialization fails
pub fn encode(
    message: &Message,
    mode: WireMode,
    local_secret: Option<&SecretKey>,
    peer_public: Option<&PublicKey>,
) -> Result<Vec<u8>> {
    match mode {
        WireMode::Plain => serde_json::to_vec(&Envelope::Plain {
            body: message.clone(),
        })
        .map_err(|e| ProtocolError::SerializeError(e.to_string())),
        WireMode::Sealed => {
            let (secret, public) = match (local_secret, peer_public) {
                (Some(s), Some(p)) => (s, p),
                _ => {
                    return Err(ProtocolError::SealError(
                        "sealed encode requires local secret key and peer public key".into(),
                    ))
                }
            };

            let body = bincode::serialize(message)
                .map_err(|e| ProtocolError::SerializeError(e.to_string()))?;
            let ciphertext = crypto::seal(&body, public, secret)?;

            bincode::serialize(&Envelope::Sealed { ciphertext })
                .map_err(|e| ProtocolError::SerializeError(e.to_string()))
        }
    }
}

/// Stage one of decoding: parse `bytes` as a primary-format plain envelope.
///
/// # Errors
/// Returns `ProtocolError::DecodeError` if the bytes are not a primary-format
/// envelope carrying a plain body.
pub fn try_plain(bytes: &[u8]) -> Result<Message> {
    match serde_json::from_slice::<Envelope>(bytes) {
        Ok(Envelope::Plain { body }) => Ok(body),
        // A primary-format sealed envelope is never produced by `encode`;
        // treat it the same as a parse failure so stage two gets its turn.
        Ok(Envelope::Sealed { .. }) | Err(_) => Err(ProtocolError::DecodeError),
    }
}

/// Stage two of decoding: parse `bytes` as a secondary-format envelope and
/// open the ciphertext if it is sealed.
///
/// # Errors
/// - `ProtocolError::CantDecrypt` if keys are absent or opening fails
/// - `ProtocolError::DecodeError` if the bytes are not a secondary-format
///   envelope, or the opened plaintext is not a secondary-format message
pub fn try_sealed(
    bytes: &[u8],
    local_secret: Option<&SecretKey>,
    peer_public: Option<&PublicKey>,
) -> Result<Message> {
    match bincode::deserialize::<Envelope>(bytes) {
        Ok(Envelope::Sealed { ciphertext }) => {
            let (secret, public) = match (local_secret, peer_public) {
                (Some(s), Some(p)) => (s, p),
                _ => return Err(ProtocolError::CantDecrypt),
            };

            let opened = crypto::open(&ciphertext, public, secret)?;
            bincode::deserialize::<Message>(&opened).map_err(|_| ProtocolError::DecodeError)
        }
        Ok(Envelope::Plain { body }) => Ok(body),
        Err(_) => Err(ProtocolError::DecodeError),
    }
}

/// Decode a complete reassembled payload into a message.
///
/// Never fails: every failure path resolves to a `Message::Error` variant,
/// which the caller treats like any other inbound message.
pub fn decode(
    bytes: &[u8],
    local_secret: Option<&SecretKey>,
    peer_public: Option<&PublicKey>,
) -> Message {
    // Primary format first, for wire compatibility. Sealed envelopes are
    // binary and never parse as JSON, so the order cannot misclassify them.
    if let Ok(message) = try_plain(bytes) {
        return message;
    }

    match try_sealed(bytes, local_secret, peer_public) {
        Ok(message) => message,
        Err(ProtocolError::CantDecrypt) => {
            debug!(len = bytes.len(), "sealed envelope failed to open");
            Message::Error {
                kind: ErrorKind::CantDecrypt,
            }
        }
        Err(_) => {
            debug!(len = bytes.len(), "payload matched neither envelope format");
            Message::Error {
                kind: ErrorKind::DecodeError,
            }
        }
    }
}
