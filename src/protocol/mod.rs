//! Protocol state machines: the message model, the trust-establishing
//! handshake, and the command router.

pub mod handshake;
pub mod message;
pub mod router;
