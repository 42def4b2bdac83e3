//! Maps an authenticated inbound message to the lock actuator response.

use crate::protocol::message::{Command, ErrorKind, LockState, Message};
use tracing::debug;

/// Route one application message against the current latch state.
///
/// Pure function: `(locked, message) -> (new_locked, optional reply)`.
/// Commands are idempotent: `Lock` always reports `Locked` regardless of
/// prior state. A message with no applicable handler earns an
/// `UnknownCommand` reply; nothing here ever panics or terminates.
pub fn route(locked: bool, message: &Message) -> (bool, Option<Message>) {
    match message {
        Message::Command { op: Command::Lock } => {
            debug!("lock command");
            (
                true,
                Some(Message::LockStatus {
                    state: LockState::Locked,
                }),
            )
        }
        Message::Command {
            op: Command::Unlock,
        } => {
            debug!("unlock command");
            (
                false,
                Some(Message::LockStatus {
                    state: LockState::Unlocked,
                }),
            )
        }
        other => {
            debug!(opcode = other.opcode(), "no handler for message");
            (
                locked,
                Some(Message::Error {
                    kind: ErrorKind::UnknownCommand,
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_is_idempotent() {
        for prior in [false, true] {
            let (locked, reply) = route(prior, &Message::Command { op: Command::Lock });
            assert!(locked);
            assert_eq!(
                reply,
                Some(Message::LockStatus {
                    state: LockState::Locked
                })
            );
        }
    }

    #[test]
    fn test_unlock_is_idempotent() {
        for prior in [false, true] {
            let (locked, reply) = route(
                prior,
                &Message::Command {
                    op: Command::Unlock,
                },
            );
            assert!(!locked);
            assert_eq!(
                reply,
                Some(Message::LockStatus {
                    state: LockState::Unlocked
                })
            );
        }
    }

    #[test]
    fn test_unhandled_message_is_unknown_command() {
        let (locked, reply) = route(true, &Message::ConnectionStatus { ok: true });
        assert!(locked, "latch state must not change");
        assert_eq!(
            reply,
            Some(Message::Error {
                kind: ErrorKind::UnknownCommand
            })
        );
    }

    #[test]
    fn test_inbound_error_report_earns_unknown_command() {
        // A peer reporting a decode failure is itself unroutable here and
        // gets the same catch-all reply.
        let (_, reply) = route(
            false,
            &Message::Error {
                kind: ErrorKind::DecodeError,
            },
        );
        assert_eq!(
            reply,
            Some(Message::Error {
                kind: ErrorKind::UnknownCommand
            })
        );
    }
}
