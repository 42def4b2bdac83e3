#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! End-to-end two-peer flows: registration, authentication, lock cycle,
//! reconnect and backpressure, everything running over the in-process
//! transport with real flow control.

use mailbox_protocol::service::{Connection, ConnectionEvents};
use mailbox_protocol::store::{KeyStore, MemoryKeyStore};
use mailbox_protocol::transport::mem::{self, MemoryChannel};
use mailbox_protocol::utils::crypto::KeyPair;
use mailbox_protocol::{Command, LockState, Message, ProtocolError, SessionState};
use tokio::sync::mpsc::Receiver;

const MAX_MESSAGE_SIZE: usize = 64 * 1024;

#[derive(Default)]
struct Recorder {
    messages: Vec<Message>,
    statuses: Vec<String>,
}

impl ConnectionEvents for Recorder {
    fn on_message(&mut self, message: &Message) {
        self.messages.push(message.clone());
    }

    fn on_status(&mut self, status: &str) {
        self.statuses.push(status.to_string());
    }
}

struct Link {
    phone_chan: MemoryChannel,
    phone_rx: Receiver<Vec<u8>>,
    mailbox_chan: MemoryChannel,
    mailbox_rx: Receiver<Vec<u8>>,
}

fn link(mtu: usize, capacity: usize) -> Link {
    let ((phone_chan, phone_rx), (mailbox_chan, mailbox_rx)) = mem::pair(mtu, capacity);
    Link {
        phone_chan,
        phone_rx,
        mailbox_chan,
        mailbox_rx,
    }
}

/// Shuttle chunks between the two peers until both are idle. Each drained
/// queue is followed by a readiness signal to the other side, mirroring how
/// the radio grants transmit credits.
fn pump(phone: &mut Connection<Recorder>, mailbox: &mut Connection<Recorder>, l: &mut Link) {
    for _ in 0..100_000 {
        while let Ok(chunk) = l.mailbox_rx.try_recv() {
            mailbox.on_data_received(&chunk, &mut l.mailbox_chan).unwrap();
        }
        phone.on_ready_to_send(&mut l.phone_chan).unwrap();

        while let Ok(chunk) = l.phone_rx.try_recv() {
            phone.on_data_received(&chunk, &mut l.phone_chan).unwrap();
        }
        mailbox.on_ready_to_send(&mut l.mailbox_chan).unwrap();

        if !phone.is_sending()
            && !mailbox.is_sending()
            && l.phone_rx.is_empty()
            && l.mailbox_rx.is_empty()
        {
            return;
        }
    }
    panic!("pump did not settle");
}

fn pair_of_peers() -> (Connection<Recorder>, Connection<Recorder>) {
    let phone = Connection::initiator(
        MAX_MESSAGE_SIZE,
        Box::new(MemoryKeyStore::new()),
        Recorder::default(),
    );
    let mailbox = Connection::responder(
        MAX_MESSAGE_SIZE,
        Box::new(MemoryKeyStore::new()),
        Recorder::default(),
    );
    (phone, mailbox)
}

#[test]
fn test_registration_handshake_then_lock_cycle() {
    let (mut phone, mut mailbox) = pair_of_peers();
    let mut l = link(20, 4);

    phone.on_channel_ready(&mut l.phone_chan).unwrap();
    pump(&mut phone, &mut mailbox, &mut l);

    assert!(phone.is_authenticated(), "phone must be authenticated");
    assert!(mailbox.is_authenticated(), "mailbox must be authenticated");

    // Handshake traffic as seen by the mailbox: key exchange then identity.
    assert!(matches!(
        mailbox.events().messages[0],
        Message::SendPublicKey { .. }
    ));
    assert!(matches!(mailbox.events().messages[1], Message::PhoneId { .. }));
    // And by the phone: the mailbox key, then the positive verdict.
    assert!(matches!(
        phone.events().messages[0],
        Message::SendPublicKey { .. }
    ));
    assert_eq!(
        phone.events().messages[1],
        Message::ConnectionStatus { ok: true }
    );

    // Lock: travels sealed now, executed unconditionally.
    phone
        .send(&Message::Command { op: Command::Lock }, &mut l.phone_chan)
        .unwrap();
    pump(&mut phone, &mut mailbox, &mut l);

    assert!(mailbox.is_locked());
    assert_eq!(
        phone.events().messages.last().unwrap(),
        &Message::LockStatus {
            state: LockState::Locked
        }
    );

    phone
        .send(
            &Message::Command {
                op: Command::Unlock,
            },
            &mut l.phone_chan,
        )
        .unwrap();
    pump(&mut phone, &mut mailbox, &mut l);

    assert!(!mailbox.is_locked());
    assert_eq!(
        phone.events().messages.last().unwrap(),
        &Message::LockStatus {
            state: LockState::Unlocked
        }
    );
}

#[test]
fn test_unknown_phone_is_rejected_then_recovers_by_registering() {
    // The phone remembers a registration the mailbox has never seen.
    let mut phone_store = MemoryKeyStore::new();
    phone_store.save_local_keypair(&KeyPair::generate());
    phone_store.save_registered_user_id("alice");
    phone_store.put("alice", &KeyPair::generate().public_bytes());

    let mut phone = Connection::initiator(
        MAX_MESSAGE_SIZE,
        Box::new(phone_store),
        Recorder::default(),
    );
    let mut mailbox = Connection::responder(
        MAX_MESSAGE_SIZE,
        Box::new(MemoryKeyStore::new()),
        Recorder::default(),
    );
    let mut l = link(20, 4);

    phone.on_channel_ready(&mut l.phone_chan).unwrap();
    pump(&mut phone, &mut mailbox, &mut l);

    assert_eq!(
        phone.events().messages.last().unwrap(),
        &Message::ConnectionStatus { ok: false }
    );
    assert_eq!(phone.state(), SessionState::Unauthenticated);
    assert!(!mailbox.is_authenticated());

    // Explicit re-registration runs the full key exchange and succeeds.
    phone.register(&mut l.phone_chan).unwrap();
    pump(&mut phone, &mut mailbox, &mut l);

    assert!(phone.is_authenticated());
    assert!(mailbox.is_authenticated());
}

#[test]
fn test_reconnect_resumes_without_key_exchange() {
    let (mut phone, mut mailbox) = pair_of_peers();
    let mut l = link(20, 4);

    phone.on_channel_ready(&mut l.phone_chan).unwrap();
    pump(&mut phone, &mut mailbox, &mut l);
    assert!(phone.is_authenticated());

    // Connection drops: all session trust is gone, persistence is not.
    phone.on_disconnect();
    mailbox.on_disconnect();
    assert_eq!(phone.state(), SessionState::Unauthenticated);
    assert_eq!(mailbox.state(), SessionState::Unauthenticated);
    assert!(!phone.is_sending());

    // Fresh channel, same stores: the phone leads with its identity claim
    // and no SendPublicKey is exchanged this time.
    let mut l = link(20, 4);
    let mailbox_seen_before = mailbox.events().messages.len();

    phone.on_channel_ready(&mut l.phone_chan).unwrap();
    pump(&mut phone, &mut mailbox, &mut l);

    assert!(phone.is_authenticated());
    assert!(mailbox.is_authenticated());
    let resumed = &mailbox.events().messages[mailbox_seen_before..];
    assert!(matches!(resumed[0], Message::PhoneId { .. }));
    assert!(!resumed
        .iter()
        .any(|m| matches!(m, Message::SendPublicKey { .. })));
}

#[test]
fn test_tiny_mtu_and_capacity_still_deliver() {
    // MTU barely above the sentinel and a single transmit credit: every
    // message suspends repeatedly and must resume without loss.
    let (mut phone, mut mailbox) = pair_of_peers();
    let mut l = link(4, 1);

    phone.on_channel_ready(&mut l.phone_chan).unwrap();
    pump(&mut phone, &mut mailbox, &mut l);

    assert!(phone.is_authenticated());
    assert!(mailbox.is_authenticated());

    phone
        .send(&Message::Command { op: Command::Lock }, &mut l.phone_chan)
        .unwrap();
    pump(&mut phone, &mut mailbox, &mut l);
    assert!(mailbox.is_locked());
}

#[test]
fn test_send_while_sending_is_busy() {
    let (mut phone, _mailbox) = pair_of_peers();
    // One credit: the opening message cannot finish.
    let mut l = link(20, 1);

    phone.on_channel_ready(&mut l.phone_chan).unwrap();
    assert!(phone.is_sending());

    let result = phone.send(&Message::PhoneId { id: "x".into() }, &mut l.phone_chan);
    assert!(matches!(result, Err(ProtocolError::Busy)));
}

#[test]
fn test_disconnect_discards_partial_send() {
    let (mut phone, _mailbox) = pair_of_peers();
    let mut l = link(20, 1);

    phone.on_channel_ready(&mut l.phone_chan).unwrap();
    assert!(phone.is_sending());

    phone.on_disconnect();
    assert!(!phone.is_sending());
    assert_eq!(phone.state(), SessionState::Unauthenticated);
    assert!(phone
        .events()
        .statuses
        .iter()
        .any(|status| status == "disconnected"));
}
