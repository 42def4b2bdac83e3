//! Identity and public-key exchange between the two peers.
//!
//! One state machine instance per connection, reset on disconnect. The
//! initiator is the discovering party (the phone); the responder is the
//! discovered one (the mailbox). Key exchange runs in the clear, since no
//! peer key exists yet, and ends with the responder vouching for the claimed
//! identity via `ConnectionStatus`. Only after that do application messages
//! switch to sealed envelopes.
//!
//! ```text
//! Unauthenticated -> KeyExchangePending -> KeyExchanged -> Authenticated
//! ```

use crate::core::envelope::WireMode;
use crate::protocol::message::Message;
use crate::store::KeyStore;
use crate::utils::crypto::{self, KeyPair};
use crypto_box::PublicKey;
use tracing::{debug, info, warn};

/// Authentication progress of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    KeyExchangePending,
    KeyExchanged,
    Authenticated,
}

/// Phone-side handshake: registers or resumes, then claims its identity.
#[derive(Debug)]
pub struct InitiatorHandshake {
    state: SessionState,
    keypair: Option<KeyPair>,
    user_id: Option<String>,
    peer_public: Option<PublicKey>,
}

impl InitiatorHandshake {
    pub fn new() -> Self {
        Self {
            state: SessionState::Unauthenticated,
            keypair: None,
            user_id: None,
            peer_public: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    pub fn keypair(&self) -> Option<&KeyPair> {
        self.keypair.as_ref()
    }

    pub fn peer_public(&self) -> Option<&PublicKey> {
        self.peer_public.as_ref()
    }

    /// First move once the channel is usable.
    ///
    /// A device that has registered before resumes with a `PhoneId` claim;
    /// a fresh device registers by sending its public key. Either way the
    /// opener travels in the clear.
    pub fn start(&mut self, store: &mut dyn KeyStore) -> (Message, WireMode) {
        let resumed = match (store.local_keypair(), store.registered_user_id()) {
            (Some(keypair), Some(user_id)) => store
                .get(&user_id)
                .and_then(|bytes| crypto::public_key_from_bytes(&bytes).ok())
                .map(|peer| (keypair, user_id, peer)),
            _ => None,
        };

        match resumed {
            Some((keypair, user_id, peer)) => {
                debug!(user_id = %user_id, "resuming previous registration");
                self.keypair = Some(keypair);
                self.peer_public = Some(peer);
                self.user_id = Some(user_id.clone());
                self.state = SessionState::KeyExchanged;
                (Message::PhoneId { id: user_id }, WireMode::Plain)
            }
            None => self.register(store),
        }
    }

    /// Explicit (re-)registration: a fresh key pair under a fresh user id.
    pub fn register(&mut self, store: &mut dyn KeyStore) -> (Message, WireMode) {
        let keypair = KeyPair::generate();
        let user_id = uuid::Uuid::new_v4().to_string();

        store.save_local_keypair(&keypair);
        store.save_registered_user_id(&user_id);
        info!(user_id = %user_id, "registering new identity");

        let message = Message::SendPublicKey {
            public_key: keypair.public_bytes(),
            user_id: user_id.clone(),
        };

        self.keypair = Some(keypair);
        self.user_id = Some(user_id);
        self.peer_public = None;
        self.state = SessionState::KeyExchangePending;
        (message, WireMode::Plain)
    }

    /// Process one inbound message; returns a reply when the protocol calls
    /// for one. Messages the handshake does not own return `None` and are
    /// left to the application layer.
    pub fn handle(
        &mut self,
        message: &Message,
        store: &mut dyn KeyStore,
    ) -> Option<(Message, WireMode)> {
        match message {
            Message::SendPublicKey { public_key, .. } => {
                let peer = match crypto::public_key_from_bytes(public_key) {
                    Ok(peer) => peer,
                    Err(e) => {
                        warn!(error = %e, "ignoring peer key with bad length");
                        return None;
                    }
                };

                let user_id = self.user_id.clone()?;
                // Remember the peer under our own registration record so a
                // reconnect can resume without a new key exchange.
                store.put(&user_id, public_key);
                self.peer_public = Some(peer);
                self.state = SessionState::KeyExchanged;
                debug!("peer public key stored, claiming identity");
                Some((Message::PhoneId { id: user_id }, WireMode::Plain))
            }
            Message::ConnectionStatus { ok } => {
                if *ok {
                    info!("authenticated by responder");
                    self.state = SessionState::Authenticated;
                } else {
                    warn!("responder rejected identity, re-registration required");
                    self.state = SessionState::Unauthenticated;
                }
                None
            }
            _ => None,
        }
    }

    /// Tear down per-connection trust. The persisted registration survives;
    /// only the live session state is discarded.
    pub fn reset(&mut self) {
        self.state = SessionState::Unauthenticated;
        self.peer_public = None;
    }
}

impl Default for InitiatorHandshake {
    fn default() -> Self {
        Self::new()
    }
}

/// Mailbox-side handshake: learns phones by key exchange, recognizes them
/// by identity claim.
#[derive(Debug)]
pub struct ResponderHandshake {
    state: SessionState,
    keypair: Option<KeyPair>,
    peer_public: Option<PublicKey>,
}

impl ResponderHandshake {
    pub fn new() -> Self {
        Self {
            state: SessionState::Unauthenticated,
            keypair: None,
            peer_public: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    pub fn keypair(&self) -> Option<&KeyPair> {
        self.keypair.as_ref()
    }

    pub fn peer_public(&self) -> Option<&PublicKey> {
        self.peer_public.as_ref()
    }

    /// Process one inbound message; returns a reply when the protocol calls
    /// for one.
    pub fn handle(
        &mut self,
        message: &Message,
        store: &mut dyn KeyStore,
    ) -> Option<(Message, WireMode)> {
        match message {
            Message::SendPublicKey {
                public_key,
                user_id,
            } => {
                let peer = match crypto::public_key_from_bytes(public_key) {
                    Ok(peer) => peer,
                    Err(e) => {
                        warn!(error = %e, "ignoring peer key with bad length");
                        return None;
                    }
                };

                // Load the identity generated at first registration; only
                // generate when none exists yet.
                let keypair = match store.local_keypair() {
                    Some(keypair) => keypair,
                    None => {
                        let keypair = KeyPair::generate();
                        store.save_local_keypair(&keypair);
                        keypair
                    }
                };

                store.put(user_id, public_key);
                info!(user_id = %user_id, "registered phone public key");

                let reply = Message::SendPublicKey {
                    public_key: keypair.public_bytes(),
                    // The responder has no user id of its own; the field
                    // travels empty in this direction.
                    user_id: String::new(),
                };

                self.keypair = Some(keypair);
                self.peer_public = Some(peer);
                self.state = SessionState::KeyExchanged;
                Some((reply, WireMode::Plain))
            }
            Message::PhoneId { id } => match store.get(id) {
                Some(bytes) => match crypto::public_key_from_bytes(&bytes) {
                    Ok(peer) => {
                        info!(user_id = %id, "recognized phone, authenticated");
                        self.keypair = self.keypair.take().or_else(|| store.local_keypair());
                        self.peer_public = Some(peer);
                        self.state = SessionState::Authenticated;
                        Some((Message::ConnectionStatus { ok: true }, WireMode::Plain))
                    }
                    Err(e) => {
                        warn!(user_id = %id, error = %e, "stored peer key unusable");
                        Some((Message::ConnectionStatus { ok: false }, WireMode::Plain))
                    }
                },
                None => {
                    warn!(user_id = %id, "unknown phone id");
                    Some((Message::ConnectionStatus { ok: false }, WireMode::Plain))
                }
            },
            _ => None,
        }
    }

    /// Discard per-connection trust on disconnect.
    pub fn reset(&mut self) {
        self.state = SessionState::Unauthenticated;
        self.peer_public = None;
    }
}

impl Default for ResponderHandshake {
    fn default() -> Self {
        Self::new()
    }
}
