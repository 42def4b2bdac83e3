//! Per-connection orchestration of transport, codec, handshake and routing.
//!
//! One [`Connection`] exists per live channel, constructed when the channel
//! becomes usable and torn down on disconnect. It owns every piece of
//! connection state (chunk sender, reassembler, role state machine, key
//! store handle), so nothing is shared across connections and event handling
//! within one connection is strictly sequential.

use crate::core::chunk::{ChunkSender, Reassembler};
use crate::core::envelope::{self, WireMode};
use crate::error::Result;
use crate::protocol::handshake::{InitiatorHandshake, ResponderHandshake, SessionState};
use crate::protocol::message::Message;
use crate::protocol::router;
use crate::store::KeyStore;
use crate::transport::channel::Channel;
use bytes::Bytes;
use crypto_box::{PublicKey, SecretKey};
use tracing::{debug, instrument, warn};

/// Upward event sink: what the application observes.
///
/// `on_message` fires for every decoded inbound message, including the
/// `Error` variants produced by decode failures. `on_status` carries
/// human-readable progress reports.
pub trait ConnectionEvents {
    fn on_message(&mut self, message: &Message);
    fn on_status(&mut self, status: &str);
}

/// Which side of the pairing this connection plays.
enum RoleState {
    Initiator(InitiatorHandshake),
    Responder(ResponderHandshake),
}

impl RoleState {
    fn local_secret(&self) -> Option<&SecretKey> {
        match self {
            RoleState::Initiator(h) => h.keypair().map(|k| k.secret()),
            RoleState::Responder(h) => h.keypair().map(|k| k.secret()),
        }
    }

    fn peer_public(&self) -> Option<&PublicKey> {
        match self {
            RoleState::Initiator(h) => h.peer_public(),
            RoleState::Responder(h) => h.peer_public(),
        }
    }

    fn state(&self) -> SessionState {
        match self {
            RoleState::Initiator(h) => h.state(),
            RoleState::Responder(h) => h.state(),
        }
    }

    fn reset(&mut self) {
        match self {
            RoleState::Initiator(h) => h.reset(),
            RoleState::Responder(h) => h.reset(),
        }
    }
}

/// One live pairing over one channel.
pub struct Connection<E: ConnectionEvents> {
    role: RoleState,
    sender: ChunkSender,
    reassembler: Reassembler,
    store: Box<dyn KeyStore>,
    events: E,
    locked: bool,
}

impl<E: ConnectionEvents> Connection<E> {
    /// Phone side: initiates registration or resume once the channel is up.
    pub fn initiator(max_message_size: usize, store: Box<dyn KeyStore>, events: E) -> Self {
        Self {
            role: RoleState::Initiator(InitiatorHandshake::new()),
            sender: ChunkSender::new(),
            reassembler: Reassembler::new(max_message_size),
            store,
            events,
            locked: false,
        }
    }

    /// Mailbox side: waits to be discovered, answers the handshake, routes
    /// commands to the latch.
    pub fn responder(max_message_size: usize, store: Box<dyn KeyStore>, events: E) -> Self {
        Self {
            role: RoleState::Responder(ResponderHandshake::new()),
            sender: ChunkSender::new(),
            reassembler: Reassembler::new(max_message_size),
            store,
            events,
            locked: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.role.state()
    }

    pub fn is_authenticated(&self) -> bool {
        self.role.state() == SessionState::Authenticated
    }

    /// True while an outbound message is still being chunked out.
    pub fn is_sending(&self) -> bool {
        self.sender.is_sending()
    }

    /// Responder latch state.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    /// The channel is subscribed and writable. The initiator opens the
    /// handshake; the responder has nothing to say yet.
    ///
    /// # Errors
    /// Propagates `Busy` and `Disconnected` from the send path.
    #[instrument(skip_all)]
    pub fn on_channel_ready(&mut self, channel: &mut dyn Channel) -> Result<()> {
        self.events.on_status("channel ready");
        match &mut self.role {
            RoleState::Initiator(handshake) => {
                let (message, mode) = handshake.start(&mut *self.store);
                self.transmit(&message, mode, channel)
            }
            RoleState::Responder(_) => Ok(()),
        }
    }

    /// Start over with a fresh identity (initiator only). Mirrors the
    /// register action a user takes when the responder no longer knows them.
    ///
    /// # Errors
    /// Propagates `Busy` and `Disconnected` from the send path.
    pub fn register(&mut self, channel: &mut dyn Channel) -> Result<()> {
        match &mut self.role {
            RoleState::Initiator(handshake) => {
                let (message, mode) = handshake.register(&mut *self.store);
                self.transmit(&message, mode, channel)
            }
            RoleState::Responder(_) => Ok(()),
        }
    }

    /// Send an application message. Sealed once the session is
    /// authenticated, in the clear before that (handshake traffic).
    ///
    /// # Errors
    /// - `ProtocolError::Busy` if a send is already in progress
    /// - `ProtocolError::SealError` if sealing is required but keys are absent
    /// - `ProtocolError::Disconnected` if the channel is gone
    #[instrument(skip_all, fields(opcode = message.opcode()))]
    pub fn send(&mut self, message: &Message, channel: &mut dyn Channel) -> Result<()> {
        let mode = Self::wire_mode_for(self.is_authenticated(), message);
        self.transmit(message, mode, channel)
    }

    /// The channel can accept more writes; push the next chunk(s).
    ///
    /// # Errors
    /// Propagates `Disconnected` from the channel.
    pub fn on_ready_to_send(&mut self, channel: &mut dyn Channel) -> Result<()> {
        self.sender.on_ready_to_send(channel)
    }

    /// One inbound unit (data chunk or sentinel) arrived.
    ///
    /// On a completed message: decode, surface to the event sink, let the
    /// handshake or router produce a reply, and stream the reply back.
    ///
    /// # Errors
    /// - `ProtocolError::OversizedMessage` if reassembly exceeds the limit
    /// - `ProtocolError::Busy` if a reply collides with an in-flight send
    /// - `ProtocolError::Disconnected` if the channel is gone
    #[instrument(skip_all, fields(len = chunk.len()))]
    pub fn on_data_received(&mut self, chunk: &[u8], channel: &mut dyn Channel) -> Result<()> {
        let Some(complete) = self.reassembler.receive(chunk)? else {
            return Ok(());
        };

        let message = envelope::decode(
            &complete,
            self.role.local_secret(),
            self.role.peer_public(),
        );
        debug!(opcode = message.opcode(), "inbound message");
        self.events.on_message(&message);

        let reply = match &mut self.role {
            RoleState::Initiator(handshake) => handshake.handle(&message, &mut *self.store),
            RoleState::Responder(handshake) => {
                match handshake.handle(&message, &mut *self.store) {
                    Some(reply) => Some(reply),
                    None => {
                        // Not handshake traffic: the command router decides.
                        let authenticated = handshake.is_authenticated();
                        let (locked, response) = router::route(self.locked, &message);
                        self.locked = locked;
                        response.map(|response| {
                            let mode = Self::wire_mode_for(authenticated, &response);
                            (response, mode)
                        })
                    }
                }
            }
        };

        if let Some((message, mode)) = reply {
            self.transmit(&message, mode, channel)?;
        }
        Ok(())
    }

    /// The channel went away. Discard all in-flight state; the persisted
    /// registration is untouched and the next connection starts clean.
    pub fn on_disconnect(&mut self) {
        self.sender.reset();
        self.reassembler.clear();
        self.role.reset();
        self.events.on_status("disconnected");
    }

    /// Application messages travel sealed once the peers trust each other;
    /// everything earlier is necessarily in the clear.
    fn wire_mode_for(authenticated: bool, message: &Message) -> WireMode {
        let application = matches!(
            message,
            Message::Command { .. } | Message::LockStatus { .. }
        );
        if application && authenticated {
            WireMode::Sealed
        } else {
            WireMode::Plain
        }
    }

    fn transmit(
        &mut self,
        message: &Message,
        mode: WireMode,
        channel: &mut dyn Channel,
    ) -> Result<()> {
        let bytes = envelope::encode(
            message,
            mode,
            self.role.local_secret(),
            self.role.peer_public(),
        )?;

        if let Err(e) = self.sender.begin_send(Bytes::from(bytes)) {
            warn!(opcode = message.opcode(), error = %e, "cannot stage outbound message");
            return Err(e);
        }
        // First write happens immediately; the rest ride readiness signals.
        self.sender.on_ready_to_send(channel)
    }
}
