//! Injected key-value store for key material.
//!
//! The protocol core treats persistence as an opaque collaborator: the
//! platform decides whether keys live in UserDefaults, a keychain, or flash.
//! The responder uses the `user_id -> public_key` map to recognize returning
//! phones; the initiator persists its own registration (key pair, peer key,
//! user id) so a reconnect can skip key exchange.

use crate::utils::crypto::{KeyPair, KEY_LEN};
use std::collections::HashMap;

pub trait KeyStore {
    /// Look up a peer public key registered under `user_id`.
    fn get(&self, user_id: &str) -> Option<Vec<u8>>;

    /// Register (or replace) a peer public key under `user_id`.
    fn put(&mut self, user_id: &str, public_key: &[u8]);

    /// The device's own key pair, if one has been generated.
    fn local_keypair(&self) -> Option<KeyPair>;

    /// Persist the device's own key pair.
    fn save_local_keypair(&mut self, keypair: &KeyPair);

    /// The user id this device registered itself under, if any.
    fn registered_user_id(&self) -> Option<String>;

    /// Persist the user id chosen at registration.
    fn save_registered_user_id(&mut self, user_id: &str);
}

/// Volatile store for tests and hosts without platform persistence.
#[derive(Default)]
pub struct MemoryKeyStore {
    peers: HashMap<String, Vec<u8>>,
    local_secret: Option<[u8; KEY_LEN]>,
    user_id: Option<String>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for MemoryKeyStore {
    fn get(&self, user_id: &str) -> Option<Vec<u8>> {
        self.peers.get(user_id).cloned()
    }

    fn put(&mut self, user_id: &str, public_key: &[u8]) {
        self.peers.insert(user_id.to_string(), public_key.to_vec());
    }

    fn local_keypair(&self) -> Option<KeyPair> {
        self.local_secret.map(KeyPair::from_secret_bytes)
    }

    fn save_local_keypair(&mut self, keypair: &KeyPair) {
        self.local_secret = Some(*keypair.secret_bytes());
    }

    fn registered_user_id(&self) -> Option<String> {
        self.user_id.clone()
    }

    fn save_registered_user_id(&mut self, user_id: &str) {
        self.user_id = Some(user_id.to_string());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_key_roundtrip() {
        let mut store = MemoryKeyStore::new();
        assert!(store.get("alice").is_none());

        store.put("alice", &[1u8; 32]);
        assert_eq!(store.get("alice").unwrap(), vec![1u8; 32]);

        // Re-registration replaces the key.
        store.put("alice", &[2u8; 32]);
        assert_eq!(store.get("alice").unwrap(), vec![2u8; 32]);
    }

    #[test]
    fn test_local_keypair_survives_roundtrip() {
        let mut store = MemoryKeyStore::new();
        assert!(store.local_keypair().is_none());

        let keypair = KeyPair::generate();
        store.save_local_keypair(&keypair);

        let restored = store.local_keypair().unwrap();
        assert_eq!(restored.public_bytes(), keypair.public_bytes());
    }
}
