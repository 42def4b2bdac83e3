//! Sealed-box encryption for peer-to-peer payloads.
//!
//! Asymmetric authenticated encryption (X25519 + XSalsa20-Poly1305) between
//! the two paired devices. The sender seals with its own secret key and the
//! recipient's public key; only the recipient's secret key opens the result,
//! and a successful open also authenticates the sender.
//!
//! Wire layout of a sealed payload: `nonce(24) || ciphertext`.

use crate::error::{ProtocolError, Result};
use crypto_box::{
    aead::{Aead, AeadCore, OsRng},
    PublicKey, SalsaBox, SecretKey,
};
use zeroize::Zeroizing;

/// Nonce length for XSalsa20-Poly1305, prefixed to every sealed payload.
pub const NONCE_LEN: usize = 24;

/// Length of a raw public or secret key.
pub const KEY_LEN: usize = 32;

/// A device identity: one X25519 key pair, generated at registration and
/// persisted by the key store. Never regenerated implicitly.
#[derive(Clone)]
pub struct KeyPair {
    public: PublicKey,
    secret: SecretKey,
}

impl KeyPair {
    /// Generate a fresh key pair from the system RNG.
    pub fn generate() -> Self {
        let secret = SecretKey::generate(&mut OsRng);
        let public = secret.public_key();
        Self { public, secret }
    }

    /// Rebuild a key pair from persisted secret-key bytes.
    pub fn from_secret_bytes(bytes: [u8; KEY_LEN]) -> Self {
        let secret = SecretKey::from(bytes);
        let public = secret.public_key();
        Self { public, secret }
    }

    pub fn public(&self) -> &PublicKey {
        &self.public
    }

    pub fn secret(&self) -> &SecretKey {
        &self.secret
    }

    /// Raw public key bytes as they travel in `SendPublicKey`.
    pub fn public_bytes(&self) -> Vec<u8> {
        self.public.as_bytes().to_vec()
    }

    /// Secret-key bytes for persistence. Wrapped in `Zeroizing` so the
    /// copy is wiped once the store has written it.
    pub fn secret_bytes(&self) -> Zeroizing<[u8; KEY_LEN]> {
        Zeroizing::new(self.secret.to_bytes())
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Secret key intentionally absent.
        f.debug_struct("KeyPair")
            .field("public", &self.public.as_bytes())
            .finish()
    }
}

/// Parse raw peer key bytes received over the wire.
///
/// # Errors
/// Returns `ProtocolError::InvalidPublicKey` if the length is wrong.
pub fn public_key_from_bytes(bytes: &[u8]) -> Result<PublicKey> {
    let arr: [u8; KEY_LEN] = bytes
        .try_into()
        .map_err(|_| ProtocolError::InvalidPublicKey(bytes.len()))?;
    Ok(PublicKey::from(arr))
}

/// Seal `plaintext` for `recipient`, authenticated as `sender`.
///
/// Returns `nonce || ciphertext`.
///
/// # Errors
/// Returns `ProtocolError::SealError` if the AEAD rejects the input.
pub fn seal(plaintext: &[u8], recipient: &PublicKey, sender: &SecretKey) -> Result<Vec<u8>> {
    let cipher = SalsaBox::new(recipient, sender);
    let nonce = SalsaBox::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| ProtocolError::SealError("aead encryption failed".into()))?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(nonce.as_slice());
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Open a sealed payload from `sender`, addressed to `recipient`.
///
/// # Errors
/// Returns `ProtocolError::CantDecrypt` on truncated input, wrong keys, or
/// tampered ciphertext. The cause is indistinguishable on purpose.
pub fn open(sealed: &[u8], sender: &PublicKey, recipient: &SecretKey) -> Result<Vec<u8>> {
    if sealed.len() < NONCE_LEN {
        return Err(ProtocolError::CantDecrypt);
    }

    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
    let nonce: [u8; NONCE_LEN] = nonce_bytes
        .try_into()
        .map_err(|_| ProtocolError::CantDecrypt)?;

    let cipher = SalsaBox::new(sender, recipient);
    cipher
        .decrypt(&nonce.into(), ciphertext)
        .map_err(|_| ProtocolError::CantDecrypt)
}
