//! # Utility Modules
//!
//! Supporting utilities for cryptography and logging.
//!
//! ## Components
//! - **Crypto**: X25519 + XSalsa20-Poly1305 sealed boxes, key pairs
//! - **Logging**: structured logging bootstrap from configuration
//!
//! ## Security
//! - Cryptographically secure RNG for keys and nonces
//! - Secret key copies wiped after use (zeroize crate)

pub mod crypto;
pub mod logging;

pub use crypto::KeyPair;
