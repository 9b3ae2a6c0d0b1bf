//! Cryptographic provider abstraction.
//!
//! Everything that touches key material goes through [`CryptoProvider`],
//! so the generation and file-writing logic can be exercised with a
//! deterministic stand-in while production uses [`RsaProvider`].

pub mod rsa_provider;

use std::fmt;

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::keyspec::Passphrase;

pub use pkcs8::der::zeroize::Zeroizing;
pub use rsa_provider::RsaProvider;

/// A failure inside the crypto provider.
///
/// Carries every diagnostic the provider reported, innermost last.
#[derive(Debug, Error)]
#[error("error occurred in crypto routines while {operation}: {}", .messages.join("; "))]
pub struct CryptoError {
    pub operation: &'static str,
    pub messages: Vec<String>,
}

impl CryptoError {
    /// Error with a single diagnostic message.
    pub fn new(operation: &'static str, message: impl fmt::Display) -> Self {
        Self {
            operation,
            messages: vec![message.to_string()],
        }
    }

    /// Error collecting `err` and its whole source chain.
    pub fn from_error(operation: &'static str, err: &dyn std::error::Error) -> Self {
        let mut messages = vec![err.to_string()];
        let mut source = err.source();
        while let Some(inner) = source {
            messages.push(inner.to_string());
            source = inner.source();
        }
        Self { operation, messages }
    }
}

/// Key generation and PKCS#8/SPKI encoding.
pub trait CryptoProvider {
    /// Provider-specific private key (the public half is derivable from it).
    type Key;

    /// Generate a fresh key pair.
    fn generate_key_pair(&self, bits: usize, public_exponent: u64) -> Result<Self::Key, CryptoError>;

    /// PEM-encode the public half of `key`.
    fn encode_public_key(&self, key: &Self::Key) -> Result<Vec<u8>, CryptoError>;

    /// PEM-encode `key` as PKCS#8, encrypted according to `passphrase`.
    fn encode_private_key_pkcs8(
        &self,
        key: &Self::Key,
        passphrase: &Passphrase,
    ) -> Result<Zeroizing<Vec<u8>>, CryptoError>;
}

/// SHA-256 fingerprint of an encoded public key, hex encoded.
pub fn fingerprint(public_key: &[u8]) -> String {
    hex::encode(Sha256::digest(public_key))
}
