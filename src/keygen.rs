//! Per-level key pair generation.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::constants::{RSA_KEY_BITS, RSA_PUBLIC_EXPONENT};
use crate::crypto::{CryptoError, CryptoProvider};

/// A freshly generated key and the time it was made.
#[derive(Debug)]
pub struct KeyPair<K> {
    pub key: K,
    /// Seconds since the Unix epoch.
    pub generated_at: u64,
}

/// Generates keys of the fixed size and exponent, all stamped with one
/// timestamp for the whole run.
pub struct KeyPairGenerator<'a, P: CryptoProvider> {
    provider: &'a P,
    generated_at: u64,
}

impl<'a, P: CryptoProvider> KeyPairGenerator<'a, P> {
    /// Generator stamping keys with the current wall-clock time.
    pub fn new(provider: &'a P) -> Self {
        Self::with_timestamp(provider, unix_now())
    }

    /// Generator stamping keys with `generated_at`.
    pub fn with_timestamp(provider: &'a P, generated_at: u64) -> Self {
        Self {
            provider,
            generated_at,
        }
    }

    pub fn generated_at(&self) -> u64 {
        self.generated_at
    }

    /// Generate one key pair. There is no retry; a failure is final.
    pub fn generate(&self) -> Result<KeyPair<P::Key>, CryptoError> {
        let key = self
            .provider
            .generate_key_pair(RSA_KEY_BITS, RSA_PUBLIC_EXPONENT)?;
        debug!(generated_at = self.generated_at, "key pair generated");
        Ok(KeyPair {
            key,
            generated_at: self.generated_at,
        })
    }
}

/// Current time in whole seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
