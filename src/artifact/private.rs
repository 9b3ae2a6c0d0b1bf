//! The per-level private key source.
//!
//! Each file embeds one PKCS#8 private key and defines `KEY_NUMBER`,
//! `KEY_DATA`, `KEY_LENGTH`, `PROGNAME` and `GENERATED_TIME` before
//! including the signing program template, so compiling it yields a
//! signing tool bound to that one trust level.

use std::fmt;

use super::SourceArtifact;
use crate::constants::PRIVKEY_SYMBOL;
use crate::crypto::{CryptoError, CryptoProvider, Zeroizing};
use crate::escape;
use crate::keygen::KeyPair;
use crate::keyspec::{Passphrase, TrustLevel};
use crate::naming::ResolvedOutput;

/// One encoded private key and the metadata compiled in with it.
pub struct PrivateKeySource {
    level: TrustLevel,
    private_key: Zeroizing<Vec<u8>>,
    generated_at: u64,
    program_name: String,
    encrypted: bool,
    signing_template: String,
}

impl PrivateKeySource {
    /// Encode `pair` according to `passphrase` and collect what the file
    /// needs to say about it.
    ///
    /// An empty pass phrase stores the key in the clear; the file says so.
    pub fn encode<P: CryptoProvider>(
        provider: &P,
        pair: &KeyPair<P::Key>,
        level: TrustLevel,
        output: &ResolvedOutput,
        passphrase: &Passphrase,
        signing_template: &str,
    ) -> Result<Self, CryptoError> {
        let private_key = provider.encode_private_key_pkcs8(&pair.key, passphrase)?;
        Ok(Self {
            level,
            private_key,
            generated_at: pair.generated_at,
            program_name: output.program_name(),
            encrypted: !passphrase.is_unencrypted(),
            signing_template: signing_template.to_string(),
        })
    }

    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }
}

impl SourceArtifact for PrivateKeySource {
    fn owner_only(&self) -> bool {
        !self.encrypted
    }

    fn write_source(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        let n = self.level.get();

        write!(
            out,
            "\n\
             // This file was generated by make-prc-key.  It can be compiled against\n\
             // dtool to produce a program that will sign a prc file using key number {n}.\n"
        )?;
        if !self.encrypted {
            write!(
                out,
                "//\n\
                 // The private key below is NOT encrypted.  Anyone with a copy of this\n\
                 // file can sign with trust level {n}; keep it somewhere safe.\n"
            )?;
        }
        out.write_str("\n")?;

        escape::write_c_string(out, PRIVKEY_SYMBOL, n, &self.private_key)?;

        write!(
            out,
            "\n\n\
             #define KEY_NUMBER {n}\n\
             #define KEY_DATA {data}\n\
             #define KEY_LENGTH {length}\n\
             #define PROGNAME {progname}\n\
             #define GENERATED_TIME {time}\n\
             \n\
             #include {template}\n\n",
            data = escape::data_symbol(PRIVKEY_SYMBOL, n),
            length = escape::length_symbol(PRIVKEY_SYMBOL, n),
            progname = escape::quote(&self.program_name),
            time = self.generated_at,
            template = escape::quote(&self.signing_template),
        )
    }
}
