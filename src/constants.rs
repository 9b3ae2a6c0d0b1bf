//! App-wide constants.
//!
//! Centralises the tool name, config paths, environment variable names,
//! and the names baked into generated source files so that the verifier
//! and signing templates only have to agree with this file.

/// Display name of the tool.
pub const APP_NAME: &str = "make-prc-key";

/// Crate version, as reported by `--version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Local config filename (e.g. `.prckey.toml` in the working directory).
pub const CONFIG_FILENAME: &str = ".prckey.toml";

/// Directory name under `~/.config/` for global config.
pub const CONFIG_DIR: &str = "prckey";

// ── Key material ────────────────────────────────────────────────────

/// RSA modulus size for every generated key.
pub const RSA_KEY_BITS: usize = 1024;

/// RSA public exponent for every generated key.
pub const RSA_PUBLIC_EXPONENT: u64 = 7;

/// PBKDF2 iteration count used when encrypting private keys.
pub const PBKDF2_ITERATIONS: u32 = 2048;

/// Highest trust level accepted on the command line.
///
/// The public key table is dense, so this also bounds its length.
pub const MAX_TRUST_LEVEL: u32 = 65535;

// ── Generated source ────────────────────────────────────────────────

/// Extension required on both kinds of output artifact.
pub const SOURCE_EXTENSION: &str = "cxx";

/// Character in a private key path that is replaced by the trust level.
pub const LEVEL_PLACEHOLDER: char = '#';

/// Symbol prefix for public key data blocks (`prc_pubkey1_data`, ...).
pub const PUBKEY_SYMBOL: &str = "prc_pubkey";

/// Symbol prefix for private key data blocks (`prc_privkey1_data`, ...).
pub const PRIVKEY_SYMBOL: &str = "prc_privkey";

/// Name of the public key table array.
pub const PUBKEY_TABLE: &str = "prc_pubkeys";

/// Name of the constant holding the public key table length.
pub const PUBKEY_COUNT: &str = "num_prc_pubkeys";

/// Header declaring `PrcKeyRegistry::KeyDef`, included by the public table.
pub const REGISTRY_HEADER: &str = "prcKeyRegistry.h";

/// Default signing program template included by each private key file.
pub const DEFAULT_SIGNING_TEMPLATE: &str = "signPrcFile_src.cxx";

// ── Environment variable names ──────────────────────────────────────

pub const ENV_PUBLIC_KEYS_FILE: &str = "PRCKEY_PUBLIC_KEYS_FILE";
pub const ENV_SIGNING_TEMPLATE: &str = "PRCKEY_SIGNING_TEMPLATE";
pub const ENV_LOG: &str = "PRCKEY_LOG";
