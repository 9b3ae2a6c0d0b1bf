//! Trust level arguments.
//!
//! Each positional argument names one key to generate, as
//! `<level>[,<pass phrase>]`. The level uses C integer syntax (`12`,
//! `0x0c`, `014`), and a pass phrase after the comma overrides the global
//! `-p` pass phrase for that key only.

use std::fmt;

use thiserror::Error;

use crate::constants::MAX_TRUST_LEVEL;

/// Errors parsing a trust level argument.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeySpecError {
    #[error("parameter '{0}' should be an integer")]
    NotAnInteger(String),

    #[error("key numbers must be greater than 0; you specified {0}")]
    NotPositive(i64),

    #[error("key number {0} is too large; the maximum is {max}", max = MAX_TRUST_LEVEL)]
    TooLarge(i64),
}

/// A signing tier. Level 1 occupies slot 1 of the public key table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrustLevel(u32);

impl TrustLevel {
    /// Validate a parsed integer as a trust level.
    pub fn new(value: i64) -> Result<Self, KeySpecError> {
        if value <= 0 {
            return Err(KeySpecError::NotPositive(value));
        }
        if value > i64::from(MAX_TRUST_LEVEL) {
            return Err(KeySpecError::TooLarge(value));
        }
        Ok(Self(value as u32))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Index of this level in the public key table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the private key for one level should be protected.
#[derive(Clone, PartialEq, Eq)]
pub enum Passphrase {
    /// Nothing given; the crypto provider decides (normally by prompting).
    Unspecified,
    /// Explicitly empty: store the private key unencrypted.
    Empty,
    /// Encrypt the private key with this pass phrase.
    Given(String),
}

impl Passphrase {
    /// Map an optional command-line value onto the three cases.
    pub fn from_option(value: Option<&str>) -> Self {
        match value {
            None => Passphrase::Unspecified,
            Some("") => Passphrase::Empty,
            Some(p) => Passphrase::Given(p.to_string()),
        }
    }

    pub fn is_unencrypted(&self) -> bool {
        matches!(self, Passphrase::Empty)
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Passphrase::Unspecified => f.write_str("Unspecified"),
            Passphrase::Empty => f.write_str("Empty"),
            Passphrase::Given(_) => f.write_str("Given([REDACTED])"),
        }
    }
}

/// One key to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpec {
    pub level: TrustLevel,
    pub passphrase: Passphrase,
}

/// Parse every positional argument, failing on the first bad one.
///
/// Nothing is generated until the whole list has parsed, so a typo in the
/// last argument never leaves a partial set of artifacts behind.
pub fn parse_key_specs<S: AsRef<str>>(
    tokens: &[S],
    global_passphrase: Option<&str>,
) -> Result<Vec<KeySpec>, KeySpecError> {
    tokens
        .iter()
        .map(|t| parse_key_spec(t.as_ref(), global_passphrase))
        .collect()
}

/// Parse a single `<level>[,<pass phrase>]` argument.
pub fn parse_key_spec(token: &str, global_passphrase: Option<&str>) -> Result<KeySpec, KeySpecError> {
    let (number, own_passphrase) = match token.split_once(',') {
        Some((number, pass)) => (number, Some(pass)),
        None => (token, None),
    };

    let value = parse_c_integer(number).ok_or_else(|| KeySpecError::NotAnInteger(token.to_string()))?;
    let level = TrustLevel::new(value)?;

    Ok(KeySpec {
        level,
        passphrase: Passphrase::from_option(own_passphrase.or(global_passphrase)),
    })
}

/// Parse an integer the way `strtol(s, &end, 0)` does, requiring the whole
/// string to be consumed: optional leading whitespace and sign, then `0x`
/// hex, leading-`0` octal, or decimal.
fn parse_c_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };

    let (radix, body) = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (16, hex)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };

    if body.is_empty() || !body.chars().all(|c| c.is_digit(radix)) {
        return None;
    }

    let magnitude = i64::from_str_radix(body, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
