//! The public key table source.
//!
//! Emits one data block per populated registry slot, then a dense
//! `PrcKeyRegistry::KeyDef` array with a `{ nullptr, 0, 0 }` sentinel for
//! every unused slot, then the array length. The same layout is read back
//! by [`parse`] so that a later run can keep keys it did not regenerate.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use super::SourceArtifact;
use crate::constants::{MAX_TRUST_LEVEL, PUBKEY_COUNT, PUBKEY_SYMBOL, PUBKEY_TABLE, REGISTRY_HEADER};
use crate::escape::{self, DecodeError};
use crate::registry::{KeyEntry, KeyRegistry};

/// Errors reading a public key table back.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableParseError {
    #[error("no {table} table found", table = PUBKEY_TABLE)]
    MissingTable,

    #[error("bad string literal for key {index}: {source}")]
    Literal { index: u32, source: DecodeError },

    #[error("no length constant follows the data for key {0}")]
    MissingLength(u32),

    #[error("key {index} declares {declared} bytes but its data holds {actual}")]
    LengthMismatch {
        index: u32,
        declared: usize,
        actual: usize,
    },

    #[error("table refers to key {0}, which has no data block")]
    UnknownKey(u32),

    #[error("table declares {declared} entries but lists {actual}")]
    CountMismatch { declared: usize, actual: usize },

    #[error("number out of range: {0}")]
    BadNumber(String),

    #[error("table declares {0} entries; at most {max} trust levels are supported", max = MAX_TRUST_LEVEL)]
    TooManyEntries(usize),

    #[error("slot {slot} of the table holds key {index}")]
    SlotMismatch { slot: usize, index: u32 },
}

static DATA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"static const char \* const {PUBKEY_SYMBOL}(\d+)_data =")).unwrap()
});

static LENGTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^;\s*static const unsigned int {PUBKEY_SYMBOL}(\d+)_length = (\d+);")).unwrap()
});

static TABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?s)static PrcKeyRegistry::KeyDef const {PUBKEY_TABLE}\[(\d+)\] = \{{(.*?)\}};")).unwrap()
});

static ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\{{\s*(?:(?:nullptr|NULL|0)\s*,\s*0\s*,\s*0|{PUBKEY_SYMBOL}(\d+)_data\s*,\s*{PUBKEY_SYMBOL}\d+_length\s*,\s*(\d+))\s*\}}"
    ))
    .unwrap()
});

static COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"static const int {PUBKEY_COUNT} = (\d+);")).unwrap()
});

/// The complete public key table, ready to render.
pub struct PublicKeyTable<'a> {
    registry: &'a KeyRegistry,
}

impl<'a> PublicKeyTable<'a> {
    pub fn new(registry: &'a KeyRegistry) -> Self {
        Self { registry }
    }
}

impl SourceArtifact for PublicKeyTable<'_> {
    fn write_source(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(
            out,
            "\n\
             // This file was generated by make-prc-key.  It defines the public keys\n\
             // used to validate signed prc files, indexed by trust level.\n\
             \n\
             #include \"{REGISTRY_HEADER}\"\n\
             \n"
        )?;

        for (index, key, _) in self.registry.populated() {
            escape::write_c_string(out, PUBKEY_SYMBOL, index as u32, key)?;
            out.write_str("\n")?;
        }

        let count = self.registry.len();
        writeln!(out, "static PrcKeyRegistry::KeyDef const {PUBKEY_TABLE}[{count}] = {{")?;
        for (index, entry) in self.registry.entries().iter().enumerate() {
            if entry.is_empty() {
                out.write_str("  { nullptr, 0, 0 },\n")?;
            } else {
                writeln!(
                    out,
                    "  {{ {}, {}, {} }},",
                    escape::data_symbol(PUBKEY_SYMBOL, index as u32),
                    escape::length_symbol(PUBKEY_SYMBOL, index as u32),
                    entry.generated_at
                )?;
            }
        }
        write!(out, "}};\nstatic const int {PUBKEY_COUNT} = {count};\n\n")
    }
}

/// Read a generated public key table back into its slots.
///
/// Every data block must decode cleanly and match its length constant,
/// the table must list exactly as many rows as it declares, and each
/// populated row must refer to the key numbered after its own slot.
pub fn parse(text: &str) -> Result<Vec<KeyEntry>, TableParseError> {
    let mut blobs: HashMap<u32, Vec<u8>> = HashMap::new();

    for caps in DATA_RE.captures_iter(text) {
        let (Some(header), Some(number)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let index = parse_number::<u32>(number.as_str())?;

        let rest = &text[header.end()..];
        let (data, end) = escape::decode_literal_prefix(rest)
            .map_err(|source| TableParseError::Literal { index, source })?;

        let length = LENGTH_RE
            .captures(&rest[end..])
            .ok_or(TableParseError::MissingLength(index))?;
        if parse_number::<u32>(&length[1])? != index {
            return Err(TableParseError::MissingLength(index));
        }
        let declared = parse_number::<usize>(&length[2])?;
        if declared != data.len() {
            return Err(TableParseError::LengthMismatch {
                index,
                declared,
                actual: data.len(),
            });
        }

        blobs.insert(index, data);
    }

    let table = TABLE_RE.captures(text).ok_or(TableParseError::MissingTable)?;
    let declared = parse_number::<usize>(&table[1])?;
    if declared > MAX_TRUST_LEVEL as usize + 1 {
        return Err(TableParseError::TooManyEntries(declared));
    }

    let mut entries = Vec::new();
    for row in ROW_RE.captures_iter(&table[2]) {
        match (row.get(1), row.get(2)) {
            (Some(data_ref), Some(time)) => {
                let index = parse_number::<u32>(data_ref.as_str())?;
                if index as usize != entries.len() {
                    return Err(TableParseError::SlotMismatch {
                        slot: entries.len(),
                        index,
                    });
                }
                let generated_at = parse_number::<u64>(time.as_str())?;
                let data = blobs
                    .get(&index)
                    .cloned()
                    .ok_or(TableParseError::UnknownKey(index))?;
                entries.push(KeyEntry::new(data, generated_at));
            }
            _ => entries.push(KeyEntry::empty()),
        }
    }

    if entries.len() != declared {
        return Err(TableParseError::CountMismatch {
            declared,
            actual: entries.len(),
        });
    }
    if let Some(count) = COUNT_RE.captures(text) {
        let listed = parse_number::<usize>(&count[1])?;
        if listed != declared {
            return Err(TableParseError::CountMismatch {
                declared: listed,
                actual: declared,
            });
        }
    }

    Ok(entries)
}

fn parse_number<T: std::str::FromStr>(digits: &str) -> Result<T, TableParseError> {
    digits
        .parse()
        .map_err(|_| TableParseError::BadNumber(digits.to_string()))
}
