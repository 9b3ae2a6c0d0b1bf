//! Byte buffer to C string literal encoding.
//!
//! Key blobs are embedded in generated source as a `const char *` literal
//! plus an explicit length constant. The literal is broken after every
//! newline in the payload so a PEM blob reads one line per source line,
//! which keeps regenerated files diffable.

use std::fmt::{self, Write};

use thiserror::Error;

/// Errors reading a literal back out of generated source.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unterminated string literal")]
    Unterminated,

    #[error("unexpected character {0:?} at offset {1} outside string literal")]
    UnexpectedCharacter(char, usize),

    #[error("invalid escape sequence at offset {0}")]
    BadEscape(usize),

    #[error("escape sequence at offset {0} does not fit in a byte")]
    OutOfRange(usize),
}

/// Name of the data symbol for `symbol_base` and `index`.
pub fn data_symbol(symbol_base: &str, index: u32) -> String {
    format!("{symbol_base}{index}_data")
}

/// Name of the length symbol for `symbol_base` and `index`.
pub fn length_symbol(symbol_base: &str, index: u32) -> String {
    format!("{symbol_base}{index}_length")
}

/// Write `data` as a `{symbol_base}{index}_data` literal followed by its
/// `{symbol_base}{index}_length` constant.
///
/// The length constant is the byte count of `data`, not of the escaped text.
pub fn write_c_string<W: Write + ?Sized>(
    out: &mut W,
    symbol_base: &str,
    index: u32,
    data: &[u8],
) -> fmt::Result {
    writeln!(
        out,
        "static const char * const {} =",
        data_symbol(symbol_base, index)
    )?;
    out.write_str("  \"")?;

    let mut after_newline = false;
    let mut after_hex = false;
    let mut after_question = false;
    for &byte in data {
        if byte == b'\n' {
            out.write_str("\\n")?;
            after_newline = true;
            after_hex = false;
            after_question = false;
            continue;
        }

        if after_newline {
            out.write_str("\"\n  \"")?;
            after_newline = false;
            after_hex = false;
        }

        // `??` would start a trigraph.
        if byte == b'?' {
            out.write_str(if after_question { "\\?" } else { "?" })?;
            after_question = true;
            after_hex = false;
            continue;
        }
        after_question = false;

        match byte {
            b'\t' => out.write_str("\\t")?,
            b'"' => out.write_str("\\\"")?,
            b'\\' => out.write_str("\\\\")?,
            0x20..=0x7e => {
                // A hex escape swallows every following hex digit.
                if after_hex && byte.is_ascii_hexdigit() {
                    out.write_str("\"\"")?;
                }
                out.write_char(byte as char)?;
            }
            _ => {
                write!(out, "\\x{byte:02x}")?;
                after_hex = true;
                continue;
            }
        }
        after_hex = false;
    }

    write!(
        out,
        "\";\nstatic const unsigned int {} = {};\n",
        length_symbol(symbol_base, index),
        data.len()
    )
}

/// Quote a short string (a program name, an include path) as a single C
/// string literal.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    let mut prev = None;
    for ch in text.chars() {
        match ch {
            '?' if prev == Some('?') => out.push_str("\\?"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
        prev = Some(ch);
    }
    out.push('"');
    out
}

/// Convenience wrapper around [`write_c_string`] returning the text.
pub fn encode(data: &[u8], symbol_base: &str, index: u32) -> String {
    let mut out = String::with_capacity(data.len() * 2 + 128);
    // Writing into a String cannot fail.
    let _ = write_c_string(&mut out, symbol_base, index, data);
    out
}

/// Decode a sequence of adjacent C string literals back into bytes.
///
/// Accepts the initializer part of a generated data block, i.e. everything
/// after the `=`. Whitespace between literals is skipped and decoding stops
/// at the terminating `;` or at the end of input.
pub fn decode_literal(src: &str) -> Result<Vec<u8>, DecodeError> {
    decode_literal_prefix(src).map(|(data, _)| data)
}

/// Like [`decode_literal`], also returning the offset decoding stopped at:
/// the terminating `;`, or the end of input.
pub fn decode_literal_prefix(src: &str) -> Result<(Vec<u8>, usize), DecodeError> {
    let bytes = src.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b';' => return Ok((out, i)),
            b if b.is_ascii_whitespace() => i += 1,
            b'"' => i = decode_one(bytes, i + 1, &mut out)?,
            _ => {
                let ch = src[i..].chars().next().unwrap_or('\u{fffd}');
                return Err(DecodeError::UnexpectedCharacter(ch, i));
            }
        }
    }

    Ok((out, bytes.len()))
}

/// Decode one literal body starting just after its opening quote.
/// Returns the offset just past the closing quote.
fn decode_one(bytes: &[u8], mut i: usize, out: &mut Vec<u8>) -> Result<usize, DecodeError> {
    loop {
        let Some(&byte) = bytes.get(i) else {
            return Err(DecodeError::Unterminated);
        };

        match byte {
            b'"' => return Ok(i + 1),
            b'\n' => return Err(DecodeError::Unterminated),
            b'\\' => {
                let start = i;
                let Some(&esc) = bytes.get(i + 1) else {
                    return Err(DecodeError::Unterminated);
                };
                i += 2;
                match esc {
                    b'n' => out.push(b'\n'),
                    b't' => out.push(b'\t'),
                    b'r' => out.push(b'\r'),
                    b'a' => out.push(0x07),
                    b'b' => out.push(0x08),
                    b'f' => out.push(0x0c),
                    b'v' => out.push(0x0b),
                    b'\\' | b'"' | b'\'' | b'?' => out.push(esc),
                    b'x' => {
                        let mut value: u32 = 0;
                        let mut digits = 0;
                        while let Some(d) = bytes.get(i).and_then(|b| (*b as char).to_digit(16)) {
                            value = value * 16 + d;
                            if value > 0xff {
                                return Err(DecodeError::OutOfRange(start));
                            }
                            digits += 1;
                            i += 1;
                        }
                        if digits == 0 {
                            return Err(DecodeError::BadEscape(start));
                        }
                        out.push(value as u8);
                    }
                    b'0'..=b'7' => {
                        let mut value = u32::from(esc - b'0');
                        let mut digits = 1;
                        while digits < 3 {
                            match bytes.get(i) {
                                Some(d @ b'0'..=b'7') => {
                                    value = value * 8 + u32::from(d - b'0');
                                    digits += 1;
                                    i += 1;
                                }
                                _ => break,
                            }
                        }
                        if value > 0xff {
                            return Err(DecodeError::OutOfRange(start));
                        }
                        out.push(value as u8);
                    }
                    _ => return Err(DecodeError::BadEscape(start)),
                }
            }
            _ => {
                out.push(byte);
                i += 1;
            }
        }
    }
}
