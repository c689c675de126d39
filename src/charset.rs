//! Charset handling for headers and bodies.
//!
//! Labels are validated against the WHATWG encoding registry. The label the
//! caller supplied is kept for the `charset=` parameter and encoded words,
//! unless the encoder writes a different encoding (the UTF-16 family), in
//! which case the label of the bytes actually produced is used. Text a
//! charset cannot represent is written as UTF-8 instead.

use std::{borrow::Cow, fmt};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use encoding_rs::{Encoding, UTF_8};
use serde::{Deserialize, Serialize};

use crate::error::{EmailError, Result};

/// Labels naming plain 7-bit ASCII. The registry maps these to windows-1252.
const ASCII_LABELS: &[&str] = &["ascii", "us-ascii", "ansi_x3.4-1968"];

/// Label used when text falls back to UTF-8.
const FALLBACK: &str = "utf-8";

/// Longest encoded word permitted by RFC 2047.
const MAX_ENCODED_WORD: usize = 75;

/// A validated charset label.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Charset {
    label: String,
    encoding: &'static Encoding,
    seven_bit: bool,
}

impl Charset {
    /// Looks up `label` (case-insensitive, surrounding whitespace ignored).
    ///
    /// # Errors
    ///
    /// Returns [`EmailError::UnknownCharset`] for labels no encoder exists for.
    pub fn new(label: &str) -> Result<Self> {
        let label = label.trim();
        let encoding = Encoding::for_label(label.as_bytes())
            .ok_or_else(|| EmailError::UnknownCharset(label.to_string()))?;

        let output = encoding.output_encoding();
        if output != encoding {
            return Ok(Self {
                label: output.name().to_string(),
                encoding: output,
                seven_bit: false,
            });
        }

        Ok(Self {
            label: label.to_string(),
            encoding,
            seven_bit: ASCII_LABELS
                .iter()
                .any(|ascii| ascii.eq_ignore_ascii_case(label)),
        })
    }

    #[must_use]
    pub fn utf8() -> Self {
        Self {
            label: FALLBACK.to_string(),
            encoding: UTF_8,
            seven_bit: false,
        }
    }

    /// The label written into headers for text this charset can represent.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The encoder and label `text` will actually be written with.
    fn resolve(&self, text: &str) -> (&'static Encoding, &str) {
        let representable = if self.seven_bit {
            text.is_ascii()
        } else {
            !self.encoding.encode(text).2
        };

        if representable {
            (self.encoding, &self.label)
        } else {
            (UTF_8, FALLBACK)
        }
    }

    /// Encodes `text`, returning the bytes and the label describing them.
    #[must_use]
    pub fn encode<'a>(&self, text: &'a str) -> (Cow<'a, [u8]>, &str) {
        let (encoding, label) = self.resolve(text);
        let (bytes, _, _) = encoding.encode(text);
        (bytes, label)
    }

    /// Renders `text` as RFC 2047 `B` encoded words when it is not plain
    /// ASCII, otherwise returns it untouched.
    ///
    /// Long text is split on character boundaries into words of at most 75
    /// characters, folded with CRLF and a space.
    #[must_use]
    pub fn encode_word<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if text.is_ascii() {
            return Cow::Borrowed(text);
        }

        let (encoding, label) = self.resolve(text);

        // "=?" label "?B?" payload "?=", with the payload in whole base64 quanta
        let payload = MAX_ENCODED_WORD.saturating_sub(label.len() + 7) / 4 * 3;
        let capacity = payload.max(3);

        let mut words = Vec::new();
        let mut chunk = String::new();
        let mut chunk_len = 0;
        let mut buffer = [0u8; 4];

        for ch in text.chars() {
            let len = encoding.encode(ch.encode_utf8(&mut buffer)).0.len();
            if chunk_len + len > capacity && !chunk.is_empty() {
                words.push(encoded_word(encoding, label, &chunk));
                chunk.clear();
                chunk_len = 0;
            }
            chunk.push(ch);
            chunk_len += len;
        }

        if !chunk.is_empty() {
            words.push(encoded_word(encoding, label, &chunk));
        }

        Cow::Owned(words.join("\r\n "))
    }
}

fn encoded_word(encoding: &'static Encoding, label: &str, text: &str) -> String {
    let (bytes, _, _) = encoding.encode(text);
    format!("=?{label}?B?{}?=", STANDARD.encode(bytes))
}

impl Default for Charset {
    fn default() -> Self {
        Self::utf8()
    }
}

impl fmt::Debug for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Charset").field(&self.label).finish()
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl TryFrom<String> for Charset {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<Charset> for String {
    fn from(value: Charset) -> Self {
        value.label
    }
}
