use std::collections::HashMap;

use bytes::Bytes;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum Error {
    #[error("missing ';' delimiter after a key")]
    MalformedKeyField,
    #[error("length field is not a non-negative decimal integer")]
    MalformedLengthField,
    #[error("declared value length runs past the end of the payload")]
    TruncatedValueField,
}

/// A flat, unordered mapping of string keys to byte-string values. This is
/// the unit of exchange between the web tier and the backend: one message in,
/// one message out, nothing nested.
///
/// Values may contain arbitrary bytes (pictures travel as values). Keys must
/// never contain `;`: on the wire keys are delimiter-scanned while values
/// are length-prefixed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Message {
    fields: HashMap<String, Bytes>,
}

impl Message {
    pub fn new() -> Message {
        Message {
            fields: HashMap::new(),
        }
    }

    /// Insert a value, replacing any previous value under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: Bytes) {
        self.fields.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Bytes> {
        self.fields.get(key)
    }

    /// The value under `key` as UTF-8 text. `None` if the key is absent or
    /// the value is not valid UTF-8.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(|value| std::str::from_utf8(value).ok())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Bytes)> {
        self.fields.iter()
    }

    /// Flatten the message into its wire shape: for each entry,
    /// `key ';' decimal(len(value)) ';' value`, entries back to back in map
    /// iteration order (unspecified, and irrelevant to the receiver).
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (key, value) in &self.fields {
            out.extend_from_slice(key.as_bytes());
            out.push(b';');
            out.extend_from_slice(value.len().to_string().as_bytes());
            out.push(b';');
            out.extend_from_slice(value);
        }
        out
    }

    /// Rebuild a message from its wire shape. Scans left to right: a key up
    /// to the next `;`, a decimal length up to the next `;`, then exactly
    /// that many raw value bytes; repeats until the input is consumed. An
    /// empty input is an empty message.
    pub fn deserialize(data: Bytes) -> Result<Message, Error> {
        let mut fields = HashMap::new();
        let mut cursor = 0;

        while cursor < data.len() {
            let sep = find_delimiter(&data[cursor..]).ok_or(Error::MalformedKeyField)?;
            let key = std::str::from_utf8(&data[cursor..cursor + sep])
                .map_err(|_| Error::MalformedKeyField)?
                .to_string();
            cursor += sep + 1;

            let sep = find_delimiter(&data[cursor..]).ok_or(Error::MalformedLengthField)?;
            let length = parse_length(&data[cursor..cursor + sep])?;
            cursor += sep + 1;

            // A value may end exactly at the end of the payload; only a
            // length that runs past it is truncation.
            let end = cursor
                .checked_add(length)
                .ok_or(Error::TruncatedValueField)?;
            if end > data.len() {
                return Err(Error::TruncatedValueField);
            }
            fields.insert(key, data.slice(cursor..end));
            cursor = end;
        }

        Ok(Message { fields })
    }
}

fn find_delimiter(data: &[u8]) -> Option<usize> {
    data.iter().position(|&byte| byte == b';')
}

// Strictly decimal digits: signs, spaces and an empty segment are all
// malformed, as is a value that overflows usize.
fn parse_length(digits: &[u8]) -> Result<usize, Error> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(Error::MalformedLengthField);
    }
    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(Error::MalformedLengthField)
}

impl<const N: usize> From<[(&str, &str); N]> for Message {
    fn from(entries: [(&str, &str); N]) -> Self {
        Message {
            fields: entries
                .into_iter()
                .map(|(key, value)| {
                    (key.to_string(), Bytes::copy_from_slice(value.as_bytes()))
                })
                .collect(),
        }
    }
}

impl FromIterator<(String, Bytes)> for Message {
    fn from_iter<I: IntoIterator<Item = (String, Bytes)>>(iter: I) -> Self {
        Message {
            fields: iter.into_iter().collect(),
        }
    }
}
