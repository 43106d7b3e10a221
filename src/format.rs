//! Helpers for the cookie payload format: separator-delimited pairs wrapped in URL-safe text.
//!
//! There is no escaping. Keys and values containing [`PAIR_SEPARATOR`] or [`KV_SEPARATOR`] do
//! not survive a round trip; changing that would break every cookie already issued.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

use crate::{error::Result, state::KvState};

/// Separates one `key/value` pair from the next.
pub const PAIR_SEPARATOR: char = '\u{0}';

/// Separates a key from its value.
pub const KV_SEPARATOR: char = '\u{1}';

/// Serialize every entry of `kv`, in insertion order, into a single pair string.
pub fn dissolve(kv: &KvState) -> String {
    let mut data = String::new();
    for (i, (k, v)) in kv.iter().enumerate() {
        if i > 0 {
            data.push(PAIR_SEPARATOR);
        }
        data.push_str(k);
        data.push(KV_SEPARATOR);
        data.push_str(v);
    }
    data
}

/// Rebuild entries from a pair string into `kv` using [`KvState::load`].
///
/// Pairs that do not split into exactly a key and a value are logged and skipped.
pub fn resolve(data: &str, kv: &mut KvState) {
    for pair in split(data, PAIR_SEPARATOR) {
        match split(pair, KV_SEPARATOR).as_slice() {
            [k, v] => kv.load(*k, *v),
            parts => tracing::warn!(parts = ?parts, "unexpected KV string"),
        }
    }
}

/// Split on `separator`, skipping empty segments except a trailing one.
///
/// Keeping the trailing segment lets `"key\u{1}"` resolve to a key with an empty value.
pub(crate) fn split(content: &str, separator: char) -> Vec<&str> {
    if content.is_empty() {
        return Vec::new();
    }

    let mut parts = Vec::new();
    let mut start = 0;
    for (i, c) in content.char_indices() {
        if c != separator {
            continue;
        }
        if i > start {
            parts.push(&content[start..i]);
        }
        start = i + c.len_utf8();
    }
    parts.push(&content[start..]);
    parts
}

/// Encode cookie text so it is legal in a `Cookie` header.
pub fn encode_text(data: &str) -> String {
    URL_SAFE_NO_PAD.encode(data.as_bytes())
}

/// Reverse [`encode_text`].
pub fn decode_text(value: &str) -> Result<String> {
    let bytes = URL_SAFE_NO_PAD.decode(value.as_bytes())?;
    Ok(String::from_utf8(bytes)?)
}
