//! Path Key Codec
//!
//! Reversible mapping from hierarchical paths to storage-safe node keys.
//! Keys never contain `.` or `$`, which document stores reserve for field
//! structure. `%` is the escape character and is itself escaped, so two
//! distinct paths can never encode to the same key.

use crate::types::NodeKey;

const ESCAPE: char = '%';

/// Characters rewritten by [`encode`], with their two-digit hex escapes.
const RESERVED: [(char, &str); 3] = [('%', "25"), ('.', "2E"), ('$', "24")];

/// Encode a path into a node key.
pub fn encode(path: &str) -> NodeKey {
    let mut key = String::with_capacity(path.len());
    for ch in path.chars() {
        match RESERVED.iter().find(|(reserved, _)| *reserved == ch) {
            Some((_, hex)) => {
                key.push(ESCAPE);
                key.push_str(hex);
            }
            None => key.push(ch),
        }
    }
    key
}

/// Decode a node key produced by [`encode`] back into its path.
///
/// Escape sequences that [`encode`] never emits are kept verbatim.
pub fn decode(key: &str) -> String {
    let mut path = String::with_capacity(key.len());
    let mut rest = key;
    while let Some(pos) = rest.find(ESCAPE) {
        path.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];
        let escaped = tail
            .get(..2)
            .and_then(|hex| RESERVED.iter().find(|(_, h)| h.eq_ignore_ascii_case(hex)));
        match escaped {
            Some((ch, _)) => {
                path.push(*ch);
                rest = &tail[2..];
            }
            None => {
                path.push(ESCAPE);
                rest = tail;
            }
        }
    }
    path.push_str(rest);
    path
}

/// Encode an optional path; `None` stays `None`.
pub fn encode_opt(path: Option<&str>) -> Option<NodeKey> {
    path.map(encode)
}

/// Decode an optional key; `None` stays `None`.
pub fn decode_opt(key: Option<&str>) -> Option<String> {
    key.map(decode)
}
