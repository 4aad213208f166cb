//! Decoders for the legacy charsets we accept.

use encoding_rs::Encoding;

/// Canonical output encoding name.
pub const CANONICAL_CHARSET: &str = "UTF-8";

/// Charsets with a registered decoder, by canonical name.
pub const SUPPORTED_CHARSETS: [&str; 3] = ["EUC-JP", "ISO-2022-JP", "Shift_JIS"];

/// Look up the decoder for a canonical charset name.
///
/// Names are matched exactly as `encoding_rs` spells them.
pub fn lookup(name: &str) -> Option<&'static Encoding> {
    if !SUPPORTED_CHARSETS.contains(&name) {
        return None;
    }
    Encoding::for_label(name.as_bytes())
}
