//! Best-guess charset detection for HTML documents.
//!
//! The detector looks at content only; a `Content-Type` header is never
//! consulted. It returns exactly one guess, taken from the first step that
//! yields one:
//!
//! 1. Byte order mark.
//! 2. `<meta charset>` or `<meta http-equiv="Content-Type">` declaration in the
//!    first 1024 bytes, kept only if the whole buffer decodes cleanly under it
//!    and, for non-UTF-8 labels, the buffer is not already non-ASCII UTF-8.
//! 3. Plain 7-bit text without escape bytes, which is already UTF-8.
//! 4. Statistical guess over the full buffer (`chardetng`).

use std::sync::LazyLock;

use chardetng::EncodingDetector;
use crawlhtml_core::DetectionError;
use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};
use regex::bytes::Regex;

use super::registry::CANONICAL_CHARSET;

/// How many leading bytes are searched for a `<meta>` declaration.
const PRESCAN_LIMIT: usize = 1024;

const ESC: u8 = 0x1B;

static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i-u)<meta\b[^>]*?charset\s*=\s*["']?\s*([a-z0-9_:.+\-]+)"#).unwrap()
});

/// Where a detected charset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionSource {
    ByteOrderMark,
    MetaDeclaration,
    Ascii,
    Statistical,
}

/// The detector's best guess for one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedCharset {
    label: String,
    encoding: &'static Encoding,
    source: DetectionSource,
}

impl DetectedCharset {
    fn from_encoding(encoding: &'static Encoding, source: DetectionSource) -> Self {
        Self { label: encoding.name().to_string(), encoding, source }
    }

    /// Charset label as reported to callers.
    ///
    /// For a `<meta>` declaration this is the label exactly as written in the
    /// document; otherwise it is the encoding's canonical name.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The encoding the label resolves to.
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub fn source(&self) -> DetectionSource {
        self.source
    }

    /// Whether the bytes are already in the canonical encoding.
    pub fn is_canonical(&self) -> bool {
        self.encoding.name() == CANONICAL_CHARSET
    }
}

/// HTML-aware charset detector.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlDetector;

impl HtmlDetector {
    pub fn new() -> Self {
        Self
    }

    /// Return the single most likely charset of `data`.
    ///
    /// # Errors
    ///
    /// Returns `DetectionError::Empty` when there is nothing to inspect.
    pub fn detect_best(&self, data: &[u8]) -> Result<DetectedCharset, DetectionError> {
        if data.is_empty() {
            return Err(DetectionError::Empty);
        }

        if let Some((encoding, _)) = Encoding::for_bom(data) {
            return Ok(DetectedCharset::from_encoding(encoding, DetectionSource::ByteOrderMark));
        }

        if let Some(declared) = declared_charset(data) {
            return Ok(declared);
        }

        if data.is_ascii() && !data.contains(&ESC) {
            return Ok(DetectedCharset::from_encoding(UTF_8, DetectionSource::Ascii));
        }

        let mut detector = EncodingDetector::new();
        detector.feed(data, true);
        let encoding = detector.guess(None, true);

        Ok(DetectedCharset::from_encoding(encoding, DetectionSource::Statistical))
    }
}

/// Charset named by a `<meta>` element, if the bytes agree with it.
fn declared_charset(data: &[u8]) -> Option<DetectedCharset> {
    let head = &data[..data.len().min(PRESCAN_LIMIT)];
    let raw = META_CHARSET.captures(head)?.get(1)?.as_bytes();
    let label = std::str::from_utf8(raw).ok()?;

    // A document cannot declare itself UTF-16 from inside an ASCII-compatible <meta>.
    let encoding = match Encoding::for_label(raw)? {
        e if e == UTF_16LE || e == UTF_16BE => UTF_8,
        e => e,
    };

    // Single-byte encodings accept every byte, so a clean decode proves nothing
    // when the content is already non-ASCII UTF-8.
    let utf8_content = encoding != UTF_8 && !data.is_ascii() && std::str::from_utf8(data).is_ok();

    if utf8_content || encoding.decode_without_bom_handling_and_without_replacement(data).is_none() {
        tracing::debug!(label, encoding = encoding.name(), "ignoring charset declaration contradicted by content");
        return None;
    }

    Some(DetectedCharset { label: label.to_string(), encoding, source: DetectionSource::MetaDeclaration })
}
