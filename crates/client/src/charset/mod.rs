//! Charset resolution and transcoding to UTF-8.
//!
//! ### Detection
//! - Content-based only, one best guess, no fallback candidates.
//!
//! ### Output
//! - UTF-8 input passes through byte-for-byte.
//! - EUC-JP, ISO-2022-JP and Shift_JIS are decoded lazily as the reader is drained.
//! - Anything else is rejected with the detected label, never guessed at.

pub mod detect;
pub mod registry;
pub mod transcode;

use std::io::{self, Cursor, Read};

use bytes::Bytes;
use crawlhtml_core::{Error, MalformedPolicy};

pub use detect::{DetectedCharset, DetectionSource, HtmlDetector};
pub use registry::{CANONICAL_CHARSET, SUPPORTED_CHARSETS};
pub use transcode::TranscodingReader;

/// Single-pass UTF-8 reader over a fetched document.
pub struct HtmlReader {
    charset: DetectedCharset,
    inner: Inner,
}

enum Inner {
    PassThrough(Cursor<Bytes>),
    Transcoded(TranscodingReader),
}

impl HtmlReader {
    /// The charset the document was detected as.
    pub fn charset(&self) -> &DetectedCharset {
        &self.charset
    }

    /// Whether output is the input bytes unchanged.
    pub fn is_pass_through(&self) -> bool {
        matches!(self.inner, Inner::PassThrough(_))
    }
}

impl Read for HtmlReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            Inner::PassThrough(cursor) => cursor.read(buf),
            Inner::Transcoded(reader) => reader.read(buf),
        }
    }
}

impl std::fmt::Debug for HtmlReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlReader")
            .field("charset", &self.charset.label())
            .field("pass_through", &self.is_pass_through())
            .finish()
    }
}

/// Detect the charset of `body` and wrap it in a UTF-8 reader.
///
/// # Errors
///
/// - `Error::Detection` if the detector has no guess (empty input).
/// - `Error::UnsupportedCharset` if the guess is neither UTF-8 nor a
///   registered legacy charset; the message carries the label verbatim.
pub fn resolve(body: Bytes, policy: MalformedPolicy) -> Result<HtmlReader, Error> {
    let charset = HtmlDetector::new().detect_best(&body)?;

    tracing::debug!(
        label = charset.label(),
        encoding = charset.encoding().name(),
        source = ?charset.source(),
        bytes = body.len(),
        "detected charset"
    );

    if charset.is_canonical() {
        return Ok(HtmlReader { charset, inner: Inner::PassThrough(Cursor::new(body)) });
    }

    let encoding = registry::lookup(charset.encoding().name())
        .ok_or_else(|| Error::UnsupportedCharset(charset.label().to_string()))?;

    Ok(HtmlReader { charset, inner: Inner::Transcoded(TranscodingReader::new(encoding, body, policy)) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{EUC_JP, Encoding, ISO_2022_JP, SHIFT_JIS};

    const TEXT: &str = "<html><head><title>お知らせ</title></head><body>\
        <p>本日は晴天なり。携帯サイトをご利用いただきありがとうございます。</p>\
        <p>メールアドレスの変更はこちらのページから行ってください。</p>\
        <p>ご不明な点がございましたら、お気軽にお問い合わせください。</p>\
        </body></html>";

    fn drain(mut reader: HtmlReader) -> Vec<u8> {
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        out
    }

    fn round_trip(encoding: &'static Encoding) {
        let (bytes, _, had_errors) = encoding.encode(TEXT);
        assert!(!had_errors);

        let reader = resolve(Bytes::from(bytes.into_owned()), MalformedPolicy::Fail).unwrap();
        assert_eq!(reader.charset().label(), encoding.name());
        assert!(!reader.is_pass_through());
        assert_eq!(String::from_utf8(drain(reader)).unwrap(), TEXT);
    }

    #[test]
    fn test_utf8_passes_through_unchanged() {
        let body = Bytes::from_static(TEXT.as_bytes());
        let reader = resolve(body.clone(), MalformedPolicy::Fail).unwrap();
        assert!(reader.is_pass_through());
        assert_eq!(drain(reader), body.to_vec());
    }

    #[test]
    fn test_utf8_bom_kept() {
        let mut data = b"\xEF\xBB\xBF".to_vec();
        data.extend_from_slice(TEXT.as_bytes());
        let reader = resolve(Bytes::from(data.clone()), MalformedPolicy::Fail).unwrap();
        assert_eq!(drain(reader), data);
    }

    #[test]
    fn test_ascii_passes_through_unchanged() {
        let body = Bytes::from_static(b"<html><body>plain</body></html>");
        let reader = resolve(body.clone(), MalformedPolicy::Fail).unwrap();
        assert_eq!(drain(reader), body.to_vec());
    }

    #[test]
    fn test_round_trip_shift_jis() {
        round_trip(SHIFT_JIS);
    }

    #[test]
    fn test_round_trip_euc_jp() {
        round_trip(EUC_JP);
    }

    #[test]
    fn test_round_trip_iso_2022_jp() {
        round_trip(ISO_2022_JP);
    }

    #[test]
    fn test_declared_label_drives_decoder() {
        let html = format!(r#"<meta http-equiv="Content-Type" content="text/html; charset=euc-jp">{TEXT}"#);
        let (bytes, _, _) = EUC_JP.encode(&html);
        let reader = resolve(Bytes::from(bytes.into_owned()), MalformedPolicy::Fail).unwrap();
        assert_eq!(reader.charset().label(), "euc-jp");
        assert_eq!(String::from_utf8(drain(reader)).unwrap(), html);
    }

    #[test]
    fn test_unsupported_charset_rejected() {
        let body = Bytes::from_static(b"<html><head><meta charset=\"ISO-8859-1\"></head><body>caf\xE9</body></html>");
        let err = resolve(body, MalformedPolicy::Fail).unwrap_err();
        assert!(matches!(&err, Error::UnsupportedCharset(label) if label == "ISO-8859-1"));
        assert!(err.to_string().contains("ISO-8859-1"));
    }

    #[test]
    fn test_stale_latin1_declaration_passes_utf8_through() {
        let html = format!(r#"<meta charset="iso-8859-1">{TEXT}"#);
        let body = Bytes::from(html.clone().into_bytes());
        let reader = resolve(body, MalformedPolicy::Fail).unwrap();
        assert!(reader.is_pass_through());
        assert_eq!(String::from_utf8(drain(reader)).unwrap(), html);
    }

    #[test]
    fn test_undeclared_latin1_rejected() {
        let body = Bytes::from_static(
            b"<html><body><p>Le caf\xE9 cr\xE8me et la cr\xE8me br\xFBl\xE9e sont servis \xE0 la fen\xEAtre. \
              Une na\xEFve fa\xE7ade, un \xE9t\xE9 tr\xE8s agr\xE9able \xE0 No\xEBl.</p></body></html>",
        );
        let err = resolve(body, MalformedPolicy::Fail).unwrap_err();
        assert!(matches!(&err, Error::UnsupportedCharset(label) if label == "windows-1252"));
        assert!(err.to_string().contains("[windows-1252]"));
    }

    #[test]
    fn test_empty_body_detection_error() {
        let err = resolve(Bytes::new(), MalformedPolicy::Fail).unwrap_err();
        assert!(matches!(err, Error::Detection(_)));
    }

    #[test]
    fn test_replace_policy_still_decodes() {
        let (bytes, _, _) = ISO_2022_JP.encode(TEXT);
        let reader = resolve(Bytes::from(bytes.into_owned()), MalformedPolicy::Replace).unwrap();
        assert_eq!(String::from_utf8(drain(reader)).unwrap(), TEXT);
    }
}
