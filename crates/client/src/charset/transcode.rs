//! Lazy legacy-charset to UTF-8 transcoding reader.

use std::io::{self, Read};

use bytes::Bytes;
use crawlhtml_core::MalformedPolicy;
use encoding_rs::{Decoder, DecoderResult, Encoding};

/// Input consumed per decode step.
const CHUNK_SIZE: usize = 8192;

const REPLACEMENT: &[u8] = "\u{FFFD}".as_bytes();

/// Reader that decodes a legacy-encoded buffer into UTF-8 as it is read.
///
/// Nothing is decoded up front. Each refill decodes at most one chunk of
/// input, so a malformed sequence is only noticed once the reader reaches
/// it. Under [`MalformedPolicy::Fail`] every byte decoded before the bad
/// sequence is handed out first, then `read` fails with
/// [`io::ErrorKind::InvalidData`] from then on.
pub struct TranscodingReader {
    decoder: Decoder,
    input: Bytes,
    pos: usize,
    out: Vec<u8>,
    out_pos: usize,
    policy: MalformedPolicy,
    malformed_at: Option<usize>,
    finished: bool,
}

impl TranscodingReader {
    pub fn new(encoding: &'static Encoding, input: Bytes, policy: MalformedPolicy) -> Self {
        Self {
            decoder: encoding.new_decoder_without_bom_handling(),
            input,
            pos: 0,
            out: Vec::new(),
            out_pos: 0,
            policy,
            malformed_at: None,
            finished: false,
        }
    }

    /// The source encoding.
    pub fn encoding(&self) -> &'static Encoding {
        self.decoder.encoding()
    }

    /// Decode the next chunk of input into `out`.
    fn refill(&mut self) {
        let end = (self.pos + CHUNK_SIZE).min(self.input.len());
        let last = end == self.input.len();
        let src = &self.input[self.pos..end];

        let capacity = self
            .decoder
            .max_utf8_buffer_length_without_replacement(src.len())
            .unwrap_or(CHUNK_SIZE * 3)
            .max(REPLACEMENT.len());
        self.out.clear();
        self.out.resize(capacity, 0);
        self.out_pos = 0;

        let (result, read, written) = self.decoder.decode_to_utf8_without_replacement(src, &mut self.out, last);
        self.out.truncate(written);
        self.pos += read;

        match result {
            DecoderResult::InputEmpty => {
                if last {
                    self.finished = true;
                }
            }
            DecoderResult::OutputFull => {}
            DecoderResult::Malformed(_, _) => match self.policy {
                MalformedPolicy::Fail => {
                    self.malformed_at = Some(self.pos);
                    self.finished = true;
                }
                MalformedPolicy::Replace => self.out.extend_from_slice(REPLACEMENT),
            },
        }
    }
}

impl Read for TranscodingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            let pending = &self.out[self.out_pos..];
            if !pending.is_empty() {
                let n = pending.len().min(buf.len());
                buf[..n].copy_from_slice(&pending[..n]);
                self.out_pos += n;
                return Ok(n);
            }

            if let Some(offset) = self.malformed_at {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("malformed {} sequence ending at byte {offset}", self.encoding().name()),
                ));
            }

            if self.finished {
                return Ok(0);
            }

            self.refill();
        }
    }
}
