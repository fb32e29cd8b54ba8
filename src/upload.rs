//! Uploaded bytes in, decoded text lines out.
//!
//! Lines are decoded one at a time, so an invalid byte sequence is only
//! reported once the ingestor reaches it. Records flushed from earlier lines
//! stay committed.

use std::borrow::Cow;
use std::io::Read;

use flate2::read::MultiGzDecoder;

use crate::error::GenevizError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const UTF8_BOM: [u8; 3] = [0xef, 0xbb, 0xbf];

/// Returns the plain payload, gunzipping it first when it carries the gzip magic.
/// Every concatenated member is decoded, so bgzip files come through whole.
pub fn decompress(bytes: &[u8]) -> Result<Cow<'_, [u8]>, GenevizError> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(Cow::Borrowed(bytes));
    }
    let mut decoder = MultiGzDecoder::new(bytes);
    let mut plain = Vec::new();
    decoder
        .read_to_end(&mut plain)
        .map_err(|err| GenevizError::Decode(format!("gzip: {err}")))?;
    Ok(Cow::Owned(plain))
}

pub fn lines(bytes: &[u8]) -> UploadLines<'_> {
    UploadLines {
        rest: bytes.strip_prefix(&UTF8_BOM).unwrap_or(bytes),
        line_number: 0,
    }
}

/// Iterator over `\n` / `\r\n` terminated lines. A trailing terminator does not
/// produce an extra empty line.
#[derive(Debug, Clone)]
pub struct UploadLines<'a> {
    rest: &'a [u8],
    line_number: usize,
}

impl<'a> Iterator for UploadLines<'a> {
    type Item = Result<&'a str, GenevizError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        let (line, rest) = match self.rest.iter().position(|byte| *byte == b'\n') {
            Some(end) => (&self.rest[..end], &self.rest[end + 1..]),
            None => (self.rest, &[][..]),
        };
        self.rest = rest;
        self.line_number += 1;
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        Some(std::str::from_utf8(line).map_err(|err| {
            GenevizError::Decode(format!("line {}: {err}", self.line_number))
        }))
    }
}
