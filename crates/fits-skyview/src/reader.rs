//! Block-oriented header record reading.
//!
//! A FITS header is a sequence of 2880-byte blocks, each holding 36 fixed
//! 80-byte records. Reading stops at the first record starting with `END`;
//! nothing past the block containing it is consumed.

use std::borrow::Cow;
use std::io::{ErrorKind, Read};

use log::warn;

use crate::block::{is_end_record, BLOCK_SIZE, CARD_SIZE};
use crate::error::{Error, Result};

/// One raw 80-byte header record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRecord {
    bytes: [u8; CARD_SIZE],
}

impl HeaderRecord {
    /// Wrap raw record bytes.
    pub fn new(bytes: [u8; CARD_SIZE]) -> Self {
        Self { bytes }
    }

    /// Build a record from text, truncated or space-padded to 80 bytes.
    pub fn from_text(text: &str) -> Self {
        let mut bytes = [b' '; CARD_SIZE];
        let src = text.as_bytes();
        let len = src.len().min(CARD_SIZE);
        bytes[..len].copy_from_slice(&src[..len]);
        Self { bytes }
    }

    pub fn bytes(&self) -> &[u8; CARD_SIZE] {
        &self.bytes
    }

    /// Decoded text of the record.
    ///
    /// Pure ASCII records borrow the underlying bytes. Anything else is
    /// decoded one character per byte (Latin-1), which cannot fail.
    pub fn text(&self) -> Cow<'_, str> {
        match std::str::from_utf8(&self.bytes) {
            Ok(s) if s.is_ascii() => Cow::Borrowed(s),
            _ => Cow::Owned(self.bytes.iter().map(|&b| b as char).collect()),
        }
    }

    /// Returns `true` if this is the header terminator.
    pub fn is_end(&self) -> bool {
        is_end_record(&self.bytes)
    }
}

/// Records read from the front of a FITS stream.
#[derive(Debug, Clone, Default)]
pub struct HeaderRecords {
    records: Vec<HeaderRecord>,
    terminated: bool,
    blocks_read: usize,
}

impl HeaderRecords {
    pub fn records(&self) -> &[HeaderRecord] {
        &self.records
    }

    /// `true` if the `END` record was found.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Header length in whole blocks, i.e. the byte offset of the data unit.
    pub fn byte_len(&self) -> usize {
        self.blocks_read * BLOCK_SIZE
    }

    /// Fail with [`Error::MalformedHeader`] if no terminator was found.
    pub fn require_terminated(&self) -> Result<()> {
        if self.terminated {
            Ok(())
        } else {
            Err(Error::MalformedHeader(format!(
                "no END record in {} header records",
                self.records.len()
            )))
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Fill `buf` from `source`, returning how many bytes were read before EOF.
fn read_up_to<R: Read>(source: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Io(e)),
        }
    }
    Ok(filled)
}

/// Read header records block by block until the `END` record.
///
/// Reaching end of input before `END` is not an error: the complete records
/// read so far are returned and [`HeaderRecords::is_terminated`] is `false`.
/// A trailing partial block still contributes its complete records.
pub fn read_header_records<R: Read>(mut source: R) -> Result<HeaderRecords> {
    let mut out = HeaderRecords::default();
    let mut block = [0u8; BLOCK_SIZE];

    loop {
        let filled = read_up_to(&mut source, &mut block)?;
        if filled == 0 {
            break;
        }
        out.blocks_read += 1;

        for chunk in block[..filled].chunks_exact(CARD_SIZE) {
            let mut bytes = [b' '; CARD_SIZE];
            bytes.copy_from_slice(chunk);
            let record = HeaderRecord::new(bytes);
            let is_end = record.is_end();
            out.records.push(record);
            if is_end {
                out.terminated = true;
                return Ok(out);
            }
        }

        if filled < BLOCK_SIZE {
            break;
        }
    }

    warn!(
        "header ended after {} records without an END record",
        out.records.len()
    );
    Ok(out)
}
