//! Reduce header records to printable ASCII text.
//!
//! Bytes outside 32..=126 (control characters, tab, anything >= 127) are
//! dropped rather than replaced, so column offsets after a dropped byte shift
//! left. Downstream parsing tolerates that.

use crate::reader::HeaderRecord;

fn is_printable(b: u8) -> bool {
    (32..=126).contains(&b)
}

/// Keep only printable ASCII bytes of one record.
pub fn sanitize_record(record: &HeaderRecord) -> String {
    record
        .bytes()
        .iter()
        .filter(|&&b| is_printable(b))
        .map(|&b| b as char)
        .collect()
}

/// Sanitize every record and join them with `\n`, including a trailing `\n`.
pub fn sanitize_records(records: &[HeaderRecord]) -> String {
    let mut out = String::with_capacity(records.len() * 81);
    for record in records {
        out.push_str(&sanitize_record(record));
        out.push('\n');
    }
    out
}

/// Keep only printable ASCII characters and newlines.
pub fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|&c| c == '\n' || (c.is_ascii() && is_printable(c as u8)))
        .collect()
}
