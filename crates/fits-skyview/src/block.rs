//! FITS block and card geometry.

/// Every header and data unit occupies a whole number of 2880-byte blocks.
pub const BLOCK_SIZE: usize = 2880;

/// One header card.
pub const CARD_SIZE: usize = 80;

pub const CARDS_PER_BLOCK: usize = BLOCK_SIZE / CARD_SIZE;

/// Columns 1-8 of a card hold the keyword.
pub const KEYWORD_LEN: usize = 8;

/// Size of `num_bytes` rounded up to whole blocks.
pub const fn padded_byte_len(num_bytes: usize) -> usize {
    num_bytes.div_ceil(BLOCK_SIZE) * BLOCK_SIZE
}

/// `true` for the header terminator: any record starting with `END`.
pub fn is_end_record(record: &[u8]) -> bool {
    record.starts_with(b"END")
}
