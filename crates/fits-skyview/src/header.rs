//! Header model built from sanitized card text.
//!
//! Each line is one card in the fixed 80-column layout: keyword in columns
//! 1-8, `=` in column 9 when the card has a value, value and optional
//! `/ comment` after it. Parsing never fails; cards whose value does not fit
//! a typed form keep their raw text.

use crate::block::KEYWORD_LEN;
use crate::error::{Error, Result};
use crate::reader::HeaderRecord;
use crate::sanitize::sanitize_records;
use crate::value::{parse_value, Value};

/// A parsed header card.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    /// Upper-cased keyword with trailing spaces removed.
    pub keyword: String,
    /// The parsed value, if column 9 holds the `=` indicator and the value
    /// field is not blank.
    pub value: Option<Value>,
    /// Inline comment, or the free text of a card without a value.
    pub comment: Option<String>,
}

impl Card {
    /// Returns `true` if this card is the END keyword.
    pub fn is_end(&self) -> bool {
        self.keyword == "END"
    }

    /// Returns `true` if this is a blank card (keyword is all spaces).
    pub fn is_blank(&self) -> bool {
        self.keyword.is_empty()
    }

    /// Returns `true` if this card carries a commentary keyword
    /// (COMMENT, HISTORY, or blank).
    pub fn is_commentary(&self) -> bool {
        self.keyword == "COMMENT" || self.keyword == "HISTORY" || self.is_blank()
    }
}

/// Canonical lookup form of a keyword: trimmed, upper-case, at most 8 chars.
pub fn normalize_keyword(keyword: &str) -> String {
    keyword
        .trim()
        .chars()
        .take(KEYWORD_LEN)
        .collect::<String>()
        .to_ascii_uppercase()
}

fn free_text(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Parse one line of sanitized header text.
pub fn parse_card(line: &str) -> Card {
    let keyword_end = line
        .char_indices()
        .nth(KEYWORD_LEN)
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    let keyword = line[..keyword_end].trim_end().to_ascii_uppercase();
    let rest = &line[keyword_end..];

    let mut card = Card {
        keyword,
        value: None,
        comment: None,
    };

    if card.is_end() {
        return card;
    }

    if card.is_commentary() {
        card.comment = free_text(rest);
        return card;
    }

    // `rest` starts at the value indicator column.
    match rest.strip_prefix('=') {
        Some(field) => match parse_value(field) {
            Some((value, comment)) => {
                card.value = Some(value);
                card.comment = comment.map(String::from);
            }
            None => {
                card.comment = field.find('/').and_then(|i| free_text(&field[i + 1..]));
            }
        },
        None => card.comment = free_text(rest),
    }
    card
}

/// Ordered, immutable collection of header cards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    cards: Vec<Card>,
}

impl Header {
    /// Parse sanitized header text, one card per line, up to the END card.
    pub fn parse(text: &str) -> Self {
        let mut cards = Vec::new();
        for line in text.lines() {
            let card = parse_card(line);
            let is_end = card.is_end();
            cards.push(card);
            if is_end {
                break;
            }
        }
        Self { cards }
    }

    /// Sanitize raw records and parse the result.
    pub fn from_records(records: &[HeaderRecord]) -> Self {
        Self::parse(&sanitize_records(records))
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Value of the first card carrying `keyword` (case-insensitive).
    pub fn get(&self, keyword: &str) -> Option<&Value> {
        let key = normalize_keyword(keyword);
        self.cards
            .iter()
            .filter(|c| c.keyword == key)
            .find_map(|c| c.value.as_ref())
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.get(keyword).is_some()
    }

    fn coerce<'a, T>(
        &'a self,
        keyword: &str,
        expected: &'static str,
        convert: impl Fn(&'a Value) -> Option<T>,
    ) -> Result<Option<T>> {
        match self.get(keyword) {
            None => Ok(None),
            Some(v) => convert(v).map(Some).ok_or_else(|| Error::TypeMismatch {
                keyword: normalize_keyword(keyword),
                expected,
            }),
        }
    }

    fn require<T>(&self, keyword: &str, found: Option<T>) -> Result<T> {
        found.ok_or_else(|| Error::MissingKeyword(normalize_keyword(keyword)))
    }

    pub fn str_opt(&self, keyword: &str) -> Result<Option<&str>> {
        self.coerce(keyword, "a string", Value::as_str)
    }

    pub fn int_opt(&self, keyword: &str) -> Result<Option<i64>> {
        self.coerce(keyword, "an integer", Value::as_i64)
    }

    pub fn float_opt(&self, keyword: &str) -> Result<Option<f64>> {
        self.coerce(keyword, "a number", Value::as_f64)
    }

    pub fn bool_opt(&self, keyword: &str) -> Result<Option<bool>> {
        self.coerce(keyword, "a logical", Value::as_bool)
    }

    pub fn get_str(&self, keyword: &str) -> Result<&str> {
        let found = self.str_opt(keyword)?;
        self.require(keyword, found)
    }

    pub fn get_int(&self, keyword: &str) -> Result<i64> {
        let found = self.int_opt(keyword)?;
        self.require(keyword, found)
    }

    pub fn get_float(&self, keyword: &str) -> Result<f64> {
        let found = self.float_opt(keyword)?;
        self.require(keyword, found)
    }

    pub fn get_bool(&self, keyword: &str) -> Result<bool> {
        let found = self.bool_opt(keyword)?;
        self.require(keyword, found)
    }

    pub fn bitpix(&self) -> Result<i64> {
        self.get_int("BITPIX")
    }

    /// Axis lengths `[NAXIS1, NAXIS2, ...]`.
    pub fn axes(&self) -> Result<Vec<usize>> {
        let naxis = self.get_int("NAXIS")?;
        if naxis < 0 {
            return Err(Error::MalformedHeader(format!("negative NAXIS {naxis}")));
        }
        (1..=naxis)
            .map(|i| {
                let key = format!("NAXIS{i}");
                let len = self.get_int(&key)?;
                usize::try_from(len)
                    .map_err(|_| Error::MalformedHeader(format!("negative {key} {len}")))
            })
            .collect()
    }
}
