use core::fmt;

/// A parsed FITS header value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// FITS logical value (`T` or `F`).
    Logical(bool),
    /// FITS integer value.
    Integer(i64),
    /// FITS floating-point value.
    Float(f64),
    /// Quoted string content, or the raw text of a value that did not parse
    /// as anything else.
    String(String),
}

impl Value {
    /// Integers are promoted; floats pass through.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Integral floats are demoted; integers pass through.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Logical(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Logical(b) => write!(f, "{}", if *b { "T" } else { "F" }),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "{s}"),
        }
    }
}

/// Split an unquoted value field at the first `/`.
///
/// Returns `(value_part, optional_comment)`. The comment excludes the slash
/// and surrounding whitespace.
fn split_comment(field: &str) -> (&str, Option<&str>) {
    match field.find('/') {
        Some(idx) => {
            let comment = field[idx + 1..].trim();
            (&field[..idx], Some(comment).filter(|s| !s.is_empty()))
        }
        None => (field, None),
    }
}

/// Parse a quoted string value. `field` must start with `'`.
///
/// Doubled quotes collapse to one. An unterminated string is accepted as-is.
fn parse_string(field: &str) -> (Value, Option<&str>) {
    let mut value = String::new();
    let mut chars = field.char_indices().skip(1).peekable();
    let mut rest_start = field.len();

    while let Some((i, c)) = chars.next() {
        if c == '\'' {
            if matches!(chars.peek(), Some((_, '\''))) {
                value.push('\'');
                chars.next();
            } else {
                rest_start = i + 1;
                break;
            }
        } else {
            value.push(c);
        }
    }

    // FITS pads strings to 8 characters; trailing spaces are not significant.
    let trimmed = value.trim_end().to_string();
    let (_, comment) = split_comment(&field[rest_start..]);
    (Value::String(trimmed), comment)
}

/// `[+-]digits`
fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a decimal or exponential literal, including Fortran `D` exponents.
///
/// Rejects `inf`/`nan` spellings that `str::parse` would otherwise accept.
fn parse_float_str(s: &str) -> Option<f64> {
    let allowed =
        |b: u8| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E' | b'd' | b'D');
    if !s.bytes().all(allowed) || !s.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    s.replace(|c: char| c == 'D' || c == 'd', "E").parse::<f64>().ok()
}

/// Parse the value field of a card (everything after the `=` indicator).
///
/// Returns `None` when the field holds no value (blank, or only a comment).
/// A non-blank value that matches no typed form is kept as a raw
/// [`Value::String`].
pub fn parse_value(field: &str) -> Option<(Value, Option<&str>)> {
    let field = field.trim_start();
    if field.starts_with('\'') {
        return Some(parse_string(field));
    }

    let (val_part, comment) = split_comment(field);
    let text = val_part.trim();
    if text.is_empty() {
        return None;
    }

    let value = match text {
        "T" => Value::Logical(true),
        "F" => Value::Logical(false),
        _ if is_integer_literal(text) => match text.parse::<i64>() {
            Ok(n) => Value::Integer(n),
            Err(_) => parse_float_str(text)
                .map(Value::Float)
                .unwrap_or_else(|| Value::String(text.to_string())),
        },
        _ => match parse_float_str(text) {
            Some(f) => Value::Float(f),
            None => Value::String(text.to_string()),
        },
    };
    Some((value, comment))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(field: &str) -> Value {
        parse_value(field).unwrap().0
    }

    #[test]
    fn parse_logical_with_comment() {
        let (val, comment) = parse_value("                   T / this is a flag").unwrap();
        assert_eq!(val, Value::Logical(true));
        assert_eq!(comment, Some("this is a flag"));
        assert_eq!(parsed("F"), Value::Logical(false));
    }

    #[test]
    fn parse_integers() {
        assert_eq!(parsed("                  42"), Value::Integer(42));
        assert_eq!(parsed("                 -99"), Value::Integer(-99));
        assert_eq!(parsed("+7"), Value::Integer(7));
        let (val, comment) = parse_value("                1024 / block count").unwrap();
        assert_eq!(val, Value::Integer(1024));
        assert_eq!(comment, Some("block count"));
    }

    #[test]
    fn parse_floats() {
        assert_eq!(parsed("             9.80665"), Value::Float(9.80665));
        assert_eq!(parsed("-0.001"), Value::Float(-0.001));
        assert_eq!(parsed("1.234E+05"), Value::Float(1.234e5));
        assert_eq!(parsed("1.5D-3"), Value::Float(1.5e-3));
        assert_eq!(parsed("100."), Value::Float(100.0));
    }

    #[test]
    fn integer_overflow_becomes_float() {
        assert_eq!(parsed("99999999999999999999"), Value::Float(1e20));
    }

    #[test]
    fn comment_without_spaces() {
        let (val, comment) = parse_value("-32/No. of bits per pixel").unwrap();
        assert_eq!(val, Value::Integer(-32));
        assert_eq!(comment, Some("No. of bits per pixel"));
    }

    #[test]
    fn parse_strings() {
        let (val, comment) = parse_value(" 'Hubble  '           / telescope name").unwrap();
        assert_eq!(val, Value::String("Hubble".into()));
        assert_eq!(comment, Some("telescope name"));
        assert_eq!(parsed("'it''s ok '"), Value::String("it's ok".into()));
        assert_eq!(parsed("'RA---TAN'"), Value::String("RA---TAN".into()));
    }

    #[test]
    fn slash_inside_string_is_not_a_comment() {
        let (val, comment) = parse_value("'2024/01/15' / date").unwrap();
        assert_eq!(val, Value::String("2024/01/15".into()));
        assert_eq!(comment, Some("date"));
    }

    #[test]
    fn unterminated_string_is_lenient() {
        assert_eq!(parsed("'abc  "), Value::String("abc".into()));
    }

    #[test]
    fn unparseable_value_kept_raw() {
        assert_eq!(parsed("  1.2.3x  / junk"), Value::String("1.2.3x".into()));
        assert_eq!(parsed("inf"), Value::String("inf".into()));
        assert_eq!(parsed("NaN"), Value::String("NaN".into()));
    }

    #[test]
    fn blank_field_has_no_value() {
        assert!(parse_value("").is_none());
        assert!(parse_value("                    ").is_none());
        assert!(parse_value("                      / undefined value").is_none());
    }

    #[test]
    fn coercions() {
        assert_eq!(Value::Integer(3).as_f64(), Some(3.0));
        assert_eq!(Value::Float(4.0).as_i64(), Some(4));
        assert_eq!(Value::Float(4.5).as_i64(), None);
        assert_eq!(Value::String("x".into()).as_f64(), None);
        assert_eq!(Value::Logical(true).as_bool(), Some(true));
    }
}
