//! Decodes the raw token text the lexer kept for numeric/character/string
//! literals. Shared by the constant folder (integer and character values)
//! and the IR generator (string byte contents), so the escape/base rules
//! live in exactly one place.

/// Parses an integer literal's source text (decimal, `0x`/`0X` hex, or
/// leading-zero octal) the way the lexer's regex already guarantees is
/// well-formed.
pub fn parse_int_literal(text: &str) -> i32 {
    let v = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).unwrap_or(0)
    } else if text.len() > 1 && text.starts_with('0') {
        i64::from_str_radix(text, 8).unwrap_or(0)
    } else {
        text.parse::<i64>().unwrap_or(0)
    };
    v as i32
}

pub fn parse_float_literal(text: &str) -> f32 {
    text.parse::<f64>().unwrap_or(0.0) as f32
}

/// Decodes one escape sequence (or literal byte) at the front of `s`,
/// returning the decoded byte and the remaining input.
fn decode_one<'a>(s: &'a str) -> (u8, &'a str) {
    let mut chars = s.chars();
    match chars.next() {
        Some('\\') => {
            let rest = chars.as_str();
            let mut it = rest.chars();
            match it.next() {
                Some('n') => (b'\n', it.as_str()),
                Some('t') => (b'\t', it.as_str()),
                Some('r') => (b'\r', it.as_str()),
                Some('0') => (0u8, it.as_str()),
                Some('\\') => (b'\\', it.as_str()),
                Some('\'') => (b'\'', it.as_str()),
                Some('"') => (b'"', it.as_str()),
                Some(other) => (other as u8, it.as_str()),
                None => (b'\\', ""),
            }
        }
        Some(c) => (c as u8, chars.as_str()),
        None => (0, ""),
    }
}

/// A single-quoted character literal's text, including the quotes, e.g.
/// `"'a'"` or `"'\\n'"`. Returns the literal's integer (`char`-typed)
/// value.
pub fn parse_char_literal(text: &str) -> i32 {
    let inner = &text[1..text.len() - 1];
    decode_one(inner).0 as i32
}

/// A double-quoted string literal's text, including the quotes. Returns
/// the escape-decoded bytes, *not* null-terminated (the IR generator
/// appends the terminator itself).
pub fn decode_string_literal(text: &str) -> Vec<u8> {
    let inner = &text[1..text.len() - 1];
    let mut bytes = Vec::new();
    let mut rest = inner;
    while !rest.is_empty() {
        let (b, r) = decode_one(rest);
        bytes.push(b);
        rest = r;
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_hex_octal() {
        assert_eq!(parse_int_literal("42"), 42);
        assert_eq!(parse_int_literal("0x2A"), 42);
        assert_eq!(parse_int_literal("052"), 42);
        assert_eq!(parse_int_literal("0"), 0);
    }

    #[test]
    fn char_escapes() {
        assert_eq!(parse_char_literal("'a'"), b'a' as i32);
        assert_eq!(parse_char_literal("'\\n'"), b'\n' as i32);
        assert_eq!(parse_char_literal("'\\''"), b'\'' as i32);
    }

    #[test]
    fn string_escapes() {
        assert_eq!(decode_string_literal("\"ab\\n\""), vec![b'a', b'b', b'\n']);
        assert_eq!(decode_string_literal("\"\""), Vec::<u8>::new());
    }
}
