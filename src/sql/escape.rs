//! Escaping for SQL literals and delimited identifiers.

/// Double every occurrence of `quote_char` in `s`.
///
/// SQL escapes its delimiters by repetition, never with a backslash:
/// `O'Brien` inside single quotes is `O''Brien`, `a]b` inside brackets is
/// `a]]b`.
pub fn escape_string_for_quote(s: &str, quote_char: char) -> String {
    let mut result = String::with_capacity(s.len() + 2);
    for c in s.chars() {
        if c == quote_char {
            result.push(c);
        }
        result.push(c);
    }
    result
}

/// Body of a single-quoted string literal.
#[inline]
pub fn escape_string(s: &str) -> String {
    escape_string_for_quote(s, '\'')
}

/// `'s'` with embedded quotes doubled.
pub fn quote_string(s: &str) -> String {
    format!("'{}'", escape_string(s))
}
