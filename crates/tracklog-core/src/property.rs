//! Object properties and the wire escaping rules.
//!
//! Property values travel on a comma-separated line, so a literal `,` is
//! escaped as `\,` and a literal newline as `\` followed by a real newline.
//! No other characters are escaped.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single key/value property of an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub key: String,
    pub value: String,
}

impl Property {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Split a property list on unescaped commas.
///
/// A `\` yields the following character literally, suppressing its role as
/// separator or escape. Empty tokens are preserved; callers filter them. A
/// dangling trailing `\` is an error.
pub fn split_property_tokens(s: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            escaped = false;
            current.push(ch);
            continue;
        }
        match ch {
            '\\' => escaped = true,
            ',' => tokens.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }

    if escaped {
        return Err(Error::FrameParse(format!("dangling escape in `{s}`")));
    }

    tokens.push(current);
    Ok(tokens)
}

/// Escape a property value for emission.
pub fn escape_value(value: &str) -> String {
    value.replace('\n', "\\\n").replace(',', "\\,")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_plain() {
        let tokens = split_property_tokens("Pilot=Alpha,Type=Air").unwrap();
        assert_eq!(tokens, vec!["Pilot=Alpha", "Type=Air"]);
    }

    #[test]
    fn test_split_preserves_empty_tokens() {
        let tokens = split_property_tokens("a,,b,").unwrap();
        assert_eq!(tokens, vec!["a", "", "b", ""]);
    }

    #[test]
    fn test_split_escaped_comma() {
        let tokens = split_property_tokens(r"Name=foo\,bar,Type=Sea").unwrap();
        assert_eq!(tokens, vec!["Name=foo,bar", "Type=Sea"]);
    }

    #[test]
    fn test_split_escaped_newline() {
        let tokens = split_property_tokens("Briefing=line1\\\nline2").unwrap();
        assert_eq!(tokens, vec!["Briefing=line1\nline2"]);
    }

    #[test]
    fn test_split_escaped_backslash() {
        let tokens = split_property_tokens(r"Path=a\\b").unwrap();
        assert_eq!(tokens, vec![r"Path=a\b"]);
    }

    #[test]
    fn test_split_dangling_escape_is_error() {
        assert!(split_property_tokens("Name=oops\\").is_err());
    }

    #[test]
    fn test_escape_comma_and_newline() {
        assert_eq!(escape_value("foo,bar\nbaz"), "foo\\,bar\\\nbaz");
    }

    #[test]
    fn test_escape_plain_value_unchanged() {
        assert_eq!(escape_value("F-16C"), "F-16C");
    }

    #[test]
    fn test_escape_roundtrip() {
        let original = "foo,bar\nbaz";
        let escaped = escape_value(original);
        let tokens = split_property_tokens(&escaped).unwrap();
        assert_eq!(tokens, vec![original]);
    }
}
