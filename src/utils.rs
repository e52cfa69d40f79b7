//! Utility functions for string conversion and escaping.
//!
//! Registry text files mix three escaping schemes: C-style quoting for
//! string data and value names, `\xHHHH` UTF-16 unit escapes in key headers,
//! and comma-separated hex pairs for binary payloads.

use crate::error::{RegistryError, Result};
use encoding_rs::UTF_16LE;

/// Decodes UTF-16LE bytes into a string.
///
/// Trailing NUL terminators are *not* stripped; callers decide how many
/// terminators a given value type carries.
///
/// # Errors
///
/// Returns an error if the data length is odd or contains unpaired surrogates.
pub fn decode_utf16le(data: &[u8]) -> Result<String> {
    if data.len() % 2 != 0 {
        return Err(RegistryError::InvalidUtf16);
    }

    UTF_16LE
        .decode_without_bom_handling_and_without_replacement(data)
        .map(|s| s.into_owned())
        .ok_or(RegistryError::InvalidUtf16)
}

/// Encodes a string as UTF-16LE bytes without a terminator.
pub fn encode_utf16le(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/// Quotes a string with C-style escapes.
///
/// Printable characters, including non-ASCII ones, are written as-is. Control
/// characters without a short escape are written as `\xHHHH`.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    push_escaped(&mut out, s);
    out.push('"');
    out
}

/// Appends `s` to `out` with C-style escapes, without surrounding quotes.
pub fn push_escaped(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{7}' => out.push_str("\\a"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\u{b}' => out.push_str("\\v"),
            '\0' => out.push_str("\\0"),
            c if c < ' ' || c == '\u{7f}' => out.push_str(&format!("\\x{:04x}", c as u32)),
            c => out.push(c),
        }
    }
}

/// Splits a leading quoted string off `s`.
///
/// Returns the unescaped contents and the remainder after the closing quote.
/// `\x` takes one to four hex digits as a UTF-16 code unit, the way Wine
/// writes characters in its dump files, so `\xd83d\xde00` is one code point.
/// `\u` (4 digits) and `\U` (8 digits) name a code point directly.
///
/// # Errors
///
/// Returns an error if `s` does not start with a quote, the closing quote is
/// missing, an escape sequence is malformed, or `\x` escapes leave an
/// unpaired surrogate.
pub fn split_quoted(s: &str) -> Result<(String, &str)> {
    let body = s
        .strip_prefix('"')
        .ok_or_else(|| RegistryError::format_error(format!("expected quoted string: {}", s)))?;

    let mut units: Vec<u16> = Vec::with_capacity(body.len());
    let mut buf = [0u16; 2];
    let mut chars = body.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let decoded = match c {
            '"' => {
                let out = String::from_utf16(&units).map_err(|_| RegistryError::InvalidUtf16)?;
                return Ok((out, &body[i + 1..]));
            }
            '\\' => {
                let (_, esc) = chars
                    .next()
                    .ok_or_else(|| RegistryError::format_error("dangling escape"))?;
                match esc {
                    '\\' => '\\',
                    '"' => '"',
                    '\'' => '\'',
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    'a' => '\u{7}',
                    'b' => '\u{8}',
                    'f' => '\u{c}',
                    'v' => '\u{b}',
                    '0' => '\0',
                    'x' => {
                        let mut digits = String::with_capacity(4);
                        while let Some(&(_, d)) = chars.peek() {
                            if digits.len() == 4 || !d.is_ascii_hexdigit() {
                                break;
                            }
                            digits.push(d);
                            chars.next();
                        }
                        if digits.is_empty() {
                            return Err(RegistryError::format_error("\\x without hex digits"));
                        }
                        units.push(parse_hex_digits(&digits, digits.len())? as u16);
                        continue;
                    }
                    'u' | 'U' => {
                        let width = if esc == 'u' { 4 } else { 8 };
                        let digits: String = chars.by_ref().take(width).map(|(_, d)| d).collect();
                        let code = parse_hex_digits(&digits, width)?;
                        char::from_u32(code).ok_or_else(|| {
                            RegistryError::format_error(format!("invalid code point \\{}{}", esc, digits))
                        })?
                    }
                    other => {
                        return Err(RegistryError::format_error(format!(
                            "unknown escape sequence \\{}",
                            other
                        )))
                    }
                }
            }
            c => c,
        };
        units.extend_from_slice(decoded.encode_utf16(&mut buf));
    }

    Err(RegistryError::format_error("unterminated quoted string"))
}

/// Unquotes a complete C-style quoted string.
///
/// # Errors
///
/// Returns an error if anything follows the closing quote.
pub fn unquote(s: &str) -> Result<String> {
    let (out, rest) = split_quoted(s)?;
    if !rest.trim().is_empty() {
        return Err(RegistryError::format_error(format!(
            "unexpected data after quoted string: {}",
            rest
        )));
    }
    Ok(out)
}

/// Parses exactly `width` hex digits.
fn parse_hex_digits(digits: &str, width: usize) -> Result<u32> {
    if digits.len() != width || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(RegistryError::format_error(format!(
            "expected {} hex digits, got {:?}",
            width, digits
        )));
    }
    u32::from_str_radix(digits, 16).map_err(|e| RegistryError::format_error(e.to_string()))
}

/// Parses a comma-separated list of hex byte pairs, e.g. `de,ad,be,ef`.
///
/// Empty entries (such as a trailing comma or an empty payload) are skipped.
pub fn parse_hex_list(s: &str) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(s.len() / 3 + 1);
    for token in s.split(',').map(str::trim) {
        if token.is_empty() {
            continue;
        }
        if token.len() > 2 {
            return Err(RegistryError::format_error(format!("invalid hex byte {:?}", token)));
        }
        let byte = u8::from_str_radix(token, 16)
            .map_err(|e| RegistryError::format_error(format!("invalid hex byte {:?}: {}", token, e)))?;
        buf.push(byte);
    }
    Ok(buf)
}

/// Escapes code points above the Basic Multilingual Plane as `\xHHHH`
/// tokens, one per UTF-16 surrogate unit.
pub fn escape_surrogates(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if (c as u32) <= 0xFFFF {
            out.push(c);
            continue;
        }
        let mut units = [0u16; 2];
        for unit in c.encode_utf16(&mut units) {
            out.push_str(&format!("\\x{:04x}", unit));
        }
    }
    out
}

/// Unescapes the contents of a Wine dump-format key header.
///
/// `\\` becomes the path separator `\`, `\xHHHH` is a raw UTF-16 unit, and
/// `\"` is a literal quote.
pub fn unescape_key_path(raw: &str) -> Result<String> {
    let mut units: Vec<u16> = Vec::with_capacity(raw.len());
    let mut chars = raw.chars();
    let mut buf = [0u16; 2];

    while let Some(c) = chars.next() {
        if c != '\\' {
            units.extend_from_slice(c.encode_utf16(&mut buf));
            continue;
        }
        match chars.next() {
            Some('\\') => units.push(u16::from(b'\\')),
            Some('"') => units.push(u16::from(b'"')),
            Some('x') => {
                let digits: String = chars.by_ref().take(4).collect();
                units.push(parse_hex_digits(&digits, 4)? as u16);
            }
            Some(other) => {
                return Err(RegistryError::format_error(format!(
                    "unknown escape sequence \\{} in key path",
                    other
                )))
            }
            None => return Err(RegistryError::format_error("dangling escape in key path")),
        }
    }

    String::from_utf16(&units).map_err(|_| RegistryError::InvalidUtf16)
}

/// Unescapes the contents of a regedit key header.
///
/// A single backslash is the path separator. Surrogate pairs written as
/// `\xHHHH\xHHHH` are decoded back into one code point; any other backslash
/// is kept as a separator.
pub fn unescape_regedit_path(raw: &str) -> Result<String> {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        if let Some((c, tail)) = surrogate_pair(rest) {
            out.push(c);
            rest = tail;
        } else {
            out.push('\\');
            rest = &rest[1..];
        }
    }
    out.push_str(rest);
    Ok(out)
}

/// Matches `\xHHHH\xHHHH` forming a valid surrogate pair at the start of `s`.
fn surrogate_pair(s: &str) -> Option<(char, &str)> {
    let unit = |t: &str| -> Option<u16> {
        let digits = t.strip_prefix("\\x")?.get(..4)?;
        parse_hex_digits(digits, 4).ok().map(|v| v as u16)
    };
    let high = unit(s)?;
    let low = unit(s.get(6..)?)?;
    if !(0xD800..0xDC00).contains(&high) || !(0xDC00..0xE000).contains(&low) {
        return None;
    }
    let c = char::decode_utf16([high, low]).next()?.ok()?;
    Some((c, &s[12..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf16_round_trip() {
        let bytes = encode_utf16le("Hi\u{1F600}");
        assert_eq!(&bytes[..4], &[0x48, 0x00, 0x69, 0x00]);
        assert_eq!(decode_utf16le(&bytes).unwrap(), "Hi\u{1F600}");
    }

    #[test]
    fn test_utf16_keeps_terminator() {
        assert_eq!(decode_utf16le(&[0x48, 0x00, 0x00, 0x00]).unwrap(), "H\0");
    }

    #[test]
    fn test_utf16_invalid() {
        assert!(decode_utf16le(&[0x48]).is_err());
        // Unpaired high surrogate
        assert!(decode_utf16le(&[0x00, 0xD8]).is_err());
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote(r#""C:\Foo" -help"#), r#""\"C:\\Foo\" -help""#);
        assert_eq!(quote("a\nb\u{1}"), r#""a\nb\x0001""#);
        assert_eq!(quote("\u{1}f"), r#""\x0001f""#);
        assert_eq!(quote("caf\u{e9}"), "\"caf\u{e9}\"");
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote(r#""\"C:\\Foo\" -help""#).unwrap(), r#""C:\Foo" -help"#);
        assert_eq!(unquote(r#""a\x01\u00e9\0""#).unwrap(), "a\u{1}\u{e9}\0");
        assert!(unquote(r#""unterminated"#).is_err());
        assert!(unquote(r#""trailing" junk"#).is_err());
        assert!(unquote(r#""bad \q""#).is_err());
    }

    #[test]
    fn test_unquote_utf16_units() {
        assert_eq!(unquote(r#""\x4e2d""#).unwrap(), "\u{4e2d}");
        assert_eq!(unquote(r#""\x4e2d\x6587""#).unwrap(), "\u{4e2d}\u{6587}");
        assert_eq!(unquote(r#""a\xd83d\xde00b""#).unwrap(), "a\u{1F600}b");
        assert_eq!(unquote(r#""\x00e9t\xe9""#).unwrap(), "\u{e9}t\u{e9}");
        // At most four digits belong to the escape
        assert_eq!(unquote(r#""\x00411""#).unwrap(), "A1");
        assert!(matches!(unquote(r#""\xd83d""#), Err(RegistryError::InvalidUtf16)));
        assert!(matches!(unquote(r#""\xde00\xd83d""#), Err(RegistryError::InvalidUtf16)));
        assert!(unquote(r#""\xzz""#).is_err());
    }

    #[test]
    fn test_quote_round_trip_controls() {
        let s: String = (0u32..0x80).filter_map(char::from_u32).collect();
        assert_eq!(unquote(&quote(&s)).unwrap(), s);
    }

    #[test]
    fn test_split_quoted() {
        let (name, rest) = split_quoted(r#""a=b"=dword:00000001"#).unwrap();
        assert_eq!(name, "a=b");
        assert_eq!(rest, "=dword:00000001");
    }

    #[test]
    fn test_parse_hex_list() {
        assert_eq!(parse_hex_list("de,ad,be,ef").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(parse_hex_list("").unwrap(), Vec::<u8>::new());
        assert_eq!(parse_hex_list("0, a,").unwrap(), vec![0x00, 0x0a]);
        assert!(parse_hex_list("zz").is_err());
        assert!(parse_hex_list("123").is_err());
    }

    #[test]
    fn test_escape_surrogates() {
        assert_eq!(escape_surrogates("Foo"), "Foo");
        assert_eq!(escape_surrogates("\u{1F600}"), "\\xd83d\\xde00");
        assert_eq!(escape_surrogates("\u{e9}\u{FFFF}"), "\u{e9}\u{FFFF}");
    }

    #[test]
    fn test_unescape_key_path() {
        assert_eq!(unescape_key_path(r"Foo\\Bar").unwrap(), r"Foo\Bar");
        assert_eq!(unescape_key_path(r"a\xd83d\xde00").unwrap(), "a\u{1F600}");
        assert_eq!(unescape_key_path(r"\x0041").unwrap(), "A");
        assert!(unescape_key_path(r"Foo\Bar").is_err());
        assert!(unescape_key_path(r"\xd83d").is_err());
    }

    #[test]
    fn test_unescape_regedit_path() {
        assert_eq!(unescape_regedit_path(r"HKEY_CURRENT_USER\Foo").unwrap(), r"HKEY_CURRENT_USER\Foo");
        assert_eq!(
            unescape_regedit_path(r"HKCU\x\xd83d\xde00").unwrap(),
            "HKCU\\x\u{1F600}"
        );
        assert_eq!(unescape_regedit_path(r"A\x1234").unwrap(), r"A\x1234");
    }
}
