//! Registry value types and the value wire codec.
//!
//! Every value line in a registry file has the shape `<name>=<data>`, where
//! `<data>` is either a quoted string or `<tag>:<payload>`. The tag selects
//! one of the encodings below; [`decode`] and [`encode`] convert between that
//! text and [`ValueData`].
//!
//! | Tag | Variant |
//! |---|---|
//! | `"..."` | [`ValueData::String`] |
//! | `hex(1)` | [`ValueData::BinaryString`] |
//! | `str(2)`, `hex(2)` | [`ValueData::ExpandString`] |
//! | `str(7)`, `hex(7)` | [`ValueData::MultiString`] |
//! | `dword` | [`ValueData::Dword`] |
//! | `hex(4)` | [`ValueData::DwordLittleEndian`] |
//! | `hex(5)` | [`ValueData::DwordBigEndian`] |
//! | `hex(b)` | [`ValueData::Qword`] |
//! | `hex`, `hex(3)` | [`ValueData::Binary`] |
//! | `hex(6)` | [`ValueData::Link`] |
//! | `hex(XXXXXXXX)` | [`ValueData::Internal`] |
//!
//! Wine stores expandable and multi strings as `str(2)`/`str(7)` internally
//! and exports them as their `hex(2)`/`hex(7)` counterparts.

use crate::error::{RegistryError, Result};
use crate::header::Format;
use crate::utils::{decode_utf16le, encode_utf16le, parse_hex_list, push_escaped, quote, unquote};
use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::io::Cursor;

/// Registry value data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueType {
    /// No value type.
    None,

    /// String (null-terminated).
    String,

    /// String with environment variables.
    ExpandString,

    /// Binary data.
    Binary,

    /// 32-bit little-endian integer.
    Dword,

    /// 32-bit big-endian integer.
    DwordBigEndian,

    /// Symbolic link (Unicode).
    Link,

    /// Multiple strings.
    MultiString,

    /// Resource list.
    ResourceList,

    /// Full resource descriptor.
    FullResourceDescriptor,

    /// Resource requirements list.
    ResourceRequirementsList,

    /// 64-bit little-endian integer.
    Qword,

    /// Non-standard value type, such as a device property type.
    /// Contains the raw type value.
    Unknown(u32),
}

impl ValueType {
    /// Parses a value type from a u32.
    ///
    /// Value types 0-11 are predefined; other identifiers are returned as
    /// `ValueType::Unknown`.
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => ValueType::None,
            1 => ValueType::String,
            2 => ValueType::ExpandString,
            3 => ValueType::Binary,
            4 => ValueType::Dword,
            5 => ValueType::DwordBigEndian,
            6 => ValueType::Link,
            7 => ValueType::MultiString,
            8 => ValueType::ResourceList,
            9 => ValueType::FullResourceDescriptor,
            10 => ValueType::ResourceRequirementsList,
            11 => ValueType::Qword,
            _ => ValueType::Unknown(value),
        }
    }

    /// Returns the numeric type identifier.
    pub fn to_u32(self) -> u32 {
        match self {
            ValueType::None => 0,
            ValueType::String => 1,
            ValueType::ExpandString => 2,
            ValueType::Binary => 3,
            ValueType::Dword => 4,
            ValueType::DwordBigEndian => 5,
            ValueType::Link => 6,
            ValueType::MultiString => 7,
            ValueType::ResourceList => 8,
            ValueType::FullResourceDescriptor => 9,
            ValueType::ResourceRequirementsList => 10,
            ValueType::Qword => 11,
            ValueType::Unknown(value) => value,
        }
    }

    /// Returns the name of this value type.
    pub fn name(&self) -> String {
        match self {
            ValueType::None => "REG_NONE".to_string(),
            ValueType::String => "REG_SZ".to_string(),
            ValueType::ExpandString => "REG_EXPAND_SZ".to_string(),
            ValueType::Binary => "REG_BINARY".to_string(),
            ValueType::Dword => "REG_DWORD".to_string(),
            ValueType::DwordBigEndian => "REG_DWORD_BIG_ENDIAN".to_string(),
            ValueType::Link => "REG_LINK".to_string(),
            ValueType::MultiString => "REG_MULTI_SZ".to_string(),
            ValueType::ResourceList => "REG_RESOURCE_LIST".to_string(),
            ValueType::FullResourceDescriptor => "REG_FULL_RESOURCE_DESCRIPTOR".to_string(),
            ValueType::ResourceRequirementsList => "REG_RESOURCE_REQUIREMENTS_LIST".to_string(),
            ValueType::Qword => "REG_QWORD".to_string(),
            ValueType::Unknown(value) => format!("REG_UNKNOWN_{:#010x}", value),
        }
    }
}

/// Registry value data.
///
/// This is a closed set: registry types Wine does not use (`REG_NONE`,
/// resource lists) have no variant and are rejected by [`ValueData::from_raw`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueData {
    /// String value, written quoted.
    String(String),

    /// String value kept as raw UTF-16LE bytes (`hex(1)`).
    BinaryString(Vec<u8>),

    /// Expandable string value containing `%VAR%` placeholders.
    ExpandString(String),

    /// Multiple strings.
    MultiString(Vec<String>),

    /// 32-bit integer (`dword:`).
    Dword(u32),

    /// 32-bit integer written as explicit little-endian bytes (`hex(4)`).
    DwordLittleEndian(u32),

    /// 32-bit big-endian integer (`hex(5)`).
    DwordBigEndian(u32),

    /// 64-bit integer.
    Qword(u64),

    /// Binary data.
    Binary(Vec<u8>),

    /// Absolute registry path of a symbolic link target.
    Link(String),

    /// Vendor-typed data, such as `DEVPROP_TYPE_*` values.
    Internal {
        /// Registry type identifier.
        id: u32,
        /// Opaque value bytes.
        data: Vec<u8>,
    },
}

impl ValueData {
    /// Builds value data from a raw `REG_*` buffer: UTF-16LE text with a NUL
    /// terminator for the string types, little-endian integers, and opaque
    /// bytes otherwise. The `hex(N)` payloads of the text formats carry the
    /// same buffers.
    ///
    /// Only the closed set of [`ValueData`] variants can be built; other
    /// predefined types are rejected rather than kept as opaque bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnsupportedValueType`] for `REG_NONE` and the
    /// resource list types, and a decoding error if the buffer is malformed.
    pub fn from_raw(value_type: ValueType, data: &[u8]) -> Result<Self> {
        match value_type {
            ValueType::String => Ok(ValueData::String(decode_terminated(data)?)),
            ValueType::ExpandString => Ok(ValueData::ExpandString(decode_terminated(data)?)),
            ValueType::Binary => Ok(ValueData::Binary(data.to_vec())),
            ValueType::Dword => Ok(ValueData::Dword(read_fixed(data, 4)?.read_u32::<LittleEndian>()?)),
            ValueType::DwordBigEndian => Ok(ValueData::DwordBigEndian(
                read_fixed(data, 4)?.read_u32::<BigEndian>()?,
            )),
            ValueType::Link => Ok(ValueData::Link(decode_terminated(data)?)),
            ValueType::MultiString => Ok(ValueData::MultiString(decode_multi_utf16(data)?)),
            ValueType::Qword => Ok(ValueData::Qword(read_fixed(data, 8)?.read_u64::<LittleEndian>()?)),
            ValueType::Unknown(id) => Ok(ValueData::Internal {
                id,
                data: data.to_vec(),
            }),
            unsupported => Err(RegistryError::UnsupportedValueType(unsupported)),
        }
    }

    /// Returns the registry type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            ValueData::String(_) | ValueData::BinaryString(_) => ValueType::String,
            ValueData::ExpandString(_) => ValueType::ExpandString,
            ValueData::MultiString(_) => ValueType::MultiString,
            ValueData::Dword(_) | ValueData::DwordLittleEndian(_) => ValueType::Dword,
            ValueData::DwordBigEndian(_) => ValueType::DwordBigEndian,
            ValueData::Qword(_) => ValueType::Qword,
            ValueData::Binary(_) => ValueType::Binary,
            ValueData::Link(_) => ValueType::Link,
            ValueData::Internal { id, .. } => ValueType::from_u32(*id),
        }
    }

    /// Returns the raw `REG_*` buffer of this value, the bytes a `hex(N)`
    /// payload or the registry API would carry.
    pub fn raw_data(&self) -> Vec<u8> {
        match self {
            ValueData::String(s) | ValueData::ExpandString(s) => encode_utf16le(&format!("{}\0", s)),
            ValueData::BinaryString(b) | ValueData::Binary(b) => b.clone(),
            ValueData::Internal { data, .. } => data.clone(),
            ValueData::MultiString(strings) => encode_multi_utf16(strings),
            ValueData::Dword(d) | ValueData::DwordLittleEndian(d) => d.to_le_bytes().to_vec(),
            ValueData::DwordBigEndian(d) => d.to_be_bytes().to_vec(),
            ValueData::Qword(q) => q.to_le_bytes().to_vec(),
            ValueData::Link(s) => encode_utf16le(s),
        }
    }
}

impl fmt::Display for ValueData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueData::String(s) | ValueData::ExpandString(s) | ValueData::Link(s) => f.write_str(s),
            ValueData::BinaryString(b) | ValueData::Binary(b) => write!(f, "{:02X?}", b),
            ValueData::Dword(d) | ValueData::DwordLittleEndian(d) | ValueData::DwordBigEndian(d) => {
                write!(f, "{} (0x{:08X})", d, d)
            }
            ValueData::Qword(q) => write!(f, "{} (0x{:016X})", q, q),
            ValueData::MultiString(strings) => f.write_str(&strings.join(", ")),
            ValueData::Internal { id, data } => write!(f, "hex({:08x}) {:02X?}", id, data),
        }
    }
}

impl From<&str> for ValueData {
    fn from(s: &str) -> Self {
        ValueData::String(s.to_string())
    }
}

impl From<String> for ValueData {
    fn from(s: String) -> Self {
        ValueData::String(s)
    }
}

impl From<Vec<String>> for ValueData {
    fn from(strings: Vec<String>) -> Self {
        ValueData::MultiString(strings)
    }
}

impl From<u32> for ValueData {
    fn from(d: u32) -> Self {
        ValueData::Dword(d)
    }
}

impl From<u64> for ValueData {
    fn from(q: u64) -> Self {
        ValueData::Qword(q)
    }
}

impl From<Vec<u8>> for ValueData {
    fn from(b: Vec<u8>) -> Self {
        ValueData::Binary(b)
    }
}

/// The payload half of an encoded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Quoted, escaped text including the surrounding quotes.
    Quoted(String),
    /// A 32-bit integer written as 8 hex digits.
    Dword(u32),
    /// Bytes written as comma-separated hex pairs.
    Hex(Vec<u8>),
}

/// A value in wire form: the tag before the colon and its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    /// Wire tag, e.g. `hex(7)`. Empty for plain quoted strings.
    pub tag: String,
    /// Payload following the tag.
    pub payload: Payload,
}

impl Encoded {
    fn new(tag: impl Into<String>, payload: Payload) -> Self {
        Self {
            tag: tag.into(),
            payload,
        }
    }

    /// Returns the text written before the payload: `tag:`, or nothing.
    pub fn prefix(&self) -> String {
        if self.tag.is_empty() {
            String::new()
        } else {
            format!("{}:", self.tag)
        }
    }
}

/// Encodes value data into its wire form for the given file format.
pub fn encode(data: &ValueData, format: Format) -> Encoded {
    match data {
        ValueData::String(s) => Encoded::new("", Payload::Quoted(quote(s))),
        ValueData::BinaryString(b) => Encoded::new("hex(1)", Payload::Hex(b.clone())),
        ValueData::ExpandString(s) => match format {
            Format::Wine => Encoded::new("str(2)", Payload::Quoted(quote(s))),
            Format::Regedit => Encoded::new("hex(2)", Payload::Hex(encode_utf16le(&format!("{}\0", s)))),
        },
        ValueData::MultiString(strings) => match format {
            Format::Wine => {
                let mut quoted = String::from("\"");
                for s in strings {
                    push_escaped(&mut quoted, s);
                    quoted.push_str("\\0");
                }
                quoted.push('"');
                Encoded::new("str(7)", Payload::Quoted(quoted))
            }
            Format::Regedit => Encoded::new("hex(7)", Payload::Hex(encode_multi_utf16(strings))),
        },
        ValueData::Dword(d) => Encoded::new("dword", Payload::Dword(*d)),
        ValueData::DwordLittleEndian(d) => Encoded::new("hex(4)", Payload::Hex(d.to_le_bytes().to_vec())),
        ValueData::DwordBigEndian(d) => {
            let mut buf = Vec::with_capacity(4);
            // Writing into a Vec cannot fail
            let _ = buf.write_u32::<BigEndian>(*d);
            Encoded::new("hex(5)", Payload::Hex(buf))
        }
        ValueData::Qword(q) => {
            let mut buf = Vec::with_capacity(8);
            let _ = buf.write_u64::<LittleEndian>(*q);
            Encoded::new("hex(b)", Payload::Hex(buf))
        }
        ValueData::Binary(b) => Encoded::new("hex", Payload::Hex(b.clone())),
        ValueData::Link(s) => Encoded::new("hex(6)", Payload::Hex(encode_utf16le(s))),
        ValueData::Internal { id, data } => Encoded::new(format!("hex({:08x})", id), Payload::Hex(data.clone())),
    }
}

/// Decodes the data half of a value line (everything after `=`).
///
/// # Errors
///
/// Returns [`RegistryError::UnknownValueTag`] for tags outside the known set
/// that are not a well-formed `hex(XXXXXXXX)` vendor tag, and a format error
/// for malformed payloads.
pub fn decode(raw: &str) -> Result<ValueData> {
    if raw.is_empty() {
        return Err(RegistryError::format_error("expected value data"));
    }
    if raw.starts_with('"') {
        return Ok(ValueData::String(unquote(raw)?));
    }

    let (tag, data) = raw
        .split_once(':')
        .filter(|(tag, _)| !tag.is_empty())
        .ok_or_else(|| RegistryError::format_error(format!("expected tagged value data: {}", raw)))?;

    match tag {
        "dword" => {
            let digits = data.trim();
            if digits.is_empty() || digits.len() > 8 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(RegistryError::format_error(format!("invalid dword {:?}", data)));
            }
            u32::from_str_radix(digits, 16)
                .map(ValueData::Dword)
                .map_err(|e| RegistryError::format_error(format!("dword: {}", e)))
        }
        "str(2)" => Ok(ValueData::ExpandString(unquote(data)?)),
        "str(7)" => Ok(ValueData::MultiString(split_multi(&unquote(data)?))),
        _ if tag.starts_with("hex") => decode_hex(tag, parse_hex_list(data)?),
        _ => Err(RegistryError::UnknownValueTag(tag.to_string())),
    }
}

/// Decodes the bytes of a `hex`-family tag.
fn decode_hex(tag: &str, bytes: Vec<u8>) -> Result<ValueData> {
    match tag {
        "hex" | "hex(3)" => Ok(ValueData::Binary(bytes)),
        "hex(1)" => Ok(ValueData::BinaryString(bytes)),
        "hex(2)" => ValueData::from_raw(ValueType::ExpandString, &bytes),
        "hex(4)" => Ok(ValueData::DwordLittleEndian(
            read_fixed(&bytes, 4)?.read_u32::<LittleEndian>()?,
        )),
        "hex(5)" => ValueData::from_raw(ValueType::DwordBigEndian, &bytes),
        "hex(6)" => ValueData::from_raw(ValueType::Link, &bytes),
        "hex(7)" => ValueData::from_raw(ValueType::MultiString, &bytes),
        "hex(b)" => ValueData::from_raw(ValueType::Qword, &bytes),
        _ => {
            let id = vendor_id(tag).ok_or_else(|| RegistryError::UnknownValueTag(tag.to_string()))?;
            Ok(ValueData::Internal { id, data: bytes })
        }
    }
}

/// Parses the identifier out of a `hex(XXXXXXXX)` tag.
fn vendor_id(tag: &str) -> Option<u32> {
    let digits = tag.strip_prefix("hex(")?.strip_suffix(')')?;
    if digits.is_empty() || digits.len() > 8 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

/// Checks a fixed-width payload and returns a cursor over it.
fn read_fixed(bytes: &[u8], width: usize) -> Result<Cursor<&[u8]>> {
    if bytes.len() != width {
        return Err(RegistryError::TruncatedData {
            expected: width,
            actual: bytes.len(),
        });
    }
    Ok(Cursor::new(bytes))
}

/// Decodes UTF-16LE text, dropping one NUL terminator if present.
fn decode_terminated(bytes: &[u8]) -> Result<String> {
    let mut s = decode_utf16le(bytes)?;
    if s.ends_with('\0') {
        s.pop();
    }
    Ok(s)
}

/// Splits NUL-terminated entries; an unterminated final entry is kept.
fn split_multi(s: &str) -> Vec<String> {
    let mut parts: Vec<String> = s.split('\0').map(String::from).collect();
    if parts.last().map_or(false, |p| p.is_empty()) {
        parts.pop();
    }
    parts
}

/// Decodes a `REG_MULTI_SZ` buffer: NUL-terminated entries plus a final NUL.
fn decode_multi_utf16(bytes: &[u8]) -> Result<Vec<String>> {
    Ok(split_multi(&decode_terminated(bytes)?))
}

/// Encodes a `REG_MULTI_SZ` buffer: each entry NUL-terminated, then a final NUL.
fn encode_multi_utf16(strings: &[String]) -> Vec<u8> {
    let mut text = String::new();
    for s in strings {
        text.push_str(s);
        text.push('\0');
    }
    text.push('\0');
    encode_utf16le(&text)
}
