//! Helpers for Wine's `reg` command.
//!
//! These functions only deal in text: they build argument vectors for
//! `wine reg add`/`wine reg delete` and parse the tabular output of
//! `wine reg query /s`. Running the command is left to the caller.
//!
//! Query output looks like this, with fields separated by four spaces:
//!
//! ```text
//! HKEY_CURRENT_USER\Software\Foobar
//!     Bar    REG_BINARY    DEADBEEF
//!     Foo    REG_DWORD    0xdeadbeef
//!
//! ```

use crate::error::{RegistryError, Result};
use crate::header::canonical_root_name;
use crate::hive::{Hive, SEPARATOR};
use crate::value::ValueData;
use tracing::debug;

/// Field separator of `reg query` output.
const FIELD_SEPARATOR: &str = "    ";

/// Name `reg` prints for the default value.
const DEFAULT_VALUE_NAME: &str = "(Default)";

/// Prefix `reg` puts on error messages, which it writes to stdout.
const ERROR_PREFIX: &str = "reg: ";

/// Value data as `reg` understands it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryData {
    /// `REG_SZ`
    Sz(String),
    /// `REG_MULTI_SZ`
    MultiSz(Vec<String>),
    /// `REG_DWORD`
    Dword(u32),
    /// `REG_QWORD`
    Qword(u64),
    /// `REG_BINARY`
    Binary(Vec<u8>),
    /// `REG_NONE`; any data is ignored by `reg`.
    None,
}

impl QueryData {
    /// Returns the `reg` type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            QueryData::Sz(_) => "REG_SZ",
            QueryData::MultiSz(_) => "REG_MULTI_SZ",
            QueryData::Dword(_) => "REG_DWORD",
            QueryData::Qword(_) => "REG_QWORD",
            QueryData::Binary(_) => "REG_BINARY",
            QueryData::None => "REG_NONE",
        }
    }

    /// Formats the data as a `/d` argument of `reg add`.
    ///
    /// Multi-string entries are joined with the literal `\0` separator
    /// `reg` splits on.
    pub fn to_argument(&self) -> String {
        match self {
            QueryData::Sz(s) => s.clone(),
            QueryData::MultiSz(strings) => strings.join("\\0"),
            QueryData::Dword(d) => d.to_string(),
            QueryData::Qword(q) => q.to_string(),
            QueryData::Binary(b) => hex::encode(b),
            QueryData::None => String::new(),
        }
    }

    /// Parses one `TYPE    data` pair of query output.
    pub fn parse(type_name: &str, data: &str) -> Result<Self> {
        match type_name {
            "REG_SZ" => Ok(QueryData::Sz(data.to_string())),
            "REG_MULTI_SZ" => Ok(QueryData::MultiSz(if data.is_empty() {
                Vec::new()
            } else {
                data.split("\\0").map(String::from).collect()
            })),
            "REG_DWORD" => parse_number(data)
                .and_then(|n| u32::try_from(n).ok())
                .map(QueryData::Dword)
                .ok_or_else(|| RegistryError::format_error(format!("invalid REG_DWORD {:?}", data))),
            "REG_QWORD" => parse_number(data)
                .map(QueryData::Qword)
                .ok_or_else(|| RegistryError::format_error(format!("invalid REG_QWORD {:?}", data))),
            "REG_BINARY" => hex::decode(data)
                .map(QueryData::Binary)
                .map_err(|e| RegistryError::format_error(format!("invalid REG_BINARY: {}", e))),
            "REG_NONE" => Ok(QueryData::None),
            other => Err(RegistryError::UnknownValueTag(other.to_string())),
        }
    }

    /// Converts codec value data into the subset `reg` can express.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnsupportedValueType`] for data without a
    /// `reg` counterpart.
    pub fn from_value(data: &ValueData) -> Result<Self> {
        match data {
            ValueData::String(s) => Ok(QueryData::Sz(s.clone())),
            ValueData::MultiString(strings) => Ok(QueryData::MultiSz(strings.clone())),
            ValueData::Dword(d) | ValueData::DwordLittleEndian(d) => Ok(QueryData::Dword(*d)),
            ValueData::Qword(q) => Ok(QueryData::Qword(*q)),
            ValueData::Binary(b) => Ok(QueryData::Binary(b.clone())),
            other => Err(RegistryError::UnsupportedValueType(other.value_type())),
        }
    }

    /// Converts into codec value data. `REG_NONE` has no counterpart.
    pub fn into_value(self) -> Option<ValueData> {
        match self {
            QueryData::Sz(s) => Some(ValueData::String(s)),
            QueryData::MultiSz(strings) => Some(ValueData::MultiString(strings)),
            QueryData::Dword(d) => Some(ValueData::Dword(d)),
            QueryData::Qword(q) => Some(ValueData::Qword(q)),
            QueryData::Binary(b) => Some(ValueData::Binary(b)),
            QueryData::None => None,
        }
    }
}

/// A value line of query output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryValue {
    /// Value name, empty for the default value.
    pub name: String,
    /// Value data.
    pub data: QueryData,
}

/// A key block of query output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryKey {
    /// Absolute key path.
    pub key: String,
    /// Values in output order.
    pub values: Vec<QueryValue>,
}

/// Parses the output of `reg query <path> /s`.
///
/// # Errors
///
/// Returns [`RegistryError::ValueWithoutKey`] if a value line precedes any
/// key line, and a format error for malformed data; errors carry the line
/// number.
pub fn parse_query_output(output: &str) -> Result<Vec<QueryKey>> {
    let mut keys: Vec<QueryKey> = Vec::new();
    let mut active = false;

    for (i, line) in output.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        let fields: Vec<&str> = line.splitn(4, FIELD_SEPARATOR).collect();

        match fields.as_slice() {
            [""] => active = false,
            [path] => {
                keys.push(QueryKey {
                    key: path.to_string(),
                    values: Vec::new(),
                });
                active = true;
            }
            ["", name, type_name, data] => {
                let key = keys
                    .last_mut()
                    .filter(|_| active)
                    .ok_or_else(|| RegistryError::ValueWithoutKey.at_line(i + 1))?;
                let data = QueryData::parse(type_name, data).map_err(|e| e.at_line(i + 1))?;
                let name = if *name == DEFAULT_VALUE_NAME { "" } else { *name };
                key.values.push(QueryValue {
                    name: name.to_string(),
                    data,
                });
            }
            _ => debug!(line, "Skipping unrecognized reg output line"),
        }
    }

    Ok(keys)
}

/// Builds a hive from parsed query output.
///
/// `REG_NONE` values are dropped since the codec has no representation for
/// them.
///
/// # Errors
///
/// Returns [`RegistryError::UnknownRootKey`] if the key blocks do not share
/// one root.
pub fn to_hive(keys: Vec<QueryKey>) -> Result<Hive> {
    let mut hive = Hive::default();
    for QueryKey { key, values } in keys {
        let (root, rest) = key.split_once(SEPARATOR).unwrap_or((key.as_str(), ""));
        let root = canonical_root_name(root);
        if hive.name().is_empty() {
            hive.set_name(root);
        } else if hive.name() != root {
            return Err(RegistryError::UnknownRootKey(root.to_string()));
        }

        let top = hive.root();
        let id = hive.add(top, rest);
        for QueryValue { name, data } in values {
            if let Some(data) = data.into_value() {
                hive.set_value(id, &name, data);
            }
        }
    }
    Ok(hive)
}

/// Builds the arguments of `reg add` setting one value.
///
/// An empty value name targets the default value (`/ve`).
///
/// # Examples
///
/// ```rust
/// use wine_registry::query::{add_arguments, QueryData};
///
/// let args = add_arguments(r"HKCU\Control Panel\Desktop", "LogPixels", &QueryData::Dword(96)).unwrap();
/// assert_eq!(args, ["add", r"HKCU\Control Panel\Desktop", "/t", "REG_DWORD", "/d", "96", "/f", "/v", "LogPixels"]);
/// ```
pub fn add_arguments(key: &str, value: &str, data: &QueryData) -> Result<Vec<String>> {
    if key.is_empty() {
        return Err(RegistryError::format_error("no registry key given"));
    }

    let mut args: Vec<String> = ["add", key, "/t", data.type_name()]
        .into_iter()
        .map(String::from)
        .collect();
    args.extend(["/d".to_string(), data.to_argument(), "/f".to_string()]);
    push_value_name(&mut args, value);
    Ok(args)
}

/// Builds the arguments of `reg delete`.
///
/// An empty value name deletes the whole key.
pub fn delete_arguments(key: &str, value: &str) -> Result<Vec<String>> {
    if key.is_empty() {
        return Err(RegistryError::format_error("no registry key given"));
    }

    let mut args = vec!["delete".to_string(), key.to_string(), "/f".to_string()];
    if !value.is_empty() {
        args.extend(["/v".to_string(), value.to_string()]);
    }
    Ok(args)
}

/// Builds the arguments of a recursive `reg query`.
pub fn query_arguments(key: &str) -> Vec<String> {
    vec!["query".to_string(), key.to_string(), "/s".to_string()]
}

/// Extracts the message of a failed `reg` invocation from its stdout.
pub fn command_error(stdout: &str) -> Option<&str> {
    stdout.strip_prefix(ERROR_PREFIX).map(str::trim_end)
}

fn push_value_name(args: &mut Vec<String>, value: &str) {
    if value.is_empty() {
        args.push("/ve".to_string());
    } else {
        args.extend(["/v".to_string(), value.to_string()]);
    }
}

fn parse_number(s: &str) -> Option<u64> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}
