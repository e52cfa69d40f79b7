//! Import parser for registry text files.
//!
//! Both Wine's dump format and the regedit interchange format are read by the
//! same line-oriented state machine. The first line selects the format; after
//! that every line is one of:
//!
//! - `;` comment, possibly the `;; All keys relative to ...` root declaration
//! - `#time=<hex>`, `#link` or another `#` directive
//! - `[path]` key header, which becomes the active key
//! - `"name"=data` or `@=data` value line, wrapped with trailing `\`
//! - blank line, which ends the active key
//!
//! Any malformed line aborts the whole parse; errors carry the 1-based line
//! number where the offending statement started.

use crate::error::{RegistryError, Result};
use crate::filetime::Filetime;
use crate::header::{canonical_root_name, Format, RootScope, ROOT_DECLARATION};
use crate::hive::{Hive, SEPARATOR};
use crate::key::KeyId;
use crate::utils::{decode_utf16le, split_quoted, unescape_key_path, unescape_regedit_path};
use crate::value::{self, ValueData};
use std::io::BufRead;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Parses a registry file from a buffered reader.
///
/// # Errors
///
/// Returns [`RegistryError::InvalidHeader`] if the first line is not a known
/// header, [`RegistryError::Parse`] wrapping the cause for any malformed
/// line, and [`RegistryError::Io`] if reading fails.
///
/// # Examples
///
/// ```rust
/// use wine_registry::parser::parse;
///
/// let text = "Windows Registry Editor Version 5.00\n\n[HKEY_CURRENT_USER\\Foo]\n\"A\"=dword:00000001\n";
/// let hive = parse(text.as_bytes()).unwrap();
/// assert_eq!(hive.name(), "HKEY_CURRENT_USER");
/// assert!(hive.root_key().query("Foo").is_some());
/// ```
pub fn parse<R: BufRead>(reader: R) -> Result<Hive> {
    let mut lines = reader.lines();

    let header = match lines.next() {
        Some(line) => line?,
        None => {
            return Err(RegistryError::InvalidHeader {
                found: String::new(),
            })
        }
    };
    let format = Format::from_header(&header)?;
    let mut parser = Parser::new(format);

    let mut number = 1;
    while let Some(line) = lines.next() {
        number += 1;
        let start = number;
        let mut line = line?.trim_end_matches('\r').to_string();

        if line.starts_with('"') || line.starts_with('@') {
            while line.ends_with('\\') {
                line.pop();
                match lines.next() {
                    Some(next) => {
                        number += 1;
                        line.push_str(next?.trim());
                    }
                    None => break,
                }
            }
        }

        parser.feed(&line).map_err(|e| e.at_line(start))?;
    }

    debug!(lines = number, keys = parser.hive.len(), "Parsed registry stream");
    Ok(parser.hive)
}

/// Parses a registry file held in memory.
pub fn parse_str(text: &str) -> Result<Hive> {
    parse(text.as_bytes())
}

/// Parses raw file contents.
///
/// Regedit on Windows writes UTF-16LE with a byte order mark; such input is
/// transcoded first. Anything else is read as UTF-8.
pub fn parse_bytes(bytes: &[u8]) -> Result<Hive> {
    match bytes {
        [0xFF, 0xFE, rest @ ..] => parse_str(&decode_utf16le(rest)?),
        _ => parse(bytes),
    }
}

/// Reads and parses a registry file from disk.
///
/// # Errors
///
/// Returns [`RegistryError::Io`] if the file cannot be read, or any error
/// of [`parse`].
#[instrument(skip(path), fields(path = %path.as_ref().display()))]
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Hive> {
    let bytes = std::fs::read(path.as_ref())?;
    let hive = parse_bytes(&bytes)?;

    info!(root = hive.name(), keys = hive.len(), "Loaded registry file");
    Ok(hive)
}

struct Parser {
    format: Format,
    hive: Hive,
    declared: bool,
    active: Option<KeyId>,
}

impl Parser {
    fn new(format: Format) -> Self {
        Self {
            format,
            hive: Hive::default(),
            declared: false,
            active: None,
        }
    }

    fn feed(&mut self, line: &str) -> Result<()> {
        match line.chars().next() {
            None => {
                self.active = None;
                Ok(())
            }
            Some(';') => self.comment(line),
            Some('#') => self.directive(line),
            Some('[') => self.key_header(line),
            Some('"') | Some('@') => self.value_line(line),
            Some(_) if line.trim().is_empty() => {
                self.active = None;
                Ok(())
            }
            Some(_) => Err(RegistryError::format_error(format!("unexpected line: {}", line))),
        }
    }

    fn comment(&mut self, line: &str) -> Result<()> {
        let Some(path) = line.strip_prefix(ROOT_DECLARATION) else {
            return Ok(());
        };
        if self.declared {
            return Err(RegistryError::DuplicateRootDeclaration);
        }

        let scope = RootScope::from_relative_path(path.trim())?;
        self.hive.set_name(scope.key_name());
        self.declared = true;
        Ok(())
    }

    fn directive(&mut self, line: &str) -> Result<()> {
        if let Some(raw) = line.strip_prefix("#time=") {
            let key = self.active.ok_or(RegistryError::DirectiveWithoutKey)?;
            let time = Filetime::from_hex(raw.trim())?;
            self.hive.node_mut(key).set_modified(time);
        } else if line.trim_end() == "#link" {
            let key = self.active.ok_or(RegistryError::DirectiveWithoutKey)?;
            self.hive.node_mut(key).set_link(true);
        }
        Ok(())
    }

    fn key_header(&mut self, line: &str) -> Result<()> {
        let end = line
            .rfind(']')
            .ok_or_else(|| RegistryError::format_error(format!("unterminated key header: {}", line)))?;
        let raw = &line[1..end];

        let root = self.hive.root();
        let key = match self.format {
            Format::Wine => {
                if !self.declared {
                    return Err(RegistryError::MissingRootDeclaration);
                }
                let path = unescape_key_path(raw)?;
                self.hive.add(root, &path)
            }
            Format::Regedit => {
                let path = unescape_regedit_path(raw)?;
                let (name, rest) = path.split_once(SEPARATOR).unwrap_or((path.as_str(), ""));
                let name = canonical_root_name(name);
                if self.hive.name().is_empty() {
                    self.hive.set_name(name);
                } else if !self.hive.name().eq_ignore_ascii_case(name) {
                    return Err(RegistryError::UnknownRootKey(name.to_string()));
                }
                self.hive.add(root, rest)
            }
        };

        self.active = Some(key);
        Ok(())
    }

    fn value_line(&mut self, line: &str) -> Result<()> {
        let key = self.active.ok_or(RegistryError::ValueWithoutKey)?;
        let (name, data) = parse_value_line(line)?;
        self.hive.node_mut(key).set_value(&name, data);
        Ok(())
    }
}

/// Splits a complete value line into its name and decoded data.
fn parse_value_line(line: &str) -> Result<(String, ValueData)> {
    let (name, rest) = match line.strip_prefix('@') {
        Some(rest) => (String::new(), rest),
        None => split_quoted(line)?,
    };
    let raw = rest
        .strip_prefix('=')
        .ok_or_else(|| RegistryError::format_error(format!("expected '=' after value name: {}", line)))?;

    let data = value::decode(raw).map_err(|e| match e {
        RegistryError::InvalidFormat(msg) => RegistryError::format_error(format!("value {:?}: {}", name, msg)),
        other => other,
    })?;
    Ok((name, data))
}
