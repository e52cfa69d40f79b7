//! Export serializer for registry text files.
//!
//! [`export_wine`] writes Wine's dump format as found in `system.reg` and
//! `user.reg`; [`export_regedit`] writes the interchange format understood by
//! `regedit` and `reg import`.
//!
//! Hex payloads are wrapped the way regedit wraps them: lines end with `\`
//! once they would pass column 76, and continuation lines are indented by
//! two spaces.

use crate::error::{RegistryError, Result};
use crate::header::{Format, ARCH_DIRECTIVE, REGEDIT_HEADER, ROOT_DECLARATION, WINE_HEADER};
use crate::hive::Hive;
use crate::key::{KeyId, RegistryValue};
use crate::utils::{escape_surrogates, quote};
use crate::value::{self, Payload};
use std::io::Write;

/// Column after which hex payloads are wrapped.
pub const WRAP_COLUMN: usize = 76;

/// Writes the hive in Wine's dump format.
///
/// A key is written if it has values, a timestamp, or is a link; its path is
/// relative to the root and its header carries the timestamp both as Unix
/// seconds and as a raw FILETIME.
///
/// # Errors
///
/// Returns [`RegistryError::UnknownRootKey`] if the hive root is neither
/// `HKEY_LOCAL_MACHINE` nor `HKEY_CURRENT_USER`, or an I/O error.
pub fn export_wine<W: Write>(hive: &Hive, mut writer: W) -> Result<()> {
    let scope = hive
        .root_scope()
        .ok_or_else(|| RegistryError::UnknownRootKey(hive.name().to_string()))?;

    write!(
        writer,
        "{}\n{}{}\n\n{}\n",
        WINE_HEADER,
        ROOT_DECLARATION,
        scope.relative_path(),
        ARCH_DIRECTIVE
    )?;

    for id in hive.descendants(hive.root()) {
        let key = hive.node(id);
        if !key.has_values() && key.modified().is_zero() && !key.is_link() {
            continue;
        }

        write!(
            writer,
            "\n[{}] {}\n#time={:x}\n",
            escape_surrogates(&hive.wine_path(id)),
            key.modified().unix(),
            key.modified()
        )?;
        if key.is_link() {
            writer.write_all(b"#link\n")?;
        }
        write_values(&mut writer, key.values(), Format::Wine)?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes the hive in the regedit interchange format.
///
/// Only keys with values get a header. Link keys are skipped together with
/// everything below them.
pub fn export_regedit<W: Write>(hive: &Hive, writer: W) -> Result<()> {
    export_regedit_key(hive, hive.root(), writer)
}

/// Writes one key and its subtree in the regedit interchange format.
///
/// Key paths stay absolute, so the output can be imported as-is.
pub fn export_regedit_key<W: Write>(hive: &Hive, id: KeyId, mut writer: W) -> Result<()> {
    writeln!(writer, "{}", REGEDIT_HEADER)?;
    write_regedit_subtree(hive, id, &mut writer)?;
    writer.flush()?;
    Ok(())
}

fn write_regedit_subtree<W: Write>(hive: &Hive, id: KeyId, writer: &mut W) -> Result<()> {
    let key = hive.node(id);
    if key.is_link() {
        return Ok(());
    }

    if key.has_values() {
        write!(writer, "\n[{}]\n", escape_surrogates(&hive.path(id)))?;
        write_values(writer, key.values(), Format::Regedit)?;
    }
    for &child in key.children() {
        write_regedit_subtree(hive, child, writer)?;
    }
    Ok(())
}

/// Renders the hive in Wine's dump format.
pub fn to_wine_string(hive: &Hive) -> Result<String> {
    let mut buf = Vec::new();
    export_wine(hive, &mut buf)?;
    into_string(buf)
}

/// Renders the hive in the regedit interchange format.
pub fn to_regedit_string(hive: &Hive) -> Result<String> {
    let mut buf = Vec::new();
    export_regedit(hive, &mut buf)?;
    into_string(buf)
}

fn into_string(buf: Vec<u8>) -> Result<String> {
    String::from_utf8(buf).map_err(|e| RegistryError::format_error(format!("export produced invalid UTF-8: {}", e)))
}

fn write_values<W: Write>(writer: &mut W, values: &[RegistryValue], format: Format) -> Result<()> {
    for value in values {
        write_value(writer, value, format)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/// Writes a single value line without the trailing newline.
pub fn write_value<W: Write>(writer: &mut W, value: &RegistryValue, format: Format) -> Result<()> {
    let name = if value.is_default() {
        "@=".to_string()
    } else {
        format!("{}=", quote(&value.name))
    };
    let encoded = value::encode(&value.data, format);
    let prefix = encoded.prefix();

    writer.write_all(name.as_bytes())?;
    writer.write_all(prefix.as_bytes())?;
    match encoded.payload {
        Payload::Quoted(text) => writer.write_all(text.as_bytes())?,
        Payload::Dword(d) => write!(writer, "{:08x}", d)?,
        // The first byte is counted from the last character of the tag
        Payload::Hex(bytes) => write_hex(writer, &bytes, name.len() + prefix.len() - 1)?,
    }
    Ok(())
}

/// Writes comma-separated hex pairs, wrapping past [`WRAP_COLUMN`].
fn write_hex<W: Write>(writer: &mut W, bytes: &[u8], mut column: usize) -> Result<()> {
    for (i, byte) in bytes.iter().enumerate() {
        write!(writer, "{:02x}", byte)?;
        column += 3;
        if i + 1 < bytes.len() {
            writer.write_all(b",")?;
            if column + 1 > WRAP_COLUMN {
                writer.write_all(b"\\\n  ")?;
                column = 2;
            }
        }
    }
    Ok(())
}
