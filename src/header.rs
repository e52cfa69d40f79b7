//! Registry file headers and root scopes.
//!
//! Every registry text file starts with a header line naming its format.
//! Wine's own dump files then declare which hive they hold with a
//! `;; All keys relative to ...` comment; key paths inside the file are
//! relative to that root.

use crate::error::{RegistryError, Result};
use std::fmt;

/// Header line of Wine's internal dump format.
pub const WINE_HEADER: &str = "WINE REGISTRY Version 2";

/// Header line of the regedit interchange format.
pub const REGEDIT_HEADER: &str = "Windows Registry Editor Version 5.00";

/// Prefix of the root-scope declaration comment.
pub const ROOT_DECLARATION: &str = ";; All keys relative to ";

/// Architecture marker written after the root-scope declaration.
pub const ARCH_DIRECTIVE: &str = "#arch=win64";

/// Security identifier Wine assigns to the prefix user.
pub const SID: &str = "S-1-5-21-0-0-0-1000";

/// Text format of a registry file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Wine's internal dump format (`system.reg`, `user.reg`).
    Wine,
    /// The regedit interchange format.
    Regedit,
}

impl Format {
    /// Identifies the format from the first line of a file.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidHeader`] for any other line.
    pub fn from_header(line: &str) -> Result<Self> {
        // Exported files may carry a UTF-8 byte order mark
        match line.trim_start_matches('\u{feff}').trim_end_matches('\r') {
            WINE_HEADER => Ok(Format::Wine),
            REGEDIT_HEADER => Ok(Format::Regedit),
            _ => Err(RegistryError::InvalidHeader {
                found: line.to_string(),
            }),
        }
    }

    /// Returns the header line for this format.
    pub fn header(self) -> &'static str {
        match self {
            Format::Wine => WINE_HEADER,
            Format::Regedit => REGEDIT_HEADER,
        }
    }
}

/// One of the two hives Wine persists to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootScope {
    /// `HKEY_LOCAL_MACHINE`, stored in `system.reg`.
    Machine,
    /// `HKEY_CURRENT_USER`, stored in `user.reg`.
    CurrentUser,
}

impl RootScope {
    /// Both scopes, machine first.
    pub const ALL: [RootScope; 2] = [RootScope::Machine, RootScope::CurrentUser];

    /// Returns the root key name.
    pub fn key_name(self) -> &'static str {
        match self {
            RootScope::Machine => "HKEY_LOCAL_MACHINE",
            RootScope::CurrentUser => "HKEY_CURRENT_USER",
        }
    }

    /// Returns the abbreviated root key name.
    pub fn short_name(self) -> &'static str {
        match self {
            RootScope::Machine => "HKLM",
            RootScope::CurrentUser => "HKCU",
        }
    }

    /// Returns the backing file name inside a Wine prefix.
    pub fn file_name(self) -> &'static str {
        match self {
            RootScope::Machine => "system.reg",
            RootScope::CurrentUser => "user.reg",
        }
    }

    /// Returns the escaped path used in the root-scope declaration.
    pub fn relative_path(self) -> String {
        match self {
            RootScope::Machine => r"REGISTRY\\Machine".to_string(),
            RootScope::CurrentUser => format!(r"REGISTRY\\User\\{}", SID),
        }
    }

    /// Resolves the path of a root-scope declaration.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownRootPath`] for any other path.
    pub fn from_relative_path(path: &str) -> Result<Self> {
        RootScope::ALL
            .into_iter()
            .find(|scope| scope.relative_path() == path)
            .ok_or_else(|| RegistryError::UnknownRootPath(path.to_string()))
    }

    /// Resolves a root key name in long (`HKEY_CURRENT_USER`) or short
    /// (`HKCU`) form. Matching is case-insensitive like Windows.
    pub fn from_key_name(name: &str) -> Option<Self> {
        RootScope::ALL.into_iter().find(|scope| {
            name.eq_ignore_ascii_case(scope.key_name()) || name.eq_ignore_ascii_case(scope.short_name())
        })
    }
}

impl fmt::Display for RootScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_name())
    }
}

/// Expands a leading `HKLM`/`HKCU` alias to its long form.
pub fn canonical_root_name(name: &str) -> &str {
    RootScope::from_key_name(name).map_or(name, |scope| scope.key_name())
}
