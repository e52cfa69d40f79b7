//! The two file-backed hives of a Wine prefix.
//!
//! Wine persists `HKEY_LOCAL_MACHINE` to `system.reg` and
//! `HKEY_CURRENT_USER` to `user.reg` at the top of the prefix directory.
//! [`Registry`] loads both, routes absolute key paths to the right hive and
//! writes them back in Wine's dump format.
//!
//! wineserver keeps the registry in memory and flushes it on exit, so the
//! files must not be edited while it is running.

use crate::error::{RegistryError, Result};
use crate::export::export_wine;
use crate::header::RootScope;
use crate::hive::{Hive, RegistryKey, SEPARATOR};
use crate::key::KeyId;
use crate::parser::parse_file;
use crate::value::ValueData;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// The machine and current-user hives of a Wine prefix.
#[derive(Debug, Clone)]
pub struct Registry {
    machine: Hive,
    current_user: Hive,
    machine_path: PathBuf,
    user_path: PathBuf,
}

impl Registry {
    /// Loads `system.reg` and `user.reg` from a prefix directory.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use wine_registry::Registry;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut registry = Registry::load("/home/user/.wine")?;
    /// registry.set_value(r"HKCU\Software\Wine\Direct3D", "renderer", "vulkan".into())?;
    /// registry.save()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn load<P: AsRef<Path>>(prefix: P) -> Result<Self> {
        let prefix = prefix.as_ref();
        Self::open(
            prefix.join(RootScope::Machine.file_name()),
            prefix.join(RootScope::CurrentUser.file_name()),
        )
    }

    /// Loads both hives from explicit file paths.
    ///
    /// # Errors
    ///
    /// Fails if either file cannot be read or parsed, or if a file declares
    /// the wrong root scope.
    #[instrument(skip_all, fields(machine = %machine_path.as_ref().display(), user = %user_path.as_ref().display()))]
    pub fn open<P: AsRef<Path>, Q: AsRef<Path>>(machine_path: P, user_path: Q) -> Result<Self> {
        let machine = parse_file(machine_path.as_ref())?;
        expect_scope(&machine, RootScope::Machine)?;
        let current_user = parse_file(user_path.as_ref())?;
        expect_scope(&current_user, RootScope::CurrentUser)?;

        info!(
            machine_keys = machine.len(),
            user_keys = current_user.len(),
            "Opened Wine registry"
        );

        Ok(Self {
            machine,
            current_user,
            machine_path: machine_path.as_ref().to_path_buf(),
            user_path: user_path.as_ref().to_path_buf(),
        })
    }

    /// Creates empty hives bound to the given files. Nothing is read.
    pub fn create<P: AsRef<Path>, Q: AsRef<Path>>(machine_path: P, user_path: Q) -> Self {
        Self {
            machine: Hive::new(RootScope::Machine.key_name()),
            current_user: Hive::new(RootScope::CurrentUser.key_name()),
            machine_path: machine_path.as_ref().to_path_buf(),
            user_path: user_path.as_ref().to_path_buf(),
        }
    }

    /// Returns the `HKEY_LOCAL_MACHINE` hive.
    pub fn machine(&self) -> &Hive {
        &self.machine
    }

    /// Returns the `HKEY_CURRENT_USER` hive.
    pub fn current_user(&self) -> &Hive {
        &self.current_user
    }

    /// Returns the mutable `HKEY_LOCAL_MACHINE` hive.
    pub fn machine_mut(&mut self) -> &mut Hive {
        &mut self.machine
    }

    /// Returns the mutable `HKEY_CURRENT_USER` hive.
    pub fn current_user_mut(&mut self) -> &mut Hive {
        &mut self.current_user
    }

    /// Returns the hive of a scope.
    pub fn hive(&self, scope: RootScope) -> &Hive {
        match scope {
            RootScope::Machine => &self.machine,
            RootScope::CurrentUser => &self.current_user,
        }
    }

    /// Returns the mutable hive of a scope.
    pub fn hive_mut(&mut self, scope: RootScope) -> &mut Hive {
        match scope {
            RootScope::Machine => &mut self.machine,
            RootScope::CurrentUser => &mut self.current_user,
        }
    }

    /// Returns the backing file of a scope.
    pub fn file_path(&self, scope: RootScope) -> &Path {
        match scope {
            RootScope::Machine => &self.machine_path,
            RootScope::CurrentUser => &self.user_path,
        }
    }

    /// Finds a key by absolute path, e.g. `HKCU\Software\Wine`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownRootKey`] if the path does not start
    /// with one of the two persisted roots.
    pub fn query(&self, path: &str) -> Result<Option<RegistryKey<'_>>> {
        let (scope, rest) = split_path(path)?;
        let hive = self.hive(scope);
        Ok(hive.query(hive.root(), rest).map(|id| hive.key(id)))
    }

    /// Finds or creates a key by absolute path.
    ///
    /// The returned handle belongs to the hive named by the path's root.
    pub fn add(&mut self, path: &str) -> Result<(RootScope, KeyId)> {
        let (scope, rest) = split_path(path)?;
        let hive = self.hive_mut(scope);
        let root = hive.root();
        Ok((scope, hive.add(root, rest)))
    }

    /// Removes a key by absolute path. Returns `false` if it did not exist.
    pub fn delete(&mut self, path: &str) -> Result<bool> {
        let (scope, rest) = split_path(path)?;
        let hive = self.hive_mut(scope);
        let root = hive.root();
        hive.delete(root, rest)
    }

    /// Sets a value of the key at `path`, creating the key if needed.
    pub fn set_value(&mut self, path: &str, name: &str, data: ValueData) -> Result<()> {
        let (scope, key) = self.add(path)?;
        self.hive_mut(scope).set_value(key, name, data);
        Ok(())
    }

    /// Writes both hives back to their files, machine first.
    ///
    /// Each file is truncated and rewritten. A failure on the user file
    /// leaves an already written machine file in place.
    #[instrument(skip(self), fields(machine = %self.machine_path.display(), user = %self.user_path.display()))]
    pub fn save(&self) -> Result<()> {
        for scope in RootScope::ALL {
            let path = self.file_path(scope);
            let writer = BufWriter::new(File::create(path)?);
            export_wine(self.hive(scope), writer)?;
            info!(file = %path.display(), "Saved registry hive");
        }
        Ok(())
    }
}

/// Splits an absolute key path into its root scope and the relative rest.
///
/// # Errors
///
/// Returns [`RegistryError::UnknownRootKey`] for any root other than
/// `HKEY_LOCAL_MACHINE`/`HKLM` or `HKEY_CURRENT_USER`/`HKCU`.
pub fn split_path(path: &str) -> Result<(RootScope, &str)> {
    let (root, rest) = path.split_once(SEPARATOR).unwrap_or((path, ""));
    let scope = RootScope::from_key_name(root).ok_or_else(|| RegistryError::UnknownRootKey(root.to_string()))?;
    Ok((scope, rest))
}

fn expect_scope(hive: &Hive, scope: RootScope) -> Result<()> {
    if hive.root_scope() == Some(scope) {
        Ok(())
    } else {
        Err(RegistryError::UnknownRootKey(format!(
            "{:?} where {} was expected",
            hive.name(),
            scope
        )))
    }
}
