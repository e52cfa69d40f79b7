//! Python bindings for the Wine registry codec using PyO3.
//!
//! This module provides Python-friendly wrappers around the core Rust types.
//! Keys handed to Python hold a shared snapshot of their hive; mutating a
//! `Hive` object afterwards does not affect keys obtained earlier.

use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyBytes;
use std::sync::Arc;

use crate::export::{to_regedit_string, to_wine_string};
use crate::parser::{parse_file, parse_str};
use crate::RegistryError;
use crate::{Hive as RustHive, KeyId, Registry as RustRegistry, RootScope};
use crate::{ValueData as RustValueData, ValueType as RustValueType};

/// Convert Rust RegistryError to Python exception
fn registry_error_to_py(err: RegistryError) -> PyErr {
    match err {
        RegistryError::Io(e) => PyIOError::new_err(e.to_string()),
        other => PyValueError::new_err(other.to_string()),
    }
}

/// Python wrapper for ValueType
#[pyclass(name = "ValueType")]
#[derive(Clone)]
pub struct PyValueType {
    inner: RustValueType,
}

#[pymethods]
impl PyValueType {
    /// Get the type name as string (e.g., "REG_SZ", "REG_DWORD")
    fn type_name(&self) -> String {
        self.inner.name()
    }

    /// Get the numeric type ID
    fn type_id(&self) -> u32 {
        self.inner.to_u32()
    }

    fn __repr__(&self) -> String {
        format!("ValueType({})", self.inner.name())
    }

    fn __str__(&self) -> String {
        self.inner.name()
    }
}

/// Python wrapper for ValueData
#[pyclass(name = "ValueData")]
#[derive(Clone)]
pub struct PyValueData {
    inner: RustValueData,
}

#[pymethods]
impl PyValueData {
    /// Create a REG_SZ value
    #[staticmethod]
    fn string(s: String) -> Self {
        Self {
            inner: RustValueData::String(s),
        }
    }

    /// Create a REG_EXPAND_SZ value
    #[staticmethod]
    fn expand_string(s: String) -> Self {
        Self {
            inner: RustValueData::ExpandString(s),
        }
    }

    /// Create a REG_MULTI_SZ value
    #[staticmethod]
    fn multi_string(strings: Vec<String>) -> Self {
        Self {
            inner: RustValueData::MultiString(strings),
        }
    }

    /// Create a REG_DWORD value
    #[staticmethod]
    fn dword(d: u32) -> Self {
        Self {
            inner: RustValueData::Dword(d),
        }
    }

    /// Create a REG_QWORD value
    #[staticmethod]
    fn qword(q: u64) -> Self {
        Self {
            inner: RustValueData::Qword(q),
        }
    }

    /// Create a REG_BINARY value
    #[staticmethod]
    fn binary(b: Vec<u8>) -> Self {
        Self {
            inner: RustValueData::Binary(b),
        }
    }

    /// Get the value type
    fn value_type(&self) -> PyValueType {
        PyValueType {
            inner: self.inner.value_type(),
        }
    }

    /// Check if this is a String value
    fn is_string(&self) -> bool {
        matches!(self.inner, RustValueData::String(_) | RustValueData::ExpandString(_))
    }

    /// Check if this is a Binary value
    fn is_binary(&self) -> bool {
        matches!(self.inner, RustValueData::Binary(_))
    }

    /// Check if this is a DWORD value
    fn is_dword(&self) -> bool {
        matches!(
            self.inner,
            RustValueData::Dword(_) | RustValueData::DwordLittleEndian(_) | RustValueData::DwordBigEndian(_)
        )
    }

    /// Check if this is a QWORD value
    fn is_qword(&self) -> bool {
        matches!(self.inner, RustValueData::Qword(_))
    }

    /// Check if this is a MultiString value
    fn is_multi_string(&self) -> bool {
        matches!(self.inner, RustValueData::MultiString(_))
    }

    /// Get as string (if applicable)
    fn as_string(&self) -> PyResult<String> {
        match &self.inner {
            RustValueData::String(s) | RustValueData::ExpandString(s) | RustValueData::Link(s) => Ok(s.clone()),
            _ => Err(PyValueError::new_err("Not a string value")),
        }
    }

    /// Get as binary data (if applicable)
    fn as_binary<'py>(&self, py: Python<'py>) -> PyResult<&'py PyBytes> {
        match &self.inner {
            RustValueData::Binary(b) | RustValueData::BinaryString(b) => Ok(PyBytes::new(py, b)),
            RustValueData::Internal { data, .. } => Ok(PyBytes::new(py, data)),
            _ => Err(PyValueError::new_err("Not a binary value")),
        }
    }

    /// Get as DWORD (if applicable)
    fn as_dword(&self) -> PyResult<u32> {
        match &self.inner {
            RustValueData::Dword(d) | RustValueData::DwordLittleEndian(d) | RustValueData::DwordBigEndian(d) => Ok(*d),
            _ => Err(PyValueError::new_err("Not a DWORD value")),
        }
    }

    /// Get as QWORD (if applicable)
    fn as_qword(&self) -> PyResult<u64> {
        match &self.inner {
            RustValueData::Qword(q) => Ok(*q),
            _ => Err(PyValueError::new_err("Not a QWORD value")),
        }
    }

    /// Get as multi-string (if applicable)
    fn as_multi_string(&self) -> PyResult<Vec<String>> {
        match &self.inner {
            RustValueData::MultiString(strings) => Ok(strings.clone()),
            _ => Err(PyValueError::new_err("Not a multi-string value")),
        }
    }

    /// Get the raw REG_* buffer, as carried by a hex(N) payload
    fn raw_data<'py>(&self, py: Python<'py>) -> &'py PyBytes {
        PyBytes::new(py, &self.inner.raw_data())
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }

    fn __str__(&self) -> String {
        self.inner.to_string()
    }
}

/// Python wrapper for RegistryValue
#[pyclass(name = "RegistryValue")]
pub struct PyRegistryValue {
    name: String,
    data: RustValueData,
}

#[pymethods]
impl PyRegistryValue {
    /// Get the value name
    fn name(&self) -> &str {
        &self.name
    }

    /// Get the value type
    fn value_type(&self) -> PyValueType {
        PyValueType {
            inner: self.data.value_type(),
        }
    }

    /// Get the value data
    fn data(&self) -> PyValueData {
        PyValueData {
            inner: self.data.clone(),
        }
    }

    fn __repr__(&self) -> String {
        format!("RegistryValue(name='{}')", self.name)
    }
}

/// Python wrapper for RegistryKey
///
/// Stores Arc<Hive> and a key handle to avoid lifetime issues with PyO3.
#[pyclass(name = "RegistryKey")]
pub struct PyRegistryKey {
    hive: Arc<RustHive>,
    id: KeyId,
}

impl PyRegistryKey {
    fn new(hive: &Arc<RustHive>, id: KeyId) -> Self {
        Self {
            hive: Arc::clone(hive),
            id,
        }
    }
}

#[pymethods]
impl PyRegistryKey {
    /// Get the key name
    fn name(&self) -> String {
        self.hive.node(self.id).name().to_string()
    }

    /// Get the absolute key path
    fn path(&self) -> String {
        self.hive.path(self.id)
    }

    /// Check if this key is a symbolic link
    fn is_link(&self) -> bool {
        self.hive.node(self.id).is_link()
    }

    /// Get the number of subkeys
    fn subkey_count(&self) -> usize {
        self.hive.node(self.id).children().len()
    }

    /// Get the number of values
    fn value_count(&self) -> usize {
        self.hive.node(self.id).values().len()
    }

    /// Get all subkeys
    fn subkeys(&self) -> Vec<PyRegistryKey> {
        self.hive
            .node(self.id)
            .children()
            .iter()
            .map(|&id| PyRegistryKey::new(&self.hive, id))
            .collect()
    }

    /// Find a key relative to this one
    fn query(&self, path: &str) -> Option<PyRegistryKey> {
        self.hive.query(self.id, path).map(|id| PyRegistryKey::new(&self.hive, id))
    }

    /// Get the parent key
    fn parent(&self) -> Option<PyRegistryKey> {
        self.hive.parent(self.id).map(|id| PyRegistryKey::new(&self.hive, id))
    }

    /// Get all values
    fn values(&self) -> Vec<PyRegistryValue> {
        self.hive
            .node(self.id)
            .values()
            .iter()
            .map(|v| PyRegistryValue {
                name: v.name.clone(),
                data: v.data.clone(),
            })
            .collect()
    }

    /// Get a specific value by name
    fn value(&self, name: &str) -> PyResult<PyRegistryValue> {
        let data = self
            .hive
            .value(self.id, name)
            .ok_or_else(|| registry_error_to_py(RegistryError::not_found("value", name)))?;
        Ok(PyRegistryValue {
            name: name.to_string(),
            data: data.clone(),
        })
    }

    /// Get the last write timestamp as Unix timestamp (seconds since epoch)
    fn last_written_timestamp(&self) -> Option<i64> {
        let modified = self.hive.node(self.id).modified();
        if modified.is_zero() {
            return None;
        }
        Some(modified.unix())
    }

    fn __repr__(&self) -> String {
        format!(
            "RegistryKey(path='{}', subkeys={}, values={})",
            self.path(),
            self.subkey_count(),
            self.value_count()
        )
    }
}

/// Python wrapper for Hive
#[pyclass(name = "Hive")]
pub struct PyHive {
    inner: Arc<RustHive>,
}

#[pymethods]
impl PyHive {
    /// Create an empty hive from an absolute key path
    #[new]
    fn new(root: &str) -> Self {
        let (hive, _) = RustHive::from_path(root);
        PyHive { inner: Arc::new(hive) }
    }

    /// Open a registry file
    #[staticmethod]
    fn open(path: &str, py: Python) -> PyResult<PyHive> {
        // Release GIL during file I/O and parsing
        let hive = py.allow_threads(|| parse_file(path)).map_err(registry_error_to_py)?;

        Ok(PyHive { inner: Arc::new(hive) })
    }

    /// Parse registry file contents
    #[staticmethod]
    fn parse(text: &str) -> PyResult<PyHive> {
        let hive = parse_str(text).map_err(registry_error_to_py)?;
        Ok(PyHive { inner: Arc::new(hive) })
    }

    /// Get the root key name
    fn name(&self) -> String {
        self.inner.name().to_string()
    }

    /// Get the root key of the hive
    fn root_key(&self) -> PyRegistryKey {
        PyRegistryKey::new(&self.inner, self.inner.root())
    }

    /// Find a key relative to the root
    fn query(&self, path: &str) -> Option<PyRegistryKey> {
        self.inner
            .query(self.inner.root(), path)
            .map(|id| PyRegistryKey::new(&self.inner, id))
    }

    /// Set a value, creating the key if needed
    fn set_value(&mut self, path: &str, name: &str, data: PyValueData) {
        let hive = Arc::make_mut(&mut self.inner);
        let root = hive.root();
        let key = hive.add(root, path);
        hive.set_value(key, name, data.inner);
    }

    /// Delete a key relative to the root
    fn delete(&mut self, path: &str) -> PyResult<bool> {
        let hive = Arc::make_mut(&mut self.inner);
        let root = hive.root();
        hive.delete(root, path).map_err(registry_error_to_py)
    }

    /// Render in Wine's dump format
    fn to_wine_string(&self) -> PyResult<String> {
        to_wine_string(&self.inner).map_err(registry_error_to_py)
    }

    /// Render in the regedit interchange format
    fn to_regedit_string(&self) -> PyResult<String> {
        to_regedit_string(&self.inner).map_err(registry_error_to_py)
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __eq__(&self, other: &PyHive) -> bool {
        *self.inner == *other.inner
    }

    fn __repr__(&self) -> String {
        format!("Hive(root='{}', keys={})", self.inner.name(), self.inner.len())
    }
}

/// Python wrapper for Registry
#[pyclass(name = "Registry")]
pub struct PyRegistry {
    inner: RustRegistry,
}

#[pymethods]
impl PyRegistry {
    /// Load system.reg and user.reg from a Wine prefix
    #[staticmethod]
    fn load(prefix: &str, py: Python) -> PyResult<PyRegistry> {
        let registry = py.allow_threads(|| RustRegistry::load(prefix)).map_err(registry_error_to_py)?;
        Ok(PyRegistry { inner: registry })
    }

    /// Get a snapshot of the HKEY_LOCAL_MACHINE hive
    fn machine(&self) -> PyHive {
        PyHive {
            inner: Arc::new(self.inner.hive(RootScope::Machine).clone()),
        }
    }

    /// Get a snapshot of the HKEY_CURRENT_USER hive
    fn current_user(&self) -> PyHive {
        PyHive {
            inner: Arc::new(self.inner.hive(RootScope::CurrentUser).clone()),
        }
    }

    /// Set a value by absolute key path
    fn set_value(&mut self, path: &str, name: &str, data: PyValueData) -> PyResult<()> {
        self.inner.set_value(path, name, data.inner).map_err(registry_error_to_py)
    }

    /// Delete a key by absolute path
    fn delete(&mut self, path: &str) -> PyResult<bool> {
        self.inner.delete(path).map_err(registry_error_to_py)
    }

    /// Write both hives back to their files
    fn save(&self, py: Python) -> PyResult<()> {
        // Release GIL during file I/O
        py.allow_threads(|| self.inner.save()).map_err(registry_error_to_py)
    }

    fn __repr__(&self) -> String {
        format!(
            "Registry(machine='{}', user='{}')",
            self.inner.file_path(RootScope::Machine).display(),
            self.inner.file_path(RootScope::CurrentUser).display()
        )
    }
}

/// Python module definition
#[pymodule]
fn wine_registry(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyHive>()?;
    m.add_class::<PyRegistry>()?;
    m.add_class::<PyRegistryKey>()?;
    m.add_class::<PyRegistryValue>()?;
    m.add_class::<PyValueData>()?;
    m.add_class::<PyValueType>()?;

    // Add version constant
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
