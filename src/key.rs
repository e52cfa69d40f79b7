//! Registry key node storage.
//!
//! Key nodes live in a [`Hive`](crate::Hive) arena and refer to each other
//! through [`KeyId`] handles. A node owns its values; its children are
//! owned by the arena and listed here in insertion order.

use crate::filetime::Filetime;
use crate::value::ValueData;

/// Handle to a key node inside a [`Hive`](crate::Hive).
///
/// Handles are only meaningful for the hive that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(pub(crate) usize);

impl KeyId {
    /// Returns the arena index of this handle.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A named value of a registry key.
///
/// The default value of a key has an empty name.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegistryValue {
    /// Value name, empty for the default value.
    pub name: String,

    /// Value data.
    pub data: ValueData,
}

impl RegistryValue {
    /// Creates a named value.
    pub fn new(name: impl Into<String>, data: ValueData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Returns true if this is the unnamed default value.
    pub fn is_default(&self) -> bool {
        self.name.is_empty()
    }
}

/// Key node structure.
#[derive(Debug, Clone, Default)]
pub struct KeyNode {
    /// Key name. Never contains the path separator.
    pub(crate) name: String,

    /// Values in insertion order.
    pub(crate) values: Vec<RegistryValue>,

    /// Child keys in insertion order.
    pub(crate) children: Vec<KeyId>,

    /// Parent key, `None` only for the root.
    pub(crate) parent: Option<KeyId>,

    /// Last written timestamp.
    pub(crate) modified: Filetime,

    /// Whether this key is a symbolic link to another key.
    pub(crate) link: bool,
}

impl KeyNode {
    pub(crate) fn new(name: impl Into<String>, parent: Option<KeyId>) -> Self {
        Self {
            name: name.into(),
            parent,
            ..Self::default()
        }
    }

    /// Returns the key name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the values in insertion order.
    pub fn values(&self) -> &[RegistryValue] {
        &self.values
    }

    /// Returns the child handles in insertion order.
    pub fn children(&self) -> &[KeyId] {
        &self.children
    }

    /// Returns the parent handle.
    pub fn parent(&self) -> Option<KeyId> {
        self.parent
    }

    /// Returns the last written timestamp.
    pub fn modified(&self) -> Filetime {
        self.modified
    }

    /// Returns true if this key is a symbolic link.
    pub fn is_link(&self) -> bool {
        self.link
    }

    /// Returns true if this key has values.
    pub fn has_values(&self) -> bool {
        !self.values.is_empty()
    }

    /// Returns true if this key has subkeys.
    pub fn has_subkeys(&self) -> bool {
        !self.children.is_empty()
    }

    /// Finds a value by exact name.
    pub fn value(&self, name: &str) -> Option<&RegistryValue> {
        self.values.iter().find(|v| v.name == name)
    }

    /// Sets a value, replacing the data in place if the name exists and
    /// appending otherwise.
    pub fn set_value(&mut self, name: &str, data: ValueData) -> &mut RegistryValue {
        match self.values.iter().position(|v| v.name == name) {
            Some(i) => {
                self.values[i].data = data;
                &mut self.values[i]
            }
            None => {
                self.values.push(RegistryValue::new(name, data));
                let last = self.values.len() - 1;
                &mut self.values[last]
            }
        }
    }

    /// Removes a value by name, returning it if present.
    pub fn remove_value(&mut self, name: &str) -> Option<RegistryValue> {
        let i = self.values.iter().position(|v| v.name == name)?;
        Some(self.values.remove(i))
    }

    /// Sets the last written timestamp.
    pub fn set_modified(&mut self, modified: Filetime) {
        self.modified = modified;
    }

    /// Marks or unmarks this key as a symbolic link.
    pub fn set_link(&mut self, link: bool) {
        self.link = link;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_value_preserves_position() {
        let mut key = KeyNode::new("Foo", None);
        key.set_value("a", ValueData::Dword(1));
        key.set_value("b", ValueData::Dword(2));
        key.set_value("a", ValueData::Qword(3));

        let names: Vec<_> = key.values().iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(key.value("a").unwrap().data, ValueData::Qword(3));
    }

    #[test]
    fn test_default_value() {
        let mut key = KeyNode::new("Foo", None);
        assert!(key.set_value("", ValueData::String(String::new())).is_default());
        assert!(key.value("").is_some());
        assert!(key.remove_value("").is_some());
        assert!(!key.has_values());
    }
}
