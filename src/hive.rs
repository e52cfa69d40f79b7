//! In-memory registry hive.
//!
//! A [`Hive`] is an arena of [`KeyNode`]s rooted at a single key such as
//! `HKEY_CURRENT_USER`. Children are owned by the arena and referenced by
//! [`KeyId`]; the parent link is a plain handle used only to walk upwards.
//!
//! Key paths are split on `\`. When several siblings share a name (Wine
//! files may reopen a key further down the stream), traversal prefers the
//! most recently added one.

use crate::error::{RegistryError, Result};
use crate::filetime::Filetime;
use crate::header::{canonical_root_name, RootScope};
use crate::key::{KeyId, KeyNode, RegistryValue};
use crate::value::ValueData;
use tracing::debug;

/// Path separator of registry key paths.
pub const SEPARATOR: char = '\\';

/// An offline registry hive.
///
/// Deleted keys are detached from their parent but stay in the arena, so
/// handles to them remain readable; they are no longer reachable from the
/// root and are never exported.
#[derive(Debug, Clone)]
pub struct Hive {
    nodes: Vec<KeyNode>,
    root: KeyId,
}

impl Default for Hive {
    fn default() -> Self {
        Self::new("")
    }
}

impl Hive {
    /// Creates a hive with a single root key.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![KeyNode::new(root_name, None)],
            root: KeyId(0),
        }
    }

    /// Creates a hive from an absolute key path and returns it with the
    /// handle of the terminal key.
    ///
    /// The first segment names the root; `HKLM` and `HKCU` are expanded to
    /// their long forms.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use wine_registry::Hive;
    ///
    /// let (hive, key) = Hive::from_path(r"HKCU\Software\Wine");
    /// assert_eq!(hive.path(key), r"HKEY_CURRENT_USER\Software\Wine");
    /// ```
    pub fn from_path(path: &str) -> (Self, KeyId) {
        let (root, rest) = path.split_once(SEPARATOR).unwrap_or((path, ""));
        let mut hive = Hive::new(canonical_root_name(root));
        let key = hive.add(hive.root(), rest);
        (hive, key)
    }

    /// Returns the handle of the root key.
    pub fn root(&self) -> KeyId {
        self.root
    }

    /// Returns the name of the root key.
    pub fn name(&self) -> &str {
        &self.node(self.root).name
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        let root = self.root;
        self.node_mut(root).name = name.into();
    }

    /// Returns the scope of this hive if its root is one Wine persists.
    pub fn root_scope(&self) -> Option<RootScope> {
        RootScope::from_key_name(self.name())
    }

    /// Returns the key node for a handle.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this hive.
    pub fn node(&self, id: KeyId) -> &KeyNode {
        &self.nodes[id.0]
    }

    /// Returns the mutable key node for a handle.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this hive.
    pub fn node_mut(&mut self, id: KeyId) -> &mut KeyNode {
        &mut self.nodes[id.0]
    }

    /// Returns a read view of a key.
    pub fn key(&self, id: KeyId) -> RegistryKey<'_> {
        RegistryKey { hive: self, id }
    }

    /// Returns a read view of the root key.
    pub fn root_key(&self) -> RegistryKey<'_> {
        self.key(self.root)
    }

    /// Finds the key at `path` relative to `from`, creating any missing key
    /// along the way. An empty path returns `from`.
    pub fn add(&mut self, from: KeyId, path: &str) -> KeyId {
        let mut current = from;
        for segment in segments(path) {
            current = match self.child(current, segment) {
                Some(child) => child,
                None => self.push_child(current, segment),
            };
        }
        current
    }

    /// Finds the key at `path` relative to `from`.
    pub fn query(&self, from: KeyId, path: &str) -> Option<KeyId> {
        segments(path).try_fold(from, |current, segment| self.child(current, segment))
    }

    /// Removes the key at `path` relative to `from` from its parent.
    ///
    /// Returns `Ok(false)` if no such key exists.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::RootDeletion`] if the path resolves to the
    /// root key, which has no parent to detach from.
    pub fn delete(&mut self, from: KeyId, path: &str) -> Result<bool> {
        let Some(target) = self.query(from, path) else {
            return Ok(false);
        };
        let Some(parent) = self.node(target).parent else {
            return Err(RegistryError::RootDeletion);
        };

        let siblings = &mut self.node_mut(parent).children;
        match siblings.iter().position(|&child| child == target) {
            Some(i) => {
                siblings.remove(i);
                debug!(path, "Deleted registry key");
                Ok(true)
            }
            None => Err(RegistryError::format_error(
                "subkey traversed but missing from its parent",
            )),
        }
    }

    /// Returns the parent of a key, `None` for the root.
    pub fn parent(&self, id: KeyId) -> Option<KeyId> {
        self.node(id).parent
    }

    /// Returns the topmost ancestor of a key.
    pub fn root_of(&self, id: KeyId) -> KeyId {
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            current = parent;
        }
        current
    }

    /// Returns the absolute path of a key, including the root name.
    pub fn path(&self, id: KeyId) -> String {
        self.ancestry(id)
            .iter()
            .map(|&k| self.node(k).name.as_str())
            .collect::<Vec<_>>()
            .join(r"\")
    }

    /// Returns the path of a key relative to the root, with `\\` between
    /// segments as Wine writes it. Empty for the root itself.
    pub fn wine_path(&self, id: KeyId) -> String {
        self.ancestry(id)
            .iter()
            .skip(1)
            .map(|&k| self.node(k).name.as_str())
            .collect::<Vec<_>>()
            .join(r"\\")
    }

    /// Finds a value of a key by name.
    pub fn value(&self, id: KeyId, name: &str) -> Option<&ValueData> {
        self.node(id).value(name).map(|v| &v.data)
    }

    /// Sets a value of a key, keeping its position if it already exists.
    pub fn set_value(&mut self, id: KeyId, name: &str, data: ValueData) -> &mut RegistryValue {
        self.node_mut(id).set_value(name, data)
    }

    /// Returns the number of keys reachable from the root.
    pub fn len(&self) -> usize {
        self.descendants(self.root).count()
    }

    /// Returns true if the hive holds nothing but an empty root key.
    pub fn is_empty(&self) -> bool {
        let root = self.node(self.root);
        !root.has_values() && !root.has_subkeys()
    }

    /// Iterates over `id` and all keys below it in depth-first pre-order.
    pub fn descendants(&self, id: KeyId) -> Descendants<'_> {
        Descendants {
            hive: self,
            stack: vec![id],
        }
    }

    /// Structurally compares a key of this hive with a key of another hive.
    ///
    /// Names, timestamps, link flags, values and subkeys are compared
    /// recursively; handles and parents are not.
    pub fn key_eq(&self, a: KeyId, other: &Hive, b: KeyId) -> bool {
        let (x, y) = (self.node(a), other.node(b));
        x.name == y.name
            && x.modified == y.modified
            && x.link == y.link
            && x.values == y.values
            && x.children.len() == y.children.len()
            && x
                .children
                .iter()
                .zip(&y.children)
                .all(|(&ca, &cb)| self.key_eq(ca, other, cb))
    }

    /// Serializes the tree below the root as pretty-printed JSON.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.root_key())
            .map_err(|e| RegistryError::format_error(format!("JSON serialization failed: {}", e)))
    }

    fn child(&self, parent: KeyId, name: &str) -> Option<KeyId> {
        self.node(parent)
            .children
            .iter()
            .rev()
            .copied()
            .find(|&child| self.node(child).name == name)
    }

    fn push_child(&mut self, parent: KeyId, name: &str) -> KeyId {
        let id = KeyId(self.nodes.len());
        self.nodes.push(KeyNode::new(name, Some(parent)));
        self.node_mut(parent).children.push(id);
        id
    }

    /// Returns the chain of handles from the root down to `id`.
    fn ancestry(&self, id: KeyId) -> Vec<KeyId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        chain
    }
}

impl PartialEq for Hive {
    fn eq(&self, other: &Self) -> bool {
        self.key_eq(self.root, other, other.root)
    }
}

impl Eq for Hive {}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    (!path.is_empty())
        .then(|| path.split(SEPARATOR))
        .into_iter()
        .flatten()
}

/// Depth-first pre-order iterator over keys.
pub struct Descendants<'a> {
    hive: &'a Hive,
    stack: Vec<KeyId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = KeyId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack.extend(self.hive.node(id).children.iter().rev());
        Some(id)
    }
}

/// A registry key with access to its hive.
#[derive(Clone, Copy)]
pub struct RegistryKey<'a> {
    hive: &'a Hive,
    id: KeyId,
}

impl<'a> RegistryKey<'a> {
    /// Returns the handle of this key.
    pub fn id(&self) -> KeyId {
        self.id
    }

    /// Returns the key node data.
    pub fn node(&self) -> &'a KeyNode {
        self.hive.node(self.id)
    }

    /// Returns the key name.
    pub fn name(&self) -> &'a str {
        self.node().name()
    }

    /// Returns the last written timestamp.
    pub fn modified(&self) -> Filetime {
        self.node().modified()
    }

    /// Returns true if this key is a symbolic link.
    pub fn is_link(&self) -> bool {
        self.node().is_link()
    }

    /// Returns the values in insertion order.
    pub fn values(&self) -> &'a [RegistryValue] {
        self.node().values()
    }

    /// Gets a specific value's data by name.
    pub fn value(&self, name: &str) -> Option<&'a ValueData> {
        self.hive.value(self.id, name)
    }

    /// Returns the subkeys in insertion order.
    pub fn subkeys(&self) -> impl Iterator<Item = RegistryKey<'a>> + 'a {
        let hive = self.hive;
        self.node().children().iter().map(move |&id| hive.key(id))
    }

    /// Finds a key relative to this one.
    pub fn query(&self, path: &str) -> Option<RegistryKey<'a>> {
        self.hive.query(self.id, path).map(|id| self.hive.key(id))
    }

    /// Returns the parent key, `None` for the root.
    pub fn parent(&self) -> Option<RegistryKey<'a>> {
        self.hive.parent(self.id).map(|id| self.hive.key(id))
    }

    /// Returns the absolute path of this key.
    pub fn path(&self) -> String {
        self.hive.path(self.id)
    }
}

impl std::fmt::Debug for RegistryKey<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryKey")
            .field("path", &self.path())
            .field("modified", &self.modified())
            .field("link", &self.is_link())
            .field("values", &self.values())
            .finish()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for RegistryKey<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let subkeys: Vec<_> = self.subkeys().collect();
        let mut state = serializer.serialize_struct("RegistryKey", 5)?;
        state.serialize_field("name", self.name())?;
        state.serialize_field("modified", &self.modified())?;
        state.serialize_field("link", &self.is_link())?;
        state.serialize_field("values", self.values())?;
        state.serialize_field("subkeys", &subkeys)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Hive {
        let mut hive = Hive::new("HKEY_CURRENT_USER");
        let root = hive.root();
        let bar = hive.add(root, r"Foo\Bar");
        hive.set_value(bar, "Value", ValueData::Dword(1));
        hive
    }

    #[test]
    fn test_add_creates_intermediate_keys() {
        let hive = sample();
        let foo = hive.query(hive.root(), "Foo").unwrap();
        let bar = hive.query(foo, "Bar").unwrap();
        assert_eq!(hive.parent(bar), Some(foo));
        assert_eq!(hive.parent(foo), Some(hive.root()));
        assert_eq!(hive.len(), 3);
    }

    #[test]
    fn test_add_existing_is_idempotent() {
        let mut hive = sample();
        let root = hive.root();
        let first = hive.add(root, r"Foo\Bar");
        let second = hive.add(root, r"Foo\Bar");
        assert_eq!(first, second);
        assert_eq!(hive.len(), 3);
    }

    #[test]
    fn test_empty_path_is_self() {
        let mut hive = sample();
        let root = hive.root();
        assert_eq!(hive.query(root, ""), Some(root));
        assert_eq!(hive.add(root, ""), root);
    }

    #[test]
    fn test_query_missing() {
        let hive = sample();
        assert_eq!(hive.query(hive.root(), r"Foo\Missing"), None);
        assert_eq!(hive.query(hive.root(), r"Missing\Bar"), None);
    }

    #[test]
    fn test_last_added_sibling_wins() {
        let mut hive = Hive::new("HKEY_CURRENT_USER");
        let root = hive.root();
        let first = hive.add(root, "X");
        // Reopened keys are appended as new siblings by the parser
        let second = hive.push_child(root, "X");
        assert_ne!(first, second);

        let found = hive.query(root, "X").unwrap();
        assert_eq!(found, second);
        hive.set_value(found, "v", ValueData::Dword(2));
        assert!(hive.value(first, "v").is_none());
        assert_eq!(hive.value(second, "v"), Some(&ValueData::Dword(2)));
    }

    #[test]
    fn test_paths() {
        let hive = sample();
        let bar = hive.query(hive.root(), r"Foo\Bar").unwrap();
        assert_eq!(hive.path(bar), r"HKEY_CURRENT_USER\Foo\Bar");
        assert_eq!(hive.wine_path(bar), r"Foo\\Bar");
        assert_eq!(hive.wine_path(hive.root()), "");
        assert_eq!(hive.path(hive.root()), "HKEY_CURRENT_USER");
        assert_eq!(hive.root_of(bar), hive.root());
    }

    #[test]
    fn test_delete() {
        let mut hive = sample();
        let root = hive.root();
        assert!(hive.delete(root, r"Foo\Bar").unwrap());
        let foo = hive.query(root, "Foo").unwrap();
        assert!(!hive.node(foo).has_subkeys());
        assert_eq!(hive.query(root, r"Foo\Bar"), None);
        assert!(!hive.delete(root, r"Foo\Bar").unwrap());
    }

    #[test]
    fn test_delete_root_is_rejected() {
        let mut hive = sample();
        let root = hive.root();
        assert!(matches!(hive.delete(root, ""), Err(RegistryError::RootDeletion)));
    }

    #[test]
    fn test_structural_equality_ignores_handles() {
        let a = sample();
        let mut b = Hive::new("HKEY_CURRENT_USER");
        let root = b.root();
        // Create and drop an unrelated key first so handles differ
        b.add(root, "Tmp");
        assert!(b.delete(root, "Tmp").unwrap());
        let bar = b.add(root, r"Foo\Bar");
        b.set_value(bar, "Value", ValueData::Dword(1));
        assert_eq!(a, b);

        b.node_mut(bar).set_modified(Filetime(1));
        assert_ne!(a, b);
    }

    #[test]
    fn test_from_path_expands_alias() {
        let (hive, key) = Hive::from_path(r"HKLM\Software");
        assert_eq!(hive.name(), "HKEY_LOCAL_MACHINE");
        assert_eq!(hive.root_scope(), Some(RootScope::Machine));
        assert_eq!(hive.key(key).path(), r"HKEY_LOCAL_MACHINE\Software");
    }

    #[test]
    fn test_descendants_preorder() {
        let mut hive = sample();
        let root = hive.root();
        hive.add(root, "Zed");
        let names: Vec<_> = hive.descendants(root).map(|id| hive.node(id).name().to_string()).collect();
        assert_eq!(names, ["HKEY_CURRENT_USER", "Foo", "Bar", "Zed"]);
    }

    #[test]
    fn test_registry_key_view() {
        let hive = sample();
        let bar = hive.root_key().query(r"Foo\Bar").unwrap();
        assert_eq!(bar.name(), "Bar");
        assert_eq!(bar.value("Value"), Some(&ValueData::Dword(1)));
        assert_eq!(bar.parent().unwrap().name(), "Foo");
        assert_eq!(hive.root_key().subkeys().count(), 1);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_to_json() {
        let json: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        assert_eq!(json["name"], "HKEY_CURRENT_USER");
        let bar = &json["subkeys"][0]["subkeys"][0];
        assert_eq!(bar["name"], "Bar");
        assert_eq!(bar["values"][0]["data"]["Dword"], 1);
    }
}
