//! # Wine Registry Codec
//!
//! An offline reader and writer for the text registry files of a Wine
//! prefix, written in Rust.
//!
//! ## Features
//!
//! - **Lossless round trips**: files parsed and written back are byte-identical
//! - **Both formats**: Wine's internal dump format (`system.reg`, `user.reg`)
//!   and the regedit interchange format (`.reg` exports)
//! - **Type-safe**: a closed set of strongly typed registry values
//! - **Editable**: keys and values can be added, changed and deleted in memory
//! - **Comprehensive error handling**: parse errors carry the offending line
//!
//! ## Architecture
//!
//! The codec is built on several layers:
//!
//! 1. **Timestamps** ([`Filetime`]): 100 ns ticks since 1601
//! 2. **Values** ([`ValueData`]): typed data and its `tag:payload` wire form
//! 3. **Keys** ([`Hive`]): an arena tree of keys addressed by [`KeyId`]
//! 4. **Import** ([`parser`]): a line state machine for both file formats
//! 5. **Export** ([`export`]): serializers for both file formats
//! 6. **Prefix** ([`Registry`]): the machine and user hives on disk
//!
//! ## File Layout
//!
//! Wine's dump format looks like this:
//!
//! ```text
//! WINE REGISTRY Version 2
//! ;; All keys relative to REGISTRY\\User\\S-1-5-21-0-0-0-1000
//!
//! #arch=win64
//!
//! [Software\\Wine\\Direct3D] 1760553029
//! #time=1dc3e01c855469c
//! "renderer"="vulkan"
//! "Flags"=hex:de,ad,be,ef
//! ```
//!
//! Key paths are relative to the declared root and escape `\` as `\\`. The
//! number after a key header is the Unix time of its `#time` FILETIME.
//!
//! ## Examples
//!
//! ### Basic Usage
//!
//! ```no_run
//! use wine_registry::Registry;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Open the registry of a Wine prefix
//! let registry = Registry::load("/home/user/.wine")?;
//!
//! // Get the root key
//! let root = registry.current_user().root_key();
//! println!("Root key: {}", root.name());
//!
//! // Enumerate subkeys
//! for subkey in root.subkeys() {
//!     println!("  Subkey: {}", subkey.name());
//! }
//!
//! // Enumerate values
//! for value in root.values() {
//!     println!("  Value: {} = {}", value.name, value.data);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Editing a Hive
//!
//! ```rust
//! use wine_registry::{export, parser, ValueData};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let text = "WINE REGISTRY Version 2\n\
//!             ;; All keys relative to REGISTRY\\\\Machine\n\
//!             \n\
//!             #arch=win64\n";
//! let mut hive = parser::parse_str(text)?;
//!
//! let root = hive.root();
//! let key = hive.add(root, r"Software\Foobar");
//! hive.set_value(key, "Foo", ValueData::String("Bar".into()));
//!
//! let exported = export::to_regedit_string(&hive)?;
//! assert!(exported.contains("[HKEY_LOCAL_MACHINE\\Software\\Foobar]\n\"Foo\"=\"Bar\"\n"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Supported Features
//!
//! - All value encodings Wine writes (`str(2)`, `str(7)`, `dword`, `hex(N)`,
//!   vendor `hex(XXXXXXXX)` types)
//! - Column-wrapped hex payloads in the regedit layout
//! - Symbolic link keys (`#link`), kept but never resolved
//! - UTF-16LE `.reg` files with a byte order mark
//! - Argument building and output parsing for Wine's `reg` command
//!
//! Python bindings are available with the `python` feature and
//! `serde` support for the data types with the `serde` feature.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod export;
pub mod filetime;
pub mod header;
pub mod hive;
pub mod key;
pub mod parser;
pub mod query;
pub mod registry;
pub mod utils;
pub mod value;

// Python bindings (only compiled when python feature is enabled)
#[cfg(feature = "python")]
pub mod python;

// Re-export main types for convenience
pub use error::{RegistryError, Result};
pub use filetime::Filetime;
pub use header::{Format, RootScope};
pub use hive::{Hive, RegistryKey};
pub use key::{KeyId, KeyNode, RegistryValue};
pub use registry::Registry;
pub use value::{ValueData, ValueType};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
