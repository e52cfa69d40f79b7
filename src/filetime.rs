//! Windows FILETIME timestamps as stored by Wine.
//!
//! A [`Filetime`] counts 100-nanosecond intervals since 1601-01-01 UTC. Wine
//! writes it in the `#time=` directive of every key block, and derives the
//! Unix-seconds annotation on the key header line from it.

use crate::error::{RegistryError, Result};
use byteorder::{ByteOrder, LittleEndian};
use chrono::{DateTime, Utc};
use std::fmt;

/// Ticks between 1601-01-01 and the Unix epoch.
const UNIX_EPOCH_TICKS: i64 = 116_444_736_000_000_000;

/// Ticks per second.
const TICKS_PER_SECOND: i64 = 10_000_000;

/// A 64-bit count of 100 ns ticks since the Windows epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Filetime(pub i64);

impl Filetime {
    /// The unset timestamp (1601-01-01 00:00:00 UTC).
    pub const ZERO: Filetime = Filetime(0);

    /// Converts a civil UTC time to a filetime.
    ///
    /// Times beyond the 64-bit tick range wrap around, as in Wine.
    pub fn from_datetime(time: DateTime<Utc>) -> Self {
        let ticks = time
            .timestamp()
            .wrapping_mul(TICKS_PER_SECOND)
            .wrapping_add(i64::from(time.timestamp_subsec_nanos() / 100));
        Filetime(ticks.wrapping_add(UNIX_EPOCH_TICKS))
    }

    /// Returns the current time as a filetime.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Converts to civil UTC time.
    ///
    /// Returns `None` if the tick count is outside the range chrono can represent.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        let since_epoch = self.0.checked_sub(UNIX_EPOCH_TICKS)?;
        let seconds = since_epoch.div_euclid(TICKS_PER_SECOND);
        let nanos = (since_epoch.rem_euclid(TICKS_PER_SECOND) * 100) as u32;
        DateTime::from_timestamp(seconds, nanos)
    }

    /// Returns seconds since the Unix epoch, truncating sub-second precision.
    ///
    /// Tick counts below `i64::MIN` plus the epoch offset wrap around, as in Wine.
    pub fn unix(self) -> i64 {
        self.0.wrapping_sub(UNIX_EPOCH_TICKS) / TICKS_PER_SECOND
    }

    /// Returns the 8-byte little-endian form.
    pub fn to_bytes(self) -> [u8; 8] {
        let mut buf = [0u8; 8];
        LittleEndian::write_i64(&mut buf, self.0);
        buf
    }

    /// Reads a filetime from its 8-byte little-endian form.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::TruncatedData`] if `bytes` is not exactly 8 bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 8 {
            return Err(RegistryError::TruncatedData {
                expected: 8,
                actual: bytes.len(),
            });
        }
        Ok(Filetime(LittleEndian::read_i64(bytes)))
    }

    /// Parses the hexadecimal form used by the `#time=` directive.
    pub fn from_hex(raw: &str) -> Result<Self> {
        u64::from_str_radix(raw.trim(), 16)
            .map(|ticks| Filetime(ticks as i64))
            .map_err(|e| RegistryError::format_error(format!("invalid time {:?}: {}", raw, e)))
    }

    /// Returns true for the unset timestamp.
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::LowerHex for Filetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&(self.0 as u64), f)
    }
}

impl From<DateTime<Utc>> for Filetime {
    fn from(time: DateTime<Utc>) -> Self {
        Self::from_datetime(time)
    }
}
