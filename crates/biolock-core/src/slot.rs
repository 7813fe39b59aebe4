use std::{fmt, str::FromStr};

use thiserror::Error;

/// One of the two independent key/record pairs the sample operates on.
///
/// Each slot resolves its own secret key name and its own persisted record
/// key, so operations on one slot can never touch the other's key material
/// or stored ciphertext.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    One,
    Two,
}

impl Slot {
    /// Both slots, in display order.
    pub const ALL: [Slot; 2] = [Slot::One, Slot::Two];

    /// Key under which this slot's encrypted record is persisted.
    pub fn record_key(self) -> &'static str {
        match self {
            Slot::One => "key",
            Slot::Two => "key2",
        }
    }

    /// Name of the secret key bound to this slot.
    pub fn key_name(self) -> &'static str {
        match self {
            Slot::One => "biolock_key",
            Slot::Two => "biolock_key2",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::One => write!(f, "one"),
            Slot::Two => write!(f, "two"),
        }
    }
}

/// Error returned when a slot argument cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown slot `{0}` (expected `one` or `two`)")]
pub struct ParseSlotError(String);

impl FromStr for Slot {
    type Err = ParseSlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "one" => Ok(Slot::One),
            "2" | "two" => Ok(Slot::Two),
            other => Err(ParseSlotError(other.to_string())),
        }
    }
}
