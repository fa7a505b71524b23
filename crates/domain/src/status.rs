//! Supply and package status model.
//!
//! Each status is a closed enum with a stable string code. Codes are what gets
//! persisted, and the enums compare equal to their codes so values coming from
//! storage and values written in code can be compared directly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A status code that is not in the status table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind} status: {code:?}")]
pub struct UnknownStatus {
    pub kind: &'static str,
    pub code: String,
}

/// Code table shared by every status enum.
pub trait StatusCode: Copy + Eq + Sized + 'static {
    /// Status family name, used in error messages.
    const KIND: &'static str;

    /// Every declared status, in lifecycle order.
    const ALL: &'static [Self];

    /// Additional codes accepted when decoding.
    const ALIASES: &'static [(&'static str, Self)] = &[];

    /// The canonical code of this status.
    fn code(&self) -> &'static str;

    /// Decodes a canonical code or alias.
    fn from_code(code: &str) -> Result<Self, UnknownStatus> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.code() == code)
            .or_else(|| {
                Self::ALIASES
                    .iter()
                    .find(|(alias, _)| *alias == code)
                    .map(|(_, status)| *status)
            })
            .ok_or_else(|| UnknownStatus {
                kind: Self::KIND,
                code: code.to_string(),
            })
    }
}

macro_rules! status_conversions {
    ($status:ty) => {
        impl fmt::Display for $status {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.code())
            }
        }

        impl FromStr for $status {
            type Err = UnknownStatus;

            fn from_str(code: &str) -> Result<Self, Self::Err> {
                Self::from_code(code)
            }
        }

        impl TryFrom<&str> for $status {
            type Error = UnknownStatus;

            fn try_from(code: &str) -> Result<Self, UnknownStatus> {
                Self::from_code(code)
            }
        }

        impl TryFrom<String> for $status {
            type Error = UnknownStatus;

            fn try_from(code: String) -> Result<Self, UnknownStatus> {
                Self::from_code(&code)
            }
        }

        impl From<$status> for &'static str {
            fn from(status: $status) -> Self {
                status.code()
            }
        }

        impl PartialEq<str> for $status {
            fn eq(&self, other: &str) -> bool {
                Self::from_code(other).is_ok_and(|status| status == *self)
            }
        }

        impl PartialEq<&str> for $status {
            fn eq(&self, other: &&str) -> bool {
                self == *other
            }
        }

        impl PartialEq<String> for $status {
            fn eq(&self, other: &String) -> bool {
                self == other.as_str()
            }
        }

        impl PartialEq<$status> for str {
            fn eq(&self, other: &$status) -> bool {
                other == self
            }
        }

        impl PartialEq<$status> for &str {
            fn eq(&self, other: &$status) -> bool {
                other == *self
            }
        }

        impl PartialEq<$status> for String {
            fn eq(&self, other: &$status) -> bool {
                other == self.as_str()
            }
        }

        impl Serialize for $status {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.code())
            }
        }

        impl<'de> Deserialize<'de> for $status {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let code = String::deserialize(deserializer)?;
                Self::from_code(&code).map_err(serde::de::Error::custom)
            }
        }
    };
}

/// Lifecycle status of a supply.
///
/// ```text
/// New ──► Open ──► Close
///  └───────────────▲
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SupplyStatus {
    /// Just created, nothing packed against it yet.
    #[default]
    New,

    /// Accepting packages.
    Open,

    /// Finalized (terminal state).
    Close,
}

impl StatusCode for SupplyStatus {
    const KIND: &'static str = "supply";
    const ALL: &'static [Self] = &[SupplyStatus::New, SupplyStatus::Open, SupplyStatus::Close];

    fn code(&self) -> &'static str {
        match self {
            SupplyStatus::New => "new",
            SupplyStatus::Open => "open",
            SupplyStatus::Close => "close",
        }
    }
}

impl SupplyStatus {
    /// Returns true while the supply counts as the profile's open supply.
    pub fn is_active(&self) -> bool {
        matches!(self, SupplyStatus::New | SupplyStatus::Open)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SupplyStatus::Close)
    }
}

status_conversions!(SupplyStatus);

/// Status of one order-line inside a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PackageStatus {
    /// Default on order-line addition.
    #[default]
    New,

    /// Packed and ready.
    Packed,

    /// Failed; the line may be packed again elsewhere.
    Error,
}

impl StatusCode for PackageStatus {
    const KIND: &'static str = "package";
    const ALL: &'static [Self] = &[
        PackageStatus::New,
        PackageStatus::Packed,
        PackageStatus::Error,
    ];
    const ALIASES: &'static [(&'static str, Self)] = &[("ready", PackageStatus::Packed)];

    fn code(&self) -> &'static str {
        match self {
            PackageStatus::New => "new",
            PackageStatus::Packed => "packed",
            PackageStatus::Error => "error",
        }
    }
}

impl PackageStatus {
    /// Returns true if a line with this status blocks re-packing of its order-line.
    pub fn holds_order_line(&self) -> bool {
        !matches!(self, PackageStatus::Error)
    }
}

status_conversions!(PackageStatus);
