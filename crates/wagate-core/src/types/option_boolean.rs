//! Tri-state boolean with forced overrides.
//!
//! Used for the per-tenant ingestion options (groups, broadcasts, read
//! receipts, calls). A process-level value can be *forced*, in which case
//! it wins over whatever a tenant has configured.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AppError;

/// A boolean that may be unset, and may be forced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OptionBoolean {
    /// No value; defer to the next level.
    #[default]
    Unset,
    /// Disabled.
    False,
    /// Disabled, overriding any lower level.
    ForcedFalse,
    /// Enabled.
    True,
    /// Enabled, overriding any lower level.
    ForcedTrue,
}

impl OptionBoolean {
    /// Whether a value is present.
    pub fn is_set(self) -> bool {
        self != Self::Unset
    }

    /// Whether the value is enabled (forced or not).
    pub fn is_true(self) -> bool {
        matches!(self, Self::True | Self::ForcedTrue)
    }

    /// Whether the value is disabled (forced or not).
    pub fn is_false(self) -> bool {
        matches!(self, Self::False | Self::ForcedFalse)
    }

    /// Whether the value overrides lower levels.
    pub fn is_forced(self) -> bool {
        matches!(self, Self::ForcedFalse | Self::ForcedTrue)
    }

    /// Resolve the effective value of a tenant option against a process default.
    ///
    /// A forced default always wins; otherwise a set tenant value wins;
    /// otherwise the default applies.
    pub fn resolve(default: Self, tenant: Self) -> bool {
        if default.is_forced() || !tenant.is_set() {
            default.is_true()
        } else {
            tenant.is_true()
        }
    }

    /// Compact numeric form stored in the database.
    pub fn to_i16(self) -> i16 {
        match self {
            Self::Unset => 0,
            Self::False => -1,
            Self::ForcedFalse => -2,
            Self::True => 1,
            Self::ForcedTrue => 2,
        }
    }

    /// Inverse of [`OptionBoolean::to_i16`]. Out-of-range values are unset.
    pub fn from_i16(value: i16) -> Self {
        match value {
            -2 => Self::ForcedFalse,
            -1 => Self::False,
            1 => Self::True,
            2 => Self::ForcedTrue,
            _ => Self::Unset,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Unset => "",
            Self::False => "false",
            Self::ForcedFalse => "forcedfalse",
            Self::True => "true",
            Self::ForcedTrue => "forcedtrue",
        }
    }
}

impl From<bool> for OptionBoolean {
    fn from(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }
}

impl From<Option<bool>> for OptionBoolean {
    fn from(value: Option<bool>) -> Self {
        value.map(Self::from).unwrap_or_default()
    }
}

impl From<i16> for OptionBoolean {
    fn from(value: i16) -> Self {
        Self::from_i16(value)
    }
}

impl fmt::Display for OptionBoolean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionBoolean {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "0" | "unset" => Ok(Self::Unset),
            "1" | "t" | "true" | "yes" => Ok(Self::True),
            "-1" | "f" | "false" | "no" => Ok(Self::False),
            "2" | "forcedtrue" => Ok(Self::ForcedTrue),
            "-2" | "forcedfalse" => Ok(Self::ForcedFalse),
            other => Err(AppError::configuration(format!(
                "Invalid option boolean value: {other}"
            ))),
        }
    }
}

impl Serialize for OptionBoolean {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OptionBoolean {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(OptionBooleanVisitor)
    }
}

struct OptionBooleanVisitor;

impl Visitor<'_> for OptionBooleanVisitor {
    type Value = OptionBoolean;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a boolean, an integer in -2..=2, or an option string")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(OptionBoolean::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        i16::try_from(v)
            .ok()
            .filter(|n| (-2..=2).contains(n))
            .map(OptionBoolean::from_i16)
            .ok_or_else(|| E::custom(format!("option boolean out of range: {v}")))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        let v = i64::try_from(v).map_err(|_| E::custom("option boolean out of range"))?;
        self.visit_i64(v)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse().map_err(|e: AppError| E::custom(e.message))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(OptionBoolean::Unset)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(OptionBoolean::Unset)
    }
}
