//! # Primitive Types
//!
//! The closed set of numeric element types a field can hold.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use crate::constants::{UNSIGNED_MAX_U16, UNSIGNED_MAX_U32, UNSIGNED_MAX_U8};

/// Numeric element type of a component field.
///
/// Variants are ordered so that iterating a `BTreeMap<PrimitiveType, _>`
/// visits types in a stable order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveType {
    /// Signed 8-bit integer.
    I8,
    /// Unsigned 8-bit integer.
    U8,
    /// Unsigned 8-bit integer with clamped writes (0..=255).
    U8Clamped,
    /// Signed 16-bit integer.
    I16,
    /// Unsigned 16-bit integer.
    U16,
    /// Signed 32-bit integer.
    I32,
    /// Unsigned 32-bit integer.
    U32,
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
    /// Entity identifier. Stored as an unsigned 32-bit integer.
    Eid,
}

impl PrimitiveType {
    /// Every type in the table.
    pub const ALL: [Self; 10] = [
        Self::I8,
        Self::U8,
        Self::U8Clamped,
        Self::I16,
        Self::U16,
        Self::I32,
        Self::U32,
        Self::F32,
        Self::F64,
        Self::Eid,
    ];

    /// Canonical tag used in schemas.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::I8 => "i8",
            Self::U8 => "u8",
            Self::U8Clamped => "u8c",
            Self::I16 => "i16",
            Self::U16 => "u16",
            Self::I32 => "i32",
            Self::U32 => "u32",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Eid => "eid",
        }
    }

    /// Looks a tag up in the table.
    ///
    /// Accepts the canonical names plus the `ui8`/`ui8c`/`ui16`/`ui32`
    /// spellings used by older schema files.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let ty = match name {
            "i8" => Self::I8,
            "u8" | "ui8" => Self::U8,
            "u8c" | "ui8c" => Self::U8Clamped,
            "i16" => Self::I16,
            "u16" | "ui16" => Self::U16,
            "i32" => Self::I32,
            "u32" | "ui32" => Self::U32,
            "f32" => Self::F32,
            "f64" => Self::F64,
            "eid" => Self::Eid,
            _ => return None,
        };
        Some(ty)
    }

    /// Size of one element in bytes.
    #[inline]
    #[must_use]
    pub const fn byte_width(self) -> usize {
        match self {
            Self::I8 | Self::U8 | Self::U8Clamped => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 | Self::Eid => 4,
            Self::F64 => 8,
        }
    }

    /// Largest representable value, for unsigned types.
    #[must_use]
    pub const fn unsigned_max(self) -> Option<u64> {
        match self {
            Self::U8 | Self::U8Clamped => Some(UNSIGNED_MAX_U8),
            Self::U16 => Some(UNSIGNED_MAX_U16),
            Self::U32 | Self::Eid => Some(UNSIGNED_MAX_U32),
            _ => None,
        }
    }

    /// Returns true for the distinguished entity-id type.
    #[inline]
    #[must_use]
    pub const fn is_entity_id(self) -> bool {
        matches!(self, Self::Eid)
    }

    /// Returns true for floating point types.
    #[inline]
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Converts a number to a `u8c` element.
    ///
    /// Out-of-range values saturate, NaN becomes 0 and halves round to even.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn clamp_u8(value: f64) -> u8 {
        if value.is_nan() {
            return 0;
        }
        let clamped = value.clamp(0.0, 255.0);
        let floor = clamped.floor();
        let diff = clamped - floor;
        let rounded = if diff < 0.5 {
            floor
        } else if diff > 0.5 || floor % 2.0 != 0.0 {
            floor + 1.0
        } else {
            floor
        };
        rounded as u8
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A tag that is not in the primitive type table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown primitive type: {0}")]
pub struct ParsePrimitiveTypeError(pub String);

impl FromStr for PrimitiveType {
    type Err = ParsePrimitiveTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ParsePrimitiveTypeError(s.to_string()))
    }
}

impl Serialize for PrimitiveType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for PrimitiveType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TagVisitor;

        impl Visitor<'_> for TagVisitor {
            type Value = PrimitiveType;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a primitive type tag such as \"f32\" or \"eid\"")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(TagVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_roundtrip_through_table() {
        for ty in PrimitiveType::ALL {
            assert_eq!(PrimitiveType::from_name(ty.name()), Some(ty));
        }
    }

    #[test]
    fn test_legacy_aliases() {
        assert_eq!(PrimitiveType::from_name("ui8"), Some(PrimitiveType::U8));
        assert_eq!(PrimitiveType::from_name("ui8c"), Some(PrimitiveType::U8Clamped));
        assert_eq!(PrimitiveType::from_name("ui16"), Some(PrimitiveType::U16));
        assert_eq!(PrimitiveType::from_name("ui32"), Some(PrimitiveType::U32));
        assert_eq!(PrimitiveType::from_name("string"), None);
    }

    #[test]
    fn test_byte_widths() {
        assert_eq!(PrimitiveType::I8.byte_width(), 1);
        assert_eq!(PrimitiveType::U16.byte_width(), 2);
        assert_eq!(PrimitiveType::Eid.byte_width(), 4);
        assert_eq!(PrimitiveType::F64.byte_width(), 8);
    }

    #[test]
    fn test_unsigned_max() {
        assert_eq!(PrimitiveType::U8.unsigned_max(), Some(255));
        assert_eq!(PrimitiveType::U16.unsigned_max(), Some(65_535));
        assert_eq!(PrimitiveType::Eid.unsigned_max(), Some(u64::from(u32::MAX)));
        assert_eq!(PrimitiveType::F32.unsigned_max(), None);
        assert_eq!(PrimitiveType::I32.unsigned_max(), None);
    }

    #[test]
    fn test_clamp_u8() {
        assert_eq!(PrimitiveType::clamp_u8(-4.0), 0);
        assert_eq!(PrimitiveType::clamp_u8(300.0), 255);
        assert_eq!(PrimitiveType::clamp_u8(f64::NAN), 0);
        assert_eq!(PrimitiveType::clamp_u8(1.4), 1);
        assert_eq!(PrimitiveType::clamp_u8(1.5), 2);
        assert_eq!(PrimitiveType::clamp_u8(2.5), 2);
        assert_eq!(PrimitiveType::clamp_u8(2.6), 3);
    }

    #[test]
    fn test_parse_error_names_tag() {
        let err = "vec3".parse::<PrimitiveType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown primitive type: vec3");
    }

    #[test]
    fn test_deserialize_from_toml() {
        #[derive(Deserialize)]
        struct Field {
            ty: PrimitiveType,
        }

        let field: Field = toml::from_str("ty = \"ui16\"").unwrap();
        assert_eq!(field.ty, PrimitiveType::U16);

        assert!(toml::from_str::<Field>("ty = \"bool\"").is_err());
    }
}
