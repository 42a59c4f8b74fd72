//! Serde helpers for `f32` fields that may hold infinities or NaN.
//!
//! Human-readable formats (JSON) have no literal for non-finite numbers, so
//! those are written as the strings `"inf"`, `"-inf"` and `"NaN"`. Binary
//! formats (bincode, MessagePack) keep the raw `f32`.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

pub fn serialize<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    FloatRepr(*value).serialize(serializer)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    FloatRepr::deserialize(deserializer).map(|f| f.0)
}

/// Same encoding for `Option<f32>`; `None` stays `null`.
pub mod option {
    use super::FloatRepr;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<f32>, serializer: S) -> Result<S::Ok, S::Error> {
        value.map(FloatRepr).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f32>, D::Error> {
        Option::<FloatRepr>::deserialize(deserializer).map(|o| o.map(|f| f.0))
    }
}

struct FloatRepr(f32);

impl Serialize for FloatRepr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let v = self.0;
        if v.is_finite() || !serializer.is_human_readable() {
            serializer.serialize_f32(v)
        } else if v.is_nan() {
            serializer.serialize_str("NaN")
        } else if v > 0.0 {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }
}

impl<'de> Deserialize<'de> for FloatRepr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            deserializer.deserialize_any(FloatReprVisitor)
        } else {
            f32::deserialize(deserializer).map(FloatRepr)
        }
    }
}

struct FloatReprVisitor;

impl<'de> Visitor<'de> for FloatReprVisitor {
    type Value = FloatRepr;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number or one of \"inf\", \"-inf\", \"NaN\"")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<FloatRepr, E> {
        Ok(FloatRepr(v as f32))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<FloatRepr, E> {
        Ok(FloatRepr(v as f32))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<FloatRepr, E> {
        Ok(FloatRepr(v as f32))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<FloatRepr, E> {
        match v {
            "inf" => Ok(FloatRepr(f32::INFINITY)),
            "-inf" => Ok(FloatRepr(f32::NEG_INFINITY)),
            "NaN" => Ok(FloatRepr(f32::NAN)),
            _ => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
        }
    }
}
