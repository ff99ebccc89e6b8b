// sprig-embed - Type conversion traits
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Type conversion between Rust and Sprig values.
//!
//! This module provides the [`IntoValue`] and [`FromValue`] traits for
//! converting between Rust types and [`Value`].
//!
//! # Built-in Conversions
//!
//! | Rust Type | Sprig Type |
//! |-----------|------------|
//! | `()` | `nil` |
//! | `bool` | `boolean` |
//! | `i32`, `i64`, `usize` | `long` |
//! | `f32`, `f64` | `double` |
//! | `BigDecimal` | `decimal` |
//! | `char` | `char` |
//! | `String`, `&str` | `string` |
//! | `Keyword`, `Symbol` | `keyword`, `symbol` |
//! | `Vec<T>` | `vector` |
//! | `Option<T>` | `T` or `nil` |
//! | `HashMap<K, V>`, `BTreeMap<K, V>` | `hash-map` |
//!
//! # Custom Conversions
//!
//! You can implement these traits for your own types:
//!
//! ```rust
//! use sprig_embed::{Error, FromValue, IntoValue, Result, Value};
//!
//! struct Point { x: i64, y: i64 }
//!
//! impl IntoValue for Point {
//!     fn into_value(self) -> Value {
//!         Value::vector(vec![Value::Long(self.x), Value::Long(self.y)])
//!     }
//! }
//!
//! impl FromValue for Point {
//!     fn from_value(val: &Value) -> Result<Self> {
//!         match val.seq_items().as_deref() {
//!             Some([x, y]) => Ok(Point { x: i64::from_value(x)?, y: i64::from_value(y)? }),
//!             _ => Err(Error::type_mismatch("vector of 2 longs", val.type_name())),
//!         }
//!     }
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::Arc;

use sprig_core::{Error, Result};
use sprig_parser::{BigDecimal, Keyword, Symbol, Value};

/// Convert a Rust type into a `Value`.
pub trait IntoValue {
    fn into_value(self) -> Value;
}

/// Convert a `Value` into a Rust type.
pub trait FromValue: Sized {
    fn from_value(val: &Value) -> Result<Self>;
}

// ============================================================================
// IntoValue implementations
// ============================================================================

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::Nil
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Boolean(self)
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> Value {
        Value::Long(self)
    }
}

impl IntoValue for i32 {
    fn into_value(self) -> Value {
        Value::Long(i64::from(self))
    }
}

impl IntoValue for usize {
    fn into_value(self) -> Value {
        // Saturates on 128-bit targets only.
        Value::Long(i64::try_from(self).unwrap_or(i64::MAX))
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Double(self)
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::Double(f64::from(self))
    }
}

impl IntoValue for BigDecimal {
    fn into_value(self) -> Value {
        Value::decimal(self)
    }
}

impl IntoValue for char {
    fn into_value(self) -> Value {
        Value::Char(self)
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::from(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::string(self)
    }
}

impl IntoValue for Arc<str> {
    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl IntoValue for Keyword {
    fn into_value(self) -> Value {
        Value::Keyword(self)
    }
}

impl IntoValue for Symbol {
    fn into_value(self) -> Value {
        Value::from(self)
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::vector(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Nil,
        }
    }
}

impl<K: IntoValue, V: IntoValue> IntoValue for HashMap<K, V> {
    fn into_value(self) -> Value {
        Value::map(
            self.into_iter()
                .map(|(k, v)| (k.into_value(), v.into_value())),
        )
    }
}

impl<K: IntoValue, V: IntoValue> IntoValue for BTreeMap<K, V> {
    fn into_value(self) -> Value {
        Value::map(
            self.into_iter()
                .map(|(k, v)| (k.into_value(), v.into_value())),
        )
    }
}

// ============================================================================
// FromValue implementations
// ============================================================================

impl FromValue for Value {
    fn from_value(val: &Value) -> Result<Self> {
        Ok(val.clone())
    }
}

impl FromValue for () {
    fn from_value(val: &Value) -> Result<Self> {
        match val {
            Value::Nil => Ok(()),
            other => Err(Error::type_mismatch("nil", other.type_name())),
        }
    }
}

impl FromValue for bool {
    fn from_value(val: &Value) -> Result<Self> {
        match val {
            Value::Boolean(b) => Ok(*b),
            other => Err(Error::type_mismatch("boolean", other.type_name())),
        }
    }
}

impl FromValue for i64 {
    fn from_value(val: &Value) -> Result<Self> {
        match val {
            Value::Long(n) => Ok(*n),
            other => Err(Error::type_mismatch("long", other.type_name())),
        }
    }
}

impl FromValue for i32 {
    fn from_value(val: &Value) -> Result<Self> {
        match val {
            Value::Long(n) => i32::try_from(*n).map_err(|_| {
                Error::eval(format!(
                    "long {n} out of range for i32 ({}..={})",
                    i32::MIN,
                    i32::MAX
                ))
            }),
            other => Err(Error::type_mismatch("long", other.type_name())),
        }
    }
}

impl FromValue for usize {
    fn from_value(val: &Value) -> Result<Self> {
        match val {
            Value::Long(n) if *n >= 0 => usize::try_from(*n)
                .map_err(|_| Error::eval(format!("long {n} out of range for usize"))),
            Value::Long(_) => Err(Error::type_mismatch("non-negative long", "negative long")),
            other => Err(Error::type_mismatch("non-negative long", other.type_name())),
        }
    }
}

impl FromValue for f64 {
    fn from_value(val: &Value) -> Result<Self> {
        match val {
            Value::Double(n) => Ok(*n),
            #[allow(clippy::cast_precision_loss)]
            Value::Long(n) => Ok(*n as f64),
            Value::Decimal(d) => d
                .to_string()
                .parse()
                .map_err(|_| Error::eval(format!("decimal {d} does not fit an f64"))),
            other => Err(Error::type_mismatch("number", other.type_name())),
        }
    }
}

impl FromValue for f32 {
    fn from_value(val: &Value) -> Result<Self> {
        let wide = f64::from_value(val)?;
        #[allow(clippy::cast_possible_truncation)]
        let narrow = wide as f32;
        if narrow.is_infinite() && wide.is_finite() {
            return Err(Error::eval(format!("f64 value {wide} overflows f32")));
        }
        Ok(narrow)
    }
}

impl FromValue for BigDecimal {
    fn from_value(val: &Value) -> Result<Self> {
        match val {
            Value::Decimal(d) => Ok(d.as_ref().clone()),
            Value::Long(n) => Ok(BigDecimal::from(*n)),
            other => Err(Error::type_mismatch("decimal", other.type_name())),
        }
    }
}

impl FromValue for char {
    fn from_value(val: &Value) -> Result<Self> {
        match val {
            Value::Char(c) => Ok(*c),
            other => Err(Error::type_mismatch("char", other.type_name())),
        }
    }
}

impl FromValue for String {
    fn from_value(val: &Value) -> Result<Self> {
        match val {
            Value::String(s) => Ok(s.to_string()),
            other => Err(Error::type_mismatch("string", other.type_name())),
        }
    }
}

impl FromValue for Keyword {
    fn from_value(val: &Value) -> Result<Self> {
        match val {
            Value::Keyword(k) => Ok(k.clone()),
            other => Err(Error::type_mismatch("keyword", other.type_name())),
        }
    }
}

impl FromValue for Symbol {
    fn from_value(val: &Value) -> Result<Self> {
        match val {
            Value::Symbol(s, _) => Ok(s.clone()),
            other => Err(Error::type_mismatch("symbol", other.type_name())),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(val: &Value) -> Result<Self> {
        match val {
            Value::Vector(..) | Value::List(..) | Value::Nil => val
                .seq_items()
                .unwrap_or_default()
                .iter()
                .map(T::from_value)
                .collect(),
            other => Err(Error::type_mismatch("vector or list", other.type_name())),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(val: &Value) -> Result<Self> {
        match val {
            Value::Nil => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<K: FromValue + Eq + Hash, V: FromValue> FromValue for HashMap<K, V> {
    fn from_value(val: &Value) -> Result<Self> {
        match val {
            Value::Map(m, _) => m
                .iter()
                .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
                .collect(),
            other => Err(Error::type_mismatch("map", other.type_name())),
        }
    }
}

impl<K: FromValue + Ord, V: FromValue> FromValue for BTreeMap<K, V> {
    fn from_value(val: &Value) -> Result<Self> {
        match val {
            Value::Map(m, _) => m
                .iter()
                .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
                .collect(),
            other => Err(Error::type_mismatch("map", other.type_name())),
        }
    }
}

// ============================================================================
// Convenience functions
// ============================================================================

/// Convert a Rust value into a Value.
///
/// This is a convenience function that calls `IntoValue::into_value`.
#[must_use]
pub fn to_value<T: IntoValue>(value: T) -> Value {
    value.into_value()
}

/// Convert a Value into a Rust type.
///
/// This is a convenience function that calls `FromValue::from_value`.
///
/// # Errors
///
/// Fails when `val` has the wrong type or is out of range for `T`.
pub fn from_value<T: FromValue>(val: &Value) -> Result<T> {
    T::from_value(val)
}
