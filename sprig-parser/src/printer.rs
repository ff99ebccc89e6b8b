// sprig-parser - Canonical printing
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Printing values.
//!
//! [`print`] (also `Display`) produces the canonical, read-back-safe form
//! for every literal class. [`print_plain`] is the human form used by `str`:
//! strings and chars are written without quoting and nil is empty.

use std::fmt::{self, Write as _};

use crate::collections::MapKind;
use crate::custom::CustomBody;
use crate::value::Value;

/// Canonical rendering; `read(print(v)) == v` for literal values.
#[must_use]
pub fn print(value: &Value) -> String {
    value.to_string()
}

/// Human rendering used for string concatenation.
#[must_use]
pub fn print_plain(value: &Value) -> String {
    match value {
        Value::Nil => String::new(),
        Value::String(s) => s.to_string(),
        Value::Char(c) => c.to_string(),
        other => other.to_string(),
    }
}

fn format_double(d: f64) -> String {
    if d.is_nan() {
        "##NaN".to_string()
    } else if d.is_infinite() {
        if d > 0.0 { "##Inf" } else { "##-Inf" }.to_string()
    } else {
        // Debug output is the shortest round-tripping form and always
        // carries a `.` or an exponent.
        format!("{d:?}")
    }
}

pub(crate) fn char_name(c: char) -> Option<&'static str> {
    Some(match c {
        ' ' => "space",
        '\n' => "newline",
        '\t' => "tab",
        '\r' => "return",
        _ => return None,
    })
}

fn format_char(c: char) -> String {
    match char_name(c) {
        Some(name) => format!("#\\{name}"),
        None if c.is_control() => format!("#\\u{:04x}", u32::from(c)),
        None => format!("#\\{c}"),
    }
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn write_seq<'a>(
    f: &mut fmt::Formatter<'_>,
    open: &str,
    items: impl Iterator<Item = &'a Value>,
    close: &str,
) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str(close)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Long(n) => write!(f, "{n}"),
            Value::Double(d) => f.write_str(&format_double(*d)),
            Value::Decimal(d) => write!(f, "{d}M"),
            Value::String(s) => f.write_str(&escape_string(s)),
            Value::Char(c) => f.write_str(&format_char(*c)),
            Value::Keyword(k) => write!(f, "{k}"),
            Value::Symbol(s, _) => write!(f, "{s}"),
            Value::ByteBuffer(bytes) => {
                f.write_str("(bytebuf [")?;
                for (i, b) in bytes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{b}")?;
                }
                f.write_str("])")
            }
            Value::List(items, _) => write_seq(f, "(", items.iter(), ")"),
            Value::Vector(items, _) => write_seq(f, "[", items.iter(), "]"),
            Value::Map(map, _) => {
                // Hash maps print in value order so output is stable.
                let entries: Vec<_> = if map.kind() == MapKind::Ordered {
                    map.iter().collect()
                } else {
                    map.sorted_entries()
                };
                f.write_str("{")?;
                for (i, (k, v)) in entries.into_iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k} {v}")?;
                }
                f.write_str("}")
            }
            Value::Set(set, _) => write_seq(f, "#{", set.sorted_values().into_iter(), "}"),
            Value::Function(func) => write!(f, "{func:?}"),
            Value::Atom(a) => write!(f, "{a:?}"),
            Value::Volatile(v) => write!(f, "{v:?}"),
            Value::ThreadLocal(t) => write!(f, "{t:?}"),
            Value::Custom(c) => {
                write!(f, "#{}", c.type_name.qualified_name())?;
                match &c.body {
                    CustomBody::Record(fields) => {
                        f.write_str("{")?;
                        for (i, (k, v)) in fields.iter().enumerate() {
                            if i > 0 {
                                f.write_str(", ")?;
                            }
                            write!(f, "{k} {v}")?;
                        }
                        f.write_str("}")
                    }
                    CustomBody::Wrapped(v) => write!(f, " {v}"),
                }
            }
            Value::Host(h) => write!(f, "{h:?}"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}
