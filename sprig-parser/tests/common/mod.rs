// sprig-parser - Shared test strategies
// Copyright (c) 2025 Tom Waddington. MIT licensed.

#![allow(dead_code)]

use std::str::FromStr;

use proptest::prelude::*;
use sprig_parser::{BigDecimal, Value};

const RESERVED: &[&str] = &["nil", "true", "false"];

pub fn symbol_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9?!*+-]{0,8}".prop_filter("reserved words read as atoms", |s| {
        !RESERVED.contains(&s.as_str())
    })
}

pub fn keyword_name() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z][a-z0-9-]{0,8}",
        ("[a-z][a-z0-9]{0,4}", "[a-z][a-z0-9]{0,4}").prop_map(|(ns, n)| format!("{ns}/{n}")),
    ]
}

pub fn decimal() -> impl Strategy<Value = Value> {
    (any::<i32>(), 0u32..6).prop_map(|(mantissa, scale)| {
        let text = if scale == 0 {
            mantissa.to_string()
        } else {
            let digits = mantissa.unsigned_abs().to_string();
            let padded = format!("{digits:0>width$}", width = scale as usize + 1);
            let (int, frac) = padded.split_at(padded.len() - scale as usize);
            let sign = if mantissa < 0 { "-" } else { "" };
            format!("{sign}{int}.{frac}")
        };
        Value::decimal(BigDecimal::from_str(&text).unwrap())
    })
}

/// Scalars that have a literal syntax.
pub fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Nil),
        any::<bool>().prop_map(Value::Boolean),
        any::<i64>().prop_map(Value::Long),
        any::<f64>()
            .prop_filter("finite", |d| d.is_finite())
            .prop_map(Value::Double),
        decimal(),
        any::<String>().prop_map(Value::from),
        any::<char>().prop_map(Value::Char),
        keyword_name().prop_map(|k| Value::keyword(&k)),
        symbol_name().prop_map(|s| Value::symbol(&s)),
    ]
}

/// Nested literal values: every class the reader can produce.
pub fn literal() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::list),
            prop::collection::vec(inner.clone(), 0..8).prop_map(Value::vector),
            prop::collection::vec((inner.clone(), inner.clone()), 0..4).prop_map(Value::map),
            prop::collection::vec(inner, 0..4).prop_map(Value::set),
        ]
    })
}
