// sprig-core - Metadata built-in functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Metadata operations: meta, with-meta, vary-meta

use std::sync::Arc;

use sprig_parser::{Meta, Value, im::OrdMap};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::eval::apply;

/// (meta obj) - Returns the metadata of obj, or nil if there is none.
pub(crate) fn builtin_meta(args: &[Value]) -> Result<Value> {
    let [value] = args else {
        return Err(Error::arity_named("meta", 1, args.len()));
    };
    Ok(value
        .meta()
        .filter(|m| !m.is_empty())
        .map(|m| m.to_value())
        .unwrap_or(Value::Nil))
}

fn replace_meta(op: &str, value: &Value, meta: &Value) -> Result<Value> {
    if !value.supports_meta() {
        return Err(Error::eval(format!(
            "{op}: {} doesn't support metadata",
            value.type_name()
        )));
    }
    let entries: OrdMap<Value, Value> = match meta {
        Value::Map(map, _) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        Value::Nil => OrdMap::new(),
        other => return Err(Error::type_mismatch_in(op, "map or nil", other.type_name())),
    };
    let updated = match value.meta() {
        Some(existing) => existing.with_entries(entries),
        None => Meta::default().with_entries(entries),
    };
    Ok(value.with_meta((!updated.is_empty()).then(|| Arc::new(updated))))
}

/// (with-meta obj m) - Returns obj with metadata m.
pub(crate) fn builtin_with_meta(args: &[Value]) -> Result<Value> {
    let [value, meta] = args else {
        return Err(Error::arity_named("with-meta", 2, args.len()));
    };
    replace_meta("with-meta", value, meta)
}

/// (vary-meta obj f & args) - Returns obj with metadata (apply f (meta obj) args).
pub(crate) fn builtin_vary_meta(ctx: &mut Context, args: &[Value]) -> Result<Value> {
    if args.len() < 2 {
        return Err(Error::arity_at_least("vary-meta", 2, args.len()));
    }
    let mut call_args = vec![builtin_meta(&args[..1])?];
    call_args.extend_from_slice(&args[2..]);
    let meta = apply(ctx, &args[1], &call_args)?;
    replace_meta("vary-meta", &args[0], &meta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_meta_roundtrip() {
        let m = Value::map([(Value::keyword("doc"), Value::string("hi"))]);
        let v = builtin_with_meta(&[Value::vector(vec![]), m.clone()]).unwrap();
        assert_eq!(builtin_meta(&[v.clone()]).unwrap(), m);
        // Metadata does not affect equality
        assert_eq!(v, Value::vector(vec![]));
    }

    #[test]
    fn test_with_meta_rejects_plain_values() {
        let m = Value::map([]);
        assert!(builtin_with_meta(&[Value::Long(1), m]).is_err());
        assert_eq!(builtin_meta(&[Value::Long(1)]).unwrap(), Value::Nil);
    }
}
