// sprig-core - Exception built-in functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Exception operations: ex-info, ex-message, ex-data, ex-kind

use sprig_parser::Value;

use crate::error::{Error, Result};
use crate::eval::error_from_map;

use super::collections::lookup;

/// For a caught error map, the thrown value it carries; otherwise the
/// value itself.
fn payload(value: &Value) -> Value {
    if error_from_map(value).is_some() {
        lookup(value, &Value::keyword("value")).unwrap_or(Value::Nil)
    } else {
        value.clone()
    }
}

/// (ex-info msg data) or (ex-info msg data cause)
/// Returns {:message msg :data data} plus :cause when given.
pub(crate) fn builtin_ex_info(args: &[Value]) -> Result<Value> {
    if args.len() < 2 || args.len() > 3 {
        return Err(Error::arity_range("ex-info", 2, 3, args.len()));
    }
    let Value::String(message) = &args[0] else {
        return Err(Error::type_mismatch_in("ex-info", "string", args[0].type_name()));
    };
    if !matches!(args[1], Value::Map(..) | Value::Nil) {
        return Err(Error::type_mismatch_in("ex-info", "map", args[1].type_name()));
    }
    let mut entries = vec![
        (Value::keyword("message"), Value::String(message.clone())),
        (Value::keyword("data"), args[1].clone()),
    ];
    if let Some(cause) = args.get(2) {
        entries.push((Value::keyword("cause"), cause.clone()));
    }
    Ok(Value::map(entries))
}

/// (ex-message ex)
pub(crate) fn builtin_ex_message(args: &[Value]) -> Result<Value> {
    let [ex] = args else {
        return Err(Error::arity_named("ex-message", 1, args.len()));
    };
    let message = Value::keyword("message");
    match payload(ex) {
        inner @ Value::Map(..) => Ok(lookup(&inner, &message).unwrap_or(Value::Nil)),
        Value::String(s) => Ok(Value::String(s)),
        _ => Ok(lookup(ex, &message).unwrap_or(Value::Nil)),
    }
}

/// (ex-data ex)
pub(crate) fn builtin_ex_data(args: &[Value]) -> Result<Value> {
    let [ex] = args else {
        return Err(Error::arity_named("ex-data", 1, args.len()));
    };
    Ok(lookup(&payload(ex), &Value::keyword("data")).unwrap_or(Value::Nil))
}

/// (ex-kind ex) - the error kind keyword of a caught error
pub(crate) fn builtin_ex_kind(args: &[Value]) -> Result<Value> {
    let [ex] = args else {
        return Err(Error::arity_named("ex-kind", 1, args.len()));
    };
    Ok(error_from_map(ex)
        .map(|err| Value::Keyword(err.kind().keyword()))
        .unwrap_or(Value::Nil))
}

/// (ex-trace ex) - the stack trace text of a caught error
pub(crate) fn builtin_ex_trace(args: &[Value]) -> Result<Value> {
    let [ex] = args else {
        return Err(Error::arity_named("ex-trace", 1, args.len()));
    };
    Ok(error_from_map(ex)
        .map(|err| Value::from(err.stack_trace()))
        .unwrap_or(Value::Nil))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::error_map;

    #[test]
    fn test_ex_info_accessors() {
        let data = Value::map([(Value::keyword("code"), Value::Long(7))]);
        let ex = builtin_ex_info(&[Value::string("boom"), data.clone()]).unwrap();
        assert_eq!(builtin_ex_message(&[ex.clone()]).unwrap(), Value::string("boom"));
        assert_eq!(builtin_ex_data(&[ex]).unwrap(), data);
    }

    #[test]
    fn test_accessors_see_through_caught_errors() {
        let data = Value::map([(Value::keyword("code"), Value::Long(7))]);
        let ex = builtin_ex_info(&[Value::string("boom"), data.clone()]).unwrap();
        let caught = error_map(&Error::thrown(ex));
        assert_eq!(builtin_ex_message(&[caught.clone()]).unwrap(), Value::string("boom"));
        assert_eq!(builtin_ex_data(&[caught.clone()]).unwrap(), data);
        assert_eq!(builtin_ex_kind(&[caught]).unwrap(), Value::keyword("thrown"));
    }

    #[test]
    fn test_message_of_internal_error() {
        let caught = error_map(&Error::eval("bad thing"));
        let message = builtin_ex_message(&[caught]).unwrap();
        assert!(message.as_str().unwrap().contains("bad thing"));
    }
}
