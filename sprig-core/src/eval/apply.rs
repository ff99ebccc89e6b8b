// sprig-core - Function application
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Native functions and the apply protocol for non-function callables.

use std::any::Any;
use std::sync::Arc;

use sprig_parser::{Function, SourcePos, Value};

use crate::builtins::collections::lookup;
use crate::context::{Context, StackFrame};
use crate::error::{Error, Result};

use super::{Hook, notify, notify_leave};

/// Signature of a native function.
pub type NativeFnImpl = dyn Fn(&mut Context, &[Value]) -> Result<Value> + Send + Sync;

/// Create a native function that sees the calling context.
pub fn make_native_fn(
    name: &str,
    func: impl Fn(&mut Context, &[Value]) -> Result<Value> + Send + Sync + 'static,
) -> Function {
    let func: Arc<NativeFnImpl> = Arc::new(func);
    let func_any: Arc<dyn Any + Send + Sync> = Arc::new(func);
    Function::native(name, func_any)
}

/// Create a native function from a plain `fn(&[Value])`.
pub fn make_plain_fn(name: &str, func: fn(&[Value]) -> Result<Value>) -> Function {
    make_native_fn(name, move |_, args| func(args))
}

fn native_impl(func: &Function) -> Result<Arc<NativeFnImpl>> {
    match func.body() {
        sprig_parser::FnBody::Native(native) => native
            .func()
            .downcast_ref::<Arc<NativeFnImpl>>()
            .cloned()
            .ok_or_else(|| Error::eval(format!("Native function {} has invalid type", func.display_name()))),
        sprig_parser::FnBody::User(_) => Err(Error::eval(format!(
            "{} is not a native function",
            func.display_name()
        ))),
    }
}

/// Apply a native function or a callable collection. User functions go
/// through the activation loop instead.
pub(crate) fn apply_simple(
    ctx: &mut Context,
    func: &Value,
    args: &[Value],
    pos: Option<SourcePos>,
) -> Result<Value> {
    match func {
        Value::Function(f) => apply_native(ctx, f, args, pos),
        Value::Keyword(kw) => {
            check_lookup_arity(&kw.to_string(), args)?;
            let key = Value::Keyword(kw.clone());
            Ok(lookup(&args[0], &key).unwrap_or_else(|| default_arg(args)))
        }
        Value::Map(map, _) => {
            check_lookup_arity("map", args)?;
            Ok(map.get(&args[0]).cloned().unwrap_or_else(|| default_arg(args)))
        }
        Value::Set(set, _) => {
            check_lookup_arity("set", args)?;
            if set.contains(&args[0]) {
                Ok(args[0].clone())
            } else {
                Ok(default_arg(args))
            }
        }
        Value::Vector(items, _) => {
            check_lookup_arity("vector", args)?;
            let Value::Long(index) = &args[0] else {
                return Err(Error::type_mismatch_in(
                    "vector lookup",
                    "long",
                    args[0].type_name(),
                ));
            };
            let found = usize::try_from(*index).ok().and_then(|i| items.get(i));
            match found {
                Some(value) => Ok(value.clone()),
                None if args.len() == 2 => Ok(args[1].clone()),
                None => Err(Error::eval(format!(
                    "Index {index} out of bounds for vector of length {}",
                    items.len()
                ))
                .with_pos(pos.as_ref())),
            }
        }
        other => Err(Error::not_callable(other).with_pos(pos.as_ref())),
    }
}

fn apply_native(
    ctx: &mut Context,
    func: &Function,
    args: &[Value],
    pos: Option<SourcePos>,
) -> Result<Value> {
    let imp = native_impl(func)?;
    ctx.push_frame(StackFrame::new(func.display_name(), pos.clone()));
    notify(ctx, func, args, None, Hook::Call);
    notify(ctx, func, args, None, Hook::Entry);
    let result = imp(ctx, args).map_err(|e| e.with_pos(pos.as_ref()).with_stack(|| ctx.snapshot()));
    notify_leave(ctx, func, args, &result);
    ctx.pop_frame();
    result
}

fn check_lookup_arity(name: &str, args: &[Value]) -> Result<()> {
    if args.is_empty() || args.len() > 2 {
        return Err(Error::arity_range(name, 1, 2, args.len()));
    }
    Ok(())
}

fn default_arg(args: &[Value]) -> Value {
    args.get(1).cloned().unwrap_or(Value::Nil)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::env::Globals;

    fn ctx() -> Context {
        Context::new(Arc::new(Globals::new(Config::default())))
    }

    #[test]
    fn test_native_receives_args() {
        let f = make_plain_fn("count-args", |args| Ok(Value::Long(args.len() as i64)));
        let got = apply_simple(&mut ctx(), &Value::Function(f), &[Value::Nil, Value::Nil], None);
        assert_eq!(got.unwrap(), Value::Long(2));
    }

    #[test]
    fn test_native_frame_is_popped() {
        let mut ctx = ctx();
        let f = make_native_fn("depth", |ctx, _| Ok(Value::Long(ctx.call_stack().len() as i64)));
        let got = apply_simple(&mut ctx, &Value::Function(f), &[], None).unwrap();
        assert_eq!(got, Value::Long(1));
        assert!(ctx.call_stack().is_empty());
    }

    #[test]
    fn test_native_error_carries_stack() {
        let f = make_plain_fn("boom", |_| Err(Error::eval("boom")));
        let err = apply_simple(&mut ctx(), &Value::Function(f), &[], None).unwrap_err();
        assert_eq!(err.stack()[0].name, "boom");
    }

    #[test]
    fn test_callable_collections() {
        let mut ctx = ctx();
        let map = Value::map([(Value::keyword("a"), Value::Long(1))]);
        assert_eq!(
            apply_simple(&mut ctx, &map, &[Value::keyword("a")], None).unwrap(),
            Value::Long(1)
        );
        assert_eq!(
            apply_simple(&mut ctx, &Value::keyword("b"), &[map, Value::Long(9)], None).unwrap(),
            Value::Long(9)
        );
        let set = Value::set([Value::Long(3)]);
        assert_eq!(
            apply_simple(&mut ctx, &set, &[Value::Long(3)], None).unwrap(),
            Value::Long(3)
        );
        assert_eq!(apply_simple(&mut ctx, &set, &[Value::Long(4)], None).unwrap(), Value::Nil);
        let vector = Value::vector(vec![Value::Long(10), Value::Long(20)]);
        assert_eq!(
            apply_simple(&mut ctx, &vector, &[Value::Long(1)], None).unwrap(),
            Value::Long(20)
        );
        assert!(apply_simple(&mut ctx, &vector, &[Value::Long(5)], None).is_err());
    }

    #[test]
    fn test_not_callable() {
        let err = apply_simple(&mut ctx(), &Value::Long(1), &[], None).unwrap_err();
        assert!(err.to_string().contains("Cannot call 1"));
    }
}
