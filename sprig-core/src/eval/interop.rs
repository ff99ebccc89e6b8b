// sprig-core - Host interop special forms
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! `import` and `.`, the two forms that reach the [`HostBridge`].
//!
//! ```text
//! (import :java.lang.Math)     ; alias Math
//! (. Math :abs -3)             ; static method
//! (. Math :PI)                 ; static field, else zero-arg static method
//! (. StringBuilder :new "x")   ; constructor
//! (. sb :append "y")           ; instance method
//! ```
//!
//! [`HostBridge`]: crate::host::HostBridge

use sprig_parser::{Symbol, Value};

use crate::context::Context;
use crate::env::Env;
use crate::error::{Error, Result};
use crate::eval::{Step, eval};
use crate::host::{HostResult, HostTarget, HostValue, InvocationError, InvocationErrorKind};

fn class_name(value: &Value) -> Option<String> {
    match value {
        Value::Keyword(kw) => Some(kw.qualified_name()),
        Value::Symbol(sym, _) => Some(sym.to_string()),
        Value::String(s) => Some(s.to_string()),
        _ => None,
    }
}

/// (import :a.b.C ...) - make each class reachable by its simple name
pub(crate) fn eval_import(args: &[Value], ctx: &mut Context) -> Result<Step> {
    for arg in args {
        let class = class_name(arg)
            .ok_or_else(|| Error::syntax("import", format!("expected a class name, got {arg}")))?;
        let alias = class.rsplit('.').next().unwrap_or(&class).to_string();
        ctx.globals().import(Symbol::new(&alias), class);
    }
    Ok(Step::Done(Value::Nil))
}

fn resolve_target(target: &Value, env: &Env, ctx: &mut Context) -> Result<HostTarget> {
    if let Value::Symbol(sym, _) = target
        && !env.is_local(sym)
    {
        if let Some(class) = ctx.globals().resolve_import(sym) {
            return Ok(HostTarget::Class(class));
        }
        if !sym.has_namespace()
            && sym.name().contains('.')
            && ctx.globals().resolve(sym, ctx.namespace()).is_none()
        {
            return Ok(HostTarget::Class(sym.name().to_string()));
        }
    }
    match eval(target, env, ctx)? {
        Value::Host(obj) => Ok(HostTarget::Instance(obj)),
        Value::String(class) => Ok(HostTarget::Class(class.to_string())),
        other => Err(Error::type_mismatch_in(
            ".",
            "host object or class",
            other.type_name(),
        )),
    }
}

/// (. target :member args...)
pub(crate) fn eval_dot(args: &[Value], env: &Env, ctx: &mut Context) -> Result<Step> {
    if args.len() < 2 {
        return Err(Error::syntax(".", "requires a target and a member"));
    }
    let target = resolve_target(&args[0], env, ctx)?;
    let member = match &args[1] {
        Value::Keyword(kw) => kw.name().to_string(),
        Value::Symbol(sym, _) => sym.name().to_string(),
        other => {
            return Err(Error::syntax(".", format!("member must be a keyword, got {other}")));
        }
    };
    let values = args[2..]
        .iter()
        .map(|arg| eval(arg, env, ctx).map(|v| HostValue::from_value(&v)))
        .collect::<Result<Vec<_>>>()?;

    ctx.check_interrupt()?;
    let Some(bridge) = ctx.globals().host().cloned() else {
        return Err(InvocationError::no_bridge(&target, &member).into());
    };

    let result = match (&target, member.as_str()) {
        (HostTarget::Class(_), "new") => bridge.invoke_constructor(&target, &values),
        (HostTarget::Class(_), _) if values.is_empty() => {
            field_or_method(bridge.get_static_field(&target, &member), || {
                bridge.invoke_static_method(&target, &member, &[])
            })
        }
        (HostTarget::Class(_), _) => bridge.invoke_static_method(&target, &member, &values),
        (HostTarget::Instance(_), _) if values.is_empty() => {
            field_or_method(bridge.get_instance_field(&target, &member), || {
                bridge.invoke_instance_method(&target, &member, &[])
            })
        }
        (HostTarget::Instance(_), _) => bridge.invoke_instance_method(&target, &member, &values),
    };
    Ok(Step::Done(result?.into_value()))
}

fn field_or_method(field: HostResult, method: impl FnOnce() -> HostResult) -> HostResult {
    match field {
        Err(err) if err.kind == InvocationErrorKind::NoSuchMember => method(),
        other => other,
    }
}
