// sprig-core - Definition and binding special forms
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Special forms that touch the global table: def, defonce, def-dynamic,
//! defmacro, binding, set!, ns.

use std::sync::Arc;

use sprig_parser::{Meta, Symbol, Value};

use crate::context::Context;
use crate::env::{DEFAULT_NS, Env};
use crate::error::{Error, Result};
use crate::eval::{Step, eval};
use crate::var::{DynamicGuard, Var};

use super::control::split_bindings;
use super::functions::build_fn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DefKind {
    Plain,
    /// Installs a var that can never be replaced.
    Once,
    Dynamic,
}

impl DefKind {
    fn form(self) -> &'static str {
        match self {
            DefKind::Plain => "def",
            DefKind::Once => "defonce",
            DefKind::Dynamic => "def-dynamic",
        }
    }
}

/// The name a `def` in namespace `ns` installs.
pub(crate) fn qualify(sym: &Symbol, ns: &str) -> Symbol {
    if sym.has_namespace() || ns == DEFAULT_NS {
        sym.clone()
    } else {
        Symbol::with_namespace(ns, sym.name())
    }
}

fn def_name<'a>(form: &str, args: &'a [Value]) -> Result<(&'a Value, &'a Symbol)> {
    match args.first() {
        Some(name @ Value::Symbol(sym, _)) => Ok((name, sym)),
        _ => Err(Error::syntax(form, "first argument must be a symbol")),
    }
}

/// Var metadata: the reader metadata on the name plus an optional docstring.
fn var_meta(name: &Value, doc: Option<&Value>) -> Option<Arc<Meta>> {
    let base = name.meta().map(|m| (**m).clone()).unwrap_or_default();
    let meta = match doc {
        Some(doc) => base.with(Value::keyword("doc"), doc.clone()),
        None => base,
    };
    (!meta.is_empty()).then(|| Arc::new(meta))
}

/// (def name doc? value?)
pub(crate) fn eval_def(
    args: &[Value],
    env: &Env,
    ctx: &mut Context,
    kind: DefKind,
) -> Result<Step> {
    let form = kind.form();
    if args.is_empty() || args.len() > 3 {
        return Err(Error::syntax(form, "requires a name and at most a docstring and a value"));
    }
    let (name, sym) = def_name(form, args)?;
    let (doc, init) = match args.len() {
        1 => (None, None),
        2 => (None, Some(&args[1])),
        _ => match &args[1] {
            doc @ Value::String(_) => (Some(doc), Some(&args[2])),
            _ => return Err(Error::syntax(form, "docstring must be a string")),
        },
    };
    let value = match init {
        Some(init) => eval(init, env, ctx)?,
        None => Value::Nil,
    };
    let meta = var_meta(name, doc);
    let dynamic = kind == DefKind::Dynamic || meta.as_ref().is_some_and(|m| m.flag("dynamic"));
    let sym = qualify(sym, ctx.namespace());
    let var = Var::build(sym, value.clone(), kind != DefKind::Once, dynamic, meta);
    env.def_global(var)?;
    Ok(Step::Done(value))
}

/// (defmacro name doc? [params] body...)
pub(crate) fn eval_defmacro(args: &[Value], env: &Env, ctx: &mut Context) -> Result<Step> {
    let (name, sym) = def_name("defmacro", args)?;
    let (doc, clauses) = match args.get(1) {
        Some(doc @ Value::String(_)) if args.len() > 2 => (Some(doc), &args[2..]),
        _ => (None, &args[1..]),
    };
    let mut fn_args = Vec::with_capacity(clauses.len() + 1);
    fn_args.push(name.clone());
    fn_args.extend_from_slice(clauses);
    let func = build_fn("defmacro", &fn_args, env)?.into_macro();
    let meta = var_meta(name, doc)
        .map(|m| (*m).clone())
        .unwrap_or_default()
        .with(Value::keyword("macro"), Value::Boolean(true));
    let sym = qualify(sym, ctx.namespace());
    let value = Value::Function(func);
    env.def_global(Var::build(sym, value.clone(), true, false, Some(Arc::new(meta))))?;
    Ok(Step::Done(value))
}

fn resolve_dynamic(sym: &Value, form: &str, ctx: &Context) -> Result<Var> {
    let Value::Symbol(sym, _) = sym else {
        return Err(Error::syntax(form, format!("expected a var name, got {sym}")));
    };
    let var = ctx
        .globals()
        .resolve(sym, ctx.namespace())
        .ok_or_else(|| Error::symbol_not_found(sym))?;
    if !var.is_dynamic() {
        return Err(Error::eval(format!(
            "Can't dynamically bind non-dynamic var {sym}"
        )));
    }
    Ok(var)
}

/// (binding [var value ...] body...) - thread-local rebinding of dynamic vars
pub(crate) fn eval_binding(args: &[Value], env: &Env, ctx: &mut Context) -> Result<Step> {
    let (pairs, body) = split_bindings("binding", args)?;
    let mut bindings = Vec::with_capacity(pairs.len());
    for (sym, init) in &pairs {
        let var = resolve_dynamic(sym, "binding", ctx)?;
        bindings.push((var, eval(init, env, ctx)?));
    }
    let _guard = DynamicGuard::push(bindings)?;
    let mut result = Value::Nil;
    for form in body {
        result = eval(form, env, ctx)?;
    }
    Ok(Step::Done(result))
}

/// (set! var value) - replace this thread's innermost binding
pub(crate) fn eval_set(args: &[Value], env: &Env, ctx: &mut Context) -> Result<Step> {
    if args.len() != 2 {
        return Err(Error::syntax("set!", "requires a var name and a value"));
    }
    let var = resolve_dynamic(&args[0], "set!", ctx)?;
    let value = eval(&args[1], env, ctx)?;
    var.set_dynamic(value.clone())?;
    Ok(Step::Done(value))
}

/// (ns name) - switch the current namespace
pub(crate) fn eval_ns(args: &[Value], ctx: &mut Context) -> Result<Step> {
    let Some(Value::Symbol(name, _)) = args.first() else {
        return Err(Error::syntax("ns", "requires a namespace symbol"));
    };
    ctx.set_namespace(&name.to_string());
    Ok(Step::Done(Value::Symbol(name.clone(), None)))
}
