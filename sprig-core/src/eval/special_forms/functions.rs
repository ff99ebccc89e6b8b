// sprig-core - fn and defmacro
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Function literals.
//!
//! `(fn name? [params] body...)` or `(fn name? ([params] body...) ...)`.
//! Parameters may be symbols or destructuring patterns; `& rest` collects
//! the remaining arguments into a list.

use std::any::Any;
use std::sync::Arc;

use sprig_parser::{Arity, Function, Value};

use crate::env::Env;
use crate::error::{Error, Result};

/// Build a closure over `env` from the arguments of an `fn` form.
pub(crate) fn build_fn(form: &str, args: &[Value], env: &Env) -> Result<Function> {
    let (name, clauses) = match args.first() {
        Some(Value::Symbol(sym, _)) => {
            if sym.has_namespace() {
                return Err(Error::syntax(form, "function name must not be qualified"));
            }
            (Some(sym.clone()), &args[1..])
        }
        _ => (None, args),
    };

    let arities = match clauses.first() {
        Some(params @ Value::Vector(..)) => vec![parse_arity(form, params, &clauses[1..])?],
        Some(Value::List(..)) => clauses
            .iter()
            .map(|clause| {
                let items = clause
                    .as_seq_slice()
                    .filter(|_| matches!(clause, Value::List(..)))
                    .ok_or_else(|| Error::syntax(form, "each arity must be a list"))?;
                match items.split_first() {
                    Some((params, body)) => parse_arity(form, params, body),
                    None => Err(Error::syntax(form, "empty arity clause")),
                }
            })
            .collect::<Result<Vec<_>>>()?,
        _ => return Err(Error::syntax(form, "requires a parameter vector")),
    };

    validate_arities(form, &arities)?;
    let captured: Arc<dyn Any + Send + Sync> = Arc::new(env.clone());
    Ok(Function::user(name, arities, captured, None))
}

fn parse_arity(form: &str, params: &Value, body: &[Value]) -> Result<Arity> {
    let Value::Vector(items, _) = params else {
        return Err(Error::syntax(form, "parameters must be a vector"));
    };
    let mut fixed = Vec::new();
    let mut rest = None;
    let mut iter = items.iter();
    while let Some(param) = iter.next() {
        if param.is_symbol_named("&") {
            let Some(pattern) = iter.next() else {
                return Err(Error::syntax(form, "'&' must be followed by a parameter"));
            };
            if iter.next().is_some() {
                return Err(Error::syntax(form, "only one parameter may follow '&'"));
            }
            check_param(form, pattern)?;
            rest = Some(pattern.clone());
            break;
        }
        check_param(form, param)?;
        fixed.push(param.clone());
    }
    Ok(Arity::new(fixed, rest, body.to_vec()))
}

fn check_param(form: &str, param: &Value) -> Result<()> {
    match param {
        Value::Symbol(sym, _) if !sym.has_namespace() => Ok(()),
        Value::Vector(..) | Value::Map(..) => Ok(()),
        other => Err(Error::syntax(
            form,
            format!("invalid parameter {other}"),
        )),
    }
}

fn validate_arities(form: &str, arities: &[Arity]) -> Result<()> {
    let variadic: Vec<&Arity> = arities.iter().filter(|a| a.is_variadic()).collect();
    if variadic.len() > 1 {
        return Err(Error::syntax(form, "only one variadic arity is allowed"));
    }
    let mut seen = Vec::new();
    for arity in arities.iter().filter(|a| !a.is_variadic()) {
        if seen.contains(&arity.fixed()) {
            return Err(Error::syntax(
                form,
                format!("duplicate arity {}", arity.fixed()),
            ));
        }
        seen.push(arity.fixed());
        if let Some(v) = variadic.first()
            && arity.fixed() > v.fixed()
        {
            return Err(Error::syntax(
                form,
                "a fixed arity may not take more parameters than the variadic one",
            ));
        }
    }
    Ok(())
}
