// sprig-core - Exception handling
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Exception handling special forms: throw, try/catch/finally.
//!
//! A caught error is bound as a plain map with `:kind`, `:message`,
//! `:value` and `:stack`. The map's metadata holds the original [`Error`]
//! under `:sprig/error`, which is how `(throw e)` re-raises it with its
//! stack snapshot intact.

use std::sync::Arc;

use sprig_parser::{HostObject, Keyword, Meta, Value};

use crate::context::Context;
use crate::env::Env;
use crate::error::{Error, Result};
use crate::eval::{Step, bind_pattern, eval};

fn handle_key() -> Value {
    Value::Keyword(Keyword::with_namespace("sprig", "error"))
}

/// The inspectable map a `catch` binding receives.
pub fn error_map(err: &Error) -> Value {
    let stack = err
        .stack()
        .iter()
        .rev()
        .map(|frame| Value::from(frame.to_string()))
        .collect();
    let map = Value::map([
        (Value::keyword("kind"), Value::Keyword(err.kind().keyword())),
        (Value::keyword("message"), Value::from(err.kind().to_string())),
        (
            Value::keyword("value"),
            err.thrown_value().cloned().unwrap_or(Value::Nil),
        ),
        (Value::keyword("stack"), Value::vector(stack)),
    ]);
    let meta = Meta::default().with(handle_key(), Value::Host(HostObject::new("error", err.clone())));
    map.with_meta(Some(Arc::new(meta)))
}

/// The original error behind a map built by [`error_map`].
pub fn error_from_map(value: &Value) -> Option<Error> {
    let Value::Map(..) = value else {
        return None;
    };
    match value.meta()?.get(&handle_key())? {
        Value::Host(obj) => obj.downcast_ref::<Error>().cloned(),
        _ => None,
    }
}

/// (throw value) - raise a user error, or re-raise a caught one
pub(crate) fn eval_throw(args: &[Value], env: &Env, ctx: &mut Context) -> Result<Step> {
    if args.len() != 1 {
        return Err(Error::syntax("throw", "requires exactly 1 argument"));
    }
    let value = eval(&args[0], env, ctx)?;
    match error_from_map(&value) {
        Some(original) => Err(original),
        None => Err(Error::thrown(value)),
    }
}

struct CatchClause {
    selector: Value,
    binding: Value,
    body: Vec<Value>,
}

struct TryForm {
    body: Vec<Value>,
    catches: Vec<CatchClause>,
    finally: Option<Vec<Value>>,
}

fn clause_head(form: &Value) -> Option<&str> {
    match form {
        Value::List(items, _) => match items.front() {
            Some(Value::Symbol(sym, _)) if !sym.has_namespace() => match sym.name() {
                "catch" => Some("catch"),
                "finally" => Some("finally"),
                _ => None,
            },
            _ => None,
        },
        _ => None,
    }
}

fn parse_try(args: &[Value]) -> Result<TryForm> {
    let mut parsed = TryForm {
        body: Vec::new(),
        catches: Vec::new(),
        finally: None,
    };
    for arg in args {
        let head = clause_head(arg);
        if parsed.finally.is_some() {
            return Err(Error::syntax("try", "finally must be the last clause"));
        }
        let items = arg.as_seq_slice().unwrap_or_default();
        match head {
            Some("catch") => {
                if items.len() < 3 {
                    return Err(Error::syntax("try", "catch requires a selector and a binding"));
                }
                parsed.catches.push(CatchClause {
                    selector: items[1].clone(),
                    binding: items[2].clone(),
                    body: items[3..].to_vec(),
                });
            }
            Some(_) => parsed.finally = Some(items[1..].to_vec()),
            None if parsed.catches.is_empty() => parsed.body.push(arg.clone()),
            None => return Err(Error::syntax("try", "body forms must precede catch clauses")),
        }
    }
    Ok(parsed)
}

/// Whether a catch selector matches `err`. Interruption is never caught.
fn catches(selector: &Value, err: &Error) -> bool {
    if err.is_interrupted() {
        return false;
    }
    match selector {
        Value::Keyword(kw) if kw.namespace().is_none() && kw.name() == "default" => true,
        Value::Symbol(sym, _) => sym.name() == "Exception",
        Value::Keyword(kw) => {
            if *kw == err.kind().keyword() {
                return true;
            }
            // A thrown map, or the data of an ex-info map, tagged with :type
            let type_key = Value::keyword("type");
            match err.thrown_value() {
                Some(Value::Map(map, _)) => {
                    map.get(&type_key) == Some(selector)
                        || matches!(map.get(&Value::keyword("data")),
                            Some(Value::Map(data, _)) if data.get(&type_key) == Some(selector))
                }
                _ => false,
            }
        }
        _ => false,
    }
}

fn run_forms(forms: &[Value], env: &Env, ctx: &mut Context) -> Result<Value> {
    let mut result = Value::Nil;
    for form in forms {
        result = eval(form, env, ctx)?;
    }
    Ok(result)
}

/// (try body... (catch selector binding handler...)... (finally cleanup...))
pub(crate) fn eval_try(args: &[Value], env: &Env, ctx: &mut Context) -> Result<Step> {
    let parsed = parse_try(args)?;
    let mut result = run_forms(&parsed.body, env, ctx);

    if let Err(err) = &result
        && let Some(clause) = parsed.catches.iter().find(|c| catches(&c.selector, err))
    {
        let caught = error_map(err);
        let mut local = env.child();
        result = bind_pattern(&mut local, &clause.binding, caught, ctx)
            .and_then(|()| run_forms(&clause.body, &local, ctx));
    }

    if let Some(cleanup) = &parsed.finally {
        let cleaned = run_forms(cleanup, env, ctx);
        if let (Ok(_), Err(err)) = (&result, cleaned) {
            result = Err(err);
        }
    }

    result.map(Step::Done)
}
