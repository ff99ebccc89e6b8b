// sprig-core - Control flow special forms
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Control flow special forms: quote, if, do, let, loop, recur.

use std::sync::Arc;

use sprig_parser::Value;

use crate::context::Context;
use crate::env::Env;
use crate::error::{Error, Result};
use crate::eval::{Step, bind_pattern, eval, eval_body};

/// (quote form) - return form unevaluated
pub(crate) fn eval_quote(args: &[Value]) -> Result<Step> {
    if args.len() != 1 {
        return Err(Error::syntax("quote", "requires exactly one argument"));
    }
    Ok(Step::Done(args[0].clone()))
}

/// (if test then else?) - only nil and false are falsy
pub(crate) fn eval_if(args: &[Value], env: &Env, ctx: &mut Context) -> Result<Step> {
    if args.len() < 2 || args.len() > 3 {
        return Err(Error::syntax("if", "requires 2 or 3 arguments"));
    }
    let test = eval(&args[0], env, ctx)?;
    if test.is_truthy() {
        Ok(Step::Eval(args[1].clone(), env.clone()))
    } else if let Some(otherwise) = args.get(2) {
        Ok(Step::Eval(otherwise.clone(), env.clone()))
    } else {
        Ok(Step::Done(Value::Nil))
    }
}

/// (do exprs*) - evaluate in order, last value in tail position
pub(crate) fn eval_do(args: &[Value], env: &Env, ctx: &mut Context) -> Result<Step> {
    let tail = eval_body(args, env, ctx)?;
    Ok(Step::Eval(tail, env.clone()))
}

/// Split `[bindings-vector body...]` into pattern/init pairs and the body.
pub(crate) fn split_bindings<'a>(
    form: &str,
    args: &'a [Value],
) -> Result<(Vec<(Value, Value)>, &'a [Value])> {
    let Some(Value::Vector(bindings, _)) = args.first() else {
        return Err(Error::syntax(form, "requires a binding vector"));
    };
    if bindings.len() % 2 != 0 {
        return Err(Error::syntax(
            form,
            "binding vector requires an even number of forms",
        ));
    }
    let items = bindings.to_vec();
    let pairs = items
        .chunks(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect();
    Ok((pairs, &args[1..]))
}

fn bind_sequentially(
    pairs: &[(Value, Value)],
    env: &Env,
    ctx: &mut Context,
) -> Result<Env> {
    let mut local = env.child();
    for (pattern, init) in pairs {
        let value = eval(init, &local, ctx)?;
        bind_pattern(&mut local, pattern, value, ctx)?;
    }
    Ok(local)
}

/// (let [pattern init ...] body...)
pub(crate) fn eval_let(args: &[Value], env: &Env, ctx: &mut Context) -> Result<Step> {
    let (pairs, body) = split_bindings("let", args)?;
    let local = bind_sequentially(&pairs, env, ctx)?;
    let tail = eval_body(body, &local, ctx)?;
    Ok(Step::Eval(tail, local))
}

/// (loop [pattern init ...] body...) - a `recur` target
pub(crate) fn eval_loop(args: &[Value], env: &Env, ctx: &mut Context) -> Result<Step> {
    let (pairs, body) = split_bindings("loop", args)?;
    let local = bind_sequentially(&pairs, env, ctx)?;
    let patterns: Arc<[Value]> = pairs.into_iter().map(|(pattern, _)| pattern).collect();
    Ok(Step::Loop {
        patterns,
        body: Arc::from(body),
        base: env.clone(),
        env: local,
    })
}

/// (recur args*) - rebind the innermost loop or fn frame
pub(crate) fn eval_recur(args: &[Value], env: &Env, ctx: &mut Context) -> Result<Step> {
    let values = args
        .iter()
        .map(|arg| eval(arg, env, ctx))
        .collect::<Result<Vec<_>>>()?;
    Ok(Step::Recur(values))
}
