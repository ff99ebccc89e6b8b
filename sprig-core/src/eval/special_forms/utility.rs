// sprig-core - Utility special forms
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! eval and the macroexpand family.

use std::sync::Arc;

use sprig_parser::Value;

use crate::context::Context;
use crate::env::Env;
use crate::error::{Error, Result};
use crate::eval::{Step, eval};
use crate::macroexpand;

/// (eval form) - evaluate a data structure as code in the global scope
pub(crate) fn eval_eval(args: &[Value], env: &Env, ctx: &mut Context) -> Result<Step> {
    if args.len() != 1 {
        return Err(Error::syntax("eval", "requires exactly one argument"));
    }
    let form = eval(&args[0], env, ctx)?;
    let root = Env::new(Arc::clone(env.globals()));
    let form = if ctx.globals().config().macroexpand_upfront {
        macroexpand::macroexpand_all(&form, &root, ctx)?
    } else {
        form
    };
    Ok(Step::Eval(form, root))
}

/// (macroexpand-1 form), (macroexpand form), (macroexpand-all form)
pub(crate) fn eval_macroexpand(
    name: &str,
    args: &[Value],
    env: &Env,
    ctx: &mut Context,
) -> Result<Step> {
    if args.len() != 1 {
        return Err(Error::syntax(name, "requires exactly one argument"));
    }
    let form = eval(&args[0], env, ctx)?;
    let expanded = match name {
        "macroexpand-1" => macroexpand::macroexpand_1(&form, env, ctx)?.0,
        "macroexpand" => macroexpand::macroexpand(&form, env, ctx)?,
        _ => macroexpand::macroexpand_all(&form, env, ctx)?,
    };
    Ok(Step::Done(expanded))
}
