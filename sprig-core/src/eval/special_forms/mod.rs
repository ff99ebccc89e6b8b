// sprig-core - Special forms
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Special forms for the evaluator. Each returns a [`Step`](super::Step)
//! so that its tail form is evaluated by the caller's activation.

mod control;
mod defs;
mod functions;
mod utility;

pub(crate) use control::{
    eval_do, eval_if, eval_let, eval_loop, eval_quote, eval_recur, split_bindings,
};
pub(crate) use defs::{
    DefKind, eval_binding, eval_def, eval_defmacro, eval_ns, eval_set, qualify,
};
pub(crate) use functions::build_fn;
pub(crate) use utility::{eval_eval, eval_macroexpand};

use sprig_parser::Value;

use crate::context::Context;
use crate::env::Env;
use crate::error::Result;

/// (fn name? [params] body...)
pub(crate) fn eval_fn(args: &[Value], env: &Env, _ctx: &mut Context) -> Result<Value> {
    build_fn("fn", args, env).map(Value::Function)
}
