// sprig-core - Trampolined evaluator
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The tree-walking evaluator.
//!
//! [`eval`] opens one *activation*: a loop that keeps evaluating the form
//! in tail position instead of recursing into it. Special forms and
//! function application hand their tail form back as a [`Step`], so a
//! chain of tail calls or a `recur` loop runs in constant Rust stack and
//! at constant [`Context::depth`]. Only non-tail sub-evaluations (argument
//! values, `if` tests, non-final body forms) open nested activations, and
//! those are what the configured `max_depth` bounds.

pub mod apply;
mod exceptions;
mod interop;
mod quasiquote;
mod special_forms;
mod types;

pub use apply::{NativeFnImpl, make_native_fn, make_plain_fn};
pub use exceptions::{error_from_map, error_map};

use std::sync::Arc;

use sprig_parser::{Function, PMap, PSet, SourcePos, Symbol, Value};

use crate::config::{STACK_GROW_SIZE, STACK_RED_ZONE};
use crate::context::{Context, StackFrame};
use crate::debug::CallEvent;
use crate::destructure::destructure_with;
use crate::env::Env;
use crate::error::{Error, Result};

// ============================================================================
// Steps
// ============================================================================

/// What an evaluation step asks the activation loop to do next.
pub(crate) enum Step {
    /// Finished with a value.
    Done(Value),
    /// Evaluate this form in tail position.
    Eval(Value, Env),
    /// A macro call expanded to this form; evaluate it in place.
    Expand(Value, Env),
    /// Enter a `loop` body. `env` already holds the first bindings.
    Loop {
        patterns: Arc<[Value]>,
        body: Arc<[Value]>,
        base: Env,
        env: Env,
    },
    /// Apply a callable to evaluated arguments in tail position.
    Apply {
        func: Value,
        args: Vec<Value>,
        pos: Option<SourcePos>,
    },
    /// Rebind the innermost loop or function frame.
    Recur(Vec<Value>),
}

/// The frame a `recur` in tail position jumps back to.
enum RecurTarget {
    Loop {
        patterns: Arc<[Value]>,
        body: Arc<[Value]>,
        base: Env,
    },
    Fn {
        func: Function,
        arity: usize,
    },
}

/// The user function whose frame this activation currently owns.
struct ActiveCall {
    func: Function,
    args: Vec<Value>,
}

// ============================================================================
// Entry points
// ============================================================================

/// Evaluate `form` in `env`.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use sprig_core::{Config, Context, Env, Globals, eval};
/// use sprig_parser::{Value, read};
///
/// let globals = Arc::new(Globals::new(Config::default()));
/// sprig_core::register_builtins(&globals);
/// let env = Env::new(Arc::clone(&globals));
/// let mut ctx = Context::new(globals);
/// let form = read("(if true 1 2)", "doc").unwrap();
/// assert_eq!(eval(&form, &env, &mut ctx).unwrap(), Value::Long(1));
/// ```
pub fn eval(form: &Value, env: &Env, ctx: &mut Context) -> Result<Value> {
    activation(ctx, Step::Eval(form.clone(), env.clone()))
}

/// Evaluate a top-level form under the configured expansion mode.
///
/// With `macroexpand_upfront` the form is fully expanded before it runs.
/// A top-level `do` is expanded and evaluated one child at a time, so a
/// macro defined early in the `do` is visible to the forms after it.
/// Otherwise expansion happens lazily as evaluation reaches each call.
pub fn eval_top_level(form: &Value, env: &Env, ctx: &mut Context) -> Result<Value> {
    if !ctx.globals().config().macroexpand_upfront {
        return eval(form, env, ctx);
    }
    if let Value::List(items, _) = form
        && items.front().is_some_and(|head| head.is_symbol_named("do"))
        && !env.is_local(&Symbol::new("do"))
    {
        let mut result = Value::Nil;
        for child in items.iter().skip(1) {
            result = eval_top_level(child, env, ctx)?;
        }
        return Ok(result);
    }
    let expanded = crate::macroexpand::macroexpand_all(form, env, ctx)?;
    eval(&expanded, env, ctx)
}

/// Apply a callable to already-evaluated arguments.
pub fn apply(ctx: &mut Context, func: &Value, args: &[Value]) -> Result<Value> {
    activation(
        ctx,
        Step::Apply {
            func: func.clone(),
            args: args.to_vec(),
            pos: None,
        },
    )
}

/// Evaluate each form of a body for effect and return the last one
/// unevaluated, ready for tail position. An empty body yields `nil`.
pub(crate) fn eval_body(body: &[Value], env: &Env, ctx: &mut Context) -> Result<Value> {
    match body.split_last() {
        None => Ok(Value::Nil),
        Some((last, init)) => {
            for form in init {
                eval(form, env, ctx)?;
            }
            Ok(last.clone())
        }
    }
}

/// One nested evaluator activation. Every activation is a point where the
/// native stack may be extended, so `max_depth` rather than the size of the
/// calling thread's stack decides how deep evaluation can go.
fn activation(ctx: &mut Context, start: Step) -> Result<Value> {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || run_activation(ctx, start))
}

fn run_activation(ctx: &mut Context, start: Step) -> Result<Value> {
    ctx.enter()?;
    let base = ctx.call_stack().len();
    let mut active = None;
    let result = run(ctx, start, &mut active).map_err(|e| e.with_stack(|| ctx.snapshot()));
    if let Some(call) = &active {
        notify_leave(ctx, &call.func, &call.args, &result);
    }
    ctx.truncate_stack(base);
    ctx.leave();
    result
}

fn run(ctx: &mut Context, start: Step, active: &mut Option<ActiveCall>) -> Result<Value> {
    let mut step = start;
    let mut target: Option<RecurTarget> = None;
    // Expansions since the last call or recur. Special forms in between do
    // not reset it, so `(do (m))` style self-expansion is still bounded.
    let mut expansions = 0usize;

    loop {
        step = match step {
            Step::Done(value) => return Ok(value),

            Step::Eval(form, env) => {
                let next =
                    step_form(&form, &env, ctx).map_err(|e| e.with_pos(form.source_pos()))?;
                if matches!(next, Step::Expand(..)) {
                    expansions += 1;
                    let max = ctx.globals().config().max_expansion_steps;
                    if expansions > max {
                        return Err(Error::resource_exhausted(format!(
                            "macro expansion did not terminate after {max} steps"
                        ))
                        .with_pos(form.source_pos()));
                    }
                }
                next
            }

            Step::Expand(form, env) => Step::Eval(form, env),

            Step::Loop {
                patterns,
                body,
                base,
                env,
            } => {
                let tail = eval_body(&body, &env, ctx)?;
                target = Some(RecurTarget::Loop {
                    patterns,
                    body,
                    base,
                });
                Step::Eval(tail, env)
            }

            Step::Recur(args) => {
                ctx.check_interrupt()?;
                expansions = 0;
                match &target {
                    Some(RecurTarget::Loop {
                        patterns,
                        body,
                        base,
                    }) => {
                        if args.len() != patterns.len() {
                            return Err(Error::syntax(
                                "recur",
                                format!(
                                    "expected {} arguments for loop, got {}",
                                    patterns.len(),
                                    args.len()
                                ),
                            ));
                        }
                        let mut env = base.child();
                        for (pattern, value) in patterns.iter().zip(args) {
                            bind_pattern(&mut env, pattern, value, ctx)?;
                        }
                        let tail = eval_body(body, &env, ctx)?;
                        Step::Eval(tail, env)
                    }
                    Some(RecurTarget::Fn { func, arity }) => {
                        let (env, body) = bind_recur(func, *arity, args, ctx)?;
                        let tail = eval_body(&body, &env, ctx)?;
                        Step::Eval(tail, env)
                    }
                    None => {
                        return Err(Error::syntax(
                            "recur",
                            "can only be used in tail position of a loop or fn",
                        ));
                    }
                }
            }

            Step::Apply { func, args, pos } => {
                ctx.check_interrupt()?;
                expansions = 0;
                match func {
                    Value::Function(f) if !f.is_native() => {
                        let frame = StackFrame::new(f.display_name(), pos.clone());
                        if active.is_some() {
                            ctx.replace_frame(frame);
                        } else {
                            ctx.push_frame(frame);
                        }
                        *active = Some(ActiveCall {
                            func: f.clone(),
                            args: args.clone(),
                        });
                        notify(ctx, &f, &args, None, Hook::Call);
                        let (arity, env, body) = bind_call(&f, &args, ctx)
                            .map_err(|e| e.with_pos(pos.as_ref()))?;
                        notify(ctx, &f, &args, Some(&env), Hook::Entry);
                        let tail = eval_body(&body, &env, ctx)?;
                        target = Some(RecurTarget::Fn { func: f, arity });
                        Step::Eval(tail, env)
                    }
                    other => Step::Done(apply::apply_simple(ctx, &other, &args, pos)?),
                }
            }
        };
    }
}

// ============================================================================
// Single steps
// ============================================================================

fn step_form(form: &Value, env: &Env, ctx: &mut Context) -> Result<Step> {
    match form {
        Value::Symbol(sym, _) => Ok(Step::Done(resolve_symbol(sym, env, ctx)?)),
        Value::List(items, _) if items.is_empty() => Ok(Step::Done(form.clone())),
        Value::List(items, _) => {
            let items: Vec<Value> = items.iter().cloned().collect();
            step_list(form, &items, env, ctx)
        }
        Value::Vector(items, _) => {
            let values = items
                .iter()
                .map(|item| eval(item, env, ctx))
                .collect::<Result<Vec<_>>>()?;
            Ok(Step::Done(Value::vector(values)))
        }
        Value::Map(map, _) => {
            let mut pairs = Vec::with_capacity(map.len());
            for (k, v) in map.iter() {
                pairs.push((eval(k, env, ctx)?, eval(v, env, ctx)?));
            }
            Ok(Step::Done(Value::map_from(PMap::from_pairs(map.kind(), pairs))))
        }
        Value::Set(set, _) => {
            let values = set
                .iter()
                .map(|item| eval(item, env, ctx))
                .collect::<Result<Vec<_>>>()?;
            Ok(Step::Done(Value::set_from(PSet::from_values(set.kind(), values))))
        }
        other => Ok(Step::Done(other.clone())),
    }
}

pub(crate) fn resolve_symbol(sym: &Symbol, env: &Env, ctx: &Context) -> Result<Value> {
    if !sym.has_namespace() && sym.name() == "*ns*" && !env.is_local(sym) {
        return Ok(Value::symbol(ctx.namespace()));
    }
    env.lookup_in(sym, ctx.namespace())
}

fn step_list(form: &Value, items: &[Value], env: &Env, ctx: &mut Context) -> Result<Step> {
    let head = &items[0];
    let args = &items[1..];

    if let Value::Symbol(sym, _) = head
        && !sym.has_namespace()
        && !env.is_local(sym)
    {
        match sym.name() {
            "quote" => return special_forms::eval_quote(args),
            "quasiquote" => return quasiquote::eval_quasiquote(args, env, ctx),
            "if" => return special_forms::eval_if(args, env, ctx),
            "do" => return special_forms::eval_do(args, env, ctx),
            "let" => return special_forms::eval_let(args, env, ctx),
            "loop" => return special_forms::eval_loop(args, env, ctx),
            "recur" => return special_forms::eval_recur(args, env, ctx),
            "fn" => return special_forms::eval_fn(args, env, ctx).map(Step::Done),
            "def" => return special_forms::eval_def(args, env, ctx, special_forms::DefKind::Plain),
            "defonce" => return special_forms::eval_def(args, env, ctx, special_forms::DefKind::Once),
            "def-dynamic" => {
                return special_forms::eval_def(args, env, ctx, special_forms::DefKind::Dynamic);
            }
            "defmacro" => return special_forms::eval_defmacro(args, env, ctx),
            "binding" => return special_forms::eval_binding(args, env, ctx),
            "set!" => return special_forms::eval_set(args, env, ctx),
            "eval" => return special_forms::eval_eval(args, env, ctx),
            "ns" => return special_forms::eval_ns(args, ctx),
            "macroexpand-1" | "macroexpand" | "macroexpand-all" => {
                return special_forms::eval_macroexpand(sym.name(), args, env, ctx);
            }
            "try" => return exceptions::eval_try(args, env, ctx),
            "throw" => return exceptions::eval_throw(args, env, ctx),
            "import" => return interop::eval_import(args, ctx),
            "." => return interop::eval_dot(args, env, ctx),
            "deftype" => return types::eval_deftype(args, env, ctx),
            "deftype-of" => return types::eval_deftype_of(args, env, ctx),
            "deftype-or" => return types::eval_deftype_or(args, env, ctx),
            _ => {}
        }
    }

    let func = match head {
        Value::Symbol(sym, _) => resolve_symbol(sym, env, ctx)?,
        other => eval(other, env, ctx)?,
    };

    if let Value::Function(f) = &func
        && f.is_macro()
    {
        let expanded = apply(ctx, &func, args)?;
        tracing::trace!(name = %f.display_name(), expansion = %expanded, "macro expanded");
        return Ok(Step::Expand(expanded, env.clone()));
    }

    let args = args
        .iter()
        .map(|arg| eval(arg, env, ctx))
        .collect::<Result<Vec<_>>>()?;
    Ok(Step::Apply {
        func,
        args,
        pos: form.source_pos().cloned(),
    })
}

/// True for names the evaluator handles itself rather than by lookup.
pub fn is_special_form(name: &str) -> bool {
    matches!(
        name,
        "quote"
            | "quasiquote"
            | "if"
            | "do"
            | "let"
            | "loop"
            | "recur"
            | "fn"
            | "def"
            | "defonce"
            | "def-dynamic"
            | "defmacro"
            | "binding"
            | "set!"
            | "eval"
            | "ns"
            | "macroexpand-1"
            | "macroexpand"
            | "macroexpand-all"
            | "try"
            | "throw"
            | "import"
            | "."
            | "deftype"
            | "deftype-of"
            | "deftype-or"
    )
}

// ============================================================================
// Binding
// ============================================================================

/// Bind `pattern` to `value` in `env`. `:or` defaults are evaluated in the
/// environment as it stood before this pattern.
pub(crate) fn bind_pattern(
    env: &mut Env,
    pattern: &Value,
    value: Value,
    ctx: &mut Context,
) -> Result<()> {
    if let Value::Symbol(sym, _) = pattern {
        return env.bind_in(sym.clone(), value, ctx.namespace());
    }
    let bindings = {
        let scope = env.clone();
        destructure_with(pattern, &value, &mut |form: &Value| eval(form, &scope, ctx))?
    };
    env.bind_all(bindings, ctx.namespace())
}

fn closure_env(func: &Function) -> Result<Env> {
    func.as_user()
        .and_then(|u| u.env().downcast_ref::<Env>())
        .cloned()
        .ok_or_else(|| Error::eval(format!("{} has no closure environment", func.display_name())))
}

fn call_env(func: &Function) -> Result<Env> {
    let mut env = closure_env(func)?.child();
    if let Some(name) = func.name() {
        env.bind_unchecked(name.clone(), Value::Function(func.clone()));
    }
    Ok(env)
}

/// Select the arity for `args` and bind its parameters.
fn bind_call(
    func: &Function,
    args: &[Value],
    ctx: &mut Context,
) -> Result<(usize, Env, Arc<[Value]>)> {
    let user = func
        .as_user()
        .ok_or_else(|| Error::not_callable(&Value::Function(func.clone())))?;
    let Some((index, arity)) = user.select_arity(args.len()) else {
        return Err(Error::arity_spec(
            func.display_name(),
            crate::error::AritySpec::OneOf(user.arity_description()),
            args.len(),
        ));
    };
    let mut env = call_env(func)?;
    for (pattern, value) in arity.params.iter().zip(args) {
        bind_pattern(&mut env, pattern, value.clone(), ctx)?;
    }
    if let Some(rest) = &arity.rest {
        let tail = Value::list(args[arity.fixed()..].to_vec());
        bind_pattern(&mut env, rest, tail, ctx)?;
    }
    Ok((index, env, Arc::clone(&arity.body)))
}

/// Rebind a function frame for `recur`. A variadic arity takes its rest
/// argument as one value.
fn bind_recur(
    func: &Function,
    index: usize,
    args: Vec<Value>,
    ctx: &mut Context,
) -> Result<(Env, Arc<[Value]>)> {
    let arity = func
        .as_user()
        .and_then(|u| u.arities().get(index))
        .ok_or_else(|| Error::eval("recur target has no such arity"))?;
    let expected = arity.fixed() + usize::from(arity.is_variadic());
    if args.len() != expected {
        return Err(Error::syntax(
            "recur",
            format!("expected {expected} arguments, got {}", args.len()),
        ));
    }
    let mut env = call_env(func)?;
    let mut args = args.into_iter();
    for pattern in arity.params.iter() {
        let value = args.next().unwrap_or(Value::Nil);
        bind_pattern(&mut env, pattern, value, ctx)?;
    }
    if let Some(rest) = &arity.rest {
        let value = args.next().unwrap_or(Value::Nil);
        bind_pattern(&mut env, rest, value, ctx)?;
    }
    Ok((env, Arc::clone(&arity.body)))
}

// ============================================================================
// Debugger notification
// ============================================================================

#[derive(Clone, Copy)]
pub(crate) enum Hook {
    Call,
    Entry,
}

pub(crate) fn notify(
    ctx: &Context,
    func: &Function,
    args: &[Value],
    env: Option<&Env>,
    hook: Hook,
) {
    let Some(debugger) = ctx.globals().debugger() else {
        return;
    };
    let event = CallEvent {
        function: func,
        args,
        env,
        stack: ctx.call_stack(),
        result: None,
        error: None,
    };
    match hook {
        Hook::Call => debugger.on_call(&event),
        Hook::Entry => debugger.on_entry(&event),
    }
}

pub(crate) fn notify_leave(ctx: &Context, func: &Function, args: &[Value], result: &Result<Value>) {
    let Some(debugger) = ctx.globals().debugger() else {
        return;
    };
    let mut event = CallEvent {
        function: func,
        args,
        env: None,
        stack: ctx.call_stack(),
        result: None,
        error: None,
    };
    match result {
        Ok(value) => {
            event.result = Some(value);
            debugger.on_exit(&event);
        }
        Err(err) => {
            event.error = Some(err);
            debugger.on_exception(&event);
        }
    }
}
