// sprig-embed - Embedding API for Sprig
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # sprig-embed
//!
//! The embedding API of the Sprig interpreter.
//!
//! The free functions [`create_env`], [`read`], [`eval`], [`re`] and
//! [`print`] are the whole interpreter surface. [`Engine`] wraps them with
//! a builder, typed conversions and native-function registration.
//!
//! ## Quick Start
//!
//! ```rust
//! use sprig_embed::Engine;
//!
//! let engine = Engine::new().unwrap();
//! let result = engine.eval_str("(+ 1 2 3)").unwrap();
//! assert_eq!(result.to_string(), "6");
//! ```
//!
//! ## Registering Native Functions
//!
//! ```rust
//! use sprig_embed::{Engine, Error, Value};
//!
//! let engine = Engine::new().unwrap();
//! engine
//!     .register_native("double", |args: &[Value]| match args {
//!         [Value::Long(n)] => Ok(Value::Long(n * 2)),
//!         _ => Err(Error::type_mismatch_in("double", "long", "other")),
//!     })
//!     .unwrap();
//! assert_eq!(engine.eval_str("(double 21)").unwrap(), Value::Long(42));
//! ```
//!
//! ## Threads
//!
//! Evaluation runs on the calling thread. Nested (non-tail) calls extend
//! the native stack on demand, so recursion is bounded by
//! [`Config::max_depth`] on any thread, and running past it is a
//! `ResourceExhausted` error rather than a stack overflow.

mod convert;
mod engine;

use std::sync::Arc;

pub use convert::{FromValue, IntoValue, from_value, to_value};
pub use engine::{Engine, EngineBuilder};

pub use sprig_core::config::EVAL_STACK_SIZE;
pub use sprig_core::{
    CallEvent, Config, Context, Debugger, Env, Error, ErrorKind, Globals, HostBridge, HostResult,
    HostTarget, HostValue, InterruptHandle, InvocationError, InvocationErrorKind, Result, RunMode,
};
pub use sprig_parser::{Keyword, Symbol, Value};

use sprig_core::{CORE_MODULE, load_module, register_builtins};

/// Create an environment with the builtins and the `core` module, then
/// load each module in `preload`.
///
/// # Errors
///
/// Fails when a preloaded module is unknown or does not evaluate.
///
/// # Example
///
/// ```rust
/// use sprig_embed::{RunMode, create_env, re};
///
/// let env = create_env(&["test"], false, RunMode::Test).unwrap();
/// let value = re("(assert= 2 (+ 1 1))", "example.sprig", &env).unwrap();
/// assert_eq!(value.to_string(), "true");
/// ```
pub fn create_env(preload: &[&str], macroexpand_upfront: bool, run_mode: RunMode) -> Result<Env> {
    let config = Config {
        macroexpand_upfront,
        run_mode,
        ..Config::default()
    };
    build_env(Globals::new(config), preload)
}

/// Set up prepared globals: builtins, `core`, then the preloaded modules.
pub(crate) fn build_env(globals: Globals, preload: &[&str]) -> Result<Env> {
    let globals = Arc::new(globals);
    register_builtins(&globals);
    let env = Env::new(Arc::clone(&globals));
    let mut ctx = Context::new(globals);
    load_module(CORE_MODULE, &env, &mut ctx)?;
    for name in preload.iter().filter(|name| **name != CORE_MODULE) {
        load_module(name, &env, &mut ctx)?;
    }
    tracing::debug!(
        modules = preload.len() + 1,
        vars = env.globals().var_count(),
        "environment created"
    );
    Ok(env)
}

/// Read one form from `text`. Several top-level forms come back wrapped
/// in `(do ...)`.
///
/// # Errors
///
/// Returns the read error, with its position in `file_name`.
pub fn read(text: &str, file_name: &str) -> Result<Value> {
    Ok(sprig_parser::read(text, file_name)?)
}

/// Evaluate one top-level form on a fresh execution context.
///
/// # Errors
///
/// Returns any uncaught evaluation error.
pub fn eval(form: &Value, env: &Env) -> Result<Value> {
    let mut ctx = Context::new(Arc::clone(env.globals()));
    sprig_core::eval_top_level(form, env, &mut ctx)
}

/// Read, expand and evaluate `text`, returning the value of the last
/// form.
///
/// # Errors
///
/// Returns the first read or evaluation error.
pub fn re(text: &str, file_name: &str, env: &Env) -> Result<Value> {
    eval(&read(text, file_name)?, env)
}

/// Canonical rendering of `value`; the output reads back as an equal
/// value wherever the value has a literal syntax.
#[must_use]
pub fn print(value: &Value) -> String {
    sprig_parser::print(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_env_loads_core() {
        let env = create_env(&[], false, RunMode::Script).unwrap();
        assert_eq!(re("(when true :yes)", "test", &env).unwrap(), Value::keyword("yes"));
    }

    #[test]
    fn test_create_env_rejects_unknown_module() {
        assert!(create_env(&["missing"], false, RunMode::Script).is_err());
    }

    #[test]
    fn test_run_mode_is_visible() {
        let env = create_env(&[], false, RunMode::Repl).unwrap();
        assert_eq!(re("*run-mode*", "test", &env).unwrap(), Value::keyword("repl"));
    }

    #[test]
    fn test_read_print_round_trip() {
        let form = read("[1 \"a\\tb\" :k {:m #{2.5}}]", "test").unwrap();
        assert_eq!(read(&print(&form), "test").unwrap(), form);
    }

    #[test]
    fn test_re_runs_every_form() {
        let env = create_env(&[], true, RunMode::Script).unwrap();
        assert_eq!(
            re("(defmacro twice [x] `(* 2 ~x)) (twice 4)", "test", &env).unwrap(),
            Value::Long(8)
        );
    }

    #[test]
    fn test_unterminated_input_is_eof() {
        let err = read("(+ 1", "broken.sprig").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Read(e) if e.is_eof()), "{err}");
    }
}
