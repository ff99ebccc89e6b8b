// sprig-core - Common test utilities
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Shared test helpers and utilities for Sprig integration tests.
//!
//! # Usage
//!
//! In your test file, add:
//! ```ignore
//! mod common;
//! use common::*;
//! ```
//!
//! # Available Helpers
//!
//! - [`eval_str`] - Evaluate code in a fresh environment with the core module
//! - [`eval_str_with_env`] - Evaluate code in an existing environment
//! - [`eval_all`] - Evaluate every form in a string, returning the last
//! - [`new_env`] - Create a new environment with builtins and `core` loaded
//! - [`new_env_with`] - Create a new environment from an explicit [`Config`]
//! - [`on_big_stack`] - Run a closure on a thread sized for deep evaluation
//!
//! # Macros
//!
//! - [`assert_eval!`] - Assert that code evaluates to an expected value
//! - [`assert_eval_err!`] - Assert that code produces an error
//! - [`assert_eval_err_contains!`] - Assert an error whose message contains a pattern

use std::sync::Arc;

pub use sprig_core::config::EVAL_STACK_SIZE;
pub use sprig_core::{
    CORE_MODULE, Config, Context, Env, Error, Globals, load_module, register_builtins,
};
#[allow(unused_imports)]
pub use sprig_parser::{Keyword, Symbol, Value, read, read_all};

/// Create a new environment with builtins registered and `core` loaded.
///
/// # Panics
///
/// Panics if the core module fails to load.
#[must_use]
pub fn new_env() -> Env {
    new_env_with(Config::default())
}

/// Create a new environment for `config` with builtins and `core`.
///
/// # Panics
///
/// Panics if the core module fails to load.
#[must_use]
pub fn new_env_with(config: Config) -> Env {
    env_from_globals(Globals::new(config))
}

/// Finish setting up prepared globals, for tests that install a host
/// bridge or a debugger.
///
/// # Panics
///
/// Panics if the core module fails to load.
#[must_use]
#[allow(dead_code)]
pub fn env_from_globals(globals: Globals) -> Env {
    let globals = Arc::new(globals);
    register_builtins(&globals);
    let env = Env::new(Arc::clone(&globals));
    let mut ctx = Context::new(globals);
    load_module(CORE_MODULE, &env, &mut ctx).expect("core module should load");
    env
}

/// A fresh execution context for `env`'s globals.
#[must_use]
#[allow(dead_code)]
pub fn new_context(env: &Env) -> Context {
    Context::new(Arc::clone(env.globals()))
}

/// Evaluate a Sprig expression string in a fresh environment.
///
/// # Returns
///
/// Returns the value of the last form, or an error message string.
#[must_use]
pub fn eval_str(s: &str) -> Result<Value, String> {
    eval_str_with_env(s, &new_env())
}

/// Evaluate a Sprig expression string in the given environment.
#[must_use]
pub fn eval_str_with_env(s: &str, env: &Env) -> Result<Value, String> {
    eval_all(s, env)
}

/// Evaluate every form in `s`, returning the last result.
///
/// Each form goes through [`sprig_core::eval_top_level`], so the
/// environment's expansion mode is honoured.
#[must_use]
pub fn eval_all(s: &str, env: &Env) -> Result<Value, String> {
    let mut ctx = new_context(env);
    eval_all_in(s, env, &mut ctx).map_err(|e| e.to_string())
}

/// Evaluate every form in `s` with an explicit context, keeping the
/// structured error.
#[allow(dead_code)]
pub fn eval_all_in(s: &str, env: &Env, ctx: &mut Context) -> Result<Value, Error> {
    let mut result = Value::Nil;
    for form in read_all(s, "test")? {
        result = sprig_core::eval_top_level(&form, env, ctx)?;
    }
    Ok(result)
}

/// Run `f` on a thread with the evaluator's stack size and return its
/// result.
///
/// # Panics
///
/// Re-raises a panic from `f`.
#[allow(dead_code)]
pub fn on_big_stack<T, F>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    std::thread::Builder::new()
        .stack_size(EVAL_STACK_SIZE)
        .spawn(f)
        .expect("spawn evaluation thread")
        .join()
        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
}

/// Run `f` on a thread with a deliberately small stack and return its
/// result.
///
/// # Panics
///
/// Re-raises a panic from `f`.
#[allow(dead_code)]
pub fn on_small_stack<T, F>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    std::thread::Builder::new()
        .stack_size(1024 * 1024)
        .spawn(f)
        .expect("spawn evaluation thread")
        .join()
        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
}

/// Shorthand for a keyword value.
#[must_use]
#[allow(dead_code)]
pub fn kw(name: &str) -> Value {
    Value::keyword(name)
}

/// Assert that evaluating `input` produces the expected value.
///
/// # Example
///
/// ```ignore
/// assert_eval!("(+ 1 2)", Value::Long(3));
/// ```
#[macro_export]
macro_rules! assert_eval {
    ($input:expr, $expected:expr) => {
        let result = $crate::common::eval_str($input);
        assert!(
            result.is_ok(),
            "Failed to evaluate '{}': {:?}",
            $input,
            result.err()
        );
        assert_eq!(
            result.unwrap(),
            $expected,
            "Evaluation of '{}' did not match expected",
            $input
        );
    };
}

/// Assert that evaluating `input` produces an error.
///
/// # Example
///
/// ```ignore
/// assert_eval_err!("(+ 1 :not-a-number)");
/// ```
#[macro_export]
macro_rules! assert_eval_err {
    ($input:expr) => {
        let result = $crate::common::eval_str($input);
        assert!(
            result.is_err(),
            "Expected error for '{}' but got {:?}",
            $input,
            result.ok()
        );
    };
}

/// Assert that evaluating `input` produces an error matching the given pattern.
///
/// # Example
///
/// ```ignore
/// assert_eval_err_contains!("(/ 1 0)", "divide by zero");
/// ```
#[macro_export]
macro_rules! assert_eval_err_contains {
    ($input:expr, $pattern:expr) => {
        let result = $crate::common::eval_str($input);
        assert!(
            result.is_err(),
            "Expected error for '{}' but got {:?}",
            $input,
            result.ok()
        );
        let err_msg = result.unwrap_err();
        assert!(
            err_msg.to_lowercase().contains(&$pattern.to_lowercase()),
            "Error message '{}' does not contain '{}'",
            err_msg,
            $pattern
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_str_basic() {
        assert_eq!(eval_str("42").unwrap(), Value::Long(42));
        assert_eq!(eval_str("(+ 1 2)").unwrap(), Value::Long(3));
    }

    #[test]
    fn test_eval_str_error() {
        assert!(eval_str("(+ 1 :not-a-number)").is_err());
    }

    #[test]
    fn test_eval_all() {
        let env = new_env();
        let result = eval_all("(def x 1) (def y 2) (+ x y)", &env).unwrap();
        assert_eq!(result, Value::Long(3));
    }
}
