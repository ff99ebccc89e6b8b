// sprig-core - Debugger boundary
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Hooks for an external debugger.
//!
//! The evaluator calls an installed [`Debugger`] around every function
//! application:
//!
//! - `on_call` after the arguments are evaluated, before binding;
//! - `on_entry` once parameters are bound, with the body environment;
//! - `on_exit` when the frame produces its value (a frame replaced by a
//!   tail call gets no exit event);
//! - `on_exception` when an error leaves the frame.
//!
//! Hooks run on the evaluating thread and may block it, for example while
//! a breakpoint waits for the user. They never block other threads.

use sprig_parser::{Function, Value};

use crate::context::StackFrame;
use crate::env::Env;
use crate::error::Error;

/// What a hook is told about the application.
pub struct CallEvent<'a> {
    pub function: &'a Function,
    pub args: &'a [Value],
    /// The body environment for user functions, once bound.
    pub env: Option<&'a Env>,
    pub stack: &'a [StackFrame],
    pub result: Option<&'a Value>,
    pub error: Option<&'a Error>,
}

pub trait Debugger: Send + Sync {
    fn on_call(&self, _event: &CallEvent<'_>) {}
    fn on_entry(&self, _event: &CallEvent<'_>) {}
    fn on_exit(&self, _event: &CallEvent<'_>) {}
    fn on_exception(&self, _event: &CallEvent<'_>) {}
}
