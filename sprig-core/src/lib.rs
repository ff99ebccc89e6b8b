// sprig-core - Runtime and evaluator for the Sprig language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # sprig-core
//!
//! Runtime and evaluator for the Sprig language: environments and Vars,
//! the per-thread execution [`Context`], destructuring, the macro
//! expander, the trampolined evaluator, builtins and the bundled source
//! modules. The host-interop and debugger boundaries are traits that an
//! embedder implements.

pub mod builtins;
pub mod config;
pub mod context;
pub mod debug;
pub mod destructure;
pub mod env;
pub mod error;
pub mod eval;
pub mod host;
pub mod macroexpand;
pub mod modules;
pub mod var;

pub use builtins::register_builtins;
pub use config::{Config, RunMode};
pub use context::{Context, InterruptHandle, StackFrame};
pub use debug::{CallEvent, Debugger};
pub use destructure::{destructure, pattern_symbols};
pub use env::{DEFAULT_NS, Env, Globals};
pub use error::{AritySpec, Error, ErrorKind, Result};
pub use eval::{
    apply, error_from_map, error_map, eval, eval_top_level, is_special_form, make_native_fn,
    make_plain_fn,
};
pub use host::{HostBridge, HostResult, HostTarget, HostValue, InvocationError, InvocationErrorKind};
pub use macroexpand::{macroexpand, macroexpand_1, macroexpand_all};
pub use modules::{CORE_MODULE, load_module, module_names};
pub use var::{DynamicGuard, Var};

// Re-export parser types for convenience
pub use sprig_parser::{Keyword, Symbol, Value};
