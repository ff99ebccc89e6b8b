// sprig-core - Interpreter configuration
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Programmatic interpreter settings. There are no config files; embedders
//! fill a [`Config`] directly or through the embedding builder.

use std::fmt;

/// Default cap on nested evaluator activations.
pub const DEFAULT_MAX_DEPTH: usize = 5_000;

/// Default cap on macro expansions of a single form.
pub const DEFAULT_MAX_EXPANSION_STEPS: usize = 10_000;

/// Stack size for the threads the interpreter starts itself (futures and
/// the command-line runner). Evaluation grows its stack on demand on any
/// thread, so this is a starting size rather than a limit.
pub const EVAL_STACK_SIZE: usize = 16 * 1024 * 1024;

/// Remaining native stack below which an activation moves to a new segment.
pub(crate) const STACK_RED_ZONE: usize = 256 * 1024;

/// Size of each stack segment added by on-demand growth.
pub(crate) const STACK_GROW_SIZE: usize = 8 * 1024 * 1024;

/// How the embedding is being run, visible to programs as `*run-mode*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RunMode {
    #[default]
    Script,
    Repl,
    App,
    Test,
}

impl RunMode {
    pub fn name(self) -> &'static str {
        match self {
            RunMode::Script => "script",
            RunMode::Repl => "repl",
            RunMode::App => "app",
            RunMode::Test => "test",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Nested evaluator activations allowed before `ResourceExhausted`.
    /// Tail calls and `recur` do not count.
    pub max_depth: usize,
    /// Expansions of one form allowed before `ResourceExhausted`.
    pub max_expansion_steps: usize,
    /// Expand each top-level form completely before evaluating it.
    pub macroexpand_upfront: bool,
    pub run_mode: RunMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_depth: DEFAULT_MAX_DEPTH,
            max_expansion_steps: DEFAULT_MAX_EXPANSION_STEPS,
            macroexpand_upfront: false,
            run_mode: RunMode::Script,
        }
    }
}
