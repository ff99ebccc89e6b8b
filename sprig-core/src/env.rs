// sprig-core - Environment for lexical scoping
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Lexical environments and the shared global table.
//!
//! An [`Env`] is a chain of local frames ending at a root frame, plus a
//! handle on the [`Globals`] every environment of one interpreter shares.
//! Frames are copy-on-write: binding into a frame that a closure has
//! already captured copies it first, so captured frames are never changed
//! in place and closures can be read from any thread.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use sprig_core::{Config, Env, Globals};
//! use sprig_parser::{Symbol, Value};
//!
//! let mut env = Env::new(Arc::new(Globals::new(Config::default())));
//! env.bind(Symbol::new("x"), Value::Long(42)).unwrap();
//!
//! let mut child = env.child();
//! child.bind(Symbol::new("x"), Value::Long(100)).unwrap();
//! assert_eq!(child.lookup(&Symbol::new("x")).unwrap(), Value::Long(100));
//! assert_eq!(env.lookup(&Symbol::new("x")).unwrap(), Value::Long(42));
//! ```

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use sprig_parser::{Symbol, Value};

use crate::config::Config;
use crate::debug::Debugger;
use crate::error::{Error, Result};
use crate::host::HostBridge;
use crate::var::Var;

/// The namespace programs start in. Its definitions are unqualified.
pub const DEFAULT_NS: &str = "user";

// ============================================================================
// Global table
// ============================================================================

/// State shared by every environment and thread of one interpreter.
pub struct Globals {
    vars: DashMap<Symbol, Var>,
    imports: DashMap<Symbol, String>,
    config: Config,
    host: Option<Arc<dyn HostBridge>>,
    debugger: Option<Arc<dyn Debugger>>,
}

impl Globals {
    pub fn new(config: Config) -> Self {
        Globals {
            vars: DashMap::new(),
            imports: DashMap::new(),
            config,
            host: None,
            debugger: None,
        }
    }

    #[must_use]
    pub fn with_host(mut self, host: Arc<dyn HostBridge>) -> Self {
        self.host = Some(host);
        self
    }

    #[must_use]
    pub fn with_debugger(mut self, debugger: Arc<dyn Debugger>) -> Self {
        self.debugger = Some(debugger);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn host(&self) -> Option<&Arc<dyn HostBridge>> {
        self.host.as_ref()
    }

    pub fn debugger(&self) -> Option<&Arc<dyn Debugger>> {
        self.debugger.as_ref()
    }

    /// Install `var` under its name. Fails when the name is taken by a var
    /// that may not be overwritten.
    pub fn def_global(&self, var: Var) -> Result<Var> {
        let name = var.name().clone();
        match self.vars.entry(name.clone()) {
            Entry::Occupied(entry) if !entry.get().is_overwritable() => Err(Error::eval(
                format!("Var {name} is already defined and cannot be overwritten"),
            )),
            Entry::Occupied(mut entry) => {
                entry.insert(var.clone());
                tracing::debug!(name = %name, "var replaced");
                Ok(var)
            }
            Entry::Vacant(entry) => {
                entry.insert(var.clone());
                tracing::debug!(name = %name, "var installed");
                Ok(var)
            }
        }
    }

    /// The var stored under exactly this name.
    pub fn get_var(&self, name: &Symbol) -> Option<Var> {
        self.vars.get(name).map(|v| v.value().clone())
    }

    /// Resolve a symbol as seen from namespace `ns`: qualified symbols are
    /// looked up as written, unqualified ones in `ns` first and then
    /// unqualified.
    pub fn resolve(&self, sym: &Symbol, ns: &str) -> Option<Var> {
        if !sym.has_namespace() && ns != DEFAULT_NS {
            let qualified = Symbol::with_namespace(ns, sym.name());
            if let Some(var) = self.get_var(&qualified) {
                return Some(var);
            }
        }
        self.get_var(sym)
    }

    pub fn remove_var(&self, name: &Symbol) -> Option<Var> {
        self.vars.remove(name).map(|(_, v)| v)
    }

    /// Names of every installed var, sorted.
    pub fn var_names(&self) -> Vec<Symbol> {
        let mut names: Vec<Symbol> = self.vars.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    /// Register `alias` for the host class `class`.
    pub fn import(&self, alias: Symbol, class: String) {
        tracing::debug!(alias = %alias, class = %class, "class imported");
        self.imports.insert(alias, class);
    }

    pub fn resolve_import(&self, alias: &Symbol) -> Option<String> {
        self.imports.get(alias).map(|c| c.value().clone())
    }
}

impl fmt::Debug for Globals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Globals")
            .field("vars", &self.vars.len())
            .field("imports", &self.imports.len())
            .field("config", &self.config)
            .field("host", &self.host.is_some())
            .field("debugger", &self.debugger.is_some())
            .finish()
    }
}

// ============================================================================
// Local frames
// ============================================================================

#[derive(Clone)]
struct Frame {
    outer: Option<Arc<Frame>>,
    locals: Vec<(Symbol, Value)>,
    level: usize,
}

impl Frame {
    fn find(&self, sym: &Symbol) -> Option<&Value> {
        self.locals
            .iter()
            .rev()
            .find(|(name, _)| name == sym)
            .map(|(_, v)| v)
    }
}

/// A lexical environment: a chain of local frames plus the global table.
#[derive(Clone)]
pub struct Env {
    frame: Arc<Frame>,
    globals: Arc<Globals>,
}

impl Env {
    /// A root environment over `globals`.
    pub fn new(globals: Arc<Globals>) -> Self {
        Env {
            frame: Arc::new(Frame {
                outer: None,
                locals: Vec::new(),
                level: 0,
            }),
            globals,
        }
    }

    /// A fresh frame whose outer frame is this one.
    #[must_use]
    pub fn child(&self) -> Self {
        Env {
            frame: Arc::new(Frame {
                outer: Some(Arc::clone(&self.frame)),
                locals: Vec::new(),
                level: self.frame.level + 1,
            }),
            globals: Arc::clone(&self.globals),
        }
    }

    pub fn globals(&self) -> &Arc<Globals> {
        &self.globals
    }

    pub fn level(&self) -> usize {
        self.frame.level
    }

    /// Bind `sym` in the current frame. Shadowing a global function var is
    /// an error; other globals may be shadowed.
    pub fn bind(&mut self, sym: Symbol, value: Value) -> Result<()> {
        self.bind_in(sym, value, DEFAULT_NS)
    }

    /// Like [`Env::bind`], with globals resolved as seen from namespace `ns`.
    pub fn bind_in(&mut self, sym: Symbol, value: Value, ns: &str) -> Result<()> {
        if let Some(var) = self.globals.resolve(&sym, ns)
            && var.holds_function()
        {
            return Err(Error::eval(format!(
                "Cannot bind local '{sym}': it would shadow the global function {sym}"
            )));
        }
        self.bind_unchecked(sym, value);
        Ok(())
    }

    /// Bind without the global-function check. Used for a function's own
    /// name inside its body.
    pub fn bind_unchecked(&mut self, sym: Symbol, value: Value) {
        Arc::make_mut(&mut self.frame).locals.push((sym, value));
    }

    pub fn bind_all(&mut self, bindings: Vec<(Symbol, Value)>, ns: &str) -> Result<()> {
        for (sym, value) in bindings {
            self.bind_in(sym, value, ns)?;
        }
        Ok(())
    }

    /// Look up a local binding only.
    pub fn lookup_local(&self, sym: &Symbol) -> Option<Value> {
        if sym.has_namespace() {
            return None;
        }
        let mut frame = Some(&self.frame);
        while let Some(f) = frame {
            if let Some(v) = f.find(sym) {
                return Some(v.clone());
            }
            frame = f.outer.as_ref();
        }
        None
    }

    /// Look up `sym` in the local chain, then among the globals as seen
    /// from namespace `ns`.
    pub fn lookup_in(&self, sym: &Symbol, ns: &str) -> Result<Value> {
        if let Some(v) = self.lookup_local(sym) {
            return Ok(v);
        }
        self.globals
            .resolve(sym, ns)
            .map(|var| var.get())
            .ok_or_else(|| Error::symbol_not_found(sym))
    }

    /// Look up `sym` from the default namespace.
    pub fn lookup(&self, sym: &Symbol) -> Result<Value> {
        self.lookup_in(sym, DEFAULT_NS)
    }

    /// True when `sym` is bound in the local chain.
    pub fn is_local(&self, sym: &Symbol) -> bool {
        self.lookup_local(sym).is_some()
    }

    /// Install a var into the shared global table.
    pub fn def_global(&self, var: Var) -> Result<Var> {
        self.globals.def_global(var)
    }

    pub fn push_dynamic(&self, sym: &Symbol, value: Value) -> Result<()> {
        self.dynamic_var(sym)?.push_dynamic(value)
    }

    pub fn pop_dynamic(&self, sym: &Symbol) -> Result<Option<Value>> {
        self.dynamic_var(sym)?.pop_dynamic()
    }

    pub fn peek_dynamic(&self, sym: &Symbol) -> Result<Value> {
        self.dynamic_var(sym)?.peek_dynamic()
    }

    fn dynamic_var(&self, sym: &Symbol) -> Result<Var> {
        self.globals
            .get_var(sym)
            .ok_or_else(|| Error::symbol_not_found(sym))
    }

    fn frame_at(&self, level: usize) -> Result<&Arc<Frame>> {
        let mut frame = Some(&self.frame);
        while let Some(f) = frame {
            if f.level == level {
                return Ok(f);
            }
            frame = f.outer.as_ref();
        }
        Err(Error::eval(format!(
            "No environment at level {level} (current level {})",
            self.frame.level
        )))
    }

    /// The enclosing environment at `level`.
    pub fn level_env(&self, level: usize) -> Result<Env> {
        Ok(Env {
            frame: Arc::clone(self.frame_at(level)?),
            globals: Arc::clone(&self.globals),
        })
    }

    /// Bindings made directly in the frame at `level`, in binding order.
    pub fn local_vars(&self, level: usize) -> Result<Vec<(Symbol, Value)>> {
        Ok(self.frame_at(level)?.locals.clone())
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env")
            .field("level", &self.frame.level)
            .field("locals", &self.frame.locals.len())
            .finish()
    }
}
