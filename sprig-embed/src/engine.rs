// sprig-embed - Engine implementation
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The Engine struct - main entry point for embedding Sprig.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sprig_core::env::DEFAULT_NS;
use sprig_core::{
    Config, Context, Debugger, Env, Error, Globals, HostBridge, InterruptHandle, Result, RunMode,
    Var, apply, make_native_fn,
};
use sprig_parser::{Symbol, Value};

use crate::build_env;
use crate::convert::{FromValue, IntoValue};

/// Configures and builds an [`Engine`].
///
/// # Example
///
/// ```rust
/// use sprig_embed::{Engine, RunMode};
///
/// let engine = Engine::builder()
///     .preload("test")
///     .run_mode(RunMode::Test)
///     .max_depth(1_000)
///     .build()
///     .unwrap();
/// assert!(engine.eval_str("(assert= 3 (+ 1 2))").is_ok());
/// ```
#[derive(Default)]
pub struct EngineBuilder {
    config: Config,
    preload: Vec<String>,
    host: Option<Arc<dyn HostBridge>>,
    debugger: Option<Arc<dyn Debugger>>,
}

impl EngineBuilder {
    /// Load a bundled module after `core`.
    #[must_use]
    pub fn preload(mut self, module: &str) -> Self {
        self.preload.push(module.to_string());
        self
    }

    /// Expand each top-level form completely before evaluating it.
    #[must_use]
    pub fn macroexpand_upfront(mut self, upfront: bool) -> Self {
        self.config.macroexpand_upfront = upfront;
        self
    }

    #[must_use]
    pub fn run_mode(mut self, mode: RunMode) -> Self {
        self.config.run_mode = mode;
        self
    }

    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    #[must_use]
    pub fn max_expansion_steps(mut self, steps: usize) -> Self {
        self.config.max_expansion_steps = steps;
        self
    }

    /// Route `.` and `import` through `host`.
    #[must_use]
    pub fn host(mut self, host: Arc<dyn HostBridge>) -> Self {
        self.host = Some(host);
        self
    }

    /// Report every function application to `debugger`.
    #[must_use]
    pub fn debugger(mut self, debugger: Arc<dyn Debugger>) -> Self {
        self.debugger = Some(debugger);
        self
    }

    /// Create the environment and load the modules.
    ///
    /// # Errors
    ///
    /// Fails when a preloaded module is unknown or does not evaluate.
    pub fn build(self) -> Result<Engine> {
        let mut globals = Globals::new(self.config);
        if let Some(host) = self.host {
            globals = globals.with_host(host);
        }
        if let Some(debugger) = self.debugger {
            globals = globals.with_debugger(debugger);
        }
        let preload: Vec<&str> = self.preload.iter().map(String::as_str).collect();
        let env = build_env(globals, &preload)?;
        let ctx = Context::new(Arc::clone(env.globals()));
        Ok(Engine {
            env,
            interrupt: ctx.interrupt_handle(),
            ctx: Mutex::new(ctx),
        })
    }
}

/// The Sprig scripting engine.
///
/// `Engine` provides a high-level interface for evaluating Sprig code,
/// registering Rust functions, and interacting with Sprig values.
///
/// # Thread Safety
///
/// `Engine` is `Send + Sync`. Evaluations through one engine share a
/// single execution context and run one at a time; code that needs
/// parallel evaluation uses `future`, or separate threads calling
/// [`crate::eval`] on [`Engine::env`].
///
/// # Example
///
/// ```rust
/// use sprig_embed::Engine;
///
/// let engine = Engine::new().unwrap();
/// let result = engine.eval_str("(+ 1 2 3)").unwrap();
/// assert_eq!(result.to_string(), "6");
/// ```
pub struct Engine {
    env: Env,
    ctx: Mutex<Context>,
    interrupt: InterruptHandle,
}

impl Engine {
    /// Create an Engine with the default configuration and only `core`
    /// loaded.
    ///
    /// # Errors
    ///
    /// Fails if the core module does not load.
    pub fn new() -> Result<Self> {
        Engine::builder().build()
    }

    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    fn context(&self) -> MutexGuard<'_, Context> {
        // Poisoned only if an earlier evaluation panicked.
        self.ctx.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The symbol `name` is defined under in the current namespace.
    fn qualify(&self, name: &str) -> Symbol {
        let sym = Symbol::parse(name);
        let ctx = self.context();
        if sym.has_namespace() || ctx.namespace() == DEFAULT_NS {
            sym
        } else {
            Symbol::with_namespace(ctx.namespace(), name)
        }
    }

    /// Evaluate a string of Sprig code.
    ///
    /// Returns the result of the last expression.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The code contains syntax errors
    /// - Evaluation fails (undefined symbol, type error, etc.)
    /// - A user-thrown exception is not caught
    ///
    /// # Example
    ///
    /// ```rust
    /// use sprig_embed::Engine;
    ///
    /// let engine = Engine::new().unwrap();
    /// let result = engine.eval_str("(def x 42) (* x 2)").unwrap();
    /// assert_eq!(result.to_string(), "84");
    /// ```
    pub fn eval_str(&self, code: &str) -> Result<Value> {
        self.eval_source(code, "<eval>")
    }

    /// Evaluate source text, attributing positions to `file_name`.
    ///
    /// # Errors
    ///
    /// Returns the first read or evaluation error.
    pub fn eval_source(&self, code: &str, file_name: &str) -> Result<Value> {
        let form = crate::read(code, file_name)?;
        self.eval_form(&form)
    }

    /// Evaluate an already-read top-level form.
    ///
    /// # Errors
    ///
    /// Returns any uncaught evaluation error.
    pub fn eval_form(&self, form: &Value) -> Result<Value> {
        let mut ctx = self.context();
        sprig_core::eval_top_level(form, &self.env, &mut ctx)
    }

    /// Evaluate a file of Sprig code.
    ///
    /// Returns the result of the last expression.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read (not found, permission denied)
    /// - The file contains syntax errors
    /// - Evaluation fails
    pub fn eval_file(&self, path: impl AsRef<Path>) -> Result<Value> {
        let path = path.as_ref();
        let code = std::fs::read_to_string(path)
            .map_err(|e| Error::eval(format!("Error reading '{}': {e}", path.display())))?;
        self.eval_source(&code, &path.display().to_string())
    }

    /// Get a global value as seen from the current namespace.
    ///
    /// Returns `None` if the symbol is not defined.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        let ns = self.namespace();
        self.env
            .globals()
            .resolve(&Symbol::parse(name), &ns)
            .map(|var| var.get())
    }

    /// Get a typed value from the current namespace.
    ///
    /// Returns `None` if the symbol is not defined or cannot be converted.
    #[must_use]
    pub fn get_as<T: FromValue>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(|v| T::from_value(&v).ok())
    }

    /// Get a typed value from the current namespace with error details.
    ///
    /// Unlike `get_as`, this method distinguishes between:
    /// - Symbol not found: returns `Ok(None)`
    /// - Conversion error: returns `Err(...)` with the conversion error
    ///
    /// # Example
    ///
    /// ```rust
    /// use sprig_embed::Engine;
    ///
    /// let engine = Engine::new().unwrap();
    /// engine.eval_str("(def x \"hello\")").unwrap();
    ///
    /// // Symbol not found
    /// let result: Result<Option<i64>, _> = engine.try_get_as("y");
    /// assert!(result.unwrap().is_none());
    ///
    /// // Conversion error (string -> i64)
    /// let result: Result<Option<i64>, _> = engine.try_get_as("x");
    /// assert!(result.is_err());
    /// ```
    pub fn try_get_as<T: FromValue>(&self, name: &str) -> Result<Option<T>> {
        match self.get(name) {
            Some(v) => T::from_value(&v).map(Some),
            None => Ok(None),
        }
    }

    /// Define or replace a global in the current namespace.
    ///
    /// # Errors
    ///
    /// Fails when the name is held by a var that may not be overwritten.
    pub fn set(&self, name: &str, value: impl IntoValue) -> Result<()> {
        let var = Var::new(self.qualify(name), value.into_value());
        self.env.def_global(var).map(|_| ())
    }

    /// Call a function by name with arguments.
    ///
    /// # Errors
    ///
    /// Fails when the name is unbound or the call raises.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sprig_embed::{Engine, Value};
    ///
    /// let engine = Engine::new().unwrap();
    /// let result = engine
    ///     .call("+", &[Value::Long(1), Value::Long(2), Value::Long(3)])
    ///     .unwrap();
    /// assert_eq!(result, Value::Long(6));
    /// ```
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let func = self
            .get(name)
            .ok_or_else(|| Error::symbol_not_found(&Symbol::parse(name)))?;
        let mut ctx = self.context();
        apply(&mut ctx, &func, args)
    }

    /// Call a function by name, converting the arguments and the result.
    ///
    /// # Errors
    ///
    /// Fails when the call raises or the result does not convert.
    pub fn call_as<T: FromValue>(&self, name: &str, args: Vec<Value>) -> Result<T> {
        T::from_value(&self.call(name, &args)?)
    }

    /// Register a native Rust function in the current namespace.
    ///
    /// # Errors
    ///
    /// Fails when the name is held by a var that may not be overwritten.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sprig_embed::{Engine, Value};
    ///
    /// let engine = Engine::new().unwrap();
    /// engine
    ///     .register_native("greet", |args| {
    ///         let name = match args.first() {
    ///             Some(Value::String(s)) => s.to_string(),
    ///             _ => "World".to_string(),
    ///         };
    ///         Ok(Value::from(format!("Hello, {name}!")))
    ///     })
    ///     .unwrap();
    /// ```
    pub fn register_native(
        &self,
        name: &str,
        func: impl Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Result<()> {
        let native = make_native_fn(name, move |_, args| func(args));
        let var = Var::new(self.qualify(name), Value::Function(native));
        self.env.def_global(var)?;
        tracing::debug!(name, "native function registered");
        Ok(())
    }

    /// The environment programs run in. Hand it to [`crate::eval`] to
    /// evaluate on another thread.
    #[must_use]
    pub fn env(&self) -> &Env {
        &self.env
    }

    /// A handle that cancels whatever this engine is evaluating, usable
    /// from any thread.
    #[must_use]
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }

    /// The namespace unqualified definitions go into.
    #[must_use]
    pub fn namespace(&self) -> String {
        self.context().namespace().to_string()
    }

    /// Switch the current namespace.
    pub fn set_namespace(&self, name: &str) {
        self.context().set_namespace(name);
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        self.env.globals().config()
    }
}
