// sprig-core - Per-thread execution context
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The execution context threaded through every evaluation.
//!
//! One [`Context`] belongs to one evaluating thread. It owns that thread's
//! call stack, evaluation depth and current namespace, none of which are
//! ever observed from another thread. The interrupt flag is the exception:
//! an [`InterruptHandle`] can be cloned out and set from anywhere.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use sprig_parser::SourcePos;

use crate::env::{DEFAULT_NS, Globals};
use crate::error::{Error, Result};

/// One entry of the diagnostic call stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub name: String,
    /// Position of the call site.
    pub pos: Option<SourcePos>,
}

impl StackFrame {
    pub fn new(name: impl Into<String>, pos: Option<SourcePos>) -> Self {
        StackFrame {
            name: name.into(),
            pos,
        }
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pos {
            Some(pos) => write!(f, "{} ({pos})", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Cancels evaluation on the contexts that share it. The flag is checked
/// at every function application and every `recur`.
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle(Arc<AtomicBool>);

impl InterruptHandle {
    pub fn interrupt(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_interrupted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Context {
    globals: Arc<Globals>,
    call_stack: Vec<StackFrame>,
    depth: usize,
    namespace: String,
    interrupt: InterruptHandle,
}

impl Context {
    pub fn new(globals: Arc<Globals>) -> Self {
        Context {
            globals,
            call_stack: Vec::new(),
            depth: 0,
            namespace: DEFAULT_NS.to_string(),
            interrupt: InterruptHandle::default(),
        }
    }

    /// A context for another thread: same globals, namespace and interrupt
    /// flag, with an empty call stack.
    pub fn fork(&self) -> Self {
        Context {
            globals: Arc::clone(&self.globals),
            call_stack: Vec::new(),
            depth: 0,
            namespace: self.namespace.clone(),
            interrupt: self.interrupt.clone(),
        }
    }

    pub fn globals(&self) -> &Arc<Globals> {
        &self.globals
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn set_namespace(&mut self, ns: &str) {
        if self.namespace != ns {
            tracing::debug!(from = %self.namespace, to = %ns, "namespace switched");
            self.namespace = ns.to_string();
        }
    }

    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }

    pub fn check_interrupt(&self) -> Result<()> {
        if self.interrupt.is_interrupted() {
            tracing::debug!(depth = self.depth, "evaluation interrupted");
            return Err(Error::interrupted());
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Call stack
    // ------------------------------------------------------------------

    pub fn call_stack(&self) -> &[StackFrame] {
        &self.call_stack
    }

    /// An immutable copy of the current call stack.
    pub fn snapshot(&self) -> Arc<[StackFrame]> {
        Arc::from(self.call_stack.as_slice())
    }

    pub(crate) fn push_frame(&mut self, frame: StackFrame) {
        self.call_stack.push(frame);
    }

    pub(crate) fn pop_frame(&mut self) {
        self.call_stack.pop();
    }

    /// Replace the top frame for a tail call.
    pub(crate) fn replace_frame(&mut self, frame: StackFrame) {
        match self.call_stack.last_mut() {
            Some(top) => *top = frame,
            None => self.call_stack.push(frame),
        }
    }

    pub(crate) fn truncate_stack(&mut self, len: usize) {
        self.call_stack.truncate(len);
    }

    // ------------------------------------------------------------------
    // Depth
    // ------------------------------------------------------------------

    /// Nested evaluator activations currently open on this thread.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn enter(&mut self) -> Result<()> {
        let max = self.globals.config().max_depth;
        if self.depth >= max {
            return Err(Error::resource_exhausted(format!(
                "maximum evaluation depth ({max}) exceeded"
            )));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("namespace", &self.namespace)
            .field("depth", &self.depth)
            .field("stack", &self.call_stack.len())
            .finish()
    }
}
