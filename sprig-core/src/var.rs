// sprig-core - Global vars and dynamic binding stacks
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Named global cells.
//!
//! A [`Var`] holds a root value shared by every thread. Dynamic vars also
//! keep one shadow stack per thread: `binding` pushes onto the calling
//! thread's stack and pops when the form exits, so a binding on one thread
//! is never visible from another.

use std::fmt;
use std::sync::{Arc, RwLock};
use std::thread::{self, ThreadId};

use dashmap::DashMap;
use sprig_parser::{Meta, Symbol, Value};

use crate::error::{Error, Result};

struct VarInner {
    name: Symbol,
    root: RwLock<Value>,
    overwritable: bool,
    dynamic: bool,
    meta: Option<Arc<Meta>>,
    shadows: DashMap<ThreadId, Vec<Value>>,
}

#[derive(Clone)]
pub struct Var {
    inner: Arc<VarInner>,
}

impl Var {
    /// A var installed by `def`.
    pub fn new(name: Symbol, value: Value) -> Self {
        Var::build(name, value, true, false, None)
    }

    pub fn build(
        name: Symbol,
        value: Value,
        overwritable: bool,
        dynamic: bool,
        meta: Option<Arc<Meta>>,
    ) -> Self {
        Var {
            inner: Arc::new(VarInner {
                name,
                root: RwLock::new(value),
                overwritable,
                dynamic,
                meta,
                shadows: DashMap::new(),
            }),
        }
    }

    pub fn name(&self) -> &Symbol {
        &self.inner.name
    }

    pub fn is_overwritable(&self) -> bool {
        self.inner.overwritable
    }

    pub fn is_dynamic(&self) -> bool {
        self.inner.dynamic
    }

    pub fn meta(&self) -> Option<&Arc<Meta>> {
        self.inner.meta.as_ref()
    }

    /// Value seen by the calling thread: its innermost dynamic binding, or
    /// the root.
    pub fn get(&self) -> Value {
        if self.inner.dynamic
            && let Some(v) = self.peek_dynamic_opt()
        {
            return v;
        }
        self.root()
    }

    pub fn root(&self) -> Value {
        match self.inner.root.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_root(&self, value: Value) {
        match self.inner.root.write() {
            Ok(mut guard) => *guard = value,
            Err(poisoned) => *poisoned.into_inner() = value,
        }
    }

    /// True when the root value is a plain (non-macro) function.
    pub fn holds_function(&self) -> bool {
        matches!(self.root(), Value::Function(f) if !f.is_macro())
    }

    fn require_dynamic(&self) -> Result<()> {
        if self.inner.dynamic {
            Ok(())
        } else {
            Err(Error::eval(format!(
                "Var {} is not dynamic",
                self.inner.name
            )))
        }
    }

    pub fn push_dynamic(&self, value: Value) -> Result<()> {
        self.require_dynamic()?;
        self.inner
            .shadows
            .entry(thread::current().id())
            .or_default()
            .push(value);
        Ok(())
    }

    pub fn pop_dynamic(&self) -> Result<Option<Value>> {
        self.require_dynamic()?;
        let id = thread::current().id();
        let popped = match self.inner.shadows.get_mut(&id) {
            Some(mut stack) => stack.pop(),
            None => None,
        };
        self.inner.shadows.remove_if(&id, |_, stack| stack.is_empty());
        Ok(popped)
    }

    /// The calling thread's innermost binding, falling back to the root.
    pub fn peek_dynamic(&self) -> Result<Value> {
        self.require_dynamic()?;
        Ok(self.peek_dynamic_opt().unwrap_or_else(|| self.root()))
    }

    fn peek_dynamic_opt(&self) -> Option<Value> {
        self.inner
            .shadows
            .get(&thread::current().id())
            .and_then(|stack| stack.last().cloned())
    }

    pub fn has_thread_binding(&self) -> bool {
        self.inner.dynamic && self.peek_dynamic_opt().is_some()
    }

    /// Replace the calling thread's innermost binding (`set!`).
    pub fn set_dynamic(&self, value: Value) -> Result<()> {
        self.require_dynamic()?;
        match self.inner.shadows.get_mut(&thread::current().id()) {
            Some(mut stack) if !stack.is_empty() => {
                if let Some(top) = stack.last_mut() {
                    *top = value;
                }
                Ok(())
            }
            _ => Err(Error::eval(format!(
                "Can't set! {}: no thread binding",
                self.inner.name
            ))),
        }
    }

    pub fn ptr_eq(&self, other: &Var) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#'{}", self.inner.name)
    }
}

/// Pops the dynamic bindings it was built with when dropped, so `binding`
/// unwinds on error as well as on success.
pub struct DynamicGuard {
    vars: Vec<Var>,
}

impl DynamicGuard {
    /// Push every binding; on failure the ones already pushed are popped.
    pub fn push(bindings: Vec<(Var, Value)>) -> Result<Self> {
        let mut guard = DynamicGuard {
            vars: Vec::with_capacity(bindings.len()),
        };
        for (var, value) in bindings {
            var.push_dynamic(value)?;
            guard.vars.push(var);
        }
        Ok(guard)
    }
}

impl Drop for DynamicGuard {
    fn drop(&mut self) {
        for var in self.vars.iter().rev() {
            let _ = var.pop_dynamic();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dynamic(name: &str, value: Value) -> Var {
        Var::build(Symbol::new(name), value, true, true, None)
    }

    #[test]
    fn test_push_pop_peek() {
        let var = dynamic("*x*", Value::Long(1));
        assert_eq!(var.peek_dynamic().unwrap(), Value::Long(1));
        var.push_dynamic(Value::Long(2)).unwrap();
        var.push_dynamic(Value::Long(3)).unwrap();
        assert_eq!(var.get(), Value::Long(3));
        assert_eq!(var.pop_dynamic().unwrap(), Some(Value::Long(3)));
        assert_eq!(var.peek_dynamic().unwrap(), Value::Long(2));
        var.pop_dynamic().unwrap();
        assert_eq!(var.get(), Value::Long(1));
        assert!(!var.has_thread_binding());
    }

    #[test]
    fn test_non_dynamic_var_rejects_push() {
        let var = Var::new(Symbol::new("x"), Value::Nil);
        assert!(var.push_dynamic(Value::Long(1)).is_err());
        assert!(var.peek_dynamic().is_err());
    }

    #[test]
    fn test_bindings_are_thread_confined() {
        let var = dynamic("*y*", Value::Long(0));
        var.push_dynamic(Value::Long(1)).unwrap();
        let other = var.clone();
        let seen = thread::spawn(move || {
            let before = other.peek_dynamic().unwrap();
            other.push_dynamic(Value::Long(2)).unwrap();
            let during = other.peek_dynamic().unwrap();
            other.pop_dynamic().unwrap();
            (before, during)
        })
        .join()
        .unwrap();
        assert_eq!(seen, (Value::Long(0), Value::Long(2)));
        assert_eq!(var.peek_dynamic().unwrap(), Value::Long(1));
    }

    #[test]
    fn test_guard_pops_on_drop() {
        let var = dynamic("*z*", Value::Nil);
        {
            let _guard = DynamicGuard::push(vec![(var.clone(), Value::Long(5))]).unwrap();
            assert_eq!(var.get(), Value::Long(5));
        }
        assert_eq!(var.get(), Value::Nil);
    }

    #[test]
    fn test_set_dynamic_requires_binding() {
        let var = dynamic("*w*", Value::Nil);
        assert!(var.set_dynamic(Value::Long(1)).is_err());
        var.push_dynamic(Value::Long(1)).unwrap();
        var.set_dynamic(Value::Long(2)).unwrap();
        assert_eq!(var.get(), Value::Long(2));
        var.pop_dynamic().unwrap();
    }
}
