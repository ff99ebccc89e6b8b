// sprig-parser - Reference cells
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The only mutable values: atoms, volatiles and thread-locals.
//!
//! Atoms and volatiles are shared by every thread holding them. A
//! thread-local keeps a separate value per OS thread, falling back to the
//! value it was created with.

use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread::ThreadId;

use dashmap::DashMap;

use crate::value::{Value, next_identity};

// A panic while holding a cell lock cannot leave a `Value` half-written,
// so poisoned locks are recovered rather than propagated.
fn read(lock: &RwLock<Value>) -> RwLockReadGuard<'_, Value> {
    lock.read().unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn write(lock: &RwLock<Value>) -> RwLockWriteGuard<'_, Value> {
    lock.write().unwrap_or_else(std::sync::PoisonError::into_inner)
}

struct CellInner {
    id: u64,
    value: RwLock<Value>,
}

/// A shared, atomically updated reference.
#[derive(Clone)]
pub struct Atom {
    inner: Arc<CellInner>,
}

impl Atom {
    pub fn new(value: Value) -> Self {
        Atom {
            inner: Arc::new(CellInner {
                id: next_identity(),
                value: RwLock::new(value),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn deref(&self) -> Value {
        read(&self.inner.value).clone()
    }

    /// Store `value` and return it.
    pub fn reset(&self, value: Value) -> Value {
        *write(&self.inner.value) = value.clone();
        value
    }

    /// Store `new` only if the current value still equals `expected`.
    pub fn compare_and_set(&self, expected: &Value, new: Value) -> bool {
        let mut guard = write(&self.inner.value);
        if *guard == *expected {
            *guard = new;
            true
        } else {
            false
        }
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<atom {:?}>", self.deref())
    }
}

/// An unsynchronised-in-spirit mutable box: last write wins.
#[derive(Clone)]
pub struct Volatile {
    inner: Arc<CellInner>,
}

impl Volatile {
    pub fn new(value: Value) -> Self {
        Volatile {
            inner: Arc::new(CellInner {
                id: next_identity(),
                value: RwLock::new(value),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn deref(&self) -> Value {
        read(&self.inner.value).clone()
    }

    pub fn reset(&self, value: Value) -> Value {
        *write(&self.inner.value) = value.clone();
        value
    }
}

impl fmt::Debug for Volatile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<volatile {:?}>", self.deref())
    }
}

struct ThreadLocalInner {
    id: u64,
    initial: Value,
    values: DashMap<ThreadId, Value>,
}

/// A cell holding one value per thread.
#[derive(Clone)]
pub struct ThreadLocal {
    inner: Arc<ThreadLocalInner>,
}

impl ThreadLocal {
    pub fn new(initial: Value) -> Self {
        ThreadLocal {
            inner: Arc::new(ThreadLocalInner {
                id: next_identity(),
                initial,
                values: DashMap::new(),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// The calling thread's value.
    pub fn deref(&self) -> Value {
        self.inner
            .values
            .get(&std::thread::current().id())
            .map_or_else(|| self.inner.initial.clone(), |v| v.value().clone())
    }

    /// Set the calling thread's value.
    pub fn reset(&self, value: Value) -> Value {
        self.inner
            .values
            .insert(std::thread::current().id(), value.clone());
        value
    }

    /// Forget the calling thread's value.
    pub fn clear(&self) {
        self.inner.values.remove(&std::thread::current().id());
    }
}

impl fmt::Debug for ThreadLocal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<thread-local {}>", self.inner.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atom_compare_and_set() {
        let atom = Atom::new(Value::Long(1));
        assert!(!atom.compare_and_set(&Value::Long(2), Value::Long(3)));
        assert!(atom.compare_and_set(&Value::Long(1), Value::Long(3)));
        assert_eq!(atom.deref(), Value::Long(3));
    }

    #[test]
    fn test_atom_is_shared_between_clones() {
        let atom = Atom::new(Value::Nil);
        let other = atom.clone();
        other.reset(Value::Long(5));
        assert_eq!(atom.deref(), Value::Long(5));
    }

    #[test]
    fn test_thread_local_isolation() {
        let local = ThreadLocal::new(Value::Long(0));
        local.reset(Value::Long(1));
        let seen = {
            let local = local.clone();
            std::thread::spawn(move || {
                let before = local.deref();
                local.reset(Value::Long(2));
                before
            })
            .join()
            .unwrap()
        };
        assert_eq!(seen, Value::Long(0));
        assert_eq!(local.deref(), Value::Long(1));
        local.clear();
        assert_eq!(local.deref(), Value::Long(0));
    }
}
