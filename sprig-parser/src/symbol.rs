// sprig-parser - Symbol type with interning
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Symbols are identifiers that may be optionally namespaced.
//!
//! Symbols are interned, so equality and hashing are pointer operations.
//! Interned symbols are never deallocated; `gensym` output accumulates for
//! the lifetime of the process.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::intern::{Interned, Interner, split_qualified};

static SYMBOLS: Interner = Interner::new();
static GENSYM_COUNTER: AtomicU64 = AtomicU64::new(1);

/// A symbol with optional namespace.
#[derive(Clone)]
pub struct Symbol {
    inner: Arc<Interned>,
}

impl Symbol {
    /// Create a new symbol with no namespace.
    pub fn new(name: &str) -> Self {
        Symbol {
            inner: SYMBOLS.intern(None, name),
        }
    }

    /// Create a new symbol with a namespace.
    pub fn with_namespace(namespace: &str, name: &str) -> Self {
        Symbol {
            inner: SYMBOLS.intern(Some(namespace), name),
        }
    }

    /// Parse a symbol from a string like "foo" or "ns/foo".
    pub fn parse(s: &str) -> Self {
        match split_qualified(s) {
            (Some(ns), name) => Symbol::with_namespace(ns, name),
            (None, name) => Symbol::new(name),
        }
    }

    /// A fresh symbol `prefix__N` that no reader input produces by accident.
    pub fn gensym(prefix: &str) -> Self {
        let n = GENSYM_COUNTER.fetch_add(1, Ordering::Relaxed);
        Symbol::new(&format!("{prefix}__{n}__auto"))
    }

    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.inner.namespace.as_deref()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[must_use]
    pub fn has_namespace(&self) -> bool {
        self.inner.namespace.is_some()
    }

    /// The same name without its namespace.
    #[must_use]
    pub fn unqualified(&self) -> Symbol {
        if self.has_namespace() {
            Symbol::new(self.name())
        } else {
            self.clone()
        }
    }

    /// True for the positional placeholder `_`.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        !self.has_namespace() && self.name() == "_"
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.namespace {
            Some(ns) => write!(f, "{}/{}", ns, self.inner.name),
            None => f.write_str(&self.inner.name),
        }
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self)
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Symbol {}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.inner.cmp_names(&other.inner)
    }
}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.inner).hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_symbol() {
        let sym = Symbol::new("foo");
        assert_eq!(sym.name(), "foo");
        assert!(sym.namespace().is_none());
        assert_eq!(sym.to_string(), "foo");
    }

    #[test]
    fn test_parse_namespaced() {
        let sym = Symbol::parse("user/foo");
        assert_eq!(sym.name(), "foo");
        assert_eq!(sym.namespace(), Some("user"));
        assert_eq!(sym, Symbol::with_namespace("user", "foo"));
        assert_eq!(sym.unqualified(), Symbol::new("foo"));
    }

    #[test]
    fn test_parse_slash_symbol() {
        let sym = Symbol::parse("/");
        assert_eq!(sym.name(), "/");
        assert!(sym.namespace().is_none());
    }

    #[test]
    fn test_gensym_is_unique() {
        let a = Symbol::gensym("x");
        let b = Symbol::gensym("x");
        assert_ne!(a, b);
        assert!(a.name().starts_with("x__"));
    }

    #[test]
    fn test_ordering() {
        let a = Symbol::new("a");
        let b = Symbol::new("b");
        let ns_a = Symbol::with_namespace("ns", "a");
        assert!(a < b);
        assert!(a < ns_a);
    }
}
