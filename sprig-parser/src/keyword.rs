// sprig-parser - Keyword type with interning
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Keywords are self-evaluating, interned identifiers such as `:name` or
//! `:ns/name`. They share the interning scheme of [`crate::Symbol`] but live
//! in their own table.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::intern::{Interned, Interner, split_qualified};

static KEYWORDS: Interner = Interner::new();

/// A keyword with optional namespace.
#[derive(Clone)]
pub struct Keyword {
    inner: Arc<Interned>,
}

impl Keyword {
    pub fn new(name: &str) -> Self {
        Keyword {
            inner: KEYWORDS.intern(None, name),
        }
    }

    pub fn with_namespace(namespace: &str, name: &str) -> Self {
        Keyword {
            inner: KEYWORDS.intern(Some(namespace), name),
        }
    }

    /// Parse `:name`, `:ns/name` or the same without the leading colon.
    pub fn parse(s: &str) -> Self {
        let s = s.strip_prefix(':').unwrap_or(s);
        match split_qualified(s) {
            (Some(ns), name) => Keyword::with_namespace(ns, name),
            (None, name) => Keyword::new(name),
        }
    }

    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.inner.namespace.as_deref()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// `ns/name` or `name`, without the colon.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match self.namespace() {
            Some(ns) => format!("{}/{}", ns, self.name()),
            None => self.name().to_string(),
        }
    }

    /// True when this keyword is exactly `:name` with no namespace.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.inner.namespace.is_none() && &*self.inner.name == name
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.qualified_name())
    }
}

impl fmt::Debug for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keyword({})", self)
    }
}

impl PartialEq for Keyword {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Keyword {}

impl PartialOrd for Keyword {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Keyword {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.inner.cmp_names(&other.inner)
    }
}

impl Hash for Keyword {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.inner).hash(state);
    }
}
