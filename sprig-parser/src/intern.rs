// sprig-parser - Shared interner for symbols and keywords
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Process-wide interning of `(namespace, name)` pairs.
//!
//! Symbols and keywords each own one [`Interner`]. Interned entries are never
//! released, so equality and hashing can use the entry's address. The table is
//! a [`DashMap`], which lets reader and evaluator threads intern concurrently
//! without a global lock.

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

/// One interned `(namespace, name)` pair.
#[derive(Debug)]
pub(crate) struct Interned {
    pub(crate) namespace: Option<Arc<str>>,
    pub(crate) name: Arc<str>,
}

impl Interned {
    /// Compare namespace-less names first, then by namespace and name.
    pub(crate) fn cmp_names(&self, other: &Interned) -> std::cmp::Ordering {
        match (&self.namespace, &other.namespace) {
            (None, Some(_)) => std::cmp::Ordering::Less,
            (Some(_), None) => std::cmp::Ordering::Greater,
            (None, None) => self.name.cmp(&other.name),
            (Some(a), Some(b)) => a.cmp(b).then_with(|| self.name.cmp(&other.name)),
        }
    }
}

pub(crate) struct Interner {
    table: OnceLock<DashMap<Box<str>, Arc<Interned>>>,
}

impl Interner {
    pub(crate) const fn new() -> Self {
        Interner {
            table: OnceLock::new(),
        }
    }

    pub(crate) fn intern(&self, namespace: Option<&str>, name: &str) -> Arc<Interned> {
        let table = self.table.get_or_init(DashMap::new);
        // NUL cannot appear in source identifiers, so it separates the parts.
        let key: Box<str> = match namespace {
            Some(ns) => format!("{ns}\u{0}{name}").into_boxed_str(),
            None => {
                if let Some(hit) = table.get(name) {
                    return Arc::clone(hit.value());
                }
                name.into()
            }
        };
        let entry = table.entry(key).or_insert_with(|| {
            Arc::new(Interned {
                namespace: namespace.map(Arc::from),
                name: Arc::from(name),
            })
        });
        Arc::clone(entry.value())
    }

    pub(crate) fn len(&self) -> usize {
        self.table.get().map_or(0, DashMap::len)
    }
}

/// Split `ns/name` into its parts. A lone `/` and names without a slash
/// have no namespace.
pub(crate) fn split_qualified(s: &str) -> (Option<&str>, &str) {
    if s == "/" {
        return (None, s);
    }
    match s.find('/') {
        Some(pos) if pos > 0 && pos + 1 < s.len() => (Some(&s[..pos]), &s[pos + 1..]),
        _ => (None, s),
    }
}
