// sprig-parser - Value types for Sprig
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The universal runtime datum.
//!
//! [`Value`] is an immutable tagged union. Every variant except the
//! reference cells is persistent: "updating" operations return a new value
//! sharing structure with the old one. Cloning a value is cheap; large
//! payloads sit behind `Arc`.
//!
//! Ordering, equality and hashing live in [`crate::compare`]; canonical
//! printing lives in [`crate::printer`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bigdecimal::BigDecimal;

use crate::cells::{Atom, ThreadLocal, Volatile};
use crate::collections::{MapKind, PMap, PSet, SetKind};
use crate::custom::{CustomValue, HostObject};
use crate::function::Function;
use crate::keyword::Keyword;
use crate::meta::{Meta, SourcePos};
use crate::symbol::Symbol;
use crate::vector::PVector;

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(1);

/// Process-wide creation counter for identity-compared values.
pub(crate) fn next_identity() -> u64 {
    NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed)
}

/// Optional metadata slot.
pub type MetaRef = Option<Arc<Meta>>;

#[derive(Clone)]
pub enum Value {
    Nil,
    Boolean(bool),
    Long(i64),
    Double(f64),
    Decimal(Arc<BigDecimal>),
    String(Arc<str>),
    Char(char),
    Keyword(Keyword),
    Symbol(Symbol, MetaRef),
    ByteBuffer(Arc<[u8]>),
    List(Arc<im::Vector<Value>>, MetaRef),
    Vector(PVector, MetaRef),
    Map(Arc<PMap>, MetaRef),
    Set(Arc<PSet>, MetaRef),
    Function(Function),
    Atom(Atom),
    Volatile(Volatile),
    ThreadLocal(ThreadLocal),
    Custom(Arc<CustomValue>),
    Host(HostObject),
}

impl Value {
    // ------------------------------------------------------------------
    // Constructors
    // ------------------------------------------------------------------

    pub fn nil() -> Self {
        Value::Nil
    }

    pub fn boolean(b: bool) -> Self {
        Value::Boolean(b)
    }

    pub fn long(n: i64) -> Self {
        Value::Long(n)
    }

    pub fn double(d: f64) -> Self {
        Value::Double(d)
    }

    pub fn decimal(d: BigDecimal) -> Self {
        Value::Decimal(Arc::new(d))
    }

    pub fn string(s: &str) -> Self {
        Value::String(Arc::from(s))
    }

    pub fn keyword(name: &str) -> Self {
        Value::Keyword(Keyword::parse(name))
    }

    pub fn symbol(name: &str) -> Self {
        Value::Symbol(Symbol::parse(name), None)
    }

    pub fn bytes(bytes: &[u8]) -> Self {
        Value::ByteBuffer(Arc::from(bytes))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Arc::new(items.into_iter().collect()), None)
    }

    pub fn list_from(items: im::Vector<Value>) -> Self {
        Value::List(Arc::new(items), None)
    }

    pub fn empty_list() -> Self {
        Value::List(Arc::new(im::Vector::new()), None)
    }

    pub fn vector(items: Vec<Value>) -> Self {
        Value::Vector(PVector::from_vec(items), None)
    }

    pub fn vector_from(items: PVector) -> Self {
        Value::Vector(items, None)
    }

    pub fn map(pairs: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Value::map_from(PMap::from_pairs(MapKind::Hash, pairs))
    }

    pub fn ordered_map(pairs: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Value::map_from(PMap::from_pairs(MapKind::Ordered, pairs))
    }

    pub fn sorted_map(pairs: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Value::map_from(PMap::from_pairs(MapKind::Sorted, pairs))
    }

    pub fn map_from(map: PMap) -> Self {
        Value::Map(Arc::new(map), None)
    }

    pub fn set(values: impl IntoIterator<Item = Value>) -> Self {
        Value::set_from(PSet::from_values(SetKind::Hash, values))
    }

    pub fn sorted_set(values: impl IntoIterator<Item = Value>) -> Self {
        Value::set_from(PSet::from_values(SetKind::Sorted, values))
    }

    pub fn set_from(set: PSet) -> Self {
        Value::Set(Arc::new(set), None)
    }

    pub fn custom(value: CustomValue) -> Self {
        Value::Custom(Arc::new(value))
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// Only `nil` and `false` are falsy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Boolean(false))
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    #[must_use]
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Long(_) | Value::Double(_) | Value::Decimal(_))
    }

    /// Lists and vectors.
    #[must_use]
    pub fn is_sequential(&self) -> bool {
        matches!(self, Value::List(..) | Value::Vector(..))
    }

    #[must_use]
    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            Value::List(..) | Value::Vector(..) | Value::Map(..) | Value::Set(..)
        )
    }

    /// True for functions that are not macros.
    #[must_use]
    pub fn is_fn(&self) -> bool {
        matches!(self, Value::Function(f) if !f.is_macro())
    }

    /// Type name used in messages and by `type`.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Long(_) => "long",
            Value::Double(_) => "double",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::Char(_) => "char",
            Value::Keyword(_) => "keyword",
            Value::Symbol(..) => "symbol",
            Value::ByteBuffer(_) => "bytebuf",
            Value::List(..) => "list",
            Value::Vector(..) => "vector",
            Value::Map(m, _) => match m.kind() {
                MapKind::Hash => "hash-map",
                MapKind::Ordered => "ordered-map",
                MapKind::Sorted => "sorted-map",
            },
            Value::Set(s, _) => match s.kind() {
                SetKind::Hash => "hash-set",
                SetKind::Sorted => "sorted-set",
            },
            Value::Function(f) if f.is_macro() => "macro",
            Value::Function(_) => "function",
            Value::Atom(_) => "atom",
            Value::Volatile(_) => "volatile",
            Value::ThreadLocal(_) => "thread-local",
            Value::Custom(_) => "custom",
            Value::Host(_) => "host",
        }
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Value::Symbol(s, _) => Some(s),
            _ => None,
        }
    }

    pub fn as_keyword(&self) -> Option<&Keyword> {
        match self {
            Value::Keyword(k) => Some(k),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&PMap> {
        match self {
            Value::Map(m, _) => Some(m),
            _ => None,
        }
    }

    /// True when this is the symbol `name` with no namespace.
    #[must_use]
    pub fn is_symbol_named(&self, name: &str) -> bool {
        matches!(self, Value::Symbol(s, _) if !s.has_namespace() && s.name() == name)
    }

    /// The items of a list or vector, in order.
    pub fn as_seq_slice(&self) -> Option<Vec<Value>> {
        match self {
            Value::List(items, _) => Some(items.iter().cloned().collect()),
            Value::Vector(items, _) => Some(items.to_vec()),
            _ => None,
        }
    }

    /// The elements this value yields when treated as a sequence: nil is
    /// empty, strings yield chars, maps yield `[k v]` entry vectors.
    pub fn seq_items(&self) -> Option<Vec<Value>> {
        match self {
            Value::Nil => Some(Vec::new()),
            Value::List(items, _) => Some(items.iter().cloned().collect()),
            Value::Vector(items, _) => Some(items.to_vec()),
            Value::Set(set, _) => Some(set.iter().cloned().collect()),
            Value::Map(map, _) => Some(
                map.iter()
                    .map(|(k, v)| Value::vector(vec![k.clone(), v.clone()]))
                    .collect(),
            ),
            Value::String(s) => Some(s.chars().map(Value::Char).collect()),
            Value::ByteBuffer(b) => Some(b.iter().map(|n| Value::Long(i64::from(*n))).collect()),
            _ => None,
        }
    }

    /// Element count for countable values.
    pub fn count(&self) -> Option<usize> {
        match self {
            Value::Nil => Some(0),
            Value::List(items, _) => Some(items.len()),
            Value::Vector(items, _) => Some(items.len()),
            Value::Map(map, _) => Some(map.len()),
            Value::Set(set, _) => Some(set.len()),
            Value::String(s) => Some(s.chars().count()),
            Value::ByteBuffer(b) => Some(b.len()),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------

    pub fn meta(&self) -> Option<&Arc<Meta>> {
        match self {
            Value::Symbol(_, m)
            | Value::List(_, m)
            | Value::Vector(_, m)
            | Value::Map(_, m)
            | Value::Set(_, m) => m.as_ref(),
            Value::Function(f) => f.meta(),
            Value::Custom(c) => c.meta.as_ref(),
            _ => None,
        }
    }

    /// Source position recorded by the reader, if any.
    pub fn source_pos(&self) -> Option<&SourcePos> {
        self.meta().and_then(|m| m.pos())
    }

    /// Whether this variant has a metadata slot.
    #[must_use]
    pub fn supports_meta(&self) -> bool {
        matches!(
            self,
            Value::Symbol(..)
                | Value::List(..)
                | Value::Vector(..)
                | Value::Map(..)
                | Value::Set(..)
                | Value::Function(_)
                | Value::Custom(_)
        )
    }

    /// The same value with `meta` attached. Variants without a metadata
    /// slot are returned unchanged.
    #[must_use]
    pub fn with_meta(&self, meta: Option<Arc<Meta>>) -> Value {
        match self {
            Value::Symbol(s, _) => Value::Symbol(s.clone(), meta),
            Value::List(items, _) => Value::List(Arc::clone(items), meta),
            Value::Vector(items, _) => Value::Vector(items.clone(), meta),
            Value::Map(map, _) => Value::Map(Arc::clone(map), meta),
            Value::Set(set, _) => Value::Set(Arc::clone(set), meta),
            Value::Function(f) => Value::Function(f.with_meta(meta)),
            Value::Custom(c) => {
                let mut c = (**c).clone();
                c.meta = meta;
                Value::Custom(Arc::new(c))
            }
            other => other.clone(),
        }
    }

    #[must_use]
    pub fn without_meta(&self) -> Value {
        if self.meta().is_some() {
            self.with_meta(None)
        } else {
            self.clone()
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Nil
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Long(n)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<Keyword> for Value {
    fn from(k: Keyword) -> Self {
        Value::Keyword(k)
    }
}

impl From<Symbol> for Value {
    fn from(s: Symbol) -> Self {
        Value::Symbol(s, None)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}
