// sprig-parser - Source positions and metadata
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Metadata attached to values.
//!
//! Metadata has two parts: the source position the reader recorded, and a
//! user map set through `^{...}` or `with-meta`. Neither takes part in
//! equality, ordering or hashing.

use std::fmt;
use std::sync::Arc;

use im::OrdMap;

use crate::keyword::Keyword;
use crate::value::Value;

/// A location in source text. Lines and columns are 1-based; `offset` is
/// the byte offset of the first character.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourcePos {
    pub file: Arc<str>,
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

impl SourcePos {
    pub fn new(file: Arc<str>, line: u32, column: u32, offset: usize) -> Self {
        SourcePos {
            file,
            line,
            column,
            offset,
        }
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Metadata carried by symbols, collections, functions and custom values.
#[derive(Debug, Clone, Default)]
pub struct Meta {
    pos: Option<SourcePos>,
    entries: OrdMap<Value, Value>,
}

impl Meta {
    /// Metadata holding only a source position.
    pub fn at(pos: SourcePos) -> Self {
        Meta {
            pos: Some(pos),
            entries: OrdMap::new(),
        }
    }

    pub fn pos(&self) -> Option<&SourcePos> {
        self.pos.as_ref()
    }

    pub fn entries(&self) -> &OrdMap<Value, Value> {
        &self.entries
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_kw(&self, name: &str) -> Option<&Value> {
        self.entries.get(&Value::keyword(name))
    }

    /// True when the user map holds `name` with a truthy value.
    pub fn flag(&self, name: &str) -> bool {
        self.get_kw(name).is_some_and(Value::is_truthy)
    }

    pub fn is_empty(&self) -> bool {
        self.pos.is_none() && self.entries.is_empty()
    }

    /// Add `key value` to the user map.
    #[must_use]
    pub fn with(mut self, key: Value, value: Value) -> Self {
        self.entries.insert(key, value);
        self
    }

    /// Replace the user map, keeping the source position.
    #[must_use]
    pub fn with_entries(&self, entries: OrdMap<Value, Value>) -> Self {
        Meta {
            pos: self.pos.clone(),
            entries,
        }
    }

    /// Merge reader metadata (`^:kw`, `^Tag`, `^{...}`) into this one.
    /// Returns `None` when `value` cannot be read as metadata.
    pub fn merge_reader_meta(mut self, value: &Value) -> Option<Self> {
        match value {
            Value::Keyword(kw) => {
                self.entries
                    .insert(Value::Keyword(kw.clone()), Value::Boolean(true));
            }
            Value::Symbol(..) | Value::String(_) => {
                self.entries
                    .insert(Value::Keyword(Keyword::new("tag")), value.without_meta());
            }
            Value::Map(map, _) => {
                for (k, v) in map.iter() {
                    self.entries.insert(k.clone(), v.clone());
                }
            }
            _ => return None,
        }
        Some(self)
    }

    /// The user-visible map: the user entries plus `:file`, `:line` and
    /// `:column` when a source position is known.
    pub fn to_value(&self) -> Value {
        let mut pairs: Vec<(Value, Value)> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if let Some(pos) = &self.pos {
            pairs.push((Value::keyword("file"), Value::string(&pos.file)));
            pairs.push((Value::keyword("line"), Value::Long(i64::from(pos.line))));
            pairs.push((Value::keyword("column"), Value::Long(i64::from(pos.column))));
        }
        Value::map(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos() -> SourcePos {
        SourcePos::new(Arc::from("t.sprig"), 3, 7, 42)
    }

    #[test]
    fn test_position_display() {
        assert_eq!(pos().to_string(), "t.sprig:3:7");
    }

    #[test]
    fn test_reader_shorthands() {
        let meta = Meta::default()
            .merge_reader_meta(&Value::keyword("private"))
            .unwrap();
        assert!(meta.flag("private"));

        let meta = Meta::default()
            .merge_reader_meta(&Value::symbol("Long"))
            .unwrap();
        assert_eq!(meta.get_kw("tag"), Some(&Value::symbol("Long")));

        assert!(Meta::default().merge_reader_meta(&Value::Long(1)).is_none());
    }

    #[test]
    fn test_to_value_includes_position() {
        let value = Meta::at(pos()).with(Value::keyword("doc"), Value::string("d")).to_value();
        let Value::Map(map, _) = value else {
            panic!("expected map");
        };
        assert_eq!(map.get(&Value::keyword("line")), Some(&Value::Long(3)));
        assert_eq!(map.get(&Value::keyword("doc")), Some(&Value::string("d")));
    }
}
