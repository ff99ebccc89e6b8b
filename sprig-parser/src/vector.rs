// sprig-parser - Persistent vector with a tiny-size representation
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Persistent vector.
//!
//! Vectors of up to [`TINY_CAPACITY`] elements are stored as one shared flat
//! slice: edge operations copy at most that many element handles and never
//! allocate tree nodes. Larger vectors use [`im::Vector`]. Every operation
//! re-selects the representation from the resulting length, so callers never
//! observe which one is in use.

use std::sync::Arc;

use crate::value::Value;

/// Largest length kept in the tiny representation.
pub const TINY_CAPACITY: usize = 6;

#[derive(Clone)]
pub enum PVector {
    Tiny(Arc<[Value]>),
    General(Arc<im::Vector<Value>>),
}

impl Default for PVector {
    fn default() -> Self {
        PVector::Tiny(Arc::from(Vec::new()))
    }
}

impl PVector {
    pub fn new() -> Self {
        PVector::default()
    }

    /// Build from elements, picking the representation by length.
    pub fn from_vec(items: Vec<Value>) -> Self {
        if items.len() <= TINY_CAPACITY {
            PVector::Tiny(Arc::from(items))
        } else {
            PVector::General(Arc::new(items.into_iter().collect()))
        }
    }

    pub fn from_im(items: im::Vector<Value>) -> Self {
        if items.len() <= TINY_CAPACITY {
            PVector::Tiny(items.into_iter().collect::<Vec<_>>().into())
        } else {
            PVector::General(Arc::new(items))
        }
    }

    /// Force the general representation regardless of length. Subsequent
    /// operations normalize again.
    pub fn general(items: im::Vector<Value>) -> Self {
        PVector::General(Arc::new(items))
    }

    #[must_use]
    pub fn is_tiny(&self) -> bool {
        matches!(self, PVector::Tiny(_))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            PVector::Tiny(items) => items.len(),
            PVector::General(items) => items.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        match self {
            PVector::Tiny(items) => items.get(index),
            PVector::General(items) => items.get(index),
        }
    }

    pub fn first(&self) -> Option<&Value> {
        self.get(0)
    }

    pub fn last(&self) -> Option<&Value> {
        match self {
            PVector::Tiny(items) => items.last(),
            PVector::General(items) => items.last(),
        }
    }

    pub fn iter(&self) -> Iter<'_> {
        match self {
            PVector::Tiny(items) => Iter::Tiny(items.iter()),
            PVector::General(items) => Iter::General(items.iter()),
        }
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.iter().cloned().collect()
    }

    pub fn to_im(&self) -> im::Vector<Value> {
        match self {
            PVector::Tiny(items) => items.iter().cloned().collect(),
            PVector::General(items) => (**items).clone(),
        }
    }

    /// Append at the end.
    #[must_use]
    pub fn push_back(&self, value: Value) -> Self {
        match self {
            PVector::Tiny(items) if items.len() < TINY_CAPACITY => {
                PVector::Tiny(items.iter().cloned().chain(std::iter::once(value)).collect())
            }
            _ => {
                let mut items = self.to_im();
                items.push_back(value);
                PVector::from_im(items)
            }
        }
    }

    /// Prepend at the start.
    #[must_use]
    pub fn push_front(&self, value: Value) -> Self {
        match self {
            PVector::Tiny(items) if items.len() < TINY_CAPACITY => {
                PVector::Tiny(std::iter::once(value).chain(items.iter().cloned()).collect())
            }
            _ => {
                let mut items = self.to_im();
                items.push_front(value);
                PVector::from_im(items)
            }
        }
    }

    /// Everything but the first element; empty stays empty.
    #[must_use]
    pub fn rest(&self) -> Self {
        self.slice(1.min(self.len()), self.len())
    }

    /// Everything but the last element; empty stays empty.
    #[must_use]
    pub fn butlast(&self) -> Self {
        self.slice(0, self.len().saturating_sub(1))
    }

    /// Remove the element at `index`, or `None` when out of range.
    pub fn remove(&self, index: usize) -> Option<Self> {
        if index >= self.len() {
            return None;
        }
        Some(match self {
            PVector::Tiny(items) => PVector::Tiny(
                items
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != index)
                    .map(|(_, v)| v.clone())
                    .collect(),
            ),
            PVector::General(items) => {
                let mut items = (**items).clone();
                items.remove(index);
                PVector::from_im(items)
            }
        })
    }

    /// Replace the element at `index`; `index == len` appends.
    pub fn assoc(&self, index: usize, value: Value) -> Option<Self> {
        let len = self.len();
        if index == len {
            return Some(self.push_back(value));
        }
        if index > len {
            return None;
        }
        Some(match self {
            PVector::Tiny(items) => {
                let mut items = items.to_vec();
                items[index] = value;
                PVector::Tiny(items.into())
            }
            PVector::General(items) => PVector::General(Arc::new(items.update(index, value))),
        })
    }

    /// Elements in `start..end`, clamped to the vector bounds.
    #[must_use]
    pub fn slice(&self, start: usize, end: usize) -> Self {
        let end = end.min(self.len());
        let start = start.min(end);
        match self {
            PVector::Tiny(items) => PVector::Tiny(items[start..end].into()),
            PVector::General(items) => {
                if end - start <= TINY_CAPACITY {
                    PVector::Tiny(items.iter().skip(start).take(end - start).cloned().collect())
                } else {
                    let mut inner = (**items).clone();
                    PVector::General(Arc::new(inner.slice(start..end)))
                }
            }
        }
    }
}

impl PartialEq for PVector {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl Eq for PVector {}

impl std::fmt::Debug for PVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl FromIterator<Value> for PVector {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        PVector::from_vec(iter.into_iter().collect())
    }
}

pub enum Iter<'a> {
    Tiny(std::slice::Iter<'a, Value>),
    General(im::vector::Iter<'a, Value>),
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Iter::Tiny(it) => it.next(),
            Iter::General(it) => it.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Iter::Tiny(it) => it.size_hint(),
            Iter::General(it) => it.size_hint(),
        }
    }
}

impl<'a> IntoIterator for &'a PVector {
    type Item = &'a Value;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn longs(range: std::ops::Range<i64>) -> PVector {
        range.map(Value::Long).collect()
    }

    #[test]
    fn test_promotes_past_capacity() {
        let mut v = PVector::new();
        for i in 0..TINY_CAPACITY as i64 {
            v = v.push_back(Value::Long(i));
            assert!(v.is_tiny());
        }
        v = v.push_back(Value::Long(99));
        assert!(!v.is_tiny());
        assert_eq!(v.len(), TINY_CAPACITY + 1);
        assert_eq!(v.last(), Some(&Value::Long(99)));
    }

    #[test]
    fn test_demotes_when_shrinking() {
        let v = longs(0..(TINY_CAPACITY as i64 + 1));
        assert!(!v.is_tiny());
        let shorter = v.rest();
        assert!(shorter.is_tiny());
        assert_eq!(shorter.first(), Some(&Value::Long(1)));
    }

    #[test]
    fn test_edges_on_empty() {
        let v = PVector::new();
        assert!(v.rest().is_empty());
        assert!(v.butlast().is_empty());
        assert!(v.first().is_none());
        assert!(v.remove(0).is_none());
    }

    #[test]
    fn test_representations_compare_equal() {
        let tiny = longs(0..3);
        let general = PVector::general((0..3).map(Value::Long).collect());
        assert!(tiny.is_tiny());
        assert!(!general.is_tiny());
        assert_eq!(tiny, general);
    }

    #[test]
    fn test_assoc_and_remove() {
        let v = longs(0..10);
        let v = v.assoc(2, Value::Long(20)).unwrap();
        assert_eq!(v.get(2), Some(&Value::Long(20)));
        let v = v.remove(0).unwrap();
        assert_eq!(v.first(), Some(&Value::Long(1)));
        assert!(v.assoc(100, Value::Nil).is_none());
    }

    #[test]
    fn test_slice_clamps() {
        let v = longs(0..20);
        assert_eq!(v.slice(15, 100).len(), 5);
        assert!(v.slice(15, 100).is_tiny());
        assert_eq!(v.slice(30, 40).len(), 0);
    }
}
