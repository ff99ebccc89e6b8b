// sprig-parser - Persistent maps and sets
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Persistent map and set flavours.
//!
//! Maps come in three flavours: hash (unordered), ordered (insertion order)
//! and sorted (by the total value ordering). Sets are hash or sorted. All
//! flavours with the same contents are equal; the flavour only affects
//! iteration order and the cost of operations.

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapKind {
    Hash,
    Ordered,
    Sorted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetKind {
    Hash,
    Sorted,
}

/// Insertion-ordered persistent map: a key index plus entries keyed by
/// insertion sequence number.
#[derive(Debug, Clone, Default)]
pub struct OrderedMap {
    index: im::HashMap<Value, u64>,
    entries: im::OrdMap<u64, (Value, Value)>,
    next: u64,
}

impl OrderedMap {
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        let seq = self.index.get(key)?;
        self.entries.get(seq).map(|(_, v)| v)
    }

    /// Updating an existing key keeps its original position.
    #[must_use]
    pub fn insert(&self, key: Value, value: Value) -> Self {
        let mut next = self.clone();
        match self.index.get(&key) {
            Some(seq) => {
                next.entries.insert(*seq, (key, value));
            }
            None => {
                next.index.insert(key.clone(), next.next);
                next.entries.insert(next.next, (key, value));
                next.next += 1;
            }
        }
        next
    }

    #[must_use]
    pub fn remove(&self, key: &Value) -> Self {
        let mut next = self.clone();
        if let Some(seq) = next.index.remove(key) {
            next.entries.remove(&seq);
        }
        next
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.values().map(|(k, v)| (k, v))
    }
}

#[derive(Debug, Clone)]
pub enum PMap {
    Hash(im::HashMap<Value, Value>),
    Ordered(OrderedMap),
    Sorted(im::OrdMap<Value, Value>),
}

impl Default for PMap {
    fn default() -> Self {
        PMap::Hash(im::HashMap::new())
    }
}

impl PMap {
    pub fn empty(kind: MapKind) -> Self {
        match kind {
            MapKind::Hash => PMap::Hash(im::HashMap::new()),
            MapKind::Ordered => PMap::Ordered(OrderedMap::default()),
            MapKind::Sorted => PMap::Sorted(im::OrdMap::new()),
        }
    }

    pub fn from_pairs(kind: MapKind, pairs: impl IntoIterator<Item = (Value, Value)>) -> Self {
        pairs
            .into_iter()
            .fold(PMap::empty(kind), |map, (k, v)| map.assoc(k, v))
    }

    pub fn kind(&self) -> MapKind {
        match self {
            PMap::Hash(_) => MapKind::Hash,
            PMap::Ordered(_) => MapKind::Ordered,
            PMap::Sorted(_) => MapKind::Sorted,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PMap::Hash(m) => m.len(),
            PMap::Ordered(m) => m.len(),
            PMap::Sorted(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        match self {
            PMap::Hash(m) => m.get(key),
            PMap::Ordered(m) => m.get(key),
            PMap::Sorted(m) => m.get(key),
        }
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    #[must_use]
    pub fn assoc(&self, key: Value, value: Value) -> Self {
        match self {
            PMap::Hash(m) => PMap::Hash(m.update(key, value)),
            PMap::Ordered(m) => PMap::Ordered(m.insert(key, value)),
            PMap::Sorted(m) => PMap::Sorted(m.update(key, value)),
        }
    }

    #[must_use]
    pub fn dissoc(&self, key: &Value) -> Self {
        match self {
            PMap::Hash(m) => PMap::Hash(m.without(key)),
            PMap::Ordered(m) => PMap::Ordered(m.remove(key)),
            PMap::Sorted(m) => PMap::Sorted(m.without(key)),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = (&Value, &Value)> + '_> {
        match self {
            PMap::Hash(m) => Box::new(m.iter()),
            PMap::Ordered(m) => Box::new(m.iter()),
            PMap::Sorted(m) => Box::new(m.iter()),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.iter().map(|(_, v)| v)
    }

    /// Entries in total value order, whatever the flavour.
    pub fn sorted_entries(&self) -> Vec<(&Value, &Value)> {
        let mut entries: Vec<_> = self.iter().collect();
        if self.kind() != MapKind::Sorted {
            entries.sort_by(|a, b| a.0.cmp(b.0));
        }
        entries
    }
}

#[derive(Debug, Clone)]
pub enum PSet {
    Hash(im::HashSet<Value>),
    Sorted(im::OrdSet<Value>),
}

impl Default for PSet {
    fn default() -> Self {
        PSet::Hash(im::HashSet::new())
    }
}

impl PSet {
    pub fn empty(kind: SetKind) -> Self {
        match kind {
            SetKind::Hash => PSet::Hash(im::HashSet::new()),
            SetKind::Sorted => PSet::Sorted(im::OrdSet::new()),
        }
    }

    pub fn from_values(kind: SetKind, values: impl IntoIterator<Item = Value>) -> Self {
        match kind {
            SetKind::Hash => PSet::Hash(values.into_iter().collect()),
            SetKind::Sorted => PSet::Sorted(values.into_iter().collect()),
        }
    }

    pub fn kind(&self) -> SetKind {
        match self {
            PSet::Hash(_) => SetKind::Hash,
            PSet::Sorted(_) => SetKind::Sorted,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PSet::Hash(s) => s.len(),
            PSet::Sorted(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, value: &Value) -> bool {
        match self {
            PSet::Hash(s) => s.contains(value),
            PSet::Sorted(s) => s.contains(value),
        }
    }

    #[must_use]
    pub fn insert(&self, value: Value) -> Self {
        match self {
            PSet::Hash(s) => PSet::Hash(s.update(value)),
            PSet::Sorted(s) => PSet::Sorted(s.update(value)),
        }
    }

    #[must_use]
    pub fn remove(&self, value: &Value) -> Self {
        match self {
            PSet::Hash(s) => PSet::Hash(s.without(value)),
            PSet::Sorted(s) => PSet::Sorted(s.without(value)),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        match self {
            PSet::Hash(s) => Box::new(s.iter()),
            PSet::Sorted(s) => Box::new(s.iter()),
        }
    }

    /// Members in total value order, whatever the flavour.
    pub fn sorted_values(&self) -> Vec<&Value> {
        let mut values: Vec<_> = self.iter().collect();
        if self.kind() != SetKind::Sorted {
            values.sort();
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(name: &str) -> Value {
        Value::keyword(name)
    }

    #[test]
    fn test_ordered_map_keeps_insertion_order() {
        let map = PMap::from_pairs(
            MapKind::Ordered,
            [(kw("z"), Value::Long(1)), (kw("a"), Value::Long(2)), (kw("m"), Value::Long(3))],
        );
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec![kw("z"), kw("a"), kw("m")]);

        let updated = map.assoc(kw("z"), Value::Long(10));
        let keys: Vec<_> = updated.keys().cloned().collect();
        assert_eq!(keys, vec![kw("z"), kw("a"), kw("m")]);
        assert_eq!(updated.get(&kw("z")), Some(&Value::Long(10)));

        let removed = updated.dissoc(&kw("a"));
        assert_eq!(removed.len(), 2);
        assert!(!removed.contains_key(&kw("a")));
    }

    #[test]
    fn test_sorted_map_orders_keys() {
        let map = PMap::from_pairs(
            MapKind::Sorted,
            [(Value::Long(3), Value::Nil), (Value::Long(1), Value::Nil), (Value::Long(2), Value::Nil)],
        );
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec![Value::Long(1), Value::Long(2), Value::Long(3)]);
    }

    #[test]
    fn test_flavours_compare_equal() {
        let pairs = [(kw("a"), Value::Long(1)), (kw("b"), Value::Long(2))];
        let hash = Value::map(pairs.clone());
        let sorted = Value::sorted_map(pairs.clone());
        let ordered = Value::ordered_map(pairs);
        assert_eq!(hash, sorted);
        assert_eq!(sorted, ordered);
    }

    #[test]
    fn test_set_membership() {
        let set = PSet::from_values(SetKind::Sorted, [Value::Long(2), Value::Long(1)]);
        assert!(set.contains(&Value::Long(1)));
        let set = set.insert(Value::Long(3)).remove(&Value::Long(1));
        let members: Vec<_> = set.iter().cloned().collect();
        assert_eq!(members, vec![Value::Long(2), Value::Long(3)]);
    }
}
