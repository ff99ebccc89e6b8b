// sprig-core - Collection built-in functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Collection constructors and operations: list, vector, hash-map, get,
//! assoc, conj, first, rest, nth and friends.

use std::sync::Arc;

use sprig_parser::{MapKind, PMap, PSet, PVector, Value};

use crate::error::{Error, Result};

// ============================================================================
// Helpers
// ============================================================================

/// Key lookup shared by `get`, keywords and collections as functions.
pub(crate) fn lookup(coll: &Value, key: &Value) -> Option<Value> {
    match coll {
        Value::Map(map, _) => map.get(key).cloned(),
        Value::Set(set, _) => set.contains(key).then(|| key.clone()),
        Value::Vector(items, _) => match key {
            Value::Long(i) => usize::try_from(*i).ok().and_then(|i| items.get(i)).cloned(),
            _ => None,
        },
        Value::Custom(custom) => match key {
            Value::Keyword(kw) => custom.get(kw).cloned(),
            _ => None,
        },
        Value::String(s) => match key {
            Value::Long(i) => usize::try_from(*i)
                .ok()
                .and_then(|i| s.chars().nth(i))
                .map(Value::Char),
            _ => None,
        },
        _ => None,
    }
}

/// The items of a seqable argument.
pub(crate) fn items_of(op: &str, value: &Value) -> Result<Vec<Value>> {
    value
        .seq_items()
        .ok_or_else(|| Error::type_mismatch_in(op, "sequence", value.type_name()))
}

pub(crate) fn exact<'a>(op: &str, args: &'a [Value], n: usize) -> Result<&'a [Value]> {
    if args.len() == n {
        Ok(args)
    } else {
        Err(Error::arity_named(op, n, args.len()))
    }
}

fn index_arg(op: &str, value: &Value) -> Result<i64> {
    match value {
        Value::Long(n) => Ok(*n),
        other => Err(Error::type_mismatch_in(op, "long", other.type_name())),
    }
}

fn pairs(op: &str, args: &[Value]) -> Result<Vec<(Value, Value)>> {
    if args.len() % 2 != 0 {
        return Err(Error::eval(format!("{op} requires an even number of arguments")));
    }
    Ok(args
        .chunks(2)
        .map(|kv| (kv[0].clone(), kv[1].clone()))
        .collect())
}

// ============================================================================
// Constructors
// ============================================================================

/// (list & items)
pub(crate) fn builtin_list(args: &[Value]) -> Result<Value> {
    Ok(Value::list(args.to_vec()))
}

/// (vector & items)
pub(crate) fn builtin_vector(args: &[Value]) -> Result<Value> {
    Ok(Value::vector(args.to_vec()))
}

/// (hash-map & kvs)
pub(crate) fn builtin_hash_map(args: &[Value]) -> Result<Value> {
    Ok(Value::map(pairs("hash-map", args)?))
}

/// (ordered-map & kvs) - iterates in insertion order
pub(crate) fn builtin_ordered_map(args: &[Value]) -> Result<Value> {
    Ok(Value::ordered_map(pairs("ordered-map", args)?))
}

/// (sorted-map & kvs)
pub(crate) fn builtin_sorted_map(args: &[Value]) -> Result<Value> {
    Ok(Value::sorted_map(pairs("sorted-map", args)?))
}

/// (hash-set & items)
pub(crate) fn builtin_hash_set(args: &[Value]) -> Result<Value> {
    Ok(Value::set(args.iter().cloned()))
}

/// (sorted-set & items)
pub(crate) fn builtin_sorted_set(args: &[Value]) -> Result<Value> {
    Ok(Value::sorted_set(args.iter().cloned()))
}

/// (vec coll)
pub(crate) fn builtin_vec(args: &[Value]) -> Result<Value> {
    let args = exact("vec", args, 1)?;
    Ok(Value::vector(items_of("vec", &args[0])?))
}

/// (set coll)
pub(crate) fn builtin_set(args: &[Value]) -> Result<Value> {
    let args = exact("set", args, 1)?;
    Ok(Value::set(items_of("set", &args[0])?))
}

/// (range end), (range start end), (range start end step)
pub(crate) fn builtin_range(args: &[Value]) -> Result<Value> {
    let (start, end, step) = match args {
        [end] => (0, index_arg("range", end)?, 1),
        [start, end] => (index_arg("range", start)?, index_arg("range", end)?, 1),
        [start, end, step] => (
            index_arg("range", start)?,
            index_arg("range", end)?,
            index_arg("range", step)?,
        ),
        _ => return Err(Error::arity_range("range", 1, 3, args.len())),
    };
    if step == 0 {
        return Err(Error::eval("range step must not be zero"));
    }
    let mut items = Vec::new();
    let mut n = start;
    while (step > 0 && n < end) || (step < 0 && n > end) {
        items.push(Value::Long(n));
        n = match n.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(Value::list(items))
}

// ============================================================================
// Access
// ============================================================================

/// (get coll key default?)
pub(crate) fn builtin_get(args: &[Value]) -> Result<Value> {
    if args.len() < 2 || args.len() > 3 {
        return Err(Error::arity_range("get", 2, 3, args.len()));
    }
    Ok(lookup(&args[0], &args[1]).unwrap_or_else(|| args.get(2).cloned().unwrap_or(Value::Nil)))
}

/// (get-in coll [keys] default?)
pub(crate) fn builtin_get_in(args: &[Value]) -> Result<Value> {
    if args.len() < 2 || args.len() > 3 {
        return Err(Error::arity_range("get-in", 2, 3, args.len()));
    }
    let mut current = args[0].clone();
    for key in items_of("get-in", &args[1])? {
        match lookup(&current, &key) {
            Some(next) => current = next,
            None => return Ok(args.get(2).cloned().unwrap_or(Value::Nil)),
        }
    }
    Ok(current)
}

/// (contains? coll key)
pub(crate) fn builtin_contains_p(args: &[Value]) -> Result<Value> {
    let args = exact("contains?", args, 2)?;
    let found = match &args[0] {
        Value::Map(map, _) => map.contains_key(&args[1]),
        Value::Set(set, _) => set.contains(&args[1]),
        Value::Nil => false,
        other => lookup(other, &args[1]).is_some(),
    };
    Ok(Value::Boolean(found))
}

/// (count coll)
pub(crate) fn builtin_count(args: &[Value]) -> Result<Value> {
    let args = exact("count", args, 1)?;
    let n = match &args[0] {
        Value::Custom(c) => match &c.body {
            sprig_parser::CustomBody::Record(fields) => fields.len(),
            sprig_parser::CustomBody::Wrapped(_) => 1,
        },
        other => other
            .count()
            .ok_or_else(|| Error::type_mismatch_in("count", "collection", other.type_name()))?,
    };
    Ok(Value::Long(n as i64))
}

/// (empty? coll)
pub(crate) fn builtin_empty_p(args: &[Value]) -> Result<Value> {
    let args = exact("empty?", args, 1)?;
    let n = args[0]
        .count()
        .ok_or_else(|| Error::type_mismatch_in("empty?", "collection", args[0].type_name()))?;
    Ok(Value::Boolean(n == 0))
}

/// (nth coll index default?)
pub(crate) fn builtin_nth(args: &[Value]) -> Result<Value> {
    if args.len() < 2 || args.len() > 3 {
        return Err(Error::arity_range("nth", 2, 3, args.len()));
    }
    let index = index_arg("nth", &args[1])?;
    let items = items_of("nth", &args[0])?;
    match usize::try_from(index).ok().and_then(|i| items.get(i)) {
        Some(value) => Ok(value.clone()),
        None => match args.get(2) {
            Some(default) => Ok(default.clone()),
            None => Err(Error::eval(format!(
                "Index {index} out of bounds for length {}",
                items.len()
            ))),
        },
    }
}

/// (first coll)
pub(crate) fn builtin_first(args: &[Value]) -> Result<Value> {
    let args = exact("first", args, 1)?;
    Ok(items_of("first", &args[0])?
        .into_iter()
        .next()
        .unwrap_or(Value::Nil))
}

/// (second coll)
pub(crate) fn builtin_second(args: &[Value]) -> Result<Value> {
    let args = exact("second", args, 1)?;
    Ok(items_of("second", &args[0])?
        .into_iter()
        .nth(1)
        .unwrap_or(Value::Nil))
}

/// (last coll)
pub(crate) fn builtin_last(args: &[Value]) -> Result<Value> {
    let args = exact("last", args, 1)?;
    Ok(items_of("last", &args[0])?.pop().unwrap_or(Value::Nil))
}

/// (rest coll) - always a list, possibly empty
pub(crate) fn builtin_rest(args: &[Value]) -> Result<Value> {
    let args = exact("rest", args, 1)?;
    if let Value::List(items, _) = &args[0] {
        return Ok(Value::list_from(items.skip(1.min(items.len()))));
    }
    let items = items_of("rest", &args[0])?;
    Ok(Value::list(items.into_iter().skip(1).collect()))
}

/// (next coll) - like rest but nil when empty
pub(crate) fn builtin_next(args: &[Value]) -> Result<Value> {
    let rest = builtin_rest(args)?;
    Ok(if rest.count() == Some(0) { Value::Nil } else { rest })
}

/// (butlast coll)
pub(crate) fn builtin_butlast(args: &[Value]) -> Result<Value> {
    let args = exact("butlast", args, 1)?;
    let mut items = items_of("butlast", &args[0])?;
    items.pop();
    Ok(if items.is_empty() { Value::Nil } else { Value::list(items) })
}

/// (seq coll) - nil for an empty collection
pub(crate) fn builtin_seq(args: &[Value]) -> Result<Value> {
    let args = exact("seq", args, 1)?;
    let items = items_of("seq", &args[0])?;
    Ok(if items.is_empty() { Value::Nil } else { Value::list(items) })
}

/// (keys map)
pub(crate) fn builtin_keys(args: &[Value]) -> Result<Value> {
    let args = exact("keys", args, 1)?;
    match &args[0] {
        Value::Map(map, _) => Ok(Value::list(map.keys().cloned().collect())),
        Value::Nil => Ok(Value::Nil),
        other => Err(Error::type_mismatch_in("keys", "map", other.type_name())),
    }
}

/// (vals map)
pub(crate) fn builtin_vals(args: &[Value]) -> Result<Value> {
    let args = exact("vals", args, 1)?;
    match &args[0] {
        Value::Map(map, _) => Ok(Value::list(map.values().cloned().collect())),
        Value::Nil => Ok(Value::Nil),
        other => Err(Error::type_mismatch_in("vals", "map", other.type_name())),
    }
}

// ============================================================================
// Update
// ============================================================================

/// (assoc coll k v & kvs)
pub(crate) fn builtin_assoc(args: &[Value]) -> Result<Value> {
    if args.len() < 3 {
        return Err(Error::arity_at_least("assoc", 3, args.len()));
    }
    let mut coll = args[0].clone();
    for (k, v) in pairs("assoc", &args[1..])? {
        coll = assoc1(coll, k, v)?;
    }
    Ok(coll)
}

pub(crate) fn assoc1(coll: Value, key: Value, value: Value) -> Result<Value> {
    match coll {
        Value::Nil => Ok(Value::map([(key, value)])),
        Value::Map(map, meta) => Ok(Value::Map(Arc::new(map.assoc(key, value)), meta)),
        Value::Vector(items, meta) => {
            let index = index_arg("assoc", &key)?;
            let updated = match usize::try_from(index) {
                Ok(i) if i == items.len() => Some(items.push_back(value)),
                Ok(i) => items.assoc(i, value),
                Err(_) => None,
            };
            updated
                .map(|items| Value::Vector(items, meta))
                .ok_or_else(|| {
                    Error::eval(format!("Index {index} out of bounds for length {}", items.len()))
                })
        }
        Value::Custom(custom) => {
            let Value::Keyword(field) = &key else {
                return Err(Error::type_mismatch_in("assoc", "keyword", key.type_name()));
            };
            custom
                .assoc(field, value)
                .map(Value::custom)
                .ok_or_else(|| Error::eval(format!("{} has no field {field}", custom.type_name)))
        }
        other => Err(Error::type_mismatch_in("assoc", "associative collection", other.type_name())),
    }
}

/// (dissoc map & keys)
pub(crate) fn builtin_dissoc(args: &[Value]) -> Result<Value> {
    let Some((coll, keys)) = args.split_first() else {
        return Err(Error::arity_at_least("dissoc", 1, 0));
    };
    match coll {
        Value::Nil => Ok(Value::Nil),
        Value::Map(map, meta) => {
            let mut map = (**map).clone();
            for key in keys {
                map = map.dissoc(key);
            }
            Ok(Value::Map(Arc::new(map), meta.clone()))
        }
        other => Err(Error::type_mismatch_in("dissoc", "map", other.type_name())),
    }
}

pub(crate) fn conj1(coll: Value, item: Value) -> Result<Value> {
    match coll {
        Value::Nil => Ok(Value::list(vec![item])),
        Value::List(items, meta) => {
            let mut items = (*items).clone();
            items.push_front(item);
            Ok(Value::List(Arc::new(items), meta))
        }
        Value::Vector(items, meta) => Ok(Value::Vector(items.push_back(item), meta)),
        Value::Set(set, meta) => Ok(Value::Set(Arc::new(set.insert(item)), meta)),
        Value::Map(map, meta) => match &item {
            Value::Vector(kv, _) if kv.len() == 2 => {
                let key = kv.get(0).cloned().unwrap_or(Value::Nil);
                let value = kv.get(1).cloned().unwrap_or(Value::Nil);
                Ok(Value::Map(Arc::new(map.assoc(key, value)), meta))
            }
            Value::Map(other, _) => {
                let mut merged = (*map).clone();
                for (k, v) in other.iter() {
                    merged = merged.assoc(k.clone(), v.clone());
                }
                Ok(Value::Map(Arc::new(merged), meta))
            }
            _ => Err(Error::type_mismatch_in("conj", "map entry", item.type_name())),
        },
        other => Err(Error::type_mismatch_in("conj", "collection", other.type_name())),
    }
}

/// (conj coll & items) - add where the collection adds cheaply
pub(crate) fn builtin_conj(args: &[Value]) -> Result<Value> {
    let Some((coll, items)) = args.split_first() else {
        return Ok(Value::vector(Vec::new()));
    };
    let mut coll = coll.clone();
    for item in items {
        coll = conj1(coll, item.clone())?;
    }
    Ok(coll)
}

/// (disj set & items)
pub(crate) fn builtin_disj(args: &[Value]) -> Result<Value> {
    let Some((coll, items)) = args.split_first() else {
        return Err(Error::arity_at_least("disj", 1, 0));
    };
    match coll {
        Value::Set(set, meta) => {
            let mut set = (**set).clone();
            for item in items {
                set = set.remove(item);
            }
            Ok(Value::Set(Arc::new(set), meta.clone()))
        }
        Value::Nil => Ok(Value::Nil),
        other => Err(Error::type_mismatch_in("disj", "set", other.type_name())),
    }
}

/// (cons x coll)
pub(crate) fn builtin_cons(args: &[Value]) -> Result<Value> {
    let args = exact("cons", args, 2)?;
    let mut items = match &args[1] {
        Value::List(items, _) => (**items).clone(),
        other => items_of("cons", other)?.into_iter().collect(),
    };
    items.push_front(args[0].clone());
    Ok(Value::list_from(items))
}

/// (concat & colls)
pub(crate) fn builtin_concat(args: &[Value]) -> Result<Value> {
    let mut out = Vec::new();
    for arg in args {
        out.extend(items_of("concat", arg)?);
    }
    Ok(Value::list(out))
}

/// (into to from)
pub(crate) fn builtin_into(args: &[Value]) -> Result<Value> {
    let args = exact("into", args, 2)?;
    let mut coll = args[0].clone();
    for item in items_of("into", &args[1])? {
        coll = conj1(coll, item)?;
    }
    Ok(coll)
}

/// (empty coll) - an empty collection of the same kind
pub(crate) fn builtin_empty(args: &[Value]) -> Result<Value> {
    let args = exact("empty", args, 1)?;
    Ok(match &args[0] {
        Value::List(_, meta) => Value::List(Arc::new(im::Vector::new()), meta.clone()),
        Value::Vector(_, meta) => Value::Vector(PVector::new(), meta.clone()),
        Value::Map(map, meta) => Value::Map(Arc::new(PMap::empty(map.kind())), meta.clone()),
        Value::Set(set, meta) => Value::Set(Arc::new(PSet::empty(set.kind())), meta.clone()),
        _ => Value::Nil,
    })
}

/// (reverse coll)
pub(crate) fn builtin_reverse(args: &[Value]) -> Result<Value> {
    let args = exact("reverse", args, 1)?;
    let mut items = items_of("reverse", &args[0])?;
    items.reverse();
    Ok(Value::list(items))
}

/// (take n coll)
pub(crate) fn builtin_take(args: &[Value]) -> Result<Value> {
    let args = exact("take", args, 2)?;
    let n = usize::try_from(index_arg("take", &args[0])?).unwrap_or(0);
    Ok(Value::list(items_of("take", &args[1])?.into_iter().take(n).collect()))
}

/// (drop n coll)
pub(crate) fn builtin_drop(args: &[Value]) -> Result<Value> {
    let args = exact("drop", args, 2)?;
    let n = usize::try_from(index_arg("drop", &args[0])?).unwrap_or(0);
    Ok(Value::list(items_of("drop", &args[1])?.into_iter().skip(n).collect()))
}

/// (distinct coll) - first occurrences, in order
pub(crate) fn builtin_distinct(args: &[Value]) -> Result<Value> {
    let args = exact("distinct", args, 1)?;
    let mut seen = im::HashSet::new();
    let mut out = Vec::new();
    for item in items_of("distinct", &args[0])? {
        if seen.insert(item.clone()).is_none() {
            out.push(item);
        }
    }
    Ok(Value::list(out))
}

/// (merge & maps)
pub(crate) fn builtin_merge(args: &[Value]) -> Result<Value> {
    let mut result: Option<Value> = None;
    for arg in args {
        result = match (result, arg) {
            (acc, Value::Nil) => acc,
            (None, map @ Value::Map(..)) => Some(map.clone()),
            (Some(acc), map @ Value::Map(..)) => Some(conj1(acc, map.clone())?),
            (_, other) => return Err(Error::type_mismatch_in("merge", "map", other.type_name())),
        };
    }
    Ok(result.unwrap_or(Value::Nil))
}

/// (zipmap keys vals)
pub(crate) fn builtin_zipmap(args: &[Value]) -> Result<Value> {
    let args = exact("zipmap", args, 2)?;
    let keys = items_of("zipmap", &args[0])?;
    let vals = items_of("zipmap", &args[1])?;
    Ok(Value::map(keys.into_iter().zip(vals)))
}

/// (frequencies coll)
pub(crate) fn builtin_frequencies(args: &[Value]) -> Result<Value> {
    let args = exact("frequencies", args, 1)?;
    let mut counts = PMap::empty(MapKind::Hash);
    for item in items_of("frequencies", &args[0])? {
        let n = match counts.get(&item) {
            Some(Value::Long(n)) => n + 1,
            _ => 1,
        };
        counts = counts.assoc(item, Value::Long(n));
    }
    Ok(Value::map_from(counts))
}
