// sprig-parser - Type rank, ordering, equality and hashing
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Total ordering over all values.
//!
//! Values first order by type rank:
//!
//! | rank | variants                          |
//! |------|-----------------------------------|
//! | 0    | nil                               |
//! | 1    | boolean                           |
//! | 2    | long, double, decimal             |
//! | 3    | string, char                      |
//! | 4    | keyword, symbol                   |
//! | 5    | bytebuf                           |
//! | 6    | atom, volatile, thread-local      |
//! | 7    | function                          |
//! | 8    | list, vector, map, set            |
//! | 9    | custom                            |
//! | 10   | host                              |
//!
//! Tie-breaks within a rank:
//!
//! - Numbers compare by exact numeric value across Long, Double and
//!   Decimal. NaN sorts above every other number. Numerically equal values
//!   of different variants order Long < Double < Decimal, so only values of
//!   the same variant compare `Equal`.
//! - A char compares as a one-character string; on a tie the char sorts
//!   first.
//! - Keywords sort before symbols; within a kind, names without a
//!   namespace come first, then by namespace and name.
//! - Reference cells order atom < volatile < thread-local, then by creation
//!   order. Functions order by name, then creation order.
//! - Lists and vectors compare element-wise (a list equals a vector with
//!   the same elements), then maps, then sets. Maps and sets compare their
//!   contents in sorted order.
//!
//! Equality and hashing agree with the ordering: `a == b` exactly when
//! `a.cmp(&b)` is `Equal`. Metadata is ignored throughout.

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use bigdecimal::BigDecimal;
use num_traits::FromPrimitive;

use crate::custom::{CustomBody, CustomValue};
use crate::value::Value;

/// Rank of a value's variant in the total order.
#[must_use]
pub fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Nil => 0,
        Value::Boolean(_) => 1,
        Value::Long(_) | Value::Double(_) | Value::Decimal(_) => 2,
        Value::String(_) | Value::Char(_) => 3,
        Value::Keyword(_) | Value::Symbol(..) => 4,
        Value::ByteBuffer(_) => 5,
        Value::Atom(_) | Value::Volatile(_) | Value::ThreadLocal(_) => 6,
        Value::Function(_) => 7,
        Value::List(..) | Value::Vector(..) | Value::Map(..) | Value::Set(..) => 8,
        Value::Custom(_) => 9,
        Value::Host(_) => 10,
    }
}

/// Position of a variant inside its rank.
fn sub_rank(value: &Value) -> u8 {
    match value {
        Value::Long(_) | Value::Keyword(_) | Value::Atom(_) => 0,
        Value::List(..) | Value::Vector(..) => 0,
        Value::Double(_) | Value::Symbol(..) | Value::Volatile(_) | Value::Map(..) => 1,
        Value::Decimal(_) | Value::ThreadLocal(_) | Value::Set(..) => 2,
        _ => 0,
    }
}

const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

fn cmp_double(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => a.to_bits().cmp(&b.to_bits()),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.total_cmp(&b),
    }
}

fn cmp_long_double(n: i64, d: f64) -> Ordering {
    if d.is_nan() || d >= I64_UPPER {
        return Ordering::Less;
    }
    if d < -I64_UPPER {
        return Ordering::Greater;
    }
    let whole = d.trunc();
    // `whole` is within i64 range here, so the cast is exact.
    match n.cmp(&(whole as i64)) {
        Ordering::Equal => whole.partial_cmp(&d).unwrap_or(Ordering::Equal),
        other => other,
    }
}

fn cmp_double_decimal(d: f64, dec: &BigDecimal) -> Ordering {
    if d.is_nan() || d == f64::INFINITY {
        return Ordering::Greater;
    }
    if d == f64::NEG_INFINITY {
        return Ordering::Less;
    }
    match BigDecimal::from_f64(d) {
        Some(exact) => exact.cmp(dec),
        None => Ordering::Equal,
    }
}

/// Numeric comparison across the tower, ignoring the variant tie-break.
/// Returns `None` when either side is not a number.
#[must_use]
pub fn compare_numeric(a: &Value, b: &Value) -> Option<Ordering> {
    Some(match (a, b) {
        (Value::Long(x), Value::Long(y)) => x.cmp(y),
        (Value::Double(x), Value::Double(y)) => cmp_double(*x, *y),
        (Value::Decimal(x), Value::Decimal(y)) => x.as_ref().cmp(y.as_ref()),
        (Value::Long(x), Value::Double(y)) => cmp_long_double(*x, *y),
        (Value::Double(x), Value::Long(y)) => cmp_long_double(*y, *x).reverse(),
        (Value::Long(x), Value::Decimal(y)) => BigDecimal::from(*x).cmp(y.as_ref()),
        (Value::Decimal(x), Value::Long(y)) => x.as_ref().cmp(&BigDecimal::from(*y)),
        (Value::Double(x), Value::Decimal(y)) => cmp_double_decimal(*x, y),
        (Value::Decimal(x), Value::Double(y)) => cmp_double_decimal(*y, x).reverse(),
        _ => return None,
    })
}

fn cmp_text(a: &Value, b: &Value) -> Ordering {
    let mut buf_a = [0u8; 4];
    let mut buf_b = [0u8; 4];
    let sa: &str = match a {
        Value::String(s) => s,
        Value::Char(c) => c.encode_utf8(&mut buf_a),
        _ => "",
    };
    let sb: &str = match b {
        Value::String(s) => s,
        Value::Char(c) => c.encode_utf8(&mut buf_b),
        _ => "",
    };
    sa.cmp(sb).then_with(|| {
        let char_first = |v: &Value| u8::from(matches!(v, Value::String(_)));
        char_first(a).cmp(&char_first(b))
    })
}

fn cmp_seq<'a>(
    mut a: impl Iterator<Item = &'a Value>,
    mut b: impl Iterator<Item = &'a Value>,
) -> Ordering {
    loop {
        match (a.next(), b.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match x.cmp(y) {
                Ordering::Equal => {}
                other => return other,
            },
        }
    }
}

fn sequential_iter(value: &Value) -> Box<dyn Iterator<Item = &Value> + '_> {
    match value {
        Value::List(items, _) => Box::new(items.iter()),
        Value::Vector(items, _) => Box::new(items.iter()),
        _ => Box::new(std::iter::empty()),
    }
}

fn cmp_custom(a: &CustomValue, b: &CustomValue) -> Ordering {
    a.type_name.cmp(&b.type_name).then_with(|| match (&a.body, &b.body) {
        (CustomBody::Record(x), CustomBody::Record(y)) => {
            for ((kx, vx), (ky, vy)) in x.iter().zip(y.iter()) {
                let ord = kx.cmp(ky).then_with(|| vx.cmp(vy));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (CustomBody::Record(_), CustomBody::Wrapped(_)) => Ordering::Less,
        (CustomBody::Wrapped(_), CustomBody::Record(_)) => Ordering::Greater,
        (CustomBody::Wrapped(x), CustomBody::Wrapped(y)) => x.cmp(y),
    })
}

fn cmp_same_rank(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Nil, Value::Nil) => Ordering::Equal,
        (Value::Boolean(x), Value::Boolean(y)) => x.cmp(y),
        (Value::String(_) | Value::Char(_), Value::String(_) | Value::Char(_)) => cmp_text(a, b),
        (Value::Keyword(x), Value::Keyword(y)) => x.cmp(y),
        (Value::Symbol(x, _), Value::Symbol(y, _)) => x.cmp(y),
        (Value::ByteBuffer(x), Value::ByteBuffer(y)) => x.cmp(y),
        (Value::Atom(x), Value::Atom(y)) => x.id().cmp(&y.id()),
        (Value::Volatile(x), Value::Volatile(y)) => x.id().cmp(&y.id()),
        (Value::ThreadLocal(x), Value::ThreadLocal(y)) => x.id().cmp(&y.id()),
        (Value::Function(x), Value::Function(y)) => {
            if x.id() == y.id() {
                Ordering::Equal
            } else {
                x.display_name()
                    .cmp(&y.display_name())
                    .then_with(|| x.id().cmp(&y.id()))
            }
        }
        (Value::List(..) | Value::Vector(..), Value::List(..) | Value::Vector(..)) => {
            cmp_seq(sequential_iter(a), sequential_iter(b))
        }
        (Value::Map(x, _), Value::Map(y, _)) => {
            let (ex, ey) = (x.sorted_entries(), y.sorted_entries());
            for ((kx, vx), (ky, vy)) in ex.iter().zip(ey.iter()) {
                let ord = kx.cmp(ky).then_with(|| vx.cmp(vy));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            ex.len().cmp(&ey.len())
        }
        (Value::Set(x, _), Value::Set(y, _)) => {
            cmp_seq(x.sorted_values().into_iter(), y.sorted_values().into_iter())
        }
        (Value::Custom(x), Value::Custom(y)) => cmp_custom(x, y),
        (Value::Host(x), Value::Host(y)) => x
            .type_name()
            .cmp(y.type_name())
            .then_with(|| x.id().cmp(&y.id())),
        _ => match compare_numeric(a, b) {
            Some(Ordering::Equal) => sub_rank(a).cmp(&sub_rank(b)),
            Some(ord) => ord,
            None => sub_rank(a).cmp(&sub_rank(b)),
        },
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        type_rank(self)
            .cmp(&type_rank(other))
            .then_with(|| cmp_same_rank(self, other))
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Keyword(a), Value::Keyword(b)) => a == b,
            (Value::Symbol(a, _), Value::Symbol(b, _)) => a == b,
            (Value::ByteBuffer(a), Value::ByteBuffer(b)) => a == b,
            (Value::List(..) | Value::Vector(..), Value::List(..) | Value::Vector(..)) => {
                self.count() == other.count()
                    && sequential_iter(self)
                        .zip(sequential_iter(other))
                        .all(|(x, y)| x == y)
            }
            (Value::Map(a, _), Value::Map(b, _)) => {
                a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
            }
            (Value::Set(a, _), Value::Set(b, _)) => {
                a.len() == b.len() && a.iter().all(|v| b.contains(v))
            }
            (Value::Function(a), Value::Function(b)) => a.id() == b.id(),
            (Value::Atom(a), Value::Atom(b)) => a.id() == b.id(),
            (Value::Volatile(a), Value::Volatile(b)) => a.id() == b.id(),
            (Value::ThreadLocal(a), Value::ThreadLocal(b)) => a.id() == b.id(),
            (Value::Custom(a), Value::Custom(b)) => a == b,
            (Value::Host(a), Value::Host(b)) => a.id() == b.id(),
            _ => false,
        }
    }
}

impl Eq for Value {}

fn hash_one<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        type_rank(self).hash(state);
        match self {
            Value::Nil => {}
            Value::Boolean(b) => b.hash(state),
            Value::Long(n) => {
                0u8.hash(state);
                n.hash(state);
            }
            Value::Double(d) => {
                1u8.hash(state);
                d.to_bits().hash(state);
            }
            Value::Decimal(d) => {
                2u8.hash(state);
                d.normalized().hash(state);
            }
            Value::String(s) => {
                0u8.hash(state);
                s.hash(state);
            }
            Value::Char(c) => {
                1u8.hash(state);
                c.hash(state);
            }
            Value::Keyword(k) => {
                0u8.hash(state);
                k.hash(state);
            }
            Value::Symbol(s, _) => {
                1u8.hash(state);
                s.hash(state);
            }
            Value::ByteBuffer(b) => b.hash(state),
            Value::List(..) | Value::Vector(..) => {
                0u8.hash(state);
                for item in sequential_iter(self) {
                    item.hash(state);
                }
            }
            Value::Map(map, _) => {
                1u8.hash(state);
                map.len().hash(state);
                let sum = map
                    .iter()
                    .fold(0u64, |acc, entry| acc.wrapping_add(hash_one(&entry)));
                sum.hash(state);
            }
            Value::Set(set, _) => {
                2u8.hash(state);
                set.len().hash(state);
                let sum = set
                    .iter()
                    .fold(0u64, |acc, v| acc.wrapping_add(hash_one(v)));
                sum.hash(state);
            }
            Value::Function(f) => f.id().hash(state),
            Value::Atom(a) => a.id().hash(state),
            Value::Volatile(v) => v.id().hash(state),
            Value::ThreadLocal(t) => t.id().hash(state),
            Value::Custom(c) => {
                c.type_name.hash(state);
                match &c.body {
                    CustomBody::Record(fields) => {
                        for (k, v) in fields.iter() {
                            k.hash(state);
                            v.hash(state);
                        }
                    }
                    CustomBody::Wrapped(v) => v.hash(state),
                }
            }
            Value::Host(h) => h.id().hash(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Value {
        Value::decimal(BigDecimal::from_str(s).unwrap())
    }

    #[test]
    fn test_rank_order() {
        let ordered = [
            Value::Nil,
            Value::Boolean(true),
            Value::Long(100),
            Value::string("a"),
            Value::keyword("a"),
            Value::Atom(crate::cells::Atom::new(Value::Nil)),
            Value::list(vec![]),
        ];
        for pair in ordered.windows(2) {
            assert!(pair[0] < pair[1], "{:?} < {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_numeric_tower_ordering() {
        assert!(Value::Long(1) < Value::Double(1.5));
        assert!(Value::Double(1.5) < dec("1.6"));
        assert!(dec("0.5") < Value::Long(1));
        assert!(Value::Long(i64::MAX) < Value::Double(1e19));
        assert!(Value::Double(f64::NAN) > Value::Double(f64::INFINITY));
        assert!(Value::Double(f64::NAN) > dec("1e400"));
    }

    #[test]
    fn test_numerically_equal_variants_are_distinct() {
        assert_ne!(Value::Long(1), Value::Double(1.0));
        assert!(Value::Long(1) < Value::Double(1.0));
        assert!(Value::Double(1.0) < dec("1"));
        assert_eq!(compare_numeric(&Value::Long(1), &dec("1.0")), Some(Ordering::Equal));
    }

    #[test]
    fn test_decimal_scale_does_not_matter() {
        assert_eq!(dec("1.0"), dec("1.00"));
        assert_eq!(hash_one(&dec("1.0")), hash_one(&dec("1.00")));
    }

    #[test]
    fn test_char_sorts_before_equal_string() {
        assert!(Value::Char('a') < Value::string("a"));
        assert!(Value::string("a") < Value::Char('b'));
    }

    #[test]
    fn test_keyword_before_symbol() {
        assert!(Value::keyword("z") < Value::symbol("a"));
    }

    #[test]
    fn test_list_equals_vector() {
        let list = Value::list(vec![Value::Long(1), Value::Long(2)]);
        let vector = Value::vector(vec![Value::Long(1), Value::Long(2)]);
        assert_eq!(list, vector);
        assert_eq!(list.cmp(&vector), Ordering::Equal);
        assert_eq!(hash_one(&list), hash_one(&vector));
    }

    #[test]
    fn test_map_hash_is_order_independent() {
        let a = Value::ordered_map([(Value::Long(1), Value::Nil), (Value::Long(2), Value::Nil)]);
        let b = Value::ordered_map([(Value::Long(2), Value::Nil), (Value::Long(1), Value::Nil)]);
        assert_eq!(a, b);
        assert_eq!(hash_one(&a), hash_one(&b));
    }

    #[test]
    fn test_collection_sub_ranks() {
        let seq = Value::vector(vec![Value::Long(9)]);
        let map = Value::map([(Value::Long(0), Value::Nil)]);
        let set = Value::set([Value::Long(0)]);
        assert!(seq < map);
        assert!(map < set);
    }
}
