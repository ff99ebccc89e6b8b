// sprig-parser - Property-based tests for the total value ordering
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Type rank is a strict total preorder and sorting mixed values is
//! deterministic.

mod common;

use std::cmp::Ordering;
use std::hash::{BuildHasher, RandomState};

use proptest::prelude::*;
use sprig_parser::{Atom, Function, Value, type_rank};

fn mixed() -> impl Strategy<Value = Value> {
    common::literal()
}

// =============================================================================
// Order laws
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn ordering_is_antisymmetric(a in mixed(), b in mixed()) {
        prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
    }

    #[test]
    fn ordering_is_transitive(a in mixed(), b in mixed(), c in mixed()) {
        let mut sorted = [a, b, c];
        sorted.sort();
        prop_assert!(sorted[0] <= sorted[1]);
        prop_assert!(sorted[1] <= sorted[2]);
        prop_assert!(sorted[0] <= sorted[2]);
    }

    #[test]
    fn rank_decides_before_contents(a in mixed(), b in mixed()) {
        let (ra, rb) = (type_rank(&a), type_rank(&b));
        if ra != rb {
            prop_assert_eq!(a.cmp(&b), ra.cmp(&rb));
        }
    }

    #[test]
    fn equality_agrees_with_ordering_and_hash(a in mixed(), b in mixed()) {
        prop_assert_eq!(a == b, a.cmp(&b) == Ordering::Equal);
        if a == b {
            let state = RandomState::new();
            prop_assert_eq!(state.hash_one(&a), state.hash_one(&b));
        }
    }

    #[test]
    fn sorting_is_deterministic(items in prop::collection::vec(mixed(), 0..30)) {
        let mut forward = items.clone();
        forward.sort();
        let mut backward: Vec<Value> = items.into_iter().rev().collect();
        backward.sort();
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn numbers_interleave_by_value(n in -1000i64..1000, d in -1000.0f64..1000.0) {
        let long = Value::Long(n);
        let double = Value::Double(d);
        let expected = (n as f64).partial_cmp(&d).unwrap();
        if expected != Ordering::Equal {
            prop_assert_eq!(long.cmp(&double), expected);
        } else {
            prop_assert_eq!(long.cmp(&double), Ordering::Less);
            prop_assert_ne!(long, double);
        }
    }
}

#[test]
fn identity_values_sort_by_creation() {
    let first = Value::Atom(Atom::new(Value::Nil));
    let second = Value::Atom(Atom::new(Value::Nil));
    assert_eq!(first.cmp(&second), Ordering::Less);

    let mut values = vec![
        Value::vector(vec![]),
        second.clone(),
        Value::Function(Function::native("f", std::sync::Arc::new(()))),
        Value::keyword("k"),
        first.clone(),
        Value::Nil,
    ];
    values.sort();
    assert_eq!(values[0], Value::Nil);
    assert_eq!(values[1], Value::keyword("k"));
    assert_eq!(values[2], first);
    assert_eq!(values[3], second);
    assert!(matches!(values[4], Value::Function(_)));
    assert!(matches!(values[5], Value::Vector(..)));
}
