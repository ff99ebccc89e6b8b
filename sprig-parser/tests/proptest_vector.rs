// sprig-parser - Property-based tests for the tiny vector representation
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The tiny and general vector forms must be indistinguishable. Each test
//! drives a `PVector` built through the normalising API and one forced into
//! the general form through the same operations, checking both against an
//! `im::Vector` model after every step.

use proptest::prelude::*;
use sprig_parser::{PVector, TINY_CAPACITY, Value};

#[derive(Debug, Clone)]
enum Op {
    AddAtStart(i64),
    AddAtEnd(i64),
    Rest,
    Butlast,
    RemoveFirst,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<i64>().prop_map(Op::AddAtStart),
        any::<i64>().prop_map(Op::AddAtEnd),
        Just(Op::Rest),
        Just(Op::Butlast),
        Just(Op::RemoveFirst),
    ]
}

fn apply(v: &PVector, op: &Op) -> PVector {
    match op {
        Op::AddAtStart(n) => v.push_front(Value::Long(*n)),
        Op::AddAtEnd(n) => v.push_back(Value::Long(*n)),
        Op::Rest => v.rest(),
        Op::Butlast => v.butlast(),
        Op::RemoveFirst => v.remove(0).unwrap_or_else(|| v.clone()),
    }
}

fn apply_model(v: &im::Vector<Value>, op: &Op) -> im::Vector<Value> {
    let mut v = v.clone();
    match op {
        Op::AddAtStart(n) => v.push_front(Value::Long(*n)),
        Op::AddAtEnd(n) => v.push_back(Value::Long(*n)),
        Op::Rest | Op::RemoveFirst => {
            v.pop_front();
        }
        Op::Butlast => {
            v.pop_back();
        }
    }
    v
}

fn assert_matches_model(v: &PVector, model: &im::Vector<Value>) {
    assert_eq!(v.len(), model.len());
    assert_eq!(v.first(), model.front());
    assert_eq!(v.last(), model.back());
    assert_eq!(v.to_im(), *model);
    assert_eq!(v.is_tiny(), model.len() <= TINY_CAPACITY);
}

// =============================================================================
// Tiny vs general equivalence
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn tiny_and_general_stay_equal(
        n in 0usize..50,
        ops in prop::collection::vec(op_strategy(), 0..60),
    ) {
        let start: Vec<Value> = (0..n as i64).map(Value::Long).collect();
        let mut model: im::Vector<Value> = start.iter().cloned().collect();
        let mut normal = PVector::from_vec(start);
        let mut general = PVector::general(model.clone());

        for op in &ops {
            model = apply_model(&model, op);
            normal = apply(&normal, op);
            general = apply(&general, op);

            assert_matches_model(&normal, &model);
            prop_assert_eq!(&normal, &general);
            prop_assert_eq!(
                Value::vector_from(normal.clone()),
                Value::vector_from(general.clone())
            );
        }
    }

    #[test]
    fn assoc_and_slice_agree_with_model(
        items in prop::collection::vec(any::<i64>(), 1..20),
        value in any::<i64>(),
        index_seed in any::<usize>(),
    ) {
        let values: Vec<Value> = items.iter().copied().map(Value::Long).collect();
        let v = PVector::from_vec(values.clone());
        let index = index_seed % values.len();

        let mut expected = values.clone();
        expected[index] = Value::Long(value);
        let assoced = v.assoc(index, Value::Long(value)).unwrap();
        prop_assert_eq!(assoced.to_vec(), expected);

        let sliced = v.slice(index, values.len());
        prop_assert_eq!(sliced.to_vec(), values[index..].to_vec());
        prop_assert_eq!(sliced.is_tiny(), values.len() - index <= TINY_CAPACITY);
    }

    #[test]
    fn hash_does_not_depend_on_representation(
        items in prop::collection::vec(any::<i64>(), 0..12),
    ) {
        use std::hash::{BuildHasher, RandomState};

        let values: Vec<Value> = items.into_iter().map(Value::Long).collect();
        let tiny = Value::vector_from(PVector::from_vec(values.clone()));
        let general = Value::vector_from(PVector::general(values.into_iter().collect()));
        let state = RandomState::new();
        prop_assert_eq!(state.hash_one(&tiny), state.hash_one(&general));
    }
}

#[test]
fn assoc_out_of_range_is_none() {
    let v = PVector::from_vec(vec![Value::Long(1)]);
    assert!(v.assoc(1, Value::Nil).is_none());
    assert!(v.remove(3).is_none());
}
