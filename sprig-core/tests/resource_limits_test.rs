// sprig-core - Resource limit integration tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Integration tests for the evaluation depth and macro expansion bounds.
//! Most deep evaluations run on threads with the evaluator's stack size;
//! the small-stack cases check that the depth bound holds on any thread.

mod common;

use common::{
    Config, Value, eval_all, kw, new_env, new_env_with, on_big_stack, on_small_stack,
};

const DEEP: &str = "(defn deep [n] (if (zero? n) 0 (inc (deep (dec n)))))";

// =============================================================================
// Evaluation depth
// =============================================================================

#[test]
fn test_deep_recursion_within_limit() {
    let result = on_big_stack(|| {
        let env = new_env();
        eval_all(DEEP, &env)?;
        eval_all("(deep 1000)", &env)
    });
    assert_eq!(result.unwrap(), Value::Long(1000));
}

#[test]
fn test_runaway_recursion_is_exhausted() {
    let err = on_big_stack(|| {
        let env = new_env();
        eval_all(DEEP, &env)?;
        eval_all("(deep 1000000)", &env)
    })
    .unwrap_err();
    assert!(err.contains("maximum evaluation depth (5000) exceeded"), "{err}");
}

#[test]
fn test_exhaustion_is_catchable_and_recovers() {
    let result = on_big_stack(|| {
        let env = new_env();
        eval_all(DEEP, &env)?;
        eval_all(
            "[(try (deep 1000000) (catch :resource-exhausted e :too-deep))
              (deep 10)
              (eval-depth)]",
            &env,
        )
    });
    let Value::Vector(items, _) = result.unwrap() else {
        panic!("expected a vector");
    };
    assert_eq!(items.get(0), Some(&kw("too-deep")));
    assert_eq!(items.get(1), Some(&Value::Long(10)));
    assert!(matches!(items.get(2), Some(Value::Long(d)) if *d < 10));
}

#[test]
fn test_depth_bound_holds_on_a_small_stack() {
    let (within, beyond) = on_small_stack(|| {
        let env = new_env();
        eval_all(DEEP, &env).unwrap();
        (eval_all("(deep 4000)", &env), eval_all("(deep 100000)", &env))
    });
    assert_eq!(within.unwrap(), Value::Long(4000));
    let err = beyond.unwrap_err();
    assert!(err.contains("maximum evaluation depth (5000) exceeded"), "{err}");
}

#[test]
fn test_upfront_expansion_depth_bound_holds_on_a_small_stack() {
    let err = on_small_stack(|| {
        let env = new_env_with(Config {
            macroexpand_upfront: true,
            ..Config::default()
        });
        eval_all(
            "(defmacro deepen [n] (if (zero? n) 1 (list 'do (list 'deepen (dec n)))))
             (deepen 20000)",
            &env,
        )
    })
    .unwrap_err();
    assert!(err.contains("maximum evaluation depth"), "{err}");
}

#[test]
fn test_configured_depth_limit() {
    let (shallow, deeper) = on_big_stack(|| {
        let env = new_env_with(Config {
            max_depth: 50,
            ..Config::default()
        });
        eval_all(DEEP, &env).unwrap();
        (eval_all("(deep 10)", &env), eval_all("(deep 100)", &env))
    });
    assert_eq!(shallow.unwrap(), Value::Long(10));
    let err = deeper.unwrap_err();
    assert!(err.contains("maximum evaluation depth (50) exceeded"), "{err}");
}

#[test]
fn test_tail_calls_do_not_count_toward_depth() {
    let env = new_env_with(Config {
        max_depth: 50,
        ..Config::default()
    });
    eval_all("(defn walk [n] (if (zero? n) :end (walk (dec n))))", &env).unwrap();
    assert_eq!(eval_all("(walk 10000)", &env).unwrap(), kw("end"));
}

// =============================================================================
// Macro expansion
// =============================================================================

#[test]
fn test_non_terminating_macro_is_exhausted() {
    let err = on_big_stack(|| {
        let env = new_env();
        eval_all("(defmacro forever [] '(forever)) (forever)", &env)
    })
    .unwrap_err();
    assert!(err.contains("macro expansion did not terminate"), "{err}");
}

#[test]
fn test_non_terminating_macro_is_exhausted_upfront() {
    let err = on_big_stack(|| {
        let env = new_env_with(Config {
            macroexpand_upfront: true,
            ..Config::default()
        });
        eval_all("(defmacro forever [] '(forever)) (forever)", &env)
    })
    .unwrap_err();
    assert!(err.contains("macro expansion did not terminate"), "{err}");
}

#[test]
fn test_self_expansion_under_special_forms_is_exhausted() {
    for body in ["(do (m))", "(let [] (m))", "(if true (m) nil)", "(do 1 (let [x 2] (m)))"] {
        let source = format!("(defmacro m [] '{body}) (m)");
        let err = on_big_stack(move || {
            let env = new_env();
            eval_all(&source, &env)
        })
        .unwrap_err();
        assert!(err.contains("macro expansion did not terminate"), "{body}: {err}");
    }
}

#[test]
fn test_tail_loops_through_macros_are_not_exhausted() {
    let env = new_env_with(Config {
        max_expansion_steps: 3,
        ..Config::default()
    });
    assert_eq!(
        eval_all("(loop [i 0] (if (< i 100) (when true (recur (inc i))) i))", &env).unwrap(),
        Value::Long(100)
    );
    eval_all("(defn count-down [n] (when (pos? n) (count-down (dec n))))", &env).unwrap();
    assert_eq!(eval_all("(count-down 100)", &env).unwrap(), Value::Nil);
}

#[test]
fn test_configured_expansion_limit() {
    const NEST: &str = "(defmacro nest [n] (if (zero? n) :bottom (list 'nest (dec n))))";
    let tight = new_env_with(Config {
        max_expansion_steps: 3,
        ..Config::default()
    });
    eval_all(NEST, &tight).unwrap();
    assert_eq!(eval_all("(nest 2)", &tight).unwrap(), kw("bottom"));
    let err = eval_all("(nest 5)", &tight).unwrap_err();
    assert!(err.contains("after 3 steps"), "{err}");

    let roomy = new_env();
    eval_all(NEST, &roomy).unwrap();
    assert_eq!(eval_all("(nest 5)", &roomy).unwrap(), kw("bottom"));
}
