// sprig-core - Builtin function integration tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Integration tests for the builtin library as programs see it, and for
//! the bundled `test` module.

mod common;

use common::{CORE_MODULE, Value, eval_all, eval_all_in, kw, load_module, new_context, new_env};

fn longs(items: &[i64]) -> Value {
    Value::vector(items.iter().copied().map(Value::Long).collect())
}

fn long_list(items: &[i64]) -> Value {
    Value::list(items.iter().copied().map(Value::Long).collect())
}

// =============================================================================
// Numbers
// =============================================================================

#[test]
fn test_numeric_tower() {
    assert_eval!("(+ 1 2.5)", Value::Double(3.5));
    assert_eval!("(* 2 3 4)", Value::Long(24));
    assert_eval!("(quot 7 2)", Value::Long(3));
    assert_eval!("(mod -7 3)", Value::Long(2));
    assert_eval!("(= 1 1.0)", Value::Boolean(false));
    assert_eval!("(== 1 1.0)", Value::Boolean(true));
    assert_eval!("(< 1 2 3)", Value::Boolean(true));
    assert_eval!("(decimal? (+ 1M 1))", Value::Boolean(true));
    assert_eval_err_contains!("(/ 1 0)", "divide by zero");
    assert_eval_err_contains!("(+ 1 :a)", "expected number");
}

#[test]
fn test_compare_and_sort_mixed_types() {
    let env = new_env();
    let once = eval_all("(sort [3 :b \"a\" nil 1.5 :a [1] 2])", &env).unwrap();
    let again = eval_all("(sort [[1] 2 :a nil \"a\" 3 1.5 :b])", &env).unwrap();
    assert_eq!(once, again);
    assert_eq!(eval_all("(first (sort [3 nil 1]))", &env).unwrap(), Value::Nil);
    assert_eq!(
        eval_all("(sort > [1 3 2])", &env).unwrap(),
        long_list(&[3, 2, 1])
    );
    assert_eq!(
        eval_all("(sort-by :n [{:n 2} {:n 1}])", &env).unwrap(),
        eval_all("'({:n 1} {:n 2})", &env).unwrap()
    );
}

// =============================================================================
// Collections
// =============================================================================

#[test]
fn test_collection_basics() {
    assert_eval!("(conj [1 2] 3)", longs(&[1, 2, 3]));
    assert_eval!("(conj '(2 3) 1)", long_list(&[1, 2, 3]));
    assert_eval!("(assoc [1 2] 2 3)", longs(&[1, 2, 3]));
    assert_eval!("(get-in {:a {:b [10 20]}} [:a :b 1])", Value::Long(20));
    assert_eval!("(count {:a 1 :b 2})", Value::Long(2));
    assert_eval!("(rest [1])", Value::list(vec![]));
    assert_eval!("(next [1])", Value::Nil);
    assert_eval!("(into #{} [1 1 2])", Value::set([Value::Long(1), Value::Long(2)]));
    assert_eval!("(nth [1 2 3] 1)", Value::Long(2));
    assert_eval_err_contains!("(nth [1 2 3] 5)", "out of bounds");
    assert_eval_err_contains!("(assoc [1 2] 5 0)", "out of bounds");
}

#[test]
fn test_ordered_and_sorted_collections() {
    assert_eval!("(keys (ordered-map :z 1 :a 2))", Value::list(vec![kw("z"), kw("a")]));
    assert_eval!("(keys (sorted-map :z 1 :a 2))", Value::list(vec![kw("a"), kw("z")]));
    assert_eval!("(seq (sorted-set 3 1 2))", long_list(&[1, 2, 3]));
    assert_eval!("(sorted? (sorted-map))", Value::Boolean(true));
}

#[test]
fn test_sequence_functions() {
    assert_eval!("(map + [1 2] [10 20])", long_list(&[11, 22]));
    assert_eval!("(filter odd? (range 6))", long_list(&[1, 3, 5]));
    assert_eval!("(reduce + (range 5))", Value::Long(10));
    assert_eval!("(reduce + [])", Value::Long(0));
    assert_eval!("(take 2 (drop 1 [1 2 3 4]))", long_list(&[2, 3]));
    assert_eval!("(mapcat reverse [[1 2] [3 4]])", long_list(&[2, 1, 4, 3]));
    assert_eval!("(frequencies [:a :b :a])", Value::map([(kw("a"), Value::Long(2)), (kw("b"), Value::Long(1))]));
    assert_eval!("(group-by odd? [1 2 3])", Value::map([
        (Value::Boolean(true), longs(&[1, 3])),
        (Value::Boolean(false), longs(&[2])),
    ]));
    assert_eval!("(update {:n 1} :n + 10)", Value::map([(kw("n"), Value::Long(11))]));
    assert_eval!("((comp inc inc) 1)", Value::Long(3));
    assert_eval!("((partial + 5) 1)", Value::Long(6));
    assert_eval!("((juxt first last) [1 2 3])", longs(&[1, 3]));
}

// =============================================================================
// Strings, symbols and printing
// =============================================================================

#[test]
fn test_strings() {
    assert_eval!("(str \"a\" 1 nil :k)", Value::string("a1:k"));
    assert_eval!("(pr-str \"a\" 1)", Value::string("\"a\" 1"));
    assert_eval!("(subs \"héllo\" 1 3)", Value::string("él"));
    assert_eval!("(split \"a,b\" \",\")", Value::vector(vec![Value::string("a"), Value::string("b")]));
    assert_eval!("(join \"-\" [1 \"x\" :y])", Value::string("1-x-:y"));
    assert_eval!("(upper-case \"abc\")", Value::string("ABC"));
    assert_eval!("(name :ns/k)", Value::string("k"));
    assert_eval!("(namespace :ns/k)", Value::string("ns"));
    assert_eval!("(keyword \"a\")", kw("a"));
}

#[test]
fn test_read_string_round_trip() {
    let env = new_env();
    let source = "[1 2.5 \"s\\n\" :k sym (a b) {:m #{1}}]";
    let printed = eval_all(&format!("(pr-str (read-string {}))", Value::string(source)), &env)
        .unwrap();
    let Value::String(printed) = printed else {
        panic!("expected a string");
    };
    assert_eq!(
        eval_all(&format!("(read-string {})", Value::string(&printed)), &env).unwrap(),
        eval_all(&format!("(read-string {})", Value::string(source)), &env).unwrap()
    );
}

#[test]
fn test_gensym_is_unique() {
    assert_eval!("(= (gensym) (gensym))", Value::Boolean(false));
    assert_eval!("(symbol? (gensym \"tmp\"))", Value::Boolean(true));
}

// =============================================================================
// References and metadata
// =============================================================================

#[test]
fn test_reference_cells() {
    assert_eval!("(let [a (atom 1)] (swap! a + 2) @a)", Value::Long(3));
    assert_eval!("(let [a (atom 1)] (compare-and-set! a 1 5) @a)", Value::Long(5));
    assert_eval!("(let [v (volatile! 1)] (vswap! v inc) @v)", Value::Long(2));
    assert_eval!("(let [t (thread-local 0)] (reset! t 9) @t)", Value::Long(9));
}

#[test]
fn test_metadata() {
    assert_eval!("(meta (with-meta [1] {:tag :v}))", Value::map([(kw("tag"), kw("v"))]));
    assert_eval!("(meta [1])", Value::Nil);
    assert_eval!("(= [1] (with-meta [1] {:a 1}))", Value::Boolean(true));
    assert_eval_err!("(with-meta 1 {:a 1})");
}

#[test]
fn test_type_and_predicates() {
    assert_eval!("(type 1)", kw("long"));
    assert_eval!("(type {})", kw("hash-map"));
    assert_eval!("(fn? inc)", Value::Boolean(true));
    assert_eval!("(fn? when)", Value::Boolean(false));
    assert_eval!("(macro? when)", Value::Boolean(true));
    assert_eval!("(bound? 'inc)", Value::Boolean(true));
    assert_eval!("(bound? 'no-such-thing)", Value::Boolean(false));
}

// =============================================================================
// The test module
// =============================================================================

#[test]
fn test_module_runs_registered_tests() {
    let env = new_env();
    let mut ctx = new_context(&env);
    load_module("test", &env, &mut ctx).unwrap();
    let summary = eval_all_in(
        "(deftest adds (assert= 4 (+ 2 2)))
         (deftest fails (assert= 5 (+ 2 2)))
         (deftest throws (assert-throws :arity-error (inc 1 2)))
         (run-tests)",
        &env,
        &mut ctx,
    )
    .unwrap();
    let pass = eval_all_in("(:pass (run-tests))", &env, &mut ctx).unwrap();
    assert_eq!(pass, Value::Long(2));
    let fail = summary.as_map().and_then(|m| m.get(&kw("fail")).cloned());
    assert_eq!(fail, Some(Value::Long(1)));
}

#[test]
fn test_core_module_is_reloadable() {
    let env = new_env();
    let mut ctx = new_context(&env);
    load_module(CORE_MODULE, &env, &mut ctx).unwrap();
    assert_eq!(eval_all("(when 1 2)", &env).unwrap(), Value::Long(2));
}
