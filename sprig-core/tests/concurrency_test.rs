// sprig-core - Concurrency integration tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Integration tests for the shared global table, thread-confined dynamic
//! bindings, futures, atoms and interruption.

mod common;

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use common::{
    EVAL_STACK_SIZE, Symbol, Value, eval_all, eval_all_in, kw, new_context, new_env,
};
use sprig_core::ErrorKind;

// =============================================================================
// Global table
// =============================================================================

#[test]
fn test_hundred_threads_define_unique_names() {
    let env = new_env();
    let before = env.globals().var_count();
    let barrier = Arc::new(Barrier::new(100));

    let handles: Vec<_> = (0..100)
        .map(|i| {
            let env = env.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                eval_all(&format!("(def var-{i} {i})"), &env)
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    assert_eq!(env.globals().var_count(), before + 100);
    for i in 0..100 {
        let var = env.globals().get_var(&Symbol::new(&format!("var-{i}")));
        assert_eq!(var.map(|v| v.get()), Some(Value::Long(i)));
    }
}

#[test]
fn test_concurrent_swap_loses_no_updates() {
    let env = new_env();
    eval_all("(def counter (atom 0))", &env).unwrap();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let env = env.clone();
            thread::spawn(move || eval_all("(dotimes [i 250] (swap! counter inc))", &env))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }
    assert_eq!(eval_all("@counter", &env).unwrap(), Value::Long(2000));
}

// =============================================================================
// Dynamic vars
// =============================================================================

#[test]
fn test_dynamic_binding_is_thread_confined() {
    let env = new_env();
    eval_all("(def-dynamic *who* :root)", &env).unwrap();
    let inside = Arc::new(Barrier::new(2));
    let checked = Arc::new(Barrier::new(2));

    let binder = {
        let env = env.clone();
        let inside = Arc::clone(&inside);
        let checked = Arc::clone(&checked);
        thread::spawn(move || {
            let var = env.globals().get_var(&Symbol::new("*who*")).unwrap();
            var.push_dynamic(kw("binder")).unwrap();
            inside.wait();
            checked.wait();
            let seen = var.peek_dynamic().unwrap();
            var.pop_dynamic().unwrap();
            seen
        })
    };

    inside.wait();
    assert_eq!(eval_all("*who*", &env).unwrap(), kw("root"));
    checked.wait();
    assert_eq!(binder.join().unwrap(), kw("binder"));
    assert_eq!(eval_all("*who*", &env).unwrap(), kw("root"));
}

#[test]
fn test_binding_form_does_not_leak_into_futures() {
    let env = new_env();
    eval_all("(def-dynamic *mode* :outer)", &env).unwrap();
    let result = eval_all("(binding [*mode* :inner] [*mode* @(future *mode*)])", &env).unwrap();
    assert_eq!(result, Value::vector(vec![kw("inner"), kw("outer")]));
}

// =============================================================================
// Futures
// =============================================================================

#[test]
fn test_future_deref() {
    assert_eval!("@(future (+ 1 2))", Value::Long(3));
    assert_eval!("(deref (future-call (fn [] :done)))", kw("done"));
    assert_eval!("(future? (future 1))", Value::Boolean(true));
    assert_eval!(
        "(let [f (future 1)] @f (future-done? f))",
        Value::Boolean(true)
    );
}

#[test]
fn test_future_error_surfaces_on_deref() {
    assert_eval_err_contains!("@(future (throw :in-future))", ":in-future");
    assert_eval!(
        "(let [f (future (inc 1 2))] (try @f (catch :arity-error e :caught)))",
        kw("caught")
    );
}

#[test]
fn test_futures_share_globals() {
    let env = new_env();
    let result = eval_all(
        "(def total (atom 0))
         (let [fs (mapv (fn [n] (future (swap! total + n))) (range 10))]
           (run! deref fs)
           @total)",
        &env,
    )
    .unwrap();
    assert_eq!(result, Value::Long(45));
}

// =============================================================================
// Interruption
// =============================================================================

#[test]
fn test_interrupt_stops_infinite_loop() {
    let env = new_env();
    let mut ctx = new_context(&env);
    let handle = ctx.interrupt_handle();

    let worker = thread::Builder::new()
        .stack_size(EVAL_STACK_SIZE)
        .spawn(move || eval_all_in("(loop [n 0] (recur (inc n)))", &env, &mut ctx))
        .unwrap();
    thread::sleep(Duration::from_millis(50));
    handle.interrupt();

    let err = worker.join().unwrap().unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Interrupted));
}

#[test]
fn test_interrupt_is_not_caught() {
    let env = new_env();
    eval_all("(defn spin [] (spin))", &env).unwrap();
    let mut ctx = new_context(&env);
    let handle = ctx.interrupt_handle();

    let worker = thread::spawn(move || {
        eval_all_in("(try (spin) (catch :default e :swallowed))", &env, &mut ctx)
    });
    thread::sleep(Duration::from_millis(50));
    handle.interrupt();

    let err = worker.join().unwrap().unwrap_err();
    assert!(err.is_interrupted());
}

#[test]
fn test_interrupt_leaves_definitions_whole() {
    let env = new_env();
    let mut ctx = new_context(&env);
    ctx.interrupt_handle().interrupt();
    assert!(eval_all_in("(def half (inc 1))", &env, &mut ctx).is_err());
    assert!(env.globals().get_var(&Symbol::new("half")).is_none());

    ctx.interrupt_handle().clear();
    assert_eq!(
        eval_all_in("(def half (inc 1)) half", &env, &mut ctx).unwrap(),
        Value::Long(2)
    );
}
