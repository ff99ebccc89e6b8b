// sprig-core - Host bridge and debugger integration tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Integration tests for the two embedder-implemented boundaries: the
//! `.`/`import` forms against a fake [`HostBridge`], and the call hooks of
//! an installed [`Debugger`].

mod common;

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use common::{Config, Globals, Symbol, Value, env_from_globals, eval_all, kw, new_env};
use sprig_core::{
    CallEvent, Debugger, HostBridge, HostResult, HostTarget, HostValue, InvocationError,
    InvocationErrorKind,
};
use sprig_parser::HostObject;

// =============================================================================
// Fake host
// =============================================================================

/// A tiny object system: `demo.Counter` instances with an `add` method and
/// a `value` field, and a `demo.Math` class with statics.
struct FakeHost;

fn counter(target: &HostTarget) -> Option<&AtomicI64> {
    match target {
        HostTarget::Instance(obj) => obj.downcast_ref::<AtomicI64>(),
        HostTarget::Class(_) => None,
    }
}

fn class_name(target: &HostTarget) -> &str {
    match target {
        HostTarget::Class(name) => name,
        HostTarget::Instance(obj) => obj.type_name(),
    }
}

impl HostBridge for FakeHost {
    fn invoke_constructor(&self, class: &HostTarget, args: &[HostValue]) -> HostResult {
        match (class_name(class), args) {
            ("demo.Counter", []) => Ok(HostValue::Object(HostObject::new(
                "demo.Counter",
                AtomicI64::new(0),
            ))),
            ("demo.Counter", [HostValue::Long(start)]) => Ok(HostValue::Object(
                HostObject::new("demo.Counter", AtomicI64::new(*start)),
            )),
            _ => Err(InvocationError::no_such_member(class, "new")),
        }
    }

    fn invoke_static_method(
        &self,
        class: &HostTarget,
        method: &str,
        args: &[HostValue],
    ) -> HostResult {
        match (class_name(class), method, args) {
            ("demo.Math", "square", [HostValue::Long(n)]) => Ok(HostValue::Long(n * n)),
            ("demo.Math", "answer", []) => Ok(HostValue::Long(42)),
            ("demo.Math", "range", [HostValue::Long(n)]) => {
                Ok(HostValue::List((0..*n).map(HostValue::Long).collect()))
            }
            ("demo.Math", "exit", _) => Err(InvocationError::new(
                InvocationErrorKind::Denied,
                class,
                method,
                "not allowed here",
            )),
            _ => Err(InvocationError::no_such_member(class, method)),
        }
    }

    fn invoke_instance_method(
        &self,
        instance: &HostTarget,
        method: &str,
        args: &[HostValue],
    ) -> HostResult {
        match (counter(instance), method, args) {
            (Some(count), "add", [HostValue::Long(n)]) => {
                Ok(HostValue::Long(count.fetch_add(*n, Ordering::SeqCst) + n))
            }
            _ => Err(InvocationError::no_such_member(instance, method)),
        }
    }

    fn get_static_field(&self, class: &HostTarget, field: &str) -> HostResult {
        match (class_name(class), field) {
            ("demo.Math", "SCALE") => Ok(HostValue::Double(2.5)),
            _ => Err(InvocationError::no_such_member(class, field)),
        }
    }

    fn get_instance_field(&self, instance: &HostTarget, field: &str) -> HostResult {
        match (counter(instance), field) {
            (Some(count), "value") => Ok(HostValue::Long(count.load(Ordering::SeqCst))),
            _ => Err(InvocationError::no_such_member(instance, field)),
        }
    }
}

fn host_env() -> common::Env {
    env_from_globals(Globals::new(Config::default()).with_host(Arc::new(FakeHost)))
}

// =============================================================================
// Host bridge
// =============================================================================

#[test]
fn test_static_members() {
    let env = host_env();
    assert_eq!(eval_all("(. demo.Math :square 7)", &env).unwrap(), Value::Long(49));
    assert_eq!(eval_all("(. demo.Math :SCALE)", &env).unwrap(), Value::Double(2.5));
    assert_eq!(eval_all("(. \"demo.Math\" :SCALE)", &env).unwrap(), Value::Double(2.5));
    assert_eq!(
        eval_all("(. demo.Math :range 3)", &env).unwrap(),
        Value::vector(vec![Value::Long(0), Value::Long(1), Value::Long(2)])
    );
}

#[test]
fn test_field_falls_back_to_zero_arg_method() {
    let env = host_env();
    assert_eq!(eval_all("(. demo.Math :answer)", &env).unwrap(), Value::Long(42));
}

#[test]
fn test_import_binds_simple_name() {
    let env = host_env();
    assert_eq!(
        eval_all("(import :demo.Math) (. Math :square 4)", &env).unwrap(),
        Value::Long(16)
    );
}

#[test]
fn test_instances() {
    let env = host_env();
    let result = eval_all(
        "(import :demo.Counter)
         (def c (. Counter :new 10))
         (. c :add 5)
         (. c :add 2)
         [(. c :value) (host? c) (type c)]",
        &env,
    )
    .unwrap();
    assert_eq!(
        result,
        Value::vector(vec![Value::Long(17), Value::Boolean(true), kw("demo.Counter")])
    );
}

#[test]
fn test_invocation_errors() {
    let env = host_env();
    let err = eval_all("(. demo.Math :cube 2)", &env).unwrap_err();
    assert!(err.contains("no such member"), "{err}");
    let err = eval_all("(. demo.Math :exit 1)", &env).unwrap_err();
    assert!(err.contains("not allowed here"), "{err}");
    assert_eq!(
        eval_all("(try (. demo.Math :cube 2) (catch :invocation-error e :refused))", &env)
            .unwrap(),
        kw("refused")
    );
}

#[test]
fn test_no_bridge_installed() {
    let env = new_env();
    let err = eval_all("(. demo.Math :square 2)", &env).unwrap_err();
    assert!(err.contains("no host bridge installed"), "{err}");
}

// =============================================================================
// Debugger
// =============================================================================

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Recorder {
    fn record(&self, hook: &str, event: &CallEvent<'_>) {
        let mut line = format!("{hook} {}", event.function.display_name());
        if let Some(env) = event.env
            && let Some(x) = env.lookup_local(&Symbol::new("x"))
        {
            line.push_str(&format!(" x={x}"));
        }
        if let Some(result) = event.result {
            line.push_str(&format!(" => {result}"));
        }
        if event.error.is_some() {
            line.push_str(" !");
        }
        self.events.lock().unwrap().push(line);
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl Debugger for Recorder {
    fn on_call(&self, event: &CallEvent<'_>) {
        self.record("call", event);
    }

    fn on_entry(&self, event: &CallEvent<'_>) {
        self.record("entry", event);
    }

    fn on_exit(&self, event: &CallEvent<'_>) {
        self.record("exit", event);
    }

    fn on_exception(&self, event: &CallEvent<'_>) {
        self.record("exception", event);
    }
}

fn debug_env() -> (common::Env, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let globals = Globals::new(Config::default())
        .with_debugger(Arc::clone(&recorder) as Arc<dyn Debugger>);
    (env_from_globals(globals), recorder)
}

#[test]
fn test_debugger_sees_call_entry_exit() {
    let (env, recorder) = debug_env();
    eval_all("(defn sq [x] (* x x))", &env).unwrap();
    recorder.take();
    assert_eq!(eval_all("(sq 3)", &env).unwrap(), Value::Long(9));
    assert_eq!(
        recorder.take(),
        vec![
            "call sq",
            "entry sq x=3",
            "call *",
            "entry *",
            "exit * => 9",
            "exit sq => 9",
        ]
    );
}

#[test]
fn test_debugger_sees_exception() {
    let (env, recorder) = debug_env();
    eval_all("(defn fail [x] (throw :bad))", &env).unwrap();
    recorder.take();
    assert!(eval_all("(fail 1)", &env).is_err());
    assert_eq!(
        recorder.take(),
        vec!["call fail", "entry fail x=1", "exception fail !"]
    );
}

#[test]
fn test_tail_replaced_frame_gets_no_exit() {
    let (env, recorder) = debug_env();
    eval_all("(defn second-step [] 2) (defn first-step [] (second-step))", &env).unwrap();
    recorder.take();
    eval_all("(first-step)", &env).unwrap();
    assert_eq!(
        recorder.take(),
        vec![
            "call first-step",
            "entry first-step",
            "call second-step",
            "entry second-step",
            "exit second-step => 2",
        ]
    );
}
