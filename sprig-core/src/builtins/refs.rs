// sprig-core - Reference cell built-in functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Reference cells and futures: atom, reset!, swap!, compare-and-set!,
//! volatile!, thread-local, future-call and deref.

use std::sync::{Mutex, OnceLock, PoisonError};
use std::thread::JoinHandle;

use sprig_parser::{Atom, HostObject, ThreadLocal, Value, Volatile};

use crate::config::EVAL_STACK_SIZE;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::eval::apply;

// ============================================================================
// Atoms
// ============================================================================

/// (atom x) - Create an atom with initial value x
pub(crate) fn builtin_atom(args: &[Value]) -> Result<Value> {
    let [value] = args else {
        return Err(Error::arity_named("atom", 1, args.len()));
    };
    Ok(Value::Atom(Atom::new(value.clone())))
}

/// (reset! ref newval) - Set an atom or thread-local, returns newval
pub(crate) fn builtin_reset(args: &[Value]) -> Result<Value> {
    let [cell, value] = args else {
        return Err(Error::arity_named("reset!", 2, args.len()));
    };
    match cell {
        Value::Atom(a) => Ok(a.reset(value.clone())),
        Value::ThreadLocal(t) => Ok(t.reset(value.clone())),
        other => Err(Error::type_mismatch_in("reset!", "atom", other.type_name())),
    }
}

/// (swap! atom f & args) - Retries until the compare-and-set lands
pub(crate) fn builtin_swap(ctx: &mut Context, args: &[Value]) -> Result<Value> {
    if args.len() < 2 {
        return Err(Error::arity_at_least("swap!", 2, args.len()));
    }
    match &args[0] {
        Value::Atom(atom) => loop {
            let old = atom.deref();
            let mut call_args = vec![old.clone()];
            call_args.extend_from_slice(&args[2..]);
            let new = apply(ctx, &args[1], &call_args)?;
            if atom.compare_and_set(&old, new.clone()) {
                return Ok(new);
            }
        },
        Value::ThreadLocal(cell) => {
            let mut call_args = vec![cell.deref()];
            call_args.extend_from_slice(&args[2..]);
            let new = apply(ctx, &args[1], &call_args)?;
            Ok(cell.reset(new))
        }
        other => Err(Error::type_mismatch_in("swap!", "atom", other.type_name())),
    }
}

/// (compare-and-set! atom oldval newval) - CAS, returns true if successful
pub(crate) fn builtin_compare_and_set(args: &[Value]) -> Result<Value> {
    let [cell, old, new] = args else {
        return Err(Error::arity_named("compare-and-set!", 3, args.len()));
    };
    match cell {
        Value::Atom(a) => Ok(Value::Boolean(a.compare_and_set(old, new.clone()))),
        other => Err(Error::type_mismatch_in("compare-and-set!", "atom", other.type_name())),
    }
}

// ============================================================================
// Volatiles and thread-locals
// ============================================================================

/// (volatile! x)
pub(crate) fn builtin_volatile(args: &[Value]) -> Result<Value> {
    let [value] = args else {
        return Err(Error::arity_named("volatile!", 1, args.len()));
    };
    Ok(Value::Volatile(Volatile::new(value.clone())))
}

/// (vreset! vol newval)
pub(crate) fn builtin_vreset(args: &[Value]) -> Result<Value> {
    let [cell, value] = args else {
        return Err(Error::arity_named("vreset!", 2, args.len()));
    };
    match cell {
        Value::Volatile(v) => Ok(v.reset(value.clone())),
        other => Err(Error::type_mismatch_in("vreset!", "volatile", other.type_name())),
    }
}

/// (vswap! vol f & args)
pub(crate) fn builtin_vswap(ctx: &mut Context, args: &[Value]) -> Result<Value> {
    if args.len() < 2 {
        return Err(Error::arity_at_least("vswap!", 2, args.len()));
    }
    let Value::Volatile(cell) = &args[0] else {
        return Err(Error::type_mismatch_in("vswap!", "volatile", args[0].type_name()));
    };
    let mut call_args = vec![cell.deref()];
    call_args.extend_from_slice(&args[2..]);
    let new = apply(ctx, &args[1], &call_args)?;
    Ok(cell.reset(new))
}

/// (thread-local init) - A cell each thread sees separately, starting at init
pub(crate) fn builtin_thread_local(args: &[Value]) -> Result<Value> {
    let [init] = args else {
        return Err(Error::arity_named("thread-local", 1, args.len()));
    };
    Ok(Value::ThreadLocal(ThreadLocal::new(init.clone())))
}

// ============================================================================
// Futures
// ============================================================================

const FUTURE_TYPE: &str = "future";

/// A computation running on its own thread. The first deref joins it and
/// caches the outcome.
struct Future {
    handle: Mutex<Option<JoinHandle<Result<Value>>>>,
    outcome: OnceLock<Result<Value>>,
}

impl Future {
    fn join(&self) -> Result<Value> {
        if let Some(outcome) = self.outcome.get() {
            return outcome.clone();
        }
        let mut handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = handle.take() {
            let outcome = handle
                .join()
                .unwrap_or_else(|_| Err(Error::eval("future thread panicked")));
            let _ = self.outcome.set(outcome);
        }
        self.outcome
            .get()
            .cloned()
            .unwrap_or_else(|| Err(Error::eval("future result unavailable")))
    }

    fn is_done(&self) -> bool {
        if self.outcome.get().is_some() {
            return true;
        }
        self.handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_none_or(JoinHandle::is_finished)
    }
}

fn as_future(value: &Value) -> Option<&Future> {
    match value {
        Value::Host(obj) if obj.type_name() == FUTURE_TYPE => obj.downcast_ref::<Future>(),
        _ => None,
    }
}

/// (future-call f) - Run f on a fresh thread with a forked context
pub(crate) fn builtin_future_call(ctx: &mut Context, args: &[Value]) -> Result<Value> {
    let [func] = args else {
        return Err(Error::arity_named("future-call", 1, args.len()));
    };
    let func = func.clone();
    let mut forked = ctx.fork();
    let handle = std::thread::Builder::new()
        .name("sprig-future".to_string())
        .stack_size(EVAL_STACK_SIZE)
        .spawn(move || {
            tracing::debug!("future started");
            apply(&mut forked, &func, &[])
        })
        .map_err(|e| Error::eval(format!("Unable to start future: {e}")))?;
    Ok(Value::Host(HostObject::new(
        FUTURE_TYPE,
        Future {
            handle: Mutex::new(Some(handle)),
            outcome: OnceLock::new(),
        },
    )))
}

/// (future-done? f)
pub(crate) fn builtin_future_done_p(args: &[Value]) -> Result<Value> {
    let [value] = args else {
        return Err(Error::arity_named("future-done?", 1, args.len()));
    };
    match as_future(value) {
        Some(future) => Ok(Value::Boolean(future.is_done())),
        None => Err(Error::type_mismatch_in("future-done?", "future", value.type_name())),
    }
}

/// (future? x)
pub(crate) fn builtin_future_p(args: &[Value]) -> Result<Value> {
    let [value] = args else {
        return Err(Error::arity_named("future?", 1, args.len()));
    };
    Ok(Value::Boolean(as_future(value).is_some()))
}

// ============================================================================
// Deref
// ============================================================================

/// (deref ref) - Current value of a cell, or the result of a future
/// (blocking until it finishes). Errors raised inside the future surface
/// here.
pub(crate) fn builtin_deref(args: &[Value]) -> Result<Value> {
    let [cell] = args else {
        return Err(Error::arity_named("deref", 1, args.len()));
    };
    match cell {
        Value::Atom(a) => Ok(a.deref()),
        Value::Volatile(v) => Ok(v.deref()),
        Value::ThreadLocal(t) => Ok(t.deref()),
        other => match as_future(other) {
            Some(future) => future.join(),
            None => Err(Error::type_mismatch_in("deref", "reference", other.type_name())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atom_cas() {
        let atom = builtin_atom(&[Value::Long(1)]).unwrap();
        let swapped =
            builtin_compare_and_set(&[atom.clone(), Value::Long(1), Value::Long(2)]).unwrap();
        assert_eq!(swapped, Value::Boolean(true));
        let missed =
            builtin_compare_and_set(&[atom.clone(), Value::Long(1), Value::Long(3)]).unwrap();
        assert_eq!(missed, Value::Boolean(false));
        assert_eq!(builtin_deref(&[atom]).unwrap(), Value::Long(2));
    }

    #[test]
    fn test_thread_local_is_per_thread() {
        let cell = builtin_thread_local(&[Value::Long(0)]).unwrap();
        builtin_reset(&[cell.clone(), Value::Long(5)]).unwrap();
        let other = cell.clone();
        let seen = std::thread::spawn(move || builtin_deref(&[other]).unwrap())
            .join()
            .unwrap();
        assert_eq!(seen, Value::Long(0));
        assert_eq!(builtin_deref(&[cell]).unwrap(), Value::Long(5));
    }

    #[test]
    fn test_deref_rejects_plain_values() {
        assert!(builtin_deref(&[Value::Long(1)]).is_err());
    }
}
