// sprig-core - Higher-order built-in functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Higher-order functions: apply, map, filter, reduce, comp, partial, etc.
//!
//! These call back into the evaluator, so they take the calling context.
//! Sequence results are eager lists.

use std::cmp::Ordering;

use sprig_parser::Value;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::eval::{apply, make_native_fn};

use super::collections::{assoc1, conj1, items_of, lookup};

fn at_least(op: &str, args: &[Value], n: usize) -> Result<()> {
    if args.len() < n {
        return Err(Error::arity_at_least(op, n, args.len()));
    }
    Ok(())
}

// ============================================================================
// Application
// ============================================================================

/// (apply f a b ... args)
pub(crate) fn builtin_apply(ctx: &mut Context, args: &[Value]) -> Result<Value> {
    at_least("apply", args, 2)?;
    let (func, rest) = (&args[0], &args[1..]);
    let Some((spread, fixed)) = rest.split_last() else {
        return apply(ctx, func, &[]);
    };
    let mut all = fixed.to_vec();
    all.extend(items_of("apply", spread)?);
    apply(ctx, func, &all)
}

/// (identity x)
pub(crate) fn builtin_identity(args: &[Value]) -> Result<Value> {
    match args {
        [x] => Ok(x.clone()),
        _ => Err(Error::arity_named("identity", 1, args.len())),
    }
}

/// (partial f & args)
pub(crate) fn builtin_partial(args: &[Value]) -> Result<Value> {
    at_least("partial", args, 1)?;
    let func = args[0].clone();
    let bound = args[1..].to_vec();
    Ok(make_native_fn("partial", move |ctx, more| {
        let mut all = bound.clone();
        all.extend_from_slice(more);
        apply(ctx, &func, &all)
    })
    .into_value())
}

/// (comp & fs) - right-to-left composition
pub(crate) fn builtin_comp(args: &[Value]) -> Result<Value> {
    let fns = args.to_vec();
    Ok(make_native_fn("comp", move |ctx, call_args| {
        let Some((innermost, outer)) = fns.split_last() else {
            return match call_args {
                [x] => Ok(x.clone()),
                _ => Err(Error::arity_named("comp", 1, call_args.len())),
            };
        };
        let mut value = apply(ctx, innermost, call_args)?;
        for f in outer.iter().rev() {
            value = apply(ctx, f, &[value])?;
        }
        Ok(value)
    })
    .into_value())
}

/// (complement f)
pub(crate) fn builtin_complement(args: &[Value]) -> Result<Value> {
    let [func] = args else {
        return Err(Error::arity_named("complement", 1, args.len()));
    };
    let func = func.clone();
    Ok(make_native_fn("complement", move |ctx, call_args| {
        Ok(Value::Boolean(!apply(ctx, &func, call_args)?.is_truthy()))
    })
    .into_value())
}

/// (constantly x)
pub(crate) fn builtin_constantly(args: &[Value]) -> Result<Value> {
    let [value] = args else {
        return Err(Error::arity_named("constantly", 1, args.len()));
    };
    let value = value.clone();
    Ok(make_native_fn("constantly", move |_, _| Ok(value.clone())).into_value())
}

/// (juxt & fs)
pub(crate) fn builtin_juxt(args: &[Value]) -> Result<Value> {
    at_least("juxt", args, 1)?;
    let fns = args.to_vec();
    Ok(make_native_fn("juxt", move |ctx, call_args| {
        let results = fns
            .iter()
            .map(|f| apply(ctx, f, call_args))
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::vector(results))
    })
    .into_value())
}

// ============================================================================
// Sequence functions
// ============================================================================

fn map_items(ctx: &mut Context, op: &str, args: &[Value]) -> Result<Vec<Value>> {
    at_least(op, args, 2)?;
    let func = &args[0];
    if let [coll] = &args[1..] {
        return items_of(op, coll)?
            .into_iter()
            .map(|item| apply(ctx, func, &[item]))
            .collect();
    }
    let colls = args[1..]
        .iter()
        .map(|c| items_of(op, c))
        .collect::<Result<Vec<_>>>()?;
    let len = colls.iter().map(Vec::len).min().unwrap_or(0);
    (0..len)
        .map(|i| {
            let row: Vec<Value> = colls.iter().map(|c| c[i].clone()).collect();
            apply(ctx, func, &row)
        })
        .collect()
}

/// (map f coll & colls)
pub(crate) fn builtin_map(ctx: &mut Context, args: &[Value]) -> Result<Value> {
    Ok(Value::list(map_items(ctx, "map", args)?))
}

/// (mapv f coll & colls)
pub(crate) fn builtin_mapv(ctx: &mut Context, args: &[Value]) -> Result<Value> {
    Ok(Value::vector(map_items(ctx, "mapv", args)?))
}

/// (mapcat f coll & colls)
pub(crate) fn builtin_mapcat(ctx: &mut Context, args: &[Value]) -> Result<Value> {
    let mut out = Vec::new();
    for part in map_items(ctx, "mapcat", args)? {
        out.extend(items_of("mapcat", &part)?);
    }
    Ok(Value::list(out))
}

fn filter_items(ctx: &mut Context, op: &str, args: &[Value], keep: bool) -> Result<Value> {
    let [pred, coll] = args else {
        return Err(Error::arity_named(op, 2, args.len()));
    };
    let mut out = Vec::new();
    for item in items_of(op, coll)? {
        if apply(ctx, pred, std::slice::from_ref(&item))?.is_truthy() == keep {
            out.push(item);
        }
    }
    Ok(Value::list(out))
}

/// (filter pred coll)
pub(crate) fn builtin_filter(ctx: &mut Context, args: &[Value]) -> Result<Value> {
    filter_items(ctx, "filter", args, true)
}

/// (remove pred coll)
pub(crate) fn builtin_remove(ctx: &mut Context, args: &[Value]) -> Result<Value> {
    filter_items(ctx, "remove", args, false)
}

/// (keep f coll) - non-nil results of f
pub(crate) fn builtin_keep(ctx: &mut Context, args: &[Value]) -> Result<Value> {
    let [func, coll] = args else {
        return Err(Error::arity_named("keep", 2, args.len()));
    };
    let mut out = Vec::new();
    for item in items_of("keep", coll)? {
        let result = apply(ctx, func, &[item])?;
        if !result.is_nil() {
            out.push(result);
        }
    }
    Ok(Value::list(out))
}

/// (take-while pred coll)
pub(crate) fn builtin_take_while(ctx: &mut Context, args: &[Value]) -> Result<Value> {
    let [pred, coll] = args else {
        return Err(Error::arity_named("take-while", 2, args.len()));
    };
    let mut out = Vec::new();
    for item in items_of("take-while", coll)? {
        if !apply(ctx, pred, std::slice::from_ref(&item))?.is_truthy() {
            break;
        }
        out.push(item);
    }
    Ok(Value::list(out))
}

/// (drop-while pred coll)
pub(crate) fn builtin_drop_while(ctx: &mut Context, args: &[Value]) -> Result<Value> {
    let [pred, coll] = args else {
        return Err(Error::arity_named("drop-while", 2, args.len()));
    };
    let items = items_of("drop-while", coll)?;
    let mut start = items.len();
    for (i, item) in items.iter().enumerate() {
        if !apply(ctx, pred, std::slice::from_ref(item))?.is_truthy() {
            start = i;
            break;
        }
    }
    Ok(Value::list(items[start..].to_vec()))
}

/// (reduce f coll) or (reduce f init coll)
pub(crate) fn builtin_reduce(ctx: &mut Context, args: &[Value]) -> Result<Value> {
    let (func, init, coll) = match args {
        [func, coll] => (func, None, coll),
        [func, init, coll] => (func, Some(init.clone()), coll),
        _ => return Err(Error::arity_range("reduce", 2, 3, args.len())),
    };
    let mut items = items_of("reduce", coll)?.into_iter();
    let mut acc = match init.or_else(|| items.next()) {
        Some(acc) => acc,
        None => return apply(ctx, func, &[]),
    };
    for item in items {
        acc = apply(ctx, func, &[acc, item])?;
    }
    Ok(acc)
}

/// (reduce-kv f init map)
pub(crate) fn builtin_reduce_kv(ctx: &mut Context, args: &[Value]) -> Result<Value> {
    let [func, init, coll] = args else {
        return Err(Error::arity_named("reduce-kv", 3, args.len()));
    };
    let mut acc = init.clone();
    match coll {
        Value::Map(map, _) => {
            for (k, v) in map.iter() {
                acc = apply(ctx, func, &[acc, k.clone(), v.clone()])?;
            }
        }
        Value::Nil => {}
        other => return Err(Error::type_mismatch_in("reduce-kv", "map", other.type_name())),
    }
    Ok(acc)
}

/// (every? pred coll)
pub(crate) fn builtin_every_p(ctx: &mut Context, args: &[Value]) -> Result<Value> {
    let [pred, coll] = args else {
        return Err(Error::arity_named("every?", 2, args.len()));
    };
    for item in items_of("every?", coll)? {
        if !apply(ctx, pred, &[item])?.is_truthy() {
            return Ok(Value::Boolean(false));
        }
    }
    Ok(Value::Boolean(true))
}

/// (some pred coll) - first truthy result of pred
pub(crate) fn builtin_some(ctx: &mut Context, args: &[Value]) -> Result<Value> {
    let [pred, coll] = args else {
        return Err(Error::arity_named("some", 2, args.len()));
    };
    for item in items_of("some", coll)? {
        let result = apply(ctx, pred, &[item])?;
        if result.is_truthy() {
            return Ok(result);
        }
    }
    Ok(Value::Nil)
}

/// (run! f coll) - for side effects
pub(crate) fn builtin_run(ctx: &mut Context, args: &[Value]) -> Result<Value> {
    let [func, coll] = args else {
        return Err(Error::arity_named("run!", 2, args.len()));
    };
    for item in items_of("run!", coll)? {
        apply(ctx, func, &[item])?;
    }
    Ok(Value::Nil)
}

/// (group-by f coll)
pub(crate) fn builtin_group_by(ctx: &mut Context, args: &[Value]) -> Result<Value> {
    let [func, coll] = args else {
        return Err(Error::arity_named("group-by", 2, args.len()));
    };
    let mut groups = Value::map([]);
    for item in items_of("group-by", coll)? {
        let key = apply(ctx, func, std::slice::from_ref(&item))?;
        let group = lookup(&groups, &key).unwrap_or_else(|| Value::vector(Vec::new()));
        groups = assoc1(groups, key, conj1(group, item)?)?;
    }
    Ok(groups)
}

// ============================================================================
// Sorting
// ============================================================================

/// Ordering from a comparator result: a number's sign, or a boolean "less
/// than" answer.
fn comparator_order(ctx: &mut Context, cmp: &Value, a: &Value, b: &Value) -> Result<Ordering> {
    match apply(ctx, cmp, &[a.clone(), b.clone()])? {
        Value::Long(n) => Ok(n.cmp(&0)),
        Value::Double(d) => Ok(d.partial_cmp(&0.0).unwrap_or(Ordering::Equal)),
        Value::Boolean(true) => Ok(Ordering::Less),
        Value::Boolean(false) | Value::Nil => {
            if apply(ctx, cmp, &[b.clone(), a.clone()])?.is_truthy() {
                Ok(Ordering::Greater)
            } else {
                Ok(Ordering::Equal)
            }
        }
        other => Err(Error::type_mismatch_in("comparator", "number or boolean", other.type_name())),
    }
}

fn sort_keyed(
    ctx: &mut Context,
    mut keyed: Vec<(Value, Value)>,
    cmp: Option<&Value>,
) -> Result<Value> {
    let mut failure = None;
    keyed.sort_by(|(ka, _), (kb, _)| {
        if failure.is_some() {
            return Ordering::Equal;
        }
        match cmp {
            None => ka.cmp(kb),
            Some(cmp) => comparator_order(ctx, cmp, ka, kb).unwrap_or_else(|e| {
                failure = Some(e);
                Ordering::Equal
            }),
        }
    });
    match failure {
        Some(e) => Err(e),
        None => Ok(Value::list(keyed.into_iter().map(|(_, v)| v).collect())),
    }
}

/// (sort coll) or (sort comparator coll) - stable
pub(crate) fn builtin_sort(ctx: &mut Context, args: &[Value]) -> Result<Value> {
    let (cmp, coll) = match args {
        [coll] => (None, coll),
        [cmp, coll] => (Some(cmp), coll),
        _ => return Err(Error::arity_range("sort", 1, 2, args.len())),
    };
    let keyed = items_of("sort", coll)?
        .into_iter()
        .map(|v| (v.clone(), v))
        .collect();
    sort_keyed(ctx, keyed, cmp)
}

/// (sort-by keyfn coll) or (sort-by keyfn comparator coll)
pub(crate) fn builtin_sort_by(ctx: &mut Context, args: &[Value]) -> Result<Value> {
    let (keyfn, cmp, coll) = match args {
        [keyfn, coll] => (keyfn, None, coll),
        [keyfn, cmp, coll] => (keyfn, Some(cmp), coll),
        _ => return Err(Error::arity_range("sort-by", 2, 3, args.len())),
    };
    let keyed = items_of("sort-by", coll)?
        .into_iter()
        .map(|v| Ok((apply(ctx, keyfn, std::slice::from_ref(&v))?, v)))
        .collect::<Result<Vec<_>>>()?;
    sort_keyed(ctx, keyed, cmp)
}

// ============================================================================
// Associative updates
// ============================================================================

/// (update m k f & args)
pub(crate) fn builtin_update(ctx: &mut Context, args: &[Value]) -> Result<Value> {
    at_least("update", args, 3)?;
    let (coll, key, func) = (&args[0], &args[1], &args[2]);
    let mut call_args = vec![lookup(coll, key).unwrap_or(Value::Nil)];
    call_args.extend_from_slice(&args[3..]);
    let value = apply(ctx, func, &call_args)?;
    assoc1(coll.clone(), key.clone(), value)
}

fn update_path(
    ctx: &mut Context,
    coll: &Value,
    path: &[Value],
    func: &Value,
    extra: &[Value],
) -> Result<Value> {
    let Some((key, rest)) = path.split_first() else {
        let mut call_args = vec![coll.clone()];
        call_args.extend_from_slice(extra);
        return apply(ctx, func, &call_args);
    };
    let inner = lookup(coll, key).unwrap_or(Value::Nil);
    let updated = update_path(ctx, &inner, rest, func, extra)?;
    assoc1(coll.clone(), key.clone(), updated)
}

/// (update-in m [k & ks] f & args)
pub(crate) fn builtin_update_in(ctx: &mut Context, args: &[Value]) -> Result<Value> {
    at_least("update-in", args, 3)?;
    let path = items_of("update-in", &args[1])?;
    if path.is_empty() {
        return Err(Error::eval("update-in requires a non-empty key path"));
    }
    update_path(ctx, &args[0], &path, &args[2], &args[3..])
}

/// (assoc-in m [k & ks] v)
pub(crate) fn builtin_assoc_in(args: &[Value]) -> Result<Value> {
    let [coll, path, value] = args else {
        return Err(Error::arity_named("assoc-in", 3, args.len()));
    };
    fn go(coll: &Value, path: &[Value], value: &Value) -> Result<Value> {
        match path {
            [] => Ok(value.clone()),
            [key, rest @ ..] => {
                let inner = lookup(coll, key).unwrap_or(Value::Nil);
                assoc1(coll.clone(), key.clone(), go(&inner, rest, value)?)
            }
        }
    }
    let path = items_of("assoc-in", path)?;
    if path.is_empty() {
        return Err(Error::eval("assoc-in requires a non-empty key path"));
    }
    go(coll, &path, value)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::builtins::register_builtins;
    use crate::config::Config;
    use crate::env::Globals;

    fn ctx() -> Context {
        let globals = Arc::new(Globals::new(Config::default()));
        register_builtins(&globals);
        Context::new(globals)
    }

    fn global(ctx: &Context, name: &str) -> Value {
        ctx.globals()
            .get_var(&sprig_parser::Symbol::new(name))
            .map(|v| v.get())
            .unwrap_or(Value::Nil)
    }

    fn longs(ns: &[i64]) -> Value {
        Value::list(ns.iter().map(|n| Value::Long(*n)).collect())
    }

    #[test]
    fn test_map_filter_reduce() {
        let mut ctx = ctx();
        let inc = global(&ctx, "inc");
        let odd = global(&ctx, "odd?");
        let add = global(&ctx, "+");
        let mapped = builtin_map(&mut ctx, &[inc, longs(&[1, 2, 3])]).unwrap();
        assert_eq!(mapped, longs(&[2, 3, 4]));
        let odds = builtin_filter(&mut ctx, &[odd, longs(&[1, 2, 3])]).unwrap();
        assert_eq!(odds, longs(&[1, 3]));
        let sum = builtin_reduce(&mut ctx, &[add.clone(), longs(&[1, 2, 3])]).unwrap();
        assert_eq!(sum, Value::Long(6));
        let empty = builtin_reduce(&mut ctx, &[add, longs(&[])]).unwrap();
        assert_eq!(empty, Value::Long(0));
    }

    #[test]
    fn test_map_stops_at_shortest() {
        let mut ctx = ctx();
        let add = global(&ctx, "+");
        let mapped = builtin_map(&mut ctx, &[add, longs(&[1, 2, 3]), longs(&[10, 20])]).unwrap();
        assert_eq!(mapped, longs(&[11, 22]));
    }

    #[test]
    fn test_partial_and_comp() {
        let mut ctx = ctx();
        let add = global(&ctx, "+");
        let inc = global(&ctx, "inc");
        let add10 = builtin_partial(&[add, Value::Long(10)]).unwrap();
        assert_eq!(apply(&mut ctx, &add10, &[Value::Long(1)]).unwrap(), Value::Long(11));
        let composed = builtin_comp(&[inc, add10]).unwrap();
        assert_eq!(apply(&mut ctx, &composed, &[Value::Long(1)]).unwrap(), Value::Long(12));
    }

    #[test]
    fn test_sort_with_comparator() {
        let mut ctx = ctx();
        let gt = global(&ctx, ">");
        let sorted = builtin_sort(&mut ctx, &[longs(&[3, 1, 2])]).unwrap();
        assert_eq!(sorted, longs(&[1, 2, 3]));
        let desc = builtin_sort(&mut ctx, &[gt, longs(&[3, 1, 2])]).unwrap();
        assert_eq!(desc, longs(&[3, 2, 1]));
    }

    #[test]
    fn test_sort_propagates_comparator_error() {
        let mut ctx = ctx();
        let lt = global(&ctx, "<");
        let mixed = Value::list(vec![Value::Long(1), Value::string("a")]);
        assert!(builtin_sort(&mut ctx, &[lt, mixed]).is_err());
    }

    #[test]
    fn test_update_in() {
        let mut ctx = ctx();
        let inc = global(&ctx, "inc");
        let inner = Value::map([(Value::keyword("b"), Value::Long(1))]);
        let m = Value::map([(Value::keyword("a"), inner)]);
        let path = Value::vector(vec![Value::keyword("a"), Value::keyword("b")]);
        let updated = builtin_update_in(&mut ctx, &[m, path.clone(), inc]).unwrap();
        let got = super::super::collections::builtin_get_in(&[updated, path]).unwrap();
        assert_eq!(got, Value::Long(2));
    }
}
