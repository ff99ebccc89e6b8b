// sprig-core - Macro expansion
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Macro expansion outside the evaluator.
//!
//! The evaluator expands macro calls lazily as it meets them. This module
//! provides the explicit forms: [`macroexpand_1`], [`macroexpand`], and
//! [`macroexpand_all`], which rewrites a whole tree before evaluation when
//! upfront expansion is configured.
//!
//! `macroexpand_all` tracks the symbols bound by `let`, `loop`, `fn` and
//! `catch`, and leaves a call alone when its head is one of them. It never
//! descends into `quote`, and inside `quasiquote` only the `unquote` and
//! `splice-unquote` parts are code.

use std::sync::Arc;

use sprig_parser::{PMap, PSet, Value};

use crate::config::{STACK_GROW_SIZE, STACK_RED_ZONE};
use crate::context::Context;
use crate::destructure::pattern_symbols;
use crate::env::Env;
use crate::error::{Error, Result};
use crate::eval::{apply, is_special_form};

type Shadowed = im::HashSet<sprig_parser::Symbol>;

/// The macro a form calls, if it is a macro call not shadowed locally.
fn macro_call(form: &Value, env: &Env, ctx: &Context, shadowed: &Shadowed) -> Option<Value> {
    let Value::List(items, _) = form else {
        return None;
    };
    let Some(Value::Symbol(sym, _)) = items.front() else {
        return None;
    };
    if (!sym.has_namespace() && is_special_form(sym.name()))
        || shadowed.contains(sym)
        || env.is_local(sym)
    {
        return None;
    }
    let value = ctx.globals().resolve(sym, ctx.namespace())?.get();
    match &value {
        Value::Function(f) if f.is_macro() => Some(value),
        _ => None,
    }
}

fn invoke(form: &Value, mac: &Value, ctx: &mut Context) -> Result<Value> {
    let args: Vec<Value> = form
        .as_seq_slice()
        .map(|items| items.into_iter().skip(1).collect())
        .unwrap_or_default();
    let expanded = apply(ctx, mac, &args).map_err(|e| e.with_pos(form.source_pos()))?;
    tracing::trace!(form = %form, expansion = %expanded, "macro expanded");
    Ok(expanded)
}

/// Expand `form` once if it is a macro call. The flag reports whether an
/// expansion happened.
pub fn macroexpand_1(form: &Value, env: &Env, ctx: &mut Context) -> Result<(Value, bool)> {
    match macro_call(form, env, ctx, &Shadowed::new()) {
        Some(mac) => Ok((invoke(form, &mac, ctx)?, true)),
        None => Ok((form.clone(), false)),
    }
}

fn expand_node(form: &Value, env: &Env, ctx: &mut Context, shadowed: &Shadowed) -> Result<Value> {
    let max = ctx.globals().config().max_expansion_steps;
    let mut current = form.clone();
    let mut steps = 0usize;
    while let Some(mac) = macro_call(&current, env, ctx, shadowed) {
        steps += 1;
        if steps > max {
            return Err(Error::resource_exhausted(format!(
                "macro expansion did not terminate after {max} steps"
            ))
            .with_pos(form.source_pos()));
        }
        current = invoke(&current, &mac, ctx)?;
    }
    Ok(current)
}

/// Expand `form` until its head is no longer a macro.
pub fn macroexpand(form: &Value, env: &Env, ctx: &mut Context) -> Result<Value> {
    expand_node(form, env, ctx, &Shadowed::new())
}

/// Expand every macro call in `form`.
pub fn macroexpand_all(form: &Value, env: &Env, ctx: &mut Context) -> Result<Value> {
    Walker { env, ctx }.walk(form, &Shadowed::new())
}

struct Walker<'a> {
    env: &'a Env,
    ctx: &'a mut Context,
}

fn rebuild_list(items: Vec<Value>, template: &Value) -> Value {
    Value::List(Arc::new(items.into_iter().collect()), template.meta().cloned())
}

fn shadow(shadowed: &Shadowed, pattern: &Value) -> Shadowed {
    let mut out = shadowed.clone();
    for sym in pattern_symbols(pattern) {
        out.insert(sym);
    }
    out
}

impl Walker<'_> {
    fn walk(&mut self, form: &Value, shadowed: &Shadowed) -> Result<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.ctx.enter()?;
            let result = self.walk_inner(form, shadowed);
            self.ctx.leave();
            result
        })
    }

    fn walk_all(&mut self, forms: &[Value], shadowed: &Shadowed) -> Result<Vec<Value>> {
        forms.iter().map(|f| self.walk(f, shadowed)).collect()
    }

    fn walk_inner(&mut self, form: &Value, shadowed: &Shadowed) -> Result<Value> {
        let form = expand_node(form, self.env, self.ctx, shadowed)?;
        match &form {
            Value::List(items, _) if !items.is_empty() => {
                let items: Vec<Value> = items.iter().cloned().collect();
                let special = match &items[0] {
                    Value::Symbol(sym, _) if !sym.has_namespace() && !shadowed.contains(sym) => {
                        Some(sym.name())
                    }
                    _ => None,
                };
                let out = match special {
                    Some("quote") => return Ok(form.clone()),
                    Some("quasiquote") => {
                        let mut out = vec![items[0].clone()];
                        for item in &items[1..] {
                            out.push(self.walk_quasi(item, shadowed)?);
                        }
                        out
                    }
                    Some("let" | "loop") => self.walk_let(&items, shadowed)?,
                    Some("fn") => self.walk_fn(&items, 1, shadowed)?,
                    Some("defmacro") => {
                        let start = match items.get(2) {
                            Some(Value::String(_)) if items.len() > 3 => 3,
                            _ => 2,
                        };
                        let mut out = items[..start].to_vec();
                        out.extend(self.walk_fn_clauses(&items[start..], shadowed)?);
                        out
                    }
                    Some("try") => self.walk_try(&items, shadowed)?,
                    _ => self.walk_all(&items, shadowed)?,
                };
                Ok(rebuild_list(out, &form))
            }
            Value::Vector(items, meta) => {
                let items = self.walk_all(&items.to_vec(), shadowed)?;
                Ok(Value::vector(items).with_meta(meta.clone()))
            }
            Value::Map(map, meta) => {
                let mut pairs = Vec::with_capacity(map.len());
                for (k, v) in map.iter() {
                    pairs.push((self.walk(k, shadowed)?, self.walk(v, shadowed)?));
                }
                Ok(Value::Map(Arc::new(PMap::from_pairs(map.kind(), pairs)), meta.clone()))
            }
            Value::Set(set, meta) => {
                let values: Vec<Value> = set.iter().cloned().collect();
                let values = self.walk_all(&values, shadowed)?;
                Ok(Value::Set(Arc::new(PSet::from_values(set.kind(), values)), meta.clone()))
            }
            _ => Ok(form),
        }
    }

    fn walk_let(&mut self, items: &[Value], shadowed: &Shadowed) -> Result<Vec<Value>> {
        let Some(Value::Vector(bindings, meta)) = items.get(1) else {
            return self.walk_all(items, shadowed);
        };
        let mut scope = shadowed.clone();
        let mut walked = Vec::with_capacity(bindings.len());
        let bindings = bindings.to_vec();
        for pair in bindings.chunks(2) {
            walked.push(pair[0].clone());
            if let Some(init) = pair.get(1) {
                walked.push(self.walk(init, &scope)?);
            }
            scope = shadow(&scope, &pair[0]);
        }
        let mut out = vec![
            items[0].clone(),
            Value::vector(walked).with_meta(meta.clone()),
        ];
        out.extend(self.walk_all(&items[2..], &scope)?);
        Ok(out)
    }

    fn walk_fn(&mut self, items: &[Value], start: usize, shadowed: &Shadowed) -> Result<Vec<Value>> {
        let mut out = items[..start].to_vec();
        let mut rest = &items[start..];
        let mut scope = shadowed.clone();
        if let Some(name @ Value::Symbol(sym, _)) = rest.first() {
            scope.insert(sym.clone());
            out.push(name.clone());
            rest = &rest[1..];
        }
        out.extend(self.walk_fn_clauses(rest, &scope)?);
        Ok(out)
    }

    /// `[params] body...` or `([params] body...)...`.
    fn walk_fn_clauses(&mut self, clauses: &[Value], shadowed: &Shadowed) -> Result<Vec<Value>> {
        match clauses.first() {
            Some(params @ Value::Vector(..)) => {
                let scope = shadow(shadowed, params);
                let mut out = vec![params.clone()];
                out.extend(self.walk_all(&clauses[1..], &scope)?);
                Ok(out)
            }
            _ => clauses
                .iter()
                .map(|clause| match clause.as_seq_slice() {
                    Some(parts) if matches!(clause, Value::List(..)) && !parts.is_empty() => {
                        let scope = shadow(shadowed, &parts[0]);
                        let mut out = vec![parts[0].clone()];
                        out.extend(self.walk_all(&parts[1..], &scope)?);
                        Ok(rebuild_list(out, clause))
                    }
                    _ => Ok(clause.clone()),
                })
                .collect(),
        }
    }

    fn walk_try(&mut self, items: &[Value], shadowed: &Shadowed) -> Result<Vec<Value>> {
        let mut out = vec![items[0].clone()];
        for item in &items[1..] {
            let parts = match item {
                Value::List(..) => item.as_seq_slice().unwrap_or_default(),
                _ => Vec::new(),
            };
            let walked = match parts.first() {
                Some(head) if head.is_symbol_named("catch") && parts.len() >= 3 => {
                    let scope = shadow(shadowed, &parts[2]);
                    let mut clause = parts[..3].to_vec();
                    clause.extend(self.walk_all(&parts[3..], &scope)?);
                    rebuild_list(clause, item)
                }
                Some(head) if head.is_symbol_named("finally") => {
                    let mut clause = vec![head.clone()];
                    clause.extend(self.walk_all(&parts[1..], shadowed)?);
                    rebuild_list(clause, item)
                }
                _ => self.walk(item, shadowed)?,
            };
            out.push(walked);
        }
        Ok(out)
    }

    fn walk_quasi(&mut self, form: &Value, shadowed: &Shadowed) -> Result<Value> {
        match form {
            Value::List(items, _) if !items.is_empty() => {
                let items: Vec<Value> = items.iter().cloned().collect();
                if items.len() == 2
                    && (items[0].is_symbol_named("unquote")
                        || items[0].is_symbol_named("splice-unquote"))
                {
                    let code = self.walk(&items[1], shadowed)?;
                    return Ok(rebuild_list(vec![items[0].clone(), code], form));
                }
                let out = items
                    .iter()
                    .map(|item| self.walk_quasi(item, shadowed))
                    .collect::<Result<Vec<_>>>()?;
                Ok(rebuild_list(out, form))
            }
            Value::Vector(items, meta) => {
                let out = items
                    .iter()
                    .map(|item| self.walk_quasi(item, shadowed))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::vector(out).with_meta(meta.clone()))
            }
            Value::Map(map, meta) => {
                let mut pairs = Vec::with_capacity(map.len());
                for (k, v) in map.iter() {
                    pairs.push((self.walk_quasi(k, shadowed)?, self.walk_quasi(v, shadowed)?));
                }
                Ok(Value::Map(Arc::new(PMap::from_pairs(map.kind(), pairs)), meta.clone()))
            }
            _ => Ok(form.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::env::Globals;
    use crate::eval::eval;
    use sprig_parser::{read, read_all};

    fn setup(src: &str) -> (Env, Context) {
        let globals = Arc::new(Globals::new(Config::default()));
        crate::builtins::register_builtins(&globals);
        let env = Env::new(Arc::clone(&globals));
        let mut ctx = Context::new(globals);
        for form in read_all(src, "test").unwrap() {
            eval(&form, &env, &mut ctx).unwrap();
        }
        (env, ctx)
    }

    const UNLESS: &str = "(defmacro unless [c & body] (list 'if c nil (cons 'do body)))";

    #[test]
    fn test_expand_1() {
        let (env, mut ctx) = setup(UNLESS);
        let form = read("(unless false 1)", "test").unwrap();
        let (expanded, changed) = macroexpand_1(&form, &env, &mut ctx).unwrap();
        assert!(changed);
        assert_eq!(expanded, read("(if false nil (do 1))", "test").unwrap());
        let (same, changed) = macroexpand_1(&expanded, &env, &mut ctx).unwrap();
        assert!(!changed);
        assert_eq!(same, expanded);
    }

    #[test]
    fn test_expand_all_nested() {
        let (env, mut ctx) = setup(UNLESS);
        let form = read("[(unless a (unless b 2))]", "test").unwrap();
        let expanded = macroexpand_all(&form, &env, &mut ctx).unwrap();
        assert_eq!(
            expanded,
            read("[(if a nil (do (if b nil (do 2))))]", "test").unwrap()
        );
    }

    #[test]
    fn test_expand_all_respects_shadowing_and_quote() {
        let (env, mut ctx) = setup(UNLESS);
        let form = read("(let [unless list] (unless 1 2))", "test").unwrap();
        assert_eq!(macroexpand_all(&form, &env, &mut ctx).unwrap(), form);

        let form = read("(fn [unless] (unless 1))", "test").unwrap();
        assert_eq!(macroexpand_all(&form, &env, &mut ctx).unwrap(), form);

        let form = read("'(unless 1 2)", "test").unwrap();
        assert_eq!(macroexpand_all(&form, &env, &mut ctx).unwrap(), form);
    }

    #[test]
    fn test_expand_all_enters_unquote_only() {
        let (env, mut ctx) = setup(UNLESS);
        let form = read("`((unless a b) ~(unless c d))", "test").unwrap();
        let expanded = macroexpand_all(&form, &env, &mut ctx).unwrap();
        assert_eq!(
            expanded,
            read("`((unless a b) ~(if c nil (do d)))", "test").unwrap()
        );
    }

    #[test]
    fn test_runaway_expansion_is_bounded() {
        let (env, mut ctx) = setup("(defmacro forever [] '(forever))");
        let form = read("(forever)", "test").unwrap();
        let err = macroexpand(&form, &env, &mut ctx).unwrap_err();
        assert_eq!(err.kind().keyword_name(), "resource-exhausted");
    }
}
