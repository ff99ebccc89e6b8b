// sprig-core - Quasiquote
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Syntax-quote templates.
//!
//! `(quasiquote form)` copies `form`, evaluating `(unquote x)` and splicing
//! the items of `(splice-unquote xs)` into the enclosing list or vector.
//! Symbols ending in `#` are replaced by one fresh gensym per name for the
//! whole template.

use std::collections::HashMap;
use std::sync::Arc;

use sprig_parser::{PMap, PSet, Symbol, Value};

use crate::context::Context;
use crate::env::Env;
use crate::error::{Error, Result};
use crate::eval::{Step, eval};

/// (quasiquote form)
pub(crate) fn eval_quasiquote(args: &[Value], env: &Env, ctx: &mut Context) -> Result<Step> {
    if args.len() != 1 {
        return Err(Error::syntax("quasiquote", "requires exactly one argument"));
    }
    let mut gensyms = HashMap::new();
    let mut template = Template {
        env,
        ctx,
        gensyms: &mut gensyms,
    };
    template.expand(&args[0]).map(Step::Done)
}

struct Template<'a> {
    env: &'a Env,
    ctx: &'a mut Context,
    gensyms: &'a mut HashMap<Symbol, Symbol>,
}

/// The argument of `(name x)` when `form` has that shape.
fn unwrap_call<'v>(form: &'v Value, name: &str) -> Option<&'v Value> {
    match form {
        Value::List(items, _) if items.len() == 2 && items[0].is_symbol_named(name) => items.get(1),
        _ => None,
    }
}

impl Template<'_> {
    fn expand(&mut self, form: &Value) -> Result<Value> {
        if let Some(inner) = unwrap_call(form, "unquote") {
            return eval(inner, self.env, self.ctx);
        }
        if unwrap_call(form, "splice-unquote").is_some() {
            return Err(Error::syntax(
                "splice-unquote",
                "must appear inside a list or vector",
            ));
        }
        match form {
            Value::Symbol(sym, meta) => Ok(Value::Symbol(self.auto_gensym(sym), meta.clone())),
            Value::List(items, meta) => {
                let items = self.expand_items(items.iter())?;
                Ok(Value::List(Arc::new(items.into_iter().collect()), meta.clone()))
            }
            Value::Vector(items, meta) => {
                let items = self.expand_items(items.iter())?;
                Ok(Value::vector(items).with_meta(meta.clone()))
            }
            Value::Map(map, meta) => {
                let mut pairs = Vec::with_capacity(map.len());
                for (k, v) in map.iter() {
                    pairs.push((self.expand(k)?, self.expand(v)?));
                }
                Ok(Value::Map(Arc::new(PMap::from_pairs(map.kind(), pairs)), meta.clone()))
            }
            Value::Set(set, meta) => {
                let values = set.iter().map(|v| self.expand(v)).collect::<Result<Vec<_>>>()?;
                Ok(Value::Set(Arc::new(PSet::from_values(set.kind(), values)), meta.clone()))
            }
            other => Ok(other.clone()),
        }
    }

    fn expand_items<'v>(&mut self, items: impl Iterator<Item = &'v Value>) -> Result<Vec<Value>> {
        let mut out = Vec::new();
        for item in items {
            if let Some(inner) = unwrap_call(item, "splice-unquote") {
                let spliced = eval(inner, self.env, self.ctx)?;
                let values = spliced.seq_items().ok_or_else(|| {
                    Error::type_mismatch_in("splice-unquote", "sequence", spliced.type_name())
                })?;
                out.extend(values);
            } else {
                out.push(self.expand(item)?);
            }
        }
        Ok(out)
    }

    fn auto_gensym(&mut self, sym: &Symbol) -> Symbol {
        let name = sym.name();
        if sym.has_namespace() || name.len() < 2 || !name.ends_with('#') {
            return sym.clone();
        }
        self.gensyms
            .entry(sym.clone())
            .or_insert_with(|| Symbol::gensym(&name[..name.len() - 1]))
            .clone()
    }
}
