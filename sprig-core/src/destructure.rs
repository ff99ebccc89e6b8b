// sprig-core - Destructuring support
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Destructuring patterns for `let`, `loop`, `fn` parameters and `catch`.
//!
//! Supported patterns:
//! - symbols bind directly, `_` skips a position;
//! - sequential `[a b & rest :as all]` against any sequence or string;
//! - associative `{:keys [a] :syms [b] :strs [c] x :k :or {a 1} :as m}`
//!   against maps, records and nil.
//!
//! Destructuring is a pure function of pattern and value. `:or` defaults
//! are the only forms that may need evaluating; [`destructure_with`] takes
//! the evaluator for them, [`destructure`] uses them as written.

use sprig_parser::{CustomBody, Keyword, PMap, Symbol, Value};

use crate::error::{Error, Result};

/// Result of destructuring: a list of (symbol, value) bindings
pub type Bindings = Vec<(Symbol, Value)>;

/// Destructure a binding pattern against a value, taking `:or` defaults
/// literally.
pub fn destructure(pattern: &Value, value: &Value) -> Result<Bindings> {
    destructure_with(pattern, value, &mut |form| Ok(form.clone()))
}

/// Destructure, evaluating `:or` default forms with `eval_default`.
pub fn destructure_with(
    pattern: &Value,
    value: &Value,
    eval_default: &mut dyn FnMut(&Value) -> Result<Value>,
) -> Result<Bindings> {
    let mut bindings = Vec::new();
    bind_pattern(pattern, value, eval_default, &mut bindings)?;
    Ok(bindings)
}

fn bind_pattern(
    pattern: &Value,
    value: &Value,
    eval_default: &mut dyn FnMut(&Value) -> Result<Value>,
    out: &mut Bindings,
) -> Result<()> {
    match pattern {
        Value::Symbol(sym, _) if sym.name() == "_" && !sym.has_namespace() => Ok(()),
        Value::Symbol(sym, _) => {
            out.push((sym.clone(), value.clone()));
            Ok(())
        }
        Value::Vector(patterns, _) => {
            bind_sequential(pattern, &patterns.to_vec(), value, eval_default, out)
        }
        Value::Map(map, _) => bind_associative(pattern, map, value, eval_default, out),
        other => Err(mismatch(
            pattern,
            format!(
                "binding pattern must be a symbol, vector or map, got {}",
                other.type_name()
            ),
        )),
    }
}

fn mismatch(pattern: &Value, message: String) -> Error {
    Error::destructuring(message).with_pos(pattern.source_pos())
}

// ============================================================================
// Sequential patterns
// ============================================================================

/// Destructure a sequential pattern (vector) against a value.
fn bind_sequential(
    pattern: &Value,
    patterns: &[Value],
    value: &Value,
    eval_default: &mut dyn FnMut(&Value) -> Result<Value>,
    out: &mut Bindings,
) -> Result<()> {
    let items = match value {
        Value::Map(..) | Value::Set(..) => None,
        other => other.seq_items(),
    }
    .ok_or_else(|| {
        mismatch(
            pattern,
            format!("cannot destructure {} as a sequence", value.type_name()),
        )
    })?;
    let keeps_vector = matches!(value, Value::Vector(..));

    let mut pattern_idx = 0;
    let mut value_idx = 0;
    while pattern_idx < patterns.len() {
        let pat = &patterns[pattern_idx];

        if matches!(pat, Value::Keyword(kw) if kw.is("as")) {
            let Some(Value::Symbol(as_sym, _)) = patterns.get(pattern_idx + 1) else {
                return Err(mismatch(pattern, ":as must be followed by a symbol".into()));
            };
            out.push((as_sym.clone(), value.clone()));
            pattern_idx += 2;
            continue;
        }

        if pat.is_symbol_named("&") {
            let Some(rest_pattern) = patterns.get(pattern_idx + 1) else {
                return Err(mismatch(pattern, "& must be followed by a binding".into()));
            };
            let tail = items.get(value_idx..).unwrap_or(&[]).to_vec();
            let rest_value = if keeps_vector {
                Value::vector(tail)
            } else {
                Value::list(tail)
            };
            bind_pattern(rest_pattern, &rest_value, eval_default, out)?;
            value_idx = items.len();
            pattern_idx += 2;
            continue;
        }

        let item = items.get(value_idx).cloned().unwrap_or(Value::Nil);
        bind_pattern(pat, &item, eval_default, out)?;
        pattern_idx += 1;
        value_idx += 1;
    }
    Ok(())
}

// ============================================================================
// Associative patterns
// ============================================================================

/// Key lookup over the associative shapes a map pattern accepts.
enum Lookup<'a> {
    Empty,
    Map(&'a PMap),
    Record(&'a [(Keyword, Value)]),
}

impl Lookup<'_> {
    fn get(&self, key: &Value) -> Value {
        match self {
            Lookup::Empty => Value::Nil,
            Lookup::Map(map) => map.get(key).cloned().unwrap_or(Value::Nil),
            Lookup::Record(fields) => match key {
                Value::Keyword(kw) => fields
                    .iter()
                    .find(|(name, _)| name == kw)
                    .map(|(_, v)| v.clone())
                    .unwrap_or(Value::Nil),
                _ => Value::Nil,
            },
        }
    }
}

fn bind_associative(
    pattern: &Value,
    map: &PMap,
    value: &Value,
    eval_default: &mut dyn FnMut(&Value) -> Result<Value>,
    out: &mut Bindings,
) -> Result<()> {
    let lookup = match value {
        Value::Nil => Lookup::Empty,
        Value::Map(m, _) => Lookup::Map(m),
        Value::Custom(c) => match &c.body {
            CustomBody::Record(fields) => Lookup::Record(fields),
            _ => {
                return Err(mismatch(
                    pattern,
                    format!("cannot destructure {} as a map", c.type_name),
                ));
            }
        },
        other => {
            return Err(mismatch(
                pattern,
                format!("cannot destructure {} as a map", other.type_name()),
            ));
        }
    };

    let entries = map.sorted_entries();
    let special = |k: &Value, name: &str| matches!(k, Value::Keyword(kw) if kw.is(name));

    let defaults = match entries.iter().find(|(k, _)| special(k, "or")) {
        None => None,
        Some((_, Value::Map(d, _))) => Some(d.clone()),
        Some((_, other)) => {
            return Err(mismatch(
                pattern,
                format!(":or value must be a map, got {}", other.type_name()),
            ));
        }
    };

    let start = out.len();

    // 1. :keys, :syms and :strs
    let lookups: [(&str, fn(&Symbol) -> Value); 3] =
        [("keys", keys_key), ("syms", syms_key), ("strs", strs_key)];
    for (kind, key_of) in lookups {
        if let Some((_, names)) = entries.iter().find(|(k, _)| special(k, kind)) {
            for sym in extract_symbols(pattern, names, kind)? {
                let key = key_of(&sym);
                out.push((sym.unqualified(), lookup.get(&key)));
            }
        }
    }

    // 2. Arbitrary pattern/key pairs
    for (pat, key) in &entries {
        if let Value::Keyword(kw) = pat
            && kw.namespace().is_none()
            && matches!(kw.name(), "keys" | "syms" | "strs" | "or" | "as")
        {
            continue;
        }
        bind_pattern(pat, &lookup.get(key), eval_default, out)?;
    }

    // 3. :or fills whatever is still nil
    if let Some(defaults) = defaults {
        for (sym, bound) in out[start..].iter_mut() {
            if bound.is_nil()
                && let Some(form) = defaults.get(&Value::Symbol(sym.clone(), None))
            {
                *bound = eval_default(form)?;
            }
        }
    }

    // 4. :as
    if let Some((_, as_val)) = entries.iter().find(|(k, _)| special(k, "as")) {
        let Value::Symbol(as_sym, _) = as_val else {
            return Err(mismatch(
                pattern,
                format!(":as must be followed by a symbol, got {}", as_val.type_name()),
            ));
        };
        out.push((as_sym.clone(), value.clone()));
    }
    Ok(())
}

/// `:keys [a ns/b]` looks up `:a` and `:ns/b`.
fn keys_key(sym: &Symbol) -> Value {
    Value::Keyword(match sym.namespace() {
        Some(ns) => Keyword::with_namespace(ns, sym.name()),
        None => Keyword::new(sym.name()),
    })
}

fn syms_key(sym: &Symbol) -> Value {
    Value::Symbol(sym.clone(), None)
}

fn strs_key(sym: &Symbol) -> Value {
    Value::string(sym.name())
}

/// Extract symbols from a vector for :keys/:strs/:syms
fn extract_symbols(pattern: &Value, names: &Value, context: &str) -> Result<Vec<Symbol>> {
    let Value::Vector(items, _) = names else {
        return Err(mismatch(
            pattern,
            format!(":{context} requires a vector, got {}", names.type_name()),
        ));
    };
    items
        .iter()
        .map(|item| match item {
            Value::Symbol(s, _) => Ok(s.clone()),
            Value::Keyword(k) if context == "keys" => Ok(match k.namespace() {
                Some(ns) => Symbol::with_namespace(ns, k.name()),
                None => Symbol::new(k.name()),
            }),
            other => Err(Error::destructuring(format!(
                ":{context} vector must contain symbols, got {}",
                other.type_name()
            ))
            .with_pos(pattern.source_pos())),
        })
        .collect()
}

// ============================================================================
// Pattern inspection
// ============================================================================

/// Every symbol a pattern would bind, in pattern order.
pub fn pattern_symbols(pattern: &Value) -> Vec<Symbol> {
    let mut out = Vec::new();
    collect_symbols(pattern, &mut out);
    out
}

fn collect_symbols(pattern: &Value, out: &mut Vec<Symbol>) {
    match pattern {
        Value::Symbol(sym, _) => {
            if sym.name() != "_" && sym.name() != "&" {
                out.push(sym.clone());
            }
        }
        Value::Vector(items, _) => {
            for item in items.iter() {
                collect_symbols(item, out);
            }
        }
        Value::Map(map, _) => {
            for (k, v) in map.sorted_entries() {
                match k {
                    Value::Keyword(kw) if matches!(kw.name(), "keys" | "syms" | "strs") => {
                        if let Value::Vector(names, _) = v {
                            for name in names.iter() {
                                match name {
                                    Value::Symbol(s, _) => out.push(s.unqualified()),
                                    Value::Keyword(kw) => out.push(Symbol::new(kw.name())),
                                    _ => {}
                                }
                            }
                        }
                    }
                    Value::Keyword(kw) if kw.is("as") => collect_symbols(v, out),
                    Value::Keyword(_) => {}
                    pat => collect_symbols(pat, out),
                }
            }
        }
        _ => {}
    }
}
