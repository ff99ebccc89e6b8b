// sprig-core - String/Symbol/Keyword built-in functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! String, symbol, and keyword operations: name, namespace, symbol, keyword,
//! gensym, subs and the string helpers.

use sprig_parser::{Keyword, Symbol, Value, print_plain};

use crate::error::{Error, Result};

use super::collections::items_of;

fn string_arg<'a>(op: &str, value: &'a Value) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| Error::type_mismatch_in(op, "string", value.type_name()))
}

fn unary<'a>(op: &str, args: &'a [Value]) -> Result<&'a str> {
    match args {
        [s] => string_arg(op, s),
        _ => Err(Error::arity_named(op, 1, args.len())),
    }
}

fn binary<'a>(op: &str, args: &'a [Value]) -> Result<(&'a str, &'a str)> {
    match args {
        [a, b] => Ok((string_arg(op, a)?, string_arg(op, b)?)),
        _ => Err(Error::arity_named(op, 2, args.len())),
    }
}

// ============================================================================
// Name and Namespace
// ============================================================================

/// (name x) - returns name part of keyword/symbol/string
pub(crate) fn builtin_name(args: &[Value]) -> Result<Value> {
    let [value] = args else {
        return Err(Error::arity_named("name", 1, args.len()));
    };
    match value {
        Value::Keyword(kw) => Ok(Value::string(kw.name())),
        Value::Symbol(sym, _) => Ok(Value::string(sym.name())),
        Value::String(s) => Ok(Value::String(s.clone())),
        other => Err(Error::type_mismatch_in(
            "name",
            "keyword, symbol, or string",
            other.type_name(),
        )),
    }
}

/// (namespace x) - returns namespace part of keyword/symbol, or nil
pub(crate) fn builtin_namespace(args: &[Value]) -> Result<Value> {
    let [value] = args else {
        return Err(Error::arity_named("namespace", 1, args.len()));
    };
    let ns = match value {
        Value::Keyword(kw) => kw.namespace(),
        Value::Symbol(sym, _) => sym.namespace(),
        other => {
            return Err(Error::type_mismatch_in(
                "namespace",
                "keyword or symbol",
                other.type_name(),
            ));
        }
    };
    Ok(ns.map(Value::string).unwrap_or(Value::Nil))
}

/// Namespace and name arguments of the two-argument constructors.
fn qualified_parts<'a>(op: &str, ns: &'a Value, name: &'a Value) -> Result<(Option<&'a str>, &'a str)> {
    let ns = match ns {
        Value::Nil => None,
        Value::String(s) => Some(s.as_ref()),
        other => return Err(Error::type_mismatch_in(op, "string or nil", other.type_name())),
    };
    Ok((ns, string_arg(op, name)?))
}

// ============================================================================
// Symbol and Keyword Construction
// ============================================================================

/// (symbol name) or (symbol ns name) - create symbol
pub(crate) fn builtin_symbol(args: &[Value]) -> Result<Value> {
    let sym = match args {
        [Value::String(s)] => Symbol::parse(s),
        [Value::Symbol(sym, _)] => sym.clone(),
        [Value::Keyword(kw)] => match kw.namespace() {
            Some(ns) => Symbol::with_namespace(ns, kw.name()),
            None => Symbol::new(kw.name()),
        },
        [other] => return Err(Error::type_mismatch_in("symbol", "string", other.type_name())),
        [ns, name] => match qualified_parts("symbol", ns, name)? {
            (Some(ns), name) => Symbol::with_namespace(ns, name),
            (None, name) => Symbol::new(name),
        },
        _ => return Err(Error::arity_range("symbol", 1, 2, args.len())),
    };
    Ok(Value::Symbol(sym, None))
}

/// (keyword name) or (keyword ns name) - create keyword
pub(crate) fn builtin_keyword(args: &[Value]) -> Result<Value> {
    let kw = match args {
        [Value::String(s)] => Keyword::parse(s),
        [Value::Keyword(kw)] => kw.clone(),
        [Value::Symbol(sym, _)] => match sym.namespace() {
            Some(ns) => Keyword::with_namespace(ns, sym.name()),
            None => Keyword::new(sym.name()),
        },
        [other] => {
            return Err(Error::type_mismatch_in(
                "keyword",
                "string, symbol, or keyword",
                other.type_name(),
            ));
        }
        [ns, name] => match qualified_parts("keyword", ns, name)? {
            (Some(ns), name) => Keyword::with_namespace(ns, name),
            (None, name) => Keyword::new(name),
        },
        _ => return Err(Error::arity_range("keyword", 1, 2, args.len())),
    };
    Ok(Value::Keyword(kw))
}

/// (gensym) or (gensym prefix) - generate unique symbol
pub(crate) fn builtin_gensym(args: &[Value]) -> Result<Value> {
    let prefix = match args {
        [] => "G",
        [prefix] => string_arg("gensym", prefix)?,
        _ => return Err(Error::arity_range("gensym", 0, 1, args.len())),
    };
    Ok(Value::Symbol(Symbol::gensym(prefix), None))
}

// ============================================================================
// String Operations
// ============================================================================

/// (subs s start) or (subs s start end) - substring by character index
pub(crate) fn builtin_subs(args: &[Value]) -> Result<Value> {
    if args.len() < 2 || args.len() > 3 {
        return Err(Error::arity_range("subs", 2, 3, args.len()));
    }
    let s = string_arg("subs", &args[0])?;
    let chars: Vec<char> = s.chars().collect();
    let index = |value: &Value| -> Result<usize> {
        match value {
            Value::Long(n) => usize::try_from(*n)
                .map_err(|_| Error::eval("subs: index must be non-negative")),
            other => Err(Error::type_mismatch_in("subs", "long", other.type_name())),
        }
    };
    let start = index(&args[1])?;
    let end = match args.get(2) {
        Some(end) => index(end)?,
        None => chars.len(),
    };
    if start > end || end > chars.len() {
        return Err(Error::eval(format!(
            "subs: range {start}..{end} out of bounds for length {}",
            chars.len()
        )));
    }
    Ok(Value::from(chars[start..end].iter().collect::<String>()))
}

/// (upper-case s)
pub(crate) fn builtin_upper_case(args: &[Value]) -> Result<Value> {
    Ok(Value::from(unary("upper-case", args)?.to_uppercase()))
}

/// (lower-case s)
pub(crate) fn builtin_lower_case(args: &[Value]) -> Result<Value> {
    Ok(Value::from(unary("lower-case", args)?.to_lowercase()))
}

/// (trim s)
pub(crate) fn builtin_trim(args: &[Value]) -> Result<Value> {
    Ok(Value::string(unary("trim", args)?.trim()))
}

/// (blank? s) - nil or only whitespace
pub(crate) fn builtin_blank_p(args: &[Value]) -> Result<Value> {
    match args {
        [Value::Nil] => Ok(Value::Boolean(true)),
        _ => Ok(Value::Boolean(unary("blank?", args)?.trim().is_empty())),
    }
}

/// (split s separator)
pub(crate) fn builtin_split(args: &[Value]) -> Result<Value> {
    let (s, sep) = binary("split", args)?;
    if sep.is_empty() {
        return Ok(Value::vector(s.chars().map(|c| Value::from(c.to_string())).collect()));
    }
    Ok(Value::vector(s.split(sep).map(Value::string).collect()))
}

/// (join coll) or (join separator coll)
pub(crate) fn builtin_join(args: &[Value]) -> Result<Value> {
    let (sep, coll) = match args {
        [coll] => ("", coll),
        [sep, coll] => (string_arg("join", sep)?, coll),
        _ => return Err(Error::arity_range("join", 1, 2, args.len())),
    };
    let parts: Vec<String> = items_of("join", coll)?.iter().map(print_plain).collect();
    Ok(Value::from(parts.join(sep)))
}

/// (starts-with? s prefix)
pub(crate) fn builtin_starts_with_p(args: &[Value]) -> Result<Value> {
    let (s, prefix) = binary("starts-with?", args)?;
    Ok(Value::Boolean(s.starts_with(prefix)))
}

/// (ends-with? s suffix)
pub(crate) fn builtin_ends_with_p(args: &[Value]) -> Result<Value> {
    let (s, suffix) = binary("ends-with?", args)?;
    Ok(Value::Boolean(s.ends_with(suffix)))
}

/// (includes? s substr)
pub(crate) fn builtin_includes_p(args: &[Value]) -> Result<Value> {
    let (s, part) = binary("includes?", args)?;
    Ok(Value::Boolean(s.contains(part)))
}

/// (replace s match replacement)
pub(crate) fn builtin_replace(args: &[Value]) -> Result<Value> {
    let [s, from, to] = args else {
        return Err(Error::arity_named("replace", 3, args.len()));
    };
    let s = string_arg("replace", s)?;
    Ok(Value::from(s.replace(string_arg("replace", from)?, string_arg("replace", to)?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_and_namespace() {
        let kw = Value::Keyword(Keyword::with_namespace("app", "id"));
        assert_eq!(builtin_name(&[kw.clone()]).unwrap(), Value::string("id"));
        assert_eq!(builtin_namespace(&[kw]).unwrap(), Value::string("app"));
        assert_eq!(builtin_namespace(&[Value::symbol("x")]).unwrap(), Value::Nil);
    }

    #[test]
    fn test_subs_counts_chars() {
        let s = Value::string("héllo");
        assert_eq!(
            builtin_subs(&[s.clone(), Value::Long(1), Value::Long(3)]).unwrap(),
            Value::string("él")
        );
        assert!(builtin_subs(&[s, Value::Long(4), Value::Long(9)]).is_err());
    }

    #[test]
    fn test_split_and_join() {
        let parts = builtin_split(&[Value::string("a,b,c"), Value::string(",")]).unwrap();
        assert_eq!(parts.count(), Some(3));
        let joined = builtin_join(&[Value::string("-"), parts]).unwrap();
        assert_eq!(joined, Value::string("a-b-c"));
    }

    #[test]
    fn test_gensyms_are_distinct() {
        let a = builtin_gensym(&[Value::string("x")]).unwrap();
        let b = builtin_gensym(&[Value::string("x")]).unwrap();
        assert_ne!(a, b);
    }
}
