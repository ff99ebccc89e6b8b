// sprig-core - I/O built-in functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Printing and reading: str, pr-str, prn, print, println, read-string

use std::io::Write as _;

use sprig_parser::{Value, print, print_plain, read};

use crate::error::{Error, Result};

// ============================================================================
// Print Output
// ============================================================================

/// (str & args) - concatenate args as strings
pub(crate) fn builtin_str(args: &[Value]) -> Result<Value> {
    let result: String = args.iter().map(print_plain).collect();
    Ok(Value::from(result))
}

/// (pr-str & args) - readable representation, space separated
pub(crate) fn builtin_pr_str(args: &[Value]) -> Result<Value> {
    let parts: Vec<String> = args.iter().map(print).collect();
    Ok(Value::from(parts.join(" ")))
}

fn write_out(text: &str, newline: bool) -> Result<Value> {
    let mut out = std::io::stdout().lock();
    let written = if newline {
        writeln!(out, "{text}")
    } else {
        write!(out, "{text}").and_then(|()| out.flush())
    };
    written.map_err(|e| Error::eval(format!("Unable to write output: {e}")))?;
    Ok(Value::Nil)
}

/// (print & args) - human form without newline
pub(crate) fn builtin_print(args: &[Value]) -> Result<Value> {
    let parts: Vec<String> = args.iter().map(print_plain).collect();
    write_out(&parts.join(" "), false)
}

/// (println & args) - human form with newline
pub(crate) fn builtin_println(args: &[Value]) -> Result<Value> {
    let parts: Vec<String> = args.iter().map(print_plain).collect();
    write_out(&parts.join(" "), true)
}

/// (prn & args) - readable form with newline
pub(crate) fn builtin_prn(args: &[Value]) -> Result<Value> {
    let parts: Vec<String> = args.iter().map(print).collect();
    write_out(&parts.join(" "), true)
}

// ============================================================================
// Reading
// ============================================================================

/// (read-string s) - read the first form of s
pub(crate) fn builtin_read_string(args: &[Value]) -> Result<Value> {
    let [source] = args else {
        return Err(Error::arity_named("read-string", 1, args.len()));
    };
    let text = source
        .as_str()
        .ok_or_else(|| Error::type_mismatch_in("read-string", "string", source.type_name()))?;
    Ok(read(text, "<read-string>")?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_str_vs_pr_str() {
        let args = [Value::string("a"), Value::Nil, Value::Char('b'), Value::Long(1)];
        assert_eq!(builtin_str(&args).unwrap(), Value::string("ab1"));
        assert_eq!(
            builtin_pr_str(&[Value::string("a"), Value::Nil]).unwrap(),
            Value::string("\"a\" nil")
        );
    }

    #[test]
    fn test_read_string() {
        let form = builtin_read_string(&[Value::string("(+ 1 2)")]).unwrap();
        assert_eq!(form.count(), Some(3));
        assert!(builtin_read_string(&[Value::string("(+ 1")]).is_err());
    }
}
