// sprig-parser - Reader
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Recursive-descent reader: tokens in, [`Value`] forms out.
//!
//! Atoms are classified here, collections are built up to their matching
//! delimiter and the reader macros are expanded into plain forms:
//!
//! | input       | result                         |
//! |-------------|--------------------------------|
//! | `'x`        | `(quote x)`                    |
//! | `` `x ``    | `(quasiquote x)`               |
//! | `~x`        | `(unquote x)`                  |
//! | `~@x`       | `(splice-unquote x)`           |
//! | `@x`        | `(deref x)`                    |
//! | `^m x`      | `x` with metadata `m` attached |
//! | `#{...}`    | hash set                       |
//! | `#(...)`    | `(fn [%1 ... & %&] (...))`     |
//!
//! Symbols and collections carry their source position as metadata.

use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;

use crate::collections::{PMap, PSet};
use crate::error::{ReadError, Result};
use crate::meta::{Meta, SourcePos};
use crate::printer::char_name;
use crate::tokenizer::{Token, TokenKind, tokenize, tokenize_tolerant, unescape};
use crate::value::Value;
use crate::vector::PVector;

/// Outcome of a tolerant read: every form that could be built, plus the
/// error that stopped reading, if any.
#[derive(Debug, Clone)]
pub struct PartialRead {
    pub forms: Vec<Value>,
    pub error: Option<ReadError>,
}

/// Read one form. Several top-level forms are wrapped in `(do ...)`; empty
/// input reads as `nil`.
pub fn read(text: &str, file: &str) -> Result<Value> {
    let mut forms = read_all(text, file)?;
    Ok(match forms.len() {
        0 => Value::Nil,
        1 => forms.remove(0),
        _ => {
            forms.insert(0, Value::symbol("do"));
            Value::list(forms)
        }
    })
}

/// Read every top-level form.
pub fn read_all(text: &str, file: &str) -> Result<Vec<Value>> {
    let tokens = tokenize(text, file)?;
    let mut reader = Reader::new(tokens, file, false);
    let mut forms = Vec::new();
    while !reader.at_end() {
        forms.push(reader.read_form()?);
    }
    Ok(forms)
}

/// Read as much as possible without failing. Collections left open at the
/// end of input are closed and kept.
pub fn read_tolerant(text: &str, file: &str) -> PartialRead {
    let tokens = tokenize_tolerant(text, file);
    let mut reader = Reader::new(tokens, file, true);
    let mut forms = Vec::new();
    while !reader.at_end() && reader.recovered.is_none() {
        match reader.read_form() {
            Ok(form) => forms.push(form),
            Err(err) => {
                reader.recover(err);
                break;
            }
        }
    }
    PartialRead {
        forms,
        error: reader.recovered,
    }
}

struct Reader {
    tokens: Vec<Token>,
    pos: usize,
    file: Arc<str>,
    tolerant: bool,
    recovered: Option<ReadError>,
}

impl Reader {
    fn new(tokens: Vec<Token>, file: &str, tolerant: bool) -> Self {
        Reader {
            tokens,
            pos: 0,
            file: Arc::from(file),
            tolerant,
            recovered: None,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn end_pos(&self) -> Option<SourcePos> {
        self.tokens.last().map(|t| {
            let mut pos = t.pos.clone();
            pos.offset = t.end_offset();
            pos.column += t.lexeme.chars().count() as u32;
            pos
        })
    }

    fn recover(&mut self, err: ReadError) {
        tracing::trace!(file = %self.file, error = %err, "tolerant read stopped");
        self.recovered.get_or_insert(err);
    }

    fn read_form(&mut self) -> Result<Value> {
        let Some(token) = self.next() else {
            return Err(ReadError::eof("unexpected end of input", self.end_pos()));
        };
        match token.kind {
            TokenKind::Special => self.read_special(token),
            TokenKind::String | TokenKind::StringBlock => Ok(Value::from(unescape(&token)?)),
            TokenKind::Any => {
                if token.lexeme == "#" {
                    self.read_dispatch(token)
                } else {
                    classify_atom(&token)
                }
            }
            TokenKind::Incomplete => Err(ReadError::eof("unterminated string", Some(token.pos))),
            TokenKind::Whitespace | TokenKind::Comment => self.read_form(),
        }
    }

    fn read_special(&mut self, token: Token) -> Result<Value> {
        match token.lexeme.as_str() {
            "(" => {
                let items = self.read_until(&token, ")")?;
                Ok(with_pos(Value::list(items), token.pos))
            }
            "[" => {
                let items = self.read_until(&token, "]")?;
                Ok(with_pos(Value::vector(items), token.pos))
            }
            "{" => {
                let items = self.read_until(&token, "}")?;
                map_literal(items, token.pos)
            }
            "'" => self.wrap("quote", &token),
            "`" => self.wrap("quasiquote", &token),
            "~" => self.wrap("unquote", &token),
            "~@" => self.wrap("splice-unquote", &token),
            "@" => self.wrap("deref", &token),
            "^" => self.read_meta(&token),
            close => Err(ReadError::parse(
                format!("unexpected '{close}'"),
                Some(token.pos),
            )),
        }
    }

    /// Read forms up to `close`. At end of input the tolerant reader keeps
    /// what it has; the strict one fails with an EOF error.
    fn read_until(&mut self, open: &Token, close: &str) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        loop {
            match self.peek() {
                None => {
                    let err = ReadError::eof(
                        format!("expected '{close}' to close '{}'", open.lexeme),
                        Some(open.pos.clone()),
                    );
                    if self.tolerant {
                        self.recover(err);
                        return Ok(items);
                    }
                    return Err(err);
                }
                Some(t) if t.is_special(close) => {
                    self.pos += 1;
                    return Ok(items);
                }
                Some(_) => match self.read_form() {
                    Ok(form) => items.push(form),
                    Err(err) if self.tolerant && err.is_eof() => {
                        self.recover(err);
                        return Ok(items);
                    }
                    Err(err) => return Err(err),
                },
            }
            if self.recovered.is_some() {
                return Ok(items);
            }
        }
    }

    fn wrap(&mut self, name: &str, token: &Token) -> Result<Value> {
        let form = self.read_form()?;
        Ok(with_pos(
            Value::list(vec![Value::symbol(name), form]),
            token.pos.clone(),
        ))
    }

    fn read_meta(&mut self, token: &Token) -> Result<Value> {
        let meta_form = self.read_form()?;
        let target = self.read_form()?;
        if !target.supports_meta() {
            return Err(ReadError::parse(
                format!("metadata cannot be attached to a {}", target.type_name()),
                Some(token.pos.clone()),
            ));
        }
        let base = target
            .meta()
            .map(|m| (**m).clone())
            .unwrap_or_else(|| Meta::at(token.pos.clone()));
        let merged = base.merge_reader_meta(&meta_form).ok_or_else(|| {
            ReadError::parse(
                "metadata must be a keyword, symbol, string or map",
                Some(token.pos.clone()),
            )
        })?;
        Ok(target.with_meta(Some(Arc::new(merged))))
    }

    fn read_dispatch(&mut self, hash: Token) -> Result<Value> {
        let adjacent = |t: &Token, c: &str| t.is_special(c) && t.pos.offset == hash.end_offset();
        match self.peek() {
            Some(t) if adjacent(t, "{") => {
                let open = self.next().unwrap_or_else(|| hash.clone());
                let items = self.read_until(&open, "}")?;
                Ok(with_pos(Value::set(items), hash.pos))
            }
            Some(t) if adjacent(t, "(") => {
                let open = self.next().unwrap_or_else(|| hash.clone());
                let body = self.read_until(&open, ")")?;
                anon_fn(body, hash.pos)
            }
            _ => Err(ReadError::parse("unknown dispatch '#'", Some(hash.pos))),
        }
    }
}

fn with_pos(value: Value, pos: SourcePos) -> Value {
    value.with_meta(Some(Arc::new(Meta::at(pos))))
}

fn map_literal(items: Vec<Value>, pos: SourcePos) -> Result<Value> {
    if items.len() % 2 != 0 {
        return Err(ReadError::parse(
            "map literal must contain an even number of forms",
            Some(pos),
        ));
    }
    let mut iter = items.into_iter();
    let mut pairs = Vec::new();
    while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
        pairs.push((k, v));
    }
    Ok(with_pos(Value::map(pairs), pos))
}

// ============================================================================
// Anonymous function literals
// ============================================================================

fn scan_args(form: &Value, max_arg: &mut usize, has_rest: &mut bool) -> Result<()> {
    match form {
        Value::Symbol(sym, _) if !sym.has_namespace() => {
            let name = sym.name();
            if name == "%" {
                *max_arg = (*max_arg).max(1);
            } else if name == "%&" {
                *has_rest = true;
            } else if let Some(n) = name.strip_prefix('%').and_then(|n| n.parse::<usize>().ok()) {
                *max_arg = (*max_arg).max(n);
            }
        }
        Value::List(items, _) => {
            if items.front().is_some_and(|h| h.is_symbol_named("fn"))
                && items
                    .get(1)
                    .and_then(|p| p.meta())
                    .is_some_and(|m| m.flag("anonymous-params"))
            {
                return Err(ReadError::parse(
                    "nested #() literals are not allowed",
                    form.source_pos().cloned(),
                ));
            }
            for item in items.iter() {
                scan_args(item, max_arg, has_rest)?;
            }
        }
        Value::Vector(items, _) => {
            for item in items.iter() {
                scan_args(item, max_arg, has_rest)?;
            }
        }
        Value::Map(map, _) => {
            for (k, v) in map.iter() {
                scan_args(k, max_arg, has_rest)?;
                scan_args(v, max_arg, has_rest)?;
            }
        }
        Value::Set(set, _) => {
            for item in set.iter() {
                scan_args(item, max_arg, has_rest)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn rename_percent(form: Value) -> Value {
    match form {
        Value::Symbol(sym, meta) if !sym.has_namespace() && sym.name() == "%" => {
            Value::Symbol(crate::Symbol::new("%1"), meta)
        }
        Value::List(items, meta) => Value::List(
            Arc::new(items.iter().cloned().map(rename_percent).collect()),
            meta,
        ),
        Value::Vector(items, meta) => Value::Vector(
            PVector::from_vec(items.iter().cloned().map(rename_percent).collect()),
            meta,
        ),
        Value::Map(map, meta) => Value::Map(
            Arc::new(PMap::from_pairs(
                map.kind(),
                map.iter()
                    .map(|(k, v)| (rename_percent(k.clone()), rename_percent(v.clone()))),
            )),
            meta,
        ),
        Value::Set(set, meta) => Value::Set(
            Arc::new(PSet::from_values(
                set.kind(),
                set.iter().cloned().map(rename_percent),
            )),
            meta,
        ),
        other => other,
    }
}

fn anon_fn(body: Vec<Value>, pos: SourcePos) -> Result<Value> {
    let mut max_arg = 0;
    let mut has_rest = false;
    for form in &body {
        scan_args(form, &mut max_arg, &mut has_rest)?;
    }
    let mut params: Vec<Value> = (1..=max_arg).map(|i| Value::symbol(&format!("%{i}"))).collect();
    if has_rest {
        params.push(Value::symbol("&"));
        params.push(Value::symbol("%&"));
    }
    let params_meta = Meta::at(pos.clone()).with(Value::keyword("anonymous-params"), Value::Boolean(true));
    let call = with_pos(
        Value::list(body.into_iter().map(rename_percent).collect()),
        pos.clone(),
    );
    Ok(with_pos(
        Value::list(vec![
            Value::symbol("fn"),
            Value::vector(params).with_meta(Some(Arc::new(params_meta))),
            call,
        ]),
        pos,
    ))
}

// ============================================================================
// Atoms
// ============================================================================

fn classify_atom(token: &Token) -> Result<Value> {
    let text = token.lexeme.as_str();
    let parse_err = |msg: String| ReadError::parse(msg, Some(token.pos.clone()));
    match text {
        "nil" => return Ok(Value::Nil),
        "true" => return Ok(Value::Boolean(true)),
        "false" => return Ok(Value::Boolean(false)),
        "##NaN" => return Ok(Value::Double(f64::NAN)),
        "##Inf" => return Ok(Value::Double(f64::INFINITY)),
        "##-Inf" => return Ok(Value::Double(f64::NEG_INFINITY)),
        _ => {}
    }

    if let Some(name) = text.strip_prefix("#\\") {
        return read_char(name).ok_or_else(|| parse_err(format!("invalid character literal: {text}")));
    }

    if let Some(name) = text.strip_prefix(':') {
        if name.is_empty() || name.starts_with(':') || name.ends_with('/') {
            return Err(parse_err(format!("invalid keyword: {text}")));
        }
        return Ok(Value::keyword(name));
    }

    let mut chars = text.chars();
    let first = chars.next();
    let second = chars.next();
    let numeric = match (first, second) {
        (Some(c), _) if c.is_ascii_digit() => true,
        (Some('+' | '-'), Some(c)) => c.is_ascii_digit(),
        _ => false,
    };
    if numeric {
        return parse_number(text).ok_or_else(|| parse_err(format!("invalid number: {text}")));
    }

    if text.starts_with('#') {
        return Err(parse_err(format!("unknown dispatch: {text}")));
    }

    Ok(with_pos(Value::symbol(text), token.pos.clone()))
}

fn read_char(name: &str) -> Option<Value> {
    let mut chars = name.chars();
    let first = chars.next()?;
    if chars.next().is_none() {
        return Some(Value::Char(first));
    }
    for c in [' ', '\n', '\t', '\r'] {
        if char_name(c) == Some(name) {
            return Some(Value::Char(c));
        }
    }
    let hex = name.strip_prefix('u')?;
    u32::from_str_radix(hex, 16)
        .ok()
        .and_then(char::from_u32)
        .map(Value::Char)
}

/// Parse a numeric literal: longs (`42`, `0x2A`, `42I`), doubles (`1.5`,
/// `1e3`) and decimals (`1.5M`).
pub fn parse_number(text: &str) -> Option<Value> {
    if let Some(body) = text.strip_suffix('M') {
        return BigDecimal::from_str(body).ok().map(Value::decimal);
    }
    if let Some(body) = text.strip_suffix('I') {
        return body.parse::<i64>().ok().map(Value::Long);
    }
    let (negative, unsigned) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    if let Some(hex) = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        let n = i64::from_str_radix(hex, 16).ok()?;
        return Some(Value::Long(if negative { -n } else { n }));
    }
    if unsigned.contains(['.', 'e', 'E']) {
        return text.parse::<f64>().ok().map(Value::Double);
    }
    text.parse::<i64>().ok().map(Value::Long)
}
