// sprig-core - Error types for the Sprig evaluator
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Error types for Sprig evaluation.
//!
//! Every [`Error`] carries its [`ErrorKind`], the source position of the
//! form being evaluated when it was raised (when known) and a snapshot of
//! the call stack. Natives build errors without a stack; the evaluator
//! attaches the snapshot at the innermost activation the error passes
//! through, and never replaces one that is already present.

use std::fmt;
use std::sync::Arc;

use sprig_parser::{Keyword, ReadError, SourcePos, Symbol, Value};

use crate::context::StackFrame;
use crate::host::InvocationError;

/// Result type for Sprig evaluation.
pub type Result<T> = std::result::Result<T, Error>;

/// The arity a function accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AritySpec {
    Exact(usize),
    AtLeast(usize),
    Range(usize, usize),
    /// Free-form description, used for multi-arity functions.
    OneOf(String),
}

impl fmt::Display for AritySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AritySpec::Exact(n) => write!(f, "{n}"),
            AritySpec::AtLeast(n) => write!(f, "at least {n}"),
            AritySpec::Range(min, max) => write!(f, "{min} to {max}"),
            AritySpec::OneOf(desc) => f.write_str(desc),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ErrorKind {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error("Unable to resolve symbol: {0}")]
    SymbolNotFound(Symbol),

    #[error("Wrong number of arguments{}: expected {expected}, got {got}",
        .name.as_ref().map(|n| format!(" to '{n}'")).unwrap_or_default())]
    Arity {
        name: Option<String>,
        expected: AritySpec,
        got: usize,
    },

    #[error("{}expected {expected}, got {got}",
        .context.as_ref().map(|c| format!("{c}: ")).unwrap_or_else(|| "Type error: ".to_string()))]
    TypeMismatch {
        expected: &'static str,
        got: &'static str,
        context: Option<String>,
    },

    #[error("Destructuring error: {0}")]
    Destructuring(String),

    #[error(transparent)]
    Invocation(#[from] InvocationError),

    #[error("{}", thrown_message(.0))]
    Thrown(Value),

    #[error("Evaluation interrupted")]
    Interrupted,

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Invalid '{form}' syntax: {message}")]
    Syntax { form: String, message: String },

    #[error("{0}")]
    Eval(String),
}

fn thrown_message(value: &Value) -> String {
    if let Value::Map(map, _) = value
        && let Some(Value::String(msg)) = map.get(&Value::keyword("message"))
    {
        return msg.to_string();
    }
    value.to_string()
}

impl ErrorKind {
    /// Keyword naming this kind, as matched by `catch` and shown in error
    /// maps.
    pub fn keyword_name(&self) -> &'static str {
        match self {
            ErrorKind::Read(_) => "read-error",
            ErrorKind::SymbolNotFound(_) => "symbol-not-found",
            ErrorKind::Arity { .. } => "arity-error",
            ErrorKind::TypeMismatch { .. } => "type-error",
            ErrorKind::Destructuring(_) => "destructuring-error",
            ErrorKind::Invocation(_) => "invocation-error",
            ErrorKind::Thrown(_) => "thrown",
            ErrorKind::Interrupted => "interrupted",
            ErrorKind::ResourceExhausted(_) => "resource-exhausted",
            ErrorKind::Syntax { .. } => "syntax-error",
            ErrorKind::Eval(_) => "eval-error",
        }
    }

    pub fn keyword(&self) -> Keyword {
        Keyword::new(self.keyword_name())
    }
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    pos: Option<SourcePos>,
    stack: Option<Arc<[StackFrame]>>,
}

/// An evaluation error with its call-stack snapshot.
#[derive(Debug, Clone)]
pub struct Error(Arc<ErrorInner>);

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Error(Arc::new(ErrorInner {
            kind,
            pos: None,
            stack: None,
        }))
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.0.kind
    }

    /// Position of the form that raised the error.
    pub fn pos(&self) -> Option<&SourcePos> {
        self.0.pos.as_ref()
    }

    /// Call stack at the raise site, innermost frame last.
    pub fn stack(&self) -> &[StackFrame] {
        self.0.stack.as_deref().unwrap_or(&[])
    }

    pub fn has_stack(&self) -> bool {
        self.0.stack.is_some()
    }

    /// Same error, sharing the original when nothing changes.
    fn map_inner(self, f: impl FnOnce(&mut ErrorInner)) -> Self {
        let mut inner = match Arc::try_unwrap(self.0) {
            Ok(inner) => inner,
            Err(shared) => ErrorInner {
                kind: shared.kind.clone(),
                pos: shared.pos.clone(),
                stack: shared.stack.clone(),
            },
        };
        f(&mut inner);
        Error(Arc::new(inner))
    }

    /// Attach a position unless one is already recorded.
    #[must_use]
    pub fn with_pos(self, pos: Option<&SourcePos>) -> Self {
        match pos {
            Some(pos) if self.0.pos.is_none() => self.map_inner(|e| e.pos = Some(pos.clone())),
            _ => self,
        }
    }

    /// Attach a stack snapshot unless one is already recorded.
    #[must_use]
    pub fn with_stack(self, stack: impl FnOnce() -> Arc<[StackFrame]>) -> Self {
        if self.0.stack.is_some() {
            return self;
        }
        self.map_inner(|e| e.stack = Some(stack()))
    }

    /// Whether both handles refer to the same raised error.
    pub fn ptr_eq(&self, other: &Error) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Render the stack snapshot, innermost frame first.
    pub fn stack_trace(&self) -> String {
        let mut out = String::new();
        for frame in self.stack().iter().rev() {
            out.push_str("    at ");
            out.push_str(&frame.to_string());
            out.push('\n');
        }
        out
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self.0.kind, ErrorKind::Interrupted)
    }

    /// The thrown value for user `throw`.
    pub fn thrown_value(&self) -> Option<&Value> {
        match &self.0.kind {
            ErrorKind::Thrown(v) => Some(v),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Constructors
    // ------------------------------------------------------------------

    pub fn symbol_not_found(sym: &Symbol) -> Self {
        Error::new(ErrorKind::SymbolNotFound(sym.clone()))
    }

    /// Create an arity error for exact arity.
    pub fn arity(expected: usize, got: usize) -> Self {
        Error::new(ErrorKind::Arity {
            name: None,
            expected: AritySpec::Exact(expected),
            got,
        })
    }

    /// Create an arity error for exact arity with function name.
    pub fn arity_named(name: impl Into<String>, expected: usize, got: usize) -> Self {
        Error::arity_spec(name, AritySpec::Exact(expected), got)
    }

    pub fn arity_at_least(name: impl Into<String>, expected: usize, got: usize) -> Self {
        Error::arity_spec(name, AritySpec::AtLeast(expected), got)
    }

    pub fn arity_range(name: impl Into<String>, min: usize, max: usize, got: usize) -> Self {
        Error::arity_spec(name, AritySpec::Range(min, max), got)
    }

    pub fn arity_spec(name: impl Into<String>, expected: AritySpec, got: usize) -> Self {
        Error::new(ErrorKind::Arity {
            name: Some(name.into()),
            expected,
            got,
        })
    }

    /// Create a type error.
    pub fn type_mismatch(expected: &'static str, got: &'static str) -> Self {
        Error::new(ErrorKind::TypeMismatch {
            expected,
            got,
            context: None,
        })
    }

    /// Create a type error with context.
    pub fn type_mismatch_in(
        context: impl Into<String>,
        expected: &'static str,
        got: &'static str,
    ) -> Self {
        Error::new(ErrorKind::TypeMismatch {
            expected,
            got,
            context: Some(context.into()),
        })
    }

    pub fn not_callable(value: &Value) -> Self {
        Error::type_mismatch_in(
            format!("Cannot call {value}"),
            "function",
            value.type_name(),
        )
    }

    /// Create an invalid syntax error.
    pub fn syntax(form: impl Into<String>, message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Syntax {
            form: form.into(),
            message: message.into(),
        })
    }

    pub fn destructuring(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Destructuring(message.into()))
    }

    pub fn eval(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Eval(message.into()))
    }

    pub fn thrown(value: Value) -> Self {
        Error::new(ErrorKind::Thrown(value))
    }

    pub fn resource_exhausted(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::ResourceExhausted(message.into()))
    }

    pub fn interrupted() -> Self {
        Error::new(ErrorKind::Interrupted)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.kind)?;
        // Read errors already carry their position.
        if let (Some(pos), false) = (&self.0.pos, matches!(self.0.kind, ErrorKind::Read(_))) {
            write!(f, " ({pos})")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.0.kind {
            ErrorKind::Read(e) => Some(e),
            ErrorKind::Invocation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

impl From<ReadError> for Error {
    fn from(err: ReadError) -> Self {
        let pos = err.pos.clone();
        Error::new(ErrorKind::Read(err)).with_pos(pos.as_ref())
    }
}

impl From<InvocationError> for Error {
    fn from(err: InvocationError) -> Self {
        Error::new(ErrorKind::Invocation(err))
    }
}

/// Helper to check if a value is a specific type for error messages.
pub fn check_type(val: &Value, expected: &'static str) -> Result<()> {
    let got = val.type_name();
    if got == expected {
        Ok(())
    } else {
        Err(Error::type_mismatch(expected, got))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_message() {
        let err = Error::arity_named("f", 2, 3);
        assert_eq!(
            err.to_string(),
            "Wrong number of arguments to 'f': expected 2, got 3"
        );
        assert_eq!(err.kind().keyword_name(), "arity-error");
    }

    #[test]
    fn test_type_message() {
        assert_eq!(
            Error::type_mismatch("number", "string").to_string(),
            "Type error: expected number, got string"
        );
        assert_eq!(
            Error::type_mismatch_in("inc", "number", "nil").to_string(),
            "inc: expected number, got nil"
        );
    }

    #[test]
    fn test_thrown_map_uses_message() {
        let v = Value::map([(Value::keyword("message"), Value::string("boom"))]);
        assert_eq!(Error::thrown(v).to_string(), "boom");
        assert_eq!(Error::thrown(Value::Long(1)).to_string(), "1");
    }

    #[test]
    fn test_stack_is_attached_once() {
        let first: Arc<[StackFrame]> = Arc::from(vec![StackFrame::new("outer", None)]);
        let second: Arc<[StackFrame]> = Arc::from(vec![StackFrame::new("other", None)]);
        let err = Error::eval("x").with_stack(|| first.clone());
        let err = err.with_stack(|| second.clone());
        assert_eq!(err.stack().len(), 1);
        assert_eq!(err.stack()[0].name, "outer");
        assert!(err.stack_trace().contains("at outer"));
    }

    #[test]
    fn test_clone_keeps_identity() {
        let err = Error::eval("x");
        let copy = err.clone();
        assert!(err.ptr_eq(&copy));
    }
}
