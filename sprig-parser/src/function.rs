// sprig-parser - Function values
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Function values: native functions, user closures and macros.
//!
//! The captured environment and the native implementation are type-erased
//! (`Arc<dyn Any>`) so that this crate does not depend on the evaluator.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::meta::Meta;
use crate::symbol::Symbol;
use crate::value::{Value, next_identity};

/// One arity of a user function.
#[derive(Debug)]
pub struct Arity {
    /// Fixed parameter patterns, in order.
    pub params: Vec<Value>,
    /// Pattern bound to the remaining arguments, after `&`.
    pub rest: Option<Value>,
    /// Body forms, evaluated as an implicit `do`.
    pub body: Arc<[Value]>,
}

impl Arity {
    pub fn new(params: Vec<Value>, rest: Option<Value>, body: Vec<Value>) -> Self {
        Arity {
            params,
            rest,
            body: body.into(),
        }
    }

    /// Number of fixed parameters.
    #[must_use]
    pub fn fixed(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn is_variadic(&self) -> bool {
        self.rest.is_some()
    }

    #[must_use]
    pub fn accepts(&self, argc: usize) -> bool {
        if self.is_variadic() {
            argc >= self.fixed()
        } else {
            argc == self.fixed()
        }
    }
}

/// A user closure: arities plus the environment it closed over.
#[derive(Clone)]
pub struct UserFn {
    arities: Arc<[Arity]>,
    env: Arc<dyn Any + Send + Sync>,
}

impl UserFn {
    pub fn arities(&self) -> &[Arity] {
        &self.arities
    }

    pub fn env(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.env
    }

    /// Pick the arity for `argc` arguments: the exact fixed-arity match,
    /// else the variadic arity with the largest fixed prefix not above `argc`.
    pub fn select_arity(&self, argc: usize) -> Option<(usize, &Arity)> {
        let exact = self
            .arities
            .iter()
            .enumerate()
            .find(|(_, a)| !a.is_variadic() && a.fixed() == argc);
        exact.or_else(|| {
            self.arities
                .iter()
                .enumerate()
                .filter(|(_, a)| a.is_variadic() && a.fixed() <= argc)
                .max_by_key(|(_, a)| a.fixed())
        })
    }

    /// Human-readable list of accepted argument counts, such as `1, 2 or 3+`.
    pub fn arity_description(&self) -> String {
        let mut counts: Vec<String> = self
            .arities
            .iter()
            .map(|a| {
                if a.is_variadic() {
                    format!("{}+", a.fixed())
                } else {
                    a.fixed().to_string()
                }
            })
            .collect();
        match counts.len() {
            0 => "none".to_string(),
            1 => counts.remove(0),
            _ => {
                let last = counts.pop().unwrap_or_default();
                format!("{} or {}", counts.join(", "), last)
            }
        }
    }
}

/// A native implementation, erased to `Any` so the evaluator can choose
/// its calling convention.
#[derive(Clone)]
pub struct NativeFn {
    func: Arc<dyn Any + Send + Sync>,
}

impl NativeFn {
    pub fn func(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.func
    }
}

#[derive(Clone)]
pub enum FnBody {
    Native(NativeFn),
    User(UserFn),
}

struct FnInner {
    id: u64,
    name: Option<Symbol>,
    body: FnBody,
    is_macro: bool,
    meta: Option<Arc<Meta>>,
}

/// A callable value. Cloning shares the function; identity is the id
/// assigned at creation.
#[derive(Clone)]
pub struct Function {
    inner: Arc<FnInner>,
}

impl Function {
    pub fn native(name: &str, func: Arc<dyn Any + Send + Sync>) -> Self {
        Function::build(Some(Symbol::new(name)), FnBody::Native(NativeFn { func }), false, None)
    }

    pub fn user(
        name: Option<Symbol>,
        arities: Vec<Arity>,
        env: Arc<dyn Any + Send + Sync>,
        meta: Option<Arc<Meta>>,
    ) -> Self {
        let body = FnBody::User(UserFn {
            arities: arities.into(),
            env,
        });
        Function::build(name, body, false, meta)
    }

    fn build(name: Option<Symbol>, body: FnBody, is_macro: bool, meta: Option<Arc<Meta>>) -> Self {
        Function {
            inner: Arc::new(FnInner {
                id: next_identity(),
                name,
                body,
                is_macro,
                meta,
            }),
        }
    }

    /// The same body flagged as a macro.
    #[must_use]
    pub fn into_macro(self) -> Self {
        Function::build(
            self.inner.name.clone(),
            self.inner.body.clone(),
            true,
            self.inner.meta.clone(),
        )
    }

    #[must_use]
    pub fn with_meta(&self, meta: Option<Arc<Meta>>) -> Self {
        Function {
            inner: Arc::new(FnInner {
                id: self.inner.id,
                name: self.inner.name.clone(),
                body: self.inner.body.clone(),
                is_macro: self.inner.is_macro,
                meta,
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn name(&self) -> Option<&Symbol> {
        self.inner.name.as_ref()
    }

    /// Name for messages and stack frames.
    pub fn display_name(&self) -> String {
        self.inner
            .name
            .as_ref()
            .map_or_else(|| "anonymous".to_string(), Symbol::to_string)
    }

    pub fn body(&self) -> &FnBody {
        &self.inner.body
    }

    pub fn as_user(&self) -> Option<&UserFn> {
        match &self.inner.body {
            FnBody::User(u) => Some(u),
            FnBody::Native(_) => None,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self.inner.body, FnBody::Native(_))
    }

    pub fn is_macro(&self) -> bool {
        self.inner.is_macro
    }

    pub fn meta(&self) -> Option<&Arc<Meta>> {
        self.inner.meta.as_ref()
    }

    /// Convenience wrapper as a [`Value`].
    pub fn into_value(self) -> Value {
        Value::Function(self)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match (&self.inner.body, self.inner.is_macro) {
            (_, true) => "macro",
            (FnBody::Native(_), _) => "native-fn",
            (FnBody::User(_), _) => "fn",
        };
        write!(f, "#<{} {}>", kind, self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str) -> Value {
        Value::symbol(name)
    }

    fn arity(fixed: usize, variadic: bool) -> Arity {
        let params = (0..fixed).map(|i| sym(&format!("p{i}"))).collect();
        Arity::new(params, variadic.then(|| sym("more")), vec![Value::Nil])
    }

    fn multi(arities: Vec<Arity>) -> Function {
        Function::user(Some(Symbol::new("f")), arities, Arc::new(()), None)
    }

    #[test]
    fn test_exact_match_beats_variadic() {
        let f = multi(vec![arity(1, true), arity(2, false)]);
        let (index, _) = f.as_user().unwrap().select_arity(2).unwrap();
        assert_eq!(index, 1);
    }

    #[test]
    fn test_variadic_with_largest_prefix_wins() {
        let f = multi(vec![arity(0, true), arity(2, true), arity(5, true)]);
        let user = f.as_user().unwrap();
        assert_eq!(user.select_arity(3).unwrap().0, 1);
        assert_eq!(user.select_arity(1).unwrap().0, 0);
        assert_eq!(user.select_arity(9).unwrap().0, 2);
    }

    #[test]
    fn test_no_matching_arity() {
        let f = multi(vec![arity(1, false), arity(3, false)]);
        let user = f.as_user().unwrap();
        assert!(user.select_arity(2).is_none());
        assert_eq!(user.arity_description(), "1 or 3");
    }

    #[test]
    fn test_macro_flag_gets_fresh_identity() {
        let f = multi(vec![arity(0, false)]);
        let m = f.clone().into_macro();
        assert!(m.is_macro());
        assert!(!f.is_macro());
        assert_ne!(f.id(), m.id());
    }
}
