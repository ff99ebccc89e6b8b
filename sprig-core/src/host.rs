// sprig-core - Foreign-call boundary
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The boundary between the evaluator and a host object system.
//!
//! The interpreter never reflects over host classes itself. An embedder
//! installs a [`HostBridge`] and the `.` special form routes constructor,
//! method and field access through it. Sandboxing, class loading and
//! argument coercion are the bridge's business.

use std::fmt;

use sprig_parser::{HostObject, Value};
use thiserror::Error;

/// Values as they cross the host boundary.
#[derive(Debug, Clone)]
pub enum HostValue {
    Nil,
    Bool(bool),
    Long(i64),
    Double(f64),
    String(String),
    List(Vec<HostValue>),
    /// An opaque host object, passed back to the bridge unchanged.
    Object(HostObject),
    /// A Sprig value with no host counterpart, passed through as is.
    Sprig(Value),
}

impl HostValue {
    /// Convert an evaluated argument for the bridge.
    pub fn from_value(value: &Value) -> HostValue {
        match value {
            Value::Nil => HostValue::Nil,
            Value::Boolean(b) => HostValue::Bool(*b),
            Value::Long(n) => HostValue::Long(*n),
            Value::Double(d) => HostValue::Double(*d),
            Value::String(s) => HostValue::String(s.to_string()),
            Value::Host(obj) => HostValue::Object(obj.clone()),
            Value::List(..) | Value::Vector(..) => match value.seq_items() {
                Some(items) => HostValue::List(items.iter().map(HostValue::from_value).collect()),
                None => HostValue::Sprig(value.clone()),
            },
            other => HostValue::Sprig(other.clone()),
        }
    }

    /// Wrap a bridge result as a value.
    pub fn into_value(self) -> Value {
        match self {
            HostValue::Nil => Value::Nil,
            HostValue::Bool(b) => Value::Boolean(b),
            HostValue::Long(n) => Value::Long(n),
            HostValue::Double(d) => Value::Double(d),
            HostValue::String(s) => Value::from(s),
            HostValue::List(items) => {
                Value::vector(items.into_iter().map(HostValue::into_value).collect())
            }
            HostValue::Object(obj) => Value::Host(obj),
            HostValue::Sprig(v) => v,
        }
    }
}

/// What a member access is aimed at.
#[derive(Debug, Clone)]
pub enum HostTarget {
    /// A class, by fully-qualified name.
    Class(String),
    /// A host object instance.
    Instance(HostObject),
}

impl fmt::Display for HostTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostTarget::Class(name) => f.write_str(name),
            HostTarget::Instance(obj) => write!(f, "#<{}>", obj.type_name()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationErrorKind {
    /// The target has no such constructor, method or field.
    NoSuchMember,
    /// The member exists but the call failed.
    Failed,
    /// The bridge's policy refused the call.
    Denied,
}

#[derive(Debug, Clone, Error)]
#[error("Invocation of {target}.{member} failed: {message}")]
pub struct InvocationError {
    pub kind: InvocationErrorKind,
    pub target: String,
    pub member: String,
    pub message: String,
}

impl InvocationError {
    pub fn new(
        kind: InvocationErrorKind,
        target: &HostTarget,
        member: &str,
        message: impl Into<String>,
    ) -> Self {
        InvocationError {
            kind,
            target: target.to_string(),
            member: member.to_string(),
            message: message.into(),
        }
    }

    pub fn no_such_member(target: &HostTarget, member: &str) -> Self {
        InvocationError::new(
            InvocationErrorKind::NoSuchMember,
            target,
            member,
            "no such member",
        )
    }

    pub fn no_bridge(target: &HostTarget, member: &str) -> Self {
        InvocationError::new(
            InvocationErrorKind::Denied,
            target,
            member,
            "no host bridge installed",
        )
    }
}

pub type HostResult = std::result::Result<HostValue, InvocationError>;

/// Capability interface to a host object system. Implementations must be
/// callable from any evaluating thread.
pub trait HostBridge: Send + Sync {
    fn invoke_constructor(&self, class: &HostTarget, args: &[HostValue]) -> HostResult;

    fn invoke_static_method(
        &self,
        class: &HostTarget,
        method: &str,
        args: &[HostValue],
    ) -> HostResult;

    fn invoke_instance_method(
        &self,
        instance: &HostTarget,
        method: &str,
        args: &[HostValue],
    ) -> HostResult;

    fn get_static_field(&self, class: &HostTarget, field: &str) -> HostResult;

    fn get_instance_field(&self, instance: &HostTarget, field: &str) -> HostResult;
}
