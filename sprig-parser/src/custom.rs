// sprig-parser - Custom types and host objects
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! User-defined types and opaque host values.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::keyword::Keyword;
use crate::meta::Meta;
use crate::value::{Value, next_identity};

/// Payload of a custom-typed value.
#[derive(Debug, Clone)]
pub enum CustomBody {
    /// Named fields in declaration order.
    Record(Arc<[(Keyword, Value)]>),
    /// A choice alternative or a wrapped base value.
    Wrapped(Value),
}

/// A value tagged with a user type name such as `:point`.
#[derive(Debug, Clone)]
pub struct CustomValue {
    pub type_name: Keyword,
    pub body: CustomBody,
    pub meta: Option<Arc<Meta>>,
}

impl CustomValue {
    pub fn record(type_name: Keyword, fields: Vec<(Keyword, Value)>) -> Self {
        CustomValue {
            type_name,
            body: CustomBody::Record(fields.into()),
            meta: None,
        }
    }

    pub fn wrapped(type_name: Keyword, value: Value) -> Self {
        CustomValue {
            type_name,
            body: CustomBody::Wrapped(value),
            meta: None,
        }
    }

    /// Field lookup for records; wrapped values expose `:value`.
    pub fn get(&self, key: &Keyword) -> Option<&Value> {
        match &self.body {
            CustomBody::Record(fields) => fields.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            CustomBody::Wrapped(v) => key.is("value").then_some(v),
        }
    }

    /// Record with one field replaced, or `None` for unknown fields.
    pub fn assoc(&self, key: &Keyword, value: Value) -> Option<Self> {
        let CustomBody::Record(fields) = &self.body else {
            return None;
        };
        fields.iter().position(|(k, _)| k == key)?;
        let fields: Vec<_> = fields
            .iter()
            .map(|(k, v)| {
                let v = if k == key { value.clone() } else { v.clone() };
                (k.clone(), v)
            })
            .collect();
        Some(CustomValue {
            type_name: self.type_name.clone(),
            body: CustomBody::Record(fields.into()),
            meta: self.meta.clone(),
        })
    }
}

impl PartialEq for CustomValue {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name
            && match (&self.body, &other.body) {
                (CustomBody::Record(a), CustomBody::Record(b)) => a == b,
                (CustomBody::Wrapped(a), CustomBody::Wrapped(b)) => a == b,
                _ => false,
            }
    }
}

struct HostInner {
    id: u64,
    type_name: Arc<str>,
    object: Box<dyn Any + Send + Sync>,
}

/// An opaque object owned by the embedding host.
#[derive(Clone)]
pub struct HostObject {
    inner: Arc<HostInner>,
}

impl HostObject {
    pub fn new<T: Any + Send + Sync>(type_name: &str, object: T) -> Self {
        HostObject {
            inner: Arc::new(HostInner {
                id: next_identity(),
                type_name: Arc::from(type_name),
                object: Box::new(object),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn type_name(&self) -> &str {
        &self.inner.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.object.downcast_ref::<T>()
    }

    pub fn ptr_eq(&self, other: &HostObject) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<host {} {}>", self.inner.type_name, self.inner.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_access_and_update() {
        let point = CustomValue::record(
            Keyword::new("point"),
            vec![(Keyword::new("x"), Value::Long(1)), (Keyword::new("y"), Value::Long(2))],
        );
        assert_eq!(point.get(&Keyword::new("y")), Some(&Value::Long(2)));
        let moved = point.assoc(&Keyword::new("x"), Value::Long(9)).unwrap();
        assert_eq!(moved.get(&Keyword::new("x")), Some(&Value::Long(9)));
        assert!(point.assoc(&Keyword::new("z"), Value::Nil).is_none());
        assert_ne!(point, moved);
    }

    #[test]
    fn test_host_downcast() {
        let obj = HostObject::new("buffer", String::from("abc"));
        assert_eq!(obj.downcast_ref::<String>().map(String::as_str), Some("abc"));
        assert!(obj.downcast_ref::<i64>().is_none());
        assert!(obj.ptr_eq(&obj.clone()));
    }
}
