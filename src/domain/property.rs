//! Structural slot descriptors.
//!
//! A [`Property`] describes one slot of a type: its declared type, an
//! optional name, attached metadata and how to read the slot out of an
//! instance. Properties are immutable and shared through `Arc`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Name of a type known to the [`TypeRegistry`](crate::domain::types::TypeRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeRef(String);

impl TypeRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Inline container syntax, e.g. `list<Season>`.
    pub fn list_of(element: &TypeRef) -> Self {
        Self(format!("list<{}>", element.0))
    }

    /// Element type of an inline `list<T>` reference.
    pub fn list_element(&self) -> Option<TypeRef> {
        self.0
            .strip_prefix("list<")
            .and_then(|rest| rest.strip_suffix('>'))
            .filter(|inner| !inner.is_empty())
            .map(TypeRef::new)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Metadata entries attached to a property (`min`, `faker`, `not_null`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, Value>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key)
            .and_then(Value::as_u64)
            .and_then(|n| usize::try_from(n).ok())
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Metadata nested under `key` as an object, e.g. the `element` entry of a container.
    pub fn nested(&self, key: &str) -> Metadata {
        match self.get(key) {
            Some(Value::Object(map)) => Metadata(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            _ => Metadata::default(),
        }
    }
}

impl From<Map<String, Value>> for Metadata {
    fn from(map: Map<String, Value>) -> Self {
        Metadata(map.into_iter().collect())
    }
}

/// One structural slot of a type.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    /// A named field (or an anonymous root when `name` is `None`).
    Plain {
        type_ref: TypeRef,
        name: Option<String>,
        metadata: Metadata,
    },
    /// The `sequence`-th element of the container described by `container`.
    Element {
        container: Arc<Property>,
        element_type: TypeRef,
        sequence: usize,
        metadata: Metadata,
    },
    /// A delegate whose declared type is replaced by a concrete one.
    Reinterpreted {
        delegate: Arc<Property>,
        overridden_type: TypeRef,
    },
}

impl Property {
    pub fn root(type_ref: impl Into<TypeRef>) -> Self {
        Property::Plain {
            type_ref: type_ref.into(),
            name: None,
            metadata: Metadata::default(),
        }
    }

    pub fn field(name: impl Into<String>, type_ref: impl Into<TypeRef>, metadata: Metadata) -> Self {
        Property::Plain {
            type_ref: type_ref.into(),
            name: Some(name.into()),
            metadata,
        }
    }

    pub fn element(container: Arc<Property>, element_type: TypeRef, sequence: usize) -> Self {
        let metadata = container.metadata().nested("element");
        Property::Element {
            container,
            element_type,
            sequence,
            metadata,
        }
    }

    pub fn reinterpreted(delegate: Arc<Property>, overridden_type: TypeRef) -> Self {
        Property::Reinterpreted {
            delegate,
            overridden_type,
        }
    }

    pub fn type_ref(&self) -> &TypeRef {
        match self {
            Property::Plain { type_ref, .. } => type_ref,
            Property::Element { element_type, .. } => element_type,
            Property::Reinterpreted { overridden_type, .. } => overridden_type,
        }
    }

    pub fn name(&self) -> Option<String> {
        match self {
            Property::Plain { name, .. } => name.clone(),
            Property::Element {
                container,
                sequence,
                ..
            } => Some(format!(
                "{}[{}]",
                container.name().unwrap_or_default(),
                sequence
            )),
            Property::Reinterpreted { delegate, .. } => delegate.name(),
        }
    }

    /// Name of the slot as seen by its parent object; elements have none.
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Property::Plain { name, .. } => name.as_deref(),
            Property::Element { .. } => None,
            Property::Reinterpreted { delegate, .. } => delegate.field_name(),
        }
    }

    pub fn metadata(&self) -> &Metadata {
        match self {
            Property::Plain { metadata, .. } | Property::Element { metadata, .. } => metadata,
            Property::Reinterpreted { delegate, .. } => delegate.metadata(),
        }
    }

    /// Position inside the owning container, for element properties only.
    pub fn sequence(&self) -> Option<usize> {
        match self {
            Property::Element { sequence, .. } => Some(*sequence),
            Property::Reinterpreted { delegate, .. } => delegate.sequence(),
            Property::Plain { .. } => None,
        }
    }

    pub fn is_element(&self) -> bool {
        self.sequence().is_some()
    }

    /// Reads this slot out of `instance`.
    pub fn value(&self, instance: &Value) -> Option<Value> {
        match self {
            Property::Plain { name: None, .. } => Some(instance.clone()),
            Property::Plain {
                name: Some(name), ..
            } => instance.get(name.as_str()).cloned(),
            Property::Element { sequence, .. } => instance.get(*sequence).cloned(),
            Property::Reinterpreted { delegate, .. } => delegate.value(instance),
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}: {}", name, self.type_ref()),
            None => write!(f, "<root>: {}", self.type_ref()),
        }
    }
}
