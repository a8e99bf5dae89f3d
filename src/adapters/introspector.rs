//! Match/introspect dispatch.
//!
//! An [`ArbitraryIntrospector`] claims a context through [`matches`] and
//! turns it into a value through [`introspect`]. The [`IntrospectorChain`]
//! walks introspectors in registration order and the first match wins.
//!
//! [`matches`]: ArbitraryIntrospector::matches
//! [`introspect`]: ArbitraryIntrospector::introspect

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::domain::context::ArbitraryGeneratorContext;
use crate::domain::error::{GenerationError, GenerationResult};

#[derive(Debug, Clone, PartialEq)]
pub struct ArbitraryIntrospectorResult {
    value: Option<Value>,
}

impl ArbitraryIntrospectorResult {
    /// No value; the node generates `null`.
    pub const EMPTY: ArbitraryIntrospectorResult = ArbitraryIntrospectorResult { value: None };

    pub fn new(value: Value) -> Self {
        Self { value: Some(value) }
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn into_value(self) -> Value {
        self.value.unwrap_or(Value::Null)
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }
}

pub trait ArbitraryIntrospector: Send + Sync {
    fn matches(&self, context: &ArbitraryGeneratorContext<'_>) -> bool;

    /// Only valid for contexts this introspector [`matches`](Self::matches).
    fn introspect(
        &self,
        context: &ArbitraryGeneratorContext<'_>,
    ) -> GenerationResult<ArbitraryIntrospectorResult>;

    /// Label used in trace output.
    fn name(&self) -> &'static str;
}

type MatchFn = dyn Fn(&ArbitraryGeneratorContext<'_>) -> bool + Send + Sync;
type IntrospectFn = dyn Fn(&ArbitraryGeneratorContext<'_>) -> ArbitraryIntrospectorResult + Send + Sync;

/// Pairs one match closure with one introspect closure, for ad hoc
/// introspectors registered into a chain.
pub struct ArbitraryTypeIntrospectDelegator {
    matcher: Box<MatchFn>,
    introspector: Box<IntrospectFn>,
}

impl ArbitraryTypeIntrospectDelegator {
    pub fn new<M, I>(matcher: M, introspector: I) -> Self
    where
        M: Fn(&ArbitraryGeneratorContext<'_>) -> bool + Send + Sync + 'static,
        I: Fn(&ArbitraryGeneratorContext<'_>) -> ArbitraryIntrospectorResult + Send + Sync + 'static,
    {
        Self {
            matcher: Box::new(matcher),
            introspector: Box::new(introspector),
        }
    }
}

impl ArbitraryIntrospector for ArbitraryTypeIntrospectDelegator {
    fn matches(&self, context: &ArbitraryGeneratorContext<'_>) -> bool {
        (self.matcher)(context)
    }

    fn introspect(
        &self,
        context: &ArbitraryGeneratorContext<'_>,
    ) -> GenerationResult<ArbitraryIntrospectorResult> {
        Ok((self.introspector)(context))
    }

    fn name(&self) -> &'static str {
        "delegator"
    }
}

impl fmt::Debug for ArbitraryTypeIntrospectDelegator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArbitraryTypeIntrospectDelegator").finish_non_exhaustive()
    }
}

/// Ordered chain of introspectors.
#[derive(Clone, Default)]
pub struct IntrospectorChain {
    introspectors: Vec<Arc<dyn ArbitraryIntrospector>>,
}

impl IntrospectorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, introspector: Arc<dyn ArbitraryIntrospector>) -> &mut Self {
        self.introspectors.push(introspector);
        self
    }

    pub fn with(mut self, introspector: Arc<dyn ArbitraryIntrospector>) -> Self {
        self.register(introspector);
        self
    }

    /// Places `introspector` at `index`, ahead of everything registered after it.
    pub fn insert(&mut self, index: usize, introspector: Arc<dyn ArbitraryIntrospector>) -> &mut Self {
        let index = index.min(self.introspectors.len());
        self.introspectors.insert(index, introspector);
        self
    }

    /// Appends every introspector of `other` after the ones already registered.
    pub fn extend(&mut self, other: IntrospectorChain) -> &mut Self {
        self.introspectors.extend(other.introspectors);
        self
    }

    pub fn len(&self) -> usize {
        self.introspectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.introspectors.is_empty()
    }

    pub fn introspect(
        &self,
        context: &ArbitraryGeneratorContext<'_>,
    ) -> GenerationResult<ArbitraryIntrospectorResult> {
        let introspector = self
            .introspectors
            .iter()
            .find(|introspector| introspector.matches(context))
            .ok_or_else(|| GenerationError::UnsupportedType {
                type_name: context.property().type_ref().to_string(),
                property: context.property().to_string(),
            })?;
        tracing::trace!(
            "{} handles {}",
            introspector.name(),
            context.property()
        );
        introspector.introspect(context)
    }
}

impl fmt::Debug for IntrospectorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.introspectors.iter().map(|i| i.name()))
            .finish()
    }
}
