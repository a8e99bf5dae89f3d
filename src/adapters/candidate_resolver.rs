use std::sync::Arc;

use crate::domain::property::{Property, TypeRef};

/// Expands an abstract-typed property into concrete alternatives.
///
/// The returned order is significant: the first candidate is the default
/// choice of deterministic selection.
pub trait CandidateConcretePropertyResolver: Send + Sync {
    fn resolve(&self, property: &Arc<Property>) -> Vec<Arc<Property>>;
}

/// Resolves an interface slot to one reinterpreted property per registered
/// implementation.
#[derive(Debug, Clone)]
pub struct InterfaceCandidateConcretePropertyResolver {
    implementations: Vec<TypeRef>,
}

impl InterfaceCandidateConcretePropertyResolver {
    pub fn new(implementations: Vec<TypeRef>) -> Self {
        Self { implementations }
    }

    pub fn implementations(&self) -> &[TypeRef] {
        &self.implementations
    }
}

impl CandidateConcretePropertyResolver for InterfaceCandidateConcretePropertyResolver {
    fn resolve(&self, property: &Arc<Property>) -> Vec<Arc<Property>> {
        self.implementations
            .iter()
            .map(|implementation| {
                Arc::new(Property::reinterpreted(
                    property.clone(),
                    implementation.clone(),
                ))
            })
            .collect()
    }
}
