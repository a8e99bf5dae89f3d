//! Composable node queries over an [`ArbitraryTree`].
//!
//! Resolvers nest: every variant except [`IdentityNodeResolver`] wraps an
//! inner resolver, resolves it first and narrows the result. Only
//! [`ContainerElementNodeResolver`] mutates the nodes it returns.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::domain::arbitrary::{ArbitraryNode, ArbitraryTree, NodeId};
use crate::domain::error::{GenerationError, GenerationResult};

pub trait NodeResolver: fmt::Debug + Send + Sync {
    fn resolve(&self, tree: &mut ArbitraryTree) -> GenerationResult<Vec<NodeId>>;

    fn boxed(self) -> Box<dyn NodeResolver>
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }
}

/// Selects the root node.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityNodeResolver;

impl NodeResolver for IdentityNodeResolver {
    fn resolve(&self, tree: &mut ArbitraryTree) -> GenerationResult<Vec<NodeId>> {
        Ok(vec![tree.root()])
    }
}

/// Selects the children named `name` of every node the inner resolver returns.
#[derive(Debug)]
pub struct PropertyNameNodeResolver {
    inner: Box<dyn NodeResolver>,
    name: String,
}

impl PropertyNameNodeResolver {
    pub fn new(inner: Box<dyn NodeResolver>, name: impl Into<String>) -> Self {
        Self {
            inner,
            name: name.into(),
        }
    }
}

impl NodeResolver for PropertyNameNodeResolver {
    fn resolve(&self, tree: &mut ArbitraryTree) -> GenerationResult<Vec<NodeId>> {
        let parents = self.inner.resolve(tree)?;
        Ok(parents
            .into_iter()
            .flat_map(|parent| tree.children(parent).to_vec())
            .filter(|child| tree.node(*child).property().field_name() == Some(self.name.as_str()))
            .collect())
    }
}

/// Which elements of a container to select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementIndex {
    All,
    At(usize),
}

impl ElementIndex {
    pub fn matches(self, sequence: usize) -> bool {
        match self {
            ElementIndex::All => true,
            ElementIndex::At(index) => index == sequence,
        }
    }
}

impl fmt::Display for ElementIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementIndex::All => f.write_str("[*]"),
            ElementIndex::At(index) => write!(f, "[{}]", index),
        }
    }
}

/// Selects elements of the containers returned by the inner resolver.
///
/// Every selected element has its cached value cleared and is locked to
/// non-null: customizing an element implies it exists. Ancestors are left
/// untouched, so a container whose cached value is `null` stays `null`
/// until its own path is locked (see `ArbitraryTree::require_path`).
#[derive(Debug)]
pub struct ContainerElementNodeResolver {
    inner: Box<dyn NodeResolver>,
    sequence: ElementIndex,
}

impl ContainerElementNodeResolver {
    pub fn new(inner: Box<dyn NodeResolver>, sequence: ElementIndex) -> Self {
        Self { inner, sequence }
    }

    /// Pure selection step: the matching elements of `containers`, in
    /// encounter order.
    pub fn select(
        tree: &ArbitraryTree,
        containers: &[NodeId],
        sequence: ElementIndex,
    ) -> GenerationResult<Vec<NodeId>> {
        let mut selected = Vec::new();
        for element in containers.iter().flat_map(|id| tree.children(*id)) {
            let property = tree.node(*element).property();
            let element_sequence = property
                .sequence()
                .ok_or_else(|| GenerationError::invalid_structure("container element", property))?;
            if sequence.matches(element_sequence) {
                selected.push(*element);
            }
        }
        Ok(selected)
    }
}

impl NodeResolver for ContainerElementNodeResolver {
    fn resolve(&self, tree: &mut ArbitraryTree) -> GenerationResult<Vec<NodeId>> {
        let containers = self.inner.resolve(tree)?;
        let selected = Self::select(tree, &containers, self.sequence)?;
        for id in &selected {
            tree.require_element(*id);
        }
        tracing::trace!(
            "Selected {} element(s) {} from {} container(s)",
            selected.len(),
            self.sequence,
            containers.len()
        );
        Ok(selected)
    }
}

pub type NodePredicate = Arc<dyn Fn(&ArbitraryNode) -> bool + Send + Sync>;

/// Selects every descendant of the inner resolver's nodes satisfying a predicate.
pub struct PredicateNodeResolver {
    inner: Box<dyn NodeResolver>,
    predicate: NodePredicate,
}

impl PredicateNodeResolver {
    pub fn new(
        inner: Box<dyn NodeResolver>,
        predicate: impl Fn(&ArbitraryNode) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner,
            predicate: Arc::new(predicate),
        }
    }
}

impl fmt::Debug for PredicateNodeResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateNodeResolver")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl NodeResolver for PredicateNodeResolver {
    fn resolve(&self, tree: &mut ArbitraryTree) -> GenerationResult<Vec<NodeId>> {
        let starts = self.inner.resolve(tree)?;
        let mut seen = HashSet::new();
        Ok(starts
            .into_iter()
            .flat_map(|start| tree.descendants(start))
            .filter(|id| (self.predicate)(tree.node(*id)))
            .filter(|id| seen.insert(*id))
            .collect())
    }
}

/// Union of several resolvers, in first-occurrence order.
#[derive(Debug, Default)]
pub struct CompositeNodeResolver {
    resolvers: Vec<Box<dyn NodeResolver>>,
}

impl CompositeNodeResolver {
    pub fn new(resolvers: Vec<Box<dyn NodeResolver>>) -> Self {
        Self { resolvers }
    }

    pub fn push(mut self, resolver: Box<dyn NodeResolver>) -> Self {
        self.resolvers.push(resolver);
        self
    }
}

impl NodeResolver for CompositeNodeResolver {
    fn resolve(&self, tree: &mut ArbitraryTree) -> GenerationResult<Vec<NodeId>> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for resolver in &self.resolvers {
            for id in resolver.resolve(tree)? {
                if seen.insert(id) {
                    result.push(id);
                }
            }
        }
        Ok(result)
    }
}
