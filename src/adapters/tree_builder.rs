//! Builds [`ArbitraryTree`]s from type definitions.
//!
//! Abstract slots are expanded through a [`CandidateConcretePropertyResolver`]
//! before their children are built, so every node below an interface already
//! describes the chosen concrete shape.

use rand::rngs::StdRng;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::adapters::candidate_resolver::{
    CandidateConcretePropertyResolver, InterfaceCandidateConcretePropertyResolver,
};
use crate::config::{CandidateSelection, GenerationSettings};
use crate::domain::arbitrary::{ArbitraryProperty, ArbitraryTree, NodeId, NullInject};
use crate::domain::error::{GenerationError, GenerationResult};
use crate::domain::property::{Metadata, Property, TypeRef};
use crate::domain::types::{TypeDefinition, TypeRegistry};

pub struct ArbitraryTreeBuilder {
    registry: Arc<TypeRegistry>,
    candidate_resolvers: HashMap<TypeRef, Arc<dyn CandidateConcretePropertyResolver>>,
    settings: GenerationSettings,
}

impl ArbitraryTreeBuilder {
    pub fn new(registry: Arc<TypeRegistry>, settings: GenerationSettings) -> Self {
        Self {
            registry,
            candidate_resolvers: HashMap::new(),
            settings,
        }
    }

    /// Overrides how candidates are produced for the abstract type `type_ref`.
    pub fn register_candidate_resolver(
        &mut self,
        type_ref: impl Into<TypeRef>,
        resolver: Arc<dyn CandidateConcretePropertyResolver>,
    ) {
        self.candidate_resolvers.insert(type_ref.into(), resolver);
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Builds the tree of `type_ref`. The root is never null.
    pub fn build(&self, type_ref: &TypeRef, rng: &mut StdRng) -> GenerationResult<ArbitraryTree> {
        let root = ArbitraryProperty::new(
            Arc::new(Property::root(type_ref.clone())),
            NullInject::NotNull,
            false,
        );
        self.build_from(root, rng)
    }

    /// Builds a detached tree rooted at an existing property.
    pub fn build_from(
        &self,
        root: ArbitraryProperty,
        rng: &mut StdRng,
    ) -> GenerationResult<ArbitraryTree> {
        let mut tree = ArbitraryTree::new(root);
        let root_id = tree.root();
        self.expand(&mut tree, root_id, rng)?;
        tracing::debug!(
            "Built tree for {} with {} node(s)",
            tree.node(root_id).property(),
            tree.node_count()
        );
        Ok(tree)
    }

    /// Rebuilds the children of `id` from its current property.
    pub fn rebuild(
        &self,
        tree: &mut ArbitraryTree,
        id: NodeId,
        rng: &mut StdRng,
    ) -> GenerationResult<()> {
        tree.detach_children(id);
        tree.invalidate(id);
        self.expand(tree, id, rng)
    }

    /// Replaces the elements of the container `id` with `size` fresh ones.
    pub fn resize(
        &self,
        tree: &mut ArbitraryTree,
        id: NodeId,
        size: usize,
        rng: &mut StdRng,
    ) -> GenerationResult<()> {
        let property = tree.node(id).property().clone();
        match self.registry.definition(property.type_ref())? {
            TypeDefinition::Container { element } => {
                tree.detach_children(id);
                tree.invalidate(id);
                self.push_elements(tree, id, &element, size, rng)
            }
            _ => Err(GenerationError::invalid_structure("container", property)),
        }
    }

    fn expand(&self, tree: &mut ArbitraryTree, id: NodeId, rng: &mut StdRng) -> GenerationResult<()> {
        let definition = self.concrete_definition(tree, id, rng)?;
        tree.node_mut(id).set_truncated(false);

        let leaf = matches!(
            definition,
            TypeDefinition::Scalar { .. } | TypeDefinition::Enum { .. }
        );
        let node = tree.node_mut(id);
        let updated = node
            .arbitrary_property()
            .with_property(node.property().clone(), leaf);
        node.set_arbitrary_property(updated);
        if leaf {
            return Ok(());
        }

        if tree.node(id).depth() >= self.settings.max_depth {
            tracing::debug!(
                "Depth limit {} reached at {}, generating null",
                self.settings.max_depth,
                tree.node(id).property()
            );
            tree.node_mut(id).set_truncated(true);
            return Ok(());
        }

        match definition {
            TypeDefinition::Object { fields } => {
                for field in fields {
                    let field_definition = self.registry.definition(&field.type_ref)?;
                    let nullable_by_default =
                        !matches!(field_definition, TypeDefinition::Container { .. });
                    let null_inject = self.null_inject_for(&field.metadata, nullable_by_default);
                    let property = Property::field(field.name, field.type_ref, field.metadata);
                    let child = tree.push_child(
                        id,
                        ArbitraryProperty::new(Arc::new(property), null_inject, false),
                    );
                    self.expand(tree, child, rng)?;
                }
                Ok(())
            }
            TypeDefinition::Container { element } => {
                let size = self.container_size(tree.node(id).property().metadata(), rng);
                self.push_elements(tree, id, &element, size, rng)
            }
            _ => Ok(()),
        }
    }

    /// Resolves abstract types of node `id` down to a concrete definition,
    /// swapping in the chosen candidate property.
    fn concrete_definition(
        &self,
        tree: &mut ArbitraryTree,
        id: NodeId,
        rng: &mut StdRng,
    ) -> GenerationResult<TypeDefinition> {
        let mut definition = self.registry.definition(tree.node(id).property().type_ref())?;
        let mut visited = HashSet::new();

        while let TypeDefinition::Interface { implementations } = definition {
            let property = tree.node(id).property().clone();
            if !visited.insert(property.type_ref().clone()) {
                return Err(GenerationError::CyclicCandidate {
                    type_name: property.type_ref().to_string(),
                    property: property.to_string(),
                });
            }
            let candidates = match self.candidate_resolvers.get(property.type_ref()) {
                Some(resolver) => resolver.resolve(&property),
                None => InterfaceCandidateConcretePropertyResolver::new(implementations)
                    .resolve(&property),
            };
            if candidates.is_empty() {
                return Err(GenerationError::NoCandidateImplementation {
                    type_name: property.type_ref().to_string(),
                    property: property.to_string(),
                });
            }

            let chosen = match self.settings.candidate_selection {
                CandidateSelection::First => 0,
                CandidateSelection::Random => rng.gen_range(0..candidates.len()),
            };
            let concrete = candidates[chosen].clone();
            tracing::trace!(
                "Resolved {} to {} ({} candidate(s))",
                property,
                concrete.type_ref(),
                candidates.len()
            );

            definition = self.registry.definition(concrete.type_ref())?;
            let node = tree.node_mut(id);
            let swapped = node.arbitrary_property().with_property(concrete, false);
            node.set_arbitrary_property(swapped);
            node.set_candidates(candidates);
        }

        Ok(definition)
    }

    fn push_elements(
        &self,
        tree: &mut ArbitraryTree,
        id: NodeId,
        element: &TypeRef,
        size: usize,
        rng: &mut StdRng,
    ) -> GenerationResult<()> {
        let container = tree.node(id).property().clone();
        for sequence in 0..size {
            let property = Property::element(container.clone(), element.clone(), sequence);
            let null_inject = self.null_inject_for(property.metadata(), false);
            let child = tree.push_child(
                id,
                ArbitraryProperty::new(Arc::new(property), null_inject, false),
            );
            self.expand(tree, child, rng)?;
        }
        Ok(())
    }

    fn container_size(&self, metadata: &Metadata, rng: &mut StdRng) -> usize {
        if let Some(size) = metadata.get_usize("size") {
            return size;
        }
        let min = metadata
            .get_usize("min_size")
            .unwrap_or(self.settings.container_min_size);
        let max = metadata
            .get_usize("max_size")
            .unwrap_or(self.settings.container_max_size)
            .max(min);
        rng.gen_range(min..=max)
    }

    /// `not_null: true` / `nullable: false` lock the node, an explicit
    /// `null_inject` weight wins next, then `nullable: true` or the default.
    fn null_inject_for(&self, metadata: &Metadata, nullable_by_default: bool) -> NullInject {
        if metadata.flag("not_null") == Some(true) || metadata.flag("nullable") == Some(false) {
            return NullInject::NotNull;
        }
        if let Some(weight) = metadata.get_f64("null_inject") {
            return NullInject::weight(weight);
        }
        if nullable_by_default || metadata.flag("nullable") == Some(true) {
            NullInject::weight(self.settings.null_inject)
        } else {
            NullInject::NotNull
        }
    }
}
