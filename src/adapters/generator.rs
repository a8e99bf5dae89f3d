//! Turns arbitrary trees into values.
//!
//! Generation is bottom-up: children are generated and cached first, then
//! the node's context is dispatched through the [`IntrospectorChain`].
//! Cached values are reused until a manipulator or resolver invalidates
//! them, so regenerating a tree only touches stale paths.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use std::cell::RefCell;
use std::sync::Arc;

use crate::adapters::candidate_resolver::CandidateConcretePropertyResolver;
use crate::adapters::introspector::{ArbitraryIntrospector, IntrospectorChain};
use crate::adapters::introspectors::default_introspectors;
use crate::adapters::manipulator::ArbitraryManipulator;
use crate::adapters::tree_builder::ArbitraryTreeBuilder;
use crate::config::{GenerationSettings, Settings};
use crate::domain::arbitrary::{ArbitraryNode, ArbitraryProperty, ArbitraryTree, NodeId, NullInject};
use crate::domain::context::ArbitraryGeneratorContext;
use crate::domain::error::GenerationResult;
use crate::domain::property::TypeRef;
use crate::domain::types::TypeRegistry;

pub struct ArbitraryGenerator {
    builder: ArbitraryTreeBuilder,
    introspectors: IntrospectorChain,
    /// Introspectors registered through `with_introspector`, all ahead of
    /// the built-ins.
    custom_count: usize,
    rng: RefCell<StdRng>,
}

impl ArbitraryGenerator {
    pub fn new(registry: Arc<TypeRegistry>, settings: GenerationSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            builder: ArbitraryTreeBuilder::new(registry, settings),
            introspectors: default_introspectors(),
            custom_count: 0,
            rng: RefCell::new(rng),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(Arc::new(settings.type_registry()), settings.generation.clone())
    }

    /// Registers an introspector that takes precedence over the built-ins
    /// and runs after previously registered custom ones.
    pub fn with_introspector(mut self, introspector: Arc<dyn ArbitraryIntrospector>) -> Self {
        self.introspectors.insert(self.custom_count, introspector);
        self.custom_count += 1;
        self
    }

    pub fn with_candidate_resolver(
        mut self,
        type_ref: impl Into<TypeRef>,
        resolver: Arc<dyn CandidateConcretePropertyResolver>,
    ) -> Self {
        self.builder.register_candidate_resolver(type_ref, resolver);
        self
    }

    pub fn builder(&self) -> &ArbitraryTreeBuilder {
        &self.builder
    }

    pub fn introspectors(&self) -> &IntrospectorChain {
        &self.introspectors
    }

    pub fn build_tree(&self, type_ref: &TypeRef) -> GenerationResult<ArbitraryTree> {
        let mut rng = self.rng.borrow_mut();
        self.builder.build(type_ref, &mut rng)
    }

    /// Applies `manipulators` to `tree`, structural ones (size, candidate)
    /// first. Relative order is kept within each group.
    pub fn manipulate(
        &self,
        tree: &mut ArbitraryTree,
        manipulators: &[ArbitraryManipulator],
    ) -> GenerationResult<()> {
        let (structural, others): (Vec<_>, Vec<_>) = manipulators
            .iter()
            .partition(|m| m.manipulator().is_structural());

        let mut rng = self.rng.borrow_mut();
        for manipulator in structural.into_iter().chain(others) {
            manipulator.apply(tree, &self.builder, &mut rng)?;
        }
        Ok(())
    }

    /// Generates (or regenerates the stale parts of) `tree` and returns the
    /// root value.
    ///
    /// A cached `null` is kept as long as the node may be null. Selecting
    /// an element below it with a bare resolver does not bring the
    /// container back; manipulators lock the whole path to non-null.
    pub fn generate(&self, tree: &mut ArbitraryTree) -> GenerationResult<Value> {
        let root = tree.root();
        self.generate_node(tree, root)
    }

    pub fn sample(&self, type_ref: impl Into<TypeRef>) -> GenerationResult<Value> {
        self.sample_with(type_ref, &[])
    }

    pub fn sample_with(
        &self,
        type_ref: impl Into<TypeRef>,
        manipulators: &[ArbitraryManipulator],
    ) -> GenerationResult<Value> {
        let type_ref = type_ref.into();
        let mut tree = self.build_tree(&type_ref)?;
        self.manipulate(&mut tree, manipulators)?;
        let value = self.generate(&mut tree)?;
        tracing::debug!(
            "Sampled {} ({} node(s), {} manipulator(s))",
            type_ref,
            tree.node_count(),
            manipulators.len()
        );
        Ok(value)
    }

    fn generate_node(&self, tree: &mut ArbitraryTree, id: NodeId) -> GenerationResult<Value> {
        if !tree.is_stale(id) {
            return Ok(tree.node(id).arbitrary().cloned().unwrap_or(Value::Null));
        }

        let arbitrary_property = tree.node(id).arbitrary_property().clone();
        let value = if arbitrary_property.fixed_value().is_some() {
            self.dispatch(tree, id, &arbitrary_property)?
        } else if tree.node(id).is_truncated() {
            Value::Null
        } else if self.roll_null(arbitrary_property.null_inject()) {
            Value::Null
        } else {
            let children = tree.children(id).to_vec();
            for child in children {
                self.generate_node(tree, child)?;
            }
            let value = self.dispatch(tree, id, &arbitrary_property)?;
            sync_elements(tree, id, &value);
            value
        };

        tree.node_mut(id).set_arbitrary(Some(value.clone()));
        Ok(value)
    }

    fn dispatch(
        &self,
        tree: &ArbitraryTree,
        id: NodeId,
        arbitrary_property: &ArbitraryProperty,
    ) -> GenerationResult<Value> {
        let definition = self
            .builder
            .registry()
            .definition(arbitrary_property.property().type_ref())?;
        let children: Vec<&ArbitraryNode> = tree
            .children(id)
            .iter()
            .map(|child| tree.node(*child))
            .collect();
        let nested = |property: &ArbitraryProperty| self.generate_detached(property);

        let context = ArbitraryGeneratorContext::new(
            arbitrary_property,
            children,
            arbitrary_property.fixed_value(),
            &nested,
        )
        .with_type_definition(&definition)
        .with_random(&self.rng);

        Ok(self.introspectors.introspect(&context)?.into_value())
    }

    /// Builds and generates a throwaway tree for `property`.
    fn generate_detached(&self, property: &ArbitraryProperty) -> GenerationResult<Value> {
        let mut tree = {
            let mut rng = self.rng.borrow_mut();
            self.builder.build_from(property.with_fixed(None), &mut rng)?
        };
        self.generate(&mut tree)
    }

    fn roll_null(&self, null_inject: NullInject) -> bool {
        let probability = null_inject.probability();
        if probability >= 1.0 {
            return true;
        }
        probability > 0.0 && self.rng.borrow_mut().gen_bool(probability)
    }
}

/// Writes the final array items back to element nodes whose cached value
/// differs, e.g. after a unique container regenerated a duplicate.
fn sync_elements(tree: &mut ArbitraryTree, id: NodeId, value: &Value) {
    let items = match value {
        Value::Array(items) => items,
        _ => return,
    };
    for child in tree.children(id).to_vec() {
        let node = tree.node(child);
        if let Some(item) = node.property().sequence().and_then(|sequence| items.get(sequence)) {
            if node.arbitrary() != Some(item) {
                tree.node_mut(child).set_arbitrary(Some(item.clone()));
            }
        }
    }
}
