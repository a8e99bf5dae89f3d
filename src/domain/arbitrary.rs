//! The generation tree.
//!
//! An [`ArbitraryTree`] is an arena of [`ArbitraryNode`]s addressed by
//! [`NodeId`]. Each node pairs a [`Property`] with per-node generation
//! policy ([`ArbitraryProperty`]) and caches the value generated for it.
//! Nodes are owned by the tree only; resolvers hand out ids, never nodes.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::domain::property::Property;

/// Null-injection policy of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NullInject {
    /// Probability in `[0, 1]` of generating `null` instead of a value.
    Weight(f64),
    /// The node must never be null.
    NotNull,
}

impl NullInject {
    /// Builds a weight policy, clamping into `[0, 1]`. NaN counts as zero.
    pub fn weight(weight: f64) -> Self {
        if weight.is_nan() {
            NullInject::Weight(0.0)
        } else {
            NullInject::Weight(weight.clamp(0.0, 1.0))
        }
    }

    pub fn probability(self) -> f64 {
        match self {
            NullInject::Weight(weight) => weight,
            NullInject::NotNull => 0.0,
        }
    }

    pub fn is_not_null(self) -> bool {
        matches!(self, NullInject::NotNull)
    }
}

/// A property plus the generation policy attached to its node.
#[derive(Debug, Clone, PartialEq)]
pub struct ArbitraryProperty {
    property: Arc<Property>,
    null_inject: NullInject,
    leaf: bool,
    fixed: Option<Value>,
}

impl ArbitraryProperty {
    pub fn new(property: Arc<Property>, null_inject: NullInject, leaf: bool) -> Self {
        Self {
            property,
            null_inject,
            leaf,
            fixed: None,
        }
    }

    pub fn property(&self) -> &Arc<Property> {
        &self.property
    }

    pub fn null_inject(&self) -> NullInject {
        self.null_inject
    }

    pub fn is_leaf(&self) -> bool {
        self.leaf
    }

    /// Externally fixed value. `Some(Value::Null)` is an explicit null.
    pub fn fixed_value(&self) -> Option<&Value> {
        self.fixed.as_ref()
    }

    pub fn with_null_inject(&self, null_inject: NullInject) -> Self {
        Self {
            null_inject,
            ..self.clone()
        }
    }

    pub fn with_property(&self, property: Arc<Property>, leaf: bool) -> Self {
        Self {
            property,
            leaf,
            ..self.clone()
        }
    }

    pub fn with_fixed(&self, fixed: Option<Value>) -> Self {
        Self {
            fixed,
            ..self.clone()
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct ArbitraryNode {
    arbitrary_property: ArbitraryProperty,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    depth: usize,
    candidates: Vec<Arc<Property>>,
    truncated: bool,
    arbitrary: Option<Value>,
}

impl ArbitraryNode {
    pub fn arbitrary_property(&self) -> &ArbitraryProperty {
        &self.arbitrary_property
    }

    pub fn property(&self) -> &Arc<Property> {
        self.arbitrary_property.property()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Concrete alternatives for an abstract slot; empty for concrete slots.
    pub fn candidates(&self) -> &[Arc<Property>] {
        &self.candidates
    }

    pub fn set_candidates(&mut self, candidates: Vec<Arc<Property>>) {
        self.candidates = candidates;
    }

    /// Cut off by the depth limit: never expanded, always generates `null`
    /// unless a fixed value is set.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn set_truncated(&mut self, truncated: bool) {
        self.truncated = truncated;
    }

    /// Cached generation result; `None` means not generated or invalidated.
    pub fn arbitrary(&self) -> Option<&Value> {
        self.arbitrary.as_ref()
    }

    pub fn set_arbitrary(&mut self, arbitrary: Option<Value>) {
        self.arbitrary = arbitrary;
    }

    /// Replaces the node's policy. Invalidating the cache is up to the caller.
    pub fn set_arbitrary_property(&mut self, arbitrary_property: ArbitraryProperty) {
        self.arbitrary_property = arbitrary_property;
    }
}

/// Arena-backed node tree for one root type.
#[derive(Debug, Clone)]
pub struct ArbitraryTree {
    nodes: Vec<ArbitraryNode>,
    root: NodeId,
}

impl ArbitraryTree {
    pub fn new(root: ArbitraryProperty) -> Self {
        let node = ArbitraryNode {
            arbitrary_property: root,
            parent: None,
            children: Vec::new(),
            depth: 0,
            candidates: Vec::new(),
            truncated: false,
            arbitrary: None,
        };
        Self {
            nodes: vec![node],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &ArbitraryNode {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut ArbitraryNode {
        &mut self.nodes[id.index()]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).children()
    }

    /// Appends a child under `parent` and returns its id.
    pub fn push_child(&mut self, parent: NodeId, arbitrary_property: ArbitraryProperty) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let depth = self.node(parent).depth + 1;
        self.nodes.push(ArbitraryNode {
            arbitrary_property,
            parent: Some(parent),
            children: Vec::new(),
            depth,
            candidates: Vec::new(),
            truncated: false,
            arbitrary: None,
        });
        self.node_mut(parent).children.push(id);
        id
    }

    /// Detaches every child of `id`. Detached nodes stay in the arena but are
    /// unreachable from the root.
    pub fn detach_children(&mut self, id: NodeId) -> Vec<NodeId> {
        std::mem::take(&mut self.node_mut(id).children)
    }

    /// Pre-order descendants of `id`, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            result.push(next);
            stack.extend(self.children(next).iter().rev());
        }
        result
    }

    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(id).parent, move |current| {
            self.node(*current).parent
        })
    }

    /// Number of nodes reachable from the root, the root included.
    pub fn node_count(&self) -> usize {
        1 + self.descendants(self.root).len()
    }

    pub fn invalidate(&mut self, id: NodeId) {
        self.node_mut(id).set_arbitrary(None);
    }

    /// Clears the cached value of `id` and locks it to non-null.
    ///
    /// This is the side effect of selecting a container element. A
    /// truncated node stays truncated.
    pub fn require_element(&mut self, id: NodeId) {
        let node = self.node_mut(id);
        node.set_arbitrary(None);
        let locked = node.arbitrary_property().with_null_inject(NullInject::NotNull);
        node.set_arbitrary_property(locked);
    }

    /// Locks every ancestor of `id` to non-null and invalidates it.
    pub fn require_path(&mut self, id: NodeId) {
        let ancestors: Vec<NodeId> = self.ancestors(id).collect();
        for ancestor in ancestors {
            self.require_element(ancestor);
        }
    }

    /// Whether `id` must be generated (again).
    ///
    /// Fixed and null results do not depend on children; every other cached
    /// value is stale as soon as one child is.
    pub fn is_stale(&self, id: NodeId) -> bool {
        let node = self.node(id);
        match node.arbitrary() {
            None => true,
            Some(Value::Null) => false,
            Some(_) if node.arbitrary_property().fixed_value().is_some() => false,
            Some(_) => node.children().iter().any(|child| self.is_stale(*child)),
        }
    }
}
