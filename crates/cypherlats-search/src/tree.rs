//! Search tree for LATS.
//!
//! Nodes live in an arena owned by [`SearchTree`] and refer to each other by
//! [`NodeId`]. Building a node and wiring it into the tree are separate steps:
//! [`Node::new`] yields a detached node, [`SearchTree::attach`] links it under a
//! parent, propagates its solved flag to every ancestor and back-propagates its
//! reflection score up to the root.

use cypherlats_core::Reflection;
use std::collections::VecDeque;

/// Index of a node inside the [`SearchTree`] that created it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One trajectory step.
#[derive(Clone, Debug)]
pub struct Node {
    messages: Vec<String>,
    reflection: Option<Reflection>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    value: f64,
    visits: u32,
    depth: usize,
    is_solved: bool,
}

impl Node {
    /// Detached node. Depth, visits, value and solved state are assigned on attach.
    pub fn new(messages: Vec<String>, reflection: Option<Reflection>) -> Self {
        Self {
            messages,
            reflection,
            parent: None,
            children: Vec::new(),
            value: 0.0,
            visits: 0,
            depth: 1,
            is_solved: false,
        }
    }

    /// Detached node holding a single scored candidate.
    pub fn scored(candidate: impl Into<String>, reflection: Reflection) -> Self {
        Self::new(vec![candidate.into()], Some(reflection))
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn reflection(&self) -> Option<&Reflection> {
        self.reflection.as_ref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Running mean of every reward back-propagated through this node.
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn visits(&self) -> u32 {
        self.visits
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_solved(&self) -> bool {
        self.is_solved
    }

    pub fn is_terminal(&self) -> bool {
        self.children.is_empty()
    }

    /// This node's own artifacts, optionally followed by its rendered reflection.
    pub fn get_messages(&self, include_reflections: bool) -> Vec<String> {
        let mut out = self.messages.clone();
        if include_reflections {
            if let Some(r) = &self.reflection {
                out.push(r.as_message());
            }
        }
        out
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<Node value={:.2}, visits={}, depth={}, is_solved={}>",
            self.value, self.visits, self.depth, self.is_solved
        )
    }
}

/// Arena of nodes with a single root at [`SearchTree::root`].
///
/// `NodeId`s are only meaningful for the tree that returned them; passing an id
/// from another tree panics on out-of-range access.
#[derive(Clone, Debug)]
pub struct SearchTree {
    nodes: Vec<Node>,
}

impl SearchTree {
    /// Create a tree whose root is `root`. The root's reflection, if any, is
    /// back-propagated immediately.
    pub fn new(root: Node) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.insert(None, root);
        tree
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Link `node` as the last child of `parent`.
    pub fn attach(&mut self, parent: NodeId, node: Node) -> NodeId {
        self.insert(Some(parent), node)
    }

    fn insert(&mut self, parent: Option<NodeId>, mut node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = parent;
        node.children.clear();
        node.value = 0.0;
        node.visits = 0;
        node.depth = parent.map_or(1, |p| self.nodes[p.0].depth + 1);
        node.is_solved = node.reflection.as_ref().is_some_and(|r| r.terminal);
        let reward = node.reflection.as_ref().map(Reflection::normalized_score);
        let solved = node.is_solved;

        self.nodes.push(node);
        if let Some(p) = parent {
            self.nodes[p.0].children.push(id);
        }
        if solved {
            self.mark_tree_as_solved(id);
        }
        if let Some(reward) = reward {
            self.backpropagate(id, reward);
        }
        id
    }

    /// Add one visit and fold `reward` into the running mean of `id` and every ancestor.
    pub fn backpropagate(&mut self, id: NodeId, reward: f64) {
        let mut current = Some(id);
        while let Some(n) = current {
            let node = &mut self.nodes[n.0];
            node.visits += 1;
            let visits = f64::from(node.visits);
            node.value = (node.value * (visits - 1.0) + reward) / visits;
            current = node.parent;
        }
    }

    fn mark_tree_as_solved(&mut self, id: NodeId) {
        let mut current = self.nodes[id.0].parent;
        while let Some(p) = current {
            let node = &mut self.nodes[p.0];
            node.is_solved = true;
            current = node.parent;
        }
    }

    /// UCT score. None for the root, which has no parent visit count.
    pub fn upper_confidence_bound(&self, id: NodeId, exploration_weight: f64) -> Option<f64> {
        let node = self.node(id);
        let parent = self.node(node.parent?);
        if node.visits == 0 {
            return Some(node.value);
        }
        let visits = f64::from(node.visits);
        let average_reward = node.value / visits;
        let exploration_term = (f64::from(parent.visits).ln() / visits).sqrt();
        Some(average_reward + exploration_weight * exploration_term)
    }

    /// Every node below `id`, breadth-first. `id` itself is excluded.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut all = Vec::new();
        let mut queue = VecDeque::from([id]);
        while let Some(n) = queue.pop_front() {
            let children = &self.nodes[n.0].children;
            all.extend_from_slice(children);
            queue.extend(children.iter().copied());
        }
        all
    }

    /// Highest-UCT node anywhere below `id`, not only among direct children.
    /// Ties go to the first node in breadth-first order. None when `id` is a leaf.
    pub fn best_child(&self, id: NodeId, exploration_weight: f64) -> Option<NodeId> {
        if self.node(id).is_terminal() {
            return None;
        }
        first_max(self.descendants(id), |n| {
            self.upper_confidence_bound(n, exploration_weight)
                .unwrap_or(f64::NEG_INFINITY)
        })
    }

    /// Best solved leaf at or below `id`, keyed by `(is_terminal && is_solved) * value`.
    ///
    /// When nothing is solved every key is 0 and the first node (`id` itself)
    /// wins; use [`SearchTree::has_solution`] to tell that apart.
    pub fn best_solution(&self, id: NodeId) -> NodeId {
        let mut candidates = vec![id];
        candidates.extend(self.descendants(id));
        first_max(candidates, |n| self.solution_key(n)).unwrap_or(id)
    }

    fn solution_key(&self, id: NodeId) -> f64 {
        let node = self.node(id);
        if node.is_terminal() && node.is_solved {
            node.value
        } else {
            0.0
        }
    }

    /// Whether any solved leaf exists at or below `id`.
    pub fn has_solution(&self, id: NodeId) -> bool {
        let node = self.node(id);
        (node.is_terminal() && node.is_solved)
            || self.descendants(id).into_iter().any(|n| {
                let d = self.node(n);
                d.is_terminal() && d.is_solved
            })
    }

    /// 1 for a leaf, otherwise 1 + the tallest child.
    pub fn height(&self, id: NodeId) -> usize {
        1 + self
            .node(id)
            .children
            .iter()
            .map(|&c| self.height(c))
            .max()
            .unwrap_or(0)
    }

    /// Artifacts from the root down to `id`.
    pub fn trajectory(&self, id: NodeId, include_reflections: bool) -> Vec<String> {
        let mut messages = Vec::new();
        let mut current = Some(id);
        while let Some(n) = current {
            let node = self.node(n);
            messages.extend(node.get_messages(include_reflections).into_iter().rev());
            current = node.parent;
        }
        messages.reverse();
        messages
    }
}

/// First element with the greatest key. A NaN key never replaces a previous best.
fn first_max(ids: impl IntoIterator<Item = NodeId>, key: impl Fn(NodeId) -> f64) -> Option<NodeId> {
    let mut best: Option<(NodeId, f64)> = None;
    for id in ids {
        let k = key(id);
        match best {
            Some((_, bk)) if k.partial_cmp(&bk) != Some(std::cmp::Ordering::Greater) => {}
            _ => best = Some((id, k)),
        }
    }
    best.map(|(id, _)| id)
}

/// Tree plus the question it is searching for.
#[derive(Clone, Debug)]
pub struct TreeState {
    pub tree: SearchTree,
    pub input: String,
}

impl TreeState {
    pub fn new(root: Node, input: impl Into<String>) -> Self {
        Self {
            tree: SearchTree::new(root),
            input: input.into(),
        }
    }

    pub fn root(&self) -> &Node {
        self.tree.node(self.tree.root())
    }

    pub fn height(&self) -> usize {
        self.tree.height(self.tree.root())
    }
}
