//! The adaptive Huffman model.
//!
//! The model is a binary code tree whose nodes are also threaded, lightest
//! to heaviest, on a doubly-linked *sibling list*. Ranks are never stored:
//! a node's rank is its position in the list. Nodes of equal weight form a
//! *block*; every node holds a handle to a shared cell naming the highest
//! ranked node of its block, which lets [`AdaptiveModel::observe`] restore
//! the sibling property with O(1) work per tree level.
//!
//! # Growth
//! A fresh model is a single NYT (Not Yet Transmitted) leaf of weight 0.
//! Observing a byte for the first time splits NYT: an internal node takes
//! NYT's place, with the old NYT as its left child and a new leaf for the
//! byte as its right child. The NYT node keeps its identity for the
//! model's whole life and always sits at the light end of the list.
//!
//! # Determinism
//! Encoder and decoder never exchange the tree; they stay in lockstep by
//! applying the same sequence of `observe` calls. Every tie-break below is
//! therefore part of the wire format.

use crate::arena::{
    BlockId, BlockPool, Node, NodeArena, NodeId, Payload, Symbol, ALPHABET_SIZE,
};
use crate::error::{Error, ModelError, Result};

/// Self-balancing code tree plus sibling list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptiveModel {
    nodes: NodeArena,
    blocks: BlockPool,
    /// Leaf per byte value, plus NYT in the last slot
    leaves: [Option<NodeId>; ALPHABET_SIZE + 1],
    root: NodeId,
    nyt: NodeId,
}

impl AdaptiveModel {
    /// A model holding only the NYT leaf.
    pub fn new() -> Self {
        let (nodes, nyt) = NodeArena::with_first(Node::new(Payload::Leaf(Symbol::Nyt), 0));
        let mut leaves = [None; ALPHABET_SIZE + 1];
        leaves[Symbol::Nyt.slot()] = Some(nyt);
        Self {
            nodes,
            blocks: BlockPool::new(),
            leaves,
            root: nyt,
            nyt,
        }
    }

    /// Drop everything learned and return to the NYT-only state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Record one occurrence of `byte`, updating the tree.
    ///
    /// # Errors
    /// Only on a corrupted model (`ModelError`); a model driven solely
    /// through `observe` never fails.
    pub fn observe(&mut self, byte: u8) -> Result<()> {
        match self.leaves[byte as usize] {
            Some(leaf) => self.increment(Some(leaf)),
            None => self.split(byte),
        }
    }

    /// Introduce `byte` by splitting the NYT leaf.
    fn split(&mut self, byte: u8) -> Result<()> {
        let nyt = self.nyt;
        let internal = self.nodes.allocate(Node::new(Payload::Internal, 1))?;
        let leaf = self
            .nodes
            .allocate(Node::new(Payload::Leaf(Symbol::Byte(byte)), 1))?;

        // List order becomes: nyt, leaf, internal, successor.
        let successor = self.nodes[nyt].next;
        let shared = successor
            .filter(|&s| self.nodes[s].weight == 1)
            .and_then(|s| self.nodes[s].head);
        let head = match shared {
            Some(head) => head,
            None => self.blocks.allocate(internal),
        };
        if let Some(s) = successor {
            self.nodes[s].prev = Some(internal);
        }

        let parent = self.nodes[nyt].parent;
        self.replace_child(parent, nyt, internal);
        {
            let n = &mut self.nodes[internal];
            n.next = successor;
            n.prev = Some(leaf);
            n.head = Some(head);
            n.parent = parent;
            n.left = Some(nyt);
            n.right = Some(leaf);
        }
        {
            let n = &mut self.nodes[leaf];
            n.next = Some(internal);
            n.prev = Some(nyt);
            n.head = Some(head);
            n.parent = Some(internal);
        }
        self.nodes[nyt].next = Some(leaf);
        self.nodes[nyt].parent = Some(internal);
        self.leaves[byte as usize] = Some(leaf);

        log::trace!(
            "split NYT for byte {:#04x} ({} nodes)",
            byte,
            self.nodes.len()
        );
        self.increment(parent)
    }

    /// Raise `node`'s weight by one and repair the sibling property up to
    /// the root.
    fn increment(&mut self, node: Option<NodeId>) -> Result<()> {
        let Some(node) = node else {
            return Ok(());
        };
        let weight = self.nodes[node].weight;
        let head = self.head_of(node)?;

        // Move to the top of the block before leaving it.
        if let Some(next) = self.nodes[node].next {
            if self.nodes[next].weight == weight {
                let leader = self
                    .blocks
                    .get(head)
                    .ok_or_else(|| violation(node, "block cell is on the free list"))?;
                if leader != node {
                    if Some(leader) != self.nodes[node].parent {
                        self.swap_tree(leader, node);
                    }
                    self.swap_list(leader, node);
                }
            }
        }

        match self.nodes[node].prev {
            Some(prev) if self.nodes[prev].weight == weight => self.blocks.set(head, prev),
            _ => self.blocks.release(head),
        }

        let weight = weight + 1;
        self.nodes[node].weight = weight;

        let head = match self.nodes[node].next {
            Some(next) if self.nodes[next].weight == weight => self.head_of(next)?,
            _ => self.blocks.allocate(node),
        };
        self.nodes[node].head = Some(head);

        if let Some(parent) = self.nodes[node].parent {
            self.increment(Some(parent))?;
            // A leaf whose sibling is NYT catches up with its parent.
            if self.nodes[node].prev == Some(parent) {
                self.swap_list(node, parent);
                if self.blocks.get(head) == Some(node) {
                    self.blocks.set(head, parent);
                }
            }
        }
        Ok(())
    }

    /// Exchange the tree positions of `a` and `b`.
    ///
    /// Children, weights and list links stay with the nodes. The two parent
    /// slots are rewritten one after the other, so for siblings the result
    /// depends on which slot `a` held; both ends of a stream relink the same
    /// way.
    fn swap_tree(&mut self, a: NodeId, b: NodeId) {
        let parent_a = self.nodes[a].parent;
        let parent_b = self.nodes[b].parent;
        self.replace_child(parent_a, a, b);
        self.replace_child(parent_b, b, a);
        self.nodes[a].parent = parent_b;
        self.nodes[b].parent = parent_a;
    }

    /// Point `parent`'s slot holding `old` (left if it matches, otherwise
    /// right) at `new`; with no parent, `new` becomes the root.
    fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: NodeId) {
        match parent {
            Some(p) => {
                let p = &mut self.nodes[p];
                if p.left == Some(old) {
                    p.left = Some(new);
                } else {
                    p.right = Some(new);
                }
            }
            None => self.root = new,
        }
    }

    /// Exchange the list positions of `a` and `b`, adjacent or not.
    fn swap_list(&mut self, a: NodeId, b: NodeId) {
        let next_a = self.nodes[a].next;
        self.nodes[a].next = self.nodes[b].next;
        self.nodes[b].next = next_a;

        let prev_a = self.nodes[a].prev;
        self.nodes[a].prev = self.nodes[b].prev;
        self.nodes[b].prev = prev_a;

        if self.nodes[a].next == Some(a) {
            self.nodes[a].next = Some(b);
        }
        if self.nodes[b].next == Some(b) {
            self.nodes[b].next = Some(a);
        }
        for id in [a, b] {
            if let Some(next) = self.nodes[id].next {
                self.nodes[next].prev = Some(id);
            }
        }
        for id in [a, b] {
            if let Some(prev) = self.nodes[id].prev {
                self.nodes[prev].next = Some(id);
            }
        }
    }

    fn head_of(&self, node: NodeId) -> Result<BlockId> {
        self.nodes[node]
            .head
            .ok_or_else(|| violation(node, "node has no block cell"))
    }

    /// Current leaf for `symbol`, if it has been seen.
    pub fn leaf(&self, symbol: Symbol) -> Option<NodeId> {
        self.leaves[symbol.slot()]
    }

    /// Whether `byte` has been observed at least once.
    pub fn is_seen(&self, byte: u8) -> bool {
        self.leaves[byte as usize].is_some()
    }

    /// Occurrences of `byte` so far.
    pub fn weight_of(&self, byte: u8) -> u32 {
        self.leaves[byte as usize].map_or(0, |leaf| self.nodes[leaf].weight)
    }

    /// Number of distinct bytes observed.
    pub fn distinct_symbols(&self) -> usize {
        self.leaves[..ALPHABET_SIZE]
            .iter()
            .filter(|l| l.is_some())
            .count()
    }

    /// Total number of observations (the root's weight).
    pub fn total_weight(&self) -> u32 {
        self.nodes[self.root].weight
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn nyt(&self) -> NodeId {
        self.nyt
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of live block-head cells (one per distinct weight present,
    /// NYT's zero weight excluded).
    pub fn block_count(&self) -> usize {
        self.blocks.live()
    }

    /// Root-to-leaf path of `symbol` (`true` = right child), or `None` if
    /// the symbol has no leaf yet. NYT always has a path, empty while it is
    /// the root.
    pub fn code(&self, symbol: Symbol) -> Option<Vec<bool>> {
        let mut node = self.leaf(symbol)?;
        let mut bits = Vec::new();
        while let Some(parent) = self.nodes[node].parent {
            bits.push(self.nodes[parent].right == Some(node));
            node = parent;
        }
        bits.reverse();
        Some(bits)
    }

    /// Nodes in sibling-list order, lightest (NYT) first.
    pub fn list(&self) -> ListIter<'_> {
        ListIter {
            model: self,
            cursor: Some(self.nyt),
        }
    }

    /// Verify every structural invariant of the model.
    ///
    /// # Errors
    /// `ModelError::Invariant` naming the first offending node.
    pub fn check_invariants(&self) -> Result<()> {
        let nyt = &self.nodes[self.nyt];
        if nyt.payload != Payload::Leaf(Symbol::Nyt) || nyt.weight != 0 || nyt.prev.is_some() {
            return Err(violation(self.nyt, "NYT is not a weight-0 leaf at the light end"));
        }
        if self.nodes[self.root].parent.is_some() {
            return Err(violation(self.root, "root has a parent"));
        }

        let mut visited = 0;
        let mut last: Option<NodeId> = None;
        for id in self.list() {
            let n = &self.nodes[id];
            if n.prev != last {
                return Err(violation(id, "prev link does not mirror next link"));
            }
            if let Some(prev) = last {
                if self.nodes[prev].weight > n.weight {
                    return Err(violation(id, "list weights decrease"));
                }
            }
            visited += 1;
            if visited > self.nodes.len() {
                return Err(violation(id, "sibling list has a cycle"));
            }
            last = Some(id);
        }
        if visited != self.nodes.len() {
            return Err(violation(self.nyt, "sibling list misses nodes"));
        }

        for (id, n) in self.nodes.iter() {
            match n.payload {
                Payload::Internal => {
                    let (Some(left), Some(right)) = (n.left, n.right) else {
                        return Err(violation(id, "internal node lacks a child"));
                    };
                    if self.nodes[left].parent != Some(id) || self.nodes[right].parent != Some(id) {
                        return Err(violation(id, "child does not point back to parent"));
                    }
                    if self.nodes[left].weight + self.nodes[right].weight != n.weight {
                        return Err(violation(id, "weight is not the sum of its children"));
                    }
                }
                Payload::Leaf(symbol) => {
                    if n.left.is_some() || n.right.is_some() {
                        return Err(violation(id, "leaf has children"));
                    }
                    if self.leaves[symbol.slot()] != Some(id) {
                        return Err(violation(id, "leaf table does not name this leaf"));
                    }
                }
            }

            match n.parent {
                Some(p) => {
                    let p = &self.nodes[p];
                    if p.left != Some(id) && p.right != Some(id) {
                        return Err(violation(id, "parent does not hold this node"));
                    }
                }
                None if id != self.root => return Err(violation(id, "detached node")),
                None => {}
            }

            if id != self.nyt {
                let head = self.head_of(id)?;
                let top = self
                    .blocks
                    .get(head)
                    .ok_or_else(|| violation(id, "block cell is on the free list"))?;
                let top_node = &self.nodes[top];
                if top_node.weight != n.weight {
                    return Err(violation(id, "block head has a different weight"));
                }
                if top_node
                    .next
                    .is_some_and(|next| self.nodes[next].weight == n.weight)
                {
                    return Err(violation(id, "block head is not the top of its block"));
                }
            }
        }
        Ok(())
    }
}

impl Default for AdaptiveModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the sibling list, lightest first.
pub struct ListIter<'a> {
    model: &'a AdaptiveModel,
    cursor: Option<NodeId>,
}

impl Iterator for ListIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.cursor?;
        self.cursor = self.model.nodes[id].next;
        Some(id)
    }
}

fn violation(node: NodeId, reason: &'static str) -> Error {
    ModelError::Invariant {
        node: node.index(),
        reason,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights(model: &AdaptiveModel) -> Vec<u32> {
        model.list().map(|id| model.node(id).weight).collect()
    }

    #[test]
    fn test_fresh_model() {
        let model = AdaptiveModel::new();
        assert_eq!(model.root(), model.nyt());
        assert_eq!(model.node_count(), 1);
        assert_eq!(model.total_weight(), 0);
        assert_eq!(model.code(Symbol::Nyt), Some(vec![]));
        assert_eq!(model.code(Symbol::Byte(b'a')), None);
        model.check_invariants().unwrap();
    }

    #[test]
    fn test_first_split() {
        let mut model = AdaptiveModel::new();
        model.observe(0x41).unwrap();

        assert_eq!(model.node_count(), 3);
        assert_eq!(model.total_weight(), 1);
        assert_eq!(weights(&model), vec![0, 1, 1]);
        assert_eq!(model.code(Symbol::Nyt), Some(vec![false]));
        assert_eq!(model.code(Symbol::Byte(0x41)), Some(vec![true]));
        assert_eq!(model.block_count(), 1);
        model.check_invariants().unwrap();
    }

    #[test]
    fn test_repeat_moves_leaf_above_root_block() {
        let mut model = AdaptiveModel::new();
        model.observe(0x41).unwrap();
        model.observe(0x41).unwrap();

        assert_eq!(model.weight_of(0x41), 2);
        assert_eq!(model.total_weight(), 2);
        assert_eq!(weights(&model), vec![0, 2, 2]);
        // the root stays the heaviest-ranked node
        assert_eq!(model.list().last(), Some(model.root()));
        assert_eq!(model.code(Symbol::Byte(0x41)), Some(vec![true]));
        model.check_invariants().unwrap();
    }

    #[test]
    fn test_second_symbol_deepens_nyt() {
        let mut model = AdaptiveModel::new();
        model.observe(b'a').unwrap();
        model.observe(b'b').unwrap();

        assert_eq!(model.distinct_symbols(), 2);
        assert_eq!(model.node_count(), 5);
        assert_eq!(model.code(Symbol::Nyt).map(|c| c.len()), Some(2));
        model.check_invariants().unwrap();
    }

    #[test]
    fn test_frequent_symbol_gets_shortest_code() {
        let mut model = AdaptiveModel::new();
        for &b in b"abcd" {
            model.observe(b).unwrap();
        }
        for _ in 0..20 {
            model.observe(b'c').unwrap();
        }
        model.check_invariants().unwrap();

        let len = |b: u8| model.code(Symbol::Byte(b)).map(|c| c.len()).unwrap_or(0);
        assert_eq!(len(b'c'), 1);
        assert!(len(b'a') > 1);
        assert!(len(b'd') > 1);
    }

    #[test]
    fn test_invariants_hold_after_every_observe() {
        let mut model = AdaptiveModel::new();
        let text = b"abracadabra, mississippi banana bandana";
        for &b in text.iter().cycle().take(600) {
            model.observe(b).unwrap();
            model.check_invariants().unwrap();
        }
        assert_eq!(model.total_weight(), 600);
    }

    #[test]
    fn test_all_bytes_fit_the_arena() {
        let mut model = AdaptiveModel::new();
        for b in 0..=255u8 {
            model.observe(b).unwrap();
        }
        for b in (0..=255u8).rev() {
            model.observe(b).unwrap();
        }
        assert_eq!(model.node_count(), crate::arena::NODE_CAPACITY);
        assert_eq!(model.distinct_symbols(), 256);
        model.check_invariants().unwrap();
    }

    #[test]
    fn test_leaf_table_is_monotonic() {
        let mut model = AdaptiveModel::new();
        let mut assigned = [None; 256];
        for &b in b"hello, world! hello again." {
            model.observe(b).unwrap();
            for s in 0..=255u8 {
                let now = model.leaf(Symbol::Byte(s));
                if let Some(before) = assigned[s as usize] {
                    assert_eq!(now, Some(before));
                }
                assigned[s as usize] = now;
            }
        }
    }

    #[test]
    fn test_identical_sequences_give_identical_models() {
        let mut a = AdaptiveModel::new();
        let mut b = AdaptiveModel::new();
        for &byte in b"the quick brown fox jumps over the lazy dog" {
            a.observe(byte).unwrap();
            b.observe(byte).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_reset() {
        let mut model = AdaptiveModel::new();
        model.observe(1).unwrap();
        model.reset();
        assert_eq!(model, AdaptiveModel::new());
    }
}
