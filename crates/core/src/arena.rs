//! Node storage and recyclable block-head cells.
//!
//! Tree and list links are plain indices into a [`NodeArena`]; nodes are
//! never freed individually, so an index stays valid for the model's whole
//! lifetime. Block-head cells live in a second, much smaller pool that does
//! recycle: a released cell is pushed onto a LIFO free list whose links are
//! stored in the released cells themselves.

use crate::error::{ModelError, Result};

/// Number of distinct byte symbols.
pub const ALPHABET_SIZE: usize = 256;

/// Worst-case node count: every byte as a leaf, the NYT leaf, and one
/// internal node per split.
pub const NODE_CAPACITY: usize = 2 * ALPHABET_SIZE + 1;

/// Handle to a node in a [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u16);

impl NodeId {
    /// Position of the node in its arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to a cell in a [`BlockPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(u16);

/// A leaf's symbol: a byte value or the Not-Yet-Transmitted escape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Byte(u8),
    Nyt,
}

impl Symbol {
    /// Slot of this symbol in a 257-entry leaf table (NYT is last).
    pub fn slot(self) -> usize {
        match self {
            Symbol::Byte(b) => b as usize,
            Symbol::Nyt => ALPHABET_SIZE,
        }
    }
}

/// What a node carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    Leaf(Symbol),
    Internal,
}

/// One element of both the code tree and the sibling list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Occurrences in this subtree
    pub weight: u32,
    /// Symbol for a leaf, marker for an internal node
    pub payload: Payload,
    /// `None` at the root
    pub parent: Option<NodeId>,
    /// Child reached on a 0 bit
    pub left: Option<NodeId>,
    /// Child reached on a 1 bit
    pub right: Option<NodeId>,
    /// Neighbour toward heavier nodes
    pub next: Option<NodeId>,
    /// Neighbour toward lighter nodes
    pub prev: Option<NodeId>,
    /// Cell naming the top node of this node's weight block (`None` for NYT)
    pub head: Option<BlockId>,
}

impl Node {
    /// An unlinked node.
    pub fn new(payload: Payload, weight: u32) -> Self {
        Self {
            weight,
            payload,
            parent: None,
            left: None,
            right: None,
            next: None,
            prev: None,
            head: None,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.payload == Payload::Internal
    }
}

/// Fixed-capacity, append-only node storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self {
            nodes: Vec::with_capacity(NODE_CAPACITY),
        }
    }

    /// An arena whose first slot already holds `node`.
    pub fn with_first(node: Node) -> (Self, NodeId) {
        let mut arena = Self::new();
        arena.nodes.push(node);
        (arena, NodeId(0))
    }

    /// Store `node` in the next unused slot.
    ///
    /// # Errors
    /// `ModelError::ArenaExhausted` once [`NODE_CAPACITY`] nodes exist.
    pub fn allocate(&mut self, node: Node) -> Result<NodeId> {
        if self.nodes.len() >= NODE_CAPACITY {
            return Err(ModelError::ArenaExhausted {
                capacity: NODE_CAPACITY,
            }
            .into());
        }
        let id = NodeId(self.nodes.len() as u16);
        self.nodes.push(node);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All allocated nodes with their handles, in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u16), n))
    }
}

impl Default for NodeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Index<NodeId> for NodeArena {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}

impl std::ops::IndexMut<NodeId> for NodeArena {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }
}

/// A block-head cell: either in use, naming a node, or on the free list,
/// holding the link to the next free cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Head(NodeId),
    Free(Option<BlockId>),
}

/// Recyclable block-head cells with last-released-first-reused allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPool {
    cells: Vec<Cell>,
    free: Option<BlockId>,
}

impl BlockPool {
    pub fn new() -> Self {
        Self {
            cells: Vec::with_capacity(NODE_CAPACITY),
            free: None,
        }
    }

    /// Take a cell (reusing the most recently released one) naming `node`.
    pub fn allocate(&mut self, node: NodeId) -> BlockId {
        match self.free {
            Some(id) => {
                self.free = match self.cells[id.0 as usize] {
                    Cell::Free(link) => link,
                    Cell::Head(_) => None,
                };
                self.cells[id.0 as usize] = Cell::Head(node);
                id
            }
            None => {
                let id = BlockId(self.cells.len() as u16);
                self.cells.push(Cell::Head(node));
                id
            }
        }
    }

    /// Return a cell to the free list.
    pub fn release(&mut self, id: BlockId) {
        self.cells[id.0 as usize] = Cell::Free(self.free);
        self.free = Some(id);
    }

    /// Node named by a live cell.
    pub fn get(&self, id: BlockId) -> Option<NodeId> {
        match self.cells[id.0 as usize] {
            Cell::Head(node) => Some(node),
            Cell::Free(_) => None,
        }
    }

    /// Point a live cell at another node.
    pub fn set(&mut self, id: BlockId, node: NodeId) {
        self.cells[id.0 as usize] = Cell::Head(node);
    }

    /// Number of cells currently naming a node.
    pub fn live(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| matches!(c, Cell::Head(_)))
            .count()
    }
}

impl Default for BlockPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_is_monotonic() {
        let mut arena = NodeArena::new();
        let a = arena.allocate(Node::new(Payload::Leaf(Symbol::Nyt), 0)).unwrap();
        let b = arena.allocate(Node::new(Payload::Internal, 1)).unwrap();
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(arena[b].weight, 1);
        assert!(arena[b].is_internal());
        assert!(!arena[a].is_internal());
        arena[a].weight = 7;
        assert_eq!(arena[a].weight, 7);
    }

    #[test]
    fn test_arena_exhaustion() {
        let mut arena = NodeArena::new();
        for _ in 0..NODE_CAPACITY {
            arena.allocate(Node::new(Payload::Internal, 0)).unwrap();
        }
        assert!(arena.allocate(Node::new(Payload::Internal, 0)).is_err());
        assert_eq!(arena.len(), NODE_CAPACITY);
    }

    #[test]
    fn test_pool_reuses_last_released_first() {
        let mut pool = BlockPool::new();
        let n = NodeId(0);
        let a = pool.allocate(n);
        let b = pool.allocate(n);
        let c = pool.allocate(n);

        pool.release(a);
        pool.release(c);
        assert_eq!(pool.get(c), None);
        assert_eq!(pool.live(), 1);

        assert_eq!(pool.allocate(NodeId(3)), c);
        assert_eq!(pool.allocate(NodeId(4)), a);
        assert_eq!(pool.get(a), Some(NodeId(4)));
        // free list drained; next cell is fresh
        let d = pool.allocate(n);
        assert_ne!(d, b);
        assert_eq!(pool.live(), 4);
    }

    #[test]
    fn test_pool_set() {
        let mut pool = BlockPool::new();
        let cell = pool.allocate(NodeId(1));
        pool.set(cell, NodeId(2));
        assert_eq!(pool.get(cell), Some(NodeId(2)));
    }

    #[test]
    fn test_symbol_slots() {
        assert_eq!(Symbol::Byte(0).slot(), 0);
        assert_eq!(Symbol::Byte(255).slot(), 255);
        assert_eq!(Symbol::Nyt.slot(), ALPHABET_SIZE);
    }
}
