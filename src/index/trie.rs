//! Byte-keyed prefix tree
//!
//! Nodes live in a single arena and refer to each other by index, so the
//! tree has no shared or aliased ownership. Children are kept sorted by edge
//! byte, which makes every traversal lexicographic.

type NodeId = usize;

const ROOT: NodeId = 0;

#[derive(Clone, Debug)]
struct Node<V> {
    /// Sorted by edge byte
    children: Vec<(u8, NodeId)>,
    value: Option<V>,
}

impl<V> Node<V> {
    fn new() -> Self {
        Self {
            children: Vec::new(),
            value: None,
        }
    }

    fn child(&self, byte: u8) -> Option<NodeId> {
        self.children
            .binary_search_by_key(&byte, |(b, _)| *b)
            .ok()
            .map(|idx| self.children[idx].1)
    }
}

/// Prefix tree mapping byte strings to values
#[derive(Clone, Debug)]
pub struct Trie<V> {
    nodes: Vec<Node<V>>,
    len: usize,
}

impl<V> Trie<V> {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new()],
            len: 0,
        }
    }

    /// Number of keys holding a value
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn find(&self, key: &[u8]) -> Option<NodeId> {
        key.iter()
            .try_fold(ROOT, |node, &byte| self.nodes[node].child(byte))
    }

    /// Exact key lookup
    pub fn get(&self, key: &[u8]) -> Option<&V> {
        self.find(key).and_then(|node| self.nodes[node].value.as_ref())
    }

    /// Walk `key` from the root, creating missing nodes
    fn make_path(&mut self, key: &[u8]) -> NodeId {
        let mut node = ROOT;
        for &byte in key {
            node = match self.nodes[node].child(byte) {
                Some(next) => next,
                None => {
                    let next = self.nodes.len();
                    self.nodes.push(Node::new());
                    let children = &mut self.nodes[node].children;
                    let pos = children.partition_point(|(b, _)| *b < byte);
                    children.insert(pos, (byte, next));
                    next
                }
            };
        }
        node
    }

    /// Return the value at `key`, creating it with `default` when absent
    pub fn get_or_insert_with<F>(&mut self, key: &[u8], default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let node = self.make_path(key);
        let slot = &mut self.nodes[node].value;
        if slot.is_none() {
            self.len += 1;
        }
        slot.get_or_insert_with(default)
    }

    /// All entries in lexicographic key order
    pub fn iter(&self) -> Iter<'_, V> {
        Iter::from_node(self, ROOT, Vec::new())
    }

    /// Entries whose key starts with `prefix`, in lexicographic key order
    pub fn prefix_iter(&self, prefix: &[u8]) -> Iter<'_, V> {
        match self.find(prefix) {
            Some(node) => Iter::from_node(self, node, prefix.to_vec()),
            None => Iter::empty(self),
        }
    }
}

impl<V> Default for Trie<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Depth-first traversal yielding `(key, value)` pairs
pub struct Iter<'a, V> {
    trie: &'a Trie<V>,
    stack: Vec<(NodeId, Vec<u8>)>,
}

impl<'a, V> Iter<'a, V> {
    fn from_node(trie: &'a Trie<V>, node: NodeId, key: Vec<u8>) -> Self {
        Self {
            trie,
            stack: vec![(node, key)],
        }
    }

    fn empty(trie: &'a Trie<V>) -> Self {
        Self {
            trie,
            stack: Vec::new(),
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (Vec<u8>, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((id, key)) = self.stack.pop() {
            let node = &self.trie.nodes[id];
            // reversed so the smallest edge is popped first
            for &(byte, child) in node.children.iter().rev() {
                let mut child_key = Vec::with_capacity(key.len() + 1);
                child_key.extend_from_slice(&key);
                child_key.push(byte);
                self.stack.push((child, child_key));
            }
            if let Some(value) = node.value.as_ref() {
                return Some((key, value));
            }
        }
        None
    }
}
