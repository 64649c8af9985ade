use std::collections::HashMap;

use logcascade_types::{LoggerPath, dashed_path};

/// Name of the synthetic root node
const ROOT_NAME: &str = "<root>";

/// Index of a node in a [`LoggerTree`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The synthetic root
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(&self) -> usize {
        self.0
    }
}

/// One logger segment relative to its parent
#[derive(Clone, Debug)]
pub struct LoggerNode {
    /// This node's own segment
    name: String,

    /// Back-reference for upward walks, `None` only for the root
    parent: Option<NodeId>,

    /// Children in insertion order
    children: Vec<NodeId>,

    /// Child lookup by segment name
    child_index: HashMap<String, NodeId>,
}

impl LoggerNode {
    fn new(name: String, parent: Option<NodeId>) -> Self {
        Self {
            name,
            parent,
            children: Vec::new(),
            child_index: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Insert-only namespace tree of dotted logger names
///
/// Nodes live in an arena and never move, so a [`NodeId`] stays valid for
/// the lifetime of the tree.
#[derive(Clone, Debug)]
pub struct LoggerTree {
    nodes: Vec<LoggerNode>,
}

impl Default for LoggerTree {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggerTree {
    /// Create a tree holding only the root
    pub fn new() -> Self {
        Self {
            nodes: vec![LoggerNode::new(ROOT_NAME.to_string(), None)],
        }
    }

    /// Insert a path, creating any missing nodes
    ///
    /// Returns whether a node was created. Empty segments are skipped, so an
    /// empty path is a no-op.
    pub fn insert_path<I, S>(&mut self, segments: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut current = NodeId::ROOT;
        let mut created = false;

        for segment in segments {
            let segment = segment.as_ref();
            if segment.is_empty() {
                continue;
            }

            current = match self.nodes[current.0].child_index.get(segment) {
                Some(&child) => child,
                None => {
                    let child = NodeId(self.nodes.len());
                    self.nodes
                        .push(LoggerNode::new(segment.to_string(), Some(current)));
                    let parent = &mut self.nodes[current.0];
                    parent.children.push(child);
                    parent.child_index.insert(segment.to_string(), child);
                    created = true;
                    child
                }
            };
        }

        created
    }

    /// Insert a parsed logger path
    pub fn insert(&mut self, path: &LoggerPath) -> bool {
        self.insert_path(path.segments())
    }

    /// Find the node for a path, skipping empty segments
    ///
    /// An empty path resolves to the root.
    pub fn find<I, S>(&self, segments: I) -> Option<NodeId>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        segments
            .into_iter()
            .filter(|segment| !segment.as_ref().is_empty())
            .try_fold(NodeId::ROOT, |current, segment| {
                self.nodes[current.0]
                    .child_index
                    .get(segment.as_ref())
                    .copied()
            })
    }

    /// Find a logger by its dotted name
    pub fn find_dotted(&self, name: &str) -> Option<NodeId> {
        self.find(name.split('.'))
    }

    /// Find a logger by the dashed identifier used in class names
    pub fn find_dashed(&self, dashed: &str) -> Option<NodeId> {
        (1..self.nodes.len())
            .map(NodeId)
            .find(|&id| self.dashed(id) == dashed)
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn node(&self, id: NodeId) -> &LoggerNode {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&LoggerNode> {
        self.nodes.get(id.0)
    }

    /// Number of loggers, not counting the root
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Strict ancestors of a node, nearest first, root excluded
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.nodes[id.0].parent,
        }
    }

    /// Segment names from the top-level logger down to `id`
    pub fn path(&self, id: NodeId) -> Vec<&str> {
        let mut segments: Vec<&str> = std::iter::once(id)
            .chain(self.ancestors(id))
            .filter(|&node| node != NodeId::ROOT)
            .map(|node| self.nodes[node.0].name.as_str())
            .collect();
        segments.reverse();
        segments
    }

    /// `app.db.pool`
    pub fn dotted(&self, id: NodeId) -> String {
        self.path(id).join(".")
    }

    /// `app-db-pool`, see [`dashed_path`] for how segments are encoded
    pub fn dashed(&self, id: NodeId) -> String {
        dashed_path(self.path(id))
    }

    /// Post-order walk, the root is yielded last
    pub fn walk_depth_first(&self) -> DepthFirst<'_> {
        DepthFirst {
            tree: self,
            stack: vec![(NodeId::ROOT, 0)],
        }
    }

    /// Childless nodes in stack order, never the root
    pub fn walk_leaves(&self) -> Leaves<'_> {
        Leaves {
            tree: self,
            stack: self.nodes[0].children.clone(),
        }
    }

    /// Every real logger in post-order
    pub fn loggers(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.walk_depth_first()
            .filter(move |&id| self.nodes[id.0].parent.is_some())
    }
}

/// Iterator over strict ancestors, see [`LoggerTree::ancestors`]
pub struct Ancestors<'a> {
    tree: &'a LoggerTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next.filter(|&id| id != NodeId::ROOT)?;
        self.next = self.tree.nodes[current.0].parent;
        Some(current)
    }
}

/// Post-order iterator, see [`LoggerTree::walk_depth_first`]
pub struct DepthFirst<'a> {
    tree: &'a LoggerTree,
    /// Node and index of the next child to descend into
    stack: Vec<(NodeId, usize)>,
}

impl Iterator for DepthFirst<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        loop {
            let (id, cursor) = self.stack.last_mut()?;
            let node = &self.tree.nodes[id.0];
            match node.children.get(*cursor) {
                Some(&child) => {
                    *cursor += 1;
                    self.stack.push((child, 0));
                }
                None => {
                    let done = *id;
                    self.stack.pop();
                    return Some(done);
                }
            }
        }
    }
}

/// Leaf iterator, see [`LoggerTree::walk_leaves`]
pub struct Leaves<'a> {
    tree: &'a LoggerTree,
    stack: Vec<NodeId>,
}

impl Iterator for Leaves<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(id) = self.stack.pop() {
            let node = &self.tree.nodes[id.0];
            if node.children.is_empty() {
                return Some(id);
            }
            self.stack.extend_from_slice(&node.children);
        }
        None
    }
}
