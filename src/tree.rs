//! Reply hierarchy reconstruction
//!
//! Replies arrive flat, each naming its parent. [`Hierarchy::build`] turns
//! them into an arena of [`Node`]s indexed by position, with parents held as
//! plain indices (lookup only) and children as ordered index lists in the
//! order the provider returned them.

use crate::error::HierarchyError;
use crate::types::{ReplyRecord, RootItem};
use std::collections::HashMap;

/// Index of a node inside a [`Hierarchy`]
pub type NodeId = usize;

/// One node of the reply tree
#[derive(Clone, Debug)]
pub struct Node {
    /// Provider id of the root item or reply
    pub id: String,
    /// Parent node, `None` only for the root
    pub parent: Option<NodeId>,
    /// Children in provider display order
    pub children: Vec<NodeId>,
    /// Index of this node in its parent's child list
    pub position: usize,
    /// Nesting depth; the root is 0
    pub depth: usize,
    /// The reply this node holds, `None` for the root
    pub reply: Option<ReplyRecord>,
}

/// Single-rooted, fully connected reply tree
#[derive(Clone, Debug)]
pub struct Hierarchy {
    root: RootItem,
    nodes: Vec<Node>,
    index: HashMap<String, NodeId>,
}

impl Hierarchy {
    /// Index of the root node
    pub const ROOT: NodeId = 0;

    /// Build the tree in one pass over `replies`
    ///
    /// Every reply's parent must already be present (the root or an earlier
    /// reply), otherwise the build fails with [`HierarchyError::OrphanReply`].
    pub fn build(root: RootItem, replies: Vec<ReplyRecord>) -> Result<Self, HierarchyError> {
        let mut nodes = Vec::with_capacity(replies.len() + 1);
        let mut index = HashMap::with_capacity(replies.len() + 1);

        nodes.push(Node {
            id: root.id.clone(),
            parent: None,
            children: Vec::new(),
            position: 0,
            depth: 0,
            reply: None,
        });
        index.insert(root.id.clone(), Self::ROOT);

        for reply in replies {
            if index.contains_key(&reply.id) {
                return Err(HierarchyError::DuplicateReply { id: reply.id });
            }

            let Some(&parent) = index.get(&reply.parent_id) else {
                return Err(HierarchyError::OrphanReply {
                    id: reply.id,
                    parent_id: reply.parent_id,
                });
            };

            let node_id = nodes.len();
            let position = nodes[parent].children.len();
            let depth = nodes[parent].depth + 1;

            nodes[parent].children.push(node_id);
            index.insert(reply.id.clone(), node_id);
            nodes.push(Node {
                id: reply.id.clone(),
                parent: Some(parent),
                children: Vec::new(),
                position,
                depth,
                reply: Some(reply),
            });
        }

        Ok(Self { root, nodes, index })
    }

    /// The root item
    pub fn root(&self) -> &RootItem {
        &self.root
    }

    /// Node at the given index
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this hierarchy.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Look up a node by provider id
    pub fn find(&self, provider_id: &str) -> Option<&Node> {
        self.index.get(provider_id).map(|&i| &self.nodes[i])
    }

    /// Total number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds only the root
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Number of replies (every node but the root)
    pub fn reply_count(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Deepest nesting level present
    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Sibling displayed before `id`, if any
    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let node = &self.nodes[id];
        let parent = node.parent?;
        let position = node.position.checked_sub(1)?;
        self.nodes[parent].children.get(position).copied()
    }

    /// Sibling displayed after `id`, if any
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let node = &self.nodes[id];
        let parent = node.parent?;
        self.nodes[parent].children.get(node.position + 1).copied()
    }
}
