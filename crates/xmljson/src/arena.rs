//! Arena-based document tree storage
//!
//! Nodes live in one `Vec` and refer to each other by `NodeId` (u32 index).
//! No Rc/RefCell, no owned recursion: deep documents are built and walked
//! with explicit stacks.
//!
//! ```text
//! Arena: Vec<XmlNode>
//!        [Node0][Node1][Node2]...
//! top_level: [NodeId]   (root element plus any comments / PIs around it)
//! ```

use crate::error::{ConversionError, Result};
use crate::types::{NodeId, NodeKind, XmlNode};

#[derive(Debug, Default, Clone)]
pub struct DocumentArena {
    /// All nodes stored sequentially
    nodes: Vec<XmlNode>,

    /// Top-level entries in document order
    top_level: Vec<NodeId>,
}

impl DocumentArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a detached node, returns its ID
    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        self.nodes.push(XmlNode::new(node_id, kind));
        node_id
    }

    /// Append `child_id` to the children of `parent_id`
    pub fn append_child(&mut self, parent_id: NodeId, child_id: NodeId) -> Result<()> {
        self.get(parent_id)?;
        self.get_mut(child_id)?.parent_id = Some(parent_id);
        self.get_mut(parent_id)?.children_ids.push(child_id);
        Ok(())
    }

    /// Append a node to the top-level entry list
    pub fn push_top_level(&mut self, node_id: NodeId) -> Result<()> {
        self.get_mut(node_id)?.parent_id = None;
        self.top_level.push(node_id);
        Ok(())
    }

    pub fn get(&self, node_id: NodeId) -> Result<&XmlNode> {
        self.nodes
            .get(node_id as usize)
            .ok_or(ConversionError::NodeNotFound(node_id))
    }

    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut XmlNode> {
        self.nodes
            .get_mut(node_id as usize)
            .ok_or(ConversionError::NodeNotFound(node_id))
    }

    /// Top-level entries in document order
    pub fn top_level(&self) -> &[NodeId] {
        &self.top_level
    }

    /// The single top-level element, if there is exactly one
    pub fn root_element(&self) -> Option<NodeId> {
        let mut elements = self
            .top_level
            .iter()
            .copied()
            .filter(|&id| self.nodes[id as usize].is_element());
        match (elements.next(), elements.next()) {
            (Some(id), None) => Some(id),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &XmlNode> {
        self.nodes.iter()
    }

    pub fn children(&self, node_id: NodeId) -> Result<Vec<&XmlNode>> {
        let node = self.get(node_id)?;
        node.children_ids
            .iter()
            .map(|&child_id| self.get(child_id))
            .collect()
    }

    /// Attribute `name` of an element
    pub fn attr(&self, node_id: NodeId, name: &str) -> Option<&str> {
        self.children(node_id)
            .ok()?
            .into_iter()
            .find_map(|child| match &child.kind {
                NodeKind::Attribute { name: n, value } if n == name => Some(value.as_str()),
                _ => None,
            })
    }

    /// Traverse tree depth-first (iterative, no recursion)
    pub fn traverse_df<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(&XmlNode) -> Result<()>,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            visit(node)?;

            // Reverse so children are visited left-to-right
            for &child_id in node.children_ids.iter().rev() {
                stack.push(child_id);
            }
        }

        Ok(())
    }

    /// Find nodes matching predicate
    pub fn find<F>(&self, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&XmlNode) -> bool,
    {
        self.nodes
            .iter()
            .filter(|node| predicate(node))
            .map(|node| node.node_id)
            .collect()
    }

    /// Find all elements by tag name (exact, case-sensitive)
    pub fn find_by_name(&self, name: &str) -> Vec<NodeId> {
        self.find(|node| node.tag_name() == Some(name))
    }

    /// Concatenated text runs below a node, joined with a single space
    pub fn text_content(&self, node_id: NodeId) -> Result<String> {
        let mut parts = Vec::new();
        self.traverse_df(node_id, |node| {
            if let NodeKind::Text(text) = &node.kind {
                parts.push(text.clone());
            }
            Ok(())
        })?;
        Ok(parts.join(" "))
    }
}
