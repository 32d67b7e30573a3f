//! Generic component tree

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// A typed UI/email component with props and exclusively-owned children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentNode {
    pub component: String,
    pub id: String,
    #[serde(default)]
    pub props: Map<String, Value>,
    #[serde(default)]
    pub children: Vec<ComponentNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ComponentNode {
    pub fn new(component: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            id: id.into(),
            props: Map::new(),
            children: Vec::new(),
            content: None,
        }
    }

    pub fn with_child(mut self, child: ComponentNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Pre-order traversal
    pub fn walk(&self) -> Vec<&ComponentNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Number of nodes in the tree, root included
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(ComponentNode::count).sum::<usize>()
    }

    pub fn find(&self, id: &str) -> Option<&ComponentNode> {
        self.walk().into_iter().find(|node| node.id == id)
    }

    /// Describe a node's position among nodes of the same component type,
    /// e.g. "Heading #2 of 3"
    pub fn position_descriptor(&self, id: &str) -> Option<String> {
        let target = self.find(id)?;
        let same_kind: Vec<&ComponentNode> = self
            .walk()
            .into_iter()
            .filter(|node| node.component == target.component)
            .collect();
        let index = same_kind.iter().position(|node| node.id == id)?;
        Some(format!(
            "{} #{} of {}",
            target.component,
            index + 1,
            same_kind.len()
        ))
    }

    /// Ids must be unique within a tree
    pub fn check_unique_ids(&self) -> Result<(), ModelError> {
        let mut seen = HashSet::new();
        for node in self.walk() {
            if !node.id.is_empty() && !seen.insert(node.id.as_str()) {
                return Err(ModelError::DuplicateId(node.id.clone()));
            }
        }
        Ok(())
    }
}
