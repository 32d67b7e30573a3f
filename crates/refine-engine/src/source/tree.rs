//! Arena-backed source tree
//!
//! Text and arena are kept in sync by [`SourceTree::splice`]: every edit
//! shifts the spans of surviving nodes instead of reparsing, so a second edit
//! in the same request can address nodes resolved before the first.

use super::parser::{
    find_markup_start, imports_end, parse_imports, AttrValue, ImportDecl, Node, NodeId, Parser,
    Span,
};
use crate::error::SourceError;
use email_model::{ComponentNode, SiblingSummary};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

const EXCERPT_CHARS: usize = 60;

/// Byte range and type of an addressable element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Boundary {
    pub start_char: usize,
    pub end_char: usize,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone)]
pub struct SourceTree {
    pub(crate) source: String,
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    pub(crate) imports: Vec<ImportDecl>,
    pub(crate) id_attr: String,
}

impl SourceTree {
    /// Parse source text. Identity values must be unique.
    pub fn parse(source: &str, id_attr: &str) -> Result<Self, SourceError> {
        let start =
            find_markup_start(source, imports_end(source)).ok_or(SourceError::NoMarkup)?;
        let mut nodes = Vec::new();
        let root = Parser::new(source, start, &mut nodes).parse_element(None)?;

        let tree = Self {
            source: source.to_string(),
            nodes,
            root,
            imports: parse_imports(source),
            id_attr: id_attr.to_string(),
        };

        match tree.first_duplicate_identity() {
            Some(id) => Err(SourceError::DuplicateId(id)),
            None => Ok(tree),
        }
    }

    fn first_duplicate_identity(&self) -> Option<String> {
        let mut seen = HashSet::new();
        self.live_nodes()
            .filter_map(|n| self.identity(n))
            .find(|id| !seen.insert(*id))
            .map(str::to_string)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn into_source(self) -> String {
        self.source
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn imports(&self) -> &[ImportDecl] {
        &self.imports
    }

    pub fn id_attribute(&self) -> &str {
        &self.id_attr
    }

    /// All names brought into scope by import declarations
    pub fn imported_names(&self) -> HashSet<&str> {
        self.imports
            .iter()
            .flat_map(|decl| decl.names.iter().map(String::as_str))
            .collect()
    }

    fn live_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| !n.detached)
    }

    pub(crate) fn identity<'n>(&self, node: &'n Node) -> Option<&'n str> {
        node.attr_str(&self.id_attr)
    }

    /// Resolve an identity value to a live node
    pub fn find(&self, id: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| !n.detached && self.identity(n) == Some(id))
    }

    /// Source text of a node
    pub fn text_of(&self, id: NodeId) -> &str {
        let span = self.nodes[id].span;
        &self.source[span.start..span.end]
    }

    /// Map of identity value to boundary, for every element carrying one.
    /// After a degraded duplicate the first occurrence wins.
    pub fn boundaries(&self) -> BTreeMap<String, Boundary> {
        let mut map = BTreeMap::new();
        for node in self.live_nodes() {
            if let Some(id) = self.identity(node) {
                map.entry(id.to_string()).or_insert_with(|| Boundary {
                    start_char: node.span.start,
                    end_char: node.span.end,
                    kind: node.tag.clone(),
                });
            }
        }
        map
    }

    /// Pre-order node ids of the subtree rooted at `id`
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next].children.iter().rev());
        }
        out
    }

    /// Concatenated text of a subtree
    pub fn text_content(&self, id: NodeId) -> String {
        self.subtree(id)
            .into_iter()
            .flat_map(|n| self.nodes[n].text.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Replace `source[start..end]` with `text` and shift the arena to match.
    ///
    /// Nodes wholly inside a non-empty removed range are detached; callers
    /// graft any replacement nodes afterwards.
    pub(crate) fn splice(&mut self, start: usize, end: usize, text: &str) {
        self.source.replace_range(start..end, text);
        let removed = end - start;
        let added = text.len();
        let shift = |pos: usize| pos + added - removed;

        for node in self.nodes.iter_mut().filter(|n| !n.detached) {
            let span = node.span;
            if span.end <= start {
                continue;
            }
            if span.start >= end {
                node.span = Span::new(shift(span.start), shift(span.end));
                for attr in &mut node.attrs {
                    if let Some(v) = attr.value_span.as_mut() {
                        *v = Span::new(shift(v.start), shift(v.end));
                    }
                }
            } else if removed > 0 && span.start >= start && span.end <= end {
                node.detached = true;
            } else {
                node.span.end = shift(span.end);
                for attr in &mut node.attrs {
                    if let Some(v) = attr.value_span.as_mut() {
                        if v.start >= end {
                            *v = Span::new(shift(v.start), shift(v.end));
                        }
                    }
                }
            }
        }

        let detached: HashSet<NodeId> = (0..self.nodes.len())
            .filter(|&i| self.nodes[i].detached)
            .collect();
        for node in self.nodes.iter_mut() {
            node.children.retain(|c| !detached.contains(c));
        }
        self.imports = parse_imports(&self.source);
    }

    /// Parse the elements found in `[offset, limit)` and attach them to
    /// `parent` at child position `index`. Returns the new top-level nodes.
    /// On a parse error the arena is left as it was.
    pub(crate) fn graft(
        &mut self,
        parent: Option<NodeId>,
        index: usize,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<NodeId>, SourceError> {
        let base = self.nodes.len();
        let mut grafted = Vec::new();
        let mut parser = Parser::new(&self.source, offset, &mut self.nodes);
        let parsed = loop {
            parser.skip_ws();
            if parser.pos() >= limit {
                break Ok(());
            }
            match parser.parse_element(parent) {
                Ok(id) => grafted.push(id),
                Err(e) => break Err(e),
            }
        };
        if let Err(e) = parsed {
            self.nodes.truncate(base);
            return Err(e);
        }

        match parent {
            Some(p) => {
                let children = &mut self.nodes[p].children;
                let at = index.min(children.len());
                children.splice(at..at, grafted.iter().copied());
            }
            None => {
                if let Some(&first) = grafted.first() {
                    self.root = first;
                }
            }
        }
        Ok(grafted)
    }

    /// Position of `id` among its parent's children
    pub(crate) fn child_index(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.nodes[id].parent?;
        let index = self.nodes[parent].children.iter().position(|&c| c == id)?;
        Some((parent, index))
    }

    /// JSON-friendly projection of the markup
    pub fn to_component_tree(&self) -> ComponentNode {
        self.project(self.root)
    }

    fn project(&self, id: NodeId) -> ComponentNode {
        let node = &self.nodes[id];
        let component = if node.is_fragment() {
            "Fragment".to_string()
        } else {
            node.tag.clone()
        };
        let identity = self
            .identity(node)
            .map(str::to_string)
            .unwrap_or_else(|| format!("node-{}", id));

        let mut props = Map::new();
        for attr in &node.attrs {
            let value = match &attr.value {
                AttrValue::Str(v) => Value::String(v.clone()),
                AttrValue::Expr(e) => Value::String(format!("{{{}}}", e)),
                AttrValue::Bare => Value::Bool(true),
                AttrValue::Spread(_) => continue,
            };
            props.insert(attr.name.clone(), value);
        }

        let mut projected = ComponentNode::new(component, identity);
        projected.props = props;
        if !node.text.is_empty() {
            projected.content = Some(node.text.join(" "));
        }
        projected.children = node.children.iter().map(|&c| self.project(c)).collect();
        projected
    }

    /// Summaries of the target's siblings, for scoped-edit prompts
    pub fn sibling_summaries(&self, id: NodeId) -> Vec<SiblingSummary> {
        let Some(parent) = self.nodes[id].parent else {
            return Vec::new();
        };
        self.nodes[parent]
            .children
            .iter()
            .filter(|&&c| c != id)
            .map(|&c| SiblingSummary {
                id: self
                    .identity(&self.nodes[c])
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("node-{}", c)),
                kind: self.nodes[c].tag.clone(),
                excerpt: self.text_content(c).chars().take(EXCERPT_CHARS).collect(),
            })
            .collect()
    }

    /// e.g. "Heading #2 of 3". None once identities repeat, since the count
    /// could name the wrong element.
    pub fn position_descriptor(&self, id: &str) -> Option<String> {
        let projected = self.to_component_tree();
        if let Err(error) = projected.check_unique_ids() {
            debug!(%error, id, "No position for an ambiguous projection");
            return None;
        }
        projected.position_descriptor(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"import { Html, Section, Text } from "@react-email/components";

export default function Email() {
  return (
    <Html data-id="root">
      <Section data-id="outer">
        <Section data-id="inner">
          <Text data-id="t1">Inner text</Text>
        </Section>
        <Text data-id="t2">Outer text</Text>
      </Section>
    </Html>
  );
}
"#;

    #[test]
    fn test_boundaries_for_nested_same_type() {
        let tree = SourceTree::parse(SAMPLE, "data-id").unwrap();
        let bounds = tree.boundaries();
        assert_eq!(bounds.len(), 5);
        let outer = &bounds["outer"];
        let inner = &bounds["inner"];
        assert_eq!(outer.kind, "Section");
        assert!(outer.start_char < inner.start_char && inner.end_char < outer.end_char);
        assert!(SAMPLE[inner.start_char..inner.end_char].starts_with(r#"<Section data-id="inner">"#));
        assert!(SAMPLE[inner.start_char..inner.end_char].ends_with("</Section>"));
    }

    #[test]
    fn test_duplicate_identity_is_parse_error() {
        let src = r#"<Section data-id="a"><Text data-id="a">x</Text></Section>"#;
        assert_eq!(
            SourceTree::parse(src, "data-id").unwrap_err(),
            SourceError::DuplicateId("a".to_string())
        );
    }

    #[test]
    fn test_no_markup() {
        assert_eq!(
            SourceTree::parse("export const x = 1;", "data-id").unwrap_err(),
            SourceError::NoMarkup
        );
    }

    #[test]
    fn test_splice_shifts_following_nodes() {
        let mut tree = SourceTree::parse(SAMPLE, "data-id").unwrap();
        let t2 = tree.find("t2").unwrap();
        let before = tree.text_of(t2).to_string();
        let inner = tree.find("inner").unwrap();
        let span = tree.node(inner).span;
        tree.splice(span.start, span.end, "");
        assert_eq!(tree.text_of(t2), before);
        assert!(tree.find("inner").is_none());
        assert!(tree.find("t1").is_none());
    }

    #[test]
    fn test_component_projection() {
        let tree = SourceTree::parse(SAMPLE, "data-id").unwrap();
        let projected = tree.to_component_tree();
        assert_eq!(projected.component, "Html");
        assert_eq!(projected.count(), 5);
        assert_eq!(projected.find("t2").unwrap().content.as_deref(), Some("Outer text"));
        assert_eq!(tree.position_descriptor("inner").unwrap(), "Section #2 of 2");
    }

    #[test]
    fn test_sibling_summaries() {
        let tree = SourceTree::parse(SAMPLE, "data-id").unwrap();
        let inner = tree.find("inner").unwrap();
        let siblings = tree.sibling_summaries(inner);
        assert_eq!(siblings.len(), 1);
        assert_eq!(siblings[0].id, "t2");
        assert_eq!(siblings[0].excerpt, "Outer text");
    }
}
