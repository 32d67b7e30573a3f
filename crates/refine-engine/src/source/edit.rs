//! Structural edits on a parsed source tree

use super::imports::{missing_imports, parse_fragment, COMPONENTS_MODULE};
use super::parser::{AttrValue, Node, NodeId, Span};
use super::tree::SourceTree;
use crate::error::SourceError;
use std::cmp::Reverse;
use std::collections::HashSet;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Result of a duplicate
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateOutcome {
    /// Identity of the clone's root, when it carries one
    pub new_id: Option<String>,
    /// The raw-copy fallback was used; identities may now repeat
    pub degraded: bool,
}

/// Result of a replace
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReplaceOutcome {
    pub changed: bool,
    /// Component names appended to the import list
    pub added_imports: Vec<String>,
}

/// Fresh identity value for a cloned element, e.g. `section-1f0c9a2b`
pub fn fresh_id(tag: &str) -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    let prefix = if tag.is_empty() {
        "node".to_string()
    } else {
        tag.to_ascii_lowercase()
    };
    format!("{}-{}", prefix, &uuid[..8])
}

impl SourceTree {
    fn resolve(&self, id: &str) -> Result<NodeId, SourceError> {
        self.find(id)
            .ok_or_else(|| SourceError::UnknownTarget(id.to_string()))
    }

    /// Whitespace between the start of the line and `pos`, if nothing else precedes it
    fn line_indent(&self, pos: usize) -> String {
        let line_start = self.source[..pos].rfind('\n').map_or(0, |i| i + 1);
        let prefix = &self.source[line_start..pos];
        if prefix.chars().all(char::is_whitespace) {
            prefix.to_string()
        } else {
            String::new()
        }
    }

    /// Source text of a subtree with every identity value regenerated.
    /// Returns the text and the clone root's new identity.
    fn clone_text(&self, node: NodeId) -> Result<(String, Option<String>), SourceError> {
        let span = self.nodes[node].span;
        let mut rewrites: Vec<(Span, String)> = Vec::new();
        let mut root_id = None;

        for n in self.subtree(node) {
            let element = &self.nodes[n];
            let Some(attr) = element.attr(&self.id_attr) else {
                continue;
            };
            match (&attr.value, attr.value_span) {
                (AttrValue::Str(_), Some(value_span)) => {
                    let fresh = fresh_id(&element.tag);
                    if n == node {
                        root_id = Some(fresh.clone());
                    }
                    rewrites.push((value_span, fresh));
                }
                _ => {
                    return Err(SourceError::CloneFailed(format!(
                        "<{}> has a non-literal {}",
                        element.tag, self.id_attr
                    )))
                }
            }
        }

        let mut text = self.source[span.start..span.end].to_string();
        rewrites.sort_by_key(|(value_span, _)| Reverse(value_span.start));
        for (value_span, fresh) in rewrites {
            text.replace_range(value_span.start - span.start..value_span.end - span.start, &fresh);
        }
        Ok((text, root_id))
    }

    /// Insert `text` on its own line after byte `at` and graft it as the
    /// sibling following child `index` of `parent`
    fn insert_after(
        &mut self,
        parent: NodeId,
        index: usize,
        at: usize,
        indent: &str,
        text: &str,
    ) -> Result<(), SourceError> {
        let inserted = format!("\n{}{}", indent, text);
        self.splice(at, at, &inserted);
        self.graft(Some(parent), index + 1, at, at + inserted.len())?;
        Ok(())
    }

    /// Remove an element: `source[..start] + source[end..]`
    #[instrument(skip(self))]
    pub fn delete(&mut self, id: &str) -> Result<(), SourceError> {
        let node = self.resolve(id)?;
        if node == self.root {
            return Err(SourceError::RootElement);
        }
        let span = self.nodes[node].span;
        self.splice(span.start, span.end, "");
        debug!(start = span.start, end = span.end, "Deleted element");
        Ok(())
    }

    /// Deep-clone an element with fresh identities and insert it as the next
    /// sibling. Falls back to a raw copy when the clone cannot be built.
    #[instrument(skip(self))]
    pub fn duplicate(&mut self, id: &str) -> Result<DuplicateOutcome, SourceError> {
        let node = self.resolve(id)?;
        let (parent, index) = self.child_index(node).ok_or(SourceError::RootElement)?;
        let span = self.nodes[node].span;
        let indent = self.line_indent(span.start);

        let snapshot = self.clone();
        let structured = self.clone_text(node).and_then(|(text, new_id)| {
            self.insert_after(parent, index, span.end, &indent, &text)?;
            Ok(new_id)
        });

        match structured {
            Ok(new_id) => {
                debug!(new_id = ?new_id, "Duplicated element");
                Ok(DuplicateOutcome {
                    new_id,
                    degraded: false,
                })
            }
            Err(error) => {
                *self = snapshot;
                warn!(%error, "Structured duplicate failed, inserting raw copy");
                let raw = self.text_of(node).to_string();
                let inserted = format!("\n{}{}", indent, raw);
                self.splice(span.end, span.end, &inserted);
                let limit = span.end + inserted.len();
                if let Err(error) = self.graft(Some(parent), index + 1, span.end, limit) {
                    warn!(%error, "Raw copy not indexed");
                }
                Ok(DuplicateOutcome {
                    new_id: None,
                    degraded: true,
                })
            }
        }
    }

    /// Catalog components used by `replacement` that are not yet imported
    pub fn missing_components(&self, replacement: &str) -> Result<Vec<String>, SourceError> {
        let fragment = parse_fragment(replacement)?;
        missing_imports(&fragment, &self.imported_names())
    }

    /// Splice replacement markup over an element and complete the imports.
    ///
    /// The replacement keeps the target's identity when it omits one. It may
    /// not repeat an identity, nor reuse one held outside the target.
    #[instrument(skip(self, replacement), fields(len = replacement.len()))]
    pub fn replace(&mut self, id: &str, replacement: &str) -> Result<ReplaceOutcome, SourceError> {
        let node = self.resolve(id)?;

        let mut text = replacement.trim().to_string();
        let mut fragment = parse_fragment(&text)?;
        let identity_at = fragment
            .first()
            .filter(|first| !first.is_fragment() && first.attr(&self.id_attr).is_none())
            .map(|first| first.span.start + 1 + first.tag.len());
        if let Some(at) = identity_at {
            text.insert_str(at, &format!(" {}=\"{}\"", self.id_attr, id));
            fragment = parse_fragment(&text)?;
        }

        let mut seen = HashSet::new();
        if let Some(repeat) = fragment
            .iter()
            .filter_map(|n| n.attr_str(&self.id_attr))
            .find(|v| !seen.insert(*v))
        {
            return Err(SourceError::DuplicateId(repeat.to_string()));
        }

        let target_subtree: HashSet<NodeId> = self.subtree(node).into_iter().collect();
        let held_elsewhere: HashSet<&str> = (0..self.nodes.len())
            .filter(|n| !self.nodes[*n].detached && !target_subtree.contains(n))
            .filter_map(|n| self.identity(&self.nodes[n]))
            .collect();
        if let Some(clash) = fragment
            .iter()
            .filter_map(|n| n.attr_str(&self.id_attr))
            .find(|v| held_elsewhere.contains(v))
        {
            return Err(SourceError::DuplicateId(clash.to_string()));
        }

        let added_imports = missing_imports(&fragment, &self.imported_names())?;
        let span = self.nodes[node].span;
        if self.source[span.start..span.end] == text {
            return Ok(ReplaceOutcome::default());
        }

        let (parent, index) = match self.child_index(node) {
            Some((parent, index)) => (Some(parent), index),
            None => (None, 0),
        };
        self.splice(span.start, span.end, &text);
        self.graft(parent, index, span.start, span.start + text.len())?;
        self.add_imports(&added_imports);

        debug!(added = ?added_imports, "Replaced element");
        Ok(ReplaceOutcome {
            changed: true,
            added_imports,
        })
    }

    /// Import every catalog component the markup uses but does not import
    pub fn complete_imports(&mut self) -> Result<Vec<String>, SourceError> {
        let missing = {
            let live: Vec<Node> = self.nodes.iter().filter(|n| !n.detached).cloned().collect();
            missing_imports(&live, &self.imported_names())?
        };
        self.add_imports(&missing);
        Ok(missing)
    }

    /// Append names to the components import, creating it when absent
    fn add_imports(&mut self, names: &[String]) {
        if names.is_empty() {
            return;
        }
        let existing = self
            .imports
            .iter()
            .find(|decl| decl.module == COMPONENTS_MODULE)
            .map(|decl| decl.names_span);

        match existing {
            Some(names_span) => {
                let current = &self.source[names_span.start..names_span.end];
                let kept = current.trim_end();
                let separator = if kept.trim().is_empty() || kept.ends_with(',') {
                    " "
                } else {
                    ", "
                };
                let at = names_span.start + kept.len();
                let insert = format!("{}{}", separator, names.join(", "));
                self.splice(at, at, &insert);
            }
            None => {
                let line = format!(
                    "import {{ {} }} from \"{}\";\n",
                    names.join(", "),
                    COMPONENTS_MODULE
                );
                self.splice(0, 0, &line);
            }
        }
    }
}
