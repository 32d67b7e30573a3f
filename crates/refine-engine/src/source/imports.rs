//! Component catalog and import completion

use super::parser::{Node, Parser};
use crate::error::SourceError;
use std::collections::HashSet;

/// Module the catalog components are imported from
pub const COMPONENTS_MODULE: &str = "@react-email/components";

/// Components available to email source
pub const COMPONENT_CATALOG: &[&str] = &[
    "Html",
    "Head",
    "Body",
    "Preview",
    "Container",
    "Section",
    "Row",
    "Column",
    "Heading",
    "Text",
    "Button",
    "Link",
    "Img",
    "Hr",
    "Font",
    "Tailwind",
    "Markdown",
    "CodeBlock",
    "CodeInline",
];

pub fn is_catalog_component(name: &str) -> bool {
    COMPONENT_CATALOG.contains(&name)
}

/// Parse a standalone markup fragment (one or more sibling elements)
pub fn parse_fragment(text: &str) -> Result<Vec<Node>, SourceError> {
    let mut nodes = Vec::new();
    let mut parser = Parser::new(text, 0, &mut nodes);
    parser.skip_ws();
    if parser.pos() >= text.len() {
        return Err(SourceError::NoMarkup);
    }
    while parser.pos() < text.len() {
        parser.parse_element(None)?;
        parser.skip_ws();
    }
    Ok(nodes)
}

/// Component names used by `nodes` that are not in `imported`, in first-use
/// order. Unknown capitalized names are an error.
pub fn missing_imports(nodes: &[Node], imported: &HashSet<&str>) -> Result<Vec<String>, SourceError> {
    let mut missing: Vec<String> = Vec::new();
    for node in nodes.iter().filter(|n| n.is_component()) {
        let name = node.tag.as_str();
        if imported.contains(name) || missing.iter().any(|m| m == name) {
            continue;
        }
        if !is_catalog_component(name) {
            return Err(SourceError::UnknownComponent(name.to_string()));
        }
        missing.push(name.to_string());
    }
    Ok(missing)
}
