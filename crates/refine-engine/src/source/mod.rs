//! Templated component source
//!
//! - [`parser`]: hand-written parser producing arena nodes with byte spans
//! - [`tree`]: the arena, boundary map and span-shifting splices
//! - [`edit`]: delete, duplicate and replace
//! - [`imports`]: component catalog and import completion

pub mod edit;
pub mod imports;
pub mod parser;
pub mod tree;

pub use edit::{fresh_id, DuplicateOutcome, ReplaceOutcome};
pub use imports::{is_catalog_component, COMPONENTS_MODULE, COMPONENT_CATALOG};
pub use parser::{AttrValue, Attribute, ImportDecl, Node, NodeId, Span};
pub use tree::{Boundary, SourceTree};
