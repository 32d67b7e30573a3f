//! Email campaign document model
//!
//! An email exists in one of two representations:
//! - a flat, ordered list of typed semantic blocks ([`BlockDocument`])
//! - templated component source text ([`SourceDocument`]) whose parsed
//!   elements project onto [`ComponentNode`] trees
//!
//! The refinement pipeline consumes an [`EmailDocument`] plus a
//! [`RefinementContext`] and produces an [`EditOutcome`].

pub mod blocks;
pub mod component;
pub mod context;
pub mod document;
pub mod error;
pub mod outcome;
pub mod settings;

pub use blocks::{
    ArticleBlock, BlockType, ContentBlock, CtaBlock, EcommerceBlock, FeatureItem, FeaturesBlock,
    FieldShape, FieldSpec, FooterBlock, GalleryBlock, GalleryImage, HeadingBlock, HeroBlock,
    ListBlock, PricingBlock, PricingPlan, Product, SemanticBlock, SocialLink, StatItem,
    StatsBlock, TestimonialBlock,
};
pub use component::ComponentNode;
pub use context::{RefinementContext, SiblingSummary, SourceChannel};
pub use document::{BlockDocument, EmailDocument, SourceDocument};
pub use error::ModelError;
pub use outcome::{EditOutcome, EditStrategy, OutcomeKind};
pub use settings::StyleSettings;
