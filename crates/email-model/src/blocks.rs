//! Semantic content blocks and their field schemas
//!
//! Every block variant carries ALL of its required fields. A block that is
//! missing one of them cannot be deserialized into [`SemanticBlock`] and so
//! can never reach the renderer.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Discriminant of a [`SemanticBlock`], as it appears in the `blockType` tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Hero,
    Features,
    Cta,
    Footer,
    Testimonial,
    Stats,
    Pricing,
    Article,
    List,
    Gallery,
    Ecommerce,
    Content,
    Heading,
}

/// Shape a required field must have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    /// A single string
    Text,
    /// An array of strings
    TextList,
    /// An array of objects, each carrying the listed required string fields
    ItemList(&'static [&'static str]),
}

/// A required field of a block type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Wire name (camelCase)
    pub name: &'static str,
    pub shape: FieldShape,
}

const fn text(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        shape: FieldShape::Text,
    }
}

const fn text_list(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        shape: FieldShape::TextList,
    }
}

const fn items(name: &'static str, fields: &'static [&'static str]) -> FieldSpec {
    FieldSpec {
        name,
        shape: FieldShape::ItemList(fields),
    }
}

const HERO_FIELDS: &[FieldSpec] = &[text("headline"), text("ctaText"), text("ctaUrl")];
const FEATURES_FIELDS: &[FieldSpec] = &[
    text("title"),
    items("features", &["title", "description"]),
];
const CTA_FIELDS: &[FieldSpec] = &[text("headline"), text("buttonText"), text("buttonUrl")];
const FOOTER_FIELDS: &[FieldSpec] = &[text("companyName"), text("unsubscribeUrl")];
const TESTIMONIAL_FIELDS: &[FieldSpec] = &[text("quote"), text("author")];
const STATS_FIELDS: &[FieldSpec] = &[items("stats", &["value", "label"])];
const PRICING_FIELDS: &[FieldSpec] = &[items(
    "plans",
    &["name", "price", "ctaText", "ctaUrl"],
)];
const ARTICLE_FIELDS: &[FieldSpec] = &[text("title"), text("excerpt"), text("url")];
const LIST_FIELDS: &[FieldSpec] = &[text("title"), text_list("items")];
const GALLERY_FIELDS: &[FieldSpec] = &[items("images", &["url", "alt"])];
const ECOMMERCE_FIELDS: &[FieldSpec] = &[items(
    "products",
    &["name", "price", "imageUrl", "url"],
)];
const CONTENT_FIELDS: &[FieldSpec] = &[text_list("paragraphs")];
const HEADING_FIELDS: &[FieldSpec] = &[text("text")];

impl BlockType {
    pub const ALL: [BlockType; 13] = [
        Self::Hero,
        Self::Features,
        Self::Cta,
        Self::Footer,
        Self::Testimonial,
        Self::Stats,
        Self::Pricing,
        Self::Article,
        Self::List,
        Self::Gallery,
        Self::Ecommerce,
        Self::Content,
        Self::Heading,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::Features => "features",
            Self::Cta => "cta",
            Self::Footer => "footer",
            Self::Testimonial => "testimonial",
            Self::Stats => "stats",
            Self::Pricing => "pricing",
            Self::Article => "article",
            Self::List => "list",
            Self::Gallery => "gallery",
            Self::Ecommerce => "ecommerce",
            Self::Content => "content",
            Self::Heading => "heading",
        }
    }

    /// Required fields for this block type
    pub fn required_fields(&self) -> &'static [FieldSpec] {
        match self {
            Self::Hero => HERO_FIELDS,
            Self::Features => FEATURES_FIELDS,
            Self::Cta => CTA_FIELDS,
            Self::Footer => FOOTER_FIELDS,
            Self::Testimonial => TESTIMONIAL_FIELDS,
            Self::Stats => STATS_FIELDS,
            Self::Pricing => PRICING_FIELDS,
            Self::Article => ARTICLE_FIELDS,
            Self::List => LIST_FIELDS,
            Self::Gallery => GALLERY_FIELDS,
            Self::Ecommerce => ECOMMERCE_FIELDS,
            Self::Content => CONTENT_FIELDS,
            Self::Heading => HEADING_FIELDS,
        }
    }

    /// Block types that contain a call-to-action link
    pub fn cta_count(&self) -> usize {
        match self {
            Self::Hero | Self::Cta => 1,
            _ => 0,
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ModelError::UnknownBlockType(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub headline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subheadline: Option<String>,
    pub cta_text: String,
    pub cta_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Overrides the document background for this block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureItem {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturesBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub features: Vec<FeatureItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CtaBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub headline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub button_text: String,
    pub button_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialLink {
    pub platform: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FooterBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub company_name: String,
    pub unsubscribe_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub social_links: Vec<SocialLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub quote: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatItem {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub stats: Vec<StatItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingPlan {
    pub name: String,
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    pub cta_text: String,
    pub cta_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub plans: Vec<PricingPlan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub excerpt: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
    pub url: String,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub images: Vec<GalleryImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub name: String,
    pub price: String,
    pub image_url: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EcommerceBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    pub paragraphs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
}

/// A typed, schema-constrained unit of email content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "blockType", rename_all = "lowercase")]
pub enum SemanticBlock {
    Hero(HeroBlock),
    Features(FeaturesBlock),
    Cta(CtaBlock),
    Footer(FooterBlock),
    Testimonial(TestimonialBlock),
    Stats(StatsBlock),
    Pricing(PricingBlock),
    Article(ArticleBlock),
    List(ListBlock),
    Gallery(GalleryBlock),
    Ecommerce(EcommerceBlock),
    Content(ContentBlock),
    Heading(HeadingBlock),
}

macro_rules! each_variant {
    ($block:expr, $inner:ident => $body:expr) => {
        match $block {
            SemanticBlock::Hero($inner) => $body,
            SemanticBlock::Features($inner) => $body,
            SemanticBlock::Cta($inner) => $body,
            SemanticBlock::Footer($inner) => $body,
            SemanticBlock::Testimonial($inner) => $body,
            SemanticBlock::Stats($inner) => $body,
            SemanticBlock::Pricing($inner) => $body,
            SemanticBlock::Article($inner) => $body,
            SemanticBlock::List($inner) => $body,
            SemanticBlock::Gallery($inner) => $body,
            SemanticBlock::Ecommerce($inner) => $body,
            SemanticBlock::Content($inner) => $body,
            SemanticBlock::Heading($inner) => $body,
        }
    };
}

impl SemanticBlock {
    pub fn block_type(&self) -> BlockType {
        match self {
            Self::Hero(_) => BlockType::Hero,
            Self::Features(_) => BlockType::Features,
            Self::Cta(_) => BlockType::Cta,
            Self::Footer(_) => BlockType::Footer,
            Self::Testimonial(_) => BlockType::Testimonial,
            Self::Stats(_) => BlockType::Stats,
            Self::Pricing(_) => BlockType::Pricing,
            Self::Article(_) => BlockType::Article,
            Self::List(_) => BlockType::List,
            Self::Gallery(_) => BlockType::Gallery,
            Self::Ecommerce(_) => BlockType::Ecommerce,
            Self::Content(_) => BlockType::Content,
            Self::Heading(_) => BlockType::Heading,
        }
    }

    pub fn id(&self) -> Option<&str> {
        each_variant!(self, b => b.id.as_deref())
    }

    pub fn set_id(&mut self, id: Option<String>) {
        each_variant!(self, b => b.id = id)
    }

    /// Image URLs referenced by this block, in field order
    pub fn image_urls(&self) -> Vec<&str> {
        match self {
            Self::Hero(b) => b.image_url.iter().map(String::as_str).collect(),
            Self::Testimonial(b) => b.avatar_url.iter().map(String::as_str).collect(),
            Self::Article(b) => b.image_url.iter().map(String::as_str).collect(),
            Self::Gallery(b) => b.images.iter().map(|i| i.url.as_str()).collect(),
            Self::Ecommerce(b) => b.products.iter().map(|p| p.image_url.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    /// Whether this block carries image content
    pub fn has_images(&self) -> bool {
        matches!(
            self.block_type(),
            BlockType::Gallery | BlockType::Ecommerce
        ) || !self.image_urls().is_empty()
    }

    /// Short human-readable summary used in prompts and sibling lists
    pub fn summary(&self) -> String {
        let label = match self {
            Self::Hero(b) => b.headline.clone(),
            Self::Features(b) => b.title.clone(),
            Self::Cta(b) => b.headline.clone(),
            Self::Footer(b) => b.company_name.clone(),
            Self::Testimonial(b) => b.author.clone(),
            Self::Stats(b) => format!("{} stats", b.stats.len()),
            Self::Pricing(b) => format!("{} plans", b.plans.len()),
            Self::Article(b) => b.title.clone(),
            Self::List(b) => b.title.clone(),
            Self::Gallery(b) => format!("{} images", b.images.len()),
            Self::Ecommerce(b) => format!("{} products", b.products.len()),
            Self::Content(b) => b
                .heading
                .clone()
                .or_else(|| b.paragraphs.first().cloned())
                .unwrap_or_default(),
            Self::Heading(b) => b.text.clone(),
        };
        format!("{}: {}", self.block_type(), label)
    }

    pub fn to_value(&self) -> Result<serde_json::Value, ModelError> {
        Ok(serde_json::to_value(self)?)
    }
}
