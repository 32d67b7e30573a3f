//! Image reference resolution
//!
//! Keywords are derived from the instruction (or an image's alt text),
//! resolved through the [`ImageSearch`] collaborator, and substituted for
//! placeholder URLs the AI introduced. URLs already present in the original
//! document are never replaced.

use crate::patterns::{tokens, IMAGE_STOPWORDS, PLACEHOLDER_URL_MARKERS};
use crate::services::{ImageQuery, ImageSearch, ResolvedImage};
use futures::future::join_all;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

const MAX_KEYWORD_WORDS: usize = 4;
const MAX_DESIGN_KEYWORDS: usize = 2;

/// Keys whose string value is an image URL
const IMAGE_URL_KEYS: &[&str] = &["imageUrl", "avatarUrl", "backgroundImage", "logoUrl"];

lazy_static! {
    static ref IMG_TAG: Regex = Regex::new(r"<Img\b[^>]*>").unwrap();
    static ref SRC_ATTR: Regex = Regex::new(r#"\bsrc\s*=\s*["']([^"']*)["']"#).unwrap();
    static ref ALT_ATTR: Regex = Regex::new(r#"\balt\s*=\s*["']([^"']*)["']"#).unwrap();
}

/// An image position found in a candidate document
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSlot {
    pub url: String,
    /// Alt text, when the slot has one
    pub hint: Option<String>,
}

pub fn is_placeholder_url(url: &str) -> bool {
    let lower = url.trim().to_lowercase();
    lower.is_empty() || PLACEHOLDER_URL_MARKERS.iter().any(|m| lower.contains(m))
}

/// Descriptive search keyword from free text, biased by design keywords
pub fn extract_image_keyword(text: &str, design_keywords: &[String]) -> Option<String> {
    let mut words: Vec<String> = tokens(text)
        .into_iter()
        .filter(|t| !IMAGE_STOPWORDS.contains(&t.as_str()) && !t.chars().all(|c| c.is_ascii_digit()))
        .take(MAX_KEYWORD_WORDS)
        .collect();
    if words.is_empty() {
        return None;
    }
    for keyword in design_keywords.iter().take(MAX_DESIGN_KEYWORDS) {
        let keyword = keyword.trim().to_lowercase();
        if !keyword.is_empty() && !words.contains(&keyword) {
            words.push(keyword);
        }
    }
    Some(words.join(" "))
}

fn collect_slots(value: &Value, slots: &mut Vec<ImageSlot>) {
    match value {
        Value::Object(map) => {
            let hint = map.get("alt").and_then(Value::as_str).map(str::to_string);
            for key in IMAGE_URL_KEYS {
                if let Some(url) = map.get(*key).and_then(Value::as_str) {
                    slots.push(ImageSlot {
                        url: url.to_string(),
                        hint: hint.clone(),
                    });
                }
            }
            if hint.is_some() {
                if let Some(url) = map.get("url").and_then(Value::as_str) {
                    slots.push(ImageSlot {
                        url: url.to_string(),
                        hint: hint.clone(),
                    });
                }
            }
            map.values().for_each(|v| collect_slots(v, slots));
        }
        Value::Array(items) => items.iter().for_each(|v| collect_slots(v, slots)),
        _ => {}
    }
}

/// Image slots of a block list
pub fn block_image_slots(blocks: &[Value]) -> Vec<ImageSlot> {
    let mut slots = Vec::new();
    blocks.iter().for_each(|b| collect_slots(b, &mut slots));
    slots
}

/// Image slots of `<Img>` elements in template source
pub fn source_image_slots(source: &str) -> Vec<ImageSlot> {
    IMG_TAG
        .find_iter(source)
        .filter_map(|tag| {
            let tag = tag.as_str();
            let url = SRC_ATTR.captures(tag)?.get(1)?.as_str().to_string();
            let hint = ALT_ATTR
                .captures(tag)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .filter(|alt| !alt.trim().is_empty());
            Some(ImageSlot { url, hint })
        })
        .collect()
}

/// Placeholder slots that did not exist in the original, first occurrence only
pub fn new_placeholders(slots: Vec<ImageSlot>, original_urls: &HashSet<String>) -> Vec<ImageSlot> {
    let mut seen = HashSet::new();
    slots
        .into_iter()
        .filter(|slot| is_placeholder_url(&slot.url) && !original_urls.contains(&slot.url))
        .filter(|slot| seen.insert(slot.url.clone()))
        .collect()
}

/// Resolve queries concurrently. Failed lookups are dropped.
pub async fn resolve_all(search: &dyn ImageSearch, queries: Vec<ImageQuery>) -> Vec<Option<ResolvedImage>> {
    let lookups = queries.iter().map(|query| async move {
        match search.resolve(query).await {
            Ok(image) => Some(image),
            Err(error) => {
                warn!(keyword = %query.keyword, %error, "Image lookup failed");
                None
            }
        }
    });
    join_all(lookups).await
}

/// Resolve every placeholder slot, returning placeholder URL to resolved URL
pub async fn resolve_placeholders(
    search: &dyn ImageSearch,
    slots: &[ImageSlot],
    instruction_keyword: Option<&str>,
    design_keywords: &[String],
) -> HashMap<String, String> {
    let (placeholders, queries): (Vec<&str>, Vec<ImageQuery>) = slots
        .iter()
        .filter_map(|slot| {
            let keyword = slot
                .hint
                .as_deref()
                .and_then(|hint| extract_image_keyword(hint, design_keywords))
                .or_else(|| instruction_keyword.map(str::to_string))?;
            Some((slot.url.as_str(), ImageQuery::landscape(keyword)))
        })
        .unzip();

    debug!(count = queries.len(), "Resolving placeholder images");
    placeholders
        .into_iter()
        .zip(resolve_all(search, queries).await)
        .filter_map(|(placeholder, image)| Some((placeholder.to_string(), image?.url)))
        .collect()
}

fn substitute_value(value: &mut Value, replacements: &HashMap<String, String>) {
    match value {
        Value::String(s) => {
            if let Some(url) = replacements.get(s.as_str()) {
                *s = url.clone();
            }
        }
        Value::Object(map) => map.values_mut().for_each(|v| substitute_value(v, replacements)),
        Value::Array(items) => items.iter_mut().for_each(|v| substitute_value(v, replacements)),
        _ => {}
    }
}

/// Substitute resolved URLs into a block list
pub fn substitute_blocks(blocks: &mut [Value], replacements: &HashMap<String, String>) {
    blocks
        .iter_mut()
        .for_each(|b| substitute_value(b, replacements));
}

/// Substitute resolved URLs into `src` attributes of template source
pub fn substitute_source(source: &str, replacements: &HashMap<String, String>) -> String {
    IMG_TAG
        .replace_all(source, |caps: &regex::Captures| {
            let tag = &caps[0];
            SRC_ATTR
                .replace(tag, |src: &regex::Captures| match replacements.get(&src[1]) {
                    Some(url) => format!("src=\"{}\"", url),
                    None => src[0].to_string(),
                })
                .into_owned()
        })
        .into_owned()
}
