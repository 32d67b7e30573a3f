//! Keyword tables shared by the classifiers and image resolution

/// Verbs that open an imperative edit request
pub const EDIT_VERBS: &[&str] = &[
    "make", "change", "update", "replace", "add", "insert", "remove", "delete", "rewrite", "set",
    "use", "swap", "move", "shorten", "lengthen", "fix", "translate", "duplicate", "copy", "clone",
    "turn", "put", "give", "write", "edit", "adjust", "increase", "decrease", "reorder", "create",
    "center", "align", "bold", "italicize", "capitalize", "simplify", "tweak", "rephrase",
    "reword", "drop",
];

/// Structural keywords that mark an instruction as too complex for a scoped edit
pub const STRUCTURAL_KEYWORDS: &[&str] = &[
    "add",
    "insert",
    "create",
    "section",
    "layout",
    "move",
    "reorder",
    "rearrange",
    "restructure",
];

/// Words implying the user wants different image content
pub const IMAGE_CHANGE_KEYWORDS: &[&str] = &[
    "replace",
    "different",
    "another",
    "photo",
    "image",
    "picture",
    "pic",
    "swap",
];

/// Words stripped from an instruction before using it as an image search keyword
pub const IMAGE_STOPWORDS: &[&str] = &[
    "a", "an", "the", "of", "to", "with", "this", "that", "it", "one", "for", "and", "at", "in",
    "on", "by", "some", "please", "can", "you", "me", "use", "show", "make", "change", "replace",
    "swap", "different", "another", "new", "image", "photo", "picture", "pic", "instead", "showing",
    "something", "like", "i", "want", "would", "could", "be",
];

/// Substrings identifying placeholder image URLs
pub const PLACEHOLDER_URL_MARKERS: &[&str] = &[
    "placeholder",
    "placehold.co",
    "placehold.it",
    "dummyimage.com",
    "example.com/image",
    "example.com/images",
    "picsum.photos",
    "source.unsplash.com/random",
    "{{",
];

/// Canned advisory suggestions, used when the consultation path fails
pub const FALLBACK_SUGGESTIONS: &[&str] = &[
    "Tighten the headline so the main benefit is clear in under eight words.",
    "Keep a single primary call-to-action above the fold.",
    "Make sure the preview text complements the subject line instead of repeating it.",
];

/// Lowercase word tokens of `text`
pub fn tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|ch: char| !ch.is_alphanumeric() && ch != '\'')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// True if any token of `text` is in `keywords`
pub fn contains_keyword(text: &str, keywords: &[&str]) -> bool {
    tokens(text)
        .iter()
        .any(|token| keywords.contains(&token.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_split_on_punctuation() {
        assert_eq!(tokens("Make it BIGGER, please!"), vec!["make", "it", "bigger", "please"]);
    }

    #[test]
    fn test_contains_keyword_matches_whole_words() {
        assert!(contains_keyword("add a row", STRUCTURAL_KEYWORDS));
        assert!(!contains_keyword("address line", STRUCTURAL_KEYWORDS));
    }
}
