//! Component source parser
//!
//! Parses templated email source (import declarations followed by JSX-like
//! markup) into an arena of element nodes with exact byte spans. Expression
//! children (`{...}`) are opaque; elements nested inside them are not indexed.

use crate::error::SourceError;
use lazy_static::lazy_static;
use regex::Regex;

pub type NodeId = usize;

/// Half-open byte range `[start, end)` into the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// `name="text"` or `name='text'`
    Str(String),
    /// `name={expr}`, braces stripped
    Expr(String),
    /// `name`
    Bare,
    /// `{...expr}`
    Spread(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: AttrValue,
    /// Span of a string value's contents, quotes excluded
    pub value_span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Tag name; empty for fragments
    pub tag: String,
    pub span: Span,
    pub attrs: Vec<Attribute>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Trimmed text children, in order
    pub text: Vec<String>,
    /// Removed from the tree by an edit
    pub detached: bool,
}

impl Node {
    pub fn attr(&self, name: &str) -> Option<&Attribute> {
        self.attrs.iter().find(|a| a.name == name)
    }

    /// String value of an attribute
    pub fn attr_str(&self, name: &str) -> Option<&str> {
        match self.attr(name).map(|a| &a.value) {
            Some(AttrValue::Str(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn is_fragment(&self) -> bool {
        self.tag.is_empty()
    }

    /// Capitalized tags are components; lowercase ones are host elements
    pub fn is_component(&self) -> bool {
        self.tag.chars().next().is_some_and(|c| c.is_ascii_uppercase())
    }
}

/// `import { A, B } from "module";`
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub names: Vec<String>,
    pub module: String,
    /// Span of the text between the braces
    pub names_span: Span,
}

lazy_static! {
    static ref IMPORT_PATTERN: Regex =
        Regex::new(r#"(?m)^[ \t]*import\s*(?:type\s+)?\{([^}]*)\}\s*from\s*["']([^"']+)["'][ \t]*;?"#)
            .unwrap();
}

/// Parse named import declarations
pub fn parse_imports(source: &str) -> Vec<ImportDecl> {
    IMPORT_PATTERN
        .captures_iter(source)
        .filter_map(|caps| {
            let names = caps.get(1)?;
            let module = caps.get(2)?;
            Some(ImportDecl {
                names: names
                    .as_str()
                    .split(',')
                    .map(|n| n.trim())
                    .filter(|n| !n.is_empty())
                    .map(|n| n.split(" as ").last().unwrap_or(n).trim().to_string())
                    .collect(),
                module: module.as_str().to_string(),
                names_span: Span::new(names.start(), names.end()),
            })
        })
        .collect()
}

/// End of the import section (0 when there are no imports)
pub fn imports_end(source: &str) -> usize {
    IMPORT_PATTERN
        .find_iter(source)
        .last()
        .map(|m| m.end())
        .unwrap_or(0)
}

fn is_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'_' | b'-' | b'.' | b':' | b'$')
}

/// Find where markup begins: the first `<Tag` or `<>` in expression position
pub fn find_markup_start(source: &str, from: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        if bytes[i] == b'<' {
            let next = bytes.get(i + 1).copied();
            let opens = matches!(next, Some(c) if c.is_ascii_alphabetic() || c == b'>');
            if opens {
                let before = source[from..i].trim_end();
                let in_expression_position = before.is_empty()
                    || before.ends_with(['(', '=', ',', '?', ':', '{', '>'])
                    || before.ends_with("return");
                if in_expression_position {
                    return Some(i);
                }
            }
        }
        i += 1;
    }
    None
}

/// Recursive-descent parser over a source string, appending to an arena
pub struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    nodes: &'a mut Vec<Node>,
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str, pos: usize, nodes: &'a mut Vec<Node>) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos,
            nodes,
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn eof(&self) -> SourceError {
        SourceError::UnexpectedEof(self.pos)
    }

    fn unexpected(&self, expected: &'static str) -> SourceError {
        match self.src[self.pos..].chars().next() {
            Some(found) => SourceError::Unexpected {
                pos: self.pos,
                found,
                expected,
            },
            None => self.eof(),
        }
    }

    pub fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, byte: u8, expected: &'static str) -> Result<(), SourceError> {
        match self.peek() {
            Some(c) if c == byte => {
                self.pos += 1;
                Ok(())
            }
            Some(_) => Err(self.unexpected(expected)),
            None => Err(self.eof()),
        }
    }

    fn read_name(&mut self) -> String {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if is_name_char(c)) {
            self.pos += 1;
        }
        self.src[start..self.pos].to_string()
    }

    /// Skip a quoted string starting at the current quote character
    fn skip_string(&mut self) -> Result<(), SourceError> {
        let quote = self.peek().ok_or_else(|| self.eof())?;
        self.pos += 1;
        while let Some(c) = self.peek() {
            self.pos += 1;
            if c == b'\\' {
                self.pos += 1;
            } else if c == quote {
                return Ok(());
            }
        }
        Err(self.eof())
    }

    /// Read a balanced `{...}` expression, returning the inner text
    fn read_braced(&mut self) -> Result<String, SourceError> {
        self.expect(b'{', "'{'")?;
        let start = self.pos;
        let mut depth = 1usize;
        while let Some(c) = self.peek() {
            match c {
                b'"' | b'\'' | b'`' => self.skip_string()?,
                b'/' if self.peek_at(1) == Some(b'*') => {
                    let close = self.src[self.pos + 2..]
                        .find("*/")
                        .ok_or(SourceError::UnexpectedEof(self.bytes.len()))?;
                    self.pos += close + 4;
                }
                b'{' => {
                    depth += 1;
                    self.pos += 1;
                }
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        let inner = self.src[start..self.pos].to_string();
                        self.pos += 1;
                        return Ok(inner);
                    }
                    self.pos += 1;
                }
                _ => self.pos += 1,
            }
        }
        Err(self.eof())
    }

    fn read_attribute(&mut self) -> Result<Attribute, SourceError> {
        if self.peek() == Some(b'{') {
            let inner = self.read_braced()?;
            let spread = inner.trim().trim_start_matches("...").trim().to_string();
            return Ok(Attribute {
                name: String::new(),
                value: AttrValue::Spread(spread),
                value_span: None,
            });
        }
        let name = self.read_name();
        if name.is_empty() {
            return Err(self.unexpected("attribute name"));
        }
        self.skip_ws();
        if self.peek() != Some(b'=') {
            return Ok(Attribute {
                name,
                value: AttrValue::Bare,
                value_span: None,
            });
        }
        self.pos += 1;
        self.skip_ws();
        match self.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                self.pos += 1;
                let start = self.pos;
                while let Some(c) = self.peek() {
                    if c == quote {
                        let value = self.src[start..self.pos].to_string();
                        self.pos += 1;
                        return Ok(Attribute {
                            name,
                            value: AttrValue::Str(value),
                            value_span: Some(Span::new(start, self.pos - 1)),
                        });
                    }
                    self.pos += 1;
                }
                Err(self.eof())
            }
            Some(b'{') => {
                let inner = self.read_braced()?;
                Ok(Attribute {
                    name,
                    value: AttrValue::Expr(inner),
                    value_span: None,
                })
            }
            Some(_) => Err(self.unexpected("attribute value")),
            None => Err(self.eof()),
        }
    }

    /// Parse one element (or fragment) starting at the current `<`
    pub fn parse_element(&mut self, parent: Option<NodeId>) -> Result<NodeId, SourceError> {
        let start = self.pos;
        self.expect(b'<', "'<'")?;
        let tag = if self.peek() == Some(b'>') {
            String::new()
        } else {
            self.read_name()
        };

        let id = self.nodes.len();
        self.nodes.push(Node {
            tag: tag.clone(),
            span: Span::new(start, start),
            attrs: Vec::new(),
            parent,
            children: Vec::new(),
            text: Vec::new(),
            detached: false,
        });

        // Attributes
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'/') if self.peek_at(1) == Some(b'>') => {
                    self.pos += 2;
                    self.nodes[id].span.end = self.pos;
                    return Ok(id);
                }
                Some(b'>') => {
                    self.pos += 1;
                    break;
                }
                Some(_) if tag.is_empty() => return Err(self.unexpected("'>'")),
                Some(_) => {
                    let attr = self.read_attribute()?;
                    self.nodes[id].attrs.push(attr);
                }
                None => return Err(self.eof()),
            }
        }

        // Children
        loop {
            match self.peek() {
                None => return Err(self.eof()),
                Some(b'<') if self.peek_at(1) == Some(b'/') => {
                    let close_pos = self.pos;
                    self.pos += 2;
                    self.skip_ws();
                    let closing = self.read_name();
                    self.skip_ws();
                    self.expect(b'>', "'>'")?;
                    if closing != tag {
                        return Err(SourceError::MismatchedTag {
                            expected: tag,
                            found: closing,
                            pos: close_pos,
                        });
                    }
                    self.nodes[id].span.end = self.pos;
                    return Ok(id);
                }
                Some(b'<') if self.src[self.pos..].starts_with("<!--") => {
                    let close = self.src[self.pos..].find("-->").ok_or_else(|| {
                        SourceError::UnexpectedEof(self.bytes.len())
                    })?;
                    self.pos += close + 3;
                }
                Some(b'<') => {
                    let child = self.parse_element(Some(id))?;
                    self.nodes[id].children.push(child);
                }
                Some(b'{') => {
                    self.read_braced()?;
                }
                Some(_) => {
                    let text_start = self.pos;
                    while matches!(self.peek(), Some(c) if c != b'<' && c != b'{') {
                        self.pos += 1;
                    }
                    let text = self.src[text_start..self.pos].trim();
                    if !text.is_empty() {
                        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
                        self.nodes[id].text.push(collapsed);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(src: &str) -> Vec<Node> {
        let mut nodes = Vec::new();
        let start = find_markup_start(src, 0).unwrap();
        Parser::new(src, start, &mut nodes).parse_element(None).unwrap();
        nodes
    }

    #[test]
    fn test_parses_nested_elements_with_spans() {
        let src = r#"<Section data-id="a"><Text>Hello {name}</Text><Img src="x.png" /></Section>"#;
        let nodes = parse(src);
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].span, Span::new(0, src.len()));
        assert_eq!(nodes[0].children, vec![1, 2]);
        assert_eq!(&src[nodes[1].span.start..nodes[1].span.end], "<Text>Hello {name}</Text>");
        assert_eq!(nodes[1].text, vec!["Hello"]);
        assert_eq!(nodes[2].attr_str("src"), Some("x.png"));
    }

    #[test]
    fn test_attribute_forms() {
        let src = r#"<Button href='/a' style={{ color: "red" }} disabled {...rest}>Go</Button>"#;
        let nodes = parse(src);
        let attrs = &nodes[0].attrs;
        assert_eq!(attrs[0].value, AttrValue::Str("/a".to_string()));
        assert_eq!(attrs[1].value, AttrValue::Expr(r#"{ color: "red" }"#.to_string()));
        assert_eq!(attrs[2].value, AttrValue::Bare);
        assert_eq!(attrs[3].value, AttrValue::Spread("rest".to_string()));
        let value_span = attrs[0].value_span.unwrap();
        assert_eq!(&src[value_span.start..value_span.end], "/a");
    }

    #[test]
    fn test_comments_are_skipped() {
        let nodes = parse("<Section><!-- <Text>old</Text> -->{/* note */}<Hr /></Section>");
        assert_eq!(parse("<Text>{/* don't */}hi</Text>")[0].text, vec!["hi"]);
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].tag, "Hr");
    }

    #[test]
    fn test_fragment() {
        let nodes = parse("<><Hr /></>");
        assert!(nodes[0].is_fragment());
        assert_eq!(nodes[0].children.len(), 1);
    }

    #[test]
    fn test_mismatched_tag_is_error() {
        let mut nodes = Vec::new();
        let err = Parser::new("<Section><Text></Section>", 0, &mut nodes)
            .parse_element(None)
            .unwrap_err();
        assert!(matches!(err, SourceError::MismatchedTag { .. }));
    }

    #[test]
    fn test_unterminated_is_eof_error() {
        let mut nodes = Vec::new();
        let err = Parser::new("<Section><Text>hi", 0, &mut nodes)
            .parse_element(None)
            .unwrap_err();
        assert!(matches!(err, SourceError::UnexpectedEof(_)));
    }

    #[test]
    fn test_imports_and_markup_start() {
        let src = "import { Html, Text as T } from \"@react-email/components\";\n\nexport default function Email() {\n  return (\n    <Html></Html>\n  );\n}\n";
        let imports = parse_imports(src);
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].names, vec!["Html", "T"]);
        assert_eq!(imports[0].module, "@react-email/components");
        let start = find_markup_start(src, imports_end(src)).unwrap();
        assert!(src[start..].starts_with("<Html>"));
    }

    #[test]
    fn test_markup_start_skips_comparisons() {
        let src = "const small = a < b;\nconst el = <Text>x</Text>;";
        let start = find_markup_start(src, 0).unwrap();
        assert!(src[start..].starts_with("<Text>"));
    }
}
