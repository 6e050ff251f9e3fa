//! Minimal indentation-driven parser for the subset of YAML found in API
//! description documents.
//!
//! Every node keeps the 1-based line span it was read from. Anchors, block
//! scalars and multi-document streams are not understood; they come back as
//! plain scalar text or are skipped.

use indexmap::IndexMap;

use crate::error::OpenApiAnalyzerError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Bool(bool),
    /// Numbers only arise from flow collections and keep their source text
    Number(String),
    String(String),
    Sequence(Vec<Node>),
    Mapping(IndexMap<String, Node>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub value: Value,
    pub start_line: usize,
    pub end_line: usize,
}

impl Node {
    fn new(value: Value, start_line: usize, end_line: usize) -> Self {
        Self {
            value,
            start_line,
            end_line,
        }
    }

    fn null(line: usize) -> Self {
        Self::new(Value::Null, line, line)
    }

    fn with_value(mut self, value: Value) -> Self {
        self.value = value;
        self
    }

    /// Child of a mapping node.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping()?.get(key)
    }

    pub fn as_mapping(&self) -> Option<&IndexMap<String, Node>> {
        match &self.value {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match &self.value {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.value, Value::Null)
    }

    pub fn is_true(&self) -> bool {
        matches!(self.value, Value::Bool(true))
    }

    /// Text form of a scalar; `None` for collections.
    pub fn scalar_text(&self) -> Option<String> {
        match &self.value {
            Value::Null => Some("null".to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) | Value::String(n) => Some(n.clone()),
            Value::Sequence(_) | Value::Mapping(_) => None,
        }
    }

    /// Mapping entries in declaration order; empty for non-mappings.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.as_mapping()
            .into_iter()
            .flat_map(|map| map.iter().map(|(k, v)| (k.as_str(), v)))
    }
}

/// Parse a whole document; fails only when there is no content at all.
pub fn parse_document(text: &str) -> Result<Node, OpenApiAnalyzerError> {
    let mut parser = Parser {
        lines: text.lines().collect(),
        pos: 0,
    };
    parser.parse_block(0).ok_or(OpenApiAnalyzerError::EmptyDocument)
}

struct Parser<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

fn is_blank(trimmed: &str) -> bool {
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Blank, comment, or a stray flow-collection closer.
fn is_skippable(trimmed: &str) -> bool {
    is_blank(trimmed) || trimmed == "}" || trimmed == "]"
}

fn is_item(trimmed: &str) -> bool {
    trimmed == "-" || trimmed.starts_with("- ")
}

/// Split `key: value` at the first colon, unquoting the key.
fn split_key(text: &str) -> Option<(String, &str)> {
    let (key, value) = text.split_once(':')?;
    let key = key.trim().trim_matches(|c: char| c == '"' || c == '\'');
    Some((key.to_string(), value))
}

fn span_end<'n>(start: usize, nodes: impl Iterator<Item = &'n Node>) -> usize {
    nodes.map(|n| n.end_line).max().unwrap_or(start)
}

impl<'a> Parser<'a> {
    /// Parse the block starting at the next non-blank line, provided it is
    /// indented at least `min_indent`.
    fn parse_block(&mut self, min_indent: usize) -> Option<Node> {
        while self.pos < self.lines.len() && is_blank(self.lines[self.pos].trim()) {
            self.pos += 1;
        }
        let line = *self.lines.get(self.pos)?;
        let indent = indent_of(line);
        if indent < min_indent {
            return None;
        }

        if is_item(line.trim()) {
            Some(self.parse_sequence(indent))
        } else {
            Some(self.parse_mapping(indent))
        }
    }

    fn parse_mapping(&mut self, indent: usize) -> Node {
        let start = self.pos + 1;
        let mut map = IndexMap::new();
        self.parse_entries(indent, &mut map);
        let end = span_end(start, map.values());
        Node::new(Value::Mapping(map), start, end)
    }

    /// Read `key: value` lines at `indent` or deeper into `map`.
    fn parse_entries(&mut self, indent: usize, map: &mut IndexMap<String, Node>) {
        while self.pos < self.lines.len() {
            let line = self.lines[self.pos];
            let trimmed = line.trim();
            if is_skippable(trimmed) {
                self.pos += 1;
                continue;
            }

            let current = indent_of(line);
            if current < indent {
                break;
            }
            if is_item(trimmed) {
                if current == indent {
                    break;
                }
                // orphaned item deeper than any open sequence
                self.pos += 1;
                continue;
            }

            let Some((key, value)) = split_key(trimmed) else {
                self.pos += 1;
                continue;
            };
            let line_no = self.pos + 1;
            let node = self.parse_value(value, line_no, current);
            map.insert(key, node);
        }
    }

    /// Value of a key found on `line_no`: inline scalar, or the nested block
    /// on the following lines.
    fn parse_value(&mut self, value: &str, line_no: usize, key_indent: usize) -> Node {
        let value = value.trim();
        self.pos += 1;
        if !value.is_empty() && !matches!(value, "{" | "}" | "{}") {
            return parse_scalar(value, line_no);
        }

        match self.parse_block(key_indent + 2) {
            Some(mut child) => {
                child.start_line = line_no;
                child
            }
            None => Node::null(line_no),
        }
    }

    fn parse_sequence(&mut self, indent: usize) -> Node {
        let start = self.pos + 1;
        let mut items = Vec::new();

        while self.pos < self.lines.len() {
            let line = self.lines[self.pos];
            let trimmed = line.trim();
            if is_skippable(trimmed) {
                self.pos += 1;
                continue;
            }
            let current = indent_of(line);
            if current < indent || !is_item(trimmed) {
                break;
            }

            let line_no = self.pos + 1;
            let item_indent = current + 2;
            let content = trimmed[1..].trim();

            if content.is_empty() {
                self.pos += 1;
                if let Some(mut child) = self.parse_block(item_indent) {
                    child.start_line = line_no;
                    items.push(child);
                }
            } else if let Some((key, value)) = split_key(content) {
                let mut map = IndexMap::new();
                let first = self.parse_value(value, line_no, item_indent);
                map.insert(key, first);
                self.parse_entries(item_indent, &mut map);
                let end = span_end(line_no, map.values());
                items.push(Node::new(Value::Mapping(map), line_no, end));
            } else {
                self.pos += 1;
                items.push(parse_scalar(content, line_no));
            }
        }

        let start = items.first().map_or(start, |n| n.start_line);
        let end = span_end(start, items.iter());
        Node::new(Value::Sequence(items), start, end)
    }
}

fn parse_scalar(text: &str, line: usize) -> Node {
    let quoted = text.len() >= 2
        && ((text.starts_with('"') && text.ends_with('"'))
            || (text.starts_with('\'') && text.ends_with('\'')));
    let text = if quoted { &text[1..text.len() - 1] } else { text };

    let value = if text.eq_ignore_ascii_case("true") {
        Value::Bool(true)
    } else if text.eq_ignore_ascii_case("false") {
        Value::Bool(false)
    } else if text.starts_with('[') || text.starts_with('{') {
        match serde_json::from_str::<serde_json::Value>(&text.replace('\'', "\"")) {
            Ok(json) => return from_json(json, line),
            Err(_) => flow_fallback(text, line),
        }
    } else {
        Value::String(text.to_string())
    };
    Node::null(line).with_value(value)
}

/// `[a, b c]` that is not valid JSON: split on commas and spaces.
fn flow_fallback(text: &str, line: usize) -> Value {
    if !(text.starts_with('[') && text.ends_with(']')) {
        return Value::String(text.to_string());
    }
    let items = text[1..text.len() - 1]
        .split(|c: char| c == ',' || c == ' ')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| Node::null(line).with_value(Value::String(part.to_string())))
        .collect();
    Value::Sequence(items)
}

fn from_json(json: serde_json::Value, line: usize) -> Node {
    let value = match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Number(n.to_string()),
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => {
            Value::Sequence(items.into_iter().map(|v| from_json(v, line)).collect())
        }
        serde_json::Value::Object(map) => Value::Mapping(
            map.into_iter()
                .map(|(k, v)| (k, from_json(v, line)))
                .collect(),
        ),
    };
    Node::null(line).with_value(value)
}
