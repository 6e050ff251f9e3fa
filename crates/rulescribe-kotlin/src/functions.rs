use std::collections::HashMap;

use regex::Regex;

use crate::scan::{assignment_index, brace_delta};

/// One discovered function declaration. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionBlock {
    pub name: String,
    /// Line of the `fun` keyword
    pub start_line: usize,
    /// Line carrying the `{` or `=` that ends the signature
    pub header_end_line: usize,
    pub end_line: usize,
    /// Source lines `start_line..=end_line`
    pub lines: Vec<String>,
}

impl FunctionBlock {
    /// Absolute line number of an offset into [`Self::lines`].
    pub fn line_at(&self, offset: usize) -> usize {
        self.start_line + offset
    }

    /// Expression after the first assignment on the signature line, for
    /// single-expression functions.
    pub fn expression_body(&self) -> Option<&str> {
        let signature = self.lines.first()?;
        let idx = assignment_index(signature)?;
        let body = signature[idx + 1..].trim();
        if body.is_empty() {
            None
        } else {
            Some(body)
        }
    }

    /// Whether the last line of the block is a lone closing brace.
    pub fn ends_with_closing_brace(&self) -> bool {
        self.lines.last().is_some_and(|line| line.trim() == "}")
    }
}

/// All functions of one file, in discovery order, with a name lookup.
///
/// When a name is declared twice the later declaration owns the name; the
/// earlier one stays in the arena but is neither analyzed nor resolvable.
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    blocks: Vec<FunctionBlock>,
    by_name: HashMap<String, usize>,
}

impl FunctionTable {
    /// Discover every `fun` declaration in `lines`.
    pub fn scan(lines: &[&str]) -> Self {
        let signature =
            Regex::new(r"^\s*(?:[A-Za-z]+\s+)*fun\s+(?P<name>[A-Za-z_]\w*)\s*\(").unwrap();
        let mut table = Self::default();

        let mut i = 0;
        while i < lines.len() {
            let Some(caps) = signature.captures(lines[i]) else {
                i += 1;
                continue;
            };

            let header_end = (i..lines.len())
                .find(|&j| lines[j].contains('{') || assignment_index(lines[j]).is_some())
                .unwrap_or(lines.len() - 1);

            let mut end = header_end;
            if lines[header_end].contains('{') {
                let mut balance = brace_delta(lines[header_end]);
                while balance > 0 && end + 1 < lines.len() {
                    end += 1;
                    balance += brace_delta(lines[end]);
                }
            }

            table.push(FunctionBlock {
                name: caps["name"].to_string(),
                start_line: i + 1,
                header_end_line: header_end + 1,
                end_line: end + 1,
                lines: lines[i..=end].iter().map(|l| l.to_string()).collect(),
            });
            i = end + 1;
        }

        table
    }

    fn push(&mut self, block: FunctionBlock) {
        let index = self.blocks.len();
        if let Some(previous) = self.by_name.insert(block.name.clone(), index) {
            tracing::debug!(
                name = %block.name,
                shadowed_line = self.blocks[previous].start_line,
                line = block.start_line,
                "function redeclared; earlier declaration ignored"
            );
        }
        self.blocks.push(block);
    }

    /// Declaration currently owning `name`.
    pub fn get(&self, name: &str) -> Option<&FunctionBlock> {
        self.by_name.get(name).map(|&i| &self.blocks[i])
    }

    /// Name-owning declarations ordered by start line.
    pub fn live(&self) -> impl Iterator<Item = &FunctionBlock> {
        self.blocks
            .iter()
            .enumerate()
            .filter(|(i, block)| self.by_name.get(&block.name) == Some(i))
            .map(|(_, block)| block)
    }

    /// Single-expression bodies keyed by function name.
    pub fn predicate_bodies(&self) -> HashMap<&str, &str> {
        self.live()
            .filter_map(|block| Some((block.name.as_str(), block.expression_body()?)))
            .collect()
    }

    /// Every declaration, including shadowed ones.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scan(source: &str) -> FunctionTable {
        let lines: Vec<&str> = source.lines().collect();
        FunctionTable::scan(&lines)
    }

    #[test]
    fn test_block_function_spans_matching_brace() {
        let table = scan("fun a(x: Int) {\n    if (x > 0) {\n        go()\n    }\n}\nval y = 1\n");
        let a = table.get("a").unwrap();
        assert_eq!((a.start_line, a.header_end_line, a.end_line), (1, 1, 5));
        assert_eq!(a.lines.len(), 5);
        assert!(a.ends_with_closing_brace());
    }

    #[test]
    fn test_multiline_signature() {
        let table = scan("private fun v(\n    a: String,\n    b: String,\n) {\n    go(a)\n}\n");
        let v = table.get("v").unwrap();
        assert_eq!((v.start_line, v.header_end_line, v.end_line), (1, 4, 6));
    }

    #[test]
    fn test_expression_function_is_one_line() {
        let table = scan("fun shouldGo(r: String): Boolean = r == \"wr\" && flag\nfun next() {}\n");
        let p = table.get("shouldGo").unwrap();
        assert_eq!((p.start_line, p.end_line), (1, 1));
        assert_eq!(p.expression_body(), Some("r == \"wr\" && flag"));
        assert_eq!(table.get("next").unwrap().start_line, 2);
    }

    #[test]
    fn test_predicate_bodies_only_for_expression_functions() {
        let table = scan("fun a(): Boolean = true\nfun b() {\n}\n");
        let bodies = table.predicate_bodies();
        assert_eq!(bodies.get("a"), Some(&"true"));
        assert!(!bodies.contains_key("b"));
    }

    #[test]
    fn test_later_declaration_wins() {
        let table = scan("fun dup() {\n}\nfun dup() {\n    x()\n}\n");
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("dup").unwrap().start_line, 3);
        let live: Vec<usize> = table.live().map(|f| f.start_line).collect();
        assert_eq!(live, vec![3]);
    }

    #[test]
    fn test_unterminated_signature_does_not_panic() {
        let table = scan("fun broken(\n    a: Int,\n");
        let f = table.get("broken").unwrap();
        assert_eq!((f.start_line, f.end_line), (1, 2));
    }

    #[test]
    fn test_unbalanced_body_runs_to_end_of_file() {
        let table = scan("fun open() {\n    if (a) {\n        b()\n");
        assert_eq!(table.get("open").unwrap().end_line, 3);
    }

    #[test]
    fn test_modifiers_and_annotations_lines() {
        let table = scan("@Test\ninternal suspend fun load(id: Long) {\n}\nclass Foo(\n    val fun_x: Int,\n)\n");
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("load").unwrap().start_line, 2);
    }
}
