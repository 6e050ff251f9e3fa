//! Recognizers for the three validation idioms: assertion preconditions,
//! guarded delegation and conditional throws.

use regex::Regex;

use crate::functions::FunctionBlock;
use crate::scan::{balanced_group, brace_delta, first_string_literal, is_comment};

/// Call names never treated as a guard's delegate.
const EXCLUDED_CALLS: &[&str] = &["if", "require", "check"];

/// `require(condition) { "message" }` on a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Precondition {
    pub offset: usize,
    pub condition: String,
    pub message: Option<String>,
}

/// An `if (...)` block inside a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conditional {
    /// Offset of the `if` line within the function
    pub offset: usize,
    /// Offset of the line closing the block
    pub block_end: usize,
    pub condition: String,
    /// Text after the condition on the `if` line, then the following block lines
    pub body: Vec<String>,
}

/// `if (shouldX(..)) { delegate(..) }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guard {
    pub conditional: Conditional,
    pub predicate: String,
    pub called: String,
}

/// `if (..) { .. throw .. }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalThrow {
    pub conditional: Conditional,
    pub exception: Option<String>,
    pub message: Option<String>,
}

/// Compiled patterns for one analysis run.
#[derive(Debug, Clone)]
pub struct IdiomMatcher {
    assertion: Regex,
    conditional: Regex,
    call: Regex,
    predicate: Regex,
    throw: Regex,
    throw_exception: Regex,
}

impl IdiomMatcher {
    pub fn new() -> Self {
        Self {
            assertion: Regex::new(r"\brequire\s*\(").unwrap(),
            conditional: Regex::new(r"\bif\s*\(").unwrap(),
            call: Regex::new(r"([A-Za-z_]\w*)\s*\(").unwrap(),
            predicate: Regex::new(r"\bshould\w*").unwrap(),
            throw: Regex::new(r"\bthrow").unwrap(),
            throw_exception: Regex::new(r"\bthrow\s+(?P<exception>[A-Za-z0-9_.]+)").unwrap(),
        }
    }

    /// Every assertion occurrence, in line order.
    pub fn preconditions(&self, func: &FunctionBlock) -> Vec<Precondition> {
        let mut found = Vec::new();
        for (offset, line) in func.lines.iter().enumerate() {
            if is_comment(line) {
                continue;
            }
            for m in self.assertion.find_iter(line) {
                let (condition, after) = balanced_group(line, m.end());
                if condition.is_empty() {
                    continue;
                }
                found.push(Precondition {
                    offset,
                    condition,
                    message: first_string_literal(&line[after..]),
                });
            }
        }
        found
    }

    /// Every `if` block in the function, in line order.
    pub fn conditionals(&self, func: &FunctionBlock) -> Vec<Conditional> {
        let mut found = Vec::new();
        for (offset, line) in func.lines.iter().enumerate() {
            if is_comment(line) {
                continue;
            }
            let Some(m) = self.conditional.find(line) else {
                continue;
            };
            let (condition, after) = balanced_group(line, m.end());
            let block_end = block_end(&func.lines, offset);

            let mut body = vec![line[after..].to_string()];
            body.extend(func.lines[offset + 1..=block_end].iter().cloned());

            found.push(Conditional {
                offset,
                block_end,
                condition,
                body,
            });
        }
        found
    }

    /// First conditional that tests a `should*` predicate and delegates to
    /// another function.
    pub fn guard(&self, func: &FunctionBlock) -> Option<Guard> {
        self.conditionals(func).into_iter().find_map(|conditional| {
            let predicate = self.predicate.find(&conditional.condition)?.as_str().to_string();
            let called = self.first_call(&conditional.body)?;
            Some(Guard {
                conditional,
                predicate,
                called,
            })
        })
    }

    /// Conditionals whose block contains a throw.
    pub fn throws(&self, func: &FunctionBlock) -> Vec<ConditionalThrow> {
        self.conditionals(func)
            .into_iter()
            .filter(|c| c.body.iter().any(|line| self.throw.is_match(line)))
            .map(|conditional| {
                let joined = conditional.body.join("\n");
                let exception = self
                    .throw_exception
                    .captures(&joined)
                    .map(|caps| caps["exception"].to_string());
                let message = conditional.body.iter().find_map(|l| first_string_literal(l));
                ConditionalThrow {
                    conditional,
                    exception,
                    message,
                }
            })
            .collect()
    }

    /// Name of the first call per line, skipping lines whose first call is
    /// a keyword.
    fn first_call(&self, body: &[String]) -> Option<String> {
        body.iter()
            .filter(|line| !is_comment(line))
            .filter_map(|line| self.call.captures(line))
            .map(|caps| caps[1].to_string())
            .find(|name| !EXCLUDED_CALLS.contains(&name.as_str()))
    }
}

impl Default for IdiomMatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Offset of the line closing a block opened on `lines[start]`; the start
/// line itself when it opens nothing.
fn block_end(lines: &[String], start: usize) -> usize {
    let mut balance = brace_delta(&lines[start]);
    let mut end = start;
    while balance > 0 && end + 1 < lines.len() {
        end += 1;
        balance += brace_delta(&lines[end]);
    }
    end
}
