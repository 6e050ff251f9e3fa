use std::collections::BTreeSet;
use std::fmt;

use crate::error::ModelError;

/// Kind of artifact a rule was extracted from.
///
/// The string form doubles as the primary sort key, so `CODE` rules always
/// precede `SCHEMA` rules in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceType {
    /// Object-oriented source code (Kotlin-style `fun` declarations)
    Code,
    /// HTTP API description document (OpenAPI 3)
    Schema,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Code => "CODE",
            SourceType::Schema => "SCHEMA",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recognized validation constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Discovery-time identity, unique within one analysis run
    pub internal_id: u32,
    /// Finished natural-language sentence
    pub description: String,
    pub source_file: String,
    pub start_line: usize,
    pub end_line: usize,
    pub source_type: SourceType,
    /// `"{path} [{METHOD}]"`, schema rules only
    pub endpoint: Option<String>,
    /// Dotted/bracketed schema path, schema rules only
    pub endpoint_entity: Option<String>,
    /// Externally visible identifier, stamped by [`crate::assign_rule_ids`]
    pub rule_id: Option<String>,
    /// Internal IDs this rule presupposes
    pub depends_on_internal: BTreeSet<u32>,
    /// External IDs derived from `depends_on_internal` by [`crate::resolve_dependencies`]
    pub depends_on_ids: BTreeSet<String>,
}

impl Rule {
    /// Create a rule with no endpoint information and no dependencies.
    ///
    /// Fails when `start_line > end_line`.
    pub fn new(
        internal_id: u32,
        description: impl Into<String>,
        source_file: impl Into<String>,
        start_line: usize,
        end_line: usize,
        source_type: SourceType,
    ) -> Result<Self, ModelError> {
        if start_line > end_line {
            return Err(ModelError::InvalidLineRange {
                start: start_line,
                end: end_line,
            });
        }

        Ok(Self {
            internal_id,
            description: description.into(),
            source_file: source_file.into(),
            start_line,
            end_line,
            source_type,
            endpoint: None,
            endpoint_entity: None,
            rule_id: None,
            depends_on_internal: BTreeSet::new(),
            depends_on_ids: BTreeSet::new(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.endpoint_entity = Some(entity.into());
        self
    }

    /// Record an internal dependency; `None` is a no-op so callers can pass
    /// an optional parent straight through.
    pub fn depending_on(mut self, dependency: Option<u32>) -> Self {
        if let Some(id) = dependency {
            self.depends_on_internal.insert(id);
        }
        self
    }

    /// `<start>-<end>` as rendered in the report.
    pub fn line_range(&self) -> String {
        format!("{}-{}", self.start_line, self.end_line)
    }

    fn sort_key(&self) -> (&'static str, &str, usize, usize, u32) {
        (
            self.source_type.as_str(),
            self.source_file.as_str(),
            self.start_line,
            self.end_line,
            self.internal_id,
        )
    }
}

/// Order rules deterministically for ID assignment and output:
/// source type, source file, start line, end line, internal ID.
pub fn sort_rules(rules: &mut [Rule]) {
    rules.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}
