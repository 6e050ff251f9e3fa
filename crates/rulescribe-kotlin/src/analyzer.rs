use std::collections::HashMap;
use std::path::Path;

use rulescribe_model::{describe, OverrideTable, Rule, SourceType};

use crate::error::KotlinAnalyzerError;
use crate::functions::{FunctionBlock, FunctionTable};
use crate::idioms::IdiomMatcher;
use crate::overrides::{
    builtin_guard_overrides, builtin_throw_overrides, GuardContext, ThrowContext,
};

/// Extracts validation rules from Kotlin-style source text.
#[derive(Debug)]
pub struct KotlinAnalyzer {
    matcher: IdiomMatcher,
    guard_overrides: OverrideTable<GuardContext>,
    throw_overrides: OverrideTable<ThrowContext>,
}

/// Mutable state of one file's analysis.
struct Extraction<'a> {
    source_file: &'a str,
    rules: Vec<Rule>,
    next_id: u32,
    /// Delegate function name -> internal ID of the guard calling it
    guards: HashMap<String, u32>,
}

impl<'a> Extraction<'a> {
    fn push(
        &mut self,
        description: String,
        start: usize,
        end: usize,
        dependency: Option<u32>,
    ) -> Result<u32, KotlinAnalyzerError> {
        let id = self.next_id;
        let rule = Rule::new(id, description, self.source_file, start, end, SourceType::Code)?
            .depending_on(dependency);
        tracing::debug!(internal_id = id, lines = %rule.line_range(), "code rule");
        self.rules.push(rule);
        self.next_id += 1;
        Ok(id)
    }
}

impl KotlinAnalyzer {
    pub fn new() -> Self {
        Self::with_overrides(builtin_guard_overrides(), builtin_throw_overrides())
    }

    pub fn with_overrides(
        guard_overrides: OverrideTable<GuardContext>,
        throw_overrides: OverrideTable<ThrowContext>,
    ) -> Self {
        Self {
            matcher: IdiomMatcher::new(),
            guard_overrides,
            throw_overrides,
        }
    }

    /// Read and analyze one file; rules carry the file's base name.
    pub fn analyze_file(&self, path: &Path) -> Result<Vec<Rule>, KotlinAnalyzerError> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| KotlinAnalyzerError::Io(path.display().to_string(), e))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.analyze_source(&source, &file_name)
    }

    /// Analyze in-memory source text attributed to `source_file`.
    pub fn analyze_source(
        &self,
        source: &str,
        source_file: &str,
    ) -> Result<Vec<Rule>, KotlinAnalyzerError> {
        let lines: Vec<&str> = source.lines().collect();
        let functions = FunctionTable::scan(&lines);
        let predicates = functions.predicate_bodies();
        tracing::debug!(file = source_file, functions = functions.len(), "scanned functions");

        let mut extraction = Extraction {
            source_file,
            rules: Vec::new(),
            next_id: 1,
            guards: HashMap::new(),
        };

        for func in functions.live() {
            self.collect_preconditions(func, &mut extraction)?;
            if self.collect_guard(func, &functions, &predicates, &mut extraction)? {
                continue;
            }
            self.collect_throws(func, &mut extraction)?;
        }

        tracing::info!(
            file = source_file,
            rules = extraction.rules.len(),
            "code analysis finished"
        );
        Ok(extraction.rules)
    }

    fn collect_preconditions(
        &self,
        func: &FunctionBlock,
        out: &mut Extraction<'_>,
    ) -> Result<(), KotlinAnalyzerError> {
        for found in self.matcher.preconditions(func) {
            let line = func.line_at(found.offset);
            let description = describe::precondition(&found.condition, found.message.as_deref());
            out.push(description, line, line, None)?;
        }
        Ok(())
    }

    /// Emit at most one guard rule; returns whether one was emitted.
    fn collect_guard(
        &self,
        func: &FunctionBlock,
        functions: &FunctionTable,
        predicates: &HashMap<&str, &str>,
        out: &mut Extraction<'_>,
    ) -> Result<bool, KotlinAnalyzerError> {
        let Some(guard) = self.matcher.guard(func) else {
            return Ok(false);
        };

        let context = GuardContext {
            condition: guard.conditional.condition.clone(),
            predicate: guard.predicate.clone(),
            called: guard.called.clone(),
            predicate_body: predicates.get(guard.predicate.as_str()).map(|b| b.to_string()),
        };
        let description = match self.guard_overrides.lookup(&context) {
            Some(sentence) => sentence.to_string(),
            None => describe::guarded_call(&context.condition, &context.called),
        };

        let mut end = func.line_at(guard.conditional.block_end);
        if let Some(target) = functions.get(&guard.called) {
            end = end.max(target.header_end_line.saturating_sub(1));
        }

        let id = out.push(description, func.start_line, end, None)?;
        out.guards.insert(guard.called, id);
        Ok(true)
    }

    fn collect_throws(
        &self,
        func: &FunctionBlock,
        out: &mut Extraction<'_>,
    ) -> Result<(), KotlinAnalyzerError> {
        let throws = self.matcher.throws(func);
        if throws.is_empty() {
            return Ok(());
        }

        let end = if func.ends_with_closing_brace() {
            func.end_line.saturating_sub(1).max(func.start_line)
        } else {
            func.end_line
        };
        let dependency = out.guards.get(&func.name).copied();

        for found in throws {
            let context = ThrowContext {
                function: func.name.clone(),
                condition: found.conditional.condition,
                exception: found.exception,
                message: found.message,
            };
            let description = match self.throw_overrides.lookup(&context) {
                Some(sentence) => sentence.to_string(),
                None => describe::conditional_throw(
                    &context.condition,
                    context.exception.as_deref(),
                    context.message.as_deref(),
                ),
            };
            out.push(description, func.start_line, end, dependency)?;
        }
        Ok(())
    }
}

impl Default for KotlinAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Analyze a file with the built-in overrides.
pub fn analyze_kotlin_file(path: &Path) -> Result<Vec<Rule>, KotlinAnalyzerError> {
    KotlinAnalyzer::new().analyze_file(path)
}

/// Analyze source text with the built-in overrides.
pub fn analyze_kotlin_source(
    source: &str,
    source_file: &str,
) -> Result<Vec<Rule>, KotlinAnalyzerError> {
    KotlinAnalyzer::new().analyze_source(source, source_file)
}
