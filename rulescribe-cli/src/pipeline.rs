use std::path::PathBuf;

use anyhow::Context;
use rulescribe_kotlin::KotlinAnalyzer;
use rulescribe_model::{assign_rule_ids, resolve_dependencies, Rule, RuleIdSeed, SourceType};
use rulescribe_openapi::{AnalyzerOptions, OpenApiAnalyzer};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::csv_writer;
use crate::detect::{detect_source_type, DetectError, Lang};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("{0:#}")]
    Usage(anyhow::Error),

    #[error("{0:#}")]
    Pipeline(anyhow::Error),
}

impl PipelineError {
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::NotFound(_) | PipelineError::Pipeline(_) => 1,
            PipelineError::Usage(_) => 2,
        }
    }
}

/// One extraction run: input file to CSV.
#[derive(Debug)]
pub struct Request<'a> {
    pub input: PathBuf,
    pub output: PathBuf,
    pub lang: Option<Lang>,
    pub config: &'a Config,
}

/// Analyze the input, assign IDs, resolve dependencies and write the CSV.
///
/// Every failure is logged at ERROR before being returned.
pub fn run(request: &Request<'_>) -> Result<Vec<Rule>, PipelineError> {
    let result = execute(request);
    if let Err(e) = &result {
        error!("{e}");
    }
    result
}

fn execute(request: &Request<'_>) -> Result<Vec<Rule>, PipelineError> {
    let Request {
        input,
        output,
        lang,
        config,
    } = request;

    if !input.is_file() {
        return Err(PipelineError::NotFound(input.clone()));
    }

    let source_type = detect_source_type(input, *lang).map_err(|e| match e {
        DetectError::Undetectable(_) => PipelineError::Usage(e.into()),
        DetectError::Read(..) => PipelineError::Pipeline(e.into()),
    })?;
    config
        .default_rule_id
        .parse::<RuleIdSeed>()
        .context("DEFAULT_RULE_ID is not usable")
        .map_err(PipelineError::Usage)?;

    debug!(
        method = %config.llm_method,
        model = %config.llm_model,
        url = %config.llm_url,
        api_key_set = !config.llm_api_key.is_empty(),
        "Description settings"
    );
    info!("Reading source file {} as {source_type}", input.display());
    let mut rules = analyze(input, source_type, config).map_err(PipelineError::Pipeline)?;
    debug!("Analyzer produced {} rules", rules.len());

    assign_rule_ids(&mut rules, &config.default_rule_id)
        .context("Failed to assign rule IDs")
        .map_err(PipelineError::Usage)?;
    let report = resolve_dependencies(&mut rules)
        .context("Failed to resolve rule dependencies")
        .map_err(PipelineError::Pipeline)?;
    if report.has_cycles() {
        debug!("{} dependency cycle(s) reported", report.cycles.len());
    }

    csv_writer::write_rules(&rules, output).map_err(PipelineError::Pipeline)?;
    Ok(rules)
}

fn analyze(
    input: &std::path::Path,
    source_type: SourceType,
    config: &Config,
) -> anyhow::Result<Vec<Rule>> {
    match source_type {
        SourceType::Code => KotlinAnalyzer::new()
            .analyze_file(input)
            .with_context(|| format!("Code analysis of '{}' failed", input.display())),
        SourceType::Schema => {
            OpenApiAnalyzer::new(AnalyzerOptions::from_entities(&config.endpoint_entities))
                .analyze_file(input)
                .with_context(|| format!("Schema analysis of '{}' failed", input.display()))
        }
    }
}
