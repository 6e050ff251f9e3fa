mod config;
mod csv_writer;
mod detect;
mod logging;
mod pipeline;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use tracing::warn;

use crate::config::Config;
use crate::detect::Lang;
use crate::pipeline::Request;

#[derive(Parser)]
#[command(
    name = "rulescribe",
    about = "Extract validation rules from source code and API schemas into CSV"
)]
#[command(version)]
struct Cli {
    /// Source file to analyze (Kotlin source or OpenAPI document)
    input_file: PathBuf,
    /// CSV file to write
    #[arg(short, long, default_value = "output.csv")]
    output: PathBuf,
    /// Force the source type instead of detecting it
    #[arg(short, long, value_enum)]
    lang: Option<Lang>,
    /// KEY=value settings file
    #[arg(short, long, default_value = ".env")]
    config: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config, config_warnings) = Config::load(&cli.config);
    let (subscriber, logging) = logging::init(&config.log_level, config.log_file.as_deref());

    let request = Request {
        input: cli.input_file,
        output: cli.output,
        lang: cli.lang,
        config: &config,
    };
    let result = tracing::subscriber::with_default(subscriber, || {
        for note in logging.notes.iter().chain(&config_warnings) {
            warn!("{note}");
        }
        pipeline::run(&request)
    });

    let code = match result {
        Ok(rules) => {
            println!("{}", logging.summary.success_line(rules.len()));
            ExitCode::SUCCESS
        }
        Err(e) => {
            // the error itself was already logged by the pipeline
            eprintln!("{} {}", "error:".red().bold(), logging.summary.failure_line());
            ExitCode::from(e.exit_code())
        }
    };
    drop(logging.file_guard);
    code
}
