pub mod analyzer;
pub mod error;
pub mod functions;
pub mod idioms;
pub mod overrides;
mod scan;

pub use analyzer::{analyze_kotlin_file, analyze_kotlin_source, KotlinAnalyzer};
pub use error::KotlinAnalyzerError;
pub use functions::{FunctionBlock, FunctionTable};
