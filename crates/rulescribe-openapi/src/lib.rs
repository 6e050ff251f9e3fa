pub mod analyzer;
pub mod error;
pub mod yaml;

pub use analyzer::{
    analyze_openapi_file, analyze_openapi_source, AnalyzerOptions, OpenApiAnalyzer, PropertyContext,
};
pub use error::OpenApiAnalyzerError;
