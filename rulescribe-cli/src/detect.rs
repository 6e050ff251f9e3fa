use std::path::{Path, PathBuf};

use clap::ValueEnum;
use rulescribe_model::SourceType;
use thiserror::Error;

/// Value accepted by `--lang`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Lang {
    #[value(alias = "kotlin")]
    Code,
    #[value(alias = "openapi")]
    Schema,
}

impl From<Lang> for SourceType {
    fn from(lang: Lang) -> Self {
        match lang {
            Lang::Code => SourceType::Code,
            Lang::Schema => SourceType::Schema,
        }
    }
}

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("cannot determine source type of {0}; pass --lang code or --lang schema")]
    Undetectable(PathBuf),

    #[error("failed to read {0} while detecting its source type")]
    Read(PathBuf, #[source] std::io::Error),
}

/// Decide which analyzer handles `path`.
///
/// An explicit override wins, then the file extension, then a look at the
/// file contents.
pub fn detect_source_type(path: &Path, lang: Option<Lang>) -> Result<SourceType, DetectError> {
    if let Some(lang) = lang {
        return Ok(lang.into());
    }
    if let Some(source_type) = from_extension(path) {
        return Ok(source_type);
    }

    let contents =
        std::fs::read_to_string(path).map_err(|e| DetectError::Read(path.to_path_buf(), e))?;
    from_contents(&contents).ok_or_else(|| DetectError::Undetectable(path.to_path_buf()))
}

fn from_extension(path: &Path) -> Option<SourceType> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "kt" | "kts" => Some(SourceType::Code),
        "yml" | "yaml" => Some(SourceType::Schema),
        _ => None,
    }
}

fn from_contents(contents: &str) -> Option<SourceType> {
    let contents = contents.to_lowercase();
    if contents.contains("openapi:") || contents.contains("paths:") {
        return Some(SourceType::Schema);
    }
    if contents.contains("fun ") || contents.trim_start().starts_with("package ") {
        return Some(SourceType::Code);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_extension_detection() {
        assert_eq!(from_extension(Path::new("A.kt")), Some(SourceType::Code));
        assert_eq!(from_extension(Path::new("build.gradle.kts")), Some(SourceType::Code));
        assert_eq!(from_extension(Path::new("api.YAML")), Some(SourceType::Schema));
        assert_eq!(from_extension(Path::new("api.yml")), Some(SourceType::Schema));
        assert_eq!(from_extension(Path::new("notes.txt")), None);
        assert_eq!(from_extension(Path::new("Makefile")), None);
    }

    #[test]
    fn test_content_detection() {
        let dir = tempfile::tempdir().unwrap();
        let schema = write(&dir, "api.txt", "openapi: 3.0.0\ninfo:\n  title: x\n");
        let code = write(&dir, "Source.txt", "package com.example\n\nclass A\n");
        let function = write(&dir, "fn.txt", "fun check(x: Int) = x > 0\n");

        assert_eq!(detect_source_type(&schema, None).unwrap(), SourceType::Schema);
        assert_eq!(detect_source_type(&code, None).unwrap(), SourceType::Code);
        assert_eq!(detect_source_type(&function, None).unwrap(), SourceType::Code);
    }

    #[test]
    fn test_content_detection_ignores_case() {
        assert_eq!(from_contents("PATHS:\n  /x: {}\n"), Some(SourceType::Schema));
        assert_eq!(from_contents("OpenAPI: 3.0.0\n"), Some(SourceType::Schema));
        assert_eq!(from_contents("Package com.example\n"), Some(SourceType::Code));
        assert_eq!(from_contents("plain prose\n"), None);
    }

    #[test]
    fn test_override_beats_extension_and_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "api.yml", "openapi: 3.0.0\npaths: {}\n");
        assert_eq!(
            detect_source_type(&path, Some(Lang::Code)).unwrap(),
            SourceType::Code
        );
    }

    #[test]
    fn test_undetectable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "notes.txt", "just some notes\n");
        let err = detect_source_type(&path, None).unwrap_err();
        assert!(matches!(err, DetectError::Undetectable(p) if p == path));
    }

    #[test]
    fn test_lang_aliases() {
        assert_eq!(Lang::from_str("kotlin", true).unwrap(), Lang::Code);
        assert_eq!(Lang::from_str("openapi", true).unwrap(), Lang::Schema);
        assert!(Lang::from_str("python", true).is_err());
    }
}
