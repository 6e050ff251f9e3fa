use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_RULE_ID: &str = "RULE-001";
pub const DEFAULT_ENDPOINT_ENTITIES: &str = "parameters,requestBody,responses";
pub const RULE_BASED: &str = "rule-based";
pub const DEFAULT_LOG_LEVEL: &str = "INFO";

/// Settings read from a `KEY=value` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Starting identifier for rule ID assignment
    pub default_rule_id: String,
    /// Endpoint entities the schema analyzer walks
    pub endpoint_entities: Vec<String>,
    pub llm_method: String,
    pub llm_model: String,
    pub llm_url: String,
    pub llm_api_key: String,
    /// Extra log sink; `None` when `LOG_FILE` is empty
    pub log_file: Option<PathBuf>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_values(&HashMap::new())
    }
}

fn split_entities(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(String::from)
        .collect()
}

impl Config {
    /// Load settings from `path`.
    ///
    /// Never fails: a missing file gives the defaults, an unreadable file
    /// gives the defaults plus a warning, and each malformed line is skipped
    /// with a warning while the other lines still apply. Warnings are
    /// returned rather than logged because logging is configured from the
    /// result.
    ///
    /// Unquoted and double-quoted values expand `$NAME` references; wrap a
    /// value in single quotes to keep a literal `$`.
    pub fn load(path: &Path) -> (Self, Vec<String>) {
        let mut warnings = Vec::new();
        if !path.exists() {
            return (Self::default(), warnings);
        }

        let mut values = HashMap::new();
        match dotenvy::from_path_iter(path) {
            Ok(iter) => {
                for item in iter {
                    match item {
                        Ok((key, value)) => {
                            values.insert(key, value);
                        }
                        Err(dotenvy::Error::Io(e)) => {
                            warnings.push(format!(
                                "Stopped reading configuration from {}: {e}",
                                path.display()
                            ));
                            break;
                        }
                        Err(e) => warnings.push(format!(
                            "Skipping configuration line in {}: {e}",
                            path.display()
                        )),
                    }
                }
            }
            Err(e) => warnings.push(format!(
                "Could not read configuration from {}: {e}; using defaults",
                path.display()
            )),
        }
        let config = Self::from_values(&values);

        if config.llm_method != RULE_BASED {
            warnings.push(format!(
                "LLM_METHOD '{}' is not supported; using {RULE_BASED} descriptions",
                config.llm_method
            ));
        }
        (config, warnings)
    }

    fn from_values(values: &HashMap<String, String>) -> Self {
        let get = |key: &str, default: &str| {
            values
                .get(key)
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|| default.to_string())
        };

        let entities = values
            .get("SCHEMA_ENDPOINT_ENTITIES")
            .or_else(|| values.get("OPENAPI_ENDPOINT_ENTITIES"))
            .map(String::as_str)
            .unwrap_or(DEFAULT_ENDPOINT_ENTITIES);
        let log_file = get("LOG_FILE", "");

        Self {
            default_rule_id: get("DEFAULT_RULE_ID", DEFAULT_RULE_ID),
            endpoint_entities: split_entities(entities),
            llm_method: get("LLM_METHOD", RULE_BASED),
            llm_model: get("LLM_MODEL", ""),
            llm_url: get("LLM_URL", ""),
            llm_api_key: get("LLM_API_KEY", ""),
            log_file: (!log_file.is_empty()).then(|| PathBuf::from(log_file)),
            log_level: get("LOG_LEVEL", DEFAULT_LOG_LEVEL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write_env(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (config, warnings) = Config::load(&dir.path().join("absent.env"));

        assert!(warnings.is_empty());
        assert_eq!(config.default_rule_id, "RULE-001");
        assert_eq!(config.endpoint_entities, vec!["parameters", "requestBody", "responses"]);
        assert_eq!(config.llm_method, "rule-based");
        assert_eq!(config.log_file, None);
        assert_eq!(config.log_level, "INFO");
    }

    #[test]
    fn test_values_override_defaults() {
        let (_dir, path) = write_env(
            "# settings\n\nDEFAULT_RULE_ID=VAL-0100\nSCHEMA_ENDPOINT_ENTITIES=responses,,requestBody\nLOG_LEVEL=DEBUG\nLOG_FILE=run.log\nLLM_MODEL=small\n",
        );
        let (config, warnings) = Config::load(&path);

        assert!(warnings.is_empty());
        assert_eq!(config.default_rule_id, "VAL-0100");
        assert_eq!(config.endpoint_entities, vec!["responses", "requestBody"]);
        assert_eq!(config.log_level, "DEBUG");
        assert_eq!(config.log_file, Some(PathBuf::from("run.log")));
        assert_eq!(config.llm_model, "small");
        assert_eq!(config.llm_url, "");
    }

    #[test]
    fn test_legacy_entities_key() {
        let (_dir, path) = write_env("OPENAPI_ENDPOINT_ENTITIES=requestBody\n");
        let (config, _) = Config::load(&path);
        assert_eq!(config.endpoint_entities, vec!["requestBody"]);
    }

    #[test]
    fn test_new_entities_key_wins_over_legacy() {
        let (_dir, path) =
            write_env("OPENAPI_ENDPOINT_ENTITIES=requestBody\nSCHEMA_ENDPOINT_ENTITIES=responses\n");
        let (config, _) = Config::load(&path);
        assert_eq!(config.endpoint_entities, vec!["responses"]);
    }

    #[test]
    fn test_unsupported_llm_method_warns() {
        let (_dir, path) = write_env("LLM_METHOD=remote\n");
        let (config, warnings) = Config::load(&path);
        assert_eq!(config.llm_method, "remote");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("LLM_METHOD 'remote'"));
    }

    #[test]
    fn test_malformed_line_is_skipped_and_others_kept() {
        let (_dir, path) =
            write_env("DEFAULT_RULE_ID=VAL-100\nLOG_LEVEL=DEBUG\nstray line\nLLM_MODEL=small\n");
        let (config, warnings) = Config::load(&path);

        assert_eq!(config.default_rule_id, "VAL-100");
        assert_eq!(config.log_level, "DEBUG");
        assert_eq!(config.llm_model, "small");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Skipping configuration line"));
    }

    #[test]
    fn test_single_quoted_value_keeps_dollar_sign() {
        let (_dir, path) = write_env("LLM_API_KEY='abc$HOME'\nLLM_URL='http://x/$path'\n");
        let (config, warnings) = Config::load(&path);

        assert!(warnings.is_empty());
        assert_eq!(config.llm_api_key, "abc$HOME");
        assert_eq!(config.llm_url, "http://x/$path");
    }

    #[test]
    fn test_unquoted_value_expands_earlier_keys() {
        let (_dir, path) = write_env(
            "RULESCRIBE_TEST_BASE_URL=http://models.local\nLLM_URL=$RULESCRIBE_TEST_BASE_URL/v1\n",
        );
        let (config, _) = Config::load(&path);
        assert_eq!(config.llm_url, "http://models.local/v1");
    }
}
