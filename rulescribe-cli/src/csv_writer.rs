use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use rulescribe_model::Rule;
use tempfile::NamedTempFile;
use tracing::info;

pub const HEADER: [&str; 7] = [
    "Rule ID",
    "Description",
    "Source file",
    "Lines",
    "Endpoint",
    "Endpoint entity",
    "Depends on",
];

fn record(rule: &Rule) -> [String; 7] {
    [
        rule.rule_id.clone().unwrap_or_default(),
        rule.description.clone(),
        rule.source_file.clone(),
        rule.line_range(),
        rule.endpoint.clone().unwrap_or_default(),
        rule.endpoint_entity.clone().unwrap_or_default(),
        rule.depends_on_ids
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(","),
    ]
}

/// Render the header plus one row per rule, quoting only fields that hold a
/// separator, quote or line break.
pub fn render(rules: &[Rule]) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(HEADER)?;
    for rule in rules {
        writer.write_record(record(rule))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to finish CSV: {}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Write `rules` to `path`, replacing any existing file only once the new
/// contents are fully on disk.
pub fn write_rules(rules: &[Rule], path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory '{}'", dir.display()))?;

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in '{}'", dir.display()))?;
    tmp.write_all(render(rules)?.as_bytes())
        .with_context(|| format!("Failed to write CSV for '{}'", path.display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("Failed to flush CSV for '{}'", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("Failed to move CSV into place at '{}'", path.display()))?;

    info!("Wrote {} rule rows to {}", rules.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rulescribe_model::SourceType;

    fn rule(description: &str) -> Rule {
        let mut rule = Rule::new(1, description, "Api.kt", 3, 9, SourceType::Code).unwrap();
        rule.rule_id = Some("RULE-001".into());
        rule
    }

    #[test]
    fn test_only_awkward_fields_are_quoted() {
        let mut awkward = rule("a,b");
        awkward.endpoint = Some("say \"hi\"".into());
        awkward.endpoint_entity = Some("two\nlines".into());

        assert_eq!(
            render(&[awkward]).unwrap().lines().nth(1),
            Some("RULE-001,\"a,b\",Api.kt,3-9,\"say \"\"hi\"\"\",\"two")
        );
    }

    #[test]
    fn test_render_header_and_rows() {
        let mut dependent = rule("Second rule.");
        dependent.rule_id = Some("RULE-002".into());
        dependent.endpoint = Some("/pets [POST]".into());
        dependent.endpoint_entity = Some("Pet.name".into());
        dependent.depends_on_ids.insert("RULE-010".into());
        dependent.depends_on_ids.insert("RULE-001".into());

        assert_eq!(
            render(&[rule("First rule."), dependent]).unwrap(),
            "Rule ID,Description,Source file,Lines,Endpoint,Endpoint entity,Depends on\n\
             RULE-001,First rule.,Api.kt,3-9,,,\n\
             RULE-002,Second rule.,Api.kt,3-9,/pets [POST],Pet.name,\"RULE-001,RULE-010\"\n"
        );
    }

    #[test]
    fn test_empty_rule_set_still_has_header() {
        assert_eq!(
            render(&[]).unwrap(),
            "Rule ID,Description,Source file,Lines,Endpoint,Endpoint entity,Depends on\n"
        );
    }

    #[test]
    fn test_standard_reader_recovers_awkward_description() {
        let description = "Values \"a\", \"b\"\nand more, on two lines";
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_rules(&[rule(description)], &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), HEADER.to_vec());

        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(&records[0][1], description);
        assert_eq!(&records[0][3], "3-9");
    }

    #[test]
    fn test_write_creates_directory_and_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("rules.csv");
        write_rules(&[rule("Old.")], &path).unwrap();
        write_rules(&[], &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "Rule ID,Description,Source file,Lines,Endpoint,Endpoint entity,Depends on\n"
        );
        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_unwritable_destination_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let path = blocker.join("rules.csv");
        assert!(write_rules(&[rule("x")], &path).is_err());
        assert!(!path.exists());
    }
}
