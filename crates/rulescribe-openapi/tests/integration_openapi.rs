use std::path::PathBuf;

use pretty_assertions::assert_eq;

use rulescribe_model::{assign_rule_ids, resolve_dependencies, Rule};
use rulescribe_openapi::{analyze_openapi_file, OpenApiAnalyzerError};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn summary(rules: &[Rule]) -> Vec<(String, String, String, String)> {
    rules
        .iter()
        .map(|r| {
            (
                r.rule_id.clone().unwrap_or_default(),
                r.line_range(),
                r.endpoint_entity.clone().unwrap_or_default(),
                r.depends_on_ids.iter().cloned().collect::<Vec<_>>().join(","),
            )
        })
        .collect()
}

fn row(id: &str, lines: &str, entity: &str, deps: &str) -> (String, String, String, String) {
    (id.into(), lines.into(), entity.into(), deps.into())
}

// ---------------------------------------------------------------------------
// Package search sample
// ---------------------------------------------------------------------------

#[test]
fn test_package_search_rules_after_resolution() {
    let mut rules = analyze_openapi_file(&fixture("package-search.yml")).unwrap();
    assert_eq!(rules.len(), 9);

    assign_rule_ids(&mut rules, "RULE-001").unwrap();
    let report = resolve_dependencies(&mut rules).unwrap();
    assert!(!report.has_cycles());

    assert_eq!(
        summary(&rules),
        vec![
            row("RULE-001", "19-25", "PackageSearchRequestParams", ""),
            row("RULE-002", "42-52", "PackageSearchRequestParams.from", "RULE-001"),
            row("RULE-003", "49-52", "PackageSearchRequestParams.from[]", "RULE-002"),
            row("RULE-004", "53-59", "PackageSearchResponse.holidays", "RULE-001"),
            row("RULE-005", "60-70", "PackageSearchRequestParams.from[].code", "RULE-002"),
            row("RULE-006", "67-70", "PackageSearchRequestParams.from[].type", "RULE-002"),
            row("RULE-007", "71-79", "PackageSearchResponse.holidays.offers", "RULE-004"),
            row("RULE-008", "75-79", "PackageSearchResponse.holidays.offers[]", "RULE-007"),
            row(
                "RULE-009",
                "80-88",
                "PackageSearchResponse.holidays.offers[].productID",
                "RULE-007",
            ),
        ]
    );

    assert!(rules
        .iter()
        .all(|r| r.endpoint.as_deref() == Some("/v3/package/search/results [POST]")));
    assert!(rules.iter().all(|r| r.source_file == "package-search.yml"));
}

#[test]
fn test_package_search_descriptions() {
    let rules = analyze_openapi_file(&fixture("package-search.yml")).unwrap();
    let descriptions: Vec<&str> = rules.iter().map(|r| r.description.as_str()).collect();

    assert_eq!(
        descriptions,
        vec![
            "For the POST /v3/package/search/results endpoint, a application/json request body \
             conforming to PackageSearchRequestParams MUST be provided; requests without a body are invalid.",
            "The PackageSearchRequestParams object MUST contain a 'from' property of type array.",
            "Each item in 'PackageSearchRequestParams.from[]' MUST satisfy: items must follow From.",
            "The From object MUST contain a 'code' property of type string.",
            "The 'PackageSearchRequestParams.from[].type' field MUST be one of: AIRPORT. Any other value is invalid.",
            "The PackageSearchResponse object MUST contain a 'holidays' property.",
            "The Holidays object MUST contain a 'offers' property of type array.",
            "Each item in 'PackageSearchResponse.holidays.offers[]' MUST satisfy: items must follow Offer.",
            "The Offer object MUST contain a 'productID' property of type string.",
        ]
    );
}

#[test]
fn test_internal_ids_follow_discovery_order() {
    let rules = analyze_openapi_file(&fixture("package-search.yml")).unwrap();
    let ids: Vec<u32> = rules.iter().map(|r| r.internal_id).collect();
    assert_eq!(ids, (1..=9).collect::<Vec<_>>());
}

// ---------------------------------------------------------------------------
// Failure modes
// ---------------------------------------------------------------------------

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = analyze_openapi_file(&dir.path().join("absent.yml")).unwrap_err();
    assert!(matches!(err, OpenApiAnalyzerError::Io(_, _)));
}

#[test]
fn test_corrupted_paths_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yml");
    std::fs::write(&path, "openapi: 3.0.0\npaths: [").unwrap();

    assert_eq!(analyze_openapi_file(&path).unwrap(), Vec::<Rule>::new());
}

#[test]
fn test_non_mapping_root_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("list.yml");
    std::fs::write(&path, "- openapi\n- paths\n").unwrap();

    assert!(matches!(
        analyze_openapi_file(&path),
        Err(OpenApiAnalyzerError::NonMappingRoot(1))
    ));
}

#[test]
fn test_empty_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.yaml");
    std::fs::write(&path, "\n\n").unwrap();

    assert!(matches!(
        analyze_openapi_file(&path),
        Err(OpenApiAnalyzerError::EmptyDocument)
    ));
}
