use std::collections::HashMap;
use std::path::Path;

use rulescribe_model::{describe, OverrideTable, Rule, SourceType};

use crate::error::OpenApiAnalyzerError;
use crate::yaml::{parse_document, Node};

const HTTP_METHODS: &[&str] = &["get", "post", "put", "delete", "patch"];

/// Endpoint entities the analyzer walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzerOptions {
    /// Required request bodies and their schemas
    pub request_bodies: bool,
    /// Response schemas
    pub responses: bool,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            request_bodies: true,
            responses: true,
        }
    }
}

impl AnalyzerOptions {
    /// Build from entity names such as `parameters,requestBody,responses`.
    pub fn from_entities<S: AsRef<str>>(entities: &[S]) -> Self {
        let mut options = Self {
            request_bodies: false,
            responses: false,
        };
        for entity in entities {
            match entity.as_ref() {
                "requestBody" => options.request_bodies = true,
                "responses" => options.responses = true,
                "parameters" => {}
                other => tracing::warn!("Ignoring unknown endpoint entity '{other}'"),
            }
        }
        options
    }
}

/// What a required-property override can match on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyContext {
    pub schema: String,
    pub property: String,
    pub type_hint: Option<String>,
    /// Full entity path, e.g. `Root.child.name`
    pub entity: String,
}

/// Extracts validation rules from OpenAPI 3 documents.
#[derive(Debug, Default)]
pub struct OpenApiAnalyzer {
    options: AnalyzerOptions,
    overrides: OverrideTable<PropertyContext>,
}

impl OpenApiAnalyzer {
    pub fn new(options: AnalyzerOptions) -> Self {
        Self {
            options,
            overrides: OverrideTable::new(),
        }
    }

    pub fn with_overrides(mut self, overrides: OverrideTable<PropertyContext>) -> Self {
        self.overrides = overrides;
        self
    }

    /// Read, parse and analyze one file; rules carry the file's base name.
    pub fn analyze_file(&self, path: &Path) -> Result<Vec<Rule>, OpenApiAnalyzerError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| OpenApiAnalyzerError::Io(path.display().to_string(), e))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.analyze_source(&text, &file_name)
    }

    pub fn analyze_source(
        &self,
        text: &str,
        source_file: &str,
    ) -> Result<Vec<Rule>, OpenApiAnalyzerError> {
        let root = parse_document(text)?;
        self.analyze_document(&root, source_file)
    }

    pub fn analyze_document(
        &self,
        root: &Node,
        source_file: &str,
    ) -> Result<Vec<Rule>, OpenApiAnalyzerError> {
        if root.as_mapping().is_none() {
            return Err(OpenApiAnalyzerError::NonMappingRoot(root.start_line));
        }

        let schemas: HashMap<&str, &Node> = root
            .get("components")
            .and_then(|c| c.get("schemas"))
            .map(|s| s.entries().collect())
            .unwrap_or_default();
        tracing::debug!(file = source_file, schemas = schemas.len(), "collected schemas");

        let mut walk = Walk {
            analyzer: self,
            source_file,
            schemas,
            rules: Vec::new(),
            next_id: 1,
        };

        match root.get("paths") {
            None => tracing::debug!(file = source_file, "document has no paths"),
            Some(paths) if paths.is_null() => {}
            Some(paths) if paths.as_mapping().is_none() => {
                tracing::warn!(
                    file = source_file,
                    line = paths.start_line,
                    "'paths' is not a mapping; no endpoints analyzed"
                );
            }
            Some(paths) => {
                for (path, path_node) in paths.entries() {
                    for (method, operation) in path_node.entries() {
                        if !HTTP_METHODS.contains(&method.to_lowercase().as_str()) {
                            continue;
                        }
                        walk.operation(path, method, operation)?;
                    }
                }
            }
        }

        tracing::info!(
            file = source_file,
            rules = walk.rules.len(),
            "schema analysis finished"
        );
        Ok(walk.rules)
    }
}

/// Analyze a file walking every endpoint entity.
pub fn analyze_openapi_file(path: &Path) -> Result<Vec<Rule>, OpenApiAnalyzerError> {
    OpenApiAnalyzer::default().analyze_file(path)
}

pub fn analyze_openapi_source(
    text: &str,
    source_file: &str,
) -> Result<Vec<Rule>, OpenApiAnalyzerError> {
    OpenApiAnalyzer::default().analyze_source(text, source_file)
}

/// Last `/`-separated segment of a `$ref`.
fn normalize_ref(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

fn direct_ref(node: &Node) -> Option<&str> {
    node.get("$ref")?.as_str().map(normalize_ref)
}

/// Media type and schema name of the first content entry with a `$ref`.
fn first_schema_ref(content: Option<&Node>) -> Option<(&str, &str)> {
    content?
        .entries()
        .find_map(|(media, node)| Some((media, direct_ref(node.get("schema")?)?)))
}

/// Schema referenced by `items`, directly or through `allOf`.
fn items_ref(property: &Node) -> Option<&str> {
    let items = property.get("items")?;
    direct_ref(items).or_else(|| {
        items
            .get("allOf")?
            .as_sequence()?
            .iter()
            .find_map(direct_ref)
    })
}

struct Walk<'a> {
    analyzer: &'a OpenApiAnalyzer,
    source_file: &'a str,
    schemas: HashMap<&'a str, &'a Node>,
    rules: Vec<Rule>,
    next_id: u32,
}

/// Where a schema expansion sits in the endpoint it belongs to.
struct Scope<'s> {
    endpoint: &'s str,
    base_entity: &'s str,
    depends_on: Option<u32>,
}

impl<'a> Walk<'a> {
    fn push(
        &mut self,
        description: String,
        span: &Node,
        endpoint: &str,
        entity: &str,
        dependency: Option<u32>,
    ) -> Result<u32, OpenApiAnalyzerError> {
        let id = self.next_id;
        let rule = Rule::new(
            id,
            description,
            self.source_file,
            span.start_line,
            span.end_line,
            SourceType::Schema,
        )?
        .with_endpoint(endpoint)
        .with_entity(entity)
        .depending_on(dependency);
        tracing::debug!(internal_id = id, entity, lines = %rule.line_range(), "schema rule");
        self.rules.push(rule);
        self.next_id += 1;
        Ok(id)
    }

    fn operation(
        &mut self,
        path: &str,
        method: &str,
        operation: &'a Node,
    ) -> Result<(), OpenApiAnalyzerError> {
        let endpoint = format!("{path} [{}]", method.to_uppercase());
        let mut request_dep = None;

        if self.analyzer.options.request_bodies {
            if let Some(body) = operation.get("requestBody") {
                let required = body.get("required").is_some_and(Node::is_true);
                let target = first_schema_ref(body.get("content"));
                if let (true, Some((media, schema))) = (required, target) {
                    let description = describe::request_body_required(method, path, media, schema);
                    let id = self.push(description, body, &endpoint, schema, None)?;
                    request_dep = Some(id);
                    let scope = Scope {
                        endpoint: &endpoint,
                        base_entity: schema,
                        depends_on: request_dep,
                    };
                    self.descend(schema, &scope, &mut Vec::new())?;
                }
            }
        }

        if self.analyzer.options.responses {
            if let Some(responses) = operation.get("responses") {
                for (_status, response) in responses.entries() {
                    let Some((_, schema)) = first_schema_ref(response.get("content")) else {
                        continue;
                    };
                    let scope = Scope {
                        endpoint: &endpoint,
                        base_entity: schema,
                        depends_on: request_dep,
                    };
                    self.descend(schema, &scope, &mut Vec::new())?;
                }
            }
        }

        Ok(())
    }

    /// Expand `name` unless it is unknown or already on the expansion path.
    fn descend(
        &mut self,
        name: &str,
        scope: &Scope<'_>,
        path: &mut Vec<String>,
    ) -> Result<(), OpenApiAnalyzerError> {
        let Some(&node) = self.schemas.get(name) else {
            return Ok(());
        };
        if path.iter().any(|on_path| on_path == name) {
            tracing::debug!(
                schema = name,
                entity = scope.base_entity,
                "schema already being expanded; not expanding again"
            );
            return Ok(());
        }

        path.push(name.to_string());
        let result = self.expand(name, node, scope, path);
        path.pop();
        result
    }

    fn expand(
        &mut self,
        name: &str,
        node: &'a Node,
        scope: &Scope<'_>,
        path: &mut Vec<String>,
    ) -> Result<(), OpenApiAnalyzerError> {
        let required: Vec<String> = node
            .get("required")
            .and_then(Node::as_sequence)
            .map(|items| items.iter().filter_map(Node::scalar_text).collect())
            .unwrap_or_default();
        let Some(properties) = node.get("properties").filter(|p| p.as_mapping().is_some()) else {
            return Ok(());
        };

        for (property, property_node) in properties.entries() {
            if !required.iter().any(|r| r == property) {
                continue;
            }

            let entity = format!("{}.{property}", scope.base_entity);
            let context = PropertyContext {
                schema: name.to_string(),
                property: property.to_string(),
                type_hint: property_node.get("type").and_then(Node::as_str).map(String::from),
                entity: entity.clone(),
            };
            let description = match self.analyzer.overrides.lookup(&context) {
                Some(sentence) => sentence.to_string(),
                None => describe::required_property(name, property, context.type_hint.as_deref()),
            };
            let prop_dep = self.push(description, node, scope.endpoint, &entity, scope.depends_on)?;

            let item_schema = items_ref(property_node).filter(|r| self.schemas.contains_key(*r));
            if let Some(item_schema) = item_schema {
                let array_entity = format!("{entity}[]");
                let requirement = format!("items must follow {item_schema}");
                let description = describe::array_items(&array_entity, &requirement);
                self.push(
                    description,
                    property_node,
                    scope.endpoint,
                    &array_entity,
                    Some(prop_dep),
                )?;
                let inner = Scope {
                    endpoint: scope.endpoint,
                    base_entity: &array_entity,
                    depends_on: Some(prop_dep),
                };
                self.descend(item_schema, &inner, path)?;
            } else if let Some(reference) = direct_ref(property_node) {
                let inner = Scope {
                    endpoint: scope.endpoint,
                    base_entity: &entity,
                    depends_on: Some(prop_dep),
                };
                self.descend(reference, &inner, path)?;
            }
        }

        for (property, property_node) in properties.entries() {
            let Some(values) = property_node.get("enum").and_then(Node::as_sequence) else {
                continue;
            };
            let values: Vec<String> = values.iter().filter_map(Node::scalar_text).collect();
            let entity = format!("{}.{property}", scope.base_entity);
            let description = describe::enum_values(&entity, &values);
            self.push(description, property_node, scope.endpoint, &entity, scope.depends_on)?;
        }

        Ok(())
    }
}
