//! Fixed natural-language templates for recognized constructs.
//!
//! Every function here is pure and deterministic; analyzers pass the parts of
//! a construct they captured and get back a finished sentence ending in `.`.

/// Trim a captured message and drop one layer of surrounding double quotes.
fn clean_message(message: Option<&str>) -> Option<String> {
    let cleaned = message?.trim();
    let cleaned = if cleaned.len() >= 2 && cleaned.starts_with('"') && cleaned.ends_with('"') {
        cleaned[1..cleaned.len() - 1].trim()
    } else {
        cleaned
    };
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// `require(condition)`-style precondition.
pub fn precondition(condition: &str, message: Option<&str>) -> String {
    let mut sentence = format!("The input must satisfy {condition}; otherwise the call fails");
    if let Some(message) = clean_message(message) {
        sentence.push_str(&format!(" with '{message}'"));
    }
    sentence.push('.');
    sentence
}

/// `if (predicate(..)) { delegate(..) }` guard. `&&` is rendered as `AND`.
pub fn guarded_call(condition: &str, called: &str) -> String {
    let readable = condition.replace("&&", "AND");
    format!("If {}, then {called} is executed.", readable.trim())
}

/// `if (condition) { throw .. }` construct.
pub fn conditional_throw(
    condition: &str,
    exception: Option<&str>,
    message: Option<&str>,
) -> String {
    let mut sentence = format!(
        "If {condition}, the code throws {}",
        exception.unwrap_or("an exception")
    );
    if let Some(message) = clean_message(message) {
        sentence.push_str(&format!(" with message '{message}'"));
    }
    sentence.push('.');
    sentence
}

pub fn request_body_required(method: &str, path: &str, media_type: &str, schema: &str) -> String {
    format!(
        "For the {} {path} endpoint, a {media_type} request body conforming to {schema} \
         MUST be provided; requests without a body are invalid.",
        method.to_uppercase()
    )
}

pub fn required_property(schema: &str, property: &str, type_hint: Option<&str>) -> String {
    let mut sentence = format!("The {schema} object MUST contain a '{property}' property");
    if let Some(type_hint) = type_hint {
        sentence.push_str(&format!(" of type {type_hint}"));
    }
    sentence.push('.');
    sentence
}

pub fn enum_values<S: AsRef<str>>(property_path: &str, values: &[S]) -> String {
    let joined = values
        .iter()
        .map(|v| v.as_ref())
        .collect::<Vec<_>>()
        .join(", ");
    format!("The '{property_path}' field MUST be one of: {joined}. Any other value is invalid.")
}

pub fn array_items(array_path: &str, item_requirement: &str) -> String {
    format!("Each item in '{array_path}' MUST satisfy: {item_requirement}.")
}
