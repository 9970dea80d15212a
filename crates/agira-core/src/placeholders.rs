//! `{{ name }}` placeholder handling for notification and mail text.
//!
//! A placeholder is `{{`, optional whitespace, a name made of letters,
//! digits, `_` or `.`, optional whitespace, `}}`. Anything else between
//! braces is left alone.

use std::collections::BTreeMap;

/// A placeholder occurrence: its byte range in the text and its name.
struct Marker<'t> {
    start: usize,
    end: usize,
    name: &'t str,
}

fn is_name(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

fn markers(text: &str) -> Vec<Marker<'_>> {
    let mut found = Vec::new();
    let mut cursor = 0;

    while let Some(open) = text[cursor..].find("{{") {
        let start = cursor + open;
        let inner_start = start + 2;
        let Some(close) = text[inner_start..].find("}}") else {
            break;
        };
        let inner_end = inner_start + close;
        let name = text[inner_start..inner_end].trim();

        if is_name(name) {
            found.push(Marker {
                start,
                end: inner_end + 2,
                name,
            });
            cursor = inner_end + 2;
        } else {
            cursor = inner_start;
        }
    }

    found
}

/// Names of all placeholders in `text`, first occurrence order, no repeats.
pub fn extract_variables(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for marker in markers(text) {
        if !names.iter().any(|n| n == marker.name) {
            names.push(marker.name.to_string());
        }
    }
    names
}

/// Replace every placeholder whose name is in `values`. Unknown placeholders
/// are kept verbatim so missing data stays visible.
pub fn render_placeholders(text: &str, values: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for marker in markers(text) {
        if let Some(value) = values.get(marker.name) {
            out.push_str(&text[last..marker.start]);
            out.push_str(value);
            last = marker.end;
        }
    }
    out.push_str(&text[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn duplicates_collapse_in_first_seen_order() {
        let names = extract_variables("{{ name }} and {{ name }} again, plus {{ project }}");
        assert_eq!(names, vec!["name", "project"]);
    }

    #[test]
    fn whitespace_inside_braces_is_optional() {
        assert_eq!(extract_variables("{{a}} {{  b  }} {{ issue.title }}"), vec!["a", "b", "issue.title"]);
    }

    #[test]
    fn malformed_markers_are_ignored() {
        assert!(extract_variables("{{ }} {{ two words }} {{ unclosed").is_empty());
        assert_eq!(extract_variables("{{ {{ inner }}"), vec!["inner"]);
    }

    #[test]
    fn render_replaces_known_and_keeps_unknown() {
        let rendered = render_placeholders(
            "Hi {{ name }}, {{ project }} changed by {{ name }}. {{ missing }}",
            &values(&[("name", "Ana"), ("project", "Agira")]),
        );
        assert_eq!(rendered, "Hi Ana, Agira changed by Ana. {{ missing }}");
    }

    #[test]
    fn render_without_markers_is_identity() {
        let text = "plain text with { single } braces";
        assert_eq!(render_placeholders(text, &values(&[("single", "x")])), text);
    }
}
