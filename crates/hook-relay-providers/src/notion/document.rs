// hook-relay-providers/src/notion/document.rs
// ============================================================================
// Module: Document Normalizer
// Description: Flattens structured document properties into plain text.
// Purpose: Derive indexable text deterministically from property payloads.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Properties arrive as a tagged union keyed by a `type` discriminator. The
//! normalizer is a total function: unsupported or malformed shapes contribute
//! nothing rather than failing, so partial data beats a dropped event. The
//! joined content text is for display and embedding only; downstream code
//! must never parse it structurally.
//!
//! Invariants:
//! - Extraction is pure and deterministic for a given property map.
//! - No property shape causes an error or a panic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Fallback title when no title-like property matches.
pub const UNTITLED: &str = "Untitled";

/// Title-property keys probed in order for payload metadata.
const TITLE_KEYS: [&str; 3] = ["title", "Name", "name"];

// ============================================================================
// SECTION: Normalized Document
// ============================================================================

/// Flat text representation of a document payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDocument {
    /// Document identifier.
    pub id: String,
    /// Parent kind when the document has a parent.
    pub parent_type: Option<String>,
    /// Parent identifier when the document has a parent.
    pub parent_id: Option<String>,
    /// Flattened property text.
    pub content: String,
}

impl NormalizedDocument {
    /// Derives a document from webhook event data.
    #[must_use]
    pub fn from_event_data(data: &Value) -> Self {
        let content = data
            .get("properties")
            .and_then(Value::as_object)
            .map(extract_content)
            .unwrap_or_default();
        let parent = data.get("parent");
        let parent_type = parent
            .and_then(|parent| parent.get("type"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let parent_id = parent
            .and_then(|parent| {
                parent.get("page_id").or_else(|| parent.get("database_id"))
            })
            .and_then(Value::as_str)
            .map(str::to_string);
        Self {
            id: data.get("id").and_then(Value::as_str).unwrap_or_default().to_string(),
            parent_type,
            parent_id,
            content,
        }
    }

    /// Returns true when the trimmed content is non-empty.
    #[must_use]
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }

    /// Returns the flat JSON payload forwarded to indexing collaborators.
    #[must_use]
    pub fn to_payload(&self) -> Value {
        json!({
            "pageId": self.id,
            "parentType": self.parent_type,
            "parentId": self.parent_id,
            "content": self.content,
        })
    }
}

// ============================================================================
// SECTION: Content Extraction
// ============================================================================

/// Flattens a property map into newline-joined `key: value` lines.
///
/// Properties whose extracted value is empty are skipped entirely.
#[must_use]
pub fn extract_content(properties: &Map<String, Value>) -> String {
    let mut parts = Vec::new();
    for (key, value) in properties {
        if let Some(extracted) = extract_property_value(value)
            && !extracted.is_empty()
        {
            parts.push(format!("{key}: {extracted}"));
        }
    }
    parts.join("\n")
}

/// Extracts the display value of one tagged property; unsupported shapes
/// contribute nothing.
fn extract_property_value(value: &Value) -> Option<String> {
    let property = value.as_object()?;
    let tag = property.get("type").and_then(Value::as_str)?;
    match tag {
        "title" => property.get("title").and_then(Value::as_array).map(|spans| join_plain_text(spans)),
        "rich_text" => {
            property.get("rich_text").and_then(Value::as_array).map(|spans| join_plain_text(spans))
        }
        "number" => property.get("number").and_then(Value::as_number).map(|n| n.to_string()),
        "select" => property
            .get("select")
            .and_then(Value::as_object)
            .and_then(|selection| selection.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string),
        "multi_select" => property.get("multi_select").and_then(Value::as_array).map(|options| {
            options
                .iter()
                .map(|option| {
                    option.get("name").and_then(Value::as_str).unwrap_or_default()
                })
                .collect::<Vec<_>>()
                .join(", ")
        }),
        "date" => {
            let date = property.get("date").and_then(Value::as_object)?;
            let start = date.get("start").and_then(Value::as_str);
            let end = date.get("end").and_then(Value::as_str);
            match (start, end) {
                (Some(start), Some(end)) => Some(format!("{start} - {end}")),
                (Some(start), None) => Some(start.to_string()),
                (None, _) => None,
            }
        }
        "checkbox" => property
            .get("checkbox")
            .and_then(Value::as_bool)
            .map(|checked| if checked { "Yes" } else { "No" }.to_string()),
        "url" => property.get("url").and_then(Value::as_str).map(str::to_string),
        "email" => property.get("email").and_then(Value::as_str).map(str::to_string),
        "phone_number" => {
            property.get("phone_number").and_then(Value::as_str).map(str::to_string)
        }
        _ => None,
    }
}

/// Concatenates the `plain_text` of rich-text spans with no separator.
fn join_plain_text(spans: &[Value]) -> String {
    spans
        .iter()
        .map(|span| span.get("plain_text").and_then(Value::as_str).unwrap_or_default())
        .collect()
}

// ============================================================================
// SECTION: Title Lookup
// ============================================================================

/// Resolves a display title from a property map.
///
/// Probes `title`, then `Name`, then `name`; each value may be an array of
/// rich-text spans or an object wrapping a `title` array. No match yields
/// the literal `Untitled`.
#[must_use]
pub fn extract_title(properties: &Map<String, Value>) -> String {
    for key in TITLE_KEYS {
        let Some(value) = properties.get(key) else {
            continue;
        };
        let spans = match value {
            Value::Array(spans) => Some(spans.as_slice()),
            Value::Object(wrapper) => {
                wrapper.get("title").and_then(Value::as_array).map(Vec::as_slice)
            }
            _ => None,
        };
        if let Some(spans) = spans {
            let title = join_plain_text(spans);
            if !title.trim().is_empty() {
                return title;
            }
        }
    }
    UNTITLED.to_string()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only panic-based assertions."
    )]

    use serde_json::Map;
    use serde_json::Value;
    use serde_json::json;

    use super::NormalizedDocument;
    use super::UNTITLED;
    use super::extract_content;
    use super::extract_title;

    fn properties(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn title_spans_concatenate_without_separator() {
        let map = properties(json!({
            "Title": { "type": "title", "title": [
                { "plain_text": "A" },
                { "plain_text": "B" }
            ]}
        }));
        assert_eq!(extract_content(&map), "Title: AB");
    }

    #[test]
    fn empty_map_yields_empty_content() {
        let map = Map::new();
        assert_eq!(extract_content(&map), "");
    }

    #[test]
    fn extraction_is_pure_and_repeatable() {
        let map = properties(json!({
            "Status": { "type": "select", "select": { "name": "Active" } },
            "Count": { "type": "number", "number": 42 }
        }));
        let first = extract_content(&map);
        let second = extract_content(&map);
        assert_eq!(first, second);
    }

    #[test]
    fn supported_tags_extract_per_rule() {
        let map = properties(json!({
            "Notes": { "type": "rich_text", "rich_text": [
                { "plain_text": "hello " },
                { "plain_text": "world" }
            ]},
            "Score": { "type": "number", "number": 9.5 },
            "Stage": { "type": "select", "select": { "name": "Review" } },
            "Tags": { "type": "multi_select", "multi_select": [
                { "name": "alpha" },
                { "name": "beta" }
            ]},
            "Due": { "type": "date", "date": { "start": "2026-01-01" } },
            "Window": { "type": "date", "date": { "start": "2026-01-01", "end": "2026-02-01" } },
            "Done": { "type": "checkbox", "checkbox": true },
            "Open": { "type": "checkbox", "checkbox": false },
            "Site": { "type": "url", "url": "https://example.com" },
            "Mail": { "type": "email", "email": "a@example.com" },
            "Phone": { "type": "phone_number", "phone_number": "+1-555-0100" }
        }));
        let content = extract_content(&map);
        assert!(content.contains("Notes: hello world"));
        assert!(content.contains("Score: 9.5"));
        assert!(content.contains("Stage: Review"));
        assert!(content.contains("Tags: alpha, beta"));
        assert!(content.contains("Due: 2026-01-01"));
        assert!(content.contains("Window: 2026-01-01 - 2026-02-01"));
        assert!(content.contains("Done: Yes"));
        assert!(content.contains("Open: No"));
        assert!(content.contains("Site: https://example.com"));
        assert!(content.contains("Mail: a@example.com"));
        assert!(content.contains("Phone: +1-555-0100"));
    }

    #[test]
    fn malformed_shapes_contribute_nothing() {
        let map = properties(json!({
            "Null": null,
            "Scalar": "plain string",
            "Untyped": { "title": [{ "plain_text": "x" }] },
            "Unknown": { "type": "rollup", "rollup": {} },
            "BadDate": { "type": "date", "date": { "end": "2026-02-01" } }
        }));
        assert_eq!(extract_content(&map), "");
    }

    #[test]
    fn document_without_meaningful_content_reports_empty() {
        let document = NormalizedDocument::from_event_data(&json!({
            "id": "p-1",
            "properties": {
                "Blank": { "type": "rich_text", "rich_text": [] }
            }
        }));
        assert_eq!(document.content, "");
        assert!(!document.has_content());
    }

    #[test]
    fn from_event_data_extracts_parent_metadata() {
        let document = NormalizedDocument::from_event_data(&json!({
            "id": "p-1",
            "parent": { "type": "database_id", "database_id": "db-9" },
            "properties": {
                "Name": { "type": "title", "title": [{ "plain_text": "Spec" }] }
            }
        }));
        assert_eq!(document.id, "p-1");
        assert_eq!(document.parent_type.as_deref(), Some("database_id"));
        assert_eq!(document.parent_id.as_deref(), Some("db-9"));
        assert_eq!(document.content, "Name: Spec");
        assert!(document.has_content());
        assert_eq!(
            document.to_payload(),
            json!({
                "pageId": "p-1",
                "parentType": "database_id",
                "parentId": "db-9",
                "content": "Name: Spec",
            })
        );
    }

    #[test]
    fn page_parent_is_preferred_over_database_parent() {
        let document = NormalizedDocument::from_event_data(&json!({
            "id": "p-2",
            "parent": { "type": "page_id", "page_id": "pp-1", "database_id": "db-1" }
        }));
        assert_eq!(document.parent_id.as_deref(), Some("pp-1"));
    }

    #[test]
    fn title_lookup_probes_keys_in_order() {
        let map = properties(json!({
            "name": [{ "plain_text": "lower" }],
            "Name": { "title": [{ "plain_text": "wrapped" }] }
        }));
        assert_eq!(extract_title(&map), "wrapped");

        let direct = properties(json!({
            "title": [{ "plain_text": "direct" }]
        }));
        assert_eq!(extract_title(&direct), "direct");
    }

    #[test]
    fn title_lookup_falls_back_to_untitled() {
        assert_eq!(extract_title(&Map::new()), UNTITLED);
        let unmatched = properties(json!({
            "Name": { "type": "number", "number": 3 }
        }));
        assert_eq!(extract_title(&unmatched), UNTITLED);
    }
}
