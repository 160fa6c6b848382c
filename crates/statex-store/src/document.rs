//! Desired-state document parser with validation
//!
//! Parses JSON or YAML and checks that every selector the document carries
//! follows the selector grammar, so that a malformed reference is reported
//! with its location before any graph mutation happens.

use crate::errors::{document_validation, Result};
use statex_core::model::{MemberData, Selector, StateDocument};
use std::fs;
use std::path::Path;

/// On-disk encoding of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// `.yaml` and `.yml` are YAML; anything else is read as JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                DocumentFormat::Yaml
            }
            _ => DocumentFormat::Json,
        }
    }
}

/// Parse a document file, choosing the format from its extension
///
/// # Errors
///
/// `InvalidInput` if the file cannot be read, does not parse, or carries a
/// malformed selector.
pub fn parse_document_file(path: &Path) -> Result<StateDocument> {
    let content = fs::read_to_string(path)
        .map_err(|e| document_validation("", &format!("Failed to read document file: {}", e)))?;

    parse_document_str(&content, DocumentFormat::from_path(path))
}

/// Parse a document from a string
///
/// # Errors
///
/// `InvalidInput` if the content does not parse or carries a malformed
/// selector.
pub fn parse_document_str(content: &str, format: DocumentFormat) -> Result<StateDocument> {
    let document: StateDocument = match format {
        DocumentFormat::Json => serde_json::from_str(content)
            .map_err(|e| document_validation("", &format!("JSON parse error: {}", e)))?,
        DocumentFormat::Yaml => serde_yaml::from_str(content)
            .map_err(|e| document_validation("", &format!("YAML parse error: {}", e)))?,
    };

    validate_document(&document)?;

    Ok(document)
}

/// Validate every selector in `document` and its subtree
///
/// # Errors
///
/// `InvalidInput` naming the key of the first malformed selector.
pub fn validate_document(document: &StateDocument) -> Result<()> {
    validate_at(document, "")
}

fn validate_at(document: &StateDocument, prefix: &str) -> Result<()> {
    if let Some(id) = &document.id {
        check_selector(id, &join(prefix, "id"))?;
    }

    for (name, target) in document.pointers.iter().flatten() {
        check_selector(target, &join(prefix, &format!("pointers.{}", name)))?;
    }

    for (name, meta) in document.pointer_meta.iter().flatten() {
        for target in meta.targets.keys() {
            check_selector(target, &join(prefix, &format!("pointer_meta.{}", name)))?;
        }
    }

    for (name, members) in document.sets.iter().flatten() {
        for (index, member) in members.iter().enumerate() {
            check_selector(member, &join(prefix, &format!("sets.{}.{}", name, index)))?;
        }
    }

    check_member_data(document.member_attributes.as_ref(), "member_attributes", prefix)?;
    check_member_data(document.member_registry.as_ref(), "member_registry", prefix)?;

    for (index, child) in document.children.iter().flatten().enumerate() {
        validate_at(child, &join(prefix, &format!("children.{}", index)))?;
    }

    Ok(())
}

fn check_member_data(data: Option<&MemberData>, category: &str, prefix: &str) -> Result<()> {
    for (set, members) in data.into_iter().flatten() {
        for member in members.keys() {
            check_selector(member, &join(prefix, &format!("{}.{}", category, set)))?;
        }
    }
    Ok(())
}

fn check_selector(selector: &str, key: &str) -> Result<()> {
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| document_validation(key, &e.to_string()))
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("state.yaml")),
            DocumentFormat::Yaml
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("state.YML")),
            DocumentFormat::Yaml
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("state.json")),
            DocumentFormat::Json
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("state")),
            DocumentFormat::Json
        );
    }

    #[test]
    fn test_nested_bad_selector_reports_location() {
        let content = r#"{"children": [{"id": "@name:a"}, {"id": "@name:b", "pointers": {"src": "@:x"}}]}"#;

        let err = parse_document_str(content, DocumentFormat::Json).unwrap_err();
        assert_eq!(err.code(), "ERR_INVALID_INPUT");
        assert_eq!(err.key(), Some("children.1.pointers.src"));
    }

    #[test]
    fn test_empty_set_member_rejected() {
        let content = "sets:\n  items:\n    - /1\n    - ''\n";

        let err = parse_document_str(content, DocumentFormat::Yaml).unwrap_err();
        assert_eq!(err.key(), Some("sets.items.1"));
    }
}
