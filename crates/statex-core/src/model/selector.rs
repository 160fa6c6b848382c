//! Symbolic node references
//!
//! Grammar:
//!
//! | form | variant |
//! |---|---|
//! | `/<segments>` or `@path:<value>` | [`Selector::Path`] |
//! | `@guid:<value>` or a bare string | [`Selector::Guid`] |
//! | `@meta:<name>` | [`Selector::Meta`] |
//! | `@attribute:<name>:<value>` or `@<name>:<value>` | [`Selector::Attribute`] |
//! | `@id:<token>` | [`Selector::Placeholder`] |
//!
//! Only the first `:` after the attribute name separates it from the value,
//! so attribute values may themselves contain colons.

use crate::errors::{Result, StatexError};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// Absolute path from the project root
    Path(String),
    /// Stable global identifier, found by depth-first search from the root
    Guid(String),
    /// Name of a meta-registered node
    Meta(String),
    /// Attribute match among the immediate children of the scoping parent
    Attribute { name: String, value: String },
    /// Token that only resolves through the in-flight resolution cache
    Placeholder(String),
}

impl Selector {
    /// Parse a selector string
    ///
    /// # Errors
    ///
    /// `InvalidSelector` for an empty string, an `@tag` without a `:`, or an
    /// attribute selector without a value.
    pub fn parse(input: &str) -> Result<Self> {
        if input.is_empty() {
            return Err(invalid(input, "empty selector"));
        }
        if input.starts_with('/') {
            return Ok(Selector::Path(input.to_string()));
        }
        let Some(tagged) = input.strip_prefix('@') else {
            return Ok(Selector::Guid(input.to_string()));
        };
        let (tag, rest) = tagged
            .split_once(':')
            .ok_or_else(|| invalid(input, "missing ':' after tag"))?;

        match tag {
            "path" => Ok(Selector::Path(rest.to_string())),
            "guid" => Ok(Selector::Guid(rest.to_string())),
            "meta" => Ok(Selector::Meta(rest.to_string())),
            "id" => Ok(Selector::Placeholder(rest.to_string())),
            "attribute" => {
                let (name, value) = rest
                    .split_once(':')
                    .ok_or_else(|| invalid(input, "attribute selector needs <name>:<value>"))?;
                Ok(Selector::Attribute {
                    name: name.to_string(),
                    value: value.to_string(),
                })
            }
            "" => Err(invalid(input, "missing tag")),
            // `@name:value` shorthand, generalized to any attribute name
            name => Ok(Selector::Attribute {
                name: name.to_string(),
                value: rest.to_string(),
            }),
        }
    }

    /// Absolute selectors are cached without parent scoping
    pub fn is_absolute(&self) -> bool {
        !matches!(self, Selector::Attribute { .. })
    }

    /// Fresh placeholder selector for a document that carries no `id`
    pub fn fresh_placeholder() -> Self {
        Selector::Placeholder(uuid::Uuid::now_v7().to_string())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Path(path) => write!(f, "@path:{}", path),
            Selector::Guid(guid) => write!(f, "@guid:{}", guid),
            Selector::Meta(name) => write!(f, "@meta:{}", name),
            Selector::Attribute { name, value } => write!(f, "@attribute:{}:{}", name, value),
            Selector::Placeholder(token) => write!(f, "@id:{}", token),
        }
    }
}

impl std::str::FromStr for Selector {
    type Err = StatexError;

    fn from_str(s: &str) -> Result<Self> {
        Selector::parse(s)
    }
}

fn invalid(selector: &str, reason: &str) -> StatexError {
    StatexError::InvalidSelector {
        selector: selector.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path_forms() {
        assert_eq!(
            Selector::parse("/1/a").unwrap(),
            Selector::Path("/1/a".to_string())
        );
        assert_eq!(
            Selector::parse("@path:/1/a").unwrap(),
            Selector::Path("/1/a".to_string())
        );
    }

    #[test]
    fn test_parse_bare_string_is_guid() {
        assert_eq!(
            Selector::parse("0b2c-77").unwrap(),
            Selector::Guid("0b2c-77".to_string())
        );
        assert_eq!(
            Selector::parse("@guid:0b2c-77").unwrap(),
            Selector::Guid("0b2c-77".to_string())
        );
    }

    #[test]
    fn test_parse_name_shorthand() {
        assert_eq!(
            Selector::parse("@name:R1").unwrap(),
            Selector::Attribute {
                name: "name".to_string(),
                value: "R1".to_string()
            }
        );
    }

    #[test]
    fn test_attribute_value_keeps_colons() {
        assert_eq!(
            Selector::parse("@attribute:label:a:b").unwrap(),
            Selector::Attribute {
                name: "label".to_string(),
                value: "a:b".to_string()
            }
        );
    }

    #[test]
    fn test_meta_and_placeholder() {
        assert_eq!(
            Selector::parse("@meta:Circuit").unwrap(),
            Selector::Meta("Circuit".to_string())
        );
        assert_eq!(
            Selector::parse("@id:tmp-1").unwrap(),
            Selector::Placeholder("tmp-1".to_string())
        );
    }

    #[test]
    fn test_invalid_selectors() {
        assert!(matches!(
            Selector::parse(""),
            Err(StatexError::InvalidSelector { .. })
        ));
        assert!(matches!(
            Selector::parse("@meta"),
            Err(StatexError::InvalidSelector { .. })
        ));
        assert!(matches!(
            Selector::parse("@attribute:only-name"),
            Err(StatexError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn test_display_is_canonical_and_reparses() {
        for input in ["/1", "@meta:Pin", "@name:R1", "@id:x", "abc"] {
            let selector = Selector::parse(input).unwrap();
            let again = Selector::parse(&selector.to_string()).unwrap();
            assert_eq!(selector, again, "{input}");
        }
    }

    #[test]
    fn test_only_attribute_selectors_are_scoped() {
        assert!(Selector::parse("@meta:X").unwrap().is_absolute());
        assert!(Selector::parse("@id:X").unwrap().is_absolute());
        assert!(!Selector::parse("@name:X").unwrap().is_absolute());
    }
}
