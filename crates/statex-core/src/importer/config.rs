use serde::{Deserialize, Serialize};

/// Importer settings
///
/// Every field has a default, so an empty `[importer]` TOML table is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImporterConfig {
    /// Path of the prototype used for nodes created without an explicit base
    pub default_base_path: String,
    /// Root set that `@meta:` nodes are registered in
    pub meta_set_name: String,
    /// Attribute matched by `@meta:` lookups and written on meta creation
    pub name_attribute: String,
    /// Reject creation of a node whose document lists pointers but no `base`
    pub require_explicit_base: bool,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            default_base_path: "/1".to_string(),
            meta_set_name: crate::graph::META_ASPECT_SET.to_string(),
            name_attribute: "name".to_string(),
            require_explicit_base: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: ImporterConfig = toml::from_str("").unwrap();
        assert_eq!(config, ImporterConfig::default());
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config: ImporterConfig = toml::from_str(
            r#"
default_base_path = "/7"
require_explicit_base = true
"#,
        )
        .unwrap();
        assert_eq!(config.default_base_path, "/7");
        assert!(config.require_explicit_base);
        assert_eq!(config.name_attribute, "name");
    }
}
