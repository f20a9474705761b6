//! Configuration
//!
//! Loaded from TOML. Every section and key is optional:
//!
//! ```toml
//! [access]
//! fail_open = false
//!
//! [questionnaire]
//! category_field = "Categoría"
//! provider_exempt_categories = ["Portátil", "Desktop"]
//! max_units = 1000
//! ```

use crate::error::AuditError;
use secaudit_model::CategoryAnswer;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Admin gate policy
    pub access: AccessPolicy,
    /// Questionnaire derivation from asset records
    pub questionnaire: QuestionnaireConfig,
}

/// Admin gate policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessPolicy {
    /// Grant a degraded admin context when the authorization probe is unreachable
    pub fail_open: bool,
}

/// Field names and category rules used to build the questionnaire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionnaireConfig {
    /// Asset field holding the category
    pub category_field: String,
    /// Asset field holding the model name
    pub name_field: String,
    /// Asset field holding the vendor
    pub provider_field: String,
    /// Categories that do not ask for a provider
    pub provider_exempt_categories: Vec<String>,
    /// Most units a respondent may declare per category
    pub max_units: usize,
}

impl QuestionnaireConfig {
    /// Effective unit cap, never above [`CategoryAnswer::MAX_UNITS`]
    #[inline]
    #[must_use]
    pub fn unit_cap(&self) -> usize {
        self.max_units.min(CategoryAnswer::MAX_UNITS)
    }
}

impl Default for QuestionnaireConfig {
    fn default() -> Self {
        Self {
            category_field: "Categoría".to_string(),
            name_field: "Nombre".to_string(),
            provider_field: "Proveedor".to_string(),
            provider_exempt_categories: [
                "Portátil",
                "All-in-One",
                "Desktop",
                "Sensor de movimiento",
                "Equipo físico",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            max_units: 1000,
        }
    }
}

impl AuditConfig {
    /// Parse from TOML text
    ///
    /// # Errors
    /// `Config` on malformed TOML or mistyped keys.
    pub fn from_toml_str(text: &str) -> Result<Self, AuditError> {
        toml::from_str(text).map_err(|e| AuditError::Config(e.to_string()))
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// `Config` if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| AuditError::Config(format!("{}: {e}", path.display())))?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_fail_closed() {
        let config = AuditConfig::default();
        assert!(!config.access.fail_open);
        assert_eq!(config.questionnaire.category_field, "Categoría");
        assert_eq!(config.questionnaire.provider_exempt_categories.len(), 5);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = AuditConfig::from_toml_str("[access]\nfail_open = true\n").unwrap();
        assert!(config.access.fail_open);
        assert_eq!(config.questionnaire, QuestionnaireConfig::default());
    }

    #[test]
    fn mistyped_key_is_config_error() {
        let err = AuditConfig::from_toml_str("[access]\nfail_open = \"yes\"\n").unwrap_err();
        assert!(matches!(err, AuditError::Config(_)));
    }

    #[test]
    fn unit_cap_is_bounded_by_model_ceiling() {
        let config = AuditConfig::from_toml_str("[questionnaire]\nmax_units = 12\n").unwrap();
        assert_eq!(config.questionnaire.unit_cap(), 12);
        assert_eq!(QuestionnaireConfig::default().unit_cap(), 1000);

        let huge = AuditConfig::from_toml_str("[questionnaire]\nmax_units = 99999999\n").unwrap();
        assert_eq!(huge.questionnaire.unit_cap(), CategoryAnswer::MAX_UNITS);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[questionnaire]\ncategory_field = \"Tipo\"\nprovider_exempt_categories = []"
        )
        .unwrap();
        let config = AuditConfig::load(file.path()).unwrap();
        assert_eq!(config.questionnaire.category_field, "Tipo");
        assert!(config.questionnaire.provider_exempt_categories.is_empty());
        assert_eq!(config.questionnaire.name_field, "Nombre");
    }

    #[test]
    fn missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AuditConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, AuditError::Config(_)));
    }
}
