//! Category catalog
//!
//! Builds the questionnaire's category list and the per-category option
//! domains (known asset names and providers) from the asset records.

use crate::config::QuestionnaireConfig;
use indexmap::{IndexMap, IndexSet};
use secaudit_model::Record;

/// Known asset model within a category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedAsset {
    /// Model name
    pub name: String,
    /// Provider of the first record with this name
    pub provider: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CategoryEntry {
    names: IndexMap<String, String>,
    providers: IndexSet<String>,
}

/// Categories and their option domains, in first-appearance order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryCatalog {
    entries: IndexMap<String, CategoryEntry>,
    provider_exempt: Vec<String>,
}

impl CategoryCatalog {
    /// Build from asset records
    ///
    /// Records without a non-empty category are skipped.
    #[must_use]
    pub fn from_assets(assets: &[Record], config: &QuestionnaireConfig) -> Self {
        let mut entries: IndexMap<String, CategoryEntry> = IndexMap::new();
        for record in assets {
            let Some(category) = record
                .text(&config.category_field)
                .map(str::trim)
                .filter(|c| !c.is_empty())
            else {
                continue;
            };
            let entry = entries.entry(category.to_string()).or_default();
            let provider = record
                .text(&config.provider_field)
                .map(str::trim)
                .unwrap_or_default();
            if let Some(name) = record
                .text(&config.name_field)
                .map(str::trim)
                .filter(|n| !n.is_empty())
            {
                entry
                    .names
                    .entry(name.to_string())
                    .or_insert_with(|| provider.to_string());
            }
            if !provider.is_empty() {
                entry.providers.insert(provider.to_string());
            }
        }
        tracing::debug!("category catalog built with {} categories", entries.len());
        Self {
            entries,
            provider_exempt: config.provider_exempt_categories.clone(),
        }
    }

    /// Ordered category names
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Check if there is nothing to ask
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of categories
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Distinct asset names of a category
    #[must_use]
    pub fn names(&self, category: &str) -> Vec<NamedAsset> {
        self.entries
            .get(category)
            .map(|e| {
                e.names
                    .iter()
                    .map(|(name, provider)| NamedAsset {
                        name: name.clone(),
                        provider: provider.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Distinct non-empty providers of a category
    #[must_use]
    pub fn providers(&self, category: &str) -> Vec<String> {
        self.entries
            .get(category)
            .map(|e| e.providers.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether the questionnaire asks for a provider in this category
    #[must_use]
    pub fn asks_provider(&self, category: &str) -> bool {
        !self.provider_exempt.iter().any(|c| c == category)
    }
}
