//! Keyword classifier: free text to a taxonomy category.
//!
//! Candidates are tried most specific first (more key tokens), ties broken by
//! key. The first candidate whose terms match the lowercased text wins; when
//! none does, the taxonomy root is returned. Classification never fails.
//!
//! Matching is substring containment, not whole-word. With the default
//! `MatchPolicy::All` every term on a category's path must be present; a
//! multi-word category no longer fires on a single shared word.
//! `MatchPolicy::Any` keeps the older "any term" behaviour for deployments
//! that depend on it.

use crate::config::ClassifierConfig;
use crate::taxonomy::{CategoryEntry, CategoryNode, Taxonomy, TaxonomyError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Every term must be found
    #[default]
    All,
    /// At least one term must be found
    Any,
}

impl MatchPolicy {
    fn matches(&self, node: &CategoryNode, normalized: &str) -> bool {
        let mut terms = node.match_terms.iter();
        match self {
            MatchPolicy::All => {
                !node.match_terms.is_empty() && terms.all(|t| t.is_satisfied_by(normalized))
            }
            MatchPolicy::Any => terms.any(|t| t.is_satisfied_by(normalized)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Classifier {
    taxonomy: Taxonomy,
    policy: MatchPolicy,
}

impl Classifier {
    pub fn new(taxonomy: Taxonomy, policy: MatchPolicy) -> Self {
        Self { taxonomy, policy }
    }

    /// Built-in taxonomy or the configured taxonomy file
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, TaxonomyError> {
        let taxonomy = match &config.taxonomy_path {
            Some(path) => {
                let taxonomy = Taxonomy::load(path)?;
                info!(
                    "Loaded taxonomy from {} ({} categories)",
                    path.display(),
                    taxonomy.len()
                );
                taxonomy
            }
            None => Taxonomy::builtin(),
        };
        Ok(Self::new(taxonomy, config.policy))
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Pick the category for `text`
    pub fn classify(&self, text: &str) -> &CategoryEntry {
        let normalized = normalize_text(text);

        let chosen = self
            .taxonomy
            .ranked()
            .find(|node| self.policy.matches(node, &normalized))
            .map(|node| &node.entry)
            .unwrap_or_else(|| self.taxonomy.root());

        debug!(
            "Classified ({:?}) as {} [{}]",
            self.policy, chosen.display_path, chosen.id
        );
        chosen
    }
}

pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
}
