//! Classifier result contract and taxonomy validation
//!
//! The external classifier hands the gateway a `(category, subtype, severity,
//! confidence, reasoning)` tuple. The engine never computes any of it — it
//! only validates the category fields against the taxonomy, substituting the
//! designated `other` node on mismatch. Mismatches are data-quality events,
//! never hard errors.

use serde::{Deserialize, Serialize};

use crate::session::decision::Severity;
use crate::taxonomy::{Taxonomy, OTHER_KEY};

/// A classifier verdict for one message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierResult {
    /// Claimed root category; may be absent or unknown to the taxonomy
    pub category: Option<String>,
    /// Claimed subtype under that category
    pub subtype: Option<String>,
    /// Claimed severity of the violation
    pub severity: Severity,
    /// Confidence in [0, 1]
    pub confidence: f32,
    /// Free-text rationale, stored as the session note
    pub reasoning: String,
}

impl ClassifierResult {
    /// Confidence as a whole percentage for rendering
    pub fn confidence_pct(&self) -> u8 {
        (self.confidence.clamp(0.0, 1.0) * 100.0).round() as u8
    }

    /// Validate the claimed category/subtype against the taxonomy and produce
    /// a canonical category path. Pure and idempotent: the same input always
    /// yields the same path and the same fallback records.
    pub fn resolve_path(&self, taxonomy: &Taxonomy) -> PathResolution {
        let mut fallbacks = Vec::new();

        let category_node = match self.category.as_deref() {
            // No classification claimed: route to the designated root leaf.
            None => taxonomy.other_root(),
            Some(raw) => match taxonomy.canonical_root(raw) {
                Some(node) => node,
                None => {
                    fallbacks.push(FieldFallback {
                        field: "category",
                        raw: raw.to_string(),
                        substituted: Some(OTHER_KEY.to_string()),
                    });
                    taxonomy.other_root()
                }
            },
        };

        let mut path = vec![category_node.key.clone()];

        if let Some(raw) = self.subtype.as_deref() {
            if category_node.is_leaf() {
                // Subtype claimed under a leaf category: nothing to attach it to.
                fallbacks.push(FieldFallback {
                    field: "subtype",
                    raw: raw.to_string(),
                    substituted: None,
                });
            } else {
                match category_node.child_canonical(raw) {
                    Some(child) => path.push(child.key.clone()),
                    None => match category_node.child(OTHER_KEY) {
                        Some(other) => {
                            fallbacks.push(FieldFallback {
                                field: "subtype",
                                raw: raw.to_string(),
                                substituted: Some(other.key.clone()),
                            });
                            path.push(other.key.clone());
                        }
                        None => {
                            fallbacks.push(FieldFallback {
                                field: "subtype",
                                raw: raw.to_string(),
                                substituted: None,
                            });
                        }
                    },
                }
            }
        }

        PathResolution { path, fallbacks }
    }
}

/// Outcome of validating a classifier result against the taxonomy
#[derive(Debug, Clone)]
pub struct PathResolution {
    /// Canonical category path, never empty
    pub path: Vec<String>,
    /// Fields that failed validation and what was substituted
    pub fallbacks: Vec<FieldFallback>,
}

/// One field that fell back during validation
#[derive(Debug, Clone)]
pub struct FieldFallback {
    pub field: &'static str,
    pub raw: String,
    /// Canonical key substituted, or None when the value was dropped
    pub substituted: Option<String>,
}

impl std::fmt::Display for FieldFallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.substituted {
            Some(sub) => write!(f, "{} '{}' replaced with '{}'", self.field, self.raw, sub),
            None => write!(f, "{} '{}' dropped", self.field, self.raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(category: Option<&str>, subtype: Option<&str>) -> ClassifierResult {
        ClassifierResult {
            category: category.map(String::from),
            subtype: subtype.map(String::from),
            severity: Severity::Medium,
            confidence: 0.9,
            reasoning: "test".to_string(),
        }
    }

    #[test]
    fn test_valid_pair_resolves_canonically() {
        let taxonomy = Taxonomy::default_tree();
        let resolution = result(Some("fraud"), Some("phishing")).resolve_path(&taxonomy);
        assert_eq!(resolution.path, vec!["fraud", "phishing"]);
        assert!(resolution.fallbacks.is_empty());
    }

    #[test]
    fn test_case_is_normalized_without_fallback() {
        let taxonomy = Taxonomy::default_tree();
        let resolution = result(Some("FRAUD"), Some("Phishing")).resolve_path(&taxonomy);
        assert_eq!(resolution.path, vec!["fraud", "phishing"]);
        assert!(resolution.fallbacks.is_empty());
    }

    #[test]
    fn test_unknown_subtype_falls_back_to_other() {
        let taxonomy = Taxonomy::default_tree();
        let resolution = result(Some("FRAUD"), Some("nonexistent")).resolve_path(&taxonomy);
        assert_eq!(resolution.path, vec!["fraud", "other"]);
        assert_eq!(resolution.fallbacks.len(), 1);
        assert_eq!(resolution.fallbacks[0].field, "subtype");
    }

    #[test]
    fn test_unknown_category_falls_back_to_other_root() {
        let taxonomy = Taxonomy::default_tree();
        let resolution = result(Some("gibberish"), None).resolve_path(&taxonomy);
        assert_eq!(resolution.path, vec!["other"]);
        assert_eq!(resolution.fallbacks.len(), 1);
        assert_eq!(resolution.fallbacks[0].field, "category");
    }

    #[test]
    fn test_absent_category_routes_to_other_silently() {
        let taxonomy = Taxonomy::default_tree();
        let resolution = result(None, None).resolve_path(&taxonomy);
        assert_eq!(resolution.path, vec!["other"]);
        assert!(resolution.fallbacks.is_empty());
    }

    #[test]
    fn test_subtype_under_leaf_category_is_dropped() {
        let taxonomy = Taxonomy::default_tree();
        let resolution = result(Some("spam"), Some("whatever")).resolve_path(&taxonomy);
        assert_eq!(resolution.path, vec!["spam"]);
        assert_eq!(resolution.fallbacks.len(), 1);
        assert!(resolution.fallbacks[0].substituted.is_none());
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let taxonomy = Taxonomy::default_tree();
        let verdict = result(Some("FRAUD"), Some("nonexistent"));
        let first = verdict.resolve_path(&taxonomy);
        let second = verdict.resolve_path(&taxonomy);
        assert_eq!(first.path, second.path);
        assert_eq!(first.fallbacks.len(), second.fallbacks.len());
    }

    #[test]
    fn test_confidence_pct() {
        assert_eq!(result(None, None).confidence_pct(), 90);
        let mut r = result(None, None);
        r.confidence = 1.7;
        assert_eq!(r.confidence_pct(), 100);
    }
}
