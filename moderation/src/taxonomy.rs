//! Abuse taxonomy — the recursive category tree reports are classified against
//!
//! The taxonomy is plain data: a tree of keyed nodes of finite depth, owned by
//! no session and immutable for the process lifetime. Dispatch on a category is
//! a lookup, never type-level. Every branching node carries an `other` child so
//! classifier fallback always has somewhere to land, and the root set carries
//! the designated `other` leaf for reports that fit nothing else.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical key of the designated fallback node, at the root and within
/// every branching sibling set.
pub const OTHER_KEY: &str = "other";

/// Errors found while validating a taxonomy at startup. These are programmer
/// or deployment errors and are fatal — they never occur per-session.
#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("duplicate key '{key}' within a sibling set")]
    DuplicateKey { key: String },

    #[error("empty key on node labeled '{label}'")]
    EmptyKey { label: String },

    #[error("key '{key}' is not canonical (keys must be lowercase)")]
    NonCanonicalKey { key: String },

    #[error("taxonomy has no root '{OTHER_KEY}' leaf")]
    MissingOther,
}

/// One node of the taxonomy tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyNode {
    /// Stable canonical key (lowercase), unique within its sibling set
    pub key: String,
    /// Short label shown on prompts
    pub label: String,
    /// One-line description shown where the surface supports it
    pub description: String,
    /// Ordered child nodes; empty for leaves
    #[serde(default)]
    pub children: Vec<TaxonomyNode>,
}

impl TaxonomyNode {
    /// Create a leaf node
    pub fn leaf(
        key: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            description: description.into(),
            children: Vec::new(),
        }
    }

    /// Create a branching node
    pub fn branch(
        key: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
        children: Vec<TaxonomyNode>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            description: description.into(),
            children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Child with the exact canonical key
    pub fn child(&self, key: &str) -> Option<&TaxonomyNode> {
        self.children.iter().find(|c| c.key == key)
    }

    /// Child matched case-insensitively, returning the canonical node
    pub fn child_canonical(&self, raw: &str) -> Option<&TaxonomyNode> {
        let lowered = raw.trim().to_ascii_lowercase();
        self.child(&lowered)
    }
}

/// The full taxonomy: an ordered set of root nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Taxonomy {
    roots: Vec<TaxonomyNode>,
}

impl Taxonomy {
    /// Build and validate a taxonomy. Validation failure is a startup error.
    pub fn new(roots: Vec<TaxonomyNode>) -> Result<Self, TaxonomyError> {
        validate_siblings(&roots)?;
        if !roots.iter().any(|n| n.key == OTHER_KEY && n.is_leaf()) {
            return Err(TaxonomyError::MissingOther);
        }
        Ok(Self { roots })
    }

    /// The ordered root set
    pub fn roots(&self) -> &[TaxonomyNode] {
        &self.roots
    }

    /// Root node with the exact canonical key
    pub fn root(&self, key: &str) -> Option<&TaxonomyNode> {
        self.roots.iter().find(|n| n.key == key)
    }

    /// Root node matched case-insensitively, returning the canonical node
    pub fn canonical_root(&self, raw: &str) -> Option<&TaxonomyNode> {
        let lowered = raw.trim().to_ascii_lowercase();
        self.root(&lowered)
    }

    /// The designated root fallback leaf
    pub fn other_root(&self) -> &TaxonomyNode {
        // Presence is guaranteed by validation in `new`.
        self.root(OTHER_KEY).expect("validated taxonomy has an 'other' root")
    }

    /// Walk a root-to-node path of canonical keys
    pub fn node_at(&self, path: &[String]) -> Option<&TaxonomyNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.root(first)?;
        for key in rest {
            node = node.child(key)?;
        }
        Some(node)
    }

    /// Children presented at the given depth: the root set for an empty path,
    /// otherwise the children of the node the path ends on.
    pub fn children_of(&self, path: &[String]) -> Option<&[TaxonomyNode]> {
        if path.is_empty() {
            return Some(&self.roots);
        }
        self.node_at(path).map(|n| n.children.as_slice())
    }

    /// Human-readable label chain for a path, e.g. "Fraud → Phishing"
    pub fn label_path(&self, path: &[String]) -> String {
        let mut labels = Vec::with_capacity(path.len());
        let mut nodes: &[TaxonomyNode] = &self.roots;
        for key in path {
            match nodes.iter().find(|n| &n.key == key) {
                Some(node) => {
                    labels.push(node.label.clone());
                    nodes = &node.children;
                }
                None => labels.push(key.clone()),
            }
        }
        labels.join(" → ")
    }

    /// The content taxonomy shipped with the engine: fraud and its subtype
    /// tree first (the priority category), then the general abuse categories.
    pub fn default_tree() -> Self {
        let phishing = TaxonomyNode::branch(
            "phishing",
            "Phishing",
            "Attempts to steal personal information",
            vec![
                TaxonomyNode::leaf(
                    "identifying_info",
                    "Identifying Information",
                    "Seeking birthday, name, or other identifying information",
                ),
                TaxonomyNode::leaf("location", "Location", "Seeking location information"),
                TaxonomyNode::leaf(
                    "payment_info",
                    "Payment Information",
                    "Seeking credit card or payment details",
                ),
                TaxonomyNode::leaf("ssn", "Social Security Number", "Seeking Social Security Number"),
                TaxonomyNode::leaf(OTHER_KEY, "Other", "Other phishing attempt"),
            ],
        );

        let investment_scam = TaxonomyNode::branch(
            "investment_scam",
            "Investment Scam",
            "Fraudulent investment opportunities",
            vec![
                TaxonomyNode::leaf("crypto", "Crypto", "Cryptocurrency investment scam"),
                TaxonomyNode::leaf("counterfeit", "Counterfeit", "Selling counterfeit items"),
                TaxonomyNode::leaf(OTHER_KEY, "Other", "Other investment scam type"),
            ],
        );

        let ecommerce = TaxonomyNode::branch(
            "ecommerce",
            "E-Commerce Scam",
            "Fake stores or counterfeit items",
            vec![
                TaxonomyNode::leaf("fake_store", "Fake Online Store", "Fraudulent online store"),
                TaxonomyNode::leaf("counterfeit", "Counterfeit Items", "Selling counterfeit items"),
                TaxonomyNode::leaf(OTHER_KEY, "Other", "Other e-commerce scam"),
            ],
        );

        let account_takeover = TaxonomyNode::branch(
            "account_takeover",
            "Account Takeover",
            "Unauthorized account access",
            vec![
                TaxonomyNode::leaf(
                    "unauthorized_login",
                    "Unauthorized Login",
                    "Someone logged into my account without permission",
                ),
                TaxonomyNode::leaf(
                    "unauthorized_message",
                    "Unauthorized Message",
                    "Someone posted/messaged from my account",
                ),
                TaxonomyNode::leaf(OTHER_KEY, "Other", "Other account takeover"),
            ],
        );

        let fraud = TaxonomyNode::branch(
            "fraud",
            "Fraud",
            "Scams and deceptive content",
            vec![phishing, investment_scam, ecommerce, account_takeover, TaxonomyNode::leaf(OTHER_KEY, "Other", "Other fraud")],
        );

        let harassment = TaxonomyNode::branch(
            "harassment",
            "Harassment",
            "Bullying or targeted abuse",
            vec![
                TaxonomyNode::leaf(
                    "bullying",
                    "Bullying",
                    "Persistent harmful behavior targeting an individual",
                ),
                TaxonomyNode::leaf(
                    "sexual_harassment",
                    "Sexual Harassment",
                    "Unwanted sexual comments or advances",
                ),
                TaxonomyNode::leaf("threats", "Threats", "Threats of harm or intimidation"),
                TaxonomyNode::leaf(
                    "doxxing",
                    "Doxxing",
                    "Sharing private or personal information without consent",
                ),
                TaxonomyNode::leaf(OTHER_KEY, "Other", "Other harassment"),
            ],
        );

        let hate_speech = TaxonomyNode::branch(
            "hate_speech",
            "Hate Speech",
            "Discriminatory or hateful content",
            vec![
                TaxonomyNode::leaf("racial", "Racial/Ethnic", "Hate based on race or ethnicity"),
                TaxonomyNode::leaf("gender", "Gender-Based", "Hate based on gender or gender identity"),
                TaxonomyNode::leaf("religion", "Religious", "Hate based on religious beliefs"),
                TaxonomyNode::leaf(
                    "orientation",
                    "Sexual Orientation",
                    "Hate based on sexual orientation",
                ),
                TaxonomyNode::leaf("disability", "Ability", "Hate based on disability"),
                TaxonomyNode::leaf(OTHER_KEY, "Other", "Other hate speech"),
            ],
        );

        let illegal_content = TaxonomyNode::branch(
            "illegal_content",
            "Illegal Content",
            "Content that violates laws or platform terms",
            vec![
                TaxonomyNode::leaf("piracy", "Piracy", "Unauthorized sharing of copyrighted material"),
                TaxonomyNode::leaf("csam", "CSAM", "Child Sexual Abuse Material"),
                TaxonomyNode::leaf(
                    "drugs",
                    "Illegal Substances",
                    "Content selling or promoting illegal substances",
                ),
                TaxonomyNode::leaf(
                    "weapons",
                    "Weapons/Violence",
                    "Content selling illegal weapons or promoting violence",
                ),
                TaxonomyNode::leaf(OTHER_KEY, "Other", "Other illegal content"),
            ],
        );

        let roots = vec![
            fraud,
            harassment,
            hate_speech,
            TaxonomyNode::leaf("spam", "Spam", "Unwanted promotional or repetitive content"),
            TaxonomyNode::leaf(
                "misinformation",
                "Misinformation",
                "Intentionally false or misleading information",
            ),
            illegal_content,
            TaxonomyNode::leaf(OTHER_KEY, "Other", "Other reportable content"),
        ];

        Self::new(roots).expect("built-in taxonomy is valid")
    }
}

fn validate_siblings(nodes: &[TaxonomyNode]) -> Result<(), TaxonomyError> {
    let mut seen = std::collections::HashSet::new();
    for node in nodes {
        if node.key.is_empty() {
            return Err(TaxonomyError::EmptyKey {
                label: node.label.clone(),
            });
        }
        if node.key != node.key.to_ascii_lowercase() {
            return Err(TaxonomyError::NonCanonicalKey {
                key: node.key.clone(),
            });
        }
        if !seen.insert(node.key.as_str()) {
            return Err(TaxonomyError::DuplicateKey {
                key: node.key.clone(),
            });
        }
        validate_siblings(&node.children)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tree_validates() {
        let taxonomy = Taxonomy::default_tree();
        assert!(taxonomy.root("fraud").is_some());
        assert!(taxonomy.root(OTHER_KEY).is_some());
        assert!(taxonomy.other_root().is_leaf());
    }

    #[test]
    fn test_canonical_root_is_case_insensitive() {
        let taxonomy = Taxonomy::default_tree();
        let node = taxonomy.canonical_root("FRAUD").expect("resolves");
        assert_eq!(node.key, "fraud");
        assert_eq!(taxonomy.canonical_root("  Spam ").unwrap().key, "spam");
        assert!(taxonomy.canonical_root("nonexistent").is_none());
    }

    #[test]
    fn test_node_at_walks_paths() {
        let taxonomy = Taxonomy::default_tree();
        let path = vec!["fraud".to_string(), "phishing".to_string(), "ssn".to_string()];
        let node = taxonomy.node_at(&path).expect("path resolves");
        assert_eq!(node.key, "ssn");
        assert!(node.is_leaf());

        let bad = vec!["fraud".to_string(), "nope".to_string()];
        assert!(taxonomy.node_at(&bad).is_none());
    }

    #[test]
    fn test_children_of_empty_path_is_root_set() {
        let taxonomy = Taxonomy::default_tree();
        let roots = taxonomy.children_of(&[]).unwrap();
        assert_eq!(roots.len(), taxonomy.roots().len());

        let fraud_children = taxonomy.children_of(&["fraud".to_string()]).unwrap();
        assert!(fraud_children.iter().any(|n| n.key == "phishing"));
    }

    #[test]
    fn test_every_branch_has_other_child() {
        fn check(node: &TaxonomyNode) {
            if !node.is_leaf() {
                assert!(
                    node.child(OTHER_KEY).is_some(),
                    "branch '{}' has no other child",
                    node.key
                );
                node.children.iter().for_each(check);
            }
        }
        Taxonomy::default_tree().roots().iter().for_each(check);
    }

    #[test]
    fn test_duplicate_sibling_key_rejected() {
        let roots = vec![
            TaxonomyNode::leaf("spam", "Spam", "a"),
            TaxonomyNode::leaf("spam", "Spam Again", "b"),
            TaxonomyNode::leaf(OTHER_KEY, "Other", "c"),
        ];
        assert!(matches!(
            Taxonomy::new(roots),
            Err(TaxonomyError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn test_missing_other_rejected() {
        let roots = vec![TaxonomyNode::leaf("spam", "Spam", "a")];
        assert!(matches!(Taxonomy::new(roots), Err(TaxonomyError::MissingOther)));
    }

    #[test]
    fn test_non_canonical_key_rejected() {
        let roots = vec![
            TaxonomyNode::leaf("Spam", "Spam", "a"),
            TaxonomyNode::leaf(OTHER_KEY, "Other", "b"),
        ];
        assert!(matches!(
            Taxonomy::new(roots),
            Err(TaxonomyError::NonCanonicalKey { .. })
        ));
    }

    #[test]
    fn test_label_path() {
        let taxonomy = Taxonomy::default_tree();
        let path = vec!["fraud".to_string(), "phishing".to_string()];
        assert_eq!(taxonomy.label_path(&path), "Fraud → Phishing");
    }
}
