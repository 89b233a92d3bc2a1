//! Engine configuration — routing tables and policy knobs
//!
//! The moderator-surface routing map is explicit configuration injected at
//! construction, never ambient state, so tests can run against fixtures.
//! Loadable from TOML; defaults mirror a small single-community deployment.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::notify::{CommunityId, SurfaceId};

/// Errors raised while loading or validating configuration. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

/// Configuration for the moderation engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModerationConfig {
    /// Moderator surface per community. A community absent from this map has
    /// no moderator pool; manual reports there fail loudly, automatic ones
    /// are dropped.
    pub moderator_surfaces: HashMap<CommunityId, SurfaceId>,

    /// Surface receiving supplementary High/Critical escalation notices.
    /// None disables oversight alerts.
    pub oversight_surface: Option<SurfaceId>,

    /// Free-text note cap; overflow is truncated, never rejected.
    pub note_max_len: usize,

    /// Idle seconds before a collecting report is cancelled and its prompts
    /// retracted. Mandatory for reporter-side prompts.
    pub reporter_prompt_timeout_secs: u64,

    /// Idle seconds before a claimed but unfinished moderator flow is
    /// released back to the pool. None leaves moderator prompts open forever.
    pub moderator_prompt_timeout_secs: Option<u64>,

    /// Minimum classifier confidence for an automatic report to be accepted.
    pub auto_confidence_threshold: f32,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            moderator_surfaces: HashMap::new(),
            oversight_surface: None,
            note_max_len: 1024,
            reporter_prompt_timeout_secs: 300,
            moderator_prompt_timeout_secs: None,
            auto_confidence_threshold: 0.8,
        }
    }
}

impl ModerationConfig {
    /// Parse from a TOML string and validate
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Startup validation; violations are fatal, never per-session.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.note_max_len == 0 {
            return Err(ConfigError::invalid("note_max_len must be positive"));
        }
        if self.reporter_prompt_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "reporter_prompt_timeout_secs must be positive",
            ));
        }
        if !(0.0..=1.0).contains(&self.auto_confidence_threshold) {
            return Err(ConfigError::invalid(
                "auto_confidence_threshold must be within [0, 1]",
            ));
        }
        Ok(())
    }

    /// Moderator surface for a community, if one is registered
    pub fn moderator_surface(&self, community: &str) -> Option<&SurfaceId> {
        self.moderator_surfaces.get(community)
    }

    /// Register a moderator surface (builder-style, used by tests and setup)
    pub fn with_moderator_surface(
        mut self,
        community: impl Into<CommunityId>,
        surface: impl Into<SurfaceId>,
    ) -> Self {
        self.moderator_surfaces.insert(community.into(), surface.into());
        self
    }

    /// Reporter prompt expiry as a chrono duration
    pub fn reporter_prompt_timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.reporter_prompt_timeout_secs as i64)
    }

    /// Moderator prompt expiry as a chrono duration, if configured
    pub fn moderator_prompt_timeout(&self) -> Option<chrono::Duration> {
        self.moderator_prompt_timeout_secs
            .map(|s| chrono::Duration::seconds(s as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = ModerationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.note_max_len, 1024);
        assert!(config.moderator_prompt_timeout().is_none());
    }

    #[test]
    fn test_from_toml_str() {
        let raw = r#"
            oversight_surface = "trust-and-safety"
            note_max_len = 2000
            reporter_prompt_timeout_secs = 600
            moderator_prompt_timeout_secs = 3600
            auto_confidence_threshold = 0.9

            [moderator_surfaces]
            "guild-1" = "guild-1-mod"
            "guild-2" = "guild-2-mod"
        "#;

        let config = ModerationConfig::from_toml_str(raw).unwrap();
        assert_eq!(config.moderator_surface("guild-1").unwrap(), "guild-1-mod");
        assert_eq!(config.oversight_surface.as_deref(), Some("trust-and-safety"));
        assert_eq!(config.moderator_prompt_timeout_secs, Some(3600));
        assert_eq!(config.note_max_len, 2000);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ModerationConfig::from_toml_str("note_max_len = 512").unwrap();
        assert_eq!(config.note_max_len, 512);
        assert_eq!(config.reporter_prompt_timeout_secs, 300);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let err = ModerationConfig::from_toml_str("auto_confidence_threshold = 1.5").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("moderation.toml");
        std::fs::write(
            &path,
            "[moderator_surfaces]\n\"guild-9\" = \"guild-9-mod\"\n",
        )
        .unwrap();

        let config = ModerationConfig::load(&path).unwrap();
        assert_eq!(config.moderator_surface("guild-9").unwrap(), "guild-9-mod");
        assert!(config.moderator_surface("guild-0").is_none());
    }
}
