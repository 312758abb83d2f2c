//! Configuration, persisted as TOML.
//!
//! Every key is optional; a missing section or key takes its default, so an
//! empty file is a valid configuration. Unknown keys are rejected so typos
//! do not silently fall back to defaults.
//!
//! ```toml
//! [vsa]
//! dimension = 10000
//! seed = 0
//!
//! [contradiction]
//! consistency_threshold = 0.8
//! contradiction_threshold = 0.8
//!
//! [agent]
//! horizon = 3
//! terminal_observations = [2]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::agent::AgentConfig;
use crate::error::{AuslexResult, ConfigError};
use crate::ontology::Ontology;
use crate::reason::{AnalogyConfig, ContradictionConfig, ValidatorConfig};
use crate::vsa::Dimension;

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Hypervector space settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VsaConfig {
    /// Hypervector dimension.
    pub dimension: usize,
    /// Seed every symbol vector is derived from.
    pub seed: u64,
}

impl Default for VsaConfig {
    fn default() -> Self {
        Self {
            dimension: Dimension::DEFAULT.0,
            seed: 0,
        }
    }
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuslexConfig {
    pub vsa: VsaConfig,
    pub contradiction: ContradictionConfig,
    pub analogy: AnalogyConfig,
    pub validator: ValidatorConfig,
    pub agent: AgentConfig,
}

impl AuslexConfig {
    /// Parse and validate TOML. `origin` names the source in errors.
    pub fn parse(content: &str, origin: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let config = Self::parse(&content, &path.display().to_string())?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Save to a TOML file, creating parent directories.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Check value ranges.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.vsa.dimension == 0 {
            return invalid("vsa.dimension must be greater than zero");
        }
        for (key, value) in [
            ("contradiction.consistency_threshold", self.contradiction.consistency_threshold),
            ("contradiction.contradiction_threshold", self.contradiction.contradiction_threshold),
            ("analogy.min_similarity", self.analogy.min_similarity),
        ] {
            if !(-1.0..=1.0).contains(&value) {
                return invalid(format!("{key} must lie in [-1, 1], got {value}"));
            }
        }
        if self.analogy.top_k == 0 {
            return invalid("analogy.top_k must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.validator.min_support_ratio) {
            return invalid(format!(
                "validator.min_support_ratio must lie in [0, 1], got {}",
                self.validator.min_support_ratio
            ));
        }
        if self.agent.horizon == 0 {
            return invalid("agent.horizon must be at least 1");
        }
        if self.agent.max_steps == 0 {
            return invalid("agent.max_steps must be at least 1");
        }
        if !self.agent.policy_precision.is_finite() || self.agent.policy_precision < 0.0 {
            return invalid(format!(
                "agent.policy_precision must be finite and non-negative, got {}",
                self.agent.policy_precision
            ));
        }
        Ok(())
    }

    pub fn dimension(&self) -> Dimension {
        Dimension(self.vsa.dimension)
    }

    /// Build an ontology seeded with the legal vocabulary.
    pub fn ontology(&self) -> AuslexResult<Ontology> {
        Ok(Ontology::legal(self.dimension(), self.vsa.seed)?)
    }
}

fn invalid<T>(message: impl Into<String>) -> ConfigResult<T> {
    Err(ConfigError::Invalid {
        message: message.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AuslexConfig::parse("", "<test>").unwrap();
        assert_eq!(config, AuslexConfig::default());
        assert_eq!(config.dimension(), Dimension::DEFAULT);
        assert_eq!(config.contradiction.consistency_threshold, 0.8);
        assert_eq!(config.analogy.top_k, 5);
        assert_eq!(config.validator.min_support_ratio, 1.0);
        assert_eq!(config.agent.horizon, 2);
        assert_eq!(config.agent.max_policies, 4096);
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let config = AuslexConfig::parse(
            "[vsa]\nseed = 9\n\n[agent]\nhorizon = 3\nterminal_observations = [2]\n",
            "<test>",
        )
        .unwrap();
        assert_eq!(config.vsa.seed, 9);
        assert_eq!(config.vsa.dimension, 10_000);
        assert_eq!(config.agent.horizon, 3);
        assert_eq!(config.agent.terminal_observations, vec![2]);
        assert_eq!(config.agent.max_steps, 16);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for toml in [
            "[vsa]\ndimension = 0\n",
            "[contradiction]\nconsistency_threshold = 1.5\n",
            "[agent]\nhorizon = 0\n",
            "[validator]\nmin_support_ratio = 2.0\n",
        ] {
            assert!(
                matches!(AuslexConfig::parse(toml, "<test>"), Err(ConfigError::Invalid { .. })),
                "{toml}"
            );
        }
    }

    #[test]
    fn unknown_keys_are_parse_errors() {
        assert!(matches!(
            AuslexConfig::parse("[vsa]\ndimensions = 10\n", "<test>"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("auslex.toml");
        let mut config = AuslexConfig::default();
        config.vsa.seed = 42;
        config.agent.terminal_observations = vec![1, 3];
        config.save(&path).unwrap();

        let loaded = AuslexConfig::load(&path).unwrap();
        assert_eq!(loaded.vsa, config.vsa);
        assert_eq!(loaded.agent, config.agent);
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            AuslexConfig::load(&dir.path().join("absent.toml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
