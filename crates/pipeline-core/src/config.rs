use crate::committer::MAX_COMMIT_CONCURRENCY;
use crate::error::Result;
use crate::types::Role;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Create calls allowed in flight during a commit.
    #[serde(default = "default_commit_concurrency")]
    pub commit_concurrency: usize,
    /// Roles whose users may be chosen as the responsible party.
    #[serde(default = "default_assignable_roles")]
    pub assignable_roles: Vec<Role>,
    /// Due-in-days for action types that carry no default of their own.
    #[serde(default = "default_fallback_due_days")]
    pub fallback_due_days: u32,
}

fn default_commit_concurrency() -> usize {
    4
}

fn default_assignable_roles() -> Vec<Role> {
    vec![Role::Lawyer, Role::Agent]
}

fn default_fallback_due_days() -> u32 {
    1
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            commit_concurrency: default_commit_concurrency(),
            assignable_roles: default_assignable_roles(),
            fallback_due_days: default_fallback_due_days(),
        }
    }
}

impl EngineConfig {
    /// Read YAML config from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no engine config, using defaults");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        let cfg: EngineConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(data)?)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.commit_concurrency == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "commit_concurrency is 0; commits will run one at a time".to_string(),
            });
        } else if self.commit_concurrency > MAX_COMMIT_CONCURRENCY {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "commit_concurrency {} exceeds the cap of {}; it will be clamped",
                    self.commit_concurrency, MAX_COMMIT_CONCURRENCY
                ),
            });
        }

        if self.assignable_roles.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "assignable_roles is empty; no draft can be given a responsible"
                    .to_string(),
            });
        }

        let mut seen = Vec::new();
        for role in &self.assignable_roles {
            if seen.contains(role) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("role '{role}' listed twice in assignable_roles"),
                });
            }
            seen.push(*role);
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
