//! Configuration for tree induction and clustering runs.
//!
//! Historical variants of the algorithms that disagreed on how to treat
//! unknown values or how to seed clusters are exposed here as explicit
//! options instead of being hardcoded.

use serde::{Deserialize, Serialize};

use crate::entropy::LogBase;
use crate::error::{Error, Result};

/// Token that marks a missing categorical value.
pub const DEFAULT_UNKNOWN_MARKER: &str = "?";

/// Class given to a leaf when no row with a known target reaches it.
pub const DEFAULT_UNKNOWN_CLASS: &str = "Unknown";

/// What the builder does with rows whose splitting attribute is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum UnknownValuePolicy {
    /// Do not route them; prediction falls back at query time.
    #[default]
    Drop,
    /// Add a branch keyed by the marker, predicting the node's majority class.
    ExplicitBranch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Id3Config {
    pub unknown_marker: String,
    pub unknown_class: String,
    pub unknown_policy: UnknownValuePolicy,
    pub log_base: LogBase,
    /// Smoothing added inside the logarithm. Zero disables it.
    pub epsilon: f64,
}

impl Default for Id3Config {
    fn default() -> Self {
        Self {
            unknown_marker: DEFAULT_UNKNOWN_MARKER.to_string(),
            unknown_class: DEFAULT_UNKNOWN_CLASS.to_string(),
            unknown_policy: UnknownValuePolicy::Drop,
            log_base: LogBase::Fixed(2.0),
            epsilon: 1e-9,
        }
    }
}

impl Id3Config {
    pub fn unknown_marker(mut self, marker: impl Into<String>) -> Self {
        self.unknown_marker = marker.into();
        self
    }

    pub fn unknown_class(mut self, class: impl Into<String>) -> Self {
        self.unknown_class = class.into();
        self
    }

    pub fn unknown_policy(mut self, policy: UnknownValuePolicy) -> Self {
        self.unknown_policy = policy;
        self
    }

    pub fn log_base(mut self, base: LogBase) -> Self {
        self.log_base = base;
        self
    }

    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.unknown_marker.is_empty() {
            return Err(Error::InvalidConfig(
                "unknown marker must not be empty".to_string(),
            ));
        }
        if !(self.epsilon >= 0.0 && self.epsilon < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "epsilon must be in [0, 1), got {}",
                self.epsilon
            )));
        }
        if let LogBase::Fixed(k) = self.log_base {
            if !(k >= 2.0) {
                return Err(Error::InvalidConfig(format!(
                    "logarithm base must be at least 2, got {}",
                    k
                )));
            }
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

/// How the first centroids / modes are chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InitPolicy {
    /// `k` distinct complete rows drawn without replacement.
    Random { k: usize, seed: u64 },
    /// One cluster per distinct value of the class column.
    ClassSeeded { class_column: String },
}

impl Default for InitPolicy {
    fn default() -> Self {
        InitPolicy::Random { k: 2, seed: 1 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub max_iterations: usize,
    pub init: InitPolicy,
    /// Categorical cells equal to this token count as missing.
    pub unknown_marker: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            init: InitPolicy::default(),
            unknown_marker: DEFAULT_UNKNOWN_MARKER.to_string(),
        }
    }
}

impl ClusterConfig {
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn init(mut self, init: InitPolicy) -> Self {
        self.init = init;
        self
    }

    pub fn random(self, k: usize, seed: u64) -> Self {
        self.init(InitPolicy::Random { k, seed })
    }

    pub fn class_seeded(self, class_column: impl Into<String>) -> Self {
        self.init(InitPolicy::ClassSeeded {
            class_column: class_column.into(),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(Error::InvalidConfig(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        match &self.init {
            InitPolicy::Random { k: 0, .. } => {
                Err(Error::InvalidConfig("k must be at least 1".to_string()))
            }
            InitPolicy::ClassSeeded { class_column } if class_column.is_empty() => Err(
                Error::InvalidConfig("class column name must not be empty".to_string()),
            ),
            _ => Ok(()),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
