//! Engine configuration.
//!
//! Settings are loaded in layers: built-in defaults, then an optional TOML
//! file, then environment variables prefixed with `CONTEST_` (e.g.
//! `CONTEST_VOTING__PRIOR_WEIGHT=3`). Everything here is tunable without
//! code changes.
//!
//! ## Example Configuration
//!
//! ```toml
//! [voting]
//! prior_weight = 2.0
//! vote_threshold = 2
//!
//! [ranking]
//! mode = "percentage"
//!
//! [limits]
//! max_page_size = 100
//! default_page_size = 20
//! ```

use anyhow::{Context, Result};
use contest_domain::vote::{DEFAULT_PRIOR_WEIGHT, DEFAULT_VOTE_THRESHOLD};
use serde::{Deserialize, Serialize};

/// Main engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Vote-ranking settings
    #[serde(default)]
    pub voting: VotingConfig,
    /// Participant-ranking settings
    #[serde(default)]
    pub ranking: RankingConfig,
    /// Listing limits
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Settings for the Bayesian vote-ranking engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingConfig {
    /// Prior weight `m`: pull toward the challenge-wide average
    #[serde(default = "default_prior_weight")]
    pub prior_weight: f64,

    /// Minimum votes before a submission appears on the leaderboard
    #[serde(default = "default_vote_threshold")]
    pub vote_threshold: u64,
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            prior_weight: default_prior_weight(),
            vote_threshold: default_vote_threshold(),
        }
    }
}

/// How participant overall scores are reduced across challenges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMode {
    /// Cumulative points: sum of per-challenge final scores
    Sum,
    /// Average of per-challenge final scores as a percentage of 100
    Percentage,
}

/// Participant-ranking settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Reduction applied across challenges
    #[serde(default = "default_ranking_mode")]
    pub mode: RankingMode,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            mode: default_ranking_mode(),
        }
    }
}

/// Listing limits for leaderboard and ranking queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum page size for list operations
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    /// Default page size for list operations
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_page_size: default_max_page_size(),
            default_page_size: default_page_size(),
        }
    }
}

fn default_prior_weight() -> f64 {
    DEFAULT_PRIOR_WEIGHT
}

fn default_vote_threshold() -> u64 {
    DEFAULT_VOTE_THRESHOLD
}

fn default_ranking_mode() -> RankingMode {
    RankingMode::Sum
}

fn default_max_page_size() -> u32 {
    100
}

fn default_page_size() -> u32 {
    20
}

impl EngineConfig {
    /// Load configuration from defaults, an optional file, and environment.
    ///
    /// `file` points at a TOML file; when None, only defaults and the
    /// environment apply.
    pub fn load(file: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = file {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("CONTEST")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder.build().context("Failed to build configuration")?;
        let cfg: EngineConfig = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        Ok(cfg)
    }
}
