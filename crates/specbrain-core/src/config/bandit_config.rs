//! Bandit scheduler configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Ranking mode of the bandit scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BanditMode {
    Explore,
    #[default]
    Balanced,
    Exploit,
}

impl BanditMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Explore => "explore",
            Self::Balanced => "balanced",
            Self::Exploit => "exploit",
        }
    }

    /// UCB exploration coefficient.
    pub fn exploration_base(&self) -> f64 {
        match self {
            Self::Explore => 0.70,
            Self::Balanced => 0.45,
            Self::Exploit => 0.25,
        }
    }

    /// Blend weights as (thompson, ucb, info_need).
    pub fn weights(&self) -> (f64, f64, f64) {
        match self {
            Self::Explore => (0.30, 0.25, 0.45),
            Self::Balanced => (0.45, 0.30, 0.25),
            Self::Exploit => (0.60, 0.35, 0.05),
        }
    }
}

impl fmt::Display for BanditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BanditMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "explore" => Ok(Self::Explore),
            "balanced" => Ok(Self::Balanced),
            "exploit" => Ok(Self::Exploit),
            other => Err(format!("unknown bandit mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BanditConfig {
    /// Default ranking mode. Default: balanced.
    pub mode: Option<BanditMode>,
    /// Seed string for reproducible sampling. Default: "specbrain".
    pub seed: Option<String>,
}

impl BanditConfig {
    pub fn effective_mode(&self) -> BanditMode {
        self.mode.unwrap_or_default()
    }

    pub fn effective_seed(&self) -> &str {
        self.seed.as_deref().unwrap_or("specbrain")
    }
}
