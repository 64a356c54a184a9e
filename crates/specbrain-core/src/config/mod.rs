//! Configuration system for specbrain.
//! TOML-based, layered resolution: env > project > user > defaults.

pub mod availability_config;
pub mod bandit_config;
pub mod brain_config;
pub mod learning_config;
pub mod storage_config;

pub use availability_config::{AvailabilityConfig, AvailabilityOverride, AvailabilityThresholds};
pub use bandit_config::{BanditConfig, BanditMode};
pub use brain_config::BrainConfig;
pub use learning_config::{CapsConfig, DecayConfig, DecayWindow, GateConfig, HypothesisConfig, PromotionConfig};
pub use storage_config::{PersistMode, StorageConfig};
