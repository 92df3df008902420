//! Engine-wide configuration shared by every agent

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Minimum tiles each worker must receive before a criterion is split
/// across the pool
pub const MIN_TILES_PER_THREAD: usize = 2;

/// Evaluations allowed per turn before the turn is force-ended
pub const MAX_ITERATIONS: u32 = 16;

/// Global configuration read by the pipeline, criteria and behaviors.
///
/// Read-only during evaluation; one instance is shared by all agents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Exponent applied to every final tile score
    pub power: f32,

    // Threat discounts for opponents
    pub suppressed_discount: f32,
    pub pinned_discount: f32,
    pub acted_discount: f32,
    /// Safety removed per unit of opponent threat
    pub threat_safety_scale: f32,
    /// Safety granted to tiles no opponent can see, for roles preferring
    /// to stay hidden
    pub hidden_safety_bonus: f32,

    // Attack scoring
    pub threat_value_scale: f32,
    pub damage_score_mult: f32,
    pub damage_base_score: f32,
    pub suppression_score_mult: f32,
    pub suppression_base_score: f32,
    pub stun_score_mult: f32,
    pub stun_base_score: f32,

    // Pipeline guards
    pub min_tiles_per_thread: usize,
    pub max_iterations: u32,
    #[serde(with = "millis")]
    pub poll_interval: Duration,
    #[serde(with = "millis")]
    pub readiness_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            power: 1.2,
            suppressed_discount: 0.6,
            pinned_discount: 0.3,
            acted_discount: 0.8,
            threat_safety_scale: 10.0,
            hidden_safety_bonus: 2.0,
            threat_value_scale: 1.0,
            damage_score_mult: 10.0,
            damage_base_score: 5.0,
            suppression_score_mult: 8.0,
            suppression_base_score: 2.0,
            stun_score_mult: 20.0,
            stun_base_score: 2.0,
            min_tiles_per_thread: MIN_TILES_PER_THREAD,
            max_iterations: MAX_ITERATIONS,
            poll_interval: Duration::from_millis(10),
            readiness_timeout: Duration::from_secs(5),
        }
    }
}

impl EngineConfig {
    /// Set the global power exponent
    pub fn with_power(mut self, power: f32) -> Self {
        self.power = power;
        self
    }

    /// Set the granularity threshold for splitting criteria across workers
    pub fn with_min_tiles_per_thread(mut self, min: usize) -> Self {
        self.min_tiles_per_thread = min;
        self
    }

    /// Set the readiness poll interval and time box
    pub fn with_readiness(mut self, poll_interval: Duration, timeout: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.readiness_timeout = timeout;
        self
    }

    /// Load from JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Sign-preserving power rescale of a final score.
    ///
    /// Monotonic over all reals for any positive exponent.
    pub fn rescale(&self, score: f32) -> f32 {
        if score >= 0.0 {
            score.powf(self.power)
        } else {
            -(-score).powf(self.power)
        }
    }
}

/// Durations stored as whole milliseconds in JSON
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
