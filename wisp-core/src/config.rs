use std::{fmt, path::Path};

use serde::{Deserialize, Serialize};

/// How the head node of every slot steers, selected per simulation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HeadPolicy {
    /// The heading decays by the age of the node behind the head, so older
    /// wisps curl tighter: `turn' = turn - aux_behind / age_divisor`.
    Decay { age_divisor: f32 },
    /// The heading follows `spiral_turn(turn)`, with `turn` drifting by
    /// `turn_rate` plus up to `turn_jitter` of noise every tick.
    Spiral { turn_rate: f32, turn_jitter: f32 },
}

impl HeadPolicy {
    pub const DECAY_AGE_DIVISOR: f32 = 50.0;
    pub const SPIRAL_TURN_RATE: f32 = 0.01;
    pub const SPIRAL_TURN_JITTER: f32 = 0.004;

    pub fn decay() -> Self {
        HeadPolicy::Decay {
            age_divisor: Self::DECAY_AGE_DIVISOR,
        }
    }

    pub fn spiral() -> Self {
        HeadPolicy::Spiral {
            turn_rate: Self::SPIRAL_TURN_RATE,
            turn_jitter: Self::SPIRAL_TURN_JITTER,
        }
    }

    /// Whether the stepper needs a random draw per slot for this policy.
    pub fn uses_jitter(&self) -> bool {
        matches!(self, HeadPolicy::Spiral { turn_jitter, .. } if *turn_jitter > 0.0)
    }
}

/// Tuning for one slot simulation.
///
/// The default is the wind preset. `catch_up` above `1.0` makes followers
/// overshoot the node ahead of them, which stretches the chain into a whip.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub capacity: usize,
    pub path_len: usize,
    pub lifetime: f32,
    pub speed: f32,
    pub catch_up: f32,
    pub min_extent: f32,
    pub head_policy: HeadPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self::wind()
    }
}

impl Config {
    pub const PATH_LEN: usize = 8;
    pub const CAPACITY: usize = 4096;

    /// Fast wisps that curl as they age and die after 30 ticks.
    pub fn wind() -> Self {
        Self {
            capacity: Self::CAPACITY,
            path_len: Self::PATH_LEN,
            lifetime: 30.0,
            speed: 20.0,
            catch_up: 1.2,
            min_extent: 3.0,
            head_policy: HeadPolicy::decay(),
        }
    }

    /// Slow filaments that wind themselves into a spiral and die once the
    /// spiral has collapsed onto a point.
    pub fn growth() -> Self {
        Self {
            capacity: Self::CAPACITY,
            path_len: Self::PATH_LEN,
            lifetime: 400.0,
            speed: 2.0,
            catch_up: 0.1,
            min_extent: 3.0,
            head_policy: HeadPolicy::spiral(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path_len < 2 {
            return Err(ConfigError::invalid("path_len", "must be at least 2"));
        }
        if self.capacity == 0 {
            return Err(ConfigError::invalid("capacity", "must be non-zero"));
        }
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(ConfigError::invalid("speed", "must be finite and positive"));
        }
        if !(self.catch_up > 0.0 && self.catch_up <= 2.0) {
            return Err(ConfigError::invalid("catch_up", "must be in (0, 2]"));
        }
        if !self.min_extent.is_finite() || self.min_extent < 0.0 {
            return Err(ConfigError::invalid(
                "min_extent",
                "must be finite and non-negative",
            ));
        }
        if !self.lifetime.is_finite() || self.lifetime <= 0.0 {
            return Err(ConfigError::invalid(
                "lifetime",
                "must be finite and positive",
            ));
        }
        match self.head_policy {
            HeadPolicy::Decay { age_divisor } => {
                if !age_divisor.is_finite() || age_divisor == 0.0 {
                    return Err(ConfigError::invalid(
                        "head_policy.age_divisor",
                        "must be finite and non-zero",
                    ));
                }
            }
            HeadPolicy::Spiral {
                turn_rate,
                turn_jitter,
            } => {
                if !turn_rate.is_finite() {
                    return Err(ConfigError::invalid(
                        "head_policy.turn_rate",
                        "must be finite",
                    ));
                }
                if !turn_jitter.is_finite() || turn_jitter < 0.0 {
                    return Err(ConfigError::invalid(
                        "head_policy.turn_jitter",
                        "must be finite and non-negative",
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Config = serde_json::from_str(s)?;
        cfg.validate().inspect_err(|e| log::warn!("rejected config: {e}"))?;
        Ok(cfg)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

/// Placement and timing of newly spawned paths.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Lateral distance between the source stroke and a new path.
    pub offset: f32,
    /// Distance between consecutive nodes of a new path.
    pub spacing: f32,
    /// Seconds between spawns of an [`crate::spawner::Emitter`].
    pub interval: f32,
    /// Seconds an [`crate::spawner::Emitter`] keeps spawning.
    pub duration: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            offset: 50.0,
            spacing: 15.0,
            interval: 0.2,
            duration: 5.0,
        }
    }
}

impl SpawnConfig {
    /// Shortest accepted emitter interval, in seconds.
    pub const MIN_INTERVAL: f32 = 1e-3;

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.offset.is_finite() {
            return Err(ConfigError::invalid("offset", "must be finite"));
        }
        if !self.spacing.is_finite() || self.spacing <= 0.0 {
            return Err(ConfigError::invalid("spacing", "must be finite and positive"));
        }
        if !self.interval.is_finite() || self.interval < Self::MIN_INTERVAL {
            return Err(ConfigError::invalid(
                "interval",
                format!("must be finite and at least {}", Self::MIN_INTERVAL),
            ));
        }
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(ConfigError::invalid(
                "duration",
                "must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

/// Failure to load or validate a configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "could not read config: {e}"),
            ConfigError::Parse(e) => write!(f, "could not parse config: {e}"),
            ConfigError::Invalid { field, reason } => write!(f, "invalid `{field}`: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid { .. } => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        assert!(Config::wind().validate().is_ok());
        assert!(Config::growth().validate().is_ok());
        assert!(SpawnConfig::default().validate().is_ok());
        assert_eq!(Config::default(), Config::wind());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg = Config::from_json_str(r#"{ "capacity": 16, "speed": 4.0 }"#).unwrap();

        assert_eq!(cfg.capacity, 16);
        assert_eq!(cfg.speed, 4.0);
        assert_eq!(cfg.path_len, Config::PATH_LEN);
        assert_eq!(cfg.head_policy, HeadPolicy::decay());
    }

    #[test]
    fn head_policy_is_tagged_by_kind() {
        let cfg = Config::from_json_str(
            r#"{ "head_policy": { "kind": "spiral", "turn_rate": 0.02, "turn_jitter": 0.0 } }"#,
        )
        .unwrap();

        assert_eq!(
            cfg.head_policy,
            HeadPolicy::Spiral {
                turn_rate: 0.02,
                turn_jitter: 0.0
            }
        );
        assert!(!cfg.head_policy.uses_jitter());
        assert!(HeadPolicy::spiral().uses_jitter());
        assert!(!HeadPolicy::decay().uses_jitter());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let err = Config::from_json_str(r#"{ "path_len": 1 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "path_len",
                ..
            }
        ));

        let mut cfg = Config::wind();
        cfg.catch_up = 2.5;
        assert!(cfg.validate().is_err());

        cfg = Config::wind();
        cfg.head_policy = HeadPolicy::Decay { age_divisor: 0.0 };
        assert!(cfg.validate().is_err());

        let mut spawn = SpawnConfig::default();
        spawn.spacing = 0.0;
        assert!(spawn.validate().is_err());
    }

    #[test]
    fn spawn_interval_has_a_floor() {
        let mut spawn = SpawnConfig::default();
        spawn.interval = 1e-9;
        assert!(matches!(
            spawn.validate(),
            Err(ConfigError::Invalid {
                field: "interval",
                ..
            })
        ));

        spawn.interval = SpawnConfig::MIN_INTERVAL;
        assert!(spawn.validate().is_ok());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = Config::from_json_str("{ capacity: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("could not parse config"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Config::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
