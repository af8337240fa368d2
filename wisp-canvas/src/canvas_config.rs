use std::path::Path;

use serde::{Deserialize, Serialize};
use wisp_core::config::{Config, ConfigError, SpawnConfig};

/// Everything the canvas can be tuned with from a JSON file.
///
/// Missing sections fall back to their presets, so `{}` is a valid file.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub wind: Config,
    pub growth: Config,
    pub spawn: SpawnConfig,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            wind: Config::wind(),
            growth: Config::growth(),
            spawn: SpawnConfig::default(),
        }
    }
}

impl CanvasConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: CanvasConfig = serde_json::from_str(s)?;
        cfg.wind.validate()?;
        cfg.growth.validate()?;
        cfg.spawn.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wisp_core::config::HeadPolicy;

    #[test]
    fn empty_object_is_all_presets() {
        let cfg = CanvasConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, CanvasConfig::default());
        assert_eq!(cfg.growth.head_policy, HeadPolicy::spiral());
    }

    #[test]
    fn sections_override_independently() {
        let cfg = CanvasConfig::from_json_str(
            r#"{ "wind": { "lifetime": 12.0 }, "spawn": { "offset": 20.0 } }"#,
        )
        .unwrap();

        assert_eq!(cfg.wind.lifetime, 12.0);
        assert_eq!(cfg.wind.speed, Config::wind().speed);
        assert_eq!(cfg.spawn.offset, 20.0);
        assert_eq!(cfg.growth, Config::growth());
    }

    #[test]
    fn invalid_section_is_rejected() {
        let err = CanvasConfig::from_json_str(r#"{ "spawn": { "interval": 0.0 } }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "interval",
                ..
            }
        ));
    }
}
