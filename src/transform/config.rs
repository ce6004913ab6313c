use super::bounds::MountTimeoutPolicy;
use crate::consts::{MIN_SIZE, MOUNT_RETRY_BUDGET};
use serde::Deserialize;

/// Tunables for the transform engine. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Frame retries while selected nodes mount
    pub mount_retry_budget: u32,
    /// Smallest proxy width/height a resize can produce, stage units
    pub min_size: f64,
    pub on_mount_timeout: MountTimeoutPolicy,
    /// Rotation step in degrees applied while Shift is held
    pub rotate_snap: Option<f64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mount_retry_budget: MOUNT_RETRY_BUDGET,
            min_size: MIN_SIZE,
            on_mount_timeout: MountTimeoutPolicy::default(),
            rotate_snap: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_rotate_snap(mut self, step: f64) -> Self {
        self.rotate_snap = Some(step);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.mount_retry_budget, 4);
        assert_eq!(config.min_size, 1.0);
        assert_eq!(config.on_mount_timeout, MountTimeoutPolicy::Clear);
        assert_eq!(config.rotate_snap, None);
    }

    #[test]
    fn test_partial_json() {
        let config = EngineConfig::from_json(r#"{"rotate_snap": 15.0, "on_mount_timeout": "keep_previous"}"#).unwrap();
        assert_eq!(config.rotate_snap, Some(15.0));
        assert_eq!(config.on_mount_timeout, MountTimeoutPolicy::KeepPrevious);
        assert_eq!(config.mount_retry_budget, 4);
    }

    #[test]
    fn test_bad_json() {
        assert!(EngineConfig::from_json(r#"{"min_size": "big"}"#).is_err());
    }
}
