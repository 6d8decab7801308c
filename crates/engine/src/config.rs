use std::time::Duration;

use x121_layout_client::config::{env_flag, env_parse, ConfigError};
use x121_layout_core::grid::DEFAULT_GRID_SIZE;
use x121_layout_core::resize::ResizeLimits;

use crate::persistence::AutosaveConfig;

/// Workspace engine settings loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Whether dirty, saved layouts are persisted automatically.
    pub autosave: bool,
    /// Quiet period after the last edit before autosave fires.
    pub autosave_debounce_ms: u64,
    /// Grid pitch for resize snapping, in pixels.
    pub grid_size: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            autosave: true,
            autosave_debounce_ms: 2000,
            grid_size: DEFAULT_GRID_SIZE,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default |
    /// |-------------------------------|---------|
    /// | `LAYOUT_AUTOSAVE`             | `true`  |
    /// | `LAYOUT_AUTOSAVE_DEBOUNCE_MS` | `2000`  |
    /// | `LAYOUT_GRID_SIZE`            | `20`    |
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let autosave = env_flag("LAYOUT_AUTOSAVE", defaults.autosave)?;
        let autosave_debounce_ms = env_parse(
            "LAYOUT_AUTOSAVE_DEBOUNCE_MS",
            defaults.autosave_debounce_ms,
            "a valid u64",
        )?;
        let grid_size: f64 = env_parse("LAYOUT_GRID_SIZE", defaults.grid_size, "a number")?;
        if !(grid_size.is_finite() && grid_size > 0.0) {
            return Err(ConfigError::Invalid {
                var: "LAYOUT_GRID_SIZE",
                expected: "a positive number",
                value: grid_size.to_string(),
            });
        }

        Ok(Self {
            autosave,
            autosave_debounce_ms,
            grid_size,
        })
    }

    pub fn autosave_config(&self) -> AutosaveConfig {
        AutosaveConfig {
            enabled: self.autosave,
            debounce: Duration::from_millis(self.autosave_debounce_ms),
            ..Default::default()
        }
    }

    pub fn resize_limits(&self) -> ResizeLimits {
        ResizeLimits::with_grid(self.grid_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_values() {
        let config = EngineConfig::default();
        assert!(config.autosave);
        assert_eq!(config.autosave_config().debounce, Duration::from_millis(2000));
        assert_eq!(config.resize_limits().grid_size, 20.0);
    }
}
