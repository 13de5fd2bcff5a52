use std::path::Path;

use anyhow::Context;
use glide_core::Size;
use glide_ui::CacheConfig;
use glide_ui::list::ListConfig;
use serde::{Deserialize, Serialize};

/// Everything a [`ListHost`](crate::ListHost) needs to start.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub list: ListConfig,
    pub cache: CacheConfig,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Decode threads. Zero decodes on the caller's thread.
    pub image_workers: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            list: ListConfig::default(),
            cache: CacheConfig::default(),
            viewport_width: 320,
            viewport_height: 480,
            image_workers: 2,
        }
    }
}

impl HostConfig {
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(text).context("parsing host config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&text)
    }

    pub fn viewport(&self) -> Size {
        Size::new(self.viewport_width as f32, self.viewport_height as f32)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.viewport_width > 0 && self.viewport_height > 0,
            "viewport must not be empty ({}x{})",
            self.viewport_width,
            self.viewport_height
        );
        anyhow::ensure!(
            self.cache.evict_to_bytes <= self.cache.budget_bytes,
            "cache evict_to_bytes ({}) exceeds budget_bytes ({})",
            self.cache.evict_to_bytes,
            self.cache.budget_bytes
        );
        anyhow::ensure!(
            self.list.tick_interval_ms > 0,
            "list tick_interval_ms must be positive"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_sections_override_defaults() {
        let cfg = HostConfig::from_json(
            r#"{
                "viewport_height": 600,
                "image_workers": 0,
                "list": { "dpi_scale": 2.0 },
                "cache": { "budget_bytes": 2048, "evict_to_bytes": 1024 }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.viewport(), Size::new(320.0, 600.0));
        assert_eq!(cfg.image_workers, 0);
        assert_eq!(cfg.list.drag_lock_distance(), 14.0);
        assert_eq!(cfg.list.snap_duration_ms, 300);
        assert_eq!(cfg.cache.budget_bytes, 2048);
        assert_eq!(cfg.cache.max_surface_bytes, None);
    }

    #[test]
    fn rejects_inconsistent_cache_bounds() {
        let err = HostConfig::from_json(
            r#"{ "cache": { "budget_bytes": 10, "evict_to_bytes": 20 } }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("evict_to_bytes"));
    }

    #[test]
    fn malformed_json_reports_context() {
        let err = HostConfig::from_json("{ nope").unwrap_err();
        assert_eq!(err.to_string(), "parsing host config");
    }
}
