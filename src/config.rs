use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::foundation::error::{SlideError, SlideResult};

/// Options for the render scheduler and its owned caches/pools.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SchedulerOpts {
    /// Maximum number of snapshots retained by the render cache.
    pub cache_capacity: usize,
    /// Worker threads in the bounded rasterization pool.
    pub max_concurrent_renders: usize,
    /// Duration of one cross-fade between snapshots.
    pub cross_fade_ms: u64,
}

impl Default for SchedulerOpts {
    fn default() -> Self {
        Self {
            cache_capacity: 500,
            max_concurrent_renders: 6,
            cross_fade_ms: 300,
        }
    }
}

impl SchedulerOpts {
    pub fn cross_fade(&self) -> Duration {
        Duration::from_millis(self.cross_fade_ms)
    }

    pub fn validate(&self) -> SlideResult<()> {
        if self.cache_capacity == 0 {
            return Err(SlideError::validation("scheduler 'cache_capacity' must be >= 1"));
        }
        if self.max_concurrent_renders == 0 {
            return Err(SlideError::validation(
                "scheduler 'max_concurrent_renders' must be >= 1",
            ));
        }
        Ok(())
    }
}

/// Options for the default resource backend.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ResourceOpts {
    /// Maximum number of decoded images kept in memory.
    pub memory_capacity: usize,
    /// Directory for the persistent image cache. `None` disables the disk layer.
    pub disk_dir: Option<PathBuf>,
    /// Per-request timeout for network fetches.
    pub request_timeout_ms: u64,
    pub user_agent: String,
}

impl Default for ResourceOpts {
    fn default() -> Self {
        Self {
            memory_capacity: 256,
            disk_dir: None,
            request_timeout_ms: 15_000,
            user_agent: concat!("slide/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ResourceOpts {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> SlideResult<()> {
        if self.memory_capacity == 0 {
            return Err(SlideError::validation("resources 'memory_capacity' must be >= 1"));
        }
        if self.request_timeout_ms == 0 {
            return Err(SlideError::validation(
                "resources 'request_timeout_ms' must be >= 1",
            ));
        }
        Ok(())
    }
}

/// Top-level configuration document.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SlideConfig {
    pub scheduler: SchedulerOpts,
    pub resources: ResourceOpts,
}

impl SlideConfig {
    /// Parse and validate a JSON configuration. Missing fields take their defaults.
    pub fn from_json_str(s: &str) -> SlideResult<Self> {
        let cfg: SlideConfig =
            serde_json::from_str(s).map_err(|e| SlideError::serde(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> SlideResult<Self> {
        let s = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&s)
    }

    pub fn validate(&self) -> SlideResult<()> {
        self.scheduler.validate()?;
        self.resources.validate()
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
