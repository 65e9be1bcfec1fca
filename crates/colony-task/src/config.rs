//! Scheduler configuration loading.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Task manager tuning, loaded from `.colony/scheduler.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Run an assignment pass every N ticks. `0` or `1` means every tick.
    pub assign_every_ticks: u32,

    /// Phase offset for the assignment pass, so several managers can be staggered.
    pub assign_offset_ticks: u32,

    /// Upper bound on assignments per pass (`None` = unbounded).
    pub max_assignments_per_pass: Option<usize>,

    /// Failed attempts after which a task is discarded even if it asks to be retried
    /// (`None` = no cap).
    pub max_retries: Option<u32>,

    /// Record deterministic trace events into each creature's blackboard.
    pub trace: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            assign_every_ticks: 1,
            assign_offset_ticks: 0,
            max_assignments_per_pass: None,
            max_retries: Some(default_max_retries()),
            trace: false,
        }
    }
}

fn default_max_retries() -> u32 {
    8
}

impl SchedulerConfig {
    /// Whether tick `tick` runs an assignment pass.
    pub fn should_assign(&self, tick: u64) -> bool {
        let every = u64::from(self.assign_every_ticks.max(1));
        let offset = u64::from(self.assign_offset_ticks) % every;
        tick % every == offset
    }

    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scheduler config from {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse scheduler config from {}", path.display()))?;
        Ok(config)
    }

    /// Load from a colony directory (looks for .colony/scheduler.yaml)
    pub fn load_from_dir(root: &Path) -> Result<Self> {
        let config_path = root.join(".colony/scheduler.yaml");
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_assigns_every_tick() {
        let config = SchedulerConfig::default();
        assert!((0..5).all(|t| config.should_assign(t)));
    }

    #[test]
    fn decimated_assignment_respects_offset() {
        let config = SchedulerConfig {
            assign_every_ticks: 3,
            assign_offset_ticks: 1,
            ..Default::default()
        };
        let ticks: Vec<u64> = (0..9).filter(|t| config.should_assign(*t)).collect();
        assert_eq!(ticks, vec![1, 4, 7]);
    }
}
