use crate::calendar::WeekStart;
use crate::error::{AllocationError, PersistenceResult};
use crate::task::TaskStatus;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Weekly capacity applied to resources that do not declare one.
pub const DEFAULT_WEEKLY_CAPACITY_HOURS: f64 = 40.0;

/// Lower bounds of the moderate, high, and overallocated bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UtilizationThresholds {
    pub moderate: f64,
    pub high: f64,
    pub overallocated: f64,
}

impl Default for UtilizationThresholds {
    fn default() -> Self {
        Self {
            moderate: 0.50,
            high: 0.75,
            overallocated: 0.90,
        }
    }
}

impl UtilizationThresholds {
    pub fn validate(&self) -> Result<(), AllocationError> {
        let values = [self.moderate, self.high, self.overallocated];
        if values.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(AllocationError::invalid(
                "utilization thresholds must be finite and positive",
            ));
        }
        if !(self.moderate < self.high && self.high < self.overallocated) {
            return Err(AllocationError::invalid(format!(
                "utilization thresholds must ascend (got moderate={}, high={}, overallocated={})",
                self.moderate, self.high, self.overallocated
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub default_weekly_capacity_hours: f64,
    pub week_start: WeekStart,
    pub thresholds: UtilizationThresholds,
    /// Statuses whose tasks are left out of every computation.
    pub terminal_statuses: Vec<TaskStatus>,
    /// Fan per-resource aggregation out over the rayon pool.
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_weekly_capacity_hours: DEFAULT_WEEKLY_CAPACITY_HOURS,
            week_start: WeekStart::default(),
            thresholds: UtilizationThresholds::default(),
            terminal_statuses: vec![TaskStatus::Cancelled, TaskStatus::Terminated],
            parallel: false,
        }
    }
}

impl EngineConfig {
    pub fn load_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Self> {
        let file = File::open(path)?;
        let config: EngineConfig = serde_json::from_reader(file)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AllocationError> {
        let capacity = self.default_weekly_capacity_hours;
        if !capacity.is_finite() || capacity <= 0.0 {
            return Err(AllocationError::invalid(format!(
                "default_weekly_capacity_hours must be positive (got {capacity})"
            )));
        }
        self.thresholds.validate()
    }

    pub fn is_terminal(&self, status: TaskStatus) -> bool {
        self.terminal_statuses.contains(&status)
    }
}
