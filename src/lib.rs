pub mod allocation;
pub mod calculations;
pub mod calendar;
pub mod config;
pub mod error;
pub mod filter;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod logging;
pub mod persistence;
pub mod resource;
pub mod snapshot;
pub mod task;
pub mod task_validation;

pub use allocation::{
    AllocationOptions, AllocationResult, AllocationSummary, Horizon, MAX_WINDOW_COUNT,
    WindowGranularity, compute_allocations,
};
pub use calculations::distribution::{Assignee, DailyAllocation};
pub use calculations::grouping::{CapacityMode, GroupBy, GroupKey};
pub use calculations::utilization::{
    AllocationBucket, RankBy, UtilizationBand, count_overallocated, is_overallocated, rank, top_k,
    utilization,
};
pub use calendar::{TimeWindow, TimeWindowSeries, WeekStart};
pub use config::{DEFAULT_WEEKLY_CAPACITY_HOURS, EngineConfig, UtilizationThresholds};
pub use error::{AllocationError, PersistenceError, PersistenceResult};
pub use filter::{MediaTypeFilter, ResourceFilter};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteSnapshotStore;
pub use persistence::{
    SnapshotStore, export_result_to_csv, export_result_to_json, load_snapshot_from_csv,
    load_snapshot_from_json, save_snapshot_to_json, validate_snapshot,
};
pub use resource::{MediaType, Resource, ResourceType, Team};
pub use snapshot::Snapshot;
pub use task::{Task, TaskStatus};
pub use task_validation::{DataQualityWarning, WarningKind};
