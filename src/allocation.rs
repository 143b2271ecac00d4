use crate::calculations::distribution::{DailyAllocation, distribute_within};
use crate::calculations::grouping::{CapacityMode, GroupBy, GroupingContext, group_allocations};
use crate::calculations::utilization::{
    AllocationBucket, RankBy, UtilizationBand, band_counts, classify_all, count_overallocated,
    rank, top_k,
};
use crate::calculations::windows::aggregate;
use crate::calendar::{TimeWindowSeries, WeekStart};
use crate::config::EngineConfig;
use crate::error::AllocationError;
use crate::filter::ResourceFilter;
use crate::snapshot::Snapshot;
use crate::task_validation::{DataQualityWarning, ValidTask, screen_tasks};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum WindowGranularity {
    Day,
    #[default]
    Week,
    Month,
    Custom { start: NaiveDate, end: NaiveDate },
}

impl FromStr for WindowGranularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "daily" => Ok(WindowGranularity::Day),
            "week" | "weekly" => Ok(WindowGranularity::Week),
            "month" | "monthly" => Ok(WindowGranularity::Month),
            other => Err(format!(
                "unknown window granularity '{other}' (custom windows need explicit dates)"
            )),
        }
    }
}

/// Upper bound on `Horizon::window_count`.
pub const MAX_WINDOW_COUNT: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horizon {
    pub reference_date: NaiveDate,
    /// Number of windows; ignored for custom granularity. Negative values are rejected.
    pub window_count: i64,
    #[serde(default)]
    pub granularity: WindowGranularity,
}

impl Horizon {
    pub fn weeks(reference_date: NaiveDate, window_count: i64) -> Self {
        Self {
            reference_date,
            window_count,
            granularity: WindowGranularity::Week,
        }
    }

    pub fn months(reference_date: NaiveDate, window_count: i64) -> Self {
        Self {
            reference_date,
            window_count,
            granularity: WindowGranularity::Month,
        }
    }

    pub fn days(reference_date: NaiveDate, window_count: i64) -> Self {
        Self {
            reference_date,
            window_count,
            granularity: WindowGranularity::Day,
        }
    }

    pub fn custom(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            reference_date: start,
            window_count: 1,
            granularity: WindowGranularity::Custom { start, end },
        }
    }

    pub fn validate(&self) -> Result<(), AllocationError> {
        if self.window_count < 0 {
            return Err(AllocationError::invalid(format!(
                "window_count must not be negative (got {})",
                self.window_count
            )));
        }
        if self.window_count > MAX_WINDOW_COUNT {
            return Err(AllocationError::invalid(format!(
                "window_count must not exceed {MAX_WINDOW_COUNT} (got {})",
                self.window_count
            )));
        }
        if let WindowGranularity::Custom { start, end } = self.granularity {
            if start > end {
                return Err(AllocationError::invalid(format!(
                    "custom window start {start} is after its end {end}"
                )));
            }
        }
        Ok(())
    }

    pub fn series(&self, week_start: WeekStart) -> Result<TimeWindowSeries, AllocationError> {
        self.validate()?;
        let count = usize::try_from(self.window_count)
            .map_err(|_| AllocationError::invalid("window_count does not fit in memory"))?;
        let series = match self.granularity {
            WindowGranularity::Day => TimeWindowSeries::days(self.reference_date, count),
            WindowGranularity::Week => {
                TimeWindowSeries::weeks(self.reference_date, count, week_start)
            }
            WindowGranularity::Month => TimeWindowSeries::months(self.reference_date, count),
            WindowGranularity::Custom { start, end } => {
                return TimeWindowSeries::custom(start, end).ok_or_else(|| {
                    AllocationError::invalid("custom window start is after its end")
                });
            }
        };
        series.ok_or_else(|| AllocationError::invalid("horizon exceeds the supported date range"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationOptions {
    #[serde(default)]
    pub group_by: GroupBy,
    pub horizon: Horizon,
    #[serde(default)]
    pub capacity_mode: CapacityMode,
    #[serde(default)]
    pub filters: ResourceFilter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank_by: Option<RankBy>,
    /// Bound on the number of returned buckets; `None` returns all of them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
    /// Emit a row for work on unassigned tasks. Ignored while a resource predicate is active.
    #[serde(default)]
    pub include_unassigned: bool,
}

impl AllocationOptions {
    pub fn new(horizon: Horizon) -> Self {
        Self {
            group_by: GroupBy::default(),
            horizon,
            capacity_mode: CapacityMode::default(),
            filters: ResourceFilter::default(),
            rank_by: None,
            top_k: None,
            include_unassigned: false,
        }
    }

    pub fn grouped_by(mut self, group_by: GroupBy) -> Self {
        self.group_by = group_by;
        self
    }

    pub fn with_filters(mut self, filters: ResourceFilter) -> Self {
        self.filters = filters;
        self
    }

    pub fn ranked(mut self, rank_by: RankBy, top_k: Option<usize>) -> Self {
        self.rank_by = Some(rank_by);
        self.top_k = top_k;
        self
    }

    pub fn with_capacity_mode(mut self, capacity_mode: CapacityMode) -> Self {
        self.capacity_mode = capacity_mode;
        self
    }

    pub fn including_unassigned(mut self) -> Self {
        self.include_unassigned = true;
        self
    }

    pub fn validate(&self) -> Result<(), AllocationError> {
        self.horizon.validate()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationSummary {
    pub window_count: usize,
    pub resources_in_scope: usize,
    pub tasks_counted: usize,
    pub tasks_skipped: usize,
    pub tasks_terminated: usize,
    pub total_allocated_hours: f64,
    pub unassigned_hours: f64,
    pub total_capacity_hours: f64,
    pub overallocated_count: usize,
    pub band_counts: BTreeMap<UtilizationBand, usize>,
}

impl AllocationSummary {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("windows={}", self.window_count));
        parts.push(format!("resources={}", self.resources_in_scope));
        parts.push(format!("tasks={}", self.tasks_counted));
        if self.tasks_skipped > 0 {
            parts.push(format!("skipped={}", self.tasks_skipped));
        }
        parts.push(format!("allocated={:.1}h", self.total_allocated_hours));
        parts.push(format!("capacity={:.1}h", self.total_capacity_hours));
        if self.unassigned_hours > 0.0 {
            parts.push(format!("unassigned={:.1}h", self.unassigned_hours));
        }
        if self.overallocated_count > 0 {
            parts.push(format!("overallocated={}", self.overallocated_count));
        }
        parts.join(", ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub buckets: Vec<AllocationBucket>,
    pub warnings: Vec<DataQualityWarning>,
    pub summary: AllocationSummary,
}

impl AllocationResult {
    pub fn total_allocated_hours(&self) -> f64 {
        self.buckets.iter().map(|bucket| bucket.allocated_hours).sum()
    }

    pub fn for_label<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a AllocationBucket> {
        self.buckets.iter().filter(move |bucket| bucket.label == label)
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)
            .ok_or_else(|| PolarsError::ComputeError("invalid epoch".into()))?;
        let day_number = |date: NaiveDate| (date - epoch).num_days() as i32;

        let groups: Vec<String> = self.buckets.iter().map(|b| b.group.to_string()).collect();
        let labels: Vec<&str> = self.buckets.iter().map(|b| b.label.as_str()).collect();
        let windows: Vec<&str> = self.buckets.iter().map(|b| b.window.label.as_str()).collect();
        let starts: Vec<i32> = self.buckets.iter().map(|b| day_number(b.window.start)).collect();
        let ends: Vec<i32> = self.buckets.iter().map(|b| day_number(b.window.end)).collect();
        let allocated: Vec<f64> = self.buckets.iter().map(|b| b.allocated_hours).collect();
        let capacity: Vec<f64> = self.buckets.iter().map(|b| b.capacity_hours).collect();
        let utilization: Vec<f64> = self.buckets.iter().map(|b| b.utilization).collect();
        let bands: Vec<&str> = self.buckets.iter().map(|b| b.band.as_str()).collect();
        let flags: Vec<bool> = self.buckets.iter().map(|b| b.overallocated).collect();
        let members: Vec<u32> = self.buckets.iter().map(|b| b.member_count as u32).collect();

        let columns = vec![
            Series::new(PlSmallStr::from_static("group"), groups).into_column(),
            Series::new(PlSmallStr::from_static("label"), labels).into_column(),
            Series::new(PlSmallStr::from_static("window"), windows).into_column(),
            Series::new(PlSmallStr::from_static("window_start"), starts)
                .cast(&DataType::Date)?
                .into_column(),
            Series::new(PlSmallStr::from_static("window_end"), ends)
                .cast(&DataType::Date)?
                .into_column(),
            Series::new(PlSmallStr::from_static("allocated_hours"), allocated).into_column(),
            Series::new(PlSmallStr::from_static("capacity_hours"), capacity).into_column(),
            Series::new(PlSmallStr::from_static("utilization"), utilization).into_column(),
            Series::new(PlSmallStr::from_static("band"), bands).into_column(),
            Series::new(PlSmallStr::from_static("overallocated"), flags).into_column(),
            Series::new(PlSmallStr::from_static("member_count"), members).into_column(),
        ];
        DataFrame::new(columns)
    }
}

/// Runs the whole pipeline over one snapshot. Configuration problems abort before any
/// aggregation; data-quality problems become warnings.
pub fn compute_allocations(
    snapshot: &Snapshot,
    options: &AllocationOptions,
    config: &EngineConfig,
) -> Result<AllocationResult, AllocationError> {
    config.validate()?;
    options.validate()?;
    let series = options.horizon.series(config.week_start)?;

    let span = tracing::debug_span!(
        "compute_allocations",
        group_by = ?options.group_by,
        windows = series.len(),
        resources = snapshot.resources.len(),
        tasks = snapshot.tasks.len(),
    );
    let _entered = span.enter();

    let known_resources: HashSet<&str> = snapshot
        .resources
        .iter()
        .map(|resource| resource.id.as_str())
        .collect();
    let screening = screen_tasks(&snapshot.tasks, &known_resources, config);

    let mut in_scope = options.filters.select_resources(&snapshot.resources);
    let mut seen_resources = HashSet::with_capacity(in_scope.len());
    in_scope.retain(|resource| {
        let first = seen_resources.insert(resource.id.as_str());
        if !first {
            tracing::warn!(resource_id = %resource.id, "duplicate resource id ignored");
        }
        first
    });
    let scope_ids: Vec<&str> = in_scope.iter().map(|resource| resource.id.as_str()).collect();
    let scope_set: HashSet<&str> = scope_ids.iter().copied().collect();
    let include_unassigned =
        options.include_unassigned && !options.filters.has_resource_predicates();

    let counted: Vec<&ValidTask<'_>> = screening
        .valid
        .iter()
        .filter(|valid| match valid.task.resource_id.as_deref() {
            Some(id) => scope_set.contains(id),
            None => include_unassigned,
        })
        .collect();

    // Work outside the horizon is clipped before bucketing
    let daily: Vec<DailyAllocation> = match series.horizon() {
        Some((from, to)) => counted
            .iter()
            .flat_map(|valid| distribute_within(valid, from, to))
            .collect(),
        None => Vec::new(),
    };
    let windowed = aggregate(&daily, &series, &scope_ids, config.parallel);

    let context = GroupingContext {
        resources: &in_scope,
        teams: &snapshot.teams,
        default_weekly_capacity: config.default_weekly_capacity_hours,
    };
    let totals = group_allocations(
        &windowed,
        &context,
        options.group_by,
        options.capacity_mode,
        include_unassigned,
    );
    let classified = classify_all(totals, &config.thresholds);

    let total_capacity_hours: f64 = in_scope
        .iter()
        .map(|resource| resource.weekly_capacity(config.default_weekly_capacity_hours))
        .sum::<f64>()
        * series.iter().map(|window| window.week_fraction()).sum::<f64>();
    let summary = AllocationSummary {
        window_count: series.len(),
        resources_in_scope: in_scope.len(),
        tasks_counted: counted.len(),
        tasks_skipped: screening.warnings.len(),
        tasks_terminated: screening.terminated,
        total_allocated_hours: windowed.total_allocated(),
        unassigned_hours: windowed.unassigned().iter().sum(),
        total_capacity_hours,
        overallocated_count: count_overallocated(&classified),
        band_counts: band_counts(&classified),
    };

    let mut buckets = options.filters.retain_buckets(classified);
    if let Some(rank_by) = options.rank_by {
        rank(&mut buckets, rank_by);
    }
    let buckets = top_k(buckets, options.top_k);

    tracing::debug!(
        buckets = buckets.len(),
        warnings = screening.warnings.len(),
        "allocation computed"
    );

    Ok(AllocationResult {
        buckets,
        warnings: screening.warnings,
        summary,
    })
}
