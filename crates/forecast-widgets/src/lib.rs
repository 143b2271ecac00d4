//! Dashboard widgets as presets over the one allocation pipeline. Each widget only
//! chooses grouping, horizon, filters and ranking; none of them does arithmetic of its own.

use capacity_forecast::{
    AllocationError, AllocationOptions, AllocationResult, CapacityMode, EngineConfig, GroupBy,
    Horizon, RankBy, ResourceFilter, Snapshot, UtilizationBand, compute_allocations,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    Forecast,
    CapacityPlanning,
    TeamUtilization,
    MediaTypeUtilization,
    ResourceOverview,
}

impl WidgetKind {
    pub const ALL: [WidgetKind; 5] = [
        WidgetKind::Forecast,
        WidgetKind::CapacityPlanning,
        WidgetKind::TeamUtilization,
        WidgetKind::MediaTypeUtilization,
        WidgetKind::ResourceOverview,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WidgetKind::Forecast => "forecast",
            WidgetKind::CapacityPlanning => "capacity_planning",
            WidgetKind::TeamUtilization => "team_utilization",
            WidgetKind::MediaTypeUtilization => "media_type_utilization",
            WidgetKind::ResourceOverview => "resource_overview",
        }
    }

    /// Default options of the widget, anchored at `reference_date`.
    pub fn preset(self, reference_date: NaiveDate) -> AllocationOptions {
        match self {
            WidgetKind::Forecast => forecast(reference_date, 8),
            WidgetKind::CapacityPlanning => capacity_planning(reference_date, 3),
            WidgetKind::TeamUtilization => team_utilization(reference_date, 4),
            WidgetKind::MediaTypeUtilization => media_type_utilization(reference_date, 4),
            WidgetKind::ResourceOverview => resource_overview(reference_date, 4, Some(10)),
        }
    }
}

impl FromStr for WidgetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        WidgetKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("unknown widget '{s}'"))
    }
}

/// Total load across all resources, week by week, with unassigned work shown separately.
pub fn forecast(reference_date: NaiveDate, weeks: i64) -> AllocationOptions {
    AllocationOptions::new(Horizon::weeks(reference_date, weeks)).including_unassigned()
}

/// Per-resource load month by month, busiest first.
pub fn capacity_planning(reference_date: NaiveDate, months: i64) -> AllocationOptions {
    AllocationOptions::new(Horizon::months(reference_date, months))
        .grouped_by(GroupBy::Resource)
        .ranked(RankBy::UtilizationDesc, None)
}

pub fn team_utilization(reference_date: NaiveDate, weeks: i64) -> AllocationOptions {
    AllocationOptions::new(Horizon::weeks(reference_date, weeks))
        .grouped_by(GroupBy::Team)
        .with_capacity_mode(CapacityMode::HorizonTotal)
        .ranked(RankBy::UtilizationDesc, None)
}

pub fn media_type_utilization(reference_date: NaiveDate, weeks: i64) -> AllocationOptions {
    AllocationOptions::new(Horizon::weeks(reference_date, weeks))
        .grouped_by(GroupBy::MediaType)
        .with_capacity_mode(CapacityMode::HorizonTotal)
        .ranked(RankBy::UtilizationDesc, None)
}

/// Most loaded resources over the horizon; `top_k` of `None` lists all of them.
pub fn resource_overview(
    reference_date: NaiveDate,
    weeks: i64,
    top_k: Option<usize>,
) -> AllocationOptions {
    AllocationOptions::new(Horizon::weeks(reference_date, weeks))
        .grouped_by(GroupBy::Resource)
        .with_capacity_mode(CapacityMode::HorizonTotal)
        .ranked(RankBy::UtilizationDesc, top_k)
}

/// Resource-week buckets over capacity, as shown in the alert panel. Capacity is
/// compared per window so a single overloaded week is not averaged away.
pub fn overallocated_resources(reference_date: NaiveDate, weeks: i64) -> AllocationOptions {
    AllocationOptions::new(Horizon::weeks(reference_date, weeks))
        .grouped_by(GroupBy::Resource)
        .with_capacity_mode(CapacityMode::PerWindow)
        .ranked(RankBy::UtilizationDesc, None)
        .with_filters(ResourceFilter {
            overallocated_only: true,
            ..ResourceFilter::default()
        })
}

/// Numbers a widget shows above its table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetHeadline {
    pub widget: WidgetKind,
    pub rows: usize,
    pub peak_utilization: Option<f64>,
    pub peak_label: Option<String>,
    pub overallocated: usize,
    pub skipped_tasks: usize,
}

impl WidgetHeadline {
    pub fn from_result(widget: WidgetKind, result: &AllocationResult) -> Self {
        let peak = result
            .buckets
            .iter()
            .max_by(|a, b| a.utilization.total_cmp(&b.utilization));
        Self {
            widget,
            rows: result.buckets.len(),
            peak_utilization: peak.map(|bucket| bucket.utilization),
            peak_label: peak.map(|bucket| bucket.label.clone()),
            overallocated: result.summary.overallocated_count,
            skipped_tasks: result.warnings.len(),
        }
    }

    pub fn peak_band(&self, config: &EngineConfig) -> Option<UtilizationBand> {
        self.peak_utilization
            .map(|value| UtilizationBand::classify(value, &config.thresholds))
    }
}

pub fn render(
    widget: WidgetKind,
    snapshot: &Snapshot,
    options: &AllocationOptions,
    config: &EngineConfig,
) -> Result<(WidgetHeadline, AllocationResult), AllocationError> {
    let result = compute_allocations(snapshot, options, config)?;
    let headline = WidgetHeadline::from_result(widget, &result);
    tracing::debug!(widget = widget.as_str(), rows = headline.rows, "widget rendered");
    Ok((headline, result))
}

/// Renders a widget with its default options.
pub fn render_preset(
    widget: WidgetKind,
    snapshot: &Snapshot,
    reference_date: NaiveDate,
    config: &EngineConfig,
) -> Result<(WidgetHeadline, AllocationResult), AllocationError> {
    render(widget, snapshot, &widget.preset(reference_date), config)
}
