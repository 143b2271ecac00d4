use crate::calculations::grouping::{GroupKey, GroupTotals};
use crate::calendar::TimeWindow;
use crate::config::UtilizationThresholds;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilizationBand {
    Low,
    Moderate,
    High,
    Overallocated,
}

impl UtilizationBand {
    pub fn classify(utilization: f64, thresholds: &UtilizationThresholds) -> Self {
        if utilization >= thresholds.overallocated {
            UtilizationBand::Overallocated
        } else if utilization >= thresholds.high {
            UtilizationBand::High
        } else if utilization >= thresholds.moderate {
            UtilizationBand::Moderate
        } else {
            UtilizationBand::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UtilizationBand::Low => "low",
            UtilizationBand::Moderate => "moderate",
            UtilizationBand::High => "high",
            UtilizationBand::Overallocated => "overallocated",
        }
    }
}

impl fmt::Display for UtilizationBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `allocated / capacity`, or 0 when there is no capacity. Never NaN or infinite.
pub fn utilization(allocated_hours: f64, capacity_hours: f64) -> f64 {
    if capacity_hours > 0.0 && capacity_hours.is_finite() && allocated_hours.is_finite() {
        (allocated_hours / capacity_hours).max(0.0)
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationBucket {
    pub group: GroupKey,
    pub label: String,
    pub window: TimeWindow,
    pub allocated_hours: f64,
    pub capacity_hours: f64,
    pub member_count: usize,
    pub utilization: f64,
    pub band: UtilizationBand,
    pub overallocated: bool,
}

impl AllocationBucket {
    pub fn classify(totals: GroupTotals, thresholds: &UtilizationThresholds) -> Self {
        let ratio = utilization(totals.allocated_hours, totals.capacity_hours);
        let band = UtilizationBand::classify(ratio, thresholds);
        let capacity_exceeded = totals.capacity_hours <= 0.0 && totals.allocated_hours > 0.0;
        let overallocated = totals.group != GroupKey::UnassignedWork
            && (band == UtilizationBand::Overallocated || capacity_exceeded);
        Self {
            group: totals.group,
            label: totals.label,
            window: totals.window,
            allocated_hours: totals.allocated_hours,
            capacity_hours: totals.capacity_hours,
            member_count: totals.member_count,
            utilization: ratio,
            band,
            overallocated,
        }
    }

    pub fn available_hours(&self) -> f64 {
        (self.capacity_hours - self.allocated_hours).max(0.0)
    }
}

pub fn classify_all(totals: Vec<GroupTotals>, thresholds: &UtilizationThresholds) -> Vec<AllocationBucket> {
    totals
        .into_iter()
        .map(|totals| AllocationBucket::classify(totals, thresholds))
        .collect()
}

/// Per-window check; a group can be overallocated in one week while its horizon
/// average stays below capacity.
pub fn is_overallocated(bucket: &AllocationBucket) -> bool {
    bucket.overallocated
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RankBy {
    /// Most available capacity first.
    UtilizationAsc,
    /// Most utilized first.
    UtilizationDesc,
}

impl FromStr for RankBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "utilization-asc" | "asc" => Ok(RankBy::UtilizationAsc),
            "utilization-desc" | "desc" => Ok(RankBy::UtilizationDesc),
            other => Err(format!("unknown rank_by '{other}'")),
        }
    }
}

/// Stable sort by utilization; ties fall back to label ascending in both directions.
pub fn rank(buckets: &mut [AllocationBucket], rank_by: RankBy) {
    buckets.sort_by(|a, b| {
        let by_utilization = a.utilization.total_cmp(&b.utilization);
        let by_utilization = match rank_by {
            RankBy::UtilizationAsc => by_utilization,
            RankBy::UtilizationDesc => by_utilization.reverse(),
        };
        // Labels can repeat (two resources with one display name), so the key settles it
        by_utilization
            .then_with(|| a.label.cmp(&b.label))
            .then_with(|| a.group.cmp(&b.group))
            .then_with(|| a.window.start.cmp(&b.window.start))
    });
}

pub fn count_overallocated(buckets: &[AllocationBucket]) -> usize {
    buckets.iter().filter(|bucket| is_overallocated(bucket)).count()
}

pub fn band_counts(buckets: &[AllocationBucket]) -> BTreeMap<UtilizationBand, usize> {
    let mut counts = BTreeMap::new();
    for bucket in buckets {
        *counts.entry(bucket.band).or_insert(0) += 1;
    }
    counts
}

/// First `k` buckets, or all of them when `k` is `None`.
pub fn top_k(buckets: Vec<AllocationBucket>, k: Option<usize>) -> Vec<AllocationBucket> {
    match k {
        Some(limit) => buckets.into_iter().take(limit).collect(),
        None => buckets,
    }
}
