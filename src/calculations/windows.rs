use crate::calculations::distribution::{Assignee, DailyAllocation};
use crate::calendar::{TimeWindow, TimeWindowSeries};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Dense per-resource, per-window hour totals. Every resource in scope has one
/// entry per window, zeros included.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowedAllocations {
    series: TimeWindowSeries,
    by_resource: BTreeMap<String, Vec<f64>>,
    unassigned: Vec<f64>,
}

impl WindowedAllocations {
    pub fn series(&self) -> &TimeWindowSeries {
        &self.series
    }

    pub fn windows(&self) -> &[TimeWindow] {
        self.series.windows()
    }

    pub fn resource_ids(&self) -> impl Iterator<Item = &str> {
        self.by_resource.keys().map(String::as_str)
    }

    pub fn for_resource(&self, resource_id: &str) -> Option<&[f64]> {
        self.by_resource.get(resource_id).map(Vec::as_slice)
    }

    pub fn unassigned(&self) -> &[f64] {
        &self.unassigned
    }

    pub fn hours(&self, resource_id: &str, window_idx: usize) -> f64 {
        self.by_resource
            .get(resource_id)
            .and_then(|row| row.get(window_idx))
            .copied()
            .unwrap_or(0.0)
    }

    /// The full `(resource, window, hours)` cross product in resource then window order.
    pub fn cells(&self) -> impl Iterator<Item = (&str, &TimeWindow, f64)> {
        self.by_resource.iter().flat_map(move |(id, row)| {
            self.series
                .iter()
                .zip(row.iter())
                .map(move |(window, hours)| (id.as_str(), window, *hours))
        })
    }

    pub fn total_allocated(&self) -> f64 {
        self.by_resource.values().flatten().sum()
    }
}

fn sum_into_windows<'a, I>(allocations: I, series: &TimeWindowSeries) -> Vec<f64>
where
    I: IntoIterator<Item = &'a DailyAllocation>,
{
    let mut row = vec![0.0; series.len()];
    for allocation in allocations {
        // Days outside the horizon are truncated here
        if let Some(idx) = series.window_index_of(allocation.date) {
            row[idx] += allocation.hours;
        }
    }
    row
}

/// Buckets daily allocations into the series for the given resources. Allocations for
/// resources outside `resource_ids` are ignored; unassigned work is kept in its own row.
pub fn aggregate(
    allocations: &[DailyAllocation],
    series: &TimeWindowSeries,
    resource_ids: &[&str],
    parallel: bool,
) -> WindowedAllocations {
    let mut grouped: BTreeMap<&str, Vec<&DailyAllocation>> =
        resource_ids.iter().map(|id| (*id, Vec::new())).collect();
    let mut unassigned_days = Vec::new();
    for allocation in allocations {
        match &allocation.assignee {
            Assignee::Resource(id) => {
                if let Some(bucket) = grouped.get_mut(id.as_str()) {
                    bucket.push(allocation);
                }
            }
            Assignee::Unassigned => unassigned_days.push(allocation),
        }
    }

    let rows: Vec<(String, Vec<f64>)> = if parallel {
        grouped
            .into_par_iter()
            .map(|(id, days)| (id.to_string(), sum_into_windows(days, series)))
            .collect()
    } else {
        grouped
            .into_iter()
            .map(|(id, days)| (id.to_string(), sum_into_windows(days, series)))
            .collect()
    };

    WindowedAllocations {
        series: series.clone(),
        by_resource: rows.into_iter().collect(),
        unassigned: sum_into_windows(unassigned_days, series),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::WeekStart;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn day(resource: Option<&str>, date: NaiveDate, hours: f64) -> DailyAllocation {
        DailyAllocation {
            task_id: "t".into(),
            assignee: resource
                .map(|id| Assignee::Resource(id.into()))
                .unwrap_or(Assignee::Unassigned),
            date,
            hours,
        }
    }

    #[test]
    fn grid_is_dense_and_truncated_to_horizon() {
        let series = TimeWindowSeries::weeks(d(2024, 1, 1), 2, WeekStart::Monday).unwrap();
        let days = vec![
            day(Some("r1"), d(2023, 12, 31), 3.0),
            day(Some("r1"), d(2024, 1, 2), 2.0),
            day(None, d(2024, 1, 9), 1.5),
            day(Some("ghost"), d(2024, 1, 2), 9.0),
        ];
        let windowed = aggregate(&days, &series, &["r1", "r2"], false);
        assert_eq!(windowed.for_resource("r1"), Some(&[2.0, 0.0][..]));
        assert_eq!(windowed.for_resource("r2"), Some(&[0.0, 0.0][..]));
        assert_eq!(windowed.unassigned(), &[0.0, 1.5]);
        assert_eq!(windowed.cells().count(), 4);
        assert_eq!(windowed.total_allocated(), 2.0);
    }
}
