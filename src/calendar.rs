use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// First day of a week window. Every consumer of one engine run shares the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekStart {
    Sunday,
    #[default]
    Monday,
}

impl WeekStart {
    pub fn weekday(self) -> Weekday {
        match self {
            WeekStart::Sunday => Weekday::Sun,
            WeekStart::Monday => Weekday::Mon,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WeekStart::Sunday => "sunday",
            WeekStart::Monday => "monday",
        }
    }
}

impl FromStr for WeekStart {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sunday" | "sun" => Ok(WeekStart::Sunday),
            "monday" | "mon" => Ok(WeekStart::Monday),
            other => Err(format!("unknown week start '{other}'")),
        }
    }
}

/// An inclusive date range used as an aggregation bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeWindow {
    pub fn new(label: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            label: label.into(),
            start,
            end,
        }
    }

    /// Seven days from `start`; `None` when the week runs past the last representable date.
    pub fn week(start: NaiveDate) -> Option<Self> {
        let end = start.checked_add_days(Days::new(6))?;
        Some(Self::new(format!("Week of {start}"), start, end))
    }

    pub fn month(any_day: NaiveDate) -> Self {
        let start = month_start_of(any_day);
        Self::new(start.format("%Y-%m").to_string(), start, month_end_of(any_day))
    }

    pub fn day(date: NaiveDate) -> Self {
        Self::new(date.to_string(), date, date)
    }

    pub fn custom(start: NaiveDate, end: NaiveDate) -> Self {
        Self::new(format!("{start}..{end}"), start, end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn day_count(&self) -> i64 {
        days_between_inclusive(self.start, self.end)
    }

    /// Fraction of a seven-day week this window spans; 1.0 for a week window.
    pub fn week_fraction(&self) -> f64 {
        self.day_count() as f64 / 7.0
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}..{}]", self.label, self.start, self.end)
    }
}

/// Ordered, contiguous, non-overlapping windows covering a horizon.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeWindowSeries {
    windows: Vec<TimeWindow>,
}

impl TimeWindowSeries {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Consecutive week windows starting with the week that contains `reference`.
    /// `None` when the series would run past the supported date range.
    pub fn weeks(reference: NaiveDate, count: usize, week_start: WeekStart) -> Option<Self> {
        let mut windows = Vec::new();
        let mut cursor = Some(week_start_of(reference, week_start));
        for _ in 0..count {
            let window = TimeWindow::week(cursor?)?;
            cursor = window.end.succ_opt();
            windows.push(window);
        }
        Some(Self { windows })
    }

    pub fn months(reference: NaiveDate, count: usize) -> Option<Self> {
        let mut windows = Vec::new();
        let mut cursor = Some(month_start_of(reference));
        for _ in 0..count {
            let window = TimeWindow::month(cursor?);
            cursor = window.end.succ_opt();
            windows.push(window);
        }
        Some(Self { windows })
    }

    pub fn days(reference: NaiveDate, count: usize) -> Option<Self> {
        let mut windows = Vec::new();
        let mut cursor = Some(reference);
        for _ in 0..count {
            let date = cursor?;
            windows.push(TimeWindow::day(date));
            cursor = date.succ_opt();
        }
        Some(Self { windows })
    }

    /// A single window. Returns `None` when `start > end`.
    pub fn custom(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        if start > end {
            return None;
        }
        Some(Self {
            windows: vec![TimeWindow::custom(start, end)],
        })
    }

    pub fn windows(&self) -> &[TimeWindow] {
        &self.windows
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimeWindow> {
        self.windows.iter()
    }

    /// Overall `[first.start, last.end]`, or `None` for an empty series.
    pub fn horizon(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.windows.first(), self.windows.last()) {
            (Some(first), Some(last)) => Some((first.start, last.end)),
            _ => None,
        }
    }

    pub fn window_index_of(&self, date: NaiveDate) -> Option<usize> {
        let idx = self.windows.partition_point(|window| window.end < date);
        self.windows
            .get(idx)
            .filter(|window| window.contains(date))
            .map(|_| idx)
    }
}

impl<'a> IntoIterator for &'a TimeWindowSeries {
    type Item = &'a TimeWindow;
    type IntoIter = std::slice::Iter<'a, TimeWindow>;

    fn into_iter(self) -> Self::IntoIter {
        self.windows.iter()
    }
}

pub fn week_start_of(date: NaiveDate, week_start: WeekStart) -> NaiveDate {
    let offset = match week_start {
        WeekStart::Monday => date.weekday().num_days_from_monday(),
        WeekStart::Sunday => date.weekday().num_days_from_sunday(),
    };
    // Saturates at the earliest representable date
    date.checked_sub_days(Days::new(u64::from(offset)))
        .unwrap_or(NaiveDate::MIN)
}

pub fn month_start_of(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn month_end_of(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    // Day before the first of the following month
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

/// Inclusive day count; zero when `start > end`.
pub fn days_between_inclusive(start: NaiveDate, end: NaiveDate) -> i64 {
    if start > end {
        0
    } else {
        (end - start).num_days() + 1
    }
}

/// Every calendar day of `[start, end]`.
pub fn days_in_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut current = Some(start);

    while let Some(date) = current.filter(|date| *date <= end) {
        days.push(date);
        current = date.succ_opt();
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_end_handles_december_and_leap_years() {
        assert_eq!(month_end_of(d(2023, 12, 15)), d(2023, 12, 31));
        assert_eq!(month_end_of(d(2024, 2, 3)), d(2024, 2, 29));
        assert_eq!(month_end_of(d(2025, 2, 3)), d(2025, 2, 28));
        assert_eq!(month_end_of(NaiveDate::MAX), NaiveDate::MAX);
    }

    #[test]
    fn series_past_the_date_range_are_rejected() {
        assert!(TimeWindowSeries::days(NaiveDate::MAX, 1).is_some());
        assert!(TimeWindowSeries::days(NaiveDate::MAX, 2).is_none());
        assert!(TimeWindowSeries::weeks(NaiveDate::MAX, 1, WeekStart::Monday).is_none());
        assert!(TimeWindowSeries::months(NaiveDate::MAX, 2).is_none());
        assert_eq!(days_in_range(NaiveDate::MAX, NaiveDate::MAX), vec![NaiveDate::MAX]);
    }

    #[test]
    fn window_index_of_uses_inclusive_bounds() {
        let series = TimeWindowSeries::weeks(d(2024, 1, 3), 2, WeekStart::Monday).unwrap();
        assert_eq!(series.window_index_of(d(2024, 1, 1)), Some(0));
        assert_eq!(series.window_index_of(d(2024, 1, 7)), Some(0));
        assert_eq!(series.window_index_of(d(2024, 1, 8)), Some(1));
        assert_eq!(series.window_index_of(d(2024, 1, 14)), Some(1));
        assert_eq!(series.window_index_of(d(2023, 12, 31)), None);
        assert_eq!(series.window_index_of(d(2024, 1, 15)), None);
    }
}
