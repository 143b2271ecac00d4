use crate::calendar::{days_between_inclusive, days_in_range};
use crate::task_validation::ValidTask;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum Assignee {
    Resource(String),
    Unassigned,
}

impl Assignee {
    pub fn resource_id(&self) -> Option<&str> {
        match self {
            Assignee::Resource(id) => Some(id),
            Assignee::Unassigned => None,
        }
    }
}

impl fmt::Display for Assignee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assignee::Resource(id) => f.write_str(id),
            Assignee::Unassigned => f.write_str("unassigned"),
        }
    }
}

/// Hours one task places on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAllocation {
    pub task_id: String,
    pub assignee: Assignee,
    pub date: NaiveDate,
    pub hours: f64,
}

/// Even share of the estimate per inclusive day; a one-day task keeps its full estimate.
pub fn hours_per_day(task: &ValidTask<'_>) -> f64 {
    let duration_days = days_between_inclusive(task.start, task.due).max(1);
    task.hours / duration_days as f64
}

pub fn distribute(task: &ValidTask<'_>) -> Vec<DailyAllocation> {
    distribute_between(task, task.start, task.due)
}

/// Same per-day rate as [`distribute`], but only the days inside `[from, to]` are emitted.
pub fn distribute_within(task: &ValidTask<'_>, from: NaiveDate, to: NaiveDate) -> Vec<DailyAllocation> {
    distribute_between(task, task.start.max(from), task.due.min(to))
}

fn distribute_between(task: &ValidTask<'_>, from: NaiveDate, to: NaiveDate) -> Vec<DailyAllocation> {
    let rate = hours_per_day(task);
    let assignee = match task.task.resource_id.as_deref() {
        Some(id) => Assignee::Resource(id.to_string()),
        None => Assignee::Unassigned,
    };
    days_in_range(from, to)
        .into_iter()
        .map(|date| DailyAllocation {
            task_id: task.task.id.clone(),
            assignee: assignee.clone(),
            date,
            hours: rate,
        })
        .collect()
}

pub fn distribute_all(tasks: &[ValidTask<'_>]) -> Vec<DailyAllocation> {
    tasks.iter().flat_map(distribute).collect()
}
