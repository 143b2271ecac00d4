use crate::config::EngineConfig;
use crate::task::Task;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    MissingStartDate,
    MissingDueDate,
    InvertedDateRange,
    InvalidHours,
    UnknownResource,
    DuplicateTask,
}

/// A task that was left out of the computation, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityWarning {
    pub task_id: String,
    pub kind: WarningKind,
    pub message: String,
}

impl DataQualityWarning {
    pub fn new(task_id: impl Into<String>, kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// A task that passed validation, with its dates resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidTask<'a> {
    pub task: &'a Task,
    pub start: NaiveDate,
    pub due: NaiveDate,
    pub hours: f64,
}

pub fn validate_task<'a>(
    task: &'a Task,
    known_resources: &HashSet<&str>,
) -> Result<ValidTask<'a>, DataQualityWarning> {
    let start = task.start_date.ok_or_else(|| {
        DataQualityWarning::new(
            &task.id,
            WarningKind::MissingStartDate,
            format!("task {} has a missing or unparseable start_date", task.id),
        )
    })?;
    let due = task.due_date.ok_or_else(|| {
        DataQualityWarning::new(
            &task.id,
            WarningKind::MissingDueDate,
            format!("task {} has a missing or unparseable due_date", task.id),
        )
    })?;

    if start > due {
        return Err(DataQualityWarning::new(
            &task.id,
            WarningKind::InvertedDateRange,
            format!(
                "task {} starts on {start} after its due date {due}",
                task.id
            ),
        ));
    }

    let hours = task.hours();
    if !hours.is_finite() || hours < 0.0 {
        return Err(DataQualityWarning::new(
            &task.id,
            WarningKind::InvalidHours,
            format!("task {} has invalid estimated_hours {hours}", task.id),
        ));
    }

    if let Some(resource_id) = task.resource_id.as_deref() {
        if !known_resources.contains(resource_id) {
            return Err(DataQualityWarning::new(
                &task.id,
                WarningKind::UnknownResource,
                format!(
                    "task {} is assigned to unknown resource '{resource_id}'",
                    task.id
                ),
            ));
        }
    }

    Ok(ValidTask {
        task,
        start,
        due,
        hours,
    })
}

#[derive(Debug, Default)]
pub struct TaskScreening<'a> {
    pub valid: Vec<ValidTask<'a>>,
    pub warnings: Vec<DataQualityWarning>,
    pub terminated: usize,
}

/// Splits tasks into those that take part in the computation and warnings for the rest.
/// Terminal-status tasks are dropped silently; the first occurrence of an id wins.
pub fn screen_tasks<'a>(
    tasks: &'a [Task],
    known_resources: &HashSet<&str>,
    config: &EngineConfig,
) -> TaskScreening<'a> {
    let mut screening = TaskScreening::default();
    let mut seen_ids = HashSet::with_capacity(tasks.len());

    for task in tasks {
        if !seen_ids.insert(task.id.as_str()) {
            screening.warnings.push(DataQualityWarning::new(
                &task.id,
                WarningKind::DuplicateTask,
                format!("duplicate task id {}", task.id),
            ));
            continue;
        }
        if config.is_terminal(task.status) {
            screening.terminated += 1;
            continue;
        }
        match validate_task(task, known_resources) {
            Ok(valid) => screening.valid.push(valid),
            Err(warning) => screening.warnings.push(warning),
        }
    }

    for warning in &screening.warnings {
        tracing::warn!(task_id = %warning.task_id, kind = ?warning.kind, "{}", warning.message);
    }
    screening
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskStatus;

    fn d(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn inverted_range_is_rejected_with_one_warning() {
        let tasks = vec![Task::new("t1", d(2024, 2, 10), d(2024, 2, 5), 10.0)];
        let screening = screen_tasks(&tasks, &HashSet::new(), &EngineConfig::default());
        assert!(screening.valid.is_empty());
        assert_eq!(screening.warnings.len(), 1);
        assert_eq!(screening.warnings[0].kind, WarningKind::InvertedDateRange);
        assert_eq!(screening.warnings[0].task_id, "t1");
    }

    #[test]
    fn negative_hours_and_unknown_resources_are_rejected() {
        let known: HashSet<&str> = ["r1"].into_iter().collect();
        let negative = Task::new("t1", d(2024, 1, 1), d(2024, 1, 2), -4.0);
        let unknown = Task::new("t2", d(2024, 1, 1), d(2024, 1, 2), 4.0).assigned_to("ghost");
        assert_eq!(
            validate_task(&negative, &known).unwrap_err().kind,
            WarningKind::InvalidHours
        );
        assert_eq!(
            validate_task(&unknown, &known).unwrap_err().kind,
            WarningKind::UnknownResource
        );
    }

    #[test]
    fn terminal_tasks_are_dropped_without_warning() {
        let tasks = vec![
            Task::new("t1", d(2024, 1, 1), d(2024, 1, 2), 4.0).with_status(TaskStatus::Cancelled),
            Task::new("t2", d(2024, 1, 9), d(2024, 1, 2), 4.0).with_status(TaskStatus::Terminated),
            Task::new("t3", d(2024, 1, 1), d(2024, 1, 2), 4.0),
        ];
        let screening = screen_tasks(&tasks, &HashSet::new(), &EngineConfig::default());
        assert_eq!(screening.valid.len(), 1);
        assert_eq!(screening.terminated, 2);
        assert!(screening.warnings.is_empty());
    }

    #[test]
    fn duplicate_ids_keep_the_first_occurrence() {
        let tasks = vec![
            Task::new("t1", d(2024, 1, 1), d(2024, 1, 2), 4.0),
            Task::new("t1", d(2024, 1, 1), d(2024, 1, 2), 8.0),
        ];
        let screening = screen_tasks(&tasks, &HashSet::new(), &EngineConfig::default());
        assert_eq!(screening.valid.len(), 1);
        assert_eq!(screening.valid[0].hours, 4.0);
        assert_eq!(screening.warnings[0].kind, WarningKind::DuplicateTask);
    }
}
