use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Draft,
    #[default]
    Planned,
    InProgress,
    InReview,
    Approved,
    Completed,
    OnHold,
    #[serde(alias = "canceled")]
    Cancelled,
    Terminated,
    #[serde(other)]
    Other,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Draft => "draft",
            TaskStatus::Planned => "planned",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::InReview => "in_review",
            TaskStatus::Approved => "approved",
            TaskStatus::Completed => "completed",
            TaskStatus::OnHold => "on_hold",
            TaskStatus::Cancelled => "cancelled",
            TaskStatus::Terminated => "terminated",
            TaskStatus::Other => "other",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let status = match normalized.as_str() {
            "draft" => TaskStatus::Draft,
            "planned" | "" => TaskStatus::Planned,
            "in_progress" => TaskStatus::InProgress,
            "in_review" => TaskStatus::InReview,
            "approved" => TaskStatus::Approved,
            "completed" => TaskStatus::Completed,
            "on_hold" => TaskStatus::OnHold,
            "cancelled" | "canceled" => TaskStatus::Cancelled,
            "terminated" => TaskStatus::Terminated,
            _ => TaskStatus::Other,
        };
        Ok(status)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A brief: a unit of creative work with an inclusive date range and estimated effort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Missing or unparseable dates deserialize to `None`; the task is then skipped with a warning.
    #[serde(default, deserialize_with = "lenient_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub due_date: Option<NaiveDate>,
    /// A value that is not a number deserializes to NaN so the task is skipped
    /// with an `InvalidHours` warning instead of failing the whole load.
    #[serde(
        default,
        deserialize_with = "lenient_hours",
        skip_serializing_if = "Option::is_none"
    )]
    pub estimated_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        start_date: NaiveDate,
        due_date: NaiveDate,
        estimated_hours: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: None,
            start_date: Some(start_date),
            due_date: Some(due_date),
            estimated_hours: Some(estimated_hours),
            resource_id: None,
            status: TaskStatus::default(),
        }
    }

    pub fn assigned_to(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn hours(&self) -> f64 {
        self.estimated_hours.unwrap_or(0.0)
    }
}

/// Parses `YYYY-MM-DD`, also accepting an RFC 3339 timestamp (its date part is used).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok().or_else(|| {
        chrono::DateTime::parse_from_rfc3339(trimmed)
            .ok()
            .map(|dt| dt.date_naive())
    })
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => parse_date(&s),
        _ => None,
    })
}

fn lenient_hours<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::Number(n)) => Some(n.as_f64().unwrap_or(f64::NAN)),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => None,
        Some(serde_json::Value::String(s)) => Some(s.trim().parse().unwrap_or(f64::NAN)),
        Some(_) => Some(f64::NAN),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unparseable_dates_become_none() {
        let json = r#"{"id":"t1","start_date":"not a date","due_date":"2024-01-05","estimated_hours":8}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.start_date, None);
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(task.status, TaskStatus::Planned);
    }

    #[test]
    fn non_numeric_hours_become_nan() {
        let parse = |hours: &str| {
            let json = format!(r#"{{"id":"t1","estimated_hours":{hours}}}"#);
            serde_json::from_str::<Task>(&json).unwrap().estimated_hours
        };
        assert_eq!(parse("8"), Some(8.0));
        assert_eq!(parse(r#""12.5""#), Some(12.5));
        assert_eq!(parse("null"), None);
        assert!(parse(r#""a lot""#).is_some_and(f64::is_nan));
        assert!(parse("true").is_some_and(f64::is_nan));
        assert!(parse("[8]").is_some_and(f64::is_nan));
    }

    #[test]
    fn timestamps_keep_their_date_part() {
        assert_eq!(
            parse_date("2024-03-04T10:30:00Z"),
            NaiveDate::from_ymd_opt(2024, 3, 4)
        );
    }

    #[test]
    fn unknown_status_maps_to_other() {
        let json = r#"{"id":"t1","status":"archived"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.status, TaskStatus::Other);
        assert_eq!(task.hours(), 0.0);
        let json = r#"{"id":"t2","status":"canceled"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.status, TaskStatus::Cancelled);
    }
}
