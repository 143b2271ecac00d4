use super::validate_snapshot;
use crate::allocation::AllocationResult;
use crate::calculations::utilization::AllocationBucket;
use crate::error::{PersistenceError, PersistenceResult};
use crate::resource::{MediaType, Resource, ResourceType, Team};
use crate::snapshot::Snapshot;
use crate::task::{Task, TaskStatus, parse_date};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

pub fn save_snapshot_to_json<P: AsRef<Path>>(snapshot: &Snapshot, path: P) -> PersistenceResult<()> {
    validate_snapshot(snapshot)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, snapshot)?;
    Ok(())
}

pub fn load_snapshot_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Snapshot> {
    let file = File::open(path)?;
    let snapshot: Snapshot = serde_json::from_reader(file)?;
    validate_snapshot(&snapshot)?;
    Ok(snapshot)
}

#[derive(Default, Serialize, Deserialize)]
struct ResourceCsvRecord {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default, alias = "type")]
    resource_type: String,
    #[serde(default)]
    capacity_hours_per_week: String,
    #[serde(default)]
    media_type: String,
    #[serde(default)]
    team_id: String,
}

impl ResourceCsvRecord {
    fn into_resource(self) -> PersistenceResult<Resource> {
        let resource_type = if self.resource_type.trim().is_empty() {
            ResourceType::default()
        } else {
            ResourceType::from_str(&self.resource_type).map_err(PersistenceError::InvalidData)?
        };
        let mut resource = Resource::new(self.id.trim(), resource_type);
        resource.name = parse_string_option(self.name);
        resource.capacity_hours_per_week = parse_f64(&self.capacity_hours_per_week)?;
        resource.media_type = parse_string_option(self.media_type).map(MediaType::from);
        resource.team_id = parse_string_option(self.team_id);
        Ok(resource)
    }
}

#[derive(Default, Serialize, Deserialize)]
struct TaskCsvRecord {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    start_date: String,
    #[serde(default)]
    due_date: String,
    #[serde(default)]
    estimated_hours: String,
    #[serde(default)]
    resource_id: String,
    #[serde(default)]
    status: String,
}

impl TaskCsvRecord {
    fn into_task(self) -> PersistenceResult<Task> {
        let status = TaskStatus::from_str(&self.status).unwrap_or(TaskStatus::Other);
        Ok(Task {
            id: self.id.trim().to_string(),
            name: parse_string_option(self.name),
            // Bad dates are kept as missing so the engine can report them per task
            start_date: parse_date(&self.start_date),
            due_date: parse_date(&self.due_date),
            estimated_hours: parse_f64(&self.estimated_hours)?,
            resource_id: parse_string_option(self.resource_id),
            status,
        })
    }
}

#[derive(Serialize, Deserialize)]
struct TeamCsvRecord {
    id: String,
    name: String,
}

fn read_records<T, P>(path: P) -> PersistenceResult<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut records = Vec::new();
    for record in reader.deserialize::<T>() {
        records.push(record?);
    }
    Ok(records)
}

/// Reads one CSV per entity. Headers mirror the JSON field names; the teams file is optional.
pub fn load_snapshot_from_csv<P: AsRef<Path>>(
    resources_path: P,
    tasks_path: P,
    teams_path: Option<P>,
) -> PersistenceResult<Snapshot> {
    let resources = read_records::<ResourceCsvRecord, _>(resources_path)?
        .into_iter()
        .map(ResourceCsvRecord::into_resource)
        .collect::<PersistenceResult<Vec<_>>>()?;
    let tasks = read_records::<TaskCsvRecord, _>(tasks_path)?
        .into_iter()
        .map(TaskCsvRecord::into_task)
        .collect::<PersistenceResult<Vec<_>>>()?;
    let teams = match teams_path {
        Some(path) => read_records::<TeamCsvRecord, _>(path)?
            .into_iter()
            .map(|record| Team::new(record.id.trim(), record.name.trim()))
            .collect(),
        None => Vec::new(),
    };

    let snapshot = Snapshot::new(resources, tasks, teams);
    validate_snapshot(&snapshot)?;
    Ok(snapshot)
}

#[derive(Serialize)]
struct BucketCsvRecord<'a> {
    group: String,
    label: &'a str,
    window: &'a str,
    window_start: String,
    window_end: String,
    allocated_hours: f64,
    capacity_hours: f64,
    utilization: f64,
    band: &'static str,
    overallocated: bool,
    member_count: usize,
}

impl<'a> From<&'a AllocationBucket> for BucketCsvRecord<'a> {
    fn from(bucket: &'a AllocationBucket) -> Self {
        Self {
            group: bucket.group.to_string(),
            label: &bucket.label,
            window: &bucket.window.label,
            window_start: bucket.window.start.format("%Y-%m-%d").to_string(),
            window_end: bucket.window.end.format("%Y-%m-%d").to_string(),
            allocated_hours: bucket.allocated_hours,
            capacity_hours: bucket.capacity_hours,
            utilization: bucket.utilization,
            band: bucket.band.as_str(),
            overallocated: bucket.overallocated,
            member_count: bucket.member_count,
        }
    }
}

pub fn export_result_to_csv<P: AsRef<Path>>(result: &AllocationResult, path: P) -> PersistenceResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for bucket in &result.buckets {
        writer.serialize(BucketCsvRecord::from(bucket))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn export_result_to_json<P: AsRef<Path>>(result: &AllocationResult, path: P) -> PersistenceResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, result)?;
    Ok(())
}

fn parse_f64(input: &str) -> PersistenceResult<Option<f64>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    input
        .trim()
        .parse::<f64>()
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid number '{input}': {e}")))
}

fn parse_string_option(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.trim().to_string())
    }
}
