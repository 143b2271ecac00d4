use capacity_forecast::{
    AllocationOptions, AllocationResult, EngineConfig, GroupBy, Horizon, MediaType,
    PersistenceError, Resource, ResourceType, Snapshot, Task, TaskStatus, Team, WarningKind,
    compute_allocations, export_result_to_csv, export_result_to_json, load_snapshot_from_csv,
    load_snapshot_from_json, save_snapshot_to_json,
};
use chrono::NaiveDate;
use std::fs;
use tempfile::{NamedTempFile, tempdir};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn build_sample_snapshot() -> Snapshot {
    let resources = vec![
        Resource::new("r1", ResourceType::Internal)
            .with_name("Robin")
            .with_capacity(32.0)
            .with_team("t1")
            .with_media_type(MediaType::Social),
        Resource::new("r2", ResourceType::Agency),
    ];
    let tasks = vec![
        Task::new("a", d(2024, 3, 4), d(2024, 3, 8), 16.0)
            .assigned_to("r1")
            .with_name("Launch post"),
        Task::new("b", d(2024, 3, 5), d(2024, 3, 6), 4.0).with_status(TaskStatus::InReview),
    ];
    Snapshot::new(resources, tasks, vec![Team::new("t1", "Content")])
}

#[test]
fn json_round_trip_preserves_snapshot() {
    let snapshot = build_sample_snapshot();
    let tmp = NamedTempFile::new().unwrap();
    save_snapshot_to_json(&snapshot, tmp.path()).unwrap();
    let loaded = load_snapshot_from_json(tmp.path()).unwrap();
    assert_eq!(loaded, snapshot);
}

#[test]
fn json_import_tolerates_bad_task_dates() {
    let tmp = NamedTempFile::new().unwrap();
    fs::write(
        tmp.path(),
        r#"{
            "resources": [{"id": "r1", "type": "freelancer", "media_type": "Out of Home"}],
            "tasks": [
                {"id": "a", "start_date": "not a date", "due_date": "2024-03-08", "estimated_hours": 5, "resource_id": "r1"},
                {"id": "b", "start_date": "2024-03-04T09:00:00Z", "due_date": "2024-03-04", "estimated_hours": 3, "status": "canceled"}
            ]
        }"#,
    )
    .unwrap();
    let snapshot = load_snapshot_from_json(tmp.path()).unwrap();
    assert_eq!(snapshot.resources[0].resource_type, ResourceType::Freelancer);
    assert_eq!(snapshot.resources[0].media_type, Some(MediaType::OutOfHome));
    assert_eq!(snapshot.tasks[0].start_date, None);
    assert_eq!(snapshot.tasks[1].start_date, Some(d(2024, 3, 4)));
    assert_eq!(snapshot.tasks[1].status, TaskStatus::Cancelled);
    assert!(snapshot.teams.is_empty());
}

#[test]
fn json_import_skips_tasks_with_non_numeric_hours() {
    let tmp = NamedTempFile::new().unwrap();
    fs::write(
        tmp.path(),
        r#"{
            "resources": [{"id": "r1", "type": "internal", "capacity_hours_per_week": 40}],
            "tasks": [
                {"id": "a", "start_date": "2024-03-04", "due_date": "2024-03-08", "estimated_hours": "about ten", "resource_id": "r1"},
                {"id": "b", "start_date": "2024-03-04", "due_date": "2024-03-08", "estimated_hours": "10", "resource_id": "r1"}
            ]
        }"#,
    )
    .unwrap();
    let snapshot = load_snapshot_from_json(tmp.path()).unwrap();
    assert_eq!(snapshot.tasks.len(), 2);

    let options = AllocationOptions::new(Horizon::weeks(d(2024, 3, 4), 1));
    let result = compute_allocations(&snapshot, &options, &EngineConfig::default()).unwrap();
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].task_id, "a");
    assert_eq!(result.warnings[0].kind, WarningKind::InvalidHours);
    assert!((result.total_allocated_hours() - 10.0).abs() < 1e-9);
}

#[test]
fn json_import_rejects_duplicate_resources() {
    let tmp = NamedTempFile::new().unwrap();
    fs::write(
        tmp.path(),
        r#"{"resources": [{"id": "r1"}, {"id": "r1"}], "tasks": []}"#,
    )
    .unwrap();
    let err = load_snapshot_from_json(tmp.path()).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)));
}

#[test]
fn csv_import_reads_all_three_files() {
    let dir = tempdir().unwrap();
    let resources = dir.path().join("resources.csv");
    let tasks = dir.path().join("tasks.csv");
    let teams = dir.path().join("teams.csv");
    fs::write(
        &resources,
        "id,name,resource_type,capacity_hours_per_week,media_type,team_id\n\
         r1,Robin,internal,32,social,t1\n\
         r2,,agency,,,\n",
    )
    .unwrap();
    fs::write(
        &tasks,
        "id,name,start_date,due_date,estimated_hours,resource_id,status\n\
         a,Launch post,2024-03-04,2024-03-08,16,r1,in_progress\n\
         b,,2024-03-05,bogus,4,,\n",
    )
    .unwrap();
    fs::write(&teams, "id,name\nt1,Content\n").unwrap();

    let snapshot = load_snapshot_from_csv(&resources, &tasks, Some(&teams)).unwrap();
    assert_eq!(snapshot.resources.len(), 2);
    assert_eq!(snapshot.resources[0].capacity_hours_per_week, Some(32.0));
    assert_eq!(snapshot.resources[0].media_type, Some(MediaType::Social));
    assert_eq!(snapshot.resources[1].capacity_hours_per_week, None);
    assert_eq!(snapshot.resources[1].team_id, None);
    assert_eq!(snapshot.tasks[0].status, TaskStatus::InProgress);
    assert_eq!(snapshot.tasks[1].due_date, None);
    assert_eq!(snapshot.tasks[1].resource_id, None);
    assert_eq!(snapshot.teams, vec![Team::new("t1", "Content")]);
}

#[test]
fn csv_import_rejects_malformed_numbers() {
    let dir = tempdir().unwrap();
    let resources = dir.path().join("resources.csv");
    let tasks = dir.path().join("tasks.csv");
    fs::write(&resources, "id,capacity_hours_per_week\nr1,lots\n").unwrap();
    fs::write(&tasks, "id,start_date,due_date,estimated_hours\n").unwrap();

    let err = load_snapshot_from_csv(&resources, &tasks, None).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(message) if message.contains("lots")));
}

fn sample_result() -> AllocationResult {
    let options = AllocationOptions::new(Horizon::weeks(d(2024, 3, 4), 2))
        .grouped_by(GroupBy::Resource)
        .including_unassigned();
    compute_allocations(&build_sample_snapshot(), &options, &EngineConfig::default()).unwrap()
}

#[test]
fn result_exports_one_csv_row_per_bucket() {
    let result = sample_result();
    let tmp = NamedTempFile::new().unwrap();
    export_result_to_csv(&result, tmp.path()).unwrap();

    let text = fs::read_to_string(tmp.path()).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "group,label,window,window_start,window_end,allocated_hours,capacity_hours,utilization,band,overallocated,member_count"
    );
    assert_eq!(lines.count(), result.buckets.len());
    assert!(text.contains("resource:r1,Robin,Week of 2024-03-04,2024-03-04,2024-03-10,16.0,32.0,0.5,moderate,false,1"));
}

#[test]
fn result_exports_as_json() {
    let result = sample_result();
    let tmp = NamedTempFile::new().unwrap();
    export_result_to_json(&result, tmp.path()).unwrap();

    let parsed: AllocationResult = serde_json::from_str(&fs::read_to_string(tmp.path()).unwrap()).unwrap();
    assert_eq!(parsed, result);
}

#[test]
fn result_projects_into_a_dataframe() {
    let result = sample_result();
    let df = result.to_dataframe().unwrap();
    assert_eq!(df.height(), result.buckets.len());
    assert!(df.column("utilization").is_ok());
    assert!(df.column("window_start").is_ok());
}
