use capacity_forecast::{
    AllocationError, AllocationOptions, EngineConfig, GroupBy, Horizon, Resource, ResourceType,
    Snapshot, Task, TaskStatus, UtilizationBand, WeekStart, compute_allocations,
};
use chrono::NaiveDate;
use std::fs;
use tempfile::NamedTempFile;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn config_file_overrides_selected_fields() {
    let tmp = NamedTempFile::new().unwrap();
    fs::write(
        tmp.path(),
        r#"{
            "default_weekly_capacity_hours": 20,
            "week_start": "sunday",
            "thresholds": {"moderate": 0.4, "high": 0.6, "overallocated": 1.0},
            "terminal_statuses": ["cancelled", "terminated", "on_hold"]
        }"#,
    )
    .unwrap();
    let config = EngineConfig::load_from_json(tmp.path()).unwrap();
    assert_eq!(config.week_start, WeekStart::Sunday);
    assert_eq!(config.default_weekly_capacity_hours, 20.0);
    assert!(config.is_terminal(TaskStatus::OnHold));
    assert!(!config.parallel);
    config.validate().unwrap();
}

#[test]
fn custom_thresholds_and_week_start_drive_the_pipeline() {
    let config = EngineConfig {
        week_start: WeekStart::Sunday,
        thresholds: capacity_forecast::UtilizationThresholds {
            moderate: 0.4,
            high: 0.6,
            overallocated: 1.0,
        },
        ..EngineConfig::default()
    };
    let snapshot = Snapshot::new(
        vec![Resource::new("r", ResourceType::Internal).with_capacity(40.0)],
        vec![Task::new("t1", d(2024, 1, 1), d(2024, 1, 5), 38.0).assigned_to("r")],
        Vec::new(),
    );
    let options = AllocationOptions::new(Horizon::weeks(d(2024, 1, 3), 1)).grouped_by(GroupBy::Resource);
    let result = compute_allocations(&snapshot, &options, &config).unwrap();

    let bucket = &result.buckets[0];
    assert_eq!(bucket.window.start, d(2023, 12, 31));
    assert_eq!(bucket.band, UtilizationBand::High);
    assert!(!bucket.overallocated);
}

#[test]
fn non_ascending_thresholds_are_rejected() {
    let mut config = EngineConfig::default();
    config.thresholds.moderate = 0.95;
    let snapshot = Snapshot::default();
    let options = AllocationOptions::new(Horizon::weeks(d(2024, 1, 1), 1));
    let err = compute_allocations(&snapshot, &options, &config).unwrap_err();
    let AllocationError::InvalidConfiguration(message) = err;
    assert!(message.contains("ascend"));
}
