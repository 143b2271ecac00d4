use capacity_forecast::{
    AllocationOptions, EngineConfig, GroupBy, GroupKey, Horizon, MediaType, MediaTypeFilter,
    RankBy, Resource, ResourceFilter, ResourceType, Snapshot, Task, compute_allocations,
};
use chrono::NaiveDate;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn roster() -> Snapshot {
    let resources = vec![
        Resource::new("ana", ResourceType::Internal)
            .with_capacity(40.0)
            .with_team("studio")
            .with_media_type(MediaType::Video),
        Resource::new("ben", ResourceType::Agency)
            .with_capacity(40.0)
            .with_team("studio"),
        Resource::new("cy", ResourceType::Freelancer)
            .with_capacity(20.0)
            .with_media_type(MediaType::Print),
        Resource::new("dee", ResourceType::Internal).with_capacity(40.0),
    ];
    let tasks = vec![
        Task::new("t1", d(2024, 1, 1), d(2024, 1, 5), 38.0).assigned_to("ana"),
        Task::new("t2", d(2024, 1, 1), d(2024, 1, 5), 10.0).assigned_to("ben"),
        Task::new("t3", d(2024, 1, 1), d(2024, 1, 5), 10.0).assigned_to("cy"),
        Task::new("t4", d(2024, 1, 1), d(2024, 1, 5), 20.0).assigned_to("dee"),
        Task::new("t5", d(2024, 1, 1), d(2024, 1, 5), 12.0),
    ];
    Snapshot::new(resources, tasks, Vec::new())
}

fn per_resource() -> AllocationOptions {
    AllocationOptions::new(Horizon::weeks(d(2024, 1, 1), 1)).grouped_by(GroupBy::Resource)
}

fn labels(options: &AllocationOptions) -> Vec<String> {
    compute_allocations(&roster(), options, &EngineConfig::default())
        .unwrap()
        .buckets
        .into_iter()
        .map(|bucket| bucket.label)
        .collect()
}

#[test]
fn resource_type_filter_limits_scope() {
    let options = per_resource().with_filters(ResourceFilter {
        resource_type: Some(ResourceType::Internal),
        ..ResourceFilter::default()
    });
    assert_eq!(labels(&options), vec!["ana", "dee"]);
}

#[test]
fn unspecified_media_selects_resources_without_one() {
    let options = per_resource().with_filters(ResourceFilter {
        media_type: Some(MediaTypeFilter::Unspecified),
        ..ResourceFilter::default()
    });
    assert_eq!(labels(&options), vec!["ben", "dee"]);
}

#[test]
fn team_filter_drops_unassigned_work() {
    let options = per_resource()
        .including_unassigned()
        .with_filters(ResourceFilter {
            team_id: Some("studio".into()),
            ..ResourceFilter::default()
        });
    let result = compute_allocations(&roster(), &options, &EngineConfig::default()).unwrap();
    assert!(result.buckets.iter().all(|b| b.group != GroupKey::UnassignedWork));
    assert!((result.total_allocated_hours() - 48.0).abs() < 1e-9);
}

#[test]
fn filter_matching_nothing_is_empty_not_an_error() {
    let options = per_resource().with_filters(ResourceFilter {
        team_id: Some("nobody".into()),
        ..ResourceFilter::default()
    });
    let result = compute_allocations(&roster(), &options, &EngineConfig::default()).unwrap();
    assert!(result.buckets.is_empty());
    assert_eq!(result.summary.total_allocated_hours, 0.0);
    assert_eq!(result.summary.resources_in_scope, 0);
}

#[test]
fn overallocated_only_keeps_flagged_buckets() {
    let options = per_resource().with_filters(ResourceFilter {
        overallocated_only: true,
        ..ResourceFilter::default()
    });
    let result = compute_allocations(&roster(), &options, &EngineConfig::default()).unwrap();
    assert_eq!(result.buckets.len(), 1);
    assert_eq!(result.buckets[0].label, "ana");
    // The summary still describes the whole scope
    assert_eq!(result.summary.resources_in_scope, 4);
}

#[test]
fn ranking_breaks_ties_by_label() {
    // cy (10/20) and dee (20/40) tie at 0.5
    let desc = per_resource().ranked(RankBy::UtilizationDesc, None);
    assert_eq!(labels(&desc), vec!["ana", "cy", "dee", "ben"]);

    let asc = per_resource().ranked(RankBy::UtilizationAsc, None);
    assert_eq!(labels(&asc), vec!["ben", "cy", "dee", "ana"]);
}

#[test]
fn top_k_is_bounded_by_available_buckets() {
    assert_eq!(labels(&per_resource().ranked(RankBy::UtilizationDesc, Some(2))).len(), 2);
    assert_eq!(labels(&per_resource().ranked(RankBy::UtilizationDesc, Some(50))).len(), 4);
    assert!(labels(&per_resource().ranked(RankBy::UtilizationDesc, Some(0))).is_empty());
}

#[test]
fn grouping_by_media_type_has_an_unspecified_bucket() {
    let options = AllocationOptions::new(Horizon::weeks(d(2024, 1, 1), 1)).grouped_by(GroupBy::MediaType);
    let result = compute_allocations(&roster(), &options, &EngineConfig::default()).unwrap();
    let unspecified = result
        .buckets
        .iter()
        .find(|b| b.group == GroupKey::UnspecifiedMedia)
        .unwrap();
    assert_eq!(unspecified.label, "Unspecified");
    assert_eq!(unspecified.member_count, 2);
    assert!((unspecified.allocated_hours - 30.0).abs() < 1e-9);
}

#[test]
fn grouping_by_team_collects_teamless_resources() {
    let options = AllocationOptions::new(Horizon::weeks(d(2024, 1, 1), 1)).grouped_by(GroupBy::Team);
    let result = compute_allocations(&roster(), &options, &EngineConfig::default()).unwrap();
    let groups: Vec<&GroupKey> = result.buckets.iter().map(|b| &b.group).collect();
    // "studio" is not in the snapshot's teams, so everyone lands in one group
    assert_eq!(groups, vec![&GroupKey::UnassignedTeam]);
    assert_eq!(result.buckets[0].member_count, 4);
}

#[test]
fn per_window_capacity_exposes_a_single_week_spike() {
    let snapshot = Snapshot::new(
        vec![Resource::new("r1", ResourceType::Internal).with_capacity(40.0)],
        vec![Task::new("spike", d(2024, 1, 15), d(2024, 1, 19), 60.0).assigned_to("r1")],
        Vec::new(),
    );
    let options =
        AllocationOptions::new(Horizon::weeks(d(2024, 1, 1), 4)).grouped_by(GroupBy::Resource);

    let result = compute_allocations(&snapshot, &options, &EngineConfig::default()).unwrap();
    let flags: Vec<bool> = result.buckets.iter().map(|b| b.overallocated).collect();
    assert_eq!(flags, vec![false, false, true, false]);

    let only_flagged = options.with_filters(ResourceFilter {
        overallocated_only: true,
        ..ResourceFilter::default()
    });
    let result = compute_allocations(&snapshot, &only_flagged, &EngineConfig::default()).unwrap();
    assert_eq!(result.buckets.len(), 1);
    assert_eq!(result.buckets[0].window.start, d(2024, 1, 15));
}

#[test]
fn resources_sharing_a_name_rank_by_id() {
    let snapshot = Snapshot::new(
        vec![
            Resource::new("r2", ResourceType::Internal).with_name("Sam").with_capacity(40.0),
            Resource::new("r1", ResourceType::Freelancer).with_name("Sam").with_capacity(40.0),
        ],
        vec![
            Task::new("a", d(2024, 1, 1), d(2024, 1, 5), 20.0).assigned_to("r2"),
            Task::new("b", d(2024, 1, 1), d(2024, 1, 5), 20.0).assigned_to("r1"),
        ],
        Vec::new(),
    );

    for rank_by in [RankBy::UtilizationDesc, RankBy::UtilizationAsc] {
        let options = per_resource().ranked(rank_by, None);
        let result = compute_allocations(&snapshot, &options, &EngineConfig::default()).unwrap();
        let groups: Vec<&GroupKey> = result.buckets.iter().map(|b| &b.group).collect();
        assert_eq!(
            groups,
            vec![&GroupKey::Resource("r1".to_string()), &GroupKey::Resource("r2".to_string())]
        );
    }
}
