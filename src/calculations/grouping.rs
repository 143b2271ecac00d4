use crate::calculations::windows::WindowedAllocations;
use crate::calendar::TimeWindow;
use crate::resource::{MediaType, Resource, ResourceType, Team};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    #[default]
    None,
    Resource,
    Team,
    MediaType,
    ResourceType,
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "none" | "global" => Ok(GroupBy::None),
            "resource" => Ok(GroupBy::Resource),
            "team" => Ok(GroupBy::Team),
            "media_type" | "media" | "mediatype" => Ok(GroupBy::MediaType),
            "resource_type" | "type" | "resourcetype" => Ok(GroupBy::ResourceType),
            other => Err(format!("unknown group_by '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityMode {
    /// One bucket per group per window.
    #[default]
    PerWindow,
    /// One bucket per group spanning the whole horizon.
    HorizonTotal,
}

impl FromStr for CapacityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "per_window" | "window" => Ok(CapacityMode::PerWindow),
            "horizon_total" | "horizon" | "total" => Ok(CapacityMode::HorizonTotal),
            other => Err(format!("unknown capacity mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum GroupKey {
    All,
    Resource(String),
    Team(String),
    /// Resources without a (known) team.
    UnassignedTeam,
    MediaType(MediaType),
    /// Resources without a media type.
    UnspecifiedMedia,
    ResourceType(ResourceType),
    /// Work on tasks nobody is assigned to.
    UnassignedWork,
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::All => f.write_str("all"),
            GroupKey::Resource(id) => write!(f, "resource:{id}"),
            GroupKey::Team(id) => write!(f, "team:{id}"),
            GroupKey::UnassignedTeam => f.write_str("team:unassigned"),
            GroupKey::MediaType(media) => write!(f, "media:{media}"),
            GroupKey::UnspecifiedMedia => f.write_str("media:unspecified"),
            GroupKey::ResourceType(kind) => write!(f, "type:{kind}"),
            GroupKey::UnassignedWork => f.write_str("unassigned_work"),
        }
    }
}

/// Allocated and available hours of one group over one window.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTotals {
    pub group: GroupKey,
    pub label: String,
    pub window: TimeWindow,
    pub allocated_hours: f64,
    pub capacity_hours: f64,
    pub member_count: usize,
}

pub struct GroupingContext<'a> {
    pub resources: &'a [&'a Resource],
    pub teams: &'a [Team],
    pub default_weekly_capacity: f64,
}

struct Group<'a> {
    label: String,
    members: Vec<&'a Resource>,
}

fn group_key_for(
    resource: &Resource,
    group_by: GroupBy,
    team_names: &HashMap<&str, &str>,
) -> (GroupKey, String) {
    match group_by {
        GroupBy::None => (GroupKey::All, "All resources".to_string()),
        GroupBy::Resource => (
            GroupKey::Resource(resource.id.clone()),
            resource.display_name().to_string(),
        ),
        GroupBy::Team => match resource.team_id.as_deref() {
            Some(team_id) => match team_names.get(team_id) {
                Some(name) => (GroupKey::Team(team_id.to_string()), name.to_string()),
                None => {
                    tracing::debug!(resource_id = %resource.id, team_id, "team not in snapshot, grouping as unassigned");
                    (GroupKey::UnassignedTeam, "Unassigned".to_string())
                }
            },
            None => (GroupKey::UnassignedTeam, "Unassigned".to_string()),
        },
        GroupBy::MediaType => match resource.media_type {
            Some(media) => (GroupKey::MediaType(media), media.label().to_string()),
            None => (GroupKey::UnspecifiedMedia, "Unspecified".to_string()),
        },
        GroupBy::ResourceType => (
            GroupKey::ResourceType(resource.resource_type),
            resource.resource_type.label().to_string(),
        ),
    }
}

/// Rolls per-resource windowed hours into groups. Only groups with at least one member
/// appear; members with no allocation still count towards capacity.
pub fn group_allocations(
    windowed: &WindowedAllocations,
    context: &GroupingContext<'_>,
    group_by: GroupBy,
    capacity_mode: CapacityMode,
    include_unassigned: bool,
) -> Vec<GroupTotals> {
    let team_names: HashMap<&str, &str> = context
        .teams
        .iter()
        .map(|team| (team.id.as_str(), team.name.as_str()))
        .collect();

    let mut groups: BTreeMap<GroupKey, Group<'_>> = BTreeMap::new();
    for &resource in context.resources {
        let (key, label) = group_key_for(resource, group_by, &team_names);
        groups
            .entry(key)
            .or_insert_with(|| Group {
                label,
                members: Vec::new(),
            })
            .members
            .push(resource);
    }

    let windows = windowed.windows();
    let mut totals = Vec::new();
    for (key, group) in groups {
        let weekly_capacity: f64 = group
            .members
            .iter()
            .map(|member| member.weekly_capacity(context.default_weekly_capacity))
            .sum();
        let per_window: Vec<(f64, f64)> = windows
            .iter()
            .enumerate()
            .map(|(idx, window)| {
                let allocated = group
                    .members
                    .iter()
                    .map(|member| windowed.hours(&member.id, idx))
                    .sum();
                (allocated, weekly_capacity * window.week_fraction())
            })
            .collect();
        emit(
            &mut totals,
            key,
            &group.label,
            windows,
            &per_window,
            group.members.len(),
            capacity_mode,
        );
    }

    if include_unassigned {
        let per_window: Vec<(f64, f64)> = windowed
            .unassigned()
            .iter()
            .map(|hours| (*hours, 0.0))
            .collect();
        emit(
            &mut totals,
            GroupKey::UnassignedWork,
            "Unassigned work",
            windows,
            &per_window,
            0,
            capacity_mode,
        );
    }

    totals
}

fn emit(
    totals: &mut Vec<GroupTotals>,
    key: GroupKey,
    label: &str,
    windows: &[TimeWindow],
    per_window: &[(f64, f64)],
    member_count: usize,
    capacity_mode: CapacityMode,
) {
    match capacity_mode {
        CapacityMode::PerWindow => {
            for (window, (allocated, capacity)) in windows.iter().zip(per_window) {
                totals.push(GroupTotals {
                    group: key.clone(),
                    label: label.to_string(),
                    window: window.clone(),
                    allocated_hours: *allocated,
                    capacity_hours: *capacity,
                    member_count,
                });
            }
        }
        CapacityMode::HorizonTotal => {
            let (Some(first), Some(last)) = (windows.first(), windows.last()) else {
                return;
            };
            totals.push(GroupTotals {
                group: key,
                label: label.to_string(),
                window: TimeWindow::custom(first.start, last.end),
                allocated_hours: per_window.iter().map(|(allocated, _)| allocated).sum(),
                capacity_hours: per_window.iter().map(|(_, capacity)| capacity).sum(),
                member_count,
            });
        }
    }
}
