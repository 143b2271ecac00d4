use crate::resource::{Resource, Team};
use crate::task::Task;
use serde::{Deserialize, Serialize};

/// The read-only input of one computation. Callers may cache a snapshot; the engine
/// never mutates it and never caches anything derived from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub resources: Vec<Resource>,
    pub tasks: Vec<Task>,
    pub teams: Vec<Team>,
}

impl Snapshot {
    pub fn new(resources: Vec<Resource>, tasks: Vec<Task>, teams: Vec<Team>) -> Self {
        Self {
            resources,
            tasks,
            teams,
        }
    }

    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.iter().find(|resource| resource.id == id)
    }

    pub fn team(&self, id: &str) -> Option<&Team> {
        self.teams.iter().find(|team| team.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.tasks.is_empty() && self.teams.is_empty()
    }
}
