use crate::error::{PersistenceError, PersistenceResult};
use crate::snapshot::Snapshot;
use std::collections::HashSet;

pub trait SnapshotStore {
    fn save_snapshot(&self, snapshot: &Snapshot) -> PersistenceResult<()>;
    fn load_snapshot(&self) -> PersistenceResult<Option<Snapshot>>;
}

/// Structural checks on a snapshot before it is stored or handed to the engine:
/// non-empty, unique resource and team ids. Task-level problems are left to the
/// engine, which reports them as warnings instead of rejecting the snapshot.
pub fn validate_snapshot(snapshot: &Snapshot) -> PersistenceResult<()> {
    let mut resource_ids = HashSet::with_capacity(snapshot.resources.len());
    for resource in &snapshot.resources {
        if resource.id.trim().is_empty() {
            return Err(PersistenceError::InvalidData(
                "resource with an empty id".to_string(),
            ));
        }
        if !resource_ids.insert(resource.id.as_str()) {
            return Err(PersistenceError::InvalidData(format!(
                "duplicate resource id {}",
                resource.id
            )));
        }
    }

    let mut team_ids = HashSet::with_capacity(snapshot.teams.len());
    for team in &snapshot.teams {
        if team.id.trim().is_empty() {
            return Err(PersistenceError::InvalidData(
                "team with an empty id".to_string(),
            ));
        }
        if !team_ids.insert(team.id.as_str()) {
            return Err(PersistenceError::InvalidData(format!(
                "duplicate team id {}",
                team.id
            )));
        }
    }

    if let Some(task) = snapshot.tasks.iter().find(|task| task.id.trim().is_empty()) {
        return Err(PersistenceError::InvalidData(format!(
            "task with an empty id (name: {})",
            task.name.as_deref().unwrap_or("<none>")
        )));
    }
    Ok(())
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    export_result_to_csv, export_result_to_json, load_snapshot_from_csv, load_snapshot_from_json,
    save_snapshot_to_json,
};
