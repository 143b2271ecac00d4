use super::{SnapshotStore, validate_snapshot};
use crate::error::{PersistenceError, PersistenceResult};
use crate::resource::{Resource, Team};
use crate::snapshot::Snapshot;
use crate::task::Task;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::{Mutex, MutexGuard};

/// Stores the latest snapshot, one JSON document per row. Saving replaces the previous one.
pub struct SqliteSnapshotStore {
    connection: Mutex<Connection>,
}

impl SqliteSnapshotStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS snapshot_meta (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                saved_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS resources (
                position INTEGER PRIMARY KEY,
                id TEXT NOT NULL UNIQUE,
                resource_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS tasks (
                position INTEGER PRIMARY KEY,
                id TEXT NOT NULL,
                task_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS teams (
                position INTEGER PRIMARY KEY,
                id TEXT NOT NULL UNIQUE,
                team_json TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn lock(&self) -> PersistenceResult<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| PersistenceError::InvalidData("sqlite connection lock poisoned".into()))
    }

    fn replace_rows<T: Serialize>(
        tx: &Transaction,
        table: &str,
        json_column: &str,
        rows: impl Iterator<Item = (String, T)>,
    ) -> PersistenceResult<()> {
        tx.execute(&format!("DELETE FROM {table}"), [])?;
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {table} (position, id, {json_column}) VALUES (?1, ?2, ?3)"
        ))?;
        for (position, (id, row)) in rows.enumerate() {
            let json = serde_json::to_string(&row)?;
            stmt.execute(params![position as i64, id, json])?;
        }
        Ok(())
    }

    fn load_rows<T: DeserializeOwned>(
        conn: &Connection,
        table: &str,
        json_column: &str,
    ) -> PersistenceResult<Vec<T>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {json_column} FROM {table} ORDER BY position ASC"
        ))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut items = Vec::new();
        for json in rows {
            let json = json?;
            items.push(serde_json::from_str(&json)?);
        }
        Ok(items)
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn save_snapshot(&self, snapshot: &Snapshot) -> PersistenceResult<()> {
        validate_snapshot(snapshot)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        Self::replace_rows(
            &tx,
            "resources",
            "resource_json",
            snapshot.resources.iter().map(|r| (r.id.clone(), r)),
        )?;
        Self::replace_rows(
            &tx,
            "tasks",
            "task_json",
            snapshot.tasks.iter().map(|t| (t.id.clone(), t)),
        )?;
        Self::replace_rows(
            &tx,
            "teams",
            "team_json",
            snapshot.teams.iter().map(|t| (t.id.clone(), t)),
        )?;
        tx.execute("DELETE FROM snapshot_meta", [])?;
        tx.execute(
            "INSERT INTO snapshot_meta (id, saved_at) VALUES (1, datetime('now'))",
            [],
        )?;
        tx.commit()?;
        tracing::debug!(
            resources = snapshot.resources.len(),
            tasks = snapshot.tasks.len(),
            teams = snapshot.teams.len(),
            "snapshot saved"
        );
        Ok(())
    }

    fn load_snapshot(&self) -> PersistenceResult<Option<Snapshot>> {
        let conn = self.lock()?;

        let saved_at: Option<String> = conn
            .query_row("SELECT saved_at FROM snapshot_meta WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;
        if saved_at.is_none() {
            return Ok(None);
        }

        let resources: Vec<Resource> = Self::load_rows(&conn, "resources", "resource_json")?;
        let tasks: Vec<Task> = Self::load_rows(&conn, "tasks", "task_json")?;
        let teams: Vec<Team> = Self::load_rows(&conn, "teams", "team_json")?;

        let snapshot = Snapshot::new(resources, tasks, teams);
        validate_snapshot(&snapshot)?;
        Ok(Some(snapshot))
    }
}
