use crate::error::{LocError, Result};
use crate::model::{CommitBoundary, FileDelta, LogRecord, SCHEMA_VERSION};
use crate::parse::BoundaryFormat;
use chrono::{TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const KIND_BOUNDARY: i64 = 0;
const KIND_DELTA: i64 = 1;
const KIND_BINARY: i64 = 2;

pub struct Cache {
    conn: Connection,
}

impl Cache {
    pub fn new<CP: AsRef<Path>, RP: AsRef<Path>>(cache_path: Option<CP>, repo_path: RP) -> Result<Self> {
        let cache_dir = match cache_path {
            Some(path) => path.as_ref().to_path_buf(),
            None => repo_path.as_ref().join(".lochist"),
        };
        std::fs::create_dir_all(&cache_dir)?;
        let db_path = cache_dir.join("cache.db");
        let conn = Connection::open(&db_path)?;
        let mut cache = Self { conn };
        cache.initialize()?;
        Ok(cache)
    }

    pub fn in_memory() -> Result<Self> {
        let mut cache = Self {
            conn: Connection::open_in_memory()?,
        };
        cache.initialize()?;
        Ok(cache)
    }

    fn initialize(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS streams (
                branch TEXT NOT NULL,
                format TEXT NOT NULL,
                head TEXT NOT NULL,
                stored_at INTEGER NOT NULL,
                PRIMARY KEY (branch, format)
            );
            CREATE TABLE IF NOT EXISTS records (
                branch TEXT NOT NULL,
                format TEXT NOT NULL,
                seq INTEGER NOT NULL,
                kind INTEGER NOT NULL,
                ordinal INTEGER,
                timestamp INTEGER,
                commit_id TEXT,
                path TEXT,
                added INTEGER,
                removed INTEGER,
                PRIMARY KEY (branch, format, seq)
            );
            ",
        )?;
        self.check_schema_version()?;
        Ok(())
    }

    fn check_schema_version(&mut self) -> Result<()> {
        let user_version: i64 = self
            .conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))?;

        if user_version == 0 {
            let set_stmt = format!("PRAGMA user_version = {SCHEMA_VERSION};");
            self.conn.execute_batch(&set_stmt)?;
        } else if user_version != SCHEMA_VERSION as i64 {
            return Err(LocError::Cache(format!(
                "Schema version mismatch: expected {}, found {}",
                SCHEMA_VERSION, user_version
            )));
        }

        Ok(())
    }

    /// Cached stream for `branch`, if it was stored while the branch pointed at `head`.
    pub fn load(
        &self,
        branch: &str,
        format: BoundaryFormat,
        head: &str,
    ) -> Result<Option<Vec<LogRecord>>> {
        let stored_head: Option<String> = self
            .conn
            .query_row(
                "SELECT head FROM streams WHERE branch = ? AND format = ?",
                params![branch, format.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        match stored_head {
            Some(h) if h == head => {}
            _ => return Ok(None),
        }

        let mut stmt = self.conn.prepare(
            "SELECT kind, ordinal, timestamp, commit_id, path, added, removed
             FROM records WHERE branch = ? AND format = ? ORDER BY seq",
        )?;
        let rows = stmt.query_map(params![branch, format.as_str()], |row| {
            let kind: i64 = row.get(0)?;
            let ordinal: Option<i64> = row.get(1)?;
            let ts: Option<i64> = row.get(2)?;
            let commit_id: Option<String> = row.get(3)?;
            let path: Option<String> = row.get(4)?;
            let added: Option<i64> = row.get(5)?;
            let removed: Option<i64> = row.get(6)?;
            Ok((kind, ordinal, ts, commit_id, path, added, removed))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (kind, ordinal, ts, commit_id, path, added, removed) = row?;
            let record = match (kind, path) {
                (KIND_BOUNDARY, _) => {
                    let timestamp = match ts {
                        Some(secs) => Some(Utc.timestamp_opt(secs, 0).single().ok_or_else(
                            || LocError::Cache(format!("invalid cached timestamp {secs}")),
                        )?),
                        None => None,
                    };
                    LogRecord::Boundary(CommitBoundary {
                        ordinal: ordinal.unwrap_or_default() as u64,
                        timestamp,
                        id: commit_id,
                    })
                }
                (KIND_DELTA, Some(path)) => LogRecord::Delta(FileDelta {
                    added: added.unwrap_or_default() as u64,
                    removed: removed.unwrap_or_default() as u64,
                    path,
                }),
                (KIND_BINARY, Some(path)) => LogRecord::Binary { path },
                (other, _) => {
                    return Err(LocError::Cache(format!("corrupt cached record of kind {other}")))
                }
            };
            records.push(record);
        }

        log::debug!("loaded {} cached records for {branch}", records.len());
        Ok(Some(records))
    }

    pub fn store(
        &mut self,
        branch: &str,
        format: BoundaryFormat,
        head: &str,
        records: &[LogRecord],
    ) -> Result<()> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "DELETE FROM records WHERE branch = ? AND format = ?",
            params![branch, format.as_str()],
        )?;
        tx.execute(
            "INSERT OR REPLACE INTO streams (branch, format, head, stored_at) VALUES (?, ?, ?, ?)",
            params![branch, format.as_str(), head, Utc::now().timestamp()],
        )?;

        {
            let mut insert = tx.prepare(
                "INSERT INTO records (branch, format, seq, kind, ordinal, timestamp, commit_id, path, added, removed)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )?;
            for (seq, record) in records.iter().enumerate() {
                let seq = seq as i64;
                match record {
                    LogRecord::Boundary(b) => insert.execute(params![
                        branch,
                        format.as_str(),
                        seq,
                        KIND_BOUNDARY,
                        b.ordinal as i64,
                        b.timestamp.map(|t| t.timestamp()),
                        b.id,
                        None::<String>,
                        None::<i64>,
                        None::<i64>
                    ])?,
                    LogRecord::Delta(d) => insert.execute(params![
                        branch,
                        format.as_str(),
                        seq,
                        KIND_DELTA,
                        None::<i64>,
                        None::<i64>,
                        None::<String>,
                        d.path,
                        d.added as i64,
                        d.removed as i64
                    ])?,
                    LogRecord::Binary { path } => insert.execute(params![
                        branch,
                        format.as_str(),
                        seq,
                        KIND_BINARY,
                        None::<i64>,
                        None::<i64>,
                        None::<String>,
                        path,
                        None::<i64>,
                        None::<i64>
                    ])?,
                };
            }
        }

        tx.commit()?;
        log::debug!("cached {} records for {branch} at {head}", records.len());
        Ok(())
    }
}
