// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::{millis, now_millis, parse_uuid, schema};
use crate::backends::memory::NOTIFY_CAPACITY;
use crate::errors::StoreError;
use crate::model::{Data, InputRef, Process, ProcessRecord, Resolution};
use crate::traits::{GraphStore, WriteOutcome};

/// Graph store persisted in SQLite.
///
/// Insert notifications are delivered in-process once the insert transaction
/// has committed, so every subscriber can read the process it was told about.
pub struct SqliteGraphStore {
    pool: SqlitePool,
    notify: broadcast::Sender<Process>,
}

impl SqliteGraphStore {
    pub fn new(pool: SqlitePool) -> Self {
        let (notify, _) = broadcast::channel(NOTIFY_CAPACITY);
        Self { pool, notify }
    }

    /// Create the graph tables if they do not exist.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        schema::apply(&self.pool, schema::GRAPH_SCHEMA).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn corrupt(table: &'static str) -> impl Fn(String) -> StoreError {
    move |reason| StoreError::Corrupt { table, reason }
}

/// Rebuild the `Data` joined onto a row under the `data_id`, `spec` and `value` columns.
fn joined_data(row: &SqliteRow, table: &'static str) -> Result<Option<Data>, StoreError> {
    let Some(raw_id) = row.try_get::<Option<String>, _>("data_id")? else {
        return Ok(None);
    };
    let id = parse_uuid(&raw_id).map_err(corrupt(table))?;
    let spec: Option<String> = row.try_get("spec")?;
    let value: Option<String> = row.try_get("value")?;
    match (spec, value) {
        (Some(spec), Some(value)) => Ok(Some(Data::from_stored(id, spec, value))),
        _ => Err(StoreError::Corrupt {
            table,
            reason: format!("data {id} is referenced but missing"),
        }),
    }
}

async fn insert_data_tx(tx: &mut Transaction<'_, Sqlite>, data: &Data) -> Result<(), StoreError> {
    sqlx::query("INSERT OR IGNORE INTO data (id, spec, value) VALUES (?, ?, ?)")
        .bind(data.id().to_string())
        .bind(data.spec())
        .bind(data.value())
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[async_trait]
impl GraphStore for SqliteGraphStore {
    async fn insert_data(&self, data: &Data) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        insert_data_tx(&mut tx, data).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn insert_process(&self, process: &Process) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        for upstream in process.upstream_processes() {
            let exists = sqlx::query("SELECT 1 FROM process WHERE id = ?")
                .bind(upstream.to_string())
                .fetch_optional(&mut *tx)
                .await?
                .is_some();
            if !exists {
                return Err(StoreError::MissingUpstream {
                    process: process.id(),
                    upstream,
                });
            }
        }

        if let Some(data) = process.data() {
            insert_data_tx(&mut tx, data).await?;
        }

        let inserted = sqlx::query(
            r#"
            INSERT OR IGNORE INTO process (id, step_type, data_id, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(process.id().to_string())
        .bind(process.step_type())
        .bind(process.data().map(|d| d.id().to_string()))
        .bind(now_millis())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        for (name, input) in process.inputs() {
            let (upstream, data_id) = match input {
                InputRef::Process(id) => (Some(id.to_string()), None),
                InputRef::Data(data) => {
                    insert_data_tx(&mut tx, data).await?;
                    (None, Some(data.id().to_string()))
                }
            };
            sqlx::query(
                r#"
                INSERT INTO process_input (process_id, name, upstream_process_id, data_id)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(process.id().to_string())
            .bind(name)
            .bind(upstream)
            .bind(data_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        self.publish(process);
        Ok(true)
    }

    async fn get_process(&self, id: Uuid) -> Result<Option<ProcessRecord>, StoreError> {
        let Some(row) = sqlx::query(
            r#"
            SELECT p.step_type, p.data_id, d.spec, d.value
            FROM process p
            LEFT JOIN data d ON d.id = p.data_id
            WHERE p.id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let step_type: String = row.try_get("step_type")?;
        let data = joined_data(&row, "process")?;

        let rows = sqlx::query(
            r#"
            SELECT i.name, i.upstream_process_id, i.data_id, d.spec, d.value
            FROM process_input i
            LEFT JOIN data d ON d.id = i.data_id
            WHERE i.process_id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut inputs = BTreeMap::new();
        for row in &rows {
            let name: String = row.try_get("name")?;
            let upstream: Option<String> = row.try_get("upstream_process_id")?;
            let input = match (upstream, joined_data(row, "process_input")?) {
                (Some(raw), None) => {
                    InputRef::Process(parse_uuid(&raw).map_err(corrupt("process_input"))?)
                }
                (None, Some(data)) => InputRef::Data(data),
                _ => {
                    return Err(StoreError::Corrupt {
                        table: "process_input",
                        reason: format!("input '{name}' of {id} binds neither or both sources"),
                    })
                }
            };
            inputs.insert(name, input);
        }

        let resolution = self.get_resolution(id).await?;
        Ok(Some(ProcessRecord {
            process: Process::from_stored(id, step_type, data, inputs),
            resolution,
        }))
    }

    async fn get_resolution(&self, id: Uuid) -> Result<Option<Resolution>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT r.data_id, d.spec, d.value
            FROM resolved r
            LEFT JOIN data d ON d.id = r.data_id
            WHERE r.process_id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Resolution::from_data(id, joined_data(&row, "resolved")?))),
            None => Ok(None),
        }
    }

    async fn upsert_resolution(&self, resolution: &Resolution) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        if let Some(data) = resolution.data() {
            insert_data_tx(&mut tx, data).await?;
        }
        sqlx::query(
            r#"
            INSERT INTO resolved (process_id, data_id, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT (process_id) DO UPDATE
            SET data_id = excluded.data_id, updated_at = excluded.updated_at
            "#,
        )
        .bind(resolution.process_id().to_string())
        .bind(resolution.data().map(|d| d.id().to_string()))
        .bind(now_millis())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn store_resolution(&self, resolution: &Resolution) -> Result<WriteOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;
        if let Some(data) = resolution.data() {
            insert_data_tx(&mut tx, data).await?;
        }
        let written = sqlx::query(
            r#"
            INSERT INTO resolved (process_id, data_id, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT (process_id) DO UPDATE
            SET data_id = excluded.data_id, updated_at = excluded.updated_at
            WHERE resolved.data_id IS NULL
            "#,
        )
        .bind(resolution.process_id().to_string())
        .bind(resolution.data().map(|d| d.id().to_string()))
        .bind(now_millis())
        .execute(&mut *tx)
        .await?
        .rows_affected();
        tx.commit().await?;

        if written == 0 {
            Ok(WriteOutcome::AlreadyTerminal)
        } else {
            Ok(WriteOutcome::Written)
        }
    }

    async fn dependents(&self, id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT process_id
            FROM process_input
            WHERE upstream_process_id = ?
            ORDER BY process_id
            "#,
        )
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let raw: String = row.try_get("process_id")?;
                parse_uuid(&raw).map_err(corrupt("process_input"))
            })
            .collect()
    }

    async fn try_claim(
        &self,
        process_id: Uuid,
        owner: Uuid,
        lease: Duration,
    ) -> Result<bool, StoreError> {
        let now = now_millis();
        let claimed = sqlx::query(
            r#"
            INSERT INTO process_claim (process_id, owner, expires_at)
            VALUES (?, ?, ?)
            ON CONFLICT (process_id) DO UPDATE
            SET owner = excluded.owner, expires_at = excluded.expires_at
            WHERE process_claim.owner = excluded.owner OR process_claim.expires_at <= ?
            "#,
        )
        .bind(process_id.to_string())
        .bind(owner.to_string())
        .bind(now.saturating_add(millis(lease)))
        .bind(now)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(claimed > 0)
    }

    async fn release_claim(&self, process_id: Uuid, owner: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM process_claim WHERE process_id = ? AND owner = ?")
            .bind(process_id.to_string())
            .bind(owner.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn publish(&self, process: &Process) {
        let _ = self.notify.send(process.clone());
    }

    fn subscribe(&self) -> broadcast::Receiver<Process> {
        self.notify.subscribe()
    }
}
