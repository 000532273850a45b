// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use uuid::Uuid;

use super::{millis, now_millis, parse_uuid, schema};
use crate::errors::QueueError;
use crate::traits::{Job, JobQueue, JobState, QueuePolicy};

/// Durable job queue stored in the `job` table.
///
/// Fetching is a single `UPDATE ... RETURNING`, so two workers can never be
/// handed the same job. Acks only touch the row while it is still active at
/// the acking delivery's attempt, so a worker whose lease expired cannot
/// overwrite the redelivery.
pub struct SqliteJobQueue {
    pool: SqlitePool,
    policy: QueuePolicy,
    started: AtomicBool,
}

impl SqliteJobQueue {
    pub fn new(pool: SqlitePool, policy: QueuePolicy) -> Self {
        Self {
            pool,
            policy,
            started: AtomicBool::new(false),
        }
    }

    fn ensure_started(&self) -> Result<(), QueueError> {
        if self.started.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(QueueError::NotStarted)
        }
    }

    pub async fn job_state(&self, id: Uuid) -> Result<Option<JobState>, QueueError> {
        let row = sqlx::query("SELECT state FROM job WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(row.try_get::<String, _>("state")?.parse()?)),
            None => Ok(None),
        }
    }
}

fn job_from_row(row: &SqliteRow) -> Result<Job, QueueError> {
    let id: String = row.try_get("id")?;
    let process_id: String = row.try_get("process_id")?;
    let attempt: i64 = row.try_get("attempt")?;
    Ok(Job {
        id: parse_uuid(&id).map_err(QueueError::Corrupt)?,
        queue: row.try_get("queue")?,
        process_id: parse_uuid(&process_id).map_err(QueueError::Corrupt)?,
        attempt: u32::try_from(attempt)
            .map_err(|_| QueueError::Corrupt(format!("job {id} has attempt {attempt}")))?,
    })
}

#[async_trait]
impl JobQueue for SqliteJobQueue {
    async fn start(&self) -> Result<(), QueueError> {
        schema::apply(&self.pool, schema::QUEUE_SCHEMA).await?;
        self.started.store(true, Ordering::Release);
        Ok(())
    }

    async fn send(&self, queue: &str, process_id: Uuid) -> Result<Uuid, QueueError> {
        self.ensure_started()?;
        let id = Uuid::new_v4();
        let now = now_millis();
        sqlx::query(
            r#"
            INSERT INTO job (id, queue, process_id, state, attempt, retry_limit, start_after, created_at)
            VALUES (?, ?, ?, 'created', 0, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(queue)
        .bind(process_id.to_string())
        .bind(i64::from(self.policy.retry_limit))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn fetch(&self, queue: &str) -> Result<Option<Job>, QueueError> {
        self.ensure_started()?;
        let now = now_millis();

        sqlx::query(
            r#"
            UPDATE job
            SET state = 'failed', expire_at = NULL, last_error = 'lease expired'
            WHERE queue = ? AND state = 'active' AND expire_at <= ? AND attempt > retry_limit
            "#,
        )
        .bind(queue)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(
            r#"
            UPDATE job
            SET state = 'active', attempt = attempt + 1, expire_at = ?
            WHERE id = (
                SELECT id FROM job
                WHERE queue = ?
                  AND ((state = 'created' AND start_after <= ?)
                    OR (state = 'active' AND expire_at <= ?))
                ORDER BY created_at, rowid
                LIMIT 1
            )
            RETURNING id, queue, process_id, attempt
            "#,
        )
        .bind(now.saturating_add(millis(self.policy.lease)))
        .bind(queue)
        .bind(now)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(job_from_row).transpose()
    }

    async fn complete(&self, job: &Job) -> Result<(), QueueError> {
        self.ensure_started()?;
        sqlx::query(
            r#"
            UPDATE job
            SET state = 'completed', expire_at = NULL
            WHERE id = ? AND state = 'active' AND attempt = ?
            "#,
        )
        .bind(job.id.to_string())
        .bind(i64::from(job.attempt))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fail(&self, job: &Job, reason: &str) -> Result<(), QueueError> {
        self.ensure_started()?;
        sqlx::query(
            r#"
            UPDATE job
            SET state = CASE WHEN attempt > retry_limit THEN 'failed' ELSE 'created' END,
                expire_at = NULL,
                last_error = ?,
                start_after = ?
            WHERE id = ? AND state = 'active' AND attempt = ?
            "#,
        )
        .bind(reason)
        .bind(now_millis().saturating_add(millis(self.policy.retry_delay)))
        .bind(job.id.to_string())
        .bind(i64::from(job.attempt))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn release(&self, job: &Job, delay: Duration) -> Result<(), QueueError> {
        self.ensure_started()?;
        sqlx::query(
            r#"
            UPDATE job
            SET state = 'created', attempt = MAX(attempt - 1, 0), expire_at = NULL, start_after = ?
            WHERE id = ? AND state = 'active' AND attempt = ?
            "#,
        )
        .bind(now_millis().saturating_add(millis(delay)))
        .bind(job.id.to_string())
        .bind(i64::from(job.attempt))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
