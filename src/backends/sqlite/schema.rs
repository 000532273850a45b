// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use sqlx::SqlitePool;

/// Graph tables. A `resolved` row with NULL `data_id` is an explicit Pending.
pub(crate) const GRAPH_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS data (
        id TEXT PRIMARY KEY,
        spec TEXT NOT NULL,
        value TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS process (
        id TEXT PRIMARY KEY,
        step_type TEXT NOT NULL,
        data_id TEXT REFERENCES data(id),
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS process_input (
        process_id TEXT NOT NULL REFERENCES process(id),
        name TEXT NOT NULL,
        upstream_process_id TEXT REFERENCES process(id),
        data_id TEXT REFERENCES data(id),
        PRIMARY KEY (process_id, name),
        CHECK ((upstream_process_id IS NULL) <> (data_id IS NULL))
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS process_input_upstream
        ON process_input (upstream_process_id)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS resolved (
        process_id TEXT PRIMARY KEY REFERENCES process(id),
        data_id TEXT REFERENCES data(id),
        updated_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS process_claim (
        process_id TEXT PRIMARY KEY,
        owner TEXT NOT NULL,
        expires_at INTEGER NOT NULL
    )
    "#,
];

pub(crate) const QUEUE_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS job (
        id TEXT PRIMARY KEY,
        queue TEXT NOT NULL,
        process_id TEXT NOT NULL,
        state TEXT NOT NULL,
        attempt INTEGER NOT NULL DEFAULT 0,
        retry_limit INTEGER NOT NULL,
        start_after INTEGER NOT NULL,
        expire_at INTEGER,
        last_error TEXT,
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS job_fetch
        ON job (queue, state, start_after)
    "#,
];

pub(crate) async fn apply(pool: &SqlitePool, statements: &[&str]) -> Result<(), sqlx::Error> {
    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
