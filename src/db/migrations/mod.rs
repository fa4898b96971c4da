use anyhow::Result;
use sqlx::{Executor, PgPool};
use tracing::info;

/// Schema migrations, applied in order. Every statement is idempotent.
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "001_create_cameras.sql",
        include_str!("sql/001_create_cameras.sql"),
    ),
    (
        "002_create_incidents.sql",
        include_str!("sql/002_create_incidents.sql"),
    ),
    ("003_add_indexes.sql", include_str!("sql/003_add_indexes.sql")),
];

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    for (name, sql) in MIGRATIONS {
        execute_migration(pool, name, sql).await?;
    }

    Ok(())
}

async fn execute_migration(pool: &PgPool, name: &str, sql: &str) -> Result<()> {
    pool.execute(sql).await?;
    info!("Applied migration: {}", name);
    Ok(())
}
