use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Creates the single relation backing every entity table, if missing.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS table_entities (
            table_name    TEXT        NOT NULL,
            partition_key TEXT        NOT NULL,
            row_key       TEXT        NOT NULL,
            data          JSONB       NOT NULL,
            updated_at    TIMESTAMPTZ NOT NULL DEFAULT now(),
            PRIMARY KEY (table_name, partition_key, row_key)
        )
        "#,
    )
    .execute(pool)
    .await?;

    info!("table_entities schema ready");
    Ok(())
}
