use std::future::Future;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use snafu::{ResultExt, ensure};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Connection, FromRow, SqliteConnection, SqlitePool};

use super::KeyValueStore;
use super::error::{
    CreateSqliteDirectorySnafu, InMemoryDatabaseSnafu, InvariantViolationSnafu, SqliteConnectOptionsSnafu,
    SqliteConnectSnafu, SqliteMigrateSnafu, SqlitePragmaSnafu, SqliteQuerySnafu,
    SqliteRuntimeInitSnafu, SqliteThreadSpawnSnafu, StorageResult,
};
use super::types::{KvEntry, KvWrite, ensure_valid_batch, ensure_valid_key};

#[derive(Debug, Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
    database_url: String,
}

#[derive(Debug, FromRow)]
struct KvRow {
    key: String,
    value: String,
    updated_at: i64,
}

impl SqliteStorage {
    /// Opens (and migrates) a file-backed database. In-memory locations are
    /// rejected because every call connects afresh and would see an empty database.
    pub async fn open(database_location: &str) -> StorageResult<Self> {
        ensure!(
            !is_in_memory_location(database_location),
            InMemoryDatabaseSnafu {
                stage: "sqlite-open-check-location",
                database_location: database_location.to_string(),
            }
        );
        ensure_database_directory(database_location)?;

        let database_url = normalize_database_url(database_location);
        let connect_options = SqliteConnectOptions::from_str(&database_url)
            .context(SqliteConnectOptionsSnafu {
                stage: "sqlite-open-parse-url",
                database_url: database_url.clone(),
            })?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_millis(5_000));

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(connect_options)
            .await
            .context(SqliteConnectSnafu {
                stage: "sqlite-open-connect",
                database_url: database_url.clone(),
            })?;

        let _: String = sqlx::query_scalar("PRAGMA journal_mode = WAL;")
            .fetch_one(&pool)
            .await
            .context(SqlitePragmaSnafu {
                stage: "sqlite-open-pragma-journal-mode",
                pragma: "journal_mode",
            })?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context(SqliteMigrateSnafu {
                stage: "sqlite-open-migrate",
            })?;

        tracing::debug!(database_url = %database_url, "sqlite key-value store ready");
        Ok(Self { pool, database_url })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    fn run_db_call<T, F>(&self, stage: &'static str, op: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: Future<Output = StorageResult<T>> + Send + 'static,
    {
        // Store traits are sync, so each call executes on a dedicated worker thread
        // with its own current-thread runtime to avoid nested-runtime blocking panics.
        let worker = std::thread::Builder::new()
            .name(format!("sqlite-kv-{stage}"))
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .context(SqliteRuntimeInitSnafu {
                        stage: "sqlite-kv-runtime-build",
                    })?;
                runtime.block_on(op)
            })
            .context(SqliteThreadSpawnSnafu {
                stage: "sqlite-kv-spawn-worker",
            })?;

        match worker.join() {
            Ok(result) => result,
            Err(_) => InvariantViolationSnafu {
                stage,
                details: "sqlite storage worker thread panicked".to_string(),
            }
            .fail(),
        }
    }
}

impl KeyValueStore for SqliteStorage {
    fn get_entry(&self, key: &str) -> StorageResult<Option<KvEntry>> {
        ensure_valid_key(key, "kv-get")?;
        let database_url = self.database_url.clone();
        let key = key.to_string();
        self.run_db_call("kv-get", async move {
            let mut connection = connect_store_connection(&database_url, "kv-get-connect").await?;
            let row = sqlx::query_as::<_, KvRow>(
                "SELECT key, value, updated_at FROM kv_entries WHERE key = ?",
            )
            .bind(key)
            .fetch_optional(&mut connection)
            .await
            .context(SqliteQuerySnafu {
                stage: "kv-get-query",
            })?;

            row.map(kv_row_to_entry).transpose()
        })
    }

    fn apply_batch(&self, writes: Vec<KvWrite>) -> StorageResult<()> {
        ensure_valid_batch(&writes, "kv-apply-batch")?;
        if writes.is_empty() {
            return Ok(());
        }

        let database_url = self.database_url.clone();
        let write_count = writes.len();
        self.run_db_call("kv-apply-batch", async move {
            let mut connection =
                connect_store_connection(&database_url, "kv-apply-batch-connect").await?;
            let mut tx = connection.begin().await.context(SqliteQuerySnafu {
                stage: "kv-apply-batch-begin",
            })?;
            let now = unix_timestamp_seconds();

            for write in writes {
                match write {
                    KvWrite::Put { key, value } => {
                        sqlx::query(
                            "INSERT INTO kv_entries (key, value, updated_at) VALUES (?, ?, ?) \
                             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                        )
                        .bind(key)
                        .bind(value)
                        .bind(now)
                        .execute(&mut *tx)
                        .await
                        .context(SqliteQuerySnafu {
                            stage: "kv-apply-batch-put",
                        })?;
                    }
                    KvWrite::Delete { key } => {
                        sqlx::query("DELETE FROM kv_entries WHERE key = ?")
                            .bind(key)
                            .execute(&mut *tx)
                            .await
                            .context(SqliteQuerySnafu {
                                stage: "kv-apply-batch-delete",
                            })?;
                    }
                }
            }

            tx.commit().await.context(SqliteQuerySnafu {
                stage: "kv-apply-batch-commit",
            })?;

            Ok(())
        })?;

        tracing::trace!(write_count, "sqlite storage batch applied");
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let database_url = self.database_url.clone();
        self.run_db_call("kv-keys", async move {
            let mut connection = connect_store_connection(&database_url, "kv-keys-connect").await?;
            sqlx::query_scalar::<_, String>("SELECT key FROM kv_entries ORDER BY key")
                .fetch_all(&mut connection)
                .await
                .context(SqliteQuerySnafu {
                    stage: "kv-keys-query",
                })
        })
    }
}

async fn connect_store_connection(
    database_url: &str,
    stage: &'static str,
) -> StorageResult<SqliteConnection> {
    let mut connection =
        SqliteConnection::connect(database_url)
            .await
            .context(SqliteConnectSnafu {
                stage,
                database_url: database_url.to_string(),
            })?;

    sqlx::query("PRAGMA busy_timeout = 5000;")
        .execute(&mut connection)
        .await
        .context(SqlitePragmaSnafu {
            stage: "sqlite-kv-pragma-busy-timeout",
            pragma: "busy_timeout",
        })?;

    Ok(connection)
}

fn kv_row_to_entry(row: KvRow) -> StorageResult<KvEntry> {
    let updated_at_unix_seconds =
        row.updated_at
            .try_into()
            .map_err(|_| super::error::StorageError::InvariantViolation {
                stage: "kv-row-updated-at",
                details: format!(
                    "negative sqlite timestamp '{}' for key '{}'",
                    row.updated_at, row.key
                ),
            })?;

    Ok(KvEntry {
        key: row.key,
        value: row.value,
        updated_at_unix_seconds,
    })
}

fn unix_timestamp_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0_i64, |duration| duration.as_secs() as i64)
}

fn ensure_database_directory(database_location: &str) -> StorageResult<()> {
    if database_location.starts_with("sqlite:") {
        return Ok(());
    }

    let path = Path::new(database_location);
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).context(CreateSqliteDirectorySnafu {
            stage: "sqlite-open-create-directory",
            path: parent.display().to_string(),
        })?;
    }

    Ok(())
}

fn is_in_memory_location(database_location: &str) -> bool {
    database_location == ":memory:"
        || database_location.starts_with("sqlite::memory:")
        || database_location.contains("mode=memory")
}

fn normalize_database_url(database_location: &str) -> String {
    if database_location.starts_with("sqlite:") {
        return database_location.to_string();
    }

    format!("sqlite://{database_location}")
}
