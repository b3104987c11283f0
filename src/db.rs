use crate::config::Config;
use anyhow::Result;
use libsql::{Builder, Connection, Database as LibsqlDatabase};
use std::path::Path;
use std::time::Duration;

/// Path that opens an ephemeral in-process database instead of a file.
pub const IN_MEMORY: &str = ":memory:";

const SYSTEM_MIGRATIONS: &[(&str, &str)] =
    &[("system/000_migrations_table.sql", include_str!("migrations/system/000_migrations_table.sql"))];

pub struct Database {
    _db: LibsqlDatabase,
    conn: Connection,
}

impl Database {
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    async fn is_migration_applied(conn: &Connection, name: &str) -> Result<bool> {
        let query = "SELECT 1 FROM _migrations WHERE name = ?";
        match conn.query(query, libsql::params![name]).await {
            Ok(mut rows) => Ok(rows.next().await?.is_some()),
            Err(e) => {
                if e.to_string().contains("no such table") {
                    Ok(false)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn record_migration(conn: &Connection, name: &str) -> Result<()> {
        let query = r#"
            INSERT INTO _migrations (name, applied_at)
            VALUES (?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        "#;
        conn.execute(query, libsql::params![name]).await?;
        Ok(())
    }

    async fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
        if Self::is_migration_applied(conn, name).await? {
            tracing::debug!("migration {} already applied, skipping", name);
            return Ok(());
        }

        tracing::info!("applying migration: {}", name);
        conn.execute_batch(sql)
            .await
            .map_err(|e| anyhow::anyhow!("failed to execute migration {name}: {e}"))?;

        Self::record_migration(conn, name).await?;
        Ok(())
    }

    /// Opens the database named in the config, relative to `data_dir`.
    pub async fn new(cfg: &Config, data_dir: &Path) -> Result<Self> {
        if cfg.app.get_db() == IN_MEMORY {
            return Self::open_local(IN_MEMORY).await;
        }

        let turso_url = cfg.app.turso_url.clone();
        let turso_auth_token = cfg.app.turso_auth_token.clone();

        let path = data_dir.join(cfg.app.get_db());
        let db = match (&turso_url, &turso_auth_token) {
            (Some(url), Some(token)) => {
                tracing::info!("[db] running in synced database mode (offline writes)");
                let sync_interval = Duration::from_secs(cfg.app.sync_interval_seconds);
                Builder::new_synced_database(&path, url.clone(), token.clone())
                    .sync_interval(sync_interval)
                    .build()
                    .await?
            }
            _ => {
                tracing::info!(path = ?path, "[db] running in local database mode");
                Builder::new_local(&path).build().await?
            }
        };

        Self::setup(db).await
    }

    pub async fn open_local(path: impl AsRef<Path>) -> Result<Self> {
        let db = Builder::new_local(path).build().await?;
        Self::setup(db).await
    }

    async fn setup(db: LibsqlDatabase) -> Result<Self> {
        let conn = db.connect()?;
        conn.query("SELECT 1", ()).await?;

        for (filename, sql) in SYSTEM_MIGRATIONS {
            Self::run_migration(&conn, filename, sql).await?;
        }

        for (filename, sql) in crate::library::migrations() {
            Self::run_migration(&conn, filename, sql).await?;
        }

        Ok(Database { _db: db, conn })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn applied_migrations(db: &Database) -> Vec<String> {
        let mut rows = db
            .connection()
            .query("SELECT name FROM _migrations ORDER BY id", ())
            .await
            .unwrap();
        let mut names = vec![];
        while let Some(row) = rows.next().await.unwrap() {
            names.push(row.get::<String>(0).unwrap());
        }
        names
    }

    #[tokio::test]
    async fn setup_records_every_migration() {
        let db = Database::open_local(IN_MEMORY).await.unwrap();
        let names = applied_migrations(&db).await;
        assert_eq!(names[0], "system/000_migrations_table.sql");
        assert_eq!(names.len(), SYSTEM_MIGRATIONS.len() + crate::library::migrations().len());
    }

    #[tokio::test]
    async fn migrations_are_applied_once() {
        let db = Database::open_local(IN_MEMORY).await.unwrap();
        for (filename, sql) in crate::library::migrations() {
            Database::run_migration(db.connection(), filename, sql).await.unwrap();
        }
        let names = applied_migrations(&db).await;
        assert_eq!(names.len(), SYSTEM_MIGRATIONS.len() + crate::library::migrations().len());
    }

    #[tokio::test]
    async fn file_database_lives_in_the_data_dir_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::parse("app:\n  database: books.db\n").unwrap();

        let id = {
            let db = Database::new(&cfg, dir.path()).await.unwrap();
            let shelf = crate::library::Bookshelf::new(db.connection());
            shelf.create_book("Persistent").await.unwrap().id
        };
        assert!(dir.path().join("books.db").exists());

        let db = Database::new(&cfg, dir.path()).await.unwrap();
        let shelf = crate::library::Bookshelf::new(db.connection());
        let book = shelf.get_book(&id).await.unwrap().unwrap();
        assert_eq!(book.title, "Persistent");

        let names = applied_migrations(&db).await;
        assert_eq!(names.len(), SYSTEM_MIGRATIONS.len() + crate::library::migrations().len());
    }
}
