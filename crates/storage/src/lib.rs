use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

use shared::domain::{LocalSiteId, Person, PersonId, Site, SiteId};

const MEMORY_URL: &str = "sqlite::memory:";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every in-memory connection is its own database.
        let max_connections = if database_url.starts_with(MEMORY_URL) { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run storage migrations")?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn upsert_site(&self, site: &Site) -> Result<()> {
        sqlx::query(
            "INSERT INTO sites (local_id, site_id, name, url)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(local_id) DO UPDATE SET site_id=excluded.site_id, name=excluded.name, url=excluded.url",
        )
        .bind(site.local_id.0)
        .bind(site.site_id.map(|id| id.0))
        .bind(&site.name)
        .bind(&site.url)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn site(&self, local_id: LocalSiteId) -> Result<Option<Site>> {
        let row = sqlx::query(
            "SELECT local_id, site_id, name, url, people_synced_at FROM sites WHERE local_id = ?",
        )
        .bind(local_id.0)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| site_from_row(&r)))
    }

    pub async fn list_sites(&self) -> Result<Vec<Site>> {
        let rows = sqlx::query(
            "SELECT local_id, site_id, name, url, people_synced_at FROM sites ORDER BY local_id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(site_from_row).collect())
    }

    /// Replaces every stored person of `local_site_id` with `people`.
    pub async fn save_people(&self, people: &[Person], local_site_id: LocalSiteId) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM people WHERE local_site_id = ?")
            .bind(local_site_id.0)
            .execute(&mut *tx)
            .await
            .context("failed to clear people for site")?;

        for person in people {
            sqlx::query(
                "INSERT INTO people (person_id, local_site_id, site_id, username, display_name, role, avatar_url)
                 VALUES (?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(person_id, local_site_id) DO UPDATE SET
                    site_id=excluded.site_id,
                    username=excluded.username,
                    display_name=excluded.display_name,
                    role=excluded.role,
                    avatar_url=excluded.avatar_url",
            )
            .bind(person.person_id.0)
            .bind(local_site_id.0)
            .bind(person.site_id.0)
            .bind(&person.username)
            .bind(&person.display_name)
            .bind(&person.role)
            .bind(&person.avatar_url)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to insert person {}", person.person_id.0))?;
        }

        sqlx::query("UPDATE sites SET people_synced_at = ? WHERE local_id = ?")
            .bind(Utc::now())
            .bind(local_site_id.0)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!(
            local_site_id = local_site_id.0,
            count = people.len(),
            "replaced people list"
        );
        Ok(())
    }

    pub async fn save_person(&self, person: &Person) -> Result<()> {
        sqlx::query(
            "INSERT INTO people (person_id, local_site_id, site_id, username, display_name, role, avatar_url)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(person_id, local_site_id) DO UPDATE SET
                site_id=excluded.site_id,
                username=excluded.username,
                display_name=excluded.display_name,
                role=excluded.role,
                avatar_url=excluded.avatar_url",
        )
        .bind(person.person_id.0)
        .bind(person.local_site_id.0)
        .bind(person.site_id.0)
        .bind(&person.username)
        .bind(&person.display_name)
        .bind(&person.role)
        .bind(&person.avatar_url)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn person(
        &self,
        person_id: PersonId,
        local_site_id: LocalSiteId,
    ) -> Result<Option<Person>> {
        let row = sqlx::query(
            "SELECT person_id, local_site_id, site_id, username, display_name, role, avatar_url
             FROM people WHERE person_id = ? AND local_site_id = ?",
        )
        .bind(person_id.0)
        .bind(local_site_id.0)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| person_from_row(&r)))
    }

    pub async fn delete_person(&self, person_id: PersonId, local_site_id: LocalSiteId) -> Result<()> {
        sqlx::query("DELETE FROM people WHERE person_id = ? AND local_site_id = ?")
            .bind(person_id.0)
            .bind(local_site_id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn list_people(&self, local_site_id: LocalSiteId) -> Result<Vec<Person>> {
        let rows = sqlx::query(
            "SELECT person_id, local_site_id, site_id, username, display_name, role, avatar_url
             FROM people
             WHERE local_site_id = ?
             ORDER BY lower(display_name) ASC, person_id ASC",
        )
        .bind(local_site_id.0)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(person_from_row).collect())
    }

    pub async fn people_synced_at(&self, local_site_id: LocalSiteId) -> Result<Option<DateTime<Utc>>> {
        let row = sqlx::query("SELECT people_synced_at FROM sites WHERE local_id = ?")
            .bind(local_site_id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.and_then(|r| r.get::<Option<DateTime<Utc>>, _>(0)))
    }
}

fn site_from_row(r: &SqliteRow) -> Site {
    Site {
        local_id: LocalSiteId(r.get::<i64, _>("local_id")),
        site_id: r.get::<Option<i64>, _>("site_id").map(SiteId),
        name: r.get::<String, _>("name"),
        url: r.get::<String, _>("url"),
        people_synced_at: r.get::<Option<DateTime<Utc>>, _>("people_synced_at"),
    }
}

fn person_from_row(r: &SqliteRow) -> Person {
    Person {
        person_id: PersonId(r.get::<i64, _>("person_id")),
        local_site_id: LocalSiteId(r.get::<i64, _>("local_site_id")),
        site_id: SiteId(r.get::<i64, _>("site_id")),
        username: r.get::<String, _>("username"),
        display_name: r.get::<String, _>("display_name"),
        role: r.get::<String, _>("role"),
        avatar_url: r.get::<Option<String>, _>("avatar_url"),
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with(MEMORY_URL) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
