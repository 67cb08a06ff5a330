use async_trait::async_trait;
use bp_core::{Error, NewPost, Post, PostStorage, Result};
use chrono::{SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::{Path, PathBuf};

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS posts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        url TEXT NOT NULL UNIQUE,
        title TEXT,
        image TEXT,
        content TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS posts_created_at ON posts (created_at)
    "#,
];

pub struct SQLiteStorage {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::Database(format!("Failed to create {}: {}", parent.display(), e))
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| Error::Database(format!("Failed to connect to database: {}", e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Database(format!("Failed to run migration {}: {}", i, e)))?;
        }

        Ok(Self {
            pool,
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }
}

fn post_from_row(row: &SqliteRow) -> Result<Post> {
    let created_at: String = row
        .try_get("created_at")
        .map_err(|e| Error::Database(e.to_string()))?;
    let created_at = chrono::DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| Error::Database(format!("Failed to parse date: {}", e)))?
        .with_timezone(&Utc);

    let column = |e: sqlx::Error| Error::Database(e.to_string());
    Ok(Post {
        id: row.try_get("id").map_err(column)?,
        url: row.try_get("url").map_err(column)?,
        title: row.try_get("title").map_err(column)?,
        image: row.try_get("image").map_err(column)?,
        content: row.try_get("content").map_err(column)?,
        created_at,
    })
}

#[async_trait]
impl PostStorage for SQLiteStorage {
    async fn exists(&self, url: &str) -> Result<bool> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM posts WHERE url = ?) AS found")
            .bind(url)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to check post: {}", e)))?;
        let found: i64 = row
            .try_get("found")
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(found != 0)
    }

    async fn create(&self, post: NewPost) -> Result<Post> {
        let created_at = Utc::now();
        // Micros keeps the stored strings fixed-width so they sort chronologically.
        let stamp = created_at.to_rfc3339_opts(SecondsFormat::Micros, true);

        let result = sqlx::query(
            r#"
            INSERT INTO posts (url, title, image, content, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.url)
        .bind(post.title.as_deref())
        .bind(post.image.as_deref())
        .bind(&post.content)
        .bind(&stamp)
        .execute(&self.pool)
        .await;

        let result = match result {
            Ok(result) => result,
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(Error::DuplicateKey(post.url));
            }
            Err(e) => return Err(Error::Database(format!("Failed to store post: {}", e))),
        };

        let row = sqlx::query("SELECT * FROM posts WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to read back post: {}", e)))?;
        post_from_row(&row)
    }

    async fn latest(&self) -> Result<Vec<Post>> {
        let rows = sqlx::query("SELECT * FROM posts ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to list posts: {}", e)))?;

        rows.iter().map(post_from_row).collect()
    }

    async fn get(&self, id: i64) -> Result<Option<Post>> {
        let row = sqlx::query("SELECT * FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to get post {}: {}", id, e)))?;

        row.as_ref().map(post_from_row).transpose()
    }
}
