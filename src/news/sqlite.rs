use crate::models::NewsHeadline;
use crate::news::NewsSource;
use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;

const LATEST_HEADLINES_QUERY: &str = r#"
    SELECT CAST(title AS TEXT) AS title, CAST(published_date AS TEXT) AS published_date
    FROM crypto_news
    WHERE crypto_type = ?
    ORDER BY published_date DESC
    LIMIT ?
"#;

/// News store backed by the `crypto_news` SQLite table
///
/// Expected columns: `title`, `published_date`, `crypto_type`.
pub struct SqliteNewsStore {
    pool: SqlitePool,
}

impl SqliteNewsStore {
    /// Open the database read-only on first query
    ///
    /// # Arguments
    /// * `database_url` - SQLite URL (e.g., "sqlite://Crypto_news.db")
    ///
    /// A missing or unreadable file surfaces on each `latest_headlines` call
    /// instead of at startup.
    pub fn connect_lazy(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.read_only(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_lazy_with(options);

        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl NewsSource for SqliteNewsStore {
    async fn latest_headlines(&self, asset_tag: &str, limit: u32) -> Result<Vec<NewsHeadline>> {
        let rows = sqlx::query(LATEST_HEADLINES_QUERY)
            .bind(asset_tag)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        let mut headlines = Vec::with_capacity(rows.len());
        for row in rows {
            let title: Option<String> = row.try_get("title")?;
            let date: Option<String> = row.try_get("published_date")?;
            headlines.push(NewsHeadline {
                title: title.unwrap_or_default(),
                date: date.unwrap_or_default(),
            });
        }

        tracing::debug!("Loaded {} {} headlines", headlines.len(), asset_tag);

        Ok(headlines)
    }
}
