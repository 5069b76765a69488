// Read-only access to the local crypto news database
pub mod sqlite;

pub use sqlite::SqliteNewsStore;

use crate::models::NewsHeadline;
use crate::Result;

/// Most recent headlines for an asset, newest first
#[allow(async_fn_in_trait)]
pub trait NewsSource {
    async fn latest_headlines(&self, asset_tag: &str, limit: u32) -> Result<Vec<NewsHeadline>>;
}
