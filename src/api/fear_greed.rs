use crate::models::FearGreedReading;
use reqwest::Client;
use serde::Deserialize;

pub const FEAR_GREED_API: &str = "https://api.alternative.me/fng/";

/// Source of the market sentiment index
///
/// A missing reading is not an error: the pipeline continues without it.
#[allow(async_fn_in_trait)]
pub trait SentimentSource {
    async fn current_reading(&self) -> Option<FearGreedReading>;
}

#[derive(Debug, Deserialize)]
struct FearGreedResponse {
    #[serde(default)]
    data: Vec<FearGreedReading>,
}

/// Client for the alternative.me Fear & Greed index
#[derive(Clone)]
pub struct FearGreedClient {
    client: Client,
    url: String,
}

impl FearGreedClient {
    pub fn new() -> Self {
        Self::with_url(FEAR_GREED_API)
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

impl Default for FearGreedClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentSource for FearGreedClient {
    /// Fetch the current index value
    ///
    /// Non-200 responses, transport errors and unparseable bodies are logged
    /// and yield `None`.
    async fn current_reading(&self) -> Option<FearGreedReading> {
        let response = match self.client.get(&self.url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Failed to fetch Fear and Greed Index: {}", e);
                return None;
            }
        };

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            tracing::warn!(
                "Failed to fetch Fear and Greed Index. Status code: {}",
                status.as_u16()
            );
            return None;
        }

        match response.json::<FearGreedResponse>().await {
            Ok(body) => body.data.into_iter().next(),
            Err(e) => {
                tracing::warn!("Failed to parse Fear and Greed Index: {}", e);
                None
            }
        }
    }
}
