// Google Custom Search JSON API, image mode.
// See: https://developers.google.com/custom-search/v1/reference/rest/v1/cse/list

use crate::core::images::{ImageResult, ImageSearchError, ImageSearchProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Sample key shipped in `.env.example`; treated as "not configured".
pub const SAMPLE_API_KEY: &str = "your-google-search-api-key";

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct ImageMeta {
    context_link: Option<String>,
    thumbnail_link: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: Option<String>,
    title: Option<String>,
    #[serde(default)]
    image: ImageMeta,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

impl From<SearchItem> for ImageResult {
    fn from(item: SearchItem) -> Self {
        ImageResult {
            url: item.link,
            title: item.title,
            context_url: item.image.context_link,
            thumbnail: item.image.thumbnail_link,
            width: item.image.width,
            height: item.image.height,
        }
    }
}

pub struct GoogleImageSearchClient {
    client: Client,
    api_key: String,
    engine_id: String,
}

impl GoogleImageSearchClient {
    pub fn new(api_key: String, engine_id: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            engine_id,
        }
    }

    /// True when both credentials are present and not the sample placeholder.
    pub fn is_configured(api_key: Option<&str>, engine_id: Option<&str>) -> bool {
        match (api_key, engine_id) {
            (Some(key), Some(cx)) => {
                !key.trim().is_empty() && !cx.trim().is_empty() && key != SAMPLE_API_KEY
            }
            _ => false,
        }
    }

    fn parse_items(response: SearchResponse) -> Vec<ImageResult> {
        response
            .items
            .into_iter()
            .map(ImageResult::from)
            .filter(ImageResult::is_usable)
            .collect()
    }
}

#[async_trait]
impl ImageSearchProvider for GoogleImageSearchClient {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<ImageResult>, ImageSearchError> {
        let num = count.clamp(1, 10).to_string();

        let response = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("searchType", "image"),
                ("num", num.as_str()),
                ("safe", "active"),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| ImageSearchError::Request(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Image search request rejected");
            return Err(ImageSearchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let decoded: SearchResponse = response
            .json()
            .await
            .map_err(|e| ImageSearchError::InvalidResponse(e.without_url().to_string()))?;

        Ok(Self::parse_items(decoded))
    }
}
