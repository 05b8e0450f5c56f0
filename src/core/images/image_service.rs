use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of images returned when the caller does not ask for a count.
pub const DEFAULT_IMAGE_COUNT: usize = 3;

#[derive(Debug, Error)]
pub enum ImageSearchError {
    #[error("Image search request failed: {0}")]
    Request(String),
    #[error("Image search API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Could not read image search response: {0}")]
    InvalidResponse(String),
}

/// One image hit, independent of the search backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResult {
    pub url: Option<String>,
    pub title: Option<String>,
    pub context_url: Option<String>,
    pub thumbnail: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ImageResult {
    /// A result is usable only when it has both an image and a thumbnail.
    pub fn is_usable(&self) -> bool {
        let present = |value: &Option<String>| value.as_deref().is_some_and(|s| !s.is_empty());
        present(&self.url) && present(&self.thumbnail)
    }
}

#[async_trait]
pub trait ImageSearchProvider: Send + Sync {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<ImageResult>, ImageSearchError>;
}

#[async_trait]
impl ImageSearchProvider for Box<dyn ImageSearchProvider> {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<ImageResult>, ImageSearchError> {
        (**self).search(query, count).await
    }
}

/// Fixed sample images, used when no search credentials are configured.
pub struct PlaceholderImageSearch;

const SAMPLE_COLORS: [(&str, &str); 3] = [
    ("0000FF", "808080"),
    ("FF0000", "FFFFFF"),
    ("00FF00", "000000"),
];

#[async_trait]
impl ImageSearchProvider for PlaceholderImageSearch {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<ImageResult>, ImageSearchError> {
        let slug = query.replace(' ', "+");

        Ok(SAMPLE_COLORS
            .iter()
            .enumerate()
            .take(count)
            .map(|(i, (background, foreground))| {
                let n = i + 1;
                ImageResult {
                    url: Some(format!(
                        "https://via.placeholder.com/150/{background}/{foreground}?text=Sample+{slug}+{n}"
                    )),
                    title: Some(format!("Sample Image {} for {}", n, query)),
                    context_url: Some("https://example.com".to_string()),
                    thumbnail: Some(format!(
                        "https://via.placeholder.com/50/{background}/{foreground}?text=S{n}"
                    )),
                    width: Some(150),
                    height: Some(150),
                }
            })
            .collect())
    }
}

/// Red "Error" placeholders shown when a search fails.
pub fn error_placeholder_urls(term: &str, count: usize) -> Vec<String> {
    let safe_term: String = term.replace(' ', "-").chars().take(20).collect();
    (1..=count)
        .map(|n| format!("https://via.placeholder.com/150/FF0000/FFFFFF?text=Error+{n}+{safe_term}"))
        .collect()
}

pub struct ImageService<P: ImageSearchProvider> {
    provider: P,
}

impl<P: ImageSearchProvider> ImageService<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// URLs of the usable results for `term`, at most `count` of them.
    pub async fn image_urls(&self, term: &str, count: usize) -> Result<Vec<String>, ImageSearchError> {
        let results = self.provider.search(term, count).await?;
        let urls: Vec<String> = results
            .into_iter()
            .filter(ImageResult::is_usable)
            .filter_map(|result| result.url)
            .take(count)
            .collect();

        tracing::debug!(term, found = urls.len(), "Image search finished");
        Ok(urls)
    }
}
