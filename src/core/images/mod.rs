pub mod image_service;

pub use image_service::{
    error_placeholder_urls, ImageResult, ImageSearchError, ImageSearchProvider, ImageService,
    PlaceholderImageSearch, DEFAULT_IMAGE_COUNT,
};
