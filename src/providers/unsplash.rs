// Wallmix - Unsplash adapter
// Uses the public web API (no key) through the relay. Categories are passed
// as a plain search keyword.

use async_trait::async_trait;
use serde::Deserialize;

use super::{build_url, or_empty, ProviderAdapter};
use crate::category::Category;
use crate::constants::{UNSPLASH_API_URL, UNSPLASH_DEFAULT_QUERY, UNSPLASH_PER_PAGE};
use crate::error::{ProviderError, Result};
use crate::models::{Provider, WallpaperRecord};
use crate::transport::Fetcher;

const DEFAULT_TITLE: &str = "Unsplash Wallpaper";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RandomResponse {
    One(Photo),
    Many(Vec<Photo>),
}

#[derive(Debug, Deserialize)]
struct Photo {
    id: String,
    description: Option<String>,
    #[serde(default)]
    urls: Urls,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    views: Option<u64>,
    likes: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct Urls {
    #[serde(default)]
    full: String,
    #[serde(default)]
    regular: String,
    #[serde(default)]
    small: String,
}

impl Photo {
    /// `thumbnail` picks which size is shown while the full image loads.
    fn into_record(self, thumbnail: fn(&Urls) -> &String) -> WallpaperRecord {
        let title = self
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        let fallbacks = vec![self.urls.regular.clone(), self.urls.small.clone()];

        WallpaperRecord::new(
            Provider::Unsplash,
            self.id,
            title,
            thumbnail(&self.urls).clone(),
            self.urls.full.clone(),
            format!("{}x{}", self.width, self.height),
        )
        .with_popularity(self.views.unwrap_or(0), self.likes.unwrap_or(0))
        .with_fallbacks(fallbacks)
    }
}

fn small(urls: &Urls) -> &String {
    &urls.small
}

fn regular(urls: &Urls) -> &String {
    &urls.regular
}

pub(crate) fn search_target(query: &str, page: u32) -> String {
    build_url(
        &format!("{}/search/photos", UNSPLASH_API_URL),
        &[
            ("query", query.to_string()),
            ("per_page", UNSPLASH_PER_PAGE.to_string()),
            ("page", page.to_string()),
        ],
    )
}

pub(crate) fn random_target() -> String {
    build_url(
        &format!("{}/photos/random", UNSPLASH_API_URL),
        &[("orientation", "landscape".to_string()), ("count", "1".to_string())],
    )
}

pub struct UnsplashAdapter {
    fetcher: Fetcher,
}

impl UnsplashAdapter {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    async fn try_search(
        &self,
        query: &str,
        page: u32,
    ) -> std::result::Result<Vec<WallpaperRecord>, ProviderError> {
        let resp: SearchResponse = self.fetcher.get_json(&search_target(query, page)).await?;
        Ok(resp.results.into_iter().map(|p| p.into_record(small)).collect())
    }
}

#[async_trait]
impl ProviderAdapter for UnsplashAdapter {
    fn provider(&self) -> Provider {
        Provider::Unsplash
    }

    async fn fetch_page(&self, page: u32, category: Option<Category>) -> Vec<WallpaperRecord> {
        let query = category.map(|c| c.as_str()).unwrap_or(UNSPLASH_DEFAULT_QUERY);
        or_empty(Provider::Unsplash, "browse", self.try_search(query, page).await)
    }

    fn supports_search(&self) -> bool {
        true
    }

    async fn search(&self, query: &str) -> Vec<WallpaperRecord> {
        or_empty(Provider::Unsplash, "search", self.try_search(query, 1).await)
    }

    async fn fetch_random(&self) -> Result<WallpaperRecord> {
        let resp: RandomResponse = self.fetcher.get_json(&random_target()).await?;
        let photo = match resp {
            RandomResponse::One(photo) => photo,
            RandomResponse::Many(photos) => photos.into_iter().next().ok_or(ProviderError::Empty)?,
        };
        Ok(photo.into_record(regular))
    }
}
