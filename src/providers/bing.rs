// Wallmix - Bing daily image adapter
// Archive of recent daily images. No categories, no search, no random:
// a category filter yields an empty page without touching the network.

use async_trait::async_trait;
use serde::Deserialize;

use super::{build_url, or_empty, Popularity, ProviderAdapter};
use crate::category::Category;
use crate::constants::{
    BING_ARCHIVE_PATH, BING_BASE_URL, BING_FULL_MARKER, BING_PER_PAGE, BING_THUMB_MARKER,
};
use crate::error::ProviderError;
use crate::models::{Provider, WallpaperRecord};
use crate::transport::Fetcher;

const DEFAULT_TITLE: &str = "Bing Wallpaper";

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    #[serde(default)]
    images: Vec<BingImage>,
}

#[derive(Debug, Deserialize)]
struct BingImage {
    url: String,
    #[serde(default)]
    startdate: String,
    title: Option<String>,
    copyright: Option<String>,
}

/// Archive URL for a page, or `None` when the offset does not fit in a u32.
pub(crate) fn archive_target(page: u32) -> Option<String> {
    let idx = page.saturating_sub(1).checked_mul(BING_PER_PAGE)?;
    Some(build_url(
        &format!("{}{}", BING_BASE_URL, BING_ARCHIVE_PATH),
        &[
            ("format", "js".to_string()),
            ("idx", idx.to_string()),
            ("n", BING_PER_PAGE.to_string()),
        ],
    ))
}

/// Absolute image URL with the tracking suffix (`&rf=...`) cut off.
fn image_url(relative: &str) -> String {
    let trimmed = relative.split("&rf").next().unwrap_or(relative);
    format!("{}{}", BING_BASE_URL, trimmed)
}

pub struct BingAdapter {
    fetcher: Fetcher,
    popularity: Popularity,
}

impl BingAdapter {
    pub fn new(fetcher: Fetcher, popularity: Popularity) -> Self {
        Self { fetcher, popularity }
    }

    async fn try_fetch_page(&self, page: u32) -> Result<Vec<WallpaperRecord>, ProviderError> {
        let Some(target) = archive_target(page) else {
            log::debug!("Bing archive has no page {}", page);
            return Ok(Vec::new());
        };
        let resp: ArchiveResponse = self.fetcher.get_json(&target).await?;

        let records = resp
            .images
            .into_iter()
            .enumerate()
            .map(|(index, image)| {
                let thumbnail_url = image_url(&image.url);
                let full_url = thumbnail_url.replacen(BING_THUMB_MARKER, BING_FULL_MARKER, 1);
                let title = image
                    .title
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_TITLE.to_string());
                let (views, favorites) = self.popularity.sample();

                let mut record = WallpaperRecord::new(
                    Provider::Bing,
                    format!("bing-{}-{}", image.startdate, index),
                    title,
                    thumbnail_url.clone(),
                    full_url,
                    BING_FULL_MARKER,
                )
                .with_popularity(views, favorites)
                .with_fallbacks(vec![thumbnail_url]);
                record.copyright = image.copyright;
                record
            })
            .collect();

        Ok(records)
    }
}

#[async_trait]
impl ProviderAdapter for BingAdapter {
    fn provider(&self) -> Provider {
        Provider::Bing
    }

    async fn fetch_page(&self, page: u32, category: Option<Category>) -> Vec<WallpaperRecord> {
        if category.is_some() {
            return Vec::new();
        }
        or_empty(Provider::Bing, "browse", self.try_fetch_page(page).await)
    }
}
