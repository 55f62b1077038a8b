// Wallmix - Alphacoders adapter
// No API: search and featured pages are scraped through the relay.
// The scrape is tied to the site's thumbnail markup. When the markup
// changes the pattern stops matching and pages come back empty; that is
// reported as an ordinary empty result.

use async_trait::async_trait;
use rand::Rng;
use regex::Regex;

use super::{build_url, or_empty, Popularity, ProviderAdapter};
use crate::category::Category;
use crate::constants::{
    ALPHACODERS_BASE_URL, ALPHACODERS_DEFAULT_QUERY, ALPHACODERS_NUMBER_PATTERN,
    ALPHACODERS_RANDOM_MAX_PAGE, ALPHACODERS_THUMB_MARKER, ALPHACODERS_THUMB_PATTERN,
};
use crate::error::{ProviderError, Result};
use crate::models::{Provider, WallpaperRecord};
use crate::transport::Fetcher;

const DEFAULT_TITLE: &str = "Wallpaper";
const RESOLUTION: &str = "HD";

/// One scraped thumbnail block
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedThumb {
    pub thumbnail_url: String,
    pub title: String,
    /// Wallpaper number from the thumbnail file name, when present
    pub number: Option<String>,
}

impl ScrapedThumb {
    /// Full-size URL: the thumbnail URL without its size marker.
    pub fn full_url(&self) -> String {
        self.thumbnail_url.replacen(ALPHACODERS_THUMB_MARKER, "", 1)
    }

    /// `alphacoders-{number}`, or `positional` when the URL carries no number.
    fn record_id(&self, positional: String) -> String {
        match &self.number {
            Some(number) => format!("alphacoders-{}", number),
            None => positional,
        }
    }

    fn display_title(&self) -> String {
        if self.title.trim().is_empty() {
            DEFAULT_TITLE.to_string()
        } else {
            self.title.clone()
        }
    }
}

/// Extract (thumbnail, title) pairs in document order.
pub fn scrape_thumbnails(html: &str) -> std::result::Result<Vec<ScrapedThumb>, ProviderError> {
    let re = Regex::new(ALPHACODERS_THUMB_PATTERN)
        .map_err(|e| ProviderError::Parse(format!("thumbnail pattern: {}", e)))?;
    let number_re = Regex::new(ALPHACODERS_NUMBER_PATTERN)
        .map_err(|e| ProviderError::Parse(format!("number pattern: {}", e)))?;

    Ok(re
        .captures_iter(html)
        .map(|cap| {
            let thumbnail_url = cap[1].to_string();
            let number = number_re
                .captures(&thumbnail_url)
                .map(|n| n[1].to_string());
            ScrapedThumb {
                thumbnail_url,
                title: cap[2].to_string(),
                number,
            }
        })
        .collect())
}

pub(crate) fn search_target(query: &str, page: Option<u32>) -> String {
    let mut params = vec![("search", query.to_string())];
    if let Some(page) = page {
        params.push(("page", page.to_string()));
    }
    build_url(&format!("{}/search.php", ALPHACODERS_BASE_URL), &params)
}

pub(crate) fn featured_target(page: u32) -> String {
    build_url(
        &format!("{}/featured.php", ALPHACODERS_BASE_URL),
        &[("page", page.to_string())],
    )
}

pub struct AlphacodersAdapter {
    fetcher: Fetcher,
    popularity: Popularity,
}

impl AlphacodersAdapter {
    pub fn new(fetcher: Fetcher, popularity: Popularity) -> Self {
        Self { fetcher, popularity }
    }

    fn to_record(
        &self,
        thumb: &ScrapedThumb,
        positional_id: String,
        fallbacks: Vec<String>,
    ) -> WallpaperRecord {
        let (views, favorites) = self.popularity.sample();
        WallpaperRecord::new(
            Provider::Alphacoders,
            thumb.record_id(positional_id),
            thumb.display_title(),
            thumb.thumbnail_url.clone(),
            thumb.full_url(),
            RESOLUTION,
        )
        .with_popularity(views, favorites)
        .with_fallbacks(fallbacks)
    }

    async fn scrape(&self, target: &str) -> std::result::Result<Vec<ScrapedThumb>, ProviderError> {
        let html = self.fetcher.get_text(target).await?;
        scrape_thumbnails(&html)
    }

    async fn try_fetch_page(
        &self,
        page: u32,
        category: Option<Category>,
    ) -> std::result::Result<Vec<WallpaperRecord>, ProviderError> {
        let query = category.map(|c| c.as_str()).unwrap_or(ALPHACODERS_DEFAULT_QUERY);
        let thumbs = self.scrape(&search_target(query, Some(page))).await?;
        Ok(thumbs
            .iter()
            .enumerate()
            .map(|(index, thumb)| {
                self.to_record(
                    thumb,
                    format!("alphacoders-{}-{}", page, index),
                    vec![thumb.thumbnail_url.clone()],
                )
            })
            .collect())
    }

    async fn try_search(
        &self,
        query: &str,
    ) -> std::result::Result<Vec<WallpaperRecord>, ProviderError> {
        let thumbs = self.scrape(&search_target(query, None)).await?;
        Ok(thumbs
            .iter()
            .enumerate()
            .map(|(index, thumb)| {
                self.to_record(
                    thumb,
                    format!("alphacoders-search-{}", index),
                    vec![thumb.thumbnail_url.clone()],
                )
            })
            .collect())
    }
}

#[async_trait]
impl ProviderAdapter for AlphacodersAdapter {
    fn provider(&self) -> Provider {
        Provider::Alphacoders
    }

    async fn fetch_page(&self, page: u32, category: Option<Category>) -> Vec<WallpaperRecord> {
        or_empty(Provider::Alphacoders, "browse", self.try_fetch_page(page, category).await)
    }

    fn supports_search(&self) -> bool {
        true
    }

    async fn search(&self, query: &str) -> Vec<WallpaperRecord> {
        or_empty(Provider::Alphacoders, "search", self.try_search(query).await)
    }

    async fn fetch_random(&self) -> Result<WallpaperRecord> {
        let page = rand::thread_rng().gen_range(1..=ALPHACODERS_RANDOM_MAX_PAGE);
        let thumbs = self.scrape(&featured_target(page)).await?;
        if thumbs.is_empty() {
            return Err(ProviderError::Empty.into());
        }

        let index = rand::thread_rng().gen_range(0..thumbs.len());
        let thumb = &thumbs[index];
        Ok(self.to_record(
            thumb,
            format!("alphacoders-random-{}", index),
            vec![thumb.thumbnail_url.clone(), thumb.full_url()],
        ))
    }
}
