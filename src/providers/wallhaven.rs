// Wallmix - Wallhaven adapter
// JSON search API, reached through the relay. The only provider that
// understands categories natively (keywords, category and purity bitmasks).

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

use super::{build_url, or_empty, ProviderAdapter};
use crate::category::Category;
use crate::constants::*;
use crate::error::{ProviderError, Result};
use crate::models::{Provider, WallpaperRecord};
use crate::transport::Fetcher;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<WallhavenWallpaper>,
}

#[derive(Debug, Deserialize)]
struct WallhavenWallpaper {
    id: String,
    #[serde(default)]
    path: String,
    #[serde(default)]
    resolution: String,
    category: Option<String>,
    #[serde(default)]
    views: u64,
    #[serde(default)]
    favorites: u64,
    #[serde(default)]
    thumbs: Thumbs,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbs {
    #[serde(default)]
    large: String,
    #[serde(default)]
    original: String,
}

impl WallhavenWallpaper {
    fn into_record(self) -> WallpaperRecord {
        WallpaperRecord::new(
            Provider::Wallhaven,
            self.id.clone(),
            format!("Wallpaper {}", self.id),
            self.thumbs.large,
            self.path,
            self.resolution,
        )
        .with_category(self.category)
        .with_popularity(self.views, self.favorites)
    }
}

/// Ordered parameter list with URLSearchParams-style `set`.
#[derive(Debug, Default)]
struct Params(Vec<(&'static str, String)>);

impl Params {
    fn set(&mut self, key: &'static str, value: impl Into<String>) {
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    fn into_vec(self) -> Vec<(&'static str, String)> {
        self.0
    }
}

/// Query parameters for one browse page.
pub(crate) fn browse_params(page: u32, category: Option<Category>) -> Vec<(&'static str, String)> {
    let mut params = Params::default();
    params.set("page", page.to_string());
    params.set("categories", WALLHAVEN_DEFAULT_CATEGORIES);
    params.set("purity", WALLHAVEN_DEFAULT_PURITY);
    params.set("q", "");
    params.set("sorting", WALLHAVEN_DEFAULT_SORTING);
    params.set("order", "desc");
    params.set("topRange", WALLHAVEN_TOP_RANGE);

    if let Some(category) = category {
        let modifier = category.modifier();
        if let Some(terms) = modifier.query_terms {
            params.set("q", terms);
        }
        if let Some(bits) = modifier.categories {
            params.set("categories", bits);
        }
        if let Some(bits) = modifier.purity {
            params.set("purity", bits);
        }
        if let Some(sorting) = modifier.sorting {
            params.set("sorting", sorting);
        }
    }

    params.set("atleast", WALLHAVEN_MIN_RESOLUTION);
    params.set("ratios", WALLHAVEN_RATIOS);
    params.into_vec()
}

fn random_params(page: u32) -> Vec<(&'static str, String)> {
    vec![
        ("page", page.to_string()),
        ("categories", WALLHAVEN_DEFAULT_CATEGORIES.to_string()),
        ("purity", WALLHAVEN_DEFAULT_PURITY.to_string()),
        ("sorting", "random".to_string()),
        ("atleast", WALLHAVEN_MIN_RESOLUTION.to_string()),
        ("ratios", WALLHAVEN_RATIOS.to_string()),
    ]
}

pub struct WallhavenAdapter {
    fetcher: Fetcher,
}

impl WallhavenAdapter {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    async fn query(
        &self,
        params: &[(&str, String)],
    ) -> std::result::Result<Vec<WallhavenWallpaper>, ProviderError> {
        let url = build_url(WALLHAVEN_SEARCH_URL, params);
        let resp: SearchResponse = self.fetcher.get_json(&url).await?;
        Ok(resp.data)
    }

    async fn try_fetch_page(
        &self,
        page: u32,
        category: Option<Category>,
    ) -> std::result::Result<Vec<WallpaperRecord>, ProviderError> {
        let data = self.query(&browse_params(page, category)).await?;
        Ok(data.into_iter().map(WallhavenWallpaper::into_record).collect())
    }

    async fn try_search(
        &self,
        query: &str,
    ) -> std::result::Result<Vec<WallpaperRecord>, ProviderError> {
        let data = self
            .query(&[("q", query.to_string()), ("page", "1".to_string())])
            .await?;
        Ok(data.into_iter().map(WallhavenWallpaper::into_record).collect())
    }
}

#[async_trait]
impl ProviderAdapter for WallhavenAdapter {
    fn provider(&self) -> Provider {
        Provider::Wallhaven
    }

    async fn fetch_page(&self, page: u32, category: Option<Category>) -> Vec<WallpaperRecord> {
        or_empty(Provider::Wallhaven, "browse", self.try_fetch_page(page, category).await)
    }

    fn supports_search(&self) -> bool {
        true
    }

    async fn search(&self, query: &str) -> Vec<WallpaperRecord> {
        or_empty(Provider::Wallhaven, "search", self.try_search(query).await)
    }

    async fn fetch_random(&self) -> Result<WallpaperRecord> {
        let page = rand::thread_rng().gen_range(1..=WALLHAVEN_RANDOM_MAX_PAGE);
        let data = self.query(&random_params(page)).await?;
        let wallpaper = data
            .choose(&mut rand::thread_rng())
            .ok_or(ProviderError::Empty)?;

        let fallbacks = vec![wallpaper.thumbs.large.clone(), wallpaper.thumbs.original.clone()];
        let record = WallpaperRecord::new(
            Provider::Wallhaven,
            wallpaper.id.clone(),
            format!("Wallpaper {}", wallpaper.id),
            wallpaper.thumbs.large.clone(),
            wallpaper.path.clone(),
            wallpaper.resolution.clone(),
        )
        .with_category(wallpaper.category.clone())
        .with_popularity(wallpaper.views, wallpaper.favorites)
        .with_fallbacks(fallbacks);

        Ok(record)
    }
}
