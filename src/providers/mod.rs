// Wallmix - Provider adapters
// One adapter per external source. Each translates the provider's native
// API (or markup) into WallpaperRecord. Browse and search never fail:
// any adapter-level error is logged and becomes an empty result.

pub mod alphacoders;
pub mod bing;
pub mod unsplash;
pub mod wallhaven;

use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;

use crate::category::Category;
use crate::config::Config;
use crate::constants::{PLACEHOLDER_MAX_FAVORITES, PLACEHOLDER_MAX_VIEWS};
use crate::error::{ProviderError, Result, WallmixError};
use crate::models::{Provider, WallpaperRecord};
use crate::transport::Fetcher;

pub use alphacoders::AlphacodersAdapter;
pub use bing::BingAdapter;
pub use unsplash::UnsplashAdapter;
pub use wallhaven::WallhavenAdapter;

#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> Provider;

    /// One page of wallpapers, optionally filtered by category.
    async fn fetch_page(&self, page: u32, category: Option<Category>) -> Vec<WallpaperRecord>;

    /// Whether this adapter takes part in free-text search.
    fn supports_search(&self) -> bool {
        false
    }

    async fn search(&self, _query: &str) -> Vec<WallpaperRecord> {
        Vec::new()
    }

    /// A single random wallpaper. Unlike browse/search this reports failure.
    async fn fetch_random(&self) -> Result<WallpaperRecord> {
        Err(WallmixError::Unsupported(format!(
            "{} has no random endpoint",
            self.provider().display_name()
        )))
    }
}

/// Collapse an adapter failure into an empty result.
pub(crate) fn or_empty(
    provider: Provider,
    operation: &str,
    result: std::result::Result<Vec<WallpaperRecord>, ProviderError>,
) -> Vec<WallpaperRecord> {
    match result {
        Ok(records) => {
            let total = records.len();
            let usable: Vec<WallpaperRecord> =
                records.into_iter().filter(|r| r.is_usable()).collect();
            if usable.len() < total {
                log::debug!(
                    "{} {}: dropped {} unusable records",
                    provider.display_name(),
                    operation,
                    total - usable.len()
                );
            }
            log::debug!("{} {}: {} records", provider.display_name(), operation, usable.len());
            usable
        }
        Err(e) => {
            log::warn!("{} {} failed: {}", provider.display_name(), operation, e);
            Vec::new()
        }
    }
}

/// `base?k=v&k=v` with each value percent-encoded.
pub(crate) fn build_url(base: &str, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return base.to_string();
    }
    let query: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect();
    format!("{}?{}", base, query.join("&"))
}

/// Source of views/favorites for providers that expose none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popularity {
    /// Report zero
    Omit,
    /// Cosmetic random filler
    Placeholder,
}

impl Popularity {
    pub fn from_config(config: &Config) -> Self {
        if config.placeholder_popularity {
            Popularity::Placeholder
        } else {
            Popularity::Omit
        }
    }

    /// (views, favorites)
    pub fn sample(&self) -> (u64, u64) {
        match self {
            Popularity::Omit => (0, 0),
            Popularity::Placeholder => {
                let mut rng = rand::thread_rng();
                (
                    rng.gen_range(0..PLACEHOLDER_MAX_VIEWS),
                    rng.gen_range(0..PLACEHOLDER_MAX_FAVORITES),
                )
            }
        }
    }
}

/// The four stock adapters in browse order; Wallhaven first as the primary tier.
pub fn default_adapters(fetcher: &Fetcher, config: &Config) -> Vec<Arc<dyn ProviderAdapter>> {
    let popularity = Popularity::from_config(config);
    vec![
        Arc::new(WallhavenAdapter::new(fetcher.clone())),
        Arc::new(UnsplashAdapter::new(fetcher.clone())),
        Arc::new(BingAdapter::new(fetcher.clone(), popularity)),
        Arc::new(AlphacodersAdapter::new(fetcher.clone(), popularity)),
    ]
}
