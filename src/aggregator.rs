// Wallmix - Aggregator
// Fan-out / fan-in across provider adapters.
// browse and search wait for every adapter to settle and keep whatever
// came back; they never fail. random_one walks a fixed priority chain and
// is the only operation that reports exhaustion.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::join_all;
use rand::seq::SliceRandom;
use tokio::task::JoinHandle;

use crate::category::Category;
use crate::error::{Result, WallmixError};
use crate::models::{Provider, WallpaperRecord};
use crate::providers::ProviderAdapter;

/// Random chain, fastest and most reliable first
pub const RANDOM_PRIORITY: [Provider; 3] = [
    Provider::Wallhaven,
    Provider::Unsplash,
    Provider::Alphacoders,
];

/// Result of a tiered browse: the primary provider's page right away,
/// the remaining providers still in flight.
pub struct TieredBrowse {
    pub primary: Vec<WallpaperRecord>,
    pub background: Option<JoinHandle<Vec<WallpaperRecord>>>,
}

pub struct Aggregator {
    adapters: Vec<Arc<dyn ProviderAdapter>>,
}

impl Aggregator {
    /// The first adapter is the primary tier for `browse_tiered`.
    pub fn new(adapters: Vec<Arc<dyn ProviderAdapter>>) -> Self {
        Self { adapters }
    }

    /// Every adapter's page, merged in adapter order.
    pub async fn browse(&self, page: u32, category: Option<Category>) -> Vec<WallpaperRecord> {
        let batches = join_all(self.adapters.iter().map(|a| a.fetch_page(page, category))).await;
        let merged = merge_batch(batches);
        log::info!(
            "Browse page {} ({}): {} wallpapers from {} providers",
            page,
            category.map(|c| c.as_str()).unwrap_or("all"),
            merged.len(),
            self.adapters.len()
        );
        merged
    }

    /// Await the primary adapter; spawn the rest in the background.
    /// Must be called inside a tokio runtime.
    pub async fn browse_tiered(&self, page: u32, category: Option<Category>) -> TieredBrowse {
        let Some((primary, secondary)) = self.adapters.split_first() else {
            return TieredBrowse {
                primary: Vec::new(),
                background: None,
            };
        };

        let primary_batch = merge_batch(vec![primary.fetch_page(page, category).await]);

        if secondary.is_empty() {
            return TieredBrowse {
                primary: primary_batch,
                background: None,
            };
        }

        let secondary: Vec<Arc<dyn ProviderAdapter>> = secondary.to_vec();
        let handle = tokio::spawn(async move {
            let batches = join_all(secondary.iter().map(|a| a.fetch_page(page, category))).await;
            let merged = merge_batch(batches);
            log::debug!("Background tier for page {}: {} wallpapers", page, merged.len());
            merged
        });

        TieredBrowse {
            primary: primary_batch,
            background: Some(handle),
        }
    }

    /// Search every adapter that supports it, then shuffle so no provider
    /// dominates the top of the list.
    pub async fn search(&self, query: &str) -> Vec<WallpaperRecord> {
        let searchable: Vec<&Arc<dyn ProviderAdapter>> =
            self.adapters.iter().filter(|a| a.supports_search()).collect();

        let batches = join_all(searchable.iter().map(|a| a.search(query))).await;
        let mut merged = merge_batch(batches);
        merged.shuffle(&mut rand::thread_rng());

        log::info!(
            "Search '{}': {} wallpapers from {} providers",
            query,
            merged.len(),
            searchable.len()
        );
        merged
    }

    /// One random wallpaper from the first provider in the chain that delivers.
    pub async fn random_one(&self) -> Result<WallpaperRecord> {
        let mut attempted = Vec::new();

        for provider in &RANDOM_PRIORITY {
            let Some(adapter) = self.adapters.iter().find(|a| a.provider() == *provider) else {
                continue;
            };
            attempted.push(provider.as_str().to_string());

            match adapter.fetch_random().await {
                Ok(record) if record.is_usable() => {
                    log::info!("Random wallpaper from {}: {}", provider.display_name(), record.id);
                    return Ok(record);
                }
                Ok(record) => {
                    log::warn!(
                        "{} random returned an unusable record ({}), trying next provider",
                        provider.display_name(),
                        record.id
                    );
                }
                Err(e) => {
                    log::warn!(
                        "{} random failed: {}, trying next provider",
                        provider.display_name(),
                        e
                    );
                }
            }
        }

        log::error!("Random wallpaper: every provider failed ({})", attempted.join(", "));
        Err(WallmixError::AllProvidersFailed(attempted))
    }
}

/// Flatten adapter batches, drop unusable records and collapse duplicates
/// within this batch. Ids are only unique per provider, so the key is
/// (provider, id). First occurrence wins.
pub fn merge_batch(batches: Vec<Vec<WallpaperRecord>>) -> Vec<WallpaperRecord> {
    let mut seen: HashSet<(Provider, String)> = HashSet::new();
    batches
        .into_iter()
        .flatten()
        .filter(|r| r.is_usable())
        .filter(|r| seen.insert((r.provider, r.id.clone())))
        .collect()
}
