// Wallmix - Shared data model
// Every provider normalizes into WallpaperRecord; collections hold them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Origin of a wallpaper record
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Wallhaven,
    Unsplash,
    Bing,
    Alphacoders,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Wallhaven => "wallhaven",
            Provider::Unsplash => "unsplash",
            Provider::Bing => "bing",
            Provider::Alphacoders => "alphacoders",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Wallhaven => "Wallhaven",
            Provider::Unsplash => "Unsplash",
            Provider::Bing => "Bing",
            Provider::Alphacoders => "Alphacoders",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Normalized cross-provider wallpaper.
/// `id` is only unique within one provider; use `key()` when mixing providers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WallpaperRecord {
    pub id: String,
    pub title: String,
    #[serde(alias = "path")]
    pub thumbnail_url: String,
    pub full_url: String,
    #[serde(default)]
    pub fallback_urls: Vec<String>,
    pub resolution: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub favorites: u64,
    pub provider: Provider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(default)]
    pub loaded: bool,
}

impl WallpaperRecord {
    /// Record with the required fields set and everything else defaulted.
    pub fn new(
        provider: Provider,
        id: impl Into<String>,
        title: impl Into<String>,
        thumbnail_url: impl Into<String>,
        full_url: impl Into<String>,
        resolution: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            thumbnail_url: thumbnail_url.into(),
            full_url: full_url.into(),
            fallback_urls: Vec::new(),
            resolution: resolution.into(),
            category: None,
            views: 0,
            favorites: 0,
            provider,
            copyright: None,
            loaded: false,
        }
    }

    pub fn with_fallbacks(mut self, urls: Vec<String>) -> Self {
        self.fallback_urls = urls.into_iter().filter(|u| !u.is_empty()).collect();
        self
    }

    pub fn with_popularity(mut self, views: u64, favorites: u64) -> Self {
        self.views = views;
        self.favorites = favorites;
        self
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category.filter(|c| !c.is_empty());
        self
    }

    /// Cross-provider identity.
    pub fn key(&self) -> (Provider, &str) {
        (self.provider, self.id.as_str())
    }

    /// A record needs an id and at least one URL the client can load.
    pub fn is_usable(&self) -> bool {
        !self.id.is_empty()
            && (!self.full_url.is_empty()
                || self.fallback_urls.first().map_or(false, |u| !u.is_empty()))
    }

    /// Full URL first, then fallbacks in order. Empty entries are skipped.
    pub fn urls_to_try(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.full_url.as_str())
            .chain(self.fallback_urls.iter().map(|u| u.as_str()))
            .filter(|u| !u.is_empty())
    }
}

/// User-named, persisted grouping of wallpapers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub wallpapers: Vec<WallpaperRecord>,
    pub created: DateTime<Utc>,
}

impl Collection {
    /// Merge wallpapers, collapsing duplicate ids. A later copy replaces the
    /// earlier one in place, so ordering follows first insertion.
    pub fn merge_wallpapers(&mut self, incoming: Vec<WallpaperRecord>) -> usize {
        let mut added = 0;
        for mut wallpaper in incoming {
            wallpaper.loaded = false;
            match self.wallpapers.iter_mut().find(|w| w.id == wallpaper.id) {
                Some(existing) => *existing = wallpaper,
                None => {
                    self.wallpapers.push(wallpaper);
                    added += 1;
                }
            }
        }
        added
    }
}
