// Wallmix Constants
// Provider endpoints and query defaults. Providers change these without notice;
// keep them in one place.

// Relay
pub const DEFAULT_RELAY_URL: &str = "https://api.allorigins.win/raw?url=";

// Wallhaven
pub const WALLHAVEN_SEARCH_URL: &str = "https://wallhaven.cc/api/v1/search";
pub const WALLHAVEN_DEFAULT_CATEGORIES: &str = "111";
pub const WALLHAVEN_DEFAULT_PURITY: &str = "100";
pub const WALLHAVEN_DEFAULT_SORTING: &str = "toplist";
pub const WALLHAVEN_TOP_RANGE: &str = "1M";
pub const WALLHAVEN_MIN_RESOLUTION: &str = "1920x1080";
pub const WALLHAVEN_RATIOS: &str = "16x9,16x10";
pub const WALLHAVEN_RANDOM_MAX_PAGE: u32 = 10;

// Unsplash
pub const UNSPLASH_API_URL: &str = "https://unsplash.com/napi";
pub const UNSPLASH_PER_PAGE: u32 = 24;
pub const UNSPLASH_DEFAULT_QUERY: &str = "wallpaper";

// Bing
pub const BING_BASE_URL: &str = "https://www.bing.com";
pub const BING_ARCHIVE_PATH: &str = "/HPImageArchive.aspx";
pub const BING_PER_PAGE: u32 = 8;
pub const BING_THUMB_MARKER: &str = "1920x1080";
pub const BING_FULL_MARKER: &str = "UHD";

// Alphacoders
pub const ALPHACODERS_BASE_URL: &str = "https://wall.alphacoders.com";
pub const ALPHACODERS_DEFAULT_QUERY: &str = "wallpaper";
pub const ALPHACODERS_THUMB_MARKER: &str = "thumbbig-";
pub const ALPHACODERS_RANDOM_MAX_PAGE: u32 = 10;
pub const ALPHACODERS_THUMB_PATTERN: &str =
    r#"class="thumb-container-big"[\s\S]*?<img.*?src="(.*?)".*?title="(.*?)""#;
/// Site-wide wallpaper number inside a thumbnail file name
pub const ALPHACODERS_NUMBER_PATTERN: &str = r"thumbbig-(\d+)";

// Placeholder popularity (only when enabled in config)
pub const PLACEHOLDER_MAX_VIEWS: u64 = 1000;
pub const PLACEHOLDER_MAX_FAVORITES: u64 = 100;

// HTTP
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const USER_AGENT: &str = concat!("wallmix/", env!("CARGO_PKG_VERSION"));

// Persistence
pub const DATA_FOLDER: &str = ".wallmix";
pub const DB_FILENAME: &str = "wallmix.db";
pub const COLLECTIONS_KEY: &str = "collections";

// State
pub const STATE_EVENT_CAPACITY: usize = 64;
