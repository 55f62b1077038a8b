// Wallmix - Browse categories
// Closed set of categories and the query modifiers they apply to the
// Wallhaven search. Other providers only use the category name as a keyword.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WallmixError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Nsfw,
    Sketchy,
    Landscape,
    Space,
    Digital,
    Minimal,
    Nature,
    Cars,
    Gaming,
    Technology,
    General,
    Anime,
    People,
}

/// Overrides applied on top of the default Wallhaven browse parameters.
/// `None` leaves the default in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryModifier {
    pub query_terms: Option<&'static str>,
    /// Wallhaven category bitmask: general / anime / people
    pub categories: Option<&'static str>,
    /// Wallhaven purity bitmask: sfw / sketchy / nsfw
    pub purity: Option<&'static str>,
    pub sorting: Option<&'static str>,
}

impl QueryModifier {
    const fn keywords(terms: &'static str) -> Self {
        Self {
            query_terms: Some(terms),
            categories: None,
            purity: None,
            sorting: Some("relevance"),
        }
    }

    const fn bitmask(categories: &'static str) -> Self {
        Self {
            query_terms: None,
            categories: Some(categories),
            purity: None,
            sorting: Some("toplist"),
        }
    }

    const fn purity(purity: &'static str) -> Self {
        Self {
            query_terms: None,
            categories: Some("111"),
            purity: Some(purity),
            sorting: None,
        }
    }
}

impl Category {
    pub const ALL: [Category; 13] = [
        Category::Nsfw,
        Category::Sketchy,
        Category::Landscape,
        Category::Space,
        Category::Digital,
        Category::Minimal,
        Category::Nature,
        Category::Cars,
        Category::Gaming,
        Category::Technology,
        Category::General,
        Category::Anime,
        Category::People,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Nsfw => "nsfw",
            Category::Sketchy => "sketchy",
            Category::Landscape => "landscape",
            Category::Space => "space",
            Category::Digital => "digital",
            Category::Minimal => "minimal",
            Category::Nature => "nature",
            Category::Cars => "cars",
            Category::Gaming => "gaming",
            Category::Technology => "technology",
            Category::General => "general",
            Category::Anime => "anime",
            Category::People => "people",
        }
    }

    /// Wallhaven parameter overrides for this category.
    pub fn modifier(&self) -> QueryModifier {
        match self {
            // These two only loosen the default safe-content filter.
            Category::Nsfw => QueryModifier::purity("001"),
            Category::Sketchy => QueryModifier::purity("010"),
            Category::Landscape => QueryModifier::keywords("landscape"),
            Category::Space => QueryModifier::keywords("space OR galaxy OR cosmos"),
            Category::Digital => QueryModifier::keywords("digital art"),
            Category::Minimal => QueryModifier::keywords("minimal OR minimalist"),
            Category::Nature => QueryModifier::keywords("nature"),
            Category::Cars => QueryModifier::keywords("car OR cars OR supercar"),
            Category::Gaming => QueryModifier::keywords("gaming OR game"),
            Category::Technology => QueryModifier::keywords("technology OR tech"),
            Category::General => QueryModifier::bitmask("100"),
            Category::Anime => QueryModifier::bitmask("010"),
            Category::People => QueryModifier::bitmask("001"),
        }
    }

    /// Parse a user-facing category name. `"all"` and empty input mean no filter.
    pub fn parse_optional(input: &str) -> Result<Option<Category>, WallmixError> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(None);
        }
        trimmed.parse().map(Some)
    }
}

impl FromStr for Category {
    type Err = WallmixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| {
                let names: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
                WallmixError::InvalidInput(format!(
                    "unknown category '{}' (expected one of: all, {})",
                    s,
                    names.join(", ")
                ))
            })
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_is_deterministic() {
        for category in Category::ALL {
            assert_eq!(category.modifier(), category.modifier());
        }
    }

    #[test]
    fn test_space_or_joined_keywords() {
        let m = Category::Space.modifier();
        assert_eq!(m.query_terms, Some("space OR galaxy OR cosmos"));
        assert_eq!(m.sorting, Some("relevance"));
        assert_eq!(m.purity, None);
    }

    #[test]
    fn test_purity_categories_only_loosen_filter() {
        let nsfw = Category::Nsfw.modifier();
        assert_eq!(nsfw.purity, Some("001"));
        assert_eq!(nsfw.categories, Some("111"));
        assert_eq!(nsfw.query_terms, None);

        let sketchy = Category::Sketchy.modifier();
        assert_eq!(sketchy.purity, Some("010"));
        assert_eq!(sketchy.query_terms, None);
    }

    #[test]
    fn test_bitmask_categories() {
        assert_eq!(Category::General.modifier().categories, Some("100"));
        assert_eq!(Category::Anime.modifier().categories, Some("010"));
        assert_eq!(Category::People.modifier().categories, Some("001"));
    }

    #[test]
    fn test_parse_round_trips_names() {
        for category in Category::ALL {
            let parsed: Category = category.as_str().parse().unwrap();
            assert_eq!(parsed, category);
        }
        assert_eq!("Space".parse::<Category>().unwrap(), Category::Space);
    }

    #[test]
    fn test_parse_optional_all_and_unknown() {
        assert_eq!(Category::parse_optional("all").unwrap(), None);
        assert_eq!(Category::parse_optional("  ").unwrap(), None);
        assert_eq!(Category::parse_optional("cars").unwrap(), Some(Category::Cars));

        let err = Category::parse_optional("boats").unwrap_err();
        assert!(matches!(err, WallmixError::InvalidInput(_)));
    }
}
