//! Closed vocabularies for garment attributes
//!
//! Classifier output and manual edits arrive as free text. Every attribute
//! is parsed leniently (case, separators, aliases) into a closed vocabulary:
//! - `parse` returns `None` for tokens outside the vocabulary
//! - `normalize` never fails and falls back to the safe default
//!
//! Canonical tokens are lowercase snake_case and are what the database and
//! the HTTP API carry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Garment categories accepted from the classifier
pub const CATEGORIES: &[&str] = &[
    "tshirt", "shirt", "polo", "sweater", "hoodie", "blazer", "coat", "jacket", "dress", "skirt",
    "jeans", "chinos", "trousers", "shorts", "sneakers", "boots", "loafers", "heels", "other",
];

const CATEGORY_ALIASES: &[(&str, &str)] = &[
    ("tee", "tshirt"),
    ("t_shirt", "tshirt"),
    ("sweatshirt", "hoodie"),
    ("denim", "jeans"),
    ("slacks", "trousers"),
    ("pants", "trousers"),
    ("trainers", "sneakers"),
];

/// Colors accepted from the classifier
pub const COLORS: &[&str] = &[
    "black", "white", "gray", "navy", "blue", "green", "red", "yellow", "orange", "brown", "beige",
    "tan", "cream", "purple", "pink", "multicolor",
];

const COLOR_ALIASES: &[(&str, &str)] = &[
    ("grey", "gray"),
    ("multi", "multicolor"),
    ("multi_color", "multicolor"),
    ("multicolour", "multicolor"),
    ("multi_colour", "multicolor"),
];

/// Colors that may be paired with themselves
///
/// Both spellings of gray are listed because compatibility checks compare
/// the stored text, which may come from manual edits.
pub const NEUTRAL_COLORS: &[&str] = &["black", "white", "gray", "grey", "navy", "beige", "tan", "cream"];

/// Color used when the classifier returns nothing usable
pub const DEFAULT_COLOR: &str = "multicolor";

/// Category used when the classifier returns nothing usable
pub const DEFAULT_CATEGORY: &str = "other";

/// Lowercase, trim, and fold separators (`-`, space, `/`, `&`, `+`) into
/// single underscores.
fn canonical_token(raw: &str) -> String {
    let folded: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '-' | ' ' | '/' | '&' | '+' => '_',
            c => c,
        })
        .collect();

    folded
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

fn lookup(
    raw: &str,
    vocab: &[&'static str],
    aliases: &[(&str, &'static str)],
) -> Option<&'static str> {
    let token = canonical_token(raw);
    if token.is_empty() {
        return None;
    }

    if let Some(&(_, target)) = aliases.iter().find(|(alias, _)| *alias == token) {
        return Some(target);
    }

    // "t shirt" and "tshirt" are the same thing
    let squashed = token.replace('_', "");
    vocab
        .iter()
        .copied()
        .find(|candidate| *candidate == token || candidate.replace('_', "") == squashed)
}

/// Parse a category token into the closed category vocabulary
pub fn parse_category(raw: &str) -> Option<&'static str> {
    lookup(raw, CATEGORIES, CATEGORY_ALIASES)
}

/// Normalize a category token, defaulting to `other`
pub fn normalize_category(raw: &str) -> &'static str {
    parse_category(raw).unwrap_or(DEFAULT_CATEGORY)
}

/// Parse a color token into the closed color vocabulary
pub fn parse_color(raw: &str) -> Option<&'static str> {
    lookup(raw, COLORS, COLOR_ALIASES)
}

/// Normalize a color token, defaulting to `multicolor`
pub fn normalize_color(raw: &str) -> &'static str {
    parse_color(raw).unwrap_or(DEFAULT_COLOR)
}

/// Tidy free text entered by a person: known tokens become canonical,
/// anything else is kept as trimmed lowercase text.
pub fn tidy_free_text(raw: &str, parse: fn(&str) -> Option<&'static str>) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(
        parse(trimmed)
            .map(str::to_string)
            .unwrap_or_else(|| trimmed.to_lowercase()),
    )
}

/// Whether a color is safe to pair with itself
pub fn is_neutral(color: &str) -> bool {
    let color = color.trim().to_lowercase();
    NEUTRAL_COLORS.contains(&color.as_str())
}

// ========================================
// Outfit part
// ========================================

/// Role a garment plays in an outfit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutfitPart {
    Top,
    Bottom,
    Outerwear,
    Shoes,
    Accessory,
    Onepiece,
    Other,
}

impl OutfitPart {
    /// Parse an outfit part, accepting common aliases
    pub fn parse(raw: &str) -> Option<Self> {
        match canonical_token(raw).as_str() {
            "top" | "tops" => Some(OutfitPart::Top),
            "bottom" | "bottoms" => Some(OutfitPart::Bottom),
            "outerwear" | "outer" => Some(OutfitPart::Outerwear),
            "shoes" | "shoe" | "footwear" => Some(OutfitPart::Shoes),
            "accessory" | "accessories" => Some(OutfitPart::Accessory),
            "onepiece" | "one_piece" | "dress" => Some(OutfitPart::Onepiece),
            "other" => Some(OutfitPart::Other),
            _ => None,
        }
    }

    /// Parse an outfit part, defaulting to `other`
    pub fn normalize(raw: &str) -> Self {
        Self::parse(raw).unwrap_or(OutfitPart::Other)
    }

    /// Derive the outfit part from a garment category
    pub fn from_category(category: &str) -> Self {
        match parse_category(category) {
            Some("tshirt" | "shirt" | "polo" | "sweater" | "hoodie") => OutfitPart::Top,
            Some("blazer" | "coat" | "jacket") => OutfitPart::Outerwear,
            Some("dress") => OutfitPart::Onepiece,
            Some("skirt" | "jeans" | "chinos" | "trousers" | "shorts") => OutfitPart::Bottom,
            Some("sneakers" | "boots" | "loafers" | "heels") => OutfitPart::Shoes,
            _ => OutfitPart::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutfitPart::Top => "top",
            OutfitPart::Bottom => "bottom",
            OutfitPart::Outerwear => "outerwear",
            OutfitPart::Shoes => "shoes",
            OutfitPart::Accessory => "accessory",
            OutfitPart::Onepiece => "onepiece",
            OutfitPart::Other => "other",
        }
    }
}

impl fmt::Display for OutfitPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ========================================
// Formality
// ========================================

/// Ordered formality scale
///
/// casual(0) < smart_casual(1) < semi_formal(2) < formal(3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formality {
    Casual,
    SmartCasual,
    SemiFormal,
    Formal,
}

impl Formality {
    /// Parse a formality level, accepting common aliases
    ///
    /// Athleisure and streetwear are treated as casual.
    pub fn parse(raw: &str) -> Option<Self> {
        match canonical_token(raw).as_str() {
            "casual" | "athleisure" | "streetwear" => Some(Formality::Casual),
            "smart_casual" | "smartcasual" | "business_casual" | "businesscasual" => {
                Some(Formality::SmartCasual)
            }
            "semi_formal" | "semiformal" => Some(Formality::SemiFormal),
            "formal" => Some(Formality::Formal),
            _ => None,
        }
    }

    /// Parse a formality level, defaulting to casual
    pub fn normalize(raw: &str) -> Self {
        Self::parse(raw).unwrap_or(Formality::Casual)
    }

    /// Position on the formality scale
    pub fn rank(&self) -> i32 {
        match self {
            Formality::Casual => 0,
            Formality::SmartCasual => 1,
            Formality::SemiFormal => 2,
            Formality::Formal => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Formality::Casual => "casual",
            Formality::SmartCasual => "smart_casual",
            Formality::SemiFormal => "semi_formal",
            Formality::Formal => "formal",
        }
    }
}

impl Default for Formality {
    fn default() -> Self {
        Formality::Casual
    }
}

impl fmt::Display for Formality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ========================================
// Season
// ========================================

/// Season a garment is worn in
///
/// A value is either a single season, one of the two adjacent-pair combos,
/// or `all_season`. No other combinations exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
    SpringSummer,
    FallWinter,
    AllSeason,
}

impl Season {
    fn parse_single(token: &str) -> Option<Self> {
        match token {
            "spring" => Some(Season::Spring),
            "summer" => Some(Season::Summer),
            "fall" | "autumn" => Some(Season::Fall),
            "winter" => Some(Season::Winter),
            _ => None,
        }
    }

    /// Join two single seasons into a compound, if the pair exists
    fn combine(a: Season, b: Season) -> Option<Self> {
        match (a, b) {
            (Season::Spring, Season::Summer) | (Season::Summer, Season::Spring) => {
                Some(Season::SpringSummer)
            }
            (Season::Fall, Season::Winter) | (Season::Winter, Season::Fall) => {
                Some(Season::FallWinter)
            }
            _ => None,
        }
    }

    /// Parse a season token
    ///
    /// Compound values must decompose into exactly two adjacent single
    /// seasons present in the vocabulary; order does not matter
    /// ("winter/fall" parses as `fall_winter`).
    pub fn parse(raw: &str) -> Option<Self> {
        let token = canonical_token(raw);
        match token.as_str() {
            "all_season" | "all_seasons" | "allseason" | "allseasons" | "year_round" | "all"
            | "any" => return Some(Season::AllSeason),
            _ => {}
        }

        let parts: Vec<&str> = token.split('_').collect();
        match parts.as_slice() {
            [single] => Self::parse_single(single),
            [first, second] => {
                Self::combine(Self::parse_single(first)?, Self::parse_single(second)?)
            }
            _ => None,
        }
    }

    /// Parse a season token, defaulting to `all_season`
    pub fn normalize(raw: &str) -> Self {
        Self::parse(raw).unwrap_or(Season::AllSeason)
    }

    /// Decompose a compound season into its two single seasons
    pub fn parts(&self) -> Option<(Season, Season)> {
        match self {
            Season::SpringSummer => Some((Season::Spring, Season::Summer)),
            Season::FallWinter => Some((Season::Fall, Season::Winter)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
            Season::Winter => "winter",
            Season::SpringSummer => "spring_summer",
            Season::FallWinter => "fall_winter",
            Season::AllSeason => "all_season",
        }
    }

    pub fn all_variants() -> &'static [Season] {
        &[
            Season::Spring,
            Season::Summer,
            Season::Fall,
            Season::Winter,
            Season::SpringSummer,
            Season::FallWinter,
            Season::AllSeason,
        ]
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
