use std::fmt;

use serde::{Deserialize, Serialize};

/// One user-selectable dietary restriction.
///
/// Parsing is lenient so that values coming from the preferences form, the
/// recipe provider and older stored rows all land on the same tag
/// (`"Gluten-Free"`, `"gluten free"` and `"gluten_free"` are one tag).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DietaryTag {
    Vegan,
    Vegetarian,
    Pescatarian,
    Ketogenic,
    Paleo,
    GlutenFree,
    DairyFree,
    NutFree,
    Halal,
    Kosher,
    LowCarb,
    LowFat,
    LowFodmap,
    /// Free-text tag with no built-in meaning, stored lower-cased.
    Custom(String),
}

impl DietaryTag {
    pub fn parse(raw: &str) -> Option<Self> {
        let key = raw
            .trim()
            .to_lowercase()
            .replace(['-', '_'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if key.is_empty() {
            return None;
        }
        let tag = match key.as_str() {
            "vegan" => Self::Vegan,
            "vegetarian" | "lacto ovo vegetarian" => Self::Vegetarian,
            "pescatarian" | "pescetarian" => Self::Pescatarian,
            "ketogenic" | "keto" => Self::Ketogenic,
            "paleo" | "paleolithic" => Self::Paleo,
            "gluten free" => Self::GlutenFree,
            "dairy free" => Self::DairyFree,
            "nut free" | "tree nuts" | "tree nut free" => Self::NutFree,
            "halal" => Self::Halal,
            "kosher" => Self::Kosher,
            "low carb" => Self::LowCarb,
            "low fat" => Self::LowFat,
            "low fodmap" | "fodmap friendly" => Self::LowFodmap,
            _ => Self::Custom(key),
        };
        Some(tag)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Vegan => "vegan",
            Self::Vegetarian => "vegetarian",
            Self::Pescatarian => "pescatarian",
            Self::Ketogenic => "ketogenic",
            Self::Paleo => "paleo",
            Self::GlutenFree => "gluten free",
            Self::DairyFree => "dairy free",
            Self::NutFree => "tree nuts",
            Self::Halal => "halal",
            Self::Kosher => "kosher",
            Self::LowCarb => "low-carb",
            Self::LowFat => "low-fat",
            Self::LowFodmap => "low fodmap",
            Self::Custom(s) => s,
        }
    }

    /// Value understood by the recipe provider's `diet` search parameter.
    pub fn provider_diet(&self) -> Option<&'static str> {
        match self {
            Self::Vegan => Some("vegan"),
            Self::Vegetarian => Some("vegetarian"),
            Self::Pescatarian => Some("pescetarian"),
            Self::Ketogenic => Some("ketogenic"),
            Self::Paleo => Some("paleo"),
            Self::GlutenFree => Some("gluten free"),
            Self::LowFodmap => Some("low fodmap"),
            _ => None,
        }
    }
}

impl From<String> for DietaryTag {
    fn from(raw: String) -> Self {
        Self::parse(&raw).unwrap_or(Self::Custom(raw))
    }
}

impl From<DietaryTag> for String {
    fn from(tag: DietaryTag) -> Self {
        tag.as_str().to_string()
    }
}

impl fmt::Display for DietaryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized preferences handed to the compliance filter.
///
/// All term lists are trimmed and lower-cased. An empty profile means
/// "no filtering requested".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DietaryProfile {
    #[serde(default)]
    pub dietary_preferences: Vec<DietaryTag>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub cuisines: Vec<String>,
    #[serde(default)]
    pub preferred_ingredients: Vec<String>,
    #[serde(default)]
    pub disliked_ingredients: Vec<String>,
}

impl DietaryProfile {
    pub fn is_empty(&self) -> bool {
        self.dietary_preferences.is_empty()
            && self.allergies.is_empty()
            && self.preferred_ingredients.is_empty()
            && self.disliked_ingredients.is_empty()
    }
}

/// Split a comma-joined stored list into trimmed, lower-cased, non-empty terms.
pub fn split_terms(joined: Option<&str>) -> Vec<String> {
    joined
        .unwrap_or_default()
        .split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Re-join user input for storage: trims each entry and drops empties,
/// keeping the user's casing.
pub fn join_terms(raw: &str) -> String {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}
