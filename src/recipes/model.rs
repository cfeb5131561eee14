use serde::{Deserialize, Serialize};

/// Ingredient line as returned by the recipe provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Externally sourced recipe. Lives for one request.
///
/// Diet flags are optional: a missing flag means "unknown", not "false".
/// Fields this service does not read are kept in `extra` and written back
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vegan: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vegetarian: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gluten_free: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dairy_free: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ketogenic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paleo: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_fodmap: Option<bool>,
    #[serde(default)]
    pub cuisines: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_ingredients: Option<Vec<Ingredient>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Recipe {
    /// Lower-cased, non-empty ingredient names. Empty when the provider sent
    /// no ingredient list.
    pub fn ingredient_names(&self) -> Vec<String> {
        self.extended_ingredients
            .iter()
            .flatten()
            .map(|i| i.name.trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect()
    }

    /// Human-readable ingredient lines, used for grocery lists.
    pub fn ingredient_lines(&self) -> Vec<String> {
        self.extended_ingredients
            .iter()
            .flatten()
            .filter_map(|i| {
                i.original
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .or_else(|| (!i.name.trim().is_empty()).then(|| i.name.trim().to_string()))
            })
            .collect()
    }
}
