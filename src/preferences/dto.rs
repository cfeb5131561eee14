use serde::{Deserialize, Serialize};

use crate::dietary::DietaryTag;

/// Body of `POST /preferences`. List fields are comma-separated strings as
/// typed into the form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferencesRequest {
    pub is_vegan: bool,
    pub is_vegetarian: bool,
    pub is_pescatarian: bool,
    pub is_keto: bool,
    pub is_paleo: bool,
    pub is_gluten_free: bool,
    pub is_dairy_free: bool,
    pub is_nut_free: bool,
    pub is_halal: bool,
    pub is_kosher: bool,
    pub is_low_carb: bool,
    pub is_low_fat: bool,
    pub allergies: String,
    pub preferred_cuisines: String,
    pub preferred_ingredients: String,
    pub disliked_ingredients: String,
    pub custom_diets: String,
    pub calorie_target: Option<i32>,
    pub protein_target: Option<i32>,
    pub carb_target: Option<i32>,
    pub fat_target: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NutritionalGoals {
    pub calories: i32,
    pub protein: i32,
    pub carbs: i32,
    pub fats: i32,
}

impl Default for NutritionalGoals {
    fn default() -> Self {
        Self {
            calories: 2000,
            protein: 50,
            carbs: 250,
            fats: 70,
        }
    }
}

/// Response of `GET /preferences`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesView {
    pub dietary_preferences: Vec<DietaryTag>,
    pub allergies: Vec<String>,
    pub nutritional_goals: NutritionalGoals,
    pub cuisines: Vec<String>,
    pub preferred_ingredients: Vec<String>,
    pub disliked_ingredients: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SavedResponse {
    pub success: bool,
}
