use anyhow::Context;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{NutritionalGoals, PreferencesRequest, PreferencesView};
use crate::dietary::tags::{join_terms, split_terms};
use crate::dietary::{DietaryProfile, DietaryTag};

#[derive(Debug, Clone, Default, Serialize, FromRow)]
pub struct UserPreferences {
    pub user_id: Uuid,
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
    pub allergies: Option<String>,
    pub preferred_cuisines: Option<String>,
    pub preferred_ingredients: Option<String>,
    pub disliked_ingredients: Option<String>,
    pub custom_diets: Option<String>,
    pub calorie_target: Option<i32>,
    pub protein_target: Option<i32>,
    pub carb_target: Option<i32>,
    pub fat_target: Option<i32>,
    pub updated_at: Option<OffsetDateTime>,
}

impl UserPreferences {
    /// Tags for every set flag, in a fixed order, then custom diets.
    pub fn dietary_tags(&self) -> Vec<DietaryTag> {
        let flags = [
            (self.is_vegan, DietaryTag::Vegan),
            (self.is_vegetarian, DietaryTag::Vegetarian),
            (self.is_pescatarian, DietaryTag::Pescatarian),
            (self.is_keto, DietaryTag::Ketogenic),
            (self.is_paleo, DietaryTag::Paleo),
            (self.is_gluten_free, DietaryTag::GlutenFree),
            (self.is_dairy_free, DietaryTag::DairyFree),
            (self.is_nut_free, DietaryTag::NutFree),
            (self.is_halal, DietaryTag::Halal),
            (self.is_kosher, DietaryTag::Kosher),
            (self.is_low_carb, DietaryTag::LowCarb),
            (self.is_low_fat, DietaryTag::LowFat),
        ];
        let mut tags: Vec<DietaryTag> = flags
            .into_iter()
            .filter_map(|(on, tag)| on.then_some(tag))
            .collect();
        for tag in split_terms(self.custom_diets.as_deref())
            .iter()
            .filter_map(|t| DietaryTag::parse(t))
        {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags
    }

    pub fn to_profile(&self) -> DietaryProfile {
        DietaryProfile {
            dietary_preferences: self.dietary_tags(),
            allergies: split_terms(self.allergies.as_deref()),
            cuisines: split_terms(self.preferred_cuisines.as_deref()),
            preferred_ingredients: split_terms(self.preferred_ingredients.as_deref()),
            disliked_ingredients: split_terms(self.disliked_ingredients.as_deref()),
        }
    }

    pub fn to_view(&self) -> PreferencesView {
        let defaults = NutritionalGoals::default();
        let profile = self.to_profile();
        PreferencesView {
            dietary_preferences: profile.dietary_preferences,
            allergies: profile.allergies,
            nutritional_goals: NutritionalGoals {
                calories: self.calorie_target.unwrap_or(defaults.calories),
                protein: self.protein_target.unwrap_or(defaults.protein),
                carbs: self.carb_target.unwrap_or(defaults.carbs),
                fats: self.fat_target.unwrap_or(defaults.fats),
            },
            cuisines: profile.cuisines,
            preferred_ingredients: profile.preferred_ingredients,
            disliked_ingredients: profile.disliked_ingredients,
        }
    }

    /// Row that `upsert` would store for `req`.
    pub fn from_request(user_id: Uuid, req: &PreferencesRequest) -> Self {
        let stored = |raw: &str| Some(join_terms(raw)).filter(|s| !s.is_empty());
        Self {
            user_id,
            is_vegan: req.is_vegan,
            is_vegetarian: req.is_vegetarian,
            is_pescatarian: req.is_pescatarian,
            is_keto: req.is_keto,
            is_paleo: req.is_paleo,
            is_gluten_free: req.is_gluten_free,
            is_dairy_free: req.is_dairy_free,
            is_nut_free: req.is_nut_free,
            is_halal: req.is_halal,
            is_kosher: req.is_kosher,
            is_low_carb: req.is_low_carb,
            is_low_fat: req.is_low_fat,
            allergies: stored(&req.allergies),
            preferred_cuisines: stored(&req.preferred_cuisines),
            preferred_ingredients: stored(&req.preferred_ingredients),
            disliked_ingredients: stored(&req.disliked_ingredients),
            custom_diets: stored(&req.custom_diets),
            calorie_target: req.calorie_target,
            protein_target: req.protein_target,
            carb_target: req.carb_target,
            fat_target: req.fat_target,
            updated_at: None,
        }
    }
}

const COLUMNS: &str = "user_id, is_vegan, is_vegetarian, is_pescatarian, is_keto, is_paleo, \
    is_gluten_free, is_dairy_free, is_nut_free, is_halal, is_kosher, is_low_carb, is_low_fat, \
    allergies, preferred_cuisines, preferred_ingredients, disliked_ingredients, custom_diets, \
    calorie_target, protein_target, carb_target, fat_target, updated_at";

pub async fn find(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<UserPreferences>> {
    let row = sqlx::query_as::<_, UserPreferences>(&format!(
        "SELECT {COLUMNS} FROM user_preferences WHERE user_id = $1"
    ))
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("load preferences")?;
    Ok(row)
}

/// Profile for the compliance filter. No stored row means no filtering.
pub async fn load_profile(db: &PgPool, user_id: Uuid) -> anyhow::Result<DietaryProfile> {
    Ok(find(db, user_id)
        .await?
        .map(|p| p.to_profile())
        .unwrap_or_default())
}

pub async fn upsert(db: &PgPool, prefs: &UserPreferences) -> anyhow::Result<UserPreferences> {
    let row = sqlx::query_as::<_, UserPreferences>(&format!(
        r#"
        INSERT INTO user_preferences (
            user_id, is_vegan, is_vegetarian, is_pescatarian, is_keto, is_paleo,
            is_gluten_free, is_dairy_free, is_nut_free, is_halal, is_kosher, is_low_carb, is_low_fat,
            allergies, preferred_cuisines, preferred_ingredients, disliked_ingredients, custom_diets,
            calorie_target, protein_target, carb_target, fat_target, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                $14, $15, $16, $17, $18, $19, $20, $21, $22, now())
        ON CONFLICT (user_id) DO UPDATE SET
            is_vegan = EXCLUDED.is_vegan,
            is_vegetarian = EXCLUDED.is_vegetarian,
            is_pescatarian = EXCLUDED.is_pescatarian,
            is_keto = EXCLUDED.is_keto,
            is_paleo = EXCLUDED.is_paleo,
            is_gluten_free = EXCLUDED.is_gluten_free,
            is_dairy_free = EXCLUDED.is_dairy_free,
            is_nut_free = EXCLUDED.is_nut_free,
            is_halal = EXCLUDED.is_halal,
            is_kosher = EXCLUDED.is_kosher,
            is_low_carb = EXCLUDED.is_low_carb,
            is_low_fat = EXCLUDED.is_low_fat,
            allergies = EXCLUDED.allergies,
            preferred_cuisines = EXCLUDED.preferred_cuisines,
            preferred_ingredients = EXCLUDED.preferred_ingredients,
            disliked_ingredients = EXCLUDED.disliked_ingredients,
            custom_diets = EXCLUDED.custom_diets,
            calorie_target = EXCLUDED.calorie_target,
            protein_target = EXCLUDED.protein_target,
            carb_target = EXCLUDED.carb_target,
            fat_target = EXCLUDED.fat_target,
            updated_at = now()
        RETURNING {COLUMNS}
        "#
    ))
    .bind(prefs.user_id)
    .bind(prefs.is_vegan)
    .bind(prefs.is_vegetarian)
    .bind(prefs.is_pescatarian)
    .bind(prefs.is_keto)
    .bind(prefs.is_paleo)
    .bind(prefs.is_gluten_free)
    .bind(prefs.is_dairy_free)
    .bind(prefs.is_nut_free)
    .bind(prefs.is_halal)
    .bind(prefs.is_kosher)
    .bind(prefs.is_low_carb)
    .bind(prefs.is_low_fat)
    .bind(&prefs.allergies)
    .bind(&prefs.preferred_cuisines)
    .bind(&prefs.preferred_ingredients)
    .bind(&prefs.disliked_ingredients)
    .bind(&prefs.custom_diets)
    .bind(prefs.calorie_target)
    .bind(prefs.protein_target)
    .bind(prefs.carb_target)
    .bind(prefs.fat_target)
    .fetch_one(db)
    .await
    .context("upsert preferences")?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PreferencesRequest {
        PreferencesRequest {
            is_vegan: true,
            is_gluten_free: true,
            is_nut_free: true,
            allergies: " Soy , ,Peanut".into(),
            preferred_cuisines: "Thai".into(),
            disliked_ingredients: "mushrooms".into(),
            custom_diets: "low fodmap, Vegan".into(),
            protein_target: Some(120),
            ..Default::default()
        }
    }

    #[test]
    fn from_request_rejoins_lists_trimmed() {
        let row = UserPreferences::from_request(Uuid::nil(), &request());
        assert_eq!(row.allergies.as_deref(), Some("Soy,Peanut"));
        assert_eq!(row.preferred_cuisines.as_deref(), Some("Thai"));
        assert_eq!(row.preferred_ingredients, None);
    }

    #[test]
    fn profile_follows_flag_order_then_custom_tags() {
        let profile = UserPreferences::from_request(Uuid::nil(), &request()).to_profile();
        assert_eq!(
            profile.dietary_preferences,
            vec![
                DietaryTag::Vegan,
                DietaryTag::GlutenFree,
                DietaryTag::NutFree,
                DietaryTag::LowFodmap,
            ]
        );
        assert_eq!(profile.allergies, vec!["soy", "peanut"]);
        assert_eq!(profile.cuisines, vec!["thai"]);
        assert!(profile.preferred_ingredients.is_empty());
        assert_eq!(profile.disliked_ingredients, vec!["mushrooms"]);
    }

    #[test]
    fn empty_row_means_no_filtering() {
        assert!(UserPreferences::default().to_profile().is_empty());
    }

    #[test]
    fn view_fills_missing_targets_with_defaults() {
        let view = UserPreferences::from_request(Uuid::nil(), &request()).to_view();
        assert_eq!(
            view.nutritional_goals,
            NutritionalGoals {
                calories: 2000,
                protein: 120,
                carbs: 250,
                fats: 70,
            }
        );
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["dietaryPreferences"][1], "gluten free");
        assert_eq!(json["dietaryPreferences"][2], "tree nuts");
    }
}
