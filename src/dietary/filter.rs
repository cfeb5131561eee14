//! Dietary compliance filter.
//!
//! Decides, per candidate recipe, whether it may be shown to a user with a
//! given [`DietaryProfile`]. Pure and synchronous: no I/O, never fails.
//!
//! A recipe is accepted when
//! - every requested tag is satisfied (strict policy only; best-effort records
//!   failures without excluding),
//! - no ingredient matches an allergy or a disliked ingredient,
//! - at least one ingredient matches a preferred ingredient, when any are set.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::denylist::Denylists;
use super::matching::{matching_terms, satisfies_preferred};
use super::tags::{DietaryProfile, DietaryTag};
use crate::recipes::model::Recipe;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterPolicy {
    /// Every requested tag must be satisfied.
    #[default]
    Strict,
    /// Tag failures are recorded but do not exclude the recipe.
    BestEffort,
}

impl FilterPolicy {
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            Self::Strict
        } else {
            Self::BestEffort
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOptions {
    pub policy: FilterPolicy,
    pub page_size: usize,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            policy: FilterPolicy::Strict,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Why a tag was judged unsatisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TagFailure {
    /// The recipe's own flag for the tag is false.
    Flag { tag: DietaryTag },
    /// Title or ingredients contain a denylisted keyword.
    Keyword { tag: DietaryTag, keyword: String },
}

/// Outcome of evaluating one recipe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub accepted: bool,
    pub failed_tags: Vec<TagFailure>,
    pub allergens: Vec<String>,
    pub disliked: Vec<String>,
    pub missing_preferred: bool,
}

impl Verdict {
    pub fn is_fully_compliant(&self) -> bool {
        self.failed_tags.is_empty()
            && self.allergens.is_empty()
            && self.disliked.is_empty()
            && !self.missing_preferred
    }

    pub fn reasons(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .failed_tags
            .iter()
            .map(|f| match f {
                TagFailure::Flag { tag } => format!("not {tag}"),
                TagFailure::Keyword { tag, keyword } => format!("not {tag}: contains {keyword}"),
            })
            .collect();
        out.extend(self.allergens.iter().map(|a| format!("allergen: {a}")));
        out.extend(self.disliked.iter().map(|d| format!("disliked: {d}")));
        if self.missing_preferred {
            out.push("no preferred ingredient".to_string());
        }
        out
    }
}

/// A recipe kept by a best-effort pass despite failing some tags.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NonCompliance {
    pub recipe_id: i64,
    pub title: String,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutcome {
    pub recipes: Vec<Recipe>,
    pub non_compliant: Vec<NonCompliance>,
    pub rejected: usize,
}

/// The recipe's own flag for `tag`, if the provider sent one.
pub fn recipe_flag(recipe: &Recipe, tag: &DietaryTag) -> Option<bool> {
    match tag {
        DietaryTag::Vegan => recipe.vegan,
        DietaryTag::Vegetarian => recipe.vegetarian,
        DietaryTag::GlutenFree => recipe.gluten_free,
        DietaryTag::DairyFree => recipe.dairy_free,
        DietaryTag::Ketogenic => recipe.ketogenic,
        DietaryTag::Paleo => recipe.paleo,
        DietaryTag::LowFodmap => recipe.low_fodmap,
        _ => None,
    }
}

fn searchable_text(recipe: &Recipe) -> Vec<String> {
    let mut texts = Vec::with_capacity(1 + recipe.extended_ingredients.as_ref().map_or(0, Vec::len));
    let title = recipe.title.trim().to_lowercase();
    if !title.is_empty() {
        texts.push(title);
    }
    texts.extend(recipe.ingredient_names());
    texts
}

fn check_tag(
    recipe: &Recipe,
    tag: &DietaryTag,
    texts: &[String],
    denylists: &Denylists,
) -> Option<TagFailure> {
    if let Some(flag) = recipe_flag(recipe, tag) {
        return (!flag).then(|| TagFailure::Flag { tag: tag.clone() });
    }
    if denylists.get(tag).is_none() {
        debug!(recipe_id = recipe.id, %tag, "no flag or denylist for tag; passing");
        return None;
    }
    denylists.first_hit(tag, texts).map(|kw| TagFailure::Keyword {
        tag: tag.clone(),
        keyword: kw.to_string(),
    })
}

/// Does `recipe` satisfy `tag`? Flag first, denylist fallback, otherwise pass.
pub fn satisfies_tag(recipe: &Recipe, tag: &DietaryTag, denylists: &Denylists) -> bool {
    check_tag(recipe, tag, &searchable_text(recipe), denylists).is_none()
}

pub fn evaluate(
    recipe: &Recipe,
    profile: &DietaryProfile,
    denylists: &Denylists,
    policy: FilterPolicy,
) -> Verdict {
    if recipe.extended_ingredients.is_none() {
        debug!(recipe_id = recipe.id, "recipe has no ingredient list");
    }

    let texts = searchable_text(recipe);
    let failed_tags: Vec<TagFailure> = profile
        .dietary_preferences
        .iter()
        .filter_map(|tag| check_tag(recipe, tag, &texts, denylists))
        .collect();

    let ingredients = recipe.ingredient_names();
    let allergens = matching_terms(&ingredients, &profile.allergies);
    let disliked = matching_terms(&ingredients, &profile.disliked_ingredients);
    let missing_preferred = !satisfies_preferred(&ingredients, &profile.preferred_ingredients);

    let tags_ok = match policy {
        FilterPolicy::Strict => failed_tags.is_empty(),
        FilterPolicy::BestEffort => true,
    };
    let accepted = tags_ok && allergens.is_empty() && disliked.is_empty() && !missing_preferred;

    Verdict {
        accepted,
        failed_tags,
        allergens,
        disliked,
        missing_preferred,
    }
}

/// Keep the recipes acceptable for `profile`, in input order, at most
/// `options.page_size` of them.
pub fn filter_recipes(
    candidates: Vec<Recipe>,
    profile: &DietaryProfile,
    denylists: &Denylists,
    options: FilterOptions,
) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();
    let total = candidates.len();

    for recipe in candidates {
        if outcome.recipes.len() >= options.page_size {
            break;
        }
        let verdict = evaluate(&recipe, profile, denylists, options.policy);
        if !verdict.accepted {
            debug!(recipe_id = recipe.id, reasons = ?verdict.reasons(), "recipe rejected");
            outcome.rejected += 1;
            continue;
        }
        if !verdict.is_fully_compliant() {
            outcome.non_compliant.push(NonCompliance {
                recipe_id: recipe.id,
                title: recipe.title.clone(),
                reasons: verdict.reasons(),
            });
        }
        outcome.recipes.push(recipe);
    }

    debug!(
        total,
        kept = outcome.recipes.len(),
        rejected = outcome.rejected,
        flagged = outcome.non_compliant.len(),
        "dietary filter applied"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipes::model::Ingredient;

    fn ingredient(name: &str) -> Ingredient {
        Ingredient {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn recipe(id: i64, title: &str, ingredients: &[&str]) -> Recipe {
        Recipe {
            id,
            title: title.to_string(),
            extended_ingredients: Some(ingredients.iter().map(|n| ingredient(n)).collect()),
            ..Default::default()
        }
    }

    fn profile(tags: &[&str]) -> DietaryProfile {
        DietaryProfile {
            dietary_preferences: tags.iter().filter_map(|t| DietaryTag::parse(t)).collect(),
            ..Default::default()
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn ids(outcome: &FilterOutcome) -> Vec<i64> {
        outcome.recipes.iter().map(|r| r.id).collect()
    }

    fn sample_feed() -> Vec<Recipe> {
        let mut tofu = recipe(1, "Tofu Stir Fry", &["tofu", "soy sauce", "broccoli"]);
        tofu.vegan = Some(true);
        tofu.gluten_free = Some(false);
        let mut chickpea = recipe(2, "Chickpea Curry", &["chickpeas", "spinach", "coconut milk"]);
        chickpea.vegan = Some(true);
        let carbonara = recipe(3, "Spaghetti Carbonara", &["pasta", "eggs", "pecorino cheese"]);
        let chicken = recipe(4, "Chicken Stir Fry", &["chicken breast", "rice", "garlic"]);
        let mut salad = recipe(5, "Mushroom Salad", &["mushrooms", "arugula"]);
        salad.vegan = Some(true);
        salad.gluten_free = Some(true);
        vec![tofu, chickpea, carbonara, chicken, salad]
    }

    #[test]
    fn empty_profile_is_identity_up_to_page_size() {
        let feed: Vec<Recipe> = (1..=15).map(|i| recipe(i, "Dish", &["salt"])).collect();
        let lists = Denylists::with_defaults();

        let out = filter_recipes(feed.clone(), &DietaryProfile::default(), &lists, FilterOptions::default());
        assert_eq!(out.recipes, feed[..10].to_vec());
        assert_eq!(out.rejected, 0);

        let short = sample_feed();
        let out = filter_recipes(short.clone(), &DietaryProfile::default(), &lists, FilterOptions::default());
        assert_eq!(out.recipes, short);
    }

    #[test]
    fn flag_is_ground_truth_when_present() {
        let lists = Denylists::with_defaults();
        let mut r = recipe(1, "Beef Stew", &["beef", "carrots"]);
        r.vegan = Some(true);
        assert!(satisfies_tag(&r, &DietaryTag::Vegan, &lists));

        let mut r = recipe(2, "Green Salad", &["lettuce"]);
        r.vegan = Some(false);
        assert!(!satisfies_tag(&r, &DietaryTag::Vegan, &lists));

        for (flag, tag) in [
            (true, DietaryTag::GlutenFree),
            (false, DietaryTag::DairyFree),
            (true, DietaryTag::Ketogenic),
            (false, DietaryTag::Paleo),
            (true, DietaryTag::LowFodmap),
            (false, DietaryTag::Vegetarian),
        ] {
            let mut r = recipe(3, "Bread and Butter Pasta", &["flour", "butter", "sugar"]);
            r.gluten_free = Some(flag);
            r.dairy_free = Some(flag);
            r.ketogenic = Some(flag);
            r.paleo = Some(flag);
            r.low_fodmap = Some(flag);
            r.vegetarian = Some(flag);
            assert_eq!(satisfies_tag(&r, &tag, &lists), flag, "{tag}");
        }
    }

    #[test]
    fn missing_flag_falls_back_to_denylist() {
        let lists = Denylists::with_defaults();
        let with_meat = recipe(1, "Hearty Dinner", &["beef mince", "onion"]);
        let plain = recipe(2, "Hearty Dinner", &["lentils", "onion"]);
        let in_title = recipe(3, "Honey Glazed Carrots", &["carrots"]);

        assert!(!satisfies_tag(&with_meat, &DietaryTag::Vegetarian, &lists));
        assert!(satisfies_tag(&plain, &DietaryTag::Vegetarian, &lists));
        assert!(!satisfies_tag(&in_title, &DietaryTag::Vegan, &lists));
        assert!(satisfies_tag(&in_title, &DietaryTag::Vegetarian, &lists));
    }

    #[test]
    fn flagless_tags_always_use_denylist() {
        let lists = Denylists::with_defaults();
        let r = recipe(1, "Pork Belly", &["pork belly", "soy sauce"]);
        assert!(!satisfies_tag(&r, &DietaryTag::Halal, &lists));
        assert!(!satisfies_tag(&r, &DietaryTag::Kosher, &lists));
        assert!(satisfies_tag(&r, &DietaryTag::NutFree, &lists));
    }

    #[test]
    fn tags_without_any_rule_pass() {
        let r = recipe(1, "Pork Belly", &["pork belly"]);
        assert!(satisfies_tag(&r, &DietaryTag::Custom("whole30".into()), &Denylists::with_defaults()));
        assert!(satisfies_tag(&r, &DietaryTag::Halal, &Denylists::empty()));
    }

    #[test]
    fn vegan_soy_allergy_scenario() {
        let lists = Denylists::with_defaults();
        let prefs = DietaryProfile {
            dietary_preferences: vec![DietaryTag::Vegan],
            allergies: strings(&["soy"]),
            disliked_ingredients: strings(&["mushrooms"]),
            ..Default::default()
        };
        let mut a = recipe(1, "Recipe A", &["tofu", "soy sauce"]);
        a.vegan = Some(true);
        let mut b = recipe(2, "Recipe B", &["chickpeas", "spinach"]);
        b.vegan = Some(true);

        let va = evaluate(&a, &prefs, &lists, FilterPolicy::Strict);
        assert!(!va.accepted);
        assert!(va.failed_tags.is_empty());
        assert_eq!(va.allergens, vec!["soy"]);

        let vb = evaluate(&b, &prefs, &lists, FilterPolicy::Strict);
        assert!(vb.accepted);
        assert!(vb.is_fully_compliant());

        let out = filter_recipes(vec![a, b], &prefs, &lists, FilterOptions::default());
        assert_eq!(ids(&out), vec![2]);
    }

    #[test]
    fn gluten_free_carbonara_rejected_by_denylist() {
        let lists = Denylists::with_defaults();
        let prefs = profile(&["gluten free"]);
        let r = recipe(7, "Spaghetti Carbonara", &["pasta", "eggs", "guanciale"]);
        assert!(r.gluten_free.is_none());

        let v = evaluate(&r, &prefs, &lists, FilterPolicy::Strict);
        assert!(!v.accepted);
        assert_eq!(
            v.failed_tags,
            vec![TagFailure::Keyword {
                tag: DietaryTag::GlutenFree,
                keyword: "pasta".into()
            }]
        );
    }

    #[test]
    fn disliked_ingredient_rejects() {
        let prefs = DietaryProfile {
            disliked_ingredients: strings(&["mushroom"]),
            ..Default::default()
        };
        let out = filter_recipes(sample_feed(), &prefs, &Denylists::with_defaults(), FilterOptions::default());
        assert_eq!(ids(&out), vec![1, 2, 3, 4]);
        assert_eq!(out.rejected, 1);
    }

    #[test]
    fn allergy_exclusion_is_monotonic() {
        let lists = Denylists::with_defaults();
        let mut prefs = profile(&[]);
        let mut previous = ids(&filter_recipes(sample_feed(), &prefs, &lists, FilterOptions::default()));
        for allergy in ["garlic", "soy", "egg", "spinach", "arugula"] {
            prefs.allergies.push(allergy.to_string());
            let current = ids(&filter_recipes(sample_feed(), &prefs, &lists, FilterOptions::default()));
            assert!(current.iter().all(|id| previous.contains(id)), "{allergy} grew the set");
            assert!(current.len() <= previous.len());
            previous = current;
        }
        assert!(previous.is_empty());
    }

    #[test]
    fn preferred_inclusion_is_monotonic_after_first_term() {
        let lists = Denylists::with_defaults();
        let mut prefs = profile(&[]);
        let unconstrained = ids(&filter_recipes(sample_feed(), &prefs, &lists, FilterOptions::default()));
        assert_eq!(unconstrained.len(), 5);

        prefs.preferred_ingredients.push("spinach".into());
        let one = ids(&filter_recipes(sample_feed(), &prefs, &lists, FilterOptions::default()));
        assert_eq!(one, vec![2]);

        prefs.preferred_ingredients.push("tofu".into());
        let two = ids(&filter_recipes(sample_feed(), &prefs, &lists, FilterOptions::default()));
        assert_eq!(two, vec![1, 2]);
    }

    #[test]
    fn strict_rejects_and_best_effort_flags() {
        let lists = Denylists::with_defaults();
        let prefs = profile(&["vegan", "gluten free"]);

        let strict = filter_recipes(sample_feed(), &prefs, &lists, FilterOptions::default());
        assert_eq!(ids(&strict), vec![2, 5]);
        assert!(strict.non_compliant.is_empty());
        assert_eq!(strict.rejected, 3);

        let relaxed = FilterOptions {
            policy: FilterPolicy::BestEffort,
            ..Default::default()
        };
        let best = filter_recipes(sample_feed(), &prefs, &lists, relaxed);
        assert_eq!(ids(&best), vec![1, 2, 3, 4, 5]);
        let flagged: Vec<i64> = best.non_compliant.iter().map(|n| n.recipe_id).collect();
        assert_eq!(flagged, vec![1, 3, 4]);
        assert_eq!(best.non_compliant[0].reasons, vec!["not gluten free"]);
        assert!(best.non_compliant[1]
            .reasons
            .iter()
            .any(|r| r == "not gluten free: contains pasta"));
    }

    #[test]
    fn best_effort_still_enforces_allergies() {
        let lists = Denylists::with_defaults();
        let prefs = DietaryProfile {
            dietary_preferences: vec![DietaryTag::Vegan],
            allergies: strings(&["egg"]),
            ..Default::default()
        };
        let relaxed = FilterOptions {
            policy: FilterPolicy::BestEffort,
            ..Default::default()
        };
        let out = filter_recipes(sample_feed(), &prefs, &lists, relaxed);
        assert!(!ids(&out).contains(&3));
    }

    #[test]
    fn filtering_is_idempotent() {
        let lists = Denylists::with_defaults();
        let prefs = DietaryProfile {
            dietary_preferences: vec![DietaryTag::Vegetarian],
            allergies: strings(&["peanut"]),
            ..Default::default()
        };
        for policy in [FilterPolicy::Strict, FilterPolicy::BestEffort] {
            let opts = FilterOptions { policy, page_size: 3 };
            let once = filter_recipes(sample_feed(), &prefs, &lists, opts);
            let twice = filter_recipes(once.recipes.clone(), &prefs, &lists, opts);
            assert_eq!(once.recipes, twice.recipes);
        }
    }

    #[test]
    fn missing_data_is_permissive() {
        let lists = Denylists::with_defaults();
        let prefs = DietaryProfile {
            dietary_preferences: vec![DietaryTag::Vegan],
            allergies: strings(&["soy"]),
            ..Default::default()
        };
        let bare = Recipe {
            id: 9,
            title: "Mystery Dish".into(),
            ..Default::default()
        };
        let v = evaluate(&bare, &prefs, &lists, FilterPolicy::Strict);
        assert!(v.accepted);
    }

    #[test]
    fn page_size_counts_accepted_recipes_only() {
        let lists = Denylists::with_defaults();
        let prefs = profile(&["vegetarian"]);
        let mut feed = vec![recipe(100, "Beef Tacos", &["beef"])];
        feed.extend((1..=12).map(|i| recipe(i, "Bean Bowl", &["beans"])));
        let out = filter_recipes(feed, &prefs, &lists, FilterOptions::default());
        assert_eq!(out.recipes.len(), 10);
        assert_eq!(out.recipes[0].id, 1);
        assert_eq!(out.rejected, 1);
    }
}
