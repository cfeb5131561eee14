use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use anyhow::Context;
use tracing::info;

use super::tags::DietaryTag;

/// Ingredient keywords considered incompatible with a dietary tag.
///
/// Used only when a recipe carries no structured flag for the tag. Matching is
/// plain substring containment on lower-cased text, so keywords are stored
/// lower-cased.
#[derive(Debug, Clone, Default)]
pub struct Denylists {
    table: HashMap<DietaryTag, BTreeSet<String>>,
}

impl Denylists {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        use DietaryTag::*;

        let mut lists = Self::empty();
        lists.insert(
            Vegan,
            [
                "meat", "chicken", "beef", "pork", "fish", "egg", "dairy", "milk", "cheese",
                "butter", "cream", "honey",
            ],
        );
        lists.insert(Vegetarian, ["meat", "chicken", "beef", "pork", "fish"]);
        lists.insert(Pescatarian, ["meat", "chicken", "beef", "pork"]);
        lists.insert(
            Ketogenic,
            ["sugar", "flour", "bread", "pasta", "rice", "potato", "corn"],
        );
        lists.insert(
            Paleo,
            [
                "sugar", "flour", "bread", "pasta", "rice", "dairy", "milk", "cheese", "processed",
            ],
        );
        lists.insert(
            GlutenFree,
            ["flour", "bread", "pasta", "wheat", "barley", "rye", "gluten"],
        );
        lists.insert(
            DairyFree,
            ["dairy", "milk", "cheese", "butter", "cream", "yogurt"],
        );
        lists.insert(
            NutFree,
            ["peanut", "almond", "cashew", "walnut", "pecan", "hazelnut", "nut"],
        );
        lists.insert(Halal, ["pork", "alcohol", "gelatin"]);
        lists.insert(Kosher, ["pork", "shellfish"]);
        lists.insert(
            LowCarb,
            ["sugar", "flour", "bread", "pasta", "rice", "potato"],
        );
        lists.insert(LowFat, ["butter", "cream", "lard", "bacon"]);
        lists
    }

    /// Replace or create the keyword set for `tag`.
    pub fn insert<I, S>(&mut self, tag: DietaryTag, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        self.table.insert(tag, set);
    }

    pub fn get(&self, tag: &DietaryTag) -> Option<&BTreeSet<String>> {
        self.table.get(tag)
    }

    /// Alphabetically first keyword of `tag`'s list contained in any of `texts`.
    pub fn first_hit<'a>(&'a self, tag: &DietaryTag, texts: &[String]) -> Option<&'a str> {
        let keywords = self.get(tag)?;
        keywords
            .iter()
            .find(|kw| texts.iter().any(|t| t.contains(kw.as_str())))
            .map(String::as_str)
    }

    /// Parse a `{ "tag": ["keyword", ...] }` JSON document.
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let parsed: BTreeMap<String, Vec<String>> =
            serde_json::from_str(raw).context("parse denylist json")?;
        let mut lists = Self::empty();
        for (tag, keywords) in parsed {
            if let Some(tag) = DietaryTag::parse(&tag) {
                lists.insert(tag, keywords);
            }
        }
        Ok(lists)
    }

    /// Built-in table, or the table from `path` when one is configured.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::with_defaults());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read denylist file {}", path.display()))?;
        let lists = Self::from_json(&raw)?;
        info!(path = %path.display(), tags = lists.table.len(), "loaded dietary denylists");
        Ok(lists)
    }
}
