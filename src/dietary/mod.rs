//! Dietary preference vocabulary and the recipe compliance filter.

pub mod denylist;
pub mod filter;
pub mod matching;
pub mod tags;

pub use denylist::Denylists;
pub use filter::{filter_recipes, FilterOptions, FilterOutcome, FilterPolicy};
pub use tags::{DietaryProfile, DietaryTag};
