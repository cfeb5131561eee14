/// Loose ingredient/term match: either string contains the other.
///
/// Catches plurals and compound names ("egg" ~ "eggs", "egg noodles").
/// Both sides are expected lower-cased; empty strings never match.
pub fn terms_overlap(ingredient: &str, term: &str) -> bool {
    if ingredient.is_empty() || term.is_empty() {
        return false;
    }
    ingredient.contains(term) || term.contains(ingredient)
}

/// Terms from `terms` that match at least one of `ingredients`, in list order.
pub fn matching_terms(ingredients: &[String], terms: &[String]) -> Vec<String> {
    terms
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| ingredients.iter().any(|i| terms_overlap(i, t)))
        .collect()
}

/// True when `terms` is empty or some ingredient matches some term.
pub fn satisfies_preferred(ingredients: &[String], terms: &[String]) -> bool {
    let mut active = terms.iter().filter(|t| !t.trim().is_empty()).peekable();
    if active.peek().is_none() {
        return true;
    }
    active.any(|t| {
        let t = t.trim().to_lowercase();
        ingredients.iter().any(|i| terms_overlap(i, &t))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn overlap_is_bidirectional() {
        assert!(terms_overlap("eggs", "egg"));
        assert!(terms_overlap("egg noodles", "egg"));
        assert!(terms_overlap("egg", "eggs"));
        assert!(!terms_overlap("tofu", "soy"));
    }

    #[test]
    fn empty_sides_never_match() {
        assert!(!terms_overlap("", "soy"));
        assert!(!terms_overlap("soy sauce", ""));
    }

    #[test]
    fn matching_terms_reports_hits_in_order() {
        let ingredients = list(&["tofu", "soy sauce", "peanuts"]);
        let hits = matching_terms(&ingredients, &list(&["Peanut", "soy", "shellfish", " "]));
        assert_eq!(hits, vec!["peanut", "soy"]);
    }

    #[test]
    fn preferred_empty_list_is_unconstrained() {
        assert!(satisfies_preferred(&list(&["rice"]), &[]));
        assert!(satisfies_preferred(&list(&["rice"]), &list(&["", "  "])));
        assert!(satisfies_preferred(&[], &[]));
    }

    #[test]
    fn preferred_requires_one_match() {
        let ingredients = list(&["chickpeas", "spinach"]);
        assert!(satisfies_preferred(&ingredients, &list(&["chickpea", "beef"])));
        assert!(!satisfies_preferred(&ingredients, &list(&["beef"])));
        assert!(!satisfies_preferred(&[], &list(&["beef"])));
    }
}
