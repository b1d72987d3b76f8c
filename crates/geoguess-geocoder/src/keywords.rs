//! City-center synonyms used to discover central sub-areas.

/// Search terms spanning English, Spanish/Portuguese, French, Italian,
/// German and CJK names for a city's central district.
pub const CENTER_KEYWORDS: &[&str] = &[
    "downtown",
    "city centre",
    "city center",
    "town centre",
    "central business district",
    "CBD",
    "old town",
    "historic center",
    "centro",
    "centro histórico",
    "centro storico",
    "centre-ville",
    "centre historique",
    "vieille ville",
    "altstadt",
    "innenstadt",
    "stadtmitte",
    "zentrum",
    "casco antiguo",
    "baixa",
    "市中心",
    "中心城区",
    "老城区",
    "商业区",
    "都心",
    "中心街",
    "旧市街",
    "시내",
    "도심",
    "medina",
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn keywords_are_unique() {
        let unique: HashSet<_> = CENTER_KEYWORDS.iter().collect();
        assert_eq!(unique.len(), CENTER_KEYWORDS.len());
    }

    #[test]
    fn keyword_list_size_is_bounded() {
        assert!((20..=40).contains(&CENTER_KEYWORDS.len()));
    }
}
