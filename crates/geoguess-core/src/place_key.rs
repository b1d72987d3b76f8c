use serde::{Deserialize, Serialize};

const COUNTRY_SEPARATOR: &str = "__";

/// Normalized cache key for a city, optionally qualified by country.
///
/// City and country are trimmed and lower-cased; the country is appended
/// after `__` only when it is non-empty, so `(" Paris ", Some("FRANCE"))`
/// and `("paris", Some("france"))` produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceKey(String);

impl PlaceKey {
    #[must_use]
    pub fn new(city: &str, country: Option<&str>) -> Self {
        let city = city.trim().to_lowercase();
        match country.map(|c| c.trim().to_lowercase()) {
            Some(country) if !country.is_empty() => {
                Self(format!("{city}{COUNTRY_SEPARATOR}{country}"))
            }
            _ => Self(city),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File-system safe rendering used for per-key cache files.
    ///
    /// Characters that are not allowed in file names, and `%` itself, are
    /// written as `%XX`, so distinct keys never share a file.
    #[must_use]
    pub fn file_stem(&self) -> String {
        let mut stem = String::with_capacity(self.0.len());
        for c in self.0.chars() {
            match c {
                '%' | '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => {
                    stem.push_str(&format!("%{:02X}", u32::from(c)));
                }
                other => stem.push(other),
            }
        }
        stem
    }
}

impl std::fmt::Display for PlaceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn casing_and_whitespace_are_cosmetic() {
        assert_eq!(
            PlaceKey::new(" Paris ", Some("FRANCE")),
            PlaceKey::new("paris", Some("france"))
        );
    }

    #[test]
    fn empty_country_is_omitted() {
        assert_eq!(PlaceKey::new("Shanghai", Some("  ")).as_str(), "shanghai");
        assert_eq!(PlaceKey::new("Shanghai", None).as_str(), "shanghai");
    }

    #[test]
    fn country_is_appended_with_separator() {
        assert_eq!(PlaceKey::new("New York", Some("US")).as_str(), "new york__us");
    }

    #[test]
    fn file_stem_keeps_ordinary_names() {
        let key = PlaceKey::new("São Paulo", Some("BR"));
        assert_eq!(key.file_stem(), "são paulo__br");
    }

    #[test]
    fn file_stem_escapes_path_separators() {
        assert_eq!(PlaceKey::new("Frankfurt/Main", None).file_stem(), "frankfurt%2Fmain");
        assert_eq!(PlaceKey::new("a:b", None).file_stem(), "a%3Ab");
    }

    #[test]
    fn file_stems_of_distinct_keys_never_collide() {
        let keys = ["a/b", "a_b", "a%2Fb", "a%b", "a\\b"].map(|c| PlaceKey::new(c, None));
        let stems: std::collections::HashSet<String> =
            keys.iter().map(PlaceKey::file_stem).collect();
        assert_eq!(stems.len(), keys.len());
    }

    #[test]
    fn serializes_as_plain_string() {
        let key = PlaceKey::new("Tokyo", Some("JP"));
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"tokyo__jp\"");
    }
}
