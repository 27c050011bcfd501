use crate::types::CountryRecord;

/// Countries whose name contains `query`, ignoring case.
///
/// - empty query returns every record
/// - relative order of `records` is kept
/// - returns a fresh vector; `records` is never touched
pub fn filter(records: &[CountryRecord], query: &str) -> Vec<CountryRecord> {
    if query.is_empty() {
        return records.to_vec();
    }

    let needle = query.to_lowercase();
    records
        .iter()
        .filter(|r| r.country.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn country(name: &str, active: u64) -> CountryRecord {
        CountryRecord {
            country: name.to_string(),
            active,
            recovered: 0,
            deaths: 0,
        }
    }

    fn sample() -> Vec<CountryRecord> {
        vec![
            country("USA", 900),
            country("India", 800),
            country("Vietnam", 700),
            country("Brazil", 600),
            country("British Virgin Islands", 10),
            country("Côte d'Ivoire", 5),
        ]
    }

    fn names(records: &[CountryRecord]) -> Vec<&str> {
        records.iter().map(|r| r.country.as_str()).collect()
    }

    #[test]
    fn empty_query_returns_everything_in_order() {
        let records = sample();
        assert_eq!(filter(&records, ""), records);
    }

    #[test]
    fn empty_input_returns_empty() {
        assert!(filter(&[], "").is_empty());
        assert!(filter(&[], "vi").is_empty());
    }

    #[test]
    fn case_insensitive_match() {
        let records = vec![country("Vietnam", 1), country("Brazil", 2)];
        for q in ["VI", "vi", "Vi", "vI"] {
            assert_eq!(names(&filter(&records, q)), vec!["Vietnam"], "query {q}");
        }
    }

    #[test]
    fn substring_anywhere_in_name_preserves_order() {
        let records = sample();
        assert_eq!(
            names(&filter(&records, "i")),
            vec!["India", "Vietnam", "Brazil", "British Virgin Islands", "Côte d'Ivoire"]
        );
        assert_eq!(names(&filter(&records, "bri")), vec!["British Virgin Islands"]);
    }

    #[test]
    fn no_match_is_empty_not_error() {
        assert!(filter(&sample(), "atlantis").is_empty());
    }

    #[test]
    fn whitespace_is_part_of_the_query() {
        let records = sample();
        assert_eq!(names(&filter(&records, "n i")), vec!["British Virgin Islands"]);
        assert!(filter(&records, " usa").is_empty());
    }

    #[test]
    fn unicode_names_match_lowercased() {
        assert_eq!(names(&filter(&sample(), "CÔTE")), vec!["Côte d'Ivoire"]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let records = sample();
        for q in ["", "i", "BR", "zz"] {
            let once = filter(&records, q);
            assert_eq!(filter(&once, q), once);
        }
    }

    #[test]
    fn input_is_left_untouched() {
        let records = sample();
        let before = records.clone();
        let _ = filter(&records, "viet");
        assert_eq!(records, before);
    }
}
