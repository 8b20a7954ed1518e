//! Version string ordering
//!
//! Versions are canonicalised into segments: `-`, `_` and `+` act as
//! separators, and a separator is implied wherever digits meet non-digits
//! (`1.0rc1` reads as `1.0.rc.1`). Segments then compare left to right.

use std::cmp::Ordering;

/// Named pre/post-release forms, matched by prefix in this order.
/// Unlisted words rank below all of them.
const SPECIAL_FORMS: &[(&str, u8)] = &[
    ("dev", 1),
    ("alpha", 2),
    ("a", 2),
    ("beta", 3),
    ("b", 3),
    ("RC", 4),
    ("rc", 4),
    ("pl", 6),
    ("p", 6),
];

/// Rank shared by all numeric segments, between `rc` and `pl`
const NUMBER_RANK: u8 = 5;

/// One canonical version segment
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    /// Digits with leading zeros stripped
    Number(&'a str),
    /// A word, reduced to its special-form rank
    Word(u8),
}

impl Segment<'_> {
    fn rank(&self) -> u8 {
        match self {
            Self::Number(_) => NUMBER_RANK,
            Self::Word(rank) => *rank,
        }
    }
}

impl Ord for Segment<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            // Numbers of any length: more digits is bigger, then lexicographic
            (Self::Number(a), Self::Number(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Segment<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Missing trailing segments count as `0`
const ZERO: Segment<'static> = Segment::Number("");

fn word_rank(word: &str) -> u8 {
    SPECIAL_FORMS
        .iter()
        .find(|(form, _)| word.starts_with(*form))
        .map(|(_, rank)| *rank)
        .unwrap_or(0)
}

fn segments(version: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut prev_digit: Option<bool> = None;

    for (i, c) in version.char_indices() {
        if matches!(c, '.' | '-' | '_' | '+') {
            if start < i {
                out.push(to_segment(&version[start..i]));
            }
            start = i + c.len_utf8();
            prev_digit = None;
            continue;
        }
        let digit = c.is_ascii_digit();
        if prev_digit.is_some_and(|p| p != digit) && start < i {
            out.push(to_segment(&version[start..i]));
            start = i;
        }
        prev_digit = Some(digit);
    }
    if start < version.len() {
        out.push(to_segment(&version[start..]));
    }
    out
}

fn to_segment(raw: &str) -> Segment<'_> {
    if raw.bytes().all(|b| b.is_ascii_digit()) {
        Segment::Number(raw.trim_start_matches('0'))
    } else {
        Segment::Word(word_rank(raw))
    }
}

/// Compare two version strings
///
/// Returns `Ordering::Less` when `a` is older than `b`. Numeric segments
/// compare numerically, `1.2 == 1.2.0`, and pre-release words sort before
/// the plain release (`2.0-beta < 2.0`, `5.0-RC1 < 5.0`).
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let seg_a = segments(a.trim());
    let seg_b = segments(b.trim());

    let max_len = seg_a.len().max(seg_b.len());
    for i in 0..max_len {
        let sa = seg_a.get(i).unwrap_or(&ZERO);
        let sb = seg_b.get(i).unwrap_or(&ZERO);
        match sa.cmp(sb) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Shorthand for `compare_versions(installed, other) == Less`
pub fn is_older(installed: &str, other: &str) -> bool {
    compare_versions(installed, other) == Ordering::Less
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_strings_are_equal() {
        for v in ["", "1", "1.0", "5.8.1", "2.0-beta", "1.0rc1", "weird", "1..2"] {
            assert_eq!(compare_versions(v, v), Ordering::Equal, "{v}");
        }
    }

    #[test]
    fn numeric_segments_compare_numerically() {
        assert_eq!(compare_versions("1.2", "1.10"), Ordering::Less);
        assert_eq!(compare_versions("1.10", "1.9"), Ordering::Greater);
        assert_eq!(compare_versions("5.8", "5.8.1"), Ordering::Less);
        assert_eq!(compare_versions("01.2", "1.2"), Ordering::Equal);
    }

    #[test]
    fn missing_segments_are_zero() {
        assert_eq!(compare_versions("1.2", "1.2.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.2.0.0", "1.2"), Ordering::Equal);
        assert_eq!(compare_versions("1.2", "1.2.1"), Ordering::Less);
    }

    #[test]
    fn suffixes_sort_before_release() {
        assert_eq!(compare_versions("2.0-beta", "2.0"), Ordering::Less);
        assert_eq!(compare_versions("2.0rc1", "2.0"), Ordering::Less);
        assert_eq!(compare_versions("5.0-RC1", "5.0"), Ordering::Less);
        assert_eq!(compare_versions("2.0-alpha", "2.0-beta"), Ordering::Less);
        assert_eq!(compare_versions("2.0-dev", "2.0-alpha"), Ordering::Less);
        assert_eq!(compare_versions("2.0-beta2", "2.0-beta10"), Ordering::Less);
        assert_eq!(compare_versions("2.0", "2.0-pl1"), Ordering::Less);
    }

    #[test]
    fn huge_numbers_do_not_overflow() {
        assert_eq!(
            compare_versions("1.99999999999999999999999", "1.100000000000000000000000"),
            Ordering::Less
        );
    }

    #[test]
    fn ordering_is_antisymmetric_and_transitive() {
        let lattice = [
            "0.9", "1.0-dev", "1.0a1", "1.0-beta", "1.0b2", "1.0-rc1", "1.0", "1.0.0",
            "1.0.1", "1.0-pl1", "1.2", "1.10", "2.0-beta", "2.0", "10.0",
        ];
        for a in lattice {
            for b in lattice {
                assert_eq!(
                    compare_versions(a, b),
                    compare_versions(b, a).reverse(),
                    "{a} vs {b}"
                );
                for c in lattice {
                    if compare_versions(a, b) != Ordering::Greater
                        && compare_versions(b, c) != Ordering::Greater
                    {
                        assert_ne!(compare_versions(a, c), Ordering::Greater, "{a} {b} {c}");
                    }
                }
            }
        }
    }

    #[test]
    fn is_older_matches_less() {
        assert!(is_older("1.0", "1.5"));
        assert!(!is_older("1.0", "0.9"));
        assert!(!is_older("1.0", "1.0"));
    }
}
