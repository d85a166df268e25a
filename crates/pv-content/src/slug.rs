//! Slug validation and unique fixture names

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Disambiguates names generated within the same millisecond
static NAME_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A slug is lowercase ASCII alphanumerics joined by single hyphens.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Convert a title to a slug.
///
/// Runs of non-alphanumeric characters collapse to a single hyphen.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// A title unique to this process run, e.g. `"Test guide 20261019T101500123-0"`
pub fn title_with_timestamp(prefix: &str) -> String {
    let seq = NAME_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{} {}-{}", prefix, Utc::now().format("%Y%m%dT%H%M%S%3f"), seq)
}

/// A slug unique to this process run
pub fn slug_with_timestamp(prefix: &str) -> String {
    slugify(&title_with_timestamp(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_slugs() {
        assert!(is_valid_slug("vat-rates"));
        assert!(is_valid_slug("part2"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("Vat-Rates"));
        assert!(!is_valid_slug("-vat"));
        assert!(!is_valid_slug("vat-"));
        assert!(!is_valid_slug("vat--rates"));
        assert!(!is_valid_slug("vat rates"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Apply for a Licence"), "apply-for-a-licence");
        assert_eq!(slugify("  Tax & Benefits!  "), "tax-benefits");
        assert_eq!(slugify("Part 2: What you need"), "part-2-what-you-need");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_timestamped_names_are_unique() {
        let a = title_with_timestamp("Guide");
        let b = title_with_timestamp("Guide");
        assert_ne!(a, b);
        assert!(a.starts_with("Guide "));
    }

    #[test]
    fn test_timestamped_slug_is_valid() {
        let slug = slug_with_timestamp("Removal test");
        assert!(is_valid_slug(&slug), "{slug}");
        assert!(slug.starts_with("removal-test-"));
    }
}
