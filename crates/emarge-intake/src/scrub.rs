//! Markup scrubbing for free-text identity fields.

use std::sync::LazyLock;

use regex::Regex;

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<[^>]*>").expect("static pattern")
});

/// Remove all markup from a free-text field, keeping text content only.
pub fn strip_markup(input: &str) -> String {
    TAG.replace_all(input, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(strip_markup("Marie Curie"), "Marie Curie");
    }

    #[test]
    fn tags_are_removed_content_kept() {
        assert_eq!(
            strip_markup("<script>alert(1)</script>Marie <b>Curie</b>"),
            "alert(1)Marie Curie"
        );
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(strip_markup("  <p>Lyon</p>  "), "Lyon");
    }
}
