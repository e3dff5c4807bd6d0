//! `[PAGE: N]` citation parsing.

use regex::Regex;
use std::sync::OnceLock;

/// Finds the page a model answer cites.
#[derive(Debug, Clone)]
pub struct CitationParser {
    page_tag: Regex,
}

impl CitationParser {
    /// Create a parser for `[PAGE: <digits>]` tags.
    pub fn new() -> Self {
        Self {
            page_tag: Regex::new(r"\[PAGE:\s*(\d+)\]").expect("citation pattern is valid"),
        }
    }

    /// Page number of the first tag in `text`.
    ///
    /// Only the first tag counts, even when the answer cites several pages.
    /// A tag whose digits do not fit in a `u32` yields `None`.
    pub fn first_page(&self, text: &str) -> Option<u32> {
        let captures = self.page_tag.captures(text)?;
        captures.get(1)?.as_str().parse().ok()
    }

    /// Every cited page, in order of appearance.
    pub fn all_pages(&self, text: &str) -> Vec<u32> {
        self.page_tag
            .captures_iter(text)
            .filter_map(|c| c.get(1)?.as_str().parse().ok())
            .collect()
    }
}

impl Default for CitationParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Page number of the first `[PAGE: N]` tag in `text`.
pub fn parse_citation(text: &str) -> Option<u32> {
    static PARSER: OnceLock<CitationParser> = OnceLock::new();
    PARSER.get_or_init(CitationParser::new).first_page(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_tag() {
        assert_eq!(parse_citation("Use CMYK for print [PAGE: 7]"), Some(7));
        assert_eq!(parse_citation("[PAGE:12] at the start"), Some(12));
        assert_eq!(parse_citation("spaces [PAGE:   3]"), Some(3));
    }

    #[test]
    fn test_first_tag_wins() {
        assert_eq!(parse_citation("see [PAGE: 2] and [PAGE: 9]"), Some(2));
        let parser = CitationParser::new();
        assert_eq!(parser.all_pages("see [PAGE: 2] and [PAGE: 9]"), vec![2, 9]);
    }

    #[test]
    fn test_no_or_malformed_tag() {
        assert_eq!(parse_citation("no citation here"), None);
        assert_eq!(parse_citation("Answer [PAGE: abc]"), None);
        assert_eq!(parse_citation("lowercase [page: 4]"), None);
        assert_eq!(parse_citation("[PAGE: 4 ]"), None);
        assert_eq!(parse_citation(""), None);
    }

    #[test]
    fn test_overflowing_digits() {
        assert_eq!(parse_citation("[PAGE: 99999999999999999999]"), None);
    }
}
