//! pageswap HTML
//!
//! Extracts swap-relevant parts of a fetched page, built on html5ever.

mod parser;

pub use parser::{collapse_whitespace, PageParser};

/// Parse a page into its swap-relevant parts
pub fn parse(html: &str) -> Result<ParsedPage, HtmlError> {
    PageParser::new().parse(html)
}

/// Result of parsing a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    /// Normalized `<title>` text
    pub title: Option<String>,
    /// Inner markup of the main content region, if the page has one
    pub content: Option<String>,
    /// `href` values of links inside `header nav`
    pub nav_links: Vec<String>,
}

impl ParsedPage {
    /// Title to apply, empty when the page has none
    pub fn title_or_empty(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    /// Whether the page carries a swappable content region
    pub fn has_content_region(&self) -> bool {
        self.content.is_some()
    }
}

/// Extraction error
#[derive(Debug, thiserror::Error)]
pub enum HtmlError {
    #[error("Failed to serialize content region: {0}")]
    Serialize(#[source] std::io::Error),
}
