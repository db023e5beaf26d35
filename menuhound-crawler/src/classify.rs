//! Menu-link classification.

use url::Url;

/// Keywords that mark a link as menu-related, matched case-insensitively
/// against the normalized URL and the anchor's visible text.
pub const MENU_KEYWORDS: &[&str] = &["menu", "menus", "carte", "la-carte", "food"];

/// How an anchor looks before any network verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    /// Keyword hit; recorded immediately as a page link.
    Page,
    /// `.pdf` suffix; kept only after a HEAD confirms `application/pdf`.
    Pdf,
    /// Not menu-related.
    None,
}

pub fn is_pdf_url(url: &Url) -> bool {
    url.path().to_ascii_lowercase().ends_with(".pdf")
}

pub fn keyword_match(normalized_url: &str, link_text: &str) -> bool {
    let url_lower = normalized_url.to_ascii_lowercase();
    let text_lower = link_text.to_ascii_lowercase();
    MENU_KEYWORDS
        .iter()
        .any(|kw| url_lower.contains(kw) || text_lower.contains(kw))
}

/// Classify one anchor. The `.pdf` suffix takes precedence over keywords so
/// the link goes through HEAD verification instead of being kept blind.
pub fn classify(url: &Url, normalized_url: &str, link_text: &str) -> Candidate {
    if is_pdf_url(url) {
        Candidate::Pdf
    } else if keyword_match(normalized_url, link_text) {
        Candidate::Page
    } else {
        Candidate::None
    }
}
