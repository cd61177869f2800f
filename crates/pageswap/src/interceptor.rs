//! Link Interception
//!
//! Decides, per click, whether the browser keeps its default navigation or
//! the session swaps the page in place.

use crate::document::{ClickEvent, LinkTarget};
use crate::guard::ActiveNavigation;
use crate::session::NavigationRequest;
use url::Url;

/// What to do with a click
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickDecision {
    /// Not ours: let the browser navigate
    PassThrough,
    /// Prevent the default action and do nothing else
    Suppress,
    /// Prevent the default action and swap to the request
    Navigate(NavigationRequest),
}

impl ClickDecision {
    /// Whether the host must call `preventDefault()`
    pub fn prevents_default(&self) -> bool {
        !matches!(self, ClickDecision::PassThrough)
    }
}

/// Request path (pathname plus query) of a URL
pub fn request_path(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

/// Resolve an `href` to a same-origin request URL, `None` for links the
/// browser should handle itself
pub fn resolve_internal(href: &str, location: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    // Anything carrying its own scheme (http:, mailto:, tel:, javascript:)
    // is external
    if Url::parse(href).is_ok() {
        return None;
    }

    let resolved = location.join(href).ok()?;
    if resolved.origin() != location.origin() {
        return None;
    }
    Some(resolved)
}

/// Link filter shared by click interception and prefetching
pub fn internal_link_path(link: &LinkTarget, location: &Url) -> Option<String> {
    if link.opt_out || link.new_context {
        return None;
    }
    resolve_internal(&link.href, location).map(|url| request_path(&url))
}

/// Classify a click
pub fn decide_click(event: &ClickEvent, location: &Url, active: &ActiveNavigation) -> ClickDecision {
    let Some(link) = &event.link else {
        return ClickDecision::PassThrough;
    };
    if event.modified || link.opt_out || link.new_context {
        return ClickDecision::PassThrough;
    }
    let Some(resolved) = resolve_internal(&link.href, location) else {
        return ClickDecision::PassThrough;
    };
    let path = request_path(&resolved);

    if path == active.current_path() {
        // In-page anchors on the current page scroll natively
        if resolved.fragment().is_some() {
            return ClickDecision::PassThrough;
        }
        tracing::trace!("Click on current path {} suppressed", path);
        return ClickDecision::Suppress;
    }

    if active.in_flight_path() == Some(path.as_str()) {
        tracing::trace!("Navigation to {} already in flight", path);
        return ClickDecision::Suppress;
    }

    ClickDecision::Navigate(NavigationRequest::click(path))
}
