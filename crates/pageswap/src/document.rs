//! Document Adapter
//!
//! The narrow view of the browser document a navigation session drives.
//! Everything DOM-shaped goes through this trait, so the controller runs
//! the same against a real page or the headless adapter.

use std::future::Future;
use std::time::Duration;
use url::Url;

/// Browser features detected once at session startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Native view-transition primitive
    pub view_transitions: bool,
    /// `requestIdleCallback` or equivalent
    pub idle_callback: bool,
}

impl Capabilities {
    pub fn full() -> Self {
        Self { view_transitions: true, idle_callback: true }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

/// The link element nearest to an interaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkTarget {
    /// Raw `href` attribute
    pub href: String,
    /// Link carries the opt-out attribute
    pub opt_out: bool,
    /// Link opens another browsing context (`target=_blank`, `download`)
    pub new_context: bool,
}

impl LinkTarget {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            ..Default::default()
        }
    }

    /// Build from a link element's attributes
    ///
    /// `None` when there is no `href`. The link is opted out when it carries
    /// `opt_out_attribute`, and opens a new context with `download` or a
    /// `target` other than `_self`.
    pub fn from_attributes<'a>(
        attrs: impl IntoIterator<Item = (&'a str, &'a str)>,
        opt_out_attribute: &str,
    ) -> Option<Self> {
        let mut href = None;
        let mut link = Self::default();
        for (name, value) in attrs {
            match name {
                "href" => href = Some(value.to_string()),
                "download" => link.new_context = true,
                "target" if !value.is_empty() && !value.eq_ignore_ascii_case("_self") => {
                    link.new_context = true;
                }
                _ if name == opt_out_attribute => link.opt_out = true,
                _ => {}
            }
        }
        link.href = href?;
        Some(link)
    }

    pub fn opted_out(mut self) -> Self {
        self.opt_out = true;
        self
    }

    pub fn in_new_context(mut self) -> Self {
        self.new_context = true;
        self
    }
}

/// A click as seen by the capturing document listener
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickEvent {
    /// Nearest enclosing link, if any
    pub link: Option<LinkTarget>,
    /// Modifier keys or a non-primary button were involved
    pub modified: bool,
}

impl ClickEvent {
    pub fn on(link: LinkTarget) -> Self {
        Self { link: Some(link), modified: false }
    }

    pub fn outside_link() -> Self {
        Self::default()
    }

    pub fn with_modifier(mut self) -> Self {
        self.modified = true;
        self
    }
}

/// Document operations used by the navigation session
///
/// Methods take `&self`: the session is single-threaded and several
/// navigations may hold the adapter at once.
pub trait DocumentAdapter {
    /// Current browser location
    fn location(&self) -> Url;

    fn capabilities(&self) -> Capabilities;

    /// `history.pushState(null, '', path)`
    fn push_history(&self, path: &str);

    /// `location.href = path`, a full browser navigation
    fn assign_location(&self, path: &str);

    fn title(&self) -> String;

    fn set_title(&self, title: &str);

    /// Inner markup of the live content region, `None` when absent
    fn content_region(&self) -> Option<String>;

    /// Replace the live content region; returns `false` when it is missing
    fn replace_content_region(&self, html: &str) -> bool;

    /// Replace the whole document
    fn replace_document(&self, html: &str);

    fn scroll_to_top(&self);

    /// Mark nav links pointing at `path` as active, clear the rest
    fn update_active_nav(&self, path: &str);

    /// Re-attach in-page smooth scrolling to anchor links
    fn bind_anchor_scrolling(&self);

    fn add_content_class(&self, class: &str);

    fn remove_content_class(&self, class: &str);

    /// Resolves on the next CSS transition end on the content root
    fn transition_end(&self) -> impl Future<Output = ()>;

    /// A native view transition is already running
    fn view_transition_active(&self) -> bool;

    /// Run `update` inside a native view transition
    ///
    /// Implementations must invoke `update` before returning.
    fn start_view_transition<'a>(&self, update: Box<dyn FnOnce() + 'a>);

    /// Queue `task` for the next idle period, forced after `timeout`
    fn request_idle_callback(&self, task: Box<dyn FnOnce()>, timeout: Duration);

    /// Queue `task` after `delay`
    fn set_timeout(&self, task: Box<dyn FnOnce()>, delay: Duration);
}
