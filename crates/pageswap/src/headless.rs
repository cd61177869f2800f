//! Headless Document
//!
//! In-memory `DocumentAdapter` backed by the page extractor: it keeps the
//! location, a history stack, title, content region and header nav links,
//! and queues deferred tasks until the host drains them. Used by the CLI
//! and by tests.

use crate::document::{Capabilities, DocumentAdapter};
use crate::interceptor::{request_path, resolve_internal};
use pageswap_html::HtmlError;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, VecDeque};
use std::future::Future;
use std::time::Duration;
use url::Url;

/// A header nav link and its active marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub href: String,
    pub active: bool,
}

#[derive(Debug)]
struct History {
    entries: Vec<Url>,
    current: usize,
}

impl History {
    fn push(&mut self, url: Url) {
        // Pushing drops forward history
        self.entries.truncate(self.current + 1);
        self.entries.push(url);
        self.current = self.entries.len() - 1;
    }

    fn current(&self) -> &Url {
        &self.entries[self.current]
    }
}

/// Document kept entirely in memory
pub struct HeadlessDocument {
    capabilities: Capabilities,
    history: RefCell<History>,
    title: RefCell<String>,
    content: RefCell<Option<String>>,
    nav_links: RefCell<Vec<NavLink>>,
    classes: RefCell<BTreeSet<String>>,
    scroll_y: Cell<u32>,
    push_count: Cell<usize>,
    document_replacements: Cell<usize>,
    anchor_bindings: Cell<usize>,
    view_transitions: Cell<usize>,
    view_transition_active: Cell<bool>,
    assigned: RefCell<Option<String>>,
    deferred: RefCell<VecDeque<Box<dyn FnOnce()>>>,
}

impl HeadlessDocument {
    /// Load `html` as the document at `location`
    pub fn new(location: Url, html: &str) -> Result<Self, HtmlError> {
        let doc = Self {
            capabilities: Capabilities::none(),
            history: RefCell::new(History { entries: vec![location], current: 0 }),
            title: RefCell::new(String::new()),
            content: RefCell::new(None),
            nav_links: RefCell::new(Vec::new()),
            classes: RefCell::new(BTreeSet::new()),
            scroll_y: Cell::new(0),
            push_count: Cell::new(0),
            document_replacements: Cell::new(0),
            anchor_bindings: Cell::new(0),
            view_transitions: Cell::new(0),
            view_transition_active: Cell::new(false),
            assigned: RefCell::new(None),
            deferred: RefCell::new(VecDeque::new()),
        };
        doc.load(html)?;
        Ok(doc)
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    fn load(&self, html: &str) -> Result<(), HtmlError> {
        let page = pageswap_html::parse(html)?;
        *self.title.borrow_mut() = page.title_or_empty().to_string();
        *self.content.borrow_mut() = page.content;
        *self.nav_links.borrow_mut() = page.nav_links
            .into_iter()
            .map(|href| NavLink { href, active: false })
            .collect();
        Ok(())
    }

    // === Browser simulation ===

    /// Step back in history; the host then delivers popstate
    pub fn back(&self) -> bool {
        let mut history = self.history.borrow_mut();
        if history.current == 0 {
            return false;
        }
        history.current -= 1;
        true
    }

    /// Step forward in history; the host then delivers popstate
    pub fn forward(&self) -> bool {
        let mut history = self.history.borrow_mut();
        if history.current + 1 >= history.entries.len() {
            return false;
        }
        history.current += 1;
        true
    }

    pub fn scroll_to(&self, y: u32) {
        self.scroll_y.set(y);
    }

    /// Run queued idle and timeout tasks, returning how many ran
    pub fn run_deferred(&self) -> usize {
        let mut ran = 0;
        loop {
            // Tasks may queue further tasks
            let task = self.deferred.borrow_mut().pop_front();
            let Some(task) = task else { break };
            task();
            ran += 1;
        }
        ran
    }

    // === Inspection ===

    pub fn path(&self) -> String {
        request_path(self.history.borrow().current())
    }

    pub fn history_len(&self) -> usize {
        self.history.borrow().entries.len()
    }

    /// Number of `pushState` calls
    pub fn push_count(&self) -> usize {
        self.push_count.get()
    }

    pub fn content(&self) -> Option<String> {
        self.content.borrow().clone()
    }

    pub fn nav_links(&self) -> Vec<NavLink> {
        self.nav_links.borrow().clone()
    }

    /// `href` of the nav links marked active
    pub fn active_nav(&self) -> Vec<String> {
        self.nav_links.borrow()
            .iter()
            .filter(|link| link.active)
            .map(|link| link.href.clone())
            .collect()
    }

    pub fn scroll_y(&self) -> u32 {
        self.scroll_y.get()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.borrow().contains(class)
    }

    pub fn classes(&self) -> Vec<String> {
        self.classes.borrow().iter().cloned().collect()
    }

    pub fn document_replacements(&self) -> usize {
        self.document_replacements.get()
    }

    pub fn anchor_bindings(&self) -> usize {
        self.anchor_bindings.get()
    }

    pub fn view_transitions(&self) -> usize {
        self.view_transitions.get()
    }

    /// Target of the last full browser navigation, if any
    pub fn assigned_location(&self) -> Option<String> {
        self.assigned.borrow().clone()
    }

    pub fn deferred_len(&self) -> usize {
        self.deferred.borrow().len()
    }
}

impl DocumentAdapter for HeadlessDocument {
    fn location(&self) -> Url {
        self.history.borrow().current().clone()
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn push_history(&self, path: &str) {
        let url = match self.location().join(path) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Cannot push {} onto history: {}", path, e);
                return;
            }
        };
        self.history.borrow_mut().push(url);
        self.push_count.set(self.push_count.get() + 1);
    }

    fn assign_location(&self, path: &str) {
        tracing::info!("Full navigation to {}", path);
        *self.assigned.borrow_mut() = Some(path.to_string());
    }

    fn title(&self) -> String {
        self.title.borrow().clone()
    }

    fn set_title(&self, title: &str) {
        *self.title.borrow_mut() = title.to_string();
    }

    fn content_region(&self) -> Option<String> {
        self.content.borrow().clone()
    }

    fn replace_content_region(&self, html: &str) -> bool {
        let mut content = self.content.borrow_mut();
        match content.as_mut() {
            Some(region) => {
                *region = html.to_string();
                true
            }
            None => false,
        }
    }

    fn replace_document(&self, html: &str) {
        self.document_replacements.set(self.document_replacements.get() + 1);
        self.classes.borrow_mut().clear();
        if let Err(e) = self.load(html) {
            tracing::warn!("Replacement document could not be parsed: {}", e);
            *self.content.borrow_mut() = None;
            self.nav_links.borrow_mut().clear();
        }
    }

    fn scroll_to_top(&self) {
        self.scroll_y.set(0);
    }

    fn update_active_nav(&self, path: &str) {
        let location = self.location();
        for link in self.nav_links.borrow_mut().iter_mut() {
            link.active = resolve_internal(&link.href, &location)
                .is_some_and(|url| request_path(&url) == path);
        }
    }

    fn bind_anchor_scrolling(&self) {
        self.anchor_bindings.set(self.anchor_bindings.get() + 1);
    }

    fn add_content_class(&self, class: &str) {
        self.classes.borrow_mut().insert(class.to_string());
    }

    fn remove_content_class(&self, class: &str) {
        self.classes.borrow_mut().remove(class);
    }

    fn transition_end(&self) -> impl Future<Output = ()> {
        // No CSS engine: transitions never report their end
        smol::future::pending()
    }

    fn view_transition_active(&self) -> bool {
        self.view_transition_active.get()
    }

    fn start_view_transition<'a>(&self, update: Box<dyn FnOnce() + 'a>) {
        self.view_transition_active.set(true);
        update();
        self.view_transition_active.set(false);
        self.view_transitions.set(self.view_transitions.get() + 1);
    }

    fn request_idle_callback(&self, task: Box<dyn FnOnce()>, _timeout: Duration) {
        self.deferred.borrow_mut().push_back(task);
    }

    fn set_timeout(&self, task: Box<dyn FnOnce()>, _delay: Duration) {
        self.deferred.borrow_mut().push_back(task);
    }
}

impl std::fmt::Debug for HeadlessDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessDocument")
            .field("location", &self.location().as_str())
            .field("title", &*self.title.borrow())
            .field("deferred", &self.deferred_len())
            .finish()
    }
}
