//! Navigation Session
//!
//! Owns everything that lives for the whole page session (active navigation,
//! page cache, performance log, decorative modules) and runs each navigation
//! through `Idle -> Fetching -> Swapping -> Animating -> Idle`, dropping out
//! to `Aborted` as soon as a newer navigation takes over.

use crate::config::{ConfigError, NavigationConfig};
use crate::document::{ClickEvent, DocumentAdapter, LinkTarget};
use crate::guard::{ActiveNavigation, NavigationTicket};
use crate::interceptor::{decide_click, internal_link_path, request_path, ClickDecision};
use crate::modules::{DecorativeModule, ModuleRegistry, PageContext};
use crate::prefetch::{PrefetchOutcome, PrefetchQueue};
use crate::transition::{ClassTransition, Deferral, TransitionStrategy};
use pageswap_cache::{CacheStats, NavigationCache};
use pageswap_html::ParsedPage;
use pageswap_net::{CancellationToken, FetchError, PageFetcher};
use pageswap_perf::{BudgetViolation, NavigationStats, PerformanceRecord, PerformanceRecorder, PerformanceReport};
use smol::{future, Timer};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// What triggered a navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOrigin {
    Click,
    Popstate,
}

/// One navigation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    pub target_path: String,
    pub origin: NavigationOrigin,
    pub push_history: bool,
}

impl NavigationRequest {
    /// User-initiated navigation; pushes a history entry
    pub fn click(path: impl Into<String>) -> Self {
        Self {
            target_path: path.into(),
            origin: NavigationOrigin::Click,
            push_history: true,
        }
    }

    /// Back/forward navigation; the browser already moved the history
    pub fn popstate(path: impl Into<String>) -> Self {
        Self {
            target_path: path.into(),
            origin: NavigationOrigin::Popstate,
            push_history: false,
        }
    }
}

/// Orchestrator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    Idle,
    Fetching,
    Swapping,
    Animating,
    Aborted,
}

/// How a navigation settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// New content is in the document
    Committed { cache_hit: bool },
    /// Superseded by a newer navigation; nothing was mutated
    Aborted,
    /// Fetch failed; handed over to a full browser navigation
    FullReload,
    /// Popstate to the page already shown
    Unchanged,
}

/// Navigation controller for one document session
pub struct NavigationSession<D, F> {
    doc: D,
    fetcher: F,
    config: NavigationConfig,
    strategy: TransitionStrategy,
    classes: ClassTransition,
    deferral: Deferral,
    active: RefCell<ActiveNavigation>,
    cache: RefCell<NavigationCache>,
    perf: RefCell<PerformanceRecorder>,
    prefetches: RefCell<PrefetchQueue>,
    modules: Rc<RefCell<ModuleRegistry>>,
    state: Cell<NavState>,
}

impl<D: DocumentAdapter, F: PageFetcher> NavigationSession<D, F> {
    /// Create a session, detecting the document's capabilities once
    pub fn new(doc: D, fetcher: F, config: NavigationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let capabilities = doc.capabilities();
        let strategy = TransitionStrategy::select(capabilities);
        let deferral = Deferral::select(capabilities, &config);
        let current = request_path(&doc.location());

        tracing::info!(
            "Navigation session at {} (transition: {:?}, deferral: {:?})",
            current, strategy, deferral
        );

        Ok(Self {
            active: RefCell::new(ActiveNavigation::new(current)),
            cache: RefCell::new(NavigationCache::new(config.cache_capacity, config.cache_ttl())),
            perf: RefCell::new(PerformanceRecorder::new(
                config.long_task_threshold(),
                config.budget.clone(),
            )),
            prefetches: RefCell::new(PrefetchQueue::new()),
            modules: Rc::new(RefCell::new(ModuleRegistry::new())),
            state: Cell::new(NavState::Idle),
            classes: ClassTransition::from_config(&config),
            strategy,
            deferral,
            doc,
            fetcher,
            config,
        })
    }

    pub fn register_module(&self, module: impl DecorativeModule + 'static) {
        self.modules.borrow_mut().register(Box::new(module));
    }

    /// Initial page setup, the counterpart of a swap's post-processing
    pub fn start(&self) {
        let path = self.current_path();
        self.doc.update_active_nav(&path);
        self.doc.bind_anchor_scrolling();
        self.schedule_page_enter(PageContext {
            path,
            title: self.doc.title(),
            content: self.doc.content_region(),
        });
    }

    // === Link interception ===

    /// Describe a link element from its attributes, honoring the configured
    /// opt-out attribute
    pub fn link_target<'a>(&self, attrs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Option<LinkTarget> {
        LinkTarget::from_attributes(attrs, &self.config.opt_out_attribute)
    }

    /// Classify a click; the host prevents default unless it passes through
    pub fn intercept_click(&self, event: &ClickEvent) -> ClickDecision {
        decide_click(event, &self.doc.location(), &self.active.borrow())
    }

    /// Back/forward: swap to the browser's current location without
    /// pushing history
    pub async fn handle_popstate(&self) -> NavigationOutcome {
        let path = request_path(&self.doc.location());
        {
            let active = self.active.borrow();
            if !active.is_in_flight() && active.current_path() == path {
                return NavigationOutcome::Unchanged;
            }
        }
        self.navigate(NavigationRequest::popstate(path)).await
    }

    // === Prefetching ===

    /// Pointer-enter or focus on a link: warm the cache after the debounce
    pub async fn prefetch(&self, link: &LinkTarget) -> PrefetchOutcome {
        let Some(path) = internal_link_path(link, &self.doc.location()) else {
            return PrefetchOutcome::Skipped;
        };
        if path == self.active.borrow().current_path() || self.cache.borrow().contains(&path) {
            return PrefetchOutcome::Skipped;
        }
        let Some((id, token)) = self.prefetches.borrow_mut().schedule(&path) else {
            return PrefetchOutcome::Skipped;
        };

        let outcome = self.run_prefetch(&path, id, &token).await;
        self.prefetches.borrow_mut().complete(&path, id);
        outcome
    }

    /// Pointer-leave: drop a prefetch still waiting out its debounce
    pub fn cancel_prefetch(&self, link: &LinkTarget) -> bool {
        match internal_link_path(link, &self.doc.location()) {
            Some(path) => self.prefetches.borrow_mut().cancel(&path),
            None => false,
        }
    }

    async fn run_prefetch(&self, path: &str, id: u64, token: &CancellationToken) -> PrefetchOutcome {
        let debounce = self.config.prefetch_debounce();
        let elapsed = future::or(
            async {
                Timer::after(debounce).await;
                true
            },
            async {
                token.cancelled().await;
                false
            },
        ).await;

        if !elapsed {
            tracing::trace!("Prefetch of {} cancelled", path);
            return PrefetchOutcome::Cancelled;
        }
        self.prefetches.borrow_mut().mark_fetching(path, id);
        if self.cache.borrow().contains(path) {
            return PrefetchOutcome::Skipped;
        }

        // Stored raw; parsing waits for an actual navigation
        match self.fetch_with(path, token).await {
            Ok(html) => {
                tracing::debug!("Prefetched {} ({} bytes)", path, html.len());
                self.cache.borrow_mut().set(path, html);
                PrefetchOutcome::Stored
            }
            Err(e) if e.is_abort() => PrefetchOutcome::Cancelled,
            Err(e) => {
                tracing::debug!("Prefetch of {} failed: {}", path, e);
                PrefetchOutcome::Failed
            }
        }
    }

    // === Orchestration ===

    /// Run one navigation to completion
    ///
    /// Never fails: aborts are silent and fetch failures fall back to a full
    /// browser navigation.
    pub async fn navigate(&self, request: NavigationRequest) -> NavigationOutcome {
        let ticket = self.active.borrow_mut().begin(&request.target_path);
        self.perf.borrow_mut().begin(ticket.id, &ticket.path);
        self.enter_state(&ticket, NavState::Fetching);

        let cached = self.cache.borrow_mut().get(&ticket.path).map(str::to_owned);
        let (html, cache_hit) = match cached {
            Some(html) => {
                tracing::debug!("Cache hit for {}", ticket.path);
                (html, true)
            }
            None => {
                tracing::debug!("Cache miss for {}", ticket.path);
                match self.fetch_with(&ticket.path, ticket.token()).await {
                    Ok(html) => {
                        self.cache.borrow_mut().set(&ticket.path, html.clone());
                        (html, false)
                    }
                    Err(e) if e.is_abort() || !self.is_current(&ticket) => return self.abort(&ticket),
                    Err(e) => return self.fall_back(&ticket, &e),
                }
            }
        };

        if !self.is_current(&ticket) {
            return self.abort(&ticket);
        }
        self.enter_state(&ticket, NavState::Swapping);

        let page = pageswap_html::parse(&html).unwrap_or_else(|e| {
            tracing::warn!("Could not extract content of {}: {}", ticket.path, e);
            ParsedPage::default()
        });

        let (committed, class_animated) = match self.strategy {
            TransitionStrategy::ViewTransition if !self.doc.view_transition_active() => {
                let committed = Cell::new(false);
                self.doc.start_view_transition(Box::new(|| {
                    committed.set(self.commit(&ticket, &request, &html, &page));
                }));
                (committed.get(), false)
            }
            _ => (self.class_swap(&ticket, &request, &html, &page).await, true),
        };
        if !committed {
            return self.abort(&ticket);
        }

        self.enter_state(&ticket, NavState::Animating);
        self.doc.scroll_to_top();
        self.doc.update_active_nav(&ticket.path);
        self.doc.bind_anchor_scrolling();
        self.schedule_page_enter(PageContext {
            path: ticket.path.clone(),
            title: page.title_or_empty().to_string(),
            content: page.content.clone(),
        });

        if class_animated {
            let entered = async {
                Timer::after(self.classes.enter_duration).await;
            };
            future::or(entered, ticket.token().cancelled()).await;

            // A newer navigation owns the entering class once it has started
            if self.is_current(&ticket) {
                self.doc.remove_content_class(&self.classes.entering_class);
            }
        }

        // Committed, so recorded even when superseded during the enter phase
        self.perf.borrow_mut().end(ticket.id, cache_hit);
        self.enter_state(&ticket, NavState::Idle);
        self.active.borrow_mut().finish(&ticket);
        NavigationOutcome::Committed { cache_hit }
    }

    async fn fetch_with(&self, path: &str, token: &CancellationToken) -> Result<String, FetchError> {
        if token.is_cancelled() {
            return Err(FetchError::Aborted);
        }
        let aborted = async {
            token.cancelled().await;
            Err::<String, _>(FetchError::Aborted)
        };
        future::or(self.fetcher.fetch(path, token), aborted).await
    }

    /// Manual fallback: exit class, bounded wait, mutate, entering class
    async fn class_swap(
        &self,
        ticket: &NavigationTicket,
        request: &NavigationRequest,
        html: &str,
        page: &ParsedPage,
    ) -> bool {
        let classes = &self.classes;
        self.doc.add_content_class(&classes.exiting_class);

        let exit_done = future::or(self.doc.transition_end(), async {
            Timer::after(classes.exit_timeout).await;
        });
        future::or(exit_done, ticket.token().cancelled()).await;

        // Superseded during the exit: the newer navigation owns the classes
        if !self.is_current(ticket) {
            return false;
        }
        self.doc.remove_content_class(&classes.exiting_class);
        if !self.commit(ticket, request, html, page) {
            return false;
        }
        self.doc.add_content_class(&classes.entering_class);
        true
    }

    /// Push history and mutate the document, if still the newest navigation
    fn commit(&self, ticket: &NavigationTicket, request: &NavigationRequest, html: &str, page: &ParsedPage) -> bool {
        if !self.is_current(ticket) {
            return false;
        }

        // History first, so back/forward stay consistent if the swap breaks
        if request.push_history {
            self.doc.push_history(&ticket.path);
        }
        self.active.borrow_mut().commit(ticket);
        self.modules.borrow_mut().leave_all();

        self.doc.set_title(page.title_or_empty());
        match &page.content {
            Some(content) => {
                if !self.doc.replace_content_region(content) {
                    tracing::warn!("Document has no content region; replacing it with {}", ticket.path);
                    self.doc.replace_document(html);
                }
            }
            None => {
                tracing::warn!("{} has no content region; replacing whole document", ticket.path);
                self.doc.replace_document(html);
            }
        }
        true
    }

    fn abort(&self, ticket: &NavigationTicket) -> NavigationOutcome {
        tracing::debug!("{}: -> {:?}", ticket.path, NavState::Aborted);
        self.perf.borrow_mut().discard(ticket.id);
        self.enter_state(ticket, NavState::Idle);
        self.active.borrow_mut().finish(ticket);
        NavigationOutcome::Aborted
    }

    fn fall_back(&self, ticket: &NavigationTicket, error: &FetchError) -> NavigationOutcome {
        tracing::error!("Navigation to {} failed: {}; falling back to full navigation", ticket.path, error);
        self.perf.borrow_mut().discard(ticket.id);
        self.enter_state(ticket, NavState::Idle);
        self.active.borrow_mut().finish(ticket);
        self.doc.assign_location(&ticket.path);
        NavigationOutcome::FullReload
    }

    fn schedule_page_enter(&self, page: PageContext) {
        let modules = Rc::clone(&self.modules);
        self.deferral.defer(&self.doc, Box::new(move || {
            modules.borrow_mut().enter_all(&page);
        }));
    }

    fn enter_state(&self, ticket: &NavigationTicket, next: NavState) {
        if !self.is_current(ticket) {
            return;
        }
        let prev = self.state.replace(next);
        if prev != next {
            tracing::debug!("{}: {:?} -> {:?}", ticket.path, prev, next);
        }
    }

    fn is_current(&self, ticket: &NavigationTicket) -> bool {
        self.active.borrow().is_current(ticket)
    }

    // === Observation ===

    /// Feed a task duration from the host's long-task observer
    pub fn observe_task(&self, duration: Duration) {
        self.perf.borrow_mut().observe_task(duration);
    }

    pub fn document(&self) -> &D {
        &self.doc
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    pub fn strategy(&self) -> TransitionStrategy {
        self.strategy
    }

    pub fn deferral(&self) -> Deferral {
        self.deferral
    }

    /// State of the newest navigation
    pub fn state(&self) -> NavState {
        self.state.get()
    }

    pub fn current_path(&self) -> String {
        self.active.borrow().current_path().to_string()
    }

    pub fn in_flight_path(&self) -> Option<String> {
        self.active.borrow().in_flight_path().map(str::to_owned)
    }

    pub fn is_in_flight(&self) -> bool {
        self.active.borrow().is_in_flight()
    }

    pub fn is_cached(&self, path: &str) -> bool {
        self.cache.borrow().contains(path)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.borrow().stats()
    }

    pub fn records(&self) -> Vec<PerformanceRecord> {
        self.perf.borrow().records().to_vec()
    }

    pub fn stats(&self) -> Option<NavigationStats> {
        self.perf.borrow().stats()
    }

    pub fn check_budget(&self) -> Vec<BudgetViolation> {
        self.perf.borrow().check_budget()
    }

    pub fn report(&self) -> PerformanceReport {
        self.perf.borrow().report()
    }

    pub fn module_count(&self) -> usize {
        self.modules.borrow().len()
    }
}
