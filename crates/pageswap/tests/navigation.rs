//! Navigation session scenarios
//!
//! Drives a `NavigationSession` over a `HeadlessDocument` and a
//! `MemoryFetcher`, composing concurrent navigations with `smol::future::zip`.

use pageswap::net::{FetchError, MemoryFetcher, Url};
use pageswap::perf::BudgetViolation;
use pageswap::*;
use smol::{future, Timer};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html><html><head><title>{}</title></head><body>
        <header><nav>
            <a href="/">Home</a><a href="/about">About</a><a href="/work">Work</a>
        </nav></header>
        <main>{}</main>
        <footer>footer</footer>
        </body></html>"#,
        title, body
    )
}

fn home() -> HeadlessDocument {
    HeadlessDocument::new(
        Url::parse("https://site.example/").unwrap(),
        &page("Home", "<h1>Home</h1>"),
    ).unwrap()
}

fn config() -> NavigationConfig {
    NavigationConfig {
        prefetch_debounce_ms: 5,
        exit_fallback_ms: 5,
        enter_duration_ms: 1,
        ..Default::default()
    }
}

fn site() -> MemoryFetcher {
    MemoryFetcher::new()
        .page("/", &page("Home", "<h1>Home</h1>"))
        .page("/about", &page("About", "<h1>About us</h1>"))
        .page("/work", &page("Work", "<h1>Selected work</h1>"))
        .page("/a", &page("A", "<p>a</p>"))
        .page("/b", &page("B", "<p>b</p>"))
        .page("/c", &page("C", "<p>c</p>"))
}

fn click(href: &str) -> ClickEvent {
    ClickEvent::on(LinkTarget::new(href))
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[test]
fn test_invalid_config_rejected() {
    let fetcher = site();
    let no_cache = NavigationConfig {
        cache_capacity: 0,
        ..config()
    };
    assert!(matches!(
        NavigationSession::new(home(), &fetcher, no_cache),
        Err(ConfigError::Invalid(_))
    ));

    let unnamed = NavigationConfig {
        entering_class: String::new(),
        ..config()
    };
    assert!(NavigationSession::new(home(), &fetcher, unnamed).is_err());
}

// ============================================================================
// END TO END
// ============================================================================

#[test]
fn test_click_swaps_content() {
    let fetcher = site();
    let session = NavigationSession::new(home(), &fetcher, config()).unwrap();
    session.start();
    session.document().scroll_to(480);

    let ClickDecision::Navigate(request) = session.intercept_click(&click("/about")) else {
        panic!("expected a navigation");
    };
    let outcome = smol::block_on(session.navigate(request));

    assert_eq!(outcome, NavigationOutcome::Committed { cache_hit: false });
    let doc = session.document();
    assert_eq!(doc.path(), "/about");
    assert_eq!(doc.title(), "About");
    assert_eq!(doc.content().as_deref(), Some("<h1>About us</h1>"));
    assert_eq!(doc.active_nav(), vec!["/about"]);
    assert_eq!(doc.scroll_y(), 0);
    assert_eq!(doc.push_count(), 1);
    assert_eq!(doc.document_replacements(), 0);
    assert!(doc.classes().is_empty());

    let records = session.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].path, "/about");
    assert!(!records[0].was_cache_hit);

    assert_eq!(session.current_path(), "/about");
    assert_eq!(session.state(), NavState::Idle);
    assert!(!session.is_in_flight());
}

#[test]
fn test_navigation_populates_cache() {
    let fetcher = site();
    let session = NavigationSession::new(home(), &fetcher, config()).unwrap();

    smol::block_on(async {
        session.navigate(NavigationRequest::click("/about")).await;
        session.navigate(NavigationRequest::click("/work")).await;
        let outcome = session.navigate(NavigationRequest::click("/about")).await;
        assert_eq!(outcome, NavigationOutcome::Committed { cache_hit: true });
    });

    assert_eq!(fetcher.request_count("/about"), 1);
    assert_eq!(session.cache_stats().entry_count, 2);
    let hits: Vec<bool> = session.records().iter().map(|r| r.was_cache_hit).collect();
    assert_eq!(hits, vec![false, false, true]);
}

#[test]
fn test_view_transition_path() {
    let fetcher = site();
    let doc = home().with_capabilities(Capabilities::full());
    let session = NavigationSession::new(doc, &fetcher, config()).unwrap();
    assert_eq!(session.strategy(), TransitionStrategy::ViewTransition);

    let outcome = smol::block_on(session.navigate(NavigationRequest::click("/work")));

    assert_eq!(outcome, NavigationOutcome::Committed { cache_hit: false });
    assert_eq!(session.document().view_transitions(), 1);
    assert_eq!(session.document().title(), "Work");
    assert!(session.document().classes().is_empty());
}

// ============================================================================
// CONCURRENCY
// ============================================================================

#[test]
fn test_rapid_clicks_commit_only_latest() {
    let fetcher = site().with_latency(Duration::from_millis(20));
    let session = NavigationSession::new(home(), &fetcher, config()).unwrap();

    let (a, (b, c)) = smol::block_on(future::zip(
        session.navigate(NavigationRequest::click("/a")),
        future::zip(
            session.navigate(NavigationRequest::click("/b")),
            session.navigate(NavigationRequest::click("/c")),
        ),
    ));

    assert_eq!(a, NavigationOutcome::Aborted);
    assert_eq!(b, NavigationOutcome::Aborted);
    assert_eq!(c, NavigationOutcome::Committed { cache_hit: false });

    let doc = session.document();
    assert_eq!(doc.title(), "C");
    assert_eq!(doc.content().as_deref(), Some("<p>c</p>"));
    assert_eq!(doc.push_count(), 1);
    assert_eq!(doc.path(), "/c");

    // Aborted navigations leave no record
    let paths: Vec<String> = session.records().into_iter().map(|r| r.path).collect();
    assert_eq!(paths, vec!["/c"]);
    assert!(!session.is_cached("/a"));
}

#[test]
fn test_superseded_during_exit_transition() {
    let fetcher = site();
    let session = NavigationSession::new(home(), &fetcher, config()).unwrap();

    let (a, b) = smol::block_on(future::zip(
        session.navigate(NavigationRequest::click("/a")),
        session.navigate(NavigationRequest::click("/b")),
    ));

    assert_eq!(a, NavigationOutcome::Aborted);
    assert_eq!(b, NavigationOutcome::Committed { cache_hit: false });
    assert_eq!(session.document().title(), "B");
    assert_eq!(session.document().push_count(), 1);
    assert!(session.document().classes().is_empty());
}

#[test]
fn test_superseded_during_enter_transition() {
    let fetcher = site().delayed("/b", Duration::from_millis(60));
    let config = NavigationConfig { enter_duration_ms: 200, ..config() };
    let session = NavigationSession::new(home(), &fetcher, config).unwrap();

    // /a commits at ~5ms and sits in its enter phase; /b starts at 30ms and
    // commits at ~95ms, keeping its entering class until ~295ms
    let (a, (b, entering_at_250ms)) = smol::block_on(future::zip(
        session.navigate(NavigationRequest::click("/a")),
        async {
            Timer::after(Duration::from_millis(30)).await;
            let check = async {
                Timer::after(Duration::from_millis(220)).await;
                session.document().has_class("page-entering")
            };
            future::zip(session.navigate(NavigationRequest::click("/b")), check).await
        },
    ));

    assert_eq!(a, NavigationOutcome::Committed { cache_hit: false });
    assert_eq!(b, NavigationOutcome::Committed { cache_hit: false });
    assert!(entering_at_250ms);

    let paths: Vec<String> = session.records().into_iter().map(|r| r.path).collect();
    assert_eq!(paths, vec!["/a", "/b"]);
    assert_eq!(session.document().push_count(), 2);
    assert_eq!(session.document().title(), "B");
    assert!(session.document().classes().is_empty());
    assert!(!session.is_in_flight());
}

#[test]
fn test_click_on_in_flight_path_suppressed() {
    let fetcher = site().with_latency(Duration::from_millis(10));
    let session = NavigationSession::new(home(), &fetcher, config()).unwrap();

    smol::block_on(future::zip(
        session.navigate(NavigationRequest::click("/about")),
        async {
            Timer::after(Duration::from_millis(1)).await;
            assert_eq!(session.in_flight_path().as_deref(), Some("/about"));
            assert_eq!(session.intercept_click(&click("/about")), ClickDecision::Suppress);
        },
    ));
    assert_eq!(fetcher.request_count("/about"), 1);
}

// ============================================================================
// INTERCEPTION
// ============================================================================

#[test]
fn test_click_classification() {
    let fetcher = site();
    let session = NavigationSession::new(home(), &fetcher, config()).unwrap();

    assert_eq!(session.intercept_click(&click("/")), ClickDecision::Suppress);
    assert_eq!(session.intercept_click(&click("/#contact")), ClickDecision::PassThrough);
    assert_eq!(session.intercept_click(&click("#top")), ClickDecision::PassThrough);
    assert_eq!(session.intercept_click(&click("https://other.example/")), ClickDecision::PassThrough);
    assert_eq!(session.intercept_click(&click("mailto:hi@site.example")), ClickDecision::PassThrough);
    assert_eq!(session.intercept_click(&click("/about").with_modifier()), ClickDecision::PassThrough);
    assert_eq!(
        session.intercept_click(&ClickEvent::on(LinkTarget::new("/about").opted_out())),
        ClickDecision::PassThrough
    );
    assert_eq!(
        session.intercept_click(&ClickEvent::on(LinkTarget::new("/about").in_new_context())),
        ClickDecision::PassThrough
    );
    assert_eq!(session.intercept_click(&ClickEvent::outside_link()), ClickDecision::PassThrough);

    let decision = session.intercept_click(&click("work?tag=rust"));
    assert!(decision.prevents_default());
    assert_eq!(decision, ClickDecision::Navigate(NavigationRequest::click("/work?tag=rust")));
}

#[test]
fn test_configured_opt_out_attribute() {
    let fetcher = site();
    let config = NavigationConfig {
        opt_out_attribute: "data-native".to_string(),
        ..config()
    };
    let session = NavigationSession::new(home(), &fetcher, config).unwrap();

    let native = session.link_target([("href", "/about"), ("data-native", "")]).unwrap();
    assert_eq!(session.intercept_click(&ClickEvent::on(native.clone())), ClickDecision::PassThrough);
    assert_eq!(smol::block_on(session.prefetch(&native)), PrefetchOutcome::Skipped);

    // The default attribute means nothing once another one is configured
    let swapped = session.link_target([("href", "/about"), ("data-no-swap", "")]).unwrap();
    assert_eq!(
        session.intercept_click(&ClickEvent::on(swapped)),
        ClickDecision::Navigate(NavigationRequest::click("/about"))
    );

    let blank = session.link_target([("href", "/work"), ("target", "_blank")]).unwrap();
    assert_eq!(session.intercept_click(&ClickEvent::on(blank)), ClickDecision::PassThrough);
    assert!(session.link_target([("id", "top")]).is_none());
    assert!(fetcher.requests().is_empty());
}

// ============================================================================
// HISTORY
// ============================================================================

#[test]
fn test_popstate_does_not_push_history() {
    let fetcher = site();
    let session = NavigationSession::new(home(), &fetcher, config()).unwrap();

    smol::block_on(async {
        session.navigate(NavigationRequest::click("/about")).await;
        session.navigate(NavigationRequest::click("/work")).await;

        assert!(session.document().back());
        let outcome = session.handle_popstate().await;
        assert_eq!(outcome, NavigationOutcome::Committed { cache_hit: true });
    });

    let doc = session.document();
    assert_eq!(doc.push_count(), 2);
    assert_eq!(doc.history_len(), 3);
    assert_eq!(doc.path(), "/about");
    assert_eq!(doc.title(), "About");
    assert_eq!(doc.active_nav(), vec!["/about"]);
    assert_eq!(session.current_path(), "/about");
}

#[test]
fn test_popstate_to_current_page_is_unchanged() {
    let fetcher = site();
    let session = NavigationSession::new(home(), &fetcher, config()).unwrap();

    let outcome = smol::block_on(session.handle_popstate());
    assert_eq!(outcome, NavigationOutcome::Unchanged);
    assert!(fetcher.requests().is_empty());
}

// ============================================================================
// FAILURE HANDLING
// ============================================================================

#[test]
fn test_fetch_failure_falls_back_to_full_navigation() {
    let fetcher = site().failing("/broken", FetchError::Status(500));
    let session = NavigationSession::new(home(), &fetcher, config()).unwrap();

    let outcome = smol::block_on(session.navigate(NavigationRequest::click("/broken")));

    assert_eq!(outcome, NavigationOutcome::FullReload);
    let doc = session.document();
    assert_eq!(doc.assigned_location().as_deref(), Some("/broken"));
    assert_eq!(doc.title(), "Home");
    assert_eq!(doc.push_count(), 0);
    assert!(session.records().is_empty());
    assert!(!session.is_in_flight());
    assert_eq!(session.current_path(), "/");
}

#[test]
fn test_missing_path_falls_back() {
    let fetcher = site();
    let session = NavigationSession::new(home(), &fetcher, config()).unwrap();

    let outcome = smol::block_on(session.navigate(NavigationRequest::click("/nowhere")));
    assert_eq!(outcome, NavigationOutcome::FullReload);
    assert_eq!(session.document().assigned_location().as_deref(), Some("/nowhere"));
}

#[test]
fn test_target_without_region_replaces_document() {
    let fetcher = site().page("/bare", "<html><head><title>Bare</title></head><body><p>plain</p></body></html>");
    let session = NavigationSession::new(home(), &fetcher, config()).unwrap();

    let outcome = smol::block_on(session.navigate(NavigationRequest::click("/bare")));

    assert_eq!(outcome, NavigationOutcome::Committed { cache_hit: false });
    let doc = session.document();
    assert_eq!(doc.document_replacements(), 1);
    assert_eq!(doc.title(), "Bare");
    assert!(doc.content().is_none());
    assert_eq!(doc.path(), "/bare");
}

#[test]
fn test_live_document_without_region_replaces_document() {
    let fetcher = site();
    let doc = HeadlessDocument::new(
        Url::parse("https://site.example/legacy").unwrap(),
        "<html><head><title>Legacy</title></head><body><div>old</div></body></html>",
    ).unwrap();
    let session = NavigationSession::new(doc, &fetcher, config()).unwrap();

    smol::block_on(session.navigate(NavigationRequest::click("/about")));

    let doc = session.document();
    assert_eq!(doc.document_replacements(), 1);
    assert_eq!(doc.content().as_deref(), Some("<h1>About us</h1>"));
    assert_eq!(doc.title(), "About");
}

// ============================================================================
// PREFETCH
// ============================================================================

#[test]
fn test_hover_prefetch_then_click_uses_cache() {
    let fetcher = site();
    let session = NavigationSession::new(home(), &fetcher, config()).unwrap();
    let link = LinkTarget::new("/work");

    smol::block_on(async {
        assert_eq!(session.prefetch(&link).await, PrefetchOutcome::Stored);
        assert!(session.is_cached("/work"));

        let outcome = session.navigate(NavigationRequest::click("/work")).await;
        assert_eq!(outcome, NavigationOutcome::Committed { cache_hit: true });
    });

    assert_eq!(fetcher.request_count("/work"), 1);
    assert!(session.records()[0].was_cache_hit);
}

#[test]
fn test_pointer_leave_cancels_prefetch() {
    let fetcher = site();
    let session = NavigationSession::new(home(), &fetcher, config()).unwrap();
    let link = LinkTarget::new("/about");

    let (outcome, cancelled) = smol::block_on(future::zip(
        session.prefetch(&link),
        async { session.cancel_prefetch(&link) },
    ));

    assert_eq!(outcome, PrefetchOutcome::Cancelled);
    assert!(cancelled);
    assert!(fetcher.requests().is_empty());
    assert!(!session.is_cached("/about"));
}

#[test]
fn test_prefetch_filters() {
    let fetcher = site();
    let session = NavigationSession::new(home(), &fetcher, config()).unwrap();

    smol::block_on(async {
        assert_eq!(session.prefetch(&LinkTarget::new("/")).await, PrefetchOutcome::Skipped);
        assert_eq!(session.prefetch(&LinkTarget::new("#top")).await, PrefetchOutcome::Skipped);
        assert_eq!(session.prefetch(&LinkTarget::new("https://other.example/")).await, PrefetchOutcome::Skipped);
        assert_eq!(session.prefetch(&LinkTarget::new("/about").opted_out()).await, PrefetchOutcome::Skipped);

        assert_eq!(session.prefetch(&LinkTarget::new("/about")).await, PrefetchOutcome::Stored);
        assert_eq!(session.prefetch(&LinkTarget::new("/about")).await, PrefetchOutcome::Skipped);
    });

    assert_eq!(fetcher.requests(), vec!["/about"]);
}

#[test]
fn test_failed_prefetch_caches_nothing() {
    let fetcher = site().failing("/down", FetchError::Network("connection reset".into()));
    let session = NavigationSession::new(home(), &fetcher, config()).unwrap();

    let outcome = smol::block_on(session.prefetch(&LinkTarget::new("/down")));
    assert_eq!(outcome, PrefetchOutcome::Failed);
    assert!(!session.is_cached("/down"));
}

// ============================================================================
// DECORATIVE MODULES
// ============================================================================

struct Counter {
    enters: Rc<Cell<usize>>,
    leaves: Rc<Cell<usize>>,
}

impl DecorativeModule for Counter {
    fn name(&self) -> &str {
        "counter"
    }

    fn enter(&mut self, _page: &PageContext) -> anyhow::Result<()> {
        self.enters.set(self.enters.get() + 1);
        Ok(())
    }

    fn leave(&mut self) -> anyhow::Result<()> {
        self.leaves.set(self.leaves.get() + 1);
        Ok(())
    }
}

struct Broken;

impl DecorativeModule for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    fn enter(&mut self, _page: &PageContext) -> anyhow::Result<()> {
        anyhow::bail!("canvas element missing")
    }
}

#[test]
fn test_module_lifecycle_is_deferred_and_isolated() {
    let fetcher = site();
    let session = NavigationSession::new(home(), &fetcher, config()).unwrap();
    let enters = Rc::new(Cell::new(0));
    let leaves = Rc::new(Cell::new(0));
    session.register_module(Broken);
    session.register_module(Counter { enters: enters.clone(), leaves: leaves.clone() });

    session.start();
    assert_eq!(enters.get(), 0);
    session.document().run_deferred();
    assert_eq!(enters.get(), 1);

    let outcome = smol::block_on(session.navigate(NavigationRequest::click("/about")));
    assert_eq!(outcome, NavigationOutcome::Committed { cache_hit: false });
    assert_eq!(leaves.get(), 1);

    // Re-initialization waits for the host's idle period
    assert_eq!(enters.get(), 1);
    assert_eq!(session.document().run_deferred(), 1);
    assert_eq!(enters.get(), 2);
}

// ============================================================================
// PERFORMANCE
// ============================================================================

#[test]
fn test_long_tasks_counted_during_navigation() {
    let fetcher = site();
    let session = NavigationSession::new(home(), &fetcher, config()).unwrap();

    // Outside any navigation: ignored
    session.observe_task(Duration::from_millis(120));

    smol::block_on(future::zip(
        session.navigate(NavigationRequest::click("/about")),
        async {
            Timer::after(Duration::from_millis(1)).await;
            session.observe_task(Duration::from_millis(80));
            session.observe_task(Duration::from_millis(10));
        },
    ));

    assert_eq!(session.records()[0].long_task_count, 1);
}

#[test]
fn test_budget_violations_reported() {
    let fetcher = site();
    let mut config = config();
    config.budget.median_ms = Some(0.5);
    let session = NavigationSession::new(home(), &fetcher, config).unwrap();

    smol::block_on(session.navigate(NavigationRequest::click("/about")));

    let violations = session.check_budget();
    assert!(matches!(violations.as_slice(), [BudgetViolation::Median { limit, .. }] if *limit == 0.5));

    let stats = session.stats().unwrap();
    assert_eq!(stats.count, 1);
    assert_eq!(session.report().records.len(), 1);
}
