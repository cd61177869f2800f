//! pageswap
//!
//! Client-side navigation controller for multi-page sites: same-origin link
//! clicks fetch the target page and swap its main content region in place,
//! with animated transitions, a short-lived page cache, hover prefetching
//! and per-navigation performance records.
//!
//! # Example
//! ```rust,ignore
//! use pageswap::{NavigationConfig, NavigationSession, HeadlessDocument, ClickDecision};
//!
//! let session = NavigationSession::new(doc, fetcher, NavigationConfig::default())?;
//! session.start();
//! if let ClickDecision::Navigate(request) = session.intercept_click(&event) {
//!     smol::block_on(session.navigate(request));
//! }
//! ```

mod config;
mod document;
mod guard;
mod headless;
mod interceptor;
mod modules;
mod prefetch;
mod session;
mod transition;

pub use config::{ConfigError, NavigationConfig};
pub use document::{Capabilities, ClickEvent, DocumentAdapter, LinkTarget};
pub use guard::{ActiveNavigation, NavigationTicket};
pub use headless::{HeadlessDocument, NavLink};
pub use interceptor::{decide_click, internal_link_path, request_path, resolve_internal, ClickDecision};
pub use modules::{DecorativeModule, ModuleRegistry, PageContext};
pub use prefetch::{PrefetchOutcome, PrefetchQueue};
pub use session::{NavState, NavigationOrigin, NavigationOutcome, NavigationRequest, NavigationSession};
pub use transition::{ClassTransition, Deferral, TransitionStrategy};

// Re-export sub-crates for advanced usage
pub use pageswap_cache as cache;
pub use pageswap_html as html;
pub use pageswap_net as net;
pub use pageswap_perf as perf;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
