//! Concurrency Guard
//!
//! Single record of the displayed path and the one navigation allowed in
//! flight. Starting a navigation cancels its predecessor's fetch, and only
//! the holder of the newest ticket may touch the DOM.

use pageswap_net::CancellationToken;

/// Proof of being the navigation that started most recently
#[derive(Debug, Clone)]
pub struct NavigationTicket {
    pub id: u64,
    pub path: String,
    token: CancellationToken,
}

impl NavigationTicket {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

#[derive(Debug)]
struct InFlight {
    id: u64,
    path: String,
    token: CancellationToken,
}

/// Session-wide navigation state
#[derive(Debug)]
pub struct ActiveNavigation {
    current_path: String,
    in_flight: Option<InFlight>,
    next_id: u64,
}

impl ActiveNavigation {
    pub fn new(current_path: impl Into<String>) -> Self {
        Self {
            current_path: current_path.into(),
            in_flight: None,
            next_id: 1,
        }
    }

    /// Path of the committed page
    pub fn current_path(&self) -> &str {
        &self.current_path
    }

    /// Target of the navigation in flight
    pub fn in_flight_path(&self) -> Option<&str> {
        self.in_flight.as_ref().map(|f| f.path.as_str())
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start a navigation, cancelling the previous one
    pub fn begin(&mut self, path: &str) -> NavigationTicket {
        if let Some(previous) = self.in_flight.take() {
            tracing::debug!("Navigation to {} superseded by {}", previous.path, path);
            previous.token.cancel();
        }

        let id = self.next_id;
        self.next_id += 1;
        let token = CancellationToken::new();

        self.in_flight = Some(InFlight {
            id,
            path: path.to_string(),
            token: token.clone(),
        });

        NavigationTicket {
            id,
            path: path.to_string(),
            token,
        }
    }

    /// Whether `ticket` still belongs to the newest navigation
    pub fn is_current(&self, ticket: &NavigationTicket) -> bool {
        self.in_flight.as_ref().map(|f| f.id) == Some(ticket.id)
    }

    /// Record the ticket's path as displayed
    pub fn commit(&mut self, ticket: &NavigationTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.current_path = ticket.path.clone();
        true
    }

    /// Settle the ticket's navigation; stale tickets are ignored
    pub fn finish(&mut self, ticket: &NavigationTicket) {
        if self.is_current(ticket) {
            self.in_flight = None;
        }
    }
}
