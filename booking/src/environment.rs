//! Injected dependencies of the booking reducers.

use crate::api::TicketsApi;
use crate::cache::QueryCache;
use crate::config::Config;
use crate::types::TicketTier;
use std::sync::Arc;
use std::time::Duration;
use ticket_booking_core::environment::Clock;

/// Dependencies shared by the ticket query, mutation and booking reducers
///
/// Production wires [`crate::api::HttpTicketsApi`] and `SystemClock`; tests
/// wire the scripted `MockTicketsApi` and a fixed clock.
#[derive(Clone)]
pub struct BookingEnvironment {
    /// Backend client
    pub api: Arc<dyn TicketsApi>,
    /// Cache of the ticket tier list
    pub tickets_cache: Arc<QueryCache<Vec<TicketTier>>>,
    /// Clock used for cache ages and notification timestamps
    pub clock: Arc<dyn Clock>,
    /// User id sent with every booking
    pub user_id: String,
    /// Lifetime of a per-tier success message
    pub message_ttl: Duration,
    /// Lifetime of a notification toast
    pub notification_ttl: Duration,
}

impl BookingEnvironment {
    /// Environment with default timings (7 s messages, 3 s notifications, no cache)
    #[must_use]
    pub fn new(api: Arc<dyn TicketsApi>, clock: Arc<dyn Clock>, user_id: impl Into<String>) -> Self {
        Self {
            api,
            tickets_cache: Arc::new(QueryCache::new(Duration::ZERO)),
            clock,
            user_id: user_id.into(),
            message_ttl: Duration::from_secs(7),
            notification_ttl: Duration::from_secs(3),
        }
    }

    /// Environment using the timings from `config`
    #[must_use]
    pub fn from_config(api: Arc<dyn TicketsApi>, clock: Arc<dyn Clock>, config: &Config) -> Self {
        Self {
            api,
            tickets_cache: Arc::new(QueryCache::new(config.tickets_stale_time)),
            clock,
            user_id: config.user_id.clone(),
            message_ttl: config.message_ttl,
            notification_ttl: config.notification_ttl,
        }
    }
}

impl std::fmt::Debug for BookingEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingEnvironment")
            .field("user_id", &self.user_id)
            .field("message_ttl", &self.message_ttl)
            .field("notification_ttl", &self.notification_ttl)
            .finish_non_exhaustive()
    }
}
