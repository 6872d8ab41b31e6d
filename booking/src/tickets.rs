//! Ticket query: loads the tier list and tracks its loading/error state.
//!
//! Fetches go through the ticket [`QueryCache`](crate::cache::QueryCache): a
//! fresh entry is served without touching the network, anything else
//! triggers `GET /api/tickets`. Every fetch gets a request number and runs
//! under [`tickets_query_id`], so a newer fetch cancels the older one and a
//! late response from an older request is ignored.

use crate::app::AppAction;
use crate::cache::TICKETS_QUERY_KEY;
use crate::environment::BookingEnvironment;
use crate::error::{normalize, UserFacingError};
use crate::types::TicketTier;
use chrono::{DateTime, Utc};
use ticket_booking_core::{async_effect, effect::Effect, effect::EffectId, reducer::Reducer, send_action, smallvec, SmallVec};

/// Effect id of the in-flight ticket fetch
#[must_use]
pub fn tickets_query_id() -> EffectId {
    EffectId::new("tickets-query")
}

// ============================================================================
// State
// ============================================================================

/// State of the ticket tier query
#[derive(Clone, Debug, Default)]
pub struct TicketsState {
    tiers: Option<Vec<TicketTier>>,
    error: Option<UserFacingError>,
    is_fetching: bool,
    latest_request: u64,
    updated_at: Option<DateTime<Utc>>,
}

/// What the page should show for the tier list
#[derive(Clone, Debug, PartialEq)]
pub enum TicketsView<'a> {
    /// First load still running
    Loading,
    /// The last fetch failed
    Error {
        /// Normalized error message
        message: &'a str,
    },
    /// The backend returned no tiers
    Empty,
    /// Tiers to display
    Tickets(&'a [TicketTier]),
}

impl TicketsState {
    /// Latest successfully loaded tiers (kept across failed refetches)
    #[must_use]
    pub fn tiers(&self) -> &[TicketTier] {
        self.tiers.as_deref().unwrap_or_default()
    }

    /// Whether any tier list has been loaded
    #[must_use]
    pub const fn has_data(&self) -> bool {
        self.tiers.is_some()
    }

    /// Error of the last fetch, cleared by the next successful one
    #[must_use]
    pub const fn error(&self) -> Option<&UserFacingError> {
        self.error.as_ref()
    }

    /// Whether a fetch is in flight
    #[must_use]
    pub const fn is_fetching(&self) -> bool {
        self.is_fetching
    }

    /// Number of the most recent fetch
    #[must_use]
    pub const fn latest_request(&self) -> u64 {
        self.latest_request
    }

    /// When the current tiers were loaded
    #[must_use]
    pub const fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Observable state of the query
    ///
    /// Loading wins only while there is nothing to show yet. An error wins
    /// over previously loaded data.
    #[must_use]
    pub fn view(&self) -> TicketsView<'_> {
        match (&self.tiers, &self.error) {
            (None, _) if self.is_fetching => TicketsView::Loading,
            (_, Some(error)) => TicketsView::Error {
                message: &error.message,
            },
            (None, None) => TicketsView::Loading,
            (Some(tiers), None) if tiers.is_empty() => TicketsView::Empty,
            (Some(tiers), None) => TicketsView::Tickets(tiers),
        }
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Actions of the ticket query
#[derive(Clone, Debug, PartialEq)]
pub enum TicketsAction {
    /// Load the tiers, from the cache if it is fresh
    Fetch,
    /// Load the tiers from the network
    Refetch,
    /// A fetch returned tiers
    Loaded {
        /// Request number of the fetch
        request: u64,
        /// The tiers
        tiers: Vec<TicketTier>,
    },
    /// A fetch failed
    FetchFailed {
        /// Request number of the fetch
        request: u64,
        /// Normalized error
        error: UserFacingError,
    },
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer of the ticket query
#[derive(Clone, Copy, Debug, Default)]
pub struct TicketsReducer;

impl TicketsReducer {
    fn start_fetch(
        state: &mut TicketsState,
        env: &BookingEnvironment,
        use_cache: bool,
    ) -> SmallVec<[Effect<AppAction>; 4]> {
        state.latest_request += 1;
        state.is_fetching = true;
        let request = state.latest_request;

        if use_cache {
            if let Some(tiers) = env.tickets_cache.get_fresh(TICKETS_QUERY_KEY, env.clock.now()) {
                tracing::debug!(request, "Serving tickets from cache");
                return smallvec![
                    send_action!(AppAction::Tickets(TicketsAction::Loaded { request, tiers }))
                        .cancellable(tickets_query_id())
                ];
            }
        }

        tracing::debug!(request, "Fetching tickets");

        let api = env.api.clone();
        let cache = env.tickets_cache.clone();
        let clock = env.clock.clone();

        let fetch = async_effect! {
            match api.fetch_tickets().await {
                Ok(tiers) => {
                    cache.set(TICKETS_QUERY_KEY, tiers.clone(), clock.now());
                    Some(AppAction::Tickets(TicketsAction::Loaded { request, tiers }))
                },
                Err(error) => Some(AppAction::Tickets(TicketsAction::FetchFailed {
                    request,
                    error: normalize(&error),
                })),
            }
        };

        smallvec![fetch.cancellable(tickets_query_id())]
    }
}

impl Reducer for TicketsReducer {
    type State = TicketsState;
    type Action = AppAction;
    type Environment = BookingEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let AppAction::Tickets(action) = action else {
            return SmallVec::new();
        };

        match action {
            TicketsAction::Fetch => Self::start_fetch(state, env, true),
            TicketsAction::Refetch => Self::start_fetch(state, env, false),

            TicketsAction::Loaded { request, tiers } => {
                if request != state.latest_request {
                    tracing::debug!(request, latest = state.latest_request, "Ignoring stale tickets response");
                    return SmallVec::new();
                }

                tracing::debug!(request, count = tiers.len(), "Tickets loaded");
                state.tiers = Some(tiers);
                state.error = None;
                state.is_fetching = false;
                state.updated_at = Some(env.clock.now());
                SmallVec::new()
            },

            TicketsAction::FetchFailed { request, error } => {
                if request != state.latest_request {
                    tracing::debug!(request, latest = state.latest_request, "Ignoring stale tickets failure");
                    return SmallVec::new();
                }

                tracing::warn!(request, error = %error, "Failed to fetch tickets");
                state.error = Some(error);
                state.is_fetching = false;
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;
    use crate::app::AppAction;
    use crate::mocks::{tier, MockTicketsApi};
    use std::sync::Arc;
    use std::time::Duration;
    use ticket_booking_testing::{assertions, test_clock, ReducerTest};

    fn env_with(api: Arc<MockTicketsApi>, stale_time: Duration) -> BookingEnvironment {
        let mut env = BookingEnvironment::new(api, Arc::new(test_clock()), "user-1");
        env.tickets_cache = Arc::new(crate::cache::QueryCache::new(stale_time));
        env
    }

    fn vip() -> Vec<TicketTier> {
        vec![tier("VIP", "VIP Access", 100.0, 10)]
    }

    fn loaded(request: u64, tiers: Vec<TicketTier>) -> AppAction {
        AppAction::Tickets(TicketsAction::Loaded { request, tiers })
    }

    #[test]
    fn test_fetch_starts_cancellable_query() {
        let api = Arc::new(MockTicketsApi::new(vip()));

        ReducerTest::new(TicketsReducer)
            .with_env(env_with(api, Duration::ZERO))
            .given_state(TicketsState::default())
            .when_action(AppAction::Tickets(TicketsAction::Fetch))
            .then_state(|state| {
                assert!(state.is_fetching());
                assert_eq!(state.latest_request(), 1);
                assert_eq!(state.view(), TicketsView::Loading);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_cancellable(effects, &tickets_query_id());
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_network() {
        let api = Arc::new(MockTicketsApi::new(vip()));
        let env = env_with(api.clone(), Duration::from_secs(60));
        env.tickets_cache.set(TICKETS_QUERY_KEY, vip(), env.clock.now());

        let mut state = TicketsState::default();
        let mut effects = TicketsReducer.reduce(&mut state, AppAction::Tickets(TicketsAction::Fetch), &env);

        let Some(Effect::Cancellable { effect, .. }) = effects.pop() else {
            panic!("expected a cancellable effect");
        };
        let Effect::Future(future) = *effect else {
            panic!("expected a future");
        };

        assert_eq!(future.await, Some(loaded(1, vip())));
        assert_eq!(api.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_network_result_is_cached() {
        let api = Arc::new(MockTicketsApi::new(vip()));
        let env = env_with(api.clone(), Duration::from_secs(60));

        let mut state = TicketsState::default();
        let mut effects = TicketsReducer.reduce(&mut state, AppAction::Tickets(TicketsAction::Refetch), &env);

        let Some(Effect::Cancellable { effect, .. }) = effects.pop() else {
            panic!("expected a cancellable effect");
        };
        let Effect::Future(future) = *effect else {
            panic!("expected a future");
        };

        assert_eq!(future.await, Some(loaded(1, vip())));
        assert_eq!(api.fetch_count(), 1);
        assert_eq!(env.tickets_cache.get_fresh(TICKETS_QUERY_KEY, env.clock.now()), Some(vip()));
    }

    #[test]
    fn test_stale_response_is_ignored() {
        let api = Arc::new(MockTicketsApi::new(vip()));

        ReducerTest::new(TicketsReducer)
            .with_env(env_with(api, Duration::ZERO))
            .given_state(TicketsState::default())
            .given_actions(vec![
                AppAction::Tickets(TicketsAction::Fetch),
                AppAction::Tickets(TicketsAction::Fetch),
            ])
            .when_action(loaded(1, vip()))
            .then_state(|state| {
                assert!(!state.has_data());
                assert!(state.is_fetching());
            })
            .run();
    }

    #[test]
    fn test_loaded_shows_tickets() {
        let api = Arc::new(MockTicketsApi::new(vip()));

        ReducerTest::new(TicketsReducer)
            .with_env(env_with(api, Duration::ZERO))
            .given_state(TicketsState::default())
            .given_actions(vec![AppAction::Tickets(TicketsAction::Fetch)])
            .when_action(loaded(1, vip()))
            .then_state(|state| {
                assert!(!state.is_fetching());
                assert_eq!(state.view(), TicketsView::Tickets(&vip()));
                assert!(state.updated_at().is_some());
            })
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn test_empty_list() {
        let api = Arc::new(MockTicketsApi::default());

        ReducerTest::new(TicketsReducer)
            .with_env(env_with(api, Duration::ZERO))
            .given_state(TicketsState::default())
            .given_actions(vec![AppAction::Tickets(TicketsAction::Fetch)])
            .when_action(loaded(1, Vec::new()))
            .then_state(|state| assert_eq!(state.view(), TicketsView::Empty))
            .run();
    }

    #[test]
    fn test_failed_refetch_keeps_data_and_reports_error() {
        let api = Arc::new(MockTicketsApi::new(vip()));

        ReducerTest::new(TicketsReducer)
            .with_env(env_with(api, Duration::ZERO))
            .given_state(TicketsState::default())
            .given_actions(vec![
                AppAction::Tickets(TicketsAction::Fetch),
                loaded(1, vip()),
                AppAction::Tickets(TicketsAction::Refetch),
            ])
            .when_action(AppAction::Tickets(TicketsAction::FetchFailed {
                request: 2,
                error: UserFacingError::new("Something went wrong. Please try again."),
            }))
            .then_state(|state| {
                assert_eq!(state.tiers().len(), 1);
                assert_eq!(
                    state.view(),
                    TicketsView::Error {
                        message: "Something went wrong. Please try again."
                    }
                );
            })
            .run();
    }

    #[test]
    fn test_other_actions_are_ignored() {
        let api = Arc::new(MockTicketsApi::new(vip()));

        ReducerTest::new(TicketsReducer)
            .with_env(env_with(api, Duration::ZERO))
            .given_state(TicketsState::default())
            .when_action(AppAction::Booking(crate::booking::BookingAction::ExpireSuccessMessage {
                tier: "VIP".into(),
            }))
            .then_state(|state| assert_eq!(state.latest_request(), 0))
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }
}
