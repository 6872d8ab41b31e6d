//! Booking mutation: submits bookings and reports their outcome.
//!
//! Each submission settles exactly once, after its success or failure has
//! been reduced. Settling invalidates the cached tier list and requests a
//! fetch so availability is refreshed.
//!
//! Submissions are not serialized. The status only follows the most recent
//! submission; results of older ones still produce notifications and settle.

use crate::app::AppAction;
use crate::cache::TICKETS_QUERY_KEY;
use crate::environment::BookingEnvironment;
use crate::error::{normalize, UserFacingError};
use crate::messages;
use crate::tickets::TicketsAction;
use crate::types::{BookingRequest, BookingResult};
use chrono::{DateTime, Utc};
use ticket_booking_core::{async_effect, delay, effect::Effect, reducer::Reducer, send_action, smallvec, SmallVec};

// ============================================================================
// State
// ============================================================================

/// Status of the most recent submission
#[derive(Clone, Debug, Default, PartialEq)]
pub enum MutationStatus {
    /// Nothing submitted yet
    #[default]
    Idle,
    /// Waiting for the backend
    Pending,
    /// The backend accepted the booking
    Succeeded(BookingResult),
    /// The booking failed
    Failed(UserFacingError),
}

/// Kind of a notification toast
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    /// Booking succeeded
    Success,
    /// Booking failed
    Error,
}

/// A transient toast shown after a booking settles
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    /// Notification id, unique per store
    pub id: u64,
    /// Success or error
    pub kind: NotificationKind,
    /// Text to show
    pub text: String,
    /// When it was raised
    pub at: DateTime<Utc>,
}

/// State of the booking mutation
#[derive(Clone, Debug, Default)]
pub struct MutationState {
    status: MutationStatus,
    latest_submission: Option<u64>,
    next_submission: u64,
    in_flight: usize,
    notifications: Vec<Notification>,
    next_notification: u64,
}

impl MutationState {
    /// Status of the most recent submission
    #[must_use]
    pub const fn status(&self) -> &MutationStatus {
        &self.status
    }

    /// Whether the most recent submission is still pending
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.status, MutationStatus::Pending)
    }

    /// Number of submissions that have not settled yet
    #[must_use]
    pub const fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Visible notifications, oldest first
    #[must_use]
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    fn notify(&mut self, kind: NotificationKind, text: String, at: DateTime<Utc>) -> u64 {
        self.next_notification += 1;
        let id = self.next_notification;
        self.notifications.push(Notification { id, kind, text, at });
        id
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Actions of the booking mutation
#[derive(Clone, Debug, PartialEq)]
pub enum MutationAction {
    /// Submit a booking
    Submit(BookingRequest),
    /// The backend accepted a submission
    Succeeded {
        /// Submission number
        submission: u64,
        /// What was submitted
        request: BookingRequest,
        /// Backend result
        result: BookingResult,
    },
    /// A submission failed
    Failed {
        /// Submission number
        submission: u64,
        /// What was submitted
        request: BookingRequest,
        /// Normalized error
        error: UserFacingError,
    },
    /// A submission finished, successfully or not
    Settled {
        /// Submission number
        submission: u64,
        /// What was submitted
        request: BookingRequest,
    },
    /// Remove a notification
    DismissNotification {
        /// Notification id
        id: u64,
    },
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer of the booking mutation
#[derive(Clone, Copy, Debug, Default)]
pub struct MutationReducer;

impl MutationReducer {
    fn settle(
        state: &mut MutationState,
        env: &BookingEnvironment,
        notification: u64,
        submission: u64,
        request: BookingRequest,
    ) -> SmallVec<[Effect<AppAction>; 4]> {
        state.in_flight = state.in_flight.saturating_sub(1);

        smallvec![
            delay! {
                duration: env.notification_ttl,
                action: AppAction::Mutation(MutationAction::DismissNotification { id: notification })
            },
            send_action!(AppAction::Mutation(MutationAction::Settled { submission, request })),
        ]
    }
}

impl Reducer for MutationReducer {
    type State = MutationState;
    type Action = AppAction;
    type Environment = BookingEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let AppAction::Mutation(action) = action else {
            return SmallVec::new();
        };

        match action {
            MutationAction::Submit(request) => {
                state.next_submission += 1;
                let submission = state.next_submission;
                state.latest_submission = Some(submission);
                state.status = MutationStatus::Pending;
                state.in_flight += 1;

                tracing::info!(submission, tier = %request.tier, quantity = request.quantity, "Submitting booking");

                let api = env.api.clone();
                smallvec![async_effect! {
                    match api.book_tickets(request.clone()).await {
                        Ok(result) => {
                            metrics::counter!("booking.submissions.total", "outcome" => "succeeded").increment(1);
                            Some(AppAction::Mutation(MutationAction::Succeeded { submission, request, result }))
                        },
                        Err(error) => {
                            metrics::counter!("booking.submissions.total", "outcome" => "failed").increment(1);
                            Some(AppAction::Mutation(MutationAction::Failed {
                                submission,
                                request,
                                error: normalize(&error),
                            }))
                        },
                    }
                }]
            },

            MutationAction::Succeeded {
                submission,
                request,
                result,
            } => {
                tracing::info!(
                    submission,
                    tier = %result.tier,
                    booked = result.booked_quantity,
                    remaining = result.remaining_quantity,
                    "Booking succeeded"
                );

                if state.latest_submission == Some(submission) {
                    state.status = MutationStatus::Succeeded(result);
                }
                let notification =
                    state.notify(NotificationKind::Success, messages::TICKETS_BOOKED.to_string(), env.clock.now());

                Self::settle(state, env, notification, submission, request)
            },

            MutationAction::Failed {
                submission,
                request,
                error,
            } => {
                tracing::warn!(submission, tier = %request.tier, error = %error, "Booking failed");

                let notification = state.notify(NotificationKind::Error, error.message.clone(), env.clock.now());
                if state.latest_submission == Some(submission) {
                    state.status = MutationStatus::Failed(error);
                }

                Self::settle(state, env, notification, submission, request)
            },

            MutationAction::Settled { submission, .. } => {
                tracing::debug!(submission, "Booking settled, refreshing tickets");

                let cache = env.tickets_cache.clone();
                smallvec![async_effect! {
                    cache.invalidate(TICKETS_QUERY_KEY);
                    Some(AppAction::Tickets(TicketsAction::Fetch))
                }]
            },

            MutationAction::DismissNotification { id } => {
                state.notifications.retain(|n| n.id != id);
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;
    use crate::mocks::{tier, MockTicketsApi};
    use crate::types::TierId;
    use std::sync::Arc;
    use std::time::Duration;
    use ticket_booking_testing::{assertions, test_clock, ReducerTest};

    fn env() -> BookingEnvironment {
        let api = Arc::new(MockTicketsApi::new(vec![tier("VIP", "VIP Access", 100.0, 10)]));
        BookingEnvironment::new(api, Arc::new(test_clock()), "user-1")
    }

    fn request(quantity: u32) -> BookingRequest {
        BookingRequest {
            user_id: "user-1".to_string(),
            tier: TierId::new("VIP"),
            quantity,
        }
    }

    fn result(quantity: u32) -> BookingResult {
        BookingResult {
            tier: TierId::new("VIP"),
            booked_quantity: quantity,
            remaining_quantity: 10 - quantity,
            total_amount: 100.0,
        }
    }

    fn submit(quantity: u32) -> AppAction {
        AppAction::Mutation(MutationAction::Submit(request(quantity)))
    }

    fn succeeded(submission: u64, quantity: u32) -> AppAction {
        AppAction::Mutation(MutationAction::Succeeded {
            submission,
            request: request(quantity),
            result: result(quantity),
        })
    }

    #[test]
    fn test_submit_is_pending() {
        ReducerTest::new(MutationReducer)
            .with_env(env())
            .given_state(MutationState::default())
            .when_action(submit(2))
            .then_state(|state| {
                assert!(state.is_pending());
                assert_eq!(state.in_flight(), 1);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn test_success_notifies_and_settles() {
        ReducerTest::new(MutationReducer)
            .with_env(env())
            .given_state(MutationState::default())
            .given_actions(vec![submit(3)])
            .when_action(succeeded(1, 3))
            .then_state(|state| {
                assert_eq!(state.status(), &MutationStatus::Succeeded(result(3)));
                assert_eq!(state.in_flight(), 0);
                assert_eq!(state.notifications().len(), 1);
                assert_eq!(state.notifications()[0].kind, NotificationKind::Success);
                assert_eq!(state.notifications()[0].text, "Tickets booked successfully!");
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 2);
                assertions::assert_has_delay_effect(effects, Duration::from_secs(3));
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn test_failure_notifies_with_normalized_message() {
        ReducerTest::new(MutationReducer)
            .with_env(env())
            .given_state(MutationState::default())
            .given_actions(vec![submit(3)])
            .when_action(AppAction::Mutation(MutationAction::Failed {
                submission: 1,
                request: request(3),
                error: UserFacingError::new("Not enough tickets available."),
            }))
            .then_state(|state| {
                assert_eq!(
                    state.status(),
                    &MutationStatus::Failed(UserFacingError::new("Not enough tickets available."))
                );
                assert_eq!(state.notifications()[0].kind, NotificationKind::Error);
                assert_eq!(state.notifications()[0].text, "Not enough tickets available.");
            })
            .run();
    }

    #[test]
    fn test_older_submission_does_not_overwrite_status() {
        ReducerTest::new(MutationReducer)
            .with_env(env())
            .given_state(MutationState::default())
            .given_actions(vec![submit(1), submit(2)])
            .when_action(succeeded(1, 1))
            .then_state(|state| {
                assert!(state.is_pending());
                assert_eq!(state.in_flight(), 1);
                assert_eq!(state.notifications().len(), 1);
            })
            .then_effects(|effects| assertions::assert_effects_count(effects, 2))
            .run();
    }

    #[tokio::test]
    async fn test_settle_invalidates_cache_then_fetches() {
        let mut env = env();
        env.tickets_cache = Arc::new(crate::cache::QueryCache::new(Duration::from_secs(60)));
        env.tickets_cache.set(TICKETS_QUERY_KEY, Vec::new(), env.clock.now());
        assert!(env.tickets_cache.get_fresh(TICKETS_QUERY_KEY, env.clock.now()).is_some());

        let mut state = MutationState::default();
        let mut effects = MutationReducer.reduce(
            &mut state,
            AppAction::Mutation(MutationAction::Settled {
                submission: 1,
                request: request(1),
            }),
            &env,
        );

        let Some(Effect::Future(future)) = effects.pop() else {
            panic!("expected a future effect");
        };
        assert_eq!(future.await, Some(AppAction::Tickets(TicketsAction::Fetch)));
        assert_eq!(env.tickets_cache.get_fresh(TICKETS_QUERY_KEY, env.clock.now()), None);
    }

    #[test]
    fn test_dismiss_notification() {
        ReducerTest::new(MutationReducer)
            .with_env(env())
            .given_state(MutationState::default())
            .given_actions(vec![submit(3), succeeded(1, 3)])
            .when_action(AppAction::Mutation(MutationAction::DismissNotification { id: 1 }))
            .then_state(|state| assert!(state.notifications().is_empty()))
            .run();
    }
}
