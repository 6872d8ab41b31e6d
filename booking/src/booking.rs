//! Booking orchestration: per-tier quantities, success messages and the
//! "currently booking" marker.
//!
//! Lifecycle of one booking: `Idle → Submitting → {Succeeded | Failed} → Idle`.
//! The marker holds only the most recently submitted tier and is cleared by
//! whichever submission settles first.

use crate::app::AppAction;
use crate::environment::BookingEnvironment;
use crate::messages;
use crate::mutation::MutationAction;
use crate::tickets::TicketsAction;
use crate::types::{BookingRequest, TicketTier, TierId};
use std::collections::{BTreeMap, BTreeSet};
use ticket_booking_core::{delay, effect::Effect, effect::EffectId, reducer::Reducer, send_action, smallvec, SmallVec};

/// Effect id of the success message expiry for `tier`
#[must_use]
pub fn success_message_id(tier: &TierId) -> EffectId {
    EffectId::new(format!("success-message:{tier}"))
}

/// Per-tier booking state
#[derive(Clone, Debug, Default)]
pub struct BookingState {
    quantities: BTreeMap<TierId, u32>,
    success_messages: BTreeMap<TierId, String>,
    booking_tier: Option<TierId>,
    latest_request: u64,
}

impl BookingState {
    /// Selected quantity for `tier` (0 when never set)
    #[must_use]
    pub fn quantity(&self, tier: &TierId) -> u32 {
        self.quantities.get(tier).copied().unwrap_or(0)
    }

    /// All selected quantities
    #[must_use]
    pub const fn quantities(&self) -> &BTreeMap<TierId, u32> {
        &self.quantities
    }

    /// Success message for `tier`, if one is showing
    #[must_use]
    pub fn success_message(&self, tier: &TierId) -> Option<&str> {
        self.success_messages.get(tier).map(String::as_str)
    }

    /// Tier of the most recent booking that has not settled
    #[must_use]
    pub const fn booking_tier(&self) -> Option<&TierId> {
        self.booking_tier.as_ref()
    }

    /// Sum of all selected quantities
    ///
    /// Summed as `u64`, so it cannot overflow for any number of tiers at `u32::MAX`.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.quantities.values().map(|&quantity| u64::from(quantity)).sum()
    }

    /// Σ price × quantity over `tiers`
    ///
    /// Selections for tiers missing from `tiers` do not count.
    #[must_use]
    pub fn total_price(&self, tiers: &[TicketTier]) -> f64 {
        tiers
            .iter()
            .map(|tier| tier.price * f64::from(self.quantity(&tier.tier)))
            .sum()
    }

    /// Make the quantity map match the loaded tiers
    fn sync_tiers(&mut self, tiers: &[TicketTier]) {
        let current: BTreeSet<&TierId> = tiers.iter().map(|tier| &tier.tier).collect();

        self.quantities.retain(|tier, _| current.contains(tier));
        self.success_messages.retain(|tier, _| current.contains(tier));

        for tier in tiers {
            self.quantities.entry(tier.tier.clone()).or_insert(0);
        }
    }
}

/// Actions of the booking orchestration
#[derive(Clone, Debug, PartialEq)]
pub enum BookingAction {
    /// Set the quantity for a tier (negative values clamp to 0)
    ChangeQuantity {
        /// Tier to change
        tier: TierId,
        /// Requested quantity
        value: i64,
    },
    /// Book the selected quantity of a tier
    Book {
        /// Tier to book
        tier: TierId,
    },
    /// The success message of a tier timed out
    ExpireSuccessMessage {
        /// Tier whose message expires
        tier: TierId,
    },
}

/// Reducer of the booking orchestration
#[derive(Clone, Copy, Debug, Default)]
pub struct BookingReducer;

impl Reducer for BookingReducer {
    type State = BookingState;
    type Action = AppAction;
    type Environment = BookingEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            AppAction::Booking(BookingAction::ChangeQuantity { tier, value }) => {
                let quantity = u32::try_from(value.max(0)).unwrap_or(u32::MAX);

                state.success_messages.remove(&tier);
                let cancel = Effect::Cancel(success_message_id(&tier));
                state.quantities.insert(tier, quantity);

                smallvec![cancel]
            },

            AppAction::Booking(BookingAction::Book { tier }) => {
                let quantity = state.quantity(&tier);
                if quantity == 0 {
                    tracing::debug!(%tier, "Nothing to book");
                    return SmallVec::new();
                }

                state.booking_tier = Some(tier.clone());

                let request = BookingRequest {
                    user_id: env.user_id.clone(),
                    tier,
                    quantity,
                };

                smallvec![
                    Effect::Cancel(success_message_id(&request.tier)),
                    send_action!(AppAction::Mutation(MutationAction::Submit(request))),
                ]
            },

            AppAction::Booking(BookingAction::ExpireSuccessMessage { tier }) => {
                state.success_messages.remove(&tier);
                SmallVec::new()
            },

            AppAction::Mutation(MutationAction::Succeeded { request, result, .. }) => {
                let total = f64::from(request.quantity) * result.total_amount;
                state.success_messages.insert(
                    request.tier.clone(),
                    messages::booking_success(request.quantity, request.tier.as_str(), total),
                );
                state.quantities.insert(request.tier, 0);
                SmallVec::new()
            },

            AppAction::Mutation(MutationAction::Settled { request, .. }) => {
                state.booking_tier = None;

                let id = success_message_id(&request.tier);
                let expire = delay! {
                    duration: env.message_ttl,
                    action: AppAction::Booking(BookingAction::ExpireSuccessMessage { tier: request.tier })
                };

                smallvec![expire.cancellable(id)]
            },

            // Mirrors the query's request numbering: only the response to the
            // latest fetch may prune quantities.
            AppAction::Tickets(TicketsAction::Fetch | TicketsAction::Refetch) => {
                state.latest_request += 1;
                SmallVec::new()
            },

            AppAction::Tickets(TicketsAction::Loaded { request, tiers }) => {
                if request == state.latest_request {
                    state.sync_tiers(&tiers);
                } else {
                    tracing::debug!(request, latest = state.latest_request, "Not syncing quantities to stale tiers");
                }
                SmallVec::new()
            },

            AppAction::Mutation(_) | AppAction::Tickets(_) => SmallVec::new(),
        }
    }
}
