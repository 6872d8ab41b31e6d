//! Application state, actions and the composed reducer.

use crate::booking::{BookingAction, BookingReducer, BookingState};
use crate::environment::BookingEnvironment;
use crate::mutation::{MutationAction, MutationReducer, MutationState};
use crate::tickets::{TicketsAction, TicketsReducer, TicketsState};
use ticket_booking_core::composition::{combine_reducers, scope_reducer, CombinedReducer};

/// Whole client state
#[derive(Clone, Debug, Default)]
pub struct AppState {
    /// Ticket tier query
    pub tickets: TicketsState,
    /// Booking mutation
    pub mutation: MutationState,
    /// Per-tier quantities, messages and marker
    pub booking: BookingState,
}

impl AppState {
    /// Whether the button of `tier` shows "Booking..."
    ///
    /// True while `tier` is the marked tier and the latest submission is pending.
    #[must_use]
    pub fn is_booking(&self, tier: &crate::types::TierId) -> bool {
        self.booking.booking_tier() == Some(tier) && self.mutation.is_pending()
    }
}

/// Every action the client handles
///
/// All feature reducers see every action, so the booking orchestration can
/// react to mutation results and loaded tiers.
#[derive(Clone, Debug, PartialEq)]
pub enum AppAction {
    /// Ticket query
    Tickets(TicketsAction),
    /// Booking mutation
    Mutation(MutationAction),
    /// Booking orchestration
    Booking(BookingAction),
}

/// The composed application reducer
pub type AppReducer = CombinedReducer<AppState, AppAction, BookingEnvironment>;

/// Build the application reducer
///
/// Order matters: the query runs first so a `Loaded` action has updated the
/// tier list before the orchestration syncs its quantities to it.
#[must_use]
pub fn app_reducer() -> AppReducer {
    combine_reducers(vec![
        Box::new(scope_reducer(
            TicketsReducer,
            |app: &AppState| &app.tickets,
            |app: &mut AppState, tickets| app.tickets = tickets,
        )),
        Box::new(scope_reducer(
            MutationReducer,
            |app: &AppState| &app.mutation,
            |app: &mut AppState, mutation| app.mutation = mutation,
        )),
        Box::new(scope_reducer(
            BookingReducer,
            |app: &AppState| &app.booking,
            |app: &mut AppState, booking| app.booking = booking,
        )),
    ])
}
