//! # Ticket Booking
//!
//! Console client for the ticket booking backend.
//!
//! The client fetches the list of ticket tiers, lets the user pick a quantity
//! per tier, submits bookings and shows success or error feedback. All of it
//! runs as reducers on a [`ticket_booking_runtime::Store`]:
//!
//! - [`tickets`]: Ticket query (fetch, cache, refetch, stale-response guard)
//! - [`mutation`]: Booking mutation (submit, notifications, cache invalidation)
//! - [`booking`]: Per-tier quantities, success messages and the in-flight marker
//! - [`app`]: Composition of the three into one application reducer
//!
//! Side effects go through [`environment::BookingEnvironment`]: the
//! [`api::TicketsApi`] client, the ticket [`cache::QueryCache`] and the clock.

pub mod api;
pub mod app;
pub mod booking;
pub mod cache;
pub mod config;
pub mod console;
pub mod environment;
pub mod error;
pub mod messages;
#[cfg(any(test, feature = "test-support"))]
pub mod mocks;
pub mod mutation;
pub mod tickets;
pub mod types;
pub mod view;

pub use app::{app_reducer, AppAction, AppReducer, AppState};
pub use config::Config;
pub use environment::BookingEnvironment;
pub use error::{normalize, ApiError, UserFacingError};
pub use types::{BookingRequest, BookingResult, TicketTier, TierId};

/// The application store
pub type AppStore = ticket_booking_runtime::Store<AppState, AppAction, BookingEnvironment, AppReducer>;
