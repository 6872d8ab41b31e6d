//! Backend API abstraction.
//!
//! Reducers only see the [`TicketsApi`] trait through the environment; the
//! binary injects [`HttpTicketsApi`] and tests inject
//! [`crate::mocks::MockTicketsApi`].

use crate::error::ApiError;
use crate::types::{BookingRequest, BookingResult, TicketTier};
use futures::future::BoxFuture;

pub mod http;

pub use http::HttpTicketsApi;

/// Boxed future returned by [`TicketsApi`] methods
pub type ApiFuture<'a, T> = BoxFuture<'a, Result<T, ApiError>>;

/// Client for the ticket booking backend
pub trait TicketsApi: Send + Sync {
    /// `GET /api/tickets`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure, error responses or an
    /// unexpected body.
    fn fetch_tickets(&self) -> ApiFuture<'_, Vec<TicketTier>>;

    /// `POST /api/tickets/book`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure, error responses or an
    /// unexpected body.
    fn book_tickets(&self, request: BookingRequest) -> ApiFuture<'_, BookingResult>;
}
