//! In-memory [`TicketsApi`] for tests and offline runs.
//!
//! [`MockTicketsApi`] behaves like a small backend: it holds an inventory,
//! decrements it on booking and reports 422 when a tier runs out. Tests can
//! also script exact responses, which are consumed in order before the
//! inventory behaviour applies.

use crate::api::{ApiFuture, TicketsApi};
use crate::error::ApiError;
use crate::types::{ApiErrorBody, BookingRequest, BookingResult, TicketTier, TierId};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Default)]
struct MockState {
    tiers: Vec<TicketTier>,
    fetch_responses: VecDeque<(Duration, Result<Vec<TicketTier>, ApiError>)>,
    book_responses: VecDeque<(Duration, Result<BookingResult, ApiError>)>,
    booking_latency: Duration,
    fetch_count: usize,
    bookings: Vec<BookingRequest>,
}

/// Scriptable in-memory backend
#[derive(Default)]
pub struct MockTicketsApi {
    state: Mutex<MockState>,
}

impl MockTicketsApi {
    /// Backend serving `tiers`
    #[must_use]
    pub fn new(tiers: Vec<TicketTier>) -> Self {
        Self {
            state: Mutex::new(MockState {
                tiers,
                ..MockState::default()
            }),
        }
    }

    /// Backend serving the VIP / Front Row / GA demo inventory
    #[must_use]
    pub fn with_demo_inventory() -> Self {
        Self::new(vec![
            tier("VIP", "VIP Access", 100.0, 10),
            tier("FRONT_ROW", "Front Row", 50.0, 20),
            tier("GA", "General Admission", 10.0, 100),
        ])
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer the next fetch with `response`
    pub fn push_fetch_response(&self, response: Result<Vec<TicketTier>, ApiError>) {
        self.push_delayed_fetch_response(Duration::ZERO, response);
    }

    /// Answer the next fetch with `response` after `latency`
    pub fn push_delayed_fetch_response(&self, latency: Duration, response: Result<Vec<TicketTier>, ApiError>) {
        self.lock().fetch_responses.push_back((latency, response));
    }

    /// Answer the next booking with `response`
    pub fn push_book_response(&self, response: Result<BookingResult, ApiError>) {
        let latency = self.lock().booking_latency;
        self.lock().book_responses.push_back((latency, response));
    }

    /// Delay every booking response by `latency`
    pub fn set_booking_latency(&self, latency: Duration) {
        self.lock().booking_latency = latency;
    }

    /// Replace the served inventory
    pub fn set_tiers(&self, tiers: Vec<TicketTier>) {
        self.lock().tiers = tiers;
    }

    /// Number of fetches received
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.lock().fetch_count
    }

    /// Booking requests received, oldest first
    #[must_use]
    pub fn bookings(&self) -> Vec<BookingRequest> {
        self.lock().bookings.clone()
    }

    fn book_from_inventory(state: &mut MockState, request: &BookingRequest) -> Result<BookingResult, ApiError> {
        let Some(tier) = state.tiers.iter_mut().find(|t| t.tier == request.tier) else {
            return Err(rejection(404, "NOT_FOUND", &format!("Tier {} not found", request.tier)));
        };

        if request.quantity == 0 {
            return Err(rejection(400, "VALIDATION_ERROR", "Quantity must be positive"));
        }
        if request.quantity > tier.available_quantity {
            return Err(rejection(422, "INSUFFICIENT_TICKETS", "Not enough tickets available"));
        }

        tier.available_quantity -= request.quantity;

        Ok(BookingResult {
            tier: tier.tier.clone(),
            booked_quantity: request.quantity,
            remaining_quantity: tier.available_quantity,
            total_amount: tier.price * f64::from(request.quantity),
        })
    }
}

impl TicketsApi for MockTicketsApi {
    fn fetch_tickets(&self) -> ApiFuture<'_, Vec<TicketTier>> {
        let (latency, response) = {
            let mut state = self.lock();
            state.fetch_count += 1;
            state
                .fetch_responses
                .pop_front()
                .unwrap_or_else(|| (Duration::ZERO, Ok(state.tiers.clone())))
        };

        Box::pin(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            response
        })
    }

    fn book_tickets(&self, request: BookingRequest) -> ApiFuture<'_, BookingResult> {
        let (latency, response) = {
            let mut state = self.lock();
            state.bookings.push(request.clone());
            match state.book_responses.pop_front() {
                Some(scripted) => scripted,
                None => {
                    let latency = state.booking_latency;
                    (latency, Self::book_from_inventory(&mut state, &request))
                },
            }
        };

        Box::pin(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            response
        })
    }
}

/// A tier with full availability
#[must_use]
pub fn tier(id: &str, label: &str, price: f64, quantity: u32) -> TicketTier {
    TicketTier {
        id: None,
        tier: TierId::new(id),
        label: label.to_string(),
        price,
        total_quantity: quantity,
        available_quantity: quantity,
    }
}

/// A backend rejection with a structured payload
#[must_use]
pub fn rejection(status: u16, code: &str, message: &str) -> ApiError {
    ApiError::Backend {
        http_status: status,
        payload: Some(ApiErrorBody {
            name: Some("ApiError".to_string()),
            code: Some(code.to_string()),
            message: Some(message.to_string()),
            status: Some(status),
            details: Vec::new(),
        }),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn request(tier: &str, quantity: u32) -> BookingRequest {
        BookingRequest {
            user_id: "user-1".to_string(),
            tier: TierId::new(tier),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_inventory_is_decremented() {
        let api = MockTicketsApi::with_demo_inventory();

        let result = api.book_tickets(request("VIP", 3)).await.unwrap();
        assert_eq!(result.remaining_quantity, 7);
        assert!((result.total_amount - 300.0).abs() < f64::EPSILON);

        let tiers = api.fetch_tickets().await.unwrap();
        assert_eq!(tiers[0].available_quantity, 7);
        assert_eq!(api.fetch_count(), 1);
        assert_eq!(api.bookings().len(), 1);
    }

    #[tokio::test]
    async fn test_overbooking_is_rejected() {
        let api = MockTicketsApi::with_demo_inventory();

        let error = api.book_tickets(request("VIP", 11)).await.unwrap_err();
        assert!(matches!(error, ApiError::Backend { http_status: 422, .. }));
    }

    #[tokio::test]
    async fn test_scripted_responses_come_first() {
        let api = MockTicketsApi::with_demo_inventory();
        api.push_fetch_response(Err(ApiError::Transport("offline".to_string())));

        assert!(api.fetch_tickets().await.is_err());
        assert_eq!(api.fetch_tickets().await.unwrap().len(), 3);
    }
}
