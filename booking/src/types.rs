//! Wire and domain types shared with the booking backend.
//!
//! Field names follow the backend's JSON contract (camelCase).

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

/// Ticket tier identifier
///
/// Tiers are defined by the backend (`"VIP"`, `"FRONT_ROW"`, `"GA"`, ...). The
/// client treats them as opaque strings and never matches on known values.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierId(String);

impl TierId {
    /// Create a tier id
    #[must_use]
    pub fn new(tier: impl Into<String>) -> Self {
        Self(tier.into())
    }

    /// The tier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TierId {
    fn from(tier: &str) -> Self {
        Self::new(tier)
    }
}

// ============================================================================
// Tickets
// ============================================================================

/// A ticket tier as returned by `GET /api/tickets`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketTier {
    /// Backend row id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Tier identifier
    pub tier: TierId,
    /// Display label
    pub label: String,
    /// Unit price
    pub price: f64,
    /// Total capacity
    pub total_quantity: u32,
    /// Tickets still available
    pub available_quantity: u32,
}

impl TicketTier {
    /// Whether no tickets are left
    #[must_use]
    pub const fn is_sold_out(&self) -> bool {
        self.available_quantity == 0
    }
}

// ============================================================================
// Bookings
// ============================================================================

/// Body of `POST /api/tickets/book`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    /// User placing the booking
    pub user_id: String,
    /// Tier to book
    pub tier: TierId,
    /// Number of tickets (positive)
    pub quantity: u32,
}

/// Successful booking returned by the backend
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResult {
    /// Booked tier
    pub tier: TierId,
    /// Tickets booked
    pub booked_quantity: u32,
    /// Tickets left in the tier
    pub remaining_quantity: u32,
    /// Amount charged
    pub total_amount: f64,
}

// ============================================================================
// Envelope
// ============================================================================

/// Response envelope used by every backend endpoint
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Whether the call succeeded
    pub success: bool,
    /// Payload on success
    pub data: Option<T>,
    /// Payload on failure
    pub error: Option<ApiErrorBody>,
}

/// Structured error payload: `{ code, message, status, details }`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Error class, e.g. `PAYMENT_FAILED`
    pub name: Option<String>,
    /// Machine-readable error code
    pub code: Option<String>,
    /// Human-readable message
    pub message: Option<String>,
    /// HTTP status the backend assigned to the error
    pub status: Option<u16>,
    /// Field-level validation failures
    #[serde(default)]
    pub details: Vec<ApiErrorDetail>,
}

/// One field-level validation failure
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    /// Offending field
    pub path: String,
    /// What is wrong with it
    pub message: String,
}
