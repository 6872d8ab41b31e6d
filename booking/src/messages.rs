//! User-facing texts and backend endpoints.

/// Backend endpoints, relative to the configured base URL
pub mod endpoints {
    /// Ticket tier list
    pub const TICKETS: &str = "/api/tickets";
    /// Booking submission
    pub const BOOK_TICKETS: &str = "/api/tickets/book";
}

/// Notification after a successful booking
pub const TICKETS_BOOKED: &str = "Tickets booked successfully!";
/// Error alert title when the tier list cannot be loaded
pub const FETCH_TICKETS_FAILED: &str = "Failed to fetch tickets";
/// Error notification title for failed bookings
pub const BOOK_TICKETS_FAILED: &str = "Failed to book tickets";
/// Shown while the tier list loads
pub const LOADING_TICKETS: &str = "Loading tickets...";
/// Button text while a tier is being booked
pub const BOOKING: &str = "Booking...";
/// Tag for tiers without availability
pub const SOLD_OUT: &str = "Sold Out";
/// Shown when the backend returns no tiers
pub const NO_TICKETS: &str = "No tickets available";

/// Application header
pub const APP_HEADER: &str = "Ticket Booking System";
/// Page title
pub const PAGE_TITLE: &str = "Available Tickets";
/// Page description
pub const PAGE_DESCRIPTION: &str = "Book your tickets for the upcoming event";
/// Label in front of the user id
pub const USER_ID_LABEL: &str = "Your User ID:";

/// Per-tier message after a successful booking
#[must_use]
pub fn booking_success(quantity: u32, tier: &str, total: f64) -> String {
    format!("Successfully booked {quantity} {tier} ticket(s)! Total: ${total}")
}

/// Text of the booking button
#[must_use]
pub fn book_button(quantity: u32) -> String {
    format!("Book {quantity} Tickets")
}
