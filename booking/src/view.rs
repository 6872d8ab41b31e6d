//! Terminal presentation of the booking page.
//!
//! [`PageView::build`] turns the application state into a plain view model
//! and [`PageView::render`] prints it. Neither touches the store, so both are
//! tested directly against hand-built state.

use crate::app::AppState;
use crate::messages;
use crate::mutation::NotificationKind;
use crate::tickets::TicketsView;
use crate::types::TicketTier;
use std::fmt::Write as _;

const TIER_PALETTE: [&str; 8] = [
    "#1890ff", // blue
    "#52c41a", // green
    "#faad14", // gold
    "#f5222d", // red
    "#722ed1", // purple
    "#13c2c2", // cyan
    "#eb2f96", // pink
    "#fa8c16", // orange
];

/// Stable badge colour for a tier name
///
/// Hashes the UTF-16 code units with `hash = c + (hash << 5) - hash`, using
/// 32-bit wrapping for the shift, so a tier keeps its colour across runs and
/// across clients that share the palette.
#[must_use]
pub fn tier_color(tier: &str) -> &'static str {
    let hash = tier.encode_utf16().fold(0_i64, |hash, unit| {
        #[allow(clippy::cast_possible_truncation)] // 32-bit wrap is the point
        let shifted = (hash as i32).wrapping_shl(5);
        i64::from(unit) + i64::from(shifted) - hash
    });

    let index = usize::try_from(hash.unsigned_abs() % TIER_PALETTE.len() as u64).unwrap_or(0);
    TIER_PALETTE[index]
}

/// The booking button of a card
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ButtonView {
    /// "Book N Tickets" or "Booking..."
    pub text: String,
    /// Disabled when the quantity is 0 or the tier is being booked
    pub disabled: bool,
}

/// One ticket tier card
#[derive(Clone, Debug, PartialEq)]
pub struct TicketCardView {
    /// Tier id
    pub tier: String,
    /// Display label
    pub label: String,
    /// Badge colour
    pub color: &'static str,
    /// Unit price
    pub price: f64,
    /// Tickets available
    pub available: u32,
    /// Selected quantity
    pub quantity: u32,
    /// Quantity input and button; `None` when sold out
    pub button: Option<ButtonView>,
    /// Success message of the last booking
    pub success_message: Option<String>,
}

/// Main section of the page
#[derive(Clone, Debug, PartialEq)]
pub enum PageBody {
    /// First load running
    Loading,
    /// Loading failed
    Error {
        /// Normalized error message
        description: String,
    },
    /// No tiers
    Empty,
    /// Ticket cards
    Cards(Vec<TicketCardView>),
}

/// View model of the whole page
#[derive(Clone, Debug, PartialEq)]
pub struct PageView {
    /// User id shown under the description
    pub user_id: String,
    /// Main section
    pub body: PageBody,
    /// Visible notifications (kind, text)
    pub notifications: Vec<(NotificationKind, String)>,
    /// Total selected quantity
    pub total_quantity: u64,
    /// Total price of the selection
    pub total_price: f64,
}

impl TicketCardView {
    fn build(state: &AppState, tier: &TicketTier) -> Self {
        let quantity = state.booking.quantity(&tier.tier);
        let is_booking = state.is_booking(&tier.tier);

        let button = (!tier.is_sold_out()).then(|| ButtonView {
            text: if is_booking {
                messages::BOOKING.to_string()
            } else {
                messages::book_button(quantity)
            },
            disabled: quantity == 0 || is_booking,
        });

        Self {
            tier: tier.tier.to_string(),
            label: tier.label.clone(),
            color: tier_color(tier.tier.as_str()),
            price: tier.price,
            available: tier.available_quantity,
            quantity,
            button,
            success_message: state.booking.success_message(&tier.tier).map(str::to_string),
        }
    }
}

impl PageView {
    /// Build the view model from the application state
    #[must_use]
    pub fn build(state: &AppState, user_id: &str) -> Self {
        let body = match state.tickets.view() {
            TicketsView::Loading => PageBody::Loading,
            TicketsView::Error { message } => PageBody::Error {
                description: message.to_string(),
            },
            TicketsView::Empty => PageBody::Empty,
            TicketsView::Tickets(tiers) => {
                PageBody::Cards(tiers.iter().map(|tier| TicketCardView::build(state, tier)).collect())
            },
        };

        Self {
            user_id: user_id.to_string(),
            body,
            notifications: state
                .mutation
                .notifications()
                .iter()
                .map(|n| (n.kind, n.text.clone()))
                .collect(),
            total_quantity: state.booking.total_quantity(),
            total_price: state.booking.total_price(state.tickets.tiers()),
        }
    }

    /// The card of `tier`, if shown
    #[must_use]
    pub fn card(&self, tier: &str) -> Option<&TicketCardView> {
        match &self.body {
            PageBody::Cards(cards) => cards.iter().find(|card| card.tier == tier),
            _ => None,
        }
    }

    /// Render the page as terminal text
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "=== {} ===", messages::APP_HEADER);
        let _ = writeln!(out, "{}", messages::PAGE_TITLE);
        let _ = writeln!(out, "{}", messages::PAGE_DESCRIPTION);
        let _ = writeln!(out, "{} {}", messages::USER_ID_LABEL, self.user_id);
        out.push('\n');

        for (kind, text) in &self.notifications {
            let tag = match kind {
                NotificationKind::Success => "OK",
                NotificationKind::Error => "ERROR",
            };
            let _ = writeln!(out, "[{tag}] {text}");
        }

        match &self.body {
            PageBody::Loading => {
                let _ = writeln!(out, "{}", messages::LOADING_TICKETS);
            },
            PageBody::Error { description } => {
                let _ = writeln!(out, "{}", messages::FETCH_TICKETS_FAILED);
                let _ = writeln!(out, "  {description}");
                let _ = writeln!(out, "  Type `retry` to try again.");
            },
            PageBody::Empty => {
                let _ = writeln!(out, "{}", messages::NO_TICKETS);
            },
            PageBody::Cards(cards) => {
                for card in cards {
                    render_card(&mut out, card);
                }
            },
        }

        let _ = writeln!(
            out,
            "Selected: {} ticket(s), Total: ${}",
            self.total_quantity, self.total_price
        );
        out
    }
}

fn render_card(out: &mut String, card: &TicketCardView) {
    let _ = writeln!(out, "+ {} ({}) [{}]", card.tier, card.label, card.color);
    let _ = writeln!(out, "  ${}", card.price);
    let _ = writeln!(out, "  Available: {}", card.available);

    match &card.button {
        None => {
            let _ = writeln!(out, "  {}", messages::SOLD_OUT);
        },
        Some(button) => {
            let state = if button.disabled { " (disabled)" } else { "" };
            let _ = writeln!(out, "  Quantity: {}  [{}]{state}", card.quantity, button.text);
        },
    }

    if let Some(message) = &card.success_message {
        let _ = writeln!(out, "  {message}");
    }
    out.push('\n');
}
