//! Line-oriented console commands.
//!
//! ```text
//! qty <tier> <n>   set the quantity of a tier
//! book <tier>      book the selected quantity
//! retry            reload the tier list
//! show             print the page
//! help             list commands
//! quit             exit
//! ```

use crate::app::{AppAction, AppState};
use crate::booking::BookingAction;
use crate::tickets::TicketsAction;
use crate::types::TierId;
use thiserror::Error;

/// Help text printed by `help`
pub const HELP: &str = "\
Commands:
  qty <tier> <n>   set the quantity of a tier
  book <tier>      book the selected quantity
  retry            reload the tier list
  show             print the page
  help             list commands
  quit             exit";

/// A parsed console command
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `qty <tier> <n>`
    Quantity {
        /// Tier
        tier: TierId,
        /// Requested quantity (may be negative, the reducer clamps)
        value: i64,
    },
    /// `book <tier>`
    Book {
        /// Tier
        tier: TierId,
    },
    /// `retry`
    Retry,
    /// `show`
    Show,
    /// `help`
    Help,
    /// `quit`
    Quit,
}

/// Errors for commands that cannot be parsed or executed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Blank input
    #[error("Type a command, or `help` for the list")]
    Empty,
    /// Unknown verb
    #[error("Unknown command `{0}`, type `help` for the list")]
    Unknown(String),
    /// Wrong arguments for a known verb
    #[error("Usage: {0}")]
    Usage(&'static str),
    /// Quantity is not an integer
    #[error("`{0}` is not a number")]
    InvalidNumber(String),
    /// The tier is not in the loaded list
    #[error("No tier named `{0}`")]
    UnknownTier(TierId),
    /// The tier has no tickets left
    #[error("{0} is sold out")]
    SoldOut(TierId),
    /// Booking button is disabled because nothing is selected
    #[error("Select a quantity for {0} first")]
    NothingSelected(TierId),
    /// Booking button is disabled because the tier is being booked
    #[error("{0} is already being booked")]
    AlreadyBooking(TierId),
}

impl Command {
    /// Parse one input line
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] for blank lines, unknown verbs and bad arguments.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(CommandError::Empty);
        };
        let args: Vec<&str> = words.collect();

        match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("qty" | "quantity", [tier, value]) => {
                let value = value
                    .parse()
                    .map_err(|_| CommandError::InvalidNumber((*value).to_string()))?;
                Ok(Self::Quantity {
                    tier: TierId::new(*tier),
                    value,
                })
            },
            ("qty" | "quantity", _) => Err(CommandError::Usage("qty <tier> <n>")),
            ("book", [tier]) => Ok(Self::Book {
                tier: TierId::new(*tier),
            }),
            ("book", _) => Err(CommandError::Usage("book <tier>")),
            ("retry" | "refresh", []) => Ok(Self::Retry),
            ("show" | "ls", []) => Ok(Self::Show),
            ("help" | "?", []) => Ok(Self::Help),
            ("quit" | "exit" | "q", []) => Ok(Self::Quit),
            _ => Err(CommandError::Unknown(verb.to_string())),
        }
    }

    /// The action this command sends, checked against the current page
    ///
    /// Quantities are capped at the tier's availability, like the quantity
    /// input. Booking is refused whenever the tier's button would be
    /// disabled. `show`, `help` and `quit` send nothing.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] for unknown tiers and disabled bookings.
    pub fn to_action(&self, state: &AppState) -> Result<Option<AppAction>, CommandError> {
        match self {
            Self::Quantity { tier, value } => {
                let mut value = *value;
                if state.tickets.has_data() {
                    let loaded = find_tier(state, tier)?;
                    value = value.min(i64::from(loaded.available_quantity));
                }
                Ok(Some(AppAction::Booking(BookingAction::ChangeQuantity {
                    tier: tier.clone(),
                    value,
                })))
            },
            Self::Book { tier } => {
                let loaded = find_tier(state, tier)?;
                if loaded.is_sold_out() {
                    return Err(CommandError::SoldOut(tier.clone()));
                }
                if state.is_booking(tier) {
                    return Err(CommandError::AlreadyBooking(tier.clone()));
                }
                if state.booking.quantity(tier) == 0 {
                    return Err(CommandError::NothingSelected(tier.clone()));
                }
                Ok(Some(AppAction::Booking(BookingAction::Book { tier: tier.clone() })))
            },
            Self::Retry => Ok(Some(AppAction::Tickets(TicketsAction::Refetch))),
            Self::Show | Self::Help | Self::Quit => Ok(None),
        }
    }
}

fn find_tier<'a>(state: &'a AppState, tier: &TierId) -> Result<&'a crate::types::TicketTier, CommandError> {
    state
        .tickets
        .tiers()
        .iter()
        .find(|t| &t.tier == tier)
        .ok_or_else(|| CommandError::UnknownTier(tier.clone()))
}
