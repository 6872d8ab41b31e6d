//! Ticket booking console.
//!
//! Loads the tier list from the backend, prints the page and reads commands
//! from stdin. Logs go to stderr, the page goes to stdout.
//!
//! # Configuration
//!
//! Environment variables (or a `.env` file):
//! - `BOOKING_API_URL`: backend base URL (default `http://localhost:4000`)
//! - `BOOKING_USER_ID`: user id sent with bookings (default `user-<millis>`)
//! - `BOOKING_MESSAGE_TTL_SECS`, `BOOKING_NOTIFICATION_TTL_SECS`,
//!   `BOOKING_TICKETS_STALE_SECS`, `BOOKING_SHUTDOWN_TIMEOUT_SECS`
//! - `RUST_LOG`: log filter

use std::sync::Arc;
use ticket_booking::api::HttpTicketsApi;
use ticket_booking::booking::BookingAction;
use ticket_booking::console::{Command, HELP};
use ticket_booking::mutation::MutationAction;
use ticket_booking::tickets::TicketsAction;
use ticket_booking::view::PageView;
use ticket_booking::{app_reducer, AppAction, AppState, AppStore, BookingEnvironment, Config};
use ticket_booking_core::environment::SystemClock;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ticket_booking=info,ticket_booking_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load .env (ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    info!(api_url = %config.api_url, user_id = %config.user_id, "Starting ticket booking console");

    let api = HttpTicketsApi::new(config.api_url.clone())?;
    let environment = BookingEnvironment::from_config(Arc::new(api), Arc::new(SystemClock), &config);
    let store: AppStore = AppStore::new(AppState::default(), app_reducer(), environment);

    let renderer = tokio::spawn(render_on_change(store.clone(), config.user_id.clone()));

    store.send(AppAction::Tickets(TicketsAction::Fetch)).await?;
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(error) => {
                println!("{error}");
                continue;
            },
        };

        match command {
            Command::Quit => break,
            Command::Help => println!("{HELP}"),
            Command::Show => print_page(&store, &config.user_id).await,
            command => {
                let action = store.state(|state| command.to_action(state)).await;
                match action {
                    Ok(Some(action)) => {
                        store.send(action).await?;
                        print_page(&store, &config.user_id).await;
                    },
                    Ok(None) => {},
                    Err(error) => println!("{error}"),
                }
            },
        }
    }

    info!("Shutting down");
    renderer.abort();
    if let Err(error) = store.shutdown(config.shutdown_timeout).await {
        tracing::warn!(%error, "Shutdown did not complete cleanly");
    }

    Ok(())
}

async fn print_page(store: &AppStore, user_id: &str) {
    let page = store.state(|state| PageView::build(state, user_id)).await;
    println!("{}", page.render());
}

/// Re-render whenever an effect changes what the page shows
async fn render_on_change(store: AppStore, user_id: String) {
    let mut actions = store.subscribe_actions();

    loop {
        match actions.recv().await {
            Ok(
                AppAction::Tickets(TicketsAction::Loaded { .. } | TicketsAction::FetchFailed { .. })
                | AppAction::Mutation(
                    MutationAction::Succeeded { .. }
                    | MutationAction::Failed { .. }
                    | MutationAction::DismissNotification { .. },
                )
                | AppAction::Booking(BookingAction::ExpireSuccessMessage { .. }),
            ) => print_page(&store, &user_id).await,
            Ok(_) => {},
            Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Renderer lagged");
            },
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        }
    }
}
