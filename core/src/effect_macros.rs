//! Declarative macros for ergonomic effect construction

/// Create an `Effect::Future` from an async block body
///
/// # Example
///
/// ```rust,ignore
/// use ticket_booking_core::async_effect;
///
/// async_effect! {
///     match api.fetch_tickets().await {
///         Ok(tiers) => Some(TicketsAction::Loaded { request, tiers }),
///         Err(error) => Some(TicketsAction::FetchFailed { request, error: normalize(&error) }),
///     }
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Future` that immediately feeds `action` back to the store
///
/// # Example
///
/// ```rust,ignore
/// use ticket_booking_core::send_action;
///
/// send_action!(AppAction::Tickets(TicketsAction::Fetch))
/// ```
#[macro_export]
macro_rules! send_action {
    ($action:expr) => {{
        let action = $action;
        $crate::effect::Effect::Future(::std::boxed::Box::pin(async move { Some(action) }))
    }};
}

/// Create an `Effect::Delay` for scheduling delayed actions
///
/// # Example
///
/// ```rust,ignore
/// use ticket_booking_core::delay;
/// use std::time::Duration;
///
/// delay! {
///     duration: Duration::from_secs(7),
///     action: BookingAction::ExpireSuccessMessage { tier }
/// }
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            action: ::std::boxed::Box::new($action),
        }
    };
}
