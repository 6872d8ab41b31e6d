//! # Ticket Booking Runtime
//!
//! The Store runtime that coordinates reducer execution and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: Owns the state and runs the reducer for every action
//! - **Effect Executor**: Runs effect descriptions on Tokio tasks and feeds
//!   produced actions back into the store
//! - **Cancellation Registry**: Tracks effects started with an
//!   [`EffectId`] so a newer effect (or an explicit `Effect::Cancel`) can
//!   abort them
//!
//! ## Example
//!
//! ```ignore
//! use ticket_booking_runtime::Store;
//!
//! let store = Store::new(AppState::default(), app_reducer(), environment);
//!
//! store.send(AppAction::Tickets(TicketsAction::Fetch)).await?;
//! let loading = store.state(|s| s.tickets.is_fetching()).await;
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use ticket_booking_core::effect::{Effect, EffectId};
use ticket_booking_core::reducer::Reducer;
use tokio::sync::RwLock;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for a matching action or for effects to drain
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// A running cancellable effect
struct Cancellation {
    token: u64,
    handle: tokio::task::AbortHandle,
}

type CancellationRegistry = Arc<Mutex<HashMap<EffectId, Cancellation>>>;

fn lock_registry(registry: &CancellationRegistry) -> MutexGuard<'_, HashMap<EffectId, Cancellation>> {
    // The map stays consistent even if a holder panicked.
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Decrements the pending effect counter on drop (also on abort)
struct PendingGuard(Arc<AtomicUsize>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{
        lock_registry, Arc, AtomicBool, AtomicU64, AtomicUsize, Cancellation,
        CancellationRegistry, Duration, Effect, EffectId, HashMap, Mutex, Ordering,
        PendingGuard, Reducer, RwLock, StoreError,
    };
    use futures::future::BoxFuture;
    use tokio::sync::broadcast;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop and cancellation)
    ///
    /// Reducer calls are serialized by the state lock. Every effect runs on
    /// its own Tokio task; actions it produces are sent back through
    /// [`Store::send`] and then broadcast to observers.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: Arc<R>,
        environment: Arc<E>,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        cancellations: CancellationRegistry,
        next_token: Arc<AtomicU64>,
        /// Actions produced by effects, published after they were reduced.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// The action broadcast channel holds 64 actions; use
        /// [`Store::with_broadcast_capacity`] for chattier reducers.
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_broadcast_capacity(initial_state, reducer, environment, 64)
        }

        /// Create a store with a custom action broadcast capacity
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(capacity);

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                cancellations: Arc::new(Mutex::new(HashMap::new())),
                next_token: Arc::new(AtomicU64::new(0)),
                action_broadcast,
            }
        }

        /// The injected environment
        #[must_use]
        pub fn environment(&self) -> &E {
            &self.environment
        }

        /// Number of effects currently running (including pending delays)
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::SeqCst)
        }

        /// Whether a cancellable effect is registered under `id`
        #[must_use]
        pub fn is_running(&self, id: &EffectId) -> bool {
            lock_registry(&self.cancellations).contains_key(id)
        }

        /// Send an action to the store
        ///
        /// Runs the reducer under the state write lock, then starts every
        /// returned effect. Returns once the effects are started, not finished.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] after [`Store::shutdown`]
        /// has been called.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<(), StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            tracing::debug!("Processing action");
            metrics::counter!("store.commands.total").increment(1);

            let effects = {
                let mut state = self.state.write().await;

                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                tracing::trace!("Reducer completed, returned {} effects", effects.len());
                effects
            };

            for effect in effects {
                self.execute(effect);
            }

            Ok(())
        }

        /// Send an action and wait for an effect-produced action matching `predicate`
        ///
        /// Subscribes before sending, so a fast effect cannot be missed. The
        /// matching action has already been reduced when it is returned.
        ///
        /// # Errors
        ///
        /// - [`StoreError::ShutdownInProgress`] if the store is shutting down
        /// - [`StoreError::Timeout`] if no matching action arrives in time
        /// - [`StoreError::ChannelClosed`] if the broadcast channel closes
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            let mut rx = self.action_broadcast.subscribe();

            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action observer lagged, {} actions skipped", skipped);
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to actions produced by effects
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read the current state
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&state)
        }

        /// Cancel the effect registered under `id`
        ///
        /// Returns true if an effect was running.
        pub fn cancel(&self, id: &EffectId) -> bool {
            let cancelled = lock_registry(&self.cancellations).remove(id);
            match cancelled {
                Some(cancellation) => {
                    cancellation.handle.abort();
                    metrics::counter!("store.effects.cancelled").increment(1);
                    tracing::debug!(effect_id = %id, "Cancelled effect");
                    true
                },
                None => false,
            }
        }

        /// Wait until no effects are running
        ///
        /// Pending delays count as running, so this also waits for timers.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::Timeout`] if effects are still running when
        /// `timeout` elapses.
        pub async fn wait_until_idle(&self, timeout: Duration) -> Result<(), StoreError> {
            let poll_interval = Duration::from_millis(10);

            tokio::time::timeout(timeout, async {
                while self.pending_effects() > 0 {
                    tokio::time::sleep(poll_interval).await;
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)
        }

        /// Initiate graceful shutdown
        ///
        /// Rejects new actions, cancels every cancellable effect (timers and
        /// superseded fetches have nothing left to report), then waits for the
        /// remaining effects.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] with the number of effects
        /// still running when `timeout` elapses.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);

            self.shutdown.store(true, Ordering::Release);

            let cancellations: Vec<Cancellation> = lock_registry(&self.cancellations)
                .drain()
                .map(|(_, cancellation)| cancellation)
                .collect();
            for cancellation in cancellations {
                cancellation.handle.abort();
            }

            match self.wait_until_idle(timeout).await {
                Ok(()) => {
                    tracing::info!("All effects completed, shutdown successful");
                    metrics::counter!("store.shutdown.completed").increment(1);
                    Ok(())
                },
                Err(_) => {
                    let pending = self.pending_effects();
                    tracing::error!(pending_effects = pending, "Shutdown timeout: {} effects still running", pending);
                    metrics::counter!("store.shutdown.timeout").increment(1);
                    Err(StoreError::ShutdownTimeout(pending))
                },
            }
        }

        fn track(&self) -> PendingGuard {
            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            PendingGuard(Arc::clone(&self.pending_effects))
        }

        /// Start an effect returned by the reducer
        fn execute(&self, effect: Effect<A>) {
            match effect {
                Effect::None => {
                    tracing::trace!("Executing Effect::None (no-op)");
                },
                Effect::Cancel(id) => {
                    metrics::counter!("store.effects.executed", "type" => "cancel").increment(1);
                    self.cancel(&id);
                },
                Effect::Cancellable { id, effect } => {
                    metrics::counter!("store.effects.executed", "type" => "cancellable").increment(1);
                    self.spawn_cancellable(id, *effect);
                },
                effect => {
                    let guard = self.track();
                    let run = self.run_effect(effect);
                    tokio::spawn(async move {
                        let _guard = guard;
                        run.await;
                    });
                },
            }
        }

        fn spawn_cancellable(&self, id: EffectId, effect: Effect<A>) {
            let token = self.next_token.fetch_add(1, Ordering::SeqCst);
            let guard = self.track();
            let run = self.run_effect(effect);
            let registry = Arc::clone(&self.cancellations);
            let task_id = id.clone();

            // Held across spawn + insert so the task's cleanup sees its own entry.
            let mut cancellations = lock_registry(&self.cancellations);

            if let Some(previous) = cancellations.remove(&id) {
                previous.handle.abort();
                metrics::counter!("store.effects.cancelled").increment(1);
                tracing::debug!(effect_id = %id, "Superseded running effect");
            }

            let handle = tokio::spawn(async move {
                let _guard = guard;
                run.await;

                let mut cancellations = lock_registry(&registry);
                if cancellations
                    .get(&task_id)
                    .is_some_and(|cancellation| cancellation.token == token)
                {
                    cancellations.remove(&task_id);
                }
            });

            cancellations.insert(
                id,
                Cancellation {
                    token,
                    handle: handle.abort_handle(),
                },
            );
        }

        /// Reduce an effect-produced action, then publish it to observers
        async fn feed_back(&self, action: A) {
            let observed = action.clone();
            match self.send(action).await {
                Ok(()) => {
                    let _ = self.action_broadcast.send(observed);
                },
                Err(error) => {
                    tracing::debug!(%error, "Dropped effect action");
                },
            }
        }

        /// Build the future that runs `effect` to completion
        ///
        /// Nested cancellable effects are started on their own tasks so they
        /// can be registered; the enclosing effect does not wait for them.
        fn run_effect(&self, effect: Effect<A>) -> BoxFuture<'static, ()> {
            let store = self.clone();

            Box::pin(async move {
                match effect {
                    Effect::None => {},
                    Effect::Future(fut) => {
                        tracing::trace!("Executing Effect::Future");
                        metrics::counter!("store.effects.executed", "type" => "future").increment(1);

                        if let Some(action) = fut.await {
                            tracing::trace!("Effect::Future produced an action, sending to store");
                            store.feed_back(action).await;
                        }
                    },
                    Effect::Delay { duration, action } => {
                        tracing::trace!("Executing Effect::Delay (duration: {:?})", duration);
                        metrics::counter!("store.effects.executed", "type" => "delay").increment(1);

                        tokio::time::sleep(duration).await;
                        store.feed_back(*action).await;
                    },
                    Effect::Parallel(effects) => {
                        tracing::trace!("Executing Effect::Parallel with {} effects", effects.len());
                        metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);

                        let runs: Vec<_> = effects
                            .into_iter()
                            .map(|effect| store.run_effect(effect))
                            .collect();
                        futures::future::join_all(runs).await;
                    },
                    Effect::Sequential(effects) => {
                        tracing::trace!("Executing Effect::Sequential with {} effects", effects.len());
                        metrics::counter!("store.effects.executed", "type" => "sequential").increment(1);

                        for effect in effects {
                            store.run_effect(effect).await;
                        }
                    },
                    effect @ (Effect::Cancellable { .. } | Effect::Cancel(_)) => {
                        store.execute(effect);
                    },
                }
            })
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: Arc::clone(&self.reducer),
                environment: Arc::clone(&self.environment),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                cancellations: Arc::clone(&self.cancellations),
                next_token: Arc::clone(&self.next_token),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

// Re-export for convenience
pub use store::Store;
