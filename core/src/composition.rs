//! Reducer composition utilities
//!
//! - **`combine_reducers`**: Run multiple reducers on the same state/action
//! - **`scope_reducer`**: Focus a reducer on a subset of state
//!
//! The booking client is built from three feature reducers (ticket query,
//! booking mutation, booking orchestration). Each owns one field of the
//! application state and all of them see every application action, so a
//! feature can react to another feature's results.
//!
//! # Examples
//!
//! ```
//! use ticket_booking_core::{Effect, Reducer, SmallVec};
//! use ticket_booking_core::composition::{combine_reducers, scope_reducer};
//!
//! #[derive(Clone, Default)]
//! struct Page {
//!     selected: u32,
//!     refreshes: u32,
//! }
//!
//! #[derive(Clone)]
//! enum PageAction {
//!     Select(u32),
//!     Refresh,
//! }
//!
//! struct SelectionReducer;
//!
//! impl Reducer for SelectionReducer {
//!     type State = u32;
//!     type Action = PageAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut u32, action: PageAction, _env: &()) -> SmallVec<[Effect<PageAction>; 4]> {
//!         if let PageAction::Select(n) = action {
//!             *state = n;
//!         }
//!         SmallVec::new()
//!     }
//! }
//!
//! struct RefreshReducer;
//!
//! impl Reducer for RefreshReducer {
//!     type State = u32;
//!     type Action = PageAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut u32, action: PageAction, _env: &()) -> SmallVec<[Effect<PageAction>; 4]> {
//!         if matches!(action, PageAction::Refresh) {
//!             *state += 1;
//!         }
//!         SmallVec::new()
//!     }
//! }
//!
//! let page = combine_reducers(vec![
//!     Box::new(scope_reducer(SelectionReducer, |p: &Page| &p.selected, |p: &mut Page, s| p.selected = s)),
//!     Box::new(scope_reducer(RefreshReducer, |p: &Page| &p.refreshes, |p: &mut Page, r| p.refreshes = r)),
//! ]);
//!
//! let mut state = Page::default();
//! let _ = page.reduce(&mut state, PageAction::Select(3), &());
//! let _ = page.reduce(&mut state, PageAction::Refresh, &());
//! assert_eq!(state.selected, 3);
//! assert_eq!(state.refreshes, 1);
//! ```

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;

/// A boxed reducer that can be shared with the store's effect tasks
pub type BoxedReducer<S, A, E> = Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>;

/// Combines multiple reducers that operate on the same state and action types.
///
/// Each reducer is run in sequence, and all effects are collected and concatenated.
#[must_use]
pub fn combine_reducers<S, A, E>(reducers: Vec<BoxedReducer<S, A, E>>) -> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    CombinedReducer { reducers }
}

/// A combined reducer that runs multiple reducers in sequence.
///
/// Created by [`combine_reducers`].
pub struct CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    reducers: Vec<BoxedReducer<S, A, E>>,
}

impl<S, A, E> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    /// Number of reducers in this combination
    #[must_use]
    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    /// Returns true when no reducers were combined
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let mut all_effects = SmallVec::new();

        for reducer in &self.reducers {
            let effects = reducer.reduce(state, action.clone(), env);
            all_effects.extend(effects.into_iter().filter(|effect| !effect.is_none()));
        }

        all_effects
    }
}

/// Scopes a reducer to operate on a subset of a larger state.
///
/// # Type Parameters
///
/// - `S`: The parent state type
/// - `SubS`: The child state type (a field of `S`)
/// - `A`: The action type
/// - `E`: The environment type
pub fn scope_reducer<S, SubS, A, E, R>(
    reducer: R,
    get_state: fn(&S) -> &SubS,
    set_state: fn(&mut S, SubS),
) -> ScopedReducer<S, SubS, A, E, R>
where
    S: 'static,
    SubS: Clone + 'static,
    A: 'static,
    E: 'static,
    R: Reducer<State = SubS, Action = A, Environment = E>,
{
    ScopedReducer {
        reducer,
        get_state,
        set_state,
        _phantom: std::marker::PhantomData,
    }
}

/// A reducer focused on part of a parent state.
///
/// Created by [`scope_reducer`].
pub struct ScopedReducer<S, SubS, A, E, R>
where
    S: 'static,
    SubS: Clone + 'static,
    A: 'static,
    E: 'static,
    R: Reducer<State = SubS, Action = A, Environment = E>,
{
    reducer: R,
    get_state: fn(&S) -> &SubS,
    set_state: fn(&mut S, SubS),
    _phantom: std::marker::PhantomData<fn() -> (A, E)>,
}

impl<S, SubS, A, E, R> Reducer for ScopedReducer<S, SubS, A, E, R>
where
    S: 'static,
    SubS: Clone + 'static,
    A: 'static,
    E: 'static,
    R: Reducer<State = SubS, Action = A, Environment = E>,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let mut sub_state = (self.get_state)(state).clone();
        let effects = self.reducer.reduce(&mut sub_state, action, env);
        (self.set_state)(state, sub_state);
        effects
    }
}
