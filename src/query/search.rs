//! Debounced search text combined with structured filters.

use crate::query::{MovieFilters, MovieQuery};
use std::time::Duration;
use tokio::time::Instant;

/// `Idle -> Pending(value, deadline) -> Committed(value)`; new input while pending restarts the window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DebounceState<T> {
    Idle,
    Pending { value: T, deadline: Instant },
    Committed(T),
}

/// Timer-driven debounce, independent of any event loop: callers feed input with a timestamp and
/// poll with the current time.
#[derive(Clone, Debug)]
pub struct Debouncer<T> {
    window: Duration,
    state: DebounceState<T>,
}

impl<T: Clone> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Debouncer {
            window,
            state: DebounceState::Idle,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn state(&self) -> &DebounceState<T> {
        &self.state
    }

    pub fn input(&mut self, value: T, now: Instant) {
        self.state = DebounceState::Pending {
            value,
            deadline: now + self.window,
        };
    }

    pub fn deadline(&self) -> Option<Instant> {
        match &self.state {
            DebounceState::Pending { deadline, .. } => Some(*deadline),
            _ => None,
        }
    }

    /// Commit and return the pending value once `now` reaches its deadline.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let value = match &self.state {
            DebounceState::Pending { value, deadline } if now >= *deadline => value.clone(),
            _ => return None,
        };
        self.state = DebounceState::Committed(value.clone());
        Some(value)
    }

    /// Skip the window and commit `value` at once.
    pub fn commit_now(&mut self, value: T) {
        self.state = DebounceState::Committed(value);
    }

    pub fn cancel(&mut self) {
        self.state = DebounceState::Idle;
    }
}

/// Search box and filter bar state for the movie list.
///
/// Keystrokes go through the debouncer; only a settled term that differs from the last
/// committed one produces a query. Filter changes and clears apply immediately.
#[derive(Clone, Debug)]
pub struct SearchFilterState {
    debouncer: Debouncer<String>,
    typed: String,
    committed: String,
    filters: MovieFilters,
}

impl SearchFilterState {
    pub fn new(window: Duration) -> Self {
        SearchFilterState {
            debouncer: Debouncer::new(window),
            typed: String::new(),
            committed: String::new(),
            filters: MovieFilters::default(),
        }
    }

    pub fn filters(&self) -> &MovieFilters {
        &self.filters
    }

    /// Text as typed so far.
    pub fn search_term(&self) -> &str {
        &self.typed
    }

    /// Text currently applied to the query.
    pub fn committed_term(&self) -> &str {
        &self.committed
    }

    /// Typed text has not settled into the query yet.
    pub fn is_settling(&self) -> bool {
        self.deadline().is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    pub fn query(&self) -> MovieQuery {
        MovieQuery::new(self.filters.clone(), &self.committed)
    }

    pub fn set_search_term(&mut self, term: impl Into<String>, now: Instant) {
        self.typed = term.into();
        self.debouncer.input(self.typed.clone(), now);
    }

    /// Query to issue if the typed text has settled into a new term.
    pub fn tick(&mut self, now: Instant) -> Option<MovieQuery> {
        let settled = self.debouncer.poll(now)?;
        if settled.trim() == self.committed.trim() {
            return None;
        }
        self.committed = settled;
        Some(self.query())
    }

    /// Replace the filters; the new query applies immediately.
    pub fn set_filters(&mut self, filters: MovieFilters) -> MovieQuery {
        self.filters = filters;
        self.query()
    }

    /// Empty the search box without waiting for the window.
    pub fn clear_search(&mut self) -> Option<MovieQuery> {
        self.typed.clear();
        self.debouncer.commit_now(String::new());
        if self.committed.is_empty() {
            return None;
        }
        self.committed.clear();
        Some(self.query())
    }

    /// Reset search and filters to defaults; the new query applies immediately.
    pub fn clear(&mut self) -> MovieQuery {
        self.typed.clear();
        self.committed.clear();
        self.debouncer.commit_now(String::new());
        self.filters.reset();
        self.query()
    }
}
