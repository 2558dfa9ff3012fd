//! Stale-response guard shared by every session.
//!
//! Each user-initiated request takes a ticket; a response is applied only if
//! its ticket is still the latest one issued. Superseded responses are
//! dropped instead of cancelled.

/// What happened to the response of a request
#[derive(Debug, Clone, PartialEq)]
pub enum Completion<T> {
    /// The response became the session's current state
    Applied(T),
    /// A newer action started while this request was in flight
    Superseded,
}

impl<T> Completion<T> {
    pub fn is_superseded(&self) -> bool {
        matches!(self, Completion::Superseded)
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Completion::Applied(value) => Some(value),
            Completion::Superseded => None,
        }
    }
}

/// State paired with the ticket of the latest request that may write to it
#[derive(Debug)]
pub(crate) struct Sequenced<S> {
    state: S,
    latest: u64,
}

impl<S> Sequenced<S> {
    pub fn new(state: S) -> Self {
        Self { state, latest: 0 }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    /// Start a new request, invalidating every ticket handed out before
    pub fn begin(&mut self, state: S) -> u64 {
        self.latest += 1;
        self.state = state;
        self.latest
    }

    /// Replace the state outright (e.g. clear); in-flight responses become stale
    pub fn reset(&mut self, state: S) {
        self.begin(state);
    }

    /// Apply a response if `ticket` is still current; returns whether it was
    pub fn settle(&mut self, ticket: u64, state: S) -> bool {
        if ticket != self.latest {
            return false;
        }
        self.state = state;
        true
    }
}
