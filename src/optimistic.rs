//! Two-phase optimistic updates.
//!
//! A change is applied locally first, then committed to the backend. If the
//! commit fails the caller gets the value to restore along with the error.

/// An applied-but-uncommitted change from `previous` to `proposed`.
#[derive(Debug, Clone, PartialEq)]
pub struct Optimistic<T> {
    previous: T,
    proposed: T,
}

/// How an optimistic change ended.
#[derive(Debug)]
pub enum Settled<T, E> {
    Committed(T),
    /// The commit failed; `restore` is the pre-change value.
    Reverted { restore: T, error: E },
}

impl<T> Optimistic<T> {
    pub fn new(previous: T, proposed: T) -> Self {
        Self { previous, proposed }
    }

    pub fn previous(&self) -> &T {
        &self.previous
    }

    pub fn proposed(&self) -> &T {
        &self.proposed
    }

    /// Settles the change against the outcome of the commit.
    pub fn settle<E>(self, outcome: Result<(), E>) -> Settled<T, E> {
        match outcome {
            Ok(()) => Settled::Committed(self.proposed),
            Err(error) => Settled::Reverted {
                restore: self.previous,
                error,
            },
        }
    }
}

impl<T, E> Settled<T, E> {
    /// The value that should now be visible.
    pub fn value(&self) -> &T {
        match self {
            Settled::Committed(value) => value,
            Settled::Reverted { restore, .. } => restore,
        }
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            Settled::Committed(value) => Ok(value),
            Settled::Reverted { error, .. } => Err(error),
        }
    }
}
