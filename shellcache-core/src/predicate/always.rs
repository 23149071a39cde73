//! Predicate that matches everything.

use std::marker::PhantomData;

use super::Predicate;

/// A predicate that always matches.
///
/// Useful as the last, catch-all entry of a routing table.
#[derive(Clone, Copy)]
pub struct Always<S: ?Sized> {
    _phantom: PhantomData<fn(&S)>,
}

impl<S: ?Sized> std::fmt::Debug for Always<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Always").finish()
    }
}

impl<S: ?Sized> Default for Always<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ?Sized> Always<S> {
    /// Creates a new catch-all predicate.
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<S: ?Sized> Predicate for Always<S> {
    type Subject = S;

    fn check(&self, _subject: &Self::Subject) -> bool {
        true
    }
}
