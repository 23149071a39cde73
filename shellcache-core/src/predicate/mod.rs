//! Routing predicates.
//!
//! This module provides the [`Predicate`] trait used by the dispatcher's
//! routing table to decide which strategy handles a request.
//!
//! ## Overview
//!
//! A predicate inspects a subject (usually a
//! [`FetchRequest`](crate::FetchRequest)) and answers whether it matches.
//! Predicates are synchronous: classification only looks at the method, URL,
//! mode and destination, never at a body.
//!
//! ## Composability
//!
//! Predicates are designed to be composed using logical combinators:
//!
//! - [`And`] - Both predicates must match
//! - [`Or`] - Either predicate matching is sufficient
//! - [`Not`] - Inverts a predicate
//! - [`Always`] - Matches everything, the catch-all route

pub mod always;
pub mod combinators;

use std::sync::Arc;

pub use always::Always;
pub use combinators::{And, Not, Or, PredicateExt};

/// Trait for matching a subject.
///
/// Predicates are **protocol-agnostic**; the dispatcher uses them with
/// [`FetchRequest`](crate::FetchRequest) but any subject type works.
pub trait Predicate: std::fmt::Debug {
    /// The type being evaluated by this predicate.
    type Subject: ?Sized;

    /// Returns `true` when the subject matches.
    fn check(&self, subject: &Self::Subject) -> bool;
}

impl<T> Predicate for Box<T>
where
    T: Predicate + ?Sized,
{
    type Subject = T::Subject;

    fn check(&self, subject: &T::Subject) -> bool {
        self.as_ref().check(subject)
    }
}

impl<T> Predicate for &T
where
    T: Predicate + ?Sized,
{
    type Subject = T::Subject;

    fn check(&self, subject: &T::Subject) -> bool {
        (*self).check(subject)
    }
}

impl<T> Predicate for Arc<T>
where
    T: Predicate + ?Sized,
{
    type Subject = T::Subject;

    fn check(&self, subject: &T::Subject) -> bool {
        self.as_ref().check(subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Even;

    impl Predicate for Even {
        type Subject = i32;

        fn check(&self, subject: &i32) -> bool {
            subject % 2 == 0
        }
    }

    #[test]
    fn test_predicate_ext_with_box_dyn() {
        let p1: Box<dyn Predicate<Subject = i32> + Send + Sync> = Box::new(Even);
        let p2: Box<dyn Predicate<Subject = i32> + Send + Sync> = Box::new(Always::<i32>::new());

        let combined = p1.or(p2);

        assert!(combined.check(&3));
    }

    #[test]
    fn test_predicate_ext_chaining() {
        // Even AND Always, negated: matches odd numbers only
        let combined = Even.and(Always::<i32>::new()).not();

        assert!(combined.check(&41));
        assert!(!combined.check(&42));
    }

    #[test]
    fn test_predicate_ext_boxed_in_vec() {
        let predicates: Vec<Box<dyn Predicate<Subject = i32> + Send + Sync>> =
            vec![Even.boxed(), Even.not().boxed()];

        assert!(predicates[0].check(&2));
        assert!(!predicates[1].check(&2));
    }
}
