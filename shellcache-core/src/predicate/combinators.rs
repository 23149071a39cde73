//! Boolean composition of predicates.
//!
//! Routing rules are usually small expressions over request traits, for
//! example "same-origin image or font":
//!
//! ```ignore
//! use shellcache_core::predicate::PredicateExt;
//!
//! let cached_assets = is_image.or(is_font).and(cross_origin.not());
//! ```

use super::Predicate;

/// Matches when the wrapped predicate does not.
#[derive(Debug)]
pub struct Not<P> {
    inner: P,
}

impl<P> Not<P> {
    /// Negates `inner`.
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<P: Predicate> Predicate for Not<P> {
    type Subject = P::Subject;

    fn check(&self, subject: &Self::Subject) -> bool {
        !self.inner.check(subject)
    }
}

/// Matches when both sides match; `right` is skipped when `left` fails.
#[derive(Debug)]
pub struct And<L, R> {
    left: L,
    right: R,
}

impl<L, R> And<L, R> {
    /// Conjunction of `left` and `right`.
    pub fn new(left: L, right: R) -> Self {
        Self { left, right }
    }
}

impl<L, R> Predicate for And<L, R>
where
    L: Predicate,
    R: Predicate<Subject = L::Subject>,
{
    type Subject = L::Subject;

    fn check(&self, subject: &Self::Subject) -> bool {
        self.left.check(subject) && self.right.check(subject)
    }
}

/// Matches when either side matches; `right` is skipped when `left` succeeds.
#[derive(Debug)]
pub struct Or<L, R> {
    left: L,
    right: R,
}

impl<L, R> Or<L, R> {
    /// Disjunction of `left` and `right`.
    pub fn new(left: L, right: R) -> Self {
        Self { left, right }
    }
}

impl<L, R> Predicate for Or<L, R>
where
    L: Predicate,
    R: Predicate<Subject = L::Subject>,
{
    type Subject = L::Subject;

    fn check(&self, subject: &Self::Subject) -> bool {
        self.left.check(subject) || self.right.check(subject)
    }
}

/// Method-call syntax for [`And`], [`Or`] and [`Not`].
pub trait PredicateExt: Predicate + Sized {
    /// `self && other`.
    fn and<R>(self, other: R) -> And<Self, R>
    where
        R: Predicate<Subject = Self::Subject>,
    {
        And::new(self, other)
    }

    /// `self || other`.
    fn or<R>(self, other: R) -> Or<Self, R>
    where
        R: Predicate<Subject = Self::Subject>,
    {
        Or::new(self, other)
    }

    /// `!self`.
    fn not(self) -> Not<Self> {
        Not::new(self)
    }

    /// Erases the concrete type so predicates of different shapes fit in one
    /// routing table.
    fn boxed(self) -> Box<dyn Predicate<Subject = Self::Subject> + Send + Sync>
    where
        Self: Send + Sync + 'static,
    {
        Box::new(self)
    }
}

impl<T: Predicate> PredicateExt for T {}
