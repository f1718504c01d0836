//! Associations to spans within the input source
//!
//! This module declares a few very helpful types, [`Span`], [`Spanned<T>`] and
//! [`SourceId`], which help the checker associate things like tokens and
//! syntax nodes with locations within one of the loaded source units. There is
//! also a trait [`Spannable`] which allows some easier chained method calls.
//!
//! A program analyzed by dtc is built from several files (the entry unit and
//! every locally imported unit), so every [`Span`] records which unit its
//! offsets refer to through a [`SourceId`].

use std::{fmt::Display, ops::Range};

/// Identifies one loaded source unit within a forest
///
/// Source ids are handed out in load order by the forest builder, starting at
/// `0` for the entry unit. [`SourceId::DETACHED`] is used for diagnostics that
/// are not tied to any file, such as a contract naming a function that does
/// not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(usize);
impl SourceId {
    /// The id used by spans that do not point into any source unit
    pub const DETACHED: Self = Self(usize::MAX);

    /// Create a new [`SourceId`] from a load-order index
    #[must_use]
    #[inline]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Obtain the load-order index of this source unit
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }

    /// Determine if this id is [`SourceId::DETACHED`]
    #[must_use]
    #[inline]
    pub const fn is_detached(self) -> bool {
        self.0 == usize::MAX
    }
}
impl Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_detached() {
            write!(f, "<detached>")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

/// Represents the start and end of some segment of a source unit
///
/// A span represents the start and end (as byte offsets) of some span within
/// one source unit. You can also create a [`Spanned<T>`] from a span using the
/// [`Span::containing`] method.
///
/// These are often found within the [`Spanned<T>`] type. They can be obtained
/// in a few ways:
/// - Direct construction ([`Span::from_positions_and_source`])
/// - Methods on another Span ([`Span::intersect`], [`Span::to`])
/// - Stripping the value from a [`Spanned<T>`] ([`Spanned::span`])
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span(usize, usize, SourceId);
impl Span {
    /// Create a new [`Span`] given a start and end location within a source
    /// unit.
    ///
    /// # Panics
    /// Panics if `start > end`.
    #[must_use]
    pub fn from_positions_and_source(start: usize, end: usize, source: SourceId) -> Self {
        assert!(
            end >= start,
            "span must have positive length (got span {start}..{end})"
        );
        Self(start, end, source)
    }

    /// Create a [`Span`] which is not attached to any source unit
    #[must_use]
    #[inline]
    pub const fn detached() -> Self {
        Self(0, 0, SourceId::DETACHED)
    }

    /// Obtains the starting position of this [`Span`] as a `usize`
    #[must_use]
    #[inline]
    pub const fn start(&self) -> usize {
        self.0
    }

    /// Obtains the ending position of this [`Span`] as a `usize`
    #[must_use]
    #[inline]
    pub const fn end(&self) -> usize {
        self.1
    }

    /// Obtains the [`SourceId`] this [`Span`] refers to
    #[must_use]
    #[inline]
    pub const fn source(&self) -> SourceId {
        self.2
    }

    /// Obtains the [`Range`] of this [`Span`], suitable for slicing the source
    /// text of its unit
    #[must_use]
    #[inline]
    pub const fn range(&self) -> Range<usize> {
        self.start()..self.end()
    }

    /// Creates a [`Spanned<T>`] instance using this [`Span`] and a passed value
    #[must_use]
    #[inline]
    pub const fn containing<T>(self, value: T) -> Spanned<T> {
        Spanned::from_span_and_value(self, value)
    }

    /// Creates a new [`Span`] reaching from the start of this span to the end
    /// of `other`.
    ///
    /// # Panics
    /// Panics if `other` ends before this span starts or the spans belong to
    /// different source units.
    #[must_use]
    pub fn to(self, other: Self) -> Self {
        assert_eq!(
            self.source(),
            other.source(),
            "cannot join spans of different source units"
        );
        Self::from_positions_and_source(self.start(), other.end(), self.source())
    }

    /// Determine if `other` lies entirely within this span
    #[must_use]
    pub fn contains(&self, other: Self) -> bool {
        self.source() == other.source()
            && self.start() <= other.start()
            && other.end() <= self.end()
    }

    /// Creates a new [`Span`] containing the intersection of two passed spans
    ///
    /// If this returns [`None`], no intersection exists (they are disjoint or
    /// belong to different source units).
    #[must_use]
    pub fn intersect(span_a: Self, span_b: Self) -> Option<Self> {
        if span_a.source() != span_b.source()
            || span_a.start() > span_b.end()
            || span_b.start() > span_a.end()
        {
            None
        } else {
            Some(Self::from_positions_and_source(
                std::cmp::max(span_a.start(), span_b.start()),
                std::cmp::min(span_a.end(), span_b.end()),
                span_a.source(),
            ))
        }
    }
}
impl Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start(), self.end())
    }
}

/// Represents something (`T`) contained within a [`Span`].
///
/// These are found in many places throughout the checker, such as attached to
/// tokens, syntax nodes and diagnostics.
///
/// An instance of [`Spanned`] can be obtained in a few ways:
/// - Direct construction from a [`Span`] and a value
///   ([`Spanned::from_span_and_value`])
/// - By attaching a value to a [`Span`] ([`Span::containing`])
/// - By attaching a [`Span`] to a value (with the [`Spannable`] trait's
///   [`Spannable::in_span`] method)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Spanned<T>(Span, T);
impl<T> Spanned<T> {
    /// Create a new [`Spanned<T>`] instance from a [`Span`] and value
    #[must_use]
    #[inline]
    pub const fn from_span_and_value(span: Span, value: T) -> Self {
        Self(span, value)
    }

    /// Obtains the [`Span`] associated with this [`Spanned<T>`] instance
    #[must_use]
    #[inline]
    pub const fn span(&self) -> Span {
        self.0
    }

    /// Obtains a reference to the value this [`Spanned<T>`] instance wraps
    #[inline]
    pub const fn value(&self) -> &T {
        &self.1
    }

    /// Applies a function to the contained value, returning a new
    /// [`Spanned<T>`] instance with the same associated [`Span`]
    #[inline]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> {
        let span = self.span();
        Spanned::from_span_and_value(span, f(self.into_value()))
    }

    /// "Strips" the [`Spanned<T>`] of its [`Span`], returning the inner value
    ///
    /// This differs from [`Spanned::value`] because it consumes the
    /// [`Spanned<T>`] instance and drops the [`Span`].
    #[allow(clippy::missing_const_for_fn)]
    #[inline]
    pub fn into_value(self) -> T {
        self.1
    }

    /// Obtains the starting position of the contained [`Span`] as a `usize`
    #[must_use]
    #[inline]
    pub const fn start(&self) -> usize {
        self.span().start()
    }

    /// Obtains the ending position of the contained [`Span`] as a `usize`
    #[must_use]
    #[inline]
    pub const fn end(&self) -> usize {
        self.span().end()
    }

    /// Obtains the [`SourceId`] of the contained [`Span`]
    #[must_use]
    #[inline]
    pub const fn source(&self) -> SourceId {
        self.span().source()
    }

    /// Converts a [`&Spanned<T>`][Spanned] to a [`Spanned<&T>`].
    #[inline]
    pub const fn as_ref(&self) -> Spanned<&T> {
        Spanned::from_span_and_value(self.span(), &self.1)
    }
}
impl<T> Display for Spanned<T>
where
    T: Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value().fmt(f)
    }
}
impl<T> Spanned<Option<T>> {
    /// Converts a [`Spanned<Option<T>>`] to a [`Option<Spanned<T>>`].
    /// Note: This is not reversible because if you wanted to create a
    /// [`Spanned`] [`Some`] from [`None`], what span would you use?
    pub fn transpose(self) -> Option<Spanned<T>> {
        let span = self.span();
        self.into_value()
            .map(|x| Spanned::from_span_and_value(span, x))
    }
}
impl<T, E> Spanned<Result<T, E>> {
    /// Converts a [`Spanned<Result<T, E>>`] to a [`Result<Spanned<T>,
    /// Spanned<E>>`]. Note: This is not reversible. See the note on
    /// [`Spanned<Option<T>>::transpose`].
    #[allow(clippy::missing_errors_doc)] // just propagates input error
    pub fn transpose(self) -> Result<Spanned<T>, Spanned<E>> {
        let span = self.span();
        self.into_value()
            .map(|x| Spanned::from_span_and_value(span, x))
            .map_err(|x| Spanned::from_span_and_value(span, x))
    }
}

/// A trait automatically implemented on all types that allows you to attach a
/// [`Span`] to something, creating a [`Spanned<T>`] instance.
pub trait Spannable
where
    Self: Sized,
{
    /// Attach a [`Span`] to this value, creating a [`Spanned<T>`] instance
    ///
    /// This method can be used to attach a [`Span`] to any arbitrary value. It
    /// is a cleaner syntax for the [`Spanned::from_span_and_value`] or
    /// [`Span::containing`] functions.
    fn in_span(self, span: Span) -> Spanned<Self>;
}

// Automatically implement Spannable for all types
impl<T: Sized> Spannable for T {
    #[inline]
    fn in_span(self, span: Span) -> Spanned<Self> {
        Spanned::from_span_and_value(span, self)
    }
}

/// Create a [`Spanned<T>`] instance from two locations and a value, and
/// optionally a [`SourceId`] (the entry unit, `SourceId::new(0)`, is used when
/// it is omitted). Simply just expands to [`Spanned::from_span_and_value`] and
/// [`Span::from_positions_and_source`] calls.
///
/// # Panics
/// Panics if `start > end`.
#[macro_export]
macro_rules! spanned {
    ($start:expr, $value:expr, $end:expr, $source:expr) => {
        $crate::span::Spanned::from_span_and_value(
            $crate::span::Span::from_positions_and_source($start, $end, $source),
            $value,
        )
    };
    ($start:expr, $value:expr, $end:expr) => {
        $crate::spanned!($start, $value, $end, $crate::span::SourceId::new(0))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Shorthand for a span inside the entry unit
    fn entry_span(start: usize, end: usize) -> Span {
        Span::from_positions_and_source(start, end, SourceId::new(0))
    }

    #[test]
    fn spanned_macro_creates_spanned_item() {
        assert_eq!(
            spanned!(0, (), 3),
            Spanned::from_span_and_value(entry_span(0, 3), ())
        );
        assert_eq!(
            spanned!(0, (), 3, SourceId::new(2)).source(),
            SourceId::new(2)
        );
    }

    mod source_id {
        use super::*;

        #[test]
        fn detached_id_is_detected() {
            assert!(SourceId::DETACHED.is_detached());
            assert!(!SourceId::new(0).is_detached());
            assert_eq!(SourceId::new(3).index(), 3);
        }

        #[test]
        fn display_shows_index() {
            assert_eq!(SourceId::new(1).to_string(), "#1");
            assert_eq!(SourceId::DETACHED.to_string(), "<detached>");
        }
    }

    mod span {
        use super::*;

        #[test]
        fn span_from_positions_works_as_expected() {
            let span = entry_span(2, 7);
            assert_eq!(span, Span(2, 7, SourceId::new(0)));
            assert_eq!(span.start(), 2);
            assert_eq!(span.end(), 7);
            assert_eq!(span.range(), 2..7);
            assert_eq!(span.to_string(), "2-7".to_string());
        }

        #[test]
        #[allow(clippy::let_underscore_must_use)]
        #[should_panic(expected = "span must have positive length")]
        fn span_from_invalid_positions_panics() {
            let _ = entry_span(5, 0);
        }

        #[test]
        fn span_intersection_with_overlap_returns_intersection() {
            assert_eq!(
                Span::intersect(entry_span(0, 6), entry_span(4, 10)),
                Some(entry_span(4, 6))
            );
        }

        #[test]
        fn span_intersections_with_disjoint_spans_returns_none() {
            assert_eq!(Span::intersect(entry_span(0, 5), entry_span(7, 10)), None);
        }

        #[test]
        fn spans_of_different_sources_never_intersect() {
            let other = Span::from_positions_and_source(0, 6, SourceId::new(1));
            assert_eq!(Span::intersect(entry_span(0, 6), other), None);
        }

        #[test]
        fn span_to_joins_spans() {
            assert_eq!(entry_span(2, 4).to(entry_span(8, 12)), entry_span(2, 12));
        }

        #[test]
        fn span_contains_checks_bounds_and_source() {
            assert!(entry_span(0, 10).contains(entry_span(2, 4)));
            assert!(!entry_span(0, 10).contains(entry_span(8, 12)));
            assert!(!entry_span(0, 10)
                .contains(Span::from_positions_and_source(2, 4, SourceId::new(1))));
        }

        #[test]
        fn span_containing_returns_spanned() {
            assert_eq!(entry_span(0, 3).containing(()), spanned!(0, (), 3));
        }
    }

    mod spanned {
        use super::*;

        #[test]
        fn basic_methods_work_as_expected() {
            let span = entry_span(3, 6);
            let spanned = Spanned::from_span_and_value(span, 0);

            assert_eq!(spanned.span(), span);
            assert_eq!(spanned.start(), 3);
            assert_eq!(spanned.end(), 6);
            assert_eq!(spanned.source(), SourceId::new(0));
            assert_eq!(spanned.value(), &0);
            assert_eq!(spanned.into_value(), 0);
        }

        #[test]
        fn map_works_as_expected() {
            let spanned = spanned!(3, 0, 6);

            assert_eq!(spanned.map(|n| n == 0), spanned!(3, true, 6));
        }

        #[test]
        fn as_ref_works_as_expected() {
            let spanned = spanned!(3, 0, 6);

            assert_eq!(spanned.as_ref(), spanned!(3, &0, 6));
        }

        #[test]
        fn transpose_option_cases() {
            assert_eq!(spanned!(3, Some(0), 6).transpose(), Some(spanned!(3, 0, 6)));

            let none: Spanned<Option<()>> = spanned!(3, None, 6);
            assert_eq!(none.transpose(), None);
        }

        #[test]
        fn transpose_result_cases() {
            let ok: Spanned<Result<i32, ()>> = spanned!(3, Ok(0), 6);
            assert_eq!(ok.transpose(), Ok(spanned!(3, 0, 6)));

            let err: Spanned<Result<(), i32>> = spanned!(3, Err(0), 6);
            assert_eq!(err.transpose(), Err(spanned!(3, 0, 6)));
        }
    }

    #[test]
    fn spannable_in_span_creates_spanned() {
        assert_eq!(
            7.in_span(entry_span(3, 6)),
            Spanned(Span(3, 6, SourceId::new(0)), 7),
        );
    }
}
