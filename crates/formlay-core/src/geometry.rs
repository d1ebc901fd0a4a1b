#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! Designer coordinates are signed pixels: a component dragged past the
//! container border has a negative position until it is dropped.

use serde::{Deserialize, Serialize};

/// Layout axis. Every container keeps one interval tree per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    /// Both axes in canonical order (horizontal first).
    pub const ALL: [Axis; 2] = [Axis::Horizontal, Axis::Vertical];

    /// Dense index for per-axis arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Horizontal => 0,
            Self::Vertical => 1,
        }
    }

    /// The orthogonal axis.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        }
    }
}

/// One of the two edges of a span along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    Leading,
    Trailing,
}

impl Edge {
    pub const BOTH: [Edge; 2] = [Edge::Leading, Edge::Trailing];

    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Leading => Self::Trailing,
            Self::Trailing => Self::Leading,
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Leading => 0,
            Self::Trailing => 1,
        }
    }
}

/// A closed-open extent `[start, end)` along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: i32,
    pub end: i32,
}

impl Span {
    #[inline]
    #[must_use]
    pub const fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    /// Span starting at `start` with the given length.
    #[inline]
    #[must_use]
    pub const fn with_len(start: i32, len: i32) -> Self {
        Self {
            start,
            end: start.saturating_add(len),
        }
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> i32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Position of the given edge.
    #[inline]
    #[must_use]
    pub const fn edge(&self, edge: Edge) -> i32 {
        match edge {
            Edge::Leading => self.start,
            Edge::Trailing => self.end,
        }
    }

    /// Length of the overlap with another span (0 when disjoint).
    #[must_use]
    pub fn overlap(&self, other: &Span) -> i32 {
        (self.end.min(other.end) - self.start.max(other.start)).max(0)
    }

    /// Whether the open interiors of the two spans intersect.
    #[must_use]
    pub fn intersects(&self, other: &Span) -> bool {
        self.overlap(other) > 0
    }

    /// Whether `other` lies completely inside this span.
    #[must_use]
    pub fn contains_span(&self, other: &Span) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Smallest span that contains both.
    #[must_use]
    pub fn union(&self, other: &Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Span shifted by `delta`.
    #[must_use]
    pub const fn shifted(&self, delta: i32) -> Span {
        Span::new(self.start + delta, self.end + delta)
    }

    /// Distance between two spans along the axis (0 when they touch or overlap).
    #[must_use]
    pub fn distance(&self, other: &Span) -> i32 {
        if other.start >= self.end {
            other.start - self.end
        } else if self.start >= other.end {
            self.start - other.end
        } else {
            0
        }
    }
}

/// A point in designer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Coordinate along the axis.
    #[inline]
    #[must_use]
    pub const fn along(&self, axis: Axis) -> i32 {
        match axis {
            Axis::Horizontal => self.x,
            Axis::Vertical => self.y,
        }
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    #[inline]
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Extent along the axis.
    #[inline]
    #[must_use]
    pub const fn along(&self, axis: Axis) -> i32 {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }
}

/// A rectangle for component bounds and container interiors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: i32,
    /// Top edge (inclusive).
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from origin with given size.
    #[inline]
    #[must_use]
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Build a rectangle from one span per axis.
    #[inline]
    #[must_use]
    pub const fn from_spans(horizontal: Span, vertical: Span) -> Self {
        Self::new(
            horizontal.start,
            vertical.start,
            horizontal.len(),
            vertical.len(),
        )
    }

    /// Right edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Extent of the rectangle along one axis.
    #[inline]
    #[must_use]
    pub const fn span(&self, axis: Axis) -> Span {
        match axis {
            Axis::Horizontal => Span::new(self.x, self.right()),
            Axis::Vertical => Span::new(self.y, self.bottom()),
        }
    }

    /// Replace the extent along one axis.
    #[must_use]
    pub const fn with_span(self, axis: Axis, span: Span) -> Self {
        match axis {
            Axis::Horizontal => Self::new(span.start, self.y, span.len(), self.height),
            Axis::Vertical => Self::new(self.x, span.start, self.width, span.len()),
        }
    }

    /// Rectangle moved by the given offsets.
    #[must_use]
    pub const fn translated(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    #[must_use]
    pub const fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Create a new rectangle that is the union of this rectangle and another.
    ///
    /// The result is the smallest rectangle that contains both.
    #[must_use]
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::from_spans(
            self.span(Axis::Horizontal)
                .union(&other.span(Axis::Horizontal)),
            self.span(Axis::Vertical).union(&other.span(Axis::Vertical)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_overlap_and_distance() {
        let a = Span::new(10, 30);
        let b = Span::new(25, 40);
        let c = Span::new(36, 50);
        assert_eq!(a.overlap(&b), 5);
        assert_eq!(a.overlap(&c), 0);
        assert!(!a.intersects(&Span::new(30, 40)));
        assert_eq!(a.distance(&c), 6);
        assert_eq!(c.distance(&a), 6);
        assert_eq!(a.distance(&b), 0);
    }

    #[test]
    fn rect_spans_round_trip() {
        let r = Rect::new(48, 11, 59, 20);
        assert_eq!(r.span(Axis::Horizontal), Span::new(48, 107));
        assert_eq!(r.span(Axis::Vertical), Span::new(11, 31));
        assert_eq!(
            Rect::from_spans(r.span(Axis::Horizontal), r.span(Axis::Vertical)),
            r
        );
        let taller = r.with_span(Axis::Vertical, Span::with_len(11, 55));
        assert_eq!(taller, Rect::new(48, 11, 59, 55));
    }

    #[test]
    fn rect_union_covers_both() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(-5, 20, 10, 5);
        assert_eq!(a.union(&b), Rect::new(-5, 0, 15, 25));
    }

    #[test]
    fn axis_helpers() {
        assert_eq!(Axis::Horizontal.other(), Axis::Vertical);
        assert_eq!(Axis::Vertical.index(), 1);
        assert_eq!(Edge::Leading.opposite(), Edge::Trailing);
        assert_eq!(Point::new(3, 4).along(Axis::Vertical), 4);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn span() -> impl Strategy<Value = Span> {
            (-500..500i32, 0..300i32).prop_map(|(start, len)| Span::with_len(start, len))
        }

        proptest! {
            #[test]
            fn overlap_and_distance_are_symmetric(a in span(), b in span()) {
                prop_assert_eq!(a.overlap(&b), b.overlap(&a));
                prop_assert_eq!(a.distance(&b), b.distance(&a));
                prop_assert!(a.overlap(&b) == 0 || a.distance(&b) == 0);
            }

            #[test]
            fn union_contains_both(a in span(), b in span()) {
                let u = a.union(&b);
                prop_assert!(u.contains_span(&a) && u.contains_span(&b));
                prop_assert!(u.len() >= a.len().max(b.len()));
            }
        }
    }
}
