#![forbid(unsafe_code)]

//! Snap candidate generation.
//!
//! For each dragged edge the engine looks for, in priority order:
//! the same edge (or baseline) of another component, a neighbor at its
//! preferred padding, and the container border at its preferred padding.
//! A candidate only counts when the edge lies within the snap tolerance.
//! The class decides first, then the distance, then the orthogonal
//! distance, then the target's id.

use std::cmp::Ordering;

use formlay_core::{
    Alignment, Axis, ComponentId, Edge, GeometryOracle, PaddingType, Rect, Span, trace,
};
use formlay_layout::PaddingDefaults;
use serde::{Deserialize, Serialize};

/// Candidate classes in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapClass {
    /// Same edge or baseline as another component.
    Aligned,
    /// Preferred padding away from a neighbor.
    NextTo,
    /// Preferred padding away from the container border.
    Container,
    /// Resized back to the component's preferred size.
    PreferredSize,
}

/// One way to snap a dragged edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapCandidate {
    pub class: SnapClass,
    /// The snapping edge of the dragged rectangle.
    pub edge: Alignment,
    /// Shift to apply to the dragged edge.
    pub offset: i32,
    pub orthogonal_distance: i32,
    pub target: Option<ComponentId>,
    pub padding: Option<PaddingType>,
}

impl SnapCandidate {
    #[must_use]
    pub const fn distance(&self) -> i32 {
        self.offset.abs()
    }

    fn rank(&self, other: &Self) -> Ordering {
        self.class
            .cmp(&other.class)
            .then(self.distance().cmp(&other.distance()))
            .then(self.orthogonal_distance.cmp(&other.orthogonal_distance))
            .then_with(|| self.target.cmp(&other.target))
            .then(self.edge.ordinal().cmp(&other.edge.ordinal()))
    }
}

/// Geometry a snap search runs against.
pub struct SnapContext<'a> {
    pub oracle: &'a dyn GeometryOracle,
    pub padding: PaddingDefaults,
    pub container: &'a ComponentId,
    pub interior: Rect,
    /// Components that stay put, with their bounds.
    pub others: &'a [(ComponentId, Rect)],
    pub tolerance: i32,
}

impl SnapContext<'_> {
    /// All candidates for one edge of `rect`, unfiltered by tolerance.
    #[must_use]
    pub fn candidates(
        &self,
        moving: &ComponentId,
        rect: Rect,
        axis: Axis,
        edge: Alignment,
    ) -> Vec<SnapCandidate> {
        let mut out = Vec::new();
        match edge {
            Alignment::Leading | Alignment::Trailing => {
                let side = if edge == Alignment::Leading {
                    Edge::Leading
                } else {
                    Edge::Trailing
                };
                self.aligned(rect, axis, side, &mut out);
                self.next_to(moving, rect, axis, side, &mut out);
                self.container_border(moving, rect, axis, side, &mut out);
            }
            Alignment::Baseline if axis == Axis::Vertical => {
                self.baseline(moving, rect, &mut out);
            }
            _ => {}
        }
        out
    }

    /// Best candidate within tolerance over the given edges.
    #[must_use]
    pub fn best(
        &self,
        moving: &ComponentId,
        rect: Rect,
        axis: Axis,
        edges: &[Alignment],
    ) -> Option<SnapCandidate> {
        let best = edges
            .iter()
            .flat_map(|edge| self.candidates(moving, rect, axis, *edge))
            .filter(|c| c.distance() <= self.tolerance)
            .min_by(SnapCandidate::rank);
        trace!(
            moving = %moving,
            axis = axis.as_str(),
            class = ?best.as_ref().map(|c| c.class),
            "snap search"
        );
        best
    }

    /// Aligned candidates that already coincide exactly with `rect`.
    #[must_use]
    pub fn exact_alignments(
        &self,
        moving: &ComponentId,
        rect: Rect,
        axis: Axis,
    ) -> Vec<SnapCandidate> {
        let mut edges = vec![Alignment::Leading, Alignment::Trailing];
        if axis == Axis::Vertical {
            edges.push(Alignment::Baseline);
        }
        let mut exact: Vec<SnapCandidate> = edges
            .into_iter()
            .flat_map(|edge| self.candidates(moving, rect, axis, edge))
            .filter(|c| c.class == SnapClass::Aligned && c.offset == 0)
            .collect();
        exact.sort_by(SnapCandidate::rank);
        exact
    }

    fn orthogonal_distance(rect: Rect, other: Rect, axis: Axis) -> i32 {
        rect.span(axis.other()).distance(&other.span(axis.other()))
    }

    fn aligned(&self, rect: Rect, axis: Axis, side: Edge, out: &mut Vec<SnapCandidate>) {
        for (id, bounds) in self.others {
            out.push(SnapCandidate {
                class: SnapClass::Aligned,
                edge: Alignment::from_edge(side),
                offset: bounds.span(axis).edge(side) - rect.span(axis).edge(side),
                orthogonal_distance: Self::orthogonal_distance(rect, *bounds, axis),
                target: Some(id.clone()),
                padding: None,
            });
        }
    }

    fn baseline(&self, moving: &ComponentId, rect: Rect, out: &mut Vec<SnapCandidate>) {
        let Some(own) = self
            .oracle
            .baseline_position(moving, rect.width, rect.height)
            .filter(|b| *b >= 0)
        else {
            return;
        };
        for (id, bounds) in self.others {
            let Some(theirs) = self
                .oracle
                .baseline_position(id, bounds.width, bounds.height)
                .filter(|b| *b >= 0)
            else {
                continue;
            };
            out.push(SnapCandidate {
                class: SnapClass::Aligned,
                edge: Alignment::Baseline,
                offset: (bounds.y + theirs) - (rect.y + own),
                orthogonal_distance: Self::orthogonal_distance(rect, *bounds, Axis::Vertical),
                target: Some(id.clone()),
                padding: None,
            });
        }
    }

    /// Preferred padding between two components, `second` after `first`.
    #[must_use]
    pub fn padding_between(
        &self,
        first: &ComponentId,
        second: &ComponentId,
        axis: Axis,
        padding: PaddingType,
    ) -> i32 {
        self.oracle
            .preferred_padding(first, second, axis, Edge::Trailing, padding)
            .unwrap_or_else(|| self.padding.padding(padding))
    }

    fn next_to(
        &self,
        moving: &ComponentId,
        rect: Rect,
        axis: Axis,
        side: Edge,
        out: &mut Vec<SnapCandidate>,
    ) {
        let own = rect.span(axis);
        let across = rect.span(axis.other());
        let in_front = self.others.iter().filter(|(_, bounds)| {
            let theirs = bounds.span(axis);
            bounds.span(axis.other()).intersects(&across)
                && match side {
                    Edge::Leading => {
                        theirs.start < own.start && theirs.end <= own.start + self.tolerance
                    }
                    Edge::Trailing => theirs.end > own.end && theirs.start >= own.end - self.tolerance,
                }
        });
        let nearest = match side {
            Edge::Leading => in_front.max_by(|a, b| {
                a.1.span(axis)
                    .end
                    .cmp(&b.1.span(axis).end)
                    .then_with(|| b.0.cmp(&a.0))
            }),
            Edge::Trailing => in_front.min_by(|a, b| {
                a.1.span(axis)
                    .start
                    .cmp(&b.1.span(axis).start)
                    .then_with(|| a.0.cmp(&b.0))
            }),
        };
        let Some((id, bounds)) = nearest else {
            return;
        };
        for padding in [PaddingType::Related, PaddingType::Unrelated] {
            let offset = match side {
                Edge::Leading => {
                    bounds.span(axis).end + self.padding_between(id, moving, axis, padding) - own.start
                }
                Edge::Trailing => {
                    bounds.span(axis).start - self.padding_between(moving, id, axis, padding) - own.end
                }
            };
            out.push(SnapCandidate {
                class: SnapClass::NextTo,
                edge: Alignment::from_edge(side),
                offset,
                orthogonal_distance: 0,
                target: Some(id.clone()),
                padding: Some(padding),
            });
        }
    }

    fn container_border(
        &self,
        moving: &ComponentId,
        rect: Rect,
        axis: Axis,
        side: Edge,
        out: &mut Vec<SnapCandidate>,
    ) {
        let border = self.interior.span(axis);
        let padding = self
            .oracle
            .preferred_padding_in_parent(self.container, moving, axis, side)
            .unwrap_or(self.padding.container);
        let target = match side {
            Edge::Leading => border.start + padding,
            Edge::Trailing => border.end - padding,
        };
        out.push(SnapCandidate {
            class: SnapClass::Container,
            edge: Alignment::from_edge(side),
            offset: target - rect.span(axis).edge(side),
            orthogonal_distance: 0,
            target: None,
            padding: None,
        });
    }
}

/// Candidate for resizing an edge back to the preferred size.
#[must_use]
pub fn preferred_size_candidate(
    span: Span,
    side: Edge,
    preferred: Option<i32>,
) -> Option<SnapCandidate> {
    let preferred = preferred?;
    let delta = preferred - span.len();
    Some(SnapCandidate {
        class: SnapClass::PreferredSize,
        edge: Alignment::from_edge(side),
        offset: match side {
            Edge::Leading => -delta,
            Edge::Trailing => delta,
        },
        orthogonal_distance: 0,
        target: None,
        padding: None,
    })
}

#[cfg(test)]
mod tests {
    use formlay_core::Size;

    use super::*;

    struct Flat;

    impl GeometryOracle for Flat {
        fn component_bounds(&self, _id: &ComponentId) -> Option<Rect> {
            None
        }
        fn container_interior(&self, _id: &ComponentId) -> Option<Rect> {
            None
        }
        fn component_minimum_size(&self, _id: &ComponentId) -> Option<Size> {
            None
        }
        fn component_preferred_size(&self, _id: &ComponentId) -> Option<Size> {
            None
        }
        fn has_explicit_preferred_size(&self, _id: &ComponentId) -> bool {
            false
        }
        fn baseline_position(&self, id: &ComponentId, _width: i32, _height: i32) -> Option<i32> {
            (id.as_str() != "panel").then_some(10)
        }
        fn preferred_padding(
            &self,
            _first: &ComponentId,
            _second: &ComponentId,
            _axis: Axis,
            _second_edge: Edge,
            _padding: PaddingType,
        ) -> Option<i32> {
            None
        }
        fn preferred_padding_in_parent(
            &self,
            _parent: &ComponentId,
            _component: &ComponentId,
            _axis: Axis,
            _component_edge: Edge,
        ) -> Option<i32> {
            None
        }
    }

    fn cid(raw: &str) -> ComponentId {
        ComponentId::new(raw)
    }

    fn ctx<'a>(others: &'a [(ComponentId, Rect)], form: &'a ComponentId) -> SnapContext<'a> {
        SnapContext {
            oracle: &Flat,
            padding: PaddingDefaults::default(),
            container: form,
            interior: Rect::from_size(400, 300),
            others,
            tolerance: 8,
        }
    }

    #[test]
    fn aligned_edge_beats_closer_padding() {
        let form = cid("Form");
        let others = vec![
            (cid("a"), Rect::new(20, 10, 50, 20)),
            (cid("b"), Rect::new(20, 60, 50, 20)),
        ];
        let context = ctx(&others, &form);
        // 5px off b's leading edge and 3px off the container border
        let rect = Rect::new(13, 100, 40, 20);
        let best = context
            .best(&cid("x"), rect, Axis::Horizontal, &[Alignment::Leading])
            .expect("snap");
        assert_eq!(best.class, SnapClass::Aligned);
        assert_eq!(best.offset, 7);
        assert_eq!(best.target, Some(cid("b")));
    }

    #[test]
    fn next_to_uses_nearest_neighbor_in_front() {
        let form = cid("Form");
        let others = vec![
            (cid("a"), Rect::new(10, 10, 50, 20)),
            (cid("far"), Rect::new(10, 200, 50, 20)),
        ];
        let context = ctx(&others, &form);
        let rect = Rect::new(64, 12, 40, 20);
        let best = context
            .best(&cid("x"), rect, Axis::Horizontal, &[Alignment::Leading])
            .expect("snap");
        assert_eq!(best.class, SnapClass::NextTo);
        assert_eq!(best.offset, 2);
        assert_eq!(best.padding, Some(PaddingType::Related));
    }

    #[test]
    fn container_border_when_nothing_else_is_close() {
        let form = cid("Form");
        let context = ctx(&[], &form);
        let rect = Rect::new(100, 285, 40, 10);
        let best = context
            .best(&cid("x"), rect, Axis::Vertical, &[Alignment::Leading, Alignment::Trailing])
            .expect("snap");
        assert_eq!(best.class, SnapClass::Container);
        assert_eq!(best.edge, Alignment::Trailing);
        assert_eq!(best.offset, -5);
        assert!(context
            .best(&cid("x"), Rect::new(100, 100, 40, 10), Axis::Vertical, &[Alignment::Leading])
            .is_none());
    }

    #[test]
    fn baseline_candidates_need_both_baselines() {
        let form = cid("Form");
        let others = vec![
            (cid("label"), Rect::new(10, 40, 30, 14)),
            (cid("panel"), Rect::new(200, 41, 30, 30)),
        ];
        let context = ctx(&others, &form);
        let rect = Rect::new(60, 43, 40, 20);
        let candidates = context.candidates(&cid("x"), rect, Axis::Vertical, Alignment::Baseline);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].offset, -3);
        assert!(context
            .candidates(&cid("x"), rect, Axis::Horizontal, Alignment::Baseline)
            .is_empty());
    }

    #[test]
    fn exact_alignments_only_report_zero_offsets() {
        let form = cid("Form");
        let others = vec![(cid("a"), Rect::new(20, 10, 50, 20))];
        let context = ctx(&others, &form);
        let exact = context.exact_alignments(&cid("x"), Rect::new(20, 40, 30, 20), Axis::Horizontal);
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].edge, Alignment::Leading);
    }

    #[test]
    fn preferred_size_candidate_moves_the_dragged_edge() {
        let candidate =
            preferred_size_candidate(Span::new(10, 66), Edge::Trailing, Some(60)).expect("pref");
        assert_eq!(candidate.offset, 4);
        let leading =
            preferred_size_candidate(Span::new(10, 66), Edge::Leading, Some(60)).expect("pref");
        assert_eq!(leading.offset, -4);
    }
}
