#![forbid(unsafe_code)]

//! Size resolution and the layout solver.
//!
//! Group sizes are never stored: they are a pure function of the children,
//! recomputed here on demand. Sequences sum their children, parallel groups
//! take the maximum (or ascent plus descent for baseline groups). Default
//! component sizes come from the oracle; default gap sizes are the preferred
//! padding between the components on either side of the gap, or between a
//! component and the container border.
//!
//! [`solve`] turns a container's two trees into concrete component bounds,
//! laying out the horizontal axis first so baselines can be queried with the
//! final widths.

use std::collections::BTreeMap;

use formlay_core::{
    Alignment, Axis, ComponentId, Edge, GeometryOracle, PaddingType, Rect, Size, Span, trace,
};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::interval::{INFINITE_SIZE, IntervalId, IntervalKind, IntervalRecord, SizeDef};
use crate::model::LayoutModel;

/// Spacing used when the oracle has no padding for a pair of components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaddingDefaults {
    pub related: i32,
    pub unrelated: i32,
    pub separate: i32,
    pub indent: i32,
    /// Distance between a component and the container border.
    pub container: i32,
}

impl Default for PaddingDefaults {
    fn default() -> Self {
        Self {
            related: 6,
            unrelated: 12,
            separate: 18,
            indent: 10,
            container: 10,
        }
    }
}

impl PaddingDefaults {
    #[must_use]
    pub const fn padding(&self, padding: PaddingType) -> i32 {
        match padding {
            PaddingType::Related => self.related,
            PaddingType::Unrelated => self.unrelated,
            PaddingType::Separate => self.separate,
            PaddingType::Indent => self.indent,
        }
    }
}

/// Resolved min/pref/max of an interval, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResolvedSize {
    pub min: i32,
    pub pref: i32,
    pub max: i32,
}

impl ResolvedSize {
    #[must_use]
    pub const fn fixed(size: i32) -> Self {
        Self {
            min: size,
            pref: size,
            max: size,
        }
    }
}

/// What borders a gap on one side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GapNeighbor {
    /// The container border.
    Container,
    /// The components facing the gap.
    Components(Vec<ComponentId>),
    /// Another gap, or a group with nothing at the facing edge.
    Unknown,
}

fn cap(value: i64) -> i32 {
    value.clamp(0, i64::from(INFINITE_SIZE)) as i32
}

/// Resolves interval sizes for one container tree, memoizing per interval.
pub struct SizeResolver<'a> {
    model: &'a LayoutModel,
    oracle: &'a dyn GeometryOracle,
    defaults: PaddingDefaults,
    container: ComponentId,
    axis: Axis,
    widths: Option<&'a FxHashMap<ComponentId, i32>>,
    cache: FxHashMap<IntervalId, ResolvedSize>,
}

impl<'a> SizeResolver<'a> {
    #[must_use]
    pub fn new(
        model: &'a LayoutModel,
        oracle: &'a dyn GeometryOracle,
        defaults: PaddingDefaults,
        container: &ComponentId,
        axis: Axis,
    ) -> Self {
        Self {
            model,
            oracle,
            defaults,
            container: container.clone(),
            axis,
            widths: None,
            cache: FxHashMap::default(),
        }
    }

    /// Use final component widths for baseline queries.
    #[must_use]
    pub fn with_widths(mut self, widths: &'a FxHashMap<ComponentId, i32>) -> Self {
        self.widths = Some(widths);
        self
    }

    #[must_use]
    pub const fn axis(&self) -> Axis {
        self.axis
    }

    /// Natural preferred size of a component on the axis.
    #[must_use]
    pub fn component_preferred(&self, component: &ComponentId) -> Option<i32> {
        self.oracle
            .component_preferred_size(component)
            .map(|size| size.along(self.axis))
    }

    fn component_width(&self, component: &ComponentId) -> i32 {
        self.widths
            .and_then(|w| w.get(component).copied())
            .or_else(|| {
                self.oracle
                    .component_preferred_size(component)
                    .map(|s| s.width)
            })
            .unwrap_or(0)
    }

    /// Baseline of a component at the given height, if it has one.
    #[must_use]
    pub fn baseline(&self, component: &ComponentId, height: i32) -> Option<i32> {
        self.oracle
            .baseline_position(component, self.component_width(component), height)
            .filter(|b| *b >= 0)
    }

    pub fn resolve(&mut self, id: IntervalId) -> ResolvedSize {
        if let Some(cached) = self.cache.get(&id) {
            return *cached;
        }
        let Some(record) = self.model.get(id) else {
            return ResolvedSize::default();
        };
        let resolved = match &record.kind {
            IntervalKind::Single { component } => self.resolve_single(record, component),
            IntervalKind::Gap { .. } => {
                let pref = match record.sizes.pref {
                    SizeDef::Px(px) => px,
                    _ => self.default_gap_size(id),
                };
                self.resolve_leaf(record, pref, pref)
            }
            IntervalKind::Sequential { children } => {
                let children = children.clone();
                let (mut min, mut pref, mut max) = (0_i64, 0_i64, 0_i64);
                for child in children {
                    let size = self.resolve(child);
                    min += i64::from(size.min);
                    pref += i64::from(size.pref);
                    max += i64::from(size.max);
                }
                ResolvedSize {
                    min: cap(min),
                    pref: cap(pref),
                    max: cap(max),
                }
            }
            IntervalKind::Parallel { children, .. } => {
                let children = children.clone();
                self.resolve_parallel(id, &children)
            }
        };
        let _ = self.cache.insert(id, resolved);
        resolved
    }

    fn resolve_single(&self, record: &IntervalRecord, component: &ComponentId) -> ResolvedSize {
        let natural = self
            .component_preferred(component)
            .or_else(|| record.current.map(|s| s.len()))
            .unwrap_or(0);
        let pref = record.sizes.pref.px().unwrap_or(natural);
        let natural_min = self
            .oracle
            .component_minimum_size(component)
            .map_or(pref, |s| s.along(self.axis).min(pref));
        self.resolve_leaf(record, pref, natural_min)
    }

    fn resolve_leaf(&self, record: &IntervalRecord, pref: i32, default_min: i32) -> ResolvedSize {
        let pref = pref.max(0);
        let min = match record.sizes.min {
            SizeDef::Px(px) => px.min(pref),
            SizeDef::UsePreferred => pref,
            SizeDef::NotDefined | SizeDef::Infinite => default_min.clamp(0, pref),
        };
        let max = match record.sizes.max {
            SizeDef::Px(px) => px.max(pref),
            SizeDef::Infinite => INFINITE_SIZE,
            SizeDef::NotDefined | SizeDef::UsePreferred => pref,
        };
        ResolvedSize { min, pref, max }
    }

    fn resolve_parallel(&mut self, id: IntervalId, children: &[IntervalId]) -> ResolvedSize {
        let members = self.baseline_members(id);
        let mut size = ResolvedSize::default();
        let (mut ascent, mut descent) = (0, 0);
        for child in children {
            let child_size = self.resolve(*child);
            if let Some((_, child_ascent)) = members.iter().find(|(c, _)| c == child) {
                ascent = ascent.max(*child_ascent);
                descent = descent.max(child_size.pref - child_ascent);
                continue;
            }
            size.min = size.min.max(child_size.min);
            size.pref = size.pref.max(child_size.pref);
            size.max = size.max.max(child_size.max);
        }
        if !members.is_empty() {
            let baseline_extent = ascent + descent;
            size.min = size.min.max(baseline_extent);
            size.pref = size.pref.max(baseline_extent);
            size.max = size.max.max(baseline_extent);
        }
        size.max = size.max.max(size.pref);
        size
    }

    /// Children of a vertical parallel group that align on a shared
    /// baseline, with their ascent. Empty unless at least two qualify.
    pub fn baseline_members(&mut self, id: IntervalId) -> Vec<(IntervalId, i32)> {
        if self.axis != Axis::Vertical {
            return Vec::new();
        }
        let Some(record) = self.model.get(id) else {
            return Vec::new();
        };
        let IntervalKind::Parallel { children, .. } = &record.kind else {
            return Vec::new();
        };
        let children = children.clone();
        let mut members = Vec::new();
        for child in children {
            let Some(child_record) = self.model.get(child) else {
                continue;
            };
            if child_record.alignment != Alignment::Baseline {
                continue;
            }
            let Some(component) = child_record.component().cloned() else {
                continue;
            };
            let height = self.resolve(child).pref;
            if let Some(ascent) = self.baseline(&component, height) {
                members.push((child, ascent));
            }
        }
        if members.len() < 2 {
            members.clear();
        }
        members
    }

    /// Components at one edge of an interval.
    #[must_use]
    pub fn edge_components(&self, id: IntervalId, edge: Edge) -> Vec<ComponentId> {
        let Some(record) = self.model.get(id) else {
            return Vec::new();
        };
        match &record.kind {
            IntervalKind::Single { component } => vec![component.clone()],
            IntervalKind::Gap { .. } => Vec::new(),
            IntervalKind::Sequential { children } => {
                let outer = match edge {
                    Edge::Leading => children.first(),
                    Edge::Trailing => children.last(),
                };
                outer.map_or_else(Vec::new, |c| self.edge_components(*c, edge))
            }
            IntervalKind::Parallel { children, .. } => children
                .iter()
                .flat_map(|c| self.edge_components(*c, edge))
                .collect(),
        }
    }

    /// What borders `id` on the given side, walking out of enclosing groups.
    #[must_use]
    pub fn neighbor(&self, id: IntervalId, edge: Edge) -> GapNeighbor {
        let mut cur = id;
        loop {
            let Some(parent) = self.model.parent(cur) else {
                return GapNeighbor::Container;
            };
            let Some(parent_record) = self.model.get(parent) else {
                return GapNeighbor::Unknown;
            };
            if parent_record.is_sequential() {
                let children = parent_record.children();
                let index = children.iter().position(|c| *c == cur).unwrap_or(0);
                let sibling = match edge {
                    Edge::Leading => index.checked_sub(1).map(|i| children[i]),
                    Edge::Trailing => children.get(index + 1).copied(),
                };
                if let Some(sibling) = sibling {
                    if self.model.is_gap(sibling) {
                        return GapNeighbor::Unknown;
                    }
                    return GapNeighbor::Components(self.edge_components(sibling, edge.opposite()));
                }
            } else if parent_record.parent.is_none() {
                return GapNeighbor::Container;
            }
            cur = parent;
        }
    }

    /// Preferred size of a default gap.
    #[must_use]
    pub fn default_gap_size(&self, gap: IntervalId) -> i32 {
        let padding = match self.model.get(gap).map(|r| &r.kind) {
            Some(IntervalKind::Gap { padding }) => padding.unwrap_or_default(),
            _ => PaddingType::Related,
        };
        let leading = self.neighbor(gap, Edge::Leading);
        let trailing = self.neighbor(gap, Edge::Trailing);
        self.padding_between(&leading, &trailing, padding)
    }

    /// Preferred distance between two gap neighbors.
    #[must_use]
    pub fn padding_between(
        &self,
        leading: &GapNeighbor,
        trailing: &GapNeighbor,
        padding: PaddingType,
    ) -> i32 {
        match (leading, trailing) {
            (GapNeighbor::Components(first), GapNeighbor::Components(second))
                if !first.is_empty() && !second.is_empty() =>
            {
                first
                    .iter()
                    .flat_map(|a| second.iter().map(move |b| (a, b)))
                    .map(|(a, b)| self.component_padding(a, b, padding))
                    .max()
                    .unwrap_or_else(|| self.defaults.padding(padding))
            }
            (GapNeighbor::Container, GapNeighbor::Components(comps))
                if !comps.is_empty() =>
            {
                comps
                    .iter()
                    .map(|c| self.container_padding(c, Edge::Leading))
                    .max()
                    .unwrap_or(self.defaults.container)
            }
            (GapNeighbor::Components(comps), GapNeighbor::Container)
                if !comps.is_empty() =>
            {
                comps
                    .iter()
                    .map(|c| self.container_padding(c, Edge::Trailing))
                    .max()
                    .unwrap_or(self.defaults.container)
            }
            (GapNeighbor::Container, GapNeighbor::Container) => self.defaults.container,
            _ => self.defaults.padding(padding),
        }
    }

    /// Preferred padding between two components, `second` trailing `first`.
    #[must_use]
    pub fn component_padding(
        &self,
        first: &ComponentId,
        second: &ComponentId,
        padding: PaddingType,
    ) -> i32 {
        self.oracle
            .preferred_padding(first, second, self.axis, Edge::Trailing, padding)
            .unwrap_or_else(|| {
                trace!(
                    first = %first,
                    second = %second,
                    "no preferred padding from oracle, using default"
                );
                self.defaults.padding(padding)
            })
    }

    /// Preferred padding between a component edge and the container border.
    #[must_use]
    pub fn container_padding(&self, component: &ComponentId, edge: Edge) -> i32 {
        self.oracle
            .preferred_padding_in_parent(&self.container, component, self.axis, edge)
            .unwrap_or(self.defaults.container)
    }
}

/// Concrete geometry of one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolvedLayout {
    pub container: ComponentId,
    pub interior: Rect,
    pub bounds: BTreeMap<ComponentId, Rect>,
    /// Built span of every interval, per axis.
    pub spans: [BTreeMap<IntervalId, Span>; 2],
    pub preferred: Size,
    pub minimum: Size,
}

struct AxisPlacer<'r, 'a> {
    resolver: &'r mut SizeResolver<'a>,
    spans: BTreeMap<IntervalId, Span>,
    components: BTreeMap<ComponentId, Span>,
}

impl AxisPlacer<'_, '_> {
    fn place(&mut self, id: IntervalId, span: Span) {
        let _ = self.spans.insert(id, span);
        let Some(record) = self.resolver.model.get(id) else {
            return;
        };
        match &record.kind {
            IntervalKind::Single { component } => {
                let _ = self.components.insert(component.clone(), span);
            }
            IntervalKind::Gap { .. } => {}
            IntervalKind::Sequential { children } => {
                let children = children.clone();
                let sizes: Vec<ResolvedSize> =
                    children.iter().map(|c| self.resolver.resolve(*c)).collect();
                let lengths = distribute(&sizes, span.len());
                let mut pos = span.start;
                for (child, len) in children.into_iter().zip(lengths) {
                    self.place(child, Span::with_len(pos, len));
                    pos += len;
                }
            }
            IntervalKind::Parallel { children, .. } => {
                let children = children.clone();
                let members = self.resolver.baseline_members(id);
                let group_ascent = members.iter().map(|(_, a)| *a).max().unwrap_or(0);
                for child in children {
                    let size = self.resolver.resolve(child);
                    if let Some((_, ascent)) = members.iter().find(|(c, _)| *c == child) {
                        let start = span.start + group_ascent - ascent;
                        self.place(child, Span::with_len(start, size.pref));
                        continue;
                    }
                    let alignment = self
                        .resolver
                        .model
                        .get(child)
                        .map_or(Alignment::Leading, |r| r.alignment);
                    let len = span.len().clamp(size.min, size.max.max(size.min));
                    let start = match alignment {
                        Alignment::Trailing => span.end - len,
                        Alignment::Center => span.start + (span.len() - len) / 2,
                        Alignment::Leading | Alignment::Baseline | Alignment::Fill => span.start,
                    };
                    self.place(child, Span::with_len(start, len));
                }
            }
        }
    }
}

/// Split `total` among sequence members: everyone starts at the preferred
/// size, then slack is spread evenly over the members that can absorb it.
#[must_use]
pub fn distribute(sizes: &[ResolvedSize], total: i32) -> Vec<i32> {
    let mut lengths: Vec<i32> = sizes.iter().map(|s| s.pref).collect();
    let pref_sum: i64 = lengths.iter().map(|l| i64::from(*l)).sum();
    let slack = i64::from(total) - pref_sum;
    if slack > 0 {
        let mut room: Vec<i32> = sizes.iter().map(|s| s.max - s.pref).collect();
        spread(&mut lengths, &mut room, cap(slack), 1);
    } else if slack < 0 {
        let mut room: Vec<i32> = sizes.iter().map(|s| s.pref - s.min).collect();
        spread(&mut lengths, &mut room, cap(-slack), -1);
    }
    lengths
}

fn spread(lengths: &mut [i32], room: &mut [i32], mut amount: i32, sign: i32) {
    while amount > 0 {
        let eligible: Vec<usize> = (0..room.len()).filter(|i| room[*i] > 0).collect();
        if eligible.is_empty() {
            break;
        }
        let share = amount / eligible.len() as i32;
        if share == 0 {
            for i in eligible.into_iter().take(amount as usize) {
                lengths[i] += sign;
                room[i] -= 1;
            }
            break;
        }
        for i in eligible {
            let give = share.min(room[i]);
            lengths[i] += sign * give;
            room[i] -= give;
            amount -= give;
        }
    }
}

/// Lay out both trees of a container.
pub fn solve(
    model: &LayoutModel,
    oracle: &dyn GeometryOracle,
    defaults: PaddingDefaults,
    container: &ComponentId,
) -> Result<SolvedLayout, LayoutError> {
    let roots = [
        model.root(container, Axis::Horizontal)?,
        model.root(container, Axis::Vertical)?,
    ];
    let mut horizontal = SizeResolver::new(model, oracle, defaults, container, Axis::Horizontal);
    let h_size = horizontal.resolve(roots[0]);
    let interior = oracle
        .container_interior(container)
        .unwrap_or(Rect::from_size(h_size.pref, 0));

    let mut placer = AxisPlacer {
        resolver: &mut horizontal,
        spans: BTreeMap::new(),
        components: BTreeMap::new(),
    };
    placer.place(roots[0], interior.span(Axis::Horizontal));
    let h_spans = std::mem::take(&mut placer.spans);
    let h_components = std::mem::take(&mut placer.components);

    let widths: FxHashMap<ComponentId, i32> = h_components
        .iter()
        .map(|(id, span)| (id.clone(), span.len()))
        .collect();
    let mut vertical =
        SizeResolver::new(model, oracle, defaults, container, Axis::Vertical).with_widths(&widths);
    let v_size = vertical.resolve(roots[1]);
    let interior = if oracle.container_interior(container).is_some() {
        interior
    } else {
        Rect::new(interior.x, interior.y, interior.width, v_size.pref)
    };
    let mut placer = AxisPlacer {
        resolver: &mut vertical,
        spans: BTreeMap::new(),
        components: BTreeMap::new(),
    };
    placer.place(roots[1], interior.span(Axis::Vertical));
    let v_spans = std::mem::take(&mut placer.spans);
    let v_components = std::mem::take(&mut placer.components);

    let bounds = h_components
        .iter()
        .filter_map(|(id, h)| v_components.get(id).map(|v| (id.clone(), Rect::from_spans(*h, *v))))
        .collect();

    Ok(SolvedLayout {
        container: container.clone(),
        interior,
        bounds,
        spans: [h_spans, v_spans],
        preferred: Size::new(h_size.pref, v_size.pref),
        minimum: Size::new(h_size.min, v_size.min),
    })
}

impl LayoutModel {
    /// Store the built spans of a solved layout on the intervals.
    pub fn apply_solved(&mut self, solved: &SolvedLayout) {
        for spans in &solved.spans {
            for (id, span) in spans {
                self.set_current(*id, Some(*span));
            }
        }
    }

    /// Derive built spans from the host's real component bounds.
    ///
    /// Components take their reported bounds, groups the extent of their
    /// contents, and gaps the space between their neighbors. Roots span the
    /// interior.
    pub fn sync_spans(
        &mut self,
        container: &ComponentId,
        interior: Rect,
        bounds: &BTreeMap<ComponentId, Rect>,
    ) -> Result<(), LayoutError> {
        for axis in Axis::ALL {
            let root = self.root(container, axis)?;
            let _ = self.sync_content(root, axis, bounds);
            self.sync_frame(root, interior.span(axis));
        }
        Ok(())
    }

    fn sync_content(
        &mut self,
        id: IntervalId,
        axis: Axis,
        bounds: &BTreeMap<ComponentId, Rect>,
    ) -> Option<Span> {
        let record = self.get(id)?.clone();
        match &record.kind {
            IntervalKind::Single { component } => {
                if let Some(rect) = bounds.get(component) {
                    self.set_current(id, Some(rect.span(axis)));
                }
                self.current(id)
            }
            IntervalKind::Gap { .. } => None,
            IntervalKind::Sequential { children } | IntervalKind::Parallel { children, .. } => {
                let content = children
                    .iter()
                    .filter_map(|c| self.sync_content(*c, axis, bounds))
                    .reduce(|a, b| a.union(&b));
                if content.is_some() {
                    self.set_current(id, content);
                }
                content
            }
        }
    }

    /// Widen groups to the frame their parent gives them and fill in gaps.
    fn sync_frame(&mut self, id: IntervalId, frame: Span) {
        let Some(record) = self.get(id).cloned() else {
            return;
        };
        match &record.kind {
            IntervalKind::Single { .. } => {}
            IntervalKind::Gap { .. } => self.set_current(id, Some(frame)),
            IntervalKind::Parallel { children, .. } => {
                self.set_current(id, Some(frame));
                for child in children {
                    let child_frame = if self.get(*child).is_some_and(IntervalRecord::is_sequential) {
                        self.sequence_frame(*child, frame)
                    } else {
                        self.content_span(*child).unwrap_or(frame)
                    };
                    self.sync_frame(*child, child_frame);
                }
            }
            IntervalKind::Sequential { children } => {
                self.set_current(id, Some(frame));
                let mut cursor = frame.start;
                for (index, child) in children.iter().enumerate() {
                    if self.is_gap(*child) {
                        let end = children[index + 1..]
                            .iter()
                            .find_map(|c| self.content_span(*c))
                            .map_or(frame.end, |s| s.start);
                        self.set_current(*child, Some(Span::new(cursor, end.max(cursor))));
                        cursor = end.max(cursor);
                    } else {
                        let span = self.content_span(*child).unwrap_or(Span::new(cursor, cursor));
                        self.sync_frame(*child, span);
                        cursor = span.end;
                    }
                }
            }
        }
    }

    /// Frame of a sequence inside a parallel frame: sequences that start or
    /// end with a gap reach the parallel group's border on that side.
    fn sequence_frame(&self, seq: IntervalId, frame: Span) -> Span {
        let content = self.content_span(seq).unwrap_or(frame);
        let children = self.children(seq);
        let leads_with_gap = children.first().is_some_and(|c| self.is_gap(*c));
        let trails_with_gap = children.last().is_some_and(|c| self.is_gap(*c));
        Span::new(
            if leads_with_gap { frame.start.min(content.start) } else { content.start },
            if trails_with_gap { frame.end.max(content.end) } else { content.end },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distribute_gives_slack_to_resizing_members_only() {
        let sizes = [
            ResolvedSize::fixed(10),
            ResolvedSize {
                min: 20,
                pref: 50,
                max: INFINITE_SIZE,
            },
            ResolvedSize {
                min: 0,
                pref: 10,
                max: INFINITE_SIZE,
            },
        ];
        assert_eq!(distribute(&sizes, 70), vec![10, 50, 10]);
        assert_eq!(distribute(&sizes, 101), vec![10, 66, 25]);
        // shrinking splits evenly, capped at each member's minimum
        assert_eq!(distribute(&sizes, 50), vec![10, 40, 0]);
        assert_eq!(distribute(&sizes, 25), vec![10, 20, 0]);
    }

    #[test]
    fn distribute_respects_caps() {
        let sizes = [
            ResolvedSize {
                min: 0,
                pref: 10,
                max: 12,
            },
            ResolvedSize {
                min: 0,
                pref: 10,
                max: INFINITE_SIZE,
            },
        ];
        assert_eq!(distribute(&sizes, 40), vec![12, 28]);
        assert_eq!(distribute(&sizes, 0), vec![0, 0]);
    }

    #[test]
    fn padding_defaults_cover_all_types() {
        let defaults = PaddingDefaults::default();
        assert_eq!(defaults.padding(PaddingType::Related), 6);
        assert_eq!(defaults.padding(PaddingType::Unrelated), 12);
        assert_eq!(defaults.padding(PaddingType::Separate), 18);
        assert_eq!(defaults.padding(PaddingType::Indent), 10);
    }
}
