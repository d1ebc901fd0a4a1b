#![forbid(unsafe_code)]

//! Structural placement of a component interval into a tree.
//!
//! Placement works on built spans: every interval touched here gets a
//! `current` span describing where it should end up, and gaps in the
//! sequences along the way are refitted so that untouched components keep
//! their position. Sizes written here are explicit pixels; the commit-time
//! optimization demotes the ones that equal their default back to default.

use std::collections::BTreeMap;

use formlay_core::{Alignment, Axis, ComponentId, Edge, GeometryOracle, Rect, Span, trace};
use formlay_layout::{IntervalId, IntervalKind, IntervalSizes, LayoutError, LayoutModel, SizeDef};

use crate::optimize::gap_sizes;
use crate::snap::{SnapCandidate, SnapClass};

/// Bounds of the placed components of a container, from built spans, falling
/// back to the oracle.
pub fn placed_bounds(
    model: &LayoutModel,
    oracle: &dyn GeometryOracle,
    container: &ComponentId,
    exclude: &[ComponentId],
) -> Result<Vec<(ComponentId, Rect)>, LayoutError> {
    let members = model.layout_component(container)?.sub_components.clone();
    let mut out = Vec::new();
    for member in members {
        if exclude.contains(&member) {
            continue;
        }
        let component = model.layout_component(&member)?;
        let spans: Vec<Option<Span>> = Axis::ALL
            .into_iter()
            .map(|axis| component.interval(axis).and_then(|i| model.current(i)))
            .collect();
        let rect = match (spans[0], spans[1]) {
            (Some(h), Some(v)) => Some(Rect::from_spans(h, v)),
            _ => oracle.component_bounds(&member),
        };
        if let Some(rect) = rect {
            out.push((member, rect));
        }
    }
    Ok(out)
}

pub(crate) struct Placer<'a> {
    pub model: &'a mut LayoutModel,
    pub oracle: &'a dyn GeometryOracle,
    /// Desired bounds of components being placed in this pass.
    pub pending: &'a BTreeMap<ComponentId, Rect>,
}

impl Placer<'_> {
    fn component_span(&self, component: &ComponentId, axis: Axis) -> Option<Span> {
        if let Some(rect) = self.pending.get(component) {
            return Some(rect.span(axis));
        }
        self.model
            .component_interval(component, axis)
            .ok()
            .and_then(|i| self.model.current(i))
            .or_else(|| self.oracle.component_bounds(component).map(|r| r.span(axis)))
    }

    /// Extent of the components inside `id` on `axis`.
    fn extent(&self, id: IntervalId, axis: Axis) -> Option<Span> {
        self.model
            .components_in(id)
            .iter()
            .filter_map(|c| self.component_span(c, axis))
            .reduce(|a, b| a.union(&b))
    }

    fn span_of(&self, id: IntervalId) -> Option<Span> {
        self.model.current(id).or_else(|| self.model.content_span(id))
    }

    fn content_of(&self, id: IntervalId) -> Option<Span> {
        self.model.content_span(id).or_else(|| self.model.current(id))
    }

    /// Place a detached single interval at `rect` on `axis`.
    ///
    /// Exact alignments are tried first, in order; the first one that fits
    /// joins or forms a parallel group with its target. Otherwise the tree is
    /// descended from the root.
    pub fn place(
        &mut self,
        container: &ComponentId,
        single: IntervalId,
        axis: Axis,
        rect: Rect,
        alignments: &[SnapCandidate],
    ) -> Result<(), LayoutError> {
        let desired = rect.span(axis);
        self.model.set_current(single, Some(desired));
        for candidate in alignments {
            if let Some(target) = &candidate.target
                && self.try_join(single, target, axis, candidate.edge, desired)?
            {
                trace!(anchor = %target, edge = %candidate.edge, "joined aligned group");
                return Ok(());
            }
        }
        let root = self.model.root(container, axis)?;
        self.place_in_parallel(root, single, axis, rect)
    }

    fn try_join(
        &mut self,
        single: IntervalId,
        target: &ComponentId,
        axis: Axis,
        edge: Alignment,
        desired: Span,
    ) -> Result<bool, LayoutError> {
        if edge == Alignment::Baseline && axis != Axis::Vertical {
            return Ok(false);
        }
        let Ok(anchor) = self.model.component_interval(target, axis) else {
            return Ok(false);
        };
        let Some(anchor_span) = self.model.current(anchor) else {
            return Ok(false);
        };
        let Some(parent) = self.model.parent(anchor) else {
            return Ok(false);
        };
        let parent_record = self.model.interval(parent)?.clone();
        let joins_parent = parent_record.is_parallel()
            && self.model.interval(anchor)?.alignment == edge
            && self.span_of(parent).is_some_and(|p| match edge {
                Alignment::Leading => p.start == anchor_span.start,
                Alignment::Trailing => p.end == anchor_span.end,
                _ => true,
            });

        let group = if joins_parent {
            let grown = self.span_of(parent).unwrap_or(anchor_span).union(&desired);
            if !self.fits(parent, grown) {
                return Ok(false);
            }
            let index = self.model.children(parent).len();
            self.model.attach(single, parent, index)?;
            self.model.set_alignment(single, edge)?;
            self.model.set_current(parent, Some(grown));
            parent
        } else {
            let grown = anchor_span.union(&desired);
            if !self.fits(anchor, grown) {
                return Ok(false);
            }
            let group = self
                .model
                .new_group(IntervalKind::parallel(), Alignment::Leading)?;
            self.model.replace_interval(anchor, group)?;
            self.model.attach(anchor, group, 0)?;
            self.model.set_alignment(anchor, edge)?;
            self.model.attach(single, group, 1)?;
            self.model.set_alignment(single, edge)?;
            self.model.set_current(group, Some(grown));
            group
        };
        if edge == Alignment::Baseline {
            self.model.set_group_alignment(group, Alignment::Baseline)?;
        }
        self.grow_ancestors(group)?;
        Ok(true)
    }

    /// Whether `id` can take `grown` without running into a sequence
    /// neighbor.
    fn fits(&self, id: IntervalId, grown: Span) -> bool {
        let Some(parent) = self.model.parent(id) else {
            return true;
        };
        if !self.model.get(parent).is_some_and(|r| r.is_sequential()) {
            return true;
        }
        let children = self.model.children(parent);
        let index = children.iter().position(|c| *c == id).unwrap_or(0);
        let before = children[..index]
            .iter()
            .rev()
            .filter(|c| !self.model.is_gap(**c))
            .find_map(|c| self.content_of(*c));
        let after = children[index + 1..]
            .iter()
            .filter(|c| !self.model.is_gap(**c))
            .find_map(|c| self.content_of(*c));
        before.is_none_or(|b| b.end <= grown.start) && after.is_none_or(|a| a.start >= grown.end)
    }

    fn place_in_parallel(
        &mut self,
        group: IntervalId,
        single: IntervalId,
        axis: Axis,
        rect: Rect,
    ) -> Result<(), LayoutError> {
        let desired = rect.span(axis);
        let across = rect.span(axis.other());
        let mut row: Option<(IntervalId, i32)> = None;
        for child in self.model.children(group).to_vec() {
            if child == single {
                continue;
            }
            let overlap = self
                .extent(child, axis.other())
                .map_or(0, |e| e.overlap(&across));
            if overlap > 0 && row.is_none_or(|(_, best)| overlap > best) {
                row = Some((child, overlap));
            }
        }
        let Some((row, _)) = row else {
            return self.new_branch(group, single, desired);
        };
        let record = self.model.interval(row)?.clone();
        if record.is_sequential() {
            return self.place_in_sequence(row, single, axis, rect);
        }
        if record.is_parallel() && self.span_of(row).is_some_and(|s| s.intersects(&desired)) {
            return self.place_in_parallel(row, single, axis, rect);
        }
        let seq = self.wrap_in_sequence(row, group)?;
        self.place_in_sequence(seq, single, axis, rect)
    }

    fn new_branch(
        &mut self,
        group: IntervalId,
        single: IntervalId,
        desired: Span,
    ) -> Result<(), LayoutError> {
        let frame = self.span_of(group).unwrap_or(desired);
        let index = self.model.children(group).len();
        if self.model.parent(group).is_none() {
            let seq = self
                .model
                .new_group(IntervalKind::sequential(), Alignment::Leading)?;
            self.model.attach(seq, group, index)?;
            let mut at = 0;
            if desired.start > frame.start {
                let gap = self.model.new_gap(
                    IntervalSizes::fixed(desired.start - frame.start),
                    None,
                    Some(Span::new(frame.start, desired.start)),
                )?;
                self.model.attach(gap, seq, at)?;
                at += 1;
            }
            self.model.attach(single, seq, at)?;
            let trailing = self.model.new_gap(
                IntervalSizes::resizing(),
                None,
                Some(Span::new(desired.end, frame.end.max(desired.end))),
            )?;
            self.model.attach(trailing, seq, at + 1)?;
            self.model
                .set_current(seq, Some(Span::new(frame.start.min(desired.start), frame.end.max(desired.end))));
            return Ok(());
        }

        if desired.start <= frame.start {
            self.model.attach(single, group, index)?;
            self.model.set_alignment(single, Alignment::Leading)?;
        } else if desired.end == frame.end {
            self.model.attach(single, group, index)?;
            self.model.set_alignment(single, Alignment::Trailing)?;
        } else {
            let seq = self
                .model
                .new_group(IntervalKind::sequential(), Alignment::Leading)?;
            let gap = self.model.new_gap(
                IntervalSizes::fixed(desired.start - frame.start),
                None,
                Some(Span::new(frame.start, desired.start)),
            )?;
            self.model.attach(seq, group, index)?;
            self.model.attach(gap, seq, 0)?;
            self.model.attach(single, seq, 1)?;
            self.model
                .set_current(seq, Some(Span::new(frame.start, desired.end)));
        }
        self.model.set_current(group, Some(frame.union(&desired)));
        self.grow_ancestors(group)
    }

    /// Replace a parallel child with a sequence holding it, offset from the
    /// group's leading edge.
    fn wrap_in_sequence(&mut self, child: IntervalId, group: IntervalId) -> Result<IntervalId, LayoutError> {
        let child_span = self.span_of(child).unwrap_or_default();
        let frame = self.span_of(group).unwrap_or(child_span);
        let seq = self
            .model
            .new_group(IntervalKind::sequential(), Alignment::Leading)?;
        self.model.replace_interval(child, seq)?;
        let mut at = 0;
        if child_span.start > frame.start {
            let gap = self.model.new_gap(
                IntervalSizes::fixed(child_span.start - frame.start),
                None,
                Some(Span::new(frame.start, child_span.start)),
            )?;
            self.model.attach(gap, seq, at)?;
            at += 1;
        }
        self.model.attach(child, seq, at)?;
        self.model.set_alignment(child, Alignment::Leading)?;
        self.model
            .set_current(seq, Some(Span::new(frame.start.min(child_span.start), child_span.end)));
        Ok(seq)
    }

    fn place_in_sequence(
        &mut self,
        seq: IntervalId,
        single: IntervalId,
        axis: Axis,
        rect: Rect,
    ) -> Result<(), LayoutError> {
        let desired = rect.span(axis);
        let children = self.model.children(seq).to_vec();
        let overlapping: Vec<usize> = children
            .iter()
            .enumerate()
            .filter(|(_, c)| !self.model.is_gap(**c))
            .filter(|(_, c)| self.content_of(**c).is_some_and(|s| s.intersects(&desired)))
            .map(|(i, _)| i)
            .collect();
        match overlapping.as_slice() {
            [] => self.insert_in_slot(seq, single, desired),
            [only] => {
                let child = children[*only];
                if self.model.interval(child)?.is_parallel() {
                    self.place_in_parallel(child, single, axis, rect)
                } else {
                    self.wrap_parallel(seq, &children[*only..=*only], single, desired)
                }
            }
            [first, .., last] => self.wrap_parallel(seq, &children[*first..=*last], single, desired),
        }
    }

    /// Split the gap space between two sequence members around a new member.
    fn insert_in_slot(
        &mut self,
        seq: IntervalId,
        single: IntervalId,
        desired: Span,
    ) -> Result<(), LayoutError> {
        let children = self.model.children(seq).to_vec();
        let frame = self.span_of(seq).unwrap_or(desired);
        let next = children.iter().position(|c| {
            !self.model.is_gap(*c) && self.content_of(*c).is_some_and(|s| s.start >= desired.end)
        });
        let slot_end = next.unwrap_or(children.len());
        let prev = children[..slot_end].iter().rposition(|c| !self.model.is_gap(*c));
        let slot_start = prev.map_or(0, |i| i + 1);
        let slot = Span::new(
            prev.and_then(|i| self.content_of(children[i]))
                .map_or(frame.start.min(desired.start), |s| s.end),
            next.and_then(|i| self.content_of(children[i]))
                .map_or(frame.end.max(desired.end), |s| s.start),
        );
        let slot_gaps = &children[slot_start..slot_end];
        let resizing = slot_gaps.iter().any(|g| self.model.contains_resizing(*g));
        for gap in slot_gaps {
            self.model.destroy_subtree(*gap)?;
        }

        let lead_len = desired.start - slot.start;
        let trail_len = slot.end - desired.end;
        let trail_resizing = resizing && (next.is_none() || prev.is_some() && trail_len >= lead_len);
        let lead_resizing = resizing && !trail_resizing;
        let mut at = slot_start;
        if lead_len > 0 || lead_resizing {
            let gap = self.model.new_gap(
                gap_sizes((!lead_resizing).then_some(lead_len.max(0)), lead_resizing),
                None,
                Some(Span::new(slot.start, desired.start.max(slot.start))),
            )?;
            self.model.attach(gap, seq, at)?;
            at += 1;
        }
        self.model.attach(single, seq, at)?;
        if trail_len > 0 || trail_resizing {
            let gap = self.model.new_gap(
                gap_sizes((!trail_resizing).then_some(trail_len.max(0)), trail_resizing),
                None,
                Some(Span::new(desired.end, slot.end.max(desired.end))),
            )?;
            self.model.attach(gap, seq, at + 1)?;
        }
        if !frame.contains_span(&desired) {
            self.model.set_current(seq, Some(frame.union(&desired)));
            self.grow_ancestors(seq)?;
        }
        Ok(())
    }

    /// Put a contiguous run of sequence members in parallel with the new
    /// member.
    fn wrap_parallel(
        &mut self,
        seq: IntervalId,
        run: &[IntervalId],
        single: IntervalId,
        desired: Span,
    ) -> Result<(), LayoutError> {
        let Some(first) = run.first().copied() else {
            return Ok(());
        };
        let content = run
            .iter()
            .filter_map(|c| self.content_of(*c))
            .reduce(|a, b| a.union(&b))
            .unwrap_or(desired);
        let grown = content.union(&desired);
        let group = self
            .model
            .new_group(IntervalKind::parallel(), Alignment::Leading)?;
        let member = if let [only] = run {
            self.model.replace_interval(*only, group)?;
            *only
        } else {
            let index = self.model.index_in_parent(first).unwrap_or(0);
            let inner = self
                .model
                .new_group(IntervalKind::sequential(), Alignment::Leading)?;
            for (offset, child) in run.iter().enumerate() {
                let _ = self.model.detach(*child)?;
                self.model.attach(*child, inner, offset)?;
            }
            self.model.attach(group, seq, index)?;
            self.model.set_current(inner, Some(content));
            inner
        };
        self.attach_branch(group, member, content, grown)?;
        self.attach_branch(group, single, desired, grown)?;
        self.model.set_current(group, Some(grown));
        self.grow_ancestors(group)
    }

    /// Attach `item` to a parallel group whose span is `frame`, keeping the
    /// item at `span`.
    fn attach_branch(
        &mut self,
        group: IntervalId,
        item: IntervalId,
        span: Span,
        frame: Span,
    ) -> Result<(), LayoutError> {
        let index = self.model.children(group).len();
        if span.start == frame.start {
            self.model.attach(item, group, index)?;
            return self.model.set_alignment(item, Alignment::Leading);
        }
        if span.end == frame.end {
            self.model.attach(item, group, index)?;
            return self.model.set_alignment(item, Alignment::Trailing);
        }
        let offset = self.model.new_gap(
            IntervalSizes::fixed(span.start - frame.start),
            None,
            Some(Span::new(frame.start, span.start)),
        )?;
        let branch = if self.model.interval(item)?.is_sequential() {
            self.model.attach(offset, item, 0)?;
            item
        } else {
            let seq = self
                .model
                .new_group(IntervalKind::sequential(), Alignment::Leading)?;
            self.model.attach(offset, seq, 0)?;
            self.model.attach(item, seq, 1)?;
            seq
        };
        self.model.set_current(branch, Some(Span::new(frame.start, span.end)));
        self.model.attach(branch, group, index)?;
        self.model.set_alignment(branch, Alignment::Leading)
    }

    /// Propagate a grown span upward, refitting gaps in enclosing sequences.
    fn grow_ancestors(&mut self, id: IntervalId) -> Result<(), LayoutError> {
        let mut cur = id;
        while let Some(parent) = self.model.parent(cur) {
            if self.model.interval(parent)?.is_sequential() {
                self.fit_gaps(parent)?;
            }
            if self.model.parent(parent).is_none() {
                break;
            }
            let child = self.span_of(cur);
            let grown = match (self.model.current(parent), child) {
                (Some(p), Some(c)) => Some(p.union(&c)),
                (p, c) => p.or(c),
            };
            self.model.set_current(parent, grown);
            cur = parent;
        }
        Ok(())
    }

    /// Recompute the gaps of a sequence from the spans of its members.
    pub fn fit_gaps(&mut self, seq: IntervalId) -> Result<(), LayoutError> {
        let children = self.model.children(seq).to_vec();
        let Some(frame) = self.span_of(seq) else {
            return Ok(());
        };
        for (index, gap) in children.iter().enumerate() {
            if !self.model.is_gap(*gap) {
                continue;
            }
            let prev_end = children[..index]
                .iter()
                .rev()
                .filter(|c| !self.model.is_gap(**c))
                .find_map(|c| self.content_of(*c))
                .map_or(frame.start, |s| s.end);
            let next_start = children[index + 1..]
                .iter()
                .filter(|c| !self.model.is_gap(**c))
                .find_map(|c| self.content_of(*c))
                .map_or(frame.end, |s| s.start);
            let len = next_start - prev_end;
            if self.model.current(*gap).map(|s| s.len()) == Some(len) {
                continue;
            }
            let record = self.model.interval(*gap)?.clone();
            let stretches = record.is_resizing() && record.sizes.pref.is_default();
            if !stretches || len < 0 {
                self.model
                    .set_sizes(*gap, record.sizes.with_pref(SizeDef::Px(len.max(0))))?;
            }
            self.model
                .set_current(*gap, Some(Span::new(prev_end, prev_end + len.max(0))));
        }
        Ok(())
    }
}

impl Placer<'_> {
    /// Resize a component where it stands, without restructuring.
    ///
    /// The dragged edge moves to `span`; the opposite edge stays. Snapping to
    /// the preferred size returns the component to its default size, while a
    /// neighbor or container snap turns the gap on the dragged side into a
    /// default gap. Reaching the container border with a resizable component
    /// makes it stretch.
    pub fn resize(
        &mut self,
        component: &ComponentId,
        axis: Axis,
        span: Span,
        side: Edge,
        snap: Option<&SnapCandidate>,
    ) -> Result<(), LayoutError> {
        let interval = self.model.component_interval(component, axis)?;
        let Some(old) = self.model.current(interval) else {
            return Ok(());
        };
        let class = snap.map(|c| c.class);
        let record = self.model.interval(interval)?.clone();
        let pref = if class == Some(SnapClass::PreferredSize) {
            SizeDef::NotDefined
        } else {
            SizeDef::Px(span.len())
        };
        let stretches = class == Some(SnapClass::Container)
            && self.oracle.component_resizability(component)[axis.index()];
        let max = if stretches { SizeDef::Infinite } else { record.sizes.max };
        self.model.set_sizes(
            interval,
            IntervalSizes::new(record.sizes.min, pref, max),
        )?;
        self.model
            .set_explicit_size(component, axis, !pref.is_default())?;

        match side {
            Edge::Trailing => {
                self.model.propagate_size(interval, span.end - old.end);
            }
            Edge::Leading => {
                self.model.set_current(interval, Some(span));
                self.move_leading_edge(interval, span.start - old.start)?;
            }
        }

        let neighbor_gap = adjacent_gap(self.model, interval, side);
        if let Some(gap) = neighbor_gap
            && matches!(class, Some(SnapClass::NextTo | SnapClass::Container))
        {
            let gap_record = self.model.interval(gap)?.clone();
            let resizing = gap_record.is_resizing() && !stretches;
            self.model.set_sizes(
                gap,
                IntervalSizes::DEFAULT.with_resizing(resizing),
            )?;
            let padding = snap.and_then(|c| c.padding);
            self.model.set_gap_padding(gap, padding)?;
        }
        Ok(())
    }

    /// Keep the rest of the layout in place after the leading edge moved by
    /// `delta` (positive when the component shrinks).
    fn move_leading_edge(&mut self, interval: IntervalId, delta: i32) -> Result<(), LayoutError> {
        if delta == 0 {
            return Ok(());
        }
        let Some(span) = self.model.current(interval) else {
            return Ok(());
        };
        let Some(parent) = self.model.parent(interval) else {
            return Ok(());
        };
        if let Some(gap) = adjacent_gap(self.model, interval, Edge::Leading) {
            let record = self.model.interval(gap)?.clone();
            let len = self.model.current(gap).map_or(0, |s| s.len());
            let grown = (len + delta).max(0);
            self.model
                .set_sizes(gap, record.sizes.with_pref(SizeDef::Px(grown)))?;
            if let Some(gap_span) = self.model.current(gap) {
                self.model
                    .set_current(gap, Some(Span::with_len(gap_span.start, grown)));
            }
            return Ok(());
        }
        if delta < 0 {
            if let Some(parent_span) = self.model.current(parent)
                && span.start < parent_span.start
            {
                self.model.set_current(parent, Some(parent_span.union(&span)));
            }
            return Ok(());
        }
        let gap = self.model.new_gap(
            IntervalSizes::fixed(delta),
            None,
            Some(Span::new(span.start - delta, span.start)),
        )?;
        if self.model.interval(parent)?.is_sequential() {
            let index = self.model.index_in_parent(interval).unwrap_or(0);
            return self.model.attach(gap, parent, index);
        }
        let seq = self
            .model
            .new_group(IntervalKind::sequential(), Alignment::Leading)?;
        self.model.replace_interval(interval, seq)?;
        self.model.attach(gap, seq, 0)?;
        self.model.attach(interval, seq, 1)?;
        self.model
            .set_current(seq, Some(Span::new(span.start - delta, span.end)));
        Ok(())
    }
}

/// Gap directly before or after an interval in its sequence.
pub(crate) fn adjacent_gap(model: &LayoutModel, id: IntervalId, side: Edge) -> Option<IntervalId> {
    let parent = model.parent(id)?;
    if !model.get(parent)?.is_sequential() {
        return None;
    }
    let index = model.index_in_parent(id)?;
    let children = model.children(parent);
    let neighbor = match side {
        Edge::Leading => index.checked_sub(1).and_then(|i| children.get(i)),
        Edge::Trailing => children.get(index + 1),
    };
    neighbor.copied().filter(|g| model.is_gap(*g))
}
