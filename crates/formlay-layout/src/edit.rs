#![forbid(unsafe_code)]

//! Structural edits composed from the model primitives: building intervals,
//! taking them out of their parents with gap merging, and dissolving groups
//! that became degenerate.

use formlay_core::{Alignment, Axis, ComponentId, PaddingType, Span};
use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::interval::{IntervalId, IntervalKind, IntervalRecord, IntervalSizes, SizeDef};
use crate::model::LayoutModel;

/// What happens to the space an interval occupied in a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalMode {
    /// Neighboring gaps merge into one default gap; the space closes.
    CloseGap,
    /// An explicit gap spanning the removed extent stays behind.
    KeepSpace,
}

impl LayoutModel {
    /// Create a detached gap.
    pub fn new_gap(
        &mut self,
        sizes: IntervalSizes,
        padding: Option<PaddingType>,
        current: Option<Span>,
    ) -> Result<IntervalId, LayoutError> {
        let id = self.create_interval(IntervalKind::Gap { padding }, sizes, Alignment::Leading)?;
        self.set_current(id, current);
        Ok(id)
    }

    /// Create a detached group of the given kind.
    pub fn new_group(
        &mut self,
        kind: IntervalKind,
        alignment: Alignment,
    ) -> Result<IntervalId, LayoutError> {
        self.create_interval(kind, IntervalSizes::DEFAULT, alignment)
    }

    /// Create a detached single for a component and link it on the axis.
    pub fn new_single(
        &mut self,
        component: &ComponentId,
        axis: Axis,
        sizes: IntervalSizes,
        current: Option<Span>,
    ) -> Result<IntervalId, LayoutError> {
        let id = self.create_interval(
            IntervalKind::Single {
                component: component.clone(),
            },
            sizes,
            Alignment::Leading,
        )?;
        self.set_current(id, current);
        self.set_component_interval(component, axis, Some(id))?;
        Ok(id)
    }

    #[must_use]
    pub fn is_gap(&self, id: IntervalId) -> bool {
        self.get(id).is_some_and(|r| r.is_gap())
    }

    /// Whether the interval or anything inside it can grow.
    #[must_use]
    pub fn contains_resizing(&self, id: IntervalId) -> bool {
        let Some(record) = self.get(id) else {
            return false;
        };
        if record.is_group() {
            record.children().iter().any(|c| self.contains_resizing(*c))
        } else {
            record.is_resizing()
        }
    }

    /// Whether a non-gap descendant can grow.
    #[must_use]
    pub fn content_resizing(&self, id: IntervalId) -> bool {
        let Some(record) = self.get(id) else {
            return false;
        };
        match &record.kind {
            IntervalKind::Gap { .. } => false,
            IntervalKind::Single { .. } => record.is_resizing(),
            IntervalKind::Sequential { children } | IntervalKind::Parallel { children, .. } => {
                children.iter().any(|c| self.content_resizing(*c))
            }
        }
    }

    /// Extent covered by the components inside an interval, from built spans.
    #[must_use]
    pub fn content_span(&self, id: IntervalId) -> Option<Span> {
        let record = self.get(id)?;
        match &record.kind {
            IntervalKind::Single { .. } => record.current,
            IntervalKind::Gap { .. } => None,
            IntervalKind::Sequential { children } | IntervalKind::Parallel { children, .. } => {
                children
                    .iter()
                    .filter_map(|c| self.content_span(*c))
                    .reduce(|a, b| a.union(&b))
            }
        }
    }

    /// Components inside an interval, in tree order.
    #[must_use]
    pub fn components_in(&self, id: IntervalId) -> Vec<ComponentId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            let Some(record) = self.get(cur) else {
                continue;
            };
            if let Some(component) = record.component() {
                out.push(component.clone());
            }
            stack.extend(record.children().iter().rev());
        }
        out
    }

    /// Put `new` (detached) where `old` is; `old` ends up detached.
    pub fn replace_interval(&mut self, old: IntervalId, new: IntervalId) -> Result<(), LayoutError> {
        let alignment = self.interval(old)?.alignment;
        let Some((parent, index)) = self.detach(old)? else {
            return Ok(());
        };
        self.attach(new, parent, index)?;
        self.set_alignment(new, alignment)
    }

    /// Detach and free an interval with everything below it, unlinking the
    /// components it represented.
    pub fn destroy_subtree(&mut self, id: IntervalId) -> Result<(), LayoutError> {
        let _ = self.detach(id)?;
        for child in self.children(id).to_vec() {
            self.destroy_subtree(child)?;
        }
        if let Some(component) = self.interval(id)?.component().cloned()
            && let Ok(record) = self.layout_component(&component)
        {
            let axes: Vec<Axis> = Axis::ALL
                .into_iter()
                .filter(|axis| record.interval(*axis) == Some(id))
                .collect();
            for axis in axes {
                self.set_component_interval(&component, axis, None)?;
            }
        }
        self.destroy_interval(id)
    }

    /// Detach an interval from its parent and heal the parent.
    ///
    /// In a sequence, the gaps next to the interval merge into one gap whose
    /// resizing flag is the OR of theirs. A sequence left without components
    /// is removed in turn, and groups left with one child dissolve. The
    /// interval itself is detached but not destroyed.
    pub fn take_out(&mut self, id: IntervalId, mode: RemovalMode) -> Result<(), LayoutError> {
        let Some(parent) = self.parent(id) else {
            return Ok(());
        };
        let parent_is_root = self.parent(parent).is_none();
        if !self.interval(parent)?.is_sequential() {
            let _ = self.detach(id)?;
            if !parent_is_root {
                if self.children(parent).is_empty() {
                    self.take_out(parent, mode)?;
                    self.destroy_interval(parent)?;
                } else {
                    let _ = self.dissolve_if_degenerate(parent)?;
                }
            }
            return Ok(());
        }

        let children = self.children(parent).to_vec();
        let index = self.index_in_parent(id).unwrap_or(0);
        let removed_span = self.current(id);
        let removed_resizing = self.contains_resizing(id);
        let leading_gap = index
            .checked_sub(1)
            .map(|i| children[i])
            .filter(|c| self.is_gap(*c));
        let trailing_gap = children.get(index + 1).copied().filter(|c| self.is_gap(*c));
        let others = children
            .iter()
            .filter(|c| **c != id && !self.is_gap(**c))
            .count();
        let _ = self.detach(id)?;

        if others == 0 {
            for gap in self.children(parent).to_vec() {
                self.destroy_subtree(gap)?;
            }
            if parent_is_root {
                return Ok(());
            }
            self.take_out(parent, mode)?;
            return self.destroy_interval(parent);
        }

        let gaps: Vec<IntervalId> = [leading_gap, trailing_gap].into_iter().flatten().collect();
        let gaps_resizing = gaps.iter().any(|g| self.contains_resizing(*g));
        let padding = gaps.iter().find_map(|g| match self.get(*g).map(|r| &r.kind) {
            Some(IntervalKind::Gap { padding }) => *padding,
            _ => None,
        });
        let mut covered = removed_span;
        for gap in &gaps {
            if let Some(span) = self.current(*gap) {
                covered = Some(covered.map_or(span, |c| c.union(&span)));
            }
        }
        let merged = match mode {
            RemovalMode::KeepSpace => Some(
                IntervalSizes::fixed(covered.map_or(0, |s| s.len()))
                    .with_resizing(gaps_resizing || removed_resizing),
            ),
            RemovalMode::CloseGap if gaps.is_empty() => None,
            RemovalMode::CloseGap => Some(IntervalSizes::DEFAULT.with_resizing(gaps_resizing)),
        };
        let insert_at = if leading_gap.is_some() { index - 1 } else { index };
        for gap in gaps {
            self.destroy_subtree(gap)?;
        }
        if let Some(sizes) = merged {
            let gap = self.new_gap(sizes, padding, covered)?;
            self.attach(gap, parent, insert_at)?;
        }
        let _ = self.dissolve_if_degenerate(parent)?;
        Ok(())
    }

    /// Remove a group that no longer carries structure: a parallel group or
    /// sequence with a single child is replaced by that child, a sequence
    /// directly inside a sequence is spliced into it, and groups without
    /// components are removed. Roots are never dissolved.
    pub fn dissolve_if_degenerate(&mut self, group: IntervalId) -> Result<bool, LayoutError> {
        let record = self.interval(group)?.clone();
        let Some(parent) = record.parent else {
            return Ok(false);
        };
        if !record.is_group() {
            return Ok(false);
        }
        let children = record.children().to_vec();
        let has_content = children.iter().any(|c| !self.is_gap(*c));
        if !has_content {
            for child in children {
                self.destroy_subtree(child)?;
            }
            self.take_out(group, RemovalMode::CloseGap)?;
            self.destroy_interval(group)?;
            return Ok(true);
        }
        let parent_is_sequential = self.interval(parent)?.is_sequential();
        if children.len() == 1 {
            self.promote_only_child(group, children[0])?;
            return Ok(true);
        }
        if record.is_sequential() && parent_is_sequential {
            self.splice_into_parent(group)?;
            return Ok(true);
        }
        Ok(false)
    }

    fn promote_only_child(&mut self, group: IntervalId, child: IntervalId) -> Result<(), LayoutError> {
        let alignment = self.interval(group)?.alignment;
        let _ = self.detach(child)?;
        let Some((parent, index)) = self.detach(group)? else {
            return Ok(());
        };
        self.destroy_interval(group)?;
        self.attach(child, parent, index)?;
        self.set_alignment(child, alignment)?;
        if self.interval(child)?.is_sequential() && self.interval(parent)?.is_sequential() {
            self.splice_into_parent(child)?;
        }
        Ok(())
    }

    fn splice_into_parent(&mut self, seq: IntervalId) -> Result<(), LayoutError> {
        let Some((parent, index)) = self.detach(seq)? else {
            return Ok(());
        };
        let children = self.children(seq).to_vec();
        for (offset, child) in children.into_iter().enumerate() {
            let _ = self.detach(child)?;
            self.attach(child, parent, index + offset)?;
        }
        self.destroy_interval(seq)?;
        let _ = self.merge_adjacent_gaps(parent)?;
        Ok(())
    }

    /// Merge every run of consecutive gaps in a sequence into one gap.
    pub fn merge_adjacent_gaps(&mut self, seq: IntervalId) -> Result<bool, LayoutError> {
        let mut merged_any = false;
        loop {
            let children = self.children(seq).to_vec();
            let Some(pair) = children
                .windows(2)
                .find(|pair| self.is_gap(pair[0]) && self.is_gap(pair[1]))
                .map(|pair| (pair[0], pair[1]))
            else {
                break;
            };
            let (first, second) = pair;
            let a = self.interval(first)?.clone();
            let b = self.interval(second)?.clone();
            let len_of = |sizes: &IntervalSizes, span: Option<Span>| {
                sizes.pref.px().or_else(|| span.map(|s| s.len())).unwrap_or(0)
            };
            let pref = match (a.sizes.pref, b.sizes.pref) {
                (SizeDef::NotDefined, SizeDef::NotDefined) => SizeDef::NotDefined,
                _ => SizeDef::Px(len_of(&a.sizes, a.current) + len_of(&b.sizes, b.current)),
            };
            let resizing = a.is_resizing() || b.is_resizing();
            let span = match (a.current, b.current) {
                (Some(x), Some(y)) => Some(x.union(&y)),
                (x, y) => x.or(y),
            };
            self.destroy_subtree(second)?;
            self.set_sizes(
                first,
                IntervalSizes::new(SizeDef::NotDefined, pref, SizeDef::NotDefined)
                    .with_resizing(resizing),
            )?;
            self.set_current(first, span);
            merged_any = true;
        }
        Ok(merged_any)
    }

    /// Remove a component from the model.
    ///
    /// With `close_gap` the surrounding gaps merge and the space closes;
    /// otherwise an explicit gap keeps the space. Members of a removed
    /// container are removed with it.
    pub fn remove_component(&mut self, id: &ComponentId, close_gap: bool) -> Result<(), LayoutError> {
        let component = self.layout_component(id)?.clone();
        for member in &component.sub_components {
            self.remove_component(member, close_gap)?;
        }
        let mode = if close_gap {
            RemovalMode::CloseGap
        } else {
            RemovalMode::KeepSpace
        };
        for axis in Axis::ALL {
            let _ = self.take_out_component(id, axis, mode)?;
        }
        if let Some(roots) = component.roots {
            for root in roots {
                self.destroy_subtree(root)?;
            }
        }
        self.unregister(id)
    }

    /// Take a component's interval out of its tree on one axis and free it.
    ///
    /// Returns the freed record, or `None` when the component was not placed
    /// on the axis.
    pub fn take_out_component(
        &mut self,
        id: &ComponentId,
        axis: Axis,
        mode: RemovalMode,
    ) -> Result<Option<IntervalRecord>, LayoutError> {
        let Some(interval) = self.layout_component(id)?.interval(axis) else {
            return Ok(None);
        };
        let record = self.interval(interval)?.clone();
        self.take_out(interval, mode)?;
        self.set_component_interval(id, axis, None)?;
        self.destroy_interval(interval)?;
        Ok(Some(record))
    }

    /// Remove several components, in the given order.
    pub fn remove_components(&mut self, ids: &[ComponentId], close_gap: bool) -> Result<(), LayoutError> {
        for id in ids {
            self.remove_component(id, close_gap)?;
        }
        Ok(())
    }
}
