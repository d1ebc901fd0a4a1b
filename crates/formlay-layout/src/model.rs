#![forbid(unsafe_code)]

//! The layout model: interval arena, component registry and change log.
//!
//! All mutation funnels through [`LayoutModel::apply`], which performs one
//! [`Change`] and journals it when recording is enabled. Higher-level edits
//! (see `edit.rs`) are compositions of these primitives, which is what makes
//! `undo` exact.

use std::collections::BTreeMap;

use formlay_core::{Alignment, Axis, ComponentId, PaddingType, Span};
use serde::{Deserialize, Serialize};

use crate::change::{Change, ChangeLog, ChangeMark};
use crate::error::LayoutError;
use crate::interval::{IntervalId, IntervalKind, IntervalRecord, IntervalSizes, SizeDef};

/// Registry entry for one component (or container).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutComponent {
    pub id: ComponentId,
    /// Owning layout container.
    pub parent: Option<ComponentId>,
    /// Interval per axis in the parent's trees, once placed.
    pub intervals: [Option<IntervalId>; 2],
    pub explicit_size: [bool; 2],
    /// Tree roots per axis when this component is a layout container.
    pub roots: Option<[IntervalId; 2]>,
    /// Members of this container in registration order.
    pub sub_components: Vec<ComponentId>,
}

impl LayoutComponent {
    fn new(id: ComponentId) -> Self {
        Self {
            id,
            parent: None,
            intervals: [None, None],
            explicit_size: [false, false],
            roots: None,
            sub_components: Vec::new(),
        }
    }

    #[must_use]
    pub const fn interval(&self, axis: Axis) -> Option<IntervalId> {
        self.intervals[axis.index()]
    }

    #[must_use]
    pub const fn has_explicit_size(&self, axis: Axis) -> bool {
        self.explicit_size[axis.index()]
    }

    #[must_use]
    pub const fn is_container(&self) -> bool {
        self.roots.is_some()
    }

    #[must_use]
    pub fn root(&self, axis: Axis) -> Option<IntervalId> {
        self.roots.map(|roots| roots[axis.index()])
    }
}

/// Structural copy of the model used for rollback. Excludes the change log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSnapshot {
    intervals: BTreeMap<IntervalId, IntervalRecord>,
    components: BTreeMap<ComponentId, LayoutComponent>,
    next_id: IntervalId,
}

/// Owner of every interval tree and component record.
#[derive(Debug, Clone, Default)]
pub struct LayoutModel {
    intervals: BTreeMap<IntervalId, IntervalRecord>,
    components: BTreeMap<ComponentId, LayoutComponent>,
    next_id: IntervalId,
    log: ChangeLog,
    revision: u64,
}

impl LayoutModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Queries -----------------------------------------------------------

    /// Monotonic counter bumped by every applied change.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    pub fn layout_component(&self, id: &ComponentId) -> Result<&LayoutComponent, LayoutError> {
        self.components
            .get(id)
            .ok_or_else(|| LayoutError::NotFound {
                component: id.clone(),
            })
    }

    #[must_use]
    pub fn contains_component(&self, id: &ComponentId) -> bool {
        self.components.contains_key(id)
    }

    pub fn components(&self) -> impl Iterator<Item = &LayoutComponent> {
        self.components.values()
    }

    /// Registered layout containers in id order.
    pub fn containers(&self) -> impl Iterator<Item = &LayoutComponent> {
        self.components.values().filter(|c| c.is_container())
    }

    pub fn interval(&self, id: IntervalId) -> Result<&IntervalRecord, LayoutError> {
        self.intervals
            .get(&id)
            .ok_or(LayoutError::IntervalNotFound { id: id.get() })
    }

    #[must_use]
    pub fn get(&self, id: IntervalId) -> Option<&IntervalRecord> {
        self.intervals.get(&id)
    }

    pub fn intervals(&self) -> impl Iterator<Item = &IntervalRecord> {
        self.intervals.values()
    }

    /// The interval representing a component on an axis.
    pub fn component_interval(&self, id: &ComponentId, axis: Axis) -> Result<IntervalId, LayoutError> {
        self.layout_component(id)?
            .interval(axis)
            .ok_or_else(|| LayoutError::NotPlaced {
                component: id.clone(),
                axis,
            })
    }

    pub fn root(&self, container: &ComponentId, axis: Axis) -> Result<IntervalId, LayoutError> {
        self.layout_component(container)?
            .root(axis)
            .ok_or_else(|| LayoutError::NotAContainer {
                component: container.clone(),
            })
    }

    #[must_use]
    pub fn parent(&self, id: IntervalId) -> Option<IntervalId> {
        self.intervals.get(&id).and_then(|r| r.parent)
    }

    #[must_use]
    pub fn children(&self, id: IntervalId) -> &[IntervalId] {
        self.intervals.get(&id).map_or(&[], IntervalRecord::children)
    }

    #[must_use]
    pub fn index_in_parent(&self, id: IntervalId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    #[must_use]
    pub fn current(&self, id: IntervalId) -> Option<Span> {
        self.intervals.get(&id).and_then(|r| r.current)
    }

    /// Topmost ancestor of an interval.
    #[must_use]
    pub fn root_of(&self, id: IntervalId) -> IntervalId {
        let mut cur = id;
        while let Some(parent) = self.parent(cur) {
            cur = parent;
        }
        cur
    }

    /// Container and axis whose tree holds the interval.
    #[must_use]
    pub fn tree_of(&self, id: IntervalId) -> Option<(ComponentId, Axis)> {
        let root = self.root_of(id);
        self.containers().find_map(|c| {
            Axis::ALL
                .into_iter()
                .find(|axis| c.root(*axis) == Some(root))
                .map(|axis| (c.id.clone(), axis))
        })
    }

    pub fn has_explicit_size(&self, id: &ComponentId, axis: Axis) -> Result<bool, LayoutError> {
        Ok(self.layout_component(id)?.has_explicit_size(axis))
    }

    pub fn is_component_resizing(&self, id: &ComponentId, axis: Axis) -> Result<bool, LayoutError> {
        let interval = self.component_interval(id, axis)?;
        Ok(self.interval(interval)?.is_resizing())
    }

    /// Alignment of the component inside its parallel parent, if it has one.
    pub fn component_alignment(
        &self,
        id: &ComponentId,
        axis: Axis,
    ) -> Result<Option<Alignment>, LayoutError> {
        let interval = self.component_interval(id, axis)?;
        let record = self.interval(interval)?;
        Ok(record
            .parent
            .and_then(|p| self.get(p))
            .filter(|p| p.is_parallel())
            .map(|_| record.alignment))
    }

    // --- Snapshots ---------------------------------------------------------

    #[must_use]
    pub fn snapshot(&self) -> ModelSnapshot {
        ModelSnapshot {
            intervals: self.intervals.clone(),
            components: self.components.clone(),
            next_id: self.next_id,
        }
    }

    /// Replace the structure with a snapshot. Not journaled.
    pub fn restore(&mut self, snapshot: ModelSnapshot) {
        self.intervals = snapshot.intervals;
        self.components = snapshot.components;
        self.next_id = snapshot.next_id;
        self.revision += 1;
    }

    // --- Change log --------------------------------------------------------

    pub fn set_change_recording(&mut self, enabled: bool) {
        self.log.recording = enabled;
    }

    #[must_use]
    pub const fn is_change_recording(&self) -> bool {
        self.log.recording
    }

    #[must_use]
    pub fn change_mark(&self) -> ChangeMark {
        self.log.mark()
    }

    /// Forget changes recorded after `mark` without reverting them. Used
    /// after the structure was restored to a snapshot taken at `mark`.
    pub fn discard_changes_since(&mut self, mark: ChangeMark) {
        self.log.entries.truncate(mark.position());
    }

    /// Changes recorded since `mark`.
    #[must_use]
    pub fn changes_since(&self, mark: ChangeMark) -> &[Change] {
        self.log.entries.get(mark.position()..).unwrap_or(&[])
    }

    /// Revert every change recorded between the two marks.
    ///
    /// `to` must be the current end of the log; batches unwind newest first.
    /// Returns `false` when the range was empty. The reverted batch can be
    /// re-applied with [`redo`].
    ///
    /// [`redo`]: LayoutModel::redo
    pub fn undo(&mut self, from: ChangeMark, to: ChangeMark) -> Result<bool, LayoutError> {
        let len = self.log.entries.len();
        let batch = self
            .log
            .take_range(from.position(), to.position())
            .ok_or(LayoutError::InvalidChangeMark {
                from: from.position(),
                to: to.position(),
                len,
            })?;
        if batch.is_empty() {
            return Ok(false);
        }
        for change in batch.iter().rev() {
            self.apply_unlogged(&change.inverse())?;
        }
        self.log.redo.push(batch);
        Ok(true)
    }

    /// Re-apply the most recently undone batch.
    pub fn redo(&mut self) -> Result<(), LayoutError> {
        let batch = self.log.redo.pop().ok_or(LayoutError::NothingToRedo)?;
        let redo = std::mem::take(&mut self.log.redo);
        for change in batch {
            self.apply(change)?;
        }
        self.log.redo = redo;
        Ok(())
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.log.redo.is_empty()
    }

    // --- Primitive edits ---------------------------------------------------

    /// Perform one change and journal it.
    pub fn apply(&mut self, change: Change) -> Result<(), LayoutError> {
        self.apply_unlogged(&change)?;
        self.log.record(change);
        Ok(())
    }

    fn apply_unlogged(&mut self, change: &Change) -> Result<(), LayoutError> {
        self.revision += 1;
        match change {
            Change::CreateInterval { record } => {
                if record.id >= self.next_id {
                    self.next_id = record.id.next();
                }
                let _ = self.intervals.insert(record.id, record.clone());
            }
            Change::DestroyInterval { record } => {
                let _ = self.intervals.remove(&record.id);
            }
            Change::Attach {
                child,
                parent,
                index,
            } => {
                let children = self
                    .record_mut(*parent)?
                    .children_mut()
                    .ok_or(LayoutError::IntervalNotFound { id: parent.get() })?;
                let index = (*index).min(children.len());
                children.insert(index, *child);
                self.record_mut(*child)?.parent = Some(*parent);
            }
            Change::Detach { child, parent, .. } => {
                if let Some(children) = self.record_mut(*parent)?.children_mut() {
                    children.retain(|c| c != child);
                }
                self.record_mut(*child)?.parent = None;
            }
            Change::SetSizes { id, after, .. } => self.record_mut(*id)?.sizes = *after,
            Change::SetAlignment { id, after, .. } => self.record_mut(*id)?.alignment = *after,
            Change::SetGroupAlignment { id, after, .. } => {
                if let IntervalKind::Parallel {
                    group_alignment, ..
                } = &mut self.record_mut(*id)?.kind
                {
                    *group_alignment = *after;
                }
            }
            Change::SetGapPadding { id, after, .. } => {
                if let IntervalKind::Gap { padding } = &mut self.record_mut(*id)?.kind {
                    *padding = *after;
                }
            }
            Change::SetExplicitSize {
                component,
                axis,
                after,
                ..
            } => self.component_mut(component)?.explicit_size[axis.index()] = *after,
            Change::SetComponentInterval {
                component,
                axis,
                after,
                ..
            } => self.component_mut(component)?.intervals[axis.index()] = *after,
            Change::RegisterComponent { component } => {
                let _ = self
                    .components
                    .insert(component.id.clone(), component.clone());
            }
            Change::UnregisterComponent { component } => {
                let _ = self.components.remove(&component.id);
            }
            Change::SetMembership {
                component,
                before,
                after,
            } => {
                if let Some((old_parent, _)) = before {
                    self.component_mut(old_parent)?
                        .sub_components
                        .retain(|c| c != component);
                }
                if let Some((new_parent, index)) = after {
                    let members = &mut self.component_mut(new_parent)?.sub_components;
                    let index = (*index).min(members.len());
                    members.insert(index, component.clone());
                }
                self.component_mut(component)?.parent = after.as_ref().map(|(p, _)| p.clone());
            }
        }
        Ok(())
    }

    fn record_mut(&mut self, id: IntervalId) -> Result<&mut IntervalRecord, LayoutError> {
        self.intervals
            .get_mut(&id)
            .ok_or(LayoutError::IntervalNotFound { id: id.get() })
    }

    fn component_mut(&mut self, id: &ComponentId) -> Result<&mut LayoutComponent, LayoutError> {
        self.components
            .get_mut(id)
            .ok_or_else(|| LayoutError::NotFound {
                component: id.clone(),
            })
    }

    /// Allocate a detached, childless interval.
    pub fn create_interval(
        &mut self,
        kind: IntervalKind,
        sizes: IntervalSizes,
        alignment: Alignment,
    ) -> Result<IntervalId, LayoutError> {
        let id = self.next_id;
        let mut record = IntervalRecord::new(id, kind, sizes);
        record.alignment = alignment;
        if let Some(children) = record.children_mut() {
            children.clear();
        }
        self.apply(Change::CreateInterval { record })?;
        Ok(id)
    }

    /// Free a detached, childless interval.
    pub fn destroy_interval(&mut self, id: IntervalId) -> Result<(), LayoutError> {
        let record = self.interval(id)?.clone();
        debug_assert!(record.parent.is_none(), "destroying attached interval");
        debug_assert!(record.children().is_empty(), "destroying non-empty group");
        self.apply(Change::DestroyInterval { record })
    }

    pub fn attach(
        &mut self,
        child: IntervalId,
        parent: IntervalId,
        index: usize,
    ) -> Result<(), LayoutError> {
        debug_assert!(self.parent(child).is_none(), "attaching attached interval");
        let index = index.min(self.interval(parent)?.children().len());
        self.apply(Change::Attach {
            child,
            parent,
            index,
        })
    }

    /// Detach an interval from its parent, returning where it was.
    pub fn detach(&mut self, child: IntervalId) -> Result<Option<(IntervalId, usize)>, LayoutError> {
        let Some(parent) = self.interval(child)?.parent else {
            return Ok(None);
        };
        let index = self
            .children(parent)
            .iter()
            .position(|c| *c == child)
            .ok_or(LayoutError::IntervalNotFound { id: child.get() })?;
        self.apply(Change::Detach {
            child,
            parent,
            index,
        })?;
        Ok(Some((parent, index)))
    }

    pub fn set_sizes(&mut self, id: IntervalId, sizes: IntervalSizes) -> Result<(), LayoutError> {
        let before = self.interval(id)?.sizes;
        if before == sizes {
            return Ok(());
        }
        self.apply(Change::SetSizes {
            id,
            before,
            after: sizes,
        })
    }

    pub fn set_alignment(&mut self, id: IntervalId, alignment: Alignment) -> Result<(), LayoutError> {
        let before = self.interval(id)?.alignment;
        if before == alignment {
            return Ok(());
        }
        self.apply(Change::SetAlignment {
            id,
            before,
            after: alignment,
        })
    }

    pub fn set_group_alignment(
        &mut self,
        id: IntervalId,
        alignment: Alignment,
    ) -> Result<(), LayoutError> {
        let Some(before) = self.interval(id)?.group_alignment() else {
            return Ok(());
        };
        if before == alignment {
            return Ok(());
        }
        self.apply(Change::SetGroupAlignment {
            id,
            before,
            after: alignment,
        })
    }

    pub fn set_gap_padding(
        &mut self,
        id: IntervalId,
        padding: Option<PaddingType>,
    ) -> Result<(), LayoutError> {
        let IntervalKind::Gap { padding: before } = self.interval(id)?.kind else {
            return Ok(());
        };
        if before == padding {
            return Ok(());
        }
        self.apply(Change::SetGapPadding {
            id,
            before,
            after: padding,
        })
    }

    pub fn set_explicit_size(
        &mut self,
        component: &ComponentId,
        axis: Axis,
        explicit: bool,
    ) -> Result<(), LayoutError> {
        let before = self.has_explicit_size(component, axis)?;
        if before == explicit {
            return Ok(());
        }
        self.apply(Change::SetExplicitSize {
            component: component.clone(),
            axis,
            before,
            after: explicit,
        })
    }

    pub fn set_component_interval(
        &mut self,
        component: &ComponentId,
        axis: Axis,
        interval: Option<IntervalId>,
    ) -> Result<(), LayoutError> {
        let before = self.layout_component(component)?.interval(axis);
        if before == interval {
            return Ok(());
        }
        self.apply(Change::SetComponentInterval {
            component: component.clone(),
            axis,
            before,
            after: interval,
        })
    }

    /// Move a component into another container's member list (or out of all).
    pub fn set_membership(
        &mut self,
        component: &ComponentId,
        container: Option<&ComponentId>,
    ) -> Result<(), LayoutError> {
        let current = self.layout_component(component)?.parent.clone();
        if current.as_ref() == container {
            return Ok(());
        }
        let before = match current {
            Some(parent) => {
                let index = self
                    .layout_component(&parent)?
                    .sub_components
                    .iter()
                    .position(|c| c == component)
                    .unwrap_or(0);
                Some((parent, index))
            }
            None => None,
        };
        let after = match container {
            Some(parent) => {
                let target = self.layout_component(parent)?;
                if !target.is_container() {
                    return Err(LayoutError::NotAContainer {
                        component: parent.clone(),
                    });
                }
                Some((parent.clone(), target.sub_components.len()))
            }
            None => None,
        };
        self.apply(Change::SetMembership {
            component: component.clone(),
            before,
            after,
        })
    }

    /// Update the last built extent of an interval. Not journaled.
    pub fn set_current(&mut self, id: IntervalId, span: Option<Span>) {
        if let Some(record) = self.intervals.get_mut(&id) {
            record.current = span;
        }
    }

    // --- Registry ----------------------------------------------------------

    /// Register a layout container with empty roots on both axes.
    pub fn add_container(
        &mut self,
        id: &ComponentId,
        parent: Option<&ComponentId>,
    ) -> Result<(), LayoutError> {
        if self.components.contains_key(id) {
            return Err(LayoutError::DuplicateComponent { component: id.clone() });
        }
        let horizontal =
            self.create_interval(IntervalKind::parallel(), IntervalSizes::DEFAULT, Alignment::Leading)?;
        let vertical =
            self.create_interval(IntervalKind::parallel(), IntervalSizes::DEFAULT, Alignment::Leading)?;
        let mut record = LayoutComponent::new(id.clone());
        record.roots = Some([horizontal, vertical]);
        self.apply(Change::RegisterComponent { component: record })?;
        if let Some(parent) = parent {
            self.set_membership(id, Some(parent))?;
        }
        Ok(())
    }

    /// Register a plain component as a member of `container`, not yet placed.
    pub fn add_component(
        &mut self,
        id: &ComponentId,
        container: &ComponentId,
    ) -> Result<(), LayoutError> {
        if self.components.contains_key(id) {
            return Err(LayoutError::DuplicateComponent { component: id.clone() });
        }
        if !self.layout_component(container)?.is_container() {
            return Err(LayoutError::NotAContainer {
                component: container.clone(),
            });
        }
        self.apply(Change::RegisterComponent {
            component: LayoutComponent::new(id.clone()),
        })?;
        self.set_membership(id, Some(container))
    }

    /// Drop a component from the registry. Its intervals must already be gone.
    pub(crate) fn unregister(&mut self, id: &ComponentId) -> Result<(), LayoutError> {
        self.set_membership(id, None)?;
        let component = self.layout_component(id)?.clone();
        self.apply(Change::UnregisterComponent { component })
    }

    /// Change a component's alignment within its parallel parent.
    pub fn adjust_component_alignment(
        &mut self,
        id: &ComponentId,
        axis: Axis,
        alignment: Alignment,
    ) -> Result<(), LayoutError> {
        let interval = self.component_interval(id, axis)?;
        let parent_is_parallel = self
            .parent(interval)
            .and_then(|p| self.get(p))
            .is_some_and(IntervalRecord::is_parallel);
        let baseline_on_horizontal = alignment == Alignment::Baseline && axis == Axis::Horizontal;
        if !parent_is_parallel || baseline_on_horizontal {
            return Err(LayoutError::InvalidAlignment {
                component: id.clone(),
                axis,
                alignment,
            });
        }
        self.set_alignment(interval, alignment)
    }

    /// Override an interval's preferred size.
    ///
    /// `None` returns the interval to its default size. When the interval is a
    /// component and `pin_explicit` is set, the component is marked as having
    /// an explicit size on the axis. The new extent is propagated through the
    /// ancestors' last built spans.
    pub fn set_user_interval_size(
        &mut self,
        id: IntervalId,
        axis: Axis,
        size: Option<i32>,
        pin_explicit: bool,
    ) -> Result<(), LayoutError> {
        let record = self.interval(id)?.clone();
        let pref = size.map_or(SizeDef::NotDefined, SizeDef::Px);
        self.set_sizes(id, record.sizes.with_pref(pref))?;
        if let Some(component) = record.component() {
            let explicit = size.is_some() && pin_explicit;
            if explicit || size.is_none() {
                self.set_explicit_size(component, axis, explicit)?;
            }
        }
        if let (Some(size), Some(span)) = (size, record.current) {
            self.propagate_size(id, size - span.len());
        }
        Ok(())
    }

    /// Grow an interval's built span by `delta` and push the change upward:
    /// later siblings in sequences shift, parallel ancestors grow to fit.
    /// Groups without a built span still pass the change on.
    pub fn propagate_size(&mut self, id: IntervalId, delta: i32) {
        if delta == 0 {
            return;
        }
        let old_end = self.current(id).map(|span| {
            self.set_current(id, Some(Span::new(span.start, span.end + delta)));
            span.end
        });
        let Some(parent) = self.parent(id) else {
            return;
        };
        let parent_delta = if self.get(parent).is_some_and(IntervalRecord::is_sequential) {
            let index = self.index_in_parent(id).unwrap_or(0);
            let later: Vec<IntervalId> = self.children(parent)[index + 1..].to_vec();
            for sibling in later {
                self.shift_subtree(sibling, delta);
            }
            delta
        } else {
            match (old_end, self.current(parent)) {
                (None, _) => 0,
                (Some(end), Some(parent_span)) => {
                    (end + delta).max(parent_span.end) - parent_span.end
                }
                (Some(end), None) => {
                    let others = self
                        .children(parent)
                        .iter()
                        .filter(|&&child| child != id)
                        .filter_map(|&child| self.current(child))
                        .map(|span| span.end)
                        .max()
                        .unwrap_or(end);
                    (end + delta).max(others) - end.max(others)
                }
            }
        };
        if self.parent(parent).is_some() {
            self.propagate_size(parent, parent_delta);
        }
    }

    /// Move the built span of an interval and all its descendants.
    pub fn shift_subtree(&mut self, id: IntervalId, delta: i32) {
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if let Some(span) = self.current(cur) {
                self.set_current(cur, Some(span.shifted(delta)));
            }
            stack.extend_from_slice(self.children(cur));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(raw: &str) -> ComponentId {
        ComponentId::new(raw)
    }

    fn model_with_form() -> LayoutModel {
        let mut model = LayoutModel::new();
        model.add_container(&cid("Form"), None).expect("container");
        model
    }

    #[test]
    fn containers_get_two_parallel_roots() {
        let model = model_with_form();
        let form = model.layout_component(&cid("Form")).expect("registered");
        for axis in Axis::ALL {
            let root = form.root(axis).expect("root");
            let record = model.interval(root).expect("root record");
            assert!(record.is_parallel());
            assert!(record.parent.is_none());
        }
        assert_ne!(form.root(Axis::Horizontal), form.root(Axis::Vertical));
    }

    #[test]
    fn unknown_ids_fail_with_not_found() {
        let model = model_with_form();
        assert_eq!(
            model.layout_component(&cid("nope")),
            Err(LayoutError::NotFound {
                component: cid("nope")
            })
        );
        let mut model = model;
        model.add_component(&cid("a"), &cid("Form")).expect("add");
        assert!(matches!(
            model.component_interval(&cid("a"), Axis::Vertical),
            Err(LayoutError::NotPlaced { .. })
        ));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut model = model_with_form();
        model.add_component(&cid("a"), &cid("Form")).expect("add");
        assert!(matches!(
            model.add_component(&cid("a"), &cid("Form")),
            Err(LayoutError::DuplicateComponent { .. })
        ));
        assert!(matches!(
            model.add_component(&cid("b"), &cid("a")),
            Err(LayoutError::NotAContainer { .. })
        ));
    }

    #[test]
    fn membership_follows_registration_order() {
        let mut model = model_with_form();
        for name in ["c", "a", "b"] {
            model.add_component(&cid(name), &cid("Form")).expect("add");
        }
        let form = model.layout_component(&cid("Form")).expect("form");
        assert_eq!(form.sub_components, vec![cid("c"), cid("a"), cid("b")]);
        assert_eq!(
            model.layout_component(&cid("a")).expect("a").parent,
            Some(cid("Form"))
        );
    }

    #[test]
    fn snapshot_restore_round_trips() {
        let mut model = model_with_form();
        let before = model.snapshot();
        model.add_component(&cid("a"), &cid("Form")).expect("add");
        assert_ne!(model.snapshot(), before);
        model.restore(before.clone());
        assert_eq!(model.snapshot(), before);
    }

    #[test]
    fn undo_reverts_recorded_primitives() {
        let mut model = model_with_form();
        model.set_change_recording(true);
        let start = model.snapshot();
        let m1 = model.change_mark();
        model.add_component(&cid("a"), &cid("Form")).expect("add");
        let root = model.root(&cid("Form"), Axis::Horizontal).expect("root");
        let gap = model
            .create_interval(IntervalKind::gap(), IntervalSizes::fixed(10), Alignment::Leading)
            .expect("gap");
        model.attach(gap, root, 0).expect("attach");
        model
            .set_sizes(gap, IntervalSizes::fixed(12))
            .expect("resize");
        let m2 = model.change_mark();
        assert!(model.undo(m1, m2).expect("undo"));
        assert_eq!(model.snapshot().components, start.components);
        assert_eq!(
            model.snapshot().intervals.keys().collect::<Vec<_>>(),
            start.intervals.keys().collect::<Vec<_>>()
        );
        assert!(model.can_redo());
        model.redo().expect("redo");
        assert_eq!(
            model.interval(gap).expect("gap back").sizes.pref,
            SizeDef::Px(12)
        );
    }

    #[test]
    fn discarded_changes_leave_the_log() {
        let mut model = model_with_form();
        model.set_change_recording(true);
        let base = model.snapshot();
        let mark = model.change_mark();
        model.add_component(&cid("a"), &cid("Form")).expect("add");
        assert!(!model.changes_since(mark).is_empty());
        model.restore(base);
        model.discard_changes_since(mark);
        assert!(model.changes_since(mark).is_empty());
        assert!(!model.undo(mark, model.change_mark()).expect("empty range"));
    }

    #[test]
    fn undo_rejects_bad_marks() {
        let mut model = model_with_form();
        let m = model.change_mark();
        assert!(!model.undo(m, m).expect("empty undo"));
        assert!(matches!(
            model.redo(),
            Err(LayoutError::NothingToRedo)
        ));
    }

    #[test]
    fn alignment_requires_parallel_parent() {
        let mut model = model_with_form();
        model.add_component(&cid("a"), &cid("Form")).expect("add");
        let root = model.root(&cid("Form"), Axis::Vertical).expect("root");
        let seq = model
            .create_interval(IntervalKind::sequential(), IntervalSizes::DEFAULT, Alignment::Leading)
            .expect("seq");
        model.attach(seq, root, 0).expect("attach seq");
        let single = model
            .create_interval(
                IntervalKind::Single { component: cid("a") },
                IntervalSizes::DEFAULT,
                Alignment::Leading,
            )
            .expect("single");
        model.attach(single, seq, 0).expect("attach single");
        model
            .set_component_interval(&cid("a"), Axis::Vertical, Some(single))
            .expect("link");
        assert!(matches!(
            model.adjust_component_alignment(&cid("a"), Axis::Vertical, Alignment::Trailing),
            Err(LayoutError::InvalidAlignment { .. })
        ));
        model.detach(single).expect("detach");
        model.attach(single, root, 1).expect("to root");
        model
            .adjust_component_alignment(&cid("a"), Axis::Vertical, Alignment::Baseline)
            .expect("baseline on vertical");
        assert_eq!(
            model.component_alignment(&cid("a"), Axis::Vertical),
            Ok(Some(Alignment::Baseline))
        );
    }

    /// Vertical root holding a sequence of two single intervals `a` and `b`.
    fn stacked_pair(model: &mut LayoutModel) -> (IntervalId, IntervalId, Vec<IntervalId>) {
        let root = model.root(&cid("Form"), Axis::Vertical).expect("root");
        let seq = model
            .create_interval(IntervalKind::sequential(), IntervalSizes::DEFAULT, Alignment::Leading)
            .expect("seq");
        model.attach(seq, root, 0).expect("attach");
        let mut ids = Vec::new();
        for name in ["a", "b"] {
            model.add_component(&cid(name), &cid("Form")).expect("add");
            let single = model
                .create_interval(
                    IntervalKind::Single { component: cid(name) },
                    IntervalSizes::DEFAULT,
                    Alignment::Leading,
                )
                .expect("single");
            model.attach(single, seq, ids.len()).expect("attach");
            model
                .set_component_interval(&cid(name), Axis::Vertical, Some(single))
                .expect("link");
            ids.push(single);
        }
        (root, seq, ids)
    }

    #[test]
    fn user_interval_size_pins_and_propagates() {
        let mut model = model_with_form();
        let (root, seq, ids) = stacked_pair(&mut model);
        model.set_current(root, Some(Span::new(0, 300)));
        model.set_current(seq, Some(Span::new(11, 51)));
        model.set_current(ids[0], Some(Span::new(11, 31)));
        model.set_current(ids[1], Some(Span::new(31, 51)));

        model
            .set_user_interval_size(ids[0], Axis::Vertical, Some(55), true)
            .expect("resize");
        assert!(model.has_explicit_size(&cid("a"), Axis::Vertical).expect("a"));
        assert_eq!(model.current(ids[0]), Some(Span::new(11, 66)));
        assert_eq!(model.current(ids[1]), Some(Span::new(66, 86)));
        assert_eq!(model.current(seq), Some(Span::new(11, 86)));

        model
            .set_user_interval_size(ids[0], Axis::Vertical, None, false)
            .expect("reset");
        assert!(!model.has_explicit_size(&cid("a"), Axis::Vertical).expect("a"));
    }

    #[test]
    fn growth_reaches_later_siblings_of_an_unbuilt_sequence() {
        let mut model = model_with_form();
        let (root, seq, ids) = stacked_pair(&mut model);
        model.set_current(ids[0], Some(Span::new(11, 31)));
        model.set_current(ids[1], Some(Span::new(37, 51)));

        model.propagate_size(ids[0], 35);
        assert_eq!(model.current(ids[0]), Some(Span::new(11, 66)));
        assert_eq!(model.current(ids[1]), Some(Span::new(72, 86)));
        assert_eq!(model.current(seq), None);
        assert_eq!(model.current(root), None);
    }

    #[test]
    fn unbuilt_parallel_grows_only_past_its_widest_member() {
        let mut model = model_with_form();
        let root = model.root(&cid("Form"), Axis::Vertical).expect("root");
        let seq = model
            .create_interval(IntervalKind::sequential(), IntervalSizes::DEFAULT, Alignment::Leading)
            .expect("seq");
        model.attach(seq, root, 0).expect("attach seq");
        let par = model
            .create_interval(IntervalKind::parallel(), IntervalSizes::DEFAULT, Alignment::Leading)
            .expect("par");
        model.attach(par, seq, 0).expect("attach par");
        let mut singles = Vec::new();
        for (name, parent, index, span) in [
            ("a", par, 0, Span::new(0, 20)),
            ("b", par, 1, Span::new(0, 40)),
            ("c", seq, 1, Span::new(40, 60)),
        ] {
            model.add_component(&cid(name), &cid("Form")).expect("add");
            let single = model
                .create_interval(
                    IntervalKind::Single { component: cid(name) },
                    IntervalSizes::DEFAULT,
                    Alignment::Leading,
                )
                .expect("single");
            model.attach(single, parent, index).expect("attach");
            model.set_current(single, Some(span));
            singles.push(single);
        }

        // Still inside the wider member: nothing after the group moves.
        model.propagate_size(singles[0], 15);
        assert_eq!(model.current(singles[0]), Some(Span::new(0, 35)));
        assert_eq!(model.current(singles[2]), Some(Span::new(40, 60)));

        model.propagate_size(singles[1], 5);
        assert_eq!(model.current(singles[1]), Some(Span::new(0, 45)));
        assert_eq!(model.current(singles[2]), Some(Span::new(45, 65)));
        assert_eq!(model.current(par), None);
    }
}
