#![forbid(unsafe_code)]

//! The designer: a layout model bound to a geometry oracle.
//!
//! [`LayoutDesigner`] owns the model, the oracle and the configuration. All
//! mutation goes through `&mut self`, while the oracle is only ever handed
//! out as `&self`, so an oracle callback cannot re-enter the designer in the
//! middle of an edit.

use std::collections::BTreeMap;

use formlay_core::{Alignment, Axis, ComponentId, GeometryOracle, Rect, Span, debug_span, info};
use formlay_layout::{
    ChangeMark, IntervalSizes, LayoutError, LayoutModel, ModelSnapshot, RemovalMode, SizeDef,
    SolvedLayout, solve,
};

use crate::config::DesignerConfig;
use crate::error::DesignerError;
use crate::optimize::{demote_explicit, optimize};
use crate::place::Placer;
use crate::reconcile::{ReconcileReport, reconcile, sync_from_oracle};
use crate::session::Session;
use crate::snap::{SnapCandidate, SnapClass};

/// Structure and log position to roll back to when an edit fails.
struct Checkpoint {
    snapshot: ModelSnapshot,
    mark: ChangeMark,
}

#[derive(Debug, Clone)]
pub struct LayoutDesigner<O: GeometryOracle> {
    pub(crate) model: LayoutModel,
    pub(crate) oracle: O,
    pub(crate) config: DesignerConfig,
    pub(crate) session: Option<Session>,
}

impl<O: GeometryOracle> LayoutDesigner<O> {
    /// Create a designer over an empty model.
    pub fn new(oracle: O, config: DesignerConfig) -> Result<Self, DesignerError> {
        Self::with_model(LayoutModel::new(), oracle, config)
    }

    /// Create a designer over an existing model, e.g. one loaded from a form.
    pub fn with_model(
        model: LayoutModel,
        oracle: O,
        config: DesignerConfig,
    ) -> Result<Self, DesignerError> {
        config.validate()?;
        Ok(Self {
            model,
            oracle,
            config,
            session: None,
        })
    }

    #[must_use]
    pub const fn model(&self) -> &LayoutModel {
        &self.model
    }

    /// Direct model access for undo and inspection. Not allowed during a
    /// session, whose base snapshot would go stale.
    pub fn model_mut(&mut self) -> Result<&mut LayoutModel, DesignerError> {
        self.ensure_idle()?;
        Ok(&mut self.model)
    }

    #[must_use]
    pub const fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    #[must_use]
    pub const fn config(&self) -> &DesignerConfig {
        &self.config
    }

    /// Give up the designer, returning the model and the oracle.
    #[must_use]
    pub fn into_parts(self) -> (LayoutModel, O) {
        (self.model, self.oracle)
    }

    pub(crate) fn ensure_idle(&self) -> Result<(), DesignerError> {
        if self.session.is_some() {
            return Err(DesignerError::SessionAlreadyActive);
        }
        Ok(())
    }

    pub(crate) fn require_container(&self, id: &ComponentId) -> Result<(), LayoutError> {
        if self.model.layout_component(id)?.is_container() {
            Ok(())
        } else {
            Err(LayoutError::NotAContainer {
                component: id.clone(),
            })
        }
    }

    /// Owning container of a component.
    pub(crate) fn container_of(&self, id: &ComponentId) -> Result<ComponentId, DesignerError> {
        self.model
            .layout_component(id)?
            .parent
            .clone()
            .ok_or_else(|| LayoutError::NotFound {
                component: id.clone(),
            })
            .map_err(DesignerError::from)
    }

    /// Register a layout container, optionally placing it in a parent
    /// container at `bounds`.
    pub fn add_container(
        &mut self,
        id: &ComponentId,
        parent: Option<&ComponentId>,
        bounds: Option<Rect>,
    ) -> Result<(), DesignerError> {
        self.ensure_idle()?;
        let _span = debug_span!("add_container", container = %id).entered();
        if let Some(parent) = parent {
            self.require_container(parent)?;
        }
        let base = self.checkpoint();
        let result = self.model.add_container(id, parent).map_err(DesignerError::from);
        let result = match (result, parent, bounds) {
            (Ok(()), Some(parent), Some(bounds)) => self.insert(parent, id, bounds),
            (result, ..) => result,
        };
        self.settle(base, result)
    }

    /// Add a component to a container at `bounds`, attaching edges that
    /// line up exactly with other components.
    pub fn add_component(
        &mut self,
        container: &ComponentId,
        id: &ComponentId,
        bounds: Rect,
    ) -> Result<(), DesignerError> {
        self.ensure_idle()?;
        let _span = debug_span!("add_component", component = %id).entered();
        self.require_container(container)?;
        let base = self.checkpoint();
        let result = self
            .model
            .add_component(id, container)
            .map_err(DesignerError::from)
            .and_then(|()| self.insert(container, id, bounds));
        self.settle(base, result)
    }

    fn insert(
        &mut self,
        container: &ComponentId,
        id: &ComponentId,
        bounds: Rect,
    ) -> Result<(), DesignerError> {
        sync_from_oracle(&mut self.model, &self.oracle, container)?;
        let pending = BTreeMap::from([(id.clone(), bounds)]);
        for axis in Axis::ALL {
            let sizes = self.initial_sizes(id, bounds, axis)?;
            self.place_one(container, id, axis, bounds, sizes, &pending)?;
        }
        self.finish(container)
    }

    /// Optimize, solve and notify the host for one container.
    fn finish(&mut self, container: &ComponentId) -> Result<(), DesignerError> {
        let _ = optimize(&mut self.model, &self.oracle, &self.config, container)?;
        let solved = solve(&self.model, &self.oracle, self.config.padding, container)?;
        self.model.apply_solved(&solved);
        self.oracle.rebuild_layout(container);
        Ok(())
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            snapshot: self.model.snapshot(),
            mark: self.model.change_mark(),
        }
    }

    /// Restore a checkpoint, dropping whatever the failed edit logged.
    fn roll_back(&mut self, base: Checkpoint) {
        let recording = self.model.is_change_recording();
        self.model.set_change_recording(false);
        self.model.restore(base.snapshot);
        self.model.discard_changes_since(base.mark);
        self.model.set_change_recording(recording);
    }

    /// Keep the result, or roll back to `base` on error.
    fn settle(
        &mut self,
        base: Checkpoint,
        result: Result<(), DesignerError>,
    ) -> Result<(), DesignerError> {
        if result.is_err() {
            self.roll_back(base);
        }
        result
    }

    /// Remove a component, closing the space it took or keeping it.
    pub fn remove_component(&mut self, id: &ComponentId, close_gap: bool) -> Result<(), DesignerError> {
        self.ensure_idle()?;
        let _span = debug_span!("remove_component", component = %id, close_gap).entered();
        let container = self.container_of(id)?;
        let base = self.checkpoint();
        let result = self
            .model
            .remove_component(id, close_gap)
            .map_err(DesignerError::from)
            .and_then(|()| self.finish(&container));
        if result.is_ok() {
            self.oracle.set_component_visibility(id, false);
            info!(component = %id, "component removed");
        }
        self.settle(base, result)
    }

    /// Align the `alignment` edges of several components on `axis`, anchored
    /// on the first one.
    pub fn align(
        &mut self,
        components: &[ComponentId],
        axis: Axis,
        alignment: Alignment,
    ) -> Result<(), DesignerError> {
        self.ensure_idle()?;
        let supported = match alignment {
            Alignment::Leading | Alignment::Trailing | Alignment::Center => true,
            Alignment::Baseline => axis == Axis::Vertical,
            Alignment::Fill => false,
        };
        if !supported {
            return Err(DesignerError::UnsupportedAlignment { axis, alignment });
        }
        let Some((anchor, rest)) = components.split_first() else {
            return Err(DesignerError::EmptySelection);
        };
        let container = self.container_of(anchor)?;
        for component in rest {
            if self.container_of(component)? != container {
                return Err(DesignerError::NotInContainer {
                    component: component.clone(),
                    container,
                });
            }
        }
        let _span = debug_span!("align", container = %container, axis = axis.as_str()).entered();
        let base = self.checkpoint();
        let result = self.align_on(&container, anchor, rest, axis, alignment);
        self.settle(base, result)
    }

    fn align_on(
        &mut self,
        container: &ComponentId,
        anchor: &ComponentId,
        rest: &[ComponentId],
        axis: Axis,
        alignment: Alignment,
    ) -> Result<(), DesignerError> {
        sync_from_oracle(&mut self.model, &self.oracle, container)?;
        let anchor_interval = self.model.component_interval(anchor, axis)?;
        let Some(anchor_span) = self.model.current(anchor_interval) else {
            return Ok(());
        };
        for component in rest {
            let interval = self.model.component_interval(component, axis)?;
            let Some(span) = self.model.current(interval) else {
                continue;
            };
            let Some(other) = self
                .model
                .component_interval(component, axis.other())
                .ok()
                .and_then(|i| self.model.current(i))
            else {
                continue;
            };
            let start = match alignment {
                Alignment::Trailing => anchor_span.end - span.len(),
                Alignment::Center => anchor_span.start + (anchor_span.len() - span.len()) / 2,
                Alignment::Baseline => {
                    let anchor_height = anchor_span.len();
                    let own = self.baseline_of(component, span.len());
                    let theirs = self.baseline_of(anchor, anchor_height);
                    match (own, theirs) {
                        (Some(own), Some(theirs)) => anchor_span.start + theirs - own,
                        _ => anchor_span.start,
                    }
                }
                Alignment::Leading | Alignment::Fill => anchor_span.start,
            };
            let desired = Span::with_len(start, span.len());
            let rect = match axis {
                Axis::Horizontal => Rect::from_spans(desired, other),
                Axis::Vertical => Rect::from_spans(other, desired),
            };
            let record = self
                .model
                .take_out_component(component, axis, RemovalMode::KeepSpace)?;
            let sizes = record.map_or(IntervalSizes::DEFAULT, |r| r.sizes);
            let single = self.model.new_single(component, axis, sizes, Some(desired))?;
            let candidate = SnapCandidate {
                class: SnapClass::Aligned,
                edge: alignment,
                offset: 0,
                orthogonal_distance: 0,
                target: Some(anchor.clone()),
                padding: None,
            };
            let pending = BTreeMap::from([(component.clone(), rect)]);
            let mut placer = Placer {
                model: &mut self.model,
                oracle: &self.oracle,
                pending: &pending,
            };
            placer.place(container, single, axis, rect, &[candidate])?;
        }
        self.finish(container)
    }

    fn baseline_of(&self, component: &ComponentId, height: i32) -> Option<i32> {
        let width = self
            .oracle
            .component_bounds(component)
            .map_or(0, |r| r.width);
        self.oracle
            .baseline_position(component, width, height)
            .filter(|b| *b >= 0)
    }

    /// Let a component stretch on `axis`, or stop it from stretching.
    pub fn set_component_resizing(
        &mut self,
        id: &ComponentId,
        axis: Axis,
        resizing: bool,
    ) -> Result<(), DesignerError> {
        self.ensure_idle()?;
        let container = self.container_of(id)?;
        let base = self.checkpoint();
        let result = self.resize_flag(&container, id, axis, resizing);
        self.settle(base, result)
    }

    fn resize_flag(
        &mut self,
        container: &ComponentId,
        id: &ComponentId,
        axis: Axis,
        resizing: bool,
    ) -> Result<(), DesignerError> {
        let interval = self.model.component_interval(id, axis)?;
        let sizes = self.model.interval(interval)?.sizes;
        self.model.set_sizes(interval, sizes.with_resizing(resizing))?;
        self.finish(container)
    }

    /// Return a component to its default size on both axes.
    pub fn set_default_size(&mut self, id: &ComponentId) -> Result<(), DesignerError> {
        self.ensure_idle()?;
        let container = self.container_of(id)?;
        let base = self.checkpoint();
        let result = self.clear_sizes(&container, id);
        self.settle(base, result)
    }

    fn clear_sizes(&mut self, container: &ComponentId, id: &ComponentId) -> Result<(), DesignerError> {
        for axis in Axis::ALL {
            let Ok(interval) = self.model.component_interval(id, axis) else {
                continue;
            };
            let sizes = self.model.interval(interval)?.sizes;
            self.model
                .set_sizes(interval, sizes.with_pref(SizeDef::NotDefined))?;
            self.model.set_explicit_size(id, axis, false)?;
        }
        self.finish(container)
    }

    /// The host changed sizes on its own. Reconciles every container and
    /// returns whether the model changed.
    pub fn external_size_change_happened(&mut self) -> Result<bool, DesignerError> {
        self.ensure_idle()?;
        let _span = debug_span!("external_size_change").entered();
        let mut changed = false;
        for container in self.container_ids() {
            changed |= self.reconcile_container(&container)?.changed;
        }
        Ok(changed)
    }

    /// The designer view of `container` was resized.
    pub fn designer_resized(&mut self, container: &ComponentId) -> Result<ReconcileReport, DesignerError> {
        self.ensure_idle()?;
        self.require_container(container)?;
        self.reconcile_container(container)
    }

    fn reconcile_container(&mut self, container: &ComponentId) -> Result<ReconcileReport, DesignerError> {
        let report = reconcile(&mut self.model, &self.oracle, &self.config, container)?;
        if report.changed {
            self.oracle.rebuild_layout(container);
        }
        Ok(report)
    }

    /// Re-read built positions from the host and drop explicit sizes that
    /// became equal to their defaults. Returns whether the model changed.
    pub fn update_current_state(&mut self) -> Result<bool, DesignerError> {
        self.ensure_idle()?;
        let _span = debug_span!("update_current_state").entered();
        let mut changed = false;
        for container in self.container_ids() {
            sync_from_oracle(&mut self.model, &self.oracle, &container)?;
            if demote_explicit(&mut self.model, &self.oracle, &self.config, &container)? > 0 {
                self.oracle.rebuild_layout(&container);
                changed = true;
            }
        }
        Ok(changed)
    }

    fn container_ids(&self) -> Vec<ComponentId> {
        self.model.containers().map(|c| c.id.clone()).collect()
    }

    /// Concrete geometry of a container.
    pub fn solve(&self, container: &ComponentId) -> Result<SolvedLayout, DesignerError> {
        Ok(solve(&self.model, &self.oracle, self.config.padding, container)?)
    }

    /// Run the commit-time normalization on demand.
    pub fn optimize(&mut self, container: &ComponentId) -> Result<bool, DesignerError> {
        self.ensure_idle()?;
        Ok(optimize(&mut self.model, &self.oracle, &self.config, container)?)
    }
}
