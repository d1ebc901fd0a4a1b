#![forbid(unsafe_code)]

//! Designer session state machine.
//!
//! ```text
//! Idle ── start_resizing ──▶ Resizing ─┐
//!      ── start_moving ────▶ Moving ───┼── end_moving(commit | cancel) ──▶ Idle
//!      ── start_adding ────▶ Adding ───┘
//! ```
//!
//! A session owns a snapshot of the model taken when it started. Every
//! `move_to` restores that snapshot and rebuilds the provisional structure
//! from scratch, which makes repeated calls with equal input idempotent and
//! cancel a plain restore. Commit restores once more and replays the last
//! request with the caller's change recording switched on, so a whole gesture
//! lands in the undo log as one batch.

use std::collections::BTreeMap;

use formlay_core::{
    Alignment, Axis, ComponentId, Edge, GeometryOracle, Point, Rect, Span, debug, debug_span, info,
};
use formlay_layout::{IntervalSizes, LayoutError, ModelSnapshot, RemovalMode, SizeDef, solve};
use serde::{Deserialize, Serialize};

use crate::designer::LayoutDesigner;
use crate::error::DesignerError;
use crate::optimize::optimize;
use crate::place::{Placer, adjacent_gap, placed_bounds};
use crate::reconcile::sync_from_oracle;
use crate::snap::{SnapCandidate, SnapClass, SnapContext, preferred_size_candidate};

/// Dragged edge per axis, `None` when the axis is not resized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResizeEdges {
    pub horizontal: Option<Edge>,
    pub vertical: Option<Edge>,
}

impl ResizeEdges {
    /// Decode host edge codes: `-1` not resized, `0` leading, `1` trailing.
    #[must_use]
    pub const fn from_raw(raw: [i32; 2]) -> Self {
        const fn decode(code: i32) -> Option<Edge> {
            match code {
                0 => Some(Edge::Leading),
                1 => Some(Edge::Trailing),
                _ => None,
            }
        }
        Self {
            horizontal: decode(raw[0]),
            vertical: decode(raw[1]),
        }
    }

    #[must_use]
    pub const fn edge(&self, axis: Axis) -> Option<Edge> {
        match axis {
            Axis::Horizontal => self.horizontal,
            Axis::Vertical => self.vertical,
        }
    }
}

/// A component dragged in from outside the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComponent {
    pub id: ComponentId,
    /// Whether the component gets layout roots of its own.
    pub is_container: bool,
}

impl NewComponent {
    #[must_use]
    pub fn component(id: impl Into<ComponentId>) -> Self {
        Self {
            id: id.into(),
            is_container: false,
        }
    }

    #[must_use]
    pub fn container(id: impl Into<ComponentId>) -> Self {
        Self {
            id: id.into(),
            is_container: true,
        }
    }
}

/// What the active session does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Resizing { edges: ResizeEdges, in_layout: bool },
    Moving,
    Adding {
        default_container: ComponentId,
        components: Vec<NewComponent>,
    },
}

/// Observable designer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignerState {
    Idle,
    Resizing,
    Moving,
    Adding,
}

/// Arguments of one `move_to` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub point: Point,
    pub container: ComponentId,
    pub auto_positioning: bool,
    pub lock_dimension: bool,
    pub bounds: Vec<Rect>,
}

#[derive(Debug, Clone)]
pub(crate) struct Session {
    pub kind: SessionKind,
    pub components: Vec<ComponentId>,
    pub original_bounds: Vec<Rect>,
    /// Container the components lived in when the session started.
    pub origin: ComponentId,
    pub hotspot: Point,
    pub base: ModelSnapshot,
    /// Change recording as the caller had it.
    pub recording: bool,
    pub last: Option<MoveRequest>,
}

impl Session {
    fn state(&self) -> DesignerState {
        match self.kind {
            SessionKind::Resizing { .. } => DesignerState::Resizing,
            SessionKind::Moving => DesignerState::Moving,
            SessionKind::Adding { .. } => DesignerState::Adding,
        }
    }

    /// Axis the pointer moved less along, when locking applies.
    fn locked_axis(&self, request: &MoveRequest) -> Option<Axis> {
        if !request.lock_dimension {
            return None;
        }
        let dx = (request.point.x - self.hotspot.x).abs();
        let dy = (request.point.y - self.hotspot.y).abs();
        Some(if dx < dy { Axis::Horizontal } else { Axis::Vertical })
    }
}

impl<O: GeometryOracle> LayoutDesigner<O> {
    #[must_use]
    pub fn state(&self) -> DesignerState {
        self.session.as_ref().map_or(DesignerState::Idle, Session::state)
    }

    /// Begin resizing components. `edges` names the dragged edge per axis.
    pub fn start_resizing(
        &mut self,
        components: &[ComponentId],
        bounds: &[Rect],
        hotspot: Point,
        edges: ResizeEdges,
        in_layout: bool,
    ) -> Result<(), DesignerError> {
        self.open_session(
            SessionKind::Resizing { edges, in_layout },
            components,
            bounds,
            hotspot,
        )
    }

    /// Begin moving components as a rigid group.
    pub fn start_moving(
        &mut self,
        components: &[ComponentId],
        bounds: &[Rect],
        hotspot: Point,
    ) -> Result<(), DesignerError> {
        self.open_session(SessionKind::Moving, components, bounds, hotspot)
    }

    /// Begin dragging new components into `default_container`.
    pub fn start_adding(
        &mut self,
        components: Vec<NewComponent>,
        bounds: &[Rect],
        hotspot: Point,
        default_container: &ComponentId,
    ) -> Result<(), DesignerError> {
        if self.session.is_some() {
            return Err(DesignerError::SessionAlreadyActive);
        }
        if components.is_empty() {
            return Err(DesignerError::EmptySelection);
        }
        if components.len() != bounds.len() {
            return Err(DesignerError::ComponentSetMismatch {
                expected: components.len(),
                got: bounds.len(),
            });
        }
        self.require_container(default_container)?;
        for component in &components {
            if self.model.contains_component(&component.id) {
                return Err(LayoutError::DuplicateComponent {
                    component: component.id.clone(),
                }
                .into());
            }
        }
        let ids = components.iter().map(|c| c.id.clone()).collect();
        self.begin(
            SessionKind::Adding {
                default_container: default_container.clone(),
                components,
            },
            ids,
            bounds,
            hotspot,
            default_container.clone(),
        )
    }

    fn open_session(
        &mut self,
        kind: SessionKind,
        components: &[ComponentId],
        bounds: &[Rect],
        hotspot: Point,
    ) -> Result<(), DesignerError> {
        if self.session.is_some() {
            return Err(DesignerError::SessionAlreadyActive);
        }
        let Some(first) = components.first() else {
            return Err(DesignerError::EmptySelection);
        };
        if components.len() != bounds.len() {
            return Err(DesignerError::ComponentSetMismatch {
                expected: components.len(),
                got: bounds.len(),
            });
        }
        let origin = self.container_of(first)?;
        for component in components {
            if self.container_of(component)? != origin {
                return Err(DesignerError::NotInContainer {
                    component: component.clone(),
                    container: origin,
                });
            }
        }
        self.begin(kind, components.to_vec(), bounds, hotspot, origin)
    }

    fn begin(
        &mut self,
        kind: SessionKind,
        components: Vec<ComponentId>,
        bounds: &[Rect],
        hotspot: Point,
        origin: ComponentId,
    ) -> Result<(), DesignerError> {
        let _span = debug_span!("start_session", container = %origin).entered();
        sync_from_oracle(&mut self.model, &self.oracle, &origin)?;
        let session = Session {
            kind,
            components,
            original_bounds: bounds.to_vec(),
            origin,
            hotspot,
            base: self.model.snapshot(),
            recording: self.model.is_change_recording(),
            last: None,
        };
        info!(state = ?session.state(), count = session.components.len(), "session started");
        self.session = Some(session);
        Ok(())
    }

    /// Rebuild the provisional structure for a new pointer position.
    pub fn move_to(
        &mut self,
        point: Point,
        container: &ComponentId,
        auto_positioning: bool,
        lock_dimension: bool,
        bounds: &[Rect],
    ) -> Result<(), DesignerError> {
        let Some(session) = self.session.take() else {
            return Err(DesignerError::NoActiveSession);
        };
        let request = MoveRequest {
            point,
            container: container.clone(),
            auto_positioning,
            lock_dimension,
            bounds: bounds.to_vec(),
        };
        let result = self.rebuild(&session, &request, false);
        let mut session = session;
        if result.is_ok() {
            session.last = Some(request);
        } else {
            self.reset_to_base(&session);
        }
        self.session = Some(session);
        result.map(|_| ())
    }

    /// Finish the session, committing the last move or restoring the base.
    pub fn end_moving(&mut self, commit: bool) -> Result<(), DesignerError> {
        let Some(session) = self.session.take() else {
            return Err(DesignerError::NoActiveSession);
        };
        let _span = debug_span!("end_session", commit).entered();
        self.reset_to_base(&session);
        let Some(request) = session.last.as_ref().filter(|_| commit) else {
            info!("session cancelled");
            return Ok(());
        };
        let mark = self.model.change_mark();
        let result = self.commit(&session, request);
        if result.is_err() {
            self.reset_to_base(&session);
            self.model.discard_changes_since(mark);
        }
        self.model.set_change_recording(session.recording);
        result
    }

    fn commit(&mut self, session: &Session, request: &MoveRequest) -> Result<(), DesignerError> {
        let target = self.rebuild(session, request, true)?;
        let mut touched = vec![target];
        if !touched.contains(&session.origin) && self.model.contains_component(&session.origin) {
            touched.push(session.origin.clone());
        }
        for container in &touched {
            let _ = optimize(&mut self.model, &self.oracle, &self.config, container)?;
            let solved = solve(&self.model, &self.oracle, self.config.padding, container)?;
            self.model.apply_solved(&solved);
            self.oracle.rebuild_layout(container);
        }
        info!(containers = touched.len(), "session committed");
        Ok(())
    }

    fn reset_to_base(&mut self, session: &Session) {
        self.model.set_change_recording(false);
        self.model.restore(session.base.clone());
        self.model.set_change_recording(session.recording);
    }

    /// Restore the base and apply `request`. Returns the target container.
    fn rebuild(
        &mut self,
        session: &Session,
        request: &MoveRequest,
        record: bool,
    ) -> Result<ComponentId, DesignerError> {
        if request.bounds.len() != session.components.len() {
            return Err(DesignerError::ComponentSetMismatch {
                expected: session.components.len(),
                got: request.bounds.len(),
            });
        }
        let target = match &session.kind {
            SessionKind::Resizing { .. } => session.origin.clone(),
            _ => request.container.clone(),
        };
        self.require_container(&target)?;
        self.model.set_change_recording(false);
        self.model.restore(session.base.clone());
        self.model.set_change_recording(record && session.recording);
        let result = match &session.kind {
            SessionKind::Resizing {
                edges,
                in_layout: true,
            } => self.resize_in_layout(session, request, *edges),
            _ => self.restructure(session, request, &target),
        };
        self.model.set_change_recording(session.recording);
        debug!(container = %target, ok = result.is_ok(), "provisional structure rebuilt");
        result.map(|()| target)
    }

    fn snap_context_parts(
        &self,
        container: &ComponentId,
        exclude: &[ComponentId],
    ) -> Result<(Rect, Vec<(ComponentId, Rect)>), LayoutError> {
        let interior = match self.oracle.container_interior(container) {
            Some(interior) => interior,
            None => {
                let h = self.model.root(container, Axis::Horizontal)?;
                let v = self.model.root(container, Axis::Vertical)?;
                match (self.model.current(h), self.model.current(v)) {
                    (Some(h), Some(v)) => Rect::from_spans(h, v),
                    _ => Rect::default(),
                }
            }
        };
        let others = placed_bounds(&self.model, &self.oracle, container, exclude)?;
        Ok((interior, others))
    }

    fn resize_in_layout(
        &mut self,
        session: &Session,
        request: &MoveRequest,
        edges: ResizeEdges,
    ) -> Result<(), DesignerError> {
        let (interior, others) = self.snap_context_parts(&session.origin, &session.components)?;
        let locked = session.locked_axis(request);
        let pending = BTreeMap::new();
        for (index, component) in session.components.iter().enumerate() {
            let original = session.original_bounds[index];
            let mut rect = request.bounds[index];
            for axis in Axis::ALL {
                let Some(side) = edges.edge(axis) else {
                    continue;
                };
                if locked == Some(axis) {
                    continue;
                }
                let snap = if request.auto_positioning {
                    let context = SnapContext {
                        oracle: &self.oracle,
                        padding: self.config.padding,
                        container: &session.origin,
                        interior,
                        others: &others,
                        tolerance: self.config.snap_distance,
                    };
                    let preferred = self
                        .oracle
                        .component_preferred_size(component)
                        .map(|s| s.along(axis));
                    best_resize_snap(&context, component, rect, axis, side, preferred)
                } else {
                    None
                };
                let span = apply_edge_offset(rect.span(axis), side, snap.as_ref());
                rect = rect.with_span(axis, span);
                if span == original.span(axis) && snap.is_none() {
                    continue;
                }
                let mut placer = Placer {
                    model: &mut self.model,
                    oracle: &self.oracle,
                    pending: &pending,
                };
                placer.resize(component, axis, span, side, snap.as_ref())?;
            }
        }
        Ok(())
    }

    fn restructure(
        &mut self,
        session: &Session,
        request: &MoveRequest,
        target: &ComponentId,
    ) -> Result<(), DesignerError> {
        let adding = matches!(session.kind, SessionKind::Adding { .. });
        let resize_edges = match session.kind {
            SessionKind::Resizing { edges, .. } => Some(edges),
            _ => None,
        };
        let container_changed = *target != session.origin;
        let locked = session
            .locked_axis(request)
            .filter(|_| !container_changed && !adding);

        let mut bounds = request.bounds.clone();
        if let Some(axis) = locked {
            for (rect, original) in bounds.iter_mut().zip(&session.original_bounds) {
                *rect = rect.with_span(axis, original.span(axis));
            }
        }

        let mut sizes: BTreeMap<(ComponentId, Axis), IntervalSizes> = BTreeMap::new();
        if let SessionKind::Adding { components, .. } = &session.kind {
            for component in components {
                if component.is_container {
                    self.model.add_container(&component.id, Some(target))?;
                } else {
                    self.model.add_component(&component.id, target)?;
                }
            }
        } else {
            for component in &session.components {
                for axis in Axis::ALL {
                    if locked == Some(axis) {
                        continue;
                    }
                    if let Some(record) =
                        self.model
                            .take_out_component(component, axis, RemovalMode::KeepSpace)?
                    {
                        let _ = sizes.insert((component.clone(), axis), record.sizes);
                    }
                }
                if container_changed {
                    self.model.set_membership(component, Some(target))?;
                }
            }
        }

        let axes: Vec<Axis> = Axis::ALL.into_iter().filter(|a| locked != Some(*a)).collect();
        let (interior, others) = self.snap_context_parts(target, &session.components)?;
        let mut snaps: BTreeMap<Axis, SnapCandidate> = BTreeMap::new();
        if request.auto_positioning {
            let context = SnapContext {
                oracle: &self.oracle,
                padding: self.config.padding,
                container: target,
                interior,
                others: &others,
                tolerance: self.config.snap_distance,
            };
            for axis in &axes {
                let snap = match resize_edges {
                    Some(edges) => edges.edge(*axis).and_then(|side| {
                        context.best(
                            &session.components[0],
                            union_of(&bounds),
                            *axis,
                            &[Alignment::from_edge(side)],
                        )
                    }),
                    None => {
                        let mut edges = vec![Alignment::Leading, Alignment::Trailing];
                        if *axis == Axis::Vertical && bounds.len() == 1 {
                            edges.push(Alignment::Baseline);
                        }
                        context.best(&session.components[0], union_of(&bounds), *axis, &edges)
                    }
                };
                let Some(snap) = snap else {
                    continue;
                };
                for rect in &mut bounds {
                    let span = match resize_edges.and_then(|e| e.edge(*axis)) {
                        Some(side) => apply_edge_offset(rect.span(*axis), side, Some(&snap)),
                        None => rect.span(*axis).shifted(snap.offset),
                    };
                    *rect = rect.with_span(*axis, span);
                }
                let _ = snaps.insert(*axis, snap);
            }
        }

        let pending: BTreeMap<ComponentId, Rect> = session
            .components
            .iter()
            .cloned()
            .zip(bounds.iter().copied())
            .collect();
        for axis in axes {
            let mut order: Vec<usize> = (0..session.components.len()).collect();
            order.sort_by_key(|i| (bounds[*i].span(axis).start, *i));
            for index in order {
                let component = &session.components[index];
                let rect = bounds[index];
                let resized = resize_edges.and_then(|e| e.edge(axis)).is_some();
                let component_sizes = if resized {
                    self.model.set_explicit_size(component, axis, true)?;
                    IntervalSizes::fixed(rect.span(axis).len())
                } else {
                    match sizes.get(&(component.clone(), axis)) {
                        Some(sizes) => *sizes,
                        None => self.initial_sizes(component, rect, axis)?,
                    }
                };
                self.place_one(target, component, axis, rect, component_sizes, &pending)?;
                if let Some(snap) = snaps.get(&axis) {
                    self.mark_snapped_gap(component, axis, rect, &bounds, snap)?;
                }
            }
        }
        Ok(())
    }

    /// Sizes of a component entering the layout: default when the bounds
    /// match the preferred size, pinned otherwise.
    pub(crate) fn initial_sizes(
        &mut self,
        component: &ComponentId,
        rect: Rect,
        axis: Axis,
    ) -> Result<IntervalSizes, LayoutError> {
        let len = rect.span(axis).len();
        let preferred = self
            .oracle
            .component_preferred_size(component)
            .map(|s| s.along(axis));
        if preferred.is_none_or(|p| (p - len).abs() <= self.config.size_tolerance) {
            return Ok(IntervalSizes::DEFAULT);
        }
        self.model.set_explicit_size(component, axis, true)?;
        Ok(IntervalSizes::fixed(len))
    }

    /// Create the component's interval and place it, attaching exactly
    /// aligned edges.
    pub(crate) fn place_one(
        &mut self,
        container: &ComponentId,
        component: &ComponentId,
        axis: Axis,
        rect: Rect,
        sizes: IntervalSizes,
        pending: &BTreeMap<ComponentId, Rect>,
    ) -> Result<(), LayoutError> {
        let waiting: Vec<ComponentId> = pending
            .keys()
            .filter(|id| {
                *id == component || self.model.component_interval(id, axis).is_err()
            })
            .cloned()
            .collect();
        let (interior, others) = self.snap_context_parts(container, &waiting)?;
        let context = SnapContext {
            oracle: &self.oracle,
            padding: self.config.padding,
            container,
            interior,
            others: &others,
            tolerance: 0,
        };
        let alignments = context.exact_alignments(component, rect, axis);
        let single = self
            .model
            .new_single(component, axis, sizes, Some(rect.span(axis)))?;
        let mut placer = Placer {
            model: &mut self.model,
            oracle: &self.oracle,
            pending,
        };
        placer.place(container, single, axis, rect, &alignments)
    }

    /// Turn the gap a neighbor or border snap produced into a default gap.
    fn mark_snapped_gap(
        &mut self,
        component: &ComponentId,
        axis: Axis,
        rect: Rect,
        bounds: &[Rect],
        snap: &SnapCandidate,
    ) -> Result<(), LayoutError> {
        if !matches!(snap.class, SnapClass::NextTo | SnapClass::Container) {
            return Ok(());
        }
        let side = match snap.edge {
            Alignment::Leading => Edge::Leading,
            Alignment::Trailing => Edge::Trailing,
            _ => return Ok(()),
        };
        let union = union_of(bounds).span(axis);
        if rect.span(axis).edge(side) != union.edge(side) {
            return Ok(());
        }
        let interval = self.model.component_interval(component, axis)?;
        let Some(gap) = adjacent_gap(&self.model, interval, side) else {
            return Ok(());
        };
        let sizes = self.model.interval(gap)?.sizes;
        self.model.set_sizes(gap, sizes.with_pref(SizeDef::NotDefined))?;
        self.model.set_gap_padding(gap, snap.padding)?;
        Ok(())
    }
}

/// Best snap for a resized edge, including the preferred size.
fn best_resize_snap(
    context: &SnapContext<'_>,
    component: &ComponentId,
    rect: Rect,
    axis: Axis,
    side: Edge,
    preferred: Option<i32>,
) -> Option<SnapCandidate> {
    context
        .best(component, rect, axis, &[Alignment::from_edge(side)])
        .or_else(|| {
            preferred_size_candidate(rect.span(axis), side, preferred)
                .filter(|c| c.distance() <= context.tolerance)
        })
}

fn apply_edge_offset(
    span: Span,
    side: Edge,
    snap: Option<&SnapCandidate>,
) -> Span {
    let offset = snap.map_or(0, |c| c.offset);
    match side {
        Edge::Leading => Span::new(span.start + offset, span.end),
        Edge::Trailing => Span::new(span.start, span.end + offset),
    }
}

fn union_of(bounds: &[Rect]) -> Rect {
    bounds
        .iter()
        .copied()
        .reduce(|a, b| a.union(&b))
        .unwrap_or_default()
}
