#![forbid(unsafe_code)]

//! Scripted gesture scenarios.
//!
//! A [`Scenario`] is a list of designer actions run against a
//! [`SimulatedHost`]. After each step the host settles, an idle model is
//! checked for structural invariants, expected bounds are compared and the dump
//! checksum is recorded. Scenarios are plain data and round-trip through
//! JSON, so failing gesture sequences can be saved as fixtures.

use std::fmt;

use formlay_core::{Alignment, Axis, ComponentId, Point, Rect, Size, debug, info};
use formlay_designer::{DesignerError, DesignerState, MoveRequest, NewComponent, ResizeEdges};
use serde::{Deserialize, Serialize};

use crate::golden::{GoldenLogger, compute_text_checksum};
use crate::host::SimulatedHost;

/// One designer call, or one host-side change followed by its notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    AddContainer {
        id: ComponentId,
        parent: Option<ComponentId>,
        bounds: Option<Rect>,
    },
    AddComponent {
        container: ComponentId,
        id: ComponentId,
        bounds: Rect,
    },
    RemoveComponent {
        id: ComponentId,
        close_gap: bool,
    },
    StartResizing {
        components: Vec<ComponentId>,
        bounds: Vec<Rect>,
        hotspot: Point,
        /// Host edge codes per axis: `-1` none, `0` leading, `1` trailing.
        edges: [i32; 2],
        in_layout: bool,
    },
    StartMoving {
        components: Vec<ComponentId>,
        bounds: Vec<Rect>,
        hotspot: Point,
    },
    StartAdding {
        components: Vec<NewComponent>,
        bounds: Vec<Rect>,
        hotspot: Point,
        default_container: ComponentId,
    },
    MoveTo(MoveRequest),
    EndMoving {
        commit: bool,
    },
    Align {
        components: Vec<ComponentId>,
        axis: Axis,
        alignment: Alignment,
    },
    SetResizing {
        id: ComponentId,
        axis: Axis,
        resizing: bool,
    },
    SetDefaultSize {
        id: ComponentId,
    },
    /// The component's natural size changed: the host lays out again and
    /// reports the change.
    ChangePreferred {
        id: ComponentId,
        size: Size,
    },
    /// The designer view of a container was resized.
    ResizeDesigner {
        container: ComponentId,
        interior: Rect,
    },
    UpdateCurrentState,
    Optimize {
        container: ComponentId,
    },
}

impl Action {
    fn apply(&self, host: &mut SimulatedHost) -> Result<(), DesignerError> {
        match self {
            Self::AddContainer { id, parent, bounds } => {
                host.run(|d| d.add_container(id, parent.as_ref(), *bounds))
            }
            Self::AddComponent {
                container,
                id,
                bounds,
            } => host.run(|d| d.add_component(container, id, *bounds)),
            Self::RemoveComponent { id, close_gap } => {
                host.run(|d| d.remove_component(id, *close_gap))
            }
            Self::StartResizing {
                components,
                bounds,
                hotspot,
                edges,
                in_layout,
            } => host.run(|d| {
                d.start_resizing(
                    components,
                    bounds,
                    *hotspot,
                    ResizeEdges::from_raw(*edges),
                    *in_layout,
                )
            }),
            Self::StartMoving {
                components,
                bounds,
                hotspot,
            } => host.run(|d| d.start_moving(components, bounds, *hotspot)),
            Self::StartAdding {
                components,
                bounds,
                hotspot,
                default_container,
            } => host.run(|d| {
                d.start_adding(components.clone(), bounds, *hotspot, default_container)
            }),
            Self::MoveTo(request) => host.run(|d| {
                d.move_to(
                    request.point,
                    &request.container,
                    request.auto_positioning,
                    request.lock_dimension,
                    &request.bounds,
                )
            }),
            Self::EndMoving { commit } => host.run(|d| d.end_moving(*commit)),
            Self::Align {
                components,
                axis,
                alignment,
            } => host.run(|d| d.align(components, *axis, *alignment)),
            Self::SetResizing { id, axis, resizing } => {
                host.run(|d| d.set_component_resizing(id, *axis, *resizing))
            }
            Self::SetDefaultSize { id } => host.run(|d| d.set_default_size(id)),
            Self::ChangePreferred { id, size } => {
                host.designer_mut().oracle_mut().set_preferred(id, *size);
                let _ = host.relayout()?;
                host.run(|d| d.external_size_change_happened().map(drop))
            }
            Self::ResizeDesigner {
                container,
                interior,
            } => {
                let oracle = host.designer_mut().oracle_mut();
                oracle.set_interior(container, *interior);
                oracle.set_bounds(container, *interior);
                let _ = host.relayout()?;
                host.run(|d| d.designer_resized(container).map(drop))
            }
            Self::UpdateCurrentState => host.run(|d| d.update_current_state().map(drop)),
            Self::Optimize { container } => host.run(|d| d.optimize(container).map(drop)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    pub action: Action,
    /// Bounds the host must report after the step.
    #[serde(default)]
    pub expect_bounds: Vec<(ComponentId, Rect)>,
    /// Exact dump of the whole model after the step.
    #[serde(default)]
    pub expect_dump: Option<String>,
    /// Designer state after the step.
    #[serde(default)]
    pub expect_state: Option<DesignerState>,
}

impl Step {
    #[must_use]
    pub fn new(name: &str, action: Action) -> Self {
        Self {
            name: name.to_string(),
            action,
            expect_bounds: Vec::new(),
            expect_dump: None,
            expect_state: None,
        }
    }

    #[must_use]
    pub fn expect_bounds(mut self, id: &str, bounds: Rect) -> Self {
        self.expect_bounds.push((ComponentId::new(id), bounds));
        self
    }

    #[must_use]
    pub fn expect_dump(mut self, dump: &str) -> Self {
        self.expect_dump = Some(dump.to_string());
        self
    }

    #[must_use]
    pub const fn expect_state(mut self, state: DesignerState) -> Self {
        self.expect_state = Some(state);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub steps: Vec<Step>,
}

/// A failed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioError {
    pub step: String,
    pub message: String,
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {}: {}", self.step, self.message)
    }
}

impl std::error::Error for ScenarioError {}

/// Checksums and dumps collected by a scenario run, one per step.
#[derive(Debug, Clone, Default)]
pub struct ScenarioRun {
    pub checksums: Vec<String>,
    pub dumps: Vec<String>,
}

impl Scenario {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            steps: Vec::new(),
        }
    }

    #[must_use]
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Run every step, stopping at the first failure.
    pub fn run(
        &self,
        host: &mut SimulatedHost,
        logger: &mut GoldenLogger,
    ) -> Result<ScenarioRun, ScenarioError> {
        info!(scenario = %self.name, steps = self.steps.len(), "scenario started");
        let mut run = ScenarioRun::default();
        for (index, step) in self.steps.iter().enumerate() {
            let fail = |message: String| ScenarioError {
                step: step.name.clone(),
                message,
            };
            step.action
                .apply(host)
                .map_err(|err| fail(format!("designer error: {err}")))?;

            if host.designer().state() == DesignerState::Idle {
                let report = host.designer().model().validate();
                if !report.is_clean() {
                    return Err(fail(format!("invariants violated: {:?}", report.codes())));
                }
            }
            if let Some(state) = step.expect_state
                && host.designer().state() != state
            {
                return Err(fail(format!(
                    "state {:?}, expected {state:?}",
                    host.designer().state()
                )));
            }
            for (id, expected) in &step.expect_bounds {
                let actual = host.bounds(id);
                if actual != Some(*expected) {
                    return Err(fail(format!("{id} at {actual:?}, expected {expected:?}")));
                }
            }
            let dump = host.designer().model().dump(None);
            if let Some(expected) = &step.expect_dump
                && &dump != expected
            {
                return Err(fail(format!("dump mismatch\n--- got\n{dump}--- expected\n{expected}")));
            }
            let checksum = compute_text_checksum(&dump);
            debug!(step = %step.name, checksum = %checksum, "step settled");
            logger.log_step(index, &step.name, &checksum);
            run.checksums.push(checksum);
            run.dumps.push(dump);
        }
        Ok(run)
    }
}
