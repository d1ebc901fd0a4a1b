#![forbid(unsafe_code)]

//! A simulated host that lays components out the way a real toolkit would.
//!
//! After every designer call the host drains the oracle's notifications,
//! solves each container that asked for a rebuild and writes the resulting
//! bounds back into the oracle. Nested containers get their new bounds as
//! their interior and are solved in turn.

use std::collections::{BTreeSet, VecDeque};

use formlay_core::{ComponentId, GeometryOracle, Rect, info_span, trace};
use formlay_designer::{DesignerConfig, DesignerError, LayoutDesigner};

use crate::oracle::{Notification, ScriptedOracle};

pub struct SimulatedHost {
    designer: LayoutDesigner<ScriptedOracle>,
    hidden: BTreeSet<ComponentId>,
}

impl SimulatedHost {
    pub fn new(oracle: ScriptedOracle, config: DesignerConfig) -> Result<Self, DesignerError> {
        Ok(Self {
            designer: LayoutDesigner::new(oracle, config)?,
            hidden: BTreeSet::new(),
        })
    }

    /// Host over a designer that already holds a model.
    #[must_use]
    pub fn from_designer(designer: LayoutDesigner<ScriptedOracle>) -> Self {
        Self {
            designer,
            hidden: BTreeSet::new(),
        }
    }

    #[must_use]
    pub const fn designer(&self) -> &LayoutDesigner<ScriptedOracle> {
        &self.designer
    }

    pub fn designer_mut(&mut self) -> &mut LayoutDesigner<ScriptedOracle> {
        &mut self.designer
    }

    #[must_use]
    pub fn bounds(&self, id: &ComponentId) -> Option<Rect> {
        self.designer.oracle().component_bounds(id)
    }

    /// Components hidden by the designer so far.
    #[must_use]
    pub const fn hidden(&self) -> &BTreeSet<ComponentId> {
        &self.hidden
    }

    /// Process pending notifications. Returns the containers laid out, in
    /// order.
    pub fn settle(&mut self) -> Result<Vec<ComponentId>, DesignerError> {
        let _span = info_span!("host_settle").entered();
        let mut queue = VecDeque::new();
        for notification in self.designer.oracle().take_notifications() {
            match notification {
                Notification::RebuildLayout(container) => {
                    if !queue.contains(&container) {
                        queue.push_back(container);
                    }
                }
                Notification::Visibility(id, visible) => {
                    if visible {
                        let _ = self.hidden.remove(&id);
                    } else {
                        self.designer.oracle_mut().forget(&id);
                        let _ = self.hidden.insert(id);
                    }
                }
                Notification::Repaint(_) => {}
            }
        }

        let mut laid_out = Vec::new();
        while let Some(container) = queue.pop_front() {
            if !self.designer.model().contains_component(&container) {
                continue;
            }
            let solved = self.designer.solve(&container)?;
            for (id, rect) in &solved.bounds {
                let is_container = self
                    .designer
                    .model()
                    .layout_component(id)
                    .is_ok_and(|c| c.is_container());
                let oracle = self.designer.oracle_mut();
                let moved = oracle.component_bounds(id) != Some(*rect);
                oracle.set_bounds(id, *rect);
                if is_container && moved {
                    oracle.set_interior(id, Rect::from_size(rect.width, rect.height));
                    if !queue.contains(id) {
                        queue.push_back(id.clone());
                    }
                }
                trace!(component = %id, x = rect.x, y = rect.y, w = rect.width, h = rect.height, "placed");
            }
            laid_out.push(container);
        }
        Ok(laid_out)
    }

    /// Lay out every container again, as a host does after it changed
    /// component sizes on its own.
    pub fn relayout(&mut self) -> Result<Vec<ComponentId>, DesignerError> {
        for container in self.designer.model().containers() {
            self.designer.oracle().rebuild_layout(&container.id);
        }
        self.settle()
    }

    /// Run a designer call and settle the host afterwards.
    pub fn run<T>(
        &mut self,
        call: impl FnOnce(&mut LayoutDesigner<ScriptedOracle>) -> Result<T, DesignerError>,
    ) -> Result<T, DesignerError> {
        let value = call(&mut self.designer)?;
        let _ = self.settle()?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use formlay_core::Size;

    use super::*;

    fn form_host() -> SimulatedHost {
        let oracle = ScriptedOracle::new()
            .with_container("Form", Rect::from_size(400, 300))
            .with_uniform_padding_in_parent("Form", "a", 10);
        let mut host = SimulatedHost::new(oracle, DesignerConfig::default()).expect("host");
        host.run(|d| d.add_container(&ComponentId::new("Form"), None, None))
            .expect("form");
        host
    }

    #[test]
    fn settle_pushes_solved_bounds_into_oracle() {
        let mut host = form_host();
        let a = ComponentId::new("a");
        host.designer_mut()
            .oracle_mut()
            .set_preferred(&a, Size::new(50, 20));
        host.run(|d| d.add_component(&ComponentId::new("Form"), &a, Rect::new(30, 40, 50, 20)))
            .expect("add");
        assert_eq!(host.bounds(&a), Some(Rect::new(30, 40, 50, 20)));
        assert!(host.designer().oracle().notifications().is_empty());
    }

    #[test]
    fn removal_hides_component() {
        let mut host = form_host();
        let a = ComponentId::new("a");
        host.designer_mut()
            .oracle_mut()
            .set_preferred(&a, Size::new(50, 20));
        host.run(|d| d.add_component(&ComponentId::new("Form"), &a, Rect::new(30, 40, 50, 20)))
            .expect("add");
        host.run(|d| d.remove_component(&a, true)).expect("remove");
        assert!(host.hidden().contains(&a));
        assert_eq!(host.bounds(&a), None);
        assert!(!host.designer().model().contains_component(&a));
    }
}
