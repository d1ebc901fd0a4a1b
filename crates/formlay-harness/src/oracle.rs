#![forbid(unsafe_code)]

//! A geometry oracle answering from tables.
//!
//! Padding tables use the host's fixture keys:
//! `first-second-axis-edge-padding` for component pairs and
//! `parent-component-axis-edge` for container borders, with axes, edges and
//! padding types written as their ordinals.

use std::cell::RefCell;
use std::collections::BTreeMap;

use formlay_core::{Axis, ComponentId, Edge, GeometryOracle, PaddingType, Rect, Size};
use serde::{Deserialize, Serialize};

/// How a component's baseline depends on its height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineRule {
    /// Same offset at every size.
    Fixed(i32),
    /// Text centered vertically: `baseline` at `reference_height`, moving by
    /// half the height change.
    Centered { reference_height: i32, baseline: i32 },
}

impl BaselineRule {
    #[must_use]
    pub const fn at_height(self, height: i32) -> i32 {
        match self {
            Self::Fixed(baseline) => baseline,
            Self::Centered {
                reference_height,
                baseline,
            } => baseline + (height - reference_height) / 2,
        }
    }
}

/// Host notification recorded by [`ScriptedOracle`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notification {
    RebuildLayout(ComponentId),
    Visibility(ComponentId, bool),
    Repaint(ComponentId),
}

fn axis_key(axis: Axis) -> usize {
    axis.index()
}

fn edge_key(edge: Edge) -> usize {
    edge.index()
}

/// Key of a component-pair padding entry.
#[must_use]
pub fn padding_key(
    first: &ComponentId,
    second: &ComponentId,
    axis: Axis,
    second_edge: Edge,
    padding: PaddingType,
) -> String {
    format!(
        "{first}-{second}-{}-{}-{}",
        axis_key(axis),
        edge_key(second_edge),
        padding.ordinal()
    )
}

/// Key of a container-border padding entry.
#[must_use]
pub fn padding_in_parent_key(
    parent: &ComponentId,
    component: &ComponentId,
    axis: Axis,
    edge: Edge,
) -> String {
    format!("{parent}-{component}-{}-{}", axis_key(axis), edge_key(edge))
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ScriptedOracle {
    bounds: BTreeMap<ComponentId, Rect>,
    interiors: BTreeMap<ComponentId, Rect>,
    minimum: BTreeMap<ComponentId, Size>,
    preferred: BTreeMap<ComponentId, Size>,
    explicit_preferred: BTreeMap<ComponentId, bool>,
    baselines: BTreeMap<ComponentId, BaselineRule>,
    padding: BTreeMap<String, i32>,
    padding_in_parent: BTreeMap<String, i32>,
    resizability: BTreeMap<ComponentId, [bool; 2]>,
    indirect: BTreeMap<ComponentId, Vec<ComponentId>>,
    #[serde(skip)]
    notifications: RefCell<Vec<Notification>>,
}

impl ScriptedOracle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A container with its interior.
    #[must_use]
    pub fn with_container(mut self, id: &str, interior: Rect) -> Self {
        let id = ComponentId::new(id);
        let _ = self.interiors.insert(id.clone(), interior);
        let _ = self.bounds.insert(id.clone(), interior);
        let _ = self.preferred.insert(id, interior.size());
        self
    }

    /// A component whose preferred size equals its bounds.
    #[must_use]
    pub fn with_component(mut self, id: &str, bounds: Rect) -> Self {
        let id = ComponentId::new(id);
        let _ = self.preferred.insert(id.clone(), bounds.size());
        let _ = self.bounds.insert(id, bounds);
        self
    }

    #[must_use]
    pub fn with_minimum(mut self, id: &str, size: Size) -> Self {
        let _ = self.minimum.insert(ComponentId::new(id), size);
        self
    }

    #[must_use]
    pub fn with_baseline(mut self, id: &str, rule: BaselineRule) -> Self {
        let _ = self.baselines.insert(ComponentId::new(id), rule);
        self
    }

    #[must_use]
    pub fn with_padding(
        mut self,
        first: &str,
        second: &str,
        axis: Axis,
        second_edge: Edge,
        padding: PaddingType,
        value: i32,
    ) -> Self {
        let key = padding_key(
            &ComponentId::new(first),
            &ComponentId::new(second),
            axis,
            second_edge,
            padding,
        );
        let _ = self.padding.insert(key, value);
        self
    }

    #[must_use]
    pub fn with_padding_in_parent(
        mut self,
        parent: &str,
        component: &str,
        axis: Axis,
        edge: Edge,
        value: i32,
    ) -> Self {
        let key = padding_in_parent_key(
            &ComponentId::new(parent),
            &ComponentId::new(component),
            axis,
            edge,
        );
        let _ = self.padding_in_parent.insert(key, value);
        self
    }

    /// The same border padding on all four sides.
    #[must_use]
    pub fn with_uniform_padding_in_parent(mut self, parent: &str, component: &str, value: i32) -> Self {
        for axis in Axis::ALL {
            for edge in Edge::BOTH {
                self = self.with_padding_in_parent(parent, component, axis, edge, value);
            }
        }
        self
    }

    #[must_use]
    pub fn with_resizability(mut self, id: &str, resizability: [bool; 2]) -> Self {
        let _ = self.resizability.insert(ComponentId::new(id), resizability);
        self
    }

    #[must_use]
    pub fn with_indirect(mut self, id: &str, nested: &[&str]) -> Self {
        let nested = nested.iter().map(|n| ComponentId::new(*n)).collect();
        let _ = self.indirect.insert(ComponentId::new(id), nested);
        self
    }

    /// Host layout result for one component.
    pub fn set_bounds(&mut self, id: &ComponentId, bounds: Rect) {
        let _ = self.bounds.insert(id.clone(), bounds);
    }

    /// The component's natural size changed, e.g. its text grew.
    pub fn set_preferred(&mut self, id: &ComponentId, size: Size) {
        let _ = self.preferred.insert(id.clone(), size);
    }

    pub fn set_explicit_preferred(&mut self, id: &ComponentId, explicit: bool) {
        let _ = self.explicit_preferred.insert(id.clone(), explicit);
    }

    pub fn set_interior(&mut self, id: &ComponentId, interior: Rect) {
        let _ = self.interiors.insert(id.clone(), interior);
    }

    /// Drop every table entry of a hidden or deleted component.
    pub fn forget(&mut self, id: &ComponentId) {
        let _ = self.bounds.remove(id);
        let _ = self.interiors.remove(id);
        let _ = self.preferred.remove(id);
        let _ = self.minimum.remove(id);
    }

    /// Notifications received so far, oldest first.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.borrow().clone()
    }

    pub fn take_notifications(&self) -> Vec<Notification> {
        self.notifications.take()
    }

    fn notify(&self, notification: Notification) {
        self.notifications.borrow_mut().push(notification);
    }
}

impl GeometryOracle for ScriptedOracle {
    fn component_bounds(&self, id: &ComponentId) -> Option<Rect> {
        self.bounds.get(id).copied()
    }

    fn container_interior(&self, id: &ComponentId) -> Option<Rect> {
        self.interiors.get(id).copied()
    }

    fn component_minimum_size(&self, id: &ComponentId) -> Option<Size> {
        self.minimum.get(id).copied()
    }

    fn component_preferred_size(&self, id: &ComponentId) -> Option<Size> {
        self.preferred.get(id).copied()
    }

    fn has_explicit_preferred_size(&self, id: &ComponentId) -> bool {
        self.explicit_preferred.get(id).copied().unwrap_or(false)
    }

    fn baseline_position(&self, id: &ComponentId, _width: i32, height: i32) -> Option<i32> {
        self.baselines.get(id).map(|rule| rule.at_height(height))
    }

    fn preferred_padding(
        &self,
        first: &ComponentId,
        second: &ComponentId,
        axis: Axis,
        second_edge: Edge,
        padding: PaddingType,
    ) -> Option<i32> {
        self.padding
            .get(&padding_key(first, second, axis, second_edge, padding))
            .copied()
    }

    fn preferred_padding_in_parent(
        &self,
        parent: &ComponentId,
        component: &ComponentId,
        axis: Axis,
        component_edge: Edge,
    ) -> Option<i32> {
        self.padding_in_parent
            .get(&padding_in_parent_key(parent, component, axis, component_edge))
            .copied()
    }

    fn component_resizability(&self, id: &ComponentId) -> [bool; 2] {
        self.resizability.get(id).copied().unwrap_or([true, true])
    }

    fn indirect_sub_components(&self, id: &ComponentId) -> Vec<ComponentId> {
        self.indirect.get(id).cloned().unwrap_or_default()
    }

    fn rebuild_layout(&self, container: &ComponentId) {
        self.notify(Notification::RebuildLayout(container.clone()));
    }

    fn set_component_visibility(&self, id: &ComponentId, visible: bool) {
        self.notify(Notification::Visibility(id.clone(), visible));
    }

    fn repaint_designer(&self, id: &ComponentId) {
        self.notify(Notification::Repaint(id.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_keys_use_ordinals() {
        let key = padding_key(
            &ComponentId::new("jTextField1"),
            &ComponentId::new("jLabel2"),
            Axis::Vertical,
            Edge::Trailing,
            PaddingType::Related,
        );
        assert_eq!(key, "jTextField1-jLabel2-1-1-0");
        let key = padding_in_parent_key(
            &ComponentId::new("Form"),
            &ComponentId::new("jLabel2"),
            Axis::Vertical,
            Edge::Trailing,
        );
        assert_eq!(key, "Form-jLabel2-1-1");
    }

    #[test]
    fn centered_baseline_follows_height() {
        let rule = BaselineRule::Centered {
            reference_height: 20,
            baseline: 14,
        };
        assert_eq!(rule.at_height(20), 14);
        assert_eq!(rule.at_height(55), 31);
        assert_eq!(BaselineRule::Fixed(11).at_height(90), 11);
    }

    #[test]
    fn notifications_are_recorded_in_order() {
        let oracle = ScriptedOracle::new();
        let form = ComponentId::new("Form");
        oracle.rebuild_layout(&form);
        oracle.set_component_visibility(&form, false);
        assert_eq!(
            oracle.take_notifications(),
            vec![
                Notification::RebuildLayout(form.clone()),
                Notification::Visibility(form, false),
            ]
        );
        assert!(oracle.notifications().is_empty());
    }

    #[test]
    fn missing_entries_answer_none() {
        let oracle = ScriptedOracle::new().with_component("a", Rect::new(0, 0, 10, 10));
        let a = ComponentId::new("a");
        assert_eq!(oracle.baseline_position(&a, 10, 10), None);
        assert_eq!(
            oracle.preferred_padding(&a, &a, Axis::Horizontal, Edge::Trailing, PaddingType::Related),
            None
        );
        assert_eq!(oracle.component_resizability(&a), [true, true]);
    }
}
