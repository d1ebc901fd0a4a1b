#![forbid(unsafe_code)]

//! The geometry oracle: the host toolkit's view of real component geometry.
//!
//! The engine never measures anything itself. Sizes, baselines, paddings and
//! the bounds of the last built layout all come from the oracle, and the engine
//! only ever holds a shared reference to it. Queries return `None` when the
//! host has no answer; the engine then falls back to its configured defaults.
//!
//! The three notification methods are fire-and-forget: the engine calls them
//! after it changed the model so the host can rebuild and repaint.

use crate::component::{ComponentId, PaddingType};
use crate::geometry::{Axis, Edge, Rect, Size};

/// Read-only geometry queries plus host notifications.
pub trait GeometryOracle {
    /// Bounds of a component as last laid out by the host.
    fn component_bounds(&self, id: &ComponentId) -> Option<Rect>;

    /// Interior (content area) of a container, in the same coordinates as
    /// its sub-component bounds.
    fn container_interior(&self, id: &ComponentId) -> Option<Rect>;

    fn component_minimum_size(&self, id: &ComponentId) -> Option<Size>;

    fn component_preferred_size(&self, id: &ComponentId) -> Option<Size>;

    /// Whether the host component has its own preferred size set explicitly.
    fn has_explicit_preferred_size(&self, id: &ComponentId) -> bool;

    /// Baseline offset from the top edge at the given size, `None` if the
    /// component has no baseline.
    fn baseline_position(&self, id: &ComponentId, width: i32, height: i32) -> Option<i32>;

    /// Preferred distance between `first` and `second` along `axis`, where
    /// `second_edge` tells on which side of `first` the second component lies.
    fn preferred_padding(
        &self,
        first: &ComponentId,
        second: &ComponentId,
        axis: Axis,
        second_edge: Edge,
        padding: PaddingType,
    ) -> Option<i32>;

    /// Preferred distance between a component edge and the container border.
    fn preferred_padding_in_parent(
        &self,
        parent: &ComponentId,
        component: &ComponentId,
        axis: Axis,
        component_edge: Edge,
    ) -> Option<i32>;

    /// Whether the component may be stretched along each axis.
    fn component_resizability(&self, id: &ComponentId) -> [bool; 2] {
        let _ = id;
        [true, true]
    }

    /// Nested components that are not laid out by this engine directly.
    fn indirect_sub_components(&self, id: &ComponentId) -> Vec<ComponentId> {
        let _ = id;
        Vec::new()
    }

    fn rebuild_layout(&self, container: &ComponentId) {
        let _ = container;
    }

    fn set_component_visibility(&self, id: &ComponentId, visible: bool) {
        let _ = (id, visible);
    }

    fn repaint_designer(&self, id: &ComponentId) {
        let _ = id;
    }
}

impl<O: GeometryOracle + ?Sized> GeometryOracle for &O {
    fn component_bounds(&self, id: &ComponentId) -> Option<Rect> {
        (**self).component_bounds(id)
    }

    fn container_interior(&self, id: &ComponentId) -> Option<Rect> {
        (**self).container_interior(id)
    }

    fn component_minimum_size(&self, id: &ComponentId) -> Option<Size> {
        (**self).component_minimum_size(id)
    }

    fn component_preferred_size(&self, id: &ComponentId) -> Option<Size> {
        (**self).component_preferred_size(id)
    }

    fn has_explicit_preferred_size(&self, id: &ComponentId) -> bool {
        (**self).has_explicit_preferred_size(id)
    }

    fn baseline_position(&self, id: &ComponentId, width: i32, height: i32) -> Option<i32> {
        (**self).baseline_position(id, width, height)
    }

    fn preferred_padding(
        &self,
        first: &ComponentId,
        second: &ComponentId,
        axis: Axis,
        second_edge: Edge,
        padding: PaddingType,
    ) -> Option<i32> {
        (**self).preferred_padding(first, second, axis, second_edge, padding)
    }

    fn preferred_padding_in_parent(
        &self,
        parent: &ComponentId,
        component: &ComponentId,
        axis: Axis,
        component_edge: Edge,
    ) -> Option<i32> {
        (**self).preferred_padding_in_parent(parent, component, axis, component_edge)
    }

    fn component_resizability(&self, id: &ComponentId) -> [bool; 2] {
        (**self).component_resizability(id)
    }

    fn indirect_sub_components(&self, id: &ComponentId) -> Vec<ComponentId> {
        (**self).indirect_sub_components(id)
    }

    fn rebuild_layout(&self, container: &ComponentId) {
        (**self).rebuild_layout(container);
    }

    fn set_component_visibility(&self, id: &ComponentId, visible: bool) {
        (**self).set_component_visibility(id, visible);
    }

    fn repaint_designer(&self, id: &ComponentId) {
        (**self).repaint_designer(id);
    }
}
