#![forbid(unsafe_code)]

//! In-crate oracle for unit tests.

use std::collections::BTreeMap;

use formlay_core::{Axis, ComponentId, Edge, GeometryOracle, PaddingType, Rect, Size};

#[derive(Debug, Default)]
pub(crate) struct StubOracle {
    pub bounds: BTreeMap<ComponentId, Rect>,
    pub preferred: BTreeMap<ComponentId, Size>,
    /// Fixed ascent per component, independent of size.
    pub baselines: BTreeMap<ComponentId, i32>,
    pub interior: Option<Rect>,
    pub resizable: bool,
}

impl StubOracle {
    pub fn with_component(mut self, id: &str, bounds: Rect) -> Self {
        let _ = self.preferred.insert(ComponentId::new(id), bounds.size());
        let _ = self.bounds.insert(ComponentId::new(id), bounds);
        self
    }

    pub fn with_baseline(mut self, id: &str, ascent: i32) -> Self {
        let _ = self.baselines.insert(ComponentId::new(id), ascent);
        self
    }
}

impl GeometryOracle for StubOracle {
    fn component_bounds(&self, id: &ComponentId) -> Option<Rect> {
        self.bounds.get(id).copied()
    }
    fn container_interior(&self, _id: &ComponentId) -> Option<Rect> {
        self.interior
    }
    fn component_minimum_size(&self, _id: &ComponentId) -> Option<Size> {
        None
    }
    fn component_preferred_size(&self, id: &ComponentId) -> Option<Size> {
        self.preferred.get(id).copied()
    }
    fn has_explicit_preferred_size(&self, _id: &ComponentId) -> bool {
        false
    }
    fn baseline_position(&self, id: &ComponentId, _width: i32, _height: i32) -> Option<i32> {
        self.baselines.get(id).copied()
    }
    fn preferred_padding(
        &self,
        _first: &ComponentId,
        _second: &ComponentId,
        _axis: Axis,
        _second_edge: Edge,
        _padding: PaddingType,
    ) -> Option<i32> {
        None
    }
    fn preferred_padding_in_parent(
        &self,
        _parent: &ComponentId,
        _component: &ComponentId,
        _axis: Axis,
        _component_edge: Edge,
    ) -> Option<i32> {
        None
    }
    fn component_resizability(&self, _id: &ComponentId) -> [bool; 2] {
        [self.resizable; 2]
    }
}
