#![forbid(unsafe_code)]

//! Canonical text dump of the interval trees.
//!
//! The dump is the equality currency of the test suite: two models whose
//! dumps match are structurally identical. It lists containers in id order,
//! then the horizontal and the vertical tree, depth-first, one interval per
//! line. Sequence and parallel children keep their stored order. Built spans
//! and interval ids are deliberately absent.

use std::fmt::Write as _;

use formlay_core::{Axis, ComponentId, PaddingType};

use crate::interval::{IntervalId, IntervalKind, IntervalRecord};
use crate::model::{LayoutComponent, LayoutModel};

const INDENT: &str = "  ";

impl LayoutModel {
    /// Dump one container, or every container when `None`.
    ///
    /// An unknown container dumps as an empty string.
    #[must_use]
    pub fn dump(&self, container: Option<&ComponentId>) -> String {
        let mut out = String::new();
        match container {
            Some(id) => {
                if let Ok(component) = self.layout_component(id)
                    && component.is_container()
                {
                    self.dump_container(component, &mut out);
                }
            }
            None => {
                for component in self.containers() {
                    self.dump_container(component, &mut out);
                }
            }
        }
        out
    }

    /// Dump a single subtree without the container header.
    #[must_use]
    pub fn dump_interval(&self, id: IntervalId) -> String {
        let mut out = String::new();
        self.dump_node(id, 0, &mut out);
        out
    }

    /// FNV-1a hash of the full dump.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0000_0001_0000_01b3;

        let mut hash = OFFSET_BASIS;
        for byte in self.dump(None).bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(PRIME);
        }
        hash
    }

    fn dump_container(&self, component: &LayoutComponent, out: &mut String) {
        let _ = writeln!(out, "container {}", component.id);
        for axis in Axis::ALL {
            let _ = writeln!(out, "{INDENT}{}", axis.as_str());
            if let Some(root) = component.root(axis) {
                self.dump_node(root, 2, out);
            }
        }
    }

    fn dump_node(&self, id: IntervalId, depth: usize, out: &mut String) {
        let Some(record) = self.get(id) else {
            return;
        };
        for _ in 0..depth {
            out.push_str(INDENT);
        }
        out.push_str(record.kind.name());
        if let IntervalKind::Single { component } = &record.kind {
            let _ = write!(out, " {component}");
        }
        let in_parallel = record
            .parent
            .and_then(|p| self.get(p))
            .is_some_and(IntervalRecord::is_parallel);
        if in_parallel {
            let _ = write!(out, " align={}", record.alignment);
        }
        match &record.kind {
            IntervalKind::Parallel {
                group_alignment, ..
            } => {
                let _ = write!(out, " group={group_alignment}");
            }
            IntervalKind::Sequential { .. } => {}
            IntervalKind::Gap { padding } => {
                self.write_sizes(record, out);
                if let Some(padding) = (*padding).filter(|p| *p != PaddingType::Related) {
                    let _ = write!(out, " padding={padding}");
                }
            }
            IntervalKind::Single { component } => {
                self.write_sizes(record, out);
                let explicit = self
                    .layout_component(component)
                    .ok()
                    .and_then(|c| {
                        Axis::ALL
                            .into_iter()
                            .find(|axis| c.interval(*axis) == Some(id))
                            .map(|axis| c.has_explicit_size(axis))
                    })
                    .unwrap_or(false);
                let _ = write!(out, " explicit={explicit}");
            }
        }
        out.push('\n');
        for child in record.children() {
            self.dump_node(*child, depth + 1, out);
        }
    }

    fn write_sizes(&self, record: &IntervalRecord, out: &mut String) {
        let _ = write!(
            out,
            " min={} pref={} max={} resizing={}",
            record.sizes.min.token(),
            record.sizes.pref.token(),
            record.sizes.max.token(),
            record.is_resizing()
        );
    }
}
