#![forbid(unsafe_code)]

//! Test harness for formlay.
//!
//! # Role in formlay
//! The engine only ever talks to a host through a
//! [`GeometryOracle`](formlay_core::GeometryOracle). This crate supplies a
//! table-driven one ([`ScriptedOracle`]), a [`SimulatedHost`] that lays
//! components out after each designer call, data-driven [`Scenario`]s, and
//! golden checksums over layout dumps.
//!
//! # Key modules
//! - [`oracle`]: fixtures keyed the way the host's padding tables are.
//! - [`host`]: solve-and-write-back loop.
//! - [`scenario`]: serializable gesture scripts.
//! - [`golden`]: BLAKE3 checksums, golden files, JSONL logs.
//! - [`determinism`]: seeds and run ids for randomized runs.
//! - [`fixtures`]: the text-field form and grid layouts.

pub mod determinism;
pub mod fixtures;
pub mod golden;
pub mod host;
pub mod oracle;
pub mod scenario;

pub use determinism::{DeterminismFixture, XorShift, fixture_seed};
pub use golden::{
    GoldenLogger, GoldenOutcome, compute_text_checksum, golden_checksum_path, is_bless_mode,
    load_golden_checksums, save_golden_checksums, verify_checksums,
};
pub use host::SimulatedHost;
pub use oracle::{BaselineRule, Notification, ScriptedOracle};
pub use scenario::{Action, Scenario, ScenarioError, ScenarioRun, Step};
