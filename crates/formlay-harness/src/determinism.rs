#![forbid(unsafe_code)]

//! Deterministic fixtures for property and scenario tests.
//!
//! Seed selection and run ids live here so a failing randomized gesture
//! sequence can be replayed with `FORMLAY_TEST_SEED=<seed>`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::info_span;

/// Counter for gesture runs executed in-process.
static GESTURE_RUNS_TOTAL: AtomicU64 = AtomicU64::new(0);

#[must_use]
pub fn gesture_runs_total() -> u64 {
    GESTURE_RUNS_TOTAL.load(Ordering::Relaxed)
}

/// Shared deterministic fixture for a test run.
#[derive(Debug, Clone)]
pub struct DeterminismFixture {
    seed: u64,
    deterministic: bool,
    run_id: String,
}

impl DeterminismFixture {
    /// Create a fixture with the seed taken from the environment, or
    /// `default_seed`.
    #[must_use]
    pub fn new(prefix: &str, default_seed: u64) -> Self {
        Self::new_with(prefix, fixture_seed(default_seed), deterministic_mode())
    }

    #[must_use]
    pub fn new_with(prefix: &str, seed: u64, deterministic: bool) -> Self {
        let run_id = if deterministic {
            format!("{prefix}_seed{seed}")
        } else {
            format!("{prefix}_{}_{}", std::process::id(), unix_secs())
        };
        Self {
            seed,
            deterministic,
            run_id,
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn deterministic(&self) -> bool {
        self.deterministic
    }

    /// Stable run identifier for JSONL logs.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// A generator seeded from this fixture.
    #[must_use]
    pub const fn rng(&self) -> XorShift {
        XorShift::new(self.seed)
    }

    /// Run `body` inside a tracing span tagged with the run id and seed.
    pub fn run<T>(&self, name: &str, body: impl FnOnce(&mut XorShift) -> T) -> T {
        let _span = info_span!(
            "gesture_run",
            scenario = name,
            run_id = %self.run_id,
            seed = self.seed,
        )
        .entered();
        let _ = GESTURE_RUNS_TOTAL.fetch_add(1, Ordering::Relaxed);
        let mut rng = self.rng();
        body(&mut rng)
    }
}

/// xorshift64* generator.
#[derive(Debug, Clone)]
pub struct XorShift(u64);

impl XorShift {
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(if seed == 0 { 0x9e37_79b9_7f4a_7c15 } else { seed })
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.0 = x;
        x.wrapping_mul(0x2545_f491_4f6c_dd1d)
    }

    /// Uniform value in `lo..hi`. Returns `lo` for an empty range.
    pub fn range(&mut self, lo: i32, hi: i32) -> i32 {
        if hi <= lo {
            return lo;
        }
        let width = u64::from(hi.abs_diff(lo));
        lo + (self.next_u64() % width) as i32
    }

    pub fn chance(&mut self, percent: u64) -> bool {
        self.next_u64() % 100 < percent
    }
}

/// True when `FORMLAY_TEST_DETERMINISTIC` (or `FORMLAY_DETERMINISTIC`) is set.
#[must_use]
pub fn deterministic_mode() -> bool {
    env_flag("FORMLAY_TEST_DETERMINISTIC") || env_flag("FORMLAY_DETERMINISTIC")
}

/// Choose a seed from the environment or use the provided default.
#[must_use]
pub fn fixture_seed(default_seed: u64) -> u64 {
    env_u64("FORMLAY_TEST_SEED")
        .or_else(|| env_u64("FORMLAY_SEED"))
        .unwrap_or(default_seed)
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_flag(key: &str) -> bool {
    matches!(
        std::env::var(key).as_deref(),
        Ok("1") | Ok("true") | Ok("TRUE")
    )
}

fn unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
