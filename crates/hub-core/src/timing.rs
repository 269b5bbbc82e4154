//! Opt-in latency collection for commands and GraphQL requests.
//!
//! Samples are process-wide because requests execute on dispatcher worker
//! threads while commands are timed on the main thread. Names follow
//! `cmd.<command>` and `gql.<operation>`.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde_json::json;

/// Samples grouped by operation name as they arrive.
static SAMPLES: Mutex<BTreeMap<String, Vec<Duration>>> = Mutex::new(BTreeMap::new());
static ENABLED: AtomicBool = AtomicBool::new(false);

/// Per-operation latency summary, sorted by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingReport {
    pub operations: Vec<OpTiming>,
}

/// Latency figures for one named operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpTiming {
    pub name: String,
    pub count: usize,
    pub p50: Duration,
    pub p95: Duration,
    pub p99: Duration,
    pub max: Duration,
}

impl OpTiming {
    fn summarize(name: String, mut samples: Vec<Duration>) -> Self {
        samples.sort_unstable();
        Self {
            count: samples.len(),
            p50: nearest_rank(&samples, 50),
            p95: nearest_rank(&samples, 95),
            p99: nearest_rank(&samples, 99),
            max: samples.last().copied().unwrap_or_default(),
            name,
        }
    }
}

/// Whether `HUB_TIMING` asks for timing (`1`, `true`, `yes` or `on`, any case).
#[must_use]
pub fn timing_enabled_from_env() -> bool {
    std::env::var("HUB_TIMING").is_ok_and(|value| env_flag(&value))
}

/// Turn collection on or off. Turning it off discards what was recorded.
pub fn set_timing_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
    if !enabled {
        clear_timings();
    }
}

#[must_use]
pub fn is_timing_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

pub fn clear_timings() {
    if let Ok(mut samples) = SAMPLES.lock() {
        samples.clear();
    }
}

/// Run `f`, recording how long it took under `name`.
pub fn timed<R>(name: &str, f: impl FnOnce() -> R) -> R {
    if !is_timing_enabled() {
        return f();
    }
    let started = Instant::now();
    let result = f();
    record_sample(name, started.elapsed());
    result
}

/// Record one sample. A no-op while timing is disabled.
pub fn record_sample(name: &str, elapsed: Duration) {
    if !is_timing_enabled() {
        return;
    }
    if let Ok(mut samples) = SAMPLES.lock() {
        samples.entry(name.to_owned()).or_default().push(elapsed);
    }
}

/// Take every recorded sample and summarize it.
#[must_use]
pub fn collect_report() -> TimingReport {
    let grouped = SAMPLES
        .lock()
        .map(|mut samples| std::mem::take(&mut *samples))
        .unwrap_or_default();
    TimingReport {
        operations: grouped
            .into_iter()
            .map(|(name, samples)| OpTiming::summarize(name, samples))
            .collect(),
    }
}

impl TimingReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Microsecond figures, one object per operation.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let operations: Vec<_> = self
            .operations
            .iter()
            .map(|op| {
                json!({
                    "name": op.name,
                    "count": op.count,
                    "p50_us": op.p50.as_micros(),
                    "p95_us": op.p95.as_micros(),
                    "p99_us": op.p99.as_micros(),
                    "max_us": op.max.as_micros(),
                })
            })
            .collect();
        json!({ "operations": operations })
    }

    /// Fixed-width table for stderr; the name column fits the longest name.
    #[must_use]
    pub fn display_table(&self) -> String {
        if self.operations.is_empty() {
            return "No timing samples recorded.".to_owned();
        }
        let width = self
            .operations
            .iter()
            .map(|op| op.name.len())
            .chain(std::iter::once("operation".len()))
            .max()
            .unwrap_or_default();

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<width$}  {:>5}  {:>9}  {:>9}  {:>9}  {:>9}",
            "operation", "count", "p50", "p95", "p99", "max"
        );
        let _ = writeln!(out, "{}", "-".repeat(width + 54));
        for op in &self.operations {
            let _ = writeln!(
                out,
                "{:<width$}  {:>5}  {:>9}  {:>9}  {:>9}  {:>9}",
                op.name,
                op.count,
                human(op.p50),
                human(op.p95),
                human(op.p99),
                human(op.max),
            );
        }
        out
    }
}

/// Nearest-rank percentile over sorted samples.
fn nearest_rank(sorted: &[Duration], pct: usize) -> Duration {
    let rank = (sorted.len() * pct.min(100)).div_ceil(100).max(1);
    sorted.get(rank - 1).copied().unwrap_or_default()
}

fn human(duration: Duration) -> String {
    match duration.as_micros() {
        0..1_000 => format!("{}µs", duration.as_micros()),
        1_000..1_000_000 => format!("{:.2}ms", duration.as_secs_f64() * 1_000.0),
        _ => format!("{:.2}s", duration.as_secs_f64()),
    }
}

fn env_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
