//! Health classification.
//!
//! `classify_health` is a pure function of
//! {memory stats, snapshot presence, locale count, prior issues} so the
//! degraded/error rules can be tested without a running process. The
//! process-level inputs (heap usage) come from `memory_stats`.

use serde::Serialize;
use sysinfo::{Pid, System};

/// Heap-usage fraction above which the hub reports itself degraded.
pub const HEAP_HIGH_WATER: f64 = 0.9;

/// Process memory usage against the machine total.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStats {
    pub heap_used_bytes: u64,
    pub heap_total_bytes: u64,
}

impl MemoryStats {
    /// Used/total ratio; zero when the total is unknown.
    pub fn usage_ratio(&self) -> f64 {
        if self.heap_total_bytes == 0 {
            return 0.0;
        }
        self.heap_used_bytes as f64 / self.heap_total_bytes as f64
    }
}

/// Read current process memory from the OS.
pub fn memory_stats() -> MemoryStats {
    let mut sys = System::new();
    sys.refresh_memory();

    let pid = Pid::from_u32(std::process::id());
    sys.refresh_processes(sysinfo::ProcessesToUpdate::Some(&[pid]), true);

    let heap_used_bytes = sys.process(pid).map(|p| p.memory()).unwrap_or(0);

    MemoryStats {
        heap_used_bytes,
        heap_total_bytes: sys.total_memory(),
    }
}

/// Health status classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Nothing wrong.
    Healthy,
    /// Process alive but constrained (high heap, missing database/locales).
    Degraded,
    /// The health check itself failed to execute.
    Error,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Error => "error",
        }
    }
}

/// Inputs to health classification.
#[derive(Debug, Clone)]
pub struct HealthInputs {
    pub memory: MemoryStats,
    /// Whether a competition snapshot has ever loaded with data.
    pub database_loaded: bool,
    pub locales_count: usize,
    /// Issues recorded by earlier stages of the check.
    pub prior_issues: Vec<String>,
    /// Whether the check itself failed to execute.
    pub check_failed: bool,
}

/// Classification result.
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub issues: Vec<String>,
}

/// Classify hub health.
///
/// `error` when the check itself failed; `degraded` when heap usage crosses
/// the high-water mark, no snapshot has ever loaded, or no locale data is
/// present. Multiple issues co-occur in the issues list.
pub fn classify_health(inputs: &HealthInputs) -> HealthReport {
    let mut issues = inputs.prior_issues.clone();

    if inputs.check_failed {
        issues.push("health check failed to execute".to_string());
        return HealthReport {
            status: HealthStatus::Error,
            issues,
        };
    }

    let ratio = inputs.memory.usage_ratio();
    if ratio >= HEAP_HIGH_WATER {
        issues.push(format!("heap usage at {:.0}% of available memory", ratio * 100.0));
    }

    if !inputs.database_loaded {
        issues.push("no competition database loaded".to_string());
    }

    if inputs.locales_count == 0 {
        issues.push("no translation locales loaded".to_string());
    }

    let status = if issues.is_empty() {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    HealthReport { status, issues }
}
