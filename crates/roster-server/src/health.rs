//! `/health` and `/ready`.
//!
//! Liveness is unconditional: if the process can answer, it is alive.
//! Readiness turns false when the server starts draining or when any
//! registered probe fails, which lets a load balancer stop routing here
//! before the listener closes.
//!
//! ```rust
//! use roster_server::{HealthCheck, ReadinessCheck};
//!
//! let health = HealthCheck::new("roster", "0.1.0");
//! assert_eq!(health.status().status, "healthy");
//!
//! let readiness = ReadinessCheck::new().add_check("storage", || true);
//! assert!(readiness.is_ready());
//!
//! readiness.set_ready(false);
//! assert!(!readiness.status().ready);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// JSON body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    /// Always `healthy`.
    pub status: String,
    /// Package name.
    pub service: String,
    /// Package version.
    pub version: String,
    /// Whole seconds since startup.
    pub uptime_seconds: u64,
}

/// Produces [`HealthStatus`] bodies.
#[derive(Debug, Clone)]
pub struct HealthCheck {
    service: String,
    version: String,
    started: Instant,
}

impl HealthCheck {
    /// Starts the uptime clock.
    #[must_use]
    pub fn new(service: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            version: version.into(),
            started: Instant::now(),
        }
    }

    /// Snapshot for one response.
    #[must_use]
    pub fn status(&self) -> HealthStatus {
        HealthStatus {
            status: "healthy".to_owned(),
            service: self.service.clone(),
            version: self.version.clone(),
            uptime_seconds: self.started.elapsed().as_secs(),
        }
    }
}

/// JSON body of `GET /ready`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadinessStatus {
    /// Not draining and every probe passed.
    pub ready: bool,
    /// Probe results by name.
    pub checks: BTreeMap<String, bool>,
}

impl ReadinessStatus {
    /// Result of the probe called `name`.
    #[must_use]
    pub fn check(&self, name: &str) -> Option<bool> {
        self.checks.get(name).copied()
    }
}

type Probe = Arc<dyn Fn() -> bool + Send + Sync>;

/// Drain flag plus named probes.
///
/// Clones share the flag: the server flips it on shutdown and the app's
/// copy reports it.
#[derive(Clone)]
pub struct ReadinessCheck {
    probes: Vec<(String, Probe)>,
    draining: Arc<AtomicBool>,
}

impl ReadinessCheck {
    /// Ready, with no probes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            probes: Vec::new(),
            draining: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Registers a probe run on every `/ready` request. Keep it cheap.
    #[must_use]
    pub fn add_check(
        mut self,
        name: impl Into<String>,
        probe: impl Fn() -> bool + Send + Sync + 'static,
    ) -> Self {
        self.probes.push((name.into(), Arc::new(probe)));
        self
    }

    /// Runs the probes and folds in the drain flag.
    #[must_use]
    pub fn status(&self) -> ReadinessStatus {
        let mut checks = BTreeMap::new();
        for (name, probe) in &self.probes {
            checks.insert(name.clone(), probe());
        }
        ReadinessStatus {
            ready: !self.draining.load(Ordering::Acquire) && checks.values().all(|ok| *ok),
            checks,
        }
    }

    /// Shorthand for `status().ready`.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.status().ready
    }

    /// `false` marks the service as draining.
    pub fn set_ready(&self, ready: bool) {
        self.draining.store(!ready, Ordering::Release);
    }
}

impl Default for ReadinessCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReadinessCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.probes.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("ReadinessCheck")
            .field("probes", &names)
            .field("draining", &self.draining.load(Ordering::Acquire))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_health_body() {
        let body = serde_json::to_value(HealthCheck::new("roster", "1.2.3").status()).unwrap();
        assert_eq!(
            body,
            json!({"status": "healthy", "service": "roster", "version": "1.2.3", "uptime_seconds": 0})
        );
    }

    #[test]
    fn test_one_failing_probe_is_enough() {
        let status = ReadinessCheck::new()
            .add_check("storage", || true)
            .add_check("store", || false)
            .status();

        assert!(!status.ready);
        assert_eq!(status.check("storage"), Some(true));
        assert_eq!(status.check("store"), Some(false));
        assert_eq!(status.check("cache"), None);
    }

    #[test]
    fn test_drain_flag_is_shared() {
        let app_side = ReadinessCheck::new().add_check("storage", || true);
        let server_side = app_side.clone();

        server_side.set_ready(false);
        let status = app_side.status();
        assert!(!status.ready);
        assert_eq!(status.check("storage"), Some(true));

        server_side.set_ready(true);
        assert!(app_side.is_ready());
    }

    #[test]
    fn test_ready_body() {
        let readiness = ReadinessCheck::new().add_check("storage", || true);
        let json = serde_json::to_string(&readiness.status()).unwrap();
        assert_eq!(json, r#"{"ready":true,"checks":{"storage":true}}"#);
    }
}
