//! Severity based destination routing
//!
//! Records at `Error` and above always go to the high-priority destination.
//! Records between the configured threshold and `Error` go to the
//! low-priority destination. Everything else is dropped by the router.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::severity::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    High,
    Low,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::High => "high",
            Destination::Low => "low",
        }
    }
}

/// Stateless routing decision
pub fn route(threshold: Severity, severity: Severity) -> Option<Destination> {
    if severity >= Severity::Error {
        Some(Destination::High)
    } else if severity >= threshold {
        Some(Destination::Low)
    } else {
        None
    }
}

/// Shared, atomically updatable threshold
#[derive(Debug, Clone)]
pub struct ThresholdHandle(Arc<AtomicU8>);

impl ThresholdHandle {
    pub fn get(&self) -> Severity {
        Severity::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, threshold: Severity) {
        self.0.store(threshold as u8, Ordering::Release);
    }
}

#[derive(Debug, Clone)]
pub struct SeverityRouter {
    threshold: ThresholdHandle,
}

impl SeverityRouter {
    pub fn new(threshold: Severity) -> Self {
        SeverityRouter {
            threshold: ThresholdHandle(Arc::new(AtomicU8::new(threshold as u8))),
        }
    }

    pub fn threshold(&self) -> Severity {
        self.threshold.get()
    }

    /// Handle for changing verbosity while the router is in use
    pub fn handle(&self) -> ThresholdHandle {
        self.threshold.clone()
    }

    pub fn route(&self, severity: Severity) -> Option<Destination> {
        route(self.threshold(), severity)
    }
}

impl Default for SeverityRouter {
    fn default() -> Self {
        SeverityRouter::new(Severity::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_and_above_always_high() {
        for threshold in Severity::ALL {
            assert_eq!(route(threshold, Severity::Error), Some(Destination::High));
            assert_eq!(route(threshold, Severity::Fatal), Some(Destination::High));
        }
    }

    #[test]
    fn below_error_respects_threshold() {
        assert_eq!(route(Severity::Warn, Severity::Warn), Some(Destination::Low));
        assert_eq!(route(Severity::Warn, Severity::Info), None);
        assert_eq!(route(Severity::Debug, Severity::Debug), Some(Destination::Low));
        assert_eq!(route(Severity::Fatal, Severity::Warn), None);
    }

    #[test]
    fn partition_covers_everything_at_or_above_threshold() {
        for threshold in Severity::ALL {
            for severity in Severity::ALL {
                let routed = route(threshold, severity);
                let expected_kept = severity >= threshold || severity >= Severity::Error;
                assert_eq!(routed.is_some(), expected_kept, "{threshold} / {severity}");
                if routed == Some(Destination::Low) {
                    assert!(severity < Severity::Error);
                }
            }
        }
    }

    #[test]
    fn live_threshold_is_shared_between_clones() {
        let router = SeverityRouter::new(Severity::Warn);
        let copy = router.clone();
        assert_eq!(copy.route(Severity::Info), None);

        router.handle().set(Severity::Debug);
        assert_eq!(copy.threshold(), Severity::Debug);
        assert_eq!(copy.route(Severity::Info), Some(Destination::Low));
    }

    #[test]
    fn default_threshold_is_warn() {
        assert_eq!(SeverityRouter::default().threshold(), Severity::Warn);
    }
}
