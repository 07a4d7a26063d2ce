//! Observer trait for workflow events.
//!
//! Register an [`Arc<dyn WorkflowObserver>`] with
//! [`crate::controller::Controller::add_observer`] to receive a fresh
//! [`RenderState`] after every operation, plus conversion lifecycle events.
//! This is how a host UI stays in sync without the controller knowing
//! anything about widgets: a terminal spinner, a web view bridge and a test
//! recorder are all just observers.
//!
//! # Example
//!
//! ```rust
//! use heic_convert::{Phase, RenderState, WorkflowObserver};
//! use std::sync::{Arc, Mutex};
//!
//! struct PhaseLog(Mutex<Vec<Phase>>);
//!
//! impl WorkflowObserver for PhaseLog {
//!     fn on_render(&self, state: &RenderState) {
//!         self.0.lock().unwrap().push(state.phase);
//!     }
//! }
//!
//! let log = Arc::new(PhaseLog(Mutex::new(Vec::new())));
//! let observer: Arc<dyn WorkflowObserver> = log.clone();
//! ```

use crate::controller::RenderState;
use crate::format::TargetFormat;
use std::sync::Arc;

/// Receives controller output.
///
/// Implementations must be `Send + Sync`; the CLI moves its observer into a
/// multi-threaded runtime. All methods have default no-op implementations so
/// callers only override what they care about.
pub trait WorkflowObserver: Send + Sync {
    /// Called after every operation, successful or not.
    fn on_render(&self, state: &RenderState) {
        let _ = state;
    }

    /// Called when the codec is about to be invoked.
    fn on_conversion_start(&self, file_name: &str, format: TargetFormat) {
        let _ = (file_name, format);
    }

    /// Called when a conversion produced an artifact.
    fn on_conversion_complete(&self, format: TargetFormat, size_bytes: usize, duration_ms: u64) {
        let _ = (format, size_bytes, duration_ms);
    }

    /// Called when a conversion failed. `detail` is the diagnostic that is
    /// kept out of the user-visible notice.
    fn on_conversion_error(&self, detail: String) {
        let _ = detail;
    }
}

/// A no-op implementation for callers that don't need events.
pub struct NoopObserver;

impl WorkflowObserver for NoopObserver {}

/// Convenience alias matching the type the controller stores.
pub type SharedObserver = Arc<dyn WorkflowObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
    }

    impl WorkflowObserver for Counting {
        fn on_conversion_start(&self, _file_name: &str, _format: TargetFormat) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_conversion_complete(&self, _format: TargetFormat, _size: usize, _ms: u64) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_conversion_error(&self, _detail: String) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_observer_does_not_panic() {
        let o = NoopObserver;
        o.on_conversion_start("a.heic", TargetFormat::Png);
        o.on_conversion_complete(TargetFormat::Png, 10, 1);
        o.on_conversion_error("boom".into());
    }

    #[test]
    fn counting_observer_receives_events() {
        let o = Counting {
            starts: AtomicUsize::new(0),
            completes: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
        };
        o.on_conversion_start("a.heic", TargetFormat::Jpeg);
        o.on_conversion_complete(TargetFormat::Jpeg, 100, 5);
        o.on_conversion_start("a.heic", TargetFormat::Jpeg);
        o.on_conversion_error("decoder exited with 1".into());

        assert_eq!(o.starts.load(Ordering::SeqCst), 2);
        assert_eq!(o.completes.load(Ordering::SeqCst), 1);
        assert_eq!(o.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn shared_observer_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn WorkflowObserver>();
        let o: SharedObserver = Arc::new(NoopObserver);
        o.on_conversion_error("x".into());
    }
}
