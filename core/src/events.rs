use scopekeep_common::ports::events::{EventKind, EventSink};
use tracing::{error, info, warn};

/// Forwards inventory notifications to `tracing`.
pub struct TracingSink;

impl EventSink for TracingSink {
    fn notify(&self, kind: EventKind, message: &str) {
        match kind {
            EventKind::New => info!(target: "scopekeep::events", "{message}"),
            EventKind::Warning => warn!(target: "scopekeep::events", "{message}"),
            EventKind::Error => error!(target: "scopekeep::events", "{message}"),
        }
    }
}
