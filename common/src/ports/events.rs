use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    New,
    Warning,
    Error,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EventKind::New => "new",
            EventKind::Warning => "warning",
            EventKind::Error => "error",
        };
        f.write_str(label)
    }
}

/// Receives notifications about inventory changes.
///
/// Purely informational: nothing the sink does affects classification.
pub trait EventSink: Send + Sync {
    fn notify(&self, kind: EventKind, message: &str);
}
