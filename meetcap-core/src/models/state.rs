/// Projected status of a capture session's streams.
///
/// Derived from the underlying stream handles: `Closed` when no stream
/// exists, `Stopped` when a stream exists but is paused, `Running` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Closed,
    Stopped,
    Running,
}

impl StreamState {
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}
