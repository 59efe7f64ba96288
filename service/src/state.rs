//! Service lifecycle states.

/// Service operational state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Built, dispatch workers not yet running.
    Starting,
    /// Dispatch workers running.
    Running,
    /// Dispatch queues closing.
    Stopping,
    /// Dispatch queues closed.
    Stopped,
}

impl ServiceState {
    /// Check if the service is stopping or stopped.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ServiceState::Stopping | ServiceState::Stopped)
    }
}
