//! Service lifecycle states.

use serde::Serialize;

/// Service operational state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    /// Service is starting up.
    Starting,
    /// Service is running and accepting requests.
    Running,
    /// Service is draining, not accepting new mutations.
    ShuttingDown,
    /// Service is stopped.
    Stopped,
}

impl ServiceState {
    /// Check if the service is accepting new requests.
    pub fn accepts_requests(&self) -> bool {
        matches!(self, ServiceState::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_running_accepts_requests() {
        assert!(ServiceState::Running.accepts_requests());
        assert!(!ServiceState::Starting.accepts_requests());
        assert!(!ServiceState::ShuttingDown.accepts_requests());
        assert!(!ServiceState::Stopped.accepts_requests());
    }
}
