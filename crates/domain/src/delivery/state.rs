//! Delivery state machine.

use serde::{Deserialize, Serialize};

/// The status of a delivery in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──► InProgress ──► Completed
///    │            │
///    └────────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryStatus {
    /// Created alongside its sale, not yet on the road.
    #[default]
    Pending,

    /// Chauffeur is on the way.
    InProgress,

    /// Goods handed over (terminal state).
    Completed,

    /// Delivery will not happen (terminal state).
    Cancelled,
}

impl DeliveryStatus {
    /// Returns true if the delivery can be started in this state.
    pub fn can_start(&self) -> bool {
        matches!(self, DeliveryStatus::Pending)
    }

    /// Returns true if the delivery can be completed in this state.
    pub fn can_complete(&self) -> bool {
        matches!(self, DeliveryStatus::InProgress)
    }

    /// Returns true if the delivery can be cancelled in this state.
    pub fn can_cancel(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeliveryStatus::Completed | DeliveryStatus::Cancelled)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::InProgress => "in-progress",
            DeliveryStatus::Completed => "completed",
            DeliveryStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(DeliveryStatus::default(), DeliveryStatus::Pending);
    }

    #[test]
    fn test_only_pending_can_start() {
        assert!(DeliveryStatus::Pending.can_start());
        assert!(!DeliveryStatus::InProgress.can_start());
        assert!(!DeliveryStatus::Completed.can_start());
        assert!(!DeliveryStatus::Cancelled.can_start());
    }

    #[test]
    fn test_only_in_progress_can_complete() {
        assert!(!DeliveryStatus::Pending.can_complete());
        assert!(DeliveryStatus::InProgress.can_complete());
        assert!(!DeliveryStatus::Completed.can_complete());
        assert!(!DeliveryStatus::Cancelled.can_complete());
    }

    #[test]
    fn test_can_cancel_from_non_terminal_states() {
        assert!(DeliveryStatus::Pending.can_cancel());
        assert!(DeliveryStatus::InProgress.can_cancel());
        assert!(!DeliveryStatus::Completed.can_cancel());
        assert!(!DeliveryStatus::Cancelled.can_cancel());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!DeliveryStatus::Pending.is_terminal());
        assert!(!DeliveryStatus::InProgress.is_terminal());
        assert!(DeliveryStatus::Completed.is_terminal());
        assert!(DeliveryStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&DeliveryStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
        let parsed: DeliveryStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, DeliveryStatus::Cancelled);
        assert_eq!(DeliveryStatus::InProgress.to_string(), "in-progress");
    }
}
