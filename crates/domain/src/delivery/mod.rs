//! Delivery sub-aggregate and its status state machine.

mod aggregate;
mod state;

pub use aggregate::{Delivery, DeliveryAssignment};
pub use state::DeliveryStatus;

use thiserror::Error;

/// Errors that can occur during delivery operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// Delivery is not in a state that allows the action.
    #[error("Invalid state transition: cannot {action} a delivery in {current} state")]
    InvalidTransition {
        current: DeliveryStatus,
        action: &'static str,
    },
}
