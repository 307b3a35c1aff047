//! Sale aggregate and related types.

mod aggregate;
mod commands;
mod state;

pub use aggregate::{Sale, SaleItem};
pub use commands::{CreateSale, DeleteSale, DeliverySpec, UpdateSale};
pub use state::SaleStatus;

use common::DeliveryId;
use thiserror::Error;

use crate::{DeliveryType, ValidationError};

/// Errors that can occur during sale operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaleError {
    /// A persisted sale always has items.
    #[error("Sale has no items")]
    NoItems,

    /// The delivery reference must be present exactly when the sale is delivered.
    #[error("Delivery reference {delivery_id:?} is invalid for delivery type {delivery_type}")]
    DeliveryMismatch {
        delivery_type: DeliveryType,
        delivery_id: Option<DeliveryId>,
    },

    /// A line or the total cannot be computed.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}
