//! Sales error types.

use std::time::Duration;

use common::EntityId;
use domain::{DeliveryError, SaleError, StockError, ValidationError};
use store::StoreError;
use thiserror::Error;

use crate::fulfillment::StockShortfall;

/// Errors that can occur during sale, stock and delivery operations.
///
/// Every error returned by an operation means its unit of work was
/// discarded: nothing it touched was written.
#[derive(Debug, Error)]
pub enum SalesError {
    /// A referenced client, chauffeur, sale, delivery or article does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: EntityId },

    /// The request was malformed.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Not a single requested line could be fulfilled.
    #[error("Insufficient stock for all {} requested item(s)", .items.len())]
    InsufficientStock { items: Vec<StockShortfall> },

    /// An entity with the same identity already exists.
    #[error("{entity} already exists: {key}")]
    AlreadyExists { entity: &'static str, key: String },

    /// The persistence layer failed or detected a conflicting writer.
    #[error("Transaction aborted: {0}")]
    TransactionAbort(#[from] StoreError),

    /// An attempt did not finish within the transaction timeout.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// A ledger entry would leave the range of quantities on hand.
    #[error("Stock error: {0}")]
    Stock(#[from] StockError),

    /// A sale invariant would have been broken.
    #[error("Sale error: {0}")]
    Sale(#[from] SaleError),

    /// A delivery status change is not allowed.
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),
}

impl SalesError {
    pub(crate) fn not_found(entity: &'static str, id: impl Into<EntityId>) -> Self {
        SalesError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Returns true if running the same operation again may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SalesError::TransactionAbort(e) => e.is_conflict(),
            SalesError::Timeout { .. } => true,
            _ => false,
        }
    }
}

/// Convenience type alias for sales results.
pub type Result<T> = std::result::Result<T, SalesError>;
