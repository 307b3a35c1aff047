//! Domain error types.

use common::ArticleId;
use thiserror::Error;

use crate::{DeliveryError, SaleError, StockError};

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Input rejected before anything was read or written.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// An error occurred in the sale aggregate.
    #[error("Sale error: {0}")]
    Sale(#[from] SaleError),

    /// An error occurred in the delivery sub-aggregate.
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// A stock ledger entry refused a change.
    #[error("Stock error: {0}")]
    Stock(#[from] StockError),
}

/// Malformed input to a sale or catalog operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A sale needs at least one line item.
    #[error("Sale must have at least one item")]
    NoItems,

    /// Line quantity must be at least 1.
    #[error("Invalid quantity for article {article_id}: {quantity} (must be at least 1)")]
    InvalidQuantity { article_id: ArticleId, quantity: u32 },

    /// Discount is a percentage between 0 and 100.
    #[error("Invalid discount: {value} (must be between 0 and 100)")]
    InvalidDiscount { value: u32 },

    /// Prices cannot be negative.
    #[error("Invalid {field}: {cents} (cannot be negative)")]
    NegativePrice { field: &'static str, cents: i64 },

    /// Delivery requested without a chauffeur.
    #[error("Chauffeur is required for delivery")]
    ChauffeurRequired,

    /// Delivery requested without a vehicle license.
    #[error("License is required for delivery")]
    LicenseRequired,

    /// Quantity times price, or the sum of the lines, does not fit in the amount type.
    #[error("Amount out of range for article {article_id}")]
    AmountOverflow { article_id: ArticleId },

    /// A required text field is blank.
    #[error("{field} is required")]
    Blank { field: &'static str },
}
