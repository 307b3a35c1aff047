//! Partition of requested sale lines into fulfillable and short ones.

use common::ArticleId;
use domain::SaleItem;
use serde::Serialize;

/// Shown in shortfall reports when the article record is gone.
pub const UNKNOWN_ARTICLE: &str = "Unknown Article";

/// A requested line that could not be fulfilled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockShortfall {
    pub article_id: ArticleId,
    /// Article designation, or [`UNKNOWN_ARTICLE`].
    pub article: String,
    pub requested: u32,
    /// Quantity that was left for this line (0 when ledger or article is missing).
    pub available: u32,
}

/// Requested lines split against the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fulfillment {
    /// Lines that fit the stock on hand, in request order.
    pub fulfillable: Vec<SaleItem>,
    /// Lines that did not, in request order.
    pub insufficient: Vec<StockShortfall>,
}

impl Fulfillment {
    /// Returns true if nothing at all can be sold.
    pub fn is_empty(&self) -> bool {
        self.fulfillable.is_empty()
    }

    /// Returns true if some lines were dropped.
    pub fn is_partial(&self) -> bool {
        !self.fulfillable.is_empty() && !self.insufficient.is_empty()
    }
}
