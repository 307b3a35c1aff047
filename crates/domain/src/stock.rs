//! Stock ledger entries: the authoritative quantity on hand per article.

use chrono::{DateTime, Utc};
use common::{ArticleId, EntityId};
use serde::{Deserialize, Serialize};
use store::Record;
use thiserror::Error;

/// Errors raised by a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    /// A withdrawal larger than the quantity on hand.
    #[error("Cannot withdraw {requested} of article {article_id}: only {available} on hand")]
    Underflow {
        article_id: ArticleId,
        requested: u32,
        available: u32,
    },

    /// A restock that would push the quantity on hand past `u32::MAX`.
    #[error("Cannot restock {requested} of article {article_id}: {on_hand} already on hand")]
    Overflow {
        article_id: ArticleId,
        requested: u32,
        on_hand: u32,
    },
}

/// One ledger entry per article, stored under the article's own id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntry {
    article_id: ArticleId,
    quantity: u32,
    last_updated: DateTime<Utc>,
}

impl StockEntry {
    /// Creates a ledger entry holding `quantity`.
    pub fn new(article_id: ArticleId, quantity: u32, at: DateTime<Utc>) -> Self {
        Self {
            article_id,
            quantity,
            last_updated: at,
        }
    }

    pub fn article_id(&self) -> ArticleId {
        self.article_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Removes `quantity` units; fails without change if fewer are on hand.
    pub fn withdraw(&mut self, quantity: u32, at: DateTime<Utc>) -> Result<(), StockError> {
        let remaining =
            self.quantity
                .checked_sub(quantity)
                .ok_or(StockError::Underflow {
                    article_id: self.article_id,
                    requested: quantity,
                    available: self.quantity,
                })?;
        self.quantity = remaining;
        self.last_updated = at;
        Ok(())
    }

    /// Puts `quantity` units back; fails without change past `u32::MAX`.
    pub fn restock(&mut self, quantity: u32, at: DateTime<Utc>) -> Result<(), StockError> {
        let total = self
            .quantity
            .checked_add(quantity)
            .ok_or(StockError::Overflow {
                article_id: self.article_id,
                requested: quantity,
                on_hand: self.quantity,
            })?;
        self.quantity = total;
        self.last_updated = at;
        Ok(())
    }

    /// Overwrites the quantity on hand.
    pub fn set(&mut self, quantity: u32, at: DateTime<Utc>) {
        self.quantity = quantity;
        self.last_updated = at;
    }
}

impl Record for StockEntry {
    fn collection() -> &'static str {
        "stock_ledger"
    }

    fn id(&self) -> EntityId {
        self.article_id.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_withdraw_and_restock() {
        let mut entry = StockEntry::new(ArticleId::new(), 10, Utc::now());

        entry.withdraw(4, Utc::now()).unwrap();
        assert_eq!(entry.quantity(), 6);

        entry.restock(4, Utc::now()).unwrap();
        assert_eq!(entry.quantity(), 10);
    }

    #[test]
    fn test_restock_past_max_fails_unchanged() {
        let article_id = ArticleId::new();
        let before = Utc::now();
        let mut entry = StockEntry::new(article_id, u32::MAX - 1, before);

        let result = entry.restock(2, Utc::now());

        assert_eq!(
            result,
            Err(StockError::Overflow {
                article_id,
                requested: 2,
                on_hand: u32::MAX - 1,
            })
        );
        assert_eq!(entry.quantity(), u32::MAX - 1);
        assert_eq!(entry.last_updated(), before);

        entry.restock(1, Utc::now()).unwrap();
        assert_eq!(entry.quantity(), u32::MAX);
    }

    #[test]
    fn test_withdraw_exact_quantity_leaves_zero() {
        let mut entry = StockEntry::new(ArticleId::new(), 3, Utc::now());
        entry.withdraw(3, Utc::now()).unwrap();
        assert_eq!(entry.quantity(), 0);
    }

    #[test]
    fn test_withdraw_more_than_on_hand_fails_unchanged() {
        let article_id = ArticleId::new();
        let mut entry = StockEntry::new(article_id, 2, Utc::now());

        let err = entry.withdraw(3, Utc::now()).unwrap_err();
        assert_eq!(
            err,
            StockError::Underflow {
                article_id,
                requested: 3,
                available: 2
            }
        );
        assert_eq!(entry.quantity(), 2);
    }

    #[test]
    fn test_entry_is_keyed_by_article() {
        let article_id = ArticleId::new();
        let entry = StockEntry::new(article_id, 1, Utc::now());
        assert_eq!(entry.key().to_string(), format!("stock_ledger/{article_id}"));
    }
}
