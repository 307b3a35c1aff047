//! Catalog articles.

use common::{ArticleId, EntityId};
use serde::{Deserialize, Serialize};
use store::Record;

use crate::{Money, StockEntry, ValidationError};

/// A catalog article.
///
/// `stock` is a mirror of the article's ledger entry; it can only be
/// overwritten from a [`StockEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    id: ArticleId,
    code: String,
    designation: String,
    purchase_price: Money,
    sale_price: Money,
    stock: u32,
}

impl Article {
    /// Creates an article with an empty stock mirror.
    pub fn new(
        code: impl Into<String>,
        designation: impl Into<String>,
        purchase_price: Money,
        sale_price: Money,
    ) -> Result<Self, ValidationError> {
        let code = code.into().trim().to_string();
        let designation = designation.into().trim().to_string();

        if code.is_empty() {
            return Err(ValidationError::Blank { field: "code" });
        }
        if designation.is_empty() {
            return Err(ValidationError::Blank {
                field: "designation",
            });
        }
        if purchase_price.is_negative() {
            return Err(ValidationError::NegativePrice {
                field: "purchase price",
                cents: purchase_price.cents(),
            });
        }
        if sale_price.is_negative() {
            return Err(ValidationError::NegativePrice {
                field: "sale price",
                cents: sale_price.cents(),
            });
        }

        Ok(Self {
            id: ArticleId::new(),
            code,
            designation,
            purchase_price,
            sale_price,
            stock: 0,
        })
    }

    pub fn id(&self) -> ArticleId {
        self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn designation(&self) -> &str {
        &self.designation
    }

    pub fn purchase_price(&self) -> Money {
        self.purchase_price
    }

    pub fn sale_price(&self) -> Money {
        self.sale_price
    }

    /// Mirrored quantity on hand.
    pub fn stock(&self) -> u32 {
        self.stock
    }

    /// Copies the ledger quantity into the mirror.
    pub fn sync_stock(&mut self, entry: &StockEntry) {
        self.stock = entry.quantity();
    }

    /// Returns true if the mirror agrees with `entry`.
    pub fn mirrors(&self, entry: &StockEntry) -> bool {
        self.id == entry.article_id() && self.stock == entry.quantity()
    }
}

impl Record for Article {
    fn collection() -> &'static str {
        "articles"
    }

    fn id(&self) -> EntityId {
        self.id.into()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn article() -> Article {
        Article::new(
            "ART-001",
            "Ceramic tile 30x30",
            Money::from_cents(450),
            Money::from_cents(700),
        )
        .unwrap()
    }

    #[test]
    fn test_new_article_starts_with_empty_mirror() {
        let article = article();
        assert_eq!(article.stock(), 0);
        assert_eq!(article.code(), "ART-001");
    }

    #[test]
    fn test_blank_code_rejected() {
        let result = Article::new("  ", "Tile", Money::zero(), Money::zero());
        assert_eq!(result, Err(ValidationError::Blank { field: "code" }));
    }

    #[test]
    fn test_negative_price_rejected() {
        let result = Article::new("A", "Tile", Money::zero(), Money::from_cents(-1));
        assert!(matches!(
            result,
            Err(ValidationError::NegativePrice {
                field: "sale price",
                ..
            })
        ));
    }

    #[test]
    fn test_sync_stock_copies_ledger_quantity() {
        let mut article = article();
        let entry = StockEntry::new(article.id(), 12, Utc::now());
        assert!(!article.mirrors(&entry));

        article.sync_stock(&entry);
        assert_eq!(article.stock(), 12);
        assert!(article.mirrors(&entry));
    }

    #[test]
    fn test_article_serialization() {
        let article = article();
        let json = serde_json::to_value(&article).unwrap();
        assert_eq!(json["code"], "ART-001");
        assert_eq!(json["stock"], 0);

        let back: Article = serde_json::from_value(json).unwrap();
        assert_eq!(back, article);
    }
}
