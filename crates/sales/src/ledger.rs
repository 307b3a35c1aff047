//! Stock ledger and its mirror on the article.
//!
//! Every quantity change goes through [`StockLedger`], which writes the
//! ledger entry and the article's `stock` mirror into the same unit of work,
//! so the two are committed (or discarded) together.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::ArticleId;
use domain::{Article, Sale, SaleItem, StockEntry};
use store::{RecordStore, UnitOfWork};

use crate::fulfillment::{Fulfillment, StockShortfall, UNKNOWN_ARTICLE};
use crate::{Result, SalesError};

/// Ledger operations bound to one unit of work.
pub struct StockLedger<'u, 'a, S: RecordStore + ?Sized> {
    uow: &'u mut UnitOfWork<'a, S>,
    at: DateTime<Utc>,
}

impl<'u, 'a, S: RecordStore + ?Sized> StockLedger<'u, 'a, S> {
    /// Binds the ledger to `uow`; every write is stamped with `at`.
    pub fn new(uow: &'u mut UnitOfWork<'a, S>, at: DateTime<Utc>) -> Self {
        Self { uow, at }
    }

    /// Returns the quantity on hand, 0 when the article has no ledger entry.
    pub async fn availability(&mut self, article_id: ArticleId) -> Result<u32> {
        Ok(self
            .uow
            .get::<StockEntry>(article_id)
            .await?
            .map(|entry| entry.quantity())
            .unwrap_or(0))
    }

    /// Takes `quantity` units out of ledger and mirror.
    ///
    /// Callers check availability first; asking for more than is on hand
    /// fails with `SalesError::Stock`.
    pub async fn reserve(&mut self, article_id: ArticleId, quantity: u32) -> Result<()> {
        let mut article = self.article(article_id).await?;
        let mut entry = self.entry_or_empty(article_id).await?;

        entry.withdraw(quantity, self.at)?;
        self.write(&mut article, &entry)
    }

    /// Puts `quantity` units back into ledger and mirror.
    pub async fn release(&mut self, article_id: ArticleId, quantity: u32) -> Result<()> {
        let mut article = self.article(article_id).await?;
        let mut entry = self.entry_or_empty(article_id).await?;

        entry.restock(quantity, self.at)?;
        self.write(&mut article, &entry)
    }

    /// Sets the absolute quantity, creating the ledger entry if needed.
    pub async fn upsert(&mut self, article_id: ArticleId, quantity: u32) -> Result<StockEntry> {
        let mut article = self.article(article_id).await?;
        let mut entry = self.entry_or_empty(article_id).await?;

        entry.set(quantity, self.at);
        self.write(&mut article, &entry)?;
        Ok(entry)
    }

    /// Reserves every line of `sale`.
    pub async fn reserve_sale(&mut self, sale: &Sale) -> Result<()> {
        for (article_id, quantity) in sale.quantities_by_article() {
            self.reserve(article_id, quantity).await?;
        }
        Ok(())
    }

    /// Releases every line of `sale`.
    pub async fn release_sale(&mut self, sale: &Sale) -> Result<()> {
        for (article_id, quantity) in sale.quantities_by_article() {
            self.release(article_id, quantity).await?;
        }
        Ok(())
    }

    /// Splits `items` into lines that fit the stock on hand and lines that
    /// do not.
    ///
    /// Lines are taken in request order against a running availability, so
    /// two lines for the same article can never claim the same units. A
    /// line whose article or ledger entry is missing sees 0 available.
    pub async fn partition(&mut self, items: &[SaleItem]) -> Result<Fulfillment> {
        let mut remaining: HashMap<ArticleId, (String, u32)> = HashMap::new();
        let mut fulfillment = Fulfillment::default();

        for item in items {
            if !remaining.contains_key(&item.article_id) {
                let seen = self.describe(item.article_id).await?;
                remaining.insert(item.article_id, seen);
            }
            let Some((designation, available)) = remaining.get_mut(&item.article_id) else {
                continue;
            };

            if item.quantity <= *available {
                *available -= item.quantity;
                fulfillment.fulfillable.push(item.clone());
            } else {
                fulfillment.insufficient.push(StockShortfall {
                    article_id: item.article_id,
                    article: designation.clone(),
                    requested: item.quantity,
                    available: *available,
                });
            }
        }

        Ok(fulfillment)
    }

    async fn describe(&mut self, article_id: ArticleId) -> Result<(String, u32)> {
        let article = self.uow.get::<Article>(article_id).await?;
        let available = self.availability(article_id).await?;

        Ok(match article {
            Some(article) => (article.designation().to_string(), available),
            None => (UNKNOWN_ARTICLE.to_string(), 0),
        })
    }

    async fn article(&mut self, article_id: ArticleId) -> Result<Article> {
        self.uow
            .get::<Article>(article_id)
            .await?
            .ok_or_else(|| SalesError::not_found("article", article_id))
    }

    async fn entry_or_empty(&mut self, article_id: ArticleId) -> Result<StockEntry> {
        Ok(self
            .uow
            .get::<StockEntry>(article_id)
            .await?
            .unwrap_or_else(|| StockEntry::new(article_id, 0, self.at)))
    }

    fn write(&mut self, article: &mut Article, entry: &StockEntry) -> Result<()> {
        article.sync_stock(entry);
        self.uow.put(entry)?;
        self.uow.put(article)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use domain::{Money, StockError};
    use store::{InMemoryStore, RecordStoreExt};

    use super::*;

    async fn seeded(quantity: u32) -> (InMemoryStore, ArticleId) {
        let store = InMemoryStore::new();
        let article = Article::new("A-1", "Hammer", Money::from_cents(800), Money::from_cents(1200))
            .unwrap();
        let article_id = article.id();

        let mut uow = store.begin();
        uow.put(&article).unwrap();
        StockLedger::new(&mut uow, Utc::now())
            .upsert(article_id, quantity)
            .await
            .unwrap();
        uow.commit().await.unwrap();

        (store, article_id)
    }

    async fn ledger_and_mirror(store: &InMemoryStore, article_id: ArticleId) -> (u32, u32) {
        let entry: StockEntry = store.fetch(article_id).await.unwrap().unwrap();
        let article: Article = store.fetch(article_id).await.unwrap().unwrap();
        (entry.quantity(), article.stock())
    }

    fn line(article_id: ArticleId, quantity: u32) -> SaleItem {
        SaleItem::new(article_id, quantity, Money::from_cents(1200))
    }

    #[tokio::test]
    async fn test_upsert_sets_ledger_and_mirror() {
        let (store, article_id) = seeded(10).await;
        assert_eq!(ledger_and_mirror(&store, article_id).await, (10, 10));
    }

    #[tokio::test]
    async fn test_reserve_and_release_move_both_records() {
        let (store, article_id) = seeded(10).await;

        let mut uow = store.begin();
        let mut ledger = StockLedger::new(&mut uow, Utc::now());
        ledger.reserve(article_id, 4).await.unwrap();
        assert_eq!(ledger.availability(article_id).await.unwrap(), 6);
        uow.commit().await.unwrap();
        assert_eq!(ledger_and_mirror(&store, article_id).await, (6, 6));

        let mut uow = store.begin();
        StockLedger::new(&mut uow, Utc::now())
            .release(article_id, 4)
            .await
            .unwrap();
        uow.commit().await.unwrap();
        assert_eq!(ledger_and_mirror(&store, article_id).await, (10, 10));
    }

    #[tokio::test]
    async fn test_reserve_beyond_stock_underflows() {
        let (store, article_id) = seeded(2).await;

        let mut uow = store.begin();
        let result = StockLedger::new(&mut uow, Utc::now())
            .reserve(article_id, 3)
            .await;

        assert!(matches!(result, Err(SalesError::Stock(StockError::Underflow { .. }))));
        assert!(uow.is_clean());
    }

    #[tokio::test]
    async fn test_release_past_max_overflows() {
        let (store, article_id) = seeded(u32::MAX).await;

        let mut uow = store.begin();
        let result = StockLedger::new(&mut uow, Utc::now())
            .release(article_id, 1)
            .await;

        assert!(matches!(result, Err(SalesError::Stock(StockError::Overflow { .. }))));
        assert!(uow.is_clean());
        uow.abort();
        assert_eq!(ledger_and_mirror(&store, article_id).await, (u32::MAX, u32::MAX));
    }

    #[tokio::test]
    async fn test_uncommitted_reservation_is_invisible() {
        let (store, article_id) = seeded(5).await;

        let mut uow = store.begin();
        StockLedger::new(&mut uow, Utc::now())
            .reserve(article_id, 5)
            .await
            .unwrap();
        uow.abort();

        assert_eq!(ledger_and_mirror(&store, article_id).await, (5, 5));
    }

    #[tokio::test]
    async fn test_partition_boundary() {
        let (store, article_id) = seeded(5).await;
        let mut uow = store.begin();
        let mut ledger = StockLedger::new(&mut uow, Utc::now());

        let exact = ledger.partition(&[line(article_id, 5)]).await.unwrap();
        assert_eq!(exact.fulfillable.len(), 1);
        assert!(exact.insufficient.is_empty());

        let over = ledger.partition(&[line(article_id, 6)]).await.unwrap();
        assert!(over.is_empty());
        assert_eq!(
            over.insufficient,
            vec![StockShortfall {
                article_id,
                article: "Hammer".to_string(),
                requested: 6,
                available: 5,
            }]
        );
    }

    #[tokio::test]
    async fn test_partition_uses_running_availability() {
        let (store, article_id) = seeded(5).await;
        let mut uow = store.begin();

        let fulfillment = StockLedger::new(&mut uow, Utc::now())
            .partition(&[line(article_id, 3), line(article_id, 3), line(article_id, 2)])
            .await
            .unwrap();

        assert!(fulfillment.is_partial());
        assert_eq!(fulfillment.fulfillable.len(), 2);
        assert_eq!(fulfillment.insufficient[0].requested, 3);
        assert_eq!(fulfillment.insufficient[0].available, 2);
    }

    #[tokio::test]
    async fn test_partition_reports_unknown_article() {
        let store = InMemoryStore::new();
        let missing = ArticleId::new();
        let mut uow = store.begin();

        let fulfillment = StockLedger::new(&mut uow, Utc::now())
            .partition(&[line(missing, 1)])
            .await
            .unwrap();

        assert_eq!(fulfillment.insufficient[0].article, UNKNOWN_ARTICLE);
        assert_eq!(fulfillment.insufficient[0].available, 0);
    }

    #[tokio::test]
    async fn test_upsert_requires_article() {
        let store = InMemoryStore::new();
        let mut uow = store.begin();

        let result = StockLedger::new(&mut uow, Utc::now())
            .upsert(ArticleId::new(), 3)
            .await;

        assert!(matches!(
            result,
            Err(SalesError::NotFound {
                entity: "article",
                ..
            })
        ));
    }
}
