//! Read-only stock reports.

use std::collections::HashMap;

use common::ArticleId;
use domain::{Article, StockEntry};
use serde::Serialize;
use store::{RecordStore, RecordStoreExt};

use crate::{CoordinatorConfig, Result};

/// An article running out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LowStock {
    pub article_id: ArticleId,
    pub code: String,
    pub designation: String,
    pub quantity: u32,
}

/// An article whose `stock` mirror disagrees with its ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MirrorDrift {
    pub article_id: ArticleId,
    pub code: String,
    pub mirror: u32,
    /// None when the article has no ledger entry at all.
    pub ledger: Option<u32>,
}

/// Stock queries outside any unit of work.
///
/// Each report reads the articles and the ledger one collection at a time;
/// it reflects committed state only.
pub struct InventoryQueries<S: RecordStore> {
    store: S,
    low_stock_threshold: u32,
}

impl<S: RecordStore> InventoryQueries<S> {
    pub fn new(store: S, config: &CoordinatorConfig) -> Self {
        Self {
            store,
            low_stock_threshold: config.low_stock_threshold,
        }
    }

    /// Quantity on hand per the ledger; 0 when the article has no entry.
    pub async fn availability(&self, article_id: ArticleId) -> Result<u32> {
        Ok(self
            .store
            .fetch::<StockEntry, _>(article_id)
            .await?
            .map(|entry| entry.quantity())
            .unwrap_or(0))
    }

    /// Articles strictly below the configured threshold.
    pub async fn low_stock(&self) -> Result<Vec<LowStock>> {
        self.low_stock_below(self.low_stock_threshold).await
    }

    /// Articles strictly below `threshold`, lowest quantity first.
    #[tracing::instrument(skip(self))]
    pub async fn low_stock_below(&self, threshold: u32) -> Result<Vec<LowStock>> {
        let ledger = self.ledger().await?;
        let articles: Vec<Article> = self.store.fetch_all().await?;

        let mut low: Vec<LowStock> = articles
            .into_iter()
            .filter_map(|article| {
                let quantity = ledger.get(&article.id()).copied().unwrap_or(0);
                (quantity < threshold).then(|| LowStock {
                    article_id: article.id(),
                    code: article.code().to_string(),
                    designation: article.designation().to_string(),
                    quantity,
                })
            })
            .collect();
        low.sort_by(|a, b| a.quantity.cmp(&b.quantity).then_with(|| a.code.cmp(&b.code)));

        tracing::debug!(count = low.len(), "low stock report");
        Ok(low)
    }

    /// Articles whose mirror differs from the ledger, or that have no ledger entry.
    #[tracing::instrument(skip(self))]
    pub async fn mirror_drift(&self) -> Result<Vec<MirrorDrift>> {
        let ledger = self.ledger().await?;
        let articles: Vec<Article> = self.store.fetch_all().await?;

        let drift: Vec<MirrorDrift> = articles
            .into_iter()
            .filter_map(|article| {
                let recorded = ledger.get(&article.id()).copied();
                (recorded != Some(article.stock())).then(|| MirrorDrift {
                    article_id: article.id(),
                    code: article.code().to_string(),
                    mirror: article.stock(),
                    ledger: recorded,
                })
            })
            .collect();

        if !drift.is_empty() {
            tracing::warn!(count = drift.len(), "stock mirror out of sync with ledger");
        }
        Ok(drift)
    }

    async fn ledger(&self) -> Result<HashMap<ArticleId, u32>> {
        let entries: Vec<StockEntry> = self.store.fetch_all().await?;
        Ok(entries
            .into_iter()
            .map(|entry| (entry.article_id(), entry.quantity()))
            .collect())
    }
}
