//! Transaction coordinator for sale creation, update and deletion.

use chrono::Utc;
use common::{ArticleId, DeliveryId, EntityId, SaleId};
use domain::{
    Article, CreateSale, DeleteSale, Delivery, DeliveryAssignment, DeliveryStatus, Sale,
    StockEntry, UpdateSale,
};
use serde::{Deserialize, Serialize};
use store::{Record, RecordStore, RecordStoreExt};
use uuid::Uuid;

use crate::directory::PartyDirectory;
use crate::fulfillment::StockShortfall;
use crate::ledger::StockLedger;
use crate::retry::RetryPolicy;
use crate::{CoordinatorConfig, Result, SalesError};

/// Result of a committed sale creation or update.
#[derive(Debug, Clone, Serialize)]
pub struct SaleOutcome {
    /// The sale as committed, holding only the fulfilled lines.
    pub sale: Sale,
    /// The delivery linked to the sale, if any.
    pub delivery: Option<Delivery>,
    /// Requested lines left out for lack of stock; empty when all fit.
    pub insufficient_stock_items: Vec<StockShortfall>,
}

impl SaleOutcome {
    /// Returns true if some requested lines were left out.
    pub fn is_partial(&self) -> bool {
        !self.insufficient_stock_items.is_empty()
    }
}

/// A sale together with its delivery.
#[derive(Debug, Clone, Serialize)]
pub struct SaleView {
    pub sale: Sale,
    pub delivery: Option<Delivery>,
}

/// Reservation of an article code, stored under an id derived from the code.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct ArticleCode {
    code: String,
    article_id: ArticleId,
}

impl ArticleCode {
    fn key_for(code: &str) -> EntityId {
        EntityId::from_uuid(Uuid::new_v5(&Uuid::NAMESPACE_OID, code.as_bytes()))
    }
}

impl Record for ArticleCode {
    fn collection() -> &'static str {
        "article_codes"
    }

    fn id(&self) -> EntityId {
        Self::key_for(&self.code)
    }
}

/// Orchestrates sale operations as atomic units over the ledger, the
/// article mirror, the sale and its delivery.
///
/// Each operation reads and writes through a single unit of work. Nothing is
/// visible to other readers until that unit commits, and any error drops it
/// uncommitted. Conflicting commits are retried from scratch.
pub struct SaleCoordinator<S, D>
where
    S: RecordStore,
    D: PartyDirectory,
{
    store: S,
    directory: D,
    retry: RetryPolicy,
}

impl<S, D> SaleCoordinator<S, D>
where
    S: RecordStore,
    D: PartyDirectory,
{
    /// Creates a new sale coordinator.
    pub fn new(store: S, directory: D, config: CoordinatorConfig) -> Self {
        Self {
            store,
            directory,
            retry: RetryPolicy::new(&config),
        }
    }

    /// Creates a sale from the lines that can be fulfilled.
    ///
    /// Lines exceeding the stock on hand are left out and reported. If none
    /// can be fulfilled the whole operation is rejected with
    /// `InsufficientStock` and nothing is written.
    #[tracing::instrument(skip(self, cmd), fields(sale_id = %cmd.sale_id, client_id = %cmd.client_id))]
    pub async fn create_sale(&self, cmd: CreateSale) -> Result<SaleOutcome> {
        let assignment = cmd.validate()?;
        if !self.directory.client_exists(cmd.client_id).await? {
            return Err(SalesError::not_found("client", cmd.client_id));
        }
        self.check_chauffeur(assignment.as_ref()).await?;

        let cmd = &cmd;
        let assignment = assignment.as_ref();
        let result = self
            .retry
            .run("create_sale", move || self.try_create(cmd, assignment))
            .await;

        let outcome = result.map_err(Self::note_failure)?;
        Self::note_outcome(&outcome);
        metrics::counter!("sales_created_total").increment(1);
        tracing::info!(
            total = %outcome.sale.total(),
            items = outcome.sale.items().len(),
            left_out = outcome.insufficient_stock_items.len(),
            "sale created"
        );
        Ok(outcome)
    }

    /// Replaces the lines and delivery details of a sale.
    ///
    /// The current reservation is released first, then the new lines are
    /// partitioned against the restored stock. If none can be fulfilled the
    /// operation is rejected and the sale keeps its original reservation.
    #[tracing::instrument(skip(self, cmd), fields(sale_id = %cmd.sale_id))]
    pub async fn update_sale(&self, cmd: UpdateSale) -> Result<SaleOutcome> {
        let assignment = cmd.validate()?;
        self.check_chauffeur(assignment.as_ref()).await?;

        let cmd = &cmd;
        let assignment = assignment.as_ref();
        let result = self
            .retry
            .run("update_sale", move || self.try_update(cmd, assignment))
            .await;

        let (outcome, reset_from) = result.map_err(Self::note_failure)?;
        Self::note_outcome(&outcome);

        if let (Some(previous), Some(delivery)) = (reset_from, &outcome.delivery) {
            metrics::counter!("delivery_progress_reset_total").increment(1);
            tracing::warn!(
                delivery_id = %delivery.id(),
                %previous,
                "delivery put back to pending by sale update"
            );
        }
        metrics::counter!("sales_updated_total").increment(1);
        tracing::info!(
            total = %outcome.sale.total(),
            items = outcome.sale.items().len(),
            left_out = outcome.insufficient_stock_items.len(),
            "sale updated"
        );
        Ok(outcome)
    }

    /// Deletes a sale, releasing all its stock.
    ///
    /// A linked delivery is kept for audit: its sale reference is cleared and
    /// it is cancelled, even when already completed.
    #[tracing::instrument(skip(self, cmd), fields(sale_id = %cmd.sale_id))]
    pub async fn delete_sale(&self, cmd: DeleteSale) -> Result<()> {
        let sale_id = cmd.sale_id;
        let detached = self
            .retry
            .run("delete_sale", move || self.try_delete(sale_id))
            .await?;

        if let Some((delivery, previous)) =
            detached.filter(|(_, previous)| *previous == DeliveryStatus::Completed)
        {
            tracing::warn!(
                delivery_id = %delivery.id(),
                previous = %previous,
                "deleted sale had a completed delivery; cancelled anyway"
            );
        }
        metrics::counter!("sales_deleted_total").increment(1);
        tracing::info!("sale deleted");
        Ok(())
    }

    /// Loads a sale with its delivery.
    pub async fn get_sale(&self, sale_id: SaleId) -> Result<SaleView> {
        let sale: Sale = self
            .store
            .fetch(sale_id)
            .await?
            .ok_or_else(|| SalesError::not_found("sale", sale_id))?;
        let delivery = match sale.delivery_id() {
            Some(delivery_id) => self.store.fetch(delivery_id).await?,
            None => None,
        };
        Ok(SaleView { sale, delivery })
    }

    /// Loads every sale.
    pub async fn list_sales(&self) -> Result<Vec<Sale>> {
        Ok(self.store.fetch_all().await?)
    }

    /// Adds an article to the catalog with an initial quantity on hand.
    ///
    /// Article codes are unique; a second article with the same code is
    /// rejected with `AlreadyExists`.
    #[tracing::instrument(skip(self, article), fields(code = %article.code()))]
    pub async fn register_article(&self, article: Article, quantity: u32) -> Result<Article> {
        let article = &article;
        let registered = self
            .retry
            .run("register_article", move || {
                self.try_register(article, quantity)
            })
            .await?;

        tracing::info!(article_id = %registered.id(), quantity, "article registered");
        Ok(registered)
    }

    /// Sets the quantity on hand of an article, ledger and mirror together.
    #[tracing::instrument(skip(self))]
    pub async fn set_stock(&self, article_id: ArticleId, quantity: u32) -> Result<StockEntry> {
        let entry = self
            .retry
            .run("set_stock", move || self.try_set_stock(article_id, quantity))
            .await?;

        tracing::info!("stock set");
        Ok(entry)
    }

    async fn check_chauffeur(&self, assignment: Option<&DeliveryAssignment>) -> Result<()> {
        let Some(assignment) = assignment else {
            return Ok(());
        };
        if !self.directory.chauffeur_exists(assignment.chauffeur_id).await? {
            return Err(SalesError::not_found("chauffeur", assignment.chauffeur_id));
        }
        Ok(())
    }

    fn note_outcome(outcome: &SaleOutcome) {
        if outcome.is_partial() {
            metrics::counter!("sales_partial_fulfillment_total").increment(1);
        }
    }

    fn note_failure(error: SalesError) -> SalesError {
        if let SalesError::InsufficientStock { items } = &error {
            metrics::counter!("sales_insufficient_stock_total").increment(1);
            tracing::info!(items = items.len(), "no requested item could be fulfilled");
        }
        error
    }

    async fn try_create(
        &self,
        cmd: &CreateSale,
        assignment: Option<&DeliveryAssignment>,
    ) -> Result<SaleOutcome> {
        let now = Utc::now();
        let mut uow = self.store.begin();

        if uow.get::<Sale>(cmd.sale_id).await?.is_some() {
            return Err(SalesError::AlreadyExists {
                entity: "sale",
                key: cmd.sale_id.to_string(),
            });
        }

        let fulfillment = StockLedger::new(&mut uow, now)
            .partition(&cmd.items)
            .await?;
        if fulfillment.is_empty() {
            return Err(SalesError::InsufficientStock {
                items: fulfillment.insufficient,
            });
        }

        let delivery = assignment
            .map(|assignment| Delivery::pending(DeliveryId::new(), cmd.sale_id, assignment.clone(), now));
        let sale = Sale::new(
            cmd.sale_id,
            cmd.client_id,
            fulfillment.fulfillable,
            cmd.payment_method,
            cmd.delivery.delivery_type,
            delivery.as_ref().map(Delivery::id),
            now,
        )?
        .with_invoice(cmd.invoice.clone());

        StockLedger::new(&mut uow, now).reserve_sale(&sale).await?;
        if let Some(delivery) = &delivery {
            uow.put(delivery)?;
        }
        uow.put(&sale)?;
        uow.commit().await?;

        Ok(SaleOutcome {
            sale,
            delivery,
            insufficient_stock_items: fulfillment.insufficient,
        })
    }

    /// Returns the outcome and, when a delivery in progress was put back to
    /// pending, the status it had.
    async fn try_update(
        &self,
        cmd: &UpdateSale,
        assignment: Option<&DeliveryAssignment>,
    ) -> Result<(SaleOutcome, Option<DeliveryStatus>)> {
        let now = Utc::now();
        let mut uow = self.store.begin();

        let mut sale: Sale = uow
            .get(cmd.sale_id)
            .await?
            .ok_or_else(|| SalesError::not_found("sale", cmd.sale_id))?;
        let current_delivery = match sale.delivery_id() {
            Some(delivery_id) => {
                let delivery = uow.get::<Delivery>(delivery_id).await?;
                if delivery.is_none() {
                    tracing::warn!(%delivery_id, "sale refers to a missing delivery");
                }
                delivery
            }
            None => None,
        };

        let mut ledger = StockLedger::new(&mut uow, now);
        ledger.release_sale(&sale).await?;
        let fulfillment = ledger.partition(&cmd.items).await?;
        if fulfillment.is_empty() {
            return Err(SalesError::InsufficientStock {
                items: fulfillment.insufficient,
            });
        }

        let mut reset_from = None;
        let delivery = match (assignment, current_delivery) {
            (Some(assignment), None) => Some(Delivery::pending(
                DeliveryId::new(),
                sale.id(),
                assignment.clone(),
                now,
            )),
            (Some(assignment), Some(mut delivery)) => {
                let previous = delivery.reassign(assignment.clone(), now);
                if previous != DeliveryStatus::Pending {
                    reset_from = Some(previous);
                }
                Some(delivery)
            }
            (None, Some(delivery)) => {
                uow.delete::<Delivery>(delivery.id());
                None
            }
            (None, None) => None,
        };

        sale.revise(
            fulfillment.fulfillable,
            cmd.payment_method,
            cmd.delivery.delivery_type,
            delivery.as_ref().map(Delivery::id),
            now,
        )?;

        StockLedger::new(&mut uow, now).reserve_sale(&sale).await?;
        if let Some(delivery) = &delivery {
            uow.put(delivery)?;
        }
        uow.put(&sale)?;
        uow.commit().await?;

        Ok((
            SaleOutcome {
                sale,
                delivery,
                insufficient_stock_items: fulfillment.insufficient,
            },
            reset_from,
        ))
    }

    /// Returns the cancelled delivery and its status before deletion, if the
    /// sale had one.
    async fn try_delete(&self, sale_id: SaleId) -> Result<Option<(Delivery, DeliveryStatus)>> {
        let now = Utc::now();
        let mut uow = self.store.begin();

        let sale: Sale = uow
            .get(sale_id)
            .await?
            .ok_or_else(|| SalesError::not_found("sale", sale_id))?;

        StockLedger::new(&mut uow, now).release_sale(&sale).await?;

        let linked = match sale.delivery_id() {
            Some(delivery_id) => uow.get::<Delivery>(delivery_id).await?,
            None => None,
        };
        let detached = match linked {
            Some(mut delivery) => {
                delivery.detach(now);
                let previous = delivery.force_cancel(now);
                uow.put(&delivery)?;
                Some((delivery, previous))
            }
            None => None,
        };

        uow.delete::<Sale>(sale_id);
        uow.commit().await?;
        Ok(detached)
    }

    async fn try_register(&self, article: &Article, quantity: u32) -> Result<Article> {
        let now = Utc::now();
        let mut uow = self.store.begin();

        let code_key = ArticleCode::key_for(article.code());
        if uow.get::<ArticleCode>(code_key).await?.is_some() {
            return Err(SalesError::AlreadyExists {
                entity: "article code",
                key: article.code().to_string(),
            });
        }
        if uow.get::<Article>(article.id()).await?.is_some() {
            return Err(SalesError::AlreadyExists {
                entity: "article",
                key: article.id().to_string(),
            });
        }

        uow.put(&ArticleCode {
            code: article.code().to_string(),
            article_id: article.id(),
        })?;
        uow.put(article)?;
        let entry = StockLedger::new(&mut uow, now)
            .upsert(article.id(), quantity)
            .await?;
        uow.commit().await?;

        let mut registered = article.clone();
        registered.sync_stock(&entry);
        Ok(registered)
    }

    async fn try_set_stock(&self, article_id: ArticleId, quantity: u32) -> Result<StockEntry> {
        let mut uow = self.store.begin();
        let entry = StockLedger::new(&mut uow, Utc::now())
            .upsert(article_id, quantity)
            .await?;
        uow.commit().await?;
        Ok(entry)
    }
}
