//! Delivery status updates coming from the field.

use chrono::{DateTime, Utc};
use common::DeliveryId;
use domain::{Delivery, DeliveryError};
use store::{RecordStore, RecordStoreExt};

use crate::retry::RetryPolicy;
use crate::{CoordinatorConfig, Result, SalesError};

/// Moves deliveries through their lifecycle after the sale created them.
///
/// The sale operations only ever write `pending` and `cancelled`; starting
/// and completing a delivery happens here.
pub struct DeliveryTracker<S: RecordStore> {
    store: S,
    retry: RetryPolicy,
}

impl<S: RecordStore> DeliveryTracker<S> {
    /// Creates a new delivery tracker.
    pub fn new(store: S, config: &CoordinatorConfig) -> Self {
        Self {
            store,
            retry: RetryPolicy::new(config),
        }
    }

    /// pending -> in-progress
    #[tracing::instrument(skip(self))]
    pub async fn start(&self, delivery_id: DeliveryId) -> Result<Delivery> {
        self.transition("start_delivery", delivery_id, |delivery, at| {
            delivery.start(at)
        })
        .await
    }

    /// in-progress -> completed, stamping the completion date.
    #[tracing::instrument(skip(self, notes))]
    pub async fn complete(
        &self,
        delivery_id: DeliveryId,
        notes: Option<String>,
    ) -> Result<Delivery> {
        self.transition("complete_delivery", delivery_id, |delivery, at| {
            delivery.complete(at, notes.clone())
        })
        .await
    }

    /// Any non-terminal status -> cancelled.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, delivery_id: DeliveryId) -> Result<Delivery> {
        self.transition("cancel_delivery", delivery_id, |delivery, at| {
            delivery.cancel(at)
        })
        .await
    }

    pub async fn get(&self, delivery_id: DeliveryId) -> Result<Delivery> {
        self.store
            .fetch(delivery_id)
            .await?
            .ok_or_else(|| SalesError::not_found("delivery", delivery_id))
    }

    pub async fn list(&self) -> Result<Vec<Delivery>> {
        Ok(self.store.fetch_all().await?)
    }

    async fn transition<F>(
        &self,
        operation: &'static str,
        delivery_id: DeliveryId,
        apply: F,
    ) -> Result<Delivery>
    where
        F: Fn(&mut Delivery, DateTime<Utc>) -> std::result::Result<(), DeliveryError>,
    {
        let apply = &apply;
        let delivery = self
            .retry
            .run(operation, move || self.try_transition(delivery_id, apply))
            .await?;

        tracing::info!(status = %delivery.status(), "delivery status changed");
        Ok(delivery)
    }

    async fn try_transition<F>(&self, delivery_id: DeliveryId, apply: &F) -> Result<Delivery>
    where
        F: Fn(&mut Delivery, DateTime<Utc>) -> std::result::Result<(), DeliveryError>,
    {
        let mut uow = self.store.begin();
        let mut delivery: Delivery = uow
            .get(delivery_id)
            .await?
            .ok_or_else(|| SalesError::not_found("delivery", delivery_id))?;

        apply(&mut delivery, Utc::now())?;
        uow.put(&delivery)?;
        uow.commit().await?;
        Ok(delivery)
    }
}
