//! Delivery sub-aggregate.

use chrono::{DateTime, Utc};
use common::{ChauffeurId, DeliveryId, EntityId, SaleId};
use serde::{Deserialize, Serialize};
use store::Record;

use super::{DeliveryError, DeliveryStatus};

/// Who delivers, with which vehicle, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAssignment {
    pub chauffeur_id: ChauffeurId,
    pub license: String,
    /// Planned date; defaults to the moment the delivery is (re)assigned.
    pub delivery_date: Option<DateTime<Utc>>,
}

/// A delivery created for, and owned by, one sale.
///
/// The sale reference is cleared when the sale is deleted; the record itself
/// is kept for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    id: DeliveryId,
    sale_id: Option<SaleId>,
    chauffeur_id: ChauffeurId,
    license: String,
    status: DeliveryStatus,
    delivery_date: DateTime<Utc>,
    completion_date: Option<DateTime<Utc>>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

// Query methods
impl Delivery {
    pub fn id(&self) -> DeliveryId {
        self.id
    }

    /// Returns the owning sale, or None once detached.
    pub fn sale_id(&self) -> Option<SaleId> {
        self.sale_id
    }

    pub fn chauffeur_id(&self) -> ChauffeurId {
        self.chauffeur_id
    }

    pub fn license(&self) -> &str {
        &self.license
    }

    pub fn status(&self) -> DeliveryStatus {
        self.status
    }

    pub fn delivery_date(&self) -> DateTime<Utc> {
        self.delivery_date
    }

    pub fn completion_date(&self) -> Option<DateTime<Utc>> {
        self.completion_date
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns true if the delivery is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// Transitions
impl Delivery {
    /// Creates a pending delivery for `sale_id`.
    pub fn pending(
        id: DeliveryId,
        sale_id: SaleId,
        assignment: DeliveryAssignment,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            sale_id: Some(sale_id),
            chauffeur_id: assignment.chauffeur_id,
            license: assignment.license,
            status: DeliveryStatus::Pending,
            delivery_date: assignment.delivery_date.unwrap_or(at),
            completion_date: None,
            notes: None,
            created_at: at,
            updated_at: at,
        }
    }

    /// Puts the delivery on the road.
    pub fn start(&mut self, at: DateTime<Utc>) -> Result<(), DeliveryError> {
        if !self.status.can_start() {
            return Err(self.invalid("start"));
        }
        self.status = DeliveryStatus::InProgress;
        self.updated_at = at;
        Ok(())
    }

    /// Marks the goods as handed over and stamps the completion date.
    pub fn complete(
        &mut self,
        at: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<(), DeliveryError> {
        if !self.status.can_complete() {
            return Err(self.invalid("complete"));
        }
        self.status = DeliveryStatus::Completed;
        self.completion_date = Some(at);
        if notes.is_some() {
            self.notes = notes;
        }
        self.updated_at = at;
        Ok(())
    }

    /// Cancels a delivery that has not reached a terminal state.
    pub fn cancel(&mut self, at: DateTime<Utc>) -> Result<(), DeliveryError> {
        if !self.status.can_cancel() {
            return Err(self.invalid("cancel"));
        }
        self.status = DeliveryStatus::Cancelled;
        self.updated_at = at;
        Ok(())
    }

    /// Cancels the delivery whatever its status, keeping notes and
    /// completion date. Only the deletion of its sale does this. Returns the
    /// status it had before.
    pub fn force_cancel(&mut self, at: DateTime<Utc>) -> DeliveryStatus {
        let previous = self.status;
        self.status = DeliveryStatus::Cancelled;
        self.updated_at = at;
        previous
    }

    /// Replaces the assignment and puts the delivery back to pending,
    /// whatever its status was. Returns the status it had before.
    pub fn reassign(&mut self, assignment: DeliveryAssignment, at: DateTime<Utc>) -> DeliveryStatus {
        let previous = self.status;
        self.chauffeur_id = assignment.chauffeur_id;
        self.license = assignment.license;
        self.delivery_date = assignment.delivery_date.unwrap_or(at);
        self.status = DeliveryStatus::Pending;
        self.completion_date = None;
        self.updated_at = at;
        previous
    }

    /// Clears the sale reference. Returns the sale it was attached to.
    pub fn detach(&mut self, at: DateTime<Utc>) -> Option<SaleId> {
        self.updated_at = at;
        self.sale_id.take()
    }

    fn invalid(&self, action: &'static str) -> DeliveryError {
        DeliveryError::InvalidTransition {
            current: self.status,
            action,
        }
    }
}

impl Record for Delivery {
    fn collection() -> &'static str {
        "deliveries"
    }

    fn id(&self) -> EntityId {
        self.id.into()
    }
}
