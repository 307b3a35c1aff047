//! Sale commands.

use chrono::{DateTime, Utc};
use common::{ChauffeurId, ClientId, SaleId};

use super::{Sale, SaleItem};
use crate::{DeliveryAssignment, DeliveryType, PaymentMethod, ValidationError};

/// How a sale is handed over, with the delivery details when it is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliverySpec {
    pub delivery_type: DeliveryType,
    pub chauffeur_id: Option<ChauffeurId>,
    pub license: Option<String>,
    pub delivery_date: Option<DateTime<Utc>>,
}

impl DeliverySpec {
    /// Creates a spec with no delivery details.
    pub fn new(delivery_type: DeliveryType) -> Self {
        Self {
            delivery_type,
            chauffeur_id: None,
            license: None,
            delivery_date: None,
        }
    }

    pub fn in_store() -> Self {
        Self::new(DeliveryType::InStore)
    }

    pub fn pickup() -> Self {
        Self::new(DeliveryType::Pickup)
    }

    /// Creates a `Delivery` spec for a chauffeur and vehicle.
    pub fn delivered_by(chauffeur_id: ChauffeurId, license: impl Into<String>) -> Self {
        Self {
            delivery_type: DeliveryType::Delivery,
            chauffeur_id: Some(chauffeur_id),
            license: Some(license.into()),
            delivery_date: None,
        }
    }

    /// Sets the planned delivery date.
    pub fn on(mut self, date: DateTime<Utc>) -> Self {
        self.delivery_date = Some(date);
        self
    }

    /// Returns the assignment a delivery must be created with, or None when
    /// the delivery type does not need one.
    ///
    /// Chauffeur and license are mandatory for `Delivery`; they are ignored
    /// for the other types.
    pub fn assignment(&self) -> Result<Option<DeliveryAssignment>, ValidationError> {
        if !self.delivery_type.requires_delivery() {
            return Ok(None);
        }

        let chauffeur_id = self
            .chauffeur_id
            .ok_or(ValidationError::ChauffeurRequired)?;
        let license = self
            .license
            .as_deref()
            .map(str::trim)
            .filter(|license| !license.is_empty())
            .ok_or(ValidationError::LicenseRequired)?;

        Ok(Some(DeliveryAssignment {
            chauffeur_id,
            license: license.to_string(),
            delivery_date: self.delivery_date,
        }))
    }
}

fn validate_items(items: &[SaleItem]) -> Result<(), ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::NoItems);
    }
    items.iter().try_for_each(SaleItem::validate)?;
    Sale::total_of(items).map(|_| ())
}

/// Command to create a new sale.
#[derive(Debug, Clone)]
pub struct CreateSale {
    /// The sale ID to create.
    pub sale_id: SaleId,

    /// The client buying.
    pub client_id: ClientId,

    /// Requested lines; the sale keeps only those that can be fulfilled.
    pub items: Vec<SaleItem>,

    pub payment_method: PaymentMethod,

    pub delivery: DeliverySpec,

    pub invoice: Option<String>,
}

impl CreateSale {
    /// Creates a new CreateSale command with a generated sale ID, paid cash.
    pub fn new(client_id: ClientId, items: Vec<SaleItem>, delivery: DeliverySpec) -> Self {
        Self {
            sale_id: SaleId::new(),
            client_id,
            items,
            payment_method: PaymentMethod::default(),
            delivery,
            invoice: None,
        }
    }

    pub fn with_payment_method(mut self, payment_method: PaymentMethod) -> Self {
        self.payment_method = payment_method;
        self
    }

    pub fn with_invoice(mut self, invoice: impl Into<String>) -> Self {
        self.invoice = Some(invoice.into());
        self
    }

    /// Checks the request shape. Returns the delivery assignment, if any.
    pub fn validate(&self) -> Result<Option<DeliveryAssignment>, ValidationError> {
        validate_items(&self.items)?;
        self.delivery.assignment()
    }
}

/// Command to replace the lines and delivery details of a sale.
#[derive(Debug, Clone)]
pub struct UpdateSale {
    pub sale_id: SaleId,

    pub items: Vec<SaleItem>,

    /// New payment method; the current one is kept when None.
    pub payment_method: Option<PaymentMethod>,

    pub delivery: DeliverySpec,
}

impl UpdateSale {
    /// Creates a new UpdateSale command.
    pub fn new(sale_id: SaleId, items: Vec<SaleItem>, delivery: DeliverySpec) -> Self {
        Self {
            sale_id,
            items,
            payment_method: None,
            delivery,
        }
    }

    pub fn with_payment_method(mut self, payment_method: PaymentMethod) -> Self {
        self.payment_method = Some(payment_method);
        self
    }

    /// Checks the request shape. Returns the delivery assignment, if any.
    pub fn validate(&self) -> Result<Option<DeliveryAssignment>, ValidationError> {
        validate_items(&self.items)?;
        self.delivery.assignment()
    }
}

/// Command to delete a sale and give its stock back.
#[derive(Debug, Clone, Copy)]
pub struct DeleteSale {
    pub sale_id: SaleId,
}

impl DeleteSale {
    /// Creates a new DeleteSale command.
    pub fn new(sale_id: SaleId) -> Self {
        Self { sale_id }
    }
}
