//! Sale aggregate implementation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{ArticleId, ClientId, DeliveryId, EntityId, SaleId};
use serde::{Deserialize, Serialize};
use store::Record;

use super::{SaleError, SaleStatus};
use crate::{DeliveryType, Discount, Money, PaymentMethod, ValidationError};

/// A line of a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItem {
    /// The article sold.
    pub article_id: ArticleId,

    /// Units sold, at least 1.
    pub quantity: u32,

    /// Price per unit.
    pub unit_price: Money,

    /// Percentage taken off the line.
    #[serde(default)]
    pub discount: Discount,
}

impl SaleItem {
    /// Creates a new line without discount.
    pub fn new(article_id: ArticleId, quantity: u32, unit_price: Money) -> Self {
        Self {
            article_id,
            quantity,
            unit_price,
            discount: Discount::none(),
        }
    }

    /// Sets the line discount.
    pub fn with_discount(mut self, discount: Discount) -> Self {
        self.discount = discount;
        self
    }

    /// Returns quantity * unit price, less the discount.
    pub fn line_total(&self) -> Result<Money, ValidationError> {
        self.unit_price
            .checked_multiply(self.quantity)
            .map(|gross| gross.apply_discount(self.discount))
            .ok_or(ValidationError::AmountOverflow {
                article_id: self.article_id,
            })
    }

    /// Checks quantity and price.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.quantity == 0 {
            return Err(ValidationError::InvalidQuantity {
                article_id: self.article_id,
                quantity: self.quantity,
            });
        }
        if self.unit_price.is_negative() {
            return Err(ValidationError::NegativePrice {
                field: "price",
                cents: self.unit_price.cents(),
            });
        }
        self.line_total().map(|_| ())
    }
}

/// Sale aggregate root.
///
/// A persisted sale always has at least one item, its total always equals
/// the sum of its line totals, and it references a delivery exactly when its
/// delivery type is `Delivery`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    id: SaleId,
    client_id: ClientId,
    items: Vec<SaleItem>,
    total: Money,
    payment_method: PaymentMethod,
    status: SaleStatus,
    delivery_type: DeliveryType,
    delivery_id: Option<DeliveryId>,
    invoice: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

// Query methods
impl Sale {
    pub fn id(&self) -> SaleId {
        self.id
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn items(&self) -> &[SaleItem] {
        &self.items
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn status(&self) -> SaleStatus {
        self.status
    }

    pub fn delivery_type(&self) -> DeliveryType {
        self.delivery_type
    }

    pub fn delivery_id(&self) -> Option<DeliveryId> {
        self.delivery_id
    }

    pub fn invoice(&self) -> Option<&str> {
        self.invoice.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the units held by this sale, summed per article.
    pub fn quantities_by_article(&self) -> BTreeMap<ArticleId, u32> {
        let mut quantities = BTreeMap::new();
        for item in &self.items {
            *quantities.entry(item.article_id).or_insert(0) += item.quantity;
        }
        quantities
    }

    /// Sums the line totals of `items`.
    pub fn total_of(items: &[SaleItem]) -> Result<Money, ValidationError> {
        items.iter().try_fold(Money::zero(), |total, item| {
            total
                .checked_add(item.line_total()?)
                .ok_or(ValidationError::AmountOverflow {
                    article_id: item.article_id,
                })
        })
    }
}

// Command methods
impl Sale {
    /// Creates a pending sale.
    pub fn new(
        id: SaleId,
        client_id: ClientId,
        items: Vec<SaleItem>,
        payment_method: PaymentMethod,
        delivery_type: DeliveryType,
        delivery_id: Option<DeliveryId>,
        at: DateTime<Utc>,
    ) -> Result<Self, SaleError> {
        let total = Self::check(&items, delivery_type, delivery_id)?;

        Ok(Self {
            id,
            client_id,
            total,
            items,
            payment_method,
            status: SaleStatus::Pending,
            delivery_type,
            delivery_id,
            invoice: None,
            created_at: at,
            updated_at: at,
        })
    }

    /// Attaches an invoice reference.
    pub fn with_invoice(mut self, invoice: Option<String>) -> Self {
        self.invoice = invoice;
        self
    }

    /// Replaces items and delivery details; the payment method only changes
    /// when one is given. Leaves the sale untouched on error.
    pub fn revise(
        &mut self,
        items: Vec<SaleItem>,
        payment_method: Option<PaymentMethod>,
        delivery_type: DeliveryType,
        delivery_id: Option<DeliveryId>,
        at: DateTime<Utc>,
    ) -> Result<(), SaleError> {
        let total = Self::check(&items, delivery_type, delivery_id)?;

        self.total = total;
        self.items = items;
        if let Some(method) = payment_method {
            self.payment_method = method;
        }
        self.delivery_type = delivery_type;
        self.delivery_id = delivery_id;
        self.updated_at = at;
        Ok(())
    }

    /// Checks the invariants and returns the total of `items`.
    fn check(
        items: &[SaleItem],
        delivery_type: DeliveryType,
        delivery_id: Option<DeliveryId>,
    ) -> Result<Money, SaleError> {
        if items.is_empty() {
            return Err(SaleError::NoItems);
        }
        if delivery_type.requires_delivery() != delivery_id.is_some() {
            return Err(SaleError::DeliveryMismatch {
                delivery_type,
                delivery_id,
            });
        }
        Ok(Self::total_of(items)?)
    }
}

impl Record for Sale {
    fn collection() -> &'static str {
        "sales"
    }

    fn id(&self) -> EntityId {
        self.id.into()
    }
}
