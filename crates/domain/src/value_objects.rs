//! Value objects shared by articles and sales.

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Money amount represented in cents to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = 10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Creates a new Money amount from whole currency units.
    pub fn from_units(units: i64) -> Self {
        Self { cents: units * 100 }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the whole-unit portion.
    pub fn units(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after units).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Multiplies by a quantity. Returns None on overflow.
    pub fn checked_multiply(&self, quantity: u32) -> Option<Money> {
        self.cents
            .checked_mul(i64::from(quantity))
            .map(Money::from_cents)
    }

    /// Adds two amounts. Returns None on overflow.
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.cents.checked_add(other.cents).map(Money::from_cents)
    }

    /// Takes `discount` percent off, rounding half up to the cent.
    ///
    /// The result never exceeds the original amount in magnitude, so the
    /// intermediate product is widened instead of checked.
    pub fn apply_discount(&self, discount: Discount) -> Money {
        let kept = 100 - i128::from(discount.percent());
        let cents = (i128::from(self.cents) * kept + 50).div_euclid(100);
        Money {
            cents: cents as i64,
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-{}.{:02}", self.units().abs(), self.cents_part())
        } else {
            write!(f, "{}.{:02}", self.units(), self.cents_part())
        }
    }
}

/// Line discount as a whole percentage, 0 to 100 inclusive.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u32", into = "u32")]
pub struct Discount(u8);

impl Discount {
    /// No discount.
    pub fn none() -> Self {
        Self(0)
    }

    /// Creates a discount, rejecting values above 100.
    pub fn percent_of(value: u32) -> Result<Self, ValidationError> {
        if value > 100 {
            return Err(ValidationError::InvalidDiscount { value });
        }
        Ok(Self(value as u8))
    }

    /// Returns the percentage.
    pub fn percent(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u32> for Discount {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::percent_of(value)
    }
}

impl From<Discount> for u32 {
    fn from(discount: Discount) -> Self {
        discount.0 as u32
    }
}

impl std::fmt::Display for Discount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// How a sale is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "cash")]
    Cash,
    #[serde(rename = "credit card")]
    CreditCard,
    #[serde(rename = "bank transfer")]
    BankTransfer,
}

impl PaymentMethod {
    /// Returns the payment method name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::CreditCard => "credit card",
            PaymentMethod::BankTransfer => "bank transfer",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the goods of a sale reach the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryType {
    #[serde(rename = "In Store")]
    InStore,
    #[serde(rename = "Delivery")]
    Delivery,
    #[serde(rename = "Pickup")]
    Pickup,
}

impl DeliveryType {
    /// Returns true if a delivery record must accompany the sale.
    pub fn requires_delivery(&self) -> bool {
        matches!(self, DeliveryType::Delivery)
    }

    /// Returns the delivery type name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryType::InStore => "In Store",
            DeliveryType::Delivery => "Delivery",
            DeliveryType::Pickup => "Pickup",
        }
    }
}

impl std::fmt::Display for DeliveryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
