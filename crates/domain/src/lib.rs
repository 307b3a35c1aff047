//! Domain layer for the sales engine.
//!
//! This crate provides the entities the transaction coordinator works on:
//! - Catalog articles and their stock ledger entries
//! - Sale aggregate with its line items and invariants
//! - Delivery sub-aggregate with its status state machine
//! - Candidate commands (create/update/delete sale) with input validation

pub mod article;
pub mod delivery;
pub mod error;
pub mod party;
pub mod sale;
pub mod stock;
pub mod value_objects;

pub use article::Article;
pub use common::{ArticleId, ChauffeurId, ClientId, DeliveryId, SaleId};
pub use delivery::{Delivery, DeliveryAssignment, DeliveryError, DeliveryStatus};
pub use error::{DomainError, ValidationError};
pub use party::{Chauffeur, Client};
pub use sale::{
    CreateSale, DeleteSale, DeliverySpec, Sale, SaleError, SaleItem, SaleStatus, UpdateSale,
};
pub use stock::{StockEntry, StockError};
pub use value_objects::{DeliveryType, Discount, Money, PaymentMethod};
