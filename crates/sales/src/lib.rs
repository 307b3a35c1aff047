//! Sale/stock transaction engine.
//!
//! This crate coordinates the operations that keep the stock ledger, its
//! mirror on each article, sales and their deliveries consistent:
//! - Sale creation with partial fulfillment
//! - Sale update by releasing the old reservation and reserving the new lines
//! - Sale deletion with full stock release and delivery detachment
//!
//! Every operation runs as one unit of work against a [`store::RecordStore`]
//! and is retried from scratch when its commit conflicts with another writer.

pub mod config;
pub mod coordinator;
pub mod directory;
pub mod error;
pub mod fulfillment;
pub mod inventory;
pub mod ledger;
mod retry;
pub mod tracking;

pub use config::CoordinatorConfig;
pub use coordinator::{SaleCoordinator, SaleOutcome, SaleView};
pub use directory::{InMemoryPartyDirectory, PartyDirectory, StoreDirectory};
pub use error::{Result, SalesError};
pub use fulfillment::{Fulfillment, StockShortfall, UNKNOWN_ARTICLE};
pub use inventory::{InventoryQueries, LowStock, MirrorDrift};
pub use ledger::StockLedger;
pub use tracking::DeliveryTracker;
