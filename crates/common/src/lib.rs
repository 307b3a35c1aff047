//! Identifier types shared by every crate of the sales engine.

mod types;

pub use types::{ArticleId, ChauffeurId, ClientId, DeliveryId, EntityId, SaleId};
