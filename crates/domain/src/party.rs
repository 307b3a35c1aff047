//! Clients and chauffeurs.
//!
//! Both are maintained elsewhere; the sales engine only checks that the ones
//! a sale refers to exist.

use common::{ChauffeurId, ClientId, EntityId};
use serde::{Deserialize, Serialize};
use store::Record;

/// A client of the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub code: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl Client {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ClientId::new(),
            code: code.into(),
            name: name.into(),
            phone: None,
            email: None,
        }
    }
}

impl Record for Client {
    fn collection() -> &'static str {
        "clients"
    }

    fn id(&self) -> EntityId {
        self.id.into()
    }
}

/// A driver who can be assigned deliveries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chauffeur {
    pub id: ChauffeurId,
    pub name: String,
    pub phone: String,
    pub active: bool,
}

impl Chauffeur {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id: ChauffeurId::new(),
            name: name.into(),
            phone: phone.into(),
            active: true,
        }
    }
}

impl Record for Chauffeur {
    fn collection() -> &'static str {
        "chauffeurs"
    }

    fn id(&self) -> EntityId {
        self.id.into()
    }
}
