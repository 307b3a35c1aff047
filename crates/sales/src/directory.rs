//! Lookups of the parties a sale refers to.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::{ChauffeurId, ClientId};
use domain::{Chauffeur, Client};
use store::{RecordStore, RecordStoreExt};

/// Existence checks for clients and chauffeurs.
///
/// Clients and chauffeurs are managed outside the sales engine; the
/// coordinator only asks whether the ones a request names exist.
#[async_trait]
pub trait PartyDirectory: Send + Sync {
    /// Returns true if the client exists.
    async fn client_exists(&self, client_id: ClientId) -> store::Result<bool>;

    /// Returns true if the chauffeur exists.
    async fn chauffeur_exists(&self, chauffeur_id: ChauffeurId) -> store::Result<bool>;
}

/// Directory backed by the `clients` and `chauffeurs` collections of a record store.
#[derive(Debug, Clone)]
pub struct StoreDirectory<S> {
    store: S,
}

impl<S: RecordStore> StoreDirectory<S> {
    /// Creates a directory reading from `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: RecordStore> PartyDirectory for StoreDirectory<S> {
    async fn client_exists(&self, client_id: ClientId) -> store::Result<bool> {
        self.store.exists::<Client, _>(client_id).await
    }

    async fn chauffeur_exists(&self, chauffeur_id: ChauffeurId) -> store::Result<bool> {
        self.store.exists::<Chauffeur, _>(chauffeur_id).await
    }
}

#[derive(Debug, Default)]
struct InMemoryDirectoryState {
    clients: HashSet<ClientId>,
    chauffeurs: HashSet<ChauffeurId>,
}

/// In-memory directory for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPartyDirectory {
    state: Arc<RwLock<InMemoryDirectoryState>>,
}

impl InMemoryPartyDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a client and returns its id.
    pub fn add_client(&self) -> ClientId {
        let id = ClientId::new();
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clients
            .insert(id);
        id
    }

    /// Registers a chauffeur and returns its id.
    pub fn add_chauffeur(&self) -> ChauffeurId {
        let id = ChauffeurId::new();
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .chauffeurs
            .insert(id);
        id
    }
}

#[async_trait]
impl PartyDirectory for InMemoryPartyDirectory {
    async fn client_exists(&self, client_id: ClientId) -> store::Result<bool> {
        Ok(self
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clients
            .contains(&client_id))
    }

    async fn chauffeur_exists(&self, chauffeur_id: ChauffeurId) -> store::Result<bool> {
        Ok(self
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .chauffeurs
            .contains(&chauffeur_id))
    }
}
