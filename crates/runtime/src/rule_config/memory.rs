//! In-memory ConfigRepository implementation for tests and local runs.

use std::collections::HashMap;
use std::sync::RwLock;

use synergy_core::ActorId;

use super::document::RuleConfigDocument;
use super::error::{RepositoryError, Result};
use super::repository::ConfigRepository;

#[derive(Debug, Default)]
pub struct InMemoryConfigRepository {
    documents: RwLock<HashMap<ActorId, RuleConfigDocument>>,
}

impl InMemoryConfigRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigRepository for InMemoryConfigRepository {
    fn load(&self, actor: ActorId) -> Result<Option<RuleConfigDocument>> {
        let documents = self
            .documents
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(documents.get(&actor).cloned())
    }

    fn save(&self, actor: ActorId, document: &RuleConfigDocument) -> Result<()> {
        let mut documents = self
            .documents
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        documents.insert(actor, document.clone());
        Ok(())
    }

    fn exists(&self, actor: ActorId) -> bool {
        self.documents
            .read()
            .map(|documents| documents.contains_key(&actor))
            .unwrap_or(false)
    }

    fn delete(&self, actor: ActorId) -> Result<()> {
        let mut documents = self
            .documents
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        documents.remove(&actor);
        Ok(())
    }
}
