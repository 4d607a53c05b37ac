//! File-based ConfigRepository implementation.

use std::fs;
use std::path::{Path, PathBuf};

use synergy_core::ActorId;

use super::document::RuleConfigDocument;
use super::error::{RepositoryError, Result};
use super::repository::ConfigRepository;

/// Stores each actor's document as `rules_{actor}.json`.
///
/// Writes go to a temporary file first and are renamed into place, so a
/// crash mid-write leaves the previous document intact.
#[derive(Debug)]
pub struct FileConfigRepository {
    base_dir: PathBuf,
}

impl FileConfigRepository {
    /// Stores documents under `base_dir`, creating it if needed.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn document_path(&self, actor: ActorId) -> PathBuf {
        self.base_dir.join(format!("rules_{}.json", actor.0))
    }
}

impl ConfigRepository for FileConfigRepository {
    fn load(&self, actor: ActorId) -> Result<Option<RuleConfigDocument>> {
        let path = self.document_path(actor);
        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path)?;
        let document =
            serde_json::from_slice(&bytes).map_err(|e| RepositoryError::Json(e.to_string()))?;

        tracing::debug!(
            target: "synergy::rule_config",
            actor = %actor,
            path = %path.display(),
            "Loaded rule config"
        );
        Ok(Some(document))
    }

    fn save(&self, actor: ActorId, document: &RuleConfigDocument) -> Result<()> {
        let path = self.document_path(actor);
        let temp_path = path.with_extension("json.tmp");

        let bytes = serde_json::to_vec_pretty(document)
            .map_err(|e| RepositoryError::Json(e.to_string()))?;
        fs::write(&temp_path, bytes)?;
        fs::rename(&temp_path, &path)?;

        tracing::debug!(
            target: "synergy::rule_config",
            actor = %actor,
            path = %path.display(),
            "Saved rule config"
        );
        Ok(())
    }

    fn exists(&self, actor: ActorId) -> bool {
        self.document_path(actor).exists()
    }

    fn delete(&self, actor: ActorId) -> Result<()> {
        let path = self.document_path(actor);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_load_delete_cycle() {
        let dir = TempDir::new().unwrap();
        let repo = FileConfigRepository::new(dir.path().join("configs")).unwrap();
        let actor = ActorId(42);

        assert!(repo.load(actor).unwrap().is_none());

        let doc = RuleConfigDocument::new(vec!["energy_loop".into(), "combat_echo".into()], 4);
        repo.save(actor, &doc).unwrap();
        assert!(repo.exists(actor));
        assert!(dir.path().join("configs/rules_42.json").exists());
        assert_eq!(repo.load(actor).unwrap(), Some(doc));

        repo.delete(actor).unwrap();
        assert!(!repo.exists(actor));
    }

    #[test]
    fn corrupted_document_is_a_json_error() {
        let dir = TempDir::new().unwrap();
        let repo = FileConfigRepository::new(dir.path()).unwrap();
        fs::write(dir.path().join("rules_1.json"), b"{not json").unwrap();

        assert!(matches!(repo.load(ActorId(1)), Err(RepositoryError::Json(_))));
    }
}
