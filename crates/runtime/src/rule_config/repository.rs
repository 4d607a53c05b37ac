//! Repository contract for per-actor rule configs.

use synergy_core::ActorId;

use super::document::RuleConfigDocument;
use super::error::Result;

/// Actor-scoped durable storage for [`RuleConfigDocument`]s.
///
/// Reads and writes are synchronous and never batched across actors.
pub trait ConfigRepository: Send + Sync {
    /// Loads the actor's document, `None` if nothing was stored yet.
    fn load(&self, actor: ActorId) -> Result<Option<RuleConfigDocument>>;

    fn save(&self, actor: ActorId, document: &RuleConfigDocument) -> Result<()>;

    fn exists(&self, actor: ActorId) -> bool;

    fn delete(&self, actor: ActorId) -> Result<()>;
}
