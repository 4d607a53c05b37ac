//! Host world sink used by stock effects.

use synergy_core::ActorId;

/// World actions and queries the stock rules need from the host.
///
/// The engine never calls this itself; only effects built in this crate do.
pub trait WorldEffects: Send + Sync {
    fn is_player(&self, actor: ActorId) -> bool;

    fn energy(&self, actor: ActorId) -> u64;

    fn add_energy(&self, actor: ActorId, amount: u64);

    /// Draws `amount` from the actor's carrier; false if not enough is stored.
    fn consume_energy(&self, actor: ActorId, amount: u64) -> bool;

    /// Applies armor-bypassing damage. Hosts must tag it as engine-originated
    /// so it is not dispatched again.
    fn deal_true_damage(&self, attacker: ActorId, target: ActorId, amount: f32);

    fn absorption(&self, actor: ActorId) -> f32;

    fn set_absorption(&self, actor: ActorId, amount: f32);

    /// Short status line shown to the actor.
    fn status_message(&self, actor: ActorId, message: &str);
}
