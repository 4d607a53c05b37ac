//! Host event model consumed by the adapter.
//!
//! Plain data snapshots of the host's callbacks. Hosts fill them from their
//! own world types; the adapter forwards them to rules as the opaque trigger,
//! so rules can downcast back to these types.

use synergy_core::{ActorId, TickSample, Vec3};

/// Which side of the host raised the callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostSide {
    /// Simulation-authoritative side; the only side the engine reacts to.
    Authoritative,
    /// Presentation-only replica.
    Remote,
}

impl HostSide {
    /// True for the side whose callbacks may dispatch.
    pub const fn is_authoritative(self) -> bool {
        matches!(self, Self::Authoritative)
    }
}

/// What the adapter needs to know about an actor at callback time.
#[derive(Clone, Debug, PartialEq)]
pub struct ActorInfo {
    pub id: ActorId,
    pub is_player: bool,
    pub position: Vec3,
    pub health: f32,
    pub fall_distance: f32,
    pub on_ground: bool,
    pub on_ladder: bool,
    pub in_water: bool,
    pub riding: bool,
}

impl ActorInfo {
    /// A grounded player at `position` with full health.
    pub fn player(id: ActorId, position: Vec3) -> Self {
        Self {
            id,
            is_player: true,
            position,
            health: 20.0,
            fall_distance: 0.0,
            on_ground: true,
            on_ladder: false,
            in_water: false,
            riding: false,
        }
    }

    /// A grounded non-player actor.
    pub fn creature(id: ActorId, position: Vec3) -> Self {
        Self {
            is_player: false,
            ..Self::player(id, position)
        }
    }

    /// Falling onto the target: airborne and not climbing, swimming or mounted.
    pub fn is_critical_strike(&self) -> bool {
        self.fall_distance > 0.0 && !self.on_ground && !self.on_ladder && !self.in_water && !self.riding
    }

    /// Tick-time sample fed into the actor's history.
    pub fn sample(&self, world_time: u64) -> TickSample {
        TickSample::new(self.position, self.health, world_time)
    }
}

/// Origin of a damage amount.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DamageSource {
    pub damage_type: String,
    /// Actor ultimately responsible, if any.
    pub true_source: Option<ActorId>,
}

impl DamageSource {
    /// Damage type used to tag damage produced by rule effects.
    pub const ENGINE_ORIGIN: &'static str = "synergy_bonus";

    /// Damage types classified as environmental.
    pub const ENVIRONMENTAL: [&'static str; 10] = [
        "inFire",
        "onFire",
        "lava",
        "drown",
        "fall",
        "inWall",
        "cactus",
        "lightningBolt",
        "hotFloor",
        "freeze",
    ];

    /// Damage of `damage_type`, attributed to `true_source` when known.
    pub fn new(damage_type: impl Into<String>, true_source: Option<ActorId>) -> Self {
        Self {
            damage_type: damage_type.into(),
            true_source,
        }
    }

    /// Damage dealt by `attacker` in melee.
    pub fn actor(attacker: ActorId) -> Self {
        Self::new("player", Some(attacker))
    }

    /// Damage with no attacker, such as fire or falling.
    pub fn environment(damage_type: impl Into<String>) -> Self {
        Self::new(damage_type, None)
    }

    /// Tags damage produced by this engine so it is not re-dispatched.
    pub fn engine(attacker: ActorId) -> Self {
        Self::new(Self::ENGINE_ORIGIN, Some(attacker))
    }

    /// Whether this damage was dealt by an engine effect.
    pub fn is_engine_origin(&self) -> bool {
        self.damage_type == Self::ENGINE_ORIGIN
    }

    /// Whether the damage type is one of the environmental origins.
    pub fn is_environmental(&self) -> bool {
        Self::ENVIRONMENTAL.contains(&self.damage_type.as_str())
    }
}

/// Pre-damage callback: `attacker` is about to hit `target`.
#[derive(Clone, Debug, PartialEq)]
pub struct AttackEvent {
    pub attacker: ActorInfo,
    pub target: ActorInfo,
    pub amount: f32,
    pub source: DamageSource,
    pub side: HostSide,
}

/// Post-damage callback with the final amount.
#[derive(Clone, Debug, PartialEq)]
pub struct DamageEvent {
    /// The responsible actor, absent for environmental damage.
    pub attacker: Option<ActorInfo>,
    pub victim: ActorInfo,
    pub amount: f32,
    pub source: DamageSource,
    pub side: HostSide,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeathEvent {
    pub victim: ActorInfo,
    pub killer: Option<ActorInfo>,
    pub source: DamageSource,
    pub side: HostSide,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_strike_requires_free_fall() {
        let mut actor = ActorInfo::player(ActorId(1), Vec3::default());
        assert!(!actor.is_critical_strike());

        actor.on_ground = false;
        actor.fall_distance = 1.5;
        assert!(actor.is_critical_strike());

        actor.in_water = true;
        assert!(!actor.is_critical_strike());
    }

    #[test]
    fn damage_sources_are_classified() {
        assert!(DamageSource::environment("lava").is_environmental());
        assert!(!DamageSource::actor(ActorId(1)).is_environmental());
        assert!(DamageSource::engine(ActorId(1)).is_engine_origin());
        assert!(!DamageSource::environment("fall").is_engine_origin());
    }
}
