//! Stock content rules driven by host callbacks.

mod common;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use common::{TestProvider, init_tracing};
use synergy_content::{COMBAT_ECHO, CatalogueTuning, SURVIVAL_SHIELD, WorldEffects, stock_rules};
use synergy_core::{ActorId, ModuleView, Vec3};
use synergy_runtime::{
    ActorInfo, DamageEvent, DamageSource, EngineConfig, EventAdapter, HostSide, RuleManager,
};

const PLAYER: ActorId = ActorId(1);
const ZOMBIE: ActorId = ActorId(500);

#[derive(Default)]
struct World {
    energy: Mutex<HashMap<ActorId, u64>>,
    absorption: Mutex<HashMap<ActorId, f32>>,
    true_damage: Mutex<Vec<(ActorId, ActorId, f32)>>,
}

impl WorldEffects for World {
    fn is_player(&self, actor: ActorId) -> bool {
        actor == PLAYER
    }

    fn energy(&self, actor: ActorId) -> u64 {
        self.energy.lock().unwrap().get(&actor).copied().unwrap_or(0)
    }

    fn add_energy(&self, actor: ActorId, amount: u64) {
        *self.energy.lock().unwrap().entry(actor).or_default() += amount;
    }

    fn consume_energy(&self, actor: ActorId, amount: u64) -> bool {
        let mut energy = self.energy.lock().unwrap();
        let stored = energy.entry(actor).or_default();
        if *stored < amount {
            return false;
        }
        *stored -= amount;
        true
    }

    fn deal_true_damage(&self, attacker: ActorId, target: ActorId, amount: f32) {
        self.true_damage.lock().unwrap().push((attacker, target, amount));
    }

    fn absorption(&self, actor: ActorId) -> f32 {
        self.absorption.lock().unwrap().get(&actor).copied().unwrap_or(0.0)
    }

    fn set_absorption(&self, actor: ActorId, amount: f32) {
        self.absorption.lock().unwrap().insert(actor, amount);
    }

    fn status_message(&self, _: ActorId, _: &str) {}
}

fn setup(modules: Vec<ModuleView>) -> (EventAdapter, Arc<World>) {
    init_tracing();
    let config = EngineConfig::default().with_require_activation(false);
    let manager = Arc::new(RuleManager::new(config.clone()));
    manager.init(TestProvider::with(PLAYER, modules));

    let world = Arc::new(World::default());
    let rules = stock_rules(world.clone(), &CatalogueTuning::default()).unwrap();
    assert_eq!(manager.register_all(rules).unwrap(), 3);

    (EventAdapter::new(manager, &config), world)
}

fn player() -> ActorInfo {
    ActorInfo::player(PLAYER, Vec3::new(0.0, 64.0, 0.0))
}

#[test]
fn critical_hit_echoes_true_damage() {
    let (adapter, world) = setup(vec![
        ModuleView::active("CRITICAL_STRIKE", 2),
        ModuleView::active("DAMAGE_BOOST", 2),
    ]);
    let falling = ActorInfo {
        fall_distance: 2.0,
        on_ground: false,
        ..player()
    };
    let hit = DamageEvent {
        attacker: Some(falling),
        victim: ActorInfo::creature(ZOMBIE, Vec3::new(1.0, 64.0, 0.0)),
        amount: 20.0,
        source: DamageSource::actor(PLAYER),
        side: HostSide::Authoritative,
    };

    assert_eq!(adapter.on_damage(&hit), 1);
    assert_eq!(*world.true_damage.lock().unwrap(), [(PLAYER, ZOMBIE, 4.0)]);
    assert_eq!(
        adapter.manager().get_by_event_type(synergy_core::EventKind::CriticalHit)[0].id(),
        COMBAT_ECHO
    );
}

#[test]
fn survival_shield_needs_energy_to_count() {
    let (adapter, world) = setup(vec![
        ModuleView::active("YELLOW_SHIELD", 2),
        ModuleView::active("FIRE_EXTINGUISH", 2),
    ]);
    let lava = DamageEvent {
        attacker: None,
        victim: player(),
        amount: 4.0,
        source: DamageSource::environment("lava"),
        side: HostSide::Authoritative,
    };

    // Absorption is granted before the energy payment fails.
    assert_eq!(adapter.on_damage(&lava), 0);
    assert_eq!(world.absorption(PLAYER), 4.0);

    world.add_energy(PLAYER, 100);
    assert_eq!(adapter.on_damage(&lava), 1);
    assert_eq!(world.absorption(PLAYER), 8.0);
    assert_eq!(world.energy(PLAYER), 70);
    assert!(adapter.manager().registry().has(SURVIVAL_SHIELD));
}
