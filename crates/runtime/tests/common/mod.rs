#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use synergy_core::{ActorId, CapabilityProvider, HostObject, ModuleView};

/// Installs a test-writer subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Provider backed by a mutable actor → modules table.
///
/// Actors absent from the table carry no capability carrier.
#[derive(Default)]
pub struct TestProvider {
    modules: RwLock<HashMap<ActorId, Vec<ModuleView>>>,
}

impl TestProvider {
    pub fn with(actor: ActorId, modules: Vec<ModuleView>) -> Arc<Self> {
        let provider = Self::default();
        provider.set(actor, modules);
        Arc::new(provider)
    }

    pub fn set(&self, actor: ActorId, modules: Vec<ModuleView>) {
        self.modules.write().unwrap().insert(actor, modules);
    }
}

impl CapabilityProvider for TestProvider {
    fn carrier(&self, actor: ActorId) -> Option<HostObject> {
        self.modules
            .read()
            .unwrap()
            .contains_key(&actor)
            .then(|| Arc::new(format!("carrier of {actor}")) as HostObject)
    }

    fn installed_modules(&self, actor: ActorId) -> Vec<ModuleView> {
        self.modules
            .read()
            .unwrap()
            .get(&actor)
            .cloned()
            .unwrap_or_default()
    }
}

/// Shared, ordered log that effects append to.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}
