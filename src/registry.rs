//! The set of known modules.

use std::collections::HashMap ;
use std::sync::Arc ;

use indexmap::IndexMap ;
use parking_lot::RwLock ;
use tracing::debug ;

use crate::{ Module, ModuleId };



/// Callback fired once for every newly known module.
pub type RegistrationHook = Arc<dyn Fn( &Module ) + Send + Sync> ;

/// Known modules in registration order, plus the names that resolved to them.
///
/// Modules are only ever added. Every method is safe to call from load hooks running on
/// any thread; hooks themselves are called with no lock held.
#[derive( Default )]
pub struct ModuleRegistry {
    modules: RwLock<IndexMap<ModuleId, Module>>,
    resolved: RwLock<HashMap<String, Module>>,
    hooks: RwLock<Vec<RegistrationHook>>,
}

impl ModuleRegistry {

    pub fn new() -> Self { Self::default() }

    /// Adds a module if it is not yet known and runs the registration hooks for it.
    /// Returns whether the module was new.
    pub fn register( &self, module: &Module ) -> bool {
        let inserted = {
            let mut modules = self.modules.write();
            match modules.contains_key( module.id() ) {
                true => false,
                false => { modules.insert( module.id().clone(), module.clone() ); true }
            }
        };
        if inserted {
            debug!( "Registered module {}", module );
            let hooks = self.hooks.read().clone();
            hooks.iter().for_each(| hook | hook( module ));
        }
        inserted
    }

    /// Adds a hook run for every module registered after this call.
    pub fn on_register( &self, hook: RegistrationHook ) { self.hooks.write().push( hook ); }

    pub fn contains( &self, module: &Module ) -> bool { self.modules.read().contains_key( module.id() ) }

    /// Snapshot of the known modules in registration order.
    pub fn modules( &self ) -> Vec<Module> { self.modules.read().values().cloned().collect() }

    pub fn len( &self ) -> usize { self.modules.read().len() }

    pub fn is_empty( &self ) -> bool { self.modules.read().is_empty() }

    /// Records that `name` resolved to `module`.
    pub fn record_resolution( &self, name: &str, module: &Module ) {
        self.resolved.write().insert( name.to_owned(), module.clone() );
    }

    /// The module a name resolved to, if it was resolved.
    pub fn resolution( &self, name: &str ) -> Option<Module> { self.resolved.read().get( name ).cloned() }

    pub fn is_resolved( &self, name: &str ) -> bool { self.resolved.read().contains_key( name ) }

}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
        f.debug_struct( "ModuleRegistry" )
            .field( "modules", &self.modules.read().keys().collect::<Vec<_>>() )
            .field( "resolved", &self.resolved.read().keys().collect::<Vec<_>>() )
            .field( "hooks", &self.hooks.read().len() )
            .finish()
    }
}
