//! Walking the module dependency graph.

use std::path::Path ;

use tracing::{ debug, warn };

use crate::{ Denylist, Module, ModuleLoader, ModuleRegistry };
use crate::loader::loadable_files ;



/// Loads a module and, transitively, everything it depends on.
///
/// Each name is handed to the loader at most once per process: successes are recorded
/// as resolutions in the registry and failures in the denylist, and both are checked
/// before every load. The walk keeps its own work stack, so the depth of the graph is
/// not limited by the call stack.
pub struct ModuleWalker<'a> {
    loader: &'a dyn ModuleLoader,
    registry: &'a ModuleRegistry,
    denylist: &'a Denylist,
}

impl<'a> ModuleWalker<'a> {

    pub fn new( loader: &'a dyn ModuleLoader, registry: &'a ModuleRegistry, denylist: &'a Denylist ) -> Self {
        Self { loader, registry, denylist }
    }

    /// Enumerates the graph rooted at `name`. When `explicit` is given it is used for the
    /// root instead of asking the loader. Never fails; unloadable names are denied.
    pub fn enumerate_from( &self, name: &str, explicit: Option<Module> ) {
        let mut pending = vec![( name.to_owned(), explicit )];
        while let Some(( name, explicit )) = pending.pop() {
            let Some( module ) = self.visit( &name, explicit ) else { continue };
            module.dependencies().iter()
                .rev()
                .filter(| dependency | !self.registry.is_resolved( dependency ))
                .for_each(| dependency | pending.push(( dependency.clone(), None )));
        }
    }

    /// Enumerates from every loadable file in `directory`, in path order. Used when the
    /// host has no entry module. Returns how many files declared a module name.
    pub fn enumerate_directory( &self, directory: &Path, extensions: &[String] ) -> usize {
        let files = match loadable_files( directory, extensions ) {
            Ok( files ) => files,
            Err( err ) => {
                warn!( "Could not list {}: {}", directory.display(), err );
                return 0
            }
        };
        files.iter()
            .filter_map(| path | match self.loader.declared_name( path ) {
                Ok( name ) => Some( name ),
                Err( err ) => {
                    debug!( "Skipping {}: {}", path.display(), err );
                    None
                }
            })
            .inspect(| name | self.enumerate_from( name, None ))
            .count()
    }

    fn visit( &self, name: &str, explicit: Option<Module> ) -> Option<Module> {
        if name.is_empty() || self.denylist.is_failed( name ) || self.registry.is_resolved( name ) { return None }
        if self.denylist.matches_rules( name ) {
            self.denylist.mark_failed( name );
            debug!( "Denied module {}", name );
            return None
        }

        let loaded = match explicit {
            Some( module ) => Ok( module ),
            None => self.loader.load( name ),
        };
        match loaded {
            Ok( module ) => {
                self.registry.register( &module );
                self.registry.record_resolution( name, &module );
                Some( module )
            }
            Err( err ) => {
                debug!( "Could not load module {}: {}", name, err );
                self.denylist.mark_failed( name );
                None
            }
        }
    }

}
