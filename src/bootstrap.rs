//! The start-up sequence.

use std::collections::HashSet ;
use std::panic::{ catch_unwind, AssertUnwindSafe };
use std::path::PathBuf ;
use std::sync::Arc ;
use std::sync::atomic::{ AtomicBool, Ordering };

use itertools::Itertools ;
use parking_lot::Mutex ;
use thiserror::Error ;
use tracing::{ debug, info, info_span, warn };

use crate::{
    BootstrapConfig, Denylist, MethodInfo, Module, ModuleId, ModuleLoader, ModuleRegistry, ModuleWalker,
    NativeResolver, ParamKind, PluginDiscovery, PluginProber, QueryCache, QueryEngine, ACTIVATION_MARKER,
};
use crate::utils::{ panic_message, PartialSuccess };



/// Errors raised while invoking activation methods.
#[derive( Error, Debug )]
pub enum ActivationError {
    /// The method takes parameters other than nothing or the module sequence.
    #[error( "Strange activation method {0}( {1} ): expected no parameters or a single module sequence" )]
    Malformed( String, String ),
    /// The method is described but has nothing to invoke.
    #[error( "Activation method {0} has no body" )] MissingBody( String ),
    /// The method returned an error.
    #[error( "Activation method {0} failed: {1}" )] Failed( String, Box<dyn std::error::Error + Send + Sync> ),
    /// The method panicked.
    #[error( "Activation method {0} panicked: {1}" )] Panicked( String, String ),
}

/// Outcome of [`Bootstrap::init`].
#[derive( Debug, Default )]
pub struct InitReport {
    /// Every known module, registry order first, then newly loaded plugins.
    pub modules: Vec<Module>,
    /// Plugin files found in the plugin directory.
    pub plugins: Vec<PathBuf>,
    /// Qualified names of the activation methods invoked by this call.
    pub invoked: Vec<String>,
    /// Activation methods that were skipped or failed.
    pub errors: Vec<ActivationError>,
}

#[derive( Debug, Clone, PartialEq, Eq, Hash )]
struct MethodKey {
    module: ModuleId,
    declaring_type: String,
    method: String,
}

impl MethodKey {
    fn new( module: &Module, method: &MethodInfo ) -> Self {
        Self { module: module.id().clone(), declaring_type: method.declaring_type().to_owned(), method: method.name().to_owned() }
    }
}

/// Owns the module registry, denylist, query engine and native resolver of one host
/// process and drives them through the start-up sequence.
///
/// Every module the loader opens, wherever it is opened from, is registered. Activation
/// methods are invoked at most once per `Bootstrap`.
pub struct Bootstrap {
    config: BootstrapConfig,
    loader: Arc<dyn ModuleLoader>,
    registry: Arc<ModuleRegistry>,
    denylist: Denylist,
    engine: QueryEngine,
    resolver: Arc<NativeResolver>,
    native_hook_installed: AtomicBool,
    activated: Mutex<HashSet<MethodKey>>,
}

impl Bootstrap {

    pub fn new( config: BootstrapConfig, loader: Arc<dyn ModuleLoader> ) -> Self {
        let registry = Arc::new( ModuleRegistry::new() );
        let on_load = Arc::clone( &registry );
        loader.subscribe( Arc::new( move | module: &Module | { on_load.register( module ); }));

        let engine = QueryEngine::new( QueryCache::new( config.cache_dir() ), Arc::clone( &registry ));
        let resolver = Arc::new( NativeResolver::new( config.base_dir() ));
        Self {
            config,
            loader,
            registry,
            denylist: Denylist::new(),
            engine,
            resolver,
            native_hook_installed: AtomicBool::new( false ),
            activated: Mutex::new( HashSet::new() ),
        }
    }

    /// Replaces the native resolver. Must be called before
    /// [`unpack_native_dependencies`]( Self::unpack_native_dependencies ).
    pub fn with_resolver( mut self, resolver: NativeResolver ) -> Self {
        self.resolver = Arc::new( resolver );
        self
    }

    #[inline] pub fn config( &self ) -> &BootstrapConfig { &self.config }
    #[inline] pub fn loader( &self ) -> &dyn ModuleLoader { &*self.loader }
    #[inline] pub fn registry( &self ) -> &ModuleRegistry { &self.registry }
    #[inline] pub fn denylist( &self ) -> &Denylist { &self.denylist }
    #[inline] pub fn engine( &self ) -> &QueryEngine { &self.engine }
    #[inline] pub fn resolver( &self ) -> &NativeResolver { &self.resolver }

    pub fn walker( &self ) -> ModuleWalker<'_> { ModuleWalker::new( &*self.loader, &self.registry, &self.denylist )}

    /// Runs the whole sequence: enumerate the entry graph, unpack native dependencies,
    /// discover and load plugins, then invoke every activation method not yet invoked.
    pub fn init( &self ) -> InitReport {
        let _span = info_span!( "init", app = self.config.app_name() ).entered();
        info!( "Starting {} on {}/{}", self.config.app_name(), std::env::consts::OS, std::env::consts::ARCH );

        info_span!( "enumerate" ).in_scope(|| self.enumerate_entry() );
        info_span!( "unpack_native" ).in_scope(|| self.unpack_native_dependencies() );
        let ( plugins, loaded ) = info_span!( "load_plugins" ).in_scope(|| self.load_plugins() );
        let modules = self.known_modules( &loaded );
        let ( invoked, errors ) = info_span!( "activate" ).in_scope(|| self.activate( &modules ));

        info!( "{} module(s) known, {} plugin(s), {} activation method(s) invoked", modules.len(), plugins.len(), invoked.len() );
        InitReport { modules, plugins, invoked, errors }
    }

    /// Enumerates the module graph from the configured entry module, else from the
    /// loader's entry module, else from every loadable file in the base directory.
    /// Returns the number of known modules afterwards.
    pub fn enumerate_entry( &self ) -> usize {
        let walker = self.walker();
        match self.config.entry().cloned().or_else(|| self.loader.entry_module() ) {
            Some( entry ) => walker.enumerate_from( &entry.name().to_owned(), Some( entry )),
            None => {
                warn!( "No entry module, enumerating every module in {}", self.config.base_dir().display() );
                walker.enumerate_directory( self.config.base_dir(), self.config.extensions() );
            }
        }
        self.registry.len()
    }

    /// Unpacks the native payloads of every module known so far and arranges for every
    /// module registered later to be unpacked on registration.
    ///
    /// The hook is installed before the snapshot is taken. A module registered in between
    /// is unpacked twice, which leaves the same files behind.
    pub fn unpack_native_dependencies( &self ) {
        if !self.native_hook_installed.swap( true, Ordering::SeqCst ) {
            let resolver = Arc::clone( &self.resolver );
            self.registry.on_register( Arc::new( move | module: &Module | { resolver.resolve_logged( module ); }));
        }

        self.loader.loaded().into_iter()
            .chain( self.registry.modules() )
            .unique()
            .for_each(| module | { self.resolver.resolve_logged( &module ); });
    }

    /// Discovers the plugins in the plugin directory and loads them. Returns the plugin
    /// paths and the modules that loaded.
    pub fn load_plugins( &self ) -> ( Vec<PathBuf>, Vec<Module> ) {
        let discovery = PluginDiscovery::new(
            PluginProber::new( &*self.loader, &self.engine ),
            self.config.plugin_cache_file(),
            self.config.extensions(),
        );
        let paths = discovery.discover( self.config.plugin_dir() );
        let modules = paths.iter()
            .filter_map(| path | match self.loader.load_file( path ) {
                Ok( module ) => Some( module ),
                Err( err ) => {
                    warn!( "Could not load plugin {}: {}", path.display(), err );
                    None
                }
            })
            .collect();
        ( paths, modules )
    }

    /// Registry modules followed by `plugins`, without duplicates.
    pub fn known_modules( &self, plugins: &[Module] ) -> Vec<Module> {
        self.registry.modules().into_iter()
            .chain( plugins.iter().cloned() )
            .unique()
            .collect()
    }

    /// Invokes every activation method of `modules` that this `Bootstrap` has not invoked
    /// yet. Methods taking the module sequence receive `modules`. Failures are logged and
    /// collected; they never stop the remaining invocations.
    pub fn activate( &self, modules: &[Module] ) -> PartialSuccess<Vec<String>, ActivationError> {
        let mut invoked = Vec::new();
        let mut errors = Vec::new();
        for module in modules {
            for ( method, _ ) in self.engine.methods_with_marker( module, ACTIVATION_MARKER ) {
                if !self.activated.lock().insert( MethodKey::new( module, &method )) {
                    debug!( "{} already activated", method.qualified_name() );
                    continue
                }
                match invoke( &method, modules ) {
                    Ok(()) => {
                        info!( "Activated {}", method.qualified_name() );
                        invoked.push( method.qualified_name() );
                    }
                    Err( err ) => {
                        warn!( "{}", err );
                        errors.push( err );
                    }
                }
            }
        }
        ( invoked, errors )
    }

}

impl std::fmt::Debug for Bootstrap {
    fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
        f.debug_struct( "Bootstrap" )
            .field( "config", &self.config )
            .field( "registry", &self.registry )
            .field( "denylist", &self.denylist )
            .field( "activated", &self.activated.lock().len() )
            .finish_non_exhaustive()
    }
}

fn invoke( method: &MethodInfo, modules: &[Module] ) -> Result<(), ActivationError> {
    let name = method.qualified_name();
    let arguments: &[Module] = match method.params() {
        [] => &[],
        [ ParamKind::Modules ] => modules,
        params => return Err( ActivationError::Malformed( name, params.iter().join( ", " ))),
    };
    let body = method.body().ok_or_else(|| ActivationError::MissingBody( name.clone() ))?;
    match catch_unwind( AssertUnwindSafe(|| body( arguments ))) {
        Ok( Ok(())) => Ok(()),
        Ok( Err( err )) => Err( ActivationError::Failed( name, err )),
        Err( payload ) => Err( ActivationError::Panicked( name, panic_message( &*payload ))),
    }
}
