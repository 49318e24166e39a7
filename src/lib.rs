//! A bootstrap layer that discovers, caches and activates optional native modules.
//!
//! A host built with `native_link` does not know its plugins at build time. At start-up
//! it walks the dependency graph of its entry module, unpacks the native libraries
//! embedded in every module, finds the plugins in its plugin directory and invokes their
//! activation methods, once each. Expensive type scans are cached on disk and reused
//! until the module file changes.
//!
//! # Core Concepts
//!
//! - [`Module`]: A loaded unit of compiled code: a name, a file, the names of the modules
//!     it depends on and the [`TypeInfo`] metadata of the types it contains.
//!
//! - [`ModuleLoader`]: Opens modules by name or by file and reports every module it opens.
//!     [`NativeLoader`] opens dynamic libraries that export a [`ModuleDescriptor`] through
//!     [`export_module!`].
//!
//! - [`ModuleWalker`]: Loads a module and everything it depends on, handing each name to
//!     the loader at most once. Names matching the [`Denylist`] or that failed before are
//!     never retried.
//!
//! - [`QueryEngine`]: Interface, base type and marker queries over one module or every
//!     module in the [`ModuleRegistry`], answered through the on-disk [`QueryCache`].
//!
//! - [`PluginDiscovery`]: Finds the files in a directory that contain an
//!     [`ACTIVATION_MARKER`] method, reusing the verdicts of previous runs from the
//!     [`CandidateCache`] until a file changes.
//!
//! - [`NativeResolver`]: Unpacks the `native.zip` payload of a module for the running
//!     platform and creates the symbolic links its `remap.xml` declares.
//!
//! - [`Bootstrap`]: Owns all of the above for one host process and runs the start-up
//!     sequence.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc ;
//! use native_link::{ Bootstrap, BootstrapConfig, NativeLoader };
//!
//! let config = BootstrapConfig::from_env( "editor" );
//! let loader = NativeLoader::new([ config.base_dir().to_path_buf(), config.plugin_dir().to_path_buf() ]);
//! let bootstrap = Bootstrap::new( config, Arc::new( loader ));
//!
//! let report = bootstrap.init();
//! for err in &report.errors {
//!     eprintln!( "{}", err );
//! }
//! println!( "{} plugin(s) activated", report.invoked.len() );
//! ```
//!
//! # Writing a plugin
//!
//! A plugin is a `cdylib` that describes its types in a static table. Any method carrying
//! the [`ACTIVATION_MARKER`] is invoked during [`Bootstrap::init`], either with no
//! arguments or with every known module.
//!
//! ```
//! use native_link::{
//!     export_module, ActivationResult, EntryPoint, MarkerDescriptor, MethodDescriptor,
//!     Module, ModuleDescriptor, TypeDescriptor, TypeKind, ACTIVATION_MARKER,
//! };
//!
//! fn register( modules: &[Module] ) -> ActivationResult {
//!     println!( "audio plugin sees {} modules", modules.len() );
//!     Ok(())
//! }
//!
//! export_module!( ModuleDescriptor {
//!     name: "audio",
//!     dependencies: &[ "codecs" ],
//!     types: &[ TypeDescriptor {
//!         methods: &[ MethodDescriptor {
//!             name: "register",
//!             markers: &[ MarkerDescriptor::new( ACTIVATION_MARKER ) ],
//!             entry: EntryPoint::WithModules( register ),
//!         }],
//!         ..TypeDescriptor::new( "audio::Plugin", TypeKind::Class )
//!     }],
//!     resources: &[],
//! });
//! # fn main() { assert_eq!( NATIVE_LINK_MODULE.name, "audio" ); }
//! ```

mod timestamp ;
mod metadata ;
mod module ;
mod descriptor ;
mod loader ;
mod native_loader ;
mod denylist ;
mod registry ;
mod walker ;
mod config ;
mod query ;
mod plugins ;
pub mod native ;
mod bootstrap ;
pub mod utils ;

#[doc( no_inline )]
pub use nonempty_collections::NEVec ;

pub use timestamp::Timestamp ;
pub use metadata::{ TypeInfo, TypeKind, MethodInfo, Marker, ParamKind, MethodBody, ActivationResult, ACTIVATION_MARKER };
pub use module::{ Module, ModuleId, ModuleSource, TypeLoadError };
pub use descriptor::{ ModuleDescriptor, TypeDescriptor, MethodDescriptor, MarkerDescriptor, ResourceDescriptor, EntryPoint, DESCRIPTOR_SYMBOL };
pub use loader::{ ModuleLoader, LoadError, LoadHook, loadable_files };
pub use native_loader::NativeLoader ;
pub use denylist::Denylist ;
pub use registry::{ ModuleRegistry, RegistrationHook };
pub use walker::ModuleWalker ;
pub use config::BootstrapConfig ;
pub use query::{ QueryCache, QueryEngine, CacheHeader, HeaderError, MarkedType, MarkedMethod, CACHE_VERSION };
pub use plugins::{ PluginDiscovery, PluginProber, ProbeError, CandidateCache, CandidateRecord, CandidateCacheError };
pub use native::{ NativeResolver, NativeReport, NativeError };
pub use bootstrap::{ Bootstrap, InitReport, ActivationError };
