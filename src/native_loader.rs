//! [`ModuleLoader`] backed by the platform dynamic linker.

use std::ffi::OsString ;
use std::path::{ Path, PathBuf };
use std::sync::Arc ;

use indexmap::IndexMap ;
use indexmap::map::Entry ;
use libloading::Library ;
use parking_lot::RwLock ;
use tracing::debug ;

use crate::{ LoadError, LoadHook, Module, ModuleDescriptor, ModuleLoader, DESCRIPTOR_SYMBOL };
use crate::descriptor::DescriptorSource ;



/// Opens module libraries from a list of search directories.
///
/// A library is a module when it exports a [`ModuleDescriptor`] through
/// [`export_module!`]( crate::export_module ). Opened libraries are never closed.
pub struct NativeLoader {
    search_dirs: Vec<PathBuf>,
    modules: RwLock<IndexMap<PathBuf, Module>>,
    entry: RwLock<Option<Module>>,
    hooks: RwLock<Vec<LoadHook>>,
}

impl NativeLoader {

    pub fn new( search_dirs: impl IntoIterator<Item = impl Into<PathBuf>> ) -> Self {
        Self {
            search_dirs: search_dirs.into_iter().map( Into::into ).collect(),
            modules: RwLock::new( IndexMap::new() ),
            entry: RwLock::new( None ),
            hooks: RwLock::new( Vec::new() ),
        }
    }

    #[inline] pub fn search_dirs( &self ) -> &[PathBuf] { &self.search_dirs }

    /// Finds the library file for a logical module name.
    ///
    /// Tries the platform file name (`libname.so`, `name.dll`, `libname.dylib`) and then
    /// the bare name in every search directory, in order.
    pub fn locate( &self, name: &str ) -> Option<PathBuf> {
        locate_in( &self.search_dirs, name )
    }

    /// Adopts a descriptor that is linked into the host itself, e.g. the host's own table,
    /// and makes it the loader's entry module.
    pub fn adopt_entry( &self, descriptor: &'static ModuleDescriptor, location: impl Into<PathBuf> ) -> Module {
        let search_dirs = self.search_dirs.clone();
        let source = DescriptorSource::new( descriptor, None, | name | locate_in( &search_dirs, name ).is_some() );
        let module = Module::new( descriptor.name, location, descriptor.dependencies.iter().copied(), source );
        *self.entry.write() = Some( module.clone() );
        self.publish( module.location().to_path_buf(), module )
    }

    fn open( &self, path: &Path ) -> Result<Module, LoadError> {
        // SAFETY: running a library's initialisers is inherent to loading plugins; the
        // library is never unloaded, so nothing it registers outlives it.
        let library = unsafe { Library::new( path )}
            .map_err(| err | LoadError::Library( path.to_path_buf(), err ))?;

        // SAFETY: `NATIVE_LINK_MODULE` is only ever emitted by `export_module!`, which
        // declares it as a `ModuleDescriptor` static. The library is kept open for the
        // lifetime of the returned module, so the reference stays valid.
        let descriptor: &'static ModuleDescriptor = unsafe {
            let symbol = library.get::<*const ModuleDescriptor>( DESCRIPTOR_SYMBOL.as_bytes() )
                .map_err(|_| LoadError::MissingDescriptor( path.to_path_buf() ))?;
            let pointer: *const ModuleDescriptor = *symbol ;
            pointer.as_ref().ok_or_else(|| LoadError::MissingDescriptor( path.to_path_buf() ))?
        };

        let search_dirs = sibling_first( path, &self.search_dirs );
        let source = DescriptorSource::new( descriptor, Some( Arc::new( library )), | name | locate_in( &search_dirs, name ).is_some() );
        Ok( Module::new( descriptor.name, path, descriptor.dependencies.iter().copied(), source ))
    }

    /// Stores a freshly opened module unless another thread won the race, then fires hooks
    /// without holding any lock.
    fn publish( &self, path: PathBuf, module: Module ) -> Module {
        let published = match self.modules.write().entry( path ) {
            Entry::Occupied( entry ) => return entry.get().clone(),
            Entry::Vacant( entry ) => entry.insert( module ).clone(),
        };
        let hooks = self.hooks.read().clone();
        hooks.iter().for_each(| hook | hook( &published ));
        published
    }

}

impl ModuleLoader for NativeLoader {

    fn load( &self, name: &str ) -> Result<Module, LoadError> {
        let path = self.locate( name ).ok_or_else(|| LoadError::NotFound( name.to_owned() ))?;
        self.load_file( &path )
    }

    fn load_file( &self, path: &Path ) -> Result<Module, LoadError> {
        let path = std::fs::canonicalize( path )?;
        if let Some( module ) = self.modules.read().get( &path ) { return Ok( module.clone() ) }
        debug!( "Opening module library {}", path.display() );
        let module = self.open( &path )?;
        Ok( self.publish( path, module ))
    }

    fn entry_module( &self ) -> Option<Module> { self.entry.read().clone() }

    fn loaded( &self ) -> Vec<Module> { self.modules.read().values().cloned().collect() }

    fn subscribe( &self, hook: LoadHook ) { self.hooks.write().push( hook ); }

}

fn locate_in( search_dirs: &[PathBuf], name: &str ) -> Option<PathBuf> {
    let candidates = [ libloading::library_filename( name ), OsString::from( name )];
    search_dirs.iter()
        .flat_map(| dir | candidates.iter().map( move | file | dir.join( file )))
        .find(| path | path.is_file() )
}

fn sibling_first( path: &Path, search_dirs: &[PathBuf] ) -> Vec<PathBuf> {
    path.parent()
        .map( Path::to_path_buf )
        .into_iter()
        .chain( search_dirs.iter().cloned() )
        .collect()
}

#[cfg( test )]
mod tests {

    use super::* ;

    #[test]
    fn locate_prefers_the_platform_file_name() {
        let directory = tempfile::tempdir().unwrap();
        let platform = directory.path().join( libloading::library_filename( "codec" ));
        std::fs::write( &platform, b"" ).unwrap();
        std::fs::write( directory.path().join( "codec" ), b"" ).unwrap();

        let loader = NativeLoader::new([ directory.path() ]);
        assert_eq!( loader.locate( "codec" ), Some( platform ));
        assert_eq!( loader.locate( "missing" ), None );
    }

    #[test]
    fn missing_modules_are_reported_by_name() {
        let directory = tempfile::tempdir().unwrap();
        let loader = NativeLoader::new([ directory.path() ]);
        assert!( matches!( loader.load( "ghost" ), Err( LoadError::NotFound( name )) if name == "ghost" ));
    }

    #[test]
    fn files_that_are_not_libraries_fail_to_open() {
        let directory = tempfile::tempdir().unwrap();
        let bogus = directory.path().join( libloading::library_filename( "bogus" ));
        std::fs::write( &bogus, b"definitely not an object file" ).unwrap();

        let loader = NativeLoader::new([ directory.path() ]);
        assert!( matches!( loader.load( "bogus" ), Err( LoadError::Library( .. ))));
        assert!( loader.loaded().is_empty() );
    }

}
