//! Loading modules by name or by file.

use std::path::{ Path, PathBuf };
use std::sync::Arc ;

use thiserror::Error ;

use crate::Module ;



/// Callback fired once for every module a loader opens for the first time.
pub type LoadHook = Arc<dyn Fn( &Module ) + Send + Sync> ;

/// Errors that can occur while loading a module.
#[derive( Error, Debug )]
pub enum LoadError {
    /// No file for the requested module name exists in the search directories.
    #[error( "Module not found: {0}" )] NotFound( String ),
    /// The file exists but is not a module this loader understands.
    #[error( "Not a module: {0}" )] NotAModule( PathBuf ),
    /// The dynamic linker rejected the library.
    #[error( "Failed to open library '{0}': {1}" )] Library( PathBuf, libloading::Error ),
    /// The library opened but does not export a module descriptor.
    #[error( "Library '{0}' does not export a module descriptor" )] MissingDescriptor( PathBuf ),
    #[error( "IO error: {0}" )] Io( #[from] std::io::Error ),
}

/// Opens modules and keeps every opened module alive for the process lifetime.
pub trait ModuleLoader: Send + Sync {

    /// Loads a module by its logical name.
    ///
    /// # Errors
    /// Fails when no module with that name can be found or opened.
    fn load( &self, name: &str ) -> Result<Module, LoadError> ;

    /// Loads the module stored in a specific file.
    ///
    /// # Errors
    /// Fails when the file cannot be opened as a module.
    fn load_file( &self, path: &Path ) -> Result<Module, LoadError> ;

    /// The logical name declared by the module stored in a file.
    ///
    /// # Errors
    /// Fails when the file cannot be opened as a module.
    fn declared_name( &self, path: &Path ) -> Result<String, LoadError> {
        self.load_file( path ).map(| module | module.name().to_owned() )
    }

    /// The module the host process was started from, if the loader knows it.
    fn entry_module( &self ) -> Option<Module> { None }

    /// Every module opened so far, in load order.
    fn loaded( &self ) -> Vec<Module> ;

    /// Registers a hook fired for every module opened after this call.
    fn subscribe( &self, hook: LoadHook );

}

/// Lists the files in `directory` whose extension is one of `extensions`, sorted by path.
/// Extensions are compared case-insensitively and given without the leading dot.
///
/// # Errors
/// Fails when the directory cannot be read.
pub fn loadable_files( directory: &Path, extensions: &[String] ) -> std::io::Result<Vec<PathBuf>> {
    let mut files = std::fs::read_dir( directory )?
        .filter_map( Result::ok )
        .map(| entry | entry.path() )
        .filter(| path | path.is_file() )
        .filter(| path | has_extension( path, extensions ))
        .collect::<Vec<_>>();
    files.sort();
    Ok( files )
}

fn has_extension( path: &Path, extensions: &[String] ) -> bool {
    path.extension()
        .and_then(| extension | extension.to_str() )
        .is_some_and(| extension | extensions.iter().any(| known | known.eq_ignore_ascii_case( extension )))
}

#[cfg( test )]
mod tests {

    use super::* ;

    #[test]
    fn loadable_files_filters_and_sorts() {
        let directory = tempfile::tempdir().unwrap();
        [ "b.so", "a.SO", "c.txt", "d" ].iter().for_each(| name | std::fs::write( directory.path().join( name ), b"" ).unwrap());
        std::fs::create_dir( directory.path().join( "e.so" )).unwrap();

        let files = loadable_files( directory.path(), &[ "so".to_owned() ]).unwrap();
        let names = files.iter().map(| path | path.file_name().unwrap().to_str().unwrap() ).collect::<Vec<_>>();
        assert_eq!( names, vec![ "a.SO", "b.so" ]);
    }

}
