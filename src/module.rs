//! The [`Module`] handle.
//!
//! A module is a loadable unit of compiled code: a file on disk, the types it contains
//! and the names of the modules it depends on. Handles are cheap to clone; two handles
//! with the same [`ModuleId`] denote the same module.

use std::fmt::{ Debug, Display, Formatter };
use std::hash::{ Hash, Hasher };
use std::path::{ Path, PathBuf };
use std::sync::Arc ;

use itertools::Itertools ;
use thiserror::Error ;

use crate::{ Timestamp, TypeInfo };
use crate::utils::PartialSuccess ;



/// A type that is declared by a module but cannot be materialised.
#[derive( Error, Debug, Clone, PartialEq, Eq )]
#[error( "Failed to load type '{type_name}': {reason}" )]
pub struct TypeLoadError {
    type_name: String,
    reason: String,
}

impl TypeLoadError {
    pub fn new( type_name: impl Into<String>, reason: impl Into<String> ) -> Self {
        Self { type_name: type_name.into(), reason: reason.into() }
    }
    #[inline] pub fn type_name( &self ) -> &str { &self.type_name }
    #[inline] pub fn reason( &self ) -> &str { &self.reason }
}

/// Supplies the contents of a module.
///
/// Enumerating every type is the expensive operation that the query cache avoids;
/// [`resolve_type`]( ModuleSource::resolve_type ) must answer for a single name without
/// enumerating.
pub trait ModuleSource: Send + Sync {

    /// Enumerates every type in the module. Individual types may fail to load.
    fn types( &self ) -> Vec<Result<TypeInfo, TypeLoadError>> ;

    /// Looks up a single type by its full name.
    fn resolve_type( &self, full_name: &str ) -> Option<TypeInfo> ;

    /// Returns the bytes of an embedded resource.
    fn resource( &self, name: &str ) -> Option<&[u8]> {
        let _ = name ;
        None
    }

}

/// Identity of a module: its declared name and canonical location.
#[derive( Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord )]
pub struct ModuleId {
    name: String,
    location: PathBuf,
}

impl ModuleId {
    #[inline] pub fn name( &self ) -> &str { &self.name }
    #[inline] pub fn location( &self ) -> &Path { &self.location }
}

impl Display for ModuleId {
    fn fmt( &self, f: &mut Formatter<'_> ) -> std::fmt::Result {
        write!( f, "{} ({})", self.name, self.location.display() )
    }
}

struct ModuleInner {
    id: ModuleId,
    dependencies: Vec<String>,
    source: Box<dyn ModuleSource>,
}

/// A loaded module. Immutable and never unloaded.
#[derive( Clone )]
pub struct Module( Arc<ModuleInner> );

impl Module {

    pub fn new(
        name: impl Into<String>,
        location: impl Into<PathBuf>,
        dependencies: impl IntoIterator<Item = impl Into<String>>,
        source: impl ModuleSource + 'static,
    ) -> Self {
        Self( Arc::new( ModuleInner {
            id: ModuleId { name: name.into(), location: location.into() },
            dependencies: dependencies.into_iter().map( Into::into ).collect(),
            source: Box::new( source ),
        }))
    }

    #[inline] pub fn id( &self ) -> &ModuleId { &self.0.id }
    #[inline] pub fn name( &self ) -> &str { &self.0.id.name }
    #[inline] pub fn location( &self ) -> &Path { &self.0.id.location }
    #[inline] pub fn dependencies( &self ) -> &[String] { &self.0.dependencies }

    /// File name of the module's location, falling back to the module name.
    pub fn file_name( &self ) -> String {
        self.location().file_name()
            .map_or_else(|| self.name().to_owned(), | name | name.to_string_lossy().into_owned() )
    }

    /// Enumerates the module's types, separating the ones that failed to load.
    pub fn types( &self ) -> PartialSuccess<Vec<TypeInfo>, TypeLoadError> {
        self.0.source.types().into_iter().partition_result()
    }

    #[inline] pub fn resolve_type( &self, full_name: &str ) -> Option<TypeInfo> { self.0.source.resolve_type( full_name ) }
    #[inline] pub fn resource( &self, name: &str ) -> Option<&[u8]> { self.0.source.resource( name ) }

    /// Current last-write time of the module file.
    ///
    /// # Errors
    /// Fails when the file cannot be inspected.
    pub fn last_write( &self ) -> std::io::Result<Timestamp> { Timestamp::of_file( self.location() ) }

}

impl PartialEq for Module {
    fn eq( &self, other: &Self ) -> bool { self.id() == other.id() }
}

impl Eq for Module {}

impl Hash for Module {
    fn hash<H: Hasher>( &self, state: &mut H ) { self.id().hash( state ); }
}

impl Debug for Module {
    fn fmt( &self, f: &mut Formatter<'_> ) -> std::fmt::Result {
        f.debug_struct( "Module" )
            .field( "name", &self.name() )
            .field( "location", &self.location() )
            .field( "dependencies", &self.dependencies() )
            .finish_non_exhaustive()
    }
}

impl Display for Module {
    fn fmt( &self, f: &mut Formatter<'_> ) -> std::fmt::Result { Display::fmt( self.id(), f ) }
}
