//! The registration table a native module library exports.
//!
//! A library built against this crate describes its contents in a `static`
//! [`ModuleDescriptor`] and exports it with [`export_module!`]( crate::export_module ).
//! The [`NativeLoader`]( crate::NativeLoader ) reads the table after opening the library
//! and turns it into [`TypeInfo`] metadata, so the host never inspects machine code.
//!
//! ```
//! use native_link::{ ActivationResult, EntryPoint, MarkerDescriptor, MethodDescriptor, ModuleDescriptor, TypeDescriptor, TypeKind, ACTIVATION_MARKER };
//!
//! fn start() -> ActivationResult { Ok(()) }
//!
//! static DESCRIPTOR: ModuleDescriptor = ModuleDescriptor {
//!     name: "audio",
//!     dependencies: &[ "codecs" ],
//!     types: &[ TypeDescriptor {
//!         methods: &[ MethodDescriptor {
//!             name: "start",
//!             markers: &[ MarkerDescriptor::new( ACTIVATION_MARKER ) ],
//!             entry: EntryPoint::Nullary( start ),
//!         }],
//!         ..TypeDescriptor::new( "audio::Plugin", TypeKind::Class )
//!     }],
//!     resources: &[],
//! };
//! # assert_eq!( DESCRIPTOR.types[0].to_type_info().methods().len(), 1 );
//! ```

use std::collections::HashSet ;
use std::sync::Arc ;

use libloading::Library ;

use crate::{ ActivationResult, Marker, MethodInfo, Module, ModuleSource, ParamKind, TypeInfo, TypeKind, TypeLoadError };



/// Name of the exported symbol holding a library's [`ModuleDescriptor`].
pub const DESCRIPTOR_SYMBOL: &str = "NATIVE_LINK_MODULE" ;

/// Exports a [`ModuleDescriptor`] under [`DESCRIPTOR_SYMBOL`].
///
/// Host and module must be built by the same compiler against the same version of this
/// crate; the table is read in place, without any marshalling.
#[macro_export]
macro_rules! export_module {
    ( $descriptor:expr ) => {
        #[no_mangle]
        pub static NATIVE_LINK_MODULE: $crate::ModuleDescriptor = $descriptor ;
    };
}

/// Static description of a module.
#[derive( Debug )]
pub struct ModuleDescriptor {
    pub name: &'static str,
    pub dependencies: &'static [&'static str],
    pub types: &'static [TypeDescriptor],
    pub resources: &'static [ResourceDescriptor],
}

/// A named blob embedded in a module, e.g. a `native.zip` payload.
#[derive( Debug )]
pub struct ResourceDescriptor {
    pub name: &'static str,
    pub data: &'static [u8],
}

/// Static description of a type.
#[derive( Debug )]
pub struct TypeDescriptor {
    pub name: &'static str,
    pub kind: TypeKind,
    pub interfaces: &'static [&'static str],
    /// Nearest base first.
    pub ancestors: &'static [&'static str],
    pub markers: &'static [MarkerDescriptor],
    pub methods: &'static [MethodDescriptor],
    /// Libraries that must be present next to the module for the type to load.
    pub requires: &'static [&'static str],
}

impl TypeDescriptor {

    /// A type with no interfaces, ancestors, markers, methods or requirements.
    pub const fn new( name: &'static str, kind: TypeKind ) -> Self {
        Self { name, kind, interfaces: &[], ancestors: &[], markers: &[], methods: &[], requires: &[] }
    }

    pub fn to_type_info( &self ) -> TypeInfo {
        let info = TypeInfo::new( self.name, self.kind )
            .with_interfaces( self.interfaces.iter().copied() )
            .with_ancestors( self.ancestors.iter().copied() );
        let info = self.markers.iter().fold( info, | info, marker | info.with_marker( marker.to_marker() ));
        self.methods.iter().fold( info, | info, method | info.with_method( method.to_method_info( self.name )))
    }

}

#[derive( Debug )]
pub struct MarkerDescriptor {
    pub name: &'static str,
    pub args: &'static [&'static str],
}

impl MarkerDescriptor {
    pub const fn new( name: &'static str ) -> Self { Self { name, args: &[] }}
    pub fn to_marker( &self ) -> Marker { Marker::new( self.name ).with_args( self.args.iter().copied() )}
}

#[derive( Debug )]
pub struct MethodDescriptor {
    pub name: &'static str,
    pub markers: &'static [MarkerDescriptor],
    pub entry: EntryPoint,
}

/// How a described method is invoked.
#[derive( Debug, Clone, Copy )]
pub enum EntryPoint {
    /// Takes no arguments.
    Nullary( fn() -> ActivationResult ),
    /// Takes the sequence of all known modules.
    WithModules( fn( &[Module] ) -> ActivationResult ),
    /// Not invocable; only its parameter type names are known.
    Declared( &'static [&'static str] ),
}

impl MethodDescriptor {

    pub fn to_method_info( &self, declaring_type: &str ) -> MethodInfo {
        let method = self.markers.iter().fold(
            MethodInfo::new( declaring_type, self.name ),
            | method, marker | method.with_marker( marker.to_marker() ),
        );
        match self.entry {
            EntryPoint::Nullary( entry ) => method.with_body( move | _ | entry() ),
            EntryPoint::WithModules( entry ) => method
                .with_params([ ParamKind::Modules ])
                .with_body( entry ),
            EntryPoint::Declared( params ) => method
                .with_params( params.iter().map(| name | ParamKind::Other(( *name ).to_owned() ))),
        }
    }

}

/// [`ModuleSource`] reading from a descriptor table.
///
/// Holds the library open for as long as the source lives. Types whose requirements
/// were unavailable when the module was opened fail to load.
pub(crate) struct DescriptorSource {
    descriptor: &'static ModuleDescriptor,
    unavailable: HashSet<&'static str>,
    _library: Option<Arc<Library>>,
}

impl DescriptorSource {

    pub(crate) fn new(
        descriptor: &'static ModuleDescriptor,
        library: Option<Arc<Library>>,
        is_available: impl Fn( &str ) -> bool,
    ) -> Self {
        let unavailable = descriptor.types.iter()
            .flat_map(| ty | ty.requires.iter().copied() )
            .filter(| requirement | !is_available( requirement ))
            .collect();
        Self { descriptor, unavailable, _library: library }
    }

    fn load( &self, ty: &TypeDescriptor ) -> Result<TypeInfo, TypeLoadError> {
        match ty.requires.iter().find(| requirement | self.unavailable.contains( *requirement )) {
            Some( missing ) => Err( TypeLoadError::new( ty.name, format!( "required library '{}' is not available", missing ))),
            None => Ok( ty.to_type_info() ),
        }
    }

}

impl ModuleSource for DescriptorSource {

    fn types( &self ) -> Vec<Result<TypeInfo, TypeLoadError>> {
        self.descriptor.types.iter().map(| ty | self.load( ty )).collect()
    }

    fn resolve_type( &self, full_name: &str ) -> Option<TypeInfo> {
        self.descriptor.types.iter()
            .find(| ty | ty.name == full_name )
            .and_then(| ty | self.load( ty ).ok() )
    }

    fn resource( &self, name: &str ) -> Option<&[u8]> {
        self.descriptor.resources.iter()
            .find(| resource | resource.name == name )
            .map(| resource | resource.data )
    }

}

#[cfg( test )]
mod tests {

    use super::* ;
    use crate::ACTIVATION_MARKER ;

    fn start() -> ActivationResult { Ok(()) }

    static DESCRIPTOR: ModuleDescriptor = ModuleDescriptor {
        name: "demo",
        dependencies: &[],
        types: &[
            TypeDescriptor {
                interfaces: &[ "demo::Service" ],
                methods: &[
                    MethodDescriptor { name: "start", markers: &[ MarkerDescriptor::new( ACTIVATION_MARKER )], entry: EntryPoint::Nullary( start ) },
                    MethodDescriptor { name: "configure", markers: &[], entry: EntryPoint::Declared( &[ "u32" ]) },
                ],
                ..TypeDescriptor::new( "demo::Impl", TypeKind::Class )
            },
            TypeDescriptor {
                requires: &[ "absent_native" ],
                ..TypeDescriptor::new( "demo::NeedsNative", TypeKind::Struct )
            },
        ],
        resources: &[ ResourceDescriptor { name: "native.zip", data: b"payload" }],
    };

    #[test]
    fn descriptor_types_become_metadata() {
        let info = DESCRIPTOR.types[0].to_type_info();
        assert!( info.implements( "demo::Service" ));
        assert_eq!( info.methods().len(), 2 );
        assert!( info.methods()[0].markers_named( ACTIVATION_MARKER ).is_some() );
        assert!( info.methods()[0].params().is_empty() );
        assert_eq!( info.methods()[1].params(), &[ ParamKind::Other( "u32".to_owned() )]);
        assert!( info.methods()[1].body().is_none() );
    }

    #[test]
    fn types_with_unavailable_requirements_fail_to_load() {
        let source = DescriptorSource::new( &DESCRIPTOR, None, | _ | false );
        let ( loaded, failed ): ( Vec<_>, Vec<_> ) = source.types().into_iter().partition( Result::is_ok );
        assert_eq!( loaded.len(), 1 );
        assert_eq!( failed.len(), 1 );
        assert!( source.resolve_type( "demo::NeedsNative" ).is_none() );
        assert!( source.resolve_type( "demo::Impl" ).is_some() );
        assert_eq!( source.resource( "native.zip" ), Some( &b"payload"[..] ));
    }

}
