//! Type metadata carried by a module.
//!
//! A module does not expose its contents through runtime reflection. Instead it
//! describes them explicitly: every [`TypeInfo`] lists the interfaces it implements, its
//! ancestor chain, the [`Marker`]s attached to it and its methods. Methods may carry an
//! invocable body, which is how activation entry points are called.

use std::fmt::{ Debug, Display, Formatter };
use std::sync::Arc ;

use nonempty_collections::NEVec ;

use crate::Module ;



/// Name of the marker that designates a method as a plugin activation entry point.
pub const ACTIVATION_MARKER: &str = "native_link::on_init" ;

/// Result returned by an invocable method body.
pub type ActivationResult = Result<(), Box<dyn std::error::Error + Send + Sync>> ;

/// An invocable method body. Receives the known-module sequence when the method declares
/// a [`ParamKind::Modules`] parameter and an empty slice otherwise.
pub type MethodBody = Arc<dyn Fn( &[Module] ) -> ActivationResult + Send + Sync> ;

/// The kind of a type, which decides whether it qualifies for interface queries.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash )]
pub enum TypeKind {
    Class,
    AbstractClass,
    Struct,
    Interface,
}

impl TypeKind {
    /// Concrete classes and value types; the only kinds returned by interface queries.
    #[inline] pub fn is_concrete_or_value( self ) -> bool { matches!( self, Self::Class | Self::Struct ) }
}

/// A named piece of metadata attached to a type or method, optionally with a payload.
#[derive( Debug, Clone, PartialEq, Eq, Hash )]
pub struct Marker {
    name: String,
    args: Vec<String>,
}

impl Marker {

    pub fn new( name: impl Into<String> ) -> Self {
        Self { name: name.into(), args: Vec::new() }
    }

    pub fn with_args( mut self, args: impl IntoIterator<Item = impl Into<String>> ) -> Self {
        self.args = args.into_iter().map( Into::into ).collect();
        self
    }

    #[inline] pub fn name( &self ) -> &str { &self.name }
    #[inline] pub fn args( &self ) -> &[String] { &self.args }

}

/// The shape of a method parameter.
#[derive( Debug, Clone, PartialEq, Eq, Hash )]
pub enum ParamKind {
    /// The sequence of all known modules.
    Modules,
    /// Any other parameter, described by its type name.
    Other( String ),
}

impl Display for ParamKind {
    fn fmt( &self, f: &mut Formatter<'_> ) -> std::fmt::Result {
        match self {
            Self::Modules => write!( f, "&[Module]" ),
            Self::Other( name ) => write!( f, "{}", name ),
        }
    }
}

/// A method of a type.
#[derive( Clone )]
pub struct MethodInfo {
    name: String,
    declaring_type: String,
    params: Vec<ParamKind>,
    markers: Vec<Marker>,
    body: Option<MethodBody>,
}

impl MethodInfo {

    pub fn new( declaring_type: impl Into<String>, name: impl Into<String> ) -> Self {
        Self {
            name: name.into(),
            declaring_type: declaring_type.into(),
            params: Vec::new(),
            markers: Vec::new(),
            body: None,
        }
    }

    pub fn with_params( mut self, params: impl IntoIterator<Item = ParamKind> ) -> Self {
        self.params = params.into_iter().collect();
        self
    }

    pub fn with_marker( mut self, marker: Marker ) -> Self {
        self.markers.push( marker );
        self
    }

    pub fn with_body( mut self, body: impl Fn( &[Module] ) -> ActivationResult + Send + Sync + 'static ) -> Self {
        self.body = Some( Arc::new( body ));
        self
    }

    #[inline] pub fn name( &self ) -> &str { &self.name }
    #[inline] pub fn declaring_type( &self ) -> &str { &self.declaring_type }
    #[inline] pub fn params( &self ) -> &[ParamKind] { &self.params }
    #[inline] pub fn markers( &self ) -> &[Marker] { &self.markers }
    #[inline] pub fn body( &self ) -> Option<&MethodBody> { self.body.as_ref() }

    /// `declaring_type::name`
    pub fn qualified_name( &self ) -> String { format!( "{}::{}", self.declaring_type, self.name ) }

    /// All instances of the named marker, or `None` when the method carries none.
    pub fn markers_named( &self, name: &str ) -> Option<NEVec<Marker>> { markers_named( &self.markers, name ) }

}

impl Debug for MethodInfo {
    fn fmt( &self, f: &mut Formatter<'_> ) -> std::fmt::Result {
        f.debug_struct( "MethodInfo" )
            .field( "name", &self.name )
            .field( "declaring_type", &self.declaring_type )
            .field( "params", &self.params )
            .field( "markers", &self.markers )
            .field( "body", &self.body.as_ref().map(| _ | "<fn>" ))
            .finish()
    }
}

/// Metadata of a single type contained in a module.
#[derive( Debug, Clone )]
pub struct TypeInfo {
    full_name: String,
    kind: TypeKind,
    interfaces: Vec<String>,
    ancestors: Vec<String>,
    markers: Vec<Marker>,
    methods: Vec<MethodInfo>,
}

impl TypeInfo {

    pub fn new( full_name: impl Into<String>, kind: TypeKind ) -> Self {
        Self {
            full_name: full_name.into(),
            kind,
            interfaces: Vec::new(),
            ancestors: Vec::new(),
            markers: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn with_interfaces( mut self, interfaces: impl IntoIterator<Item = impl Into<String>> ) -> Self {
        self.interfaces = interfaces.into_iter().map( Into::into ).collect();
        self
    }

    /// Sets the ancestor chain, nearest base first.
    pub fn with_ancestors( mut self, ancestors: impl IntoIterator<Item = impl Into<String>> ) -> Self {
        self.ancestors = ancestors.into_iter().map( Into::into ).collect();
        self
    }

    pub fn with_marker( mut self, marker: Marker ) -> Self {
        self.markers.push( marker );
        self
    }

    /// Adds a method, taking over its declaring type.
    pub fn with_method( mut self, mut method: MethodInfo ) -> Self {
        method.declaring_type.clone_from( &self.full_name );
        self.methods.push( method );
        self
    }

    #[inline] pub fn full_name( &self ) -> &str { &self.full_name }
    #[inline] pub fn kind( &self ) -> TypeKind { self.kind }
    #[inline] pub fn interfaces( &self ) -> &[String] { &self.interfaces }
    #[inline] pub fn ancestors( &self ) -> &[String] { &self.ancestors }
    #[inline] pub fn markers( &self ) -> &[Marker] { &self.markers }
    #[inline] pub fn methods( &self ) -> &[MethodInfo] { &self.methods }

    pub fn implements( &self, interface: &str ) -> bool { self.interfaces.iter().any(| name | name == interface ) }
    pub fn inherits( &self, base: &str ) -> bool { self.ancestors.iter().any(| name | name == base ) }

    /// All instances of the named marker, or `None` when the type carries none.
    pub fn markers_named( &self, name: &str ) -> Option<NEVec<Marker>> { markers_named( &self.markers, name ) }

}

fn markers_named( markers: &[Marker], name: &str ) -> Option<NEVec<Marker>> {
    let mut matching = markers.iter().filter(| marker | marker.name() == name ).cloned();
    let mut instances = NEVec::new( matching.next()? );
    matching.for_each(| marker | instances.push( marker ));
    Some( instances )
}

#[cfg( test )]
mod tests {

    use super::* ;

    #[test]
    fn markers_named_collects_every_instance() {
        let ty = TypeInfo::new( "demo::Widget", TypeKind::Class )
            .with_marker( Marker::new( "tag" ).with_args([ "a" ]))
            .with_marker( Marker::new( "other" ))
            .with_marker( Marker::new( "tag" ).with_args([ "b" ]));

        let instances = ty.markers_named( "tag" ).expect( "tag is present" );
        assert_eq!( instances.into_iter().map(| marker | marker.args().to_vec() ).collect::<Vec<_>>(), vec![ vec![ "a".to_owned() ], vec![ "b".to_owned() ]]);
        assert!( ty.markers_named( "missing" ).is_none() );
    }

    #[test]
    fn methods_belong_to_the_type_holding_them() {
        let ty = TypeInfo::new( "demo::Host", TypeKind::Class )
            .with_method( MethodInfo::new( "demo::Helper", "start" ));
        assert_eq!( ty.methods()[ 0 ].declaring_type(), "demo::Host" );
        assert_eq!( ty.methods()[ 0 ].qualified_name(), "demo::Host::start" );
    }

    #[test]
    fn only_classes_and_structs_are_concrete_or_value() {
        assert!( TypeKind::Class.is_concrete_or_value() );
        assert!( TypeKind::Struct.is_concrete_or_value() );
        assert!( !TypeKind::AbstractClass.is_concrete_or_value() );
        assert!( !TypeKind::Interface.is_concrete_or_value() );
    }

}
