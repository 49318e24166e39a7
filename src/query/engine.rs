//! The four query shapes, answered through the [`QueryCache`].

use std::sync::Arc ;

use itertools::Itertools ;
use nonempty_collections::NEVec ;

use crate::{ Marker, MethodInfo, Module, ModuleRegistry, TypeInfo };
use super::QueryCache ;



/// A type paired with every instance of the queried marker it carries.
pub type MarkedType = ( TypeInfo, NEVec<Marker> );

/// A method paired with every instance of the queried marker it carries.
pub type MarkedMethod = ( MethodInfo, NEVec<Marker> );

/// Runs type queries against single modules or every module in a registry.
///
/// Discriminators are prefixed with the query kind, so an interface query and a base type
/// query for the same name never share a cache file.
#[derive( Debug, Clone )]
pub struct QueryEngine {
    cache: QueryCache,
    registry: Arc<ModuleRegistry>,
}

impl QueryEngine {

    pub fn new( cache: QueryCache, registry: Arc<ModuleRegistry> ) -> Self { Self { cache, registry }}

    #[inline] pub fn cache( &self ) -> &QueryCache { &self.cache }
    #[inline] pub fn registry( &self ) -> &ModuleRegistry { &self.registry }

    /// Classes and structs of `module` implementing `interface`.
    pub fn implementing( &self, module: &Module, interface: &str ) -> Vec<TypeInfo> {
        self.cache.query(
            module,
            &format!( "implements:{}", interface ),
            | types | types.iter()
                .filter(| ty | ty.kind().is_concrete_or_value() && ty.implements( interface ))
                .cloned()
                .collect(),
            | found | found.iter().map(| ty | ty.full_name().to_owned() ).collect(),
            | names | resolve_all( module, names ),
        )
    }

    /// Types of `module` with `base` in their ancestor chain.
    pub fn inheriting( &self, module: &Module, base: &str ) -> Vec<TypeInfo> {
        self.cache.query(
            module,
            &format!( "inherits:{}", base ),
            | types | types.iter()
                .filter(| ty | ty.inherits( base ))
                .cloned()
                .collect(),
            | found | found.iter().map(| ty | ty.full_name().to_owned() ).collect(),
            | names | resolve_all( module, names ),
        )
    }

    /// Types of `module` carrying at least one `marker`.
    pub fn types_with_marker( &self, module: &Module, marker: &str ) -> Vec<MarkedType> {
        self.cache.query(
            module,
            &format!( "type-marker:{}", marker ),
            | types | types.iter()
                .filter_map(| ty | ty.markers_named( marker ).map(| markers | ( ty.clone(), markers )))
                .collect(),
            | found | found.iter().map(|( ty, _ )| ty.full_name().to_owned() ).collect(),
            | names | names.iter()
                .map(| name | {
                    let ty = module.resolve_type( name )?;
                    let markers = ty.markers_named( marker )?;
                    Some(( ty, markers ))
                })
                .collect(),
        )
    }

    /// Methods of `module` carrying at least one `marker`.
    ///
    /// The cache stores the declaring types only; a hit rescans just those types.
    pub fn methods_with_marker( &self, module: &Module, marker: &str ) -> Vec<MarkedMethod> {
        self.cache.query(
            module,
            &format!( "method-marker:{}", marker ),
            | types | types.iter()
                .flat_map(| ty | marked_methods( ty, marker ))
                .collect(),
            | found | found.iter()
                .map(|( method, _ )| method.declaring_type().to_owned() )
                .unique()
                .collect(),
            | names | names.iter()
                .map(| name | module.resolve_type( name ).map(| ty | marked_methods( &ty, marker )))
                .collect::<Option<Vec<_>>>()
                .map(| methods | methods.into_iter().flatten().collect() ),
        )
    }

    pub fn all_implementing( &self, interface: &str ) -> Vec<TypeInfo> {
        self.registry.modules().iter().flat_map(| module | self.implementing( module, interface )).collect()
    }

    pub fn all_inheriting( &self, base: &str ) -> Vec<TypeInfo> {
        self.registry.modules().iter().flat_map(| module | self.inheriting( module, base )).collect()
    }

    pub fn all_types_with_marker( &self, marker: &str ) -> Vec<MarkedType> {
        self.registry.modules().iter().flat_map(| module | self.types_with_marker( module, marker )).collect()
    }

    pub fn all_methods_with_marker( &self, marker: &str ) -> Vec<MarkedMethod> {
        self.registry.modules().iter().flat_map(| module | self.methods_with_marker( module, marker )).collect()
    }

}

fn resolve_all( module: &Module, names: &[String] ) -> Option<Vec<TypeInfo>> {
    names.iter().map(| name | module.resolve_type( name )).collect()
}

fn marked_methods( ty: &TypeInfo, marker: &str ) -> Vec<MarkedMethod> {
    ty.methods().iter()
        .filter_map(| method | method.markers_named( marker ).map(| markers | ( method.clone(), markers )))
        .collect()
}
