use native_link::{ Denylist, ModuleRegistry, ModuleWalker };

use crate::fixture_modules::{ FixtureLoader, FixtureModule, Workspace };

#[test]
fn walker_second_walk_performs_no_load_attempts() {

    let workspace = Workspace::new();
    let loader = FixtureLoader::new( workspace.modules() );
    loader.install( FixtureModule::new( "app" ).depends_on(&[ "core_lib", "missing" ]));
    loader.install( FixtureModule::new( "core_lib" ));

    let registry = ModuleRegistry::new();
    let denylist = Denylist::new();
    let walker = ModuleWalker::new( &loader, &registry, &denylist );

    walker.enumerate_from( "app", None );
    assert_eq!( loader.total_attempts(), 3 );
    assert_eq!( registry.len(), 2 );
    assert!( denylist.is_failed( "missing" ));

    walker.enumerate_from( "app", None );
    walker.enumerate_from( "core_lib", None );
    walker.enumerate_from( "missing", None );
    walker.enumerate_from( "", None );
    assert_eq!( loader.total_attempts(), 3 );
    assert_eq!( registry.len(), 2 );

}
