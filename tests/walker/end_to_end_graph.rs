use native_link::{ Denylist, ModuleLoader, ModuleRegistry, ModuleWalker };

use crate::fixture_modules::{ module_names, FixtureLoader, FixtureModule, Workspace };

#[test]
fn walker_end_to_end_graph_skips_denied_branch() {

    let workspace = Workspace::new();
    let loader = FixtureLoader::new( workspace.modules() );
    loader.install( FixtureModule::new( "a" ).depends_on(&[ "gtk_bridge", "c" ]));
    loader.install( FixtureModule::new( "gtk_bridge" ).depends_on(&[ "d" ]));
    loader.install( FixtureModule::new( "c" ).depends_on(&[ "a" ]));
    loader.install( FixtureModule::new( "d" ));

    let registry = ModuleRegistry::new();
    let denylist = Denylist::new();
    let walker = ModuleWalker::new( &loader, &registry, &denylist );
    let entry = loader.load( "a" ).unwrap();
    walker.enumerate_from( "a", Some( entry ));

    assert_eq!( module_names( &registry.modules() ), vec![ "a", "c" ]);
    assert_eq!( loader.attempts( "gtk_bridge" ), 0 );
    assert_eq!( loader.attempts( "d" ), 0 );
    assert_eq!( loader.attempts( "c" ), 1 );
    assert!( registry.is_resolved( "a" ));
    assert!( registry.is_resolved( "c" ));
    assert!( !registry.is_resolved( "gtk_bridge" ));

}
