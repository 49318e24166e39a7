use native_link::{ Denylist, ModuleRegistry, ModuleWalker };

use crate::fixture_modules::{ FixtureLoader, FixtureModule, Workspace };

const DEPTH: usize = 5_000 ;

#[test]
fn walker_deep_chain_does_not_exhaust_the_stack() {

    let workspace = Workspace::new();
    let loader = FixtureLoader::new( workspace.modules() );
    ( 0..DEPTH ).for_each(| index | {
        let name = format!( "m{}", index );
        let next = format!( "m{}", index + 1 );
        loader.install( FixtureModule::new( &name ).depends_on(&[ next.as_str() ]));
    });

    let registry = ModuleRegistry::new();
    let denylist = Denylist::new();
    ModuleWalker::new( &loader, &registry, &denylist ).enumerate_from( "m0", None );

    assert_eq!( registry.len(), DEPTH );
    assert!( denylist.is_failed( &format!( "m{}", DEPTH )));
    assert_eq!( registry.modules().first().map(| module | module.name().to_owned() ), Some( "m0".to_owned() ));

}
