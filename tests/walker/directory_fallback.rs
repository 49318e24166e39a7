use native_link::{ Denylist, ModuleRegistry, ModuleWalker };

use crate::fixture_modules::{ module_names, FixtureLoader, FixtureModule, Workspace, EXTENSION };

#[test]
fn walker_directory_fallback_enumerates_every_module_file() {

    let workspace = Workspace::new();
    let loader = FixtureLoader::new( workspace.modules() );
    loader.install( FixtureModule::new( "x" ).depends_on(&[ "y" ]));
    loader.install( FixtureModule::new( "y" ));
    loader.install( FixtureModule::new( "z" ));
    std::fs::write( workspace.modules().join( "junk.fixture" ), "not a module" ).unwrap();
    std::fs::write( workspace.modules().join( "notes.txt" ), "x" ).unwrap();

    let registry = ModuleRegistry::new();
    let denylist = Denylist::new();
    let declared = ModuleWalker::new( &loader, &registry, &denylist )
        .enumerate_directory( &workspace.modules(), &[ EXTENSION.to_owned() ]);

    assert_eq!( declared, 3 );
    let mut names = module_names( &registry.modules() );
    names.sort();
    assert_eq!( names, vec![ "x", "y", "z" ]);

}

#[test]
fn walker_directory_fallback_tolerates_missing_directory() {

    let workspace = Workspace::new();
    let loader = FixtureLoader::new( workspace.modules() );
    let registry = ModuleRegistry::new();
    let denylist = Denylist::new();

    let declared = ModuleWalker::new( &loader, &registry, &denylist )
        .enumerate_directory( &workspace.root().join( "absent" ), &[ EXTENSION.to_owned() ]);

    assert_eq!( declared, 0 );
    assert!( registry.is_empty() );

}
