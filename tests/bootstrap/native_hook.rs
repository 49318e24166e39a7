use std::sync::Arc ;

use native_link::native::{ Arch, LibraryIndex, Platform, TargetOs, NATIVE_ARCHIVE };
use native_link::{ Bootstrap, ModuleLoader, NativeResolver };

use crate::fixture_modules::{ archive_time, zip_archive, FixtureLoader, FixtureModule, Workspace };

fn payload( library: &str ) -> Vec<u8> {
    let entry = format!( "linux/AMD64/{}", library );
    zip_archive( &[( entry.as_str(), library.as_bytes() )], archive_time( 2020 ))
}

#[test]
fn native_hook_unpacks_modules_registered_later() {

    let workspace = Workspace::new();
    let base = workspace.root().join( "bin" );
    let loader = Arc::new( FixtureLoader::new( workspace.modules() ).with_entry( "app" ));
    loader.install( FixtureModule::new( "app" ).with_resource( NATIVE_ARCHIVE, payload( "libapp.so" )));
    loader.install( FixtureModule::new( "late" ).with_resource( NATIVE_ARCHIVE, payload( "liblate.so" )));

    let resolver = NativeResolver::new( &base )
        .with_platform( Platform::new( TargetOs::Linux, Arch::Amd64 ))
        .with_library_index( Arc::new( LibraryIndex::from_listing( "", Arch::Amd64 )));
    let bootstrap = Bootstrap::new( workspace.config(), loader.clone() ).with_resolver( resolver );

    assert_eq!( bootstrap.enumerate_entry(), 1 );
    assert!( !base.join( "libapp.so" ).exists() );

    bootstrap.unpack_native_dependencies();
    bootstrap.unpack_native_dependencies();
    assert_eq!( std::fs::read( base.join( "libapp.so" )).unwrap(), "libapp.so".as_bytes() );
    assert!( !base.join( "liblate.so" ).exists() );

    loader.load( "late" ).unwrap();
    assert_eq!( bootstrap.registry().len(), 2 );
    assert_eq!( std::fs::read( base.join( "liblate.so" )).unwrap(), "liblate.so".as_bytes() );

}

#[test]
fn native_hook_covers_modules_registered_while_unpacking() {

    let workspace = Workspace::new();
    let base = workspace.root().join( "bin" );
    let loader = Arc::new( FixtureLoader::new( workspace.modules() ).with_entry( "app" ));
    loader.install( FixtureModule::new( "app" ).with_resource( NATIVE_ARCHIVE, payload( "libapp.so" )));
    let late = ( 0..32 ).map(| index | format!( "late{}", index )).collect::<Vec<_>>();
    late.iter().for_each(| name | { loader.install( FixtureModule::new( name ).with_resource( NATIVE_ARCHIVE, payload( &format!( "lib{}.so", name )))); });

    let resolver = NativeResolver::new( &base )
        .with_platform( Platform::new( TargetOs::Linux, Arch::Amd64 ))
        .with_library_index( Arc::new( LibraryIndex::from_listing( "", Arch::Amd64 )));
    let bootstrap = Bootstrap::new( workspace.config(), loader.clone() ).with_resolver( resolver );
    bootstrap.enumerate_entry();

    std::thread::scope(| scope | {
        scope.spawn(|| late.iter().for_each(| name | { loader.load( name ).unwrap(); }));
        bootstrap.unpack_native_dependencies();
    });

    assert_eq!( bootstrap.registry().len(), 33 );
    assert!( base.join( "libapp.so" ).exists() );
    for name in &late {
        assert!( base.join( format!( "lib{}.so", name )).exists(), "{name} was not unpacked" );
    }

}
