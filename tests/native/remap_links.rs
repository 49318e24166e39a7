#![cfg( unix )]

use std::sync::Arc ;

use native_link::native::{ Arch, LibraryIndex, Platform, TargetOs, NATIVE_ARCHIVE, REMAP_MANIFEST };
use native_link::{ ModuleLoader, NativeError, NativeResolver };

use crate::fixture_modules::{ archive_time, zip_archive, FixtureLoader, FixtureModule, Workspace };

const MANIFEST: &[u8] = br#"<configuration>
    <dllmap dll="sound" os="linux" target="libsound.so.2"/>
    <dllmap dll="sound" os="osx" target="libsound.dylib"/>
    <dllmap dll="z" os="linux" target="libz.so.1"/>
    <dllmap dll="ghost" os="linux" target="libghost.so"/>
</configuration>"#;

#[test]
fn remap_links_point_at_unpacked_or_system_libraries() {

    let workspace = Workspace::new();
    let base = workspace.root().join( "bin" );
    let system = workspace.root().join( "system" );
    std::fs::create_dir_all( &system ).unwrap();
    std::fs::write( system.join( "libz.so.1" ), "system zlib".as_bytes() ).unwrap();
    let listing = format!( "\tlibz.so.1 (libc6,x86-64) => {}\n", system.join( "libz.so.1" ).display() );

    let loader = FixtureLoader::new( workspace.modules() );
    loader.install( FixtureModule::new( "audio" ).with_resource( NATIVE_ARCHIVE, zip_archive( &[
        ( REMAP_MANIFEST, MANIFEST ),
        ( "linux/AMD64/libsound.so.2", "sound".as_bytes() ),
    ], archive_time( 2020 ))));
    let module = loader.load( "audio" ).unwrap();

    let resolver = NativeResolver::new( &base )
        .with_platform( Platform::new( TargetOs::Linux, Arch::Amd64 ))
        .with_library_index( Arc::new( LibraryIndex::from_listing( listing, Arch::Amd64 )));

    let ( report, failures ) = resolver.resolve( &module ).unwrap();
    assert_eq!( report.links, vec![
        ( base.join( "sound" ), std::path::PathBuf::from( "libsound.so.2" )),
        ( base.join( "z" ), system.join( "libz.so.1" )),
    ]);
    assert_eq!( std::fs::read( base.join( "sound" )).unwrap(), "sound".as_bytes() );
    assert_eq!( std::fs::read( base.join( "z" )).unwrap(), "system zlib".as_bytes() );
    assert_eq!( failures.len(), 1 );
    assert!( matches!( &failures[ 0 ], NativeError::MissingTarget( path ) if path.ends_with( "libghost.so" )));

    // Links are replaced on every run.
    let ( again, _ ) = resolver.resolve( &module ).unwrap();
    assert_eq!( again.links.len(), 2 );

}

#[test]
fn remap_links_are_not_created_where_symlinks_are_unsupported() {

    let workspace = Workspace::new();
    let base = workspace.root().join( "bin" );
    let loader = FixtureLoader::new( workspace.modules() );
    loader.install( FixtureModule::new( "audio" ).with_resource( NATIVE_ARCHIVE, zip_archive( &[
        ( REMAP_MANIFEST, r#"<configuration><dllmap dll="sound" os="windows" target="sound.dll"/></configuration>"#.as_bytes() ),
        ( "windows/x86/sound.dll", "sound".as_bytes() ),
    ], archive_time( 2020 ))));
    let module = loader.load( "audio" ).unwrap();

    let resolver = NativeResolver::new( &base )
        .with_platform( Platform::new( TargetOs::Windows, Arch::X86 ))
        .with_library_index( Arc::new( LibraryIndex::from_listing( "", Arch::X86 )));

    let ( report, failures ) = resolver.resolve( &module ).unwrap();
    assert_eq!( report.extracted, vec![ base.join( "sound.dll" )]);
    assert!( report.links.is_empty() );
    assert!( matches!( &failures[..], [ NativeError::SymlinksUnsupported( name )] if name == "sound" ));

}
