use std::sync::Arc ;
use std::sync::atomic::AtomicUsize ;

use native_link::{ CandidateCache, PluginDiscovery, PluginProber };

use crate::fixture_modules::{ class, plugin_type, FixtureLoader, FixtureModule, Workspace, EXTENSION };

#[test]
fn plugin_discovery_deleted_files_leave_the_cache() {

    let workspace = Workspace::new();
    let loader = FixtureLoader::new( workspace.modules() );
    let calls = Arc::new( AtomicUsize::new( 0 ));
    let reverb = loader.install( FixtureModule::new( "reverb" ).with_type( plugin_type( "reverb::Plugin", &calls )));
    let delay = loader.install( FixtureModule::new( "delay" ).with_type( plugin_type( "delay::Plugin", &calls )));
    let dsp = loader.install( FixtureModule::new( "dsp" ).with_type( class( "dsp::Filter" )));

    let engine = workspace.engine();
    let cache_file = workspace.plugin_cache_file();
    let extensions = [ EXTENSION.to_owned() ];
    let discovery = PluginDiscovery::new( PluginProber::new( &loader, &engine ), &cache_file, &extensions );

    assert_eq!( discovery.discover( &workspace.modules() ), vec![ delay.clone(), reverb.clone() ]);
    assert_eq!( CandidateCache::load( &cache_file ).len(), 3 );

    std::fs::remove_file( &delay ).unwrap();
    std::fs::remove_file( &dsp ).unwrap();
    assert_eq!( discovery.discover( &workspace.modules() ), vec![ reverb.clone() ]);

    let snapshot = CandidateCache::load( &cache_file );
    assert_eq!( snapshot.paths().collect::<Vec<_>>(), vec![ reverb.as_path() ]);

}

#[test]
fn plugin_discovery_missing_directory_finds_nothing() {

    let workspace = Workspace::new();
    let loader = FixtureLoader::new( workspace.modules() );
    let engine = workspace.engine();
    let cache_file = workspace.plugin_cache_file();
    let extensions = [ EXTENSION.to_owned() ];
    let discovery = PluginDiscovery::new( PluginProber::new( &loader, &engine ), &cache_file, &extensions );

    assert!( discovery.discover( &workspace.root().join( "absent" )).is_empty() );

}
