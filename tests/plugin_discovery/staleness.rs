use std::sync::Arc ;
use std::sync::atomic::AtomicUsize ;

use native_link::{ PluginDiscovery, PluginProber };

use crate::fixture_modules::{ class, plugin_type, FixtureLoader, FixtureModule, Workspace, EXTENSION };

#[test]
fn plugin_discovery_unchanged_files_are_not_probed_again() {

    let workspace = Workspace::new();
    let loader = FixtureLoader::new( workspace.modules() );
    let calls = Arc::new( AtomicUsize::new( 0 ));
    let plugin = loader.install( FixtureModule::new( "reverb" ).with_type( plugin_type( "reverb::Plugin", &calls )));
    loader.install( FixtureModule::new( "dsp" ).with_type( class( "dsp::Filter" )));

    let engine = workspace.engine();
    let cache_file = workspace.plugin_cache_file();
    let extensions = [ EXTENSION.to_owned() ];
    let discovery = PluginDiscovery::new( PluginProber::new( &loader, &engine ), &cache_file, &extensions );

    assert_eq!( discovery.discover( &workspace.modules() ), vec![ plugin.clone() ]);
    assert_eq!( loader.attempts( "reverb" ), 1 );
    assert_eq!( loader.attempts( "dsp" ), 1 );
    assert!( cache_file.exists() );

    assert_eq!( discovery.discover( &workspace.modules() ), vec![ plugin ]);
    assert_eq!( loader.attempts( "reverb" ), 1 );
    assert_eq!( loader.attempts( "dsp" ), 1 );

}

#[test]
fn plugin_discovery_rewritten_files_are_probed_again() {

    let workspace = Workspace::new();
    let loader = FixtureLoader::new( workspace.modules() );
    let calls = Arc::new( AtomicUsize::new( 0 ));
    let reverb = loader.install( FixtureModule::new( "reverb" ).with_type( plugin_type( "reverb::Plugin", &calls )));
    loader.install( FixtureModule::new( "dsp" ).with_type( class( "dsp::Filter" )));

    let engine = workspace.engine();
    let cache_file = workspace.plugin_cache_file();
    let extensions = [ EXTENSION.to_owned() ];
    let discovery = PluginDiscovery::new( PluginProber::new( &loader, &engine ), &cache_file, &extensions );
    assert_eq!( discovery.discover( &workspace.modules() ), vec![ reverb.clone() ]);

    let dsp = loader.install( FixtureModule::new( "dsp" ).with_type( plugin_type( "dsp::Plugin", &calls )));
    assert_eq!( discovery.discover( &workspace.modules() ), vec![ dsp, reverb ]);
    assert_eq!( loader.attempts( "dsp" ), 2 );
    assert_eq!( loader.attempts( "reverb" ), 1 );

}

#[test]
fn plugin_discovery_only_listed_extensions_are_candidates() {

    let workspace = Workspace::new();
    let loader = FixtureLoader::new( workspace.modules() );
    let calls = Arc::new( AtomicUsize::new( 0 ));
    loader.install( FixtureModule::new( "reverb" ).with_type( plugin_type( "reverb::Plugin", &calls )));

    let engine = workspace.engine();
    let cache_file = workspace.plugin_cache_file();
    let extensions = [ "so".to_owned() ];
    let discovery = PluginDiscovery::new( PluginProber::new( &loader, &engine ), &cache_file, &extensions );

    assert!( discovery.discover( &workspace.modules() ).is_empty() );
    assert_eq!( loader.total_attempts(), 0 );

}
