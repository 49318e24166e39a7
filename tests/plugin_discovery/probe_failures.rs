use std::sync::Arc ;
use std::sync::atomic::AtomicUsize ;

use native_link::{ LoadError, PluginDiscovery, PluginProber, ProbeError };

use crate::fixture_modules::{ plugin_type, FixtureLoader, FixtureModule, Workspace, EXTENSION };

#[test]
fn plugin_discovery_unloadable_candidates_are_not_plugins() {

    let workspace = Workspace::new();
    let loader = FixtureLoader::new( workspace.modules() );
    let calls = Arc::new( AtomicUsize::new( 0 ));
    let good = loader.install( FixtureModule::new( "reverb" ).with_type( plugin_type( "reverb::Plugin", &calls )));
    let panicking = loader.install( FixtureModule::new( "crashy" ).with_type( plugin_type( "crashy::Plugin", &calls )).panicking() );
    let junk = workspace.modules().join( "junk.fixture" );
    std::fs::write( &junk, "not a module" ).unwrap();

    let engine = workspace.engine();
    let prober = PluginProber::new( &loader, &engine );
    assert!( matches!( prober.probe( &panicking ), Err( ProbeError::Panicked( message )) if message.contains( "refuses to load" )));
    assert!( matches!( prober.probe( &junk ), Err( ProbeError::Load( LoadError::NotAModule( _ )))));
    assert!( matches!( prober.probe( &good ), Ok( true )));

    let cache_file = workspace.plugin_cache_file();
    let extensions = [ EXTENSION.to_owned() ];
    let discovery = PluginDiscovery::new( PluginProber::new( &loader, &engine ), &cache_file, &extensions );
    assert_eq!( discovery.discover( &workspace.modules() ), vec![ good.clone() ]);
    assert_eq!( loader.attempts( "crashy" ), 2 );

    // Failed probes are cached as negative verdicts.
    assert_eq!( discovery.discover( &workspace.modules() ), vec![ good ]);
    assert_eq!( loader.attempts( "crashy" ), 2 );
    assert_eq!( calls.load( std::sync::atomic::Ordering::SeqCst ), 0 );

}
