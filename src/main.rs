use std::path::PathBuf ;
use std::process::ExitCode ;
use std::sync::Arc ;

use clap::{ Parser, Subcommand };
use pipe_trait::Pipe ;
use tracing_subscriber::EnvFilter ;

use native_link::{
    Bootstrap, BootstrapConfig, ModuleLoader, NativeLoader, NativeResolver,
    PluginDiscovery, PluginProber, QueryCache, QueryEngine, ModuleRegistry,
};



/// Inspect and run the native-link start-up sequence.
#[derive( Parser, Debug )]
#[command( name = "native-link", version, about )]
struct Cli {
    /// Application name, used for the plugin cache file.
    #[arg( long, default_value = "native-link" )]
    app: String,
    /// Query cache directory.
    #[arg( long )]
    cache_dir: Option<PathBuf>,
    #[command( subcommand )]
    command: Command,
}

#[derive( Subcommand, Debug )]
enum Command {
    /// List the plugins in a directory.
    Discover {
        /// Directory to scan; defaults to the plugin directory.
        directory: Option<PathBuf>,
    },
    /// Unpack the native payload embedded in a module library.
    Unpack {
        library: PathBuf,
        /// Directory to unpack into; defaults to the library's directory.
        #[arg( long )]
        base_dir: Option<PathBuf>,
    },
    /// Run the full start-up sequence.
    Init {
        /// Module library to start the graph walk from.
        #[arg( long )]
        entry: Option<PathBuf>,
        #[arg( long )]
        base_dir: Option<PathBuf>,
    },
}

fn main() -> ExitCode {

    tracing_subscriber::fmt()
        .with_env_filter( EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new( "info" )))
        .init();

    match run( Cli::parse() ) {
        Ok(()) => ExitCode::SUCCESS,
        Err( e ) => {
            eprintln!( "{}", e );
            ExitCode::FAILURE
        }
    }

}

fn run( cli: Cli ) -> Result<(), Box<dyn std::error::Error>> {

    let config = BootstrapConfig::from_env( cli.app ).pipe(| config | match cli.cache_dir {
        Some( dir ) => config.with_cache_dir( dir ),
        None => config,
    });

    match cli.command {
        Command::Discover { directory } => {
            let directory = directory.unwrap_or_else(|| config.plugin_dir().to_path_buf() );
            let loader = NativeLoader::new([ directory.clone() ]);
            let engine = QueryEngine::new( QueryCache::new( config.cache_dir() ), Arc::new( ModuleRegistry::new() ));
            let discovery = PluginDiscovery::new( PluginProber::new( &loader, &engine ), config.plugin_cache_file(), config.extensions() );
            discovery.discover( &directory ).iter().for_each(| plugin | println!( "{}", plugin.display() ));
        }
        Command::Unpack { library, base_dir } => {
            let loader = NativeLoader::new( library.parent().map( PathBuf::from ));
            let module = loader.load_file( &library )?;
            let base_dir = base_dir.unwrap_or_else(|| module.location().parent().map_or_else(|| PathBuf::from( "." ), PathBuf::from ));
            let ( report, failures ) = NativeResolver::new( base_dir ).resolve( &module ).map_err(|( err, _ )| err )?;
            report.extracted.iter().for_each(| path | println!( "unpacked {}", path.display() ));
            report.up_to_date.iter().for_each(| path | println!( "up to date {}", path.display() ));
            report.links.iter().for_each(|( link, target )| println!( "linked {} -> {}", link.display(), target.display() ));
            failures.iter().for_each(| err | eprintln!( "warning: {}", err ));
        }
        Command::Init { entry, base_dir } => {
            let config = config.pipe(| config | match base_dir {
                Some( dir ) => config.with_base_dir( dir ),
                None => config,
            });
            let loader = Arc::new( NativeLoader::new([ config.base_dir().to_path_buf(), config.plugin_dir().to_path_buf() ]));
            let config = match entry {
                Some( entry ) => config.with_entry( loader.load_file( &entry )? ),
                None => config,
            };
            let report = Bootstrap::new( config, loader ).init();
            report.modules.iter().for_each(| module | println!( "module {}", module ));
            report.invoked.iter().for_each(| method | println!( "activated {}", method ));
            report.errors.iter().for_each(| err | eprintln!( "warning: {}", err ));
        }
    }

    Ok(())

}
