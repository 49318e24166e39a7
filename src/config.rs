//! Bootstrap configuration.

use std::path::{ Path, PathBuf };

use pipe_trait::Pipe ;
use tracing::warn ;

use crate::Module ;



/// Paths and settings used by [`Bootstrap`]( crate::Bootstrap ).
///
/// ```
/// use native_link::BootstrapConfig ;
///
/// let config = BootstrapConfig::new( "editor" )
///     .with_base_dir( "/opt/editor" )
///     .with_cache_dir( "/tmp/editor-cache" );
///
/// assert_eq!( config.plugin_dir(), std::path::Path::new( "/opt/editor" ));
/// assert_eq!( config.plugin_cache_file(), std::path::Path::new( "/tmp/editor-cache/editor_plugins.bin" ));
/// ```
#[derive( Debug, Clone )]
pub struct BootstrapConfig {
    app_name: String,
    base_dir: PathBuf,
    plugin_dir: Option<PathBuf>,
    cache_dir: PathBuf,
    plugin_cache_file: PathBuf,
    extensions: Vec<String>,
    entry: Option<Module>,
}

impl BootstrapConfig {

    /// Overrides the query cache directory.
    pub const CACHE_DIR_ENV: &'static str = "NATIVE_LINK_CACHE_DIR" ;
    /// Overrides the directory scanned for plugins.
    pub const PLUGIN_DIR_ENV: &'static str = "NATIVE_LINK_PLUGIN_DIR" ;

    /// Defaults: the executable's directory as base and plugin directory, the per-user
    /// data directory for caches, and the platform library extension.
    pub fn new( app_name: impl Into<String> ) -> Self {
        let app_name = app_name.into();
        let cache_dir = Self::default_cache_dir();
        let plugin_cache_file = plugin_cache_file( &cache_dir, &app_name );
        Self {
            app_name,
            base_dir: Self::default_base_dir(),
            plugin_dir: None,
            cache_dir,
            plugin_cache_file,
            extensions: vec![ std::env::consts::DLL_EXTENSION.to_owned() ],
            entry: None,
        }
    }

    /// Like [`new`]( Self::new ), then applies [`CACHE_DIR_ENV`]( Self::CACHE_DIR_ENV ) and
    /// [`PLUGIN_DIR_ENV`]( Self::PLUGIN_DIR_ENV ) when they are set and not empty.
    pub fn from_env( app_name: impl Into<String> ) -> Self {
        Self::new( app_name )
            .pipe(| config | match env_path( Self::CACHE_DIR_ENV ) {
                Some( dir ) => config.with_cache_dir( dir ),
                None => config,
            })
            .pipe(| config | match env_path( Self::PLUGIN_DIR_ENV ) {
                Some( dir ) => config.with_plugin_dir( dir ),
                None => config,
            })
    }

    pub fn with_base_dir( mut self, dir: impl Into<PathBuf> ) -> Self {
        self.base_dir = dir.into();
        self
    }

    pub fn with_plugin_dir( mut self, dir: impl Into<PathBuf> ) -> Self {
        self.plugin_dir = Some( dir.into() );
        self
    }

    /// Sets the cache directory. The plugin candidate cache moves along with it.
    pub fn with_cache_dir( mut self, dir: impl Into<PathBuf> ) -> Self {
        self.cache_dir = dir.into();
        self.plugin_cache_file = plugin_cache_file( &self.cache_dir, &self.app_name );
        self
    }

    pub fn with_plugin_cache_file( mut self, file: impl Into<PathBuf> ) -> Self {
        self.plugin_cache_file = file.into();
        self
    }

    /// Sets the file extensions, without the leading dot, considered loadable.
    pub fn with_extensions( mut self, extensions: impl IntoIterator<Item = impl Into<String>> ) -> Self {
        self.extensions = extensions.into_iter().map( Into::into ).collect();
        self
    }

    /// Sets the module the graph walk starts from.
    pub fn with_entry( mut self, entry: Module ) -> Self {
        self.entry = Some( entry );
        self
    }

    #[inline] pub fn app_name( &self ) -> &str { &self.app_name }
    #[inline] pub fn base_dir( &self ) -> &Path { &self.base_dir }
    #[inline] pub fn plugin_dir( &self ) -> &Path { self.plugin_dir.as_deref().unwrap_or( &self.base_dir ) }
    #[inline] pub fn cache_dir( &self ) -> &Path { &self.cache_dir }
    #[inline] pub fn plugin_cache_file( &self ) -> &Path { &self.plugin_cache_file }
    #[inline] pub fn extensions( &self ) -> &[String] { &self.extensions }
    #[inline] pub fn entry( &self ) -> Option<&Module> { self.entry.as_ref() }

    /// `<data dir>/native-link/cache`, or `./cache` when there is no data directory.
    pub fn default_cache_dir() -> PathBuf {
        match dirs::data_dir() {
            Some( dir ) => dir.join( "native-link" ).join( "cache" ),
            None => {
                warn!( "No per-user data directory, caching in ./cache" );
                PathBuf::from( "cache" )
            }
        }
    }

    /// The directory of the running executable, or the working directory.
    pub fn default_base_dir() -> PathBuf {
        std::env::current_exe().ok()
            .and_then(| exe | exe.parent().map( Path::to_path_buf ))
            .or_else(|| std::env::current_dir().ok() )
            .unwrap_or_else(|| PathBuf::from( "." ))
    }

}

fn plugin_cache_file( cache_dir: &Path, app_name: &str ) -> PathBuf {
    cache_dir.join( format!( "{}_plugins.bin", app_name ))
}

fn env_path( key: &str ) -> Option<PathBuf> {
    std::env::var_os( key ).filter(| value | !value.is_empty() ).map( PathBuf::from )
}
