#[allow( dead_code )]
mod fixture_modules {

    use std::collections::HashMap ;
    use std::io::Write ;
    use std::path::{ Path, PathBuf };
    use std::sync::{ Arc, Mutex };
    use std::sync::atomic::{ AtomicUsize, Ordering };
    use std::time::{ Duration, SystemTime, UNIX_EPOCH };

    use native_link::{
        BootstrapConfig, LoadError, LoadHook, Marker, MethodInfo, Module, ModuleLoader, ModuleRegistry,
        ModuleSource, QueryCache, QueryEngine, TypeInfo, TypeKind, TypeLoadError, ACTIVATION_MARKER,
    };

    /// Extension of the files written for fixture modules.
    pub const EXTENSION: &str = "fixture" ;

    /// Module files get deterministic, strictly increasing last-write times starting here.
    const FIRST_WRITE: u64 = 1_600_000_000 ;

    /// A temporary host layout: `modules/` for module files, `cache/` for caches.
    pub struct Workspace { root: tempfile::TempDir }

    impl Workspace {

        pub fn new() -> Self {
            let root = tempfile::tempdir().unwrap();
            std::fs::create_dir_all( root.path().join( "modules" )).unwrap();
            Self { root }
        }

        pub fn root( &self ) -> PathBuf { std::fs::canonicalize( self.root.path() ).unwrap() }
        pub fn modules( &self ) -> PathBuf { self.root().join( "modules" ) }
        pub fn cache( &self ) -> PathBuf { self.root().join( "cache" ) }
        pub fn plugin_cache_file( &self ) -> PathBuf { self.cache().join( "fixture_plugins.bin" ) }

        pub fn engine( &self ) -> QueryEngine {
            QueryEngine::new( QueryCache::new( self.cache() ), Arc::new( ModuleRegistry::new() ))
        }

        pub fn config( &self ) -> BootstrapConfig {
            BootstrapConfig::new( "fixture" )
                .with_base_dir( self.modules() )
                .with_cache_dir( self.cache() )
                .with_extensions([ EXTENSION ])
        }

    }

    /// Declarative description of a module served by [`FixtureLoader`].
    #[derive( Clone, Default )]
    pub struct FixtureModule {
        name: String,
        dependencies: Vec<String>,
        types: Vec<TypeInfo>,
        broken: Vec<String>,
        resources: Vec<( String, Vec<u8> )>,
        panics_on_load: bool,
    }

    impl FixtureModule {

        pub fn new( name: &str ) -> Self { Self { name: name.to_owned(), ..Self::default() }}

        pub fn depends_on( mut self, dependencies: &[&str] ) -> Self {
            self.dependencies = dependencies.iter().map(| name | ( *name ).to_owned() ).collect();
            self
        }

        pub fn with_type( mut self, ty: TypeInfo ) -> Self {
            self.types.push( ty );
            self
        }

        /// Declares a type that fails to load whenever the module's types are enumerated.
        pub fn with_broken_type( mut self, name: &str ) -> Self {
            self.broken.push( name.to_owned() );
            self
        }

        pub fn with_resource( mut self, name: &str, data: Vec<u8> ) -> Self {
            self.resources.push(( name.to_owned(), data ));
            self
        }

        pub fn panicking( mut self ) -> Self {
            self.panics_on_load = true ;
            self
        }

    }

    struct FixtureSource {
        types: Vec<TypeInfo>,
        broken: Vec<String>,
        resources: Vec<( String, Vec<u8> )>,
        enumerations: Arc<AtomicUsize>,
    }

    impl ModuleSource for FixtureSource {

        fn types( &self ) -> Vec<Result<TypeInfo, TypeLoadError>> {
            self.enumerations.fetch_add( 1, Ordering::SeqCst );
            self.types.iter().cloned().map( Ok )
                .chain( self.broken.iter().map(| name | Err( TypeLoadError::new( name.as_str(), "missing native dependency" ))))
                .collect()
        }

        fn resolve_type( &self, full_name: &str ) -> Option<TypeInfo> {
            self.types.iter().find(| ty | ty.full_name() == full_name ).cloned()
        }

        fn resource( &self, name: &str ) -> Option<&[u8]> {
            self.resources.iter().find(|( resource, _ )| resource == name ).map(|( _, data )| data.as_slice() )
        }

    }

    /// In-memory [`ModuleLoader`] that writes one file per installed module and counts
    /// every load attempt and every type enumeration.
    pub struct FixtureLoader {
        dir: PathBuf,
        fixtures: Mutex<HashMap<String, FixtureModule>>,
        loaded: Mutex<Vec<Module>>,
        attempts: Mutex<HashMap<String, usize>>,
        enumerations: Mutex<HashMap<String, Arc<AtomicUsize>>>,
        hooks: Mutex<Vec<LoadHook>>,
        entry: Option<String>,
        writes: AtomicUsize,
    }

    impl FixtureLoader {

        pub fn new( dir: impl Into<PathBuf> ) -> Self {
            Self {
                dir: dir.into(),
                fixtures: Mutex::new( HashMap::new() ),
                loaded: Mutex::new( Vec::new() ),
                attempts: Mutex::new( HashMap::new() ),
                enumerations: Mutex::new( HashMap::new() ),
                hooks: Mutex::new( Vec::new() ),
                entry: None,
                writes: AtomicUsize::new( 0 ),
            }
        }

        pub fn with_entry( mut self, name: &str ) -> Self {
            self.entry = Some( name.to_owned() );
            self
        }

        pub fn path_of( &self, name: &str ) -> PathBuf { self.dir.join( format!( "{}.{}", name, EXTENSION )) }

        /// Writes the module file and makes the fixture loadable. Installing a name again
        /// simulates a rebuilt module: the file gets a newer last-write time and the next
        /// load returns a fresh handle.
        pub fn install( &self, fixture: FixtureModule ) -> PathBuf {
            let path = self.path_of( &fixture.name );
            std::fs::write( &path, &fixture.name ).unwrap();
            let generation = self.writes.fetch_add( 1, Ordering::SeqCst ) as u64 ;
            set_last_write( &path, UNIX_EPOCH + Duration::from_secs( FIRST_WRITE + generation ));
            self.loaded.lock().unwrap().retain(| module | module.name() != fixture.name );
            self.fixtures.lock().unwrap().insert( fixture.name.clone(), fixture );
            path
        }

        pub fn attempts( &self, name: &str ) -> usize { self.attempts.lock().unwrap().get( name ).copied().unwrap_or( 0 )}

        pub fn total_attempts( &self ) -> usize { self.attempts.lock().unwrap().values().sum() }

        /// How many times the types of the named module were enumerated.
        pub fn enumerations( &self, name: &str ) -> usize {
            self.enumerations.lock().unwrap().get( name ).map_or( 0, | count | count.load( Ordering::SeqCst ))
        }

        fn open( &self, fixture: FixtureModule ) -> Module {
            if fixture.panics_on_load { panic!( "fixture {} refuses to load", fixture.name ) }
            let enumerations = Arc::clone( self.enumerations.lock().unwrap().entry( fixture.name.clone() ).or_default() );
            let module = Module::new(
                fixture.name.clone(),
                self.path_of( &fixture.name ),
                fixture.dependencies,
                FixtureSource { types: fixture.types, broken: fixture.broken, resources: fixture.resources, enumerations },
            );
            self.loaded.lock().unwrap().push( module.clone() );
            let hooks = self.hooks.lock().unwrap().clone();
            hooks.iter().for_each(| hook | hook( &module ));
            module
        }

    }

    impl ModuleLoader for FixtureLoader {

        fn load( &self, name: &str ) -> Result<Module, LoadError> {
            *self.attempts.lock().unwrap().entry( name.to_owned() ).or_default() += 1 ;
            let loaded = self.loaded.lock().unwrap().iter().find(| module | module.name() == name ).cloned();
            if let Some( module ) = loaded { return Ok( module ) }
            let fixture = self.fixtures.lock().unwrap().get( name ).cloned();
            match fixture {
                Some( fixture ) => Ok( self.open( fixture )),
                None => Err( LoadError::NotFound( name.to_owned() )),
            }
        }

        fn load_file( &self, path: &Path ) -> Result<Module, LoadError> {
            let name = std::fs::read_to_string( path )?;
            let known = self.fixtures.lock().unwrap().contains_key( name.trim() );
            match known {
                true => self.load( name.trim() ),
                false => Err( LoadError::NotAModule( path.to_path_buf() )),
            }
        }

        fn entry_module( &self ) -> Option<Module> {
            self.entry.as_deref().and_then(| name | self.load( name ).ok() )
        }

        fn loaded( &self ) -> Vec<Module> { self.loaded.lock().unwrap().clone() }

        fn subscribe( &self, hook: LoadHook ) { self.hooks.lock().unwrap().push( hook ); }

    }

    pub fn set_last_write( path: &Path, time: SystemTime ) {
        std::fs::File::options().write( true ).open( path ).unwrap().set_modified( time ).unwrap();
    }

    pub fn class( name: &str ) -> TypeInfo { TypeInfo::new( name, TypeKind::Class ) }

    /// A method carrying the activation marker that counts its invocations.
    pub fn activation( declaring_type: &str, name: &str, calls: &Arc<AtomicUsize> ) -> MethodInfo {
        let calls = Arc::clone( calls );
        MethodInfo::new( declaring_type, name )
            .with_marker( Marker::new( ACTIVATION_MARKER ))
            .with_body( move | _ | {
                calls.fetch_add( 1, Ordering::SeqCst );
                Ok(())
            })
    }

    /// A class whose `on_init` activation method counts its invocations.
    pub fn plugin_type( name: &str, calls: &Arc<AtomicUsize> ) -> TypeInfo {
        class( name ).with_method( activation( name, "on_init", calls ))
    }

    pub fn type_names( types: &[TypeInfo] ) -> Vec<String> {
        types.iter().map(| ty | ty.full_name().to_owned() ).collect()
    }

    pub fn module_names( modules: &[Module] ) -> Vec<String> {
        modules.iter().map(| module | module.name().to_owned() ).collect()
    }

    /// Builds a zip archive whose entries all carry `modified` as their timestamp.
    pub fn zip_archive( entries: &[( &str, &[u8] )], modified: zip::DateTime ) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new( std::io::Cursor::new( Vec::new() ));
        let options = zip::write::SimpleFileOptions::default().last_modified_time( modified );
        for ( name, data ) in entries {
            writer.start_file( *name, options.clone() ).unwrap();
            writer.write_all( data ).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    pub fn archive_time( year: u16 ) -> zip::DateTime {
        zip::DateTime::from_date_and_time( year, 1, 1, 0, 0, 0 ).unwrap()
    }

}
