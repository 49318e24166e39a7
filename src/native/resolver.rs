use std::fs::File ;
use std::io::{ Cursor, Read, Seek };
use std::path::{ Path, PathBuf };
use std::sync::Arc ;
use std::time::SystemTime ;

use chrono::NaiveDateTime ;
use pipe_trait::Pipe ;
use thiserror::Error ;
use tracing::{ debug, debug_span, warn };
use zip::ZipArchive ;

use crate::{ Module, Timestamp };
use crate::utils::PartialResult ;
use super::{ links_for, parse_remap, LibraryIndex, Platform, RemapRule, REMAP_MANIFEST };



/// Name of the embedded resource holding a module's native payload.
pub const NATIVE_ARCHIVE: &str = "native.zip" ;

/// Errors that can occur while unpacking native dependencies.
#[derive( Error, Debug )]
pub enum NativeError {
    #[error( "Invalid native archive: {0}" )] Archive( #[from] zip::result::ZipError ),
    #[error( "Invalid remap manifest: {0}" )] Manifest( #[from] roxmltree::Error ),
    #[error( "IO error: {0}" )] Io( #[from] std::io::Error ),
    #[error( "Failed to unpack '{0}': {1}" )] Unpack( String, std::io::Error ),
    #[error( "Archive entry '{0}' escapes the base directory" )] UnsafeEntry( String ),
    #[error( "Could not create symlink {0}: symbolic links are not supported on this platform" )] SymlinksUnsupported( String ),
    #[error( "Symlink target does not exist: {0}" )] MissingTarget( PathBuf ),
    #[error( "Failed to create symlink {0}: {1}" )] Symlink( PathBuf, std::io::Error ),
}

/// What unpacking a module's native payload did.
#[derive( Debug, Clone, Default, PartialEq, Eq )]
pub struct NativeReport {
    /// Files written to the base directory.
    pub extracted: Vec<PathBuf>,
    /// Files left alone because the local copy was not older than the archive entry.
    pub up_to_date: Vec<PathBuf>,
    /// Created links as `( link, target )`.
    pub links: Vec<( PathBuf, PathBuf )>,
}

impl NativeReport {
    pub fn is_empty( &self ) -> bool { self.extracted.is_empty() && self.up_to_date.is_empty() && self.links.is_empty() }
}

enum Extraction {
    Written( PathBuf ),
    UpToDate( PathBuf ),
}

/// Unpacks the platform specific native libraries embedded in modules.
#[derive( Debug, Clone )]
pub struct NativeResolver {
    base_dir: PathBuf,
    platform: Platform,
    index: Arc<LibraryIndex>,
}

impl NativeResolver {

    /// A resolver for the running platform, using the process-wide library index.
    pub fn new( base_dir: impl Into<PathBuf> ) -> Self {
        Self { base_dir: base_dir.into(), platform: Platform::current(), index: LibraryIndex::system() }
    }

    pub fn with_platform( mut self, platform: Platform ) -> Self {
        self.platform = platform ;
        self
    }

    pub fn with_library_index( mut self, index: Arc<LibraryIndex> ) -> Self {
        self.index = index ;
        self
    }

    #[inline] pub fn base_dir( &self ) -> &Path { &self.base_dir }
    #[inline] pub fn platform( &self ) -> Platform { self.platform }

    /// Extracts `<os>/<arch>/` from the module's `native.zip` into the base directory and
    /// creates the links its `remap.xml` declares for the running OS.
    ///
    /// Modules without a native archive are a no-op. Individual entries and links that
    /// fail are returned alongside the report.
    ///
    /// # Errors
    /// Fails when the archive or its manifest cannot be read at all.
    pub fn resolve( &self, module: &Module ) -> PartialResult<NativeReport, NativeError> {
        let Some( data ) = module.resource( NATIVE_ARCHIVE ) else { return Ok(( NativeReport::default(), Vec::new() )) };
        let _span = debug_span!( "unpack_native", module = module.name() ).entered();

        let mut archive = match ZipArchive::new( Cursor::new( data )) {
            Ok( archive ) => archive,
            Err( err ) => return Err(( err.into(), Vec::new() )),
        };
        let rules = match read_rules( &mut archive ) {
            Ok( rules ) => rules,
            Err( err ) => return Err(( err, Vec::new() )),
        };

        let ( mut report, mut failures ) = self.extract( &mut archive );
        links_for( &rules, self.platform.os ).iter().for_each(| ( source, target ) | match self.link( source, target ) {
            Ok( link ) => report.links.push( link ),
            Err( err ) => failures.push( err ),
        });
        Ok(( report, failures ))
    }

    /// [`resolve`]( Self::resolve ), logging every failure as a warning.
    pub fn resolve_logged( &self, module: &Module ) -> NativeReport {
        match self.resolve( module ) {
            Ok(( report, failures )) => {
                failures.iter().for_each(| err | warn!( "{}: {}", module.name(), err ));
                if !report.is_empty() { debug!( "Native dependencies of {}: {:?}", module.name(), report ); }
                report
            }
            Err(( err, failures )) => {
                warn!( "Could not unpack native dependencies of {}: {}", module.name(), err );
                failures.iter().for_each(| err | warn!( "{}: {}", module.name(), err ));
                NativeReport::default()
            }
        }
    }

    fn extract<R: Read + Seek>( &self, archive: &mut ZipArchive<R> ) -> ( NativeReport, Vec<NativeError> ) {
        let prefix = self.platform.archive_prefix();
        let mut report = NativeReport::default();
        let mut failures = Vec::new();
        for index in 0..archive.len() {
            match self.extract_entry( archive, index, &prefix ) {
                Ok( Some( Extraction::Written( path ))) => report.extracted.push( path ),
                Ok( Some( Extraction::UpToDate( path ))) => report.up_to_date.push( path ),
                Ok( None ) => {}
                Err( err ) => failures.push( err ),
            }
        }
        ( report, failures )
    }

    fn extract_entry<R: Read + Seek>( &self, archive: &mut ZipArchive<R>, index: usize, prefix: &str ) -> Result<Option<Extraction>, NativeError> {
        let mut entry = archive.by_index( index )?;
        if entry.is_dir() { return Ok( None ) }
        let name = entry.name().replace( '\\', "/" );
        let Some( relative ) = name.strip_prefix( prefix ) else { return Ok( None ) };

        let components = relative.split( '/' ).filter(| component | !component.is_empty() ).collect::<Vec<_>>();
        if components.is_empty() { return Ok( None ) }
        if components.iter().any(| component | *component == "." || *component == ".." || component.contains( ':' )) {
            return Err( NativeError::UnsafeEntry( name ))
        }
        let destination = components.iter().fold( self.base_dir.clone(), | path, component | path.join( component ));

        let entry_time = Into::<Option<zip::DateTime>>::into( entry.last_modified() ).and_then( timestamp_of );
        let stale = match Timestamp::of_file( &destination ) {
            Ok( local ) => entry_time.is_some_and(| entry_time | local < entry_time ),
            Err( _ ) => true,
        };
        if !stale { return Ok( Some( Extraction::UpToDate( destination ))) }

        if let Some( parent ) = destination.parent() {
            std::fs::create_dir_all( parent ).map_err(| err | NativeError::Unpack( name.clone(), err ))?;
        }
        let mut file = File::create( &destination ).map_err(| err | NativeError::Unpack( name.clone(), err ))?;
        std::io::copy( &mut entry, &mut file ).map_err(| err | NativeError::Unpack( name.clone(), err ))?;
        debug!( "Unpacked {}", destination.display() );
        Ok( Some( Extraction::Written( destination )))
    }

    fn link( &self, source: &str, target: &str ) -> Result<( PathBuf, PathBuf ), NativeError> {
        if !self.platform.os.supports_symlinks() { return Err( NativeError::SymlinksUnsupported( source.to_owned() )) }

        let ( link_target, resolved ) = match self.index.lookup( target ) {
            Some( path ) => ( path.to_path_buf(), path.to_path_buf() ),
            None => ( PathBuf::from( target ), self.base_dir.join( target )),
        };
        if !resolved.exists() { return Err( NativeError::MissingTarget( resolved )) }

        let link = self.base_dir.join( source );
        if link.symlink_metadata().is_ok() {
            debug!( "Replacing existing link {}", link.display() );
            std::fs::remove_file( &link ).map_err(| err | NativeError::Symlink( link.clone(), err ))?;
        }
        create_symlink( &link_target, &link ).map_err(| err | NativeError::Symlink( link.clone(), err ))?;
        debug!( "Linked {} -> {}", link.display(), link_target.display() );
        Ok(( link, link_target ))
    }

}

fn read_rules<R: Read + Seek>( archive: &mut ZipArchive<R> ) -> Result<Vec<RemapRule>, NativeError> {
    let mut manifest = match archive.by_name( REMAP_MANIFEST ) {
        Ok( manifest ) => manifest,
        Err( zip::result::ZipError::FileNotFound ) => return Ok( Vec::new() ),
        Err( err ) => return Err( err.into() ),
    };
    let mut xml = String::new();
    manifest.read_to_string( &mut xml )?;
    Ok( parse_remap( &xml )? )
}

// Archive times carry no zone; they are read as UTC.
fn timestamp_of( time: zip::DateTime ) -> Option<Timestamp> {
    NaiveDateTime::try_from( time ).ok()?
        .and_utc()
        .pipe( SystemTime::from )
        .pipe( Timestamp::from_system_time )
        .pipe( Some )
}

#[cfg( unix )]
fn create_symlink( target: &Path, link: &Path ) -> std::io::Result<()> {
    std::os::unix::fs::symlink( target, link )
}

#[cfg( not( unix ))]
fn create_symlink( _target: &Path, _link: &Path ) -> std::io::Result<()> {
    Err( std::io::Error::new( std::io::ErrorKind::Unsupported, "symbolic links are not supported" ))
}

#[cfg( test )]
mod tests {

    use super::* ;

    #[test]
    fn archive_times_are_read_as_utc() {
        let time = zip::DateTime::from_date_and_time( 2000, 3, 1, 0, 0, 0 ).unwrap();
        assert_eq!( timestamp_of( time ), Some( Timestamp::from_ticks( 951_868_800 * Timestamp::TICKS_PER_SECOND )));
        let time = zip::DateTime::from_date_and_time( 2024, 2, 29, 12, 30, 16 ).unwrap();
        assert_eq!( timestamp_of( time ), Some( Timestamp::from_ticks( 1_709_209_816 * Timestamp::TICKS_PER_SECOND )));
    }

}
