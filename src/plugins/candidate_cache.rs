use std::collections::HashMap ;
use std::path::{ Path, PathBuf };

use serde::{ Deserialize, Serialize };
use thiserror::Error ;
use tracing::debug ;

use crate::Timestamp ;



/// Errors that can occur while reading or writing the candidate cache.
#[derive( Error, Debug )]
pub enum CandidateCacheError {
    #[error( "IO error: {0}" )] Io( #[from] std::io::Error ),
    #[error( "Serialisation error: {0}" )] Serialisation( #[from] bincode::Error ),
    #[error( "Unsupported snapshot version {0}" )] UnsupportedVersion( u32 ),
}

/// What the last probe of a candidate file found.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize )]
pub struct CandidateRecord {
    /// Last-write time of the file when it was probed.
    pub last_write: Timestamp,
    pub is_plugin: bool,
}

/// Persisted verdicts for plugin candidate files, keyed by absolute path.
#[derive( Debug, Clone, PartialEq, Eq, Serialize, Deserialize )]
pub struct CandidateCache {
    version: u32,
    entries: HashMap<PathBuf, CandidateRecord>,
}

impl Default for CandidateCache {
    fn default() -> Self { Self { version: Self::VERSION, entries: HashMap::new() }}
}

impl CandidateCache {

    /// Snapshot format version; snapshots with any other version are discarded.
    pub const VERSION: u32 = 1 ;

    pub fn new() -> Self { Self::default() }

    /// Reads a snapshot, treating a missing, unreadable or foreign file as empty.
    pub fn load( path: &Path ) -> Self {
        match Self::try_load( path ) {
            Ok( cache ) => cache,
            Err( CandidateCacheError::Io( err )) if err.kind() == std::io::ErrorKind::NotFound => Self::new(),
            Err( err ) => {
                debug!( "Discarding plugin cache {}: {}", path.display(), err );
                Self::new()
            }
        }
    }

    /// Reads a snapshot.
    ///
    /// # Errors
    /// Fails when the file cannot be read or decoded, or has a different version.
    pub fn try_load( path: &Path ) -> Result<Self, CandidateCacheError> {
        let cache: Self = bincode::deserialize( &std::fs::read( path )? )?;
        match cache.version == Self::VERSION {
            true => Ok( cache ),
            false => Err( CandidateCacheError::UnsupportedVersion( cache.version )),
        }
    }

    /// Replaces the snapshot at `path` atomically: writes a sibling temporary file and
    /// renames it over the target.
    ///
    /// # Errors
    /// Fails when the snapshot cannot be encoded or written.
    pub fn save( &self, path: &Path ) -> Result<(), CandidateCacheError> {
        if let Some( parent ) = path.parent() { std::fs::create_dir_all( parent )?; }
        let bytes = bincode::serialize( self )?;
        let mut temporary = path.as_os_str().to_owned();
        temporary.push( ".tmp" );
        let temporary = PathBuf::from( temporary );
        std::fs::write( &temporary, bytes )?;
        std::fs::rename( &temporary, path )?;
        Ok(())
    }

    pub fn get( &self, path: &Path ) -> Option<CandidateRecord> { self.entries.get( path ).copied() }

    pub fn insert( &mut self, path: PathBuf, record: CandidateRecord ) { self.entries.insert( path, record ); }

    pub fn len( &self ) -> usize { self.entries.len() }

    pub fn is_empty( &self ) -> bool { self.entries.is_empty() }

    pub fn paths( &self ) -> impl Iterator<Item = &Path> { self.entries.keys().map( PathBuf::as_path ) }

    /// The recorded verdict for `path`, if the file has not been written since it was
    /// recorded. An unknown current time never trusts the record.
    pub fn verdict( &self, path: &Path, current: Option<Timestamp> ) -> Option<bool> {
        let record = self.get( path )?;
        match current {
            Some( current ) if current <= record.last_write => Some( record.is_plugin ),
            _ => None,
        }
    }

}

#[cfg( test )]
mod tests {

    use super::* ;

    fn record( ticks: i64, is_plugin: bool ) -> CandidateRecord {
        CandidateRecord { last_write: Timestamp::from_ticks( ticks ), is_plugin }
    }

    #[test]
    fn verdicts_are_trusted_only_while_the_file_is_not_newer() {
        let mut cache = CandidateCache::new();
        cache.insert( PathBuf::from( "/plugins/a.so" ), record( 100, true ));

        let path = Path::new( "/plugins/a.so" );
        assert_eq!( cache.verdict( path, Some( Timestamp::from_ticks( 100 ))), Some( true ));
        assert_eq!( cache.verdict( path, Some( Timestamp::from_ticks( 50 ))), Some( true ));
        assert_eq!( cache.verdict( path, Some( Timestamp::from_ticks( 101 ))), None );
        assert_eq!( cache.verdict( path, None ), None );
        assert_eq!( cache.verdict( Path::new( "/plugins/b.so" ), Some( Timestamp::from_ticks( 0 ))), None );
    }

    #[test]
    fn snapshots_survive_a_save_and_load() {
        let directory = tempfile::tempdir().unwrap();
        let file = directory.path().join( "nested" ).join( "app_plugins.bin" );
        let mut cache = CandidateCache::new();
        cache.insert( PathBuf::from( "/plugins/a.so" ), record( 7, false ));

        cache.save( &file ).unwrap();
        assert_eq!( CandidateCache::load( &file ), cache );
        assert!( !directory.path().join( "nested" ).join( "app_plugins.bin.tmp" ).exists() );
    }

    #[test]
    fn unreadable_snapshots_load_as_empty() {
        let directory = tempfile::tempdir().unwrap();
        let file = directory.path().join( "app_plugins.bin" );
        assert!( CandidateCache::load( &file ).is_empty() );

        std::fs::write( &file, b"\xff\xff\xff\xff garbage" ).unwrap();
        assert!( CandidateCache::try_load( &file ).is_err() );
        assert!( CandidateCache::load( &file ).is_empty() );
    }

}
