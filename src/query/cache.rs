//! Persistent, timestamp-validated cache of type queries.
//!
//! Every (module, query) pair owns one text file:
//!
//! ```text
//! version 1 timestamp 16094592000000000
//! discriminator implements:audio::Codec
//! audio::Mp3
//! audio::Flac
//! ```
//!
//! The file is valid while the stored timestamp equals the module file's current
//! last-write time and the stored discriminator equals the query's. Anything else,
//! including a file that cannot be parsed, is a miss and the file is rewritten.

use std::fmt::{ Display, Formatter };
use std::num::ParseIntError ;
use std::path::{ Path, PathBuf };

use thiserror::Error ;
use tracing::{ debug, warn };

use crate::{ Module, Timestamp, TypeInfo };



/// Format version written into every header.
pub const CACHE_VERSION: u32 = 1 ;

const DISCRIMINATOR_PREFIX: &str = "discriminator " ;

/// Why a header line was rejected.
#[derive( Error, Debug, Clone, PartialEq, Eq )]
pub enum HeaderError {
    #[error( "No header" )] Missing,
    #[error( "Expected 4 header tokens, found {0}" )] TokenCount( usize ),
    #[error( "Unexpected header token '{0}'" )] UnexpectedToken( String ),
    #[error( "Invalid number in header: {0}" )] InvalidNumber( #[from] ParseIntError ),
}

/// First line of a cache file: `version <int> timestamp <ticks>`.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub struct CacheHeader {
    pub version: u32,
    pub timestamp: Timestamp,
}

impl CacheHeader {

    pub fn new( timestamp: Timestamp ) -> Self { Self { version: CACHE_VERSION, timestamp }}

    /// Parses a header line.
    ///
    /// # Errors
    /// A line that does not start with `version` has no header; otherwise the line must
    /// consist of exactly four space separated tokens with valid numbers.
    pub fn parse( line: &str ) -> Result<Self, HeaderError> {
        if !line.starts_with( "version" ) { return Err( HeaderError::Missing ) }
        let tokens = line.split( ' ' ).collect::<Vec<_>>();
        match tokens.as_slice() {
            [ "version", version, "timestamp", ticks ] => Ok( Self {
                version: version.parse()?,
                timestamp: Timestamp::from_ticks( ticks.parse()? ),
            }),
            [ first, _, third, _ ] => Err( HeaderError::UnexpectedToken(
                if *first == "version" { ( *third ).to_owned() } else { ( *first ).to_owned() }
            )),
            _ => Err( HeaderError::TokenCount( tokens.len() )),
        }
    }

}

impl Display for CacheHeader {
    fn fmt( &self, f: &mut Formatter<'_> ) -> std::fmt::Result {
        write!( f, "version {} timestamp {}", self.version, self.timestamp )
    }
}

/// Directory of cached query results.
#[derive( Debug, Clone )]
pub struct QueryCache {
    dir: PathBuf,
}

impl QueryCache {

    pub fn new( dir: impl Into<PathBuf> ) -> Self { Self { dir: dir.into() }}

    #[inline] pub fn dir( &self ) -> &Path { &self.dir }

    /// First 16 bytes of the blake3 digest of a discriminator, as lowercase hex.
    pub fn discriminator_hash( discriminator: &str ) -> String {
        blake3::hash( discriminator.as_bytes() ).as_bytes()[..16].iter()
            .map(| byte | format!( "{:02x}", byte ))
            .collect()
    }

    /// `<dir>/<module file name>.<hash>.txt`
    pub fn cache_file( &self, module: &Module, discriminator: &str ) -> PathBuf {
        self.dir.join( format!( "{}.{}.txt", module.file_name(), Self::discriminator_hash( discriminator )))
    }

    /// Answers a query from the cache file when it is current, otherwise runs `live` over
    /// the module's loadable types and persists the encoded result.
    ///
    /// `decode` receives the stored tokens and must resolve types individually; returning
    /// `None` turns the lookup into a miss. Never fails: write errors are logged and the
    /// live result is returned.
    pub fn query<T>(
        &self,
        module: &Module,
        discriminator: &str,
        live: impl FnOnce( &[TypeInfo] ) -> Vec<T>,
        encode: impl FnOnce( &[T] ) -> Vec<String>,
        decode: impl FnOnce( &[String] ) -> Option<Vec<T>>,
    ) -> Vec<T> {
        let timestamp = match module.last_write() {
            Ok( timestamp ) => timestamp,
            Err( err ) => {
                debug!( "No timestamp for {}, not caching: {}", module, err );
                return live( &loadable_types( module ))
            }
        };

        let cache_file = self.cache_file( module, discriminator );
        if let Some( result ) = read_tokens( &cache_file, discriminator, timestamp ).and_then(| tokens | decode( &tokens )) {
            debug!( "[cache hit] {} {}", discriminator, module );
            return result
        }

        debug!( "[cache miss] {} {}", discriminator, module );
        let result = live( &loadable_types( module ));
        if let Err( err ) = self.write( &cache_file, discriminator, timestamp, &encode( &result )) {
            warn!( "Could not write query cache {}: {}", cache_file.display(), err );
        }
        result
    }

    fn write( &self, path: &Path, discriminator: &str, timestamp: Timestamp, tokens: &[String] ) -> std::io::Result<()> {
        std::fs::create_dir_all( &self.dir )?;
        let mut contents = format!( "{}\n{}{}\n", CacheHeader::new( timestamp ), DISCRIMINATOR_PREFIX, stored_form( discriminator ));
        tokens.iter().for_each(| token | {
            contents.push_str( token );
            contents.push( '\n' );
        });
        std::fs::write( path, contents )
    }

}

fn read_tokens( path: &Path, discriminator: &str, timestamp: Timestamp ) -> Option<Vec<String>> {
    let contents = std::fs::read_to_string( path ).ok()?;
    let mut lines = contents.lines();

    let header = match CacheHeader::parse( lines.next()? ) {
        Ok( header ) => header,
        Err( err ) => {
            debug!( "Malformed cache file {}: {}", path.display(), err );
            return None
        }
    };
    if header.version != CACHE_VERSION || header.timestamp != timestamp { return None }

    let stored = lines.next()?.strip_prefix( DISCRIMINATOR_PREFIX )?;
    if stored != stored_form( discriminator ) {
        debug!( "Cache file {} belongs to a different query", path.display() );
        return None
    }

    Some( lines.map( str::to_owned ).collect() )
}

fn stored_form( discriminator: &str ) -> String { discriminator.escape_debug().to_string() }

fn loadable_types( module: &Module ) -> Vec<TypeInfo> {
    let ( types, failures ) = module.types();
    if !failures.is_empty() {
        debug!( "{} type(s) of {} failed to load", failures.len(), module );
        failures.iter().for_each(| err | debug!( "  {}", err ));
    }
    types
}

#[cfg( test )]
mod tests {

    use super::* ;

    #[test]
    fn header_round_trips_through_text() {
        let header = CacheHeader::new( Timestamp::from_ticks( 637_000_000_000_000_000 ));
        assert_eq!( header.to_string(), "version 1 timestamp 637000000000000000" );
        assert_eq!( CacheHeader::parse( &header.to_string() ), Ok( header ));
    }

    #[test]
    fn header_rejects_malformed_lines() {
        assert_eq!( CacheHeader::parse( "audio::Mp3" ), Err( HeaderError::Missing ));
        assert_eq!( CacheHeader::parse( "version 1 timestamp" ), Err( HeaderError::TokenCount( 3 )));
        assert_eq!( CacheHeader::parse( "version 1 timestamp 5 extra" ), Err( HeaderError::TokenCount( 5 )));
        assert_eq!( CacheHeader::parse( "version 1 stamp 5" ), Err( HeaderError::UnexpectedToken( "stamp".to_owned() )));
        assert!( matches!( CacheHeader::parse( "version x timestamp 5" ), Err( HeaderError::InvalidNumber( _ ))));
    }

    #[test]
    fn discriminator_hash_is_32_hex_digits() {
        let hash = QueryCache::discriminator_hash( "implements:audio::Codec" );
        assert_eq!( hash.len(), 32 );
        assert!( hash.chars().all(| c | c.is_ascii_hexdigit() && !c.is_ascii_uppercase() ));
        assert_ne!( hash, QueryCache::discriminator_hash( "inherits:audio::Codec" ));
    }

}
