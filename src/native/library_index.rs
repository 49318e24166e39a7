use std::collections::HashMap ;
use std::path::{ Path, PathBuf };
use std::process::Command ;
use std::sync::Arc ;

use once_cell::sync::{ Lazy, OnceCell };
use regex::Regex ;
use tracing::debug ;

use super::Arch ;



static LDCONFIG_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new( r"^[ \t]*(?P<name>[^ \t]+)[ \t]+\((?P<libc>[^,)]+)(?:,(?P<arch>[^)]+))?\)[ \t]*=>[ \t]*(?P<path>.*)$" )
        .expect( "ldconfig row pattern is valid" )
});

static SYSTEM: Lazy<Arc<LibraryIndex>> = Lazy::new(|| Arc::new( LibraryIndex::new( Arch::current() )));

enum Source {
    Ldconfig,
    Listing( String ),
}

/// Maps library file names to their paths in the system linker cache.
///
/// Built on first lookup from `ldconfig -p`, keeping the rows for the process
/// architecture. On systems without `ldconfig` the index is empty.
pub struct LibraryIndex {
    arch: Arch,
    source: Source,
    paths: OnceCell<HashMap<String, PathBuf>>,
}

impl LibraryIndex {

    pub fn new( arch: Arch ) -> Self {
        Self { arch, source: Source::Ldconfig, paths: OnceCell::new() }
    }

    /// An index over a captured `ldconfig -p` listing.
    pub fn from_listing( listing: impl Into<String>, arch: Arch ) -> Self {
        Self { arch, source: Source::Listing( listing.into() ), paths: OnceCell::new() }
    }

    /// The process-wide index for the running architecture.
    pub fn system() -> Arc<Self> { Arc::clone( &SYSTEM ) }

    pub fn lookup( &self, name: &str ) -> Option<&Path> { self.paths().get( name ).map( PathBuf::as_path ) }

    pub fn len( &self ) -> usize { self.paths().len() }

    pub fn is_empty( &self ) -> bool { self.paths().is_empty() }

    fn paths( &self ) -> &HashMap<String, PathBuf> {
        self.paths.get_or_init(|| match &self.source {
            Source::Ldconfig => query_ldconfig( self.arch ),
            Source::Listing( listing ) => parse_listing( listing, self.arch ),
        })
    }

}

impl std::fmt::Debug for LibraryIndex {
    fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
        f.debug_struct( "LibraryIndex" )
            .field( "arch", &self.arch )
            .field( "entries", &self.paths.get().map( HashMap::len ))
            .finish_non_exhaustive()
    }
}

/// Parses `ldconfig -p` output. The first row for a name wins, matching the linker's
/// own search order.
pub fn parse_listing( listing: &str, arch: Arch ) -> HashMap<String, PathBuf> {
    let mut paths = HashMap::new();
    listing.lines()
        .filter_map(| line | LDCONFIG_ROW.captures( line ))
        .filter(| row | arch.matches_ldconfig( row.name( "arch" ).map_or( "", | arch | arch.as_str() )))
        .for_each(| row | {
            let name = row[ "name" ].to_owned();
            let path = PathBuf::from( row[ "path" ].trim() );
            paths.entry( name ).or_insert( path );
        });
    paths
}

fn query_ldconfig( arch: Arch ) -> HashMap<String, PathBuf> {
    if cfg!( windows ) { return HashMap::new() }
    for program in [ "ldconfig", "/sbin/ldconfig" ] {
        match Command::new( program ).arg( "-p" ).output() {
            Ok( output ) if output.status.success() => {
                let paths = parse_listing( &String::from_utf8_lossy( &output.stdout ), arch );
                debug!( "Indexed {} system libraries", paths.len() );
                return paths
            }
            Ok( output ) => debug!( "{} -p exited with {}", program, output.status ),
            Err( err ) => debug!( "Could not run {}: {}", program, err ),
        }
    }
    HashMap::new()
}

#[cfg( test )]
mod tests {

    use super::* ;

    const LISTING: &str = "\
1523 libs found in cache `/etc/ld.so.cache'
	libz.so.1 (libc6,x86-64) => /lib/x86_64-linux-gnu/libz.so.1
	libz.so.1 (libc6) => /lib/i386-linux-gnu/libz.so.1
	libssl.so.3 (libc6,x86-64, OS ABI: Linux 3.2.0) => /usr/lib/x86_64-linux-gnu/libssl.so.3
	libssl.so.3 (libc6,x86-64) => /opt/ssl/libssl.so.3
	libarm.so (libc6,AArch64) => /lib/aarch64-linux-gnu/libarm.so
Cache generated by: ldconfig (Ubuntu GLIBC 2.35) stable release version 2.35
";

    #[test]
    fn rows_are_filtered_by_architecture() {
        let index = LibraryIndex::from_listing( LISTING, Arch::Amd64 );
        assert_eq!( index.lookup( "libz.so.1" ), Some( Path::new( "/lib/x86_64-linux-gnu/libz.so.1" )));
        assert_eq!( index.lookup( "libssl.so.3" ), Some( Path::new( "/usr/lib/x86_64-linux-gnu/libssl.so.3" )));
        assert_eq!( index.lookup( "libarm.so" ), None );
        assert_eq!( index.len(), 2 );

        let index = LibraryIndex::from_listing( LISTING, Arch::X86 );
        assert_eq!( index.lookup( "libz.so.1" ), Some( Path::new( "/lib/i386-linux-gnu/libz.so.1" )));
        assert_eq!( index.len(), 1 );
    }

}
