use std::path::{ Path, PathBuf };

use tracing::{ debug, info, warn };

use crate::Timestamp ;
use crate::loader::loadable_files ;
use super::{ CandidateCache, CandidateRecord, PluginProber };



/// Finds the plugins in a directory, probing only files that changed since the last run.
pub struct PluginDiscovery<'a> {
    prober: PluginProber<'a>,
    cache_file: &'a Path,
    extensions: &'a [String],
}

impl<'a> PluginDiscovery<'a> {

    pub fn new( prober: PluginProber<'a>, cache_file: &'a Path, extensions: &'a [String] ) -> Self {
        Self { prober, cache_file, extensions }
    }

    /// Returns the absolute paths of the plugins in `directory`, in path order.
    ///
    /// Verdicts are reused from the candidate cache while a file is not newer than its
    /// record. The cache is then replaced with the verdicts of this scan only, so entries
    /// for files that disappeared are dropped.
    pub fn discover( &self, directory: &Path ) -> Vec<PathBuf> {
        let candidates = match loadable_files( directory, self.extensions ) {
            Ok( candidates ) => candidates,
            Err( err ) => {
                warn!( "Could not scan {} for plugins: {}", directory.display(), err );
                return Vec::new()
            }
        };

        let previous = CandidateCache::load( self.cache_file );
        let mut next = CandidateCache::new();
        let plugins = candidates.into_iter()
            .map(| path | std::fs::canonicalize( &path ).unwrap_or( path ))
            .filter(| path | {
                let current = Timestamp::of_file( path ).ok();
                let is_plugin = match previous.verdict( path, current ) {
                    Some( is_plugin ) => {
                        debug!( "Cached verdict for {}: {}", path.display(), is_plugin );
                        is_plugin
                    }
                    None => self.prober.is_plugin( path ),
                };
                if let Some( last_write ) = current {
                    next.insert( path.clone(), CandidateRecord { last_write, is_plugin });
                }
                is_plugin
            })
            .collect::<Vec<_>>();

        if let Err( err ) = next.save( self.cache_file ) {
            warn!( "Could not write plugin cache {}: {}", self.cache_file.display(), err );
        }
        info!( "Found {} plugin(s) in {}", plugins.len(), directory.display() );
        plugins
    }

}
