//! Plugin discovery.
//!
//! A plugin is any loadable file in the plugin directory that contains at least one
//! method carrying the [`ACTIVATION_MARKER`]( crate::ACTIVATION_MARKER ). Probing a file
//! means loading it, so verdicts are persisted between runs and reused until the file
//! changes.

mod candidate_cache ;
mod prober ;
mod discovery ;

pub use candidate_cache::{ CandidateCache, CandidateRecord, CandidateCacheError };
pub use prober::{ PluginProber, ProbeError };
pub use discovery::PluginDiscovery ;
