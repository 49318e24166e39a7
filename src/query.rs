//! Cached type queries over module metadata.

mod cache ;
mod engine ;

pub use cache::{ QueryCache, CacheHeader, HeaderError, CACHE_VERSION };
pub use engine::{ QueryEngine, MarkedType, MarkedMethod };
