//! Native dependencies shipped inside modules.
//!
//! A module may embed a `native.zip` resource with one payload directory per platform
//! (`linux/AMD64/`, `windows/x86/`, ...) and an optional `remap.xml` at its root. The
//! payload for the running platform is unpacked next to the host, and the manifest's
//! rules become symbolic links so that logical library names resolve on every OS.

mod platform ;
mod remap ;
mod library_index ;
mod resolver ;

pub use platform::{ TargetOs, Arch, Platform };
pub use remap::{ RemapRule, parse_remap, links_for, REMAP_MANIFEST };
pub use library_index::{ LibraryIndex, parse_listing };
pub use resolver::{ NativeResolver, NativeReport, NativeError, NATIVE_ARCHIVE };
