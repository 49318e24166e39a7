//! Names that are never handed to a loader.
//!
//! The static rules cover system runtimes, GUI toolkits and test harness libraries that
//! can appear as dependency names but never contain plugins. Names that failed to load
//! once are added at runtime and stay denied for the rest of the process.

use std::collections::HashSet ;

use parking_lot::RwLock ;



const DENIED_PREFIXES: &[&str] = &[
    // C and C++ runtimes, dynamic linker
    "libc.", "libc-", "libm.", "libdl", "libpthread", "librt.", "ld-linux", "ld64", "linux-vdso",
    "libgcc_s", "libstdc++", "libc++", "libSystem",
    // Windows system libraries
    "api-ms-win-", "ext-ms-win-", "msvcr", "msvcp", "vcruntime", "ucrtbase", "kernel32", "ntdll",
    "user32", "gdi32", "advapi32", "ws2_32",
    // GUI toolkits and windowing
    "gtk", "libgtk", "gdk", "libgdk", "glib", "libglib", "Qt", "libQt", "libX11", "libxcb",
    "libwayland", "AppKit", "Cocoa",
    // Graphics and media runtimes
    "libGL", "opengl32", "vulkan", "libvulkan", "d3d", "dxgi",
    // Test harnesses and benchmarks
    "libtest", "criterion", "nextest",
];

// Exact names only where no user module could plausibly share them.
const DENIED_NAMES: &[&str] = &[
    "std", "proc_macro", "pthread", "gcc_s", "CoreFoundation", "Foundation",
];

/// Static deny rules plus the set of names that failed to load.
#[derive( Debug, Default )]
pub struct Denylist {
    failed: RwLock<HashSet<String>>,
}

impl Denylist {

    pub fn new() -> Self { Self::default() }

    /// Whether `name` matches a static prefix or exact-name rule.
    pub fn matches_rules( &self, name: &str ) -> bool {
        DENIED_NAMES.contains( &name ) || DENIED_PREFIXES.iter().any(| prefix | name.starts_with( prefix ))
    }

    /// Whether `name` is already known to be unloadable.
    pub fn is_failed( &self, name: &str ) -> bool { self.failed.read().contains( name ) }

    /// Whether `name` must not be handed to a loader.
    pub fn is_denied( &self, name: &str ) -> bool { self.is_failed( name ) || self.matches_rules( name ) }

    /// Records `name` as permanently unloadable. Returns `false` if it already was.
    pub fn mark_failed( &self, name: &str ) -> bool { self.failed.write().insert( name.to_owned() ) }

    /// Number of names recorded as failed.
    pub fn failed_count( &self ) -> usize { self.failed.read().len() }

}

#[cfg( test )]
mod tests {

    use super::* ;

    #[test]
    fn static_rules_match_prefixes_and_exact_names() {
        let denylist = Denylist::new();
        assert!( denylist.matches_rules( "std" ));
        assert!( denylist.matches_rules( "libgtk-3.so.0" ));
        assert!( denylist.matches_rules( "api-ms-win-crt-runtime-l1-1-0" ));
        assert!( !denylist.matches_rules( "stdx" ));
        assert!( !denylist.matches_rules( "audio_plugin" ));
    }

    #[test]
    fn short_and_generic_names_are_not_denied() {
        let denylist = Denylist::new();
        for name in [ "c", "m", "dl", "rt", "core", "alloc", "test", "System" ] {
            assert!( !denylist.matches_rules( name ), "{name} should be loadable" );
        }
        assert!( denylist.matches_rules( "libc.so.6" ));
        assert!( denylist.matches_rules( "libm.so.6" ));
        assert!( denylist.matches_rules( "libdl.so.2" ));
        assert!( denylist.matches_rules( "librt.so.1" ));
    }

    #[test]
    fn failed_names_are_remembered() {
        let denylist = Denylist::new();
        assert!( !denylist.is_denied( "flaky" ));
        assert!( denylist.mark_failed( "flaky" ));
        assert!( !denylist.mark_failed( "flaky" ));
        assert!( denylist.is_denied( "flaky" ));
        assert_eq!( denylist.failed_count(), 1 );
    }

}
