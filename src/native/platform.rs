use std::fmt::{ Display, Formatter };



/// Operating systems a remap rule can target.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash )]
pub enum TargetOs {
    Windows,
    Linux,
    MacOs,
}

impl TargetOs {

    pub fn current() -> Self {
        if cfg!( target_os = "windows" ) { Self::Windows }
        else if cfg!( target_os = "macos" ) { Self::MacOs }
        else { Self::Linux }
    }

    /// Parses a case-insensitive OS tag as used in remap manifests.
    pub fn parse( tag: &str ) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "win" | "windows" | "win32" | "win64" => Some( Self::Windows ),
            "linux" | "nix" | "unix" => Some( Self::Linux ),
            "mac" | "macos" | "macosx" => Some( Self::MacOs ),
            _ => None,
        }
    }

    /// Top-level directory of the OS's payload inside a native archive.
    pub fn archive_dir( self ) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::MacOs => "mac",
        }
    }

    pub fn supports_symlinks( self ) -> bool { self != Self::Windows }

}

/// Process architectures with distinct native payloads.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash )]
pub enum Arch {
    X86,
    Amd64,
}

impl Arch {

    pub fn current() -> Self {
        if cfg!( target_pointer_width = "64" ) { Self::Amd64 } else { Self::X86 }
    }

    /// Second-level directory of the architecture's payload inside a native archive.
    pub fn archive_dir( self ) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::Amd64 => "AMD64",
        }
    }

    /// Whether an `ldconfig -p` architecture field describes a library for this
    /// architecture. Only the first comma separated tag is significant.
    pub fn matches_ldconfig( self, field: &str ) -> bool {
        let tag = field.split( ',' ).next().unwrap_or_default().trim();
        match self {
            Self::Amd64 => tag == "x86-64",
            Self::X86 => tag != "x86-64" && !tag.ends_with( "64" ),
        }
    }

}

/// The OS and architecture native payloads are selected for.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash )]
pub struct Platform {
    pub os: TargetOs,
    pub arch: Arch,
}

impl Platform {

    pub fn new( os: TargetOs, arch: Arch ) -> Self { Self { os, arch }}

    pub fn current() -> Self { Self::new( TargetOs::current(), Arch::current() )}

    /// `<os>/<arch>/`, the archive prefix holding this platform's files.
    pub fn archive_prefix( self ) -> String {
        format!( "{}/{}/", self.os.archive_dir(), self.arch.archive_dir() )
    }

}

impl Display for Platform {
    fn fmt( &self, f: &mut Formatter<'_> ) -> std::fmt::Result {
        write!( f, "{}/{}", self.os.archive_dir(), self.arch.archive_dir() )
    }
}

#[cfg( test )]
mod tests {

    use super::* ;

    #[test]
    fn os_tags_parse_case_insensitively() {
        assert_eq!( TargetOs::parse( "Win64" ), Some( TargetOs::Windows ));
        assert_eq!( TargetOs::parse( " UNIX " ), Some( TargetOs::Linux ));
        assert_eq!( TargetOs::parse( "MacOSX" ), Some( TargetOs::MacOs ));
        assert_eq!( TargetOs::parse( "solaris" ), None );
    }

    #[test]
    fn archive_prefix_names_os_and_arch() {
        assert_eq!( Platform::new( TargetOs::Linux, Arch::Amd64 ).archive_prefix(), "linux/AMD64/" );
        assert_eq!( Platform::new( TargetOs::Windows, Arch::X86 ).archive_prefix(), "windows/x86/" );
    }

    #[test]
    fn ldconfig_arch_fields_match_by_first_tag() {
        assert!( Arch::Amd64.matches_ldconfig( "x86-64" ));
        assert!( Arch::Amd64.matches_ldconfig( "x86-64, OS ABI: Linux 3.2.0" ));
        assert!( !Arch::Amd64.matches_ldconfig( "AArch64" ));
        assert!( Arch::X86.matches_ldconfig( "hwcap: 0x0004000000000000" ));
        assert!( !Arch::X86.matches_ldconfig( "x86-64" ));
    }

}
