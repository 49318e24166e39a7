//! Last-write times as signed 100 ns ticks since the Unix epoch.
//!
//! Ticks are what the caches persist, so the representation is a plain integer that
//! survives a text round trip unchanged. Times before the epoch are negative.

use std::fmt::{ Display, Formatter };
use std::path::Path ;
use std::time::{ Duration, SystemTime, UNIX_EPOCH };

use serde::{ Deserialize, Serialize };



const NANOS_PER_TICK: u128 = 100 ;

/// A point in time with 100 ns resolution.
#[derive( Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize )]
pub struct Timestamp( i64 );

impl Timestamp {

    pub const TICKS_PER_SECOND: i64 = 10_000_000 ;

    #[inline] pub const fn from_ticks( ticks: i64 ) -> Self { Self( ticks ) }
    #[inline] pub const fn ticks( self ) -> i64 { self.0 }

    /// Reads the last-write time of a file.
    ///
    /// # Errors
    /// Fails when the file metadata cannot be read or the platform does not report
    /// modification times.
    pub fn of_file( path: &Path ) -> std::io::Result<Self> {
        std::fs::metadata( path )?.modified().map( Self::from_system_time )
    }

    /// Converts a [`SystemTime`], saturating at the representable range.
    pub fn from_system_time( time: SystemTime ) -> Self {
        match time.duration_since( UNIX_EPOCH ) {
            Ok( after ) => Self( ticks_of( after )),
            Err( before ) => Self( ticks_of( before.duration() ).saturating_neg() ),
        }
    }

}

impl Display for Timestamp {
    fn fmt( &self, f: &mut Formatter<'_> ) -> std::fmt::Result {
        write!( f, "{}", self.0 )
    }
}

fn ticks_of( duration: Duration ) -> i64 {
    i64::try_from( duration.as_nanos() / NANOS_PER_TICK ).unwrap_or( i64::MAX )
}

#[cfg( test )]
mod tests {

    use super::* ;

    #[test]
    fn system_time_conversion_is_monotonic_across_the_epoch() {
        let before = Timestamp::from_system_time( UNIX_EPOCH - Duration::from_secs( 1 ));
        let after = Timestamp::from_system_time( UNIX_EPOCH + Duration::from_micros( 1 ));
        assert_eq!( before.ticks(), -Timestamp::TICKS_PER_SECOND );
        assert_eq!( after.ticks(), 10 );
        assert!( before < after );
    }

}
