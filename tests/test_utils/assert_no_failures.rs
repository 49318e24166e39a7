macro_rules! assert_no_failures {
    ( $failures:expr ) => {
        if !$failures.is_empty() {
            panic!( "Absorbed failures: {}", $failures.iter().map( ToString::to_string ).collect::<Vec<_>>().join( "; " ))
        }
    };
}
