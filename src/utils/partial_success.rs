//! Type aliases for operations that keep going when parts of them fail.
//! Bootstrap work is best effort: a broken archive entry, an unloadable type or a
//! throwing activation method is collected and reported while the rest completes.

/// A completed operation together with the errors of the parts that were skipped.
/// The `Vec<E>` holds every failure that was absorbed along the way.
pub type PartialSuccess<T, E> = ( T, Vec<E> );

/// An operation that may either complete with absorbed failures or fail outright.
/// Ok: the produced value plus the failures that were absorbed.
/// Err: the failure that stopped the operation plus the failures absorbed before it.
pub type PartialResult<T, E> = Result<( T, Vec<E> ), ( E, Vec<E> )>;
