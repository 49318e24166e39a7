mod partial_success ;

pub use partial_success::{ PartialSuccess, PartialResult };

use std::any::Any ;



/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message( payload: &( dyn Any + Send )) -> String {
    match payload.downcast_ref::<&str>() {
        Some( message ) => ( *message ).to_owned(),
        None => match payload.downcast_ref::<String>() {
            Some( message ) => message.clone(),
            None => "<non-string panic payload>".to_owned(),
        },
    }
}
