use std::panic::{ catch_unwind, AssertUnwindSafe };
use std::path::Path ;

use thiserror::Error ;
use tracing::debug ;

use crate::{ LoadError, ModuleLoader, QueryEngine, ACTIVATION_MARKER };
use crate::utils::panic_message ;



/// Why a candidate could not be probed.
#[derive( Error, Debug )]
pub enum ProbeError {
    #[error( "Load failed: {0}" )] Load( #[from] LoadError ),
    #[error( "Panicked while probing: {0}" )] Panicked( String ),
}

/// Decides whether a file is a plugin by loading it and looking for activation methods.
pub struct PluginProber<'a> {
    loader: &'a dyn ModuleLoader,
    engine: &'a QueryEngine,
}

impl<'a> PluginProber<'a> {

    pub fn new( loader: &'a dyn ModuleLoader, engine: &'a QueryEngine ) -> Self { Self { loader, engine }}

    /// Loads `path` and reports whether any of its methods carries the activation marker.
    ///
    /// # Errors
    /// Fails when the file cannot be loaded or loading or querying it panics.
    pub fn probe( &self, path: &Path ) -> Result<bool, ProbeError> {
        catch_unwind( AssertUnwindSafe(|| -> Result<bool, ProbeError> {
            let module = self.loader.load_file( path )?;
            Ok( !self.engine.methods_with_marker( &module, ACTIVATION_MARKER ).is_empty() )
        }))
        .map_err(| payload | ProbeError::Panicked( panic_message( &*payload )))?
    }

    /// Like [`probe`]( Self::probe ), treating every failure as "not a plugin".
    pub fn is_plugin( &self, path: &Path ) -> bool {
        self.probe( path ).unwrap_or_else(| err | {
            debug!( "{} is not a plugin: {}", path.display(), err );
            false
        })
    }

}
