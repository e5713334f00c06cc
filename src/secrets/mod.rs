//! Access to keytab secret material.
//!
//! Identity records describe which keytabs belong to which host. The keytab
//! files themselves sit next to the identity data in a per-host directory,
//! named after a hash of the path the agent will install them at.
mod identity_file;
pub use identity_file::*;


use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

#[cfg(test)]
use mockall::automock;
use sha1::Digest;
use sha1::Sha1;
use tracing::debug;

use crate::IdentityRecord;
use crate::Result;
use crate::SecretAccessError;

/// Lazy sequence of identity records.
///
/// Backing resources are released when the reader is dropped, whichever way
/// iteration ends.
pub trait IdentityReader: Iterator<Item = Result<IdentityRecord>> + Send {}

impl<I> IdentityReader for I where I: Iterator<Item = Result<IdentityRecord>> + Send {}

#[cfg_attr(test, automock)]
pub trait SecretStore: Send + Sync + 'static {
    /// Opens a fresh pass over the identity records stored in `directory`.
    ///
    /// Every call starts from the first record.
    fn open(
        &self,
        directory: &Path,
    ) -> Result<Box<dyn IdentityReader>>;
}

/// Where the keytab for `keytab_path` on `hostname` is stored
pub fn keytab_location(
    data_dir: &Path,
    hostname: &str,
    keytab_path: &str,
) -> PathBuf {
    let digest = Sha1::digest(keytab_path.as_bytes());
    data_dir.join(hostname).join(hex::encode(digest))
}

/// Reads a stored keytab.
///
/// Returns `None` when the file is missing or not readable by this process;
/// any other failure is an error.
pub fn read_keytab(location: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(location) {
        Ok(content) => Ok(Some(content)),
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
            debug!("keytab {:?} is not readable: {}", location, e);
            Ok(None)
        }
        Err(e) => Err(SecretAccessError::Io {
            path: location.to_path_buf(),
            source: e,
        }
        .into()),
    }
}
