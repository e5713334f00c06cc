use std::fs::File;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use csv::DeserializeRecordsIntoIter;
use csv::ReaderBuilder;
use csv::Trim;
use tracing::trace;

use super::IdentityReader;
use super::SecretStore;
use crate::Error;
use crate::IdentityRecord;
use crate::Result;
use crate::SecretAccessError;
use crate::SecretsConfig;

/// Secret store backed by the identity data file inside each data directory.
///
/// The file is CSV with a header row naming the [`IdentityRecord`] fields
/// (`hostname`, `service`, `component`, `principal`, `keytab_file_path`,
/// ...). Unknown columns are ignored, empty cells read as absent.
#[derive(Debug, Clone)]
pub struct IdentityDataFile {
    file_name: String,
}

impl IdentityDataFile {
    pub fn new(config: &SecretsConfig) -> Self {
        Self {
            file_name: config.identity_file_name.clone(),
        }
    }

    pub fn path_in(
        &self,
        directory: &Path,
    ) -> PathBuf {
        directory.join(&self.file_name)
    }
}

impl SecretStore for IdentityDataFile {
    fn open(
        &self,
        directory: &Path,
    ) -> Result<Box<dyn IdentityReader>> {
        let path = self.path_in(directory);
        let file = File::open(&path).map_err(|e| SecretAccessError::Io {
            path: path.clone(),
            source: e,
        })?;
        trace!("opened identity file {:?}", path);
        let rows = ReaderBuilder::new().trim(Trim::All).from_reader(file).into_deserialize();
        Ok(Box::new(IdentityRows { path, rows }))
    }
}

struct IdentityRows {
    path: PathBuf,
    rows: DeserializeRecordsIntoIter<File, IdentityRecord>,
}

impl IdentityRows {
    fn access_error(
        &self,
        e: csv::Error,
    ) -> Error {
        if let csv::ErrorKind::Io(source) = e.kind() {
            return SecretAccessError::Io {
                path: self.path.clone(),
                source: io::Error::new(source.kind(), source.to_string()),
            }
            .into();
        }
        SecretAccessError::Malformed {
            path: self.path.clone(),
            line: e.position().map_or(0, |p| p.line()),
            source: e,
        }
        .into()
    }
}

impl Iterator for IdentityRows {
    type Item = Result<IdentityRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        Some(row.map_err(|e| self.access_error(e)))
    }
}
