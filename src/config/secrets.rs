use std::path::Component;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use super::validate_not_empty;
use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SecretsConfig {
    /// Name of the identity data file inside a command's data directory
    #[serde(default = "default_identity_file_name")]
    pub identity_file_name: String,

    /// Command parameter holding the data directory
    #[serde(default = "default_data_directory_param")]
    pub data_directory_param: String,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            identity_file_name: default_identity_file_name(),
            data_directory_param: default_data_directory_param(),
        }
    }
}

impl SecretsConfig {
    pub fn validate(&self) -> Result<()> {
        validate_not_empty("secrets.data_directory_param", &self.data_directory_param)?;

        // Must be a bare file name so it never escapes the data directory
        let mut components = Path::new(&self.identity_file_name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(()),
            _ => Err(Error::InvalidConfig(format!(
                "secrets.identity_file_name must be a bare file name, got {:?}",
                self.identity_file_name
            ))),
        }
    }
}

fn default_identity_file_name() -> String {
    "identity.dat".to_string()
}
fn default_data_directory_param() -> String {
    "data_directory".to_string()
}
